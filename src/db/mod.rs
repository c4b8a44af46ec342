pub mod pool;

pub use pool::{AsyncDbPool, MIGRATIONS, establish_async_connection_pool};
