//! Fire-and-forget fan-out of index-update events to the search-indexing
//! service.
//!
//! Persistence success and index delivery are deliberately decoupled: a
//! dispatch failure is counted, never propagated into the run's outcome.

pub mod dispatcher;
pub mod event;
pub mod queue;

pub use dispatcher::{IndexDispatcher, RedisIndexDispatcher};
pub use event::{IndexDestination, IndexEvent, IndexOperation, ProductDocument, ShopDocument};
pub use queue::{DispatchQueue, DispatchStats};
