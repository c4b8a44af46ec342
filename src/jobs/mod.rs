pub mod executor;
pub mod registry;
pub mod scheduler;
pub mod tasks;
pub mod types;

pub use executor::{JobExecutor, RunTracker};
pub use registry::JobRegistry;
pub use scheduler::JobScheduler;
pub use types::{JobContext, JobStatus, JobTask};
