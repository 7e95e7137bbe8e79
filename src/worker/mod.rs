//! The worker loop and its parts
//!
//! - [`dispatcher`] routes decoded messages to the backend
//! - [`producer`] publishes new request batches
//! - [`scheduler`] decides when a batch is due
//! - [`offset`] recovers from an invalid consumer position
//! - [`coordinator`] ties them together in [`FrontierWorker`]

pub mod coordinator;
pub mod dispatcher;
pub mod offset;
pub mod producer;
pub mod scheduler;
pub mod stats;

pub use coordinator::FrontierWorker;
pub use dispatcher::{ExclusionPolicy, LinkFilter, ResultDispatcher};
pub use offset::OffsetFaultHandler;
pub use producer::BatchProducer;
pub use scheduler::{AdaptiveBatchScheduler, SchedulerState};
pub use stats::WorkerStats;
