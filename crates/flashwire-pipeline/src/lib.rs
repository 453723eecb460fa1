//! The processing engine: per-article state machine, batched concurrent
//! executor, and the date-level feed processor that ties them to storage.

mod article;
mod batch;
mod processor;
mod repository;

pub use article::ArticlePipeline;
pub use batch::BatchExecutor;
pub use processor::{FeedProcessor, ProcessorStats, WarmupReport};
pub use repository::FeedRepository;
