mod aggregator;
mod line_queue;
mod log_entry;

pub use aggregator::LogAggregator;
pub use line_queue::LineQueue;
pub use log_entry::LogEntry;

/// chrono format applied to every flushed batch.
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S";
