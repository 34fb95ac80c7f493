pub mod metrics;

pub use metrics::{PassOutcomeMetadata, PassOutcomeStatus, SyncMetrics, SyncMetricsSnapshot};
