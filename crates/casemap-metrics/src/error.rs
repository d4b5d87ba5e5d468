use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricError {
    /// Fewer than two full windows of history; the metric is omitted.
    #[error("insufficient history for {region}: {available} dates, need {required}")]
    InsufficientHistory {
        region: String,
        available: usize,
        required: usize,
    },

    #[error("unsupported boundary document: {0}")]
    UnsupportedBoundary(String),

    #[error("failed to serialize metric: {0}")]
    Serialize(#[from] serde_json::Error),
}
