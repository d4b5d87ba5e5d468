use casemap_core::SourceKind;
use thiserror::Error;

/// Errors that abort a run: the dataset could not be fetched or read as a
/// whole.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid source URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The response body could not be deserialized into the expected rows.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV is missing the '{column}' column")]
    MissingColumn { column: String },

    #[error("{kind} dataset contained no usable rows")]
    EmptyDataset { kind: SourceKind },
}

/// Per-record failures. The record is dropped and counted; the run goes on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("unknown region '{0}'")]
    UnknownRegion(String),

    #[error("unparseable date '{0}'")]
    UnparseableDate(String),
}
