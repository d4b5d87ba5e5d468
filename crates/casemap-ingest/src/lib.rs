//! Source fetching and region/date normalization for the case pipeline.

pub mod client;
pub mod dates;
pub mod error;
pub mod normalize;
pub mod parse;
pub mod types;

pub use client::{FetchOptions, SourceClient};
pub use dates::{parse_date_text, parse_raw_date};
pub use error::{IngestError, NormalizeError};
pub use normalize::{cumulative_to_incremental, normalize, normalize_observation, NormalizeOutcome};
pub use parse::{parse_payload, read_dataset};
pub use types::{DropReport, RawDataset, RawDate, RawObservation};
