//! Metric derivation: 7-day windows, the national rolling series, anomaly
//! corrections, and the join onto the boundary document.
//!
//! Everything here is a pure function of its inputs. Fetching and writing
//! live in the ingest crate and the CLI.

pub mod corrections;
pub mod derive;
pub mod error;
pub mod join;
pub mod rolling;
pub mod series;
pub mod window;

pub use corrections::apply_corrections;
pub use derive::{derive_metrics, DeriveInput, DerivedMetrics};
pub use error::MetricError;
pub use join::{boundary_region_codes, join_metrics, JoinReport};
pub use rolling::rolling_average;
pub use series::{group_by_region, national_series, national_totals, truncate_to};
pub use window::{percent_change, window_average, window_metric, WINDOW_DAYS};
