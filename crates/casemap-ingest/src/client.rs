//! HTTP client for the public case datasets.
//!
//! Wraps `reqwest` with a fixed timeout and user agent. A failed fetch is
//! returned to the caller as-is: there are no automatic retries, and the
//! batch driver aborts the run without writing output.

use std::time::Duration;

use casemap_core::SourceKind;
use chrono::NaiveDate;
use reqwest::{Client, Url};

use crate::dates::parse_raw_date;
use crate::error::IngestError;
use crate::parse::parse_payload;
use crate::types::RawDataset;

/// Per-source request options.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Socrata `$$app_token`, sent only for the CDC source.
    pub cdc_app_token: Option<String>,
    /// Socrata `$limit`; `None` leaves the server default.
    pub cdc_row_limit: Option<u32>,
}

/// Client for fetching one source dataset per run.
pub struct SourceClient {
    client: Client,
}

impl SourceClient {
    /// Creates a client with the given timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, IngestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Fetches and parses the dataset for `source` from `url`.
    ///
    /// # Errors
    ///
    /// - [`IngestError::InvalidUrl`] if `url` does not parse.
    /// - [`IngestError::Http`] on network failure or timeout.
    /// - [`IngestError::UnexpectedStatus`] on any non-2xx status.
    /// - Any parse error from [`parse_payload`].
    pub async fn fetch_dataset(
        &self,
        source: SourceKind,
        url: &str,
        options: &FetchOptions,
    ) -> Result<RawDataset, IngestError> {
        let url = Self::build_url(source, url, options)?;
        tracing::info!(source = %source, url = %redact(&url), "fetching source dataset");
        let body = self.request_text(&url).await?;
        let mut dataset = parse_payload(source, &body)?;
        if source == SourceKind::Cdc {
            if let Some(limit) = options.cdc_row_limit {
                drop_truncated_oldest_day(&mut dataset, limit);
            }
        }
        Ok(dataset)
    }

    /// Builds the request URL, appending Socrata query parameters for CDC.
    fn build_url(source: SourceKind, url: &str, options: &FetchOptions) -> Result<Url, IngestError> {
        let mut parsed = Url::parse(url).map_err(|e| IngestError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if source == SourceKind::Cdc {
            let mut pairs = parsed.query_pairs_mut();
            // Newest first, so `$limit` keeps the latest rows.
            pairs.append_pair("$order", "submission_date DESC");
            if let Some(limit) = options.cdc_row_limit {
                pairs.append_pair("$limit", &limit.to_string());
            }
            if let Some(token) = &options.cdc_app_token {
                pairs.append_pair("$$app_token", token);
            }
        }

        Ok(parsed)
    }

    /// Sends a GET request and returns the body, failing on any non-2xx status.
    async fn request_text(&self, url: &Url) -> Result<String, IngestError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::UnexpectedStatus {
                status: status.as_u16(),
                url: redact(url),
            });
        }
        Ok(response.text().await?)
    }
}

/// Drops the oldest day of a CDC response that filled `$limit`.
///
/// With rows ordered newest first, a full page may stop part-way through
/// its oldest day, leaving that day with only some jurisdictions. Returns
/// the number of rows removed. A page holding a single day is kept.
pub(crate) fn drop_truncated_oldest_day(dataset: &mut RawDataset, limit: u32) -> usize {
    let returned = dataset.observations.len() + dataset.dropped.total();
    if returned < usize::try_from(limit).unwrap_or(usize::MAX) {
        return 0;
    }

    let dates: Vec<Option<NaiveDate>> = dataset
        .observations
        .iter()
        .map(|o| parse_raw_date(&o.date).ok())
        .collect();
    let Some(oldest) = dates.iter().flatten().min().copied() else {
        return 0;
    };
    if dates.iter().flatten().all(|d| *d == oldest) {
        return 0;
    }

    let before = dataset.observations.len();
    dataset
        .observations
        .retain(|o| parse_raw_date(&o.date).ok() != Some(oldest));
    let removed = before - dataset.observations.len();
    tracing::warn!(
        date = %oldest,
        rows = removed,
        limit,
        "cdc response hit the row limit; dropping its possibly partial oldest day"
    );
    removed
}

/// Renders a URL for logs with the app token masked.
fn redact(url: &Url) -> String {
    if !url.query_pairs().any(|(k, _)| k == "$$app_token") {
        return url.to_string();
    }
    let mut masked = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "$$app_token" {
                "[redacted]".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}
