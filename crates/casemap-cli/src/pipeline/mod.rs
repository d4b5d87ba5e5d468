//! The batch run: fetch, normalize, derive, join, then write.
//!
//! Called from `main` once config is loaded. Any failure before the write
//! step aborts the run with nothing written.

mod artifacts;
mod qa;
mod tables;

use std::fmt;
use std::path::PathBuf;

use casemap_core::{AppConfig, SourceKind};
use casemap_ingest::{DropReport, FetchOptions, RawDataset, SourceClient};
use casemap_metrics::{DeriveInput, DerivedMetrics, JoinReport};
use chrono::NaiveDate;

pub(crate) use tables::load_static_tables;
use tables::StaticTables;

/// Options for one `run` invocation.
#[derive(Debug, Clone)]
pub(crate) struct RunArgs {
    pub source: SourceKind,
    pub input: Option<PathBuf>,
    pub as_of: Option<NaiveDate>,
    pub out_dir: Option<PathBuf>,
    pub qa_csv: bool,
    pub dry_run: bool,
}

/// What a run did, printed as one line at the end.
#[derive(Debug, Clone)]
pub(crate) struct RunSummary {
    pub source: SourceKind,
    pub observations: usize,
    pub regions: usize,
    pub omitted: usize,
    pub join: JoinReport,
    pub corrections_applied: usize,
    pub latest: Option<NaiveDate>,
    pub dropped: DropReport,
    /// Files written; empty for a dry run.
    pub written: Vec<PathBuf>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let latest = self
            .latest
            .map_or_else(|| "none".to_string(), |d| d.to_string());
        write!(
            f,
            "{}: {} observations through {latest}, {} regions ({} omitted, {} joined, {} without boundary), {} corrections; {}",
            self.source,
            self.observations,
            self.regions,
            self.omitted,
            self.join.joined.len(),
            self.join.skipped.len(),
            self.corrections_applied,
            self.dropped,
        )?;
        if self.written.is_empty() {
            f.write_str("; nothing written")
        } else {
            write!(f, "; wrote {} files", self.written.len())
        }
    }
}

/// Runs the full batch for one source.
///
/// # Errors
///
/// Returns an error if a static table fails to load, the source cannot be
/// fetched or parsed, normalization leaves nothing usable, the boundary
/// document has an unsupported shape, or an artifact cannot be written.
pub(crate) async fn run_pipeline(config: &AppConfig, args: &RunArgs) -> anyhow::Result<RunSummary> {
    let tables = load_static_tables(config)?;
    let dataset = acquire_dataset(config, args).await?;
    process_dataset(config, args, tables, dataset)
}

/// Reads the dataset from `--input` when given, otherwise fetches it.
async fn acquire_dataset(config: &AppConfig, args: &RunArgs) -> anyhow::Result<RawDataset> {
    if let Some(path) = &args.input {
        tracing::info!(source = %args.source, path = %path.display(), "reading source dataset from file");
        return Ok(casemap_ingest::read_dataset(args.source, path)?);
    }

    let client = SourceClient::new(config.request_timeout_secs, &config.user_agent)
        .map_err(|e| anyhow::anyhow!("failed to build source client: {e}"))?;
    let options = FetchOptions {
        cdc_app_token: config.cdc_app_token.clone(),
        cdc_row_limit: Some(config.cdc_row_limit),
    };
    Ok(client
        .fetch_dataset(args.source, config.source_url(args.source), &options)
        .await?)
}

/// Everything after the fetch. Pure apart from the final write.
fn process_dataset(
    config: &AppConfig,
    args: &RunArgs,
    tables: StaticTables,
    dataset: RawDataset,
) -> anyhow::Result<RunSummary> {
    let StaticTables {
        lookup,
        corrections,
        population,
        mut boundary,
    } = tables;

    let outcome = casemap_ingest::normalize(dataset, &lookup);
    tracing::info!(
        observations = outcome.observations.len(),
        dropped = outcome.dropped.total(),
        "normalized dataset"
    );
    if outcome.observations.is_empty() {
        anyhow::bail!(
            "no usable {} observations after normalization; {}",
            args.source,
            outcome.dropped
        );
    }

    let derived: DerivedMetrics = casemap_metrics::derive_metrics(DeriveInput {
        observations: &outcome.observations,
        source: args.source,
        corrections: &corrections,
        population: population.as_ref(),
        as_of: args.as_of,
    });

    let join = casemap_metrics::join_metrics(&mut boundary, &derived.regions, &config.boundary_key)?;

    let mut rendered = artifacts::render_artifacts(&derived, &boundary)?;
    if args.qa_csv {
        if let Some(sheet) = qa::render_qa_csv(&derived.national, &derived.regions)? {
            rendered.push(sheet);
        }
    }

    let written = if args.dry_run {
        for artifact in &rendered {
            println!("dry-run: would write {} ({} bytes)", artifact.file_name, artifact.bytes.len());
        }
        Vec::new()
    } else {
        let dir = args.out_dir.as_deref().unwrap_or(config.data_dir.as_path());
        artifacts::write_artifacts(dir, &rendered)?
    };

    tracing::info!(dropped = %outcome.dropped, "run complete");

    Ok(RunSummary {
        source: args.source,
        observations: outcome.observations.len(),
        regions: derived.regions.len(),
        omitted: derived.omitted.len(),
        join,
        corrections_applied: derived.corrections_applied,
        latest: derived.national.last().map(|p| p.date),
        dropped: outcome.dropped,
        written,
    })
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
