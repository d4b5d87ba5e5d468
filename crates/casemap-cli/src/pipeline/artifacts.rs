//! Serialization and writing of the published artifacts.
//!
//! Everything is rendered to bytes before the first file is touched, so a
//! failure anywhere in rendering leaves the previous run's files in place.

use std::path::{Path, PathBuf};

use casemap_metrics::DerivedMetrics;
use serde_json::Value;

pub(crate) const NATIONAL_FILE: &str = "usData.json";
pub(crate) const REGIONS_FILE: &str = "stateData.json";
pub(crate) const BOUNDARY_FILE: &str = "stateTopo.json";

/// One rendered output file.
#[derive(Debug, Clone)]
pub(crate) struct Artifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Renders the national series, the region summaries and the joined
/// boundary document.
///
/// # Errors
///
/// Returns an error if any document fails to serialize.
pub(crate) fn render_artifacts(
    derived: &DerivedMetrics,
    boundary: &Value,
) -> anyhow::Result<Vec<Artifact>> {
    Ok(vec![
        Artifact {
            file_name: NATIONAL_FILE.to_string(),
            bytes: serde_json::to_vec(&derived.national)?,
        },
        Artifact {
            file_name: REGIONS_FILE.to_string(),
            bytes: serde_json::to_vec(&derived.regions)?,
        },
        Artifact {
            file_name: BOUNDARY_FILE.to_string(),
            bytes: serde_json::to_vec(boundary)?,
        },
    ])
}

/// Writes every artifact into `dir`, replacing earlier runs' files.
///
/// All files are first written beside their targets; only once every one is
/// staged are they renamed into place. A failed write leaves the previous
/// run's files untouched and removes whatever was staged.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or a file cannot be
/// written or renamed.
pub(crate) fn write_artifacts(dir: &Path, artifacts: &[Artifact]) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .map_err(|e| anyhow::anyhow!("failed to create output dir {}: {e}", dir.display()))?;

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let staging = staging_path(dir, &artifact.file_name);
        if let Err(e) = std::fs::write(&staging, &artifact.bytes) {
            discard_staged(&staged);
            anyhow::bail!("failed to write {}: {e}", staging.display());
        }
        staged.push((staging, dir.join(&artifact.file_name)));
    }

    let mut written = Vec::with_capacity(staged.len());
    for ((staging, target), artifact) in staged.iter().zip(artifacts) {
        if let Err(e) = std::fs::rename(staging, target) {
            discard_staged(&staged[written.len()..]);
            anyhow::bail!("failed to move {} into place: {e}", target.display());
        }
        tracing::info!(path = %target.display(), bytes = artifact.bytes.len(), "wrote artifact");
        written.push(target.clone());
    }
    Ok(written)
}

fn staging_path(dir: &Path, file_name: &str) -> PathBuf {
    dir.join(format!(".{file_name}.tmp"))
}

fn discard_staged(staged: &[(PathBuf, PathBuf)]) {
    for (staging, _) in staged {
        if let Err(e) = std::fs::remove_file(staging) {
            tracing::warn!(path = %staging.display(), error = %e, "failed to remove staged artifact");
        }
    }
}
