mod check;
mod pipeline;

use std::path::PathBuf;

use casemap_core::SourceKind;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::pipeline::RunArgs;

#[derive(Debug, Parser)]
#[command(name = "casemap")]
#[command(about = "Case-trend pipeline: fetch, derive 7-day metrics, publish map artifacts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch one source, derive metrics, and write the artifacts
    Run {
        /// Data source to ingest (ctp, jhu, cdc)
        #[arg(long)]
        source: SourceKind,

        /// Read the source payload from a local file instead of fetching it
        #[arg(long)]
        input: Option<PathBuf>,

        /// Ignore observations dated after this day (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Directory the artifacts are written to (defaults to CASEMAP_DATA_DIR)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Also write the 14-day case growth CSV used for review
        #[arg(long)]
        qa_csv: bool,

        /// Derive everything but write nothing
        #[arg(long)]
        dry_run: bool,
    },
    /// Load and cross-check the static tables without fetching anything
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    let config = casemap_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(Commands::Run {
            source,
            input,
            as_of,
            out_dir,
            qa_csv,
            dry_run,
        }) => {
            let args = RunArgs {
                source,
                input,
                as_of,
                out_dir,
                qa_csv,
                dry_run,
            };
            let summary = pipeline::run_pipeline(&config, &args).await?;
            println!("{summary}");
        }
        Some(Commands::Check) => check::run_check(&config)?,
        None => println!("nothing to do; try `casemap run --source ctp`"),
    }

    Ok(())
}
