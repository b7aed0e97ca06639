//! manatcg - collection to reference catalog resolver
//!
//! Reads a collection export and a reference dataset, resolves every row to a
//! reference record (asking the operator about ambiguous ones), and writes the
//! staged inventory plus the authority-verified and given-up streams into a
//! timestamped output directory.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use manatcg_common::config::{load_config, LoggingConfig, ReviewSurfaceKind, TomlConfig};
use manatcg_resolve::build_catalog;
use manatcg_resolve::io::{create_output_dir, load_reference, read_collection, write_streams, write_summary};
use manatcg_resolve::services::{
    BatchSurface, ExternalVerifier, ReviewCoordinator, ScryfallClient, TerminalSurface, TextPromptSurface,
};
use manatcg_resolve::workflow::Pipeline;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Review surface choices on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SurfaceArg {
    /// Full-screen terminal UI with text fallback
    Interactive,
    /// Line prompts on stdin/stdout
    Text,
    /// Confirm every deferred item's top candidate
    AutoTop,
    /// Leave every deferred item unmatched
    SkipAll,
}

impl From<SurfaceArg> for ReviewSurfaceKind {
    fn from(arg: SurfaceArg) -> Self {
        match arg {
            SurfaceArg::Interactive => ReviewSurfaceKind::Interactive,
            SurfaceArg::Text => ReviewSurfaceKind::Text,
            SurfaceArg::AutoTop => ReviewSurfaceKind::AutoTop,
            SurfaceArg::SkipAll => ReviewSurfaceKind::SkipAll,
        }
    }
}

/// Command-line arguments for manatcg
#[derive(Parser, Debug)]
#[command(name = "manatcg")]
#[command(about = "Resolve a card collection export against a reference catalog")]
#[command(version)]
struct Args {
    /// Collection export CSV
    #[arg(short, long, env = "MANATCG_COLLECTION")]
    collection: PathBuf,

    /// Reference dataset CSV
    #[arg(short, long, env = "MANATCG_REFERENCE")]
    reference: PathBuf,

    /// Directory receiving the timestamped output directory
    #[arg(short, long, default_value = ".")]
    output_root: PathBuf,

    /// Configuration file (overrides MANATCG_CONFIG and the per-user file)
    #[arg(long)]
    config: Option<PathBuf>,

    /// How deferred items are reviewed
    #[arg(long, value_enum)]
    review: Option<SurfaceArg>,

    /// Never consult the authority service
    #[arg(long)]
    offline: bool,

    /// Maximum concurrent authority lookups
    #[arg(long)]
    concurrency: Option<usize>,

    /// Drop prerelease products from the reference dataset
    #[arg(long)]
    exclude_prerelease: bool,

    /// Drop promo products from the reference dataset
    #[arg(long)]
    exclude_promo: bool,
}

impl Args {
    /// Command-line settings win over the configuration file
    fn apply(&self, config: &mut TomlConfig) {
        if let Some(review) = self.review {
            config.review.surface = review.into();
        }
        if self.offline {
            config.verifier.enabled = false;
        }
        if let Some(concurrency) = self.concurrency {
            config.verifier.max_concurrency = concurrency;
        }
        if self.exclude_prerelease {
            config.filters.exclude_prerelease = true;
        }
        if self.exclude_promo {
            config.filters.exclude_promo = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    init_tracing(&config.logging)?;

    info!(
        "Starting manatcg v{} (git {}, built {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Collection: {}", args.collection.display());
    info!("Reference: {}", args.reference.display());

    let reference = load_reference(&args.reference, &config.filters).context("Failed to load reference dataset")?;
    let catalog = build_catalog(reference.records, &config.aliases);
    info!(records = catalog.len(), "Reference catalog indexed");

    let collection = read_collection(&args.collection).context("Failed to read collection export")?;

    let verifier = if config.verifier.enabled {
        let client = ScryfallClient::new(&config.verifier).context("Failed to create authority client")?;
        info!(base_url = %config.verifier.base_url, "Authority verification enabled");
        Some(Arc::new(ExternalVerifier::new(
            Arc::new(client),
            &config.verifier,
            &config.aliases,
        )))
    } else {
        info!("Authority verification disabled");
        None
    };

    let pipeline = Pipeline::new(&config, &catalog, verifier);
    let mut output = pipeline
        .run(&collection.rows, build_coordinator(config.review.surface))
        .await
        .context("Resolution failed")?;
    output.summary.unreadable_rows = collection.skipped;

    let directory = create_output_dir(&args.output_root, &config.output.directory_prefix, chrono::Local::now())
        .context("Failed to create output directory")?;
    let files = write_streams(&directory, &output.main, &output.authority, &output.given_up)
        .context("Failed to write output files")?;
    write_summary(&directory, &output.summary).context("Failed to write run summary")?;

    output.summary.log();
    info!("Output written to {}", files.directory.display());
    Ok(())
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over the configured level. Logs go to stderr, or are
/// appended to the configured file without colors.
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn build_coordinator(surface: ReviewSurfaceKind) -> ReviewCoordinator {
    match surface {
        ReviewSurfaceKind::Interactive => ReviewCoordinator::new(Box::new(TerminalSurface::new()))
            .with_fallback(Box::new(TextPromptSurface::stdio())),
        ReviewSurfaceKind::Text => ReviewCoordinator::new(Box::new(TextPromptSurface::stdio())),
        ReviewSurfaceKind::AutoTop => ReviewCoordinator::new(Box::new(BatchSurface::AutoTop)),
        ReviewSurfaceKind::SkipAll => ReviewCoordinator::new(Box::new(BatchSurface::SkipAll)),
    }
}
