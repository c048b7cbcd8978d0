use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ytm2tidal::config::{AppConfig, CliConfig, FileConfig};
use ytm2tidal::download::DownloadPool;
use ytm2tidal::driver::{tally_line, BatchDriver};
use ytm2tidal::engine::Reconciler;
use ytm2tidal::library::{prepare_batch, LikedSongsExport};
use ytm2tidal::progress::{create_spinner, format_duration, set_log_only};
use ytm2tidal::report::RunReport;
use ytm2tidal::safety::prepare_download_dir;
use ytm2tidal::tidal::TidalCatalog;

#[derive(Parser)]
#[command(name = "ytm2tidal")]
#[command(about = "Migrate YouTube Music liked songs to TIDAL favorites")]
struct Args {
    /// Liked songs export (JSON) of the YouTube Music account
    #[arg(long)]
    source: PathBuf,

    /// Number of most recently liked tracks to migrate
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    limit: u32,

    /// TOML config file (defaults to ./ytm2tidal.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, env = "TIDAL_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    #[arg(long, env = "TIDAL_USER_ID")]
    user_id: Option<u64>,

    #[arg(long)]
    country_code: Option<String>,

    /// Download tracks added to favorites
    #[arg(long)]
    download: bool,

    /// Also download tracks that were already favorites
    #[arg(long)]
    download_favorites: bool,

    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// Pause between tracks, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// SQLite file that records the outcome of every track
    #[arg(long)]
    report: Option<PathBuf>,

    /// Hide progress bars and print plain lines (for logs / tail -f)
    #[arg(long)]
    log_only: bool,
}

impl Args {
    fn cli_config(&self) -> CliConfig {
        CliConfig {
            access_token: self.access_token.clone(),
            user_id: self.user_id,
            country_code: self.country_code.clone(),
            download: self.download,
            download_favorites: self.download_favorites,
            download_dir: self.download_dir.clone(),
            delay_ms: self.delay_ms,
            report: self.report.clone(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    set_log_only(args.log_only);

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let start = Instant::now();

    let file_config = FileConfig::discover(args.config.as_deref())?;
    let config = AppConfig::resolve(&args.cli_config(), file_config)?;
    let limit = args.limit as usize;

    let spinner = create_spinner("Reading liked songs");
    let library = LikedSongsExport::new(&args.source);
    let tracks = prepare_batch(&library, limit)?;
    spinner.finish_and_clear();
    info!(
        "Loaded {} liked tracks from {:?} (oldest first)",
        tracks.len(),
        library.path()
    );

    let catalog = Arc::new(TidalCatalog::new(config.tidal.clone()));
    let reconciler = Reconciler::new(Arc::clone(&catalog), config.blacklist.clone());
    let mut driver = BatchDriver::new(reconciler, config.delay);

    if config.download.policy.enabled {
        let dir = prepare_download_dir(&config.download.dir)?;
        let pool = DownloadPool::start(
            config.download.workers,
            config.download.queue_capacity,
            catalog.clone(),
            dir,
        )?;
        driver = driver.with_downloads(pool, config.download.policy);
    }

    if let Some(path) = &config.report {
        let report = RunReport::create(path, limit)?;
        info!("Recording run {} in {:?}", report.run_id(), path);
        driver = driver.with_report(report);
    }

    let summary = driver.run(&tracks);

    println!("{}", tally_line(&summary));
    if let Some(downloads) = summary.downloads {
        println!(
            "Downloads: {} completed, {} skipped, {} failed",
            downloads.completed, downloads.skipped, downloads.failed
        );
    }
    info!("Total time: {}", format_duration(start.elapsed()));

    Ok(())
}
