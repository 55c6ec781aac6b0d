//! scopecrawl: scoped, crash-resumable web crawler

use anyhow::Result;
use clap::{Parser, Subcommand};
use scopecrawl::config::{Config, LogFormat};
use scopecrawl::crawl::{CrawlerPool, Frontier};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "scopecrawl")]
#[command(about = "Scoped, crash-resumable web crawler")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "scopecrawl.toml")]
    config: PathBuf,

    /// Data directory override
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the crawl, resuming previous progress by default
    Crawl {
        /// Discard previous progress and start from the seeds
        #[arg(long)]
        restart: bool,

        /// Report output path override
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Show frontier progress from the persisted store
    Stats,

    /// Write a default configuration file
    Init {
        /// Output directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };
    if let Some(data_dir) = cli.data_dir {
        config.crawl.data_dir = data_dir;
    }
    std::fs::create_dir_all(&config.crawl.data_dir)?;

    // -v / -vv override the configured level
    let log_level = match cli.verbose {
        0 => config.logging.level.as_tracing(),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let builder = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false);
    match config.logging.format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }

    match cli.command {
        Commands::Crawl { restart, report } => {
            if let Some(report) = report {
                config.report.output_path = report;
            }
            run_crawl(config, restart).await
        }
        Commands::Stats => show_stats(config),
        Commands::Init { path } => init_config(path),
    }
}

async fn run_crawl(config: Config, restart: bool) -> Result<()> {
    let pool = CrawlerPool::new(config, restart)?;
    let ctx = pool.context();

    let interrupt_ctx = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping workers after their current page");
            interrupt_ctx.request_stop();
        }
    });

    let stats = pool.run().await?;

    ctx.reporter.write()?;
    info!(
        "done: {} unique pages, {} urls discovered",
        ctx.reporter.unique_pages(),
        ctx.frontier.discovered_count()
    );
    info!(
        "{} processed, {} failures, {} robots-denied, {} near-duplicates",
        stats.pages_processed, stats.fetch_failures, stats.robots_denied, stats.near_duplicates
    );
    Ok(())
}

fn show_stats(config: Config) -> Result<()> {
    let frontier = Frontier::open(&config.crawl, false)?;
    println!("URLs discovered: {}", frontier.discovered_count());
    println!("URLs pending:    {}", frontier.pending_count());
    Ok(())
}

fn init_config(path: PathBuf) -> Result<()> {
    let config_path = path.join("scopecrawl.toml");
    if config_path.exists() {
        anyhow::bail!("{} already exists", config_path.display());
    }

    let content = toml::to_string_pretty(&Config::default())?;
    std::fs::write(&config_path, content)?;
    println!("Created {}", config_path.display());
    Ok(())
}
