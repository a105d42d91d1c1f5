use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use on_this_day::catalogue::{CatalogueStore, MonthDay, Today};
use on_this_day::config::{Config, Credentials, LoggingConfig};
use on_this_day::jobs::{self, DailyDigest, JobOutcome};
use on_this_day::reddit::RedditClient;
use on_this_day::render::format_video_list;
use on_this_day::youtube::{YouTubeClient, YouTubePlaylistPublisher};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "on-this-day")]
#[command(author = "TigreRoll")]
#[command(version)]
#[command(about = "Videos recorded on this day in past years")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to the first of the well-known locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the catalogue from the channel's uploads
    Fetch,
    /// Show the videos recorded on today's date
    Today {
        /// Look up another day instead (MM-DD)
        #[arg(long)]
        date: Option<MonthDay>,
    },
    /// Refresh the "On This Day" playlist
    Playlist {
        #[arg(long)]
        date: Option<MonthDay>,
    },
    /// Submit the daily post
    Post {
        /// Playlist to link in the post
        #[arg(long)]
        playlist_url: Option<String>,
        #[arg(long)]
        date: Option<MonthDay>,
    },
    /// Refresh the playlist, then post linking to it
    Publish {
        #[arg(long)]
        date: Option<MonthDay>,
    },
    /// Catalogue statistics
    Stats,
    /// Put the previous catalogue back from its backup
    RestoreBackup,
    /// Print the effective configuration, optionally writing it to a file
    ShowConfig {
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.logging, cli.verbose)?;
    config.validate()?;

    let credentials = Credentials::from_env();
    let store = CatalogueStore::new(&config.storage.videos_path, config.channel.placeholder());
    let timeout_seconds = config.http.timeout_seconds;

    if config.features.dry_run {
        info!("🧪 DRY RUN: nothing will be published");
    }

    match cli.command {
        Commands::Fetch => {
            let api_key = credentials.youtube_api_key()?;
            let client = YouTubeClient::new(api_key, timeout_seconds)?;

            info!("🔍 Resolving channel {}", config.channel.handle);
            let channel_info = jobs::resolve_channel(&client, &config).await?;
            let summary = jobs::rebuild_catalogue(&client, &config, &store, channel_info).await?;

            println!("Total videos:            {}", summary.stats.total_videos);
            println!("With recording dates:    {}", summary.stats.with_recording_date);
            println!("Without recording dates: {}", summary.stats.without_recording_date);
            println!("Skipped (unavailable):   {}", summary.report.skipped);
        }
        Commands::Today { date } => {
            let catalogue = store.load()?;
            let digest = DailyDigest::prepare(&catalogue, resolve_today(&config, date)?);

            println!("{}\n", digest.today.label());
            println!("{}", format_video_list(&digest.matches));
        }
        Commands::Playlist { date } => {
            let catalogue = store.load()?;
            let digest = DailyDigest::prepare(&catalogue, resolve_today(&config, date)?);
            warn_if_empty(&catalogue.videos);

            let outcome = digest
                .update_playlist(&config, || connect_playlist(&credentials, timeout_seconds))
                .await?;
            let summary = outcome
                .done()
                .map(|u| format!("{} ({}/{} added)", u.url, u.added, u.attempted));
            report("Playlist", &summary);
        }
        Commands::Post { playlist_url, date } => {
            let catalogue = store.load()?;
            let digest = DailyDigest::prepare(&catalogue, resolve_today(&config, date)?);
            warn_if_empty(&catalogue.videos);

            let outcome = digest
                .post_digest(&config, playlist_url.as_deref(), || {
                    connect_reddit(&credentials, timeout_seconds)
                })
                .await?;
            report("Post", &outcome.done().map(|p| p.url.clone()));
        }
        Commands::Publish { date } => {
            let catalogue = store.load()?;
            let digest = DailyDigest::prepare(&catalogue, resolve_today(&config, date)?);
            warn_if_empty(&catalogue.videos);

            let playlist = digest
                .update_playlist(&config, || connect_playlist(&credentials, timeout_seconds))
                .await?;
            let playlist_url = match &playlist {
                JobOutcome::Done(update) => Some(update.url.as_str()),
                JobOutcome::Skipped(_) => None,
            };

            let post = digest
                .post_digest(&config, playlist_url, || {
                    connect_reddit(&credentials, timeout_seconds)
                })
                .await?;

            report("Playlist", &playlist_url.map(str::to_string));
            report("Post", &post.done().map(|p| p.url.clone()));
        }
        Commands::Stats => {
            let catalogue = store.load()?;
            let stats = catalogue.stats();

            let channel = &catalogue.channel_info;
            println!(
                "Channel:                 {} ({})",
                channel.channel_name, channel.channel_handle
            );
            println!("Total videos:            {}", stats.total_videos);
            println!("With recording dates:    {}", stats.with_recording_date);
            println!("Without recording dates: {}", stats.without_recording_date);
            if let (Some(earliest), Some(latest)) = (stats.earliest, stats.latest) {
                println!("Date range:              {} to {}", earliest, latest);
            }
            if let Some(updated) = catalogue.channel_info.last_updated {
                println!("Last updated:            {}", updated.to_rfc3339());
            }
        }
        Commands::RestoreBackup => {
            store.restore_backup()?;
            println!("Restored {} from {}", store.path().display(), store.backup_path().display());
        }
        Commands::ShowConfig { write } => {
            println!("{}", config.summary());
            if let Some(path) = write {
                config.save(&path)?;
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let mut config = Config::from_file(path)?;
            config.apply_overrides(|key| std::env::var(key).ok());
            Ok(config)
        }
        None => Ok(Config::load()?),
    }
}

/// stdout plus an optional append-only log file. `RUST_LOG` wins over the
/// configured level.
fn init_logging(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("on_this_day={},warn", level)))
        .context("invalid log level")?;

    let file_layer = match &logging.file {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    Ok(())
}

/// Today in the configured zone, or the requested day in the current year
fn resolve_today(config: &Config, date: Option<MonthDay>) -> Result<Today> {
    let tz = config.date_parsing.tz()?;
    match date {
        None => Ok(Today::in_zone(tz)),
        Some(query) => {
            let year = Utc::now().with_timezone(&tz).year();
            Today::on(query, year).ok_or_else(|| anyhow!("{} is not a calendar day", query))
        }
    }
}

async fn connect_playlist(
    credentials: &Credentials,
    timeout_seconds: u64,
) -> Result<YouTubePlaylistPublisher> {
    let oauth = credentials.youtube_oauth()?;
    YouTubePlaylistPublisher::authorize(&oauth, timeout_seconds).await
}

async fn connect_reddit(credentials: &Credentials, timeout_seconds: u64) -> Result<RedditClient> {
    let reddit = credentials.reddit()?;
    RedditClient::authenticate(&reddit, timeout_seconds).await
}

fn warn_if_empty<T>(videos: &[T]) {
    if videos.is_empty() {
        warn!("📭 Catalogue is empty; run `on-this-day fetch` first");
    }
}

fn report(what: &str, url: &Option<String>) {
    match url {
        Some(url) => println!("{}: {}", what, url),
        None => println!("{}: not published", what),
    }
}
