use anyhow::{Context, Result};
use clap::Parser;
use rocketscope_indexer::config::parse_channel_arg;
use rocketscope_indexer::sources::{ChannelLister, YouTubeSearchClient, YouTubeTranscriptSource};
use rocketscope_indexer::{
    ApiCredential, ChannelConfig, Config, IndexingOrchestrator, MentionCache, Roster, RosterLoad,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "rocketscope-indexer")]
#[command(version, author = "TigreRoll")]
#[command(about = "Index player mentions in YouTube channel transcripts")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Only index videos published within this many days
    #[arg(short, long, value_name = "DAYS", conflicts_with = "all_time")]
    days_back: Option<u32>,

    /// Index the whole channel history
    #[arg(long)]
    all_time: bool,

    /// Maximum videos listed per channel
    #[arg(long, value_name = "NUM")]
    max_results: Option<usize>,

    /// Number of parallel transcript workers
    #[arg(short, long, value_name = "NUM")]
    workers: Option<usize>,

    /// Cache store path
    #[arg(long, value_name = "FILE")]
    cache: Option<PathBuf>,

    /// Report output path
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Channel to index as NAME=CHANNEL_ID (repeatable, replaces configured channels)
    #[arg(long = "channel", value_name = "NAME=ID", value_parser = parse_channel_arg)]
    channels: Vec<ChannelConfig>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(&self, mut config: Config) -> Config {
        if self.all_time {
            config.indexing.days_back = None;
        } else if let Some(days) = self.days_back {
            config.indexing.days_back = Some(days);
        }
        if let Some(max_results) = self.max_results {
            config.indexing.max_results = max_results;
        }
        if let Some(workers) = self.workers {
            config.indexing.max_workers = workers;
        }
        if let Some(cache) = &self.cache {
            config.output.cache_path = cache.clone();
        }
        if let Some(output) = &self.output {
            config.output.report_path = output.clone();
        }
        if !self.channels.is_empty() {
            config.channels = self.channels.clone();
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose {
        "rocketscope_indexer=debug,warn"
    } else {
        "rocketscope_indexer=info,warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Credential first: nothing is read or written without it
    let credential = match ApiCredential::from_env() {
        Ok(credential) => credential,
        Err(e) => {
            error!("❌ {}", e);
            return Err(e).context("set YOUTUBE_API_KEY in the environment or a .env file");
        }
    };

    let config = cli.apply(Config::load(cli.config.as_deref())?);
    config.validate()?;

    info!("🚀 RocketScope Indexer starting...");
    for line in config.summary().lines() {
        info!("{}", line);
    }

    let (roster, roster_load) = Roster::load(config.roster.user_roster_file.as_deref()).await;
    if let RosterLoad::FallbackUsed(count) = roster_load {
        warn!("Using {} example friends; create a roster file to track your own", count);
    }

    let (cache, _) = MentionCache::load(config.output.cache_path.clone()).await;

    let search = YouTubeSearchClient::new(config.youtube.clone(), credential)?;
    let videos = Arc::new(ChannelLister::new(search));
    let transcripts = Arc::new(YouTubeTranscriptSource::new(&config.transcripts));

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("🛑 Interrupt received, finishing in-flight videos...");
                cancel.cancel();
            }
        });
    }

    let orchestrator = IndexingOrchestrator::new(config, videos, transcripts, roster, cache)
        .with_cancellation(cancel);
    let summary = orchestrator.run().await;

    // Print results
    info!("🎉 Indexing completed in {:.2}s", summary.total_time.as_secs_f64());
    for channel in &summary.channels {
        info!(
            "  {}: {} listed, {} reused, {} processed, {} no transcript ({} upstream errors), {} with mentions",
            channel.name,
            channel.listed,
            channel.reused,
            channel.fetched,
            channel.transcripts_unavailable,
            channel.transcript_errors,
            channel.videos_with_mentions
        );
    }
    info!("📹 Videos with mentions: {}", summary.report.videos.len());
    if let Some(stats) = summary.report.stats {
        info!(
            "👥 Tracking {} names ({} pro players, {} friends)",
            stats.total_tracked, stats.pro_players, stats.friends
        );
        info!(
            "🎯 Mentioned: {} pro players, {} friends, {} mentions total",
            stats.pro_players_mentioned, stats.friends_mentioned, stats.total_mentions
        );
    }
    info!(
        "💾 Cache: {} hits, {} new videos, {} processed all-time",
        summary.counters.cache_hits, summary.counters.new_videos, summary.counters.total_processed
    );

    if !summary.is_success() {
        for e in &summary.persistence_errors {
            error!("❌ {}", e);
        }
        anyhow::bail!("{} output file(s) could not be saved", summary.persistence_errors.len());
    }

    if summary.cancelled {
        warn!("🛑 Run interrupted; cache saved, report unchanged");
        std::process::exit(130);
    }

    Ok(())
}
