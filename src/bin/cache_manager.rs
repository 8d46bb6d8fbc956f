use anyhow::Result;
use clap::{Parser, Subcommand};
use rocketscope_indexer::{count_mentions, CacheLoad, Config, MentionCache};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "cache-manager")]
#[command(about = "Video cache management utility")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Cache store path (defaults to the configured one)
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List cached videos, most recently processed first
    List,
    /// Get cache statistics
    Stats,
    /// Drop one video so it is reprocessed on the next run
    Invalidate {
        /// YouTube video id
        video_id: String,
    },
    /// Clear all cache entries (lifetime counters are kept)
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let cli = Cli::parse();

    let cache_path = match cli.cache {
        Some(path) => path,
        None => Config::load(cli.config.as_deref())?.output.cache_path,
    };

    let (cache, load) = MentionCache::load(cache_path).await;
    if load == CacheLoad::Corrupt {
        warn!("⚠️ Cache was unreadable; continuing with an empty one");
    }

    match cli.command {
        Commands::List => {
            let entries = cache.entries().await;

            if entries.is_empty() {
                info!("📭 No cached videos found");
                return Ok(());
            }

            info!("📚 Found {} cached videos:", entries.len());

            for entry in entries {
                let names: Vec<&str> = entry.mentions.keys().map(String::as_str).collect();
                info!(
                    "  {} - {} mentions, processed {}",
                    entry.video_id,
                    count_mentions(&entry.mentions),
                    entry.processed_at.format("%Y-%m-%d %H:%M")
                );
                if !names.is_empty() {
                    info!("    Names: {}", names.join(", "));
                }
            }
        }

        Commands::Stats => {
            let stats = cache.stats().await;
            info!("📊 Cache Statistics:");
            info!("  Cached videos: {}", stats.entries);
            info!("  Videos with mentions: {}", stats.entries_with_mentions);
            info!("  Total mentions: {}", stats.total_mentions);
            info!("  Cache hits (all-time): {}", stats.counters.cache_hits);
            info!("  New videos (all-time): {}", stats.counters.new_videos);
            info!("  Total processed (all-time): {}", stats.counters.total_processed);
            for (channel, checked) in &stats.last_check {
                info!("  Last check {}: {}", channel, checked.to_rfc3339());
            }
        }

        Commands::Invalidate { video_id } => {
            if cache.remove(&video_id).await {
                cache.persist().await?;
                info!("✅ Successfully invalidated cache for: {}", video_id);
            } else {
                warn!("⚠️ Video not in cache: {}", video_id);
            }
        }

        Commands::Clear => {
            let count = cache.clear().await;
            cache.persist().await?;
            info!("🧹 Cleared {} cached videos", count);
        }
    }

    Ok(())
}
