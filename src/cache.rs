//! Change-aware cache of per-video mention results
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::mentions::{count_mentions, MentionMap};
use crate::persist::write_json_atomic;
use crate::sources::CandidateVideo;

/// Change-detection hash over a video's title and publish date
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint of a listed video.
///
/// Covers title and publish date only; a caption edit that leaves both
/// untouched does not invalidate the cached entry.
pub fn fingerprint_of(video: &CandidateVideo) -> Fingerprint {
    let content = format!("{}-{}", video.title, video.published.format("%Y-%m-%d"));
    Fingerprint(format!("{:x}", md5::compute(content.as_bytes())))
}

/// Stored result for one video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Filled from the map key on load
    #[serde(skip)]
    pub video_id: String,
    pub fingerprint: Fingerprint,
    #[serde(default)]
    pub mentions: MentionMap,
    pub processed_at: DateTime<Utc>,
}

impl CacheEntry {
    /// True iff the entry was computed for the current fingerprint
    pub fn is_valid(&self, current: &Fingerprint) -> bool {
        &self.fingerprint == current
    }
}

/// Lifetime throughput counters, added to on every run and never reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheCounters {
    #[serde(default)]
    pub cache_hits: u64,
    #[serde(default)]
    pub new_videos: u64,
    #[serde(default)]
    pub total_processed: u64,
}

/// On-disk layout of the cache store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheFile {
    #[serde(default)]
    processed_videos: BTreeMap<String, CacheEntry>,
    #[serde(default)]
    last_check: BTreeMap<String, DateTime<Utc>>,
    #[serde(default)]
    stats: CacheCounters,
}

/// How the store was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLoad {
    Loaded(usize),
    Missing,
    /// Unreadable or unparsable; started empty
    Corrupt,
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub entries_with_mentions: usize,
    pub total_mentions: usize,
    pub counters: CacheCounters,
    pub last_check: BTreeMap<String, DateTime<Utc>>,
}

/// Durable map from video id to fingerprint and mention results.
///
/// Cloning shares the underlying store.
#[derive(Debug, Clone)]
pub struct MentionCache {
    path: PathBuf,
    inner: Arc<RwLock<CacheFile>>,
}

impl MentionCache {
    /// Empty cache that will persist to `path`
    pub fn empty(path: PathBuf) -> Self {
        Self {
            path,
            inner: Arc::new(RwLock::new(CacheFile::default())),
        }
    }

    /// Open the store at `path`. Never fails: a missing or corrupt store
    /// yields an empty cache, and a corrupt file is moved aside first.
    pub async fn load(path: PathBuf) -> (Self, CacheLoad) {
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("💾 No cache at {}, starting fresh", path.display());
                return (Self::empty(path), CacheLoad::Missing);
            }
            Err(e) => {
                warn!("⚠️ Cache load error for {}: {}", path.display(), e);
                return (Self::empty(path), CacheLoad::Corrupt);
            }
        };

        match serde_json::from_str::<CacheFile>(&content) {
            Ok(mut file) => {
                for (video_id, entry) in file.processed_videos.iter_mut() {
                    entry.video_id = video_id.clone();
                }
                let count = file.processed_videos.len();
                info!("💾 Cache loaded: {} videos cached", count);
                let cache = Self {
                    path,
                    inner: Arc::new(RwLock::new(file)),
                };
                (cache, CacheLoad::Loaded(count))
            }
            Err(e) => {
                warn!("⚠️ Cache at {} is corrupt ({}), starting fresh", path.display(), e);
                let backup = path.with_extension("json.corrupt");
                if let Err(e) = tokio::fs::rename(&path, &backup).await {
                    warn!("Failed to move corrupt cache aside: {}", e);
                } else {
                    info!("📦 Corrupt cache preserved at {}", backup.display());
                }
                (Self::empty(path), CacheLoad::Corrupt)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn lookup(&self, video_id: &str) -> Option<CacheEntry> {
        self.inner.read().await.processed_videos.get(video_id).cloned()
    }

    /// Store a result, replacing any previous entry for the video
    pub async fn put(&self, video_id: &str, fingerprint: Fingerprint, mentions: MentionMap) {
        let entry = CacheEntry {
            video_id: video_id.to_string(),
            fingerprint,
            mentions,
            processed_at: Utc::now(),
        };
        debug!("💾 Caching {} ({} mentions)", video_id, count_mentions(&entry.mentions));
        self.inner
            .write()
            .await
            .processed_videos
            .insert(video_id.to_string(), entry);
    }

    /// Drop one entry so the video is reprocessed next run
    pub async fn remove(&self, video_id: &str) -> bool {
        self.inner.write().await.processed_videos.remove(video_id).is_some()
    }

    /// Drop all entries; counters and check times are kept
    pub async fn clear(&self) -> usize {
        let mut inner = self.inner.write().await;
        let count = inner.processed_videos.len();
        inner.processed_videos.clear();
        count
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.processed_videos.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Entries sorted newest first
    pub async fn entries(&self) -> Vec<CacheEntry> {
        let mut entries: Vec<CacheEntry> = self.inner.read().await.processed_videos.values().cloned().collect();
        entries.sort_by(|a, b| b.processed_at.cmp(&a.processed_at));
        entries
    }

    pub async fn record_hit(&self) {
        let mut inner = self.inner.write().await;
        inner.stats.cache_hits += 1;
        inner.stats.total_processed += 1;
    }

    pub async fn record_new(&self) {
        let mut inner = self.inner.write().await;
        inner.stats.new_videos += 1;
        inner.stats.total_processed += 1;
    }

    /// Stamp the time a channel listing was attempted
    pub async fn record_check(&self, channel: &str) {
        self.inner
            .write()
            .await
            .last_check
            .insert(channel.to_string(), Utc::now());
    }

    pub async fn counters(&self) -> CacheCounters {
        self.inner.read().await.stats
    }

    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.read().await;
        let with_mentions = inner
            .processed_videos
            .values()
            .filter(|entry| !entry.mentions.is_empty())
            .count();
        let total_mentions = inner
            .processed_videos
            .values()
            .map(|entry| count_mentions(&entry.mentions))
            .sum();

        CacheStats {
            entries: inner.processed_videos.len(),
            entries_with_mentions: with_mentions,
            total_mentions,
            counters: inner.stats,
            last_check: inner.last_check.clone(),
        }
    }

    /// Write the whole store atomically to its path
    pub async fn persist(&self) -> Result<()> {
        let snapshot = self.inner.read().await.clone();
        write_json_atomic(&self.path, &snapshot).await?;
        info!("💾 Saved cache ({} videos) to {}", snapshot.processed_videos.len(), self.path.display());
        Ok(())
    }
}
