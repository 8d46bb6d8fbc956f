use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cache::{fingerprint_of, CacheCounters, Fingerprint, MentionCache};
use crate::config::{ChannelConfig, Config};
use crate::mentions::{count_mentions, MentionExtractor, MentionMap};
use crate::report::{AggregateReport, VideoRecord};
use crate::roster::Roster;
use crate::sources::{CandidateVideo, TranscriptSource, VideoSource};

/// Where a listed video ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoOutcome {
    /// Fingerprint matched; cached mentions reused without fetching
    Reused,
    /// Freshly processed, nothing found (or no transcript)
    CachedEmpty,
    /// Freshly processed with this many mentions
    CachedWithMentions(usize),
}

/// Per-channel tallies
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelSummary {
    pub name: String,
    pub listed: usize,
    pub reused: usize,
    pub fetched: usize,
    /// Fetched videos whose transcript was not available
    pub transcripts_unavailable: usize,
    /// Of those, how many failed on upstream errors rather than a definitive answer
    pub transcript_errors: usize,
    /// Workers that died before reporting; their videos are cached empty
    pub worker_failures: usize,
    pub videos_with_mentions: usize,
    pub total_mentions: usize,
}

impl ChannelSummary {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    fn record(&mut self, outcome: VideoOutcome, mentions: usize) {
        match outcome {
            VideoOutcome::Reused => self.reused += 1,
            VideoOutcome::CachedEmpty | VideoOutcome::CachedWithMentions(_) => self.fetched += 1,
        }
        if mentions > 0 {
            self.videos_with_mentions += 1;
            self.total_mentions += mentions;
        }
    }
}

/// Records and tallies produced by one channel
#[derive(Debug, Clone)]
pub struct ChannelRun {
    pub summary: ChannelSummary,
    pub records: Vec<VideoRecord>,
}

/// Overall run results
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub channels: Vec<ChannelSummary>,
    pub report: AggregateReport,
    /// Lifetime counters after this run
    pub counters: CacheCounters,
    pub cancelled: bool,
    pub report_written: bool,
    /// Failed writes of the cache or report
    pub persistence_errors: Vec<String>,
    pub total_time: Duration,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.persistence_errors.is_empty()
    }
}

/// A freshly processed video coming back from a worker
struct WorkerResult {
    index: usize,
    video: CandidateVideo,
    fingerprint: Fingerprint,
    transcript_available: bool,
    /// False when the transcript outcome was an upstream failure
    definitive: bool,
    mentions: MentionMap,
    processing_time: Duration,
}

/// Drives channel listing, cache checks and transcript workers.
///
/// Workers only fetch and extract; every cache write happens here, after
/// results come back over the channel.
pub struct IndexingOrchestrator {
    config: Config,
    videos: Arc<dyn VideoSource>,
    transcripts: Arc<dyn TranscriptSource>,
    roster: Arc<Roster>,
    extractor: Arc<MentionExtractor>,
    cache: MentionCache,
    worker_semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl IndexingOrchestrator {
    pub fn new(
        config: Config,
        videos: Arc<dyn VideoSource>,
        transcripts: Arc<dyn TranscriptSource>,
        roster: Roster,
        cache: MentionCache,
    ) -> Self {
        let max_workers = config.indexing.max_workers.max(1);
        info!("🔧 Initializing IndexingOrchestrator with {} workers", max_workers);

        let extractor = MentionExtractor::new(&roster);
        info!("📚 Roster loaded: {} names, {} patterns", roster.len(), extractor.pattern_count());

        Self {
            config,
            videos,
            transcripts,
            roster: Arc::new(roster),
            extractor: Arc::new(extractor),
            cache,
            worker_semaphore: Arc::new(Semaphore::new(max_workers)),
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned token, e.g. one tripped by Ctrl-C
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cache(&self) -> &MentionCache {
        &self.cache
    }

    /// Index every configured channel, then persist cache and report.
    ///
    /// Never aborts midway: listing and transcript failures degrade per
    /// video, and write failures are collected into the summary. On
    /// cancellation in-flight work is drained and the cache saved, but
    /// the previous report is left in place.
    pub async fn run(&self) -> RunSummary {
        let start_time = Instant::now();

        info!(
            "🚀 Starting indexing run: {} channels, {} tracked names",
            self.config.channels.len(),
            self.roster.len()
        );

        let mut channels = Vec::new();
        let mut records = Vec::new();
        for channel in &self.config.channels {
            if self.cancel.is_cancelled() {
                warn!("🛑 Cancelled, skipping remaining channels");
                break;
            }
            let run = self.index_channel(channel).await;
            records.extend(run.records);
            channels.push(run.summary);
        }

        let cancelled = self.cancel.is_cancelled();
        let report = AggregateReport::assemble(
            self.config.channels.iter().map(|c| c.name.clone()).collect(),
            &self.roster,
            records,
            Utc::now(),
        );

        let mut persistence_errors = Vec::new();
        if let Err(e) = self.cache.persist().await {
            error!("❌ Failed to save cache to {}: {}", self.cache.path().display(), e);
            persistence_errors.push(format!("cache {}: {}", self.cache.path().display(), e));
        }

        let report_path = &self.config.output.report_path;
        let report_written = if cancelled {
            warn!("🛑 Run cancelled, keeping previous report at {}", report_path.display());
            false
        } else {
            match report.persist(report_path).await {
                Ok(()) => true,
                Err(e) => {
                    error!("❌ Failed to write report to {}: {}", report_path.display(), e);
                    persistence_errors.push(format!("report {}: {}", report_path.display(), e));
                    false
                }
            }
        };

        RunSummary {
            channels,
            report,
            counters: self.cache.counters().await,
            cancelled,
            report_written,
            persistence_errors,
            total_time: start_time.elapsed(),
        }
    }

    /// List one channel and bring every listed video to a terminal state
    pub async fn index_channel(&self, channel: &ChannelConfig) -> ChannelRun {
        info!("📺 Checking channel {} ({})", channel.name, channel.channel_id);
        let mut summary = ChannelSummary::new(&channel.name);

        let candidates = self
            .videos
            .list_videos(
                &channel.channel_id,
                self.config.indexing.max_results,
                self.config.indexing.days_back,
            )
            .await;
        self.cache.record_check(&channel.name).await;

        summary.listed = candidates.len();
        if candidates.is_empty() {
            warn!("No videos listed for {}", channel.name);
            return ChannelRun {
                summary,
                records: Vec::new(),
            };
        }
        info!("📹 Found {} videos for {}", candidates.len(), channel.name);

        let total_videos = candidates.len();
        let (tx, mut rx) = mpsc::channel(total_videos);
        let mut workers = JoinSet::new();
        let mut pending: BTreeMap<usize, (CandidateVideo, Fingerprint)> = BTreeMap::new();
        let mut records: Vec<(usize, VideoRecord)> = Vec::new();

        for (index, video) in candidates.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                warn!("🛑 Cancelled, not dispatching remaining videos for {}", channel.name);
                break;
            }

            let fingerprint = fingerprint_of(&video);
            if let Some(entry) = self.cache.lookup(&video.id).await {
                if entry.is_valid(&fingerprint) {
                    debug!("♻️ Cache hit for {}", video.id);
                    self.cache.record_hit().await;
                    summary.record(VideoOutcome::Reused, count_mentions(&entry.mentions));
                    if let Some(record) = VideoRecord::from_mentions(&video, &channel.name, entry.mentions) {
                        records.push((index, record));
                    }
                    continue;
                }
                info!("🔄 {} changed since last run, reprocessing", video.id);
            }

            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    warn!("🛑 Cancelled, not dispatching remaining videos for {}", channel.name);
                    break;
                }
                permit = Arc::clone(&self.worker_semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(e) => {
                        error!("Worker pool closed: {}", e);
                        break;
                    }
                },
            };

            info!("📹 Processing video {}/{}: {}", index + 1, total_videos, video.title);

            pending.insert(index, (video.clone(), fingerprint.clone()));
            let transcripts = Arc::clone(&self.transcripts);
            let extractor = Arc::clone(&self.extractor);
            let tx = tx.clone();

            workers.spawn(async move {
                let start_time = Instant::now();
                let outcome = transcripts.fetch_transcript(&video.id).await;
                let definitive = outcome.is_definitive();
                let (transcript_available, mentions) = match outcome.into_transcript() {
                    Some(transcript) => (true, extractor.extract(&transcript)),
                    None => (false, MentionMap::new()),
                };
                drop(permit);

                let result = WorkerResult {
                    index,
                    video,
                    fingerprint,
                    transcript_available,
                    definitive,
                    mentions,
                    processing_time: start_time.elapsed(),
                };
                if let Err(e) = tx.send(result).await {
                    error!("Failed to send result: {}", e);
                }
            });
        }

        // Close the channel once the last worker finishes
        drop(tx);

        while let Some(result) = rx.recv().await {
            pending.remove(&result.index);
            let mentions = count_mentions(&result.mentions);
            let outcome = if mentions == 0 {
                VideoOutcome::CachedEmpty
            } else {
                VideoOutcome::CachedWithMentions(mentions)
            };

            match outcome {
                VideoOutcome::CachedWithMentions(n) => info!(
                    "✅ {}: {} mentions in {:.2}s",
                    result.video.id,
                    n,
                    result.processing_time.as_secs_f64()
                ),
                _ => debug!("{}: no mentions", result.video.id),
            }

            if !result.transcript_available {
                summary.transcripts_unavailable += 1;
                if !result.definitive {
                    summary.transcript_errors += 1;
                }
            }
            summary.record(outcome, mentions);

            self.cache
                .put(&result.video.id, result.fingerprint, result.mentions.clone())
                .await;
            self.cache.record_new().await;

            if let Some(record) = VideoRecord::from_mentions(&result.video, &channel.name, result.mentions) {
                records.push((result.index, record));
            }
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("❌ Worker for {} failed: {}", channel.name, e);
            }
        }

        // A worker that died never reported; settle its video as empty
        for (_, (video, fingerprint)) in pending {
            warn!("⚠️ No result for {}, caching it without mentions", video.id);
            summary.worker_failures += 1;
            summary.transcripts_unavailable += 1;
            summary.record(VideoOutcome::CachedEmpty, 0);
            self.cache.put(&video.id, fingerprint, MentionMap::new()).await;
            self.cache.record_new().await;
        }

        records.sort_by_key(|(index, _)| *index);

        info!(
            "📊 {}: {} listed, {} reused, {} processed, {} with mentions",
            summary.name, summary.listed, summary.reused, summary.fetched, summary.videos_with_mentions
        );

        ChannelRun {
            summary,
            records: records.into_iter().map(|(_, record)| record).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_summary_tallies() {
        let mut summary = ChannelSummary::new("Retals");
        summary.record(VideoOutcome::Reused, 0);
        summary.record(VideoOutcome::Reused, 2);
        summary.record(VideoOutcome::CachedEmpty, 0);
        summary.record(VideoOutcome::CachedWithMentions(3), 3);

        assert_eq!(summary.reused, 2);
        assert_eq!(summary.fetched, 2);
        assert_eq!(summary.videos_with_mentions, 2);
        assert_eq!(summary.total_mentions, 5);
    }

    #[test]
    fn test_run_summary_success_depends_on_writes() {
        let report = AggregateReport::assemble(vec![], &Roster::new(), vec![], Utc::now());
        let mut summary = RunSummary {
            channels: vec![],
            report,
            counters: CacheCounters::default(),
            cancelled: false,
            report_written: true,
            persistence_errors: vec![],
            total_time: Duration::ZERO,
        };
        assert!(summary.is_success());

        summary.persistence_errors.push("cache: disk full".to_string());
        assert!(!summary.is_success());
    }
}
