/// RocketScope Indexer
///
/// Incremental indexer for YouTube channels: lists recent uploads, scans
/// their transcripts for tracked player names and keeps a fingerprinted
/// cache so unchanged videos are never fetched twice.

pub mod cache;
pub mod config;
pub mod error;
pub mod mentions;
pub mod persist;
pub mod processing;
pub mod report;
pub mod roster;
pub mod sources;

// Re-export main types for easy access
pub use crate::cache::{fingerprint_of, CacheEntry, CacheLoad, Fingerprint, MentionCache};
pub use crate::config::{ApiCredential, ChannelConfig, Config, ConfigBuilder};
pub use crate::error::{IndexerError, Result};
pub use crate::mentions::{count_mentions, extract, format_timestamp, Mention, MentionExtractor, MentionMap};
pub use crate::processing::{ChannelSummary, IndexingOrchestrator, RunSummary, VideoOutcome};
pub use crate::report::{AggregateReport, ReportStats, VideoRecord};
pub use crate::roster::{Roster, RosterLoad, RosterSource};
pub use crate::sources::{
    CandidateVideo, Transcript, TranscriptEntry, TranscriptOutcome, TranscriptSource, VideoSource,
};
