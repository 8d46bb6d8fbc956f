/// Upstream data sources
///
/// The orchestrator only talks to the two traits defined here. The YouTube
/// implementations live in submodules; tests substitute in-memory fakes.

pub mod retry;
pub mod transcripts;
pub mod youtube;

pub use retry::{with_retry, RetryPolicy};
pub use transcripts::YouTubeTranscriptSource;
pub use youtube::{ChannelLister, SearchApi, SearchPage, SearchRequest, YouTubeSearchClient};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A video listed for a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateVideo {
    pub id: String,
    pub title: String,
    pub published: NaiveDate,
    pub thumbnail_url: String,
}

/// One caption line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub start_seconds: f64,
    pub text: String,
}

/// Caption lines in time order
pub type Transcript = Vec<TranscriptEntry>;

/// Result of asking for a transcript
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptOutcome {
    Available(Transcript),
    /// Captions turned off for the video
    Disabled,
    /// No captions in any preferred language
    NotFound,
    /// Upstream refused the request (rate limit or IP block)
    RateLimited(String),
    /// Anything else: network, timeout, parse failure
    TransientError(String),
}

impl TranscriptOutcome {
    /// Every outcome other than `Available` degrades to "no transcript"
    pub fn into_transcript(self) -> Option<Transcript> {
        match self {
            TranscriptOutcome::Available(transcript) => Some(transcript),
            _ => None,
        }
    }

    /// Disabled/NotFound are definitive answers and must not be retried
    pub fn is_definitive(&self) -> bool {
        !matches!(self, TranscriptOutcome::RateLimited(_) | TranscriptOutcome::TransientError(_))
    }
}

/// Lists candidate videos for a channel
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Return at most `max_results` videos, newest first.
    ///
    /// Upstream failures truncate the list; they never surface as errors.
    async fn list_videos(
        &self,
        channel_id: &str,
        max_results: usize,
        days_back: Option<u32>,
    ) -> Vec<CandidateVideo>;
}

/// Fetches a timestamped transcript for a video
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch_transcript(&self, video_id: &str) -> TranscriptOutcome;
}
