use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};
use yt_transcript_rs::api::YouTubeTranscriptApi;
use yt_transcript_rs::errors::{CouldNotRetrieveTranscript, CouldNotRetrieveTranscriptReason};

use super::retry::{with_retry, RetryPolicy};
use super::{Transcript, TranscriptEntry, TranscriptOutcome, TranscriptSource};
use crate::config::TranscriptConfig;
use crate::error::{IndexerError, Result};

/// Definitive answers from the transcript service
#[derive(Debug, Clone, PartialEq)]
enum Fetched {
    Available(Transcript),
    Disabled,
    NotFound,
}

/// Transcript source backed by YouTube's caption tracks
pub struct YouTubeTranscriptSource {
    languages: Vec<String>,
    retry: RetryPolicy,
}

impl YouTubeTranscriptSource {
    pub fn new(config: &TranscriptConfig) -> Self {
        Self {
            languages: config.languages.clone(),
            retry: RetryPolicy::new(
                config.max_retries,
                Duration::from_millis(config.initial_backoff_ms),
                Duration::from_secs(config.request_timeout_seconds),
            ),
        }
    }

    async fn fetch_once(&self, video_id: &str) -> Result<Fetched> {
        let api = YouTubeTranscriptApi::new(None, None, None)
            .map_err(|e| IndexerError::Transcript(e.to_string()))?;
        let languages: Vec<&str> = self.languages.iter().map(String::as_str).collect();

        match api.fetch_transcript(video_id, &languages, false).await {
            Ok(fetched) => {
                let transcript: Transcript = fetched
                    .into_iter()
                    .map(|snippet| TranscriptEntry {
                        start_seconds: snippet.start.max(0.0),
                        text: snippet.text,
                    })
                    .collect();
                Ok(Fetched::Available(transcript))
            }
            Err(e) => classify_error(&e),
        }
    }
}

/// Split library errors into definitive outcomes and retryable failures.
///
/// Anything about the video itself (gone, private, age-gated, bad id) is
/// as final as missing captions; only blocks and transport trouble retry.
fn classify_error(error: &CouldNotRetrieveTranscript) -> Result<Fetched> {
    use CouldNotRetrieveTranscriptReason as Reason;

    match &error.reason {
        Some(Reason::TranscriptsDisabled) => Ok(Fetched::Disabled),
        Some(Reason::NoTranscriptFound { .. })
        | Some(Reason::VideoUnavailable)
        | Some(Reason::VideoUnplayable { .. })
        | Some(Reason::InvalidVideoId)
        | Some(Reason::AgeRestricted)
        | Some(Reason::TranslationUnavailable(_))
        | Some(Reason::TranslationLanguageUnavailable(_)) => Ok(Fetched::NotFound),
        Some(Reason::IpBlocked(_)) | Some(Reason::RequestBlocked(_)) => {
            Err(IndexerError::RateLimited(error.to_string()))
        }
        Some(Reason::FailedToCreateConsentCookie)
        | Some(Reason::YouTubeRequestFailed(_))
        | Some(Reason::YouTubeDataUnparsable(_))
        | None => {
            let message = error.to_string();
            if is_block_message(&message) {
                Err(IndexerError::RateLimited(message))
            } else {
                Err(IndexerError::Transcript(message))
            }
        }
    }
}

/// YouTube reports throttling as an IP/request block or a 429
fn is_block_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("blocked") || message.contains("too many requests") || message.contains("429")
}

#[async_trait]
impl TranscriptSource for YouTubeTranscriptSource {
    async fn fetch_transcript(&self, video_id: &str) -> TranscriptOutcome {
        let label = format!("transcript {}", video_id);
        match with_retry(&self.retry, &label, || self.fetch_once(video_id)).await {
            Ok(Fetched::Available(transcript)) => {
                debug!("Fetched {} caption lines for {}", transcript.len(), video_id);
                TranscriptOutcome::Available(transcript)
            }
            Ok(Fetched::Disabled) => {
                info!("🔇 Transcripts disabled for {}", video_id);
                TranscriptOutcome::Disabled
            }
            Ok(Fetched::NotFound) => {
                info!("🔇 No transcript in {:?} for {}", self.languages, video_id);
                TranscriptOutcome::NotFound
            }
            Err(IndexerError::RateLimited(message)) => {
                warn!("⚠️ Rate limited fetching transcript for {}: {}", video_id, message);
                TranscriptOutcome::RateLimited(message)
            }
            Err(e) => {
                warn!("⚠️ Error getting transcript for {}: {}", video_id, e);
                TranscriptOutcome::TransientError(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_detection() {
        assert!(is_block_message("YouTube is blocking requests from your IP: IP blocked"));
        assert!(is_block_message("Request blocked"));
        assert!(is_block_message("HTTP 429 Too Many Requests"));
        assert!(!is_block_message("connection reset by peer"));
    }

    fn failure(reason: CouldNotRetrieveTranscriptReason) -> CouldNotRetrieveTranscript {
        CouldNotRetrieveTranscript {
            video_id: "abc".to_string(),
            reason: Some(reason),
        }
    }

    #[test]
    fn test_video_level_failures_are_definitive() {
        let definitive = vec![
            CouldNotRetrieveTranscriptReason::VideoUnavailable,
            CouldNotRetrieveTranscriptReason::InvalidVideoId,
            CouldNotRetrieveTranscriptReason::AgeRestricted,
            CouldNotRetrieveTranscriptReason::VideoUnplayable {
                reason: Some("Private video".to_string()),
                sub_reasons: vec![],
            },
        ];
        for reason in definitive {
            assert_eq!(classify_error(&failure(reason)).unwrap(), Fetched::NotFound);
        }

        assert_eq!(
            classify_error(&failure(CouldNotRetrieveTranscriptReason::TranscriptsDisabled)).unwrap(),
            Fetched::Disabled
        );
    }

    #[test]
    fn test_blocks_and_transport_failures_retry() {
        let blocked = classify_error(&failure(CouldNotRetrieveTranscriptReason::IpBlocked(None))).unwrap_err();
        assert!(matches!(blocked, IndexerError::RateLimited(_)));
        assert!(blocked.is_transient());

        let request_failed = classify_error(&failure(CouldNotRetrieveTranscriptReason::YouTubeRequestFailed(
            "connection reset by peer".to_string(),
        )))
        .unwrap_err();
        assert!(matches!(request_failed, IndexerError::Transcript(_)));
        assert!(request_failed.is_transient());
    }

    #[test]
    fn test_source_uses_configured_languages() {
        let config = TranscriptConfig {
            languages: vec!["en".to_string(), "en-GB".to_string()],
            max_retries: 1,
            ..TranscriptConfig::default()
        };
        let source = YouTubeTranscriptSource::new(&config);
        assert_eq!(source.languages, vec!["en", "en-GB"]);
        assert_eq!(source.retry.max_retries, 1);
    }

}
