use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::retry::{with_retry, RetryPolicy};
use super::{CandidateVideo, VideoSource};
use crate::config::{ApiCredential, YouTubeConfig};
use crate::error::{IndexerError, Result};

/// Upstream page size ceiling
pub const MAX_PAGE_SIZE: usize = 50;

/// Consecutive empty pages tolerated before a token chain is abandoned
pub const MAX_EMPTY_PAGES: usize = 3;

/// Header carrying the Data API key, kept out of URLs that end up in logs
const API_KEY_HEADER: &str = "X-Goog-Api-Key";

/// One call to the search endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub channel_id: String,
    pub page_token: Option<String>,
    pub max_results: usize,
    /// RFC 3339 lower bound on publish time
    pub published_after: Option<String>,
}

/// Raw search response page
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub items: Vec<SearchItem>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub id: Option<SearchItemId>,
    #[serde(default)]
    pub snippet: Option<SearchSnippet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItemId {
    #[serde(default)]
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnippet {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Thumbnails {
    #[serde(default)]
    pub medium: Option<Thumbnail>,
    #[serde(default)]
    pub default: Option<Thumbnail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

impl SearchItem {
    /// Convert to a candidate, or None if the record is malformed
    pub fn to_candidate(&self) -> Option<CandidateVideo> {
        let id = self.id.as_ref()?.video_id.as_ref()?.clone();
        let snippet = self.snippet.as_ref()?;
        let title = snippet.title.clone()?;
        let published = parse_published_date(snippet.published_at.as_deref()?)?;
        let thumbnail_url = snippet
            .thumbnails
            .as_ref()
            .and_then(|t| t.medium.as_ref().or(t.default.as_ref()))
            .map(|t| t.url.clone())
            .unwrap_or_default();

        Some(CandidateVideo {
            id,
            title,
            published,
            thumbnail_url,
        })
    }
}

/// Date part of an RFC 3339 timestamp such as `2024-03-01T17:00:04Z`
fn parse_published_date(published_at: &str) -> Option<NaiveDate> {
    let date = published_at.get(..10)?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Lower publish bound for a lookback window, at midnight UTC.
///
/// A window reaching past the representable calendar means no floor.
pub fn published_after(days_back: Option<u32>, now: DateTime<Utc>) -> Option<String> {
    let days = days_back?;
    let floor = now.checked_sub_signed(ChronoDuration::days(i64::from(days)))?;
    Some(floor.format("%Y-%m-%dT00:00:00Z").to_string())
}

/// Raw page fetcher, the seam between pagination and HTTP
#[async_trait]
pub trait SearchApi: Send + Sync {
    async fn search_page(&self, request: &SearchRequest) -> Result<SearchPage>;
}

/// YouTube Data API v3 `search.list` client
pub struct YouTubeSearchClient {
    client: Client,
    credential: ApiCredential,
    config: YouTubeConfig,
    retry: RetryPolicy,
}

impl YouTubeSearchClient {
    pub fn new(config: YouTubeConfig, credential: ApiCredential) -> Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_seconds);
        let client = Client::builder().timeout(timeout).build()?;
        let retry = RetryPolicy::new(
            config.max_retries,
            Duration::from_millis(config.initial_backoff_ms),
            timeout,
        );

        Ok(Self {
            client,
            credential,
            config,
            retry,
        })
    }

    fn search_url(&self, request: &SearchRequest) -> Result<url::Url> {
        let mut params: Vec<(&str, String)> = vec![
            ("part", "snippet".to_string()),
            ("channelId", request.channel_id.clone()),
            ("maxResults", request.max_results.min(MAX_PAGE_SIZE).to_string()),
            ("order", "date".to_string()),
            ("type", "video".to_string()),
        ];
        if let Some(token) = &request.page_token {
            params.push(("pageToken", token.clone()));
        }
        if let Some(after) = &request.published_after {
            params.push(("publishedAfter", after.clone()));
        }

        let base = format!("{}/search", self.config.api_base.trim_end_matches('/'));
        url::Url::parse_with_params(&base, &params)
            .map_err(|e| IndexerError::Config(format!("invalid api_base '{}': {}", self.config.api_base, e)))
    }

    async fn search_page_once(&self, url: url::Url) -> Result<SearchPage> {
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, self.credential.expose())
            .send()
            .await
            .map_err(|e| IndexerError::Http(e.without_url()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(IndexerError::UpstreamStatus { status, body });
        }

        response
            .json::<SearchPage>()
            .await
            .map_err(|e| IndexerError::Http(e.without_url()))
    }
}

#[async_trait]
impl SearchApi for YouTubeSearchClient {
    async fn search_page(&self, request: &SearchRequest) -> Result<SearchPage> {
        let url = self.search_url(request)?;
        let label = format!("search {}", request.channel_id);
        with_retry(&self.retry, &label, || self.search_page_once(url.clone())).await
    }
}

/// Paginates a [`SearchApi`] into a bounded list of candidates
pub struct ChannelLister<A> {
    api: A,
}

impl<A: SearchApi> ChannelLister<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Pagination with an explicit clock, used by [`VideoSource::list_videos`]
    pub async fn list_videos_at(
        &self,
        channel_id: &str,
        max_results: usize,
        days_back: Option<u32>,
        now: DateTime<Utc>,
    ) -> Vec<CandidateVideo> {
        let published_after = published_after(days_back, now);
        let mut videos = Vec::new();
        let mut page_token: Option<String> = None;
        let mut empty_pages = 0;

        info!("🔍 Searching for videos in channel: {}", channel_id);
        if let Some(after) = &published_after {
            info!("📅 Looking for videos after: {}", &after[..10]);
        }

        while videos.len() < max_results {
            let request = SearchRequest {
                channel_id: channel_id.to_string(),
                page_token: page_token.take(),
                max_results: (max_results - videos.len()).min(MAX_PAGE_SIZE),
                published_after: published_after.clone(),
            };

            let page = match self.api.search_page(&request).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("❌ Listing for {} stopped after {} videos: {}", channel_id, videos.len(), e);
                    break;
                }
            };

            if page.items.is_empty() {
                empty_pages += 1;
                if empty_pages >= MAX_EMPTY_PAGES {
                    warn!("Listing for {} stopped after {} empty pages", channel_id, empty_pages);
                    break;
                }
                debug!("Empty page for {}, following token", channel_id);
            } else {
                empty_pages = 0;
            }

            for item in &page.items {
                if videos.len() >= max_results {
                    break;
                }
                match item.to_candidate() {
                    Some(video) => videos.push(video),
                    None => warn!("Skipping malformed search item in {}: {:?}", channel_id, item),
                }
            }

            debug!("Fetched {} videos...", videos.len());

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        videos
    }
}

#[async_trait]
impl<A: SearchApi> VideoSource for ChannelLister<A> {
    async fn list_videos(
        &self,
        channel_id: &str,
        max_results: usize,
        days_back: Option<u32>,
    ) -> Vec<CandidateVideo> {
        self.list_videos_at(channel_id, max_results, days_back, Utc::now()).await
    }
}
