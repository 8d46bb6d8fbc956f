//! Aggregate report consumed by the frontend
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::mentions::{count_mentions, MentionMap};
use crate::persist::write_json_atomic;
use crate::roster::{Roster, RosterSource};
use crate::sources::CandidateVideo;

/// A video with at least one mention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub video_id: String,
    pub title: String,
    /// `YYYY-MM-DD`
    pub date: NaiveDate,
    pub thumbnail: String,
    /// Channel display name
    pub channel: String,
    pub mentions: MentionMap,
}

impl VideoRecord {
    /// `None` when there is nothing to report for the video
    pub fn from_mentions(video: &CandidateVideo, channel: &str, mentions: MentionMap) -> Option<Self> {
        if mentions.is_empty() {
            return None;
        }

        Some(Self {
            video_id: video.id.clone(),
            title: video.title.clone(),
            date: video.published,
            thumbnail: video.thumbnail_url.clone(),
            channel: channel.to_string(),
            mentions,
        })
    }

    pub fn mention_count(&self) -> usize {
        count_mentions(&self.mentions)
    }
}

/// Roster and coverage numbers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    pub pro_players: usize,
    pub friends: usize,
    pub total_tracked: usize,
    /// Distinct curated names mentioned anywhere in the report
    pub pro_players_mentioned: usize,
    /// Distinct user names mentioned anywhere in the report
    pub friends_mentioned: usize,
    pub total_mentions: usize,
}

/// Output document of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateReport {
    pub last_updated: DateTime<Utc>,
    pub channels: Vec<String>,
    pub players: Vec<String>,
    /// Newest first
    pub videos: Vec<VideoRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ReportStats>,
}

impl AggregateReport {
    /// Sort records newest first and compute roster coverage.
    ///
    /// The sort is stable, so same-day records keep their input order.
    pub fn assemble(
        channels: Vec<String>,
        roster: &Roster,
        mut videos: Vec<VideoRecord>,
        last_updated: DateTime<Utc>,
    ) -> Self {
        videos.retain(|record| !record.mentions.is_empty());
        videos.sort_by(|a, b| b.date.cmp(&a.date));

        let stats = Some(compute_stats(roster, &videos));

        Self {
            last_updated,
            channels,
            players: roster.names(),
            videos,
            stats,
        }
    }

    pub fn total_mentions(&self) -> usize {
        self.videos.iter().map(VideoRecord::mention_count).sum()
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Replace the report at `path` atomically
    pub async fn persist(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, self).await?;
        info!(
            "📊 Report written to {} ({} videos, {} mentions)",
            path.display(),
            self.videos.len(),
            self.total_mentions()
        );
        Ok(())
    }
}

fn compute_stats(roster: &Roster, videos: &[VideoRecord]) -> ReportStats {
    let roster_stats = roster.stats();

    let mentioned: BTreeSet<&str> = videos
        .iter()
        .flat_map(|record| record.mentions.keys().map(String::as_str))
        .collect();

    let mut pro_players_mentioned = 0;
    let mut friends_mentioned = 0;
    for name in mentioned {
        match roster.source_of(name) {
            Some(RosterSource::Curated) => pro_players_mentioned += 1,
            Some(RosterSource::User) => friends_mentioned += 1,
            None => {}
        }
    }

    ReportStats {
        pro_players: roster_stats.curated,
        friends: roster_stats.user,
        total_tracked: roster_stats.total_tracked,
        pro_players_mentioned,
        friends_mentioned,
        total_mentions: videos.iter().map(VideoRecord::mention_count).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mentions::Mention;
    use tempfile::TempDir;

    fn mention(seconds: u64) -> Mention {
        Mention {
            timestamp: crate::mentions::format_timestamp(seconds),
            offset_seconds: seconds,
            text: "line".to_string(),
        }
    }

    fn record(id: &str, date: (i32, u32, u32), names: &[&str]) -> VideoRecord {
        VideoRecord {
            video_id: id.to_string(),
            title: format!("Video {}", id),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            thumbnail: String::new(),
            channel: "Retals".to_string(),
            mentions: names.iter().map(|n| (n.to_string(), vec![mention(1)])).collect(),
        }
    }

    fn roster() -> Roster {
        Roster::from_lists(["Zen", "Vatira", "Kaydop"], ["Larry"])
    }

    #[test]
    fn test_videos_sorted_newest_first() {
        let videos = vec![
            record("a", (2024, 1, 5), &["Zen"]),
            record("b", (2024, 3, 1), &["Zen"]),
            record("c", (2023, 12, 31), &["Zen"]),
            record("d", (2024, 3, 1), &["Vatira"]),
        ];
        let report = AggregateReport::assemble(vec!["Retals".to_string()], &roster(), videos, Utc::now());

        let ids: Vec<&str> = report.videos.iter().map(|v| v.video_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_empty_mentions_never_reported() {
        let mut empty = record("e", (2024, 1, 1), &[]);
        empty.mentions.clear();
        let report = AggregateReport::assemble(vec![], &roster(), vec![empty], Utc::now());
        assert!(report.videos.is_empty());

        let video = CandidateVideo {
            id: "e".to_string(),
            title: "t".to_string(),
            published: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            thumbnail_url: String::new(),
        };
        assert!(VideoRecord::from_mentions(&video, "Retals", MentionMap::new()).is_none());
    }

    #[test]
    fn test_stats_split_by_source() {
        let videos = vec![
            record("a", (2024, 1, 1), &["Zen", "Larry"]),
            record("b", (2024, 1, 2), &["Zen"]),
        ];
        let report = AggregateReport::assemble(vec![], &roster(), videos, Utc::now());
        let stats = report.stats.unwrap();

        assert_eq!(stats.pro_players, 3);
        assert_eq!(stats.friends, 1);
        assert_eq!(stats.total_tracked, 4);
        assert_eq!(stats.pro_players_mentioned, 1);
        assert_eq!(stats.friends_mentioned, 1);
        assert_eq!(stats.total_mentions, 3);
        assert_eq!(report.players, vec!["Zen", "Vatira", "Kaydop", "Larry"]);
    }

    #[tokio::test]
    async fn test_document_layout() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("mentions.json");

        let report = AggregateReport::assemble(
            vec!["Retals".to_string()],
            &roster(),
            vec![record("abc", (2024, 3, 1), &["Zen"])],
            Utc::now(),
        );
        report.persist(&path).await.unwrap();

        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(json["lastUpdated"].is_string());
        assert_eq!(json["channels"][0], "Retals");
        assert_eq!(json["videos"][0]["videoId"], "abc");
        assert_eq!(json["videos"][0]["date"], "2024-03-01");
        assert_eq!(json["videos"][0]["mentions"]["Zen"][0]["time"], "0:01");
        assert_eq!(json["stats"]["proPlayersMentioned"], 1);

        let reloaded = AggregateReport::load(&path).await.unwrap();
        assert_eq!(reloaded, report);
    }
}
