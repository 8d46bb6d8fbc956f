use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::roster::Roster;
use crate::sources::TranscriptEntry;

/// One timestamped occurrence of a tracked name.
///
/// The name itself is the key of the enclosing [`MentionMap`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    /// `H:MM:SS` or `M:SS`
    #[serde(rename = "time")]
    pub timestamp: String,
    #[serde(rename = "seconds")]
    pub offset_seconds: u64,
    /// Full caption line containing the match
    pub text: String,
}

/// Mentions per name, each list in transcript order
pub type MentionMap = BTreeMap<String, Vec<Mention>>;

/// Total number of mentions across all names
pub fn count_mentions(mentions: &MentionMap) -> usize {
    mentions.values().map(Vec::len).sum()
}

/// Format whole seconds as `H:MM:SS`, or `M:SS` under an hour
pub fn format_timestamp(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Case-insensitive, word-bounded matcher for every roster name
#[derive(Debug, Clone)]
pub struct MentionExtractor {
    patterns: Vec<(String, Regex)>,
}

impl MentionExtractor {
    pub fn new(roster: &Roster) -> Self {
        let patterns = roster
            .iter()
            .filter_map(|tracked| {
                let pattern = format!(r"\b{}\b", regex::escape(&tracked.name));
                match RegexBuilder::new(&pattern).case_insensitive(true).build() {
                    Ok(regex) => Some((tracked.name.clone(), regex)),
                    Err(e) => {
                        warn!("Skipping roster name {:?}: {}", tracked.name, e);
                        None
                    }
                }
            })
            .collect();

        Self { patterns }
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Scan a transcript; each line counts at most once per name.
    pub fn extract(&self, transcript: &[TranscriptEntry]) -> MentionMap {
        let mut mentions = MentionMap::new();

        for entry in transcript {
            for (name, pattern) in &self.patterns {
                if !pattern.is_match(&entry.text) {
                    continue;
                }

                let offset_seconds = entry.start_seconds.max(0.0) as u64;
                mentions.entry(name.clone()).or_default().push(Mention {
                    timestamp: format_timestamp(offset_seconds),
                    offset_seconds,
                    text: entry.text.clone(),
                });
            }
        }

        mentions
    }
}

/// One-shot extraction; prefer a reused [`MentionExtractor`] for many transcripts.
pub fn extract(transcript: &[TranscriptEntry], roster: &Roster) -> MentionMap {
    MentionExtractor::new(roster).extract(transcript)
}
