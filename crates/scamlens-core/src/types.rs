//! Core types for ScamLens

use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A comment as produced by the acquisition layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawComment {
    /// Platform comment identifier
    pub comment_id: String,

    /// Video the comment belongs to
    pub video_id: String,

    /// Raw, uncleaned comment text
    pub text: String,

    /// Display name of the author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Publication timestamp as reported by the platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,

    /// Like count at fetch time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like_count: Option<u64>,
}

impl RawComment {
    /// Create a comment with only the required fields
    pub fn new(
        comment_id: impl Into<String>,
        video_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            comment_id: comment_id.into(),
            video_id: video_id.into(),
            text: text.into(),
            author: None,
            published_at: None,
            like_count: None,
        }
    }

    /// Set the author
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the publication timestamp
    pub fn with_published_at(mut self, published_at: impl Into<String>) -> Self {
        self.published_at = Some(published_at.into());
        self
    }

    /// Set the like count
    pub fn with_like_count(mut self, like_count: u64) -> Self {
        self.like_count = Some(like_count);
        self
    }
}

/// Video metadata returned by the acquisition layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub video_id: String,

    #[serde(default)]
    pub channel_id: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub published_at: Option<String>,

    #[serde(default)]
    pub view_count: Option<u64>,

    #[serde(default)]
    pub comment_count: Option<u64>,
}

/// Terminal artifact of the pipeline, one per target-language comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub comment_id: String,
    pub video_id: String,

    /// Normalized text
    pub text_clean: String,

    /// Word-segmented text, tokens separated by single spaces
    pub tokens: String,

    /// Number of space-delimited tokens in `tokens`
    pub num_words: usize,

    /// Number of absolute http(s) URLs in the raw text
    pub num_urls: usize,

    /// URL hosts in order of occurrence, duplicates kept
    pub domains: Vec<String>,

    /// Number of distinct scam lexicon entries present in `text_clean`.
    ///
    /// This is a presence count: a keyword repeated five times counts once.
    pub num_scam_keywords: usize,

    /// Sequence embedding, length equals the encoder hidden dimension
    pub embedding: Vec<f32>,
}

impl FeatureRecord {
    /// Count whitespace-delimited tokens the same way `num_words` is defined
    pub fn count_words(tokens: &str) -> usize {
        tokens.split_whitespace().count()
    }

    /// Check the record-level invariants against an expected embedding size
    pub fn is_consistent(&self, hidden_dim: usize) -> bool {
        self.num_words == Self::count_words(&self.tokens)
            && self.embedding.len() == hidden_dim
            && self.domains.len() <= self.num_urls
    }
}

/// Processing state of a single record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    Pending,
    FilteredOut,
    Normalized,
    Segmented,
    Featurized,
    Embedded,
    Assembled,
}

impl RecordState {
    /// Whether no further transition can happen from this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::FilteredOut | Self::Assembled)
    }

    /// Stage name for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::FilteredOut => "filtered_out",
            Self::Normalized => "normalized",
            Self::Segmented => "segmented",
            Self::Featurized => "featurized",
            Self::Embedded => "embedded",
            Self::Assembled => "assembled",
        }
    }
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record that could not be turned into a [`FeatureRecord`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordFailure {
    /// Position of the row in the input
    pub index: usize,

    /// Comment id, when the row got far enough to have one
    pub comment_id: Option<String>,

    /// Last state the record reached before failing
    pub state: RecordState,

    /// Failure kind
    pub kind: ErrorKind,

    /// Human-readable cause
    pub message: String,
}

/// Counts reported at the end of a batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Rows read from the input
    pub total: usize,

    /// Rows dropped by the language filter
    pub filtered: usize,

    /// Rows that failed during processing
    pub failed: usize,

    /// Rows written to the output
    pub written: usize,
}

impl BatchSummary {
    /// Whether every input row is accounted for exactly once
    pub fn is_balanced(&self) -> bool {
        self.total == self.filtered + self.failed + self.written
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total={} filtered={} failed={} written={}",
            self.total, self.filtered, self.failed, self.written
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_comment_builder() {
        let comment = RawComment::new("c1", "v1", "xin chào")
            .with_author("an")
            .with_like_count(3);

        assert_eq!(comment.comment_id, "c1");
        assert_eq!(comment.author.as_deref(), Some("an"));
        assert_eq!(comment.like_count, Some(3));
        assert!(comment.published_at.is_none());
    }

    #[test]
    fn test_raw_comment_json_optional_fields() {
        let json = r#"{"comment_id":"c1","video_id":"v1","text":"hi"}"#;
        let comment: RawComment = serde_json::from_str(json).unwrap();
        assert_eq!(comment, RawComment::new("c1", "v1", "hi"));
    }

    #[test]
    fn test_feature_record_consistency() {
        let record = FeatureRecord {
            comment_id: "c1".to_string(),
            video_id: "v1".to_string(),
            text_clean: "nhận quà miễn phí".to_string(),
            tokens: "nhận quà miễn_phí".to_string(),
            num_words: 3,
            num_urls: 0,
            domains: Vec::new(),
            num_scam_keywords: 1,
            embedding: vec![0.0; 4],
        };

        assert!(record.is_consistent(4));
        assert!(!record.is_consistent(8));
    }

    #[test]
    fn test_terminal_states() {
        assert!(RecordState::FilteredOut.is_terminal());
        assert!(RecordState::Assembled.is_terminal());
        assert!(!RecordState::Embedded.is_terminal());
        assert_eq!(RecordState::Segmented.to_string(), "segmented");
    }

    #[test]
    fn test_summary_balance() {
        let summary = BatchSummary {
            total: 5,
            filtered: 2,
            failed: 1,
            written: 2,
        };
        assert!(summary.is_balanced());
        assert_eq!(summary.to_string(), "total=5 filtered=2 failed=1 written=2");
    }
}
