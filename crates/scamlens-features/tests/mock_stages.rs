//! Mock stages for testing
//!
//! Deterministic stand-ins for the language detector, the encoder and the
//! acquisition layer, so batch behavior can be tested without model weights.

#![allow(dead_code)]

use async_trait::async_trait;
use scamlens_core::{CommentSource, Error, RawComment, Result, VideoMetadata};
use scamlens_features::{LanguageDetector, TextEncoder};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Encoder that hashes its input into a fixed-length vector
pub struct HashEncoder {
    dimension: usize,
    fail_marker: Option<String>,
    panic_marker: Option<String>,
    slow_marker: Option<(String, Duration)>,
    call_count: AtomicU32,
}

impl HashEncoder {
    /// Create an encoder producing vectors of `dimension` components
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fail_marker: None,
            panic_marker: None,
            slow_marker: None,
            call_count: AtomicU32::new(0),
        }
    }

    /// Fail on any input containing `marker`
    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_marker = Some(marker.to_string());
        self
    }

    /// Panic on any input containing `marker`
    pub fn panicking_on(mut self, marker: &str) -> Self {
        self.panic_marker = Some(marker.to_string());
        self
    }

    /// Sleep before answering inputs containing `marker`
    pub fn slow_on(mut self, marker: &str, latency: Duration) -> Self {
        self.slow_marker = Some((marker.to_string(), latency));
        self
    }

    /// Get the number of times embed was called
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl TextEncoder for HashEncoder {
    fn embed(&self, segmented: &str) -> Result<Vec<f32>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some((marker, latency)) = &self.slow_marker {
            if segmented.contains(marker.as_str()) {
                std::thread::sleep(*latency);
            }
        }
        if let Some(marker) = &self.fail_marker {
            if segmented.contains(marker.as_str()) {
                return Err(Error::embedding("simulated inference failure"));
            }
        }
        if let Some(marker) = &self.panic_marker {
            if segmented.contains(marker.as_str()) {
                panic!("simulated encoder crash");
            }
        }

        // FNV-1a, one round per component
        let mut hash: u64 = 0xcbf29ce484222325;
        Ok((0..self.dimension)
            .map(|i| {
                for byte in segmented.bytes().chain((i as u32).to_le_bytes()) {
                    hash ^= u64::from(byte);
                    hash = hash.wrapping_mul(0x100000001b3);
                }
                (hash % 2000) as f32 / 1000.0 - 1.0
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Detector that calls text English when it contains common English words
pub struct KeywordDetector {
    english_words: Vec<&'static str>,
}

impl KeywordDetector {
    pub fn new() -> Self {
        Self {
            english_words: vec!["the", "and", "you", "this", "thanks", "hello"],
        }
    }
}

impl Default for KeywordDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageDetector for KeywordDetector {
    fn detect(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(Error::language_detection("no text to detect"));
        }

        let lowered = text.to_lowercase();
        let english = lowered
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| self.english_words.contains(&word));

        Ok(if english { "en" } else { "vi" }.to_string())
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

/// In-memory acquisition layer
#[derive(Default)]
pub struct MockCommentSource {
    threads: HashMap<String, Vec<RawComment>>,
}

impl MockCommentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the comment threads of a video
    pub fn with_video(mut self, video_id: &str, texts: &[&str]) -> Self {
        let comments = texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                RawComment::new(format!("{}-{}", video_id, i), video_id, *text)
                    .with_author(format!("user{}", i))
                    .with_like_count(i as u64)
            })
            .collect();
        self.threads.insert(video_id.to_string(), comments);
        self
    }
}

#[async_trait]
impl CommentSource for MockCommentSource {
    async fn fetch_comment_threads(&self, video_id: &str) -> Result<Vec<RawComment>> {
        self.threads
            .get(video_id)
            .cloned()
            .ok_or_else(|| Error::internal(format!("video {} not found", video_id)))
    }

    async fn list_channel_videos(
        &self,
        channel_id: &str,
        max_results: usize,
    ) -> Result<Vec<VideoMetadata>> {
        let mut ids: Vec<&String> = self.threads.keys().collect();
        ids.sort();
        Ok(ids
            .into_iter()
            .take(max_results)
            .map(|id| VideoMetadata {
                video_id: id.clone(),
                channel_id: Some(channel_id.to_string()),
                ..Default::default()
            })
            .collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_encoder_deterministic() {
        let encoder = HashEncoder::new(16);
        let a = encoder.embed("liên_hệ zalo").unwrap();
        let b = encoder.embed("liên_hệ zalo").unwrap();
        let c = encoder.embed("xin_chào").unwrap();

        assert_eq!(a.len(), 16);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.iter().all(|v| (-1.0..1.0).contains(v)));
        assert_eq!(encoder.call_count(), 3);
    }

    #[test]
    fn test_hash_encoder_failure() {
        let encoder = HashEncoder::new(4).failing_on("lỗi");
        assert!(encoder.embed("không lỗi đâu").is_err());
        assert!(encoder.embed("ổn").is_ok());
    }

    #[test]
    fn test_keyword_detector() {
        let detector = KeywordDetector::new();
        assert_eq!(detector.detect("Thanks for the video").unwrap(), "en");
        assert_eq!(detector.detect("Cảm ơn bạn nhiều").unwrap(), "vi");
        assert!(detector.detect("").is_err());
    }

    #[tokio::test]
    async fn test_mock_source() {
        let source = MockCommentSource::new().with_video("v1", &["a", "b"]);
        assert_eq!(source.fetch_comment_threads("v1").await.unwrap().len(), 2);
        assert!(source.fetch_comment_threads("v2").await.is_err());

        let videos = source.list_channel_videos("ch1", 5).await.unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].channel_id.as_deref(), Some("ch1"));
    }
}
