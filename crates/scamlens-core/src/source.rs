//! Acquisition boundary
//!
//! The pipeline never talks to a comment platform directly. Whatever fetches
//! comment threads and channel video lists implements [`CommentSource`];
//! paging, quotas and authentication stay behind this trait.

use crate::error::Result;
use crate::types::{RawComment, VideoMetadata};
use async_trait::async_trait;

/// Provider of raw comments and video listings
#[async_trait]
pub trait CommentSource: Send + Sync {
    /// Fetch the top-level comment threads of a video
    async fn fetch_comment_threads(&self, video_id: &str) -> Result<Vec<RawComment>>;

    /// List the most recent videos of a channel
    async fn list_channel_videos(
        &self,
        channel_id: &str,
        max_results: usize,
    ) -> Result<Vec<VideoMetadata>>;

    /// Get the source name
    fn name(&self) -> &str;
}
