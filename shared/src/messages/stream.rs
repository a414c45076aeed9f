//! Server-pushed progress events
//!
//! The backend frames these as SSE `data:` lines, one JSON object per line,
//! discriminated by a `type` field. Field names mirror the backend exactly
//! (camelCase for the image/book-keeping fields).

use serde::{Deserialize, Serialize};

use crate::types::{ImageId, Story, StoryDraft};

/// One event of the generation stream.
///
/// `stage` fields are `i32` because the backend's fatal error path reports
/// stage `-1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Coarse pipeline progress: stage number, headline and message
    Stage {
        stage: i32,
        title: String,
        message: String,
        progress: f32,
    },

    /// Text generation finished; carries the story draft (title + parts)
    StoryCreated {
        stage: i32,
        title: String,
        message: String,
        progress: f32,
        #[serde(default)]
        elapsed: f64,
        data: StoryDraft,
    },

    /// One illustration started generating
    #[serde(rename_all = "camelCase")]
    ImageStart {
        stage: i32,
        image_id: ImageId,
        message: String,
        current_image: u32,
        total_images: u32,
    },

    /// The backend is retrying one illustration; `attempt` is the new
    /// attempt number, not an increment
    #[serde(rename_all = "camelCase")]
    ImageRetry {
        stage: i32,
        image_id: ImageId,
        attempt: u32,
    },

    /// One illustration finished; `image_url` is relative to the API origin
    #[serde(rename_all = "camelCase")]
    ImageDone {
        stage: i32,
        image_id: ImageId,
        message: String,
        #[serde(default)]
        elapsed: f64,
        image_url: String,
        current_image: u32,
        total_images: u32,
        progress: f32,
    },

    /// One illustration failed for good; the session itself continues
    #[serde(rename_all = "camelCase")]
    ImageError {
        stage: i32,
        image_id: ImageId,
        message: String,
        #[serde(default)]
        error: Option<String>,
    },

    /// Keepalive emitted during long model calls; carries no state
    Ping {
        #[serde(default)]
        message: Option<String>,
    },

    /// Terminal success; `data` is the finished story
    #[serde(rename_all = "camelCase")]
    Complete {
        stage: i32,
        title: String,
        message: String,
        progress: f32,
        #[serde(default)]
        total_time: f64,
        data: Story,
    },

    /// Terminal failure reported by the backend
    Error {
        stage: i32,
        #[serde(default)]
        title: Option<String>,
        message: String,
        #[serde(default)]
        progress: Option<f32>,
    },
}

impl StreamEvent {
    /// `complete` and `error` end the session; nothing may follow them
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Complete { .. } | StreamEvent::Error { .. })
    }
}
