//! Client-side data types
//!
//! Session configuration, terminal outcomes, and the renderable progress
//! view derived from session state. Nothing here performs I/O.

use std::time::Duration;

use serde::Serialize;
use url::Url;

use shared::{ImageId, MAX_IMAGE_RETRIES, Story};

/// Hard ceiling for one generation attempt
pub const GENERATION_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Inactivity window. Currently equal to the hard timeout, so the hard
/// timeout always fires first; kept separate so it can be tuned on its own.
pub const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Cadence of the elapsed-clock recomputation
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// How long the final progress view stays up before the story is delivered
pub const COMPLETION_HOLD: Duration = Duration::from_secs(2);

/// Configuration of one generation session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Origin of the story-generation API; relative image URLs resolve
    /// against it
    pub api_base: Url,
    pub hard_timeout: Duration,
    pub inactivity_timeout: Duration,
    pub tick_interval: Duration,
    pub completion_hold: Duration,
    /// Attempt ceiling shown next to in-progress illustrations
    pub max_image_attempts: u32,
}

impl SessionConfig {
    /// Default configuration against the given API origin
    pub fn new(api_base: Url) -> Self {
        Self {
            api_base,
            hard_timeout: GENERATION_TIMEOUT,
            inactivity_timeout: INACTIVITY_TIMEOUT,
            tick_interval: TICK_INTERVAL,
            completion_hold: COMPLETION_HOLD,
            max_image_attempts: MAX_IMAGE_RETRIES,
        }
    }
}

// ============================================================================
// Session outcomes
// ============================================================================

/// How a session ended, as seen by the caller
#[derive(Debug)]
pub enum SessionOutcome {
    /// Terminal `complete` event received; the finished story with image
    /// URLs resolved against the API origin
    Completed(Box<Story>),
    /// The session failed as a whole (individual image failures do not
    /// produce this)
    Failed(SessionFailure),
    /// Caller-initiated cancel; no story payload
    Cancelled,
}

/// A session-level failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// Which guard tripped the failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Request failed, stream broke, or the stream ended with no terminal
    /// event
    Transport,
    /// No terminal event within the hard ceiling
    HardTimeout,
    /// No event of any kind within the inactivity window
    Inactivity,
    /// The backend reported a terminal `error` event
    Server,
}

impl SessionFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SessionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

// ============================================================================
// Progress views
// ============================================================================

/// Renderable snapshot of a running session, re-derived after every event
/// and clock tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressView {
    pub phase: ViewPhase,
    pub stage_title: String,
    pub message: String,
    /// 0-100, as reported by the backend
    pub progress: f32,
    pub elapsed_label: String,
    pub stages: Vec<StageView>,
    /// Cover first, then one entry per draft part; empty until the draft
    /// arrives
    pub images: Vec<ImageView>,
}

/// Overall state of the view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewPhase {
    Running,
    Completed { total_label: String },
    Failed { message: String },
}

/// One of the four fixed pipeline stages as displayed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageView {
    pub number: u8,
    pub icon: &'static str,
    pub name: &'static str,
    pub active: bool,
    pub completed: bool,
    /// Elapsed time inside this stage; only set while active
    pub elapsed_label: Option<String>,
}

/// Display state of one illustration slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageView {
    pub id: ImageId,
    pub label: String,
    pub state: ImageState,
}

/// Lifecycle of one illustration as displayed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ImageState {
    Pending,
    InProgress {
        attempt: u32,
        max_attempts: u32,
        elapsed_seconds: u64,
    },
    Done {
        url: String,
    },
    Errored {
        message: String,
    },
}
