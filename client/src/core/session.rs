//! Event reducer for one generation session
//!
//! `GenerationSession` is the single mutable state of a session, owned
//! exclusively by the controller task. Events and clock ticks are folded in
//! through `apply_event` / `apply_tick`; time is always an explicit argument
//! so every transition is testable without a runtime.

use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, warn};
use url::Url;

use shared::{ImageId, Story, StoryDraft, StreamEvent, resolve_image_url};

/// Overall phase of a session. `Completed` and `Failed` are absorbing:
/// once reached, no event, tick or local failure changes the state again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Running,
    Completed,
    Failed(String),
}

impl SessionPhase {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionPhase::Running)
    }
}

/// Mutable state of one generation attempt
#[derive(Debug)]
pub struct GenerationSession {
    api_base: Url,

    pub phase: SessionPhase,
    /// Pipeline stage 1-4 as last reported
    pub stage: u8,
    /// 0-100, trusted from the backend as reported
    pub progress: f32,
    pub stage_title: String,
    pub message: String,

    started_at: Instant,
    stage_started_at: Instant,
    pub elapsed_seconds: u64,
    pub stage_elapsed_seconds: u64,

    /// Populated once text generation finishes
    pub story_draft: Option<StoryDraft>,

    /// Start timestamps of images currently generating. Kept across retries
    /// so per-image elapsed time is cumulative.
    images_in_flight: HashMap<ImageId, Instant>,
    pub image_elapsed: HashMap<ImageId, u64>,
    pub image_attempts: HashMap<ImageId, u32>,
    /// Terminal per-image failures; never abort the session
    pub image_errors: HashMap<ImageId, String>,
    /// Finished images, URLs resolved against the API origin
    pub completed_images: HashMap<ImageId, String>,

    /// Final payload captured from the terminal `complete` event
    pub story: Option<Story>,
}

impl GenerationSession {
    pub fn new(api_base: Url, now: Instant) -> Self {
        Self {
            api_base,
            phase: SessionPhase::Running,
            stage: 1,
            progress: 0.0,
            stage_title: "🚀 Starting".to_string(),
            message: "Preparing your story...".to_string(),
            started_at: now,
            stage_started_at: now,
            elapsed_seconds: 0,
            stage_elapsed_seconds: 0,
            story_draft: None,
            images_in_flight: HashMap::new(),
            image_elapsed: HashMap::new(),
            image_attempts: HashMap::new(),
            image_errors: HashMap::new(),
            completed_images: HashMap::new(),
            story: None,
        }
    }

    /// Fold one stream event into the state. No-op once terminal.
    pub fn apply_event(&mut self, event: &StreamEvent, now: Instant) {
        if self.phase.is_terminal() {
            debug!("📪 Ignoring event after terminal phase: {event:?}");
            return;
        }

        match event {
            StreamEvent::Stage {
                stage,
                title,
                message,
                progress,
            } => {
                self.enter_stage(*stage, now);
                self.stage_title = title.clone();
                self.message = message.clone();
                self.progress = *progress;
            }

            StreamEvent::StoryCreated {
                stage,
                title,
                message,
                progress,
                data,
                ..
            } => {
                self.enter_stage(*stage, now);
                self.stage_title = title.clone();
                self.message = message.clone();
                self.progress = *progress;
                self.story_draft = Some(data.clone());
            }

            StreamEvent::ImageStart {
                image_id, message, ..
            } => {
                if self.is_errored_image(image_id) {
                    return;
                }
                // Stage transitions only come from stage-bearing progress
                // events; image bookkeeping leaves the stage alone.
                self.message = message.clone();
                self.images_in_flight.insert(*image_id, now);
                self.image_elapsed.insert(*image_id, 0);
                self.image_attempts.insert(*image_id, 1);
            }

            StreamEvent::ImageRetry {
                image_id, attempt, ..
            } => {
                if self.is_errored_image(image_id) {
                    return;
                }
                // The start timestamp is kept so elapsed time accumulates
                // across attempts.
                self.image_attempts.insert(*image_id, *attempt);
                self.images_in_flight.entry(*image_id).or_insert(now);
            }

            StreamEvent::ImageDone {
                image_id,
                message,
                image_url,
                progress,
                ..
            } => {
                if self.is_errored_image(image_id) {
                    warn!("🖼️ Ignoring image_done for already-failed {image_id}");
                    return;
                }
                if let Some(started) = self.images_in_flight.remove(image_id) {
                    self.image_elapsed
                        .insert(*image_id, now.duration_since(started).as_secs());
                }
                self.completed_images
                    .insert(*image_id, resolve_image_url(&self.api_base, image_url));
                self.message = message.clone();
                self.progress = *progress;
            }

            StreamEvent::ImageError {
                image_id,
                message,
                error,
                ..
            } => {
                self.images_in_flight.remove(image_id);
                let detail = error.clone().unwrap_or_else(|| message.clone());
                warn!("🖼️ Image {image_id} failed for good: {detail}");
                self.image_errors.insert(*image_id, detail);
                self.message = message.clone();
            }

            StreamEvent::Ping { .. } => {
                // Keepalive only; the controller already reset the
                // inactivity window before reducing.
            }

            StreamEvent::Complete {
                title,
                message,
                data,
                ..
            } => {
                self.stage = 4;
                self.progress = 100.0;
                self.stage_title = title.clone();
                self.message = message.clone();
                self.images_in_flight.clear();
                let mut story = data.clone();
                story.resolve_images(&self.api_base);
                self.story = Some(story);
                self.phase = SessionPhase::Completed;
            }

            StreamEvent::Error { message, .. } => {
                self.fail(message.clone());
            }
        }
    }

    /// Recompute the elapsed clocks. No-op once terminal.
    pub fn apply_tick(&mut self, now: Instant) {
        if self.phase.is_terminal() {
            return;
        }
        self.elapsed_seconds = now.duration_since(self.started_at).as_secs();
        self.stage_elapsed_seconds = now.duration_since(self.stage_started_at).as_secs();
        for (image_id, started) in &self.images_in_flight {
            self.image_elapsed
                .insert(*image_id, now.duration_since(*started).as_secs());
        }
    }

    /// Local failure entry point (transport breakage, watchdog expiry).
    /// First terminal transition wins.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if self.phase.is_terminal() {
            return;
        }
        let reason = reason.into();
        self.message = reason.clone();
        self.images_in_flight.clear();
        self.phase = SessionPhase::Failed(reason);
    }

    fn enter_stage(&mut self, stage: i32, now: Instant) {
        let stage = stage.clamp(1, 4) as u8;
        if stage != self.stage {
            self.stage = stage;
            self.stage_started_at = now;
            self.stage_elapsed_seconds = 0;
        }
    }

    fn is_errored_image(&self, image_id: &ImageId) -> bool {
        self.image_errors.contains_key(image_id)
    }
}
