//! Presentation projector
//!
//! Pure projection from session state to the renderable `ProgressView`.
//! Holds no state of its own; the controller re-projects after every event
//! and tick.

use shared::{GENERATION_STAGES, ImageId};

use crate::core::session::{GenerationSession, SessionPhase};
use crate::types::{ImageState, ImageView, ProgressView, SessionConfig, StageView, ViewPhase};

/// Render `"Ys"` under a minute, `"Xm Ys"` from there on
pub fn format_elapsed(secs: u64) -> String {
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}

/// Derive the display snapshot for the current session state
pub fn project(session: &GenerationSession, config: &SessionConfig) -> ProgressView {
    let phase = match &session.phase {
        SessionPhase::Running => ViewPhase::Running,
        SessionPhase::Completed => ViewPhase::Completed {
            total_label: format_elapsed(
                session
                    .story
                    .as_ref()
                    .and_then(|story| story.total_time)
                    .unwrap_or(session.elapsed_seconds as f64) as u64,
            ),
        },
        SessionPhase::Failed(message) => ViewPhase::Failed {
            message: message.clone(),
        },
    };

    let stages = GENERATION_STAGES
        .iter()
        .map(|info| {
            let active = info.number == session.stage && session.phase == SessionPhase::Running;
            StageView {
                number: info.number,
                icon: info.icon,
                name: info.name,
                active,
                completed: info.number < session.stage
                    || session.phase == SessionPhase::Completed,
                elapsed_label: active.then(|| format_elapsed(session.stage_elapsed_seconds)),
            }
        })
        .collect();

    ProgressView {
        phase,
        stage_title: session.stage_title.clone(),
        message: session.message.clone(),
        progress: session.progress,
        elapsed_label: format_elapsed(session.elapsed_seconds),
        stages,
        images: image_views(session, config),
    }
}

/// Cover first, then one slot per draft part; empty until the draft exists
fn image_views(session: &GenerationSession, config: &SessionConfig) -> Vec<ImageView> {
    let Some(draft) = &session.story_draft else {
        return Vec::new();
    };

    let ids = std::iter::once(ImageId::Cover)
        .chain((1..=draft.parts.len() as u32).map(ImageId::Part));

    ids.map(|id| {
        let state = if let Some(url) = session.completed_images.get(&id) {
            ImageState::Done { url: url.clone() }
        } else if let Some(message) = session.image_errors.get(&id) {
            ImageState::Errored {
                message: message.clone(),
            }
        } else if let Some(attempt) = session.image_attempts.get(&id) {
            ImageState::InProgress {
                attempt: *attempt,
                max_attempts: config.max_image_attempts,
                elapsed_seconds: session.image_elapsed.get(&id).copied().unwrap_or(0),
            }
        } else {
            ImageState::Pending
        };

        ImageView {
            id,
            label: id.display_label(),
            state,
        }
    })
    .collect()
}
