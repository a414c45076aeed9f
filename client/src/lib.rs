//! Story generation session client
//!
//! This library drives one story-generation attempt against the backend:
//! it opens the SSE stream, reduces progress events into session state,
//! guards the attempt with timeout watchdogs, and projects a renderable
//! progress view after every change.

pub mod core;
pub mod error;
pub mod services;
pub mod traits;
pub mod types;

// Re-export main types
pub use self::core::{CancelHandle, GenerationSession, SessionController, SessionPhase, project};
pub use error::{ClientError, ClientResult};
pub use services::HttpStoryApi;
pub use traits::{EventReceiver, StoryStream};
pub use types::{
    FailureKind, ImageState, ImageView, ProgressView, SessionConfig, SessionFailure,
    SessionOutcome, StageView, ViewPhase,
};
