//! Shared types for the illustrated-story generation client
//!
//! Contains the domain model (characters, universes, stories), the wire
//! messages exchanged with the story-generation backend, and cross-cutting
//! utilities (errors, tracing setup). Client-internal types (session state,
//! progress views) live in the client crate.

pub mod errors;
pub mod logging;
pub mod messages;
pub mod types;

pub use errors::{SharedError, SharedResult};

pub use types::{
    // Domain model
    Character, CharacterSummary, ImageId, Story, StoryDraft, StoryPart, StoryRequest, Universe,
    // Display metadata for the fixed four-stage pipeline
    StageInfo, GENERATION_STAGES,
    // Request limits
    MAX_CHARACTERS_PER_STORY, MAX_DESCRIPTION_LENGTH, MAX_IMAGES_PER_CHARACTER, MAX_IMAGE_RETRIES,
    // URL handling
    resolve_image_url,
};

// Re-export the backend wire messages at crate level for convenience
pub use messages::{GenerateStoryRequest, StreamEvent};
