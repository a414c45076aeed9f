//! Domain types for the story generation client
//!
//! These model the inputs of one generation attempt (characters, universe,
//! request) and its outputs (story draft, finished story). All wire-facing
//! types keep the exact field names the backend uses.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::errors::{SharedError, SharedResult};

/// Backend truncates any request to this many characters
pub const MAX_CHARACTERS_PER_STORY: usize = 5;

/// Backend uses at most this many reference photos per character
pub const MAX_IMAGES_PER_CHARACTER: usize = 2;

/// Maximum free-text description length accepted by the backend
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;

/// Number of generation attempts the backend makes per illustration
pub const MAX_IMAGE_RETRIES: u32 = 5;

// ============================================================================
// Image identifiers
// ============================================================================

/// Identifier of one illustration within a story.
///
/// This is the join key between `StoryDraft::parts` (by position) and all
/// per-image progress maps. On the wire it is the string `"capa"` for the
/// cover or `"parte_N"` for chapter N.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ImageId {
    /// The story cover (`"capa"`)
    Cover,
    /// Chapter illustration N, 1-based (`"parte_N"`)
    Part(u32),
}

impl ImageId {
    /// Human-readable label for progress displays
    pub fn display_label(&self) -> String {
        match self {
            ImageId::Cover => "Cover".to_string(),
            ImageId::Part(n) => format!("Chapter {n}"),
        }
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageId::Cover => write!(f, "capa"),
            ImageId::Part(n) => write!(f, "parte_{n}"),
        }
    }
}

impl FromStr for ImageId {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "capa" {
            return Ok(ImageId::Cover);
        }
        if let Some(n) = s.strip_prefix("parte_") {
            if let Ok(n) = n.parse::<u32>() {
                return Ok(ImageId::Part(n));
            }
        }
        Err(SharedError::InvalidImageId {
            input: s.to_string(),
        })
    }
}

impl Serialize for ImageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ImageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Generation stages
// ============================================================================

/// Display metadata for one of the four pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageInfo {
    pub number: u8,
    pub icon: &'static str,
    pub name: &'static str,
}

/// The fixed four-stage pipeline as shown to users
pub const GENERATION_STAGES: [StageInfo; 4] = [
    StageInfo {
        number: 1,
        icon: "🚀",
        name: "Initialization",
    },
    StageInfo {
        number: 2,
        icon: "📜",
        name: "Writing the story",
    },
    StageInfo {
        number: 3,
        icon: "🎨",
        name: "Generating images",
    },
    StageInfo {
        number: 4,
        icon: "✨",
        name: "Finished",
    },
];

// ============================================================================
// Characters and universes
// ============================================================================

/// A user-composed character with its reference photos (base64 data URLs)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    pub images: Vec<String>,
}

/// Character reference as embedded in a finished story (photos stripped)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSummary {
    pub id: String,
    pub name: String,
}

/// A universe preset: display name plus the visual style string handed to
/// the generation backend. The preset catalog itself lives outside this
/// system; sessions only ever see the chosen descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    pub id: String,
    pub name: String,
    pub style: String,
}

// ============================================================================
// Stories
// ============================================================================

/// One chapter of a story: narrative text plus the prompt used to
/// illustrate it. Serialized on the wire as a two-element array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryPart(pub String, pub String);

impl StoryPart {
    pub fn new(text: impl Into<String>, image_prompt: impl Into<String>) -> Self {
        StoryPart(text.into(), image_prompt.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }

    pub fn image_prompt(&self) -> &str {
        &self.1
    }
}

/// Partial story payload announced by the backend once the text stage is
/// done, before any illustration exists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryDraft {
    pub title: String,
    pub parts: Vec<StoryPart>,
    #[serde(rename = "storyId", default)]
    pub story_id: Option<String>,
    #[serde(default)]
    pub folder: Option<String>,
}

/// A finished story as delivered by the backend's terminal `complete` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<chrono::NaiveDateTime>,
    #[serde(default)]
    pub status: Option<String>,
    pub title: String,
    #[serde(default)]
    pub cover_prompt: Option<String>,
    pub parts: Vec<StoryPart>,
    #[serde(default)]
    pub images: HashMap<ImageId, String>,
    pub universe: Universe,
    #[serde(default)]
    pub characters: Vec<CharacterSummary>,
    #[serde(rename = "totalTime", default)]
    pub total_time: Option<f64>,
}

impl Story {
    /// Resolve every image URL in place against the API origin. The backend
    /// delivers paths relative to its own origin.
    pub fn resolve_images(&mut self, api_base: &Url) {
        for url in self.images.values_mut() {
            *url = resolve_image_url(api_base, url);
        }
    }
}

/// Resolve a backend-relative image path against the API origin.
///
/// Absolute URLs pass through unchanged; anything `Url::join` rejects is
/// returned as-is rather than dropped.
pub fn resolve_image_url(api_base: &Url, raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    match api_base.join(raw) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => raw.to_string(),
    }
}

// ============================================================================
// Story requests
// ============================================================================

/// Input of one generation attempt, immutable for the whole session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryRequest {
    pub characters: Vec<Character>,
    pub universe: Universe,
    #[serde(default)]
    pub description: Option<String>,
}

impl StoryRequest {
    /// Check the request invariants before a session is allowed to start:
    /// 1-5 characters, 1-2 reference photos each, bounded description.
    pub fn validate(&self) -> SharedResult<()> {
        if self.characters.is_empty() {
            return Err(SharedError::invalid_request(
                "at least one character is required",
            ));
        }
        if self.characters.len() > MAX_CHARACTERS_PER_STORY {
            return Err(SharedError::invalid_request(format!(
                "at most {MAX_CHARACTERS_PER_STORY} characters per story, got {}",
                self.characters.len()
            )));
        }
        for character in &self.characters {
            if character.images.is_empty() || character.images.len() > MAX_IMAGES_PER_CHARACTER {
                return Err(SharedError::invalid_request(format!(
                    "character '{}' needs 1-{MAX_IMAGES_PER_CHARACTER} reference photos, got {}",
                    character.name,
                    character.images.len()
                )));
            }
        }
        if let Some(description) = &self.description {
            if description.len() > MAX_DESCRIPTION_LENGTH {
                return Err(SharedError::invalid_request(format!(
                    "description exceeds {MAX_DESCRIPTION_LENGTH} characters"
                )));
            }
        }
        Ok(())
    }
}
