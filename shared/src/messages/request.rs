//! Outbound generation request payload

use serde::{Deserialize, Serialize};

use crate::types::{Character, StoryRequest, Universe};

/// Body of the streaming `POST /api/create-story` request.
///
/// Characters carry only id/name/reference photos and the universe only
/// id/name/style; everything else the composer screens know about stays
/// on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateStoryRequest {
    pub characters: Vec<Character>,
    pub universe: Universe,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
}

impl From<&StoryRequest> for GenerateStoryRequest {
    fn from(request: &StoryRequest) -> Self {
        GenerateStoryRequest {
            characters: request.characters.clone(),
            universe: request.universe.clone(),
            description: request.description.clone(),
        }
    }
}
