//! Wire messages exchanged with the story-generation backend
//!
//! - `request`: the one outbound payload (the streaming generation request)
//! - `stream`: the server-pushed events describing generation progress

pub mod request;
pub mod stream;

pub use request::GenerateStoryRequest;
pub use stream::StreamEvent;
