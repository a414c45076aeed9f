//! Service trait for the story-generation stream

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::ClientResult;
use shared::{StoryRequest, StreamEvent};

/// Channel half delivering parsed stream events; the producing task ends the
/// channel when the underlying stream closes
pub type EventReceiver = mpsc::Receiver<ClientResult<StreamEvent>>;

/// Opens a story-generation request and yields its event stream
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoryStream: Send + Sync {
    /// Submit the request and return a receiver of parsed events. Errors
    /// here mean the request itself failed; errors after a successful open
    /// arrive through the receiver.
    async fn open(&self, request: &StoryRequest) -> ClientResult<EventReceiver>;
}
