//! HTTP story-generation stream
//!
//! `HttpStoryApi` submits one generation request and turns the backend's
//! SSE response into a channel of parsed `StreamEvent`s. The response body
//! is consumed on a spawned reader task feeding an mpsc channel; malformed
//! lines are logged and skipped, transport errors surface as a single `Err`
//! item, and a clean end of stream closes the channel.

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::traits::{EventReceiver, StoryStream};
use shared::{GenerateStoryRequest, StoryRequest, StreamEvent};

const CREATE_STORY_PATH: &str = "/api/create-story";
const DATA_PREFIX: &str = "data: ";

/// Buffered parsed events between the reader task and the controller
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// `StoryStream` implementation against the HTTP backend
pub struct HttpStoryApi {
    client: reqwest::Client,
    api_base: Url,
}

impl HttpStoryApi {
    pub fn new(api_base: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base,
        }
    }

    fn endpoint(&self) -> ClientResult<Url> {
        self.api_base
            .join(CREATE_STORY_PATH)
            .map_err(|err| ClientError::config(format!("invalid API base URL: {err}")))
    }
}

#[async_trait]
impl StoryStream for HttpStoryApi {
    async fn open(&self, request: &StoryRequest) -> ClientResult<EventReceiver> {
        let endpoint = self.endpoint()?;
        let payload = GenerateStoryRequest::from(request);

        info!("📡 Opening generation stream: POST {endpoint}");
        let response = self
            .client
            .post(endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|err| ClientError::connect(err.to_string()))?;

        if !response.status().is_success() {
            return Err(ClientError::connect(format!(
                "backend returned {}",
                response.status()
            )));
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            let mut body = response.bytes_stream();
            let mut buffer = LineBuffer::new();

            loop {
                // A dropped receiver (cancel or terminal exit) must close
                // the connection right away, not on the next parsed event.
                let chunk = tokio::select! {
                    chunk = body.next() => chunk,
                    _ = tx.closed() => {
                        debug!("📡 Receiver gone, closing generation stream");
                        return;
                    }
                };
                let Some(chunk) = chunk else {
                    break;
                };
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        let _ = tx
                            .send(Err(ClientError::stream(err.to_string())))
                            .await;
                        return;
                    }
                };
                for line in buffer.push(&chunk) {
                    if let Some(event) = parse_event_line(&line) {
                        if tx.send(Ok(event)).await.is_err() {
                            // Receiver gone, the session is over.
                            return;
                        }
                    }
                }
            }
            debug!("📡 Generation stream closed by backend");
        });

        Ok(rx)
    }
}

/// Reassembles text lines from arbitrary byte chunks. SSE frames arrive
/// split at whatever boundaries the transport picked, so a partial trailing
/// line — possibly mid-way through a multi-byte UTF-8 character — is
/// carried over as raw bytes and only decoded once the line is complete.
pub(crate) struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub(crate) fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Append a chunk and drain every complete line it closes
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(newline) = self.pending.iter().position(|&byte| byte == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=newline).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }
}

/// Parse one SSE line into an event. Non-`data:` lines and malformed JSON
/// are skipped, never fatal.
pub(crate) fn parse_event_line(line: &str) -> Option<StreamEvent> {
    let payload = line.strip_prefix(DATA_PREFIX)?;
    match serde_json::from_str::<StreamEvent>(payload) {
        Ok(event) => {
            debug!("📨 Stream event: {event:?}");
            Some(event)
        }
        Err(err) => {
            warn!("⚠️ Skipping malformed stream line: {err}");
            None
        }
    }
}
