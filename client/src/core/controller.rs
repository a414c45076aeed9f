//! Generation session controller
//!
//! Owns one story-generation attempt end to end: opens the stream through
//! the `StoryStream` seam, folds events into the `GenerationSession`
//! reducer, drives the watchdog and the 1 Hz display clock, and publishes a
//! fresh `ProgressView` after every state change.
//!
//! `run` consumes the controller, so one controller value can produce at
//! most one outbound request; starting twice is not expressible.

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::core::projector::project;
use crate::core::session::{GenerationSession, SessionPhase};
use crate::core::watchdog::Watchdog;
use crate::error::{ClientError, ClientResult};
use crate::traits::StoryStream;
use crate::types::{FailureKind, ProgressView, SessionConfig, SessionFailure, SessionOutcome};
use shared::StoryRequest;

/// Caller-side cancel switch for a running session
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: mpsc::Sender<()>,
}

impl CancelHandle {
    /// Request cancellation. Idempotent; a no-op once the session is over.
    pub async fn cancel(&self) {
        let _ = self.tx.send(()).await;
    }
}

/// Drives one generation session over a `StoryStream`
pub struct SessionController<S: StoryStream> {
    stream: S,
    request: StoryRequest,
    config: SessionConfig,
    session: GenerationSession,
    view_tx: watch::Sender<ProgressView>,
    cancel_tx: mpsc::Sender<()>,
    cancel_rx: mpsc::Receiver<()>,
}

impl<S: StoryStream> SessionController<S> {
    /// Validate the request and set up session state. No I/O happens until
    /// `run`.
    pub fn new(stream: S, request: StoryRequest, config: SessionConfig) -> ClientResult<Self> {
        request
            .validate()
            .map_err(|err| ClientError::request(err.to_string()))?;

        let session = GenerationSession::new(config.api_base.clone(), std::time::Instant::now());
        let (view_tx, _) = watch::channel(project(&session, &config));
        let (cancel_tx, cancel_rx) = mpsc::channel(1);

        Ok(Self {
            stream,
            request,
            config,
            session,
            view_tx,
            cancel_tx,
            cancel_rx,
        })
    }

    /// Watch the progress view; a new value is published after every event
    /// and tick
    pub fn subscribe(&self) -> watch::Receiver<ProgressView> {
        self.view_tx.subscribe()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: self.cancel_tx.clone(),
        }
    }

    /// Run the session to its outcome. Consuming `self` is what makes a
    /// second outbound request for the same session unrepresentable.
    pub async fn run(self) -> SessionOutcome {
        let Self {
            stream,
            request,
            config,
            mut session,
            view_tx,
            cancel_tx: _cancel_tx,
            mut cancel_rx,
        } = self;

        let publish = |session: &GenerationSession| {
            let _ = view_tx.send(project(session, &config));
        };

        info!("🚀 Starting generation session");
        let mut events = match stream.open(&request).await {
            Ok(events) => events,
            Err(err) => {
                error!("❌ Failed to open generation stream: {err}");
                session.fail(err.to_string());
                publish(&session);
                return SessionOutcome::Failed(SessionFailure::new(
                    FailureKind::Transport,
                    err.to_string(),
                ));
            }
        };

        let mut watchdog = Watchdog::new(config.hard_timeout, config.inactivity_timeout);
        let mut ticker = tokio::time::interval(config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut failure_kind = FailureKind::Transport;

        loop {
            tokio::select! {
                _ = cancel_rx.recv() => {
                    info!("🛑 Session cancelled by caller");
                    watchdog.cancel();
                    return SessionOutcome::Cancelled;
                }

                item = events.recv() => {
                    match item {
                        Some(Ok(event)) => {
                            // Any event, keepalives included, proves the
                            // connection is alive.
                            watchdog.reset();
                            let terminal = event.is_terminal();
                            session.apply_event(&event, std::time::Instant::now());
                            publish(&session);
                            if terminal {
                                failure_kind = FailureKind::Server;
                                break;
                            }
                        }
                        Some(Err(err)) => {
                            warn!("📡 Stream error: {err}");
                            session.fail(format!("connection error: {err}"));
                            publish(&session);
                            break;
                        }
                        None => {
                            session.fail("connection ended unexpectedly, please try again");
                            publish(&session);
                            break;
                        }
                    }
                }

                _ = ticker.tick() => {
                    session.apply_tick(std::time::Instant::now());
                    publish(&session);
                }

                _ = watchdog.hard_expired() => {
                    failure_kind = FailureKind::HardTimeout;
                    let minutes = config.hard_timeout.as_secs() / 60;
                    session.fail(format!(
                        "time limit exceeded ({minutes} minutes), please try again"
                    ));
                    publish(&session);
                    break;
                }

                _ = watchdog.inactivity_expired() => {
                    failure_kind = FailureKind::Inactivity;
                    session.fail(
                        "the connection appears to be inactive, please try again",
                    );
                    publish(&session);
                    break;
                }
            }
        }

        watchdog.cancel();
        drop(events);

        match session.phase {
            SessionPhase::Completed => {
                info!("✅ Story generation completed");
                // Final view stays up briefly before the story is handed
                // over, unless the caller cancels the wait.
                tokio::select! {
                    _ = tokio::time::sleep(config.completion_hold) => {}
                    _ = cancel_rx.recv() => {
                        info!("🛑 Session cancelled during completion hold");
                        return SessionOutcome::Cancelled;
                    }
                }
                match session.story.take() {
                    Some(story) => SessionOutcome::Completed(Box::new(story)),
                    None => SessionOutcome::Failed(SessionFailure::new(
                        FailureKind::Transport,
                        "completed session carried no story payload",
                    )),
                }
            }
            SessionPhase::Failed(message) => {
                error!("❌ Session failed: {message}");
                SessionOutcome::Failed(SessionFailure::new(failure_kind, message))
            }
            SessionPhase::Running => SessionOutcome::Failed(SessionFailure::new(
                FailureKind::Transport,
                "session loop ended while still running",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use url::Url;

    use crate::traits::MockStoryStream;
    use crate::types::{ImageState, ViewPhase};
    use shared::{
        Character, CharacterSummary, ImageId, Story, StoryDraft, StoryPart, StreamEvent, Universe,
    };

    fn request() -> StoryRequest {
        StoryRequest {
            characters: vec![Character {
                id: "c1".to_string(),
                name: "Alice".to_string(),
                images: vec!["data:image/png;base64,AAAA".to_string()],
            }],
            universe: Universe {
                id: "u".to_string(),
                name: "U".to_string(),
                style: "s".to_string(),
            },
            description: None,
        }
    }

    fn config() -> SessionConfig {
        let mut config = SessionConfig::new(Url::parse("http://localhost:8000").unwrap());
        config.completion_hold = Duration::from_millis(10);
        config
    }

    fn draft(parts: usize) -> StoryDraft {
        StoryDraft {
            title: "The Lost Wand".to_string(),
            parts: (0..parts)
                .map(|i| StoryPart::new(format!("t{i}"), format!("p{i}")))
                .collect(),
            story_id: Some("s1".to_string()),
            folder: None,
        }
    }

    fn story(images: &[(ImageId, &str)]) -> Story {
        Story {
            id: "s1".to_string(),
            folder: None,
            created_at: None,
            status: Some("completed".to_string()),
            title: "The Lost Wand".to_string(),
            cover_prompt: None,
            parts: draft(5).parts,
            images: images
                .iter()
                .map(|(id, url)| (*id, url.to_string()))
                .collect(),
            universe: Universe {
                id: "u".to_string(),
                name: "U".to_string(),
                style: "s".to_string(),
            },
            characters: vec![CharacterSummary {
                id: "c1".to_string(),
                name: "Alice".to_string(),
            }],
            total_time: Some(142.0),
        }
    }

    fn image_start(id: ImageId, current: u32) -> StreamEvent {
        StreamEvent::ImageStart {
            stage: 3,
            image_id: id,
            message: format!("generating {id}"),
            current_image: current,
            total_images: 6,
        }
    }

    fn image_done(id: ImageId, current: u32) -> StreamEvent {
        StreamEvent::ImageDone {
            stage: 3,
            image_id: id,
            message: format!("done {id}"),
            elapsed: 8.0,
            image_url: format!("/historias/s1/{id}.png"),
            current_image: current,
            total_images: 6,
            progress: 40.0 + current as f32 * 10.0,
        }
    }

    /// Mock stream whose `open` yields the given events, then ends the
    /// channel
    fn stream_with(events: Vec<StreamEvent>) -> MockStoryStream {
        let mut stream = MockStoryStream::new();
        stream.expect_open().times(1).returning(move |_| {
            let (tx, rx) = mpsc::channel(64);
            for event in &events {
                tx.try_send(Ok(event.clone())).ok();
            }
            Ok(rx)
        });
        stream
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_scenario_with_one_failed_image() {
        let mut events = vec![
            StreamEvent::Stage {
                stage: 1,
                title: "🚀 Starting".to_string(),
                message: "warming up".to_string(),
                progress: 5.0,
            },
            StreamEvent::StoryCreated {
                stage: 2,
                title: "📜 Story written".to_string(),
                message: "text ready".to_string(),
                progress: 25.0,
                elapsed: 12.0,
                data: draft(5),
            },
        ];
        let ids = [
            ImageId::Cover,
            ImageId::Part(1),
            ImageId::Part(2),
            ImageId::Part(3),
            ImageId::Part(4),
        ];
        for (i, id) in ids.iter().enumerate() {
            events.push(image_start(*id, i as u32 + 1));
            events.push(image_done(*id, i as u32 + 1));
        }
        events.push(image_start(ImageId::Part(5), 6));
        events.push(StreamEvent::ImageError {
            stage: 3,
            image_id: ImageId::Part(5),
            message: "generation failed".to_string(),
            error: Some("model refused".to_string()),
        });
        events.push(StreamEvent::Complete {
            stage: 4,
            title: "✨ Done".to_string(),
            message: "ready".to_string(),
            progress: 100.0,
            total_time: 142.0,
            data: story(&[
                (ImageId::Cover, "/historias/s1/capa.png"),
                (ImageId::Part(1), "/historias/s1/parte_1.png"),
                (ImageId::Part(2), "/historias/s1/parte_2.png"),
                (ImageId::Part(3), "/historias/s1/parte_3.png"),
                (ImageId::Part(4), "/historias/s1/parte_4.png"),
            ]),
        });

        let controller =
            SessionController::new(stream_with(events), request(), config()).unwrap();
        let view_rx = controller.subscribe();

        let outcome = controller.run().await;

        let SessionOutcome::Completed(story) = outcome else {
            panic!("expected completed outcome");
        };
        assert_eq!(story.images.len(), 5);
        assert_eq!(
            story.images[&ImageId::Part(3)],
            "http://localhost:8000/historias/s1/parte_3.png"
        );

        let view = view_rx.borrow();
        assert!(matches!(view.phase, ViewPhase::Completed { .. }));
        assert_eq!(view.progress, 100.0);
        assert_eq!(view.images.len(), 6);
        let done = view
            .images
            .iter()
            .filter(|slot| matches!(slot.state, ImageState::Done { .. }))
            .count();
        assert_eq!(done, 5);
        assert_eq!(
            view.images[5].state,
            ImageState::Errored {
                message: "model refused".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_end_without_terminal_event() {
        let events = vec![StreamEvent::Stage {
            stage: 2,
            title: "📜 Writing".to_string(),
            message: "working".to_string(),
            progress: 15.0,
        }];

        let controller =
            SessionController::new(stream_with(events), request(), config()).unwrap();
        let outcome = controller.run().await;

        let SessionOutcome::Failed(failure) = outcome else {
            panic!("expected failed outcome");
        };
        assert_eq!(failure.kind, FailureKind::Transport);
        assert!(failure.message.contains("ended unexpectedly"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hard_timeout_fires() {
        let mut stream = MockStoryStream::new();
        stream.expect_open().times(1).returning(|_| {
            let (tx, rx) = mpsc::channel(4);
            // Park the sender far beyond the hard deadline so the channel
            // stays open without delivering events.
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                drop(tx);
            });
            Ok(rx)
        });

        let mut config = config();
        config.hard_timeout = Duration::from_secs(120);
        config.inactivity_timeout = Duration::from_secs(600);

        let controller = SessionController::new(stream, request(), config).unwrap();
        let outcome = controller.run().await;

        let SessionOutcome::Failed(failure) = outcome else {
            panic!("expected failed outcome");
        };
        assert_eq!(failure.kind, FailureKind::HardTimeout);
        assert!(failure.message.starts_with("time limit exceeded"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pings_postpone_inactivity_until_they_stop() {
        let mut stream = MockStoryStream::new();
        stream.expect_open().times(1).returning(|_| {
            let (tx, rx) = mpsc::channel(4);
            tokio::spawn(async move {
                // Keepalives hold the window open; once they stop the
                // inactivity deadline runs out before the hard one.
                for _ in 0..5 {
                    tokio::time::sleep(Duration::from_secs(20)).await;
                    if tx
                        .send(Ok(StreamEvent::Ping {
                            message: Some("Writing...".to_string()),
                        }))
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                tokio::time::sleep(Duration::from_secs(3600)).await;
                drop(tx);
            });
            Ok(rx)
        });

        let mut config = config();
        config.hard_timeout = Duration::from_secs(600);
        config.inactivity_timeout = Duration::from_secs(30);

        let controller = SessionController::new(stream, request(), config).unwrap();
        let outcome = controller.run().await;

        let SessionOutcome::Failed(failure) = outcome else {
            panic!("expected failed outcome");
        };
        assert_eq!(failure.kind, FailureKind::Inactivity);
        assert!(failure.message.contains("inactive"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_resolves_without_story() {
        let mut stream = MockStoryStream::new();
        stream.expect_open().times(1).returning(|_| {
            let (tx, rx) = mpsc::channel(4);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                drop(tx);
            });
            Ok(rx)
        });

        let controller = SessionController::new(stream, request(), config()).unwrap();
        let handle = controller.cancel_handle();

        let session = tokio::spawn(controller.run());
        handle.cancel().await;

        let outcome = session.await.unwrap();
        assert!(matches!(outcome, SessionOutcome::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_completion_hold_drops_the_story() {
        let events = vec![StreamEvent::Complete {
            stage: 4,
            title: "✨ Done".to_string(),
            message: "ready".to_string(),
            progress: 100.0,
            total_time: 142.0,
            data: story(&[(ImageId::Cover, "/historias/s1/capa.png")]),
        }];

        let mut config = config();
        config.completion_hold = Duration::from_secs(60);

        let controller =
            SessionController::new(stream_with(events), request(), config).unwrap();
        let handle = controller.cancel_handle();
        let mut view_rx = controller.subscribe();

        let session = tokio::spawn(controller.run());

        // The completed view going up means the hold has started.
        while !matches!(view_rx.borrow_and_update().phase, ViewPhase::Completed { .. }) {
            view_rx.changed().await.unwrap();
        }
        handle.cancel().await;

        let outcome = session.await.unwrap();
        assert!(matches!(outcome, SessionOutcome::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_event_fails_session() {
        let events = vec![StreamEvent::Error {
            stage: -1,
            title: Some("❌ Error".to_string()),
            message: "model unavailable".to_string(),
            progress: None,
        }];

        let controller =
            SessionController::new(stream_with(events), request(), config()).unwrap();
        let view_rx = controller.subscribe();
        let outcome = controller.run().await;

        let SessionOutcome::Failed(failure) = outcome else {
            panic!("expected failed outcome");
        };
        assert_eq!(failure.kind, FailureKind::Server);
        assert_eq!(failure.message, "model unavailable");
        assert!(matches!(view_rx.borrow().phase, ViewPhase::Failed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_failure_is_immediate_transport_failure() {
        let mut stream = MockStoryStream::new();
        stream
            .expect_open()
            .times(1)
            .returning(|_| Err(ClientError::connect("connection refused")));

        let controller = SessionController::new(stream, request(), config()).unwrap();
        let outcome = controller.run().await;

        let SessionOutcome::Failed(failure) = outcome else {
            panic!("expected failed outcome");
        };
        assert_eq!(failure.kind, FailureKind::Transport);
        assert!(failure.message.contains("connection failed"));
    }

    #[tokio::test]
    async fn test_invalid_request_is_rejected_before_any_request() {
        // The mock has no expectations, so any `open` call would panic.
        let stream = MockStoryStream::new();
        let invalid = StoryRequest {
            characters: vec![],
            universe: request().universe,
            description: None,
        };

        let result = SessionController::new(stream, invalid, config());
        assert!(matches!(result, Err(ClientError::RequestError { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_makes_exactly_one_request() {
        // `times(1)` makes the mock panic on a second `open`; together with
        // `run(self)` consuming the controller this pins the single-request
        // guarantee.
        let events = vec![StreamEvent::Error {
            stage: -1,
            title: None,
            message: "boom".to_string(),
            progress: None,
        }];
        let controller =
            SessionController::new(stream_with(events), request(), config()).unwrap();
        let _ = controller.run().await;
    }
}
