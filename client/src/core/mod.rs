//! Core session logic
//!
//! Pure state (reducer, projector) plus the controller task that drives it.
//! Nothing in here talks to the network directly; I/O comes in through the
//! `StoryStream` seam.

pub mod controller;
pub mod projector;
pub mod session;
pub mod watchdog;

pub use controller::{CancelHandle, SessionController};
pub use projector::project;
pub use session::{GenerationSession, SessionPhase};
pub use watchdog::Watchdog;
