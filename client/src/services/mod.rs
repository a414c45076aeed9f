//! Client service implementations

pub mod story_api;

#[cfg(test)]
pub mod tests;

pub use story_api::*;
