//! Tests for client service implementations
