//! Application services and lifecycle orchestration
//!
//! This module wires the exchange store to configuration and logging for the
//! standalone binary.

pub mod app;

pub use app::{spawn_event_consumer, Application, EventTally};
