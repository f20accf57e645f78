//! Cross-cutting infrastructure shared by the store and the application

pub mod log_messages;
pub mod telemetry;
