//! Log message constants
//!
//! This module centralizes the log messages used throughout the crate so
//! wording stays consistent between components.

/// Application startup and lifecycle messages
pub mod application {
    pub const STARTING: &str = "Starting exchange store";
    pub const STARTED_SUCCESSFULLY: &str = "Exchange store ready";
    pub const SHUTTING_DOWN: &str = "Shutdown signal received";
    pub const EVENT_CONSUMER_STOPPED: &str = "Store event consumer stopped";
    pub const STORE_EVENT: &str = "Store event";
}

/// Exchange store messages
pub mod store {
    pub const ADDED: &str = "Exchange added";
    pub const ADD_SKIPPED_RESPONSE: &str = "Exchange already carries a response, not adding";
    pub const ADD_SKIPPED_DISCARDED: &str = "Exchange was discarded by the pipeline, not adding";
    pub const ADD_SKIPPED_DUPLICATE: &str = "Exchange already stored, not adding";
    pub const REMOVED: &str = "Exchange removed";
    pub const RULE_CLEARED: &str = "Removed all exchanges of rule";
    pub const BATCH_REMOVED: &str = "Removed exchange batch";
    pub const RETENTION_CHANGED: &str = "Retention policy changed";
    pub const RETENTION_EVICTED: &str = "Evicted oldest exchanges over retention limit";
}

/// Listener fan-out messages
pub mod listeners {
    pub const SUBSCRIBED: &str = "Store listener subscribed";
    pub const UNSUBSCRIBED: &str = "Store listener unsubscribed";
    pub const RECEIVER_CLOSED: &str = "Store event receiver closed, dropping event";
    pub const EXCHANGE_ADDED: &str = "Exchange added to store";
    pub const EXCHANGE_REMOVED: &str = "Exchange removed from store";
    pub const RULE_CLEARED: &str = "All exchanges of rule removed from store";
    pub const BATCH_REMOVED: &str = "Exchange batch removed from store";
}

/// Statistics aggregation messages
pub mod statistics {
    pub const INCOMPLETE_EXCHANGE: &str =
        "Completed exchange is missing data recorded by the pipeline";
}

/// Configuration messages
pub mod configuration {
    pub const CONFIG_LOADED: &str = "Configuration loaded successfully";
}
