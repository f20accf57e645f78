//! Exchange Store - an in-memory registry of gateway exchanges
//!
//! Records the request/response pairs flowing through a reverse proxy,
//! indexes them by the routing rule that produced them and derives per-rule
//! latency and throughput statistics on demand.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod store;

pub use application::Application;
pub use error::{Error, Result};
pub use store::{ExchangeStore, MemoryExchangeStore};
