//! Domain types supplied by the surrounding gateway

pub mod exchange;
pub mod rule;

pub use exchange::{
    Exchange, ExchangeId, ExchangeState, ExchangeStatus, ExchangeViewer, LatencyMillis,
    MessageSummary, SharedExchange,
};
pub use rule::{ListenPort, Rule, RuleKey, RuleName};
