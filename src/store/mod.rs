//! Registry of exchanges seen by the gateway, indexed by routing rule
//!
//! The proxy pipeline adds an exchange as soon as a request starts routing and
//! keeps mutating it afterwards. Monitoring surfaces read snapshots, per-rule
//! statistics and subscribe to add/remove notifications.

pub mod listener;
pub mod memory;
pub mod statistics;
pub mod types;

use crate::domain::exchange::SharedExchange;
use crate::domain::rule::{Rule, RuleKey};
use std::sync::Arc;

pub use listener::{
    ChannelListener, ExchangeStoreListener, ListenerHub, ListenerId, StoreEvent, TracingListener,
};
pub use memory::MemoryExchangeStore;
pub use types::{RetentionLimit, RetentionPolicy, RuleStatistics, StoreError, StoreResult};

/// Operations every exchange store provides
///
/// All operations are safe to call from many threads at once. Queries return
/// snapshots that do not change when the store does.
pub trait ExchangeStore: Send + Sync {
    /// Register an exchange that has not received a response yet
    ///
    /// Exchanges that already carry a response, or that are already stored,
    /// are ignored without notification.
    fn add(&self, exchange: SharedExchange);

    /// Drop one exchange; does nothing if it is not stored
    fn remove(&self, exchange: &SharedExchange);

    /// Drop every exchange of `rule`, notifying listeners once
    fn remove_all_exchanges_for_rule(&self, rule: &Rule);

    /// Drop a batch of exchanges, notifying listeners once
    fn remove_all_exchanges(&self, exchanges: &[SharedExchange]);

    fn exchanges_for_rule(&self, key: &RuleKey) -> Vec<SharedExchange>;

    fn count_for_rule(&self, key: &RuleKey) -> usize;

    /// Every stored exchange in insertion order
    fn all_exchanges(&self) -> Vec<SharedExchange>;

    /// The last `count` exchanges added, oldest first
    fn most_recent(&self, count: usize) -> Vec<SharedExchange>;

    fn statistics_for_rule(&self, key: &RuleKey) -> StoreResult<RuleStatistics>;

    /// Keys that currently have at least one exchange
    fn rule_keys(&self) -> Vec<RuleKey>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn subscribe(&self, listener: Arc<dyn ExchangeStoreListener>) -> ListenerId;

    fn unsubscribe(&self, id: ListenerId) -> bool;
}

/// Store shared between proxy workers and monitoring surfaces
pub type SharedExchangeStore = Arc<dyn ExchangeStore>;
