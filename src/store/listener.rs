//! Fan-out of store changes to registered observers
//!
//! Listeners are invoked synchronously on the thread that changed the store,
//! after the store's own lock has been released. A listener that needs to do
//! slow work should hand it off, for example through [`ChannelListener`].

use crate::domain::exchange::{ExchangeId, SharedExchange};
use crate::domain::rule::{Rule, RuleKey};
use crate::infrastructure::log_messages::listeners as messages;
use derive_more::Display;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Observer of exchange store changes
///
/// Each callback happens after the store change it describes, but callbacks
/// from concurrent store calls are not ordered. If one thread removes an
/// exchange while another is still adding it, a listener can see the removal
/// before the addition. Listeners that mirror the store should tolerate a
/// removal for an exchange they have not seen added yet.
pub trait ExchangeStoreListener: Send + Sync {
    /// An exchange was added under `rule`
    fn add_exchange(&self, rule: &Rule, exchange: &SharedExchange);

    /// A single exchange was removed
    fn remove_exchange(&self, exchange: &SharedExchange);

    /// Every exchange of `rule` was removed at once
    fn remove_rule_exchanges(&self, rule: &Rule, exchanges: &[SharedExchange]);

    /// A batch of exchanges, possibly spanning rules, was removed at once
    fn remove_exchanges(&self, exchanges: &[SharedExchange]);
}

/// Handle returned by [`ListenerHub::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display("listener-{_0}")]
pub struct ListenerId(u64);

/// Registry of store listeners keyed by subscription handle
#[derive(Default)]
pub struct ListenerHub {
    next_id: AtomicU64,
    listeners: RwLock<BTreeMap<ListenerId, Arc<dyn ExchangeStoreListener>>>,
}

impl ListenerHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Arc<dyn ExchangeStoreListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().insert(id, listener);
        debug!(listener = %id, "{}", messages::SUBSCRIBED);
        id
    }

    /// Returns false when `id` was not subscribed
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let removed = self.listeners.write().remove(&id).is_some();
        if removed {
            debug!(listener = %id, "{}", messages::UNSUBSCRIBED);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    /// Current listeners in subscription order
    ///
    /// Callers invoke the returned listeners without holding the hub lock, so a
    /// callback may subscribe or unsubscribe without deadlocking.
    pub fn snapshot(&self) -> Vec<Arc<dyn ExchangeStoreListener>> {
        self.listeners.read().values().cloned().collect()
    }

    /// Announce an addition and attach each listener to the exchange, so a
    /// later `Exchange::discard` reaches the same listeners
    pub fn notify_added(&self, rule: &Rule, exchange: &SharedExchange) {
        for listener in self.snapshot() {
            exchange.attach_store_listener(Arc::downgrade(&listener));
            listener.add_exchange(rule, exchange);
        }
    }

    pub fn notify_removed(&self, exchange: &SharedExchange) {
        for listener in self.snapshot() {
            listener.remove_exchange(exchange);
        }
    }

    pub fn notify_rule_cleared(&self, rule: &Rule, exchanges: &[SharedExchange]) {
        for listener in self.snapshot() {
            listener.remove_rule_exchanges(rule, exchanges);
        }
    }

    pub fn notify_batch_removed(&self, exchanges: &[SharedExchange]) {
        for listener in self.snapshot() {
            listener.remove_exchanges(exchanges);
        }
    }
}

/// Store change, as delivered by [`ChannelListener`]
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    Added {
        rule: RuleKey,
        exchange: ExchangeId,
    },
    Removed {
        rule: RuleKey,
        exchange: ExchangeId,
    },
    RuleCleared {
        rule: RuleKey,
        exchanges: Vec<ExchangeId>,
    },
    BatchRemoved {
        exchanges: Vec<ExchangeId>,
    },
}

fn ids(exchanges: &[SharedExchange]) -> Vec<ExchangeId> {
    exchanges.iter().map(|exchange| exchange.id()).collect()
}

/// Forwards store changes into an unbounded channel
///
/// Lets a consumer task process events away from the proxy threads that
/// trigger them. Events are dropped once the receiver is gone.
pub struct ChannelListener {
    sender: mpsc::UnboundedSender<StoreEvent>,
}

impl ChannelListener {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StoreEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn forward(&self, event: StoreEvent) {
        if let Err(mpsc::error::SendError(event)) = self.sender.send(event) {
            debug!(?event, "{}", messages::RECEIVER_CLOSED);
        }
    }
}

impl ExchangeStoreListener for ChannelListener {
    fn add_exchange(&self, rule: &Rule, exchange: &SharedExchange) {
        self.forward(StoreEvent::Added {
            rule: rule.key().clone(),
            exchange: exchange.id(),
        });
    }

    fn remove_exchange(&self, exchange: &SharedExchange) {
        self.forward(StoreEvent::Removed {
            rule: exchange.rule().key().clone(),
            exchange: exchange.id(),
        });
    }

    fn remove_rule_exchanges(&self, rule: &Rule, exchanges: &[SharedExchange]) {
        self.forward(StoreEvent::RuleCleared {
            rule: rule.key().clone(),
            exchanges: ids(exchanges),
        });
    }

    fn remove_exchanges(&self, exchanges: &[SharedExchange]) {
        self.forward(StoreEvent::BatchRemoved {
            exchanges: ids(exchanges),
        });
    }
}

/// Logs every store change at info level
#[derive(Debug, Default)]
pub struct TracingListener;

impl ExchangeStoreListener for TracingListener {
    fn add_exchange(&self, rule: &Rule, exchange: &SharedExchange) {
        info!(rule = %rule.key(), exchange = %exchange.id(), "{}", messages::EXCHANGE_ADDED);
    }

    fn remove_exchange(&self, exchange: &SharedExchange) {
        info!(
            rule = %exchange.rule().key(),
            exchange = %exchange.id(),
            "{}",
            messages::EXCHANGE_REMOVED
        );
    }

    fn remove_rule_exchanges(&self, rule: &Rule, exchanges: &[SharedExchange]) {
        info!(rule = %rule.key(), count = exchanges.len(), "{}", messages::RULE_CLEARED);
    }

    fn remove_exchanges(&self, exchanges: &[SharedExchange]) {
        info!(count = exchanges.len(), "{}", messages::BATCH_REMOVED);
    }
}

/// Listener that remembers every callback, for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingListener {
    events: parking_lot::Mutex<Vec<StoreEvent>>,
}

#[cfg(test)]
impl RecordingListener {
    pub(crate) fn events(&self) -> Vec<StoreEvent> {
        self.events.lock().clone()
    }

    pub(crate) fn added(&self) -> Vec<ExchangeId> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                StoreEvent::Added { exchange, .. } => Some(exchange),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn removed(&self) -> Vec<ExchangeId> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                StoreEvent::Removed { exchange, .. } => Some(exchange),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn batches(&self) -> Vec<Vec<ExchangeId>> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                StoreEvent::RuleCleared { exchanges, .. }
                | StoreEvent::BatchRemoved { exchanges } => Some(exchanges),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
impl ExchangeStoreListener for RecordingListener {
    fn add_exchange(&self, rule: &Rule, exchange: &SharedExchange) {
        self.events.lock().push(StoreEvent::Added {
            rule: rule.key().clone(),
            exchange: exchange.id(),
        });
    }

    fn remove_exchange(&self, exchange: &SharedExchange) {
        self.events.lock().push(StoreEvent::Removed {
            rule: exchange.rule().key().clone(),
            exchange: exchange.id(),
        });
    }

    fn remove_rule_exchanges(&self, rule: &Rule, exchanges: &[SharedExchange]) {
        self.events.lock().push(StoreEvent::RuleCleared {
            rule: rule.key().clone(),
            exchanges: ids(exchanges),
        });
    }

    fn remove_exchanges(&self, exchanges: &[SharedExchange]) {
        self.events.lock().push(StoreEvent::BatchRemoved {
            exchanges: ids(exchanges),
        });
    }
}
