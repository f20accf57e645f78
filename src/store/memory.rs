//! In-memory exchange store
//!
//! Both views of the stored exchanges, the per-rule index and the global
//! insertion-ordered sequence, live behind a single lock so every operation
//! moves them together. Creating a bucket for an unseen key and deleting an
//! emptied bucket happen inside the same write section as the change that
//! caused them. Listeners are notified after the lock is released.

use crate::domain::exchange::{ExchangeId, SharedExchange};
use crate::domain::rule::{Rule, RuleKey};
use crate::infrastructure::log_messages::store as messages;
use crate::store::listener::{ExchangeStoreListener, ListenerHub, ListenerId};
use crate::store::statistics;
use crate::store::types::{RetentionPolicy, RuleStatistics, StoreResult};
use crate::store::ExchangeStore;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Default)]
struct Index {
    by_rule: HashMap<RuleKey, Vec<SharedExchange>>,
    sequence: VecDeque<SharedExchange>,
    ids: HashSet<ExchangeId>,
    retention: RetentionPolicy,
}

impl Index {
    /// Returns false when the exchange is already stored
    fn insert(&mut self, exchange: &SharedExchange) -> bool {
        if !self.ids.insert(exchange.id()) {
            return false;
        }
        self.by_rule
            .entry(exchange.rule().key().clone())
            .or_default()
            .push(exchange.clone());
        self.sequence.push_back(exchange.clone());
        true
    }

    /// Returns false when the exchange is not stored
    fn detach(&mut self, exchange: &SharedExchange) -> bool {
        let id = exchange.id();
        if !self.ids.contains(&id) || !self.detach_from_bucket(exchange.rule().key(), id) {
            return false;
        }
        if let Some(position) = self.sequence.iter().position(|stored| stored.id() == id) {
            self.sequence.remove(position);
        }
        self.ids.remove(&id);
        true
    }

    fn detach_from_bucket(&mut self, key: &RuleKey, id: ExchangeId) -> bool {
        let Some(bucket) = self.by_rule.get_mut(key) else {
            return false;
        };
        let Some(position) = bucket.iter().position(|stored| stored.id() == id) else {
            return false;
        };
        bucket.remove(position);
        if bucket.is_empty() {
            self.by_rule.remove(key);
        }
        true
    }

    fn take_rule(&mut self, key: &RuleKey) -> Vec<SharedExchange> {
        let bucket = self.by_rule.remove(key).unwrap_or_default();
        if bucket.is_empty() {
            return bucket;
        }
        let taken: HashSet<ExchangeId> = bucket.iter().map(|exchange| exchange.id()).collect();
        self.sequence.retain(|stored| !taken.contains(&stored.id()));
        self.ids.retain(|id| !taken.contains(id));
        bucket
    }

    fn evict_excess(&mut self) -> Vec<SharedExchange> {
        let excess = self.retention.excess(self.sequence.len());
        let evicted: Vec<SharedExchange> = self.sequence.drain(..excess).collect();
        for exchange in &evicted {
            self.detach_from_bucket(exchange.rule().key(), exchange.id());
            self.ids.remove(&exchange.id());
        }
        evicted
    }
}

/// Exchange store backed by process memory
pub struct MemoryExchangeStore {
    index: RwLock<Index>,
    listeners: ListenerHub,
}

impl MemoryExchangeStore {
    pub fn new() -> Self {
        Self::with_retention(RetentionPolicy::Unbounded)
    }

    pub fn with_retention(retention: RetentionPolicy) -> Self {
        Self {
            index: RwLock::new(Index {
                retention,
                ..Index::default()
            }),
            listeners: ListenerHub::new(),
        }
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.index.read().retention
    }

    /// Replace the retention policy, evicting immediately if it is now exceeded
    pub fn set_retention(&self, retention: RetentionPolicy) {
        let evicted = {
            let mut index = self.index.write();
            index.retention = retention;
            index.evict_excess()
        };
        info!(?retention, "{}", messages::RETENTION_CHANGED);
        self.finish_eviction(evicted);
    }

    pub fn contains(&self, id: ExchangeId) -> bool {
        self.index.read().ids.contains(&id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn finish_eviction(&self, evicted: Vec<SharedExchange>) {
        if evicted.is_empty() {
            return;
        }
        warn!(count = evicted.len(), "{}", messages::RETENTION_EVICTED);
        let reported = release(&evicted);
        if !reported.is_empty() {
            self.listeners.notify_batch_removed(&reported);
        }
    }
}

/// Inform viewers and detach store listeners of exchanges the store dropped
///
/// Returns the exchanges whose removal the store still has to report; the
/// rest were already reported by `Exchange::discard`.
fn release(removed: &[SharedExchange]) -> Vec<SharedExchange> {
    let mut reported = Vec::with_capacity(removed.len());
    for exchange in removed {
        exchange.inform_viewers_on_removal();
        if exchange.detach_store_listeners() {
            reported.push(exchange.clone());
        }
    }
    reported
}

impl Default for MemoryExchangeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ExchangeStore for MemoryExchangeStore {
    fn add(&self, exchange: SharedExchange) {
        if exchange.has_response() {
            debug!(exchange = %exchange.id(), "{}", messages::ADD_SKIPPED_RESPONSE);
            return;
        }
        if exchange.is_discarded() {
            debug!(exchange = %exchange.id(), "{}", messages::ADD_SKIPPED_DISCARDED);
            return;
        }

        let evicted = {
            let mut index = self.index.write();
            if !index.insert(&exchange) {
                debug!(exchange = %exchange.id(), "{}", messages::ADD_SKIPPED_DUPLICATE);
                return;
            }
            exchange.mark_stored();
            index.evict_excess()
        };
        debug!(rule = %exchange.rule().key(), exchange = %exchange.id(), "{}", messages::ADDED);

        self.listeners.notify_added(exchange.rule(), &exchange);
        self.finish_eviction(evicted);
    }

    fn remove(&self, exchange: &SharedExchange) {
        if !self.index.write().detach(exchange) {
            return;
        }
        debug!(rule = %exchange.rule().key(), exchange = %exchange.id(), "{}", messages::REMOVED);

        exchange.inform_viewers_on_removal();
        if exchange.detach_store_listeners() {
            self.listeners.notify_removed(exchange);
        }
    }

    fn remove_all_exchanges_for_rule(&self, rule: &Rule) {
        let removed = self.index.write().take_rule(rule.key());
        if removed.is_empty() {
            return;
        }
        debug!(rule = %rule.key(), count = removed.len(), "{}", messages::RULE_CLEARED);

        let reported = release(&removed);
        if !reported.is_empty() {
            self.listeners.notify_rule_cleared(rule, &reported);
        }
    }

    fn remove_all_exchanges(&self, exchanges: &[SharedExchange]) {
        let removed: Vec<SharedExchange> = {
            let mut index = self.index.write();
            exchanges
                .iter()
                .filter(|exchange| index.detach(exchange))
                .cloned()
                .collect()
        };
        if removed.is_empty() {
            return;
        }
        debug!(count = removed.len(), "{}", messages::BATCH_REMOVED);

        let reported = release(&removed);
        if !reported.is_empty() {
            self.listeners.notify_batch_removed(&reported);
        }
    }

    fn exchanges_for_rule(&self, key: &RuleKey) -> Vec<SharedExchange> {
        self.index
            .read()
            .by_rule
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    fn count_for_rule(&self, key: &RuleKey) -> usize {
        self.index.read().by_rule.get(key).map_or(0, Vec::len)
    }

    fn all_exchanges(&self) -> Vec<SharedExchange> {
        self.index.read().sequence.iter().cloned().collect()
    }

    fn most_recent(&self, count: usize) -> Vec<SharedExchange> {
        let index = self.index.read();
        let start = index.sequence.len().saturating_sub(count);
        index.sequence.range(start..).cloned().collect()
    }

    fn statistics_for_rule(&self, key: &RuleKey) -> StoreResult<RuleStatistics> {
        let snapshot = self.exchanges_for_rule(key);
        statistics::aggregate(&snapshot)
    }

    fn rule_keys(&self) -> Vec<RuleKey> {
        self.index.read().by_rule.keys().cloned().collect()
    }

    fn len(&self) -> usize {
        self.index.read().sequence.len()
    }

    fn subscribe(&self, listener: Arc<dyn ExchangeStoreListener>) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::exchange::{Exchange, ExchangeViewer, MessageSummary};
    use crate::domain::rule::{ListenPort, RuleName};
    use crate::store::listener::{RecordingListener, StoreEvent};
    use crate::store::types::RetentionLimit;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn rule(name: &str, port: u16) -> Arc<Rule> {
        Arc::new(Rule::new(
            RuleName::try_new(name.to_string()).unwrap(),
            RuleKey::any(ListenPort::try_new(port).unwrap()),
        ))
    }

    fn ids(exchanges: &[SharedExchange]) -> Vec<ExchangeId> {
        exchanges.iter().map(|exchange| exchange.id()).collect()
    }

    fn store_with_listener() -> (MemoryExchangeStore, Arc<RecordingListener>) {
        let store = MemoryExchangeStore::new();
        let listener = Arc::new(RecordingListener::default());
        store.subscribe(listener.clone());
        (store, listener)
    }

    fn fill(store: &MemoryExchangeStore, rule: &Arc<Rule>, count: usize) -> Vec<SharedExchange> {
        (0..count)
            .map(|_| {
                let exchange = Exchange::shared(rule.clone());
                store.add(exchange.clone());
                exchange
            })
            .collect()
    }

    #[derive(Default)]
    struct CountingViewer(AtomicUsize);

    impl ExchangeViewer for CountingViewer {
        fn removed_from_store(&self, _exchange: &Exchange) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn add_indexes_under_rule_and_globally() {
        let (store, listener) = store_with_listener();
        let orders = rule("orders", 8080);
        let exchange = Exchange::shared(orders.clone());

        store.add(exchange.clone());

        assert_eq!(store.len(), 1);
        assert_eq!(store.count_for_rule(orders.key()), 1);
        assert_eq!(ids(&store.exchanges_for_rule(orders.key())), vec![exchange.id()]);
        assert_eq!(ids(&store.all_exchanges()), vec![exchange.id()]);
        assert_eq!(listener.added(), vec![exchange.id()]);
    }

    #[test]
    fn add_ignores_exchange_that_already_has_a_response() {
        let (store, listener) = store_with_listener();
        let exchange = Exchange::shared(rule("orders", 8080));
        exchange.set_response(MessageSummary::with_body_length(12));

        store.add(exchange);

        assert!(store.is_empty());
        assert!(listener.events().is_empty());
    }

    #[test]
    fn add_ignores_the_same_exchange_twice() {
        let (store, listener) = store_with_listener();
        let exchange = Exchange::shared(rule("orders", 8080));

        store.add(exchange.clone());
        store.add(exchange.clone());

        assert_eq!(store.len(), 1);
        assert_eq!(listener.added().len(), 1);
    }

    #[test]
    fn remove_is_idempotent() {
        let (store, listener) = store_with_listener();
        let orders = rule("orders", 8080);
        let exchanges = fill(&store, &orders, 2);

        store.remove(&exchanges[0]);
        store.remove(&exchanges[0]);

        assert_eq!(store.len(), 1);
        assert_eq!(listener.removed(), vec![exchanges[0].id()]);
    }

    #[test]
    fn removing_last_exchange_deletes_the_bucket() {
        let store = MemoryExchangeStore::new();
        let orders = rule("orders", 8080);
        let users = rule("users", 8081);
        let order = fill(&store, &orders, 1).remove(0);
        fill(&store, &users, 1);

        store.remove(&order);

        assert_eq!(store.count_for_rule(orders.key()), 0);
        assert!(store.exchanges_for_rule(orders.key()).is_empty());
        assert_eq!(store.rule_keys(), vec![users.key().clone()]);
    }

    #[test]
    fn remove_preserves_order_of_survivors() {
        let store = MemoryExchangeStore::new();
        let orders = rule("orders", 8080);
        let exchanges = fill(&store, &orders, 4);

        store.remove(&exchanges[1]);

        assert_eq!(
            ids(&store.all_exchanges()),
            ids(&[exchanges[0].clone(), exchanges[2].clone(), exchanges[3].clone()])
        );
    }

    #[test]
    fn remove_of_unknown_exchange_is_silent() {
        let (store, listener) = store_with_listener();
        store.remove(&Exchange::shared(rule("orders", 8080)));
        assert!(listener.events().is_empty());
    }

    #[test]
    fn remove_informs_exchange_viewers() {
        let store = MemoryExchangeStore::new();
        let exchange = fill(&store, &rule("orders", 8080), 1).remove(0);
        let viewer = Arc::new(CountingViewer::default());
        exchange.add_viewer(viewer.clone());

        store.remove(&exchange);

        assert_eq!(viewer.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn removing_a_rule_notifies_once_with_its_exchanges() {
        let (store, listener) = store_with_listener();
        let orders = rule("orders", 8080);
        let users = rule("users", 8081);
        let order_exchanges = fill(&store, &orders, 3);
        let user_exchanges = fill(&store, &users, 2);

        store.remove_all_exchanges_for_rule(&orders);

        assert_eq!(store.count_for_rule(orders.key()), 0);
        assert_eq!(ids(&store.all_exchanges()), ids(&user_exchanges));
        assert_eq!(listener.batches(), vec![ids(&order_exchanges)]);
        assert!(matches!(
            listener.events().last(),
            Some(StoreEvent::RuleCleared { rule, .. }) if rule == orders.key()
        ));
    }

    #[test]
    fn removing_an_unknown_rule_is_silent() {
        let (store, listener) = store_with_listener();
        store.remove_all_exchanges_for_rule(&rule("orders", 8080));
        assert!(listener.events().is_empty());
    }

    #[test]
    fn batch_removal_fires_a_single_event() {
        let (store, listener) = store_with_listener();
        let orders = rule("orders", 8080);
        let users = rule("users", 8081);
        let mut batch = fill(&store, &orders, 3);
        batch.extend(fill(&store, &users, 2));
        let keep = fill(&store, &orders, 1);

        store.remove_all_exchanges(&batch);

        assert_eq!(listener.batches(), vec![ids(&batch)]);
        assert!(listener.removed().is_empty());
        assert_eq!(ids(&store.all_exchanges()), ids(&keep));
        assert_eq!(store.rule_keys(), vec![orders.key().clone()]);
    }

    #[test]
    fn batch_removal_of_unknown_exchanges_is_silent() {
        let (store, listener) = store_with_listener();
        store.remove_all_exchanges(&[Exchange::shared(rule("orders", 8080))]);
        assert!(listener.events().is_empty());
    }

    #[rstest]
    #[case(2, vec![3, 4])]
    #[case(10, vec![0, 1, 2, 3, 4])]
    #[case(5, vec![0, 1, 2, 3, 4])]
    #[case(0, vec![])]
    fn most_recent_returns_the_tail_oldest_first(
        #[case] count: usize,
        #[case] expected: Vec<usize>,
    ) {
        let store = MemoryExchangeStore::new();
        let exchanges = fill(&store, &rule("orders", 8080), 5);

        let recent = store.most_recent(count);

        let expected: Vec<_> = expected.into_iter().map(|i| exchanges[i].id()).collect();
        assert_eq!(ids(&recent), expected);
    }

    #[test]
    fn queries_on_an_empty_store_return_empty_sequences() {
        let store = MemoryExchangeStore::new();
        let key = RuleKey::any(ListenPort::try_new(1).unwrap());
        assert!(store.all_exchanges().is_empty());
        assert!(store.most_recent(3).is_empty());
        assert!(store.exchanges_for_rule(&key).is_empty());
        assert_eq!(store.count_for_rule(&key), 0);
    }

    #[test]
    fn snapshots_do_not_follow_later_changes() {
        let store = MemoryExchangeStore::new();
        let orders = rule("orders", 8080);
        let exchanges = fill(&store, &orders, 2);
        let snapshot = store.exchanges_for_rule(orders.key());

        store.remove(&exchanges[0]);
        fill(&store, &orders, 3);

        assert_eq!(ids(&snapshot), ids(&exchanges));
    }

    #[test]
    fn late_listener_only_sees_future_events() {
        let store = MemoryExchangeStore::new();
        let orders = rule("orders", 8080);
        fill(&store, &orders, 2);
        let listener = Arc::new(RecordingListener::default());
        store.subscribe(listener.clone());

        let later = fill(&store, &orders, 1);

        assert_eq!(listener.added(), ids(&later));
    }

    #[test]
    fn discarded_exchange_reaches_listeners_attached_on_add() {
        let (store, listener) = store_with_listener();
        let exchange = fill(&store, &rule("orders", 8080), 1).remove(0);

        exchange.discard();

        assert_eq!(listener.removed(), vec![exchange.id()]);
        // The pipeline discarded it; the store still holds its reference.
        assert!(store.contains(exchange.id()));
    }

    #[test]
    fn discard_after_store_removal_is_not_reported_again() {
        let (store, listener) = store_with_listener();
        let exchange = fill(&store, &rule("orders", 8080), 1).remove(0);

        store.remove(&exchange);
        exchange.discard();

        assert!(exchange.is_discarded());
        assert!(store.is_empty());
        assert_eq!(listener.removed(), vec![exchange.id()]);
    }

    #[test]
    fn store_removal_after_discard_is_not_reported_again() {
        let (store, listener) = store_with_listener();
        let exchange = fill(&store, &rule("orders", 8080), 1).remove(0);
        let viewer = Arc::new(CountingViewer::default());
        exchange.add_viewer(viewer.clone());

        exchange.discard();
        store.remove(&exchange);

        assert!(store.is_empty());
        assert_eq!(listener.removed(), vec![exchange.id()]);
        assert_eq!(viewer.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn bulk_removal_leaves_out_discarded_exchanges() {
        let (store, listener) = store_with_listener();
        let orders = rule("orders", 8080);
        let exchanges = fill(&store, &orders, 3);
        exchanges[0].discard();

        store.remove_all_exchanges_for_rule(&orders);
        for exchange in &exchanges {
            exchange.discard();
        }

        assert!(store.is_empty());
        assert_eq!(listener.removed(), vec![exchanges[0].id()]);
        assert_eq!(listener.batches(), vec![ids(&exchanges[1..])]);
    }

    #[test]
    fn batch_of_only_discarded_exchanges_is_silent() {
        let (store, listener) = store_with_listener();
        let exchanges = fill(&store, &rule("orders", 8080), 2);
        for exchange in &exchanges {
            exchange.discard();
        }

        store.remove_all_exchanges(&exchanges);

        assert!(store.is_empty());
        assert_eq!(listener.removed(), ids(&exchanges));
        assert!(listener.batches().is_empty());
    }

    #[test]
    fn evicted_exchange_discarded_later_is_not_reported_again() {
        let (store, listener) = store_with_listener();
        let exchanges = fill(&store, &rule("orders", 8080), 3);

        store.set_retention(RetentionPolicy::from_max_exchanges(1));
        exchanges[0].discard();

        assert_eq!(listener.batches(), vec![ids(&exchanges[..2])]);
        assert!(listener.removed().is_empty());
    }

    #[test]
    fn discarded_exchange_is_not_added() {
        let (store, listener) = store_with_listener();
        let exchange = Exchange::shared(rule("orders", 8080));
        exchange.discard();

        store.add(exchange);

        assert!(store.is_empty());
        assert!(listener.events().is_empty());
    }

    #[test]
    fn re_added_exchange_reports_its_next_removal() {
        let (store, listener) = store_with_listener();
        let exchange = fill(&store, &rule("orders", 8080), 1).remove(0);

        store.remove(&exchange);
        store.add(exchange.clone());
        store.remove(&exchange);

        assert_eq!(listener.removed(), vec![exchange.id(), exchange.id()]);
    }

    fn watch(exchanges: &[SharedExchange]) -> Vec<Arc<CountingViewer>> {
        exchanges
            .iter()
            .map(|exchange| {
                let viewer = Arc::new(CountingViewer::default());
                exchange.add_viewer(viewer.clone());
                viewer
            })
            .collect()
    }

    fn informed(viewers: &[Arc<CountingViewer>]) -> Vec<usize> {
        viewers
            .iter()
            .map(|viewer| viewer.0.load(Ordering::SeqCst))
            .collect()
    }

    #[test]
    fn clearing_a_rule_informs_exchange_viewers() {
        let store = MemoryExchangeStore::new();
        let orders = rule("orders", 8080);
        let viewers = watch(&fill(&store, &orders, 2));
        let untouched = watch(&fill(&store, &rule("users", 8081), 1));

        store.remove_all_exchanges_for_rule(&orders);

        assert_eq!(informed(&viewers), vec![1, 1]);
        assert_eq!(informed(&untouched), vec![0]);
    }

    #[test]
    fn batch_removal_informs_exchange_viewers() {
        let store = MemoryExchangeStore::new();
        let exchanges = fill(&store, &rule("orders", 8080), 3);
        let viewers = watch(&exchanges);

        store.remove_all_exchanges(&exchanges[..2]);

        assert_eq!(informed(&viewers), vec![1, 1, 0]);
    }

    #[test]
    fn retention_eviction_informs_exchange_viewers() {
        let limit = RetentionLimit::try_new(2).unwrap();
        let store = MemoryExchangeStore::with_retention(RetentionPolicy::MaxExchanges(limit));
        let orders = rule("orders", 8080);
        let viewers = watch(&fill(&store, &orders, 2));

        fill(&store, &orders, 1);

        assert_eq!(informed(&viewers), vec![1, 0]);
    }

    #[test]
    fn unsubscribed_listener_receives_nothing() {
        let (store, listener) = store_with_listener();
        let extra = Arc::new(RecordingListener::default());
        let id = store.subscribe(extra.clone());
        assert_eq!(store.listener_count(), 2);
        assert!(store.unsubscribe(id));

        fill(&store, &rule("orders", 8080), 1);

        assert!(extra.events().is_empty());
        assert_eq!(listener.added().len(), 1);
    }

    #[test]
    fn statistics_follow_the_rule_bucket() {
        let store = MemoryExchangeStore::new();
        let orders = rule("orders", 8080);
        let exchanges = fill(&store, &orders, 3);
        let timings = [(100, 100, 50), (300, 200, 10)];
        for (exchange, (returned, out, back)) in exchanges.iter().zip(timings) {
            exchange.set_request(MessageSummary::with_body_length(out));
            exchange.record_request_sent(Utc.timestamp_millis_opt(0).unwrap());
            exchange.set_response(MessageSummary::with_body_length(back));
            exchange.record_response_sent(Utc.timestamp_millis_opt(returned).unwrap());
            exchange.complete();
        }
        exchanges[2].fail();

        let stats = store.statistics_for_rule(orders.key()).unwrap();

        assert_eq!(stats.count_total, 3);
        assert_eq!(stats.error_count, 1);
        assert_eq!(stats.min_latency.map(|l| l.into_inner()), Some(100));
        assert_eq!(stats.max_latency.map(|l| l.into_inner()), Some(300));
        assert_eq!(stats.avg_latency.into_inner(), 200);
        assert_eq!(stats.bytes_sent, 300);
        assert_eq!(stats.bytes_received, 60);
    }

    #[test]
    fn statistics_for_unknown_rule_are_empty() {
        let store = MemoryExchangeStore::new();
        let stats = store
            .statistics_for_rule(&RuleKey::any(ListenPort::try_new(1).unwrap()))
            .unwrap();
        assert_eq!(stats, RuleStatistics::default());
    }

    #[test]
    fn retention_evicts_oldest_with_one_batch_notification() {
        let limit = RetentionLimit::try_new(3).unwrap();
        let store = MemoryExchangeStore::with_retention(RetentionPolicy::MaxExchanges(limit));
        let listener = Arc::new(RecordingListener::default());
        store.subscribe(listener.clone());
        let orders = rule("orders", 8080);
        let users = rule("users", 8081);

        let first = fill(&store, &users, 1);
        let rest = fill(&store, &orders, 3);

        assert_eq!(store.len(), 3);
        assert_eq!(ids(&store.all_exchanges()), ids(&rest));
        assert!(store.rule_keys().iter().all(|key| key == orders.key()));
        assert_eq!(listener.batches(), vec![ids(&first)]);
        assert!(matches!(
            listener.events().last(),
            Some(StoreEvent::BatchRemoved { .. })
        ));
    }

    #[test]
    fn tightening_retention_evicts_immediately() {
        let (store, listener) = store_with_listener();
        let orders = rule("orders", 8080);
        let exchanges = fill(&store, &orders, 5);

        store.set_retention(RetentionPolicy::from_max_exchanges(2));

        assert_eq!(store.retention(), RetentionPolicy::from_max_exchanges(2));
        assert_eq!(ids(&store.all_exchanges()), ids(&exchanges[3..]));
        assert_eq!(listener.batches(), vec![ids(&exchanges[..3])]);
    }

    #[test]
    fn loosening_retention_evicts_nothing() {
        let (store, listener) = store_with_listener();
        fill(&store, &rule("orders", 8080), 2);

        store.set_retention(RetentionPolicy::Unbounded);

        assert_eq!(store.len(), 2);
        assert!(listener.batches().is_empty());
    }
}
