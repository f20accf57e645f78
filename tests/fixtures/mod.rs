//! Shared builders for store integration tests

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use exchange_store::domain::{
    Exchange, ExchangeId, ListenPort, MessageSummary, Rule, RuleKey, RuleName, SharedExchange,
};
use exchange_store::store::{ExchangeStoreListener, StoreEvent};
use parking_lot::Mutex;
use std::sync::Arc;

pub fn rule(name: &str, port: u16) -> Arc<Rule> {
    Arc::new(Rule::new(
        RuleName::try_new(name.to_string()).expect("valid rule name"),
        RuleKey::new(
            format!("{name}.example.com"),
            "*",
            None,
            ListenPort::try_new(port).expect("non-zero port"),
        ),
    ))
}

/// Exchange that completed with the given timings (millis) and body sizes
pub fn completed(
    rule: &Arc<Rule>,
    sent: i64,
    returned: i64,
    out: u64,
    back: u64,
) -> SharedExchange {
    let exchange = Exchange::shared(rule.clone());
    exchange.set_request(MessageSummary::with_body_length(out));
    exchange.record_request_sent(Utc.timestamp_millis_opt(sent).unwrap());
    exchange.set_response(MessageSummary::with_body_length(back));
    exchange.record_response_sent(Utc.timestamp_millis_opt(returned).unwrap());
    exchange.complete();
    exchange
}

pub fn ids(exchanges: &[SharedExchange]) -> Vec<ExchangeId> {
    exchanges.iter().map(|exchange| exchange.id()).collect()
}

/// Listener that keeps every event it receives
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<StoreEvent>>,
}

impl EventLog {
    pub fn events(&self) -> Vec<StoreEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }
}

impl ExchangeStoreListener for EventLog {
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
