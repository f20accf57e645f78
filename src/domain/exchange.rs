//! A single request/response cycle observed by the gateway
//!
//! Exchanges are owned by the proxy pipeline and shared with the store as
//! `Arc<Exchange>`. The pipeline keeps mutating status and timestamps while the
//! exchange is indexed; the store never does.

use crate::domain::rule::Rule;
use crate::store::listener::ExchangeStoreListener;
use chrono::{DateTime, Utc};
use nutype::nutype;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Exchanges are always handled through shared references
pub type SharedExchange = Arc<Exchange>;

/// Unique, time-ordered identifier of an exchange
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRef
))]
pub struct ExchangeId(Uuid);

impl ExchangeId {
    pub fn generate() -> Self {
        Self::new(Uuid::now_v7())
    }
}

impl Default for ExchangeId {
    fn default() -> Self {
        Self::generate()
    }
}

/// Round trip latency in whole milliseconds
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    From,
    AsRef
))]
pub struct LatencyMillis(i64);

impl LatencyMillis {
    pub fn zero() -> Self {
        Self::new(0)
    }
}

/// Lifecycle of an exchange inside the proxy pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeStatus {
    Active,
    Completed,
    Failed,
}

/// The part of an HTTP message the store cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSummary {
    pub body_length: u64,
}

impl MessageSummary {
    pub fn with_body_length(body_length: u64) -> Self {
        Self { body_length }
    }
}

/// Point-in-time copy of the mutable part of an exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeState {
    pub status: ExchangeStatus,
    pub request: Option<MessageSummary>,
    pub response: Option<MessageSummary>,
    pub request_sent_at: Option<DateTime<Utc>>,
    pub response_sent_at: Option<DateTime<Utc>>,
}

impl ExchangeState {
    fn new() -> Self {
        Self {
            status: ExchangeStatus::Active,
            request: None,
            response: None,
            request_sent_at: None,
            response_sent_at: None,
        }
    }

    /// Response sent minus request sent, once both are known
    pub fn round_trip_latency(&self) -> Option<LatencyMillis> {
        match (self.request_sent_at, self.response_sent_at) {
            (Some(sent), Some(returned)) => Some(LatencyMillis::new(
                returned.signed_duration_since(sent).num_milliseconds(),
            )),
            _ => None,
        }
    }
}

/// Observer of a single exchange, typically a detail view
pub trait ExchangeViewer: Send + Sync {
    /// The store no longer holds this exchange
    fn removed_from_store(&self, exchange: &Exchange);
}

pub struct Exchange {
    id: ExchangeId,
    rule: Arc<Rule>,
    created_at: DateTime<Utc>,
    state: RwLock<ExchangeState>,
    store_listeners: Mutex<Vec<Weak<dyn ExchangeStoreListener>>>,
    viewers: Mutex<Vec<Arc<dyn ExchangeViewer>>>,
    discarded: AtomicBool,
    removal_reported: AtomicBool,
}

impl Exchange {
    pub fn new(rule: Arc<Rule>) -> Self {
        Self {
            id: ExchangeId::generate(),
            rule,
            created_at: Utc::now(),
            state: RwLock::new(ExchangeState::new()),
            store_listeners: Mutex::new(Vec::new()),
            viewers: Mutex::new(Vec::new()),
            discarded: AtomicBool::new(false),
            removal_reported: AtomicBool::new(false),
        }
    }

    /// Shorthand for `Arc::new(Exchange::new(rule))`
    pub fn shared(rule: Arc<Rule>) -> SharedExchange {
        Arc::new(Self::new(rule))
    }

    pub fn id(&self) -> ExchangeId {
        self.id
    }

    pub fn rule(&self) -> &Arc<Rule> {
        &self.rule
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> ExchangeState {
        *self.state.read()
    }

    pub fn status(&self) -> ExchangeStatus {
        self.state.read().status
    }

    pub fn has_response(&self) -> bool {
        self.state.read().response.is_some()
    }

    pub fn round_trip_latency(&self) -> Option<LatencyMillis> {
        self.state.read().round_trip_latency()
    }

    pub fn set_request(&self, request: MessageSummary) {
        self.state.write().request = Some(request);
    }

    pub fn set_response(&self, response: MessageSummary) {
        self.state.write().response = Some(response);
    }

    pub fn record_request_sent(&self, at: DateTime<Utc>) {
        self.state.write().request_sent_at = Some(at);
    }

    pub fn record_response_sent(&self, at: DateTime<Utc>) {
        self.state.write().response_sent_at = Some(at);
    }

    pub fn complete(&self) {
        self.state.write().status = ExchangeStatus::Completed;
    }

    pub fn fail(&self) {
        self.state.write().status = ExchangeStatus::Failed;
    }

    /// Subscribe a store listener to this exchange's own removal channel
    pub fn attach_store_listener(&self, listener: Weak<dyn ExchangeStoreListener>) {
        let mut listeners = self.store_listeners.lock();
        if !listeners.iter().any(|known| Weak::ptr_eq(known, &listener)) {
            listeners.push(listener);
        }
    }

    pub fn add_viewer(&self, viewer: Arc<dyn ExchangeViewer>) {
        self.viewers.lock().push(viewer);
    }

    /// Tell every viewer this exchange left the store, then forget them
    pub fn inform_viewers_on_removal(&self) {
        let viewers = std::mem::take(&mut *self.viewers.lock());
        for viewer in viewers {
            viewer.removed_from_store(self);
        }
    }

    /// The store now holds this exchange; its next removal is reported again
    pub(crate) fn mark_stored(&self) {
        self.removal_reported.store(false, Ordering::Release);
    }

    /// The store dropped this exchange: forget the listeners attached on add
    ///
    /// Returns true when the store owns the removal event, false when a
    /// `discard` already reported it.
    pub fn detach_store_listeners(&self) -> bool {
        self.store_listeners.lock().clear();
        !self.removal_reported.swap(true, Ordering::AcqRel)
    }

    /// Drop this exchange outside of the store's own removal path
    ///
    /// Every store listener attached while the exchange was being added learns
    /// about it through `remove_exchange`. Only the first call notifies, and
    /// nothing is sent once the store has already reported the removal.
    pub fn discard(self: &Arc<Self>) {
        if self.discarded.swap(true, Ordering::AcqRel) {
            return;
        }
        if self.removal_reported.swap(true, Ordering::AcqRel) {
            self.store_listeners.lock().clear();
            return;
        }
        let listeners = std::mem::take(&mut *self.store_listeners.lock());
        for listener in listeners.iter().filter_map(Weak::upgrade) {
            listener.remove_exchange(self);
        }
    }

    pub fn is_discarded(&self) -> bool {
        self.discarded.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange")
            .field("id", &self.id)
            .field("rule", self.rule.key())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
