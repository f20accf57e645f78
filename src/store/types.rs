//! Type definitions for the exchange store

use crate::domain::exchange::{ExchangeId, LatencyMillis};
use nutype::nutype;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of exchanges kept before the oldest are evicted
#[nutype(
    derive(
        Clone,
        Copy,
        Debug,
        Display,
        PartialEq,
        Eq,
        Deserialize,
        Serialize,
        TryFrom,
        AsRef
    ),
    validate(predicate = |limit: &usize| *limit > 0),
)]
pub struct RetentionLimit(usize);

/// How many exchanges the store keeps
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Keep everything until it is removed explicitly
    #[default]
    Unbounded,
    /// Evict the oldest exchanges once the limit is exceeded
    MaxExchanges(RetentionLimit),
}

impl RetentionPolicy {
    /// `0` means unbounded, matching the `store.max_exchanges` setting
    pub fn from_max_exchanges(max_exchanges: usize) -> Self {
        RetentionLimit::try_new(max_exchanges)
            .map(Self::MaxExchanges)
            .unwrap_or(Self::Unbounded)
    }

    /// Number of exchanges to evict from a store holding `len`
    pub fn excess(&self, len: usize) -> usize {
        match self {
            Self::Unbounded => 0,
            Self::MaxExchanges(limit) => len.saturating_sub(*limit.as_ref()),
        }
    }
}

/// Part of a completed exchange that the pipeline failed to record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, derive_more::Display)]
pub enum MissingPart {
    #[display("request")]
    Request,
    #[display("response")]
    Response,
    #[display("request timestamp")]
    RequestTimestamp,
    #[display("response timestamp")]
    ResponseTimestamp,
}

/// Errors surfaced by the store
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// A completed exchange is missing data the pipeline must have recorded
    #[error("Exchange {id} is completed but has no {missing}")]
    IncompleteExchange { id: ExchangeId, missing: MissingPart },
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Latency and throughput summary of one rule's exchanges
///
/// Latency and byte totals only cover completed exchanges. When nothing has
/// completed yet `min_latency` and `max_latency` are `None` and `avg_latency`
/// is zero, which carries no information.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RuleStatistics {
    /// Every exchange indexed under the rule, whatever its status
    pub count_total: usize,
    pub completed_count: usize,
    /// Exchanges in failed status
    pub error_count: usize,
    pub min_latency: Option<LatencyMillis>,
    pub max_latency: Option<LatencyMillis>,
    pub avg_latency: LatencyMillis,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

impl Default for RuleStatistics {
    fn default() -> Self {
        Self {
            count_total: 0,
            completed_count: 0,
            error_count: 0,
            min_latency: None,
            max_latency: None,
            avg_latency: LatencyMillis::zero(),
            bytes_sent: 0,
            bytes_received: 0,
        }
    }
}
