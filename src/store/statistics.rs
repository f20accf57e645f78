//! Per-rule latency and throughput aggregation

use crate::domain::exchange::{ExchangeStatus, LatencyMillis, SharedExchange};
use crate::infrastructure::log_messages::statistics as messages;
use crate::store::types::{MissingPart, RuleStatistics, StoreError, StoreResult};
use tracing::error;

/// Summarise a snapshot of one rule's bucket in a single pass
///
/// Each exchange's state is read once, so an exchange the pipeline completes
/// halfway through the scan is counted consistently. A completed exchange
/// without its request, response or timestamps is a pipeline defect and
/// aborts the aggregation.
pub fn aggregate(exchanges: &[SharedExchange]) -> StoreResult<RuleStatistics> {
    let mut statistics = RuleStatistics {
        count_total: exchanges.len(),
        ..RuleStatistics::default()
    };
    let mut latency_sum: i64 = 0;

    for exchange in exchanges {
        let state = exchange.state();
        match state.status {
            ExchangeStatus::Active => continue,
            ExchangeStatus::Failed => {
                statistics.error_count += 1;
                continue;
            }
            ExchangeStatus::Completed => {}
        }

        let incomplete = |missing: MissingPart| {
            error!(exchange = %exchange.id(), %missing, "{}", messages::INCOMPLETE_EXCHANGE);
            StoreError::IncompleteExchange {
                id: exchange.id(),
                missing,
            }
        };
        let request = state.request.ok_or_else(|| incomplete(MissingPart::Request))?;
        let response = state.response.ok_or_else(|| incomplete(MissingPart::Response))?;
        if state.request_sent_at.is_none() {
            return Err(incomplete(MissingPart::RequestTimestamp));
        }
        let latency = state
            .round_trip_latency()
            .ok_or_else(|| incomplete(MissingPart::ResponseTimestamp))?;

        statistics.completed_count += 1;
        latency_sum += latency.into_inner();
        statistics.min_latency =
            Some(statistics.min_latency.map_or(latency, |min| min.min(latency)));
        statistics.max_latency =
            Some(statistics.max_latency.map_or(latency, |max| max.max(latency)));
        statistics.bytes_sent += request.body_length;
        statistics.bytes_received += response.body_length;
    }

    // Divisor floored at one: with nothing completed the average is zero.
    let divisor = statistics.completed_count.max(1) as i64;
    statistics.avg_latency = LatencyMillis::new(latency_sum / divisor);
    Ok(statistics)
}
