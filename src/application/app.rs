use crate::config::Settings;
use crate::infrastructure::log_messages::application as messages;
use crate::store::{
    ChannelListener, ExchangeStore, MemoryExchangeStore, StoreEvent, TracingListener,
};
use crate::Result;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

/// Number of store events seen by the event consumer, by kind
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventTally {
    pub added: u64,
    pub removed: u64,
    pub rules_cleared: u64,
    pub batches_removed: u64,
}

impl EventTally {
    fn record(&mut self, event: &StoreEvent) {
        match event {
            StoreEvent::Added { .. } => self.added += 1,
            StoreEvent::Removed { .. } => self.removed += 1,
            StoreEvent::RuleCleared { .. } => self.rules_cleared += 1,
            StoreEvent::BatchRemoved { .. } => self.batches_removed += 1,
        }
    }
}

/// Drain store events off the proxy threads until every sender is gone
pub fn spawn_event_consumer(
    mut receiver: mpsc::UnboundedReceiver<StoreEvent>,
) -> JoinHandle<EventTally> {
    tokio::spawn(async move {
        let mut tally = EventTally::default();
        while let Some(event) = receiver.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => debug!(event = %json, "{}", messages::STORE_EVENT),
                Err(e) => debug!(error = %e, "{}", messages::STORE_EVENT),
            }
            tally.record(&event);
        }
        tally
    })
}

/// Main application struct that coordinates all components
pub struct Application {
    settings: Settings,
    store: Arc<MemoryExchangeStore>,
}

impl Application {
    pub fn new(settings: Settings) -> Self {
        let store = Arc::new(MemoryExchangeStore::with_retention(
            settings.store.retention(),
        ));
        Self { settings, store }
    }

    /// Serve until Ctrl-C, logging every store change
    #[instrument(skip(self))]
    pub async fn run(self) -> Result<()> {
        info!(
            environment = %self.settings.application.environment,
            retention = ?self.store.retention(),
            "{}",
            messages::STARTING
        );

        let tracing_listener = self.store.subscribe(Arc::new(TracingListener));
        let (channel_listener, receiver) = ChannelListener::new();
        let channel_listener = self.store.subscribe(Arc::new(channel_listener));
        let consumer = spawn_event_consumer(receiver);
        info!("{}", messages::STARTED_SUCCESSFULLY);

        tokio::signal::ctrl_c().await?;
        info!("{}", messages::SHUTTING_DOWN);

        self.store.unsubscribe(channel_listener);
        self.store.unsubscribe(tracing_listener);
        match consumer.await {
            Ok(tally) => info!(?tally, "{}", messages::EVENT_CONSUMER_STOPPED),
            Err(e) => debug!(error = %e, "{}", messages::EVENT_CONSUMER_STOPPED),
        }

        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<MemoryExchangeStore> {
        &self.store
    }
}
