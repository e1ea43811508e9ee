//! Ticket synchronizer.
//!
//! Mirrors the remote ticket collection into a local ordered list and keeps
//! each ticket's wait-time label fresh. A single background task owns the
//! list: it applies feed snapshots (whole-list replace) and periodic wait-time
//! refreshes, so a refresh always works on the most recently committed list.
//! Readers observe the list through a `watch` channel.
//!
//! Writes (create/update/delete) go straight to the remote collection and are
//! never applied locally; the change feed echoes them back.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use jiff::Timestamp;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::{Config, ErrorRecovery};
use crate::error::Result;
use crate::formatting::format_wait_time;
use crate::remote::{DocumentFields, FeedEvent, FeedStream, FieldValue, RemoteCollection, Snapshot};
use crate::types::{
    DEFAULT_COLLECTION, DEFAULT_ORDER_BY, FIELD_ISSUE, FIELD_LOCATION, FIELD_NAMES,
    FIELD_TIME_OPEN, NewTicket, Ticket,
};

/// Error recorded when the feed ends without reporting why
pub const FEED_CLOSED: &str = "subscription closed";

/// Settings for one synchronizer
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub collection: String,
    pub order_by: String,
    pub refresh_interval: Duration,
    pub error_recovery: ErrorRecovery,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            order_by: DEFAULT_ORDER_BY.to_string(),
            refresh_interval: Duration::from_secs(60),
            error_recovery: ErrorRecovery::default(),
        }
    }
}

impl From<&Config> for SyncConfig {
    fn from(config: &Config) -> Self {
        Self {
            collection: config.collection.clone(),
            order_by: config.order_by.clone(),
            refresh_interval: config.refresh_interval(),
            error_recovery: config.error_recovery,
        }
    }
}

/// Published state of the local mirror
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    /// Tickets in server order
    pub tickets: Vec<Ticket>,
    /// Subscription error message, if the feed failed
    pub error: Option<String>,
    /// Bumped on every published change
    pub revision: u64,
}

/// Build the local ticket list from a snapshot, preserving its order.
pub fn materialize_tickets(snapshot: &Snapshot, now: Timestamp) -> Vec<Ticket> {
    snapshot
        .documents
        .iter()
        .map(|doc| {
            let text = |field: &str| {
                doc.get(field)
                    .and_then(FieldValue::as_text)
                    .unwrap_or_default()
                    .to_string()
            };
            let time_open = match doc.get(FIELD_TIME_OPEN).and_then(FieldValue::as_time) {
                Some(t) => t,
                None => {
                    warn!("Ticket '{}' has no usable {FIELD_TIME_OPEN}; using now", doc.id);
                    now
                }
            };
            Ticket {
                id: doc.id.clone(),
                names: text(FIELD_NAMES),
                location: text(FIELD_LOCATION),
                issue: text(FIELD_ISSUE),
                time_open,
                formatted_wait_time: format_wait_time(time_open, now),
            }
        })
        .collect()
}

/// Recompute every wait-time label against `now`.
pub fn refresh_wait_times(tickets: &mut [Ticket], now: Timestamp) {
    for ticket in tickets {
        ticket.refresh_wait_time(now);
    }
}

fn new_ticket_fields(ticket: NewTicket) -> DocumentFields {
    let mut fields = DocumentFields::new();
    fields.insert(FIELD_NAMES.to_string(), ticket.names.into());
    fields.insert(FIELD_LOCATION.to_string(), ticket.location.into());
    fields.insert(FIELD_ISSUE.to_string(), ticket.issue.into());
    fields.insert(FIELD_TIME_OPEN.to_string(), FieldValue::ServerTimestamp);
    fields
}

/// Every persisted field of `ticket`. The wait-time label is never written.
fn full_ticket_fields(ticket: &Ticket) -> DocumentFields {
    let mut fields = DocumentFields::new();
    fields.insert(FIELD_NAMES.to_string(), ticket.names.clone().into());
    fields.insert(FIELD_LOCATION.to_string(), ticket.location.clone().into());
    fields.insert(FIELD_ISSUE.to_string(), ticket.issue.clone().into());
    fields.insert(FIELD_TIME_OPEN.to_string(), FieldValue::Time(ticket.time_open));
    fields
}

/// Live mirror of the remote ticket collection
pub struct TicketSynchronizer {
    client: Arc<dyn RemoteCollection>,
    config: SyncConfig,
    state_rx: watch::Receiver<SyncState>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl TicketSynchronizer {
    /// Subscribe to the collection and start the sync task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn activate(
        client: Arc<dyn RemoteCollection>,
        clock: Arc<dyn Clock>,
        config: SyncConfig,
    ) -> Self {
        let feed = client.subscribe(&config.collection, &config.order_by);
        let (state_tx, state_rx) = watch::channel(SyncState::default());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let sync_loop = SyncLoop {
            feed,
            state_tx,
            clock,
            refresh_interval: config.refresh_interval,
            error_recovery: config.error_recovery,
        };
        let task = tokio::spawn(sync_loop.run(shutdown_rx));

        info!(
            "Ticket sync active on '{}' ordered by '{}'",
            config.collection, config.order_by
        );

        Self {
            client,
            config,
            state_rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    /// A receiver that is notified on every published change
    pub fn watch(&self) -> watch::Receiver<SyncState> {
        self.state_rx.clone()
    }

    /// The latest published state
    pub fn state(&self) -> SyncState {
        self.state_rx.borrow().clone()
    }

    pub fn tickets(&self) -> Vec<Ticket> {
        self.state_rx.borrow().tickets.clone()
    }

    pub fn is_active(&self) -> bool {
        self.task.is_some()
    }

    /// Open a new ticket. The local list only changes when the feed echoes it.
    pub async fn create(&self, ticket: NewTicket) -> Result<String> {
        let id = self
            .client
            .create(&self.config.collection, new_ticket_fields(ticket))
            .await?;
        debug!("Submitted new ticket '{id}'");
        Ok(id)
    }

    /// Replace every persisted field of `ticket`.
    pub async fn update(&self, ticket: &Ticket) -> Result<()> {
        self.client
            .update(
                &self.config.collection,
                &ticket.id,
                full_ticket_fields(ticket),
            )
            .await?;
        debug!("Submitted update for ticket '{}'", ticket.id);
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete(&self.config.collection, id).await?;
        debug!("Submitted delete for ticket '{id}'");
        Ok(())
    }

    /// Stop the sync task and release the subscription.
    ///
    /// Once this returns no further state is published. Calling it again is a no-op.
    pub async fn deactivate(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
            && !e.is_cancelled()
        {
            warn!("Ticket sync task ended abnormally: {e}");
        }
        info!("Ticket sync on '{}' released", self.config.collection);
    }
}

impl Drop for TicketSynchronizer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// State owned by the background sync task
struct SyncLoop {
    feed: FeedStream,
    state_tx: watch::Sender<SyncState>,
    clock: Arc<dyn Clock>,
    refresh_interval: Duration,
    error_recovery: ErrorRecovery,
}

impl SyncLoop {
    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        let mut tickets: Vec<Ticket> = Vec::new();
        let mut feed_open = true;
        // Whether the current error came in after the last snapshot
        let mut error_pending = false;
        let mut refresh =
            tokio::time::interval_at(Instant::now() + self.refresh_interval, self.refresh_interval);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                // Fires on an explicit shutdown and when the synchronizer is dropped
                _ = &mut shutdown => break,

                event = self.feed.next(), if feed_open => match event {
                    Some(FeedEvent::Snapshot(snapshot)) => {
                        tickets = materialize_tickets(&snapshot, self.clock.now());
                        refresh.reset();
                        error_pending = false;
                        debug!("Applied snapshot with {} tickets", tickets.len());
                        let clear_error = self.error_recovery == ErrorRecovery::ClearOnSnapshot;
                        self.publish(|state| {
                            state.tickets = tickets.clone();
                            if clear_error {
                                state.error = None;
                            }
                        });
                    }
                    Some(FeedEvent::Error(message)) => {
                        warn!("Ticket feed error: {message}");
                        error_pending = true;
                        self.publish(|state| state.error = Some(message));
                    }
                    None => {
                        feed_open = false;
                        if error_pending {
                            debug!("Ticket feed closed after reporting an error");
                        } else {
                            warn!("Ticket feed closed without an error");
                            self.publish(|state| state.error = Some(FEED_CLOSED.to_string()));
                        }
                    }
                },

                _ = refresh.tick() => {
                    if tickets.is_empty() {
                        continue;
                    }
                    refresh_wait_times(&mut tickets, self.clock.now());
                    self.publish(|state| state.tickets = tickets.clone());
                }
            }
        }
    }

    fn publish(&self, apply: impl FnOnce(&mut SyncState)) {
        self.state_tx.send_modify(|state| {
            apply(state);
            state.revision += 1;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::SnapshotDocument;

    fn at(sec: i64) -> Timestamp {
        Timestamp::from_second(sec).unwrap()
    }

    fn doc(id: &str, names: &str, time: FieldValue) -> SnapshotDocument {
        let mut fields = DocumentFields::new();
        fields.insert(FIELD_NAMES.to_string(), names.into());
        fields.insert(FIELD_LOCATION.to_string(), "Rm 4".into());
        fields.insert(FIELD_ISSUE.to_string(), "projector".into());
        fields.insert(FIELD_TIME_OPEN.to_string(), time);
        SnapshotDocument {
            id: id.to_string(),
            fields,
        }
    }

    #[test]
    fn test_materialize_reads_fields_and_ids() {
        let snapshot = Snapshot {
            documents: vec![
                doc("a", "Amy", FieldValue::Time(at(0))),
                doc("b", "Bo", FieldValue::Time(at(600))),
            ],
        };
        let tickets = materialize_tickets(&snapshot, at(1800));

        assert_eq!(tickets.len(), 2);
        assert_eq!(tickets[0].id, "a");
        assert_eq!(tickets[0].names, "Amy");
        assert_eq!(tickets[0].location, "Rm 4");
        assert_eq!(tickets[0].issue, "projector");
        assert_eq!(tickets[0].formatted_wait_time, "30 minutes");
        assert_eq!(tickets[1].id, "b");
        assert_eq!(tickets[1].formatted_wait_time, "20 minutes");
    }

    #[test]
    fn test_materialize_accepts_estimated_time() {
        let snapshot = Snapshot {
            documents: vec![doc("a", "Amy", FieldValue::EstimatedTime(at(100)))],
        };
        let tickets = materialize_tickets(&snapshot, at(100));
        assert_eq!(tickets[0].time_open, at(100));
        assert_eq!(tickets[0].formatted_wait_time, "less than a minute");
    }

    #[test]
    fn test_materialize_tolerates_missing_fields() {
        let snapshot = Snapshot {
            documents: vec![SnapshotDocument {
                id: "bare".to_string(),
                fields: DocumentFields::new(),
            }],
        };
        let tickets = materialize_tickets(&snapshot, at(500));
        assert_eq!(tickets[0].names, "");
        assert_eq!(tickets[0].time_open, at(500));
    }

    #[test]
    fn test_refresh_only_touches_wait_time() {
        let snapshot = Snapshot {
            documents: vec![doc("a", "Amy", FieldValue::Time(at(0)))],
        };
        let mut tickets = materialize_tickets(&snapshot, at(0));
        let before = tickets.clone();

        refresh_wait_times(&mut tickets, at(61 * 60));

        assert_eq!(tickets[0].formatted_wait_time, "about 1 hour");
        let restored = Ticket {
            formatted_wait_time: before[0].formatted_wait_time.clone(),
            ..tickets[0].clone()
        };
        assert_eq!(restored, before[0]);
    }

    #[test]
    fn test_update_fields_are_full_document_without_label() {
        let ticket = Ticket {
            id: "a".to_string(),
            names: "Amy".to_string(),
            location: "Rm 4".to_string(),
            issue: "projector".to_string(),
            time_open: at(10),
            formatted_wait_time: "1 minute".to_string(),
        };
        let fields = full_ticket_fields(&ticket);
        assert_eq!(fields.len(), 4);
        assert_eq!(fields.get(FIELD_TIME_OPEN), Some(&FieldValue::Time(at(10))));
        assert!(!fields.contains_key("formattedWaitTime"));
    }

    #[test]
    fn test_new_ticket_fields_request_server_timestamp() {
        let fields = new_ticket_fields(NewTicket::new("Amy", "Rm 4", "projector"));
        assert_eq!(
            fields.get(FIELD_TIME_OPEN),
            Some(&FieldValue::ServerTimestamp)
        );
        assert_eq!(fields.get(FIELD_NAMES), Some(&FieldValue::from("Amy")));
    }
}
