//! In-process document collection with a live change feed.
//!
//! Behaves like a hosted store from the client's point of view: identifiers
//! are assigned by the store, `ServerTimestamp` fields are first published as
//! estimates and then committed, every change republishes the full collection,
//! and documents missing the ordering field are left out of ordered feeds.
//!
//! Failure injection (`set_write_failure`, `set_subscribe_failure`,
//! `report_feed_error`, `disconnect`) lets callers exercise error paths.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::{HelpQueueError, Result, WriteOp};

use super::{
    DocumentFields, FeedEvent, FeedStream, FieldValue, RemoteCollection, Snapshot,
    SnapshotDocument,
};

/// Capacity of each collection's change broadcast. Every message carries the
/// full collection, so a lagging subscriber only needs the newest one.
const FEED_CAPACITY: usize = 64;

/// Message fanned out to every subscriber of a collection
#[derive(Debug, Clone)]
enum Signal {
    Changed(Arc<Vec<SnapshotDocument>>),
    /// Non-fatal feed error; the subscription stays open
    Error(String),
    /// Fatal feed error; the subscription ends after reporting it
    Dropped(String),
}

struct CollectionState {
    /// Documents in insertion order
    documents: Vec<SnapshotDocument>,
    feed: broadcast::Sender<Signal>,
}

impl CollectionState {
    fn new() -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            documents: Vec::new(),
            feed,
        }
    }

    fn publish(&self) {
        // No receivers is fine: nobody is listening yet.
        let _ = self
            .feed
            .send(Signal::Changed(Arc::new(self.documents.clone())));
    }
}

#[derive(Default)]
struct StoreInner {
    collections: HashMap<String, CollectionState>,
    write_failure: Option<String>,
    subscribe_failure: Option<String>,
}

impl StoreInner {
    fn collection(&mut self, name: &str) -> &mut CollectionState {
        self.collections
            .entry(name.to_string())
            .or_insert_with(CollectionState::new)
    }

    fn check_write(&self, op: WriteOp) -> Result<()> {
        match &self.write_failure {
            Some(message) => Err(HelpQueueError::write(op, message.clone())),
            None => Ok(()),
        }
    }
}

/// Document collection held in memory
pub struct InMemoryCollection {
    inner: Mutex<StoreInner>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryCollection {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl InMemoryCollection {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
            clock,
        }
    }

    /// Reject every subsequent write with `message`, or accept writes again with `None`.
    pub fn set_write_failure(&self, message: Option<&str>) {
        self.inner.lock().write_failure = message.map(str::to_string);
    }

    /// Refuse every subsequent subscription with `message`, or accept them again with `None`.
    pub fn set_subscribe_failure(&self, message: Option<&str>) {
        self.inner.lock().subscribe_failure = message.map(str::to_string);
    }

    /// Deliver an error to current subscribers without closing their feeds.
    pub fn report_feed_error(&self, collection: &str, message: &str) {
        let mut inner = self.inner.lock();
        let _ = inner
            .collection(collection)
            .feed
            .send(Signal::Error(message.to_string()));
    }

    /// Drop every current subscription, reporting `message` to each.
    pub fn disconnect(&self, collection: &str, message: &str) {
        let mut inner = self.inner.lock();
        let _ = inner
            .collection(collection)
            .feed
            .send(Signal::Dropped(message.to_string()));
    }

    /// Re-send the unchanged contents to current subscribers.
    pub fn republish(&self, collection: &str) {
        self.inner.lock().collection(collection).publish();
    }

    /// Current documents in insertion order
    pub fn documents(&self, collection: &str) -> Vec<SnapshotDocument> {
        self.inner
            .lock()
            .collections
            .get(collection)
            .map(|c| c.documents.clone())
            .unwrap_or_default()
    }

    /// Number of live subscriptions on `collection`
    pub fn subscriber_count(&self, collection: &str) -> usize {
        self.inner
            .lock()
            .collections
            .get(collection)
            .map(|c| c.feed.receiver_count())
            .unwrap_or(0)
    }

    /// Replace `ServerTimestamp` sentinels with the store's estimate.
    /// Returns whether anything is left to commit.
    fn stage(&self, mut fields: DocumentFields) -> (DocumentFields, bool) {
        let now = self.clock.now();
        let mut pending = false;
        for value in fields.values_mut() {
            if *value == FieldValue::ServerTimestamp {
                *value = FieldValue::EstimatedTime(now);
                pending = true;
            }
        }
        (fields, pending)
    }

    /// Turn the estimates of document `id` into committed times.
    fn commit(&self, collection: &str, id: &str) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        let state = inner.collection(collection);
        let Some(doc) = state.documents.iter_mut().find(|d| d.id == id) else {
            // Deleted before the commit landed
            return;
        };
        for value in doc.fields.values_mut() {
            if value.is_estimated() {
                *value = FieldValue::Time(now);
            }
        }
        state.publish();
    }
}

/// Order documents ascending by `order_by`, leaving out documents that lack it.
fn ordered_snapshot(documents: &[SnapshotDocument], order_by: &str) -> Snapshot {
    let mut documents: Vec<SnapshotDocument> = documents
        .iter()
        .filter(|d| {
            d.get(order_by)
                .is_some_and(|v| v.as_time().is_some() || v.as_text().is_some())
        })
        .cloned()
        .collect();
    documents.sort_by(|a, b| compare_field(a.get(order_by), b.get(order_by)));
    Snapshot { documents }
}

fn compare_field(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    let (Some(a), Some(b)) = (a, b) else {
        return Ordering::Equal;
    };
    match (a.as_time(), b.as_time()) {
        (Some(x), Some(y)) => x.cmp(&y),
        // Times sort before text
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.as_text().cmp(&b.as_text()),
    }
}

enum FeedCursor {
    Initial(FeedEvent, broadcast::Receiver<Signal>),
    Live(broadcast::Receiver<Signal>),
    Done,
}

#[async_trait::async_trait]
impl RemoteCollection for InMemoryCollection {
    fn subscribe(&self, collection: &str, order_by: &str) -> FeedStream {
        let mut inner = self.inner.lock();
        if let Some(message) = inner.subscribe_failure.clone() {
            warn!("Refusing subscription to '{collection}': {message}");
            return stream::iter([FeedEvent::Error(message)]).boxed();
        }

        let state = inner.collection(collection);
        let rx = state.feed.subscribe();
        let initial = FeedEvent::Snapshot(Arc::new(ordered_snapshot(&state.documents, order_by)));
        debug!("New subscription to '{collection}' ordered by '{order_by}'");

        let order_by = order_by.to_string();
        stream::unfold(FeedCursor::Initial(initial, rx), move |cursor| {
            let order_by = order_by.clone();
            async move {
                match cursor {
                    FeedCursor::Initial(event, rx) => Some((event, FeedCursor::Live(rx))),
                    FeedCursor::Live(mut rx) => loop {
                        match rx.recv().await {
                            Ok(Signal::Changed(documents)) => {
                                let snapshot = ordered_snapshot(&documents, &order_by);
                                return Some((
                                    FeedEvent::Snapshot(Arc::new(snapshot)),
                                    FeedCursor::Live(rx),
                                ));
                            }
                            Ok(Signal::Error(message)) => {
                                return Some((FeedEvent::Error(message), FeedCursor::Live(rx)));
                            }
                            Ok(Signal::Dropped(message)) => {
                                return Some((FeedEvent::Error(message), FeedCursor::Done));
                            }
                            Err(RecvError::Lagged(skipped)) => {
                                // Later messages still carry the full collection
                                debug!("Feed subscriber lagged by {skipped} messages");
                            }
                            Err(RecvError::Closed) => return None,
                        }
                    },
                    FeedCursor::Done => None,
                }
            }
        })
        .boxed()
    }

    async fn create(&self, collection: &str, fields: DocumentFields) -> Result<String> {
        let id = Uuid::new_v4().simple().to_string();
        let pending = {
            let mut inner = self.inner.lock();
            inner.check_write(WriteOp::Create)?;
            let (fields, pending) = self.stage(fields);
            let state = inner.collection(collection);
            state.documents.push(SnapshotDocument {
                id: id.clone(),
                fields,
            });
            state.publish();
            pending
        };

        if pending {
            // Let subscribers observe the estimate before the commit lands
            tokio::task::yield_now().await;
            self.commit(collection, &id);
        }

        debug!("Created document '{id}' in '{collection}'");
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: DocumentFields) -> Result<()> {
        let pending = {
            let mut inner = self.inner.lock();
            inner.check_write(WriteOp::Update)?;
            let (fields, pending) = self.stage(fields);
            let state = inner.collection(collection);
            let doc = state
                .documents
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| HelpQueueError::TicketNotFound(id.to_string()))?;
            doc.fields = fields;
            state.publish();
            pending
        };

        if pending {
            tokio::task::yield_now().await;
            self.commit(collection, id);
        }

        debug!("Updated document '{id}' in '{collection}'");
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.check_write(WriteOp::Delete)?;
        let state = inner.collection(collection);
        let before = state.documents.len();
        state.documents.retain(|d| d.id != id);
        if state.documents.len() != before {
            state.publish();
            debug!("Deleted document '{id}' from '{collection}'");
        }
        Ok(())
    }
}
