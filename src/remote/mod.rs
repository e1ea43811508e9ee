//! Remote document collection client.
//!
//! This module defines the contract the ticket synchronizer relies on: a
//! document collection that can be subscribed to as a live change feed and
//! written through create/update/delete. Any hosted store can sit behind it;
//! [`memory::InMemoryCollection`] is the in-process implementation.

pub mod memory;

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::stream::BoxStream;
use jiff::Timestamp;

use crate::error::Result;

pub use memory::InMemoryCollection;

/// Value of a single document field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    /// Committed point in time
    Time(Timestamp),
    /// Server timestamp whose commit is still in flight; carries the store's estimate
    EstimatedTime(Timestamp),
    /// Write-side sentinel asking the store to fill in its own commit time
    ServerTimestamp,
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Resolve a time field, accepting server estimates.
    pub fn as_time(&self) -> Option<Timestamp> {
        match self {
            FieldValue::Time(t) | FieldValue::EstimatedTime(t) => Some(*t),
            _ => None,
        }
    }

    pub fn is_estimated(&self) -> bool {
        matches!(self, FieldValue::EstimatedTime(_))
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Timestamp> for FieldValue {
    fn from(t: Timestamp) -> Self {
        FieldValue::Time(t)
    }
}

/// Field map of one document
pub type DocumentFields = BTreeMap<String, FieldValue>;

/// A document as seen in a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotDocument {
    pub id: String,
    pub fields: DocumentFields,
}

impl SnapshotDocument {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Whether any field still carries a server estimate
    pub fn has_pending_writes(&self) -> bool {
        self.fields.values().any(FieldValue::is_estimated)
    }
}

/// Full, ordered contents of a collection at one moment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub documents: Vec<SnapshotDocument>,
}

/// One notification from a live subscription
#[derive(Debug, Clone)]
pub enum FeedEvent {
    Snapshot(Arc<Snapshot>),
    /// The feed failed to attach or dropped
    Error(String),
}

/// Live change feed. Dropping the stream releases the subscription.
pub type FeedStream = BoxStream<'static, FeedEvent>;

/// Subscription-capable document collection
#[async_trait::async_trait]
pub trait RemoteCollection: Send + Sync {
    /// Open a live feed over `collection`, ordered ascending by `order_by`.
    ///
    /// The first event is the current contents; every later change delivers
    /// the complete collection again. Attach failures arrive as
    /// [`FeedEvent::Error`].
    fn subscribe(&self, collection: &str, order_by: &str) -> FeedStream;

    /// Add a document; the store assigns and returns its identifier.
    async fn create(&self, collection: &str, fields: DocumentFields) -> Result<String>;

    /// Replace every field of an existing document.
    async fn update(&self, collection: &str, id: &str, fields: DocumentFields) -> Result<()>;

    /// Remove a document.
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;
}
