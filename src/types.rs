use jiff::Timestamp;

use crate::formatting::format_wait_time;

/// Remote collection holding help tickets
pub const DEFAULT_COLLECTION: &str = "tickets";

/// Field the collection is ordered by
pub const DEFAULT_ORDER_BY: &str = "timeOpen";

pub const FIELD_NAMES: &str = "names";
pub const FIELD_LOCATION: &str = "location";
pub const FIELD_ISSUE: &str = "issue";
pub const FIELD_TIME_OPEN: &str = "timeOpen";

/// A help ticket as mirrored from the remote collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    /// Document identifier assigned by the store
    pub id: String,
    /// Names of the people asking for help
    pub names: String,
    /// Where they are
    pub location: String,
    /// What they need help with
    pub issue: String,
    /// When the ticket was opened (possibly a server estimate)
    pub time_open: Timestamp,
    /// Human-readable time since `time_open`, as of the last recomputation
    pub formatted_wait_time: String,
}

impl Ticket {
    /// Recompute the wait-time label against `now`. Touches nothing else.
    pub fn refresh_wait_time(&mut self, now: Timestamp) {
        self.formatted_wait_time = format_wait_time(self.time_open, now);
    }

    /// Copy of this ticket carrying edited fields, keeping id and open time.
    pub fn with_fields(&self, fields: NewTicket) -> Ticket {
        Ticket {
            names: fields.names,
            location: fields.location,
            issue: fields.issue,
            ..self.clone()
        }
    }
}

/// Fields a client supplies when opening a ticket
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTicket {
    pub names: String,
    pub location: String,
    pub issue: String,
}

impl NewTicket {
    pub fn new(
        names: impl Into<String>,
        location: impl Into<String>,
        issue: impl Into<String>,
    ) -> Self {
        Self {
            names: names.into(),
            location: location.into(),
            issue: issue.into(),
        }
    }
}
