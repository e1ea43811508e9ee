pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod control;
pub mod display;
pub mod error;
pub mod formatting;
pub mod identity;
pub mod remote;
pub mod repl;
pub mod sync;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, ErrorRecovery, WriteFailurePolicy};
pub use control::{ActiveView, ControlState, ControlViewModel, TicketControl, ViewMode};
pub use error::{HelpQueueError, Result, WriteOp};
pub use formatting::format_wait_time;
pub use identity::{IdentitySource, LocalIdentity, Session};
pub use remote::{FeedEvent, FieldValue, InMemoryCollection, RemoteCollection, Snapshot};
pub use sync::{SyncConfig, SyncState, TicketSynchronizer};
pub use types::{NewTicket, Ticket};
