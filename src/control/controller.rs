//! The ticket control: wires user intents to the synchronizer and the
//! control reducer.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::clock::Clock;
use crate::config::{Config, WriteFailurePolicy};
use crate::error::{HelpQueueError, Result};
use crate::identity::IdentitySource;
use crate::remote::RemoteCollection;
use crate::sync::{SyncConfig, TicketSynchronizer};
use crate::types::{NewTicket, Ticket};

use super::model::{
    ControlAction, ControlState, ControlViewModel, compute_control_view_model,
    reduce_control_state,
};

/// Page controller for the ticket queue.
///
/// Owns the synchronizer for its whole active lifetime. Every render reads
/// the latest synchronized list and the current session afresh.
pub struct TicketControl {
    sync: TicketSynchronizer,
    identity: Arc<dyn IdentitySource>,
    state: ControlState,
    write_failure: WriteFailurePolicy,
}

impl TicketControl {
    /// Start synchronizing and build a controller from configuration.
    ///
    /// Must be called from within a tokio runtime.
    pub fn activate(
        client: Arc<dyn RemoteCollection>,
        identity: Arc<dyn IdentitySource>,
        clock: Arc<dyn Clock>,
        config: &Config,
    ) -> Self {
        let sync = TicketSynchronizer::activate(client, clock, SyncConfig::from(config));
        Self::with_synchronizer(sync, identity, config.write_failure)
    }

    pub fn with_synchronizer(
        sync: TicketSynchronizer,
        identity: Arc<dyn IdentitySource>,
        write_failure: WriteFailurePolicy,
    ) -> Self {
        Self {
            sync,
            identity,
            state: ControlState::default(),
            write_failure,
        }
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn synchronizer(&self) -> &TicketSynchronizer {
        &self.sync
    }

    /// Compute what the page shows right now
    pub fn render(&self) -> ControlViewModel {
        let session = self.identity.current_session();
        let sync = self.sync.state();
        compute_control_view_model(&self.state, &sync, session.as_ref())
    }

    fn dispatch(&mut self, action: ControlAction) {
        debug!("Control action: {action:?}");
        let tickets = self.sync.tickets();
        let state = std::mem::take(&mut self.state);
        self.state = reduce_control_state(state, action, &tickets);
    }

    /// The action button: back to the list from a selection, otherwise
    /// open or close the new-ticket form.
    pub fn handle_click(&mut self) {
        self.dispatch(ControlAction::ToggleButton);
    }

    /// Select a ticket from the list. Unknown identifiers are ignored.
    pub fn on_ticket_selection(&mut self, id: &str) {
        self.dispatch(ControlAction::SelectTicket(id.to_string()));
    }

    /// Switch the selected ticket into edit mode.
    pub fn on_clicking_edit(&mut self) {
        self.dispatch(ControlAction::RequestEdit);
    }

    pub fn dismiss_notice(&mut self) {
        self.dispatch(ControlAction::DismissNotice);
    }

    /// Submit a new ticket, then close the form.
    ///
    /// The ticket appears in the list once the feed echoes it.
    pub async fn on_new_ticket_creation(&mut self, fields: NewTicket) -> Result<String> {
        self.require_session()?;
        match self.sync.create(fields).await {
            Ok(id) => {
                self.dispatch(ControlAction::CreateCommitted);
                Ok(id)
            }
            Err(e) => Err(self.write_failed(e)),
        }
    }

    /// Submit the full edited ticket, then return to the list.
    pub async fn on_edit_ticket(&mut self, ticket: Ticket) -> Result<()> {
        self.require_session()?;
        match self.sync.update(&ticket).await {
            Ok(()) => {
                self.dispatch(ControlAction::EditCommitted);
                Ok(())
            }
            Err(e) => Err(self.write_failed(e)),
        }
    }

    /// Delete a ticket, then return to the list.
    pub async fn on_clicking_delete(&mut self, id: &str) -> Result<()> {
        self.require_session()?;
        match self.sync.delete(id).await {
            Ok(()) => {
                self.dispatch(ControlAction::DeleteCommitted);
                Ok(())
            }
            Err(e) => Err(self.write_failed(e)),
        }
    }

    /// Tear down the subscription and refresh timer together.
    pub async fn deactivate(&mut self) {
        self.sync.deactivate().await;
    }

    fn require_session(&self) -> Result<()> {
        if self.identity.is_signed_in() {
            Ok(())
        } else {
            Err(HelpQueueError::NotSignedIn)
        }
    }

    /// Record a rejected write according to policy and hand the error back.
    /// The view state is left exactly as it was.
    fn write_failed(&mut self, error: HelpQueueError) -> HelpQueueError {
        warn!("Ticket write rejected: {error}");
        if self.write_failure == WriteFailurePolicy::Banner {
            self.dispatch(ControlAction::WriteFailed(error.to_string()));
        }
        error
    }
}
