//! Ticket control model types for testable state management
//!
//! This module separates state (ControlState) from view (ControlViewModel)
//! so every transition and every rendered mode can be tested without a
//! running synchronizer.

use tracing::debug;

use crate::identity::Session;
use crate::sync::SyncState;
use crate::types::Ticket;

/// Button label while the list is showing
pub const BUTTON_ADD_TICKET: &str = "Add Ticket";

/// Button label in every other mode
pub const BUTTON_RETURN_TO_LIST: &str = "Return to Ticket List";

// ============================================================================
// State Types
// ============================================================================

/// Local selection and form state. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlState {
    /// Whether the new-ticket form is open
    pub form_visible_on_page: bool,
    /// Copy of the ticket being viewed or edited
    pub selected_ticket: Option<Ticket>,
    /// Whether the selected ticket is being edited
    pub editing: bool,
    /// Message from the last rejected write, if shown
    pub notice: Option<String>,
}

/// The five mutually exclusive modes, highest priority first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Error,
    Editing,
    Detail,
    Composing,
    Listing,
}

impl ViewMode {
    /// Label of the action button, if the mode shows one
    pub fn button_label(self) -> Option<&'static str> {
        match self {
            ViewMode::Error => None,
            ViewMode::Editing | ViewMode::Detail | ViewMode::Composing => {
                Some(BUTTON_RETURN_TO_LIST)
            }
            ViewMode::Listing => Some(BUTTON_ADD_TICKET),
        }
    }
}

/// Pure function: pick the active mode from the four flags
pub fn resolve_view_mode(
    has_error: bool,
    editing: bool,
    has_selection: bool,
    form_visible: bool,
) -> ViewMode {
    if has_error {
        ViewMode::Error
    } else if editing {
        ViewMode::Editing
    } else if has_selection {
        ViewMode::Detail
    } else if form_visible {
        ViewMode::Composing
    } else {
        ViewMode::Listing
    }
}

// ============================================================================
// Action Types
// ============================================================================

/// All possible transitions of the control state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlAction {
    /// The action button was pressed
    ToggleButton,
    /// A ticket in the list was chosen
    SelectTicket(String),
    /// Edit was requested from the detail view
    RequestEdit,

    // Completions of async writes (handled externally)
    /// An edited ticket was accepted by the store
    EditCommitted,
    /// A delete was accepted by the store
    DeleteCommitted,
    /// A new ticket was accepted by the store
    CreateCommitted,
    /// A write was rejected; show its message
    WriteFailed(String),

    /// Hide the write-failure notice
    DismissNotice,
}

// ============================================================================
// View Model Types
// ============================================================================

/// What the page shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveView {
    /// No session: nothing but a prompt to sign in
    SignInPrompt,
    Error {
        message: String,
    },
    Editing {
        ticket: Option<Ticket>,
    },
    Detail {
        ticket: Ticket,
    },
    Composing,
    Listing {
        tickets: Vec<Ticket>,
    },
}

/// Computed view model for rendering the whole page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlViewModel {
    /// Active mode, `None` while signed out
    pub mode: Option<ViewMode>,
    pub view: ActiveView,
    /// Action button label, `None` when no button is shown
    pub button_label: Option<&'static str>,
    /// Write-failure notice
    pub notice: Option<String>,
    /// Email of the signed-in user
    pub signed_in_as: Option<String>,
    /// Number of tickets in the local list
    pub ticket_count: usize,
}

// ============================================================================
// Pure Functions
// ============================================================================

/// Pure function: compute view model from state
///
/// The sign-in gate is checked first: without a session nothing but the
/// prompt is rendered, whatever the other flags say.
pub fn compute_control_view_model(
    state: &ControlState,
    sync: &SyncState,
    session: Option<&Session>,
) -> ControlViewModel {
    let Some(session) = session else {
        return ControlViewModel {
            mode: None,
            view: ActiveView::SignInPrompt,
            button_label: None,
            notice: None,
            signed_in_as: None,
            ticket_count: 0,
        };
    };

    let mode = resolve_view_mode(
        sync.error.is_some(),
        state.editing,
        state.selected_ticket.is_some(),
        state.form_visible_on_page,
    );

    let view = match (mode, &state.selected_ticket) {
        (ViewMode::Error, _) => ActiveView::Error {
            message: sync.error.clone().unwrap_or_default(),
        },
        (ViewMode::Editing, selected) => ActiveView::Editing {
            ticket: selected.clone(),
        },
        (ViewMode::Detail, Some(ticket)) => ActiveView::Detail {
            ticket: ticket.clone(),
        },
        (ViewMode::Composing, _) => ActiveView::Composing,
        // Detail always has a selection; the second arm only satisfies the match
        (ViewMode::Listing, _) | (ViewMode::Detail, None) => ActiveView::Listing {
            tickets: sync.tickets.clone(),
        },
    };

    ControlViewModel {
        mode: Some(mode),
        view,
        button_label: mode.button_label(),
        // The error view replaces the whole surface
        notice: if mode == ViewMode::Error {
            None
        } else {
            state.notice.clone()
        },
        signed_in_as: Some(session.email.clone()),
        ticket_count: sync.tickets.len(),
    }
}

/// Pure function: apply action to state (reducer pattern)
///
/// `tickets` is the current local list, used to resolve selections.
/// Writes themselves happen outside; only their outcomes arrive here.
pub fn reduce_control_state(
    mut state: ControlState,
    action: ControlAction,
    tickets: &[Ticket],
) -> ControlState {
    match action {
        ControlAction::ToggleButton => {
            if state.selected_ticket.is_some() {
                state.form_visible_on_page = false;
                state.selected_ticket = None;
                state.editing = false;
            } else {
                state.form_visible_on_page = !state.form_visible_on_page;
            }
            state.notice = None;
        }
        ControlAction::SelectTicket(id) => match tickets.iter().find(|t| t.id == id) {
            Some(ticket) => state.selected_ticket = Some(ticket.clone()),
            None => debug!("Ignoring selection of unknown ticket '{id}'"),
        },
        ControlAction::RequestEdit => {
            if state.selected_ticket.is_some() {
                state.editing = true;
            }
        }
        ControlAction::EditCommitted => {
            state.editing = false;
            state.selected_ticket = None;
            state.notice = None;
        }
        ControlAction::DeleteCommitted => {
            state.selected_ticket = None;
            state.notice = None;
        }
        ControlAction::CreateCommitted => {
            state.form_visible_on_page = false;
            state.notice = None;
        }
        ControlAction::WriteFailed(message) => {
            state.notice = Some(message);
        }
        ControlAction::DismissNotice => {
            state.notice = None;
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::Timestamp;

    fn make_ticket(id: &str, issue: &str) -> Ticket {
        Ticket {
            id: id.to_string(),
            names: "Amy".to_string(),
            location: "Rm 4".to_string(),
            issue: issue.to_string(),
            time_open: Timestamp::from_second(1_700_000_000).unwrap(),
            formatted_wait_time: "5 minutes".to_string(),
        }
    }

    fn tickets() -> Vec<Ticket> {
        vec![make_ticket("t1", "projector"), make_ticket("t2", "wifi")]
    }

    fn session() -> Session {
        Session {
            user_id: "amy@example.com".to_string(),
            email: "amy@example.com".to_string(),
        }
    }

    fn sync_state(error: Option<&str>) -> SyncState {
        SyncState {
            tickets: tickets(),
            error: error.map(str::to_string),
            revision: 1,
        }
    }

    // ========================================================================
    // Mode Resolution Tests
    // ========================================================================

    #[test]
    fn test_resolve_every_flag_combination() {
        for bits in 0u8..16 {
            let error = bits & 1 != 0;
            let editing = bits & 2 != 0;
            let selected = bits & 4 != 0;
            let form = bits & 8 != 0;
            let expected = if error {
                ViewMode::Error
            } else if editing {
                ViewMode::Editing
            } else if selected {
                ViewMode::Detail
            } else if form {
                ViewMode::Composing
            } else {
                ViewMode::Listing
            };
            assert_eq!(
                resolve_view_mode(error, editing, selected, form),
                expected,
                "flags error={error} editing={editing} selected={selected} form={form}"
            );
        }
    }

    #[test]
    fn test_selection_beats_form_visibility() {
        assert_eq!(resolve_view_mode(false, false, true, true), ViewMode::Detail);
    }

    #[test]
    fn test_button_labels() {
        assert_eq!(ViewMode::Error.button_label(), None);
        assert_eq!(ViewMode::Listing.button_label(), Some("Add Ticket"));
        assert_eq!(
            ViewMode::Composing.button_label(),
            Some("Return to Ticket List")
        );
        assert_eq!(ViewMode::Detail.button_label(), Some("Return to Ticket List"));
        assert_eq!(
            ViewMode::Editing.button_label(),
            Some("Return to Ticket List")
        );
    }

    // ========================================================================
    // View Model Tests
    // ========================================================================

    #[test]
    fn test_view_model_signed_out_is_gated() {
        let state = ControlState {
            editing: true,
            selected_ticket: Some(make_ticket("t1", "projector")),
            notice: Some("boom".to_string()),
            ..Default::default()
        };
        let vm = compute_control_view_model(&state, &sync_state(Some("offline")), None);
        assert_eq!(vm.view, ActiveView::SignInPrompt);
        assert_eq!(vm.mode, None);
        assert_eq!(vm.button_label, None);
        assert_eq!(vm.notice, None);
        assert_eq!(vm.ticket_count, 0);
    }

    #[test]
    fn test_view_model_listing() {
        let vm = compute_control_view_model(
            &ControlState::default(),
            &sync_state(None),
            Some(&session()),
        );
        assert_eq!(vm.mode, Some(ViewMode::Listing));
        assert_eq!(vm.button_label, Some(BUTTON_ADD_TICKET));
        assert_eq!(vm.ticket_count, 2);
        assert_eq!(vm.signed_in_as.as_deref(), Some("amy@example.com"));
        match vm.view {
            ActiveView::Listing { tickets } => assert_eq!(tickets.len(), 2),
            other => panic!("expected listing, got {other:?}"),
        }
    }

    #[test]
    fn test_view_model_error_hides_button_and_notice() {
        let state = ControlState {
            notice: Some("write rejected".to_string()),
            ..Default::default()
        };
        let vm = compute_control_view_model(&state, &sync_state(Some("offline")), Some(&session()));
        assert_eq!(
            vm.view,
            ActiveView::Error {
                message: "offline".to_string()
            }
        );
        assert_eq!(vm.button_label, None);
        assert_eq!(vm.notice, None);
    }

    #[test]
    fn test_view_model_detail_carries_selection() {
        let state = ControlState {
            selected_ticket: Some(make_ticket("t1", "projector")),
            form_visible_on_page: true,
            ..Default::default()
        };
        let vm = compute_control_view_model(&state, &sync_state(None), Some(&session()));
        assert_eq!(
            vm.view,
            ActiveView::Detail {
                ticket: make_ticket("t1", "projector")
            }
        );
    }

    // ========================================================================
    // Reducer Tests
    // ========================================================================

    #[test]
    fn test_reduce_toggle_opens_and_closes_form() {
        let state = reduce_control_state(ControlState::default(), ControlAction::ToggleButton, &[]);
        assert!(state.form_visible_on_page);
        let state = reduce_control_state(state, ControlAction::ToggleButton, &[]);
        assert!(!state.form_visible_on_page);
    }

    #[test]
    fn test_reduce_toggle_with_selection_returns_to_list() {
        let state = ControlState {
            selected_ticket: Some(make_ticket("t1", "projector")),
            editing: true,
            form_visible_on_page: true,
            notice: Some("old".to_string()),
        };
        let state = reduce_control_state(state, ControlAction::ToggleButton, &tickets());
        assert_eq!(state, ControlState::default());
    }

    #[test]
    fn test_reduce_select_known_ticket() {
        let state = reduce_control_state(
            ControlState::default(),
            ControlAction::SelectTicket("t2".to_string()),
            &tickets(),
        );
        assert_eq!(state.selected_ticket, Some(make_ticket("t2", "wifi")));
    }

    #[test]
    fn test_reduce_select_unknown_ticket_is_noop() {
        let state = reduce_control_state(
            ControlState::default(),
            ControlAction::SelectTicket("missing".to_string()),
            &tickets(),
        );
        assert_eq!(state, ControlState::default());
    }

    #[test]
    fn test_reduce_request_edit_requires_selection() {
        let state =
            reduce_control_state(ControlState::default(), ControlAction::RequestEdit, &tickets());
        assert!(!state.editing);

        let state = ControlState {
            selected_ticket: Some(make_ticket("t1", "projector")),
            ..Default::default()
        };
        let state = reduce_control_state(state, ControlAction::RequestEdit, &tickets());
        assert!(state.editing);
    }

    #[test]
    fn test_reduce_edit_committed_returns_to_list() {
        let state = ControlState {
            selected_ticket: Some(make_ticket("t1", "projector")),
            editing: true,
            ..Default::default()
        };
        let state = reduce_control_state(state, ControlAction::EditCommitted, &tickets());
        assert!(!state.editing);
        assert!(state.selected_ticket.is_none());
    }

    #[test]
    fn test_reduce_delete_and_create_committed() {
        let state = ControlState {
            selected_ticket: Some(make_ticket("t1", "projector")),
            ..Default::default()
        };
        let state = reduce_control_state(state, ControlAction::DeleteCommitted, &tickets());
        assert!(state.selected_ticket.is_none());

        let state = ControlState {
            form_visible_on_page: true,
            ..Default::default()
        };
        let state = reduce_control_state(state, ControlAction::CreateCommitted, &tickets());
        assert!(!state.form_visible_on_page);
    }

    #[test]
    fn test_reduce_write_failed_keeps_mode() {
        let state = ControlState {
            selected_ticket: Some(make_ticket("t1", "projector")),
            editing: true,
            ..Default::default()
        };
        let state = reduce_control_state(
            state,
            ControlAction::WriteFailed("permission denied".to_string()),
            &tickets(),
        );
        assert!(state.editing);
        assert!(state.selected_ticket.is_some());
        assert_eq!(state.notice.as_deref(), Some("permission denied"));

        let state = reduce_control_state(state, ControlAction::DismissNotice, &tickets());
        assert!(state.notice.is_none());
    }
}
