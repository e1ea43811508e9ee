//! Ticket queue view-state control.
//!
//! `model` holds the pure state machine (state, actions, reducer, view
//! model); `controller` drives it from user intents and the synchronizer.

pub mod controller;
pub mod model;

pub use controller::TicketControl;
pub use model::{
    ActiveView, BUTTON_ADD_TICKET, BUTTON_RETURN_TO_LIST, ControlAction, ControlState,
    ControlViewModel, ViewMode, compute_control_view_model, reduce_control_state,
    resolve_view_mode,
};
