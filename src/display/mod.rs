//! Plain-text rendering of the ticket queue page.
//!
//! Render-only: takes a computed `ControlViewModel` and produces the text the
//! prompt prints. Colour is optional so output can be compared in tests.

use owo_colors::OwoColorize;

use crate::control::{ActiveView, ControlViewModel};
use crate::types::Ticket;

pub const APP_TITLE: &str = "Help Queue";

fn paint(text: &str, colored: bool, style: fn(&str) -> String) -> String {
    if colored {
        style(text)
    } else {
        text.to_string()
    }
}

/// Title, rule and navigation links
pub fn render_header(signed_in_as: Option<&str>, colored: bool) -> String {
    let title = paint(APP_TITLE, colored, |s| s.bold().to_string());
    let account = match signed_in_as {
        Some(email) => format!("Signed in as {email}"),
        None => "Sign In".to_string(),
    };
    format!(
        "{title}\n{}\n- Home\n- {account}\n",
        "-".repeat(APP_TITLE.len())
    )
}

/// One line per ticket, as shown in the list
pub fn format_ticket_line(ticket: &Ticket) -> String {
    format!(
        "[{}] {} - {} ({})",
        ticket.id, ticket.location, ticket.names, ticket.formatted_wait_time
    )
}

fn render_ticket_detail(ticket: &Ticket, colored: bool) -> String {
    let heading = paint("Ticket Detail", colored, |s| s.bold().to_string());
    format!(
        "{heading}\n{} - {}\n{}\nWaiting: {}\n(edit | delete)\n",
        ticket.location, ticket.names, ticket.issue, ticket.formatted_wait_time
    )
}

/// Render the whole page
pub fn render_page(vm: &ControlViewModel, colored: bool) -> String {
    let mut out = render_header(vm.signed_in_as.as_deref(), colored);
    out.push('\n');

    match &vm.view {
        ActiveView::SignInPrompt => {
            out.push_str("You must be signed in to access the queue.\n");
        }
        ActiveView::Error { message } => {
            let line = format!("There was an error: {message}");
            out.push_str(&paint(&line, colored, |s| s.red().to_string()));
            out.push('\n');
        }
        ActiveView::Editing { ticket } => {
            out.push_str(&paint("Edit Ticket", colored, |s| s.bold().to_string()));
            out.push('\n');
            match ticket {
                Some(ticket) => out.push_str(&format!(
                    "names: {}\nlocation: {}\nissue: {}\n",
                    ticket.names, ticket.location, ticket.issue
                )),
                None => out.push_str("No ticket selected.\n"),
            }
        }
        ActiveView::Detail { ticket } => {
            out.push_str(&render_ticket_detail(ticket, colored));
        }
        ActiveView::Composing => {
            out.push_str(&paint("New Ticket", colored, |s| s.bold().to_string()));
            out.push_str("\nEnter names, location and issue.\n");
        }
        ActiveView::Listing { tickets } => {
            if tickets.is_empty() {
                out.push_str(&paint("No tickets in the queue.", colored, |s| {
                    s.dimmed().to_string()
                }));
                out.push('\n');
            }
            for ticket in tickets {
                out.push_str(&format_ticket_line(ticket));
                out.push('\n');
            }
        }
    }

    if let Some(notice) = &vm.notice {
        out.push('\n');
        out.push_str(&paint(&format!("! {notice}"), colored, |s| {
            s.yellow().to_string()
        }));
        out.push('\n');
    }

    if let Some(label) = vm.button_label {
        out.push_str(&format!("\n<{label}>\n"));
    }

    out
}
