//! Line-oriented front end for the ticket queue.
//!
//! Each input line is one user intent. After every command the page is
//! rendered again from the controller's view model.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::control::{TicketControl, ViewMode};
use crate::display::render_page;
use crate::error::{HelpQueueError, Result};
use crate::identity::LocalIdentity;
use crate::types::NewTicket;

/// How long to wait for the feed to echo a write before re-rendering
const ECHO_WAIT: Duration = Duration::from_millis(250);

pub const HELP_TEXT: &str = "\
Commands:
  show                                   render the page
  button                                 press the action button
  select <id>                            open a ticket
  add <names> ; <location> ; <issue>     submit a new ticket
  edit                                   edit the open ticket
  save <names> ; <location> ; <issue>    submit the edited ticket
  delete                                 delete the open ticket
  dismiss                                hide the last write error
  signin <email> | signout
  help | quit";

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Show,
    Button,
    Select(String),
    Add(NewTicket),
    Edit,
    Save(NewTicket),
    Delete,
    Dismiss,
    SignIn(String),
    SignOut,
    Help,
    Quit,
}

fn parse_fields(rest: &str) -> std::result::Result<NewTicket, String> {
    let parts: Vec<&str> = rest.split(';').map(str::trim).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        return Err("expected: <names> ; <location> ; <issue>".to_string());
    }
    Ok(NewTicket::new(parts[0], parts[1], parts[2]))
}

/// Parse a single input line
pub fn parse_command(line: &str) -> std::result::Result<ReplCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_lowercase().as_str() {
        "" | "show" | "list" => Ok(ReplCommand::Show),
        "button" | "back" => Ok(ReplCommand::Button),
        "select" if !rest.is_empty() => Ok(ReplCommand::Select(rest.to_string())),
        "select" => Err("expected: select <id>".to_string()),
        "add" => parse_fields(rest).map(ReplCommand::Add),
        "edit" => Ok(ReplCommand::Edit),
        "save" => parse_fields(rest).map(ReplCommand::Save),
        "delete" => Ok(ReplCommand::Delete),
        "dismiss" => Ok(ReplCommand::Dismiss),
        "signin" if !rest.is_empty() => Ok(ReplCommand::SignIn(rest.to_string())),
        "signin" => Err("expected: signin <email>".to_string()),
        "signout" => Ok(ReplCommand::SignOut),
        "help" | "?" => Ok(ReplCommand::Help),
        "quit" | "exit" => Ok(ReplCommand::Quit),
        other => Err(format!("unknown command '{other}' (try 'help')")),
    }
}

/// Why `command` cannot run in `mode`, for commands tied to one view
fn misplaced(command: &ReplCommand, mode: Option<ViewMode>) -> Option<&'static str> {
    match command {
        ReplCommand::Save(_) if mode != Some(ViewMode::Editing) => {
            Some("save is only available while editing a ticket")
        }
        ReplCommand::Delete if mode != Some(ViewMode::Detail) => {
            Some("delete is only available from the ticket detail view")
        }
        _ => None,
    }
}

/// Read commands from `input` until it ends or `quit`, printing pages to `out`.
///
/// Rejected writes are reported and the loop continues.
pub async fn run_repl<R, W>(
    control: &mut TicketControl,
    identity: Arc<LocalIdentity>,
    input: R,
    out: &mut W,
    colored: bool,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut changes = control.synchronizer().watch();
    // Let the first snapshot land before the first render
    let _ = tokio::time::timeout(ECHO_WAIT, changes.changed()).await;
    writeln!(out, "{}", render_page(&control.render(), colored))?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(out, "{message}")?;
                continue;
            }
        };

        if let Some(message) = misplaced(&command, control.render().mode) {
            writeln!(out, "{message}")?;
            continue;
        }

        let _ = changes.borrow_and_update();
        let is_write = matches!(
            command,
            ReplCommand::Add(_) | ReplCommand::Save(_) | ReplCommand::Delete
        );
        let outcome = match command {
            ReplCommand::Quit => break,
            ReplCommand::Help => {
                writeln!(out, "{HELP_TEXT}")?;
                continue;
            }
            ReplCommand::Show => Ok(()),
            ReplCommand::Button => {
                control.handle_click();
                Ok(())
            }
            ReplCommand::Select(id) => {
                control.on_ticket_selection(&id);
                Ok(())
            }
            ReplCommand::Edit => {
                control.on_clicking_edit();
                Ok(())
            }
            ReplCommand::Dismiss => {
                control.dismiss_notice();
                Ok(())
            }
            ReplCommand::SignIn(email) => {
                identity.sign_in(&email);
                Ok(())
            }
            ReplCommand::SignOut => {
                identity.sign_out();
                Ok(())
            }
            ReplCommand::Add(fields) => control.on_new_ticket_creation(fields).await.map(|_| ()),
            ReplCommand::Save(fields) => match control.state().selected_ticket.clone() {
                Some(ticket) => control.on_edit_ticket(ticket.with_fields(fields)).await,
                None => Err(HelpQueueError::Other("no ticket is being edited".to_string())),
            },
            ReplCommand::Delete => match control.state().selected_ticket.clone() {
                Some(ticket) => control.on_clicking_delete(&ticket.id).await,
                None => Err(HelpQueueError::Other("no ticket is open".to_string())),
            },
        };

        match outcome {
            Ok(()) if is_write => {
                // Writes show up once the feed echoes them
                let _ = tokio::time::timeout(ECHO_WAIT, changes.changed()).await;
            }
            Ok(()) => {}
            Err(e) => writeln!(out, "error: {e}")?,
        }
        writeln!(out, "{}", render_page(&control.render(), colored))?;
    }

    Ok(())
}
