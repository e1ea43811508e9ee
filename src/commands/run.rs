//! `run`: the interactive ticket queue.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::BufReader;
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::control::TicketControl;
use crate::error::Result;
use crate::identity::LocalIdentity;
use crate::remote::InMemoryCollection;
use crate::repl::run_repl;

use super::config::load_config;

pub struct RunOptions {
    pub config: Option<PathBuf>,
    pub user: Option<String>,
    pub no_color: bool,
}

/// Run the queue against an in-process collection until input ends
pub async fn cmd_run(options: RunOptions) -> Result<()> {
    let config = load_config(options.config.as_deref())?;
    config.validate()?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = Arc::new(InMemoryCollection::new(clock.clone()));
    let identity = Arc::new(match options.user.as_deref() {
        Some(email) => LocalIdentity::signed_in(email),
        None => LocalIdentity::signed_out(),
    });

    let mut control = TicketControl::activate(store, identity.clone(), clock, &config);
    info!("Ticket queue started on collection '{}'", config.collection);

    let colored = !options.no_color && std::io::stdout().is_terminal();
    let input = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();

    let result = run_repl(&mut control, identity, input, &mut stdout, colored).await;

    // Release the subscription on every exit path
    control.deactivate().await;
    result
}
