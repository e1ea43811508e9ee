#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};
use std::sync::Arc;
use std::time::Duration;

use jiff::Timestamp;
use tempfile::TempDir;
use tokio::sync::watch;

use helpqueue::clock::{Clock, ManualClock};
use helpqueue::config::CONFIG_ENV;
use helpqueue::remote::{DocumentFields, FieldValue, InMemoryCollection, RemoteCollection};
use helpqueue::sync::{SyncConfig, SyncState, TicketSynchronizer};
use helpqueue::types::{
    DEFAULT_COLLECTION, FIELD_ISSUE, FIELD_LOCATION, FIELD_NAMES, FIELD_TIME_OPEN, Ticket,
};

/// Fixed start time for every store-backed test
pub fn t0() -> Timestamp {
    "2024-05-01T09:00:00Z".parse().expect("valid timestamp")
}

/// Upper bound on how long a test waits for the feed
pub const FEED_TIMEOUT: Duration = Duration::from_secs(5);

/// An in-memory store sharing a hand-driven clock with its synchronizers
pub struct QueueFixture {
    pub clock: Arc<ManualClock>,
    pub store: Arc<InMemoryCollection>,
}

impl QueueFixture {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(t0()));
        let store = Arc::new(InMemoryCollection::new(clock.clone()));
        QueueFixture { clock, store }
    }

    pub fn synchronizer(&self, config: SyncConfig) -> TicketSynchronizer {
        TicketSynchronizer::activate(self.store.clone(), self.clock.clone(), config)
    }

    /// Insert a ticket directly through the store, opened at the clock's current time
    pub async fn seed(&self, names: &str, location: &str, issue: &str) -> String {
        self.seed_at(names, location, issue, self.clock.now()).await
    }

    /// Insert a ticket directly through the store with an explicit open time
    pub async fn seed_at(&self, names: &str, location: &str, issue: &str, opened: Timestamp) -> String {
        let mut fields = DocumentFields::new();
        fields.insert(FIELD_NAMES.to_string(), names.into());
        fields.insert(FIELD_LOCATION.to_string(), location.into());
        fields.insert(FIELD_ISSUE.to_string(), issue.into());
        fields.insert(FIELD_TIME_OPEN.to_string(), FieldValue::Time(opened));
        self.store
            .create(DEFAULT_COLLECTION, fields)
            .await
            .expect("seed write succeeds")
    }
}

/// Wait until the published state satisfies `f`
pub async fn wait_for_state(
    rx: &mut watch::Receiver<SyncState>,
    f: impl FnMut(&SyncState) -> bool,
) -> SyncState {
    tokio::time::timeout(FEED_TIMEOUT, rx.wait_for(f))
        .await
        .expect("timed out waiting for sync state")
        .expect("sync state channel closed")
        .clone()
}

/// Wait until the local list holds exactly `count` tickets
pub async fn wait_for_count(rx: &mut watch::Receiver<SyncState>, count: usize) -> Vec<Ticket> {
    wait_for_state(rx, |s| s.tickets.len() == count).await.tickets
}

/// Helper struct to run helpqueue commands in an isolated temp directory
pub struct HelpQueueTest {
    pub temp_dir: TempDir,
    binary_path: &'static str,
}

impl HelpQueueTest {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        HelpQueueTest {
            temp_dir,
            binary_path: env!("CARGO_BIN_EXE_helpqueue"),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(self.binary_path);
        command
            .args(args)
            .current_dir(self.temp_dir.path())
            .env_remove(CONFIG_ENV)
            .env_remove("RUST_LOG");
        command
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args)
            .output()
            .expect("Failed to execute helpqueue command")
    }

    /// Run with `input` piped to stdin
    pub fn run_with_input(&self, args: &[&str], input: &str) -> Output {
        let mut child = self
            .command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to spawn helpqueue command");
        child
            .stdin
            .take()
            .expect("stdin is piped")
            .write_all(input.as_bytes())
            .expect("Failed to write stdin");
        child
            .wait_with_output()
            .expect("Failed to wait for helpqueue command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Expected command {:?} to fail, but it succeeded",
            args
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }

    pub fn config_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join(".helpqueue").join("config.yaml")
    }

    pub fn write_config(&self, content: &str) {
        let path = self.config_path();
        fs::create_dir_all(path.parent().expect("config has a parent"))
            .expect("Failed to create .helpqueue directory");
        fs::write(path, content).expect("Failed to write config file");
    }

    pub fn read_config(&self) -> Option<String> {
        fs::read_to_string(self.config_path()).ok()
    }
}
