//! Per-account sync job polling.
//!
//! One spawned task per username polls `/sync/status/{username}` on a fixed
//! interval and forwards every status over a channel until the job reaches a
//! terminal state. Starting a new poll for a username aborts the old task.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::clients::{ChessqlApi, SyncStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncUpdate {
    pub username: String,
    pub status: SyncStatus,
}

pub struct SyncPoller {
    api: Arc<dyn ChessqlApi>,
    interval: Duration,
    updates: mpsc::UnboundedSender<SyncUpdate>,
    tasks: HashMap<String, JoinHandle<()>>,
}

impl SyncPoller {
    pub fn new(
        api: Arc<dyn ChessqlApi>,
        interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SyncUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let poller = Self {
            api,
            interval: interval.max(Duration::from_millis(10)),
            updates: tx,
            tasks: HashMap::new(),
        };
        (poller, rx)
    }

    /// Poll `username` until its job finishes, replacing any existing poller.
    pub fn watch(&mut self, username: &str) {
        self.prune_finished();
        if let Some(previous) = self.tasks.remove(username) {
            debug!(username, "Replacing existing sync poller");
            previous.abort();
        }

        let handle = tokio::spawn(poll_until_terminal(
            self.api.clone(),
            username.to_string(),
            self.interval,
            self.updates.clone(),
        ));
        self.tasks.insert(username.to_string(), handle);
    }

    /// Returns true if a poller was running.
    pub fn stop(&mut self, username: &str) -> bool {
        match self.tasks.remove(username) {
            Some(handle) => {
                let was_running = !handle.is_finished();
                handle.abort();
                was_running
            }
            None => false,
        }
    }

    pub fn stop_all(&mut self) {
        for (username, handle) in self.tasks.drain() {
            debug!(username = %username, "Stopping sync poller");
            handle.abort();
        }
    }

    pub fn is_polling(&self, username: &str) -> bool {
        self.tasks
            .get(username)
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn active(&self) -> usize {
        self.tasks.values().filter(|h| !h.is_finished()).count()
    }

    /// Usernames with a task handle still held, finished or not.
    pub fn tracked(&self) -> usize {
        self.tasks.len()
    }

    fn prune_finished(&mut self) {
        self.tasks.retain(|_, handle| !handle.is_finished());
    }
}

impl Drop for SyncPoller {
    fn drop(&mut self) {
        self.stop_all();
    }
}

async fn poll_until_terminal(
    api: Arc<dyn ChessqlApi>,
    username: String,
    interval: Duration,
    updates: mpsc::UnboundedSender<SyncUpdate>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let status = match api.sync_status(&username).await {
            Ok(status) => status,
            Err(e) => {
                warn!(username = %username, "Sync status poll failed: {e}");
                continue;
            }
        };

        let terminal = status.status.is_terminal();
        if terminal {
            info!(
                username = %username,
                status = ?status.status,
                synced = status.synced_games,
                new = status.new_games,
                "Sync finished"
            );
        }

        let update = SyncUpdate {
            username: username.clone(),
            status,
        };
        if updates.send(update).is_err() {
            debug!(username = %username, "Sync update receiver closed");
            break;
        }
        if terminal {
            break;
        }
    }
}
