//! Linked accounts panel: list, link, unlink, verify and sync.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::clients::{Account, ChessqlApi};
use crate::config::Config;
use crate::error::AppError;
use crate::oauth::OAuthSession;
use crate::sync::{SyncPoller, SyncUpdate};

pub struct AccountsPanel {
    api: Arc<dyn ChessqlApi>,
    poller: SyncPoller,
    accounts: Vec<Account>,
    callback_url: String,
}

impl AccountsPanel {
    pub fn new(
        api: Arc<dyn ChessqlApi>,
        config: &Config,
    ) -> (Self, mpsc::UnboundedReceiver<SyncUpdate>) {
        let (poller, updates) = SyncPoller::new(api.clone(), config.sync_poll_interval);
        let panel = Self {
            api,
            poller,
            accounts: Vec::new(),
            callback_url: config.oauth_callback_url(),
        };
        (panel, updates)
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn poller(&self) -> &SyncPoller {
        &self.poller
    }

    pub async fn refresh(&mut self) -> Result<&[Account], AppError> {
        self.accounts = self.api.list_accounts().await?;
        tracing::debug!(count = self.accounts.len(), "Loaded linked accounts");
        Ok(&self.accounts)
    }

    /// Ask the backend for PKCE parameters and open a link session.
    pub async fn begin_link(&self) -> Result<OAuthSession, AppError> {
        let start = self.api.start_lichess_auth().await?;
        Ok(OAuthSession::new(start, self.callback_url.clone()))
    }

    pub async fn unlink(&mut self, username: &str) -> Result<(), AppError> {
        self.poller.stop(username);
        self.api.unlink_account(username).await?;
        self.accounts.retain(|a| a.username != username);
        tracing::info!(username, "Unlinked account");
        Ok(())
    }

    pub async fn verify(&self, username: &str) -> Result<bool, AppError> {
        self.api.verify_account(username).await
    }

    /// Start a sync job and poll it until it finishes.
    pub async fn sync(&mut self, username: &str, full_sync: bool) -> Result<(), AppError> {
        self.api.start_sync(username, full_sync).await?;
        tracing::info!(username, full_sync, "Sync started");
        self.poller.watch(username);
        Ok(())
    }

    /// Tear down every poller; called when the panel goes away.
    pub fn close(&mut self) {
        self.poller.stop_all();
    }
}
