//! Bridge to the local ChessQL HTTP service.

use async_trait::async_trait;
use chess_core::GameRecord;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

use crate::config::Config;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Plain-English question, sent to `/ask`.
    Natural,
    /// ChessQL/SQL query, sent to `/cql`.
    Cql,
}

/// One backend fetch page of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPageRequest {
    pub mode: SearchMode,
    pub text: String,
    pub limit: usize,
    /// 1-based backend page number.
    pub page_no: usize,
    pub offset: usize,
    pub reference_player: Option<String>,
}

impl SearchPageRequest {
    pub fn path(&self) -> &'static str {
        match self.mode {
            SearchMode::Natural => "ask",
            SearchMode::Cql => "cql",
        }
    }

    pub fn body(&self) -> Value {
        let key = match self.mode {
            SearchMode::Natural => "question",
            SearchMode::Cql => "query",
        };
        json!({
            key: self.text,
            "limit": self.limit,
            "page_no": self.page_no,
            "offset": self.offset,
            "reference_player": self.reference_player,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchResponse {
    pub results: Vec<GameRecord>,
    pub total_count: usize,
    /// None when the backend does not report it; the total decides then.
    pub has_next: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    #[serde(default, alias = "last_sync_at", alias = "last_synced")]
    pub last_sync: Option<String>,
    #[serde(default, alias = "games_count", alias = "total_games")]
    pub game_count: Option<u64>,
    #[serde(default = "default_valid", alias = "valid", alias = "is_valid")]
    pub token_valid: bool,
}

fn default_valid() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AccountList {
    Bare(Vec<Account>),
    Wrapped { accounts: Vec<Account> },
}

/// PKCE parameters returned by `/auth/lichess/start`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthStart {
    pub auth_url: String,
    pub code_verifier: String,
    pub state: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Starting,
    Syncing,
    Completed,
    Cancelled,
    Error,
    #[serde(other)]
    Unknown,
}

impl SyncState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SyncState::Completed | SyncState::Cancelled | SyncState::Error
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SyncStatus {
    pub status: SyncState,
    #[serde(default)]
    pub synced_games: u64,
    #[serde(default)]
    pub new_games: u64,
    #[serde(default)]
    pub total_games: Option<u64>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Everything the desktop shell asks of the backend.
#[async_trait]
pub trait ChessqlApi: Send + Sync {
    async fn search(&self, request: &SearchPageRequest) -> Result<SearchResponse, AppError>;

    async fn list_accounts(&self) -> Result<Vec<Account>, AppError>;

    async fn start_lichess_auth(&self) -> Result<AuthStart, AppError>;

    /// Exchange an authorization code; returns the linked-account payload.
    async fn complete_lichess_auth(
        &self,
        code: &str,
        state: &str,
        code_verifier: &str,
    ) -> Result<Value, AppError>;

    async fn unlink_account(&self, username: &str) -> Result<(), AppError>;

    async fn verify_account(&self, username: &str) -> Result<bool, AppError>;

    async fn start_sync(&self, username: &str, full_sync: bool) -> Result<(), AppError>;

    async fn sync_status(&self, username: &str) -> Result<SyncStatus, AppError>;
}

pub struct ChessqlClient {
    client: Client,
    base_url: Url,
}

impl ChessqlClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent("ChessQLDesktop/1.0")
            .timeout(config.request_timeout)
            .build()?;
        let base_url = Url::parse(&config.base_url)?;
        Ok(Self { client, base_url })
    }

    /// Base URL plus path segments; each segment is percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, AppError> {
        let resp = request.send().await.map_err(AppError::from_transport)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
            .unwrap_or_else(|| format!("HTTP {status}"));
        tracing::warn!(status = status.as_u16(), "Backend request failed: {detail}");

        Err(AppError::Api {
            status: status.as_u16(),
            detail,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AppError> {
        let resp = self.send(request).await?;
        Ok(resp.json::<T>().await?)
    }
}

#[async_trait]
impl ChessqlApi for ChessqlClient {
    async fn search(&self, request: &SearchPageRequest) -> Result<SearchResponse, AppError> {
        let url = self.endpoint(&[request.path()])?;
        tracing::debug!(
            endpoint = request.path(),
            page_no = request.page_no,
            limit = request.limit,
            "Search request"
        );
        self.send_json(self.client.post(url).json(&request.body()))
            .await
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        let url = self.endpoint(&["auth", "accounts"])?;
        let list: AccountList = self.send_json(self.client.get(url)).await?;
        Ok(match list {
            AccountList::Bare(accounts) | AccountList::Wrapped { accounts } => accounts,
        })
    }

    async fn start_lichess_auth(&self) -> Result<AuthStart, AppError> {
        let url = self.endpoint(&["auth", "lichess", "start"])?;
        self.send_json(self.client.post(url)).await
    }

    async fn complete_lichess_auth(
        &self,
        code: &str,
        state: &str,
        code_verifier: &str,
    ) -> Result<Value, AppError> {
        let url = self.endpoint(&["auth", "lichess", "callback"])?;
        self.send_json(self.client.post(url).json(&json!({
            "code": code,
            "state": state,
            "code_verifier": code_verifier,
        })))
        .await
    }

    async fn unlink_account(&self, username: &str) -> Result<(), AppError> {
        let url = self.endpoint(&["auth", "accounts", username])?;
        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    async fn verify_account(&self, username: &str) -> Result<bool, AppError> {
        let url = self.endpoint(&["auth", "accounts", username, "verify"])?;
        let body: Value = self.send_json(self.client.get(url)).await?;
        Ok(body.get("valid").and_then(|v| v.as_bool()).unwrap_or(false))
    }

    async fn start_sync(&self, username: &str, full_sync: bool) -> Result<(), AppError> {
        let url = self.endpoint(&["sync", "start", username])?;
        self.send(self.client.post(url).json(&json!({ "full_sync": full_sync })))
            .await?;
        Ok(())
    }

    async fn sync_status(&self, username: &str) -> Result<SyncStatus, AppError> {
        let url = self.endpoint(&["sync", "status", username])?;
        self.send_json(self.client.get(url)).await
    }
}
