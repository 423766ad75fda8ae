//! Lichess OAuth (PKCE) link flow.
//!
//! The browser is sent to the provider's `auth_url`; every URL it is then
//! redirected or navigated to is fed to [`OAuthSession::handle_navigation`].
//! When one matches the backend callback, the code is exchanged through the
//! backend together with the pending `code_verifier`.

use serde_json::Value;
use url::Url;

use crate::clients::{AuthStart, ChessqlApi};
use crate::error::AppError;

/// Query parameters carried by a callback URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackParams {
    Authorized { code: String, state: String },
    Denied(String),
}

/// Parse `url` if it points at `callback_prefix`. Returns None for unrelated
/// URLs and for callbacks that carry neither a code/state pair nor an error.
pub fn match_callback(url: &str, callback_prefix: &str) -> Option<CallbackParams> {
    if !url.starts_with(callback_prefix) {
        return None;
    }
    let parsed = Url::parse(url).ok()?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in parsed.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Some(CallbackParams::Denied(error));
    }
    match (code, state) {
        (Some(code), Some(state)) => Some(CallbackParams::Authorized { code, state }),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LinkOutcome {
    Linked(Value),
    /// The user closed the flow before it completed.
    Cancelled,
}

impl LinkOutcome {
    /// Username of the newly linked account, when the backend reports one.
    pub fn username(&self) -> Option<&str> {
        match self {
            LinkOutcome::Linked(body) => body
                .get("username")
                .or_else(|| body.get("account").and_then(|a| a.get("username")))
                .and_then(|v| v.as_str()),
            LinkOutcome::Cancelled => None,
        }
    }
}

/// One pending link attempt.
#[derive(Debug)]
pub struct OAuthSession {
    auth_url: String,
    code_verifier: String,
    state: String,
    callback_prefix: String,
}

impl OAuthSession {
    pub fn new(start: AuthStart, callback_prefix: impl Into<String>) -> Self {
        Self {
            auth_url: start.auth_url,
            code_verifier: start.code_verifier,
            state: start.state,
            callback_prefix: callback_prefix.into(),
        }
    }

    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    /// Inspect one navigation. None means "not the callback, keep waiting".
    pub async fn handle_navigation(
        &self,
        api: &dyn ChessqlApi,
        url: &str,
    ) -> Option<Result<LinkOutcome, AppError>> {
        let params = match_callback(url, &self.callback_prefix)?;

        Some(match params {
            CallbackParams::Denied(error) => {
                tracing::warn!("Lichess authorization denied: {error}");
                Err(AppError::OAuth(error))
            }
            CallbackParams::Authorized { state, .. } if state != self.state => {
                tracing::warn!("OAuth callback state mismatch");
                Err(AppError::OAuth("state mismatch".into()))
            }
            CallbackParams::Authorized { code, state } => api
                .complete_lichess_auth(&code, &state, &self.code_verifier)
                .await
                .map(LinkOutcome::Linked),
        })
    }

    /// The user abandoned the flow.
    pub fn close(self) -> LinkOutcome {
        tracing::info!("OAuth flow closed before completion");
        LinkOutcome::Cancelled
    }
}
