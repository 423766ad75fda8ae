use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    /// Root of the local ChessQL service.
    pub base_url: String,
    /// Results shown per display page.
    pub page_size: usize,
    /// Results requested per backend call.
    pub fetch_size: usize,
    /// Player the backend resolves "I"/"me" against in natural-language queries.
    pub reference_player: Option<String>,
    pub sync_poll_interval: Duration,
    pub animation_duration: Duration,
    pub animate_backward: bool,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("CHESSQL_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:9090".to_string()),
            page_size: parse_var("CHESSQL_PAGE_SIZE")
                .filter(|&n: &usize| n > 0)
                .unwrap_or(20),
            fetch_size: parse_var("CHESSQL_FETCH_SIZE")
                .filter(|&n: &usize| n > 0)
                .unwrap_or(500),
            reference_player: env::var("CHESSQL_REFERENCE_PLAYER")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            sync_poll_interval: Duration::from_millis(
                parse_var("CHESSQL_SYNC_POLL_MS")
                    .filter(|&ms: &u64| ms > 0)
                    .unwrap_or(1000),
            ),
            animation_duration: Duration::from_millis(
                parse_var("CHESSQL_ANIMATION_MS").unwrap_or(100),
            ),
            animate_backward: env::var("CHESSQL_ANIMATE_BACKWARD")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            request_timeout: Duration::from_secs(parse_var("CHESSQL_TIMEOUT_SECS").unwrap_or(30)),
        }
    }

    /// Redirect target the OAuth provider sends the browser back to.
    pub fn oauth_callback_url(&self) -> String {
        format!("{}/auth/lichess/callback", self.base_url)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9090".to_string(),
            page_size: 20,
            fetch_size: 500,
            reference_player: None,
            sync_poll_interval: Duration::from_secs(1),
            animation_duration: Duration::from_millis(100),
            animate_backward: false,
            request_timeout: Duration::from_secs(30),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
