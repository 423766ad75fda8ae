use serde::{Deserialize, Serialize};

use crate::pgn;

/// Move list as delivered by the search backend: either a structured list of
/// SAN tokens or raw movetext ("1. e4 e5 2. Nf3 ...").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MoveText {
    List(Vec<String>),
    Text(String),
}

/// A game row returned by `/ask` or `/cql`. Every field is optional because the
/// backend omits columns the query did not select.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRecord {
    pub white_player: Option<String>,
    pub black_player: Option<String>,
    pub white_elo: Option<i32>,
    pub black_elo: Option<i32>,
    pub result: Option<String>, // "1-0", "0-1", "1/2-1/2"
    pub date_played: Option<String>,
    pub time_control: Option<String>,
    pub speed: Option<String>,
    pub site: Option<String>,
    pub opening: Option<String>,
    pub termination: Option<String>,
    pub moves: Option<MoveText>,
    pub pgn_text: Option<String>,
}

impl GameRecord {
    pub fn white_name(&self) -> &str {
        non_empty(&self.white_player).unwrap_or("White")
    }

    pub fn black_name(&self) -> &str {
        non_empty(&self.black_player).unwrap_or("Black")
    }

    /// "White vs Black" heading used on result cards and the detail view.
    pub fn title(&self) -> String {
        format!("{} vs {}", self.white_name(), self.black_name())
    }

    pub fn result_label(&self) -> &str {
        non_empty(&self.result).unwrap_or("Unknown")
    }

    pub fn date_label(&self) -> &str {
        non_empty(&self.date_played).unwrap_or("Unknown date")
    }

    pub fn opening_label(&self) -> &str {
        non_empty(&self.opening).unwrap_or("Unknown")
    }

    /// Rating formatted as "(1850)", or empty when unrated.
    pub fn elo_label(elo: Option<i32>) -> String {
        elo.map(|e| format!("({e})")).unwrap_or_default()
    }

    /// Fill columns the backend left out from the PGN tag pairs, if any.
    pub fn fill_from_pgn_headers(&mut self) {
        let Some(text) = non_empty(&self.pgn_text) else {
            return;
        };
        let parsed = pgn::parse_pgn(text);

        let fill = |slot: &mut Option<String>, tag: &str| {
            if non_empty(slot).is_none() {
                if let Some(v) = parsed.header(tag) {
                    *slot = Some(v.to_string());
                }
            }
        };
        fill(&mut self.white_player, "White");
        fill(&mut self.black_player, "Black");
        fill(&mut self.result, "Result");
        fill(&mut self.date_played, "Date");
        fill(&mut self.time_control, "TimeControl");
        fill(&mut self.site, "Site");
        fill(&mut self.opening, "Opening");
        fill(&mut self.termination, "Termination");

        if self.white_elo.is_none() {
            self.white_elo = parsed.header("WhiteElo").and_then(|v| v.parse().ok());
        }
        if self.black_elo.is_none() {
            self.black_elo = parsed.header("BlackElo").and_then(|v| v.parse().ok());
        }
    }

    /// SAN tokens to replay for this game.
    ///
    /// PGN text wins when it yields any move; otherwise the `moves` field is
    /// used. Tokens are not validated here.
    pub fn move_tokens(&self) -> Vec<String> {
        if let Some(text) = non_empty(&self.pgn_text) {
            let tokens = pgn::extract_pgn_moves(text);
            if !tokens.is_empty() {
                return tokens;
            }
            tracing::debug!("PGN text produced no moves, falling back to move list");
        }

        match &self.moves {
            Some(MoveText::List(list)) => list
                .iter()
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect(),
            Some(MoveText::Text(text)) => pgn::split_move_text(text),
            None => Vec::new(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
