//! Movetext extraction: PGN via `pgn-reader`, bare move strings via regex filtering.

use std::ops::ControlFlow;
use std::sync::LazyLock;

use pgn_reader::{RawTag, Reader, SanPlus, Skip, Visitor};
use regex::Regex;

/// Leading move number on a token: "12." or "12..." (black continuation).
static MOVE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.+").expect("valid move number regex"));

/// Game termination markers that can trail the movetext.
static RESULT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(1-0|0-1|1/2-1/2|\*)$").expect("valid result regex"));

/// Headers and moves read from one PGN game.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPgn {
    pub headers: Vec<(String, String)>,
    pub moves: Vec<String>,
}

impl ParsedPgn {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty() && *v != "?")
    }
}

/// Visitor that keeps mainline SAN tokens as written; legality is left to the
/// rules engine so invalid moves surface during replay.
#[derive(Default)]
struct MovetextCollector {
    parsed: ParsedPgn,
}

impl Visitor for MovetextCollector {
    type Tags = ();
    type Movetext = ();
    type Output = ();

    fn begin_tags(&mut self) -> ControlFlow<(), ()> {
        ControlFlow::Continue(())
    }

    fn tag(&mut self, _tags: &mut (), name: &[u8], value: RawTag<'_>) -> ControlFlow<()> {
        let key = String::from_utf8_lossy(name).into_owned();
        let value = value.decode_utf8_lossy().into_owned();
        self.parsed.headers.push((key, value));
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, _tags: ()) -> ControlFlow<(), ()> {
        ControlFlow::Continue(())
    }

    fn san(&mut self, _movetext: &mut (), san_plus: SanPlus) -> ControlFlow<()> {
        self.parsed.moves.push(san_plus.san.to_string());
        ControlFlow::Continue(())
    }

    /// Side lines are not part of the game as played.
    fn begin_variation(&mut self, _movetext: &mut ()) -> ControlFlow<(), Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn end_game(&mut self, _movetext: ()) {}
}

/// Parse the first game in `pgn`. Unreadable input yields an empty result.
pub fn parse_pgn(pgn: &str) -> ParsedPgn {
    let mut collector = MovetextCollector::default();
    let mut reader = Reader::new(pgn.as_bytes());

    match reader.read_game(&mut collector) {
        Ok(_) => collector.parsed,
        Err(e) => {
            tracing::warn!("Failed to read PGN: {e}");
            ParsedPgn::default()
        }
    }
}

/// SAN tokens of the first game's mainline.
pub fn extract_pgn_moves(pgn: &str) -> Vec<String> {
    parse_pgn(pgn).moves
}

/// Split a bare move string ("1. e4 e5 2.Nf3 Nc6 1-0") into SAN tokens.
///
/// Move numbers and result markers are dropped. Anything else is kept as a
/// token, including garbage, so the replay can report and skip it.
pub fn split_move_text(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter_map(|raw| {
            let token = MOVE_NUMBER_RE.replace(raw, "");
            let token = token.trim();
            if token.is_empty() || RESULT_RE.is_match(token) {
                None
            } else {
                Some(token.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pgn_basic() {
        let pgn = r#"[White "Player1"]
[Black "Player2"]
[Result "1-0"]
[Date "2025.01.15"]
[TimeControl "600"]

1. e4 e5 2. Nf3 {best by test} Nc6 (2... d6) 1-0"#;

        let parsed = parse_pgn(pgn);
        assert_eq!(parsed.header("White"), Some("Player1"));
        assert_eq!(parsed.header("Result"), Some("1-0"));
        assert_eq!(parsed.header("Missing"), None);
        assert_eq!(parsed.moves, vec!["e4", "e5", "Nf3", "Nc6"]);
    }

    #[test]
    fn test_variations_are_skipped() {
        assert_eq!(
            extract_pgn_moves("1. e4 e5 2. Nf3 (2. f4 exf4 (2... d5)) Nc6 3. Bb5 *"),
            vec!["e4", "e5", "Nf3", "Nc6", "Bb5"]
        );
    }

    #[test]
    fn test_split_move_text() {
        assert_eq!(
            split_move_text("1. e4 e5 2.Nf3 Nc6 3... a6 1/2-1/2"),
            vec!["e4", "e5", "Nf3", "Nc6", "a6"]
        );
        assert_eq!(split_move_text("e4 ?? *"), vec!["e4", "??"]);
        assert!(split_move_text("   ").is_empty());
    }
}
