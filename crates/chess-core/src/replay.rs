//! Rules engine seam and a shakmaty-backed implementation with undo.

use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{Chess, Color, EnPassantMode, File, Move, Piece, Position, Role, Square};
use thiserror::Error;

use crate::position::PositionSnapshot;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("Invalid SAN '{0}'")]
    InvalidToken(String),

    #[error("Illegal move '{0}'")]
    IllegalMove(String),
}

/// One ply as applied by the engine, with the squares a renderer needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    pub san: String,
    pub from: Square,
    /// Destination of the moving piece; for castling this is the king's square.
    pub to: Square,
    pub role: Role,
    pub color: Color,
    pub capture: Option<Role>,
    pub promotion: Option<Role>,
}

impl AppliedMove {
    pub fn piece(&self) -> Piece {
        Piece {
            color: self.color,
            role: self.role,
        }
    }
}

/// Outcome of replaying a token list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub applied: usize,
    /// (token index, error) for every token the engine rejected.
    pub skipped: Vec<(usize, ReplayError)>,
}

/// The operations the viewer needs from a chess rules engine.
pub trait RulesEngine {
    /// Back to the standard starting position with an empty history.
    fn reset(&mut self);

    /// Parse and apply one SAN token.
    fn play_san(&mut self, token: &str) -> Result<AppliedMove, ReplayError>;

    /// Take back the last applied move.
    fn undo(&mut self) -> Option<AppliedMove>;

    /// SAN of every applied move, oldest first.
    fn history(&self) -> Vec<String>;

    fn piece_at(&self, square: Square) -> Option<Piece>;

    fn snapshot(&self) -> PositionSnapshot;

    fn fen(&self) -> String;

    fn ply(&self) -> usize {
        self.history().len()
    }

    /// Reset, then apply `tokens` in order. Rejected tokens are logged and
    /// skipped; replay continues with the next token.
    fn load_tokens(&mut self, tokens: &[String]) -> ReplayReport {
        self.reset();
        let mut report = ReplayReport::default();

        for (i, token) in tokens.iter().enumerate() {
            match self.play_san(token) {
                Ok(_) => report.applied += 1,
                Err(e) => {
                    tracing::warn!(index = i, "Skipping move during replay: {e}");
                    report.skipped.push((i, e));
                }
            }
        }

        report
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShakmatyEngine {
    position: Chess,
    undo_stack: Vec<(Chess, AppliedMove)>,
}

impl ShakmatyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }
}

impl RulesEngine for ShakmatyEngine {
    fn reset(&mut self) {
        self.position = Chess::default();
        self.undo_stack.clear();
    }

    fn play_san(&mut self, token: &str) -> Result<AppliedMove, ReplayError> {
        // Annotation glyphs ("e4!", "Qxf7??") are not part of SAN.
        let cleaned = token.trim().trim_end_matches(['!', '?']);
        let san_plus: SanPlus = cleaned
            .parse()
            .map_err(|_| ReplayError::InvalidToken(token.to_string()))?;

        let mv = san_plus
            .san
            .to_move(&self.position)
            .map_err(|_| ReplayError::IllegalMove(token.to_string()))?;

        let applied = describe_move(&self.position, &mv, san_plus.to_string())
            .ok_or_else(|| ReplayError::IllegalMove(token.to_string()))?;

        let before = self.position.clone();
        self.position.play_unchecked(mv);
        self.undo_stack.push((before, applied.clone()));

        Ok(applied)
    }

    fn undo(&mut self) -> Option<AppliedMove> {
        let (before, applied) = self.undo_stack.pop()?;
        self.position = before;
        Some(applied)
    }

    fn history(&self) -> Vec<String> {
        self.undo_stack.iter().map(|(_, m)| m.san.clone()).collect()
    }

    fn ply(&self) -> usize {
        self.undo_stack.len()
    }

    fn piece_at(&self, square: Square) -> Option<Piece> {
        self.position.board().piece_at(square)
    }

    fn snapshot(&self) -> PositionSnapshot {
        PositionSnapshot::from_board(self.position.board())
    }

    fn fen(&self) -> String {
        Fen::from_position(&self.position, EnPassantMode::Legal).to_string()
    }
}

fn describe_move(pos: &Chess, mv: &Move, san: String) -> Option<AppliedMove> {
    let color = pos.turn();
    match mv {
        Move::Normal {
            role,
            from,
            capture,
            to,
            promotion,
        } => Some(AppliedMove {
            san,
            from: *from,
            to: *to,
            role: *role,
            color,
            capture: *capture,
            promotion: *promotion,
        }),
        Move::EnPassant { from, to } => Some(AppliedMove {
            san,
            from: *from,
            to: *to,
            role: Role::Pawn,
            color,
            capture: Some(Role::Pawn),
            promotion: None,
        }),
        Move::Castle { king, rook } => {
            let to_file = if rook.file() > king.file() { 6u32 } else { 2u32 };
            Some(AppliedMove {
                san,
                from: *king,
                to: Square::from_coords(File::new(to_file), king.rank()),
                role: Role::King,
                color,
                capture: None,
                promotion: None,
            })
        }
        _ => None,
    }
}

/// Final position after replaying `tokens` from the start, skipping rejects.
pub fn final_position(tokens: &[String]) -> PositionSnapshot {
    let mut engine = ShakmatyEngine::new();
    engine.load_tokens(tokens);
    engine.snapshot()
}
