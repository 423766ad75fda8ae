//! Immutable 8x8 view of a position, decoupled from any rules engine state.

use shakmaty::{Board, Color, File, Piece, Rank, Role, Square};

/// Row 0 is rank 8, column 0 is file a, the order boards are drawn in from
/// White's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionSnapshot {
    cells: [[Option<Piece>; 8]; 8],
}

impl PositionSnapshot {
    pub fn empty() -> Self {
        Self { cells: [[None; 8]; 8] }
    }

    pub fn initial() -> Self {
        Self::from_board(&Board::default())
    }

    pub fn from_board(board: &Board) -> Self {
        let mut snapshot = Self::empty();
        for row in 0..8 {
            for col in 0..8 {
                snapshot.cells[row][col] = board.piece_at(square_at(row, col));
            }
        }
        snapshot
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<Piece> {
        self.cells.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        let (row, col) = row_col(square);
        self.cells[row][col]
    }

    pub fn piece_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    /// FEN piece placement field ("rnbqkbnr/pppppppp/8/...").
    pub fn placement(&self) -> String {
        let mut out = String::with_capacity(72);
        for (row, cells) in self.cells.iter().enumerate() {
            let mut empty = 0;
            for cell in cells {
                match cell {
                    Some(piece) => {
                        if empty > 0 {
                            out.push_str(&empty.to_string());
                            empty = 0;
                        }
                        out.push(piece.char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
            if row < 7 {
                out.push('/');
            }
        }
        out
    }
}

impl Default for PositionSnapshot {
    fn default() -> Self {
        Self::initial()
    }
}

/// (row, col) of a square in White-side drawing order.
pub fn row_col(square: Square) -> (usize, usize) {
    (7 - square.rank() as usize, square.file() as usize)
}

pub fn square_at(row: usize, col: usize) -> Square {
    Square::from_coords(File::new(col as u32), Rank::new(7 - row as u32))
}

/// Unicode chess glyph: hollow figurines for White, solid for Black.
pub fn glyph(piece: Piece) -> char {
    match (piece.color, piece.role) {
        (Color::White, Role::King) => '♔',
        (Color::White, Role::Queen) => '♕',
        (Color::White, Role::Rook) => '♖',
        (Color::White, Role::Bishop) => '♗',
        (Color::White, Role::Knight) => '♘',
        (Color::White, Role::Pawn) => '♙',
        (Color::Black, Role::King) => '♚',
        (Color::Black, Role::Queen) => '♛',
        (Color::Black, Role::Rook) => '♜',
        (Color::Black, Role::Bishop) => '♝',
        (Color::Black, Role::Knight) => '♞',
        (Color::Black, Role::Pawn) => '♟',
    }
}
