//! Board renderer: a pure projection from a position snapshot to a square grid.

use chess_core::position::{self, PositionSnapshot};
use chess_core::replay;
use chess_core::GameRecord;
use shakmaty::{Piece, Square};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// White at the bottom.
    #[default]
    Normal,
    /// Board rotated 180°, Black at the bottom.
    Flipped,
}

impl Orientation {
    pub fn toggled(self) -> Self {
        match self {
            Orientation::Normal => Orientation::Flipped,
            Orientation::Flipped => Orientation::Normal,
        }
    }

    pub fn is_flipped(self) -> bool {
        self == Orientation::Flipped
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shade {
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquareView {
    pub square: Square,
    /// Display row/column, 0..8 from the top-left corner as drawn.
    pub row: usize,
    pub col: usize,
    pub shade: Shade,
    pub piece: Option<Piece>,
}

impl SquareView {
    pub fn glyph(&self) -> Option<char> {
        self.piece.map(position::glyph)
    }
}

/// 64 squares in display order (row-major from the top-left).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    pub orientation: Orientation,
    pub squares: Vec<SquareView>,
}

impl BoardView {
    pub fn at(&self, row: usize, col: usize) -> Option<&SquareView> {
        if row < 8 && col < 8 {
            self.squares.get(row * 8 + col)
        } else {
            None
        }
    }

    pub fn find(&self, square: Square) -> Option<&SquareView> {
        self.squares.iter().find(|s| s.square == square)
    }

    /// Terminal rendering with rank and file labels.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for row in 0..8 {
            let Some(first) = self.at(row, 0) else {
                continue;
            };
            out.push_str(&format!("{} ", first.square.rank().char()));
            for col in 0..8 {
                if let Some(sq) = self.at(row, col) {
                    let c = sq.glyph().unwrap_or(match sq.shade {
                        Shade::Light => '·',
                        Shade::Dark => ':',
                    });
                    out.push(c);
                    out.push(' ');
                }
            }
            out.push('\n');
        }
        out.push_str("  ");
        for col in 0..8 {
            if let Some(sq) = self.at(7, col) {
                out.push(sq.square.file().char());
                out.push(' ');
            }
        }
        out.push('\n');
        out
    }
}

/// Display (row, col) of a square for the given orientation.
pub fn display_cell(square: Square, orientation: Orientation) -> (usize, usize) {
    let (row, col) = position::row_col(square);
    match orientation {
        Orientation::Normal => (row, col),
        Orientation::Flipped => (7 - row, 7 - col),
    }
}

pub fn render_board(snapshot: &PositionSnapshot, orientation: Orientation) -> BoardView {
    let mut squares = Vec::with_capacity(64);
    for row in 0..8 {
        for col in 0..8 {
            let (board_row, board_col) = match orientation {
                Orientation::Normal => (row, col),
                Orientation::Flipped => (7 - row, 7 - col),
            };
            squares.push(SquareView {
                square: position::square_at(board_row, board_col),
                row,
                col,
                shade: if (row + col) % 2 == 0 {
                    Shade::Light
                } else {
                    Shade::Dark
                },
                piece: snapshot.cell(board_row, board_col),
            });
        }
    }
    BoardView {
        orientation,
        squares,
    }
}

/// Static final-position board for a result card.
pub fn thumbnail(record: &GameRecord) -> BoardView {
    let snapshot = replay::final_position(&record.move_tokens());
    render_board(&snapshot, Orientation::Normal)
}
