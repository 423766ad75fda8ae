//! Slide geometry for a single ply.
//!
//! Offsets are measured from the board's own top-left corner, so the result
//! does not depend on where the board sits on screen. A flipped board is drawn
//! rotated by 180°, which reflects both axes; the moving glyph is
//! counter-rotated so it stays upright.

use std::time::Duration;

use chess_core::position::{self, PositionSnapshot};
use chess_core::AppliedMove;
use shakmaty::{Piece, Role, Square};

use crate::render::Orientation;

pub const DEFAULT_SLIDE_DURATION: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Bounding box of the rendered board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardGeometry {
    pub width: f32,
    pub height: f32,
}

impl BoardGeometry {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    fn square_size(&self) -> (f32, f32) {
        (self.width / 8.0, self.height / 8.0)
    }

    /// Top-left corner of `square`, or None when the board has no area to
    /// place squares in.
    pub fn square_origin(&self, square: Square, orientation: Orientation) -> Option<Point> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return None;
        }
        let (sw, sh) = self.square_size();
        let (row, col) = position::row_col(square);
        let unflipped = Point {
            x: col as f32 * sw,
            y: row as f32 * sh,
        };
        Some(match orientation {
            Orientation::Normal => unflipped,
            Orientation::Flipped => Point {
                x: self.width - sw - unflipped.x,
                y: self.height - sh - unflipped.y,
            },
        })
    }
}

/// One scheduled glyph transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    pub piece: Piece,
    pub glyph: char,
    pub from: Square,
    pub to: Square,
    pub start: Point,
    pub end: Point,
    /// Squares whose glyphs stay hidden until the post-slide re-render.
    pub hidden: Vec<Square>,
    pub rotation_deg: f32,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct MoveAnimator {
    duration: Duration,
}

impl Default for MoveAnimator {
    fn default() -> Self {
        Self::new(DEFAULT_SLIDE_DURATION)
    }
}

impl MoveAnimator {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Slide for `mv` played from `before`. None means there is nothing to
    /// animate and the caller should just re-render.
    pub fn forward(
        &self,
        mv: &AppliedMove,
        before: &PositionSnapshot,
        orientation: Orientation,
        geometry: BoardGeometry,
    ) -> Option<Slide> {
        let piece = before.piece_at(mv.from)?;
        let mut hidden = vec![mv.from];
        if before.piece_at(mv.to).is_some() {
            hidden.push(mv.to);
        } else if mv.role == Role::Pawn && mv.capture.is_some() {
            // En passant: the captured pawn sits beside the origin square.
            hidden.push(Square::from_coords(mv.to.file(), mv.from.rank()));
        }
        self.slide(piece, mv.from, mv.to, hidden, orientation, geometry)
    }

    /// Reverse slide for taking back `mv`, where `after` is the position the
    /// move produced.
    pub fn backward(
        &self,
        mv: &AppliedMove,
        after: &PositionSnapshot,
        orientation: Orientation,
        geometry: BoardGeometry,
    ) -> Option<Slide> {
        let piece = after.piece_at(mv.to)?;
        self.slide(piece, mv.to, mv.from, vec![mv.to], orientation, geometry)
    }

    fn slide(
        &self,
        piece: Piece,
        from: Square,
        to: Square,
        hidden: Vec<Square>,
        orientation: Orientation,
        geometry: BoardGeometry,
    ) -> Option<Slide> {
        let start = geometry.square_origin(from, orientation)?;
        let end = geometry.square_origin(to, orientation)?;
        Some(Slide {
            piece,
            glyph: position::glyph(piece),
            from,
            to,
            start,
            end,
            hidden,
            rotation_deg: if orientation.is_flipped() { 180.0 } else { 0.0 },
            duration: self.duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::{RulesEngine, ShakmatyEngine};

    fn board() -> BoardGeometry {
        BoardGeometry::new(400.0, 400.0)
    }

    #[test]
    fn test_forward_slide_offsets() {
        let mut engine = ShakmatyEngine::new();
        let before = engine.snapshot();
        let mv = engine.play_san("e4").unwrap();

        let slide = MoveAnimator::default()
            .forward(&mv, &before, Orientation::Normal, board())
            .unwrap();
        assert_eq!(slide.glyph, '♙');
        assert_eq!(slide.start, Point { x: 200.0, y: 300.0 });
        assert_eq!(slide.end, Point { x: 200.0, y: 200.0 });
        assert_eq!(slide.hidden, vec![Square::E2]);
        assert_eq!(slide.rotation_deg, 0.0);
        assert_eq!(slide.duration, DEFAULT_SLIDE_DURATION);
    }

    #[test]
    fn test_flipped_slide_reflects_and_counter_rotates() {
        let mut engine = ShakmatyEngine::new();
        let before = engine.snapshot();
        let mv = engine.play_san("Nf3").unwrap();

        let slide = MoveAnimator::default()
            .forward(&mv, &before, Orientation::Flipped, board())
            .unwrap();
        // g1 is drawn in the top row, second column from the left.
        assert_eq!(slide.start, Point { x: 50.0, y: 0.0 });
        assert_eq!(slide.end, Point { x: 100.0, y: 100.0 });
        assert_eq!(slide.rotation_deg, 180.0);
    }

    #[test]
    fn test_capture_hides_destination_glyph() {
        let mut engine = ShakmatyEngine::new();
        engine.play_san("e4").unwrap();
        engine.play_san("d5").unwrap();
        let before = engine.snapshot();
        let mv = engine.play_san("exd5").unwrap();

        let slide = MoveAnimator::default()
            .forward(&mv, &before, Orientation::Normal, board())
            .unwrap();
        assert_eq!(slide.hidden, vec![Square::E4, Square::D5]);
    }

    #[test]
    fn test_en_passant_hides_captured_pawn() {
        let mut engine = ShakmatyEngine::new();
        for san in ["e4", "a6", "e5", "d5"] {
            engine.play_san(san).unwrap();
        }
        let before = engine.snapshot();
        let mv = engine.play_san("exd6").unwrap();

        let slide = MoveAnimator::default()
            .forward(&mv, &before, Orientation::Normal, board())
            .unwrap();
        assert_eq!(slide.to, Square::D6);
        assert_eq!(slide.hidden, vec![Square::E5, Square::D5]);
    }

    #[test]
    fn test_missing_source_or_geometry_is_noop() {
        let mut engine = ShakmatyEngine::new();
        let mv = engine.play_san("e4").unwrap();
        let empty = PositionSnapshot::empty();
        let animator = MoveAnimator::default();

        assert!(animator
            .forward(&mv, &empty, Orientation::Normal, board())
            .is_none());
        assert!(animator
            .forward(
                &mv,
                &PositionSnapshot::initial(),
                Orientation::Normal,
                BoardGeometry::new(0.0, 400.0)
            )
            .is_none());
    }
}
