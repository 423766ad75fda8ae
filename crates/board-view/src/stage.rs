use std::future::Future;

use crate::animator::{BoardGeometry, Slide};
use crate::render::BoardView;

/// Which navigation buttons are usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveControls {
    pub first: bool,
    pub previous: bool,
    pub next: bool,
    pub last: bool,
}

impl MoveControls {
    pub const DISABLED: Self = Self {
        first: false,
        previous: false,
        next: false,
        last: false,
    };

    pub fn for_cursor(cursor: usize, total: usize) -> Self {
        Self {
            first: cursor > 0,
            previous: cursor > 0,
            next: cursor < total,
            last: cursor < total,
        }
    }
}

/// Everything a render target needs to redraw the detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub view: BoardView,
    pub cursor: usize,
    pub total: usize,
    /// Index into the move list of the last applied ply.
    pub highlighted: Option<usize>,
    pub controls: MoveControls,
}

/// Render target driven by the move navigator.
pub trait Stage {
    fn geometry(&self) -> BoardGeometry;

    fn render(&mut self, frame: &Frame);

    /// Run one slide; the returned future resolves once it has finished.
    fn animate(&mut self, slide: &Slide) -> impl Future<Output = ()>;
}
