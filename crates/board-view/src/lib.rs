//! Board rendering, move animation and move navigation for the game detail view.

pub mod animator;
pub mod keys;
pub mod navigator;
pub mod render;
pub mod stage;

pub use animator::{BoardGeometry, MoveAnimator, Point, Slide};
pub use keys::{Key, NavCommand};
pub use navigator::{MoveNavigator, MoveRow, NavigatorOptions};
pub use render::{render_board, thumbnail, BoardView, Orientation, Shade, SquareView};
pub use stage::{Frame, MoveControls, Stage};
