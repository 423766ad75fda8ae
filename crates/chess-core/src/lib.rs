pub mod game_data;
pub mod pgn;
pub mod position;
pub mod replay;

pub use game_data::{GameRecord, MoveText};
pub use position::PositionSnapshot;
pub use replay::{AppliedMove, ReplayError, ReplayReport, RulesEngine, ShakmatyEngine};
