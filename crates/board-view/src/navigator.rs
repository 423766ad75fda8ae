//! Move navigator: a cursor over one game's move list.
//!
//! Invariant: the engine position always equals the starting position with the
//! first `cursor` moves applied. Every step updates engine and cursor together
//! before awaiting the stage, so an abandoned transition still leaves a
//! consistent model behind.

use std::time::Duration;

use chess_core::{GameRecord, ReplayReport, RulesEngine};
use tracing::{debug, warn};

use crate::animator::{MoveAnimator, DEFAULT_SLIDE_DURATION};
use crate::keys::{self, Key, NavCommand};
use crate::render::{self, BoardView, Orientation};
use crate::stage::{Frame, MoveControls, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigatorOptions {
    /// Slide pieces back when stepping backwards. Off by default: backward
    /// steps re-render without animation.
    pub animate_backward: bool,
    pub slide_duration: Duration,
}

impl Default for NavigatorOptions {
    fn default() -> Self {
        Self {
            animate_backward: false,
            slide_duration: DEFAULT_SLIDE_DURATION,
        }
    }
}

/// One line of the move list: "12. Nf3 Nc6".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRow {
    pub number: usize,
    pub white: String,
    pub black: Option<String>,
}

pub struct MoveNavigator<E: RulesEngine> {
    engine: E,
    game_moves: Vec<String>,
    cursor: usize,
    orientation: Orientation,
    animator: MoveAnimator,
    options: NavigatorOptions,
    replay: ReplayReport,
}

impl<E: RulesEngine> MoveNavigator<E> {
    /// Open `record` at the starting position.
    pub fn open(engine: E, record: &GameRecord, options: NavigatorOptions) -> Self {
        Self::from_tokens(engine, &record.move_tokens(), options)
    }

    /// Derive the move list by replaying `tokens` once; rejected tokens are
    /// dropped from the list.
    pub fn from_tokens(mut engine: E, tokens: &[String], options: NavigatorOptions) -> Self {
        let replay = engine.load_tokens(tokens);
        if !replay.skipped.is_empty() {
            warn!(
                applied = replay.applied,
                skipped = replay.skipped.len(),
                "Game replay skipped invalid moves"
            );
        }
        let game_moves = engine.history();
        engine.reset();

        Self {
            engine,
            game_moves,
            cursor: 0,
            orientation: Orientation::Normal,
            animator: MoveAnimator::new(options.slide_duration),
            options,
            replay,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of plies (N).
    pub fn len(&self) -> usize {
        self.game_moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.game_moves.is_empty()
    }

    pub fn game_moves(&self) -> &[String] {
        &self.game_moves
    }

    pub fn replay_report(&self) -> &ReplayReport {
        &self.replay
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn view(&self) -> BoardView {
        render::render_board(&self.engine.snapshot(), self.orientation)
    }

    pub fn controls(&self) -> MoveControls {
        MoveControls::for_cursor(self.cursor, self.len())
    }

    pub fn highlighted_ply(&self) -> Option<usize> {
        self.cursor.checked_sub(1)
    }

    pub fn move_rows(&self) -> Vec<MoveRow> {
        self.game_moves
            .chunks(2)
            .enumerate()
            .map(|(i, pair)| MoveRow {
                number: i + 1,
                white: pair[0].clone(),
                black: pair.get(1).cloned(),
            })
            .collect()
    }

    pub fn frame(&self) -> Frame {
        self.frame_with(self.controls())
    }

    fn frame_with(&self, controls: MoveControls) -> Frame {
        Frame {
            view: self.view(),
            cursor: self.cursor,
            total: self.len(),
            highlighted: self.highlighted_ply(),
            controls,
        }
    }

    /// Step to `target` one ply at a time, animating forward steps.
    pub async fn go_to_move<S: Stage>(&mut self, target: usize, stage: &mut S) {
        let target = target.min(self.len());
        if target == 0 {
            self.go_to_first_move(stage);
            return;
        }

        while self.cursor < target {
            if !self.step_forward(target, stage).await {
                break;
            }
        }
        while self.cursor > target {
            self.step_backward(target, stage).await;
        }
    }

    async fn step_forward<S: Stage>(&mut self, target: usize, stage: &mut S) -> bool {
        let before = self.engine.snapshot();
        let token = &self.game_moves[self.cursor];
        let mv = match self.engine.play_san(token) {
            Ok(mv) => mv,
            Err(e) => {
                // The list came out of this engine, so this means the engine
                // state drifted; stop rather than skip a ply.
                warn!(cursor = self.cursor, "Forward step rejected: {e}");
                return false;
            }
        };
        self.cursor += 1;
        debug!(cursor = self.cursor, san = %mv.san, "Forward step");

        if let Some(slide) =
            self.animator
                .forward(&mv, &before, self.orientation, stage.geometry())
        {
            stage.animate(&slide).await;
        }
        stage.render(&self.transition_frame(target));
        true
    }

    async fn step_backward<S: Stage>(&mut self, target: usize, stage: &mut S) {
        let after = self.engine.snapshot();
        let Some(mv) = self.engine.undo() else {
            self.cursor = 0;
            return;
        };
        self.cursor -= 1;
        debug!(cursor = self.cursor, san = %mv.san, "Backward step");

        if self.options.animate_backward {
            if let Some(slide) =
                self.animator
                    .backward(&mv, &after, self.orientation, stage.geometry())
            {
                stage.animate(&slide).await;
            }
        }
        stage.render(&self.transition_frame(target));
    }

    /// Controls stay disabled until the last step of a transition lands.
    fn transition_frame(&self, target: usize) -> Frame {
        if self.cursor == target {
            self.frame()
        } else {
            self.frame_with(MoveControls::DISABLED)
        }
    }

    /// Rebuild the position by replaying `[0, target)` with no animation.
    pub fn go_to_move_direct<S: Stage>(&mut self, target: usize, stage: &mut S) {
        let target = target.min(self.len());
        self.engine.reset();
        for token in &self.game_moves[..target] {
            if let Err(e) = self.engine.play_san(token) {
                warn!("Direct replay rejected move: {e}");
                break;
            }
        }
        self.cursor = self.engine.ply();
        stage.render(&self.frame());
    }

    pub async fn next_move<S: Stage>(&mut self, stage: &mut S) {
        if self.cursor < self.len() {
            self.go_to_move(self.cursor + 1, stage).await;
        }
    }

    pub async fn previous_move<S: Stage>(&mut self, stage: &mut S) {
        if self.cursor > 0 {
            self.go_to_move(self.cursor - 1, stage).await;
        }
    }

    pub fn go_to_first_move<S: Stage>(&mut self, stage: &mut S) {
        self.engine.reset();
        self.cursor = 0;
        stage.render(&self.frame());
    }

    pub fn go_to_last_move<S: Stage>(&mut self, stage: &mut S) {
        self.go_to_move_direct(self.len(), stage);
    }

    pub fn flip<S: Stage>(&mut self, stage: &mut S) {
        self.orientation = self.orientation.toggled();
        stage.render(&self.frame());
    }

    pub async fn apply<S: Stage>(&mut self, command: NavCommand, stage: &mut S) {
        match command {
            NavCommand::Previous => self.previous_move(stage).await,
            NavCommand::Next => self.next_move(stage).await,
            NavCommand::First => self.go_to_first_move(stage),
            NavCommand::Last => self.go_to_last_move(stage),
            NavCommand::Flip => self.flip(stage),
        }
    }

    /// Returns false for keys with no binding.
    pub async fn handle_key<S: Stage>(&mut self, key: Key, stage: &mut S) -> bool {
        match keys::command_for(key) {
            Some(command) => {
                self.apply(command, stage).await;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animator::{BoardGeometry, Slide};
    use chess_core::{PositionSnapshot, ShakmatyEngine};

    #[derive(Default)]
    struct RecordingStage {
        frames: Vec<Frame>,
        slides: Vec<Slide>,
    }

    impl Stage for RecordingStage {
        fn geometry(&self) -> BoardGeometry {
            BoardGeometry::new(320.0, 320.0)
        }

        fn render(&mut self, frame: &Frame) {
            self.frames.push(frame.clone());
        }

        async fn animate(&mut self, slide: &Slide) {
            self.slides.push(slide.clone());
        }
    }

    fn navigator(moves: &[&str]) -> MoveNavigator<ShakmatyEngine> {
        let tokens: Vec<String> = moves.iter().map(|s| s.to_string()).collect();
        MoveNavigator::from_tokens(ShakmatyEngine::new(), &tokens, NavigatorOptions::default())
    }

    fn replayed(moves: &[String]) -> PositionSnapshot {
        chess_core::replay::final_position(moves)
    }

    const GAME: &[&str] = &["e4", "e5", "Nf3", "Nc6", "Bb5", "a6", "Bxc6", "dxc6"];

    #[tokio::test]
    async fn test_forward_animates_each_ply_in_order() {
        let mut nav = navigator(GAME);
        let mut stage = RecordingStage::default();

        nav.go_to_move(3, &mut stage).await;

        assert_eq!(nav.cursor(), 3);
        let froms: Vec<_> = stage.slides.iter().map(|s| s.from.to_string()).collect();
        assert_eq!(froms, vec!["e2", "e7", "g1"]);
        assert_eq!(stage.frames.len(), 3);
        assert_eq!(stage.frames[0].controls, MoveControls::DISABLED);
        assert_eq!(stage.frames[2].controls, MoveControls::for_cursor(3, 8));
        assert_eq!(nav.engine().snapshot(), replayed(&nav.game_moves()[..3]));
    }

    #[tokio::test]
    async fn test_backward_undoes_without_slides_by_default() {
        let mut nav = navigator(GAME);
        let mut stage = RecordingStage::default();
        nav.go_to_move_direct(6, &mut stage);

        nav.go_to_move(2, &mut stage).await;

        assert_eq!(nav.cursor(), 2);
        assert!(stage.slides.is_empty());
        assert_eq!(stage.frames.len(), 1 + 4);
        assert_eq!(nav.engine().snapshot(), replayed(&nav.game_moves()[..2]));
    }

    #[tokio::test]
    async fn test_backward_slides_when_enabled() {
        let tokens: Vec<String> = GAME.iter().map(|s| s.to_string()).collect();
        let options = NavigatorOptions {
            animate_backward: true,
            ..Default::default()
        };
        let mut nav = MoveNavigator::from_tokens(ShakmatyEngine::new(), &tokens, options);
        let mut stage = RecordingStage::default();
        nav.go_to_move_direct(2, &mut stage);

        nav.previous_move(&mut stage).await;

        assert_eq!(nav.cursor(), 1);
        assert_eq!(stage.slides.len(), 1);
        assert_eq!(stage.slides[0].from.to_string(), "e5");
        assert_eq!(stage.slides[0].to.to_string(), "e7");
        assert_eq!(nav.engine().snapshot(), replayed(&nav.game_moves()[..1]));
    }

    #[tokio::test]
    async fn test_target_zero_resets_directly() {
        let mut nav = navigator(GAME);
        let mut stage = RecordingStage::default();
        nav.go_to_move_direct(5, &mut stage);

        nav.go_to_move(0, &mut stage).await;

        assert_eq!(nav.cursor(), 0);
        assert!(stage.slides.is_empty());
        assert_eq!(nav.engine().snapshot(), PositionSnapshot::initial());
    }

    #[tokio::test]
    async fn test_boundaries_are_noops() {
        let mut nav = navigator(&["e4", "e5"]);
        let mut stage = RecordingStage::default();

        nav.previous_move(&mut stage).await;
        assert_eq!(nav.cursor(), 0);
        assert!(stage.frames.is_empty());

        nav.go_to_last_move(&mut stage);
        nav.next_move(&mut stage).await;
        assert_eq!(nav.cursor(), 2);
        assert_eq!(stage.frames.len(), 1);
        assert!(!nav.controls().next);
        assert!(nav.controls().previous);
    }

    #[tokio::test]
    async fn test_out_of_range_target_is_clamped() {
        let mut nav = navigator(&["d4", "d5"]);
        let mut stage = RecordingStage::default();
        nav.go_to_move(10, &mut stage).await;
        assert_eq!(nav.cursor(), 2);
    }

    #[test]
    fn test_move_rows_and_highlight() {
        let nav = navigator(&["e4", "e5", "Nf3"]);
        let rows = nav.move_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].number, 1);
        assert_eq!(rows[0].black.as_deref(), Some("e5"));
        assert_eq!(rows[1].white, "Nf3");
        assert_eq!(rows[1].black, None);
        assert_eq!(nav.highlighted_ply(), None);
    }

    #[tokio::test]
    async fn test_keys_drive_navigation_and_flip() {
        let mut nav = navigator(GAME);
        let mut stage = RecordingStage::default();

        assert!(nav.handle_key(Key::Right, &mut stage).await);
        assert!(nav.handle_key(Key::Down, &mut stage).await);
        assert_eq!(nav.cursor(), GAME.len());
        assert!(nav.handle_key(Key::Char('f'), &mut stage).await);
        assert_eq!(nav.orientation(), Orientation::Flipped);
        assert!(nav.handle_key(Key::Up, &mut stage).await);
        assert_eq!(nav.cursor(), 0);
        assert!(!nav.handle_key(Key::Char('q'), &mut stage).await);
    }
}
