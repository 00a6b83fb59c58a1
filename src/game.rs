//! Core game state and logic
//!
//! The phase machine runs one turn cycle per piece:
//!
//! ```text
//! create -> falling -> lock -> check filled rows -> clearing
//!    ^                              |                  |
//!    |                              v                  v
//!    +------------------------ check empty rows <-> filling
//! ```
//!
//! Instantaneous phases are run to completion right away; `falling`,
//! `clearing` and `filling` wait on timers or jobs driven by [`Game::update`].

use crate::animation::{RowClearJob, RowFillJob};
use crate::bag::Bag;
use crate::matrix::{Cell, Direction, Matrix, TSpin, to_display};
use crate::piece::Piece;
use crate::score::{ClearResult, Score, ScoringRule};
use crate::settings::Settings;
use crate::tetromino::{Coord, PieceType, RotationDirection};
use crate::timer::Timer;
use serde::{Deserialize, Serialize};
use std::task::Poll;
use std::time::Duration;
use tracing::{debug, info};

/// Upper bound on timer firings handled by a single `update`
const MAX_STEPS_PER_UPDATE: usize = 256;

/// Runtime configuration for a game
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub start_level: u32,
    pub preview_count: usize,
    pub scoring: ScoringRule,
    /// Fixed bag seed; every new game replays the same sequence
    pub seed: Option<u64>,
    pub lock_delay: Duration,
    pub clear_step: Duration,
    pub fill_step: Duration,
    pub callout: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Settings::default().game_config()
    }
}

/// Phase of the turn cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatrixPhase {
    #[default]
    None,
    TetriminoCreate,
    TetriminoFalling,
    TetriminoLock,
    CheckIsRowFilled,
    RowFilledClearing,
    CheckIsRowEmpty,
    RowEmptyFilling,
}

/// Game state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameState {
    /// No game started yet
    #[default]
    Ready,
    Playing,
    Paused,
    GameOver,
}

/// Input actions the game can process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    SoftDrop,
    HardDrop,
    RotateCW,
    RotateCCW,
    Hold,
    Pause,
}

/// Accepted moves of the current piece, for T-spin eligibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    Left,
    Right,
    Down,
    HardDrop,
    Rotate,
}

/// Why a game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    /// No room to spawn the next piece
    BlockOut,
    /// A piece locked entirely above the display zone
    LockOut,
}

/// Things the host may want to react to
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Spawned(PieceType),
    Locked { piece: Piece, tspin: TSpin },
    LinesCleared { rows: Vec<i32>, result: ClearResult },
    TSpin { tspin: TSpin, lines: u32 },
    LevelUp(u32),
    GameOver { reason: GameOverReason },
}

/// Transient text shown where a T-spin landed
#[derive(Debug, Clone, PartialEq)]
pub struct TSpinCallout {
    pub text: String,
    /// The piece as it was just before locking
    pub piece: Piece,
}

/// The main game struct
pub struct Game {
    config: GameConfig,
    matrix: Matrix,
    bag: Bag,
    score: Score,
    phase: MatrixPhase,
    state: GameState,
    /// Held piece (can swap once per lock)
    hold_piece: Option<PieceType>,
    holdable: bool,
    /// Set by a hard drop so the lock delay is skipped
    hard_dropping: bool,
    history: Vec<MoveKind>,
    fall_timer: Timer,
    lock_timer: Timer,
    clear_job: Option<RowClearJob>,
    fill_job: Option<RowFillJob>,
    /// Snapshot of the piece taken just before it locked
    locked_piece: Option<Piece>,
    callout: Option<(TSpinCallout, Timer)>,
    events: Vec<GameEvent>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

impl Game {
    /// Create an idle game. Call [`Game::new_game`] to start playing.
    pub fn new(config: GameConfig) -> Self {
        let bag = Self::fresh_bag(&config);
        let score = Score::new(config.start_level, config.scoring);
        Self {
            config,
            matrix: Matrix::new(),
            bag,
            score,
            phase: MatrixPhase::None,
            state: GameState::Ready,
            hold_piece: None,
            holdable: true,
            hard_dropping: false,
            history: Vec::new(),
            fall_timer: Timer::default(),
            lock_timer: Timer::default(),
            clear_job: None,
            fill_job: None,
            locked_piece: None,
            callout: None,
            events: Vec::new(),
        }
    }

    fn fresh_bag(config: &GameConfig) -> Bag {
        match config.seed {
            Some(seed) => Bag::with_seed(seed, config.preview_count),
            None => Bag::new(config.preview_count),
        }
    }

    /// Reset everything and start a game at `start_level`
    pub fn new_game(&mut self, start_level: u32) {
        self.config.start_level = start_level.max(1);
        self.matrix.reset();
        self.bag = Self::fresh_bag(&self.config);
        self.score = Score::new(self.config.start_level, self.config.scoring);
        self.hold_piece = None;
        self.holdable = true;
        self.hard_dropping = false;
        self.history.clear();
        self.fall_timer.cancel();
        self.lock_timer.cancel();
        self.clear_job = None;
        self.fill_job = None;
        self.locked_piece = None;
        self.callout = None;
        self.events.clear();

        info!(start_level = self.config.start_level, "new game");
        self.state = GameState::Playing;
        self.phase = MatrixPhase::TetriminoCreate;
        self.run_phases();
    }

    /// Process an action
    pub fn process_action(&mut self, action: Action) {
        match self.state {
            GameState::Paused => {
                if action == Action::Pause {
                    self.resume();
                }
            }
            GameState::Playing => match action {
                Action::MoveLeft => {
                    self.move_left();
                }
                Action::MoveRight => {
                    self.move_right();
                }
                Action::SoftDrop => {
                    self.soft_drop();
                }
                Action::HardDrop => {
                    self.hard_drop();
                }
                Action::RotateCW => {
                    self.rotate_cw();
                }
                Action::RotateCCW => {
                    self.rotate_ccw();
                }
                Action::Hold => {
                    self.hold();
                }
                Action::Pause => self.pause(),
            },
            GameState::Ready | GameState::GameOver => {}
        }
    }

    /// Advance timers and pending jobs by `elapsed` (call every frame)
    pub fn update(&mut self, elapsed: Duration) {
        if self.state != GameState::Playing {
            return;
        }
        self.tick_callout(elapsed);

        let mut budget = elapsed;
        for _ in 0..MAX_STEPS_PER_UPDATE {
            let Some(rest) = self.advance_phase(budget) else {
                break;
            };
            budget = rest;
            self.run_phases();
            if self.state != GameState::Playing {
                break;
            }
        }
    }

    fn tick_callout(&mut self, elapsed: Duration) {
        if let Some((_, timer)) = &mut self.callout {
            if timer.advance(elapsed).is_some() {
                self.callout = None;
            }
        }
    }

    /// Feed elapsed time to whatever the current phase waits on. Returns the
    /// unused time if something fired.
    fn advance_phase(&mut self, budget: Duration) -> Option<Duration> {
        match self.phase {
            MatrixPhase::TetriminoFalling => {
                if let Some(rest) = self.lock_timer.advance(budget) {
                    self.on_lock_delay();
                    return Some(rest);
                }
                if let Some(rest) = self.fall_timer.advance(budget) {
                    if self.matrix.move_piece(Direction::Down) {
                        self.history.push(MoveKind::Down);
                    }
                    return Some(rest);
                }
                None
            }
            MatrixPhase::RowFilledClearing => {
                let job = self.clear_job.as_mut()?;
                match job.poll(budget, &mut self.matrix) {
                    Poll::Ready(rest) => {
                        self.clear_job = None;
                        self.set_phase(MatrixPhase::CheckIsRowEmpty);
                        Some(rest)
                    }
                    Poll::Pending => None,
                }
            }
            MatrixPhase::RowEmptyFilling => {
                let job = self.fill_job.as_mut()?;
                match job.poll(budget, &mut self.matrix) {
                    Poll::Ready(rest) => {
                        self.fill_job = None;
                        self.set_phase(MatrixPhase::CheckIsRowEmpty);
                        Some(rest)
                    }
                    Poll::Pending => None,
                }
            }
            _ => None,
        }
    }

    /// Run instantaneous phases until one has to wait
    fn run_phases(&mut self) {
        while self.state == GameState::Playing {
            let proceed = match self.phase {
                MatrixPhase::TetriminoCreate => self.try_spawn(None),
                MatrixPhase::TetriminoFalling => self.settle_falling(),
                MatrixPhase::TetriminoLock => self.lock(),
                MatrixPhase::CheckIsRowFilled => self.check_filled_rows(),
                MatrixPhase::CheckIsRowEmpty => self.check_empty_rows(),
                MatrixPhase::RowFilledClearing | MatrixPhase::RowEmptyFilling => {
                    // Zero-length steps complete without waiting for a tick
                    self.advance_phase(Duration::ZERO).is_some()
                }
                MatrixPhase::None => false,
            };
            if !proceed {
                break;
            }
        }
    }

    fn set_phase(&mut self, phase: MatrixPhase) {
        if self.phase == MatrixPhase::TetriminoFalling && phase != MatrixPhase::TetriminoFalling {
            self.fall_timer.cancel();
            self.lock_timer.cancel();
        }
        debug!(from = ?self.phase, to = ?phase, "phase");
        self.phase = phase;
    }

    fn game_over(&mut self, reason: GameOverReason) {
        info!(?reason, score = self.score.points, lines = self.score.lines, "game over");
        self.set_phase(MatrixPhase::None);
        self.fall_timer.cancel();
        self.lock_timer.cancel();
        self.clear_job = None;
        self.fill_job = None;
        self.state = GameState::GameOver;
        self.events.push(GameEvent::GameOver { reason });
    }

    fn try_spawn(&mut self, forced: Option<PieceType>) -> bool {
        let kind = forced.unwrap_or_else(|| self.bag.pop_next());
        if self.matrix.spawn(kind) {
            self.events.push(GameEvent::Spawned(kind));
            self.set_phase(MatrixPhase::TetriminoFalling);
            true
        } else {
            self.game_over(GameOverReason::BlockOut);
            false
        }
    }

    /// Re-evaluate the falling piece: grounded pieces wait on the lock
    /// delay, airborne pieces on gravity.
    fn settle_falling(&mut self) -> bool {
        let cells = self
            .matrix
            .active_cells()
            .expect("falling phase always has an active piece");

        if self.matrix.nearby_collision(&cells).bottom {
            self.fall_timer.cancel();
            if self.hard_dropping {
                self.lock_timer.cancel();
                return self.on_lock_delay();
            }
            self.lock_timer.arm_if_idle(self.config.lock_delay);
        } else {
            self.lock_timer.cancel();
            self.fall_timer.arm_if_idle(self.score.fall_delay());
        }
        false
    }

    fn on_lock_delay(&mut self) -> bool {
        let cells = self
            .matrix
            .active_cells()
            .expect("lock delay only runs with an active piece");
        if self.matrix.is_lock_out(&cells) {
            self.game_over(GameOverReason::LockOut);
            return false;
        }
        self.set_phase(MatrixPhase::TetriminoLock);
        true
    }

    fn lock(&mut self) -> bool {
        self.holdable = true;
        self.hard_dropping = false;
        self.locked_piece = Some(self.matrix.lock_piece_into_grid());
        self.set_phase(MatrixPhase::CheckIsRowFilled);
        true
    }

    fn check_filled_rows(&mut self) -> bool {
        let piece = self
            .locked_piece
            .take()
            .expect("row check follows a lock");
        let rotated_last = self.history.last() == Some(&MoveKind::Rotate);
        let tspin = self.matrix.classify_t_spin(&piece, rotated_last);
        let rows = self.matrix.filled_rows();
        self.events.push(GameEvent::Locked { piece, tspin });

        self.history.clear();
        self.matrix.reset_kick_memory();

        if rows.is_empty() {
            if tspin != TSpin::None {
                let result = self.score.add_clear(tspin, 0);
                self.show_callout(&result, piece);
            }
            self.score.reset_combo();
            self.set_phase(MatrixPhase::TetriminoCreate);
            return true;
        }

        let result = self.score.add_clear(tspin, rows.len() as u32);
        debug!(?rows, points = result.points, action = %result.action, "rows filled");
        if tspin != TSpin::None {
            self.show_callout(&result, piece);
        }
        if result.level_up {
            self.events.push(GameEvent::LevelUp(self.score.level));
        }
        self.events.push(GameEvent::LinesCleared {
            rows: rows.clone(),
            result,
        });

        self.clear_job = Some(RowClearJob::new(rows, self.config.clear_step));
        self.set_phase(MatrixPhase::RowFilledClearing);
        true
    }

    fn check_empty_rows(&mut self) -> bool {
        let gaps = self.matrix.row_gaps();
        if gaps.is_empty() {
            self.set_phase(MatrixPhase::TetriminoCreate);
        } else {
            self.fill_job = Some(RowFillJob::new(gaps, self.config.fill_step));
            self.set_phase(MatrixPhase::RowEmptyFilling);
        }
        true
    }

    fn show_callout(&mut self, result: &ClearResult, piece: Piece) {
        self.events.push(GameEvent::TSpin {
            tspin: result.tspin,
            lines: result.lines,
        });
        let mut timer = Timer::default();
        timer.arm(self.config.callout);
        let callout = TSpinCallout {
            text: result.action.clone(),
            piece,
        };
        self.callout = Some((callout, timer));
    }

    fn accepts_commands(&self) -> bool {
        self.state == GameState::Playing && self.phase == MatrixPhase::TetriminoFalling
    }

    fn shift(&mut self, direction: Direction, kind: MoveKind) -> bool {
        if !self.accepts_commands() || !self.matrix.move_piece(direction) {
            return false;
        }
        self.history.push(kind);
        self.run_phases();
        true
    }

    pub fn move_left(&mut self) -> bool {
        self.shift(Direction::Left, MoveKind::Left)
    }

    pub fn move_right(&mut self) -> bool {
        self.shift(Direction::Right, MoveKind::Right)
    }

    /// Move down one row and restart the gravity countdown
    pub fn soft_drop(&mut self) -> bool {
        if !self.accepts_commands() {
            return false;
        }
        self.fall_timer.cancel();
        let moved = self.shift(Direction::Down, MoveKind::Down);
        if !moved {
            self.run_phases();
        }
        moved
    }

    /// Drop to the preview position and lock without waiting
    pub fn hard_drop(&mut self) -> bool {
        if !self.accepts_commands() {
            return false;
        }
        if self.matrix.hard_drop_to_preview() > 0 {
            self.history.push(MoveKind::HardDrop);
        }
        self.hard_dropping = true;
        self.run_phases();
        true
    }

    fn rotate(&mut self, direction: RotationDirection) -> bool {
        if !self.accepts_commands() || !self.matrix.rotate(direction, None) {
            return false;
        }
        self.history.push(MoveKind::Rotate);
        self.run_phases();
        true
    }

    pub fn rotate_cw(&mut self) -> bool {
        self.rotate(RotationDirection::Clockwise)
    }

    pub fn rotate_ccw(&mut self) -> bool {
        self.rotate(RotationDirection::CounterClockwise)
    }

    /// Swap the current piece into the hold slot. Allowed once per lock.
    pub fn hold(&mut self) -> bool {
        if !self.accepts_commands() || !self.holdable {
            return false;
        }
        let current = self
            .matrix
            .active_piece()
            .expect("falling phase always has an active piece")
            .kind;
        let held = self.hold_piece.replace(current);
        debug!(?current, ?held, "hold");

        self.holdable = false;
        self.hard_dropping = false;
        self.history.clear();
        self.matrix.reset_kick_memory();
        self.fall_timer.cancel();
        self.lock_timer.cancel();
        self.matrix.set_active_piece(None);

        if self.try_spawn(held) {
            self.run_phases();
        }
        true
    }

    /// Spawn the next piece, or `forced` instead of drawing from the bag.
    /// Only valid in the create phase.
    pub fn spawn_next(&mut self, forced: Option<PieceType>) -> bool {
        if self.state != GameState::Playing || self.phase != MatrixPhase::TetriminoCreate {
            return false;
        }
        if !self.try_spawn(forced) {
            return false;
        }
        self.run_phases();
        true
    }

    /// Freeze all timers and jobs
    pub fn pause(&mut self) {
        if self.state == GameState::Playing {
            debug!("paused");
            self.state = GameState::Paused;
        }
    }

    /// Resume play. Pending timers restart at their full length.
    pub fn resume(&mut self) {
        if self.state != GameState::Paused {
            return;
        }
        debug!("resumed");
        self.state = GameState::Playing;
        self.fall_timer.rearm();
        self.lock_timer.rearm();
        if let Some(job) = &mut self.clear_job {
            job.restart();
        }
        if let Some(job) = &mut self.fill_job {
            job.restart();
        }
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// The display zone, y rebased to 0
    pub fn display_matrix(&self) -> Vec<Cell> {
        self.matrix.display_cells()
    }

    /// Active piece cells in display coordinates (negative y is hidden)
    pub fn active_display_cells(&self) -> Option<[Coord; 4]> {
        self.matrix.active_cells().map(|cells| cells.map(to_display))
    }

    /// Ghost piece cells in display coordinates
    pub fn ghost_display_cells(&self) -> Option<[Coord; 4]> {
        self.matrix
            .preview_drop_cells()
            .map(|cells| cells.map(to_display))
    }

    pub fn active_piece(&self) -> Option<&Piece> {
        self.matrix.active_piece()
    }

    pub fn hold_piece(&self) -> Option<PieceType> {
        self.hold_piece
    }

    pub fn can_hold(&self) -> bool {
        self.holdable
    }

    /// Get preview of next pieces
    pub fn next_pieces(&self) -> Vec<PieceType> {
        self.bag.preview()
    }

    pub fn score(&self) -> u64 {
        self.score.points
    }

    pub fn lines(&self) -> u32 {
        self.score.lines
    }

    pub fn level(&self) -> u32 {
        self.score.level
    }

    pub fn phase(&self) -> MatrixPhase {
        self.phase
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    /// The current T-spin callout, if it has not expired yet
    pub fn tspin_callout(&self) -> Option<&TSpinCallout> {
        self.callout.as_ref().map(|(callout, _)| callout)
    }

    /// Take all events raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tetromino::{PER_COL_CUBE_NUM, Rotation};

    fn instant_config() -> GameConfig {
        GameConfig {
            seed: Some(7),
            clear_step: Duration::ZERO,
            fill_step: Duration::ZERO,
            ..GameConfig::default()
        }
    }

    fn started(config: GameConfig) -> Game {
        let mut game = Game::new(config);
        game.new_game(1);
        game.drain_events();
        game
    }

    fn fill_row_except(game: &mut Game, y: i32, holes: &[i32]) {
        for x in (0..PER_COL_CUBE_NUM).filter(|x| !holes.contains(x)) {
            game.matrix.fill(Coord::new(x, y), PieceType::Z);
        }
    }

    fn place(game: &mut Game, kind: PieceType, rotation: Rotation, anchor: Coord) {
        game.matrix.set_active_piece(Some(Piece {
            kind,
            rotation,
            anchor,
        }));
        game.run_phases();
    }

    #[test]
    fn test_new_game_spawns_first_piece() {
        let mut game = Game::new(instant_config());
        assert_eq!(game.state(), GameState::Ready);
        assert!(!game.move_left());

        game.new_game(1);
        assert_eq!(game.state(), GameState::Playing);
        assert_eq!(game.phase(), MatrixPhase::TetriminoFalling);
        assert!(game.active_piece().is_some());
        assert_eq!(game.next_pieces().len(), 5);
        assert!(matches!(
            game.drain_events().as_slice(),
            [GameEvent::Spawned(_)]
        ));
    }

    #[test]
    fn test_same_seed_same_pieces() {
        let a = started(instant_config());
        let b = started(instant_config());
        assert_eq!(a.active_piece(), b.active_piece());
        assert_eq!(a.next_pieces(), b.next_pieces());
    }

    #[test]
    fn test_gravity_moves_piece_down() {
        let mut game = started(instant_config());
        let start = game.active_piece().unwrap().anchor;

        game.update(Duration::from_millis(999));
        assert_eq!(game.active_piece().unwrap().anchor, start);

        game.update(Duration::from_millis(1));
        assert_eq!(game.active_piece().unwrap().anchor, start + Coord::new(0, 1));
    }

    #[test]
    fn test_lock_delay() {
        let mut game = started(instant_config());
        place(&mut game, PieceType::O, Rotation::Initial, Coord::new(0, 38));
        assert!(game.lock_timer.is_pending());
        assert!(!game.fall_timer.is_pending());

        game.update(Duration::from_millis(499));
        assert_eq!(game.active_piece().unwrap().kind, PieceType::O);

        game.update(Duration::from_millis(1));
        assert!(game.matrix.find_cell(Coord::new(0, 39)).unwrap().filled);
        assert_eq!(game.phase(), MatrixPhase::TetriminoFalling);
        assert!(game.can_hold());
    }

    #[test]
    fn test_line_clear_scoring() {
        let mut game = started(instant_config());
        fill_row_except(&mut game, 39, &[3, 4, 5, 6]);
        place(&mut game, PieceType::I, Rotation::Initial, Coord::new(4, 30));

        assert!(game.hard_drop());
        assert_eq!(game.score(), 100);
        assert_eq!(game.lines(), 1);
        assert!(game.matrix.is_empty());
        assert_eq!(game.phase(), MatrixPhase::TetriminoFalling);

        let events = game.drain_events();
        assert!(events.iter().any(|event| matches!(
            event,
            GameEvent::LinesCleared { rows, .. } if rows == &vec![39]
        )));
    }

    #[test]
    fn test_tetris_clear() {
        let mut game = started(instant_config());
        for y in 36..40 {
            fill_row_except(&mut game, y, &[9]);
        }
        game.matrix.fill(Coord::new(0, 35), PieceType::L);
        place(&mut game, PieceType::I, Rotation::Right, Coord::new(9, 25));

        assert!(game.hard_drop());
        assert_eq!(game.score(), 800);
        assert_eq!(game.lines(), 4);
        // The leftover block fell to the floor
        assert!(game.matrix.find_cell(Coord::new(0, 39)).unwrap().filled);
        assert!(game.matrix.filled_rows().is_empty());
    }

    #[test]
    fn test_t_spin_double() {
        let mut game = started(instant_config());
        fill_row_except(&mut game, 39, &[1]);
        fill_row_except(&mut game, 38, &[0, 1, 2]);
        game.matrix.fill(Coord::new(0, 37), PieceType::J);
        place(&mut game, PieceType::T, Rotation::Right, Coord::new(1, 38));

        assert!(game.rotate_cw());
        assert!(game.hard_drop());
        assert_eq!(game.score(), 1200);
        assert_eq!(game.lines(), 2);

        let callout = game.tspin_callout().unwrap();
        assert_eq!(callout.text, "T-Spin Double");
        assert_eq!(callout.piece.rotation, Rotation::Twice);

        assert!(game.drain_events().contains(&GameEvent::TSpin {
            tspin: TSpin::Normal,
            lines: 2
        }));

        game.update(Duration::from_millis(500));
        assert!(game.tspin_callout().is_none());
    }

    #[test]
    fn test_spawn_collision_ends_game() {
        let mut game = started(instant_config());
        game.matrix.set_active_piece(None);
        game.set_phase(MatrixPhase::TetriminoCreate);
        for cell in Piece::spawned(PieceType::S).absolute_cells() {
            game.matrix.fill(cell, PieceType::Z);
        }

        assert!(!game.spawn_next(Some(PieceType::S)));
        assert_eq!(game.state(), GameState::GameOver);
        assert_eq!(game.phase(), MatrixPhase::None);
        assert_eq!(
            game.drain_events(),
            vec![GameEvent::GameOver {
                reason: GameOverReason::BlockOut
            }]
        );

        // Nothing moves after the game ends
        assert!(!game.move_left());
        assert!(!game.hard_drop());
        game.update(Duration::from_secs(5));
        assert_eq!(game.state(), GameState::GameOver);
    }

    #[test]
    fn test_lock_out_ends_game() {
        let mut game = started(instant_config());
        game.matrix.fill(Coord::new(4, 19), PieceType::I);
        game.matrix.fill(Coord::new(5, 19), PieceType::I);
        place(&mut game, PieceType::O, Rotation::Initial, Coord::new(4, 17));

        game.update(Duration::from_millis(500));
        assert_eq!(game.state(), GameState::GameOver);
        assert!(
            game.drain_events()
                .contains(&GameEvent::GameOver {
                    reason: GameOverReason::LockOut
                })
        );
    }

    #[test]
    fn test_hold_once_per_lock() {
        let mut game = started(instant_config());
        let first = game.active_piece().unwrap().kind;
        let next = game.next_pieces()[0];

        assert!(game.hold());
        assert_eq!(game.hold_piece(), Some(first));
        assert_eq!(game.active_piece().unwrap().kind, next);
        assert!(!game.hold());

        assert!(game.hard_drop());
        assert!(game.can_hold());
        let third = game.active_piece().unwrap().kind;
        assert!(game.hold());
        assert_eq!(game.active_piece().unwrap().kind, first);
        assert_eq!(game.hold_piece(), Some(third));
    }

    #[test]
    fn test_hold_spawn_failure_ends_game() {
        let mut game = started(instant_config());
        let next = game.next_pieces()[0];
        for cell in Piece::spawned(next).absolute_cells() {
            game.matrix.fill(cell, PieceType::Z);
        }

        assert!(game.hold());
        assert_eq!(game.state(), GameState::GameOver);
        assert_eq!(game.phase(), MatrixPhase::None);
        assert_eq!(
            game.drain_events(),
            vec![GameEvent::GameOver {
                reason: GameOverReason::BlockOut
            }]
        );
        assert!(!game.fall_timer.is_pending());
        assert!(!game.lock_timer.is_pending());
    }

    #[test]
    fn test_pause_freezes_timers() {
        let mut game = started(instant_config());
        let start = game.active_piece().unwrap().anchor;

        game.update(Duration::from_millis(900));
        game.pause();
        assert_eq!(game.state(), GameState::Paused);
        assert!(!game.move_left());
        game.update(Duration::from_secs(10));
        assert_eq!(game.active_piece().unwrap().anchor, start);

        game.resume();
        // Resume restarts the countdown at full length
        assert_eq!(game.fall_timer.remaining(), Some(Duration::from_millis(1000)));
        game.update(Duration::from_millis(999));
        assert_eq!(game.active_piece().unwrap().anchor, start);
    }

    #[test]
    fn test_pause_action_toggles() {
        let mut game = started(instant_config());
        game.process_action(Action::Pause);
        assert_eq!(game.state(), GameState::Paused);
        game.process_action(Action::MoveLeft);
        game.process_action(Action::Pause);
        assert_eq!(game.state(), GameState::Playing);
    }

    #[test]
    fn test_staged_clear_blocks_commands() {
        let config = GameConfig {
            clear_step: Duration::from_millis(30),
            fill_step: Duration::from_millis(50),
            ..instant_config()
        };
        let mut game = started(config);
        fill_row_except(&mut game, 39, &[3, 4, 5, 6]);
        game.matrix.fill(Coord::new(0, 38), PieceType::O);
        place(&mut game, PieceType::I, Rotation::Initial, Coord::new(4, 30));

        assert!(game.hard_drop());
        assert_eq!(game.phase(), MatrixPhase::RowFilledClearing);
        assert!(game.active_piece().is_none());
        assert!(!game.move_left());
        assert!(!game.spawn_next(None));

        game.update(Duration::from_millis(150));
        assert_eq!(game.phase(), MatrixPhase::RowEmptyFilling);
        game.update(Duration::from_millis(50));
        assert_eq!(game.phase(), MatrixPhase::TetriminoFalling);
        assert!(game.matrix.find_cell(Coord::new(0, 39)).unwrap().filled);
    }

    #[test]
    fn test_pause_freezes_row_clear() {
        let config = GameConfig {
            clear_step: Duration::from_millis(30),
            fill_step: Duration::from_millis(50),
            ..instant_config()
        };
        let mut game = started(config);
        fill_row_except(&mut game, 39, &[3, 4, 5, 6]);
        game.matrix.fill(Coord::new(0, 38), PieceType::O);
        place(&mut game, PieceType::I, Rotation::Initial, Coord::new(4, 30));
        assert!(game.hard_drop());

        let filled = |game: &Game| game.matrix.cells().iter().filter(|c| c.filled).count();
        game.update(Duration::from_millis(40));
        assert_eq!(game.phase(), MatrixPhase::RowFilledClearing);
        assert_eq!(filled(&game), 9);

        game.pause();
        game.update(Duration::from_secs(10));
        assert_eq!(game.phase(), MatrixPhase::RowFilledClearing);
        assert_eq!(filled(&game), 9);

        game.resume();
        game.update(Duration::from_millis(300));
        assert_eq!(game.phase(), MatrixPhase::TetriminoFalling);
        assert!(game.active_piece().is_some());
        assert_eq!(filled(&game), 1);
        assert!(game.matrix.find_cell(Coord::new(0, 39)).unwrap().filled);
    }

    #[test]
    fn test_zero_line_t_spin_scores() {
        let mut game = started(instant_config());
        fill_row_except(&mut game, 39, &[1, 9]);
        fill_row_except(&mut game, 38, &[0, 1, 2, 9]);
        game.matrix.fill(Coord::new(0, 37), PieceType::J);
        place(&mut game, PieceType::T, Rotation::Right, Coord::new(1, 38));

        assert!(game.rotate_cw());
        assert!(game.hard_drop());
        assert_eq!(game.score(), 400);
        assert_eq!(game.lines(), 0);
        assert_eq!(game.score.combo, -1);
        assert_eq!(game.tspin_callout().unwrap().text, "T-Spin");
        assert!(game.drain_events().contains(&GameEvent::TSpin {
            tspin: TSpin::Normal,
            lines: 0
        }));
        assert_eq!(game.phase(), MatrixPhase::TetriminoFalling);
    }

    #[test]
    fn test_guideline_combo_resets_on_empty_lock() {
        let mut game = started(GameConfig {
            scoring: ScoringRule::Guideline,
            ..instant_config()
        });
        let single = |game: &mut Game| {
            fill_row_except(game, 39, &[3, 4, 5, 6]);
            place(game, PieceType::I, Rotation::Initial, Coord::new(4, 30));
            assert!(game.hard_drop());
        };

        single(&mut game);
        assert_eq!(game.score(), 100);
        single(&mut game);
        assert_eq!(game.score(), 100 + 100 + 50);
        assert_eq!(game.score.combo, 1);

        place(&mut game, PieceType::O, Rotation::Initial, Coord::new(0, 30));
        assert!(game.hard_drop());
        assert_eq!(game.score(), 250);
        assert_eq!(game.score.combo, -1);

        // O sits in columns 0-1 of row 38 and 39; fill around it
        fill_row_except(&mut game, 39, &[0, 1, 3, 4, 5, 6]);
        place(&mut game, PieceType::I, Rotation::Initial, Coord::new(4, 30));
        assert!(game.hard_drop());
        assert_eq!(game.score(), 350);
        assert_eq!(game.lines(), 3);
    }

    #[test]
    fn test_soft_drop_restarts_gravity() {
        let mut game = started(instant_config());
        let start = game.active_piece().unwrap().anchor;
        game.update(Duration::from_millis(900));

        assert!(game.soft_drop());
        assert_eq!(game.active_piece().unwrap().anchor, start + Coord::new(0, 1));
        assert_eq!(game.fall_timer.remaining(), Some(Duration::from_millis(1000)));
    }

    #[test]
    fn test_translation_after_rotation_is_not_a_t_spin() {
        let mut game = started(instant_config());
        place(&mut game, PieceType::T, Rotation::Initial, Coord::new(4, 30));
        assert!(game.rotate_cw());
        assert!(game.move_left());
        assert_eq!(game.history.last(), Some(&MoveKind::Left));
        assert!(game.hard_drop());
        assert!(game.drain_events().iter().any(|event| matches!(
            event,
            GameEvent::Locked {
                tspin: TSpin::None,
                ..
            }
        )));
    }
}
