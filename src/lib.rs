//! TETRS rules engine
//!
//! The 10×40 matrix, SRS rotation, 7-bag randomizer, T-spin detection,
//! scoring and the turn-cycle phase machine, without any presentation.

pub mod animation;
pub mod bag;
pub mod game;
pub mod matrix;
pub mod piece;
pub mod remote;
pub mod score;
pub mod settings;
pub mod srs;
pub mod tetromino;
pub mod timer;

pub use game::{Action, Game, GameConfig, GameEvent, GameOverReason, GameState, MatrixPhase};
pub use remote::{RemoteMirror, SnapshotEntry, SnapshotError, SnapshotKind};
pub use settings::{Settings, SettingsError};
