//! Opponent state mirroring
//!
//! A game publishes its visible state as a list of tagged snapshot entries.
//! The receiving side keeps a [`RemoteMirror`] and replaces each field
//! wholesale from whatever entries arrive. Transport is up to the host.

use crate::game::{Game, MatrixPhase};
use crate::matrix::Cell;
use crate::piece::Piece;
use crate::tetromino::PieceType;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Failure to encode or decode a snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("bad {kind:?} entry: {source}")]
    Entry {
        kind: SnapshotKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("bad snapshot payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which part of the state an entry carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    Matrix,
    Piece,
    Hold,
    Next,
    Score,
    Line,
    Level,
    Phase,
}

/// One tagged piece of state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    #[serde(rename = "type")]
    pub kind: SnapshotKind,
    pub data: Value,
}

impl SnapshotEntry {
    pub fn new<T: Serialize>(kind: SnapshotKind, data: &T) -> Result<Self, SnapshotError> {
        let data =
            serde_json::to_value(data).map_err(|source| SnapshotError::Entry { kind, source })?;
        Ok(Self { kind, data })
    }

    fn decode<T: DeserializeOwned>(&self) -> Result<T, SnapshotError> {
        T::deserialize(&self.data).map_err(|source| SnapshotError::Entry {
            kind: self.kind,
            source,
        })
    }
}

/// Local copy of another player's visible state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteMirror {
    /// Display zone, y rebased to 0
    pub matrix: Vec<Cell>,
    pub piece: Option<Piece>,
    pub hold: Option<PieceType>,
    pub next: Vec<PieceType>,
    pub score: u64,
    pub lines: u32,
    pub level: u32,
    pub phase: MatrixPhase,
}

impl RemoteMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every field named by `entries`. Nothing is applied if any
    /// entry fails to decode.
    pub fn apply(&mut self, entries: &[SnapshotEntry]) -> Result<(), SnapshotError> {
        let mut next = self.clone();
        for entry in entries {
            match entry.kind {
                SnapshotKind::Matrix => next.matrix = entry.decode()?,
                SnapshotKind::Piece => next.piece = entry.decode()?,
                SnapshotKind::Hold => next.hold = entry.decode()?,
                SnapshotKind::Next => next.next = entry.decode()?,
                SnapshotKind::Score => next.score = entry.decode()?,
                SnapshotKind::Line => next.lines = entry.decode()?,
                SnapshotKind::Level => next.level = entry.decode()?,
                SnapshotKind::Phase => next.phase = entry.decode()?,
            }
        }
        debug!(entries = entries.len(), "applied remote snapshot");
        *self = next;
        Ok(())
    }

    /// Decode a JSON array of entries and apply it
    pub fn apply_json(&mut self, json: &str) -> Result<(), SnapshotError> {
        let entries: Vec<SnapshotEntry> = serde_json::from_str(json)?;
        self.apply(&entries)
    }
}

impl Game {
    /// Everything a mirror needs, one entry per kind
    pub fn snapshot_entries(&self) -> Result<Vec<SnapshotEntry>, SnapshotError> {
        Ok(vec![
            SnapshotEntry::new(SnapshotKind::Matrix, &self.display_matrix())?,
            SnapshotEntry::new(SnapshotKind::Piece, &self.active_piece())?,
            SnapshotEntry::new(SnapshotKind::Hold, &self.hold_piece())?,
            SnapshotEntry::new(SnapshotKind::Next, &self.next_pieces())?,
            SnapshotEntry::new(SnapshotKind::Score, &self.score())?,
            SnapshotEntry::new(SnapshotKind::Line, &self.lines())?,
            SnapshotEntry::new(SnapshotKind::Level, &self.level())?,
            SnapshotEntry::new(SnapshotKind::Phase, &self.phase())?,
        ])
    }

    /// Snapshot entries as a JSON array
    pub fn snapshot_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(&self.snapshot_entries()?)?)
    }
}
