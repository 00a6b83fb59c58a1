//! Active falling piece model

use crate::tetromino::{Coord, PieceType, Rotation};
use serde::{Deserialize, Serialize};

/// An active falling piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    /// The type of tetromino
    pub kind: PieceType,
    /// Current rotation state
    pub rotation: Rotation,
    /// Absolute position of the pivot cell. May sit off-grid while kicks
    /// are being evaluated.
    pub anchor: Coord,
}

impl Piece {
    /// Create a piece in its spawn orientation at the given anchor
    pub fn new(kind: PieceType, anchor: Coord) -> Self {
        Self {
            kind,
            rotation: Rotation::Initial,
            anchor,
        }
    }

    /// Create a piece at its nominal spawn anchor
    pub fn spawned(kind: PieceType) -> Self {
        Self::new(kind, kind.spawn_anchor())
    }

    /// Get the absolute positions of all 4 blocks
    pub fn absolute_cells(&self) -> [Coord; 4] {
        let shape = self.kind.shape(self.rotation);
        shape.cells.map(|cell| self.anchor + cell)
    }

    /// Top-left corner of the bounding square, invariant under rotation
    pub fn boundary_origin(&self) -> Coord {
        let shape = self.kind.shape(self.rotation);
        self.anchor - shape.boundary[shape.anchor_index]
    }

    /// The full N×N bounding square, row-major
    pub fn boundary_cells(&self) -> Vec<Coord> {
        boundary_cells_for(self.kind, self.rotation, self.anchor)
    }

    /// The same piece turned to `rotation` inside its bounding square.
    ///
    /// Cells are looked up in the boundary square at the target rotation's
    /// boundary positions, so the square never drifts and a turn followed
    /// by the opposite turn restores the original anchor.
    pub fn rotated_to(&self, rotation: Rotation) -> Piece {
        let size = self.kind.boundary_size();
        let square = self.boundary_cells();
        let target = self.kind.shape(rotation);
        let pivot = target.boundary[target.anchor_index];
        let anchor = square[(pivot.y * size + pivot.x) as usize];

        Piece {
            kind: self.kind,
            rotation,
            anchor,
        }
    }

    /// The same piece shifted by `offset`
    pub fn translated(&self, offset: Coord) -> Piece {
        Piece {
            anchor: self.anchor + offset,
            ..*self
        }
    }

    /// Check if this is a T piece (for T-spin detection)
    pub fn is_t_piece(&self) -> bool {
        matches!(self.kind, PieceType::T)
    }
}

/// Reconstruct the N×N bounding square of a piece whose pivot sits at
/// `anchor` while in `rotation`.
pub fn boundary_cells_for(kind: PieceType, rotation: Rotation, anchor: Coord) -> Vec<Coord> {
    let shape = kind.shape(rotation);
    let origin = anchor - shape.boundary[shape.anchor_index];
    let size = kind.boundary_size();
    (0..size)
        .flat_map(|y| (0..size).map(move |x| origin + Coord::new(x, y)))
        .collect()
}
