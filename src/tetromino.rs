//! Tetromino definitions and shapes
//!
//! All 7 standard tetrominoes with their rotations. Every shape is stored as
//! positions inside the piece's N×N bounding square (SRS "true rotation"),
//! with each rotation state being the clockwise turn of the previous one.
//! Coordinates are (x, y) with y increasing downward.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// Matrix width in cells
pub const PER_COL_CUBE_NUM: i32 = 10;
/// Matrix height in cells (buffer zone + display zone)
pub const PER_ROW_CUBE_NUM: i32 = 40;
/// First row of the visible display zone; rows above it are the hidden buffer
pub const DISPLAY_ZONE_TOP: i32 = 20;

/// An integer cell coordinate, y grows downward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Coord {
    type Output = Coord;

    fn add(self, rhs: Coord) -> Coord {
        Coord::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Coord {
    type Output = Coord;

    fn sub(self, rhs: Coord) -> Coord {
        Coord::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// The 7 tetromino types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceType {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl PieceType {
    /// All tetromino types, in table order
    pub const ALL: [PieceType; 7] = [
        PieceType::I,
        PieceType::J,
        PieceType::L,
        PieceType::O,
        PieceType::S,
        PieceType::T,
        PieceType::Z,
    ];

    /// Position in [`PieceType::ALL`]
    pub fn index(self) -> usize {
        match self {
            PieceType::I => 0,
            PieceType::J => 1,
            PieceType::L => 2,
            PieceType::O => 3,
            PieceType::S => 4,
            PieceType::T => 5,
            PieceType::Z => 6,
        }
    }

    /// Side length of the bounding square the shape rotates inside
    pub fn boundary_size(self) -> i32 {
        match self {
            PieceType::I => 4,
            PieceType::O => 2,
            _ => 3,
        }
    }

    /// Shape configuration for a rotation state
    pub fn shape(self, rotation: Rotation) -> &'static GeometryConfig {
        shape_of(self, rotation)
    }

    /// Nominal spawn anchor. The spawn-orientation cells sit on the two top
    /// rows of the display zone, horizontally centred.
    pub fn spawn_anchor(self) -> Coord {
        match self {
            PieceType::I | PieceType::O => Coord::new(4, DISPLAY_ZONE_TOP),
            _ => Coord::new(4, DISPLAY_ZONE_TOP + 1),
        }
    }

    /// Height of the spawn orientation, used for the pre-raised spawn
    pub fn spawn_height(self) -> i32 {
        match self {
            PieceType::I => 1,
            _ => 2,
        }
    }
}

/// Rotation states (SRS naming: 0, R, 2, L)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Initial,
    Right,
    Twice,
    Left,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [
        Rotation::Initial,
        Rotation::Right,
        Rotation::Twice,
        Rotation::Left,
    ];

    pub fn index(self) -> usize {
        match self {
            Rotation::Initial => 0,
            Rotation::Right => 1,
            Rotation::Twice => 2,
            Rotation::Left => 3,
        }
    }

    /// Rotate clockwise: Initial → Right → Twice → Left → Initial
    pub fn cw(self) -> Rotation {
        match self {
            Rotation::Initial => Rotation::Right,
            Rotation::Right => Rotation::Twice,
            Rotation::Twice => Rotation::Left,
            Rotation::Left => Rotation::Initial,
        }
    }

    /// Rotate counter-clockwise: Initial → Left → Twice → Right → Initial
    pub fn ccw(self) -> Rotation {
        match self {
            Rotation::Initial => Rotation::Left,
            Rotation::Left => Rotation::Twice,
            Rotation::Twice => Rotation::Right,
            Rotation::Right => Rotation::Initial,
        }
    }

    pub fn turned(self, direction: RotationDirection) -> Rotation {
        match direction {
            RotationDirection::Clockwise => self.cw(),
            RotationDirection::CounterClockwise => self.ccw(),
        }
    }
}

/// Direction for rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationDirection {
    Clockwise,
    CounterClockwise,
}

/// Shape of one tetromino in one rotation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryConfig {
    /// The 4 cells relative to the anchor
    pub cells: [Coord; 4],
    /// Which of the 4 cells is the pivot
    pub anchor_index: usize,
    /// Position of each cell inside the bounding square
    pub boundary: [Coord; 4],
}

const fn c(x: i32, y: i32) -> Coord {
    Coord::new(x, y)
}

const fn geometry(boundary: [Coord; 4], anchor_index: usize) -> GeometryConfig {
    let pivot = boundary[anchor_index];
    let mut cells = [Coord::new(0, 0); 4];
    let mut i = 0;
    while i < 4 {
        cells[i] = Coord::new(boundary[i].x - pivot.x, boundary[i].y - pivot.y);
        i += 1;
    }
    GeometryConfig {
        cells,
        anchor_index,
        boundary,
    }
}

// Indexed by [PieceType::index()][Rotation::index()].
//
//   I  ....   J  J..   L  ..L   O  OO   S  .SS   T  .T.   Z  ZZ.
//      IIII      JJJ      LLL      OO      SS.      TTT      .ZZ
//      ....      ...      ...              ...      ...      ...
//      ....
static SHAPES: [[GeometryConfig; 4]; 7] = [
    // I
    [
        geometry([c(0, 1), c(1, 1), c(2, 1), c(3, 1)], 1),
        geometry([c(2, 0), c(2, 1), c(2, 2), c(2, 3)], 1),
        geometry([c(3, 2), c(2, 2), c(1, 2), c(0, 2)], 1),
        geometry([c(1, 3), c(1, 2), c(1, 1), c(1, 0)], 1),
    ],
    // J
    [
        geometry([c(0, 0), c(0, 1), c(1, 1), c(2, 1)], 2),
        geometry([c(2, 0), c(1, 0), c(1, 1), c(1, 2)], 2),
        geometry([c(2, 2), c(2, 1), c(1, 1), c(0, 1)], 2),
        geometry([c(0, 2), c(1, 2), c(1, 1), c(1, 0)], 2),
    ],
    // L
    [
        geometry([c(2, 0), c(0, 1), c(1, 1), c(2, 1)], 2),
        geometry([c(2, 2), c(1, 0), c(1, 1), c(1, 2)], 2),
        geometry([c(0, 2), c(2, 1), c(1, 1), c(0, 1)], 2),
        geometry([c(0, 0), c(1, 2), c(1, 1), c(1, 0)], 2),
    ],
    // O: the anchor index follows the top-left cell so the anchor never moves
    [
        geometry([c(0, 0), c(1, 0), c(0, 1), c(1, 1)], 0),
        geometry([c(1, 0), c(1, 1), c(0, 0), c(0, 1)], 2),
        geometry([c(1, 1), c(0, 1), c(1, 0), c(0, 0)], 3),
        geometry([c(0, 1), c(0, 0), c(1, 1), c(1, 0)], 1),
    ],
    // S
    [
        geometry([c(1, 0), c(2, 0), c(0, 1), c(1, 1)], 3),
        geometry([c(2, 1), c(2, 2), c(1, 0), c(1, 1)], 3),
        geometry([c(1, 2), c(0, 2), c(2, 1), c(1, 1)], 3),
        geometry([c(0, 1), c(0, 0), c(1, 2), c(1, 1)], 3),
    ],
    // T
    [
        geometry([c(1, 0), c(0, 1), c(1, 1), c(2, 1)], 2),
        geometry([c(2, 1), c(1, 0), c(1, 1), c(1, 2)], 2),
        geometry([c(1, 2), c(2, 1), c(1, 1), c(0, 1)], 2),
        geometry([c(0, 1), c(1, 2), c(1, 1), c(1, 0)], 2),
    ],
    // Z
    [
        geometry([c(0, 0), c(1, 0), c(1, 1), c(2, 1)], 2),
        geometry([c(2, 0), c(2, 1), c(1, 1), c(1, 2)], 2),
        geometry([c(2, 2), c(1, 2), c(1, 1), c(0, 1)], 2),
        geometry([c(0, 2), c(0, 1), c(1, 1), c(1, 0)], 2),
    ],
];

/// Shape lookup, total over every (type, rotation) pair
pub fn shape_of(kind: PieceType, rotation: Rotation) -> &'static GeometryConfig {
    &SHAPES[kind.index()][rotation.index()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn turn_cw(pos: Coord, size: i32) -> Coord {
        Coord::new(size - 1 - pos.y, pos.x)
    }

    #[test]
    fn test_rotation_cycle() {
        for rotation in Rotation::ALL {
            assert_eq!(rotation.cw().ccw(), rotation);
            assert_eq!(rotation.cw().cw().cw().cw(), rotation);
        }
    }

    #[test]
    fn test_every_state_is_a_rigid_turn_of_the_previous() {
        for kind in PieceType::ALL {
            let size = kind.boundary_size();
            for rotation in Rotation::ALL {
                let from = shape_of(kind, rotation);
                let to = shape_of(kind, rotation.cw());
                for i in 0..4 {
                    assert_eq!(
                        turn_cw(from.boundary[i], size),
                        to.boundary[i],
                        "{kind:?} {rotation:?} cell {i}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_cells_fit_inside_boundary() {
        for kind in PieceType::ALL {
            let size = kind.boundary_size();
            for rotation in Rotation::ALL {
                let shape = shape_of(kind, rotation);
                let unique: HashSet<_> = shape.boundary.iter().collect();
                assert_eq!(unique.len(), 4);
                for pos in shape.boundary {
                    assert!((0..size).contains(&pos.x) && (0..size).contains(&pos.y));
                }
                assert_eq!(shape.cells[shape.anchor_index], Coord::new(0, 0));
            }
        }
    }

    #[test]
    fn test_spawn_cells_start_in_display_zone() {
        for kind in PieceType::ALL {
            let anchor = kind.spawn_anchor();
            let shape = shape_of(kind, Rotation::Initial);
            let rows: HashSet<_> = shape.cells.iter().map(|cell| anchor.y + cell.y).collect();
            assert_eq!(rows.len() as i32, kind.spawn_height());
            assert!(rows.iter().all(|&y| y >= DISPLAY_ZONE_TOP));
        }
    }
}
