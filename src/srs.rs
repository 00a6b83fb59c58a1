//! Super Rotation System (SRS) wall kick data
//!
//! SRS defines the wall kicks attempted when rotating a piece.
//! If a rotation would cause collision, these offsets are tried in order.
//! Offsets are (x, y) with y increasing downward, so the row component is
//! negated compared to the usual y-up tables.

use crate::tetromino::{Coord, PieceType, Rotation};

/// Index of the final kick entry; a T that needed it gets a full T-spin
pub const LAST_KICK_INDEX: usize = 4;

const fn k(x: i32, y: i32) -> Coord {
    Coord::new(x, y)
}

// J, L, S, T, Z
static JLSTZ_0_R: [Coord; 5] = [k(0, 0), k(-1, 0), k(-1, -1), k(0, 2), k(-1, 2)];
static JLSTZ_R_0: [Coord; 5] = [k(0, 0), k(1, 0), k(1, 1), k(0, -2), k(1, -2)];
static JLSTZ_R_2: [Coord; 5] = [k(0, 0), k(1, 0), k(1, 1), k(0, -2), k(1, -2)];
static JLSTZ_2_R: [Coord; 5] = [k(0, 0), k(-1, 0), k(-1, -1), k(0, 2), k(-1, 2)];
static JLSTZ_2_L: [Coord; 5] = [k(0, 0), k(1, 0), k(1, -1), k(0, 2), k(1, 2)];
static JLSTZ_L_2: [Coord; 5] = [k(0, 0), k(-1, 0), k(-1, 1), k(0, -2), k(-1, -2)];
static JLSTZ_L_0: [Coord; 5] = [k(0, 0), k(-1, 0), k(-1, 1), k(0, -2), k(-1, -2)];
static JLSTZ_0_L: [Coord; 5] = [k(0, 0), k(1, 0), k(1, -1), k(0, 2), k(1, 2)];

// I
static I_0_R: [Coord; 5] = [k(0, 0), k(-2, 0), k(1, 0), k(-2, 1), k(1, -2)];
static I_R_0: [Coord; 5] = [k(0, 0), k(2, 0), k(-1, 0), k(2, -1), k(-1, 2)];
static I_R_2: [Coord; 5] = [k(0, 0), k(-1, 0), k(2, 0), k(-1, -2), k(2, 1)];
static I_2_R: [Coord; 5] = [k(0, 0), k(1, 0), k(-2, 0), k(1, 2), k(-2, -1)];
static I_2_L: [Coord; 5] = [k(0, 0), k(2, 0), k(-1, 0), k(2, -1), k(-1, 2)];
static I_L_2: [Coord; 5] = [k(0, 0), k(-2, 0), k(1, 0), k(-2, 1), k(1, -2)];
static I_L_0: [Coord; 5] = [k(0, 0), k(1, 0), k(-2, 0), k(1, 2), k(-2, -1)];
static I_0_L: [Coord; 5] = [k(0, 0), k(-1, 0), k(2, 0), k(-1, -2), k(2, 1)];

/// Get wall kick offsets for a rotation transition.
///
/// Entry 0 is always the identity (the naive placement). Returns an empty
/// slice when no table exists: every O transition, 180° turns, and a
/// rotation onto the same state.
pub fn kick_offsets(kind: PieceType, from: Rotation, to: Rotation) -> &'static [Coord] {
    match kind {
        PieceType::O => &[],
        PieceType::I => i_kicks(from, to),
        _ => jlstz_kicks(from, to),
    }
}

fn jlstz_kicks(from: Rotation, to: Rotation) -> &'static [Coord] {
    use Rotation::*;

    match (from, to) {
        (Initial, Right) => &JLSTZ_0_R,
        (Right, Initial) => &JLSTZ_R_0,
        (Right, Twice) => &JLSTZ_R_2,
        (Twice, Right) => &JLSTZ_2_R,
        (Twice, Left) => &JLSTZ_2_L,
        (Left, Twice) => &JLSTZ_L_2,
        (Left, Initial) => &JLSTZ_L_0,
        (Initial, Left) => &JLSTZ_0_L,
        _ => &[],
    }
}

fn i_kicks(from: Rotation, to: Rotation) -> &'static [Coord] {
    use Rotation::*;

    match (from, to) {
        (Initial, Right) => &I_0_R,
        (Right, Initial) => &I_R_0,
        (Right, Twice) => &I_R_2,
        (Twice, Right) => &I_2_R,
        (Twice, Left) => &I_2_L,
        (Left, Twice) => &I_L_2,
        (Left, Initial) => &I_L_0,
        (Initial, Left) => &I_0_L,
        _ => &[],
    }
}
