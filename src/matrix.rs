//! The play matrix: grid storage, collision queries, the active piece and
//! every geometric rule that mutates them.
//!
//! The grid is 10 × 40, row-major, with y growing downward. Rows 0–19 are a
//! hidden buffer zone used for spawning; rows 20–39 are displayed.

use crate::piece::Piece;
use crate::srs::{LAST_KICK_INDEX, kick_offsets};
use crate::tetromino::{
    Coord, DISPLAY_ZONE_TOP, PER_COL_CUBE_NUM, PER_ROW_CUBE_NUM, PieceType, Rotation,
    RotationDirection,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Column pairs removed per stage when clearing rows, centre outward
pub const CLEAR_ORDER: [(i32, i32); 5] = [(4, 5), (3, 6), (2, 7), (1, 8), (0, 9)];

/// One cell of the matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
    /// Stable identity for UI diffing; travels with content when rows shift
    pub id: u64,
    pub filled: bool,
    /// Which piece filled this cell
    pub kind: Option<PieceType>,
}

/// Translation directions. `Up` is only used internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    Down,
    Up,
}

impl Direction {
    pub fn offset(self) -> Coord {
        match self {
            Direction::Left => Coord::new(-1, 0),
            Direction::Right => Coord::new(1, 0),
            Direction::Down => Coord::new(0, 1),
            Direction::Up => Coord::new(0, -1),
        }
    }
}

/// Which sides of a cell set touch a wall or a filled cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NearbyCollision {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl NearbyCollision {
    pub fn blocks(&self, direction: Direction) -> bool {
        match direction {
            Direction::Left => self.left,
            Direction::Right => self.right,
            Direction::Down => self.bottom,
            Direction::Up => self.top,
        }
    }
}

/// T-spin classification of a lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TSpin {
    #[default]
    None,
    Normal,
    Mini,
}

/// A band of non-empty rows resting on an empty run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowGap {
    /// Non-empty rows of the band, bottom first
    pub rows: Vec<i32>,
    /// How far the band has to fall
    pub distance: i32,
}

/// The play matrix
#[derive(Debug, Clone)]
pub struct Matrix {
    cells: Vec<Cell>,
    active: Option<Piece>,
    /// Kick index of the last successful rotation, `None` for a naive fit
    last_kick: Option<usize>,
    next_id: u64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::new()
    }
}

fn index_of(coord: Coord) -> Option<usize> {
    if !(0..PER_COL_CUBE_NUM).contains(&coord.x) || !(0..PER_ROW_CUBE_NUM).contains(&coord.y) {
        return None;
    }
    Some((coord.x + coord.y * PER_COL_CUBE_NUM) as usize)
}

/// Rebase a matrix coordinate into the display window
pub fn to_display(coord: Coord) -> Coord {
    Coord::new(coord.x, coord.y - DISPLAY_ZONE_TOP)
}

impl Matrix {
    /// Create a new empty matrix
    pub fn new() -> Self {
        let cells = (0..PER_ROW_CUBE_NUM)
            .flat_map(|y| (0..PER_COL_CUBE_NUM).map(move |x| (x, y)))
            .enumerate()
            .map(|(id, (x, y))| Cell {
                x,
                y,
                id: id as u64,
                filled: false,
                kind: None,
            })
            .collect::<Vec<_>>();
        let next_id = cells.len() as u64;

        Self {
            cells,
            active: None,
            last_kick: None,
            next_id,
        }
    }

    /// Empty every cell and drop the active piece
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn fresh_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Get the cell at a coordinate. Off-grid coordinates return `None`
    /// and are treated as walls.
    pub fn find_cell(&self, coord: Coord) -> Option<&Cell> {
        index_of(coord).map(|index| &self.cells[index])
    }

    fn is_blocked(&self, coord: Coord) -> bool {
        self.find_cell(coord).is_none_or(|cell| cell.filled)
    }

    /// Fill a cell. Returns false if out of bounds.
    pub(crate) fn fill(&mut self, coord: Coord, kind: PieceType) -> bool {
        let Some(index) = index_of(coord) else {
            return false;
        };
        let id = self.fresh_id();
        let cell = &mut self.cells[index];
        cell.filled = true;
        cell.kind = Some(kind);
        cell.id = id;
        true
    }

    fn vacate(&mut self, index: usize) {
        let id = self.fresh_id();
        let cell = &mut self.cells[index];
        cell.filled = false;
        cell.kind = None;
        cell.id = id;
    }

    /// True if any cell is off-grid or occupied
    pub fn is_collision(&self, cells: &[Coord]) -> bool {
        cells.iter().any(|&coord| self.is_blocked(coord))
    }

    /// Summarise, per side, whether any cell's neighbour is blocked
    pub fn nearby_collision(&self, cells: &[Coord]) -> NearbyCollision {
        let side = |direction: Direction| {
            cells
                .iter()
                .any(|&coord| self.is_blocked(coord + direction.offset()))
        };

        NearbyCollision {
            left: side(Direction::Left),
            right: side(Direction::Right),
            top: side(Direction::Up),
            bottom: side(Direction::Down),
        }
    }

    /// Where a new piece of `kind` would appear.
    ///
    /// Returns `None` when the nominal spawn collides. Otherwise prefers a
    /// placement one piece-height higher so the piece drops in from the
    /// buffer zone.
    pub fn spawn_placement(&self, kind: PieceType) -> Option<Piece> {
        let nominal = Piece::spawned(kind);
        if self.is_collision(&nominal.absolute_cells()) {
            return None;
        }

        let raised = nominal.translated(Coord::new(0, -kind.spawn_height()));
        if self.is_collision(&raised.absolute_cells()) {
            Some(nominal)
        } else {
            Some(raised)
        }
    }

    /// Install a freshly spawned piece. Returns false when there is no room.
    pub fn spawn(&mut self, kind: PieceType) -> bool {
        match self.spawn_placement(kind) {
            Some(piece) => {
                debug!(?kind, anchor = ?piece.anchor, "spawned piece");
                self.active = Some(piece);
                self.last_kick = None;
                true
            }
            None => {
                debug!(?kind, "spawn blocked");
                false
            }
        }
    }

    /// The current falling piece
    pub fn active_piece(&self) -> Option<&Piece> {
        self.active.as_ref()
    }

    /// Replace the active piece without any validity check. Meant for
    /// placement search on a cloned matrix; the game never calls it with a
    /// piece.
    pub fn set_active_piece(&mut self, piece: Option<Piece>) {
        self.active = piece;
    }

    /// Absolute cells of the active piece
    pub fn active_cells(&self) -> Option<[Coord; 4]> {
        self.active.map(|piece| piece.absolute_cells())
    }

    /// Try to move the active piece one cell. Returns true if it moved.
    pub fn move_piece(&mut self, direction: Direction) -> bool {
        let Some(piece) = self.active else {
            return false;
        };
        if self
            .nearby_collision(&piece.absolute_cells())
            .blocks(direction)
        {
            return false;
        }

        self.active = Some(piece.translated(direction.offset()));
        trace!(?direction, "moved piece");
        true
    }

    /// Try to rotate the active piece, using SRS wall kicks.
    ///
    /// `forced` overrides the rotation derived from `direction`.
    pub fn rotate(&mut self, direction: RotationDirection, forced: Option<Rotation>) -> bool {
        let Some(piece) = self.active else {
            return false;
        };
        let target = forced.unwrap_or_else(|| piece.rotation.turned(direction));
        let turned = piece.rotated_to(target);

        if !self.is_collision(&turned.absolute_cells()) {
            self.active = Some(turned);
            self.last_kick = None;
            return true;
        }

        // Entry 0 is the naive fit that already failed
        let kicks = kick_offsets(piece.kind, piece.rotation, target);
        for (index, &offset) in kicks.iter().enumerate().skip(1) {
            let candidate = turned.translated(offset);
            if !self.is_collision(&candidate.absolute_cells()) {
                trace!(kick = index, ?offset, "rotation kicked");
                self.active = Some(candidate);
                self.last_kick = Some(index);
                return true;
            }
        }

        false
    }

    /// Kick index used by the last successful rotation
    pub fn last_kick(&self) -> Option<usize> {
        self.last_kick
    }

    pub fn reset_kick_memory(&mut self) {
        self.last_kick = None;
    }

    fn drop_distance(&self, piece: &Piece) -> i32 {
        let mut distance = 0;
        while !self.is_collision(&piece.translated(Coord::new(0, distance + 1)).absolute_cells()) {
            distance += 1;
        }
        distance
    }

    /// Cells the active piece would rest on after a hard drop
    pub fn preview_drop_cells(&self) -> Option<[Coord; 4]> {
        let piece = self.active?;
        let distance = self.drop_distance(&piece);
        Some(piece.translated(Coord::new(0, distance)).absolute_cells())
    }

    /// Move the active piece straight to its drop preview.
    /// Returns the number of rows dropped.
    pub fn hard_drop_to_preview(&mut self) -> u32 {
        let Some(piece) = self.active else {
            return 0;
        };
        let distance = self.drop_distance(&piece);
        self.active = Some(piece.translated(Coord::new(0, distance)));
        distance as u32
    }

    /// Write the active piece into the grid and clear it.
    ///
    /// # Panics
    ///
    /// Panics if there is no active piece.
    pub fn lock_piece_into_grid(&mut self) -> Piece {
        let piece = self
            .active
            .take()
            .expect("lock_piece_into_grid called without an active piece");

        for coord in piece.absolute_cells() {
            let Some(index) = index_of(coord) else {
                continue;
            };
            if !self.cells[index].filled {
                self.fill(coord, piece.kind);
            }
        }
        debug!(kind = ?piece.kind, anchor = ?piece.anchor, "locked piece");
        piece
    }

    fn row(&self, y: i32) -> &[Cell] {
        let start = (y * PER_COL_CUBE_NUM) as usize;
        &self.cells[start..start + PER_COL_CUBE_NUM as usize]
    }

    fn is_row_filled(&self, y: i32) -> bool {
        self.row(y).iter().all(|cell| cell.filled)
    }

    fn is_row_empty(&self, y: i32) -> bool {
        self.row(y).iter().all(|cell| !cell.filled)
    }

    /// Completely filled rows of the display zone, top to bottom
    pub fn filled_rows(&self) -> Vec<i32> {
        (DISPLAY_ZONE_TOP..PER_ROW_CUBE_NUM)
            .filter(|&y| self.is_row_filled(y))
            .collect()
    }

    /// Remove one column pair (see [`CLEAR_ORDER`]) from each row
    pub fn clear_row_stage(&mut self, rows: &[i32], stage: usize) {
        let Some(&(left, right)) = CLEAR_ORDER.get(stage) else {
            return;
        };
        for &y in rows {
            for x in [left, right] {
                if let Some(index) = index_of(Coord::new(x, y)) {
                    self.vacate(index);
                }
            }
        }
    }

    /// Clear the given rows in one go
    pub fn clear_rows(&mut self, rows: &[i32]) {
        for stage in 0..CLEAR_ORDER.len() {
            self.clear_row_stage(rows, stage);
        }
    }

    /// Find bands of rows that must fall to close the gaps under them.
    /// Empty when the matrix is settled.
    pub fn row_gaps(&self) -> Vec<RowGap> {
        let mut gaps = Vec::new();
        let mut y = PER_ROW_CUBE_NUM - 1;

        while y >= 0 && !self.is_row_empty(y) {
            y -= 1;
        }

        while y >= 0 {
            let empty_bottom = y;
            while y >= 0 && self.is_row_empty(y) {
                y -= 1;
            }
            if y < 0 {
                break;
            }

            let band_bottom = y;
            let mut rows = Vec::new();
            while y >= 0 && !self.is_row_empty(y) {
                rows.push(y);
                y -= 1;
            }
            gaps.push(RowGap {
                rows,
                distance: empty_bottom - band_bottom,
            });
        }

        gaps
    }

    /// Shift each band down by its distance, bottom band first
    pub fn fill_row_gaps(&mut self, gaps: &[RowGap]) {
        for gap in gaps {
            for &y in &gap.rows {
                self.move_row(y, y + gap.distance);
            }
        }
    }

    fn move_row(&mut self, from: i32, to: i32) {
        if from == to {
            return;
        }
        for x in 0..PER_COL_CUBE_NUM {
            let (Some(src), Some(dst)) = (index_of(Coord::new(x, from)), index_of(Coord::new(x, to)))
            else {
                continue;
            };
            let moved = self.cells[src];
            let target = &mut self.cells[dst];
            target.id = moved.id;
            target.filled = moved.filled;
            target.kind = moved.kind;
            self.vacate(src);
        }
    }

    /// Close every gap, repeating until nothing is left to fall
    pub fn settle(&mut self) {
        loop {
            let gaps = self.row_gaps();
            if gaps.is_empty() {
                break;
            }
            self.fill_row_gaps(&gaps);
        }
    }

    /// True if every cell lies above the display zone
    pub fn is_lock_out(&self, cells: &[Coord]) -> bool {
        cells.iter().all(|cell| cell.y < DISPLAY_ZONE_TOP)
    }

    /// Classify the lock of `piece`. Only a T whose last accepted move was a
    /// rotation qualifies; off-grid corners count as blocked.
    pub fn classify_t_spin(&self, piece: &Piece, rotated_last: bool) -> TSpin {
        if !piece.is_t_piece() || !rotated_last {
            return TSpin::None;
        }

        let (front, back) = match piece.rotation {
            Rotation::Initial => ([(-1, -1), (1, -1)], [(-1, 1), (1, 1)]),
            Rotation::Right => ([(1, -1), (1, 1)], [(-1, -1), (-1, 1)]),
            Rotation::Twice => ([(-1, 1), (1, 1)], [(-1, -1), (1, -1)]),
            Rotation::Left => ([(-1, -1), (-1, 1)], [(1, -1), (1, 1)]),
        };
        let count = |corners: [(i32, i32); 2]| {
            corners
                .iter()
                .filter(|&&(dx, dy)| self.is_blocked(piece.anchor + Coord::new(dx, dy)))
                .count()
        };
        let front = count(front);
        let back = count(back);

        if front + back >= 3 {
            TSpin::Normal
        } else if front == 2 && back == 0 {
            if self.last_kick == Some(LAST_KICK_INDEX) {
                TSpin::Normal
            } else {
                TSpin::Mini
            }
        } else {
            TSpin::None
        }
    }

    /// The display zone only, with y rebased to 0
    pub fn display_cells(&self) -> Vec<Cell> {
        let start = (DISPLAY_ZONE_TOP * PER_COL_CUBE_NUM) as usize;
        self.cells[start..]
            .iter()
            .map(|cell| Cell {
                y: cell.y - DISPLAY_ZONE_TOP,
                ..*cell
            })
            .collect()
    }

    /// Check if the matrix holds no filled cells (all-clear)
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|cell| !cell.filled)
    }
}
