//! Playfield matrix: 24 rows × 10 columns, row 0 at the top.
//!
//! The matrix is the only shared mutable board state. The falling piece is
//! stamped into it with the `player` flag set so that collision checks can
//! ignore the piece's own cells.

use crate::piece::{Orientation, Piece};

pub const ROWS: usize = 24;
pub const COLS: usize = 10;

/// Top-left corner of a piece's bounding grid plus its rotation.
/// `col`/`row` may be negative or past the edge; cells are clipped later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub col: i32,
    pub row: i32,
    pub orientation: Orientation,
}

/// An in-bounds matrix coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub col: usize,
    pub row: usize,
}

/// Up to four visible cells of a piece at some position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PiecePoints {
    points: [Point; 4],
    len: usize,
}

impl PiecePoints {
    /// Applies the rotation table at `(col, row)` and drops any cell outside the matrix.
    pub fn for_piece(piece: Piece, col: i32, row: i32, orientation: Orientation) -> Self {
        let mut out = Self::default();
        for &(dc, dr) in piece.cells(orientation) {
            let c = col + i32::from(dc);
            let r = row + i32::from(dr);
            if (0..ROWS as i32).contains(&r) && (0..COLS as i32).contains(&c) {
                out.points[out.len] = Point {
                    col: c as usize,
                    row: r as usize,
                };
                out.len += 1;
            }
        }
        out
    }

    pub fn at(piece: Piece, pos: Position) -> Self {
        Self::for_piece(piece, pos.col, pos.row, pos.orientation)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All four cells are on the board.
    pub fn is_complete(&self) -> bool {
        self.len == 4
    }

    pub fn iter(&self) -> impl Iterator<Item = Point> + '_ {
        self.points[..self.len].iter().copied()
    }
}

/// One grid cell. `player` implies `filled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatrixCell {
    /// Changed since the renderer last copied it.
    pub dirty: bool,
    /// Occupied by the piece currently under player control.
    pub player: bool,
    pub filled: bool,
    pub piece: Piece,
}

#[derive(Debug, Clone)]
pub struct Matrix {
    cells: [[MatrixCell; COLS]; ROWS],
}

impl Default for Matrix {
    fn default() -> Self {
        Self::new()
    }
}

impl Matrix {
    pub fn new() -> Self {
        Self {
            cells: [[MatrixCell::default(); COLS]; ROWS],
        }
    }

    #[cfg(test)]
    pub fn cell(&self, row: usize, col: usize) -> &MatrixCell {
        &self.cells[row][col]
    }

    /// Marks each point filled with `piece`, owned by the player or not.
    pub fn add_points(&mut self, points: &PiecePoints, piece: Piece, player: bool) {
        for p in points.iter() {
            let cell = &mut self.cells[p.row][p.col];
            cell.filled = true;
            cell.player = player;
            cell.piece = piece;
            cell.dirty = true;
        }
    }

    pub fn remove_points(&mut self, points: &PiecePoints) {
        for p in points.iter() {
            let cell = &mut self.cells[p.row][p.col];
            cell.filled = false;
            cell.player = false;
            cell.piece = Piece::Empty;
            cell.dirty = true;
        }
    }

    /// True when no point is blocked by a locked cell. The player's own cells never block.
    pub fn points_available(&self, points: &PiecePoints) -> bool {
        points.iter().all(|p| {
            let cell = &self.cells[p.row][p.col];
            !cell.filled || cell.player
        })
    }

    /// Fully filled rows, top to bottom.
    pub fn completed_rows(&self) -> Vec<usize> {
        (0..ROWS)
            .filter(|&row| self.cells[row].iter().all(|cell| cell.filled))
            .collect()
    }

    /// Removes each row in the given order, shifting everything above it down by one.
    /// Pass indices top to bottom (as `completed_rows` returns them).
    pub fn remove_rows(&mut self, rows: &[usize]) {
        for &row in rows {
            if row >= ROWS {
                continue;
            }
            for target in (1..=row).rev() {
                let source = self.cells[target - 1];
                for (col, above) in source.iter().enumerate() {
                    let cell = &mut self.cells[target][col];
                    cell.filled = above.filled;
                    cell.player = false;
                    cell.piece = above.piece;
                    cell.dirty = true;
                }
            }
            for cell in &mut self.cells[0] {
                *cell = MatrixCell {
                    dirty: true,
                    ..MatrixCell::default()
                };
            }
        }
    }

    pub fn clear_all(&mut self) {
        for cell in self.cells.iter_mut().flatten() {
            *cell = MatrixCell {
                dirty: true,
                ..MatrixCell::default()
            };
        }
    }

    /// Turns the falling piece's cells into ordinary board cells.
    pub fn clear_player_ownership(&mut self) {
        for cell in self.cells.iter_mut().flatten() {
            cell.player = false;
        }
    }

    /// Lock test at the piece's current position: some visible cell sits on
    /// the bottom row or directly above a filled cell that is not the player's.
    pub fn can_settle(&self, piece: Piece, pos: Position) -> bool {
        PiecePoints::at(piece, pos).iter().any(|p| {
            if p.row == ROWS - 1 {
                return true;
            }
            let below = &self.cells[p.row + 1][p.col];
            below.filled && !below.player
        })
    }

    /// Hard-drop landing spot: first row from `start` downward where the piece settles.
    pub fn drop_position(&self, piece: Piece, start: Position) -> Position {
        let mut pos = start;
        for row in start.row..ROWS as i32 {
            pos.row = row;
            if self.can_settle(piece, pos) {
                break;
            }
        }
        pos
    }

    /// Visits cells needing a redraw (all of them when `force_full`) and clears their dirty flag.
    pub fn drain_dirty(&mut self, force_full: bool, mut visit: impl FnMut(Point, &MatrixCell)) {
        for (row, cells) in self.cells.iter_mut().enumerate() {
            for (col, cell) in cells.iter_mut().enumerate() {
                if force_full || cell.dirty {
                    cell.dirty = false;
                    visit(Point { col, row }, cell);
                }
            }
        }
    }
}
