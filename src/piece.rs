//! Piece kinds, orientations and the fixed rotation tables.
//!
//! Every kind lives in a small bounding grid: 3×3 for J, L, S, T and Z,
//! 4×4 for I and 4×3 (cols × rows) for O. Offsets are `(col, row)` inside
//! that grid, listed row by row.

/// Piece kind. `Empty` marks a cell or slot that holds no piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Piece {
    #[default]
    Empty,
    O,
    I,
    S,
    Z,
    T,
    L,
    J,
}

/// Rotation state 0..=3. Right turns increment, left turns decrement, both wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Orientation(u8);

type Cells = [(u8, u8); 4];

const I_CELLS: [Cells; 4] = [
    [(0, 1), (1, 1), (2, 1), (3, 1)],
    [(2, 0), (2, 1), (2, 2), (2, 3)],
    [(0, 2), (1, 2), (2, 2), (3, 2)],
    [(1, 0), (1, 1), (1, 2), (1, 3)],
];

const J_CELLS: [Cells; 4] = [
    [(0, 0), (0, 1), (1, 1), (2, 1)],
    [(1, 0), (2, 0), (1, 1), (1, 2)],
    [(0, 1), (1, 1), (2, 1), (2, 2)],
    [(1, 0), (1, 1), (0, 2), (1, 2)],
];

const L_CELLS: [Cells; 4] = [
    [(2, 0), (0, 1), (1, 1), (2, 1)],
    [(1, 0), (1, 1), (1, 2), (2, 2)],
    [(0, 1), (1, 1), (2, 1), (0, 2)],
    [(0, 0), (1, 0), (1, 1), (1, 2)],
];

const O_CELLS: [Cells; 4] = [
    [(1, 0), (2, 0), (1, 1), (2, 1)],
    [(1, 0), (2, 0), (1, 1), (2, 1)],
    [(1, 0), (2, 0), (1, 1), (2, 1)],
    [(1, 0), (2, 0), (1, 1), (2, 1)],
];

const S_CELLS: [Cells; 4] = [
    [(1, 0), (2, 0), (0, 1), (1, 1)],
    [(1, 0), (1, 1), (2, 1), (2, 2)],
    [(1, 1), (2, 1), (0, 2), (1, 2)],
    [(0, 0), (0, 1), (1, 1), (1, 2)],
];

const T_CELLS: [Cells; 4] = [
    [(1, 0), (0, 1), (1, 1), (2, 1)],
    [(1, 0), (1, 1), (2, 1), (1, 2)],
    [(0, 1), (1, 1), (2, 1), (1, 2)],
    [(1, 0), (0, 1), (1, 1), (1, 2)],
];

const Z_CELLS: [Cells; 4] = [
    [(0, 0), (1, 0), (1, 1), (2, 1)],
    [(2, 0), (1, 1), (2, 1), (1, 2)],
    [(0, 1), (1, 1), (1, 2), (2, 2)],
    [(1, 0), (0, 1), (1, 1), (0, 2)],
];

impl Piece {
    /// The seven playable kinds, in picker order.
    pub const ALL: [Self; 7] = [Self::O, Self::I, Self::S, Self::Z, Self::T, Self::L, Self::J];

    /// Picker index → kind (wraps modulo 7).
    pub fn from_index(index: u32) -> Self {
        Self::ALL[(index % 7) as usize]
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }

    /// Bounding grid `(cols, rows)` the rotation table is laid out in.
    pub fn bounds(self) -> (u8, u8) {
        match self {
            Self::Empty => (0, 0),
            Self::I => (4, 4),
            Self::O => (4, 3),
            _ => (3, 3),
        }
    }

    /// Occupied `(col, row)` offsets for an orientation. Empty for `Piece::Empty`.
    pub fn cells(self, orientation: Orientation) -> &'static [(u8, u8)] {
        let table = match self {
            Self::Empty => return &[],
            Self::O => &O_CELLS,
            Self::I => &I_CELLS,
            Self::S => &S_CELLS,
            Self::Z => &Z_CELLS,
            Self::T => &T_CELLS,
            Self::L => &L_CELLS,
            Self::J => &J_CELLS,
        };
        &table[orientation.index()]
    }

    /// Short display name used in logs and the sidebar.
    pub fn name(self) -> &'static str {
        match self {
            Self::Empty => "-",
            Self::O => "O",
            Self::I => "I",
            Self::S => "S",
            Self::Z => "Z",
            Self::T => "T",
            Self::L => "L",
            Self::J => "J",
        }
    }
}

impl Orientation {
    pub const SPAWN: Self = Self(0);

    /// Builds an orientation, wrapping values above 3.
    #[cfg(test)]
    pub const fn new(value: u8) -> Self {
        Self(value % 4)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn rotate_right(self) -> Self {
        Self((self.0 + 1) % 4)
    }

    pub fn rotate_left(self) -> Self {
        Self((self.0 + 3) % 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIENTATIONS: [Orientation; 4] = [
        Orientation::new(0),
        Orientation::new(1),
        Orientation::new(2),
        Orientation::new(3),
    ];

    #[test]
    fn test_every_kind_has_four_cells_in_every_orientation() {
        for piece in Piece::ALL {
            for orientation in ORIENTATIONS {
                assert_eq!(piece.cells(orientation).len(), 4, "{piece:?} {orientation:?}");
            }
        }
    }

    #[test]
    fn test_cells_stay_inside_bounds() {
        for piece in Piece::ALL {
            let (cols, rows) = piece.bounds();
            for orientation in ORIENTATIONS {
                for &(c, r) in piece.cells(orientation) {
                    assert!(c < cols && r < rows, "{piece:?} {orientation:?} ({c},{r})");
                }
            }
        }
    }

    #[test]
    fn test_empty_piece_has_no_cells() {
        for orientation in ORIENTATIONS {
            assert!(Piece::Empty.cells(orientation).is_empty());
        }
    }

    #[test]
    fn test_rotation_wraps_both_ways() {
        assert_eq!(Orientation::new(3).rotate_right(), Orientation::new(0));
        assert_eq!(Orientation::new(0).rotate_left(), Orientation::new(3));
        assert_eq!(Orientation::SPAWN.rotate_right().rotate_left(), Orientation::SPAWN);
    }

    #[test]
    fn test_from_index_follows_picker_order() {
        assert_eq!(Piece::from_index(0), Piece::O);
        assert_eq!(Piece::from_index(6), Piece::J);
        assert_eq!(Piece::from_index(8), Piece::I);
    }
}
