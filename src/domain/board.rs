/// Board state: the shared occupancy matrix both engines read and write.
///
/// ## Layout
///
/// `cells[y][x]` is row-major. The source mask decides which cells exist:
///   - nonzero mask cell → `Some(CellStatus::Empty)` (in play)
///   - zero mask cell    → `None` (void, never filled, never walked on)
///
/// Dimensions are fixed at construction. Addresses are `i32` because
/// snapped detail anchors and neighbour scans routinely step outside the
/// rectangle; those are ordinary states, reported as `Err` here and turned
/// into "unavailable" by the callers.

use thiserror::Error;

use super::cell::CellStatus;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    #[error("cell ({x}, {y}) is outside the board")]
    OutOfRange { x: i32, y: i32 },
    #[error("cell ({x}, {y}) is not part of the board shape")]
    Void { x: i32, y: i32 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    cells: Vec<Vec<Option<CellStatus>>>,
    width: usize,
    height: usize,
}

impl Board {
    /// Build from a 2-D occupancy template. Rows are assumed equal length.
    pub fn from_mask(mask: &[Vec<u8>]) -> Self {
        let height = mask.len();
        let width = mask.first().map_or(0, |row| row.len());
        let cells = mask
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&m| if m != 0 { Some(CellStatus::Empty) } else { None })
                    .collect()
            })
            .collect();
        Board { cells, width, height }
    }

    /// Fully occupiable `width × height` rectangle.
    pub fn rectangle(width: usize, height: usize) -> Self {
        Board::from_mask(&vec![vec![1; width]; height])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Largest valid column index (`width - 1`).
    pub fn max_x(&self) -> i32 {
        self.width as i32 - 1
    }

    /// Largest valid row index (`height - 1`).
    pub fn max_y(&self) -> i32 {
        self.height as i32 - 1
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Is (x, y) inside the rectangle and part of the mask?
    pub fn is_in_play(&self, x: i32, y: i32) -> bool {
        self.contains(x, y) && self.cells[y as usize][x as usize].is_some()
    }

    pub fn get(&self, x: i32, y: i32) -> Result<CellStatus, BoardError> {
        if !self.contains(x, y) {
            return Err(BoardError::OutOfRange { x, y });
        }
        self.cells[y as usize][x as usize].ok_or(BoardError::Void { x, y })
    }

    pub fn set(&mut self, x: i32, y: i32, status: CellStatus) -> Result<(), BoardError> {
        if !self.contains(x, y) {
            return Err(BoardError::OutOfRange { x, y });
        }
        match &mut self.cells[y as usize][x as usize] {
            Some(cell) => {
                *cell = status;
                Ok(())
            }
            None => Err(BoardError::Void { x, y }),
        }
    }

    /// Shorthand used by the engines: in play and currently `Empty`.
    #[inline]
    pub fn is_empty_at(&self, x: i32, y: i32) -> bool {
        matches!(self.get(x, y), Ok(CellStatus::Empty))
    }

    /// Row-major view of all cells, `None` for void.
    pub fn rows(&self) -> &[Vec<Option<CellStatus>>] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_defines_cells() {
        let b = Board::from_mask(&[vec![1, 0], vec![1, 1]]);
        assert_eq!(b.width(), 2);
        assert_eq!(b.height(), 2);
        assert_eq!(b.get(0, 0), Ok(CellStatus::Empty));
        assert_eq!(b.get(1, 0), Err(BoardError::Void { x: 1, y: 0 }));
        assert!(b.is_in_play(1, 1));
        assert!(!b.is_in_play(1, 0));
    }

    #[test]
    fn any_nonzero_mask_value_is_in_play() {
        let b = Board::from_mask(&[vec![7, 2]]);
        assert!(b.is_empty_at(0, 0));
        assert!(b.is_empty_at(1, 0));
    }

    #[test]
    fn get_out_of_range() {
        let b = Board::rectangle(3, 2);
        assert_eq!(b.get(3, 0), Err(BoardError::OutOfRange { x: 3, y: 0 }));
        assert_eq!(b.get(0, 2), Err(BoardError::OutOfRange { x: 0, y: 2 }));
        assert_eq!(b.get(-1, 0), Err(BoardError::OutOfRange { x: -1, y: 0 }));
        assert_eq!(b.get(0, -1), Err(BoardError::OutOfRange { x: 0, y: -1 }));
    }

    #[test]
    fn set_respects_bounds_and_void() {
        let mut b = Board::from_mask(&[vec![1, 0]]);
        assert!(b.set(0, 0, CellStatus::Filled).is_ok());
        assert_eq!(b.get(0, 0), Ok(CellStatus::Filled));
        assert_eq!(b.set(1, 0, CellStatus::Filled), Err(BoardError::Void { x: 1, y: 0 }));
        assert_eq!(b.set(5, 0, CellStatus::Player), Err(BoardError::OutOfRange { x: 5, y: 0 }));
        // Void stays void
        assert!(!b.is_in_play(1, 0));
    }

    #[test]
    fn max_indices_are_one_less_than_dimensions() {
        let b = Board::rectangle(4, 3);
        assert_eq!(b.max_x(), 3);
        assert_eq!(b.max_y(), 2);
    }

    #[test]
    fn empty_mask_has_no_cells() {
        let b = Board::from_mask(&[]);
        assert_eq!(b.width(), 0);
        assert_eq!(b.height(), 0);
        assert!(!b.contains(0, 0));
    }
}
