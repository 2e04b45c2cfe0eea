/// Entities: Detail (draggable polyomino) and the walking character.
///
/// A detail owns two shapes: the live `shape` (current orientation) and the
/// `initial` shape it reverts to when it leaves the board. Both are plain
/// values; resetting orientation is a copy, never a shared reference.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

/// Board-relative cell address. `y == -1` is the open-air row above the board.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct CellAddr {
    pub x: i32,
    pub y: i32,
}

impl CellAddr {
    pub fn new(x: i32, y: i32) -> Self {
        CellAddr { x, y }
    }
}

/// Occupancy matrix of a polyomino: `rows[y][x] == true` marks a sub-cell.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Shape {
    rows: Vec<Vec<bool>>,
}

impl Shape {
    /// Build from a 0/1 matrix. Any nonzero value marks a sub-cell.
    pub fn from_matrix(matrix: &[Vec<u8>]) -> Self {
        Shape {
            rows: matrix.iter().map(|r| r.iter().map(|&v| v != 0).collect()).collect(),
        }
    }

    /// Columns of the bounding matrix.
    pub fn cols(&self) -> usize {
        self.rows.first().map_or(0, |r| r.len())
    }

    /// Rows of the bounding matrix.
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        self.rows.get(y).and_then(|r| r.get(x)).copied().unwrap_or(false)
    }

    /// Local offsets `(dx, dy)` of every occupied sub-cell, row-major.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter().enumerate().filter(|&(_, &on)| on).map(move |(x, _)| (x, y))
        })
    }

    pub fn cell_count(&self) -> usize {
        self.occupied().count()
    }

    /// 90° clockwise: new[y][x] = old[rows - 1 - x][y].
    pub fn rotated_clockwise(&self) -> Shape {
        let (w, h) = (self.cols(), self.rows());
        let rows = (0..w)
            .map(|y| (0..h).map(|x| self.rows[h - 1 - x][y]).collect())
            .collect();
        Shape { rows }
    }
}

/// Stable handle into `WorldState::details`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DetailId(pub usize);

#[derive(Clone, Debug)]
pub struct Detail {
    pub id: DetailId,
    /// Current orientation.
    pub shape: Shape,
    /// Orientation restored on return to rest.
    pub initial: Shape,
    /// Pixel centre (tweened while gliding).
    pub x: f32,
    pub y: f32,
    /// Rest position outside the board.
    pub start_x: f32,
    pub start_y: f32,
    /// Quarter turns applied since the last reset (cosmetic).
    pub rotation: u8,
    /// Active manipulation flag.
    pub is_dragged: bool,
    /// Accepts a new drag gesture.
    pub draggable: bool,
    /// Accepts any pointer interaction at all (cleared on win).
    pub interactive: bool,
    /// Snapped anchor of the committed footprint, if on the board.
    pub placed_at: Option<CellAddr>,
}

impl Detail {
    pub fn new(id: DetailId, shape: Shape, start_x: f32, start_y: f32) -> Self {
        Detail {
            id,
            initial: shape.clone(),
            shape,
            x: start_x,
            y: start_y,
            start_x,
            start_y,
            rotation: 0,
            is_dragged: false,
            draggable: true,
            interactive: true,
            placed_at: None,
        }
    }

    pub fn is_placed(&self) -> bool {
        self.placed_at.is_some()
    }

    pub fn rotate_clockwise(&mut self) {
        self.shape = self.shape.rotated_clockwise();
        self.rotation = (self.rotation + 1) % 4;
    }

    /// Copy-assign the initial orientation back.
    pub fn reset_rotation(&mut self) {
        self.shape = self.initial.clone();
        self.rotation = 0;
    }
}

/// The walking character. Grid position is authoritative; `visual_*` is
/// the pixel position the renderer draws (driven by glides).
#[derive(Clone, Debug)]
pub struct Player {
    pub pos: CellAddr,
    pub facing: Facing,
    pub visual_x: f32,
    pub visual_y: f32,
}

impl Player {
    pub fn new(pos: CellAddr, visual_x: f32, visual_y: f32) -> Self {
        Player { pos, facing: Facing::Right, visual_x, visual_y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(rows: &[&str]) -> Shape {
        let m: Vec<Vec<u8>> = rows
            .iter()
            .map(|r| r.chars().map(|c| u8::from(c == '#')).collect())
            .collect();
        Shape::from_matrix(&m)
    }

    #[test]
    fn occupied_is_row_major() {
        let s = shape(&["#.", "##"]);
        let cells: Vec<_> = s.occupied().collect();
        assert_eq!(cells, vec![(0, 0), (0, 1), (1, 1)]);
        assert_eq!(s.cell_count(), 3);
    }

    #[test]
    fn rotate_l_piece() {
        // #.      ###
        // #.  →   #..
        // ##
        let s = shape(&["#.", "#.", "##"]);
        let r = s.rotated_clockwise();
        assert_eq!(r, shape(&["###", "#.."]));
        assert_eq!(r.cols(), 3);
        assert_eq!(r.rows(), 2);
    }

    #[test]
    fn four_rotations_are_identity() {
        let s = shape(&["##.", ".##"]);
        let r = s.rotated_clockwise().rotated_clockwise().rotated_clockwise().rotated_clockwise();
        assert_eq!(r, s);
    }

    #[test]
    fn reset_rotation_restores_initial_copy() {
        let mut d = Detail::new(DetailId(0), shape(&["##", "#."]), 10.0, 20.0);
        d.rotate_clockwise();
        assert_ne!(d.shape, d.initial);
        assert_eq!(d.rotation, 1);
        d.reset_rotation();
        assert_eq!(d.shape, d.initial);
        assert_eq!(d.rotation, 0);
        // Mutating the live shape never touches the initial one
        d.rotate_clockwise();
        assert_eq!(d.initial, shape(&["##", "#."]));
    }

    #[test]
    fn new_detail_rests_at_start() {
        let d = Detail::new(DetailId(3), shape(&["#"]), 5.0, 6.0);
        assert_eq!((d.x, d.y), (5.0, 6.0));
        assert!(d.draggable);
        assert!(d.interactive);
        assert!(!d.is_placed());
    }

    #[test]
    fn out_of_matrix_lookup_is_unset() {
        let s = shape(&["#"]);
        assert!(s.is_set(0, 0));
        assert!(!s.is_set(1, 0));
        assert!(!s.is_set(0, 1));
    }
}
