/// Pixel ↔ grid conversion for the board.
///
/// Pixel space is continuous (`f32`), grid space is discrete (`i32`).
/// A detail's pixel position is its *centre*; its bounding box is the shape
/// matrix size times `cell_size`. Snapping rounds the box's top-left corner
/// to the nearest lattice point relative to the board origin:
///
/// ```text
///   anchor_x = round((centre_x - origin_x - half_w) / cell_size)
///   snapped_centre_x = origin_x + anchor_x * cell_size + half_w
/// ```
///
/// `f32::round` rounds half away from zero.

use super::detail::{CellAddr, Shape};

/// Result of snapping a free pixel position onto the lattice.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Snap {
    /// Top-left board cell the shape matrix would cover.
    pub anchor: CellAddr,
    /// Pixel centre matching `anchor` exactly.
    pub x: f32,
    pub y: f32,
}

/// The board's placement in pixel space.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct BoardFrame {
    pub origin_x: f32,
    pub origin_y: f32,
    pub cols: usize,
    pub rows: usize,
    pub cell_size: f32,
}

impl BoardFrame {
    pub fn new(origin_x: f32, origin_y: f32, cols: usize, rows: usize, cell_size: f32) -> Self {
        BoardFrame { origin_x, origin_y, cols, rows, cell_size }
    }

    pub fn pixel_width(&self) -> f32 {
        self.cols as f32 * self.cell_size
    }

    pub fn pixel_height(&self) -> f32 {
        self.rows as f32 * self.cell_size
    }

    /// Bounding box size of a shape in pixels.
    pub fn shape_size(&self, shape: &Shape) -> (f32, f32) {
        (
            shape.cols() as f32 * self.cell_size,
            shape.rows() as f32 * self.cell_size,
        )
    }

    /// Round a shape centred at `(x, y)` to the nearest board cell.
    pub fn snap(&self, shape: &Shape, x: f32, y: f32) -> Snap {
        let (w, h) = self.shape_size(shape);
        let ax = ((x - self.origin_x - w / 2.0) / self.cell_size).round() as i32;
        let ay = ((y - self.origin_y - h / 2.0) / self.cell_size).round() as i32;
        Snap {
            anchor: CellAddr::new(ax, ay),
            x: self.origin_x + ax as f32 * self.cell_size + w / 2.0,
            y: self.origin_y + ay as f32 * self.cell_size + h / 2.0,
        }
    }

    /// Does the bounding box of a shape centred at `(x, y)` lie fully inside
    /// the board rectangle? Inclusive at both edges on both axes.
    pub fn contains_shape(&self, shape: &Shape, x: f32, y: f32) -> bool {
        let (w, h) = self.shape_size(shape);
        let left = x - w / 2.0;
        let top = y - h / 2.0;
        left >= self.origin_x
            && left <= self.origin_x + self.pixel_width() - w
            && top >= self.origin_y
            && top <= self.origin_y + self.pixel_height() - h
    }

    /// Does the bounding box of a shape centred at `(x, y)` share any area
    /// with the board rectangle? Touching edges do not count.
    pub fn overlaps_shape(&self, shape: &Shape, x: f32, y: f32) -> bool {
        let (w, h) = self.shape_size(shape);
        let left = x - w / 2.0;
        let top = y - h / 2.0;
        left < self.origin_x + self.pixel_width()
            && left + w > self.origin_x
            && top < self.origin_y + self.pixel_height()
            && top + h > self.origin_y
    }

    /// Pixel top-left of a board cell. Works for the `y == -1` row too.
    pub fn cell_origin(&self, cell: CellAddr) -> (f32, f32) {
        (
            self.origin_x + cell.x as f32 * self.cell_size,
            self.origin_y + cell.y as f32 * self.cell_size,
        )
    }
}

/// Straight-line distance between two pixel points.
pub fn distance(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt()
}
