/// Placement rules and the win rule: truth-table driven.
///
/// Pure functions over the board. `can_place` decides, `commit_shape` and
/// `clear_shape` mutate; nothing here knows about pixels or input.
///
/// ## Shape-fit Truth Table
///
/// For every occupied sub-cell `(dx, dy)` of the shape, look at board cell
/// `(anchor.x + dx, anchor.y + dy)`:
/// ┌──────────────────────────────┬───────────────┐
/// │ Board cell                    │ Fit?          │
/// ├──────────────────────────────┼───────────────┤
/// │ outside the rectangle         │ DENY (whole)  │
/// │ void (not in the mask)        │ DENY (whole)  │
/// │ Filled                        │ DENY (whole)  │
/// │ Player                        │ DENY (whole)  │
/// │ Empty                         │ ok            │
/// └──────────────────────────────┴───────────────┘
/// Unoccupied sub-cells of the matrix are never inspected.
/// One DENY rejects the entire placement; nothing is written.
///
/// ## Win Rule
/// ┌──────────────────────────────┬───────────────┐
/// │ Row-major scan finds          │ Result        │
/// ├──────────────────────────────┼───────────────┤
/// │ an in-play cell not Filled    │ not won (stop)│
/// │ only Filled in-play cells     │ won           │
/// └──────────────────────────────┴───────────────┘
/// Void cells are skipped: they are not part of the board.

use super::board::Board;
use super::cell::CellStatus;
use super::detail::{CellAddr, Shape};

/// Board cells a shape would cover when anchored at `anchor`.
pub fn footprint(shape: &Shape, anchor: CellAddr) -> impl Iterator<Item = CellAddr> + '_ {
    shape
        .occupied()
        .map(move |(dx, dy)| CellAddr::new(anchor.x + dx as i32, anchor.y + dy as i32))
}

/// Shape-fit test. See truth table above.
pub fn can_place(board: &Board, shape: &Shape, anchor: CellAddr) -> bool {
    footprint(shape, anchor).all(|c| board.is_empty_at(c.x, c.y))
}

/// Atomic commit: every covered cell becomes `Filled`, or nothing changes.
/// Returns whether the shape was committed.
pub fn commit_shape(board: &mut Board, shape: &Shape, anchor: CellAddr) -> bool {
    if !can_place(board, shape, anchor) {
        return false;
    }
    for c in footprint(shape, anchor) {
        // Every cell was just checked Empty, so set cannot fail.
        let _ = board.set(c.x, c.y, CellStatus::Filled);
    }
    true
}

/// Revert a committed footprint: covered `Filled` cells become `Empty`.
/// Cells holding anything else are left alone.
pub fn clear_shape(board: &mut Board, shape: &Shape, anchor: CellAddr) {
    for c in footprint(shape, anchor) {
        if matches!(board.get(c.x, c.y), Ok(CellStatus::Filled)) {
            let _ = board.set(c.x, c.y, CellStatus::Empty);
        }
    }
}

/// Win rule. Early-exits on the first in-play cell that is not `Filled`.
pub fn is_complete(board: &Board) -> bool {
    for row in board.rows() {
        for cell in row.iter().flatten() {
            if !cell.is_filled() {
                return false;
            }
        }
    }
    true
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: board from a diagram.
    /// Legend: '.'=Empty  '#'=Filled  'P'=Player  ' '=void
    fn board_from(rows: &[&str]) -> Board {
        let mask: Vec<Vec<u8>> = rows
            .iter()
            .map(|r| r.chars().map(|c| u8::from(c != ' ')).collect())
            .collect();
        let mut b = Board::from_mask(&mask);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let status = match ch {
                    '#' => CellStatus::Filled,
                    'P' => CellStatus::Player,
                    _ => continue,
                };
                b.set(x as i32, y as i32, status).unwrap();
            }
        }
        b
    }

    fn shape(rows: &[&str]) -> Shape {
        let m: Vec<Vec<u8>> = rows
            .iter()
            .map(|r| r.chars().map(|c| u8::from(c == '#')).collect())
            .collect();
        Shape::from_matrix(&m)
    }

    fn snapshot(b: &Board) -> Vec<Vec<Option<CellStatus>>> {
        b.rows().to_vec()
    }

    // ── can_place ──

    #[test]
    fn fits_on_empty_region() {
        let b = board_from(&["...", "..."]);
        assert!(can_place(&b, &shape(&["##", "#."]), CellAddr::new(0, 0)));
        assert!(can_place(&b, &shape(&["##", "#."]), CellAddr::new(1, 0)));
    }

    #[test]
    fn rejects_overlap_with_filled() {
        let b = board_from(&[".#.", "..."]);
        assert!(!can_place(&b, &shape(&["##"]), CellAddr::new(0, 0)));
        assert!(!can_place(&b, &shape(&["##"]), CellAddr::new(1, 0)));
    }

    #[test]
    fn unoccupied_subcells_ignore_board() {
        // The '.' in the shape sits over a Filled cell, still fits
        let b = board_from(&["#.", ".."]);
        assert!(can_place(&b, &shape(&[".#", "##"]), CellAddr::new(0, 0)));
    }

    #[test]
    fn rejects_out_of_bounds() {
        let b = board_from(&["..", ".."]);
        assert!(!can_place(&b, &shape(&["##"]), CellAddr::new(1, 0)));
        assert!(!can_place(&b, &shape(&["#"]), CellAddr::new(-1, 0)));
        assert!(!can_place(&b, &shape(&["#", "#"]), CellAddr::new(0, 1)));
    }

    #[test]
    fn rejects_void_cells() {
        let b = board_from(&[". ", ".."]);
        assert!(!can_place(&b, &shape(&["##"]), CellAddr::new(0, 0)));
        assert!(can_place(&b, &shape(&["#.", "##"]), CellAddr::new(0, 0)));
    }

    #[test]
    fn rejects_player_cell() {
        let b = board_from(&[".P"]);
        assert!(!can_place(&b, &shape(&["##"]), CellAddr::new(0, 0)));
    }

    #[test]
    fn single_cell_shape() {
        let b = board_from(&[".#"]);
        assert!(can_place(&b, &shape(&["#"]), CellAddr::new(0, 0)));
        assert!(!can_place(&b, &shape(&["#"]), CellAddr::new(1, 0)));
    }

    // ── commit_shape ──

    #[test]
    fn commit_fills_only_occupied_subcells() {
        let mut b = board_from(&["..", ".."]);
        assert!(commit_shape(&mut b, &shape(&["##", "#."]), CellAddr::new(0, 0)));
        assert_eq!(snapshot(&b), snapshot(&board_from(&["##", "#."])));
    }

    #[test]
    fn second_commit_at_same_anchor_fails() {
        let mut b = board_from(&["...", "..."]);
        let s = shape(&["##"]);
        assert!(commit_shape(&mut b, &s, CellAddr::new(1, 1)));
        assert!(!commit_shape(&mut b, &s, CellAddr::new(1, 1)));
        assert_eq!(snapshot(&b), snapshot(&board_from(&["...", ".##"])));
    }

    #[test]
    fn failed_commit_is_atomic() {
        // Last sub-cell (row-major) hits a Filled cell; earlier ones are Empty
        let mut b = board_from(&["...", "..#"]);
        let before = snapshot(&b);
        assert!(!commit_shape(&mut b, &shape(&["###", "..#"]), CellAddr::new(0, 0)));
        assert_eq!(snapshot(&b), before);
    }

    #[test]
    fn failed_commit_out_of_bounds_is_atomic() {
        let mut b = board_from(&["..", ".."]);
        let before = snapshot(&b);
        assert!(!commit_shape(&mut b, &shape(&["###"]), CellAddr::new(0, 1)));
        assert_eq!(snapshot(&b), before);
    }

    // ── clear_shape ──

    #[test]
    fn clear_restores_empty() {
        let mut b = board_from(&["..", ".."]);
        let before = snapshot(&b);
        let s = shape(&["#.", "##"]);
        assert!(commit_shape(&mut b, &s, CellAddr::new(0, 0)));
        clear_shape(&mut b, &s, CellAddr::new(0, 0));
        assert_eq!(snapshot(&b), before);
    }

    #[test]
    fn clear_leaves_other_footprints() {
        let mut b = board_from(&["...."]);
        let s = shape(&["##"]);
        assert!(commit_shape(&mut b, &s, CellAddr::new(0, 0)));
        assert!(commit_shape(&mut b, &s, CellAddr::new(2, 0)));
        clear_shape(&mut b, &s, CellAddr::new(0, 0));
        assert_eq!(snapshot(&b), snapshot(&board_from(&["..##"])));
    }

    #[test]
    fn clear_never_touches_player() {
        let mut b = board_from(&["P."]);
        clear_shape(&mut b, &shape(&["##"]), CellAddr::new(0, 0));
        assert_eq!(b.get(0, 0), Ok(CellStatus::Player));
    }

    // ── is_complete ──

    #[test]
    fn full_board_is_complete() {
        assert!(is_complete(&board_from(&["##", "##"])));
    }

    #[test]
    fn one_empty_cell_is_not_complete() {
        assert!(!is_complete(&board_from(&["##", "#."])));
        assert!(!is_complete(&board_from(&[".#", "##"])));
    }

    #[test]
    fn player_cell_is_not_complete() {
        assert!(!is_complete(&board_from(&["#P"])));
    }

    #[test]
    fn void_cells_do_not_block_win() {
        assert!(is_complete(&board_from(&["# ", "##"])));
    }
}
