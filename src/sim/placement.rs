/// Placement engine: drag, drop, pick-up, rotate, win.
///
/// Gesture flow for one detail:
///
/// ```text
///   pointer_down ──▶ begin_drag ──▶ drag_move* ──▶ drag_end
///                                                    │
///                     ┌──────────────────────────────┤
///                     ▼                              ▼
///              snapped box inside board?      no ──▶ return_to_rest
///                     │ yes
///                     ▼
///              footprint all Empty? ── no ──▶ return_to_rest
///                     │ yes
///                     ▼
///              commit Filled, snap position, check_win
/// ```
///
/// A committed detail stays non-draggable. The only way off the board is
/// a double-click (`pick_up`), which clears exactly the committed footprint.
/// Board cells change only inside `drag_end` and `pick_up`.

use tracing::{debug, info, instrument};

use crate::domain::detail::{CellAddr, DetailId};
use crate::domain::rules;
use super::event::GameEvent;
use super::tween::GlideTarget;
use super::world::{DragSession, Phase, WorldState};

/// What a drag end did.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DropOutcome {
    /// Committed with its matrix's top-left at this board cell.
    Placed(CellAddr),
    /// Dropped clear of the board and sent back to its rest position.
    Returned,
    /// Dropped over the board where it does not fit; sent back to rest.
    Rejected,
    /// No drag was in progress.
    Ignored,
}

// ══════════════════════════════════════════════════════════════
// Pointer entry points
// ══════════════════════════════════════════════════════════════

/// Pointer pressed at `(px, py)` over `hit` (already hit-tested by the UI).
///
/// Feeds the double-click tracker first; a completed double-click on a
/// placed detail picks it up and ends the gesture. Otherwise a resting
/// detail starts a drag.
pub fn pointer_down(
    world: &mut WorldState,
    hit: Option<DetailId>,
    px: f32,
    py: f32,
    now_ms: u64,
    events: &mut Vec<GameEvent>,
) {
    if world.is_win {
        world.clicks.reset();
        return;
    }

    let armable = hit
        .and_then(|id| world.detail(id))
        .map_or(false, |d| d.interactive && d.is_placed());

    if world.clicks.press(hit, armable, now_ms) {
        if let Some(id) = hit {
            pick_up(world, id, events);
        }
        return;
    }

    let Some(id) = hit else { return };
    let Some(d) = world.detail(id) else { return };
    if !d.interactive {
        return;
    }
    let draggable = d.draggable;
    world.bring_to_top(id);
    if draggable {
        begin_drag(world, id, px, py, events);
    }
}

/// Start a drag session on `id`, grabbed at pointer `(px, py)`.
/// Returns `false` if the detail does not accept a drag right now.
pub fn begin_drag(world: &mut WorldState, id: DetailId, px: f32, py: f32, events: &mut Vec<GameEvent>) -> bool {
    if world.is_win {
        return false;
    }
    let frame = world.frame;
    let Some(d) = world.details.get_mut(id.0) else { return false };
    if !d.draggable || !d.interactive {
        return false;
    }

    d.draggable = false;
    d.is_dragged = true;
    let (x, y) = (d.x, d.y);
    let snap = frame.snap(&d.shape, x, y);
    let over_board = frame.contains_shape(&d.shape, snap.x, snap.y);

    world.tweens.cancel(GlideTarget::Detail(id));
    world.drag = Some(DragSession { id, grab_dx: px - x, grab_dy: py - y });
    world.bring_to_top(id);
    events.push(GameEvent::DragStarted { id });
    debug!(detail = id.0, over_board, "drag started");
    true
}

/// Follow the pointer. No grid interaction happens while dragging.
pub fn drag_move(world: &mut WorldState, px: f32, py: f32) {
    let Some(session) = world.drag else { return };
    if let Some(d) = world.details.get_mut(session.id.0) {
        d.x = px - session.grab_dx;
        d.y = py - session.grab_dy;
        d.is_dragged = true;
    }
}

/// Finish the drag: snap, bounds test, fit test, then commit or return.
#[instrument(skip_all)]
pub fn drag_end(world: &mut WorldState, events: &mut Vec<GameEvent>) -> DropOutcome {
    let Some(session) = world.drag.take() else { return DropOutcome::Ignored };
    let id = session.id;
    let frame = world.frame;

    let Some(d) = world.details.get_mut(id.0) else { return DropOutcome::Ignored };
    d.is_dragged = false;
    let snap = frame.snap(&d.shape, d.x, d.y);

    if !frame.contains_shape(&d.shape, snap.x, snap.y) {
        let over_board = frame.overlaps_shape(&d.shape, d.x, d.y);
        debug!(detail = id.0, x = snap.anchor.x, y = snap.anchor.y, over_board, "dropped outside the board");
        return_to_rest(world, id, events);
        return if over_board { DropOutcome::Rejected } else { DropOutcome::Returned };
    }

    if !rules::commit_shape(&mut world.board, &d.shape, snap.anchor) {
        debug!(detail = id.0, x = snap.anchor.x, y = snap.anchor.y, "shape does not fit");
        return_to_rest(world, id, events);
        return DropOutcome::Rejected;
    }

    d.x = snap.x;
    d.y = snap.y;
    d.placed_at = Some(snap.anchor);
    events.push(GameEvent::DetailPlaced { id, anchor: snap.anchor });
    info!(detail = id.0, x = snap.anchor.x, y = snap.anchor.y, "detail placed");

    check_win(world, events);
    DropOutcome::Placed(snap.anchor)
}

// ══════════════════════════════════════════════════════════════
// Detail operations
// ══════════════════════════════════════════════════════════════

/// Remove a placed detail from the board and send it home.
/// Returns `false` if the detail is not on the board or the game is won.
pub fn pick_up(world: &mut WorldState, id: DetailId, events: &mut Vec<GameEvent>) -> bool {
    if world.is_win {
        return false;
    }
    let Some(d) = world.details.get_mut(id.0) else { return false };
    let Some(anchor) = d.placed_at else { return false };

    rules::clear_shape(&mut world.board, &d.shape, anchor);
    d.is_dragged = true;
    events.push(GameEvent::DetailPickedUp { id });
    info!(detail = id.0, x = anchor.x, y = anchor.y, "detail picked up");

    return_to_rest(world, id, events);
    true
}

/// Glide a detail back to its rest position and make it draggable again.
/// Orientation resets when `reset_rotation_on_return` is set.
pub fn return_to_rest(world: &mut WorldState, id: DetailId, events: &mut Vec<GameEvent>) {
    let speed = world.placement.glide_px_per_ms;
    let reset = world.placement.reset_rotation_on_return;
    let Some(d) = world.details.get_mut(id.0) else { return };

    if reset {
        d.reset_rotation();
    }
    d.placed_at = None;
    d.is_dragged = false;
    d.draggable = true;

    let from = (d.x, d.y);
    let to = (d.start_x, d.start_y);
    let duration = world.tweens.glide(GlideTarget::Detail(id), from, to, speed);
    events.push(GameEvent::DetailReturned { id });
    debug!(detail = id.0, duration_ms = duration, "returning to rest");
}

/// Rotate a detail 90° clockwise about its centre.
/// Only off-board details rotate, and only while the game is running.
pub fn rotate(world: &mut WorldState, id: DetailId, events: &mut Vec<GameEvent>) -> bool {
    if !world.placement.rotatable || world.is_win {
        return false;
    }
    let Some(d) = world.details.get_mut(id.0) else { return false };
    if !d.interactive || d.is_placed() {
        return false;
    }
    d.rotate_clockwise();
    events.push(GameEvent::DetailRotated { id });
    true
}

/// Win rule check after a placement. Winning is irreversible for the level:
/// every detail stops accepting input. The character keeps walking.
pub fn check_win(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    if world.is_win || !rules::is_complete(&world.board) {
        return world.is_win;
    }
    world.is_win = true;
    for d in &mut world.details {
        d.interactive = false;
        d.draggable = false;
    }
    world.drag = None;
    world.clicks.reset();
    world.phase = Phase::LevelComplete;
    events.push(GameEvent::BoardCompleted);
    info!(level = world.current_level, "board complete");
    true
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::board::Board;
    use crate::domain::cell::CellStatus;
    use crate::domain::detail::Shape;
    use crate::domain::geometry::BoardFrame;

    const CELL: f32 = 10.0;

    /// 2×2 board at the pixel origin, 10px cells.
    fn world(cols: usize, rows: usize) -> WorldState {
        let cfg = GameConfig::default();
        let mut w = WorldState::new(cfg.placement, cfg.movement);
        w.reset_level_state(
            Board::rectangle(cols, rows),
            BoardFrame::new(0.0, 0.0, cols, rows, CELL),
        );
        w
    }

    fn shape(rows: &[&str]) -> Shape {
        let m: Vec<Vec<u8>> = rows
            .iter()
            .map(|r| r.chars().map(|c| u8::from(c == '#')).collect())
            .collect();
        Shape::from_matrix(&m)
    }

    /// Centre pixel that anchors `s` at board cell `(ax, ay)`.
    fn centre_for(s: &Shape, ax: i32, ay: i32) -> (f32, f32) {
        (
            ax as f32 * CELL + s.cols() as f32 * CELL / 2.0,
            ay as f32 * CELL + s.rows() as f32 * CELL / 2.0,
        )
    }

    /// Full gesture: grab at the centre, drag to `(cx, cy)`, release.
    fn drop_at(w: &mut WorldState, id: DetailId, cx: f32, cy: f32, now: u64) -> DropOutcome {
        let (x, y) = {
            let d = w.detail(id).unwrap();
            (d.x, d.y)
        };
        let mut ev = vec![];
        pointer_down(w, Some(id), x, y, now, &mut ev);
        drag_move(w, cx, cy);
        drag_end(w, &mut ev)
    }

    fn place(w: &mut WorldState, id: DetailId, ax: i32, ay: i32, now: u64) -> DropOutcome {
        let (cx, cy) = centre_for(&w.detail(id).unwrap().shape, ax, ay);
        drop_at(w, id, cx, cy, now)
    }

    fn filled(w: &WorldState) -> Vec<(i32, i32)> {
        let mut out = vec![];
        for y in 0..w.board.height() as i32 {
            for x in 0..w.board.width() as i32 {
                if w.board.get(x, y) == Ok(CellStatus::Filled) {
                    out.push((x, y));
                }
            }
        }
        out
    }

    // ── drop ──

    #[test]
    fn drop_snaps_to_nearest_cell() {
        let mut w = world(2, 2);
        let id = w.add_detail(shape(&["##"]), 100.0, 100.0);
        // Ideal centre for anchor (0,0) is (10, 5); drop a little off
        let out = drop_at(&mut w, id, 12.0, 7.0, 0);
        assert_eq!(out, DropOutcome::Placed(CellAddr::new(0, 0)));
        let d = w.detail(id).unwrap();
        assert_eq!((d.x, d.y), (10.0, 5.0));
        assert_eq!(d.placed_at, Some(CellAddr::new(0, 0)));
        assert_eq!(filled(&w), vec![(0, 0), (1, 0)]);
    }

    #[test]
    fn grab_offset_is_preserved() {
        let mut w = world(2, 2);
        let id = w.add_detail(shape(&["##"]), 100.0, 100.0);
        let mut ev = vec![];
        // Grab 4px right of centre
        pointer_down(&mut w, Some(id), 104.0, 100.0, 0, &mut ev);
        drag_move(&mut w, 54.0, 20.0);
        let d = w.detail(id).unwrap();
        assert_eq!((d.x, d.y), (50.0, 20.0));
        assert!(d.is_dragged);
    }

    #[test]
    fn drop_outside_returns_home() {
        let mut w = world(2, 2);
        let id = w.add_detail(shape(&["##"]), 100.0, 100.0);
        let out = drop_at(&mut w, id, 60.0, 60.0, 0);
        assert_eq!(out, DropOutcome::Returned);
        assert!(filled(&w).is_empty());
        let d = w.detail(id).unwrap();
        assert!(d.draggable);
        assert!(!d.is_placed());
        assert!(w.tweens.is_gliding(GlideTarget::Detail(id)));
    }

    #[test]
    fn snapped_box_overhanging_edge_is_outside() {
        let mut w = world(2, 2);
        let id = w.add_detail(shape(&["##"]), 100.0, 100.0);
        // Centre 19 → left 9 → rounds to anchor 1 → box 10..30 > 20
        assert_eq!(drop_at(&mut w, id, 19.0, 5.0, 0), DropOutcome::Rejected);
        assert!(filled(&w).is_empty());
    }

    #[test]
    fn click_without_drag_goes_home_quietly() {
        let mut w = world(2, 2);
        let id = w.add_detail(shape(&["##"]), 100.0, 100.0);
        let mut ev = vec![];
        pointer_down(&mut w, Some(id), 100.0, 100.0, 0, &mut ev);
        assert_eq!(drag_end(&mut w, &mut ev), DropOutcome::Returned);
        let d = w.detail(id).unwrap();
        assert!(d.draggable);
        assert!(!d.is_placed());
    }

    #[test]
    fn drag_end_without_session_is_ignored() {
        let mut w = world(2, 2);
        let mut ev = vec![];
        assert_eq!(drag_end(&mut w, &mut ev), DropOutcome::Ignored);
        assert!(ev.is_empty());
    }

    // ── fit ──

    #[test]
    fn same_spot_twice_fails_second_time() {
        let mut w = world(2, 2);
        let a = w.add_detail(shape(&["##"]), 100.0, 100.0);
        let b = w.add_detail(shape(&["##"]), 100.0, 140.0);
        assert_eq!(place(&mut w, a, 0, 0, 0), DropOutcome::Placed(CellAddr::new(0, 0)));
        assert_eq!(place(&mut w, b, 0, 0, 1000), DropOutcome::Rejected);
        assert_eq!(filled(&w), vec![(0, 0), (1, 0)]);
        assert!(!w.detail(b).unwrap().is_placed());
    }

    #[test]
    fn misfit_commits_nothing() {
        let mut w = world(2, 2);
        let dot = w.add_detail(shape(&["#"]), 100.0, 100.0);
        let square = w.add_detail(shape(&["##", "##"]), 100.0, 140.0);
        place(&mut w, dot, 1, 1, 0);
        // Square fails on its last sub-cell; the first three stay Empty
        assert_eq!(place(&mut w, square, 0, 0, 1000), DropOutcome::Rejected);
        assert_eq!(filled(&w), vec![(1, 1)]);
    }

    #[test]
    fn void_cells_reject_placement() {
        let cfg = GameConfig::default();
        let mut w = WorldState::new(cfg.placement, cfg.movement);
        w.reset_level_state(
            Board::from_mask(&[vec![1, 0], vec![1, 1]]),
            BoardFrame::new(0.0, 0.0, 2, 2, CELL),
        );
        let bar = w.add_detail(shape(&["##"]), 100.0, 100.0);
        assert_eq!(place(&mut w, bar, 0, 0, 0), DropOutcome::Rejected);
        assert_eq!(place(&mut w, bar, 0, 1, 1000), DropOutcome::Placed(CellAddr::new(0, 1)));
    }

    // ── pick-up ──

    #[test]
    fn double_click_round_trip() {
        let mut w = world(2, 2);
        let id = w.add_detail(shape(&["#.", "##"]), 100.0, 100.0);
        place(&mut w, id, 0, 0, 0);
        assert_eq!(filled(&w), vec![(0, 0), (0, 1), (1, 1)]);

        let (x, y) = (5.0, 5.0); // top-left sub-cell
        let mut ev = vec![];
        pointer_down(&mut w, Some(id), x, y, 1000, &mut ev);
        assert!(w.drag.is_none(), "placed detail must not start a drag");
        assert!(w.detail(id).unwrap().is_placed());

        pointer_down(&mut w, Some(id), x, y, 1200, &mut ev);
        assert!(filled(&w).is_empty());
        assert!(ev.contains(&GameEvent::DetailPickedUp { id }));
        assert!(ev.contains(&GameEvent::DetailReturned { id }));

        let d = w.detail(id).unwrap();
        assert!(!d.is_placed());
        assert!(d.draggable);
        let end = w.tweens.advance(1.0e6);
        assert_eq!(end, vec![(GlideTarget::Detail(id), (100.0, 100.0))]);
    }

    #[test]
    fn slow_second_click_does_not_pick_up() {
        let mut w = world(2, 2);
        let id = w.add_detail(shape(&["#"]), 100.0, 100.0);
        place(&mut w, id, 0, 0, 0);
        let mut ev = vec![];
        pointer_down(&mut w, Some(id), 5.0, 5.0, 1000, &mut ev);
        pointer_down(&mut w, Some(id), 5.0, 5.0, 1400, &mut ev);
        assert!(w.detail(id).unwrap().is_placed());
        assert_eq!(filled(&w), vec![(0, 0)]);
    }

    #[test]
    fn pick_up_resting_detail_is_noop() {
        let mut w = world(2, 2);
        let id = w.add_detail(shape(&["#"]), 100.0, 100.0);
        let mut ev = vec![];
        assert!(!pick_up(&mut w, id, &mut ev));
        assert!(ev.is_empty());
    }

    // ── rotation ──

    #[test]
    fn rotation_resets_on_return() {
        let mut w = world(2, 2);
        let id = w.add_detail(shape(&["##"]), 100.0, 100.0);
        let mut ev = vec![];
        assert!(rotate(&mut w, id, &mut ev));
        assert_eq!(w.detail(id).unwrap().shape, shape(&["#", "#"]));
        drop_at(&mut w, id, 60.0, 60.0, 0);
        assert_eq!(w.detail(id).unwrap().shape, shape(&["##"]));
    }

    #[test]
    fn rotation_kept_when_reset_disabled() {
        let mut w = world(2, 2);
        w.placement.reset_rotation_on_return = false;
        let id = w.add_detail(shape(&["##"]), 100.0, 100.0);
        let mut ev = vec![];
        rotate(&mut w, id, &mut ev);
        drop_at(&mut w, id, 60.0, 60.0, 0);
        assert_eq!(w.detail(id).unwrap().shape, shape(&["#", "#"]));
    }

    #[test]
    fn placed_detail_does_not_rotate() {
        let mut w = world(2, 2);
        let id = w.add_detail(shape(&["##"]), 100.0, 100.0);
        place(&mut w, id, 0, 0, 0);
        let mut ev = vec![];
        assert!(!rotate(&mut w, id, &mut ev));
    }

    // ── win ──

    #[test]
    fn three_of_four_is_not_a_win() {
        let mut w = world(2, 2);
        let bar = w.add_detail(shape(&["##"]), 100.0, 100.0);
        let dot = w.add_detail(shape(&["#"]), 100.0, 140.0);
        place(&mut w, bar, 0, 0, 0);
        place(&mut w, dot, 0, 1, 1000);
        assert!(!w.is_win);
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn four_of_four_wins_and_locks_details() {
        let mut w = world(2, 2);
        let bar = w.add_detail(shape(&["##"]), 100.0, 100.0);
        let a = w.add_detail(shape(&["#"]), 100.0, 140.0);
        let b = w.add_detail(shape(&["#"]), 100.0, 180.0);
        place(&mut w, bar, 0, 0, 0);
        place(&mut w, a, 0, 1, 1000);

        let (cx, cy) = centre_for(&w.detail(b).unwrap().shape, 1, 1);
        let mut ev = vec![];
        pointer_down(&mut w, Some(b), 100.0, 180.0, 2000, &mut ev);
        drag_move(&mut w, cx, cy);
        drag_end(&mut w, &mut ev);

        assert!(w.is_win);
        assert_eq!(w.phase, Phase::LevelComplete);
        assert!(ev.contains(&GameEvent::BoardCompleted));
        assert!(w.details.iter().all(|d| !d.interactive && !d.draggable));

        // Double-click after the win does nothing
        let mut ev = vec![];
        pointer_down(&mut w, Some(a), 5.0, 15.0, 3000, &mut ev);
        pointer_down(&mut w, Some(a), 5.0, 15.0, 3100, &mut ev);
        assert!(ev.is_empty());
        assert_eq!(filled(&w).len(), 4);
        assert!(!rotate(&mut w, a, &mut ev));
    }

    #[test]
    fn void_cells_do_not_block_win() {
        let cfg = GameConfig::default();
        let mut w = WorldState::new(cfg.placement, cfg.movement);
        w.reset_level_state(
            Board::from_mask(&[vec![1, 0], vec![1, 1]]),
            BoardFrame::new(0.0, 0.0, 2, 2, CELL),
        );
        let l = w.add_detail(shape(&["#.", "##"]), 100.0, 100.0);
        place(&mut w, l, 0, 0, 0);
        assert!(w.is_win);
    }

    #[test]
    fn walking_survives_the_win() {
        use crate::domain::detail::{CellAddr, Facing, Player};
        use crate::sim::step;

        let mut w = world(2, 1);
        w.player = Some(Player::new(CellAddr::new(0, -1), 0.0, -CELL));
        let bar = w.add_detail(shape(&["##"]), 100.0, 100.0);

        step::request_move(&mut w, Facing::Right, 0);
        assert_eq!(place(&mut w, bar, 0, 0, 10), DropOutcome::Placed(CellAddr::new(0, 0)));
        assert_eq!(w.phase, Phase::LevelComplete);

        let mut ev = vec![];
        step::tick(&mut w, 300, 300, &mut ev);
        assert_eq!(w.player.as_ref().unwrap().pos, CellAddr::new(1, -1));
    }
}
