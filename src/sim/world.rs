/// WorldState: the complete snapshot of a running session.
///
/// ## Shared Board
///
/// One `Board` is the single mutable resource both engines touch:
///   - the placement engine writes `Filled` / `Empty` at drop and pick-up
///   - the movement engine writes `Player` at each committed step
/// All writes happen at discrete decision points (drag end, double-click,
/// debounced key). Nothing mutates the board during a drag or a glide.
///
/// ## Pixel Space
///
/// Details live in a continuous pixel plane. `frame` places the board in
/// that plane; detail rest positions (the tray) sit to the right of it.
/// The renderer maps pixels to terminal cells, the engines never see
/// terminal coordinates.
///
/// ## Draw Order
///
/// `draw_order` lists every detail bottom-to-top. Hit-testing walks it
/// top-down so the piece drawn last is the one picked.

use crate::config::{MovementConfig, PlacementConfig};
use crate::domain::board::Board;
use crate::domain::detail::{Detail, DetailId, Facing, Player, Shape};
use crate::domain::geometry::BoardFrame;
use super::click::ClickTracker;
use super::debounce::Debouncer;
use super::tween::Tweens;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    LevelComplete,
    GameComplete,
}

/// An active drag: which detail and where on it the pointer grabbed.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct DragSession {
    pub id: DetailId,
    /// Pointer minus detail centre at grab time.
    pub grab_dx: f32,
    pub grab_dy: f32,
}

pub struct WorldState {
    // ── Board ──
    pub board: Board,
    pub frame: BoardFrame,

    // ── Entities ──
    pub details: Vec<Detail>,
    pub draw_order: Vec<DetailId>,
    pub player: Option<Player>,

    // ── Interaction ──
    pub drag: Option<DragSession>,
    pub clicks: ClickTracker,
    pub move_requests: Debouncer<Facing>,
    pub tweens: Tweens,
    pub is_win: bool,

    // ── Policy ──
    pub placement: PlacementConfig,
    pub movement: MovementConfig,

    // ── Meta ──
    pub phase: Phase,
    pub current_level: usize,
    pub total_levels: usize,
    pub level_name: String,
    pub clock_ms: u64,

    // ── UI ──
    pub message: String,
    pub message_timer_ms: u64,
}

// ── Construction ──

impl WorldState {
    pub fn new(placement: PlacementConfig, movement: MovementConfig) -> Self {
        WorldState {
            board: Board::rectangle(0, 0),
            frame: BoardFrame::new(0.0, 0.0, 0, 0, 60.0),
            details: vec![],
            draw_order: vec![],
            player: None,
            drag: None,
            clicks: ClickTracker::new(placement.double_click_ms),
            move_requests: Debouncer::new(movement.debounce_ms),
            tweens: Tweens::new(),
            is_win: false,
            placement,
            movement,
            phase: Phase::Playing,
            current_level: 0,
            total_levels: 0,
            level_name: String::new(),
            clock_ms: 0,
            message: String::new(),
            message_timer_ms: 0,
        }
    }

    /// Drop all per-level state before a (re)load. Policy and clock survive.
    pub fn reset_level_state(&mut self, board: Board, frame: BoardFrame) {
        self.board = board;
        self.frame = frame;
        self.details.clear();
        self.draw_order.clear();
        self.player = None;
        self.drag = None;
        self.clicks.reset();
        self.move_requests.cancel();
        self.tweens.clear();
        self.is_win = false;
        self.phase = Phase::Playing;
    }

    pub fn set_message(&mut self, msg: &str, duration_ms: u64) {
        self.message = msg.to_string();
        self.message_timer_ms = duration_ms;
    }
}

// ── Detail queries ──

impl WorldState {
    #[inline]
    pub fn detail(&self, id: DetailId) -> Option<&Detail> {
        self.details.get(id.0)
    }

    /// Append a detail resting at `(start_x, start_y)` and put it on top.
    pub fn add_detail(&mut self, shape: Shape, start_x: f32, start_y: f32) -> DetailId {
        let id = DetailId(self.details.len());
        self.details.push(Detail::new(id, shape, start_x, start_y));
        self.draw_order.push(id);
        id
    }

    /// Raise a detail above its siblings (cosmetic only).
    pub fn bring_to_top(&mut self, id: DetailId) {
        if let Some(pos) = self.draw_order.iter().position(|&d| d == id) {
            self.draw_order.remove(pos);
            self.draw_order.push(id);
        }
    }

    /// Topmost detail with an occupied sub-cell under `(px, py)`.
    /// Empty matrix slots are transparent to clicks.
    pub fn hit_test(&self, px: f32, py: f32) -> Option<DetailId> {
        let cell = self.frame.cell_size;
        self.draw_order.iter().rev().copied().find(|&id| {
            let Some(d) = self.detail(id) else { return false };
            let (w, h) = self.frame.shape_size(&d.shape);
            let lx = (px - (d.x - w / 2.0)) / cell;
            let ly = (py - (d.y - h / 2.0)) / cell;
            if lx < 0.0 || ly < 0.0 {
                return false;
            }
            d.shape.is_set(lx.floor() as usize, ly.floor() as usize)
        })
    }

    /// Details currently committed to the board.
    pub fn placed_count(&self) -> usize {
        self.details.iter().filter(|d| d.is_placed()).count()
    }
}
