/// The step function: advances the session by one frame.
///
/// Processing order inside `tick`:
///   1. Debounced move request (at most one grid step per frame)
///   2. Double-click window expiry
///   3. Glides (visual positions only)
///   4. Message timer
///
/// Logical state never waits on a glide: a step commits to the board and to
/// `Player::pos` first, then schedules the visual move.
///
/// ## Vacated Cell
/// ┌──────────────────────┬─────────────────────────────────────┐
/// │ clear_vacated_cell    │ Old cell after a step               │
/// ├──────────────────────┼─────────────────────────────────────┤
/// │ false (default)       │ left as it was (stays `Player`)     │
/// │ true                  │ `Player` → `Empty`                  │
/// └──────────────────────┴─────────────────────────────────────┘
/// The sky row (`y == -1`) is never written either way.

use tracing::{debug, warn};

use crate::domain::cell::CellStatus;
use crate::domain::detail::Facing;
use crate::domain::movement::{self, SKY_ROW};
use super::event::GameEvent;
use super::tween::GlideTarget;
use super::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry points
// ══════════════════════════════════════════════════════════════

/// A move key went down. Requests inside the debounce window collapse
/// into one step carrying the latest direction.
pub fn request_move(world: &mut WorldState, dir: Facing, now_ms: u64) {
    if !can_walk(world) {
        return;
    }
    world.move_requests.call(dir, now_ms);
}

/// Advance the session clock to `now_ms`; `dt_ms` is the frame delta.
pub fn tick(world: &mut WorldState, now_ms: u64, dt_ms: u64, events: &mut Vec<GameEvent>) {
    world.clock_ms = now_ms;

    if let Some(dir) = world.move_requests.poll(now_ms) {
        move_player(world, dir, events);
    }

    world.clicks.expire(now_ms);
    resolve_glides(world, dt_ms);

    if world.message_timer_ms > 0 {
        world.message_timer_ms = world.message_timer_ms.saturating_sub(dt_ms);
        if world.message_timer_ms == 0 {
            world.message.clear();
        }
    }
}

/// One grid step in `dir`, if the stepping rules allow it.
/// Returns whether the character moved.
pub fn move_player(world: &mut WorldState, dir: Facing, events: &mut Vec<GameEvent>) -> bool {
    if !can_walk(world) {
        return false;
    }
    let speed = world.placement.glide_px_per_ms;
    let clear_vacated = world.movement.clear_vacated_cell;
    let frame = world.frame;
    let Some(player) = world.player.as_mut() else { return false };
    let from = player.pos;

    let Some((to, transition)) = movement::plan_step(&world.board, from, dir) else {
        player.facing = dir;
        debug!(x = from.x, y = from.y, ?dir, "no legal step");
        return false;
    };

    if clear_vacated && from.y != SKY_ROW && world.board.get(from.x, from.y).map_or(false, CellStatus::is_player) {
        if let Err(e) = world.board.set(from.x, from.y, CellStatus::Empty) {
            warn!(%e, "could not clear vacated cell");
        }
    }
    if world.board.is_in_play(to.x, to.y) {
        if let Err(e) = world.board.set(to.x, to.y, CellStatus::Player) {
            warn!(%e, "could not mark player cell");
        }
    }

    player.pos = to;
    player.facing = transition.facing();
    let visual_from = (player.visual_x, player.visual_y);
    let visual_to = frame.cell_origin(to);
    world.tweens.glide(GlideTarget::Player, visual_from, visual_to, speed);

    events.push(GameEvent::PlayerMoved { from, to, transition });
    debug!(from_x = from.x, from_y = from.y, to_x = to.x, to_y = to.y, ?transition, "player stepped");
    true
}

/// Walking is independent of placement: it goes on after the board is
/// complete and stops only once every level is done.
fn can_walk(world: &WorldState) -> bool {
    world.player.is_some() && world.phase != Phase::GameComplete
}

// ══════════════════════════════════════════════════════════════
// Glides
// ══════════════════════════════════════════════════════════════

fn resolve_glides(world: &mut WorldState, dt_ms: u64) {
    for (target, (x, y)) in world.tweens.advance(dt_ms as f32) {
        match target {
            GlideTarget::Detail(id) => {
                if let Some(d) = world.details.get_mut(id.0) {
                    d.x = x;
                    d.y = y;
                }
            }
            GlideTarget::Player => {
                if let Some(p) = world.player.as_mut() {
                    p.visual_x = x;
                    p.visual_y = y;
                }
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
