/// Input state tracker.
///
/// Keyboard:
///   - Down-edge only: a key counts once when it goes from "not held" to
///     "held". Auto-repeat while held does not produce new presses.
///   - Uses crossterm's keyboard enhancement for Release events when available.
///     Falls back to timeout-based release detection on terminals without it.
///
/// Mouse:
///   - Left button down / drag / up become `PointerKind::{Down, Drag, Up}`.
///   - Right button down becomes `PointerKind::Secondary` (rotate).
///   - Positions stay in terminal cells; the renderer maps them to pixels.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PointerKind {
    Down,
    Drag,
    Up,
    Secondary,
}

/// One mouse event in terminal cell coordinates.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub col: u16,
    pub row: u16,
}

/// Map a crossterm mouse event onto the pointer vocabulary.
/// Moves without a button, scrolls and middle clicks are dropped.
pub fn pointer_from_mouse(m: MouseEvent) -> Option<PointerEvent> {
    let kind = match m.kind {
        MouseEventKind::Down(MouseButton::Left) => PointerKind::Down,
        MouseEventKind::Drag(MouseButton::Left) => PointerKind::Drag,
        MouseEventKind::Up(MouseButton::Left) => PointerKind::Up,
        MouseEventKind::Down(MouseButton::Right) => PointerKind::Secondary,
        _ => return None,
    };
    Some(PointerEvent { kind, col: m.column, row: m.row })
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned from "not held" → "held" during the
    /// most recent drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for Ctrl+C handling.
    pub raw_events: Vec<KeyEvent>,

    /// Mouse events collected during drain, in arrival order.
    pub pointer_events: Vec<PointerEvent>,

    /// Last known pointer cell (any mouse event).
    pub pointer_at: Option<(u16, u16)>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            pointer_events: Vec::with_capacity(8),
            pointer_at: None,
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
        self.pointer_events.clear();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => {
                    self.raw_events.push(key);

                    match key.kind {
                        KeyEventKind::Release if self.honor_release => {
                            self.last_active.remove(&key.code);
                        }
                        KeyEventKind::Release => {
                            // Not trusted; rely on timeout-based expiry instead
                        }
                        _ => {
                            let was_held = self.is_held(key.code);
                            self.last_active.insert(key.code, Instant::now());
                            if !was_held {
                                self.fresh_presses.push(key.code);
                            }
                        }
                    }
                }
                Ok(Event::Mouse(m)) => {
                    self.pointer_at = Some((m.column, m.row));
                    if let Some(p) = pointer_from_mouse(m) {
                        self.pointer_events.push(p);
                    }
                }
                _ => {}
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    /// Was this key freshly pressed this frame? (down-edge)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    /// Convenience: was any of these keys freshly pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        use crossterm::event::KeyModifiers;
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    // ── Internal ──

    fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent { kind, column, row, modifiers: KeyModifiers::NONE }
    }

    #[test]
    fn left_button_gesture_maps_in_order() {
        let down = pointer_from_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 3, 4));
        let drag = pointer_from_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 5, 4));
        let up = pointer_from_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 5, 6));
        assert_eq!(down, Some(PointerEvent { kind: PointerKind::Down, col: 3, row: 4 }));
        assert_eq!(drag.map(|p| p.kind), Some(PointerKind::Drag));
        assert_eq!(up.map(|p| (p.col, p.row)), Some((5, 6)));
    }

    #[test]
    fn right_click_is_secondary() {
        let p = pointer_from_mouse(mouse(MouseEventKind::Down(MouseButton::Right), 0, 0));
        assert_eq!(p.map(|p| p.kind), Some(PointerKind::Secondary));
    }

    #[test]
    fn hover_and_scroll_are_dropped() {
        assert_eq!(pointer_from_mouse(mouse(MouseEventKind::Moved, 1, 1)), None);
        assert_eq!(pointer_from_mouse(mouse(MouseEventKind::ScrollDown, 1, 1)), None);
        assert_eq!(pointer_from_mouse(mouse(MouseEventKind::Up(MouseButton::Right), 1, 1)), None);
    }

    #[test]
    fn fresh_input_state_has_no_presses() {
        let kb = InputState::new();
        assert!(!kb.any_pressed(&[KeyCode::Left, KeyCode::Right]));
        assert!(!kb.ctrl_c_pressed());
    }
}
