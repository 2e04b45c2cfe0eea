/// Double-click detection on details.
///
///   Idle ──(armable click on D at t)──▶ AwaitingSecondClick(D, t)
///   AwaitingSecondClick(D, t) ──(click on D within window)──▶ Idle + fire
///   AwaitingSecondClick(D, t) ──(other click / timeout)──▶ re-arm or Idle
///
/// A click is "armable" when the detail sits on the board and the game is
/// not won; the caller decides that.

use crate::domain::detail::DetailId;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ClickState {
    Idle,
    AwaitingSecondClick { id: DetailId, at_ms: u64 },
}

#[derive(Clone, Debug)]
pub struct ClickTracker {
    pub state: ClickState,
    window_ms: u64,
}

impl ClickTracker {
    pub fn new(window_ms: u64) -> Self {
        ClickTracker { state: ClickState::Idle, window_ms }
    }

    /// Feed one pointer-down. Returns `true` when it completes a double-click.
    pub fn press(&mut self, hit: Option<DetailId>, armable: bool, now_ms: u64) -> bool {
        if let ClickState::AwaitingSecondClick { id, at_ms } = self.state {
            if hit == Some(id) && now_ms.saturating_sub(at_ms) <= self.window_ms {
                self.state = ClickState::Idle;
                return true;
            }
        }
        self.state = match hit {
            Some(id) if armable => ClickState::AwaitingSecondClick { id, at_ms: now_ms },
            _ => ClickState::Idle,
        };
        false
    }

    /// Drop a stale first click.
    pub fn expire(&mut self, now_ms: u64) {
        if let ClickState::AwaitingSecondClick { at_ms, .. } = self.state {
            if now_ms.saturating_sub(at_ms) > self.window_ms {
                self.state = ClickState::Idle;
            }
        }
    }

    pub fn reset(&mut self) {
        self.state = ClickState::Idle;
    }
}
