/// Trailing-edge debouncer for move requests.
///
/// Each `call` (re)arms a single pending value due `window_ms` later.
/// Calls that arrive while a value is pending replace it, so a burst of
/// presses collapses into one delivery carrying the last value.
/// Time is injected as a millisecond clock; nothing here sleeps.

#[derive(Clone, Debug)]
struct Pending<T> {
    value: T,
    due_ms: u64,
}

#[derive(Clone, Debug)]
pub struct Debouncer<T> {
    window_ms: u64,
    pending: Option<Pending<T>>,
}

impl<T> Debouncer<T> {
    pub fn new(window_ms: u64) -> Self {
        Debouncer { window_ms, pending: None }
    }

    /// Request delivery of `value`, restarting the quiet window.
    pub fn call(&mut self, value: T, now_ms: u64) {
        self.pending = Some(Pending { value, due_ms: now_ms + self.window_ms });
    }

    /// Deliver the pending value once its window has elapsed.
    pub fn poll(&mut self, now_ms: u64) -> Option<T> {
        match &self.pending {
            Some(p) if now_ms >= p.due_ms => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
