/// Glide scheduler: fire-and-forget visual moves.
///
/// Logical state (board cells, grid position) is committed before a glide
/// starts; a glide only interpolates the *drawn* pixel position. Duration is
/// `distance / speed` with speed in pixels per millisecond, so far moves take
/// longer. Starting a new glide on a target replaces the old one.

use crate::domain::detail::DetailId;
use crate::domain::geometry::distance;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GlideTarget {
    Detail(DetailId),
    Player,
}

#[derive(Clone, Debug)]
pub struct Glide {
    pub target: GlideTarget,
    from: (f32, f32),
    to: (f32, f32),
    duration_ms: f32,
    elapsed_ms: f32,
}

impl Glide {
    /// Interpolated position at the current elapsed time.
    pub fn position(&self) -> (f32, f32) {
        if self.duration_ms <= 0.0 {
            return self.to;
        }
        let t = (self.elapsed_ms / self.duration_ms).min(1.0);
        (
            self.from.0 + (self.to.0 - self.from.0) * t,
            self.from.1 + (self.to.1 - self.from.1) * t,
        )
    }

    pub fn is_done(&self) -> bool {
        self.elapsed_ms >= self.duration_ms
    }
}

#[derive(Clone, Debug, Default)]
pub struct Tweens {
    glides: Vec<Glide>,
}

impl Tweens {
    pub fn new() -> Self {
        Tweens { glides: Vec::new() }
    }

    /// Schedule a glide. Returns its duration in ms.
    pub fn glide(&mut self, target: GlideTarget, from: (f32, f32), to: (f32, f32), speed: f32) -> f32 {
        self.cancel(target);
        let dist = distance(from.0, from.1, to.0, to.1);
        let duration_ms = if speed > 0.0 { dist / speed } else { 0.0 };
        self.glides.push(Glide { target, from, to, duration_ms, elapsed_ms: 0.0 });
        duration_ms
    }

    /// Advance all glides by `dt_ms`. Returns the position each target
    /// should be drawn at; finished glides report their end point once.
    pub fn advance(&mut self, dt_ms: f32) -> Vec<(GlideTarget, (f32, f32))> {
        let mut out = Vec::with_capacity(self.glides.len());
        for g in &mut self.glides {
            g.elapsed_ms += dt_ms;
            out.push((g.target, g.position()));
        }
        self.glides.retain(|g| !g.is_done());
        out
    }

    pub fn cancel(&mut self, target: GlideTarget) {
        self.glides.retain(|g| g.target != target);
    }

    pub fn is_gliding(&self, target: GlideTarget) -> bool {
        self.glides.iter().any(|g| g.target == target)
    }

    pub fn clear(&mut self) {
        self.glides.clear();
    }
}
