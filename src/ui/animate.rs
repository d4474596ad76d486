//! Tick-driven animation primitives.
//!
//! The scroll glide is an exponential approach: each tick covers a fixed
//! fraction of the remaining distance, which reads fast at the start and soft
//! near the end without an easing table.  The short card animations use
//! fixed-duration cosine tweens instead — they must finish on a deadline so
//! the dismissal pipeline can advance to its next stage.

// ───────────────────────────────────────── scroll glide ──────

/// Remaining distance (rows) below which the glide lands.  The landing step
/// emits the target itself, so the scroll tracker always sees an exact
/// arrival sample.
const LANDING_DISTANCE: f64 = 0.35;

/// An in-flight animated scroll toward a fixed target offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollGlide {
    target: f64,
    /// Fraction of the remaining distance covered per tick.
    factor: f64,
}

impl ScrollGlide {
    pub fn new(target: f64, factor: f64) -> Self {
        Self {
            target,
            factor: factor.clamp(0.05, 0.95),
        }
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Advance one tick from `current`.  Returns the next offset and whether
    /// the glide landed; the caller drops the glide once it did.
    pub fn step(&self, current: f64) -> (f64, bool) {
        let remaining = self.target - current;
        if remaining.abs() <= LANDING_DISTANCE {
            return (self.target, true);
        }
        (current + remaining * self.factor, false)
    }
}

// ───────────────────────────────────────── tweens ────────────

/// How long a released card takes to glide back to rest, in ms.
pub const SNAP_BACK_MS: u64 = 250;

/// How long the deck takes to close over a dismissed card's slot, in ms.
pub const SETTLE_MS: u64 = 150;

/// Minimum off-screen speed for a dismissing card, columns per millisecond.
/// A flick keeps its own release speed; the dismiss key uses this one.
pub const SLIDE_OUT_MIN_SPEED: f64 = 0.45;

/// Cosine ease-in-out over `t` in `[0, 1]`.
pub fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    (1.0 - (std::f64::consts::PI * t).cos()) / 2.0
}

/// A fixed-duration animation clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    elapsed_ms: u64,
    duration_ms: u64,
}

impl Tween {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            elapsed_ms: 0,
            duration_ms: duration_ms.max(1),
        }
    }

    /// Advance the clock; returns `true` once the tween has finished.
    pub fn advance(&mut self, dt_ms: u64) -> bool {
        self.elapsed_ms = (self.elapsed_ms + dt_ms).min(self.duration_ms);
        self.finished()
    }

    pub fn finished(&self) -> bool {
        self.elapsed_ms >= self.duration_ms
    }

    pub fn progress(&self) -> f64 {
        self.elapsed_ms as f64 / self.duration_ms as f64
    }

    pub fn eased(&self) -> f64 {
        ease_in_out(self.progress())
    }
}

// ───────────────────────────────────────── tests ─────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glide_lands_exactly_on_target() {
        let glide = ScrollGlide::new(300.0, 0.25);
        let mut offset = 0.0;
        let mut steps = 0;
        loop {
            let (next, landed) = glide.step(offset);
            offset = next;
            steps += 1;
            if landed {
                break;
            }
            assert!(steps < 200, "glide never landed");
        }
        assert_eq!(offset, 300.0);
        assert!(steps > 5, "a long glide should take several ticks");
    }

    #[test]
    fn glide_closes_a_fixed_fraction_each_tick() {
        let glide = ScrollGlide::new(100.0, 0.25);
        let (next, landed) = glide.step(0.0);
        assert!(!landed);
        assert!((next - 25.0).abs() < 1e-9);
        let (next, _) = glide.step(next);
        assert!((next - 43.75).abs() < 1e-9);
    }

    #[test]
    fn tween_finishes_on_its_deadline() {
        let mut tween = Tween::new(SETTLE_MS);
        assert!(!tween.advance(35));
        assert!(!tween.advance(35));
        assert!(!tween.advance(35));
        assert!(!tween.advance(35));
        assert!(tween.advance(35));
        assert_eq!(tween.progress(), 1.0);
        assert_eq!(tween.eased(), 1.0);
    }

    #[test]
    fn ease_covers_its_endpoints_and_midpoint() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert!((ease_in_out(0.5) - 0.5).abs() < 1e-9);
        assert_eq!(ease_in_out(1.0), 1.0);
        assert!(ease_in_out(0.25) < 0.25, "slow start");
        assert!(ease_in_out(0.75) > 0.75, "slow finish");
    }
}
