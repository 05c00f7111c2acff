//! Scalar tweens for shop-slot visuals.
//!
//! Collapses are sharp and accelerating; expands overshoot and settle.
//! Everything is driven by explicit `dt` so transitions are deterministic.

/// Easing function type.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Easing {
    /// Linear interpolation.
    #[default]
    Linear,
    /// Exponential ease-in (accelerating). Used for the collapse.
    ExponentialIn,
    /// Back ease-out with the given overshoot strength. Used for the expand.
    BackOut(f32),
}

impl Easing {
    /// Applies the easing function to a t value (0-1).
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Self::Linear => t,
            Self::ExponentialIn => {
                // 2^(10(t-1))
                if t <= 0.0 {
                    0.0
                } else {
                    2.0_f32.powf(10.0 * (t - 1.0))
                }
            }
            Self::BackOut(s) => {
                // 1 + (s+1)(t-1)^3 + s(t-1)^2
                let u = t - 1.0;
                1.0 + (s + 1.0) * u * u * u + s * u * u
            }
        }
    }
}

/// A single animated value.
#[derive(Debug, Clone)]
pub struct Animation {
    /// Current value.
    current: f32,
    /// Target value.
    target: f32,
    /// Animation progress (0-1).
    progress: f32,
    /// Animation duration (seconds).
    duration: f32,
    /// Easing function.
    easing: Easing,
    /// Start value (for interpolation).
    start: f32,
}

impl Animation {
    /// Creates a settled animation at the given value.
    #[must_use]
    pub fn new(value: f32) -> Self {
        Self {
            current: value,
            target: value,
            progress: 1.0,
            duration: 0.0,
            easing: Easing::Linear,
            start: value,
        }
    }

    /// Returns the current value.
    #[must_use]
    pub fn value(&self) -> f32 {
        self.current
    }

    /// Returns true if the animation is complete.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.progress >= 1.0
    }

    /// Starts animating from the current value toward `target`.
    pub fn animate_to(&mut self, target: f32, duration: f32, easing: Easing) {
        self.start = self.current;
        self.target = target;
        self.duration = duration;
        self.easing = easing;
        self.progress = 0.0;
    }

    /// Immediately sets the value without animation.
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.start = value;
        self.progress = 1.0;
    }

    /// Advances the animation by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if self.progress >= 1.0 {
            return;
        }

        if self.duration > 0.0 {
            self.progress += dt / self.duration;
        } else {
            self.progress = 1.0;
        }
        self.progress = self.progress.min(1.0);

        let eased = self.easing.apply(self.progress);
        self.current = self.start + (self.target - self.start) * eased;

        // Snap to target when complete
        if self.progress >= 1.0 {
            self.current = self.target;
        }
    }
}

impl Default for Animation {
    fn default() -> Self {
        Self::new(1.0)
    }
}
