//! # Reroll Transition
//!
//! Couples a reroll to a two-phase visual: the shop collapses, waits for
//! the server's new shop, then grows back with an overshoot.
//!
//! ```text
//! Idle ──reroll──▶ Collapsing ──done──▶ WaitingForServer ──snapshot──▶ Expanding ──done──▶ Idle
//!                      │                       │
//!                      │ snapshot early        │ timeout
//!                      └──────▶ Expanding      └──────▶ Idle (old shop shown)
//! ```
//!
//! Independent of the gold numbers: this only decides how big the slots
//! are drawn.

use crate::animation::{Animation, Easing};
use crate::config::TransitionConfig;

/// Coordinator state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransitionState {
    /// Slots at full size.
    #[default]
    Idle,
    /// Slots shrinking.
    Collapsing,
    /// Slots hidden, new shop not here yet.
    WaitingForServer,
    /// Slots growing with the new shop.
    Expanding,
}

/// Transition milestones, reported by [`RerollTransitionCoordinator::update`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionEvent {
    /// Collapse finished; now waiting.
    Collapsed,
    /// Grow started.
    ExpandStarted,
    /// Back to idle after a grow.
    Settled,
    /// Gave up waiting; old shop redisplayed.
    TimedOut,
}

/// Reroll collapse/expand state machine.
#[derive(Clone, Debug)]
pub struct RerollTransitionCoordinator {
    state: TransitionState,
    scale: Animation,
    awaiting_reroll_response: bool,
    waited_secs: f32,
    config: TransitionConfig,
}

impl RerollTransitionCoordinator {
    /// Creates an idle coordinator.
    #[must_use]
    pub fn new(config: TransitionConfig) -> Self {
        Self {
            state: TransitionState::Idle,
            scale: Animation::new(1.0),
            awaiting_reroll_response: false,
            waited_secs: 0.0,
            config,
        }
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> TransitionState {
        self.state
    }

    /// Scale to draw shop slots at. 1.0 is full size.
    #[inline]
    #[must_use]
    pub fn slot_scale(&self) -> f32 {
        self.scale.value()
    }

    /// Whether a reroll's shop has not arrived yet.
    #[inline]
    #[must_use]
    pub const fn is_awaiting_response(&self) -> bool {
        self.awaiting_reroll_response
    }

    /// Starts the collapse for a reroll that was just sent.
    pub fn begin_collapse(&mut self) {
        self.awaiting_reroll_response = true;
        match self.state {
            // Already hidden: keep waiting, for the newest reroll.
            TransitionState::WaitingForServer => self.waited_secs = 0.0,
            TransitionState::Collapsing => {}
            TransitionState::Idle | TransitionState::Expanding => {
                self.state = TransitionState::Collapsing;
                self.scale
                    .animate_to(0.0, self.config.collapse_secs, Easing::ExponentialIn);
            }
        }
    }

    /// Tells the coordinator an applied snapshot arrived.
    ///
    /// Returns `true` if this started the expand.
    pub fn on_snapshot(&mut self) -> bool {
        if !self.awaiting_reroll_response {
            return false;
        }
        self.awaiting_reroll_response = false;
        if self.state == TransitionState::WaitingForServer {
            self.start_expand();
            return true;
        }
        // Still collapsing: the expand starts when the collapse completes.
        false
    }

    /// Advances timers by `dt` seconds.
    pub fn update(&mut self, dt: f32) -> Option<TransitionEvent> {
        match self.state {
            TransitionState::Idle => None,
            TransitionState::Collapsing => {
                self.scale.update(dt);
                if !self.scale.is_complete() {
                    return None;
                }
                if self.awaiting_reroll_response {
                    self.state = TransitionState::WaitingForServer;
                    self.waited_secs = 0.0;
                    Some(TransitionEvent::Collapsed)
                } else {
                    self.start_expand();
                    Some(TransitionEvent::ExpandStarted)
                }
            }
            TransitionState::WaitingForServer => {
                self.waited_secs += dt;
                if self.waited_secs < self.config.reroll_timeout_secs {
                    return None;
                }
                tracing::warn!(
                    waited_secs = self.waited_secs,
                    "no shop after reroll, redisplaying previous shop"
                );
                self.awaiting_reroll_response = false;
                self.state = TransitionState::Idle;
                self.scale.set_immediate(1.0);
                Some(TransitionEvent::TimedOut)
            }
            TransitionState::Expanding => {
                self.scale.update(dt);
                if self.scale.is_complete() {
                    self.state = TransitionState::Idle;
                    Some(TransitionEvent::Settled)
                } else {
                    None
                }
            }
        }
    }

    /// Returns to idle at full size.
    pub fn reset(&mut self) {
        self.state = TransitionState::Idle;
        self.awaiting_reroll_response = false;
        self.waited_secs = 0.0;
        self.scale.set_immediate(1.0);
    }

    fn start_expand(&mut self) {
        self.state = TransitionState::Expanding;
        self.scale.animate_to(
            1.0,
            self.config.expand_secs,
            Easing::BackOut(self.config.overshoot),
        );
    }
}

impl Default for RerollTransitionCoordinator {
    fn default() -> Self {
        Self::new(TransitionConfig::default())
    }
}
