//! # Shop Session
//!
//! One object the game loop talks to. Owns the reconciliation engine, the
//! dispatcher, the reroll transition and the rejection notices.
//!
//! ```text
//!   input ──▶ request_*() ──▶ ActionDispatcher ──▶ CommandSink
//!                                   │
//!                                   ▼ record Δ
//!   frames ─▶ handle_frame() ─▶ ReconciliationEngine ──▶ displayed()
//!                                   │
//!                                   ▼ applied
//!                         RerollTransitionCoordinator ──▶ slot_scale()
//! ```
//!
//! Single-threaded: every method runs on the game-loop thread.

use bazaar_shared::{
    decode_server_message, ActionName, ActionResultMessage, GameEndedMessage, ServerMessage,
};

use crate::config::ShopConfig;
use crate::dispatcher::{ActionDispatcher, DispatchOutcome};
use crate::error::DispatchResult;
use crate::integration::{CommandSink, SessionSource};
use crate::notice::{NoticeQueue, NoticeView};
use crate::reconciliation::{DisplayedEconomyState, ReconciliationEngine, ReconciliationReport};
use crate::transition::{RerollTransitionCoordinator, TransitionEvent};

/// Client-side shop economy for one player.
pub struct ShopSession<S: CommandSink, P: SessionSource> {
    engine: ReconciliationEngine,
    dispatcher: ActionDispatcher<S, P>,
    transition: RerollTransitionCoordinator,
    notices: NoticeQueue,
    game_result: Option<GameEndedMessage>,
    was_in_game: bool,
}

impl<S: CommandSink, P: SessionSource> ShopSession<S, P> {
    /// Creates a session with no snapshot yet.
    #[must_use]
    pub fn new(config: &ShopConfig, sink: S, session: P) -> Self {
        let was_in_game = session.is_in_game();
        Self {
            engine: ReconciliationEngine::from_config(config),
            dispatcher: ActionDispatcher::new(config, sink, session),
            transition: RerollTransitionCoordinator::new(config.transition),
            notices: NoticeQueue::new(&config.notices),
            game_result: None,
            was_in_game,
        }
    }

    // ========================================================================
    // Requests
    // ========================================================================

    /// See [`ActionDispatcher::request_purchase`].
    ///
    /// # Errors
    ///
    /// Propagates the dispatcher's refusal.
    pub fn request_purchase(&mut self, slot: usize) -> DispatchResult<DispatchOutcome> {
        self.dispatcher.request_purchase(&mut self.engine, slot)
    }

    /// See [`ActionDispatcher::request_reroll`].
    ///
    /// # Errors
    ///
    /// Propagates the dispatcher's refusal.
    pub fn request_reroll(&mut self) -> DispatchResult<DispatchOutcome> {
        self.dispatcher
            .request_reroll(&mut self.engine, &mut self.transition)
    }

    /// See [`ActionDispatcher::request_buy_xp`].
    ///
    /// # Errors
    ///
    /// Propagates the dispatcher's refusal.
    pub fn request_buy_xp(&mut self) -> DispatchResult<DispatchOutcome> {
        self.dispatcher.request_buy_xp(&mut self.engine)
    }

    /// See [`ActionDispatcher::request_toggle_lock`].
    ///
    /// # Errors
    ///
    /// Propagates the dispatcher's refusal.
    pub fn request_toggle_lock(&mut self) -> DispatchResult<DispatchOutcome> {
        self.dispatcher.request_toggle_lock()
    }

    // ========================================================================
    // Inbound
    // ========================================================================

    /// Handles one decoded server message.
    ///
    /// Returns the reconciliation report for snapshots.
    pub fn handle_message(&mut self, message: ServerMessage) -> Option<ReconciliationReport> {
        match message {
            ServerMessage::Snapshot(snapshot) => {
                let report = self.engine.on_snapshot_received(snapshot);
                if report.applied() {
                    self.transition.on_snapshot();
                }
                Some(report)
            }
            ServerMessage::ActionResult(result) => {
                self.on_action_result(result);
                None
            }
            ServerMessage::GameEnded(ended) => {
                tracing::info!(
                    winner_id = ended.winner_id,
                    winner = %ended.winner_name,
                    "game ended"
                );
                self.game_result = Some(ended);
                self.clear_round_state();
                None
            }
        }
    }

    /// Decodes and handles one inbound frame. Malformed frames are dropped.
    pub fn handle_frame(&mut self, frame: &[u8]) -> Option<ReconciliationReport> {
        match decode_server_message(frame) {
            Ok(message) => self.handle_message(message),
            Err(err) => {
                tracing::warn!(%err, len = frame.len(), "dropping malformed frame");
                None
            }
        }
    }

    fn on_action_result(&mut self, result: ActionResultMessage) {
        if result.action == ActionName::BuyUnit {
            self.engine.acknowledge_purchase(result.success);
        }
        if result.success {
            return;
        }
        let reason = result.reason.unwrap_or_else(|| "rejected".to_owned());
        tracing::info!(action = result.action.label(), %reason, "server rejected action");
        self.notices
            .push(result.action, format!("{}: {reason}", result.action.label()));
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Advances timers by `dt` seconds.
    ///
    /// Leaving the game drops the snapshot and everything pending.
    pub fn update(&mut self, dt: f32) -> Option<TransitionEvent> {
        let in_game = self.dispatcher.session().is_in_game();
        if self.was_in_game && !in_game {
            tracing::info!("left game, clearing shop state");
            self.reset();
        }
        self.was_in_game = in_game;

        self.notices.update(dt);
        self.transition.update(dt)
    }

    // ========================================================================
    // Presentation
    // ========================================================================

    /// Current displayed state, or `None` before the first snapshot.
    #[must_use]
    pub fn displayed(&self) -> Option<DisplayedEconomyState> {
        self.engine.displayed()
    }

    /// Scale to draw shop slots at.
    #[must_use]
    pub fn slot_scale(&self) -> f32 {
        self.transition.slot_scale()
    }

    /// Visible rejection notices.
    #[must_use]
    pub fn notices(&self) -> Vec<NoticeView> {
        self.notices.visible()
    }

    /// Winner of the last finished game.
    #[must_use]
    pub fn game_result(&self) -> Option<&GameEndedMessage> {
        self.game_result.as_ref()
    }

    /// Whether the slot can be bought right now.
    #[must_use]
    pub fn can_purchase(&self, slot: usize) -> bool {
        self.dispatcher.can_purchase(&self.engine, slot)
    }

    /// Whether a reroll would be charged.
    #[must_use]
    pub fn can_reroll(&self) -> bool {
        self.dispatcher.can_reroll(&self.engine)
    }

    /// Whether experience can be bought.
    #[must_use]
    pub fn can_buy_xp(&self) -> bool {
        self.dispatcher.can_buy_xp(&self.engine)
    }

    /// The reconciliation engine.
    #[must_use]
    pub fn engine(&self) -> &ReconciliationEngine {
        &self.engine
    }

    /// The reroll transition.
    #[must_use]
    pub fn transition(&self) -> &RerollTransitionCoordinator {
        &self.transition
    }

    /// The outbound sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        self.dispatcher.sink()
    }

    /// The session collaborator.
    #[must_use]
    pub fn session(&self) -> &P {
        self.dispatcher.session()
    }

    /// Forgets the snapshot, the ledger, the transition and the notices.
    pub fn reset(&mut self) {
        self.engine.reset();
        self.transition.reset();
        self.notices.clear();
    }

    fn clear_round_state(&mut self) {
        self.engine.clear_pending();
        self.transition.reset();
    }
}
