//! # Action Dispatcher
//!
//! Turns a click into (a) an immediate ledger entry and (b) a command.
//!
//! ```text
//! click ──▶ guard ──▶ send ──▶ record Δ ──▶ presentation re-derives
//!             │         │
//!             │         └─ send failed: nothing recorded
//!             └─ refused: nothing sent, nothing recorded
//! ```
//!
//! The dispatcher never rolls back. A wrong guess lives until the next
//! snapshot overwrites it.

use bazaar_shared::ShopCommand;

use crate::config::{ShopConfig, UnaffordablePolicy};
use crate::error::{DispatchError, DispatchResult};
use crate::integration::{CommandSink, SessionSource};
use crate::reconciliation::ReconciliationEngine;
use crate::snapshot::AuthoritativeSnapshot;
use crate::transition::RerollTransitionCoordinator;

/// What a successful request did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Command sent and an optimistic adjustment recorded.
    Optimistic,
    /// Command sent for server arbitration with no local adjustment.
    Forwarded,
    /// Command sent; it has no economic effect to predict.
    Sent,
}

/// Optimistic adjustment a request will record once sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Adjustment {
    None,
    Gold(u32),
    FreeReroll,
}

/// Economy rules the dispatcher guards with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Rules {
    reroll_cost: u32,
    xp_cost: u32,
    max_level: u32,
    policy: UnaffordablePolicy,
}

/// Issues economic commands and records their optimistic effect.
pub struct ActionDispatcher<S: CommandSink, P: SessionSource> {
    sink: S,
    session: P,
    rules: Rules,
    commands_sent: u64,
}

impl<S: CommandSink, P: SessionSource> ActionDispatcher<S, P> {
    /// Creates a dispatcher over the given collaborators.
    #[must_use]
    pub fn new(config: &ShopConfig, sink: S, session: P) -> Self {
        Self {
            sink,
            session,
            rules: Rules {
                reroll_cost: config.reroll_cost,
                xp_cost: config.xp_cost,
                max_level: config.max_level,
                policy: config.unaffordable_policy,
            },
            commands_sent: 0,
        }
    }

    /// The outbound sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The session collaborator.
    #[must_use]
    pub fn session(&self) -> &P {
        &self.session
    }

    /// Commands handed to the sink so far.
    #[must_use]
    pub const fn commands_sent(&self) -> u64 {
        self.commands_sent
    }

    /// Buys the unit in `slot`.
    ///
    /// Charges the offer's cost and hides the slot until a snapshot
    /// settles it.
    ///
    /// # Errors
    ///
    /// `NotInGame`, `SlotOutOfRange`, `SlotEmpty` (empty or already
    /// pending), `InsufficientGold` under the suppress policy, or
    /// `Transport`.
    pub fn request_purchase(
        &mut self,
        engine: &mut ReconciliationEngine,
        slot: usize,
    ) -> DispatchResult<DispatchOutcome> {
        let snapshot = self.in_game_snapshot(engine)?;
        let len = snapshot.shop_slots().len();
        if slot >= len {
            return Err(DispatchError::SlotOutOfRange { slot, len });
        }
        let offer = engine
            .displayed_slot(slot)
            .ok_or(DispatchError::SlotEmpty(slot))?;

        let available = engine.displayed_gold().unwrap_or(0);
        if available < i64::from(offer.cost) {
            let outcome =
                self.unaffordable(ShopCommand::BuyUnit { slot }, offer.cost, available)?;
            engine.pending_mut().record_forwarded_purchase();
            return Ok(outcome);
        }

        self.send(ShopCommand::BuyUnit { slot })?;
        engine.pending_mut().record_purchase(slot, offer);
        tracing::debug!(slot, unit_id = offer.unit_id, cost = offer.cost, "purchase dispatched");
        Ok(DispatchOutcome::Optimistic)
    }

    /// Rerolls the shop and starts the collapse.
    ///
    /// A free reroll is used while the displayed count is positive.
    /// Otherwise gold is charged if the last snapshot could pay for it, so
    /// rapid repeated rerolls each charge.
    ///
    /// # Errors
    ///
    /// `NotInGame`, `InsufficientGold` under the suppress policy, or
    /// `Transport`.
    pub fn request_reroll(
        &mut self,
        engine: &mut ReconciliationEngine,
        transition: &mut RerollTransitionCoordinator,
    ) -> DispatchResult<DispatchOutcome> {
        let adjustment = self.reroll_adjustment(engine)?;
        let outcome = match adjustment {
            Adjustment::None => {
                let snapshot_gold = engine.snapshot().map_or(0, AuthoritativeSnapshot::gold);
                self.unaffordable(
                    ShopCommand::Reroll,
                    self.rules.reroll_cost,
                    i64::from(snapshot_gold),
                )?
            }
            Adjustment::Gold(_) | Adjustment::FreeReroll => {
                self.send(ShopCommand::Reroll)?;
                Self::record(engine, adjustment);
                DispatchOutcome::Optimistic
            }
        };
        transition.begin_collapse();
        tracing::debug!(?adjustment, "reroll dispatched");
        Ok(outcome)
    }

    /// Buys experience.
    ///
    /// # Errors
    ///
    /// `NotInGame`, `LevelCapReached`, `InsufficientGold` under the suppress
    /// policy, or `Transport`.
    pub fn request_buy_xp(
        &mut self,
        engine: &mut ReconciliationEngine,
    ) -> DispatchResult<DispatchOutcome> {
        let snapshot = self.in_game_snapshot(engine)?;
        if snapshot.level() >= self.rules.max_level {
            return Err(DispatchError::LevelCapReached(self.rules.max_level));
        }
        let available = engine.displayed_gold().unwrap_or(0);
        if available < i64::from(self.rules.xp_cost) {
            return self.unaffordable(ShopCommand::BuyXp, self.rules.xp_cost, available);
        }

        self.send(ShopCommand::BuyXp)?;
        Self::record(engine, Adjustment::Gold(self.rules.xp_cost));
        tracing::debug!(cost = self.rules.xp_cost, "buy xp dispatched");
        Ok(DispatchOutcome::Optimistic)
    }

    /// Toggles the shop lock. Lock state is read from snapshots only.
    ///
    /// # Errors
    ///
    /// `NotInGame` or `Transport`.
    pub fn request_toggle_lock(&mut self) -> DispatchResult<DispatchOutcome> {
        if !self.session.is_in_game() {
            return Err(DispatchError::NotInGame);
        }
        self.send(ShopCommand::ToggleShopLock)?;
        Ok(DispatchOutcome::Sent)
    }

    /// Whether `slot` can be bought right now.
    #[must_use]
    pub fn can_purchase(&self, engine: &ReconciliationEngine, slot: usize) -> bool {
        self.session.is_in_game()
            && engine
                .displayed_slot(slot)
                .zip(engine.displayed_gold())
                .is_some_and(|(offer, gold)| gold >= i64::from(offer.cost))
    }

    /// Whether a reroll would be charged to free rerolls or gold.
    #[must_use]
    pub fn can_reroll(&self, engine: &ReconciliationEngine) -> bool {
        self.reroll_adjustment(engine)
            .is_ok_and(|adjustment| adjustment != Adjustment::None)
    }

    /// Whether experience can be bought right now.
    #[must_use]
    pub fn can_buy_xp(&self, engine: &ReconciliationEngine) -> bool {
        self.in_game_snapshot(engine).is_ok_and(|snapshot| {
            snapshot.level() < self.rules.max_level
                && engine
                    .displayed_gold()
                    .is_some_and(|gold| gold >= i64::from(self.rules.xp_cost))
        })
    }

    fn in_game_snapshot<'e>(
        &self,
        engine: &'e ReconciliationEngine,
    ) -> DispatchResult<&'e AuthoritativeSnapshot> {
        if !self.session.is_in_game() {
            return Err(DispatchError::NotInGame);
        }
        engine.snapshot().ok_or(DispatchError::NotInGame)
    }

    fn reroll_adjustment(&self, engine: &ReconciliationEngine) -> DispatchResult<Adjustment> {
        let snapshot = self.in_game_snapshot(engine)?;
        if engine.displayed_free_rerolls().unwrap_or(0) > 0 {
            Ok(Adjustment::FreeReroll)
        } else if snapshot.gold() >= self.rules.reroll_cost {
            Ok(Adjustment::Gold(self.rules.reroll_cost))
        } else {
            Ok(Adjustment::None)
        }
    }

    fn unaffordable(
        &mut self,
        command: ShopCommand,
        required: u32,
        available: i64,
    ) -> DispatchResult<DispatchOutcome> {
        match self.rules.policy {
            UnaffordablePolicy::Suppress => {
                Err(DispatchError::InsufficientGold { required, available })
            }
            UnaffordablePolicy::ForwardToServer => {
                self.send(command)?;
                tracing::debug!(?command, required, available, "unaffordable command forwarded");
                Ok(DispatchOutcome::Forwarded)
            }
        }
    }

    fn record(engine: &mut ReconciliationEngine, adjustment: Adjustment) {
        let pending = engine.pending_mut();
        match adjustment {
            Adjustment::None => {}
            Adjustment::Gold(amount) => pending.record_gold_spend(amount),
            Adjustment::FreeReroll => pending.record_free_reroll(),
        }
    }

    fn send(&mut self, command: ShopCommand) -> DispatchResult<()> {
        if let Err(err) = self.sink.send(command) {
            tracing::warn!(?command, %err, "command send failed");
            return Err(err.into());
        }
        self.commands_sent += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::{RecordingSink, StaticSession};
    use bazaar_shared::{ShopOffer, SnapshotMessage};

    fn setup(
        gold: u32,
        free_rerolls: u32,
    ) -> (
        ActionDispatcher<RecordingSink, StaticSession>,
        ReconciliationEngine,
        RerollTransitionCoordinator,
    ) {
        let config = ShopConfig::default();
        let mut engine = ReconciliationEngine::from_config(&config);
        engine.on_snapshot_received(SnapshotMessage {
            tick: 1,
            gold,
            free_rerolls,
            shop_slots: vec![
                Some(ShopOffer::new(10, 1)),
                Some(ShopOffer::new(11, 3)),
                None,
                Some(ShopOffer::new(12, 5)),
                Some(ShopOffer::new(13, 2)),
            ],
            level: 3,
            ..Default::default()
        });
        let dispatcher =
            ActionDispatcher::new(&config, RecordingSink::new(), StaticSession::in_game(1));
        (dispatcher, engine, RerollTransitionCoordinator::default())
    }

    #[test]
    fn test_purchase_records_and_sends() {
        let (mut d, mut engine, _) = setup(10, 0);
        assert_eq!(d.request_purchase(&mut engine, 1), Ok(DispatchOutcome::Optimistic));
        assert_eq!(engine.displayed_gold(), Some(7));
        assert_eq!(engine.displayed_slot(1), None);
        assert_eq!(d.sink().sent(), &[ShopCommand::BuyUnit { slot: 1 }]);

        // Same slot again: nothing to buy
        assert_eq!(d.request_purchase(&mut engine, 1), Err(DispatchError::SlotEmpty(1)));
        assert_eq!(d.sink().sent().len(), 1);
    }

    #[test]
    fn test_purchase_guards() {
        let (mut d, mut engine, _) = setup(4, 0);
        assert_eq!(d.request_purchase(&mut engine, 2), Err(DispatchError::SlotEmpty(2)));
        assert_eq!(
            d.request_purchase(&mut engine, 9),
            Err(DispatchError::SlotOutOfRange { slot: 9, len: 5 })
        );
        assert_eq!(
            d.request_purchase(&mut engine, 3),
            Err(DispatchError::InsufficientGold { required: 5, available: 4 })
        );
        assert!(d.sink().sent().is_empty());
        assert!(engine.pending().is_empty());
    }

    #[test]
    fn test_forward_policy_sends_without_adjustment() {
        let config = ShopConfig {
            unaffordable_policy: UnaffordablePolicy::ForwardToServer,
            ..ShopConfig::default()
        };
        let (_, mut engine, _) = setup(4, 0);
        let mut d = ActionDispatcher::new(&config, RecordingSink::new(), StaticSession::in_game(1));

        assert_eq!(d.request_purchase(&mut engine, 3), Ok(DispatchOutcome::Forwarded));
        assert_eq!(d.sink().sent(), &[ShopCommand::BuyUnit { slot: 3 }]);
        assert!(engine.pending().is_empty());
        assert_eq!(engine.pending().unanswered_purchases(), 1);
    }

    #[test]
    fn test_reroll_prefers_free() {
        let (mut d, mut engine, mut t) = setup(10, 1);
        d.request_reroll(&mut engine, &mut t).unwrap();
        assert_eq!(engine.displayed_free_rerolls(), Some(0));
        assert_eq!(engine.displayed_gold(), Some(10));
        assert!(t.is_awaiting_response());

        d.request_reroll(&mut engine, &mut t).unwrap();
        assert_eq!(engine.displayed_gold(), Some(8));
        assert_eq!(d.commands_sent(), 2);
    }

    #[test]
    fn test_reroll_unaffordable_is_suppressed() {
        let (mut d, mut engine, mut t) = setup(1, 0);
        assert!(!d.can_reroll(&engine));
        assert_eq!(
            d.request_reroll(&mut engine, &mut t),
            Err(DispatchError::InsufficientGold { required: 2, available: 1 })
        );
        assert!(!t.is_awaiting_response());
        assert!(d.sink().sent().is_empty());
    }

    #[test]
    fn test_buy_xp_level_cap() {
        let config = ShopConfig {
            max_level: 3,
            ..ShopConfig::default()
        };
        let (_, mut engine, _) = setup(10, 0);
        let mut d = ActionDispatcher::new(&config, RecordingSink::new(), StaticSession::in_game(1));
        assert!(!d.can_buy_xp(&engine));
        assert_eq!(d.request_buy_xp(&mut engine), Err(DispatchError::LevelCapReached(3)));
    }

    #[test]
    fn test_buy_xp_charges() {
        let (mut d, mut engine, _) = setup(10, 0);
        assert!(d.can_buy_xp(&engine));
        d.request_buy_xp(&mut engine).unwrap();
        assert_eq!(engine.displayed_gold(), Some(6));
    }

    #[test]
    fn test_lock_has_no_economic_effect() {
        let (mut d, engine, _) = setup(10, 0);
        assert_eq!(d.request_toggle_lock(), Ok(DispatchOutcome::Sent));
        assert!(engine.pending().is_empty());
        assert_eq!(engine.displayed_gold(), Some(10));
    }

    #[test]
    fn test_failed_send_records_nothing() {
        let config = ShopConfig::default();
        let (_, mut engine, mut t) = setup(10, 0);
        let mut d =
            ActionDispatcher::new(&config, RecordingSink::disconnected(), StaticSession::in_game(1));

        assert!(matches!(
            d.request_purchase(&mut engine, 0),
            Err(DispatchError::Transport(_))
        ));
        assert!(d.request_reroll(&mut engine, &mut t).is_err());
        assert!(engine.pending().is_empty());
        assert!(!t.is_awaiting_response());
        assert_eq!(d.commands_sent(), 0);
    }

    #[test]
    fn test_not_in_game() {
        let (mut d, mut engine, mut t) = setup(10, 0);
        d.session().set_in_game(false);
        assert_eq!(d.request_purchase(&mut engine, 0), Err(DispatchError::NotInGame));
        assert_eq!(d.request_reroll(&mut engine, &mut t), Err(DispatchError::NotInGame));
        assert_eq!(d.request_toggle_lock(), Err(DispatchError::NotInGame));
        assert!(!d.can_purchase(&engine, 0));
    }
}
