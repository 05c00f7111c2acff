//! Stand-in authoritative shop server.
//!
//! A black box as far as the client is concerned: it takes commands,
//! answers each with an `ActionResult` and publishes snapshots.

use bazaar_shared::{
    ActionResultMessage, RoundPhase, ShopCommand, ShopOffer, SnapshotMessage, Tick,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::ShopConfig;

/// Economy knobs of the stand-in server.
#[derive(Clone, Copy, Debug)]
pub struct ServerRules {
    /// Gold at game start.
    pub starting_gold: u32,
    /// Gold granted every round.
    pub income: u32,
    /// Units a player can hold before purchases are rejected.
    pub bench_capacity: u32,
    /// Server ticks per round.
    pub round_ticks: u64,
}

impl Default for ServerRules {
    fn default() -> Self {
        Self {
            starting_gold: 10,
            income: 5,
            bench_capacity: 6,
            round_ticks: 120,
        }
    }
}

/// Authoritative shop state for one player.
pub struct SimulatedShopServer {
    rules: ServerRules,
    reroll_cost: u32,
    xp_cost: u32,
    max_level: u32,
    tick: Tick,
    gold: u32,
    free_rerolls: u32,
    shop: Vec<Option<ShopOffer>>,
    locked: bool,
    level: u32,
    bench: u32,
    round: u32,
    rng: ChaCha8Rng,
}

impl SimulatedShopServer {
    /// Creates a server with a freshly rolled shop.
    #[must_use]
    pub fn new(config: &ShopConfig, rules: ServerRules, seed: u64) -> Self {
        let mut server = Self {
            rules,
            reroll_cost: config.reroll_cost,
            xp_cost: config.xp_cost,
            max_level: config.max_level,
            tick: 0,
            gold: rules.starting_gold,
            free_rerolls: 1,
            shop: vec![None; config.shop_size],
            locked: false,
            level: 1,
            bench: 0,
            round: 1,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        server.roll_shop();
        server
    }

    /// Current server tick.
    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    /// Authoritative gold.
    #[must_use]
    pub const fn gold(&self) -> u32 {
        self.gold
    }

    /// Advances one tick. Returns `true` when a new round started.
    pub fn advance(&mut self) -> bool {
        self.tick += 1;
        if self.tick % self.rules.round_ticks.max(1) != 0 {
            return false;
        }
        self.round += 1;
        self.gold = self.gold.saturating_add(self.rules.income);
        self.free_rerolls = 1;
        // Units leave the bench for the board between rounds.
        self.bench = 0;
        if !self.locked {
            self.roll_shop();
        }
        true
    }

    /// Applies one command and reports the outcome.
    pub fn apply(&mut self, command: ShopCommand) -> ActionResultMessage {
        let outcome = match command {
            ShopCommand::BuyUnit { slot } => self.buy_unit(slot),
            ShopCommand::Reroll => self.reroll(),
            ShopCommand::BuyXp => self.buy_xp(),
            ShopCommand::ToggleShopLock => {
                self.locked = !self.locked;
                Ok(())
            }
        };
        ActionResultMessage {
            action: command.action(),
            success: outcome.is_ok(),
            reason: outcome.err().map(str::to_owned),
        }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn snapshot(&self) -> SnapshotMessage {
        SnapshotMessage {
            tick: self.tick,
            gold: self.gold,
            free_rerolls: self.free_rerolls,
            shop_slots: self.shop.clone(),
            shop_locked: self.locked,
            level: self.level,
            health: 100,
            round: self.round,
            phase: RoundPhase::Shopping,
        }
    }

    fn buy_unit(&mut self, slot: usize) -> Result<(), &'static str> {
        let offer = self
            .shop
            .get(slot)
            .copied()
            .flatten()
            .ok_or("slot empty")?;
        if self.gold < offer.cost {
            return Err("not enough gold");
        }
        if self.bench >= self.rules.bench_capacity {
            return Err("bench full");
        }
        self.gold -= offer.cost;
        self.bench += 1;
        self.shop[slot] = None;
        Ok(())
    }

    fn reroll(&mut self) -> Result<(), &'static str> {
        if self.free_rerolls > 0 {
            self.free_rerolls -= 1;
        } else if self.gold >= self.reroll_cost {
            self.gold -= self.reroll_cost;
        } else {
            return Err("not enough gold");
        }
        self.roll_shop();
        Ok(())
    }

    fn buy_xp(&mut self) -> Result<(), &'static str> {
        if self.level >= self.max_level {
            return Err("max level");
        }
        if self.gold < self.xp_cost {
            return Err("not enough gold");
        }
        self.gold -= self.xp_cost;
        self.level += 1;
        Ok(())
    }

    fn roll_shop(&mut self) {
        for slot in &mut self.shop {
            let unit_id = self.rng.gen_range(1..=60);
            let cost = self.rng.gen_range(1..=5);
            *slot = Some(ShopOffer::new(unit_id, cost));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> SimulatedShopServer {
        SimulatedShopServer::new(&ShopConfig::default(), ServerRules::default(), 9)
    }

    #[test]
    fn test_buy_unit_empties_slot() {
        let mut s = server();
        let cost = s.snapshot().shop_slots[0].unwrap().cost;
        let result = s.apply(ShopCommand::BuyUnit { slot: 0 });
        assert!(result.success);
        assert_eq!(s.gold(), 10 - cost);
        assert_eq!(s.snapshot().shop_slots[0], None);

        let again = s.apply(ShopCommand::BuyUnit { slot: 0 });
        assert!(!again.success);
        assert_eq!(again.reason.as_deref(), Some("slot empty"));
    }

    #[test]
    fn test_reroll_uses_free_first() {
        let mut s = server();
        assert!(s.apply(ShopCommand::Reroll).success);
        assert_eq!(s.gold(), 10);
        assert!(s.apply(ShopCommand::Reroll).success);
        assert_eq!(s.gold(), 8);
    }

    #[test]
    fn test_round_grants_income() {
        let mut s = server();
        let rounds = (0..ServerRules::default().round_ticks)
            .filter(|_| s.advance())
            .count();
        assert_eq!(rounds, 1);
        assert_eq!(s.gold(), 15);
        assert_eq!(s.snapshot().round, 2);
    }
}
