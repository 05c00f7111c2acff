//! # Shop Simulation
//!
//! Deterministic end-to-end run of a [`ShopSession`] against a stand-in
//! server over a lossy, reordering link.
//!
//! Commands and action results ride an ordered, reliable stream, so
//! acknowledgements come back in send order. Snapshots may be lost or
//! overtake each other.
//!
//! ```text
//!  bot ──▶ ShopSession ──▶ Sender<ShopCommand> ──▶ uplink ──▶ SimulatedShopServer
//!              ▲                                                  │
//!              └───────────────── downlink (JSON frames) ◀────────┘
//! ```
//!
//! Everything is driven by one seeded `ChaCha8Rng`, so a seed reproduces a
//! run exactly. After the bot stops, the run waits for the links to drain
//! and then checks the displayed economy against the server's.

pub mod server;

pub use server::{ServerRules, SimulatedShopServer};

use std::collections::BTreeMap;

use bazaar_shared::{
    decode_command, encode_command, encode_server_message, ServerMessage, ShopCommand, Tick,
};
use crossbeam_channel::{Receiver, Sender};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::ShopConfig;
use crate::integration::StaticSession;
use crate::session::ShopSession;
use crate::transition::TransitionEvent;

/// Link conditions, in simulation ticks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkConditions {
    /// One-way delay in ticks.
    pub base_latency_ticks: u64,
    /// Extra delay drawn from `0..=jitter_ticks`.
    pub jitter_ticks: u64,
    /// Server-to-client snapshot loss (0-100).
    pub loss_percent: u8,
    /// Snapshots held back by an extra base latency (0-100).
    pub reorder_percent: u8,
}

impl LinkConditions {
    /// Instant delivery.
    pub const PERFECT: Self = Self {
        base_latency_ticks: 0,
        jitter_ticks: 0,
        loss_percent: 0,
        reorder_percent: 0,
    };

    /// Wired connection.
    pub const GOOD: Self = Self {
        base_latency_ticks: 2,
        jitter_ticks: 1,
        loss_percent: 0,
        reorder_percent: 0,
    };

    /// Home wifi.
    pub const AVERAGE: Self = Self {
        base_latency_ticks: 4,
        jitter_ticks: 3,
        loss_percent: 1,
        reorder_percent: 5,
    };

    /// Mobile data.
    pub const POOR: Self = Self {
        base_latency_ticks: 8,
        jitter_ticks: 6,
        loss_percent: 5,
        reorder_percent: 15,
    };

    /// No snapshot ever arrives.
    pub const DEAD_DOWNLINK: Self = Self {
        base_latency_ticks: 1,
        jitter_ticks: 0,
        loss_percent: 100,
        reorder_percent: 0,
    };

    fn delay(&self, rng: &mut ChaCha8Rng) -> u64 {
        let mut delay = self.base_latency_ticks + rng.gen_range(0..=self.jitter_ticks);
        if rng.gen_range(0..100u8) < self.reorder_percent {
            delay += self.base_latency_ticks.max(1);
        }
        delay
    }

    fn drops(&self, rng: &mut ChaCha8Rng) -> bool {
        rng.gen_range(0..100u8) < self.loss_percent
    }
}

impl Default for LinkConditions {
    fn default() -> Self {
        Self::AVERAGE
    }
}

/// One-way link carrying encoded frames.
#[derive(Debug, Default)]
pub struct LatencyLink {
    in_flight: BTreeMap<(Tick, u64), Vec<u8>>,
    next_seq: u64,
    last_ordered_arrival: Tick,
}

impl LatencyLink {
    /// Creates an empty link.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a frame to arrive at `arrival_tick`.
    pub fn send(&mut self, arrival_tick: Tick, frame: Vec<u8>) {
        self.in_flight.insert((arrival_tick, self.next_seq), frame);
        self.next_seq += 1;
    }

    /// Queues a frame that must not overtake earlier ordered frames.
    pub fn send_ordered(&mut self, arrival_tick: Tick, frame: Vec<u8>) {
        let arrival = arrival_tick.max(self.last_ordered_arrival);
        self.last_ordered_arrival = arrival;
        self.send(arrival, frame);
    }

    /// Frames due by `now`, in arrival order.
    pub fn deliver(&mut self, now: Tick) -> Vec<Vec<u8>> {
        let later = self.in_flight.split_off(&(now + 1, 0));
        std::mem::replace(&mut self.in_flight, later)
            .into_values()
            .collect()
    }

    /// Frames still in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    /// True if nothing is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }
}

/// Simulation parameters.
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// RNG seed.
    pub seed: u64,
    /// Ticks during which the bot acts.
    pub active_ticks: u64,
    /// Upper bound on ticks spent draining afterwards.
    pub drain_ticks: u64,
    /// Seconds per tick.
    pub tick_secs: f32,
    /// Chance per tick that the bot acts (0-100).
    pub action_percent: u8,
    /// Server publishes a snapshot at least this often, in ticks.
    pub snapshot_interval_ticks: u64,
    /// Link conditions, both directions.
    pub link: LinkConditions,
    /// Client economy config.
    pub shop: ShopConfig,
    /// Server economy.
    pub server: ServerRules,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            active_ticks: 1_200,
            drain_ticks: 600,
            tick_secs: 1.0 / 60.0,
            action_percent: 10,
            snapshot_interval_ticks: 30,
            link: LinkConditions::AVERAGE,
            shop: ShopConfig::default(),
            server: ServerRules::default(),
        }
    }
}

/// What happened during a run.
#[derive(Clone, Debug, Default)]
pub struct SimulationStats {
    /// Ticks executed.
    pub ticks: u64,
    /// Commands the session sent.
    pub commands_sent: u64,
    /// Requests the dispatcher refused locally.
    pub requests_refused: u64,
    /// Commands the server rejected.
    pub server_rejections: u64,
    /// Frames delivered to the client.
    pub frames_delivered: u64,
    /// Frames lost on the downlink.
    pub frames_dropped: u64,
    /// Snapshots applied.
    pub snapshots_applied: u64,
    /// Snapshots discarded as stale.
    pub snapshots_discarded: u64,
    /// Reroll transitions that gave up waiting.
    pub reroll_timeouts: u64,
    /// Most purchases in flight at once.
    pub max_pending_purchases: usize,
    /// Lowest unclamped displayed gold seen.
    pub min_unclamped_gold: i64,
    /// Frames where rendered gold disagreed with the clamped ledger value.
    pub clamp_violations: u64,
    /// Displayed state matched the server after draining.
    pub converged: bool,
}

/// Bot, session, links and server in one deterministic loop.
pub struct ShopSimulation {
    config: SimulationConfig,
    rng: ChaCha8Rng,
    session: ShopSession<Sender<ShopCommand>, StaticSession>,
    outbound: Receiver<ShopCommand>,
    server: SimulatedShopServer,
    uplink: LatencyLink,
    downlink: LatencyLink,
    now: Tick,
    last_snapshot_tick: Tick,
    stats: SimulationStats,
}

impl ShopSimulation {
    /// Creates a simulation; the server's first snapshot is already in flight.
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        let server = SimulatedShopServer::new(&config.shop, config.server, config.seed ^ 0x5eed);
        let mut sim = Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            session: ShopSession::new(&config.shop, tx, StaticSession::in_game(1)),
            outbound: rx,
            server,
            uplink: LatencyLink::new(),
            downlink: LatencyLink::new(),
            now: 0,
            last_snapshot_tick: 0,
            stats: SimulationStats {
                min_unclamped_gold: i64::MAX,
                ..SimulationStats::default()
            },
            config,
        };
        sim.publish(ServerMessage::Snapshot(sim.server.snapshot()));
        sim
    }

    /// The client session.
    #[must_use]
    pub fn session(&self) -> &ShopSession<Sender<ShopCommand>, StaticSession> {
        &self.session
    }

    /// The server.
    #[must_use]
    pub fn server(&self) -> &SimulatedShopServer {
        &self.server
    }

    /// Runs the active phase, drains, then checks convergence.
    pub fn run(mut self) -> SimulationStats {
        tracing::info!(seed = self.config.seed, link = ?self.config.link, "simulation start");

        for _ in 0..self.config.active_ticks {
            self.bot_act();
            self.step();
        }
        for _ in 0..self.config.drain_ticks {
            if self.uplink.is_empty() && self.downlink.is_empty() && self.outbound.is_empty() {
                break;
            }
            self.step();
        }

        // Two fresh snapshots settle anything waiting on a second look.
        for _ in 0..2 {
            self.server.advance();
            let snapshot = self.server.snapshot();
            self.session.handle_message(ServerMessage::Snapshot(snapshot));
            self.observe();
        }

        self.stats.converged = self.converged();
        tracing::info!(converged = self.stats.converged, ticks = self.stats.ticks, "simulation end");
        self.stats
    }

    /// Advances every component by one tick.
    pub fn step(&mut self) {
        self.now += 1;
        self.stats.ticks += 1;

        // Client -> uplink
        for command in self.outbound.try_iter() {
            match encode_command(&command) {
                Ok(frame) => {
                    let arrival = self.now + self.config.link.delay(&mut self.rng);
                    self.uplink.send_ordered(arrival, frame);
                }
                Err(err) => tracing::warn!(%err, "command encode failed"),
            }
        }

        // Uplink -> server
        let mut changed = false;
        for frame in self.uplink.deliver(self.now) {
            let Ok(command) = decode_command(&frame) else {
                continue;
            };
            let result = self.server.apply(command);
            if !result.success {
                self.stats.server_rejections += 1;
            }
            self.publish(ServerMessage::ActionResult(result));
            changed = true;
        }
        if self.server.advance() {
            changed = true;
        }
        if changed || self.now - self.last_snapshot_tick >= self.config.snapshot_interval_ticks {
            self.last_snapshot_tick = self.now;
            self.publish(ServerMessage::Snapshot(self.server.snapshot()));
        }

        // Downlink -> client
        for frame in self.downlink.deliver(self.now) {
            self.stats.frames_delivered += 1;
            if let Some(report) = self.session.handle_frame(&frame) {
                if report.applied() {
                    self.stats.snapshots_applied += 1;
                } else {
                    self.stats.snapshots_discarded += 1;
                }
            }
        }

        if self.session.update(self.config.tick_secs) == Some(TransitionEvent::TimedOut) {
            self.stats.reroll_timeouts += 1;
        }
        self.observe();
    }

    fn publish(&mut self, message: ServerMessage) {
        let snapshot = matches!(message, ServerMessage::Snapshot(_));
        if snapshot && self.config.link.drops(&mut self.rng) {
            self.stats.frames_dropped += 1;
            return;
        }
        match encode_server_message(&message) {
            Ok(frame) => {
                let arrival = self.now + self.config.link.delay(&mut self.rng);
                if snapshot {
                    self.downlink.send(arrival, frame);
                } else {
                    self.downlink.send_ordered(arrival, frame);
                }
            }
            Err(err) => tracing::warn!(%err, "server frame encode failed"),
        }
    }

    fn bot_act(&mut self) {
        if self.rng.gen_range(0..100u8) >= self.config.action_percent {
            return;
        }
        let result = match self.rng.gen_range(0..10u8) {
            0..=4 => {
                let slot = self.rng.gen_range(0..self.config.shop.shop_size);
                self.session.request_purchase(slot)
            }
            5..=7 => self.session.request_reroll(),
            8 => self.session.request_buy_xp(),
            _ => self.session.request_toggle_lock(),
        };
        match result {
            Ok(_) => self.stats.commands_sent += 1,
            Err(err) => {
                tracing::trace!(%err, "bot request refused");
                self.stats.requests_refused += 1;
            }
        }
    }

    fn observe(&mut self) {
        let Some(shown) = self.session.displayed() else {
            return;
        };
        self.stats.min_unclamped_gold = self.stats.min_unclamped_gold.min(shown.unclamped_gold);
        let expected = u32::try_from(shown.unclamped_gold.max(0)).unwrap_or(u32::MAX);
        if shown.gold != expected {
            self.stats.clamp_violations += 1;
        }
        self.stats.max_pending_purchases = self
            .stats
            .max_pending_purchases
            .max(shown.pending_slots.len());
    }

    fn converged(&self) -> bool {
        let Some(shown) = self.session.displayed() else {
            return false;
        };
        let truth = self.server.snapshot();
        shown.tick == truth.tick
            && shown.unclamped_gold == i64::from(truth.gold)
            && shown.free_rerolls == truth.free_rerolls
            && shown.shop_slots == truth.shop_slots
            && shown.pending_slots.is_empty()
            && shown.level == truth.level
            && shown.shop_locked == truth.shop_locked
    }
}
