//! # Shop Session Simulation
//!
//! Runs the optimistic shop against the stand-in server across link
//! presets and seeds, and reports whether every run converged.
//!
//! Usage: `shop_session_sim [path/to/shop.toml]`

use bazaar_client::{LinkConditions, ShopConfig, ShopSimulation, SimulationConfig};

const SEEDS: [u64; 4] = [1, 7, 42, 1337];

fn main() {
    let shop = match std::env::args().nth(1) {
        Some(path) => match ShopConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("failed to load {path}: {err}");
                std::process::exit(2);
            }
        },
        None => ShopConfig::default(),
    };

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         BAZAAR - OPTIMISTIC SHOP CONVERGENCE RUN                 ║");
    println!("╠══════════════════════════════════════════════════════════════════╣");
    println!("║  Bot spends, server decides, display must land on the truth      ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");

    let links = [
        ("perfect", LinkConditions::PERFECT),
        ("good", LinkConditions::GOOD),
        ("average", LinkConditions::AVERAGE),
        ("poor", LinkConditions::POOR),
    ];

    let mut failures = 0;
    for (name, link) in links {
        for seed in SEEDS {
            let stats = ShopSimulation::new(SimulationConfig {
                seed,
                link,
                shop: shop.clone(),
                ..SimulationConfig::default()
            })
            .run();

            let verdict = if stats.converged && stats.clamp_violations == 0 {
                "✅"
            } else {
                failures += 1;
                "❌"
            };
            println!(
                "{verdict} {name:<8} seed {seed:<5} sent {:>4} refused {:>4} rejected {:>3} \
                 applied {:>4} stale {:>3} lost {:>3} timeouts {:>2} min gold {:>4}",
                stats.commands_sent,
                stats.requests_refused,
                stats.server_rejections,
                stats.snapshots_applied,
                stats.snapshots_discarded,
                stats.frames_dropped,
                stats.reroll_timeouts,
                stats.min_unclamped_gold,
            );
        }
    }

    if failures == 0 {
        println!("\nAll runs converged.");
        std::process::exit(0);
    } else {
        println!("\n{failures} run(s) did not converge.");
        std::process::exit(1);
    }
}
