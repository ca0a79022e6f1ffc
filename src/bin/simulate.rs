//! Ballroom Simulation Tool - headless runs of the body arena
//!
//! Steps the arena without rendering and reports containment, contacts
//! and kinetic energy per run.
//!
//! Usage:
//!   cargo run --bin simulate -- --help
//!   cargo run --bin simulate -- --frames 600 --script barrage --seed 7
//!   cargo run --bin simulate -- --runs 64 --parallel 8 --db runs.db

use ballroom::simulation::{SimConfig, run_simulation};

fn main() {
    let config = SimConfig::from_args();
    if let Err(e) = run_simulation(config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
