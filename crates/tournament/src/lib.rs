//! Tournament simulator driven by Elo ratings
//!
//! This crate provides:
//! - A rating-driven goal model and the [`MatchModel`] seam the simulators use
//! - Round-robin group stages with a deterministic tie-break chain
//! - Single-elimination brackets with decisive matches
//! - Whole-tournament runs (groups, best thirds, seeding, knockout)
//! - Parallel Monte Carlo batches aggregated into odds
//!
//! # Usage
//!
//! ```bash
//! # Current ratings from a match history
//! cargo run -p tournament -- ratings --matches results.json --top 20
//!
//! # One simulated AFCON 2025
//! cargo run -p tournament -- simulate --matches results.json --seed 7
//!
//! # Title odds over 10,000 runs
//! cargo run -p tournament -- odds --matches results.json --runs 10000
//! ```

mod config;
mod error;
mod group_stage;
mod knockout;
mod monte_carlo;
mod orchestrator;
mod outcome;
mod results;

pub use config::*;
pub use error::*;
pub use group_stage::*;
pub use knockout::*;
pub use monte_carlo::*;
pub use orchestrator::*;
pub use outcome::*;
pub use results::*;
