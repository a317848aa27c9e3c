//! Rating core for the tournament simulator
//!
//! This crate provides:
//! - Validated match facts (`MatchRecord`) tagged by competition tier
//! - An incremental Elo engine with tiered K-factors and home advantage
//! - Period queries that split a history at a cutoff year without
//!   disturbing the base timeline
//!
//! Nothing here performs I/O; callers hand in parsed match records and read
//! ratings and timelines back.

mod elo;
mod error;
mod period;
mod types;

pub use elo::*;
pub use error::{RatingError, Result};
pub use period::*;
pub use types::*;
