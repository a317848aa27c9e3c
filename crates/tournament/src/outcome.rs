//! Win probabilities and stochastic scorelines from a pair of ratings
//!
//! Every sampling function takes the random source as an argument, so a run is
//! reproducible from its seed and independent runs can execute in parallel.

use rand::{Rng, RngCore};
use rand_distr::StandardNormal;
use rating_core::{expected_score, GameResult, RatingTable};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

/// Mean goals per side between equally rated teams
pub const DEFAULT_BASE_GOALS: f64 = 1.3;

/// Rating gap worth one goal of expected-goal shift
pub const DEFAULT_RATING_DIVISOR: f64 = 400.0;

/// Standard deviation of the per-side goal noise
pub const DEFAULT_GOAL_JITTER_SD: f64 = 1.1;

/// Share of drawn knockout matches settled in extra time rather than penalties
pub const DEFAULT_EXTRA_TIME_SHARE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomeConfig {
    pub base_goals: f64,
    pub rating_divisor: f64,
    pub goal_jitter_sd: f64,
    pub extra_time_share: f64,
}

impl Default for OutcomeConfig {
    fn default() -> Self {
        Self {
            base_goals: DEFAULT_BASE_GOALS,
            rating_divisor: DEFAULT_RATING_DIVISOR,
            goal_jitter_sd: DEFAULT_GOAL_JITTER_SD,
            extra_time_share: DEFAULT_EXTRA_TIME_SHARE,
        }
    }
}

impl OutcomeConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.base_goals.is_finite() && self.base_goals >= 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "base_goals must be non-negative, got {}",
                self.base_goals
            )));
        }
        if !(self.rating_divisor.is_finite() && self.rating_divisor > 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "rating_divisor must be positive, got {}",
                self.rating_divisor
            )));
        }
        if !(self.goal_jitter_sd.is_finite() && self.goal_jitter_sd >= 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "goal_jitter_sd must be non-negative, got {}",
                self.goal_jitter_sd
            )));
        }
        if !(0.0..=1.0).contains(&self.extra_time_share) {
            return Err(SimulationError::InvalidConfig(format!(
                "extra_time_share must lie in [0, 1], got {}",
                self.extra_time_share
            )));
        }
        Ok(())
    }
}

/// Goals scored by each side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scoreline {
    pub goals_a: u32,
    pub goals_b: u32,
}

impl Scoreline {
    pub fn new(goals_a: u32, goals_b: u32) -> Self {
        Self { goals_a, goals_b }
    }

    pub fn result(&self) -> GameResult {
        GameResult::from_scores(self.goals_a, self.goals_b)
    }

    pub fn is_draw(&self) -> bool {
        self.goals_a == self.goals_b
    }

    /// Same match seen from B's side
    pub fn flipped(&self) -> Self {
        Self::new(self.goals_b, self.goals_a)
    }
}

impl std::fmt::Display for Scoreline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.goals_a, self.goals_b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

/// How a knockout match was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Regulation,
    ExtraTime,
    Penalties { kicks_a: u32, kicks_b: u32 },
}

/// Knockout outcome: always exactly one winner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisiveResult {
    /// Score after ninety minutes
    pub regulation: Scoreline,
    /// Score after extra time (equal to `regulation` otherwise)
    pub final_score: Scoreline,
    pub resolution: Resolution,
    pub winner: Side,
}

/// One match to be played: both ids with the ratings and venue bonus in effect.
///
/// `home_bonus` is added to A's rating; a negative bonus favours B.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fixture<'a> {
    pub competitor_a: &'a str,
    pub competitor_b: &'a str,
    pub rating_a: f64,
    pub rating_b: f64,
    pub home_bonus: f64,
}

impl<'a> Fixture<'a> {
    pub fn win_probability(&self) -> f64 {
        win_probability(self.rating_a, self.rating_b, self.home_bonus)
    }

    pub fn name(&self, side: Side) -> &'a str {
        match side {
            Side::A => self.competitor_a,
            Side::B => self.competitor_b,
        }
    }
}

/// Where a tournament is played: the host gets `home_advantage` in each of
/// its matches, everyone else plays on neutral ground.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Venue {
    pub host: Option<String>,
    pub home_advantage: f64,
}

impl Venue {
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn hosted_by(host: impl Into<String>, home_advantage: f64) -> Self {
        Self {
            host: Some(host.into()),
            home_advantage,
        }
    }

    pub fn bonus_for(&self, a: &str, b: &str) -> f64 {
        match self.host.as_deref() {
            Some(host) if host == a => self.home_advantage,
            Some(host) if host == b => -self.home_advantage,
            _ => 0.0,
        }
    }

    pub fn fixture<'a>(&self, a: &'a str, b: &'a str, ratings: &RatingTable) -> Fixture<'a> {
        Fixture {
            competitor_a: a,
            competitor_b: b,
            rating_a: ratings.rating_of(a),
            rating_b: ratings.rating_of(b),
            home_bonus: self.bonus_for(a, b),
        }
    }
}

/// Probability that A beats B, same formula as the rating engine's expectation
pub fn win_probability(rating_a: f64, rating_b: f64, home_bonus: f64) -> f64 {
    expected_score(rating_a, rating_b, home_bonus)
}

/// Turn a regulation scoreline into a decisive result.
///
/// A non-draw stands. A draw is settled by one Bernoulli draw with
/// `p_a`; the winner is then credited either an extra-time goal or a
/// shoot-out win. Probabilities outside [0, 1] are clamped and NaN reads as
/// an even chance.
pub fn settle<R: Rng + ?Sized>(
    regulation: Scoreline,
    p_a: f64,
    extra_time_share: f64,
    rng: &mut R,
) -> DecisiveResult {
    if !regulation.is_draw() {
        let winner = if regulation.goals_a > regulation.goals_b {
            Side::A
        } else {
            Side::B
        };
        return DecisiveResult {
            regulation,
            final_score: regulation,
            resolution: Resolution::Regulation,
            winner,
        };
    }

    let winner = if rng.gen_bool(unit_probability(p_a)) {
        Side::A
    } else {
        Side::B
    };

    if rng.gen_bool(unit_probability(extra_time_share)) {
        let mut final_score = regulation;
        match winner {
            Side::A => final_score.goals_a += 1,
            Side::B => final_score.goals_b += 1,
        }
        DecisiveResult {
            regulation,
            final_score,
            resolution: Resolution::ExtraTime,
            winner,
        }
    } else {
        let loser_kicks = rng.gen_range(2..=4);
        let (kicks_a, kicks_b) = match winner {
            Side::A => (loser_kicks + 1, loser_kicks),
            Side::B => (loser_kicks, loser_kicks + 1),
        };
        DecisiveResult {
            regulation,
            final_score: regulation,
            resolution: Resolution::Penalties { kicks_a, kicks_b },
            winner,
        }
    }
}

fn unit_probability(p: f64) -> f64 {
    if p.is_nan() {
        0.5
    } else {
        p.clamp(0.0, 1.0)
    }
}

/// Anything that can play a fixture.
///
/// The simulators only talk to this trait, so tests can script scorelines
/// while production runs use [`OutcomeModel`].
pub trait MatchModel {
    /// Play a match where a draw is a valid result
    fn play(&self, fixture: &Fixture<'_>, rng: &mut dyn RngCore) -> Scoreline;

    /// Play a match that must produce a winner
    fn play_decisive(&self, fixture: &Fixture<'_>, rng: &mut dyn RngCore) -> DecisiveResult {
        let regulation = self.play(fixture, rng);
        settle(
            regulation,
            fixture.win_probability(),
            DEFAULT_EXTRA_TIME_SHARE,
            rng,
        )
    }
}

/// Rating-driven goal model.
///
/// Each side's expected goals start at `base_goals` and shift by the rating
/// gap divided by `rating_divisor`, clipped at zero. Normal noise is added
/// and the sum rounded, never below zero.
#[derive(Debug, Clone, Default)]
pub struct OutcomeModel {
    config: OutcomeConfig,
}

impl OutcomeModel {
    pub fn new(config: OutcomeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &OutcomeConfig {
        &self.config
    }

    pub fn win_probability(&self, rating_a: f64, rating_b: f64, home_bonus: f64) -> f64 {
        win_probability(rating_a, rating_b, home_bonus)
    }

    /// Mean goals for (A, B) before noise
    pub fn expected_goals(&self, rating_a: f64, rating_b: f64, home_bonus: f64) -> (f64, f64) {
        let shift = (rating_a + home_bonus - rating_b) / self.config.rating_divisor;
        (
            (self.config.base_goals + shift).max(0.0),
            (self.config.base_goals - shift).max(0.0),
        )
    }

    pub fn simulate_scoreline<R: Rng + ?Sized>(
        &self,
        rating_a: f64,
        rating_b: f64,
        home_bonus: f64,
        rng: &mut R,
    ) -> Scoreline {
        let (mean_a, mean_b) = self.expected_goals(rating_a, rating_b, home_bonus);
        let goals_a = self.sample_goals(mean_a, rng);
        let goals_b = self.sample_goals(mean_b, rng);
        Scoreline::new(goals_a, goals_b)
    }

    pub fn simulate_decisive<R: Rng + ?Sized>(
        &self,
        rating_a: f64,
        rating_b: f64,
        home_bonus: f64,
        rng: &mut R,
    ) -> DecisiveResult {
        let regulation = self.simulate_scoreline(rating_a, rating_b, home_bonus, rng);
        settle(
            regulation,
            self.win_probability(rating_a, rating_b, home_bonus),
            self.config.extra_time_share,
            rng,
        )
    }

    fn sample_goals<R: Rng + ?Sized>(&self, mean: f64, rng: &mut R) -> u32 {
        let noise: f64 = rng.sample(StandardNormal);
        let goals = (mean + self.config.goal_jitter_sd * noise).round();
        if goals > 0.0 {
            goals as u32
        } else {
            0
        }
    }
}

impl MatchModel for OutcomeModel {
    fn play(&self, fixture: &Fixture<'_>, rng: &mut dyn RngCore) -> Scoreline {
        self.simulate_scoreline(fixture.rating_a, fixture.rating_b, fixture.home_bonus, rng)
    }

    fn play_decisive(&self, fixture: &Fixture<'_>, rng: &mut dyn RngCore) -> DecisiveResult {
        self.simulate_decisive(fixture.rating_a, fixture.rating_b, fixture.home_bonus, rng)
    }
}

#[cfg(test)]
#[path = "outcome_tests.rs"]
mod outcome_tests;
