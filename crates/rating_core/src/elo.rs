//! Elo rating calculation and tracking

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::trace;

use crate::error::{RatingError, Result};
use crate::types::{CompetitionTier, MatchRecord};

/// Default starting Elo for competitors never seen before
pub const DEFAULT_ELO: f64 = 1500.0;

/// Rating points credited to the home side on a non-neutral ground
pub const DEFAULT_HOME_ADVANTAGE: f64 = 100.0;

/// Rating gap that turns into 10:1 odds
pub const ELO_SCALE: f64 = 400.0;

/// Keeps expectations strictly inside (0, 1) even for absurd rating gaps
const PROBABILITY_FLOOR: f64 = 1e-12;

/// Expected score for A against B, with `home_bonus` added to A's rating.
///
/// `1 / (1 + 10^((R_b - (R_a + H)) / 400))`, clamped to the open unit interval.
/// Equal ratings with no bonus give exactly 0.5, and so does any input that
/// leaves the gap undefined (a NaN rating, or two infinities of the same sign).
pub fn expected_score(rating_a: f64, rating_b: f64, home_bonus: f64) -> f64 {
    let exponent = (rating_b - (rating_a + home_bonus)) / ELO_SCALE;
    let p = 1.0 / (1.0 + 10.0_f64.powf(exponent));
    if p.is_nan() {
        return 0.5;
    }
    p.clamp(PROBABILITY_FLOOR, 1.0 - PROBABILITY_FLOOR)
}

/// K-factor per competition tier (higher = more volatile).
///
/// This is a weighting policy, not part of Elo itself: a World Cup match moves
/// ratings three times as much as a friendly under the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KFactorPolicy {
    pub world_cup: f64,
    pub continental: f64,
    pub qualifier: f64,
    pub friendly: f64,
    pub other: f64,
}

impl Default for KFactorPolicy {
    fn default() -> Self {
        Self {
            world_cup: 60.0,
            continental: 50.0,
            qualifier: 40.0,
            friendly: 20.0,
            other: 30.0,
        }
    }
}

impl KFactorPolicy {
    /// Same K for every tier
    pub fn flat(k: f64) -> Self {
        Self {
            world_cup: k,
            continental: k,
            qualifier: k,
            friendly: k,
            other: k,
        }
    }

    pub fn k_for(&self, tier: CompetitionTier) -> f64 {
        match tier {
            CompetitionTier::WorldCup => self.world_cup,
            CompetitionTier::Continental => self.continental,
            CompetitionTier::Qualifier => self.qualifier,
            CompetitionTier::Friendly => self.friendly,
            CompetitionTier::Other => self.other,
        }
    }

    fn validate(&self) -> Result<()> {
        for tier in CompetitionTier::ALL {
            let k = self.k_for(tier);
            if !(k.is_finite() && k > 0.0) {
                return Err(RatingError::InvalidConfig(format!(
                    "k-factor for {} must be positive, got {}",
                    tier.label(),
                    k
                )));
            }
        }
        Ok(())
    }
}

/// Rating model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EloConfig {
    /// Rating assigned on first appearance
    pub initial_rating: f64,
    /// Bonus for competitor A when the ground is not neutral
    pub home_advantage: f64,
    pub k_factors: KFactorPolicy,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            initial_rating: DEFAULT_ELO,
            home_advantage: DEFAULT_HOME_ADVANTAGE,
            k_factors: KFactorPolicy::default(),
        }
    }
}

impl EloConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.initial_rating.is_finite() {
            return Err(RatingError::InvalidConfig(format!(
                "initial rating must be finite, got {}",
                self.initial_rating
            )));
        }
        if !(self.home_advantage.is_finite() && self.home_advantage >= 0.0) {
            return Err(RatingError::InvalidConfig(format!(
                "home advantage must be a non-negative number, got {}",
                self.home_advantage
            )));
        }
        self.k_factors.validate()
    }
}

/// Ratings of both sides right after one match was applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSnapshot {
    pub date: NaiveDate,
    pub competitor_a: String,
    pub competitor_b: String,
    pub rating_a: f64,
    pub rating_b: f64,
    /// Points moved from B to A (negative when A lost ground)
    pub delta: f64,
}

/// Frozen competitor → rating view handed to the simulators.
///
/// Absent competitors read as `base`, the same way the engine treats them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingTable {
    ratings: HashMap<String, f64>,
    base: f64,
}

impl Default for RatingTable {
    fn default() -> Self {
        Self::new(DEFAULT_ELO)
    }
}

impl RatingTable {
    pub fn new(base: f64) -> Self {
        Self {
            ratings: HashMap::new(),
            base,
        }
    }

    pub fn from_pairs<I, S>(base: f64, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            ratings: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            base,
        }
    }

    pub fn insert(&mut self, competitor: impl Into<String>, rating: f64) {
        self.ratings.insert(competitor.into(), rating);
    }

    pub fn rating_of(&self, competitor: &str) -> f64 {
        self.ratings.get(competitor).copied().unwrap_or(self.base)
    }

    pub fn contains(&self, competitor: &str) -> bool {
        self.ratings.contains_key(competitor)
    }

    pub fn base(&self) -> f64 {
        self.base
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// Every rating, and the base, must be a finite number.
    ///
    /// The table accepts any `f64` on insert; simulators call this before
    /// turning ratings into probabilities.
    pub fn validate(&self) -> Result<()> {
        if !self.base.is_finite() {
            return Err(RatingError::InvalidConfig(format!(
                "base rating must be finite, got {}",
                self.base
            )));
        }
        let first_bad = self
            .ratings
            .iter()
            .filter(|(_, rating)| !rating.is_finite())
            .min_by(|a, b| a.0.cmp(b.0));
        match first_bad {
            Some((competitor, rating)) => Err(RatingError::InvalidConfig(format!(
                "rating for {competitor} must be finite, got {rating}"
            ))),
            None => Ok(()),
        }
    }
}

/// Incremental Elo engine owning one rating per competitor.
///
/// Competitors are created on first reference at `initial_rating` and never
/// removed. Reads (`rating_of`, `leaderboard`) take `&self`; updates take
/// `&mut self`, so concurrent writers must go through one owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingEngine {
    config: EloConfig,
    ratings: HashMap<String, f64>,
    games_played: HashMap<String, u32>,
    timeline: Vec<RatingSnapshot>,
}

impl Default for RatingEngine {
    fn default() -> Self {
        Self::with_config(EloConfig::default())
    }
}

impl RatingEngine {
    pub fn new(config: EloConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: EloConfig) -> Self {
        Self {
            config,
            ratings: HashMap::new(),
            games_played: HashMap::new(),
            timeline: Vec::new(),
        }
    }

    pub fn config(&self) -> &EloConfig {
        &self.config
    }

    /// Current rating, or the base rating for a competitor never seen
    pub fn rating_of(&self, competitor: &str) -> f64 {
        self.ratings
            .get(competitor)
            .copied()
            .unwrap_or(self.config.initial_rating)
    }

    pub fn games_played(&self, competitor: &str) -> u32 {
        self.games_played.get(competitor).copied().unwrap_or(0)
    }

    /// Expected score for `a` against `b` at the current ratings
    pub fn expected_score(&self, a: &str, b: &str, home_bonus: f64) -> f64 {
        expected_score(self.rating_of(a), self.rating_of(b), home_bonus)
    }

    /// Apply one match with the home bonus for competitor A (none on a neutral site).
    ///
    /// The record is validated first; a rejected record leaves the engine as it was.
    pub fn update(&mut self, record: &MatchRecord) -> Result<RatingSnapshot> {
        record.validate()?;
        let bonus = self.home_bonus(record);
        Ok(self.apply(record, bonus))
    }

    /// Apply one match ignoring venue entirely (home bonus forced to zero)
    pub fn update_neutral(&mut self, record: &MatchRecord) -> Result<RatingSnapshot> {
        record.validate()?;
        Ok(self.apply(record, 0.0))
    }

    /// Apply every record in order.
    ///
    /// The batch must be chronological (non-decreasing dates); the engine does
    /// not sort, see [`sort_chronologically`](crate::sort_chronologically). The
    /// whole batch is validated before the first update, so an error leaves the
    /// engine untouched.
    ///
    /// Replaying the same history twice on one engine counts every match twice.
    /// Use a fresh engine per replay.
    pub fn replay(&mut self, matches: &[MatchRecord]) -> Result<()> {
        validate_batch(matches)?;
        for record in matches {
            let bonus = self.home_bonus(record);
            self.apply(record, bonus);
        }
        Ok(())
    }

    /// [`replay`](Self::replay) through the neutral path
    pub fn replay_neutral(&mut self, matches: &[MatchRecord]) -> Result<()> {
        validate_batch(matches)?;
        for record in matches {
            self.apply(record, 0.0);
        }
        Ok(())
    }

    fn home_bonus(&self, record: &MatchRecord) -> f64 {
        if record.neutral_site {
            0.0
        } else {
            self.config.home_advantage
        }
    }

    fn apply(&mut self, record: &MatchRecord, home_bonus: f64) -> RatingSnapshot {
        let a = record.competitor_a.as_str();
        let b = record.competitor_b.as_str();
        let rating_a = self.rating_of(a);
        let rating_b = self.rating_of(b);

        let expected = expected_score(rating_a, rating_b, home_bonus);
        let k = self.config.k_factors.k_for(record.competition);
        let delta = k * (record.actual_score() - expected);

        let new_a = rating_a + delta;
        let new_b = rating_b - delta;
        self.ratings.insert(a.to_string(), new_a);
        self.ratings.insert(b.to_string(), new_b);
        *self.games_played.entry(a.to_string()).or_insert(0) += 1;
        *self.games_played.entry(b.to_string()).or_insert(0) += 1;

        trace!(
            date = %record.date,
            home = a,
            away = b,
            expected,
            delta,
            "rating update"
        );

        let snapshot = RatingSnapshot {
            date: record.date,
            competitor_a: a.to_string(),
            competitor_b: b.to_string(),
            rating_a: new_a,
            rating_b: new_b,
            delta,
        };
        self.timeline.push(snapshot.clone());
        snapshot
    }

    /// Per-match snapshots in application order
    pub fn timeline(&self) -> &[RatingSnapshot] {
        &self.timeline
    }

    /// A competitor's rating after each of its matches
    pub fn trajectory(&self, competitor: &str) -> Vec<(NaiveDate, f64)> {
        self.timeline
            .iter()
            .filter_map(|s| {
                if s.competitor_a == competitor {
                    Some((s.date, s.rating_a))
                } else if s.competitor_b == competitor {
                    Some((s.date, s.rating_b))
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn ratings(&self) -> &HashMap<String, f64> {
        &self.ratings
    }

    /// Number of competitors seen so far
    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// (competitor, rating, games) sorted by rating, ties by name
    pub fn leaderboard(&self) -> Vec<(String, f64, u32)> {
        let mut entries: Vec<_> = self
            .ratings
            .iter()
            .map(|(name, &rating)| (name.clone(), rating, self.games_played(name)))
            .collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }

    /// Copy of the current ratings and counts with an empty timeline.
    ///
    /// Continuing a replay on the copy never touches `self`.
    pub fn snapshot(&self) -> Self {
        Self {
            config: self.config.clone(),
            ratings: self.ratings.clone(),
            games_played: self.games_played.clone(),
            timeline: Vec::new(),
        }
    }

    /// Frozen rating view for simulation input
    pub fn table(&self) -> RatingTable {
        RatingTable {
            ratings: self.ratings.clone(),
            base: self.config.initial_rating,
        }
    }
}

fn validate_batch(matches: &[MatchRecord]) -> Result<()> {
    let mut previous: Option<NaiveDate> = None;
    for (index, record) in matches.iter().enumerate() {
        record.validate()?;
        if let Some(prev) = previous {
            if record.date < prev {
                return Err(RatingError::UnorderedHistory {
                    index,
                    previous: prev,
                    found: record.date,
                });
            }
        }
        previous = Some(record.date);
    }
    Ok(())
}

#[cfg(test)]
#[path = "elo_tests.rs"]
mod elo_tests;
