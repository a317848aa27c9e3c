//! Match facts consumed by the rating engine

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{RatingError, Result};

/// Importance tier of the competition a match was played in.
///
/// The tier selects the K-factor used for the update (see
/// [`KFactorPolicy`](crate::KFactorPolicy)); it carries no weight by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionTier {
    WorldCup,
    Continental,
    Qualifier,
    Friendly,
    #[default]
    Other,
}

const WORLD_TAGS: &[&str] = &["fifa world cup", "confederations cup"];

const CONTINENTAL_TAGS: &[&str] = &[
    "african cup of nations",
    "copa américa",
    "copa america",
    "uefa euro",
    "afc asian cup",
    "gold cup",
    "ofc nations cup",
];

impl CompetitionTier {
    pub const ALL: [CompetitionTier; 5] = [
        CompetitionTier::WorldCup,
        CompetitionTier::Continental,
        CompetitionTier::Qualifier,
        CompetitionTier::Friendly,
        CompetitionTier::Other,
    ];

    /// Classify a free-text tournament name such as
    /// `"African Cup of Nations qualification"`.
    ///
    /// Qualification is checked first so a continental or world qualifier never
    /// lands in the finals tier.
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim().to_lowercase();
        if tag.contains("qualification") {
            CompetitionTier::Qualifier
        } else if tag.contains("friendly") {
            CompetitionTier::Friendly
        } else if WORLD_TAGS.iter().any(|t| tag.contains(t)) {
            CompetitionTier::WorldCup
        } else if CONTINENTAL_TAGS.iter().any(|t| tag.contains(t)) {
            CompetitionTier::Continental
        } else {
            CompetitionTier::Other
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CompetitionTier::WorldCup => "world cup",
            CompetitionTier::Continental => "continental",
            CompetitionTier::Qualifier => "qualifier",
            CompetitionTier::Friendly => "friendly",
            CompetitionTier::Other => "other",
        }
    }
}

/// Result of a match from competitor A's perspective
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GameResult {
    Win,
    Loss,
    Draw,
}

impl GameResult {
    pub fn from_scores(score_a: u32, score_b: u32) -> Self {
        match score_a.cmp(&score_b) {
            std::cmp::Ordering::Greater => GameResult::Win,
            std::cmp::Ordering::Less => GameResult::Loss,
            std::cmp::Ordering::Equal => GameResult::Draw,
        }
    }

    /// Elo actual score: 1 for a win, 0.5 for a draw, 0 for a loss
    pub fn score(self) -> f64 {
        match self {
            GameResult::Win => 1.0,
            GameResult::Draw => 0.5,
            GameResult::Loss => 0.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            GameResult::Win => GameResult::Loss,
            GameResult::Loss => GameResult::Win,
            GameResult::Draw => GameResult::Draw,
        }
    }
}

/// One immutable match fact.
///
/// `competitor_a` is the home side unless `neutral_site` is set. Deserialising
/// goes through the same validation as [`MatchRecord::try_new`], so a record
/// read from JSON is never self-play and never carries a negative score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatchRecord")]
pub struct MatchRecord {
    pub date: NaiveDate,
    pub competitor_a: String,
    pub competitor_b: String,
    pub score_a: u32,
    pub score_b: u32,
    pub competition: CompetitionTier,
    pub neutral_site: bool,
}

impl MatchRecord {
    pub fn try_new(
        date: NaiveDate,
        competitor_a: impl Into<String>,
        competitor_b: impl Into<String>,
        score_a: i64,
        score_b: i64,
        competition: CompetitionTier,
        neutral_site: bool,
    ) -> Result<Self> {
        let record = MatchRecord {
            date,
            competitor_a: competitor_a.into(),
            competitor_b: competitor_b.into(),
            score_a: non_negative(score_a, "score_a")?,
            score_b: non_negative(score_b, "score_b")?,
            competition,
            neutral_site,
        };
        record.validate()?;
        Ok(record)
    }

    /// Check the invariants the rating engine relies on.
    ///
    /// Fields are public, so the engine re-runs this before every update.
    pub fn validate(&self) -> Result<()> {
        if self.competitor_a.trim().is_empty() || self.competitor_b.trim().is_empty() {
            return Err(RatingError::invalid_match(format!(
                "empty competitor id on {}",
                self.date
            )));
        }
        if self.competitor_a == self.competitor_b {
            return Err(RatingError::invalid_match(format!(
                "{} cannot play itself ({})",
                self.competitor_a, self.date
            )));
        }
        Ok(())
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn result(&self) -> GameResult {
        GameResult::from_scores(self.score_a, self.score_b)
    }

    /// Actual score for competitor A (1 / 0.5 / 0)
    pub fn actual_score(&self) -> f64 {
        self.result().score()
    }

    pub fn involves(&self, competitor: &str) -> bool {
        self.competitor_a == competitor || self.competitor_b == competitor
    }

    /// Winner's id, `None` on a draw
    pub fn winner(&self) -> Option<&str> {
        match self.result() {
            GameResult::Win => Some(&self.competitor_a),
            GameResult::Loss => Some(&self.competitor_b),
            GameResult::Draw => None,
        }
    }
}

fn non_negative(score: i64, field: &str) -> Result<u32> {
    u32::try_from(score).map_err(|_| {
        RatingError::invalid_match(format!(
            "{field} must be a non-negative count, got {score}"
        ))
    })
}

/// Wire shape accepted from collaborators.
///
/// Either a classified `competition` tier or a raw `tournament` name may be
/// given; the tier wins when both are present.
#[derive(Deserialize)]
struct RawMatchRecord {
    date: NaiveDate,
    competitor_a: String,
    competitor_b: String,
    score_a: i64,
    score_b: i64,
    #[serde(default)]
    competition: Option<CompetitionTier>,
    #[serde(default)]
    tournament: Option<String>,
    #[serde(default)]
    neutral_site: bool,
}

impl TryFrom<RawMatchRecord> for MatchRecord {
    type Error = RatingError;

    fn try_from(raw: RawMatchRecord) -> Result<Self> {
        let competition = raw
            .competition
            .or_else(|| raw.tournament.as_deref().map(CompetitionTier::from_tag))
            .unwrap_or_default();
        MatchRecord::try_new(
            raw.date,
            raw.competitor_a,
            raw.competitor_b,
            raw.score_a,
            raw.score_b,
            competition,
            raw.neutral_site,
        )
    }
}

/// Stable sort by date; same-day matches keep their input order.
pub fn sort_chronologically(matches: &mut [MatchRecord]) {
    matches.sort_by_key(|m| m.date);
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;
