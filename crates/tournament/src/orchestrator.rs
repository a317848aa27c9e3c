//! Whole-tournament runs: group stage, best thirds, seeding and knockout

use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rating_core::{RatingTable, DEFAULT_HOME_ADVANTAGE};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::error::{Result, SimulationError};
use crate::group_stage::{rank_third_places, Group, GroupStageSimulator, GroupTable, ThirdPlace};
use crate::knockout::{Bracket, KnockoutResult, KnockoutSimulator, Slot};
use crate::outcome::{MatchModel, OutcomeModel, Venue};

/// How qualifiers are placed into the first knockout round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedingPolicy {
    /// Uniform shuffle of all qualifiers
    #[default]
    Random,
    /// Shuffle, then swap entrants so group-mates do not meet in the first
    /// knockout round where possible
    AvoidSameGroup,
}

/// Competition format: the draw plus the qualification rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentFormat {
    /// Number of third-placed teams that also reach the knockout stage
    pub best_thirds: usize,
    /// Host nation, which gets the home advantage in its own matches.
    /// Absent from a `[format]` table means no host.
    #[serde(default)]
    pub host: Option<String>,
    pub seeding: SeedingPolicy,
    pub third_place_playoff: bool,
    pub head_to_head: bool,
    /// Draw order inside each group is the last-resort tie-break
    pub groups: Vec<Group>,
}

impl Default for TournamentFormat {
    fn default() -> Self {
        Self::afcon_2025()
    }
}

impl TournamentFormat {
    /// Africa Cup of Nations 2025 in Morocco: six groups of four, the four
    /// best thirds join winners and runners-up in a round of 16.
    pub fn afcon_2025() -> Self {
        let groups = vec![
            Group::new("Group A", ["Morocco", "Mali", "Zambia", "Comoros"]),
            Group::new("Group B", ["Egypt", "Angola", "South Africa", "Zimbabwe"]),
            Group::new("Group C", ["Tunisia", "Nigeria", "Uganda", "Tanzania"]),
            Group::new("Group D", ["Senegal", "DR Congo", "Botswana", "Benin"]),
            Group::new(
                "Group E",
                ["Algeria", "Burkina Faso", "Equatorial Guinea", "Sudan"],
            ),
            Group::new("Group F", ["Ivory Coast", "Cameroon", "Gabon", "Mozambique"]),
        ];
        Self {
            groups,
            best_thirds: 4,
            host: Some("Morocco".to_string()),
            seeding: SeedingPolicy::Random,
            third_place_playoff: true,
            head_to_head: false,
        }
    }

    /// Plain format with no host, random seeding and no extras
    pub fn from_groups(groups: Vec<Group>, best_thirds: usize) -> Self {
        Self {
            groups,
            best_thirds,
            host: None,
            seeding: SeedingPolicy::Random,
            third_place_playoff: false,
            head_to_head: false,
        }
    }

    /// Winners and runners-up of every group plus the best thirds
    pub fn qualifier_count(&self) -> usize {
        2 * self.groups.len() + self.best_thirds
    }

    pub fn competitors(&self) -> impl Iterator<Item = &str> {
        self.groups
            .iter()
            .flat_map(|g| g.competitors.iter().map(String::as_str))
    }

    pub fn validate(&self) -> Result<()> {
        if self.groups.is_empty() {
            return Err(SimulationError::InvalidFormat(
                "at least one group is required".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for group in &self.groups {
            group.validate()?;
            for competitor in &group.competitors {
                if !seen.insert(competitor.as_str()) {
                    return Err(SimulationError::InvalidFormat(format!(
                        "{competitor} is drawn into more than one group"
                    )));
                }
            }
        }

        let with_third = self.groups.iter().filter(|g| g.len() >= 3).count();
        if self.best_thirds > with_third {
            return Err(SimulationError::InvalidFormat(format!(
                "{} best thirds requested but only {with_third} groups have a third place",
                self.best_thirds
            )));
        }

        let qualifiers = self.qualifier_count();
        if !qualifiers.is_power_of_two() {
            return Err(SimulationError::InvalidFormat(format!(
                "{} groups and {} best thirds give {qualifiers} qualifiers, not a power of two",
                self.groups.len(),
                self.best_thirds
            )));
        }
        Ok(())
    }
}

/// A competitor that reached the knockout stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualifier {
    pub competitor: String,
    pub group: String,
    pub group_index: usize,
    /// Final position in the group (1, 2 or 3)
    pub group_rank: usize,
}

/// Furthest point a competitor reached in one run.
///
/// Ordered by progress: `GroupStage` is the lowest, `Champion` the highest.
/// A `RoundOf(n)` with `n` of 8 or fewer is the same stage as its named
/// counterpart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Stage {
    GroupStage,
    RoundOf(usize),
    QuarterFinal,
    SemiFinal,
    Final,
    Champion,
}

impl Stage {
    /// Stage of a knockout round with `pairings` matches
    pub fn for_round(pairings: usize) -> Self {
        match pairings {
            1 => Stage::Final,
            2 => Stage::SemiFinal,
            4 => Stage::QuarterFinal,
            n => Stage::RoundOf(n * 2),
        }
    }

    /// Competitors still in contention at this stage
    pub fn remaining(self) -> usize {
        match self {
            Stage::GroupStage => usize::MAX,
            Stage::RoundOf(n) => n,
            Stage::QuarterFinal => 8,
            Stage::SemiFinal => 4,
            Stage::Final => 2,
            Stage::Champion => 1,
        }
    }

    pub fn label(self) -> String {
        match self {
            Stage::GroupStage => "group stage".to_string(),
            Stage::RoundOf(n) => format!("round of {n}"),
            Stage::QuarterFinal => "quarter-final".to_string(),
            Stage::SemiFinal => "semi-final".to_string(),
            Stage::Final => "final".to_string(),
            Stage::Champion => "champion".to_string(),
        }
    }
}

impl PartialEq for Stage {
    fn eq(&self, other: &Self) -> bool {
        self.remaining() == other.remaining()
    }
}

impl Eq for Stage {}

impl PartialOrd for Stage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Stage {
    fn cmp(&self, other: &Self) -> Ordering {
        other.remaining().cmp(&self.remaining())
    }
}

/// Everything one simulated tournament produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentRun {
    /// Group tables in format order
    pub groups: Vec<GroupTable>,
    /// All third-placed rows, best first
    pub third_places: Vec<ThirdPlace>,
    /// Knockout entrants in bracket order
    pub qualifiers: Vec<Qualifier>,
    pub knockout: KnockoutResult,
}

impl TournamentRun {
    pub fn champion(&self) -> &str {
        &self.knockout.champion
    }

    pub fn runner_up(&self) -> Option<&str> {
        self.knockout.runner_up.as_deref()
    }

    pub fn third_place(&self) -> Option<&str> {
        self.knockout.third_place_winner()
    }

    pub fn qualified(&self, competitor: &str) -> bool {
        self.qualifiers.iter().any(|q| q.competitor == competitor)
    }

    /// Furthest stage reached; unknown competitors read as `GroupStage`
    pub fn stage_reached(&self, competitor: &str) -> Stage {
        if self.knockout.champion == competitor {
            return Stage::Champion;
        }
        self.knockout
            .last_round_of(competitor)
            .map(|round| Stage::for_round(self.knockout.rounds[round].matches.len()))
            .unwrap_or(Stage::GroupStage)
    }

    /// Every competitor with its stage, furthest first, then by group order
    pub fn final_standings(&self) -> Vec<(String, Stage)> {
        let mut standings: Vec<(String, Stage)> = self
            .groups
            .iter()
            .flat_map(|table| table.standings.iter())
            .map(|row| (row.competitor.clone(), self.stage_reached(&row.competitor)))
            .collect();
        standings.sort_by(|a, b| b.1.cmp(&a.1));
        standings
    }
}

/// Runs a complete tournament for a rating table and a random source
#[derive(Debug, Clone)]
pub struct TournamentOrchestrator<M: MatchModel = OutcomeModel> {
    model: M,
    format: TournamentFormat,
    home_advantage: f64,
}

impl Default for TournamentOrchestrator<OutcomeModel> {
    fn default() -> Self {
        Self {
            model: OutcomeModel::default(),
            format: TournamentFormat::default(),
            home_advantage: DEFAULT_HOME_ADVANTAGE,
        }
    }
}

impl<M: MatchModel> TournamentOrchestrator<M> {
    pub fn new(model: M, format: TournamentFormat, home_advantage: f64) -> Result<Self> {
        format.validate()?;
        if !(home_advantage.is_finite() && home_advantage >= 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "home advantage must be a non-negative number, got {home_advantage}"
            )));
        }
        Ok(Self {
            model,
            format,
            home_advantage,
        })
    }

    pub fn format(&self) -> &TournamentFormat {
        &self.format
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn venue(&self) -> Venue {
        match &self.format.host {
            Some(host) => Venue::hosted_by(host.clone(), self.home_advantage),
            None => Venue::neutral(),
        }
    }

    /// One run seeded from `seed`; the same seed always gives the same run
    pub fn run(&self, ratings: &RatingTable, seed: u64) -> Result<TournamentRun> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.run_with(ratings, &mut rng)
    }

    pub fn run_with(&self, ratings: &RatingTable, rng: &mut dyn RngCore) -> Result<TournamentRun> {
        ratings.validate()?;
        let venue = self.venue();

        let group_stage = GroupStageSimulator::new(&self.model, &venue)
            .with_head_to_head(self.format.head_to_head);
        let mut groups = Vec::with_capacity(self.format.groups.len());
        for group in &self.format.groups {
            groups.push(group_stage.simulate(group, ratings, rng)?);
        }

        let mut qualifiers = Vec::with_capacity(self.format.qualifier_count());
        for (group_index, table) in groups.iter().enumerate() {
            for rank in 1..=2 {
                if let Some(row) = table.position(rank) {
                    qualifiers.push(Qualifier {
                        competitor: row.competitor.clone(),
                        group: table.group.clone(),
                        group_index,
                        group_rank: rank,
                    });
                }
            }
        }
        let third_places = rank_third_places(&groups);
        qualifiers.extend(third_places.iter().take(self.format.best_thirds).map(|t| {
            Qualifier {
                competitor: t.row.competitor.clone(),
                group: t.group.clone(),
                group_index: t.group_index,
                group_rank: 3,
            }
        }));

        if qualifiers.len() != self.format.qualifier_count() {
            return Err(SimulationError::InvalidBracket(format!(
                "expected {} qualifiers, group stage produced {}",
                self.format.qualifier_count(),
                qualifiers.len()
            )));
        }

        self.seed_bracket(&mut qualifiers, rng);
        let bracket = Bracket::from_seeds(
            qualifiers
                .iter()
                .map(|q| Slot::competitor(q.competitor.as_str()))
                .collect(),
        )?;
        debug!(
            qualifiers = qualifiers.len(),
            rounds = bracket.total_rounds(),
            "knockout bracket seeded"
        );

        let knockout = KnockoutSimulator::new(&self.model, &venue)
            .with_third_place_playoff(self.format.third_place_playoff)
            .run(bracket, ratings, rng)?;

        Ok(TournamentRun {
            groups,
            third_places,
            qualifiers,
            knockout,
        })
    }

    fn seed_bracket(&self, qualifiers: &mut [Qualifier], rng: &mut dyn RngCore) {
        qualifiers.shuffle(rng);
        if self.format.seeding == SeedingPolicy::AvoidSameGroup {
            let clashes = avoid_same_group(qualifiers);
            if clashes > 0 {
                warn!(clashes, "could not keep every group apart in the first knockout round");
            }
        }
    }
}

/// Swap entrants so that no first-round pairing is a group rematch.
///
/// Greedy and best-effort: a swap is only made when it clears the clash
/// without creating one in the other pairing. Returns the clashes left.
fn avoid_same_group(order: &mut [Qualifier]) -> usize {
    let n = order.len();
    for p in (0..n.saturating_sub(1)).step_by(2) {
        let group = order[p].group_index;
        if order[p + 1].group_index != group {
            continue;
        }
        let candidate = (0..n).find(|&j| {
            j / 2 != p / 2
                && (j ^ 1) < n
                && order[j].group_index != group
                && order[j ^ 1].group_index != group
        });
        if let Some(j) = candidate {
            order.swap(p + 1, j);
        }
    }
    order
        .chunks(2)
        .filter(|pair| pair.len() == 2 && pair[0].group_index == pair[1].group_index)
        .count()
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod orchestrator_tests;
