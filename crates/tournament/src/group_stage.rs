//! Round-robin group stage: fixtures, standings and tie-breaks

use rand::RngCore;
use rating_core::RatingTable;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

use crate::error::{Result, SimulationError};
use crate::outcome::{MatchModel, Scoreline, Venue};

pub const POINTS_FOR_WIN: u32 = 3;
pub const POINTS_FOR_DRAW: u32 = 1;

/// Competitors drawn into one group, in draw order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub competitors: Vec<String>,
}

impl Group {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        competitors: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            competitors: competitors.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.competitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.competitors.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| SimulationError::InvalidGroup {
            group: self.name.clone(),
            reason,
        };
        if self.competitors.len() < 2 {
            return Err(invalid(format!(
                "needs at least 2 competitors, has {}",
                self.competitors.len()
            )));
        }
        let mut seen = HashSet::new();
        for competitor in &self.competitors {
            if competitor.trim().is_empty() {
                return Err(invalid("empty competitor id".to_string()));
            }
            if !seen.insert(competitor.as_str()) {
                return Err(invalid(format!("{competitor} appears twice")));
            }
        }
        Ok(())
    }

    /// Every unordered pairing exactly once, as draw-order indices `(i, j)` with `i < j`
    pub fn fixtures(&self) -> Vec<(usize, usize)> {
        let n = self.competitors.len();
        (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .collect()
    }
}

/// A group match with its scoreline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayedMatch {
    pub competitor_a: String,
    pub competitor_b: String,
    pub score: Scoreline,
}

/// One competitor's line in a group table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingRow {
    pub competitor: String,
    /// Position in the group's draw order; the last-resort tie-break key
    pub seed: usize,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i32,
    pub points: u32,
}

impl StandingRow {
    pub fn new(competitor: impl Into<String>, seed: usize) -> Self {
        Self {
            competitor: competitor.into(),
            seed,
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            goals_for: 0,
            goals_against: 0,
            goal_difference: 0,
            points: 0,
        }
    }

    pub fn record(&mut self, scored: u32, conceded: u32) {
        self.played += 1;
        self.goals_for += scored;
        self.goals_against += conceded;
        self.goal_difference = self.goals_for as i32 - self.goals_against as i32;
        match scored.cmp(&conceded) {
            Ordering::Greater => {
                self.won += 1;
                self.points += POINTS_FOR_WIN;
            }
            Ordering::Equal => {
                self.drawn += 1;
                self.points += POINTS_FOR_DRAW;
            }
            Ordering::Less => self.lost += 1,
        }
    }
}

/// Points desc, then goal difference desc, then goals scored desc.
///
/// `Equal` means the rows cannot be separated on the documented tiers.
pub fn compare_tally(a: &StandingRow, b: &StandingRow) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.goal_difference.cmp(&a.goal_difference))
        .then_with(|| b.goals_for.cmp(&a.goals_for))
}

/// Final table of one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTable {
    pub group: String,
    /// Rank 1 first
    pub standings: Vec<StandingRow>,
    pub matches: Vec<PlayedMatch>,
    /// Clusters still level after every tie-break tier, ordered by draw position
    pub residual_ties: Vec<Vec<String>>,
}

impl GroupTable {
    /// Build and rank a table from already played matches.
    ///
    /// With `head_to_head` set, rows level on points, goal difference and goals
    /// scored are separated by a mini-table of the matches among them before
    /// falling back to draw order.
    pub fn from_matches(
        group: &Group,
        matches: Vec<PlayedMatch>,
        head_to_head: bool,
    ) -> Result<Self> {
        group.validate()?;
        let mut rows: Vec<StandingRow> = group
            .competitors
            .iter()
            .enumerate()
            .map(|(seed, c)| StandingRow::new(c.clone(), seed))
            .collect();

        for m in &matches {
            if m.competitor_a == m.competitor_b {
                return Err(SimulationError::InvalidGroup {
                    group: group.name.clone(),
                    reason: format!("{} cannot play itself", m.competitor_a),
                });
            }
            let a = row_index(&rows, &m.competitor_a, &group.name)?;
            let b = row_index(&rows, &m.competitor_b, &group.name)?;
            rows[a].record(m.score.goals_a, m.score.goals_b);
            rows[b].record(m.score.goals_b, m.score.goals_a);
        }

        let (standings, residual_ties) = rank_rows(rows, &matches, head_to_head);
        Ok(Self {
            group: group.name.clone(),
            standings,
            matches,
            residual_ties,
        })
    }

    /// Row at 1-based `rank`
    pub fn position(&self, rank: usize) -> Option<&StandingRow> {
        rank.checked_sub(1).and_then(|i| self.standings.get(i))
    }

    pub fn winner(&self) -> Option<&StandingRow> {
        self.position(1)
    }

    pub fn runner_up(&self) -> Option<&StandingRow> {
        self.position(2)
    }

    pub fn third(&self) -> Option<&StandingRow> {
        self.position(3)
    }

    /// 1-based rank of a competitor
    pub fn rank_of(&self, competitor: &str) -> Option<usize> {
        self.standings
            .iter()
            .position(|r| r.competitor == competitor)
            .map(|i| i + 1)
    }

    pub fn total_points(&self) -> u32 {
        self.standings.iter().map(|r| r.points).sum()
    }

    pub fn draws(&self) -> usize {
        self.matches.iter().filter(|m| m.score.is_draw()).count()
    }
}

fn row_index(rows: &[StandingRow], competitor: &str, group: &str) -> Result<usize> {
    rows.iter()
        .position(|r| r.competitor == competitor)
        .ok_or_else(|| SimulationError::InvalidGroup {
            group: group.to_string(),
            reason: format!("result recorded for {competitor}, who is not in the group"),
        })
}

fn rank_rows(
    mut rows: Vec<StandingRow>,
    matches: &[PlayedMatch],
    head_to_head: bool,
) -> (Vec<StandingRow>, Vec<Vec<String>>) {
    rows.sort_by(|a, b| compare_tally(a, b).then_with(|| a.seed.cmp(&b.seed)));

    let mut ranked = Vec::with_capacity(rows.len());
    let mut residual = Vec::new();
    for cluster in split_level(rows, compare_tally) {
        if cluster.len() == 1 {
            ranked.extend(cluster);
        } else if head_to_head {
            let (ordered, ties) = break_head_to_head(cluster, matches);
            ranked.extend(ordered);
            residual.extend(ties);
        } else {
            residual.push(cluster.iter().map(|r| r.competitor.clone()).collect());
            ranked.extend(cluster);
        }
    }
    (ranked, residual)
}

/// Cut a sorted list into runs that compare `Equal`
fn split_level<F>(rows: Vec<StandingRow>, cmp: F) -> Vec<Vec<StandingRow>>
where
    F: Fn(&StandingRow, &StandingRow) -> Ordering,
{
    let mut clusters: Vec<Vec<StandingRow>> = Vec::new();
    for row in rows {
        match clusters.last_mut() {
            Some(last) if cmp(&last[0], &row) == Ordering::Equal => last.push(row),
            _ => clusters.push(vec![row]),
        }
    }
    clusters
}

fn break_head_to_head(
    cluster: Vec<StandingRow>,
    matches: &[PlayedMatch],
) -> (Vec<StandingRow>, Vec<Vec<String>>) {
    let members: HashSet<&str> = cluster.iter().map(|r| r.competitor.as_str()).collect();
    let mut mini: Vec<StandingRow> = cluster
        .iter()
        .map(|r| StandingRow::new(r.competitor.clone(), r.seed))
        .collect();
    for m in matches {
        let inside = members.contains(m.competitor_a.as_str())
            && members.contains(m.competitor_b.as_str());
        if !inside {
            continue;
        }
        for row in mini.iter_mut() {
            if row.competitor == m.competitor_a {
                row.record(m.score.goals_a, m.score.goals_b);
            } else if row.competitor == m.competitor_b {
                row.record(m.score.goals_b, m.score.goals_a);
            }
        }
    }
    mini.sort_by(|a, b| compare_tally(a, b).then_with(|| a.seed.cmp(&b.seed)));

    let mut ordered = Vec::with_capacity(cluster.len());
    let mut residual = Vec::new();
    for level in split_level(mini, compare_tally) {
        if level.len() > 1 {
            residual.push(level.iter().map(|r| r.competitor.clone()).collect());
        }
        for entry in level {
            if let Some(full) = cluster.iter().find(|r| r.competitor == entry.competitor) {
                ordered.push(full.clone());
            }
        }
    }
    (ordered, residual)
}

/// A third-placed row tagged with its group for cross-group ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThirdPlace {
    pub group: String,
    pub group_index: usize,
    pub row: StandingRow,
}

/// Rank the third-placed competitors of all groups.
///
/// Same tiers as inside a group (points, goal difference, goals scored); rows
/// still level keep group order. Groups without a third place are skipped.
pub fn rank_third_places(tables: &[GroupTable]) -> Vec<ThirdPlace> {
    let mut thirds: Vec<ThirdPlace> = tables
        .iter()
        .enumerate()
        .filter_map(|(group_index, table)| {
            table.third().map(|row| ThirdPlace {
                group: table.group.clone(),
                group_index,
                row: row.clone(),
            })
        })
        .collect();
    thirds.sort_by(|a, b| {
        compare_tally(&a.row, &b.row).then_with(|| a.group_index.cmp(&b.group_index))
    });
    thirds
}

/// Plays a group as a single round robin through a [`MatchModel`]
pub struct GroupStageSimulator<'a, M: MatchModel + ?Sized> {
    model: &'a M,
    venue: &'a Venue,
    head_to_head: bool,
}

impl<'a, M: MatchModel + ?Sized> GroupStageSimulator<'a, M> {
    pub fn new(model: &'a M, venue: &'a Venue) -> Self {
        Self {
            model,
            venue,
            head_to_head: false,
        }
    }

    pub fn with_head_to_head(mut self, enabled: bool) -> Self {
        self.head_to_head = enabled;
        self
    }

    /// Play all `N(N-1)/2` pairings once (draws allowed) and rank the table
    pub fn simulate(
        &self,
        group: &Group,
        ratings: &RatingTable,
        rng: &mut dyn RngCore,
    ) -> Result<GroupTable> {
        group.validate()?;
        ratings.validate()?;

        let mut matches = Vec::with_capacity(group.len() * (group.len() - 1) / 2);
        for (i, j) in group.fixtures() {
            let a = &group.competitors[i];
            let b = &group.competitors[j];
            let fixture = self.venue.fixture(a, b, ratings);
            let score = self.model.play(&fixture, rng);
            matches.push(PlayedMatch {
                competitor_a: a.clone(),
                competitor_b: b.clone(),
                score,
            });
        }

        let table = GroupTable::from_matches(group, matches, self.head_to_head)?;
        debug!(
            group = %table.group,
            winner = table.winner().map(|r| r.competitor.as_str()).unwrap_or_default(),
            residual_ties = table.residual_ties.len(),
            "group stage table computed"
        );
        Ok(table)
    }
}

#[cfg(test)]
#[path = "group_stage_tests.rs"]
mod group_stage_tests;
