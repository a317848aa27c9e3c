//! Repeated tournament runs aggregated into per-competitor odds
//!
//! Run `i` is seeded with `seed + i`, so a batch is reproducible and the
//! totals do not depend on how rayon splits the work.

use rayon::prelude::*;
use rating_core::RatingTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::error::{Result, SimulationError};
use crate::orchestrator::{Stage, TournamentOrchestrator, TournamentRun};
use crate::outcome::MatchModel;

pub const DEFAULT_RUNS: u32 = 10_000;
pub const DEFAULT_SEED: u64 = 2025;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    pub runs: u32,
    pub seed: u64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            runs: DEFAULT_RUNS,
            seed: DEFAULT_SEED,
        }
    }
}

impl MonteCarloConfig {
    pub fn validate(&self) -> Result<()> {
        if self.runs == 0 {
            return Err(SimulationError::InvalidConfig(
                "monte carlo needs at least one run".to_string(),
            ));
        }
        Ok(())
    }
}

/// How often one competitor reached each stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    pub appearances: u64,
    pub knockout: u64,
    pub quarter_final: u64,
    pub semi_final: u64,
    pub final_: u64,
    pub champion: u64,
}

impl StageCounts {
    /// Count `stage` and every stage below it
    pub fn record(&mut self, stage: Stage) {
        self.appearances += 1;
        if stage > Stage::GroupStage {
            self.knockout += 1;
        }
        if stage >= Stage::QuarterFinal {
            self.quarter_final += 1;
        }
        if stage >= Stage::SemiFinal {
            self.semi_final += 1;
        }
        if stage >= Stage::Final {
            self.final_ += 1;
        }
        if stage == Stage::Champion {
            self.champion += 1;
        }
    }

    /// Runs in which `stage` was reached or passed
    pub fn reached(&self, stage: Stage) -> u64 {
        if stage >= Stage::Champion {
            self.champion
        } else if stage >= Stage::Final {
            self.final_
        } else if stage >= Stage::SemiFinal {
            self.semi_final
        } else if stage >= Stage::QuarterFinal {
            self.quarter_final
        } else if stage > Stage::GroupStage {
            self.knockout
        } else {
            self.appearances
        }
    }

    fn merge(&mut self, other: &StageCounts) {
        self.appearances += other.appearances;
        self.knockout += other.knockout;
        self.quarter_final += other.quarter_final;
        self.semi_final += other.semi_final;
        self.final_ += other.final_;
        self.champion += other.champion;
    }
}

/// Stage counts for every competitor over a batch of runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OddsTable {
    runs: u64,
    counts: BTreeMap<String, StageCounts>,
}

impl OddsTable {
    pub fn record_run(&mut self, run: &TournamentRun) {
        self.runs += 1;
        for (competitor, stage) in run.final_standings() {
            self.counts.entry(competitor).or_default().record(stage);
        }
    }

    pub fn merge(mut self, other: OddsTable) -> Self {
        self.runs += other.runs;
        for (competitor, counts) in &other.counts {
            self.counts
                .entry(competitor.clone())
                .or_default()
                .merge(counts);
        }
        self
    }

    pub fn runs(&self) -> u64 {
        self.runs
    }

    pub fn counts(&self, competitor: &str) -> Option<&StageCounts> {
        self.counts.get(competitor)
    }

    /// Share of runs in which `competitor` reached `stage` or went further
    pub fn probability(&self, competitor: &str, stage: Stage) -> f64 {
        if self.runs == 0 {
            return 0.0;
        }
        let hits = self.counts(competitor).map_or(0, |c| c.reached(stage));
        hits as f64 / self.runs as f64
    }

    pub fn title_probability(&self, competitor: &str) -> f64 {
        self.probability(competitor, Stage::Champion)
    }

    /// Competitors ordered by titles won, then finals reached, then name
    pub fn favourites(&self) -> Vec<(&str, &StageCounts)> {
        let mut ranked: Vec<(&str, &StageCounts)> = self
            .counts
            .iter()
            .map(|(name, counts)| (name.as_str(), counts))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.champion
                .cmp(&a.1.champion)
                .then_with(|| b.1.final_.cmp(&a.1.final_))
                .then_with(|| a.0.cmp(b.0))
        });
        ranked
    }
}

/// Parallel batch of independent tournament runs
#[derive(Debug, Clone, Default)]
pub struct MonteCarlo {
    config: MonteCarloConfig,
}

impl MonteCarlo {
    pub fn new(config: MonteCarloConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    /// Play `runs` tournaments and tally how far each competitor got.
    ///
    /// A failing run aborts the batch and its error is returned.
    pub fn simulate_many<M>(
        &self,
        orchestrator: &TournamentOrchestrator<M>,
        ratings: &RatingTable,
    ) -> Result<OddsTable>
    where
        M: MatchModel + Sync,
    {
        let seed = self.config.seed;
        let odds = (0..u64::from(self.config.runs))
            .into_par_iter()
            .try_fold(OddsTable::default, |mut table, i| {
                let run = orchestrator.run(ratings, seed.wrapping_add(i))?;
                table.record_run(&run);
                Ok::<_, SimulationError>(table)
            })
            .try_reduce(OddsTable::default, |a, b| Ok(a.merge(b)))?;

        info!(runs = odds.runs(), seed, "monte carlo batch complete");
        Ok(odds)
    }
}

#[cfg(test)]
#[path = "monte_carlo_tests.rs"]
mod monte_carlo_tests;
