//! Two-phase rating queries: frozen history plus a derived period replay

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::elo::{RatingEngine, RatingSnapshot};
use crate::error::Result;
use crate::types::{sort_chronologically, MatchRecord};

/// Analysis window expressed relative to the match data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodWindow {
    /// Everything from the first recorded year
    AllHistory,
    /// The last `n` years counted back from the latest match year; a span
    /// reaching past the calendar covers all history
    LastYears(u32),
    /// From a fixed calendar year
    Since(i32),
}

impl PeriodWindow {
    /// Cutoff year for `matches`, `None` when it depends on data that is absent
    pub fn cutoff_year(self, matches: &[MatchRecord]) -> Option<i32> {
        match self {
            PeriodWindow::Since(year) => Some(year),
            PeriodWindow::AllHistory => matches.iter().map(MatchRecord::year).min(),
            PeriodWindow::LastYears(n) => matches
                .iter()
                .map(MatchRecord::year)
                .max()
                .map(|latest| i32::try_from(n).map_or(i32::MIN, |n| latest.saturating_sub(n))),
        }
    }
}

/// Ratings split at the start of `cutoff_year`.
///
/// `history` holds the state after every match dated before the cutoff and is
/// never touched again. `period` started as a snapshot of `history` and then
/// absorbed the matches from the cutoff year onward; its timeline only covers
/// those matches.
#[derive(Debug, Clone)]
pub struct PeriodSplit {
    pub cutoff_year: i32,
    pub history: RatingEngine,
    pub period: RatingEngine,
}

impl RatingEngine {
    /// Replay `matches` in two phases around `cutoff_year`, starting from a
    /// snapshot of `self`.
    ///
    /// `self` is left unchanged, so one base engine can serve any number of
    /// windows. Input order does not matter: a private copy is sorted stably by
    /// date first. The final `period` ratings equal those of a single full
    /// replay over the same matches.
    pub fn rating_as_of(&self, matches: &[MatchRecord], cutoff_year: i32) -> Result<PeriodSplit> {
        for record in matches {
            record.validate()?;
        }
        let mut ordered = matches.to_vec();
        sort_chronologically(&mut ordered);
        let boundary = ordered.partition_point(|m| m.year() < cutoff_year);
        let (before, after) = ordered.split_at(boundary);

        let mut history = self.snapshot();
        history.replay(before)?;

        let mut period = history.snapshot();
        period.replay(after)?;

        debug!(
            cutoff_year,
            history_matches = before.len(),
            period_matches = after.len(),
            "period split computed"
        );

        Ok(PeriodSplit {
            cutoff_year,
            history,
            period,
        })
    }
}

impl PeriodSplit {
    /// Split for a relative window. With no data the cutoff falls before
    /// every possible year, which leaves both phases empty.
    pub fn for_window(
        base: &RatingEngine,
        matches: &[MatchRecord],
        window: PeriodWindow,
    ) -> Result<Self> {
        let cutoff_year = window.cutoff_year(matches).unwrap_or(i32::MIN);
        base.rating_as_of(matches, cutoff_year)
    }

    /// Snapshots for the matches inside the window only
    pub fn period_timeline(&self) -> &[RatingSnapshot] {
        self.period.timeline()
    }

    /// One competitor's rating path through the window
    pub fn trend(&self, competitor: &str) -> Vec<(NaiveDate, f64)> {
        self.period.trajectory(competitor)
    }

    /// Rating gained (or lost) inside the window
    pub fn change_over_period(&self, competitor: &str) -> f64 {
        self.period.rating_of(competitor) - self.history.rating_of(competitor)
    }

    /// Leaderboard at the end of the window
    pub fn ranking(&self) -> Vec<(String, f64, u32)> {
        self.period.leaderboard()
    }
}

#[cfg(test)]
#[path = "period_tests.rs"]
mod period_tests;
