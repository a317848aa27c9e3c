//! Plain-text reports for group tables, bracket traces and odds

use crate::group_stage::GroupTable;
use crate::knockout::{KnockoutMatch, KnockoutResult};
use crate::monte_carlo::OddsTable;
use crate::orchestrator::TournamentRun;
use crate::outcome::Resolution;

impl GroupTable {
    pub fn generate_report(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!("{}\n", self.group));
        report.push_str(&format!(
            "{:<3} {:<22} {:>2} {:>2} {:>2} {:>2} {:>3} {:>3} {:>4} {:>3}\n",
            "#", "Team", "P", "W", "D", "L", "GF", "GA", "GD", "Pts"
        ));
        report.push_str(&"-".repeat(56));
        report.push('\n');

        for (i, row) in self.standings.iter().enumerate() {
            report.push_str(&format!(
                "{:<3} {:<22} {:>2} {:>2} {:>2} {:>2} {:>3} {:>3} {:>+4} {:>3}\n",
                i + 1,
                row.competitor,
                row.played,
                row.won,
                row.drawn,
                row.lost,
                row.goals_for,
                row.goals_against,
                row.goal_difference,
                row.points
            ));
        }
        for tie in &self.residual_ties {
            report.push_str(&format!("  level on all tie-breaks: {}\n", tie.join(", ")));
        }
        report
    }
}

fn describe_match(m: &KnockoutMatch) -> String {
    let Some(result) = &m.result else {
        return format!("{} advances on a walkover", m.winner);
    };
    let score = format!("{} {} {}", m.a, result.final_score, m.b);
    match result.resolution {
        Resolution::Regulation => score,
        Resolution::ExtraTime => format!("{score} (a.e.t.)"),
        Resolution::Penalties { kicks_a, kicks_b } => {
            format!("{score} ({kicks_a}-{kicks_b} pens)")
        }
    }
}

impl KnockoutResult {
    pub fn generate_report(&self) -> String {
        let mut report = String::new();
        for round in &self.rounds {
            report.push_str(&format!("{}\n", round.name));
            for m in &round.matches {
                report.push_str(&format!("  {}\n", describe_match(m)));
            }
        }
        if let Some(third) = &self.third_place {
            report.push_str(&format!("Third-place play-off\n  {}\n", describe_match(third)));
        }
        report.push_str(&format!("\nChampion: {}\n", self.champion));
        if let Some(runner_up) = &self.runner_up {
            report.push_str(&format!("Runner-up: {runner_up}\n"));
        }
        report
    }
}

impl TournamentRun {
    pub fn generate_report(&self) -> String {
        let mut report = String::new();
        report.push_str("=== Group stage ===\n\n");
        for table in &self.groups {
            report.push_str(&table.generate_report());
            report.push('\n');
        }

        report.push_str("Third-placed teams\n");
        let qualified_thirds = self
            .third_places
            .iter()
            .filter(|t| self.qualified(&t.row.competitor))
            .count();
        for (i, third) in self.third_places.iter().enumerate() {
            let mark = if i < qualified_thirds { "Q" } else { " " };
            report.push_str(&format!(
                "  {mark} {:<22} {:<10} {:>3} pts {:>+4} GD {:>3} GF\n",
                third.row.competitor,
                third.group,
                third.row.points,
                third.row.goal_difference,
                third.row.goals_for
            ));
        }

        report.push_str("\n=== Knockout stage ===\n\n");
        report.push_str(&self.knockout.generate_report());
        report
    }

    pub fn print_report(&self) {
        println!("{}", self.generate_report());
    }
}

impl OddsTable {
    /// Table of the `top` most likely winners, probabilities in percent
    pub fn generate_report(&self, top: usize) -> String {
        let mut report = String::new();
        report.push_str(&format!("Simulated tournaments: {}\n\n", self.runs()));
        report.push_str(&format!(
            "{:<22} {:>8} {:>8} {:>8} {:>8} {:>8}\n",
            "Team", "KO", "QF", "SF", "Final", "Title"
        ));
        report.push_str(&"-".repeat(67));
        report.push('\n');

        let runs = self.runs().max(1) as f64;
        let pct = |count: u64| 100.0 * count as f64 / runs;
        for (name, counts) in self.favourites().into_iter().take(top) {
            report.push_str(&format!(
                "{:<22} {:>7.1}% {:>7.1}% {:>7.1}% {:>7.1}% {:>7.1}%\n",
                name,
                pct(counts.knockout),
                pct(counts.quarter_final),
                pct(counts.semi_final),
                pct(counts.final_),
                pct(counts.champion)
            ));
        }
        report
    }
}

/// Ranked rating list as printed by the `ratings` command
pub fn leaderboard_report(rows: &[(String, f64, u32)], top: usize) -> String {
    let mut report = String::new();
    report.push_str(&format!("{:<5} {:<24} {:>8} {:>7}\n", "Rank", "Team", "Elo", "Games"));
    report.push_str(&"-".repeat(47));
    report.push('\n');
    for (i, (name, rating, games)) in rows.iter().take(top).enumerate() {
        report.push_str(&format!(
            "{:<5} {:<24} {:>8.1} {:>7}\n",
            i + 1,
            name,
            rating,
            games
        ));
    }
    report
}

#[cfg(test)]
#[path = "results_tests.rs"]
mod results_tests;
