//! Single-elimination bracket and its simulator
//!
//! A [`Bracket`] stores every round as its own list of pairings plus one
//! winner slot per pairing. A round can only be advanced once every slot is
//! filled, and the next round is built by pairing winners 0-1, 2-3, ...
//! The bracket never decides who plays whom in the first round; that order
//! is an input.

use rand::RngCore;
use rating_core::RatingTable;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::error::{Result, SimulationError};
use crate::outcome::{DecisiveResult, MatchModel, Side, Venue};

/// One side of a first-round pairing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    Competitor(String),
    /// Empty slot; the opponent advances without playing
    Bye,
}

impl Slot {
    pub fn competitor(name: impl Into<String>) -> Self {
        Slot::Competitor(name.into())
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Slot::Competitor(name) => Some(name.as_str()),
            Slot::Bye => None,
        }
    }

    pub fn is_bye(&self) -> bool {
        matches!(self, Slot::Bye)
    }
}

impl From<&str> for Slot {
    fn from(name: &str) -> Self {
        Slot::competitor(name)
    }
}

impl From<String> for Slot {
    fn from(name: String) -> Self {
        Slot::Competitor(name)
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::Competitor(name) => write!(f, "{name}"),
            Slot::Bye => write!(f, "(bye)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pairing {
    pub a: Slot,
    pub b: Slot,
}

impl Pairing {
    pub fn new(a: impl Into<Slot>, b: impl Into<Slot>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
        }
    }

    /// The competitor advancing without a match, if the other side is a bye
    pub fn walkover(&self) -> Option<&str> {
        match (&self.a, &self.b) {
            (Slot::Competitor(name), Slot::Bye) | (Slot::Bye, Slot::Competitor(name)) => {
                Some(name.as_str())
            }
            _ => None,
        }
    }

    pub fn contains(&self, competitor: &str) -> bool {
        self.a.name() == Some(competitor) || self.b.name() == Some(competitor)
    }
}

/// Round-indexed arena of pairings and their winners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    rounds: Vec<Vec<Pairing>>,
    winners: Vec<Vec<Option<String>>>,
}

impl Bracket {
    /// Start a bracket from its first-round pairings.
    ///
    /// The pairing count must be a power of two so that halving always ends
    /// in a single final. A competitor may appear only once and two byes may
    /// never meet.
    pub fn new(first_round: Vec<Pairing>) -> Result<Self> {
        if first_round.is_empty() {
            return Err(SimulationError::InvalidBracket(
                "a bracket needs at least one pairing".to_string(),
            ));
        }
        if !first_round.len().is_power_of_two() {
            return Err(SimulationError::InvalidBracket(format!(
                "{} first-round pairings do not halve down to a final",
                first_round.len()
            )));
        }

        let mut seen = HashSet::new();
        for (index, pairing) in first_round.iter().enumerate() {
            if pairing.a.is_bye() && pairing.b.is_bye() {
                return Err(SimulationError::InvalidBracket(format!(
                    "pairing {index} is bye against bye"
                )));
            }
            for name in [pairing.a.name(), pairing.b.name()].into_iter().flatten() {
                if name.trim().is_empty() {
                    return Err(SimulationError::InvalidBracket(format!(
                        "pairing {index} has an empty competitor id"
                    )));
                }
                if !seen.insert(name) {
                    return Err(SimulationError::InvalidBracket(format!(
                        "{name} is drawn into the bracket twice"
                    )));
                }
            }
        }

        let slots = vec![None; first_round.len()];
        Ok(Self {
            rounds: vec![first_round],
            winners: vec![slots],
        })
    }

    /// Pair a seeded list sequentially: 0 v 1, 2 v 3, ...
    pub fn from_seeds(seeds: Vec<Slot>) -> Result<Self> {
        if seeds.len() % 2 != 0 {
            return Err(SimulationError::InvalidBracket(format!(
                "odd number of bracket entrants: {}",
                seeds.len()
            )));
        }
        let mut seeds = seeds.into_iter();
        let mut pairings = Vec::with_capacity(seeds.len() / 2);
        while let (Some(a), Some(b)) = (seeds.next(), seeds.next()) {
            pairings.push(Pairing { a, b });
        }
        Self::new(pairings)
    }

    /// Rounds from the first one to the final, `log2(first-round pairings) + 1`
    pub fn total_rounds(&self) -> usize {
        self.rounds[0].len().trailing_zeros() as usize + 1
    }

    /// Index of the round currently being played
    pub fn current_round(&self) -> usize {
        self.rounds.len() - 1
    }

    pub fn round(&self, round: usize) -> Option<&[Pairing]> {
        self.rounds.get(round).map(Vec::as_slice)
    }

    pub fn winners(&self, round: usize) -> Option<&[Option<String>]> {
        self.winners.get(round).map(Vec::as_slice)
    }

    /// Record the winner of pairing `index` in the current round
    pub fn record_winner(&mut self, index: usize, winner: &str) -> Result<()> {
        let round = self.current_round();
        let pairing = self.rounds[round].get(index).ok_or_else(|| {
            SimulationError::InvalidBracket(format!(
                "round {round} has no pairing {index}"
            ))
        })?;
        if !pairing.contains(winner) {
            return Err(SimulationError::InvalidBracket(format!(
                "{winner} is not part of pairing {index} in round {round}"
            )));
        }
        let slot = &mut self.winners[round][index];
        if let Some(recorded) = slot {
            return Err(SimulationError::InvalidBracket(format!(
                "pairing {index} in round {round} already went to {recorded}"
            )));
        }
        *slot = Some(winner.to_string());
        Ok(())
    }

    /// No winner recorded yet, still in the first round
    pub fn is_unplayed(&self) -> bool {
        self.rounds.len() == 1 && self.winners[0].iter().all(Option::is_none)
    }

    pub fn round_complete(&self) -> bool {
        self.winners[self.current_round()].iter().all(Option::is_some)
    }

    /// Build the next round from the current winners.
    ///
    /// Returns `false` once the final has been decided.
    pub fn advance(&mut self) -> Result<bool> {
        let round = self.current_round();
        let winners: Vec<String> = self.winners[round].iter().flatten().cloned().collect();
        if winners.len() != self.rounds[round].len() {
            return Err(SimulationError::InvalidBracket(format!(
                "round {round} still has undecided pairings"
            )));
        }
        if winners.len() == 1 {
            return Ok(false);
        }

        let mut winners = winners.into_iter();
        let mut next = Vec::with_capacity(winners.len() / 2);
        while let (Some(a), Some(b)) = (winners.next(), winners.next()) {
            next.push(Pairing::new(a, b));
        }
        self.winners.push(vec![None; next.len()]);
        self.rounds.push(next);
        Ok(true)
    }

    pub fn is_complete(&self) -> bool {
        self.champion().is_some()
    }

    pub fn champion(&self) -> Option<&str> {
        let last = self.winners.last()?;
        match last.as_slice() {
            [Some(champion)] => Some(champion.as_str()),
            _ => None,
        }
    }
}

/// Display name of a round with `pairings` matches
pub fn round_name(pairings: usize) -> String {
    match pairings {
        1 => "Final".to_string(),
        2 => "Semi-finals".to_string(),
        4 => "Quarter-finals".to_string(),
        n => format!("Round of {}", n * 2),
    }
}

/// One played (or walked-over) knockout pairing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnockoutMatch {
    pub a: Slot,
    pub b: Slot,
    /// `None` for a walkover
    pub result: Option<DecisiveResult>,
    pub winner: String,
    pub loser: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTrace {
    pub name: String,
    pub matches: Vec<KnockoutMatch>,
}

/// Full bracket trace of one knockout stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnockoutResult {
    pub rounds: Vec<RoundTrace>,
    pub champion: String,
    /// `None` only when the final was a walkover
    pub runner_up: Option<String>,
    pub third_place: Option<KnockoutMatch>,
}

impl KnockoutResult {
    pub fn final_match(&self) -> Option<&KnockoutMatch> {
        self.rounds.last().and_then(|r| r.matches.first())
    }

    /// Index of the last round `competitor` took part in
    pub fn last_round_of(&self, competitor: &str) -> Option<usize> {
        self.rounds.iter().rposition(|round| {
            round
                .matches
                .iter()
                .any(|m| m.a.name() == Some(competitor) || m.b.name() == Some(competitor))
        })
    }

    pub fn third_place_winner(&self) -> Option<&str> {
        self.third_place.as_ref().map(|m| m.winner.as_str())
    }
}

/// Plays a [`Bracket`] to its champion with decisive matches only
pub struct KnockoutSimulator<'a, M: MatchModel + ?Sized> {
    model: &'a M,
    venue: &'a Venue,
    third_place_playoff: bool,
}

impl<'a, M: MatchModel + ?Sized> KnockoutSimulator<'a, M> {
    pub fn new(model: &'a M, venue: &'a Venue) -> Self {
        Self {
            model,
            venue,
            third_place_playoff: false,
        }
    }

    pub fn with_third_place_playoff(mut self, enabled: bool) -> Self {
        self.third_place_playoff = enabled;
        self
    }

    /// Play `bracket` from its first round to the champion.
    ///
    /// The bracket must be unplayed so the trace covers every round; ratings
    /// must be finite.
    pub fn run(
        &self,
        mut bracket: Bracket,
        ratings: &RatingTable,
        rng: &mut dyn RngCore,
    ) -> Result<KnockoutResult> {
        if !bracket.is_unplayed() {
            return Err(SimulationError::InvalidBracket(
                "knockout simulation needs a bracket with no recorded results".to_string(),
            ));
        }
        ratings.validate()?;

        let mut rounds = Vec::with_capacity(bracket.total_rounds());
        loop {
            let round = bracket.current_round();
            let pairings = bracket.round(round).map(<[Pairing]>::to_vec).unwrap_or_default();
            let mut matches = Vec::with_capacity(pairings.len());
            for (index, pairing) in pairings.into_iter().enumerate() {
                let played = self.play(pairing, ratings, rng)?;
                bracket.record_winner(index, &played.winner)?;
                matches.push(played);
            }

            let name = round_name(matches.len());
            debug!(round = %name, matches = matches.len(), "knockout round played");
            rounds.push(RoundTrace { name, matches });

            if !bracket.advance()? {
                break;
            }
        }

        let champion = bracket
            .champion()
            .ok_or_else(|| SimulationError::InvalidBracket("no champion decided".to_string()))?
            .to_string();
        let runner_up = rounds
            .last()
            .and_then(|r| r.matches.first())
            .and_then(|m| m.loser.clone());
        let third_place = if self.third_place_playoff {
            self.play_third_place(&rounds, ratings, rng)?
        } else {
            None
        };

        debug!(%champion, rounds = rounds.len(), "knockout stage complete");
        Ok(KnockoutResult {
            rounds,
            champion,
            runner_up,
            third_place,
        })
    }

    fn play(
        &self,
        pairing: Pairing,
        ratings: &RatingTable,
        rng: &mut dyn RngCore,
    ) -> Result<KnockoutMatch> {
        if let Some(winner) = pairing.walkover() {
            let winner = winner.to_string();
            return Ok(KnockoutMatch {
                a: pairing.a,
                b: pairing.b,
                result: None,
                winner,
                loser: None,
            });
        }
        let (Slot::Competitor(a), Slot::Competitor(b)) = (&pairing.a, &pairing.b) else {
            return Err(SimulationError::InvalidBracket(
                "bye against bye cannot be played".to_string(),
            ));
        };

        let fixture = self.venue.fixture(a, b, ratings);
        let result = self.model.play_decisive(&fixture, rng);
        let (winner, loser) = match result.winner {
            Side::A => (a.clone(), b.clone()),
            Side::B => (b.clone(), a.clone()),
        };
        Ok(KnockoutMatch {
            a: pairing.a,
            b: pairing.b,
            result: Some(result),
            winner,
            loser: Some(loser),
        })
    }

    /// Semi-final losers meet once; skipped when either semi was a walkover
    fn play_third_place(
        &self,
        rounds: &[RoundTrace],
        ratings: &RatingTable,
        rng: &mut dyn RngCore,
    ) -> Result<Option<KnockoutMatch>> {
        let Some(semis) = rounds.len().checked_sub(2).map(|i| &rounds[i]) else {
            return Ok(None);
        };
        match semis.matches.as_slice() {
            [first, second] => match (&first.loser, &second.loser) {
                (Some(a), Some(b)) => {
                    let pairing = Pairing::new(a.as_str(), b.as_str());
                    self.play(pairing, ratings, rng).map(Some)
                }
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
#[path = "knockout_tests.rs"]
mod knockout_tests;
