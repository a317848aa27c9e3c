use super::*;
use crate::outcome::{Fixture, OutcomeModel, Resolution, Scoreline};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Higher rating wins 1-0; equal ratings draw and go to the decider
struct Favourite;

impl MatchModel for Favourite {
    fn play(&self, fixture: &Fixture<'_>, _rng: &mut dyn RngCore) -> Scoreline {
        let a = fixture.rating_a + fixture.home_bonus;
        if a > fixture.rating_b {
            Scoreline::new(1, 0)
        } else if a < fixture.rating_b {
            Scoreline::new(0, 1)
        } else {
            Scoreline::new(0, 0)
        }
    }
}

fn eight_seeds() -> Vec<Slot> {
    ["S1", "S2", "S3", "S4", "S5", "S6", "S7", "S8"]
        .into_iter()
        .map(Slot::from)
        .collect()
}

/// S1 strongest, S8 weakest
fn seeded_ratings() -> RatingTable {
    RatingTable::from_pairs(
        1500.0,
        (1..=8).map(|i| (format!("S{i}"), 1900.0 - 50.0 * i as f64)),
    )
}

#[test]
fn test_bracket_validation() {
    assert!(matches!(
        Bracket::new(Vec::new()),
        Err(SimulationError::InvalidBracket(_))
    ));
    let three = vec![
        Pairing::new("A", "B"),
        Pairing::new("C", "D"),
        Pairing::new("E", "F"),
    ];
    assert!(Bracket::new(three).is_err());
    assert!(Bracket::new(vec![Pairing::new(Slot::Bye, Slot::Bye)]).is_err());
    assert!(Bracket::new(vec![Pairing::new("A", "B"), Pairing::new("B", "C")]).is_err());
    assert!(Bracket::new(vec![Pairing::new("A", "")]).is_err());
}

#[test]
fn test_odd_seed_list_rejected() {
    let seeds: Vec<Slot> = ["A", "B", "C"].into_iter().map(Slot::from).collect();
    assert!(matches!(
        Bracket::from_seeds(seeds),
        Err(SimulationError::InvalidBracket(_))
    ));
}

#[test]
fn test_sequential_pairing() {
    let bracket = Bracket::from_seeds(eight_seeds()).unwrap();
    assert_eq!(bracket.total_rounds(), 3);
    assert_eq!(bracket.current_round(), 0);
    let first = bracket.round(0).unwrap();
    assert_eq!(first.len(), 4);
    assert_eq!(first[0], Pairing::new("S1", "S2"));
    assert_eq!(first[3], Pairing::new("S7", "S8"));
    assert!(bracket.round(1).is_none());
}

#[test]
fn test_manual_advancement() {
    let mut bracket = Bracket::from_seeds(
        ["A", "B", "C", "D"].into_iter().map(Slot::from).collect(),
    )
    .unwrap();

    assert!(bracket.advance().is_err(), "undecided round must not advance");
    assert!(bracket.record_winner(0, "C").is_err());
    assert!(bracket.record_winner(5, "A").is_err());

    bracket.record_winner(0, "B").unwrap();
    bracket.record_winner(1, "C").unwrap();
    assert!(bracket.round_complete());
    assert!(bracket.advance().unwrap());
    assert_eq!(bracket.round(1).unwrap(), &[Pairing::new("B", "C")]);
    assert!(!bracket.is_complete());

    bracket.record_winner(0, "C").unwrap();
    assert!(!bracket.advance().unwrap());
    assert_eq!(bracket.champion(), Some("C"));
    assert_eq!(bracket.winners(0).unwrap()[0].as_deref(), Some("B"));
}

#[test]
fn test_eight_competitors_three_rounds_one_champion() {
    let model = OutcomeModel::default();
    let venue = Venue::neutral();
    let ratings = seeded_ratings();

    for seed in 0..200 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let bracket = Bracket::from_seeds(eight_seeds()).unwrap();
        let result = KnockoutSimulator::new(&model, &venue)
            .run(bracket, &ratings, &mut rng)
            .unwrap();

        assert_eq!(result.rounds.len(), 3);
        let sizes: Vec<usize> = result.rounds.iter().map(|r| r.matches.len()).collect();
        assert_eq!(sizes, [4, 2, 1]);

        for m in result.rounds.iter().flat_map(|r| &r.matches) {
            let decided = m.result.expect("no byes in this bracket");
            match decided.resolution {
                Resolution::Penalties { kicks_a, kicks_b } => {
                    assert!(decided.final_score.is_draw());
                    assert_ne!(kicks_a, kicks_b);
                }
                _ => assert!(!decided.final_score.is_draw()),
            }
            assert_ne!(Some(&m.winner), m.loser.as_ref());
        }

        let final_match = result.final_match().unwrap();
        assert_eq!(final_match.winner, result.champion);
        assert_eq!(final_match.loser, result.runner_up);
        assert!(result.third_place.is_none());
    }
}

#[test]
fn test_favourite_path_and_third_place() {
    let venue = Venue::neutral();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let bracket = Bracket::from_seeds(eight_seeds()).unwrap();

    let result = KnockoutSimulator::new(&Favourite, &venue)
        .with_third_place_playoff(true)
        .run(bracket, &seeded_ratings(), &mut rng)
        .unwrap();

    // S1, S3, S5, S7 win round one; S1 and S5 the semis
    assert_eq!(result.champion, "S1");
    assert_eq!(result.runner_up.as_deref(), Some("S5"));
    assert_eq!(result.third_place_winner(), Some("S3"));
    assert_eq!(result.rounds[0].name, "Quarter-finals");
    assert_eq!(result.rounds[1].name, "Semi-finals");
    assert_eq!(result.rounds[2].name, "Final");
    assert_eq!(result.last_round_of("S8"), Some(0));
    assert_eq!(result.last_round_of("S7"), Some(1));
    assert_eq!(result.last_round_of("S1"), Some(2));
    assert_eq!(result.last_round_of("Nobody"), None);
}

#[test]
fn test_host_bonus_reaches_bracket() {
    // S8 is the host and picks up enough bonus to beat S7 and S5
    let venue = Venue::hosted_by("S8", 300.0);
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let bracket = Bracket::from_seeds(eight_seeds()).unwrap();
    let result = KnockoutSimulator::new(&Favourite, &venue)
        .run(bracket, &seeded_ratings(), &mut rng)
        .unwrap();
    assert_eq!(result.rounds[0].matches[3].winner, "S8");
    assert_eq!(result.rounds[1].matches[1].winner, "S8");
}

#[test]
fn test_byes_walk_over() {
    let seeds = vec![
        Slot::from("A"),
        Slot::Bye,
        Slot::from("B"),
        Slot::from("C"),
    ];
    let bracket = Bracket::from_seeds(seeds).unwrap();
    let ratings = RatingTable::from_pairs(1500.0, [("A", 1400.0), ("B", 1600.0), ("C", 1500.0)]);
    let venue = Venue::neutral();
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let result = KnockoutSimulator::new(&Favourite, &venue)
        .with_third_place_playoff(true)
        .run(bracket, &ratings, &mut rng)
        .unwrap();

    let walkover = &result.rounds[0].matches[0];
    assert_eq!(walkover.winner, "A");
    assert!(walkover.result.is_none());
    assert!(walkover.loser.is_none());
    assert_eq!(result.champion, "B");
    assert_eq!(result.runner_up.as_deref(), Some("A"));
    // one semi was a walkover, so there is no third-place match
    assert!(result.third_place.is_none());
}

#[test]
fn test_single_pairing_is_a_final() {
    let bracket = Bracket::new(vec![Pairing::new("A", "B")]).unwrap();
    assert_eq!(bracket.total_rounds(), 1);
    let venue = Venue::neutral();
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let result = KnockoutSimulator::new(&OutcomeModel::default(), &venue)
        .with_third_place_playoff(true)
        .run(bracket, &RatingTable::default(), &mut rng)
        .unwrap();
    assert_eq!(result.rounds.len(), 1);
    assert_eq!(result.rounds[0].name, "Final");
    assert!(result.third_place.is_none());
}

#[test]
fn test_round_names() {
    assert_eq!(round_name(1), "Final");
    assert_eq!(round_name(2), "Semi-finals");
    assert_eq!(round_name(4), "Quarter-finals");
    assert_eq!(round_name(8), "Round of 16");
    assert_eq!(round_name(16), "Round of 32");
}

/// Every match ends goalless and goes to the decider
struct Goalless;

impl MatchModel for Goalless {
    fn play(&self, _fixture: &Fixture<'_>, _rng: &mut dyn RngCore) -> Scoreline {
        Scoreline::new(0, 0)
    }
}

#[test]
fn test_winner_cannot_be_recorded_twice() {
    let mut bracket = Bracket::from_seeds(
        ["A", "B", "C", "D"].into_iter().map(Slot::from).collect(),
    )
    .unwrap();
    bracket.record_winner(0, "A").unwrap();
    assert!(matches!(
        bracket.record_winner(0, "B"),
        Err(SimulationError::InvalidBracket(_))
    ));
    assert_eq!(bracket.winners(0).unwrap()[0].as_deref(), Some("A"));
}

#[test]
fn test_run_needs_unplayed_bracket() {
    let venue = Venue::neutral();
    let ratings = seeded_ratings();
    let mut rng = ChaCha8Rng::seed_from_u64(4);

    let mut started = Bracket::from_seeds(eight_seeds()).unwrap();
    assert!(started.is_unplayed());
    started.record_winner(0, "S2").unwrap();
    assert!(!started.is_unplayed());
    assert!(matches!(
        KnockoutSimulator::new(&Favourite, &venue).run(started, &ratings, &mut rng),
        Err(SimulationError::InvalidBracket(_))
    ));

    let mut advanced = Bracket::from_seeds(
        ["A", "B", "C", "D"].into_iter().map(Slot::from).collect(),
    )
    .unwrap();
    advanced.record_winner(0, "A").unwrap();
    advanced.record_winner(1, "D").unwrap();
    advanced.advance().unwrap();
    assert!(KnockoutSimulator::new(&Favourite, &venue)
        .run(advanced, &ratings, &mut rng)
        .is_err());
}

#[test]
fn test_non_finite_rating_is_an_error() {
    let venue = Venue::neutral();
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let ratings = RatingTable::from_pairs(1500.0, [("A", f64::NAN)]);
    let bracket = Bracket::new(vec![Pairing::new("A", "B")]).unwrap();

    let result = KnockoutSimulator::new(&Goalless, &venue).run(bracket, &ratings, &mut rng);
    assert!(matches!(result, Err(SimulationError::Rating(_))));

    let infinite_base = RatingTable::new(f64::INFINITY);
    let bracket = Bracket::new(vec![Pairing::new("A", "B")]).unwrap();
    assert!(KnockoutSimulator::new(&Goalless, &venue)
        .run(bracket, &infinite_base, &mut rng)
        .is_err());
}
