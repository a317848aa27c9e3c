//! End-to-end scenarios: match history to ratings to simulated tournaments

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rating_core::{CompetitionTier, MatchRecord, RatingEngine, RatingTable};
use tournament::{
    Bracket, Group, KnockoutSimulator, MonteCarlo, MonteCarloConfig, OutcomeModel,
    SimulationError, SimulatorConfig, Slot, Stage, TournamentFormat, TournamentOrchestrator,
    Venue,
};

const HISTORY: &str = r#"[
  {"date": "2019-06-21", "competitor_a": "Egypt", "competitor_b": "Zimbabwe",
   "score_a": 1, "score_b": 0, "tournament": "African Cup of Nations", "neutral_site": false},
  {"date": "2019-06-23", "competitor_a": "Morocco", "competitor_b": "Namibia",
   "score_a": 1, "score_b": 0, "tournament": "African Cup of Nations", "neutral_site": true},
  {"date": "2019-07-19", "competitor_a": "Senegal", "competitor_b": "Algeria",
   "score_a": 0, "score_b": 1, "tournament": "African Cup of Nations", "neutral_site": true},
  {"date": "2021-11-16", "competitor_a": "Morocco", "competitor_b": "Guinea-Bissau",
   "score_a": 3, "score_b": 0, "tournament": "FIFA World Cup qualification", "neutral_site": false},
  {"date": "2022-02-06", "competitor_a": "Senegal", "competitor_b": "Egypt",
   "score_a": 0, "score_b": 0, "tournament": "African Cup of Nations", "neutral_site": true},
  {"date": "2022-12-06", "competitor_a": "Morocco", "competitor_b": "Spain",
   "score_a": 0, "score_b": 0, "competition": "world_cup", "neutral_site": true},
  {"date": "2024-02-11", "competitor_a": "Nigeria", "competitor_b": "Ivory Coast",
   "score_a": 1, "score_b": 2, "tournament": "African Cup of Nations", "neutral_site": false},
  {"date": "2024-03-26", "competitor_a": "Morocco", "competitor_b": "Mauritania",
   "score_a": 0, "score_b": 0, "tournament": "Friendly", "neutral_site": false}
]"#;

fn ratings_from_history() -> RatingTable {
    let matches: Vec<MatchRecord> = serde_json::from_str(HISTORY).unwrap();
    let mut engine = RatingEngine::default();
    engine.replay(&matches).unwrap();
    engine.table()
}

#[test]
fn test_history_feeds_simulation() {
    let matches: Vec<MatchRecord> = serde_json::from_str(HISTORY).unwrap();
    assert_eq!(matches[0].competition, CompetitionTier::Continental);
    assert_eq!(matches[3].competition, CompetitionTier::Qualifier);
    assert_eq!(matches[5].competition, CompetitionTier::WorldCup);
    assert_eq!(matches[7].competition, CompetitionTier::Friendly);

    let ratings = ratings_from_history();
    assert!(ratings.rating_of("Morocco") > 1500.0);
    assert!(ratings.rating_of("Zimbabwe") < 1500.0);
    assert_eq!(ratings.rating_of("Botswana"), 1500.0);

    let orchestrator: TournamentOrchestrator = TournamentOrchestrator::default();
    let first = orchestrator.run(&ratings, 42).unwrap();
    let second = orchestrator.run(&ratings, 42).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.knockout.rounds.len(), 4);
    assert_eq!(first.stage_reached(first.champion()), Stage::Champion);
}

#[test]
fn test_invalid_history_rejected() {
    let self_play = r#"[{"date": "2020-01-01", "competitor_a": "Mali", "competitor_b": "Mali",
        "score_a": 1, "score_b": 1}]"#;
    assert!(serde_json::from_str::<Vec<MatchRecord>>(self_play).is_err());

    let negative = r#"[{"date": "2020-01-01", "competitor_a": "Mali", "competitor_b": "Chad",
        "score_a": -1, "score_b": 1}]"#;
    assert!(serde_json::from_str::<Vec<MatchRecord>>(negative).is_err());
}

#[test]
fn test_eight_team_bracket_always_finishes() {
    let model = OutcomeModel::default();
    let venue = Venue::neutral();
    let ratings = ratings_from_history();
    let teams = [
        "Morocco", "Senegal", "Egypt", "Algeria", "Nigeria", "Ivory Coast", "Mali", "Spain",
    ];

    for seed in 0..100 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let bracket = Bracket::from_seeds(teams.iter().copied().map(Slot::from).collect()).unwrap();
        assert_eq!(bracket.total_rounds(), 3);
        let result = KnockoutSimulator::new(&model, &venue)
            .run(bracket, &ratings, &mut rng)
            .unwrap();
        assert_eq!(result.rounds.len(), 3);
        assert!(teams.contains(&result.champion.as_str()));
        let winners: usize = result.rounds.iter().map(|r| r.matches.len()).sum();
        assert_eq!(winners, 7);
    }
}

#[test]
fn test_format_that_cannot_fill_a_bracket() {
    let groups = (0..3)
        .map(|g| Group::new(format!("Group {g}"), (0..4).map(|i| format!("Team {g}-{i}"))))
        .collect();
    let format = TournamentFormat::from_groups(groups, 1);
    let result = TournamentOrchestrator::new(OutcomeModel::default(), format, 100.0);
    assert!(matches!(result, Err(SimulationError::InvalidFormat(_))));

    let groups = (0..3)
        .map(|g| Group::new(format!("Group {g}"), (0..4).map(|i| format!("Team {g}-{i}"))))
        .collect();
    let format = TournamentFormat::from_groups(groups, 2);
    assert!(TournamentOrchestrator::new(OutcomeModel::default(), format, 100.0).is_ok());
}

#[test]
fn test_config_drives_batch() {
    let text = r#"
[outcome]
goal_jitter_sd = 0.8

[format]
best_thirds = 0
third_place_playoff = false

[[format.groups]]
name = "North"
competitors = ["Morocco", "Algeria", "Egypt", "Tunisia"]

[[format.groups]]
name = "West"
competitors = ["Senegal", "Nigeria", "Mali", "Ivory Coast"]

[monte_carlo]
runs = 40
seed = 9
"#;
    let config = SimulatorConfig::from_toml_str(text).unwrap();
    let orchestrator = TournamentOrchestrator::new(
        OutcomeModel::new(config.outcome.clone()).unwrap(),
        config.format.clone(),
        config.elo.home_advantage,
    )
    .unwrap();
    let batch = MonteCarlo::new(MonteCarloConfig {
        runs: config.monte_carlo.runs,
        seed: config.monte_carlo.seed,
    })
    .unwrap();

    let ratings = ratings_from_history();
    let odds = batch.simulate_many(&orchestrator, &ratings).unwrap();
    assert_eq!(odds.runs(), 40);
    let titles: f64 = config
        .format
        .competitors()
        .map(|c| odds.title_probability(c))
        .sum();
    assert!((titles - 1.0).abs() < 1e-9);
    // four qualifiers: the knockout starts at the semi-finals
    for (_, counts) in odds.favourites() {
        assert_eq!(counts.knockout, counts.semi_final);
    }
    assert_eq!(
        odds.probability("Morocco", Stage::SemiFinal),
        odds.probability("Morocco", Stage::RoundOf(4))
    );
}
