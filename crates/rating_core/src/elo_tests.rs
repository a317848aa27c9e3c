use super::*;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn game(date: NaiveDate, a: &str, b: &str, sa: i64, sb: i64) -> MatchRecord {
    MatchRecord::try_new(date, a, b, sa, sb, CompetitionTier::Friendly, true).unwrap()
}

#[test]
fn test_elo_calculation() {
    let engine = RatingEngine::default();

    // Equal ratings should give 50% expected score
    let expected = engine.expected_score("Senegal", "Egypt", 0.0);
    assert_eq!(expected, 0.5);
}

#[test]
fn test_home_advantage_raises_expectation() {
    let expected = expected_score(1500.0, 1500.0, DEFAULT_HOME_ADVANTAGE);
    assert!((expected - 0.6401).abs() < 1e-3);
}

#[test]
fn test_expected_score_stays_open() {
    let huge = expected_score(10_000.0, 0.0, 0.0);
    let tiny = expected_score(0.0, 10_000.0, 0.0);
    assert!(huge < 1.0 && huge > 0.5);
    assert!(tiny > 0.0 && tiny < 0.5);
}

#[test]
fn test_expected_score_defined_for_bad_ratings() {
    assert_eq!(expected_score(f64::NAN, 1500.0, 0.0), 0.5);
    assert_eq!(expected_score(1500.0, 1500.0, f64::NAN), 0.5);
    assert_eq!(expected_score(f64::INFINITY, f64::INFINITY, 0.0), 0.5);
    let p = expected_score(f64::INFINITY, 1500.0, 0.0);
    assert!(p > 0.5 && p < 1.0);
}

#[test]
fn test_unseen_competitor_reads_base() {
    let engine = RatingEngine::default();
    assert_eq!(engine.rating_of("Comoros"), DEFAULT_ELO);
    assert_eq!(engine.games_played("Comoros"), 0);
    assert!(engine.is_empty());
}

#[test]
fn test_elo_update() {
    let mut engine = RatingEngine::default();

    let snapshot = engine
        .update(&game(day(2023, 1, 1), "Morocco", "Mali", 2, 0))
        .unwrap();

    // Friendly K = 20, neutral ground, equal ratings: 20 * (1 - 0.5)
    assert!((snapshot.delta - 10.0).abs() < 1e-9);
    assert!((engine.rating_of("Morocco") - 1510.0).abs() < 1e-9);
    assert!((engine.rating_of("Mali") - 1490.0).abs() < 1e-9);
    assert_eq!(engine.games_played("Morocco"), 1);
    assert_eq!(engine.timeline().len(), 1);
}

#[test]
fn test_update_is_symmetric() {
    let mut engine = RatingEngine::default();
    engine
        .update(&game(day(2020, 1, 1), "Ghana", "Togo", 3, 1))
        .unwrap();

    let before_a = engine.rating_of("Ghana");
    let before_b = engine.rating_of("Togo");
    let mut record = game(day(2020, 2, 1), "Ghana", "Togo", 0, 1);
    record.neutral_site = false;
    record.competition = CompetitionTier::WorldCup;
    engine.update(&record).unwrap();

    let change_a = engine.rating_of("Ghana") - before_a;
    let change_b = engine.rating_of("Togo") - before_b;
    assert!((change_a + change_b).abs() < 1e-9);
    assert!(change_a < 0.0);
}

#[test]
fn test_draw_between_equals_changes_nothing() {
    let mut engine = RatingEngine::default();
    engine
        .update(&game(day(2021, 3, 3), "Benin", "Botswana", 1, 1))
        .unwrap();
    assert_eq!(engine.rating_of("Benin"), DEFAULT_ELO);
    assert_eq!(engine.rating_of("Botswana"), DEFAULT_ELO);
}

#[test]
fn test_home_draw_costs_the_home_side() {
    let mut engine = RatingEngine::default();
    let mut record = game(day(2021, 3, 3), "Benin", "Botswana", 1, 1);
    record.neutral_site = false;
    engine.update(&record).unwrap();
    assert!(engine.rating_of("Benin") < DEFAULT_ELO);
    assert!(engine.rating_of("Botswana") > DEFAULT_ELO);
}

#[test]
fn test_neutral_path_ignores_venue() {
    let mut record = game(day(2021, 3, 3), "Benin", "Botswana", 1, 1);
    record.neutral_site = false;

    let mut engine = RatingEngine::default();
    engine.update_neutral(&record).unwrap();
    assert_eq!(engine.rating_of("Benin"), DEFAULT_ELO);
}

#[test]
fn test_k_factor_tiers() {
    let mut world = RatingEngine::default();
    let mut friendly = RatingEngine::default();
    let mut record = game(day(2022, 11, 20), "Senegal", "Netherlands", 0, 2);

    friendly.update(&record).unwrap();
    record.competition = CompetitionTier::WorldCup;
    world.update(&record).unwrap();

    let world_loss = DEFAULT_ELO - world.rating_of("Senegal");
    let friendly_loss = DEFAULT_ELO - friendly.rating_of("Senegal");
    assert!((world_loss - 3.0 * friendly_loss).abs() < 1e-9);
}

#[test]
fn test_flat_policy() {
    let policy = KFactorPolicy::flat(30.0);
    for tier in CompetitionTier::ALL {
        assert_eq!(policy.k_for(tier), 30.0);
    }
}

#[test]
fn test_invalid_config_rejected() {
    let config = EloConfig {
        k_factors: KFactorPolicy {
            friendly: 0.0,
            ..KFactorPolicy::default()
        },
        ..EloConfig::default()
    };
    assert!(matches!(
        RatingEngine::new(config),
        Err(RatingError::InvalidConfig(_))
    ));

    let negative_home = EloConfig {
        home_advantage: -5.0,
        ..EloConfig::default()
    };
    assert!(RatingEngine::new(negative_home).is_err());
}

#[test]
fn test_self_play_leaves_state_untouched() {
    let mut engine = RatingEngine::default();
    engine
        .update(&game(day(2020, 1, 1), "Egypt", "Sudan", 1, 0))
        .unwrap();

    let mut bad = game(day(2020, 1, 2), "Egypt", "Sudan", 1, 0);
    bad.competitor_b = "Egypt".to_string();

    let err = engine.update(&bad).unwrap_err();
    assert!(matches!(err, RatingError::InvalidMatch { .. }));
    assert_eq!(engine.timeline().len(), 1);
    assert_eq!(engine.games_played("Egypt"), 1);
}

#[test]
fn test_replay_rejects_unordered_batch_atomically() {
    let mut engine = RatingEngine::default();
    let matches = vec![
        game(day(2010, 1, 1), "Mali", "Guinea", 1, 0),
        game(day(2012, 1, 1), "Mali", "Niger", 2, 0),
        game(day(2011, 1, 1), "Guinea", "Niger", 0, 0),
    ];

    let err = engine.replay(&matches).unwrap_err();
    assert!(matches!(
        err,
        RatingError::UnorderedHistory { index: 2, .. }
    ));
    assert!(engine.is_empty());
    assert!(engine.timeline().is_empty());
}

#[test]
fn test_replay_twice_doubles_adjustments() {
    let matches = vec![game(day(2010, 1, 1), "Mali", "Guinea", 1, 0)];

    let mut once = RatingEngine::default();
    once.replay(&matches).unwrap();

    let mut twice = RatingEngine::default();
    twice.replay(&matches).unwrap();
    twice.replay(&matches).unwrap();

    assert_eq!(twice.games_played("Mali"), 2);
    assert!(twice.rating_of("Mali") > once.rating_of("Mali"));
}

#[test]
fn test_trajectory_follows_one_competitor() {
    let mut engine = RatingEngine::default();
    engine
        .replay(&[
            game(day(2015, 1, 1), "Cameroon", "Gabon", 1, 0),
            game(day(2015, 2, 1), "Gabon", "Mozambique", 2, 2),
            game(day(2015, 3, 1), "Mozambique", "Cameroon", 0, 3),
        ])
        .unwrap();

    let path = engine.trajectory("Cameroon");
    assert_eq!(path.len(), 2);
    assert_eq!(path[0].0, day(2015, 1, 1));
    assert_eq!(path[1].1, engine.rating_of("Cameroon"));
}

#[test]
fn test_leaderboard_sorted() {
    let mut engine = RatingEngine::default();
    engine
        .replay(&[
            game(day(2015, 1, 1), "Algeria", "Sudan", 4, 0),
            game(day(2015, 1, 5), "Burkina Faso", "Sudan", 1, 0),
        ])
        .unwrap();

    let board = engine.leaderboard();
    assert_eq!(board.len(), 3);
    assert_eq!(board[0].0, "Algeria");
    assert_eq!(board[2].0, "Sudan");
    assert_eq!(board[2].2, 2);
}

#[test]
fn test_snapshot_is_isolated() {
    let mut engine = RatingEngine::default();
    engine
        .update(&game(day(2015, 1, 1), "Zambia", "Zimbabwe", 1, 0))
        .unwrap();

    let mut copy = engine.snapshot();
    assert!(copy.timeline().is_empty());
    copy.update(&game(day(2016, 1, 1), "Zambia", "Zimbabwe", 5, 0))
        .unwrap();

    assert!(copy.rating_of("Zambia") > engine.rating_of("Zambia"));
    assert_eq!(engine.games_played("Zambia"), 1);
}

#[test]
fn test_table_defaults_to_base() {
    let mut engine = RatingEngine::default();
    engine
        .update(&game(day(2015, 1, 1), "Angola", "Namibia", 1, 0))
        .unwrap();

    let table = engine.table();
    assert_eq!(table.len(), 2);
    assert_eq!(table.rating_of("Angola"), engine.rating_of("Angola"));
    assert_eq!(table.rating_of("Eritrea"), DEFAULT_ELO);
    assert!(!table.contains("Eritrea"));
}

#[test]
fn test_table_rejects_non_finite_ratings() {
    assert!(RatingTable::default().validate().is_ok());
    assert!(RatingTable::from_pairs(1500.0, [("Mali", 1620.0)])
        .validate()
        .is_ok());

    let nan = RatingTable::from_pairs(1500.0, [("Mali", 1620.0), ("Chad", f64::NAN)]);
    match nan.validate() {
        Err(RatingError::InvalidConfig(reason)) => assert!(reason.contains("Chad")),
        other => panic!("expected InvalidConfig, got {other:?}"),
    }

    let mut infinite = RatingTable::new(1500.0);
    infinite.insert("Togo", f64::NEG_INFINITY);
    assert!(infinite.validate().is_err());

    assert!(matches!(
        RatingTable::new(f64::NAN).validate(),
        Err(RatingError::InvalidConfig(_))
    ));
}
