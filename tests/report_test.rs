//! Integration tests: full player reports over parsed games.

mod common;

use analysis_worker::report::{FeatureSource, PlayerGame, ReportBuilder};
use chess_core::{parse_pgn, PlayerColor, PlayerResult};
use common::{
    book_move, moves_of, test_config, MockEvaluator, MockExplorer, ALICE_LOSES_BLACK,
    ALICE_WINS_WHITE, START_FEN,
};

fn alice_games() -> Vec<PlayerGame> {
    [ALICE_WINS_WHITE, ALICE_LOSES_BLACK]
        .iter()
        .enumerate()
        .map(|(i, pgn)| PlayerGame::new(i, parse_pgn(pgn).unwrap(), "alice"))
        .collect()
}

#[test]
fn test_player_perspective() {
    let games = alice_games();
    assert_eq!(games[0].color, PlayerColor::White);
    assert_eq!(games[0].result, PlayerResult::Win);
    assert_eq!(games[1].color, PlayerColor::Black);
    assert_eq!(games[1].result, PlayerResult::Loss);
}

#[tokio::test]
async fn test_engine_report() {
    let games = alice_games();
    let config = test_config();
    let mock = MockEvaluator::new();

    let report = ReportBuilder::new(&config)
        .with_evaluator(&mock)
        .build("alice", &games)
        .await;

    assert_eq!(report.username, "alice");
    assert_eq!(report.feature_source, FeatureSource::Engine);
    assert_eq!(report.games_considered, 2);
    assert_eq!(report.games_analyzed, 2);
    assert_eq!(report.games_failed, 0);
    // 7 + 6 moves, two oracle calls each
    assert_eq!(mock.calls().len(), 26);

    assert!(report.features.values().all(|v| (0.0..=1.0).contains(v)));
    assert_eq!(report.features["avg_centipawn_loss"], 0.0);
    assert_eq!(report.weaknesses.overall_blunder_rate, 0.0);

    let total: f64 = report.playstyle.archetype_scores.values().sum();
    assert!((total - 100.0).abs() < 1e-9);
    assert_eq!(report.openings.repertoire_breadth, 2);
}

#[tokio::test]
async fn test_failed_game_is_dropped() {
    let games = alice_games();
    let config = test_config();
    let loss_moves = moves_of(ALICE_LOSES_BLACK);
    let mock = MockEvaluator::new().fail_on(&loss_moves[3].fen_after);

    let report = ReportBuilder::new(&config)
        .with_evaluator(&mock)
        .build("alice", &games)
        .await;

    assert_eq!(report.feature_source, FeatureSource::Engine);
    assert_eq!(report.games_analyzed, 1);
    assert_eq!(report.games_failed, 1);
    // Openings still cover every game
    assert_eq!(report.openings.repertoire_breadth, 2);
}

#[tokio::test]
async fn test_falls_back_to_heuristic_when_all_fail() {
    let games = alice_games();
    let config = test_config();
    let mock = MockEvaluator::new().fail_on(START_FEN);

    let report = ReportBuilder::new(&config)
        .with_evaluator(&mock)
        .build("alice", &games)
        .await;

    assert_eq!(report.games_analyzed, 0);
    assert_eq!(report.games_failed, 2);
    assert_eq!(report.feature_source, FeatureSource::Heuristic);
    assert_eq!(report.features["blunder_rate"], 0.5);
}

#[tokio::test]
async fn test_engine_free_report() {
    let games = alice_games();
    let config = test_config();

    let report = ReportBuilder::new(&config).build("alice", &games).await;

    assert_eq!(report.feature_source, FeatureSource::Heuristic);
    assert_eq!(report.games_analyzed, 0);
    assert_eq!(report.features["avg_centipawn_loss"], 0.5);
    assert_eq!(report.weaknesses.rushing_analysis.time_trouble_multiplier, 0.0);
    assert_eq!(
        report.weaknesses.recurring_patterns[0],
        "Win rate: 50% (1W / 0D / 1L across 2 games)"
    );
}

#[tokio::test]
async fn test_deviations_attach_to_openings() {
    let games = alice_games();
    let config = test_config();
    let explorer =
        MockExplorer::new().table(START_FEN, vec![book_move("d4", "d2d4", 10, 5, 5)]);

    let report = ReportBuilder::new(&config)
        .with_explorer(&explorer)
        .build("alice", &games)
        .await;

    let kings_pawn = report
        .openings
        .openings
        .iter()
        .find(|o| o.eco == "C20")
        .expect("C20 group");
    assert_eq!(kings_pawn.deviations.len(), 1);
    assert_eq!(kings_pawn.avg_deviation_move, Some(1.0));
    assert_eq!(kings_pawn.deviations[0].player_played, "e4");

    let qgd = report
        .openings
        .openings
        .iter()
        .find(|o| o.eco == "D30")
        .expect("D30 group");
    assert!(qgd.deviations.is_empty());
    assert_eq!(report.openings.book_adherence_rate, 1.0);
}

#[tokio::test]
async fn test_empty_game_list() {
    let config = test_config();
    let mock = MockEvaluator::new();

    let report = ReportBuilder::new(&config)
        .with_evaluator(&mock)
        .build("alice", &[])
        .await;

    assert_eq!(report.games_considered, 0);
    assert_eq!(report.feature_source, FeatureSource::Heuristic);
    assert!(report.features.is_empty());
    assert!(report.weaknesses.recurring_patterns.is_empty());
    assert_eq!(report.openings.most_played, "None");
    let total: f64 = report.playstyle.archetype_scores.values().sum();
    assert!((total - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_report_json_shape() {
    let games = alice_games();
    let config = test_config();
    let mock = MockEvaluator::new();

    let report = ReportBuilder::new(&config)
        .with_evaluator(&mock)
        .build("alice", &games)
        .await;
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["username"], "alice");
    assert_eq!(json["feature_source"], "engine");
    assert_eq!(json["games_analyzed"], 2);
    assert_eq!(json["weaknesses"]["phase_breakdown"]["opening"], 0.0);
    assert!(json["weaknesses"]["phase_breakdown"]["endgame"].is_number());
    assert_eq!(json["openings"]["repertoire_breadth"], 2);
    assert_eq!(json["playstyle"]["radar_chart"].as_array().map(Vec::len), Some(6));
    assert!(json["features"]["avg_centipawn_loss"].is_number());
}
