//! Integration tests: the per-game analysis pipeline against a scripted evaluator.

mod common;

use std::time::Duration;

use analysis_worker::analysis::MoveClassification;
use analysis_worker::analyzer::GameAnalyzer;
use analysis_worker::error::WorkerError;
use analysis_worker::evaluator::MATE_SCORE;
use analysis_worker::phase::GamePhase;
use chess_core::PlayerColor;
use common::{moves_of, MockEvaluator, ALICE_WINS_WHITE};

const ONE_MOVE: &str = "1. e4 *";
const TWO_MOVES: &str = "1. e4 e5 *";

#[tokio::test]
async fn test_best_move_has_no_loss() {
    let moves = moves_of(ONE_MOVE);
    let mock = MockEvaluator::new()
        .score(&moves[0].fen_before, 20)
        .score(&moves[0].fen_after, 20);

    let result = GameAnalyzer::new(&mock, 16, Duration::ZERO)
        .analyze_game(&moves, PlayerColor::White)
        .await
        .unwrap();

    assert_eq!(result.moves.len(), 1);
    assert_eq!(result.moves[0].centipawn_loss, 0);
    assert_eq!(result.moves[0].classification, MoveClassification::Good);
    assert_eq!(result.player_acpl, 0.0);
    assert_eq!(result.blunder_count, 0);
    assert_eq!(result.player_accuracy, 100.0);
    assert_eq!(result.opening_acpl, Some(0.0));
    assert_eq!(result.middlegame_acpl, None);
    assert_eq!(result.endgame_acpl, None);
}

#[tokio::test]
async fn test_queen_blunder() {
    let moves = moves_of(ONE_MOVE);
    let mock = MockEvaluator::new()
        .score(&moves[0].fen_before, 10)
        .score(&moves[0].fen_after, -890);

    let result = GameAnalyzer::new(&mock, 16, Duration::ZERO)
        .analyze_game(&moves, PlayerColor::White)
        .await
        .unwrap();

    assert_eq!(result.moves[0].centipawn_loss, 900);
    assert_eq!(result.moves[0].classification, MoveClassification::Blunder);
    assert_eq!(result.blunder_count, 1);
    assert_eq!(result.player_acpl, 900.0);
}

#[tokio::test]
async fn test_huge_swing_is_capped() {
    let moves = moves_of(ONE_MOVE);
    let mock = MockEvaluator::new()
        .score(&moves[0].fen_before, 2500)
        .score(&moves[0].fen_after, -2500);

    let result = GameAnalyzer::new(&mock, 16, Duration::ZERO)
        .analyze_game(&moves, PlayerColor::White)
        .await
        .unwrap();

    assert_eq!(result.moves[0].centipawn_loss, 1000);
}

#[tokio::test]
async fn test_black_loss_from_own_perspective() {
    let moves = moves_of(TWO_MOVES);
    // e4 keeps white at +30; e5 hands white +130
    let mock = MockEvaluator::new()
        .score(&moves[0].fen_before, 20)
        .score(&moves[0].fen_after, 30)
        .score(&moves[1].fen_after, 130);

    let result = GameAnalyzer::new(&mock, 16, Duration::ZERO)
        .analyze_game(&moves, PlayerColor::Black)
        .await
        .unwrap();

    assert_eq!(result.moves[0].centipawn_loss, 0);
    assert_eq!(result.moves[1].centipawn_loss, 100);
    assert_eq!(result.moves[1].classification, MoveClassification::Mistake);
    assert_eq!(result.player_acpl, 100.0);
    assert_eq!(result.opponent_acpl, 0.0);
    assert_eq!(result.mistake_count, 1);
    // Opponent errors never reach the counters
    assert_eq!(result.blunder_count, 0);
}

#[tokio::test]
async fn test_opponent_moves_do_not_count() {
    let moves = moves_of(TWO_MOVES);
    let mock = MockEvaluator::new().score(&moves[1].fen_after, 500);

    let result = GameAnalyzer::new(&mock, 16, Duration::ZERO)
        .analyze_game(&moves, PlayerColor::White)
        .await
        .unwrap();

    assert_eq!(result.opponent_acpl, 500.0);
    assert_eq!(result.player_acpl, 0.0);
    assert_eq!(result.blunder_count, 0);
    assert_eq!(result.mistake_count, 0);
}

#[tokio::test]
async fn test_calls_are_sequential_before_then_after() {
    let moves = moves_of(TWO_MOVES);
    let mock = MockEvaluator::new();

    GameAnalyzer::new(&mock, 16, Duration::ZERO)
        .analyze_game(&moves, PlayerColor::White)
        .await
        .unwrap();

    assert_eq!(
        mock.calls(),
        vec![
            moves[0].fen_before.clone(),
            moves[0].fen_after.clone(),
            moves[1].fen_before.clone(),
            moves[1].fen_after.clone(),
        ]
    );
}

#[tokio::test]
async fn test_oracle_failure_fails_whole_game() {
    let moves = moves_of(ALICE_WINS_WHITE);
    let mock = MockEvaluator::new().fail_on(&moves[4].fen_after);

    let err = GameAnalyzer::new(&mock, 16, Duration::ZERO)
        .analyze_game(&moves, PlayerColor::White)
        .await
        .unwrap_err();

    assert!(matches!(err, WorkerError::Evaluator(_)));
    // Stopped at the failing call
    assert_eq!(mock.calls().len(), 10);
}

#[tokio::test]
async fn test_move_records_carry_game_data() {
    let moves = moves_of(ALICE_WINS_WHITE);
    let mock = MockEvaluator::new();

    let result = GameAnalyzer::new(&mock, 18, Duration::ZERO)
        .analyze_game(&moves, PlayerColor::White)
        .await
        .unwrap();

    assert_eq!(result.moves.len(), 7);
    let last = &result.moves[6];
    assert_eq!(last.san, "Qxf7#");
    assert_eq!(last.uci, "h5f7");
    assert_eq!(last.clock_seconds, Some(260.0));
    assert_eq!(last.game_phase, GamePhase::Opening);
    assert_eq!(last.best_move_uci, "e2e4");
    assert_eq!(last.engine_line.len(), 5);
}

#[tokio::test]
async fn test_mating_move_is_not_a_blunder() {
    let moves = moves_of(ALICE_WINS_WHITE);
    let mate = &moves[6];
    // Mate in one before, black checkmated after
    let mock = MockEvaluator::new()
        .score(&mate.fen_before, MATE_SCORE)
        .score(&mate.fen_after, MATE_SCORE);

    let result = GameAnalyzer::new(&mock, 16, Duration::ZERO)
        .analyze_game(&moves, PlayerColor::White)
        .await
        .unwrap();

    assert_eq!(result.moves[6].san, "Qxf7#");
    assert_eq!(result.moves[6].centipawn_loss, 0);
    assert_eq!(result.moves[6].classification, MoveClassification::Good);
    assert_eq!(result.blunder_count, 0);
}

// ---------------------------------------------------------------------------
// Throttling
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_every_oracle_call_is_throttled() {
    let moves = moves_of(TWO_MOVES);
    let mock = MockEvaluator::new();
    let delay = Duration::from_millis(250);

    let start = tokio::time::Instant::now();
    GameAnalyzer::new(&mock, 16, delay)
        .analyze_game(&moves, PlayerColor::White)
        .await
        .unwrap();

    // Two moves, a before and an after call each
    assert_eq!(mock.calls().len(), 4);
    assert!(start.elapsed() >= delay * 4);
}
