//! Integration tests: weakness detection over move records from several games.

use std::collections::HashMap;

use analysis_worker::analysis::MoveClassification;
use analysis_worker::analyzer::MoveAnalysis;
use analysis_worker::phase::GamePhase;
use analysis_worker::weakness::{GameMoveRecord, WeaknessDetector};
use chess_core::PlayerColor;

fn player_move(
    game_id: usize,
    ply: u32,
    class: MoveClassification,
    loss: i32,
    phase: GamePhase,
    clock: f64,
) -> GameMoveRecord {
    GameMoveRecord {
        game_id,
        analysis: MoveAnalysis {
            ply,
            move_number: ply / 2 + 1,
            is_white: ply % 2 == 0,
            san: "Nf3".into(),
            uci: "g1f3".into(),
            fen_before: String::new(),
            fen_after: String::new(),
            best_move_uci: "e2e4".into(),
            best_move_san: "e4".into(),
            score_before_cp: 0,
            score_after_cp: -loss,
            centipawn_loss: loss,
            classification: class,
            game_phase: phase,
            clock_seconds: Some(clock),
            engine_line: Vec::new(),
        },
    }
}

#[test]
fn test_time_trouble_blunders() {
    use GamePhase::*;
    use MoveClassification::*;

    // Ten white moves: blunders in the opening and the endgame under 60s,
    // everything else calm with 90s on the clock
    let records = vec![
        player_move(1, 0, Good, 0, Opening, 90.0),
        player_move(1, 2, Good, 0, Opening, 90.0),
        player_move(1, 4, Blunder, 350, Opening, 45.0),
        player_move(1, 6, Good, 0, Opening, 90.0),
        player_move(1, 8, Good, 0, Middlegame, 90.0),
        player_move(1, 10, Good, 0, Middlegame, 90.0),
        player_move(1, 12, Good, 0, Middlegame, 90.0),
        player_move(1, 14, Good, 0, Endgame, 90.0),
        player_move(1, 16, Blunder, 420, Endgame, 45.0),
        player_move(1, 18, Good, 0, Endgame, 90.0),
    ];
    let colors = HashMap::from([(1, PlayerColor::White)]);

    let report = WeaknessDetector.analyze(&records, &colors);

    assert_eq!(report.overall_blunder_rate, 0.2);
    assert_eq!(report.phase_breakdown[&Opening], 0.25);
    assert_eq!(report.phase_breakdown[&Middlegame], 0.0);
    assert!((report.phase_breakdown[&Endgame] - 1.0 / 3.0).abs() < 1e-12);

    let rushing = &report.rushing_analysis;
    assert_eq!(rushing.blunder_rate_under_60s, 1.0);
    assert_eq!(rushing.blunder_rate_over_60s, 0.0);
    assert_eq!(rushing.time_trouble_multiplier, 100.0);
    assert!(rushing.verdict.contains("Slow down"));

    assert_eq!(report.top_blunders.len(), 2);
    assert_eq!(report.top_blunders[0].centipawn_loss, 420);
    assert_eq!(report.top_blunders[0].move_index, 16);
    assert_eq!(report.move_number_heatmap.get(&3), Some(&1));
    assert_eq!(report.move_number_heatmap.get(&9), Some(&1));

    assert_eq!(
        report.recurring_patterns,
        vec![
            "Most blunders occur in the endgame (33% blunder rate)".to_string(),
            "Blunder rate increases 100.0x in time trouble (under 60s)".to_string(),
        ]
    );
}

#[test]
fn test_colors_per_game() {
    use MoveClassification::*;

    // Game 7 is played with black, so only odd plies are the player's
    let records = vec![
        player_move(7, 0, Blunder, 600, GamePhase::Middlegame, 120.0),
        player_move(7, 1, Good, 0, GamePhase::Middlegame, 120.0),
        player_move(7, 3, Good, 0, GamePhase::Middlegame, 120.0),
        player_move(8, 0, Mistake, 80, GamePhase::Middlegame, 120.0),
    ];
    let colors = HashMap::from([(7, PlayerColor::Black)]);

    let report = WeaknessDetector.analyze(&records, &colors);

    // Game 8 has no color entry and counts as white
    assert!((report.overall_blunder_rate - 1.0 / 3.0).abs() < 1e-12);
    // The mistake lost under 100cp so it is not listed
    assert!(report.top_blunders.is_empty());
    assert_eq!(report.move_number_heatmap.len(), 1);
}
