//! Core game analysis: walk the moves, score every position, classify each
//! move and accumulate player/opponent statistics.

use std::time::Duration;

use chess_core::{ParsedMove, PlayerColor};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::{self, MoveClassification};
use crate::error::WorkerError;
use crate::evaluator::{EngineEval, PositionEvaluator};
use crate::phase::{self, GamePhase};

/// Principal variation entries kept per move
const ENGINE_LINE_LEN: usize = 5;

/// Progress is logged every this many moves
const PROGRESS_INTERVAL: usize = 10;

/// Analysis result for a single move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveAnalysis {
    pub ply: u32,
    pub move_number: u32,
    pub is_white: bool,
    pub san: String,
    pub uci: String,
    pub fen_before: String,
    pub fen_after: String,
    pub best_move_uci: String,
    pub best_move_san: String,
    pub score_before_cp: i32,
    pub score_after_cp: i32,
    pub centipawn_loss: i32,
    pub classification: MoveClassification,
    pub game_phase: GamePhase,
    pub clock_seconds: Option<f64>,
    pub engine_line: Vec<String>,
}

/// Complete analysis result for a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameAnalysisResult {
    pub player_acpl: f64,
    pub opponent_acpl: f64,
    pub player_accuracy: f64,
    pub blunder_count: u32,
    pub mistake_count: u32,
    pub inaccuracy_count: u32,
    /// None when the player made no move in that phase
    pub opening_acpl: Option<f64>,
    pub middlegame_acpl: Option<f64>,
    pub endgame_acpl: Option<f64>,
    pub moves: Vec<MoveAnalysis>,
}

/// Per-phase loss lists for the player's moves
#[derive(Debug, Default)]
struct PhaseLosses {
    opening: Vec<i32>,
    middlegame: Vec<i32>,
    endgame: Vec<i32>,
}

impl PhaseLosses {
    fn bucket(&mut self, phase: GamePhase) -> &mut Vec<i32> {
        match phase {
            GamePhase::Opening => &mut self.opening,
            GamePhase::Middlegame => &mut self.middlegame,
            GamePhase::Endgame => &mut self.endgame,
        }
    }
}

pub fn mean(values: &[i32]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().map(|&v| f64::from(v)).sum::<f64>() / values.len() as f64
    }
}

fn mean_if_any(values: &[i32]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(mean(values))
    }
}

/// Drives the evaluator over one game. Oracle calls are strictly sequential
/// and each one is followed by `request_delay`.
pub struct GameAnalyzer<'a, E: PositionEvaluator + ?Sized> {
    evaluator: &'a E,
    depth: u32,
    request_delay: Duration,
}

impl<'a, E: PositionEvaluator + ?Sized> GameAnalyzer<'a, E> {
    pub fn new(evaluator: &'a E, depth: u32, request_delay: Duration) -> Self {
        Self {
            evaluator,
            depth,
            request_delay,
        }
    }

    async fn evaluate(&self, fen: &str) -> Result<EngineEval, WorkerError> {
        let eval = self.evaluator.evaluate(fen, self.depth).await?;
        tokio::time::sleep(self.request_delay).await;
        Ok(eval)
    }

    /// Analyze every move of a game from `player_color`'s point of view.
    ///
    /// Any evaluator failure aborts the whole game; no partial result is returned.
    pub async fn analyze_game(
        &self,
        moves: &[ParsedMove],
        player_color: PlayerColor,
    ) -> Result<GameAnalysisResult, WorkerError> {
        let mut move_analyses: Vec<MoveAnalysis> = Vec::with_capacity(moves.len());
        let mut player_losses: Vec<i32> = Vec::new();
        let mut opponent_losses: Vec<i32> = Vec::new();
        let mut phase_losses = PhaseLosses::default();

        let mut blunders = 0u32;
        let mut mistakes = 0u32;
        let mut inaccuracies = 0u32;

        for (i, mv) in moves.iter().enumerate() {
            let eval_before = self.evaluate(&mv.fen_before).await?;
            let eval_after = self.evaluate(&mv.fen_after).await?;

            let cp_loss =
                analysis::calculate_cp_loss(eval_before.score_cp, eval_after.score_cp, mv.is_white);
            let classification = analysis::classify_move(cp_loss);
            let game_phase = phase::classify_fen(&mv.fen_before, mv.move_number)?;

            if player_color.owns_move(mv.is_white) {
                player_losses.push(cp_loss);
                phase_losses.bucket(game_phase).push(cp_loss);
                match classification {
                    MoveClassification::Blunder => blunders += 1,
                    MoveClassification::Mistake => mistakes += 1,
                    MoveClassification::Inaccuracy => inaccuracies += 1,
                    _ => {}
                }
            } else {
                opponent_losses.push(cp_loss);
            }

            let mut engine_line = eval_before.principal_variation;
            engine_line.truncate(ENGINE_LINE_LEN);

            move_analyses.push(MoveAnalysis {
                ply: mv.ply,
                move_number: mv.move_number,
                is_white: mv.is_white,
                san: mv.san.clone(),
                uci: mv.uci.clone(),
                fen_before: mv.fen_before.clone(),
                fen_after: mv.fen_after.clone(),
                best_move_uci: eval_before.best_move_uci,
                best_move_san: eval_before.best_move_san,
                score_before_cp: eval_before.score_cp,
                score_after_cp: eval_after.score_cp,
                centipawn_loss: cp_loss,
                classification,
                game_phase,
                clock_seconds: mv.clock_seconds,
                engine_line,
            });

            if (i + 1) % PROGRESS_INTERVAL == 0 {
                info!(analyzed = i + 1, total = moves.len(), "Analysis progress");
            }
        }

        let player_acpl = mean(&player_losses);

        Ok(GameAnalysisResult {
            player_acpl,
            opponent_acpl: mean(&opponent_losses),
            player_accuracy: analysis::calculate_accuracy(player_acpl, player_losses.len()),
            blunder_count: blunders,
            mistake_count: mistakes,
            inaccuracy_count: inaccuracies,
            opening_acpl: mean_if_any(&phase_losses.opening),
            middlegame_acpl: mean_if_any(&phase_losses.middlegame),
            endgame_acpl: mean_if_any(&phase_losses.endgame),
            moves: move_analyses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[10, 20, 30]), 20.0);
        assert_eq!(mean_if_any(&[]), None);
        assert_eq!(mean_if_any(&[0]), Some(0.0));
    }

    #[test]
    fn test_phase_buckets_are_distinct() {
        let mut losses = PhaseLosses::default();
        losses.bucket(GamePhase::Opening).push(5);
        losses.bucket(GamePhase::Endgame).push(40);
        losses.bucket(GamePhase::Endgame).push(60);
        assert_eq!(losses.opening, vec![5]);
        assert!(losses.middlegame.is_empty());
        assert_eq!(mean(&losses.endgame), 50.0);
    }
}
