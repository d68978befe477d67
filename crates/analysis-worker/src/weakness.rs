//! Recurring weakness detection across many analyzed games.

use std::collections::{BTreeMap, HashMap};

use chess_core::{PlayerColor, PlayerResult};
use serde::{Deserialize, Serialize};

use crate::analyzer::MoveAnalysis;
use crate::phase::GamePhase;

/// Clock (seconds) separating "in time trouble" from "has time"
const RUSHING_THRESHOLD: f64 = 60.0;

/// Floor on the over-threshold rate when computing the multiplier
const RATE_FLOOR: f64 = 0.01;

/// Only blunders losing more than this are listed individually
const TOP_BLUNDER_MIN_LOSS: i32 = 100;
const TOP_BLUNDER_LIMIT: usize = 10;

/// Games of at most this many half-moves count as short
const SHORT_GAME_PLIES: usize = 20;

/// One analyzed move tagged with the game it came from.
#[derive(Debug, Clone)]
pub struct GameMoveRecord {
    pub game_id: usize,
    pub analysis: MoveAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RushingAnalysis {
    pub blunder_rate_under_60s: f64,
    pub blunder_rate_over_60s: f64,
    pub time_trouble_multiplier: f64,
    pub verdict: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopBlunder {
    pub game_id: usize,
    pub move_index: u32,
    pub san: String,
    pub centipawn_loss: i32,
    pub phase: GamePhase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaknessReport {
    pub overall_blunder_rate: f64,
    pub phase_breakdown: BTreeMap<GamePhase, f64>,
    pub move_number_heatmap: BTreeMap<u32, u32>,
    pub rushing_analysis: RushingAnalysis,
    pub top_blunders: Vec<TopBlunder>,
    pub recurring_patterns: Vec<String>,
}

/// Result and length of a game, for the summary used without engine data
#[derive(Debug, Clone, Copy)]
pub struct GameOutcome {
    pub result: PlayerResult,
    pub total_moves: usize,
}

#[derive(Debug, Default)]
struct PhaseCounts {
    moves: [u32; 3],
    blunders: [u32; 3],
}

fn phase_index(phase: GamePhase) -> usize {
    match phase {
        GamePhase::Opening => 0,
        GamePhase::Middlegame => 1,
        GamePhase::Endgame => 2,
    }
}

/// Blunder counts per full move, remembering the order moves were first seen.
#[derive(Debug, Default)]
struct Heatmap {
    counts: HashMap<u32, u32>,
    order: Vec<u32>,
}

impl Heatmap {
    fn record(&mut self, move_number: u32) {
        let count = self.counts.entry(move_number).or_insert(0);
        if *count == 0 {
            self.order.push(move_number);
        }
        *count += 1;
    }

    /// Move with the most blunders; the earliest seen wins a tie.
    fn peak(&self) -> Option<(u32, u32)> {
        let mut peak: Option<(u32, u32)> = None;
        for &move_number in &self.order {
            let count = self.counts[&move_number];
            if peak.map_or(true, |(_, best)| count > best) {
                peak = Some((move_number, count));
            }
        }
        peak
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct WeaknessDetector;

impl WeaknessDetector {
    /// Analyze the player's moves in `records`. Games missing from
    /// `player_colors` are treated as played with white.
    pub fn analyze(
        &self,
        records: &[GameMoveRecord],
        player_colors: &HashMap<usize, PlayerColor>,
    ) -> WeaknessReport {
        let mut phases = PhaseCounts::default();
        let mut heatmap = Heatmap::default();
        let mut top_blunders: Vec<TopBlunder> = Vec::new();
        // (clock, is_blunder) for every clocked player move
        let mut clocked: Vec<(f64, bool)> = Vec::new();
        let mut total_moves = 0u32;
        let mut total_blunders = 0u32;

        for record in records {
            let color = player_colors
                .get(&record.game_id)
                .copied()
                .unwrap_or(PlayerColor::White);
            let ev = &record.analysis;
            if !color.owns_move(ev.is_white) {
                continue;
            }

            total_moves += 1;
            let idx = phase_index(ev.game_phase);
            phases.moves[idx] += 1;

            let is_blunder = ev.classification.is_error();
            if is_blunder {
                total_blunders += 1;
                phases.blunders[idx] += 1;
                heatmap.record(ev.ply / 2 + 1);

                if ev.centipawn_loss > TOP_BLUNDER_MIN_LOSS {
                    top_blunders.push(TopBlunder {
                        game_id: record.game_id,
                        move_index: ev.ply,
                        san: ev.san.clone(),
                        centipawn_loss: ev.centipawn_loss,
                        phase: ev.game_phase,
                    });
                }
            }

            if let Some(clock) = ev.clock_seconds {
                clocked.push((clock, is_blunder));
            }
        }

        let phase_breakdown: BTreeMap<GamePhase, f64> = GamePhase::ALL
            .iter()
            .map(|&phase| {
                let idx = phase_index(phase);
                let rate = f64::from(phases.blunders[idx]) / f64::from(phases.moves[idx].max(1));
                (phase, rate)
            })
            .collect();

        let rushing = analyze_rushing(&clocked);

        top_blunders.sort_by(|a, b| b.centipawn_loss.cmp(&a.centipawn_loss));
        top_blunders.truncate(TOP_BLUNDER_LIMIT);

        let recurring_patterns = detect_patterns(&phase_breakdown, &rushing, &heatmap);

        WeaknessReport {
            overall_blunder_rate: f64::from(total_blunders) / f64::from(total_moves.max(1)),
            phase_breakdown,
            move_number_heatmap: heatmap.counts.into_iter().collect(),
            rushing_analysis: rushing,
            top_blunders,
            recurring_patterns,
        }
    }

    /// Summary built from game results alone, for players with no engine
    /// analysis. All blunder statistics are zero.
    pub fn results_summary(&self, games: &[GameOutcome]) -> WeaknessReport {
        let mut report = WeaknessReport {
            overall_blunder_rate: 0.0,
            phase_breakdown: GamePhase::ALL.iter().map(|&p| (p, 0.0)).collect(),
            move_number_heatmap: BTreeMap::new(),
            rushing_analysis: RushingAnalysis {
                blunder_rate_under_60s: 0.0,
                blunder_rate_over_60s: 0.0,
                time_trouble_multiplier: 0.0,
                verdict: "Analyze games with an engine to get rushing analysis.".to_string(),
            },
            top_blunders: Vec::new(),
            recurring_patterns: Vec::new(),
        };
        if games.is_empty() {
            return report;
        }

        let total = games.len();
        let count = |r: PlayerResult| games.iter().filter(|g| g.result == r).count();
        let (wins, draws, losses) = (
            count(PlayerResult::Win),
            count(PlayerResult::Draw),
            count(PlayerResult::Loss),
        );
        let avg_plies = games.iter().map(|g| g.total_moves).sum::<usize>() as f64 / total as f64;
        let short = games
            .iter()
            .filter(|g| g.total_moves <= SHORT_GAME_PLIES)
            .count();

        report.recurring_patterns = vec![
            format!(
                "Win rate: {:.0}% ({wins}W / {draws}D / {losses}L across {total} games)",
                wins as f64 / total as f64 * 100.0
            ),
            format!(
                "Average game length: {avg_plies:.0} half-moves ({:.0} full moves)",
                avg_plies / 2.0
            ),
            format!(
                "Short games (under 20 moves): {short} ({:.0}%)",
                short as f64 / total as f64 * 100.0
            ),
            "Run engine analysis on your games for detailed blunder detection.".to_string(),
        ];
        report
    }
}

/// Compare blunder rates below and above the time-trouble threshold.
pub fn analyze_rushing(clocked: &[(f64, bool)]) -> RushingAnalysis {
    let (mut moves_under, mut blunders_under) = (0u32, 0u32);
    let (mut moves_over, mut blunders_over) = (0u32, 0u32);

    for &(clock, is_blunder) in clocked {
        if clock < RUSHING_THRESHOLD {
            moves_under += 1;
            blunders_under += u32::from(is_blunder);
        } else {
            moves_over += 1;
            blunders_over += u32::from(is_blunder);
        }
    }

    let rate_under = f64::from(blunders_under) / f64::from(moves_under.max(1));
    let rate_over = f64::from(blunders_over) / f64::from(moves_over.max(1));
    let multiplier = rate_under / rate_over.max(RATE_FLOOR);

    let verdict = if multiplier > 2.0 {
        format!(
            "Your blunder rate is {multiplier:.1}x higher when you have less than 60 seconds. Slow down!"
        )
    } else if multiplier > 1.5 {
        "Time pressure slightly increases your blunder rate. Try to manage your clock better."
            .to_string()
    } else {
        "Your blunder rate is consistent regardless of time pressure.".to_string()
    };

    RushingAnalysis {
        blunder_rate_under_60s: rate_under,
        blunder_rate_over_60s: rate_over,
        time_trouble_multiplier: multiplier,
        verdict,
    }
}

fn detect_patterns(
    phase_breakdown: &BTreeMap<GamePhase, f64>,
    rushing: &RushingAnalysis,
    heatmap: &Heatmap,
) -> Vec<String> {
    let mut patterns = Vec::new();

    let mut worst: Option<(GamePhase, f64)> = None;
    for phase in GamePhase::ALL {
        let rate = phase_breakdown.get(&phase).copied().unwrap_or(0.0);
        if worst.map_or(true, |(_, best)| rate > best) {
            worst = Some((phase, rate));
        }
    }
    if let Some((phase, rate)) = worst {
        if rate > 0.1 {
            patterns.push(format!(
                "Most blunders occur in the {} ({:.0}% blunder rate)",
                phase.as_str(),
                rate * 100.0
            ));
        }
    }

    if rushing.time_trouble_multiplier > 2.0 {
        patterns.push(format!(
            "Blunder rate increases {:.1}x in time trouble (under 60s)",
            rushing.time_trouble_multiplier
        ));
    }

    if let Some((move_number, count)) = heatmap.peak() {
        if count >= 3 {
            patterns.push(format!("Blunders cluster around move {move_number}"));
        }
    }

    patterns
}
