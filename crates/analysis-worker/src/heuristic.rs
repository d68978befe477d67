//! Engine-free playstyle features approximated from raw game records.
//!
//! Used when no engine evaluations exist for a player. Anything that needs an
//! evaluation is reported at the neutral midpoint.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use chess_core::{parse_pgn, PlayerColor, PlayerResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::features::{is_capture, is_check, sample_stdev, think_time_deltas};
use crate::phase::{self, GamePhase};

/// Neutral value for features that cannot be measured without an engine
pub const NEUTRAL: f64 = 0.5;

/// Features fixed at `NEUTRAL` on this path
pub const ENGINE_ONLY_FEATURES: [&str; 9] = [
    "avg_centipawn_loss",
    "acpl_opening",
    "acpl_middlegame",
    "acpl_endgame",
    "blunder_rate",
    "sacrifice_rate",
    "center_control",
    "piece_activity",
    "time_pressure_blunder_rate",
];

/// (low, high) clamp range per measured feature
static HEURISTIC_RANGES: LazyLock<HashMap<&'static str, (f64, f64)>> = LazyLock::new(|| {
    HashMap::from([
        ("capture_rate", (0.05, 0.35)),
        ("check_frequency", (0.02, 0.12)),
        ("avg_think_time", (2.0, 30.0)),
        ("think_time_variance", (1.0, 20.0)),
        ("game_length", (40.0, 120.0)),
        ("endgame_frequency", (0.0, 1.0)),
        ("decisive_game_rate", (0.5, 0.95)),
        ("opening_repertoire_breadth", (1.0, 15.0)),
    ])
});

/// A game as stored for a player: the raw record plus the player's side and
/// outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawGame {
    pub pgn: String,
    pub player_color: PlayerColor,
    pub player_result: PlayerResult,
}

/// Raw (unnormalized) measurements over all parsable games
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeuristicStats {
    pub games: usize,
    pub player_moves: usize,
    pub captures: usize,
    pub checks: usize,
    pub think_times: Vec<f64>,
    pub total_plies: usize,
    pub endgame_games: usize,
    pub decisive_games: usize,
    pub openings: HashSet<String>,
}

impl HeuristicStats {
    /// Walk every game; records that fail to parse are skipped.
    pub fn collect(games: &[RawGame]) -> Self {
        let mut stats = Self::default();

        for raw in games {
            let parsed = match parse_pgn(&raw.pgn) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(error = %e, "Skipping unparsable game");
                    continue;
                }
            };

            stats.games += 1;
            stats.total_plies += parsed.moves.len();
            if raw.player_result.is_decisive() {
                stats.decisive_games += 1;
            }

            let meta = &parsed.metadata;
            let name = meta.opening_name.as_deref().unwrap_or("Unknown");
            let key = match meta.eco.as_deref() {
                Some(eco) => format!("{eco}:{name}"),
                None => name.to_string(),
            };
            stats.openings.insert(key);

            let mut clocks = Vec::new();
            let mut reached_endgame = false;
            for mv in &parsed.moves {
                if !reached_endgame
                    && matches!(
                        phase::classify_fen(&mv.fen_before, mv.move_number),
                        Ok(GamePhase::Endgame)
                    )
                {
                    reached_endgame = true;
                }

                if !raw.player_color.owns_move(mv.is_white) {
                    continue;
                }
                stats.player_moves += 1;
                if is_capture(&mv.san) {
                    stats.captures += 1;
                }
                if is_check(&mv.san) {
                    stats.checks += 1;
                }
                if let Some(clock) = mv.clock_seconds {
                    clocks.push(clock);
                }
            }

            if reached_endgame {
                stats.endgame_games += 1;
            }
            stats.think_times.extend(think_time_deltas(&clocks));
        }

        debug!(games = stats.games, moves = stats.player_moves, "Heuristic stats collected");
        stats
    }

    /// Raw value per measured feature; empty when no game parsed.
    pub fn raw_features(&self) -> BTreeMap<String, f64> {
        let mut raw = BTreeMap::new();
        if self.games == 0 {
            return raw;
        }
        let games = self.games as f64;
        let moves = self.player_moves.max(1) as f64;

        let avg_think = if self.think_times.is_empty() {
            0.0
        } else {
            self.think_times.iter().sum::<f64>() / self.think_times.len() as f64
        };

        raw.insert("capture_rate".to_string(), self.captures as f64 / moves);
        raw.insert("check_frequency".to_string(), self.checks as f64 / moves);
        raw.insert("avg_think_time".to_string(), avg_think);
        raw.insert("think_time_variance".to_string(), sample_stdev(&self.think_times));
        raw.insert("game_length".to_string(), self.total_plies as f64 / games);
        raw.insert("endgame_frequency".to_string(), self.endgame_games as f64 / games);
        raw.insert("decisive_game_rate".to_string(), self.decisive_games as f64 / games);
        raw.insert("opening_repertoire_breadth".to_string(), self.openings.len() as f64);
        raw
    }
}

fn clamp_to_range(value: f64, (low, high): (f64, f64)) -> f64 {
    if high <= low {
        return 0.0;
    }
    ((value - low) / (high - low)).clamp(0.0, 1.0)
}

/// Normalized [0, 1] features for a player's games without engine data.
///
/// Returns an empty map when none of the games could be parsed.
pub fn approximate_features(games: &[RawGame]) -> BTreeMap<String, f64> {
    let raw = HeuristicStats::collect(games).raw_features();
    if raw.is_empty() {
        return raw;
    }

    let mut normalized: BTreeMap<String, f64> = raw
        .into_iter()
        .map(|(name, value)| {
            let range = HEURISTIC_RANGES
                .get(name.as_str())
                .copied()
                .unwrap_or((0.0, 1.0));
            let v = clamp_to_range(value, range);
            (name, v)
        })
        .collect();

    for name in ENGINE_ONLY_FEATURES {
        normalized.insert(name.to_string(), NEUTRAL);
    }
    normalized
}
