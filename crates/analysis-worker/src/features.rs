//! Per-game numeric features and their player-level aggregation.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use chess_core::PlayerColor;
use serde::{Deserialize, Serialize};

use crate::analyzer::{mean, MoveAnalysis};
use crate::phase::GamePhase;

/// Clock (seconds) under which a move counts as played in time pressure
pub const TIME_PRESSURE_SECONDS: f64 = 60.0;

/// Numeric features extracted from a single analyzed game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameFeatures {
    // Accuracy
    pub avg_centipawn_loss: f64,
    pub acpl_opening: f64,
    pub acpl_middlegame: f64,
    pub acpl_endgame: f64,
    pub blunder_rate: f64,

    // Aggression
    pub capture_rate: f64,
    pub check_frequency: f64,
    pub sacrifice_rate: f64,

    // Positional
    pub center_control: f64,
    pub piece_activity: f64,

    // Time management
    pub avg_think_time: f64,
    pub think_time_variance: f64,
    pub time_pressure_blunder_rate: f64,

    // Opening
    pub opening_repertoire_breadth: u32,
    pub book_deviation_move: u32,

    // Endgame
    pub endgame_frequency: f64,
    pub game_length: u32,

    // Results
    pub decisive_game_rate: f64,
}

/// Fields averaged into player-level features.
pub const AGGREGATED_FEATURES: [&str; 16] = [
    "avg_centipawn_loss",
    "acpl_opening",
    "acpl_middlegame",
    "acpl_endgame",
    "blunder_rate",
    "capture_rate",
    "check_frequency",
    "sacrifice_rate",
    "center_control",
    "piece_activity",
    "avg_think_time",
    "think_time_variance",
    "time_pressure_blunder_rate",
    "endgame_frequency",
    "game_length",
    "decisive_game_rate",
];

/// Expected (min, max) of each aggregated mean; anything missing uses (0, 1).
pub static FEATURE_RANGES: LazyLock<HashMap<&'static str, (f64, f64)>> = LazyLock::new(|| {
    HashMap::from([
        ("avg_centipawn_loss", (0.0, 200.0)),
        ("acpl_opening", (0.0, 200.0)),
        ("acpl_middlegame", (0.0, 200.0)),
        ("acpl_endgame", (0.0, 200.0)),
        ("blunder_rate", (0.0, 0.3)),
        ("capture_rate", (0.0, 0.5)),
        ("check_frequency", (0.0, 0.15)),
        ("sacrifice_rate", (0.0, 0.1)),
        ("center_control", (0.0, 4.0)),
        ("piece_activity", (0.0, 50.0)),
        ("avg_think_time", (0.0, 60.0)),
        ("think_time_variance", (0.0, 30.0)),
        ("time_pressure_blunder_rate", (0.0, 0.5)),
        ("endgame_frequency", (0.0, 1.0)),
        ("game_length", (0.0, 120.0)),
        ("decisive_game_rate", (0.0, 1.0)),
    ])
});

impl GameFeatures {
    /// Look up a feature by its field name.
    pub fn get(&self, name: &str) -> Option<f64> {
        let value = match name {
            "avg_centipawn_loss" => self.avg_centipawn_loss,
            "acpl_opening" => self.acpl_opening,
            "acpl_middlegame" => self.acpl_middlegame,
            "acpl_endgame" => self.acpl_endgame,
            "blunder_rate" => self.blunder_rate,
            "capture_rate" => self.capture_rate,
            "check_frequency" => self.check_frequency,
            "sacrifice_rate" => self.sacrifice_rate,
            "center_control" => self.center_control,
            "piece_activity" => self.piece_activity,
            "avg_think_time" => self.avg_think_time,
            "think_time_variance" => self.think_time_variance,
            "time_pressure_blunder_rate" => self.time_pressure_blunder_rate,
            "opening_repertoire_breadth" => f64::from(self.opening_repertoire_breadth),
            "book_deviation_move" => f64::from(self.book_deviation_move),
            "endgame_frequency" => self.endgame_frequency,
            "game_length" => f64::from(self.game_length),
            "decisive_game_rate" => self.decisive_game_rate,
            _ => return None,
        };
        Some(value)
    }
}

/// Sample standard deviation; 0 for fewer than two values.
pub fn sample_stdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let avg = values.iter().sum::<f64>() / n;
    let sum_sq: f64 = values.iter().map(|v| (v - avg).powi(2)).sum();
    (sum_sq / (n - 1.0)).sqrt()
}

/// Positive drops between consecutive clock readings. Increments and
/// unchanged clocks are discarded.
pub fn think_time_deltas(clocks: &[f64]) -> Vec<f64> {
    clocks
        .windows(2)
        .map(|pair| pair[0] - pair[1])
        .filter(|delta| *delta > 0.0)
        .collect()
}

/// Notation-level capture test.
pub fn is_capture(san: &str) -> bool {
    san.contains('x')
}

/// Notation-level check test (mate counts as check).
pub fn is_check(san: &str) -> bool {
    san.contains('+') || san.contains('#')
}

/// Reduces one game's move evaluations to a `GameFeatures` vector.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Only the subject player's moves are considered. Sacrifice, positional,
    /// opening and result fields stay at their defaults here.
    pub fn extract(
        &self,
        move_evaluations: &[MoveAnalysis],
        player_color: PlayerColor,
        total_moves: u32,
    ) -> GameFeatures {
        let mut features = GameFeatures {
            game_length: total_moves,
            ..Default::default()
        };

        let mut player_losses: Vec<i32> = Vec::new();
        let mut opening_losses: Vec<i32> = Vec::new();
        let mut middlegame_losses: Vec<i32> = Vec::new();
        let mut endgame_losses: Vec<i32> = Vec::new();
        let mut clocks: Vec<f64> = Vec::new();
        let mut captures = 0u32;
        let mut checks = 0u32;
        let mut blunders = 0u32;
        let mut time_pressure_moves = 0u32;
        let mut time_pressure_blunders = 0u32;

        for ev in move_evaluations
            .iter()
            .filter(|ev| player_color.owns_move(ev.is_white))
        {
            player_losses.push(ev.centipawn_loss);
            match ev.game_phase {
                GamePhase::Opening => opening_losses.push(ev.centipawn_loss),
                GamePhase::Middlegame => middlegame_losses.push(ev.centipawn_loss),
                GamePhase::Endgame => endgame_losses.push(ev.centipawn_loss),
            }

            let is_blunder = ev.classification.is_error();
            if is_blunder {
                blunders += 1;
            }
            if is_capture(&ev.san) {
                captures += 1;
            }
            if is_check(&ev.san) {
                checks += 1;
            }

            if let Some(clock) = ev.clock_seconds {
                clocks.push(clock);
                if clock < TIME_PRESSURE_SECONDS {
                    time_pressure_moves += 1;
                    if is_blunder {
                        time_pressure_blunders += 1;
                    }
                }
            }
        }

        let player_moves = player_losses.len();
        if player_moves == 0 {
            return features;
        }
        let player_moves = player_moves as f64;

        features.avg_centipawn_loss = mean(&player_losses);
        features.acpl_opening = mean(&opening_losses);
        features.acpl_middlegame = mean(&middlegame_losses);
        features.acpl_endgame = mean(&endgame_losses);
        features.blunder_rate = f64::from(blunders) / player_moves;
        features.capture_rate = f64::from(captures) / player_moves;
        features.check_frequency = f64::from(checks) / player_moves;
        features.endgame_frequency = if endgame_losses.is_empty() { 0.0 } else { 1.0 };

        let deltas = think_time_deltas(&clocks);
        if !deltas.is_empty() {
            features.avg_think_time = deltas.iter().sum::<f64>() / deltas.len() as f64;
            features.think_time_variance = sample_stdev(&deltas);
        }

        features.time_pressure_blunder_rate =
            f64::from(time_pressure_blunders) / f64::from(time_pressure_moves.max(1));

        features
    }
}

/// Player-level means of per-game features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedFeatures {
    pub means: BTreeMap<String, f64>,
}

impl AggregatedFeatures {
    /// Average every aggregated field across games. An empty input gives an
    /// empty set of means.
    pub fn from_games(games: &[GameFeatures]) -> Self {
        let mut agg = Self::default();
        if games.is_empty() {
            return agg;
        }

        for name in AGGREGATED_FEATURES {
            let values: Vec<f64> = games.iter().filter_map(|g| g.get(name)).collect();
            let value = if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            };
            agg.means.insert(name.to_string(), value);
        }
        agg
    }

    /// Project every mean into [0, 1] using `FEATURE_RANGES`, clamping
    /// values outside the expected range.
    pub fn to_normalized(&self) -> BTreeMap<String, f64> {
        self.means
            .iter()
            .map(|(name, &value)| {
                let (min, max) = FEATURE_RANGES
                    .get(name.as_str())
                    .copied()
                    .unwrap_or((0.0, 1.0));
                let normalized = if max > min {
                    ((value - min) / (max - min)).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                (name.clone(), normalized)
            })
            .collect()
    }
}
