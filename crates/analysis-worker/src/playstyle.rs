//! Playstyle archetype scoring over normalized features.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Value assumed for a feature missing from the input
const MISSING_FEATURE: f64 = 0.5;

pub struct Archetype {
    pub name: &'static str,
    pub description: &'static str,
    /// Negative weights mean "lower is more characteristic"
    pub weights: &'static [(&'static str, f64)],
}

/// Scored in table order; ties keep this order.
pub static ARCHETYPES: LazyLock<Vec<Archetype>> = LazyLock::new(|| {
    vec![
        Archetype {
            name: "The Attacker",
            description: "Aggressive player who seeks initiative through captures, checks, and sacrifices",
            weights: &[
                ("capture_rate", 0.3),
                ("check_frequency", 0.2),
                ("sacrifice_rate", 0.2),
                ("avg_think_time", -0.15),
                ("decisive_game_rate", 0.15),
            ],
        },
        Archetype {
            name: "The Defender",
            description: "Solid player who prioritizes safety and accuracy over aggression",
            weights: &[
                ("avg_centipawn_loss", -0.35),
                ("blunder_rate", -0.3),
                ("capture_rate", -0.15),
                ("decisive_game_rate", -0.2),
            ],
        },
        Archetype {
            name: "The Positional Player",
            description: "Strategic player who builds advantages through center control and piece placement",
            weights: &[
                ("center_control", 0.3),
                ("piece_activity", 0.25),
                ("endgame_frequency", 0.2),
                ("avg_centipawn_loss", -0.25),
            ],
        },
        Archetype {
            name: "The Speedster",
            description: "Fast, intuitive player who relies on pattern recognition but may rush",
            weights: &[
                ("avg_think_time", -0.35),
                ("think_time_variance", -0.2),
                ("time_pressure_blunder_rate", 0.25),
                ("blunder_rate", 0.2),
            ],
        },
        Archetype {
            name: "The Improviser",
            description: "Creative player with wide opening repertoire but inconsistent results",
            weights: &[
                ("think_time_variance", 0.3),
                ("sacrifice_rate", 0.25),
                ("capture_rate", 0.2),
                ("avg_centipawn_loss", 0.15),
            ],
        },
        Archetype {
            name: "The Grinder",
            description: "Patient player who wins through endgame technique and attrition",
            weights: &[
                ("game_length", 0.3),
                ("endgame_frequency", 0.3),
                ("acpl_endgame", -0.2),
                ("decisive_game_rate", 0.2),
            ],
        },
    ]
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarAxis {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaystyleResult {
    pub primary_archetype: String,
    pub secondary_archetype: String,
    /// Percentage per archetype, summing to 100
    pub archetype_scores: BTreeMap<String, f64>,
    pub radar_chart: Vec<RadarAxis>,
    pub description: String,
}

fn feature(features: &BTreeMap<String, f64>, name: &str) -> f64 {
    features.get(name).copied().unwrap_or(MISSING_FEATURE)
}

/// Weighted score of one archetype.
pub fn archetype_score(archetype: &Archetype, features: &BTreeMap<String, f64>) -> f64 {
    archetype
        .weights
        .iter()
        .map(|&(name, weight)| {
            let value = feature(features, name);
            if weight < 0.0 {
                weight.abs() * (1.0 - value)
            } else {
                weight * value
            }
        })
        .sum()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PlaystyleClassifier;

impl PlaystyleClassifier {
    pub fn classify(&self, features: &BTreeMap<String, f64>) -> PlaystyleResult {
        let scores: Vec<(&Archetype, f64)> = ARCHETYPES
            .iter()
            .map(|a| (a, archetype_score(a, features)))
            .collect();

        let raw: Vec<f64> = scores.iter().map(|(_, s)| *s).collect();
        let archetype_scores = scores
            .iter()
            .zip(to_percentages(&raw))
            .map(|((a, _), pct)| (a.name.to_string(), pct))
            .collect();

        // Stable sort keeps table order among equal scores
        let mut ranked = scores.clone();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        let primary = ranked[0].0;
        let secondary = ranked[1].0;

        PlaystyleResult {
            primary_archetype: primary.name.to_string(),
            secondary_archetype: secondary.name.to_string(),
            archetype_scores,
            radar_chart: build_radar(features),
            description: primary.description.to_string(),
        }
    }
}

/// Share of the total per score, or an even split when every score is zero.
pub fn to_percentages(scores: &[f64]) -> Vec<f64> {
    let total: f64 = scores.iter().sum();
    scores
        .iter()
        .map(|score| {
            if total > 0.0 {
                score / total * 100.0
            } else {
                100.0 / scores.len() as f64
            }
        })
        .collect()
}

/// Six display axes on a 0-100 scale.
pub fn build_radar(features: &BTreeMap<String, f64>) -> Vec<RadarAxis> {
    let avg = |names: &[&str]| -> f64 {
        let sum: f64 = names.iter().map(|n| feature(features, n)).sum();
        sum / names.len() as f64 * 100.0
    };
    let inverted = |name: &str| (1.0 - feature(features, name)) * 100.0;

    [
        ("Aggression", avg(&["capture_rate", "check_frequency", "sacrifice_rate"])),
        ("Accuracy", inverted("avg_centipawn_loss")),
        ("Positional", avg(&["center_control", "piece_activity"])),
        ("Endgame", avg(&["endgame_frequency", "acpl_endgame"])),
        ("Speed", inverted("avg_think_time")),
        ("Creativity", avg(&["sacrifice_rate", "think_time_variance"])),
    ]
    .into_iter()
    .map(|(label, value)| RadarAxis {
        label: label.to_string(),
        value,
    })
    .collect()
}
