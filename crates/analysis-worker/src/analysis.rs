//! Move quality classification and centipawn-loss arithmetic
//! (No Board/Engine/Game dependencies)

use serde::{Deserialize, Serialize};

/// Classification thresholds (centipawn loss, inclusive upper bounds)
const THRESHOLD_GOOD: i32 = 10;
const THRESHOLD_INACCURACY: i32 = 50;
const THRESHOLD_MISTAKE: i32 = 100;

/// Maximum CP loss to cap at
pub const MAX_CP_LOSS: i32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveClassification {
    /// Reserved, never assigned by `classify_move`
    Brilliant,
    Good,
    /// Reserved, never assigned by `classify_move`
    Book,
    Inaccuracy,
    Mistake,
    Blunder,
}

impl MoveClassification {
    /// Blunders and mistakes both count as "blunders" in rate statistics.
    pub fn is_error(self) -> bool {
        matches!(self, MoveClassification::Blunder | MoveClassification::Mistake)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MoveClassification::Brilliant => "brilliant",
            MoveClassification::Good => "good",
            MoveClassification::Book => "book",
            MoveClassification::Inaccuracy => "inaccuracy",
            MoveClassification::Mistake => "mistake",
            MoveClassification::Blunder => "blunder",
        }
    }
}

/// Centipawns lost by the mover, with scores given from white's perspective.
pub fn calculate_cp_loss(score_before: i32, score_after: i32, is_white: bool) -> i32 {
    let cp_loss = if is_white {
        score_before - score_after
    } else {
        (-score_before) - (-score_after)
    };

    cp_loss.clamp(0, MAX_CP_LOSS)
}

pub fn classify_move(cp_loss: i32) -> MoveClassification {
    if cp_loss <= THRESHOLD_GOOD {
        MoveClassification::Good
    } else if cp_loss <= THRESHOLD_INACCURACY {
        MoveClassification::Inaccuracy
    } else if cp_loss <= THRESHOLD_MISTAKE {
        MoveClassification::Mistake
    } else {
        MoveClassification::Blunder
    }
}

pub fn calculate_accuracy(acpl: f64, move_count: usize) -> f64 {
    if move_count == 0 {
        return 100.0;
    }
    let accuracy = 100.0 * (1.0 / (1.0 + acpl / 100.0)).sqrt();
    accuracy.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_move_boundaries() {
        assert_eq!(classify_move(0), MoveClassification::Good);
        assert_eq!(classify_move(10), MoveClassification::Good);
        assert_eq!(classify_move(11), MoveClassification::Inaccuracy);
        assert_eq!(classify_move(50), MoveClassification::Inaccuracy);
        assert_eq!(classify_move(51), MoveClassification::Mistake);
        assert_eq!(classify_move(100), MoveClassification::Mistake);
        assert_eq!(classify_move(101), MoveClassification::Blunder);
        assert_eq!(classify_move(1000), MoveClassification::Blunder);
    }

    #[test]
    fn test_classification_is_monotonic() {
        let mut previous = classify_move(0);
        for loss in 1..=1000 {
            let current = classify_move(loss);
            assert!(current >= previous, "severity dropped at {loss}");
            previous = current;
        }
    }

    #[test]
    fn test_cp_loss_calculation() {
        assert_eq!(calculate_cp_loss(100, 80, true), 20);
        assert_eq!(calculate_cp_loss(100, 120, true), 0);
        assert_eq!(calculate_cp_loss(100, 120, false), 20);
        assert_eq!(calculate_cp_loss(-50, -200, false), 0);
        assert_eq!(calculate_cp_loss(10, -890, true), 900);
    }

    #[test]
    fn test_cp_loss_is_capped() {
        assert_eq!(calculate_cp_loss(2500, -2500, true), MAX_CP_LOSS);
        assert_eq!(calculate_cp_loss(-10000, 10000, false), MAX_CP_LOSS);
    }

    #[test]
    fn test_calculate_accuracy() {
        assert!((calculate_accuracy(0.0, 20) - 100.0).abs() < 0.1);
        assert!((calculate_accuracy(25.0, 20) - 89.4).abs() < 1.0);
        assert!((calculate_accuracy(100.0, 20) - 70.7).abs() < 1.0);
        assert_eq!(calculate_accuracy(500.0, 0), 100.0);
    }

    #[test]
    fn test_error_classes() {
        assert!(MoveClassification::Blunder.is_error());
        assert!(MoveClassification::Mistake.is_error());
        assert!(!MoveClassification::Inaccuracy.is_error());
        assert!(!MoveClassification::Good.is_error());
    }
}
