//! Game phase classification from material on the board and move number.

use serde::{Deserialize, Serialize};
use shakmaty::{Board, Role};

use crate::error::WorkerError;

/// Last full move that can still count as opening
const OPENING_MAX_MOVE: u32 = 12;

/// Minimum total material (both sides) for the opening
const OPENING_MIN_MATERIAL: u32 = 60;

/// Total material at or below which the position is an endgame
const ENDGAME_MAX_MATERIAL: u32 = 26;

const PIECE_VALUES: [(Role, u32); 5] = [
    (Role::Pawn, 1),
    (Role::Knight, 3),
    (Role::Bishop, 3),
    (Role::Rook, 5),
    (Role::Queen, 9),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Opening,
    Middlegame,
    Endgame,
}

impl GamePhase {
    pub const ALL: [GamePhase; 3] = [GamePhase::Opening, GamePhase::Middlegame, GamePhase::Endgame];

    pub fn as_str(self) -> &'static str {
        match self {
            GamePhase::Opening => "opening",
            GamePhase::Middlegame => "middlegame",
            GamePhase::Endgame => "endgame",
        }
    }
}

/// Total material of both sides, kings excluded (78 at the start).
pub fn total_material(board: &Board) -> u32 {
    PIECE_VALUES
        .iter()
        .map(|&(role, value)| board.by_role(role).count() as u32 * value)
        .sum()
}

/// Opening is checked first, then endgame; everything else is middlegame.
pub fn classify_phase(material: u32, move_number: u32) -> GamePhase {
    if move_number <= OPENING_MAX_MOVE && material >= OPENING_MIN_MATERIAL {
        GamePhase::Opening
    } else if material <= ENDGAME_MAX_MATERIAL {
        GamePhase::Endgame
    } else {
        GamePhase::Middlegame
    }
}

/// Classify the phase of the position described by `fen`.
pub fn classify_fen(fen: &str, move_number: u32) -> Result<GamePhase, WorkerError> {
    let placement = fen.split_whitespace().next().unwrap_or("");
    let board: Board = placement.parse().map_err(|e| WorkerError::InvalidFen {
        fen: fen.to_string(),
        reason: format!("{e}"),
    })?;
    Ok(classify_phase(total_material(&board), move_number))
}
