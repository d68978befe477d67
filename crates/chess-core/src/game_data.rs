use serde::{Deserialize, Serialize};

/// Which side a player had in a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    White,
    Black,
}

impl PlayerColor {
    pub fn is_white(self) -> bool {
        self == PlayerColor::White
    }

    /// True if a move made by `is_white_move` side belongs to this player.
    pub fn owns_move(self, is_white_move: bool) -> bool {
        self.is_white() == is_white_move
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlayerColor::White => "white",
            PlayerColor::Black => "black",
        }
    }
}

/// Game outcome from one player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerResult {
    Win,
    Draw,
    Loss,
}

impl PlayerResult {
    /// Map a result label. Only "win" and "loss" are distinguished, everything
    /// else counts as a draw.
    pub fn from_label(label: &str) -> Self {
        match label {
            "win" => PlayerResult::Win,
            "loss" => PlayerResult::Loss,
            _ => PlayerResult::Draw,
        }
    }

    pub fn is_decisive(self) -> bool {
        self != PlayerResult::Draw
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameMetadata {
    pub white: String,
    pub black: String,
    pub result: String, // "1-0", "0-1", "1/2-1/2", "*"
    pub white_elo: Option<i32>,
    pub black_elo: Option<i32>,
    pub date: Option<String>,
    pub time_control: Option<String>,
    pub eco: Option<String>,
    pub opening_name: Option<String>,
    pub event: Option<String>,
    pub link: Option<String>,
}

impl GameMetadata {
    /// Player color by username; anything that isn't White is treated as Black.
    pub fn player_color(&self, username: &str) -> PlayerColor {
        if self.white.eq_ignore_ascii_case(username) {
            PlayerColor::White
        } else {
            PlayerColor::Black
        }
    }

    pub fn player_result(&self, color: PlayerColor) -> PlayerResult {
        match (self.result.as_str(), color) {
            ("1-0", PlayerColor::White) | ("0-1", PlayerColor::Black) => PlayerResult::Win,
            ("1-0", PlayerColor::Black) | ("0-1", PlayerColor::White) => PlayerResult::Loss,
            _ => PlayerResult::Draw,
        }
    }

    pub fn opponent(&self, color: PlayerColor) -> &str {
        match color {
            PlayerColor::White => &self.black,
            PlayerColor::Black => &self.white,
        }
    }
}

/// One half-move as read from a game record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedMove {
    /// Half-move index, 0-based.
    pub ply: u32,
    /// Full move number, 1-based.
    pub move_number: u32,
    pub is_white: bool,
    pub san: String,
    pub uci: String,
    pub fen_before: String,
    pub fen_after: String,
    /// Remaining clock in seconds after the move, if annotated.
    pub clock_seconds: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedGame {
    pub metadata: GameMetadata,
    pub moves: Vec<ParsedMove>,
    pub pgn: String,
}

impl ParsedGame {
    /// Number of half-moves played.
    pub fn total_moves(&self) -> usize {
        self.moves.len()
    }
}
