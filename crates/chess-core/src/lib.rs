//! Game records shared by the analysis crates: typed PGN metadata and
//! half-move records with positions, notation and clocks.

pub mod game_data;
pub mod pgn;

pub use game_data::{GameMetadata, ParsedGame, ParsedMove, PlayerColor, PlayerResult};
pub use pgn::{parse_pgn, split_games, PgnError};
