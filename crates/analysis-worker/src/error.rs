//! Worker error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Evaluator error: {0}")]
    Evaluator(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Stockfish error: {0}")]
    Stockfish(String),

    #[error("Invalid FEN {fen}: {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("Opening book error: {0}")]
    Book(String),

    #[error("PGN error: {0}")]
    Pgn(#[from] chess_core::PgnError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
