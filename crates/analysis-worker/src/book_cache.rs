//! Local opening book loaded from a bincode file, usable in place of the
//! remote explorer.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shakmaty::{fen::Fen, san::San, CastlingMode, Chess};
use tracing::{debug, info};

use crate::error::WorkerError;
use crate::explorer::{BookExplorer, ExplorerMove};

/// Stats for a single book move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookMoveStats {
    pub games: i32,
    pub white_wins: i32,
    pub draws: i32,
    pub black_wins: i32,
}

/// The entire opening book: normalized FEN -> (move_san -> stats)
pub type OpeningBook = HashMap<String, HashMap<String, BookMoveStats>>;

pub struct LocalBook {
    book: OpeningBook,
}

impl LocalBook {
    pub fn new(book: OpeningBook) -> Self {
        Self { book }
    }

    /// Load the book from a binary file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, WorkerError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let book = Self::from_reader(BufReader::new(file))?;
        info!(
            path = %path.display(),
            positions = book.book.len(),
            moves = book.book.values().map(|m| m.len()).sum::<usize>(),
            "Loaded opening book"
        );
        Ok(book)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, WorkerError> {
        let book: OpeningBook =
            bincode::deserialize_from(reader).map_err(|e| WorkerError::Book(e.to_string()))?;
        Ok(Self::new(book))
    }

    pub fn is_empty(&self) -> bool {
        self.book.is_empty()
    }

    /// Book moves at `fen` with UCI filled in, most played first. Moves whose
    /// SAN is not legal in the position are dropped.
    pub fn lookup(&self, fen: &str) -> Result<Vec<ExplorerMove>, WorkerError> {
        let Some(entries) = self.book.get(&normalize_fen(fen)) else {
            return Ok(Vec::new());
        };

        let pos: Chess = fen
            .parse::<Fen>()
            .map_err(|e| invalid_fen(fen, e))?
            .into_position(CastlingMode::Standard)
            .map_err(|e| invalid_fen(fen, e))?;

        let mut moves: Vec<(i32, ExplorerMove)> = entries
            .iter()
            .filter_map(|(san, stats)| {
                let uci = san
                    .parse::<San>()
                    .ok()
                    .and_then(|s| s.to_move(&pos).ok())
                    .map(|m| m.to_uci(CastlingMode::Standard).to_string());
                let Some(uci) = uci else {
                    debug!(san = %san, fen, "Book move not legal here");
                    return None;
                };
                Some((
                    stats.games,
                    ExplorerMove {
                        san: san.clone(),
                        uci,
                        white: stats.white_wins.max(0) as u64,
                        draws: stats.draws.max(0) as u64,
                        black: stats.black_wins.max(0) as u64,
                    },
                ))
            })
            .collect();

        // SAN as tie-break so the order doesn't depend on hash iteration
        moves.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.san.cmp(&b.1.san)));
        Ok(moves.into_iter().map(|(_, m)| m).collect())
    }
}

fn invalid_fen(fen: &str, e: impl std::fmt::Display) -> WorkerError {
    WorkerError::InvalidFen {
        fen: fen.to_string(),
        reason: e.to_string(),
    }
}

#[async_trait]
impl BookExplorer for LocalBook {
    async fn book_moves(&self, fen: &str) -> Result<Vec<ExplorerMove>, WorkerError> {
        self.lookup(fen)
    }
}

/// Strips move counters from FEN, keeping only position + side + castling + ep.
pub fn normalize_fen(fen: &str) -> String {
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}
