//! Opening book frequency lookup: the contract and the Lichess explorer adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::WorkerError;

/// One book move with per-outcome game counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerMove {
    #[serde(default)]
    pub san: String,
    pub uci: String,
    #[serde(default)]
    pub white: u64,
    #[serde(default)]
    pub draws: u64,
    #[serde(default)]
    pub black: u64,
}

impl ExplorerMove {
    pub fn total_games(&self) -> u64 {
        self.white + self.draws + self.black
    }
}

/// Book frequency table per position. An empty table means "no data" and is
/// not an error.
#[async_trait]
pub trait BookExplorer: Send + Sync {
    async fn book_moves(&self, fen: &str) -> Result<Vec<ExplorerMove>, WorkerError>;
}

#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    #[serde(default)]
    moves: Vec<ExplorerMove>,
}

/// The public Lichess opening explorer
pub struct LichessExplorer {
    client: Client,
    base_url: String,
    ratings: String,
    speeds: String,
}

impl LichessExplorer {
    pub fn new(
        base_url: &str,
        ratings: &str,
        speeds: &str,
        timeout: Duration,
    ) -> Result<Self, WorkerError> {
        let client = Client::builder()
            .user_agent("ChessLens/1.0")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            ratings: ratings.to_string(),
            speeds: speeds.to_string(),
        })
    }
}

#[async_trait]
impl BookExplorer for LichessExplorer {
    async fn book_moves(&self, fen: &str) -> Result<Vec<ExplorerMove>, WorkerError> {
        debug!(fen, "explorer <");

        let resp = self
            .client
            .get(format!("{}/lichess", self.base_url))
            .query(&[
                ("variant", "standard"),
                ("fen", fen),
                ("ratings", self.ratings.as_str()),
                ("speeds", self.speeds.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let data: ExplorerResponse = resp.json().await?;
        Ok(data.moves)
    }
}
