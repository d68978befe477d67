//! Position evaluation oracle contract and the remote HTTP adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::WorkerError;

/// Score assigned to forced-mate positions (sign = winning side)
pub const MATE_SCORE: i32 = 10_000;

/// Maximum depth accepted by chess-api.com
const CHESS_API_MAX_DEPTH: u32 = 18;

/// Result of a single position evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineEval {
    /// Centipawns from white's perspective
    pub score_cp: i32,
    pub best_move_uci: String,
    pub best_move_san: String,
    /// Mate in N (positive = white mates)
    pub mate_in: Option<i32>,
    pub principal_variation: Vec<String>,
    pub depth: u32,
}

/// Anything that can score a FEN. Transport failures must be returned as
/// errors, never replaced with a default evaluation.
#[async_trait]
pub trait PositionEvaluator: Send + Sync {
    async fn evaluate(&self, fen: &str, depth: u32) -> Result<EngineEval, WorkerError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChessApiRequest<'a> {
    fen: &'a str,
    depth: u32,
    max_thinking_time: u32,
    variants: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChessApiResponse {
    /// Evaluation in pawns
    #[serde(default)]
    eval: f64,
    #[serde(default)]
    mate: Option<i32>,
    #[serde(default, rename = "move")]
    best_move: String,
    #[serde(default)]
    san: String,
    #[serde(default)]
    continuation_arr: Vec<String>,
    #[serde(default)]
    depth: Option<u32>,
}

impl ChessApiResponse {
    fn into_eval(self, requested_depth: u32) -> EngineEval {
        let score_cp = match self.mate {
            Some(m) if m > 0 => MATE_SCORE,
            Some(_) => -MATE_SCORE,
            None => (self.eval * 100.0) as i32,
        };

        EngineEval {
            score_cp,
            best_move_uci: self.best_move,
            best_move_san: self.san,
            mate_in: self.mate,
            principal_variation: self.continuation_arr,
            depth: self.depth.unwrap_or(requested_depth),
        }
    }
}

/// Cloud Stockfish via the chess-api.com JSON endpoint.
pub struct ChessApiEvaluator {
    client: Client,
    url: String,
}

impl ChessApiEvaluator {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, WorkerError> {
        let client = Client::builder()
            .user_agent("ChessLens/1.0")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl PositionEvaluator for ChessApiEvaluator {
    async fn evaluate(&self, fen: &str, depth: u32) -> Result<EngineEval, WorkerError> {
        let request = ChessApiRequest {
            fen,
            depth: depth.min(CHESS_API_MAX_DEPTH),
            max_thinking_time: 100,
            variants: 1,
        };

        debug!(fen, depth = request.depth, "chess-api <");

        let resp = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| WorkerError::Evaluator(format!("Request error: {e}")))?;

        if !resp.status().is_success() {
            return Err(WorkerError::Evaluator(format!("HTTP {}", resp.status())));
        }

        let data: ChessApiResponse = resp
            .json()
            .await
            .map_err(|e| WorkerError::Evaluator(format!("Response parse error: {e}")))?;

        Ok(data.into_eval(depth))
    }
}
