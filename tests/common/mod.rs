#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use analysis_worker::config::WorkerConfig;
use analysis_worker::error::WorkerError;
use analysis_worker::evaluator::{EngineEval, PositionEvaluator};
use analysis_worker::explorer::{BookExplorer, ExplorerMove};
use async_trait::async_trait;
use chess_core::{parse_pgn, ParsedMove};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// alice (white) mates in four, with clocks.
pub const ALICE_WINS_WHITE: &str = r#"[Event "Live Chess"]
[White "alice"]
[Black "bob"]
[Result "1-0"]
[ECO "C20"]
[Opening "King's Pawn Game"]
[TimeControl "300"]

1. e4 {[%clk 0:05:00]} e5 {[%clk 0:05:00]} 2. Qh5 {[%clk 0:04:50]} Nc6 {[%clk 0:04:55]} 3. Bc4 {[%clk 0:04:40]} Nf6 {[%clk 0:04:45]} 4. Qxf7# {[%clk 0:04:20]} 1-0
"#;

/// alice (black) loses a short Queen's Gambit.
pub const ALICE_LOSES_BLACK: &str = r#"[Event "Live Chess"]
[White "carol"]
[Black "Alice"]
[Result "1-0"]
[ECO "D30"]
[Opening "Queen's Gambit Declined"]

1. d4 d5 2. c4 e6 3. Nc3 Nf6 1-0
"#;

pub fn moves_of(pgn: &str) -> Vec<ParsedMove> {
    parse_pgn(pgn).expect("fixture parses").moves
}

/// Config with no throttle so tests don't sleep.
pub fn test_config() -> WorkerConfig {
    WorkerConfig {
        request_delay: Duration::ZERO,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Scripted evaluator
// ---------------------------------------------------------------------------

/// Returns scripted white-perspective scores per FEN (0 for anything
/// unscripted) and records every call in order.
#[derive(Default)]
pub struct MockEvaluator {
    scores: HashMap<String, i32>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(mut self, fen: &str, cp: i32) -> Self {
        self.scores.insert(fen.to_string(), cp);
        self
    }

    pub fn fail_on(mut self, fen: &str) -> Self {
        self.failing.insert(fen.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PositionEvaluator for MockEvaluator {
    async fn evaluate(&self, fen: &str, depth: u32) -> Result<EngineEval, WorkerError> {
        self.calls.lock().unwrap().push(fen.to_string());
        if self.failing.contains(fen) {
            return Err(WorkerError::Evaluator("HTTP 503 Service Unavailable".into()));
        }
        Ok(EngineEval {
            score_cp: self.scores.get(fen).copied().unwrap_or(0),
            best_move_uci: "e2e4".into(),
            best_move_san: "e4".into(),
            mate_in: None,
            principal_variation: vec!["e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "a7a6", "b5a4"]
                .into_iter()
                .map(String::from)
                .collect(),
            depth,
        })
    }
}

// ---------------------------------------------------------------------------
// Scripted book explorer
// ---------------------------------------------------------------------------

pub fn book_move(san: &str, uci: &str, white: u64, draws: u64, black: u64) -> ExplorerMove {
    ExplorerMove {
        san: san.to_string(),
        uci: uci.to_string(),
        white,
        draws,
        black,
    }
}

/// Book tables per full FEN; unknown positions have no data.
#[derive(Default)]
pub struct MockExplorer {
    tables: HashMap<String, Vec<ExplorerMove>>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockExplorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, fen: &str, moves: Vec<ExplorerMove>) -> Self {
        self.tables.insert(fen.to_string(), moves);
        self
    }

    pub fn fail_on(mut self, fen: &str) -> Self {
        self.failing.insert(fen.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BookExplorer for MockExplorer {
    async fn book_moves(&self, fen: &str) -> Result<Vec<ExplorerMove>, WorkerError> {
        self.calls.lock().unwrap().push(fen.to_string());
        if self.failing.contains(fen) {
            return Err(WorkerError::Evaluator("explorer unavailable".into()));
        }
        Ok(self.tables.get(fen).cloned().unwrap_or_default())
    }
}
