//! Stockfish engine wrapper using UCI protocol (async I/O)

use async_trait::async_trait;
use shakmaty::{fen::Fen, san::San, uci::UciMove, CastlingMode, Chess};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::WorkerError;
use crate::evaluator::{EngineEval, PositionEvaluator, MATE_SCORE};

/// Raw search result, scores from the side to move
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    pub cp: Option<i32>,
    pub mate: Option<i32>,
    pub depth: u32,
    pub pv: Vec<String>,
    pub best_move: String,
}

/// Stockfish engine instance
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process and initialize UCI
    pub async fn new(path: &str) -> Result<Self, WorkerError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| WorkerError::Stockfish(format!("Failed to spawn Stockfish: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| WorkerError::Stockfish("Stockfish stdin unavailable".into()))?;
        let stdout = process
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| WorkerError::Stockfish("Stockfish stdout unavailable".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout,
        };

        engine.send("uci").await?;
        engine.wait_for("uciok").await?;

        engine.send("setoption name Threads value 1").await?;
        engine.send("setoption name Hash value 256").await?;
        engine.send("setoption name UCI_AnalyseMode value true").await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        Ok(engine)
    }

    async fn send(&mut self, cmd: &str) -> Result<(), WorkerError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| WorkerError::Stockfish(format!("Failed to write to Stockfish: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| WorkerError::Stockfish(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    async fn read_line(&mut self, line: &mut String) -> Result<(), WorkerError> {
        line.clear();
        let read = self
            .stdout
            .read_line(line)
            .await
            .map_err(|e| WorkerError::Stockfish(format!("Failed to read from Stockfish: {e}")))?;
        if read == 0 {
            return Err(WorkerError::Stockfish("Stockfish closed its output".into()));
        }
        Ok(())
    }

    async fn wait_for(&mut self, expected: &str) -> Result<(), WorkerError> {
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();
            debug!(line = trimmed, "SF >");
            if trimmed == expected {
                return Ok(());
            }
        }
    }

    /// Search a position to a fixed depth
    pub async fn search(&mut self, fen: &str, depth: u32) -> Result<SearchResult, WorkerError> {
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go depth {depth}")).await?;

        let mut result = SearchResult::default();
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();

            if let Some(best) = parse_bestmove(trimmed) {
                result.best_move = best;
                break;
            }
            apply_info_line(&mut result, trimmed);
        }

        Ok(result)
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

/// A single engine process shared behind a lock; one search at a time.
pub struct UciEvaluator {
    engine: Mutex<StockfishEngine>,
}

impl UciEvaluator {
    pub async fn spawn(path: &str) -> Result<Self, WorkerError> {
        Ok(Self {
            engine: Mutex::new(StockfishEngine::new(path).await?),
        })
    }

    pub async fn quit(&self) {
        self.engine.lock().await.quit().await;
    }
}

#[async_trait]
impl PositionEvaluator for UciEvaluator {
    async fn evaluate(&self, fen: &str, depth: u32) -> Result<EngineEval, WorkerError> {
        let result = self.engine.lock().await.search(fen, depth).await?;
        let white_to_move = fen.split_whitespace().nth(1) != Some("b");
        let best_move_san = uci_to_san(fen, &result.best_move).unwrap_or_default();

        Ok(EngineEval {
            score_cp: eval_to_white_cp(result.cp, result.mate, white_to_move),
            best_move_uci: result.best_move,
            best_move_san,
            mate_in: result
                .mate
                .map(|m| if white_to_move { m } else { -m }),
            principal_variation: result.pv,
            depth: result.depth,
        })
    }
}

/// Convert a side-to-move score to centipawns from white's perspective
pub fn eval_to_white_cp(cp: Option<i32>, mate: Option<i32>, is_white_to_move: bool) -> i32 {
    let score = match (mate, cp) {
        (Some(m), _) if m > 0 => MATE_SCORE,
        (Some(_), _) => -MATE_SCORE,
        (None, Some(c)) => c,
        (None, None) => 0,
    };
    if is_white_to_move {
        score
    } else {
        -score
    }
}

fn uci_to_san(fen: &str, uci: &str) -> Option<String> {
    let pos: Chess = fen
        .parse::<Fen>()
        .ok()?
        .into_position(CastlingMode::Standard)
        .ok()?;
    let uci_move: UciMove = uci.parse().ok()?;
    let legal_move = uci_move.to_move(&pos).ok()?;
    Some(San::from_move(&pos, legal_move).to_string())
}

/// Scores are taken from any info line carrying one. A position with no legal
/// moves gets a single `score mate 0` (or `cp 0` for stalemate) and no PV.
fn apply_info_line(result: &mut SearchResult, line: &str) {
    if !line.starts_with("info") || !line.contains(" score ") {
        return;
    }
    if let Some(cp) = parse_token_after(line, "cp") {
        result.cp = Some(cp);
        result.mate = None;
    }
    if let Some(mate) = parse_token_after(line, "mate") {
        result.mate = Some(mate);
        result.cp = None;
    }
    if let Some(depth) = parse_token_after(line, "depth") {
        result.depth = depth;
    }
    if line.contains(" pv ") {
        result.pv = parse_pv(line);
    }
}

fn parse_bestmove(line: &str) -> Option<String> {
    let mut parts = line.split_whitespace();
    if parts.next() != Some("bestmove") {
        return None;
    }
    match parts.next() {
        // No legal moves
        Some("(none)") | None => Some(String::new()),
        Some(best) => Some(best.to_string()),
    }
}

/// Parse the value following `key` in an info line
fn parse_token_after<T: std::str::FromStr>(line: &str, key: &str) -> Option<T> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    parts
        .iter()
        .position(|part| *part == key)
        .and_then(|i| parts.get(i + 1))
        .and_then(|value| value.parse().ok())
}

/// Parse PV moves from info line
fn parse_pv(line: &str) -> Vec<String> {
    line.split_whitespace()
        .skip_while(|part| *part != "pv")
        .skip(1)
        .take_while(|part| !part.starts_with("bmc") && *part != "string")
        .map(String::from)
        .collect()
}
