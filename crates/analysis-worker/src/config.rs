//! Worker configuration from environment variables

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::WorkerError;

/// Which position oracle the pipeline talks to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvaluatorKind {
    /// Remote Stockfish over HTTP (chess-api.com compatible)
    ChessApi,
    /// Local UCI engine process
    Stockfish,
}

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub evaluator: EvaluatorKind,

    /// Remote evaluator endpoint
    pub chess_api_url: String,

    /// Path to Stockfish binary
    pub stockfish_path: String,

    /// Search depth hint per position
    pub eval_depth: u32,

    /// Pause after every oracle call
    pub request_delay: Duration,

    /// Lichess opening explorer base URL
    pub explorer_url: String,

    pub explorer_ratings: String,

    pub explorer_speeds: String,

    /// Local bincode opening book; replaces the remote explorer when set
    pub book_file_path: Option<String>,

    /// Games analyzed at the same time (moves within a game are always sequential)
    pub max_concurrent_games: usize,

    pub http_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            evaluator: EvaluatorKind::ChessApi,
            chess_api_url: "https://chess-api.com/v1".to_string(),
            stockfish_path: "/usr/bin/stockfish".to_string(),
            eval_depth: 16,
            request_delay: Duration::from_millis(50),
            explorer_url: "https://explorer.lichess.ovh".to_string(),
            explorer_ratings: "800,1000,1200,1400".to_string(),
            explorer_speeds: "rapid,classical".to_string(),
            book_file_path: None,
            max_concurrent_games: 1,
            http_timeout: Duration::from_secs(30),
        }
    }
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, WorkerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup (environment, map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WorkerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let evaluator = match lookup("EVALUATOR").as_deref() {
            None | Some("chess-api") => EvaluatorKind::ChessApi,
            Some("stockfish") => EvaluatorKind::Stockfish,
            Some(other) => {
                return Err(WorkerError::Config(format!(
                    "EVALUATOR must be 'chess-api' or 'stockfish', got '{other}'"
                )))
            }
        };

        let eval_depth = parse_var(&lookup, "EVAL_DEPTH")?.unwrap_or(defaults.eval_depth);
        let request_delay = parse_var::<u64, _>(&lookup, "REQUEST_DELAY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.request_delay);
        let max_concurrent_games = parse_var(&lookup, "MAX_CONCURRENT_GAMES")?
            .unwrap_or(defaults.max_concurrent_games);
        if max_concurrent_games == 0 {
            return Err(WorkerError::Config(
                "MAX_CONCURRENT_GAMES must be at least 1".to_string(),
            ));
        }
        let http_timeout = parse_var::<u64, _>(&lookup, "HTTP_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.http_timeout);

        Ok(Self {
            evaluator,
            chess_api_url: lookup("CHESS_API_URL").unwrap_or(defaults.chess_api_url),
            stockfish_path: lookup("STOCKFISH_PATH").unwrap_or(defaults.stockfish_path),
            eval_depth,
            request_delay,
            explorer_url: lookup("LICHESS_EXPLORER_URL").unwrap_or(defaults.explorer_url),
            explorer_ratings: lookup("EXPLORER_RATINGS").unwrap_or(defaults.explorer_ratings),
            explorer_speeds: lookup("EXPLORER_SPEEDS").unwrap_or(defaults.explorer_speeds),
            book_file_path: lookup("BOOK_FILE_PATH").filter(|p| !p.is_empty()),
            max_concurrent_games,
            http_timeout,
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, WorkerError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| WorkerError::Config(format!("{key} has invalid value '{raw}'"))),
    }
}
