//! Batch analysis of a player's games
//!
//! Reads PGN files, runs engine analysis (or the engine-free fallback) and
//! writes a JSON player report.

use std::path::PathBuf;

use anyhow::{bail, Context};
use tracing::{info, warn};

use analysis_worker::book_cache::LocalBook;
use analysis_worker::config::{EvaluatorKind, WorkerConfig};
use analysis_worker::evaluator::{ChessApiEvaluator, PositionEvaluator};
use analysis_worker::explorer::{BookExplorer, LichessExplorer};
use analysis_worker::report::{PlayerGame, ReportBuilder};
use analysis_worker::stockfish::UciEvaluator;
use chess_core::{parse_pgn, split_games};

const USAGE: &str = "usage: analysis-worker --username NAME --pgn GLOB [--engine-free] [--book-deviations] [--out FILE]";

#[derive(Debug, Default)]
struct Args {
    username: String,
    pgn_glob: String,
    engine_free: bool,
    book_deviations: bool,
    out: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--username" => args.username = iter.next().context(USAGE)?,
            "--pgn" => args.pgn_glob = iter.next().context(USAGE)?,
            "--out" => args.out = Some(PathBuf::from(iter.next().context(USAGE)?)),
            "--engine-free" => args.engine_free = true,
            "--book-deviations" => args.book_deviations = true,
            other => bail!("unknown argument '{other}'\n{USAGE}"),
        }
    }
    if args.username.is_empty() || args.pgn_glob.is_empty() {
        bail!(USAGE);
    }
    Ok(args)
}

/// Read every game in the files matching `pattern`. Unparsable games are
/// skipped with a warning.
fn load_games(pattern: &str, username: &str) -> anyhow::Result<Vec<PlayerGame>> {
    let mut games = Vec::new();
    let mut skipped = 0usize;

    for entry in glob::glob(pattern).with_context(|| format!("invalid glob '{pattern}'"))? {
        let path = entry?;
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        for (i, pgn) in split_games(&text).iter().enumerate() {
            match parse_pgn(pgn) {
                Ok(game) => games.push(PlayerGame::new(games.len(), game, username)),
                Err(e) => {
                    warn!(file = %path.display(), index = i, error = %e, "Skipping game");
                    skipped += 1;
                }
            }
        }
    }

    info!(loaded = games.len(), skipped, "Games loaded");
    Ok(games)
}

enum Oracle {
    Remote(ChessApiEvaluator),
    Local(UciEvaluator),
}

impl Oracle {
    async fn connect(config: &WorkerConfig) -> anyhow::Result<Self> {
        Ok(match config.evaluator {
            EvaluatorKind::ChessApi => {
                info!(url = %config.chess_api_url, "Using remote evaluator");
                Oracle::Remote(ChessApiEvaluator::new(&config.chess_api_url, config.http_timeout)?)
            }
            EvaluatorKind::Stockfish => {
                info!(path = %config.stockfish_path, "Starting Stockfish");
                Oracle::Local(UciEvaluator::spawn(&config.stockfish_path).await?)
            }
        })
    }

    fn evaluator(&self) -> &dyn PositionEvaluator {
        match self {
            Oracle::Remote(e) => e,
            Oracle::Local(e) => e,
        }
    }

    async fn shutdown(&self) {
        if let Oracle::Local(engine) = self {
            engine.quit().await;
        }
    }
}

fn book_explorer(config: &WorkerConfig) -> anyhow::Result<Box<dyn BookExplorer>> {
    let explorer: Box<dyn BookExplorer> = match &config.book_file_path {
        Some(path) => Box::new(LocalBook::load(path)?),
        None => Box::new(LichessExplorer::new(
            &config.explorer_url,
            &config.explorer_ratings,
            &config.explorer_speeds,
            config.http_timeout,
        )?),
    };
    Ok(explorer)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let args = parse_args()?;
    let config = WorkerConfig::load()?;
    info!(
        evaluator = ?config.evaluator,
        depth = config.eval_depth,
        concurrency = config.max_concurrent_games,
        "Worker config loaded"
    );

    let games = load_games(&args.pgn_glob, &args.username)?;

    let oracle = if args.engine_free {
        None
    } else {
        Some(Oracle::connect(&config).await?)
    };
    let explorer = if args.book_deviations {
        Some(book_explorer(&config)?)
    } else {
        None
    };

    let mut builder = ReportBuilder::new(&config);
    if let Some(oracle) = &oracle {
        builder = builder.with_evaluator(oracle.evaluator());
    }
    if let Some(explorer) = &explorer {
        builder = builder.with_explorer(&**explorer);
    }

    let report = builder.build(&args.username, &games).await;

    if let Some(oracle) = &oracle {
        oracle.shutdown().await;
    }

    let json = serde_json::to_string_pretty(&report)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "Report written");
        }
        None => println!("{json}"),
    }

    Ok(())
}
