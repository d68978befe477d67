//! Chess game analysis: per-move engine evaluation, phase and quality
//! classification, feature aggregation, playstyle archetypes, weakness
//! detection and opening repertoire statistics.

pub mod analysis;
pub mod analyzer;
pub mod book_cache;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod explorer;
pub mod features;
pub mod heuristic;
pub mod openings;
pub mod phase;
pub mod playstyle;
pub mod report;
pub mod stockfish;
pub mod weakness;

pub use analysis::MoveClassification;
pub use analyzer::{GameAnalysisResult, GameAnalyzer, MoveAnalysis};
pub use error::WorkerError;
pub use evaluator::{EngineEval, PositionEvaluator};
pub use explorer::{BookExplorer, ExplorerMove};
pub use phase::GamePhase;
pub use report::{PlayerGame, PlayerReport, ReportBuilder};
