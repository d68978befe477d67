//! Player-level report: runs the per-game pipeline and feeds every
//! downstream analyzer.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chess_core::{ParsedGame, PlayerColor, PlayerResult};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::analyzer::{GameAnalysisResult, GameAnalyzer};
use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::evaluator::PositionEvaluator;
use crate::explorer::BookExplorer;
use crate::features::{AggregatedFeatures, FeatureExtractor, GameFeatures};
use crate::heuristic::{self, RawGame};
use crate::openings::{OpeningAnalyzer, OpeningGame, OpeningReport};
use crate::playstyle::{PlaystyleClassifier, PlaystyleResult};
use crate::weakness::{GameMoveRecord, GameOutcome, WeaknessDetector, WeaknessReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureSource {
    Engine,
    Heuristic,
}

/// A parsed game seen from one player's side.
#[derive(Debug, Clone)]
pub struct PlayerGame {
    pub id: usize,
    pub game: ParsedGame,
    pub color: PlayerColor,
    pub result: PlayerResult,
}

impl PlayerGame {
    pub fn new(id: usize, game: ParsedGame, username: &str) -> Self {
        let color = game.metadata.player_color(username);
        let result = game.metadata.player_result(color);
        Self {
            id,
            game,
            color,
            result,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerReport {
    pub username: String,
    pub games_considered: usize,
    pub games_analyzed: usize,
    pub games_failed: usize,
    pub feature_source: FeatureSource,
    pub features: BTreeMap<String, f64>,
    pub playstyle: PlaystyleResult,
    pub weaknesses: WeaknessReport,
    pub openings: OpeningReport,
}

/// Per-game engine output kept for aggregation
struct AnalyzedGame<'g> {
    game: &'g PlayerGame,
    result: GameAnalysisResult,
}

pub struct ReportBuilder<'a> {
    evaluator: Option<&'a dyn PositionEvaluator>,
    explorer: Option<&'a dyn BookExplorer>,
    depth: u32,
    request_delay: Duration,
    max_concurrent_games: usize,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            evaluator: None,
            explorer: None,
            depth: config.eval_depth,
            request_delay: config.request_delay,
            max_concurrent_games: config.max_concurrent_games.max(1),
        }
    }

    /// Enable engine analysis.
    pub fn with_evaluator(mut self, evaluator: &'a dyn PositionEvaluator) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Enable per-game book deviation scans.
    pub fn with_explorer(mut self, explorer: &'a dyn BookExplorer) -> Self {
        self.explorer = Some(explorer);
        self
    }

    pub async fn build(&self, username: &str, games: &[PlayerGame]) -> PlayerReport {
        info!(username, games = games.len(), "Building player report");

        let (analyzed, failed) = match self.evaluator {
            Some(evaluator) => self.analyze_games(evaluator, games).await,
            None => (Vec::new(), 0),
        };

        let (feature_source, features, weaknesses) = if analyzed.is_empty() {
            let (features, weaknesses) = heuristic_profile(games);
            (FeatureSource::Heuristic, features, weaknesses)
        } else {
            let (features, weaknesses) = engine_profile(&analyzed);
            (FeatureSource::Engine, features, weaknesses)
        };

        let playstyle = PlaystyleClassifier.classify(&features);
        let openings = self.opening_report(games).await;

        info!(
            username,
            analyzed = analyzed.len(),
            failed,
            primary = %playstyle.primary_archetype,
            "Player report complete"
        );

        PlayerReport {
            username: username.to_string(),
            games_considered: games.len(),
            games_analyzed: analyzed.len(),
            games_failed: failed,
            feature_source,
            features,
            playstyle,
            weaknesses,
            openings,
        }
    }

    /// Run the pipeline over every game, a bounded number at a time. Failed
    /// games are dropped whole and counted.
    async fn analyze_games<'g>(
        &self,
        evaluator: &dyn PositionEvaluator,
        games: &'g [PlayerGame],
    ) -> (Vec<AnalyzedGame<'g>>, usize) {
        let analyzer = GameAnalyzer::new(evaluator, self.depth, self.request_delay);

        let outcomes: Vec<(&PlayerGame, Result<GameAnalysisResult, WorkerError>)> =
            stream::iter(games)
                .map(|game| {
                    let analyzer = &analyzer;
                    async move {
                        info!(game_id = game.id, moves = game.game.moves.len(), "Analyzing game");
                        (game, analyzer.analyze_game(&game.game.moves, game.color).await)
                    }
                })
                .buffered(self.max_concurrent_games)
                .collect()
                .await;

        let mut analyzed = Vec::with_capacity(outcomes.len());
        let mut failed = 0;
        for (game, outcome) in outcomes {
            match outcome {
                Ok(result) => {
                    info!(
                        game_id = game.id,
                        acpl = result.player_acpl,
                        blunders = result.blunder_count,
                        "Game analyzed"
                    );
                    analyzed.push(AnalyzedGame { game, result });
                }
                Err(e) => {
                    error!(game_id = game.id, error = %e, "Game analysis failed");
                    failed += 1;
                }
            }
        }
        (analyzed, failed)
    }

    async fn opening_report(&self, games: &[PlayerGame]) -> OpeningReport {
        let analyzer = OpeningAnalyzer::new(self.request_delay);
        let mut opening_games = Vec::with_capacity(games.len());

        for game in games {
            let deviation = match self.explorer {
                Some(explorer) => {
                    analyzer
                        .find_book_deviation(explorer, &game.game.moves, game.color)
                        .await
                }
                None => None,
            };
            opening_games.push(OpeningGame {
                eco: game.game.metadata.eco.clone(),
                opening_name: game.game.metadata.opening_name.clone(),
                player_result: Some(game.result),
                deviation,
            });
        }

        analyzer.analyze_repertoire(&opening_games)
    }
}

fn engine_profile(analyzed: &[AnalyzedGame<'_>]) -> (BTreeMap<String, f64>, WeaknessReport) {
    let extractor = FeatureExtractor;
    let mut per_game: Vec<GameFeatures> = Vec::with_capacity(analyzed.len());
    let mut records: Vec<GameMoveRecord> = Vec::new();
    let mut colors: HashMap<usize, PlayerColor> = HashMap::new();

    for AnalyzedGame { game, result } in analyzed {
        per_game.push(extractor.extract(
            &result.moves,
            game.color,
            game.game.total_moves() as u32,
        ));
        colors.insert(game.id, game.color);
        records.extend(result.moves.iter().map(|analysis| GameMoveRecord {
            game_id: game.id,
            analysis: analysis.clone(),
        }));
    }

    let features = AggregatedFeatures::from_games(&per_game).to_normalized();
    let weaknesses = WeaknessDetector.analyze(&records, &colors);
    (features, weaknesses)
}

fn heuristic_profile(games: &[PlayerGame]) -> (BTreeMap<String, f64>, WeaknessReport) {
    let raw: Vec<RawGame> = games
        .iter()
        .map(|g| RawGame {
            pgn: g.game.pgn.clone(),
            player_color: g.color,
            player_result: g.result,
        })
        .collect();
    let outcomes: Vec<GameOutcome> = games
        .iter()
        .map(|g| GameOutcome {
            result: g.result,
            total_moves: g.game.total_moves(),
        })
        .collect();

    (
        heuristic::approximate_features(&raw),
        WeaknessDetector.results_summary(&outcomes),
    )
}
