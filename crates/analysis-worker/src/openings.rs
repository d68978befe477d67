//! Opening repertoire statistics and per-game book deviation detection.

use std::collections::HashMap;
use std::time::Duration;

use chess_core::{ParsedMove, PlayerColor, PlayerResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::explorer::{BookExplorer, ExplorerMove};

/// Deviation scan covers the first 20 full moves
const MAX_SCAN_PLY: u32 = 40;

/// Book alternatives kept per deviation
const MAX_BOOK_MOVES: usize = 5;

/// Openings need this many games to be ranked as worst performing
const MIN_GAMES_FOR_WORST: u32 = 3;

const UNKNOWN_OPENING: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookMove {
    pub san: String,
    pub uci: String,
    pub games: u64,
    pub win_rate: f64,
}

impl From<&ExplorerMove> for BookMove {
    fn from(m: &ExplorerMove) -> Self {
        let games = m.total_games();
        Self {
            san: m.san.clone(),
            uci: m.uci.clone(),
            games,
            win_rate: m.white as f64 / games.max(1) as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookDeviation {
    /// Full move number, 1-based
    pub move_number: u32,
    pub player_played: String,
    pub player_played_uci: String,
    pub book_moves: Vec<BookMove>,
    pub fen: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningStats {
    pub eco: String,
    pub name: String,
    pub games_played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub win_rate: f64,
    pub avg_deviation_move: Option<f64>,
    pub deviations: Vec<BookDeviation>,
}

impl OpeningStats {
    fn new(eco: &str, name: &str) -> Self {
        Self {
            eco: eco.to_string(),
            name: name.to_string(),
            games_played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            win_rate: 0.0,
            avg_deviation_move: None,
            deviations: Vec::new(),
        }
    }

    fn record(&mut self, result: PlayerResult) {
        self.games_played += 1;
        match result {
            PlayerResult::Win => self.wins += 1,
            PlayerResult::Loss => self.losses += 1,
            PlayerResult::Draw => self.draws += 1,
        }
        self.win_rate = f64::from(self.wins) / f64::from(self.games_played.max(1));
    }

    fn add_deviation(&mut self, deviation: BookDeviation) {
        self.deviations.push(deviation);
        let sum: u32 = self.deviations.iter().map(|d| d.move_number).sum();
        self.avg_deviation_move = Some(f64::from(sum) / self.deviations.len() as f64);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningReport {
    /// Most played first
    pub openings: Vec<OpeningStats>,
    pub most_played: String,
    pub best_performing: String,
    pub worst_performing: String,
    pub repertoire_breadth: usize,
    pub book_adherence_rate: f64,
}

/// Opening fields of one game from the player's side
#[derive(Debug, Clone, Default)]
pub struct OpeningGame {
    pub eco: Option<String>,
    pub opening_name: Option<String>,
    pub player_result: Option<PlayerResult>,
    /// First book deviation, if a scan was run and found one
    pub deviation: Option<BookDeviation>,
}

pub struct OpeningAnalyzer {
    request_delay: Duration,
}

impl OpeningAnalyzer {
    pub fn new(request_delay: Duration) -> Self {
        Self { request_delay }
    }

    /// Group games by ECO code and opening name and rank the groups.
    pub fn analyze_repertoire(&self, games: &[OpeningGame]) -> OpeningReport {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<OpeningStats> = Vec::new();

        for game in games {
            let eco = game.eco.as_deref().unwrap_or("");
            let name = game.opening_name.as_deref().unwrap_or(UNKNOWN_OPENING);
            let key = if eco.is_empty() {
                name.to_string()
            } else {
                format!("{eco}:{name}")
            };

            let slot = *index.entry(key).or_insert_with(|| {
                groups.push(OpeningStats::new(eco, name));
                groups.len() - 1
            });
            let stats = &mut groups[slot];
            stats.record(game.player_result.unwrap_or(PlayerResult::Draw));
            if let Some(deviation) = &game.deviation {
                stats.add_deviation(deviation.clone());
            }
        }

        // Stable: equal counts keep first-seen order
        groups.sort_by(|a, b| b.games_played.cmp(&a.games_played));

        let most_played = groups.first().map(|o| o.name.clone());

        let mut best: Option<&OpeningStats> = None;
        for o in &groups {
            if best.map_or(true, |b| o.win_rate > b.win_rate) {
                best = Some(o);
            }
        }

        let mut worst: Option<&OpeningStats> = None;
        for o in groups.iter().filter(|o| o.games_played >= MIN_GAMES_FOR_WORST) {
            if worst.map_or(true, |w| o.win_rate < w.win_rate) {
                worst = Some(o);
            }
        }
        let worst = worst.or(groups.last());

        let name_or_none = |o: Option<&OpeningStats>| {
            o.map(|o| o.name.clone()).unwrap_or_else(|| "None".to_string())
        };
        let best_performing = name_or_none(best);
        let worst_performing = name_or_none(worst);

        OpeningReport {
            most_played: most_played.unwrap_or_else(|| "None".to_string()),
            best_performing,
            worst_performing,
            repertoire_breadth: groups.len(),
            book_adherence_rate: 1.0,
            openings: groups,
        }
    }

    /// First move in the opening where the player left the book.
    ///
    /// Only the player's moves within the first 40 plies are checked. A
    /// failed lookup counts as "no book data" for that position.
    pub async fn find_book_deviation<B: BookExplorer + ?Sized>(
        &self,
        explorer: &B,
        moves: &[ParsedMove],
        player_color: PlayerColor,
    ) -> Option<BookDeviation> {
        for mv in moves {
            if mv.ply >= MAX_SCAN_PLY {
                break;
            }
            if !player_color.owns_move(mv.is_white) {
                continue;
            }

            let book = match explorer.book_moves(&mv.fen_before).await {
                Ok(book) => book,
                Err(e) => {
                    warn!(error = %e, fen = %mv.fen_before, "Book lookup failed");
                    Vec::new()
                }
            };
            tokio::time::sleep(self.request_delay).await;

            if book.is_empty() {
                continue;
            }
            if book.iter().any(|b| b.uci == mv.uci) {
                continue;
            }

            debug!(ply = mv.ply, san = %mv.san, "Left book");
            return Some(BookDeviation {
                move_number: mv.ply / 2 + 1,
                player_played: mv.san.clone(),
                player_played_uci: mv.uci.clone(),
                book_moves: book.iter().take(MAX_BOOK_MOVES).map(BookMove::from).collect(),
                fen: mv.fen_before.clone(),
            });
        }
        None
    }
}
