//! PGN reading: headers, SAN replay with shakmaty, clock comments
//!
//! Headers and movetext are split with regexes; moves are replayed with
//! shakmaty so every half-move carries its FEN before/after and UCI encoding.

use std::sync::LazyLock;

use regex::Regex;
use shakmaty::{fen::Fen, san::San, CastlingMode, Chess, EnPassantMode, Position};
use thiserror::Error;

use crate::game_data::{GameMetadata, ParsedGame, ParsedMove};

const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).expect("valid header regex"));

static HEADER_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^\s*\[\w+\s+"[^"]*"\]\s*$"#).expect("valid header line regex"));

/// Comments, variation brackets and SAN tokens, in movetext order.
static MOVETEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\{[^}]*\}|[()]|[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|O-O-O[+#]?|O-O[+#]?",
    )
    .expect("valid movetext regex")
});

/// `[%clk H:MM:SS(.f)]` as embedded by Chess.com and Lichess.
static CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[%clk\s+(\d+):(\d+):(\d+(?:\.\d+)?)\]").expect("valid clock regex")
});

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PgnError {
    #[error("no headers or moves found")]
    Empty,

    #[error("non-standard starting position: {0}")]
    NonStandardStart(String),

    #[error("invalid move {san} at ply {ply}: {reason}")]
    InvalidMove { ply: u32, san: String, reason: String },
}

/// Parse a single PGN game into structured moves and metadata.
pub fn parse_pgn(pgn: &str) -> Result<ParsedGame, PgnError> {
    let mut metadata = GameMetadata {
        white: "Unknown".to_string(),
        black: "Unknown".to_string(),
        result: "*".to_string(),
        ..Default::default()
    };
    let mut header_count = 0;
    let mut utc_date = None;
    let mut eco_url = None;
    let mut setup = None;
    let mut fen = None;

    for cap in HEADER_RE.captures_iter(pgn) {
        header_count += 1;
        let key = &cap[1];
        let value = cap[2].to_string();
        match key {
            "White" => metadata.white = value,
            "Black" => metadata.black = value,
            "Result" => metadata.result = value,
            "WhiteElo" => metadata.white_elo = value.parse().ok(),
            "BlackElo" => metadata.black_elo = value.parse().ok(),
            "Date" => metadata.date = non_empty(value),
            "UTCDate" => utc_date = non_empty(value),
            "TimeControl" => metadata.time_control = non_empty(value),
            "ECO" => metadata.eco = non_empty(value),
            "Opening" => metadata.opening_name = non_empty(value),
            "ECOUrl" => eco_url = non_empty(value),
            "Event" => metadata.event = non_empty(value),
            "Link" => metadata.link = non_empty(value),
            "SetUp" => setup = Some(value),
            "FEN" => fen = Some(value),
            _ => {}
        }
    }

    if utc_date.is_some() {
        metadata.date = utc_date;
    }
    if metadata.opening_name.is_none() {
        // Chess.com only links the opening: ".../openings/Sicilian-Defense-Najdorf"
        metadata.opening_name = eco_url
            .as_deref()
            .and_then(|url| url.rsplit('/').next())
            .map(|slug| slug.replace('-', " "))
            .and_then(non_empty);
    }

    // Filter non-standard positions
    if setup.as_deref() == Some("1") {
        if let Some(f) = fen {
            if f != STANDARD_START_FEN {
                return Err(PgnError::NonStandardStart(f));
            }
        }
    }

    let moves = replay_movetext(pgn)?;

    if header_count == 0 && moves.is_empty() {
        return Err(PgnError::Empty);
    }

    Ok(ParsedGame {
        metadata,
        moves,
        pgn: pgn.to_string(),
    })
}

/// Walk the movetext, replaying every SAN token and attaching clock comments
/// to the move they follow.
fn replay_movetext(pgn: &str) -> Result<Vec<ParsedMove>, PgnError> {
    let movetext = HEADER_LINE_RE.replace_all(pgn, "");

    let mut pos = Chess::default();
    let mut moves: Vec<ParsedMove> = Vec::new();
    // Variations nest; only depth 0 is the mainline
    let mut depth = 0usize;

    for token in MOVETEXT_RE.find_iter(&movetext) {
        let token = token.as_str();

        match token {
            "(" => {
                depth += 1;
                continue;
            }
            ")" => {
                depth = depth.saturating_sub(1);
                continue;
            }
            _ if depth > 0 => continue,
            _ => {}
        }

        if token.starts_with('{') {
            if let Some(last) = moves.last_mut() {
                if last.clock_seconds.is_none() {
                    last.clock_seconds = parse_clock(token);
                }
            }
            continue;
        }
        let ply = moves.len() as u32;
        let invalid = |reason: String| PgnError::InvalidMove {
            ply,
            san: token.to_string(),
            reason,
        };

        let san: San = token
            .trim_end_matches(['+', '#'])
            .parse()
            .map_err(|e| invalid(format!("{e}")))?;
        let mv = san.to_move(&pos).map_err(|e| invalid(format!("{e}")))?;

        let fen_before = Fen::from_position(&pos, EnPassantMode::Legal).to_string();
        let canonical = San::from_move(&pos, mv.clone()).to_string();
        let uci = mv.to_uci(CastlingMode::Standard).to_string();

        pos.play_unchecked(mv);

        let suffix = if pos.is_checkmate() {
            "#"
        } else if pos.is_check() {
            "+"
        } else {
            ""
        };

        moves.push(ParsedMove {
            ply,
            move_number: ply / 2 + 1,
            is_white: ply % 2 == 0,
            san: format!("{canonical}{suffix}"),
            uci,
            fen_before,
            fen_after: Fen::from_position(&pos, EnPassantMode::Legal).to_string(),
            clock_seconds: None,
        });
    }

    Ok(moves)
}

/// Parse a `[%clk H:MM:SS.S]` annotation into seconds.
pub fn parse_clock(comment: &str) -> Option<f64> {
    let cap = CLOCK_RE.captures(comment)?;
    let hours: f64 = cap[1].parse().ok()?;
    let minutes: f64 = cap[2].parse().ok()?;
    let seconds: f64 = cap[3].parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Split a multi-game PGN file into one string per game.
///
/// A new game starts at a header line that follows movetext.
pub fn split_games(text: &str) -> Vec<String> {
    let mut games = Vec::new();
    let mut current = String::new();
    let mut seen_movetext = false;

    for line in text.lines() {
        let trimmed = line.trim();
        let is_header = trimmed.starts_with('[') && HEADER_RE.is_match(trimmed);

        if is_header && seen_movetext {
            games.push(std::mem::take(&mut current));
            seen_movetext = false;
        }
        if !is_header && !trimmed.is_empty() {
            seen_movetext = true;
        }

        current.push_str(line);
        current.push('\n');
    }

    if !current.trim().is_empty() {
        games.push(current);
    }
    games
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
