//! Runs a single game between two engine processes.
//!
//! The runner owns the authoritative board: every engine move is checked
//! against the legal move list before it is applied, and the termination
//! rules adjudicate the game. An illegal move forfeits.

use crate::uci_client::{ClientError, UciClient};
use sable_engine::{game_state, Board, GameState};
use sable_uci::{EngineInfo, Score};
use serde::Serialize;
use thiserror::Error;

/// Errors that abort a game rather than scoring it.
#[derive(Error, Debug)]
pub enum GameError {
    #[error("uci error: {0}")]
    Client(#[from] ClientError),

    #[error("invalid opening position: {0}")]
    BadOpening(String),
}

/// Result of one game from White's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchResult {
    WhiteWins,
    BlackWins,
    Draw,
}

/// One played move with the search data the engine reported for it.
#[derive(Debug, Clone, Serialize)]
pub struct MoveRecord {
    pub uci: String,
    pub depth: Option<u32>,
    pub score_cp: Option<i32>,
    pub score_mate: Option<i32>,
    pub nodes: Option<u64>,
}

impl MoveRecord {
    fn new(uci: String, info: Option<EngineInfo>) -> Self {
        let (score_cp, score_mate) = match info.as_ref().and_then(|i| i.score) {
            Some(Score::Cp(cp)) => (Some(cp), None),
            Some(Score::Mate(m)) => (None, Some(m)),
            None => (None, None),
        };
        MoveRecord {
            uci,
            depth: info.as_ref().and_then(|i| i.depth),
            score_cp,
            score_mate,
            nodes: info.as_ref().and_then(|i| i.nodes),
        }
    }
}

/// A finished game.
#[derive(Debug, Clone, Serialize)]
pub struct GameRecord {
    pub white: String,
    pub black: String,
    pub opening: Option<String>,
    pub result: MatchResult,
    pub reason: String,
    pub moves: Vec<MoveRecord>,
}

/// Hard cap so two shuffling engines cannot run forever.
const MAX_GAME_PLIES: usize = 512;

/// Plays one game between two initialized clients.
pub fn play_game(
    white: &mut UciClient,
    black: &mut UciClient,
    opening: Option<&str>,
    white_tc: &str,
    black_tc: &str,
) -> Result<GameRecord, GameError> {
    let mut board = match opening {
        Some(fen) => Board::from_fen(fen).map_err(|e| GameError::BadOpening(e.to_string()))?,
        None => Board::startpos(),
    };

    white.new_game()?;
    black.new_game()?;

    let mut moves: Vec<String> = Vec::new();
    let mut records = Vec::new();

    let (result, reason) = loop {
        let state = game_state(&board);
        if state != GameState::InProgress {
            break (
                match state.winner() {
                    Some(sable_core::Color::White) => MatchResult::WhiteWins,
                    Some(sable_core::Color::Black) => MatchResult::BlackWins,
                    None => MatchResult::Draw,
                },
                state.to_string(),
            );
        }
        if records.len() >= MAX_GAME_PLIES {
            break (MatchResult::Draw, "move limit reached".to_string());
        }

        let white_to_move = board.side_to_move() == sable_core::Color::White;
        let (mover, tc) = if white_to_move {
            (&mut *white, white_tc)
        } else {
            (&mut *black, black_tc)
        };

        mover.set_position(opening, &moves)?;
        let (uci, info) = mover.go(tc)?;

        let Some(m) = board.find_legal(&uci) else {
            // Illegal move forfeits the game.
            break (
                if white_to_move {
                    MatchResult::BlackWins
                } else {
                    MatchResult::WhiteWins
                },
                format!("illegal move {}", uci),
            );
        };

        board.make_move(m);
        moves.push(uci.clone());
        records.push(MoveRecord::new(uci, info));
    };

    Ok(GameRecord {
        white: white.name().to_string(),
        black: black.name().to_string(),
        opening: opening.map(|s| s.to_string()),
        result,
        reason,
        moves: records,
    })
}

/// Tallied outcome of a series of games.
#[derive(Debug, Default, Clone, Serialize)]
pub struct MatchScore {
    pub white_wins: u32,
    pub black_wins: u32,
    pub draws: u32,
}

impl MatchScore {
    pub fn add(&mut self, result: MatchResult) {
        match result {
            MatchResult::WhiteWins => self.white_wins += 1,
            MatchResult::BlackWins => self.black_wins += 1,
            MatchResult::Draw => self.draws += 1,
        }
    }

    pub fn games(&self) -> u32 {
        self.white_wins + self.black_wins + self.draws
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_record_pulls_score_fields() {
        let info = EngineInfo {
            depth: Some(9),
            score: Some(Score::Cp(34)),
            nodes: Some(12_345),
            ..Default::default()
        };
        let record = MoveRecord::new("e2e4".to_string(), Some(info));
        assert_eq!(record.depth, Some(9));
        assert_eq!(record.score_cp, Some(34));
        assert_eq!(record.score_mate, None);
        assert_eq!(record.nodes, Some(12_345));

        let record = MoveRecord::new("e2e4".to_string(), None);
        assert_eq!(record.depth, None);
        assert_eq!(record.score_cp, None);
    }

    #[test]
    fn match_score_tally() {
        let mut score = MatchScore::default();
        score.add(MatchResult::WhiteWins);
        score.add(MatchResult::Draw);
        score.add(MatchResult::Draw);
        score.add(MatchResult::BlackWins);
        assert_eq!(score.white_wins, 1);
        assert_eq!(score.black_wins, 1);
        assert_eq!(score.draws, 2);
        assert_eq!(score.games(), 4);
    }

    #[test]
    fn game_record_serializes() {
        let record = GameRecord {
            white: "a".into(),
            black: "b".into(),
            opening: None,
            result: MatchResult::Draw,
            reason: "stalemate".into(),
            moves: vec![MoveRecord::new("e2e4".into(), None)],
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"result\":\"Draw\""));
        assert!(json.contains("\"uci\":\"e2e4\""));
    }
}
