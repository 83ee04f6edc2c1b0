// src/game/snapshot.rs

use super::board::{all_squares, BoardState};
use super::codes::color_serde;
use super::ledger::{MoveLedger, MoveRecord};
use super::GameState;
use crate::constants::EMPTY_SQUARE;
use crate::error::GameError;
use serde::{Deserialize, Serialize};
use shakmaty::{Color, Piece, Square};
use std::collections::BTreeMap;

/// Boundary view of a game: square label → piece code (uppercase white,
/// lowercase black, `.` empty), side to move, game-over flag and history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub board: BTreeMap<String, char>,
    #[serde(with = "color_serde")]
    pub turn: Color,
    pub game_over: bool,
    pub move_history: Vec<MoveRecord>,
}

impl From<&GameState> for GameSnapshot {
    fn from(game: &GameState) -> Self {
        let board = game.board();
        GameSnapshot {
            board: all_squares()
                .map(|sq| (sq.to_string(), board.code_at(sq)))
                .collect(),
            turn: board.turn(),
            game_over: board.is_game_over(),
            move_history: game.ledger().records().to_vec(),
        }
    }
}

impl TryFrom<GameSnapshot> for GameState {
    type Error = GameError;

    fn try_from(snapshot: GameSnapshot) -> Result<Self, Self::Error> {
        if snapshot.board.len() != 64 {
            return Err(GameError::InvalidSnapshot(format!(
                "expected 64 squares, found {}",
                snapshot.board.len()
            )));
        }

        let mut board = BoardState::empty(snapshot.turn);
        for (label, code) in &snapshot.board {
            let sq: Square = label
                .parse()
                .map_err(|_| GameError::InvalidSnapshot(format!("bad square label {label}")))?;
            if *code == EMPTY_SQUARE {
                continue;
            }
            let piece = Piece::from_char(*code)
                .ok_or_else(|| GameError::InvalidSnapshot(format!("bad piece code {code} on {label}")))?;
            board.put(sq, piece);
        }
        if snapshot.game_over {
            board.end_game();
        }

        let ledger = MoveLedger::from_records(snapshot.move_history)
            .ok_or_else(|| GameError::InvalidSnapshot("inconsistent turn numbers".to_string()))?;

        Ok(GameState::from_parts(board, ledger))
    }
}
