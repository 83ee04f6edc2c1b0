// src/error.rs

use shakmaty::{Color, Square};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Why a move was refused before touching the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    EmptySource,
    WrongColor { to_move: Color },
    SameSquare,
}

impl fmt::Display for MoveRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveRejection::EmptySource => write!(f, "no piece on the source square"),
            MoveRejection::WrongColor { to_move } => {
                write!(f, "it is {}'s turn", color_name(*to_move))
            }
            MoveRejection::SameSquare => write!(f, "source and destination are the same square"),
        }
    }
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("invalid move {from} -> {to}: {reason}")]
    InvalidMove {
        from: Square,
        to: Square,
        reason: MoveRejection,
    },
    #[error("game is over, no more moves are accepted")]
    ReadOnlyViolation,
    #[error("cache depth {depth} is outside 1..=10")]
    InvalidConfig { depth: u8 },
    #[error("invalid square: {0}")]
    InvalidSquare(String),
    #[error("cannot read a move from '{0}'")]
    InvalidNotation(String),
    #[error("{0:?} is not controlled by a human player")]
    NotHumanControlled(Color),
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
    #[error(transparent)]
    Advisory(#[from] AdvisorError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Failures of the advisory service. Cloneable so a coalesced request can
/// hand the same outcome to every waiter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdvisorError {
    #[error("advisor did not answer within {0:?}")]
    Timeout(Duration),
    #[error("malformed advisor response: {0}")]
    Malformed(String),
    #[error("advisor transport error: {0}")]
    Transport(String),
    #[error("advisor unavailable")]
    Unavailable,
    #[error("advisor response no longer matches the position")]
    Stale,
}

pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}
