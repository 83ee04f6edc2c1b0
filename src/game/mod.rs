// game/mod.rs

pub mod apply;
pub mod board;
pub mod codes;
pub mod fingerprint;
pub mod ledger;
pub mod notation;
pub mod snapshot;


use crate::error::GameError;
use serde::{Deserialize, Serialize};
use shakmaty::Square;
use std::fmt;
use std::str::FromStr;

pub use apply::MoveApplier;
pub use board::BoardState;
pub use fingerprint::Fingerprint;
pub use ledger::{MoveLedger, MoveRecord};
pub use snapshot::GameSnapshot;

/// A source/destination pair, nothing more.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    #[serde(with = "codes::square_serde")]
    pub from: Square,
    #[serde(with = "codes::square_serde")]
    pub to: Square,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

impl FromStr for Move {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        notation::parse_move(s)
    }
}

/// Canonical position plus the history that produced it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GameState {
    board: BoardState,
    ledger: MoveLedger,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(board: BoardState, ledger: MoveLedger) -> Self {
        Self { board, ledger }
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn ledger(&self) -> &MoveLedger {
        &self.ledger
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.board.fingerprint()
    }

    pub fn apply_move(&mut self, mv: Move) -> Result<MoveRecord, GameError> {
        MoveApplier::apply(self, mv.from, mv.to)
    }

    /// Back to the starting position with an empty ledger.
    pub fn reset(&mut self) {
        self.board = BoardState::new();
        self.ledger.clear();
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::from(self)
    }

    pub fn from_snapshot(snapshot: GameSnapshot) -> Result<Self, GameError> {
        Self::try_from(snapshot)
    }

    /// Test/setup helper: a game with an arbitrary placement and no history.
    pub fn with_board(board: BoardState) -> Self {
        Self {
            board,
            ledger: MoveLedger::new(),
        }
    }
}
