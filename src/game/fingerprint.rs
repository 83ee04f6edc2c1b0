// src/game/fingerprint.rs

use super::board::BoardState;
use crate::constants::ZOBRIST_SEED;
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use shakmaty::{Color, Piece, Role};
use std::fmt;

/// Zobrist digest of a (placement, side to move) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub u64);

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

struct ZobristKeys {
    pieces: [[u64; 64]; 12],
    black_to_move: u64,
}

// Fixed seed: fingerprints must agree across sessions and restarts.
static KEYS: Lazy<ZobristKeys> = Lazy::new(|| {
    let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);
    let mut pieces = [[0u64; 64]; 12];
    for row in pieces.iter_mut() {
        for key in row.iter_mut() {
            *key = rng.gen::<u64>();
        }
    }
    ZobristKeys {
        pieces,
        black_to_move: rng.gen::<u64>(),
    }
});

fn piece_index(piece: Piece) -> usize {
    let role = match piece.role {
        Role::Pawn => 0,
        Role::Knight => 1,
        Role::Bishop => 2,
        Role::Rook => 3,
        Role::Queen => 4,
        Role::King => 5,
    };
    match piece.color {
        Color::White => role,
        Color::Black => role + 6,
    }
}

pub fn compute(board: &BoardState) -> Fingerprint {
    let keys = &*KEYS;
    let mut hash = board
        .pieces()
        .fold(0u64, |acc, (sq, piece)| acc ^ keys.pieces[piece_index(piece)][sq as usize]);
    if board.turn() == Color::Black {
        hash ^= keys.black_to_move;
    }
    Fingerprint(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::Square;

    #[test]
    fn test_fingerprint_is_deterministic() {
        assert_eq!(BoardState::new().fingerprint(), BoardState::new().fingerprint());
    }

    #[test]
    fn test_fingerprint_depends_on_turn() {
        let white = BoardState::new();
        let mut black = BoardState::new();
        black.pass_turn();
        assert_ne!(white.fingerprint(), black.fingerprint());
    }

    #[test]
    fn test_fingerprint_depends_on_placement() {
        let start = BoardState::new();
        let mut moved = BoardState::new();
        moved.relocate(Square::G1, Square::F3);
        assert_ne!(start.fingerprint(), moved.fingerprint());

        // Returning the knight restores the digest.
        moved.relocate(Square::F3, Square::G1);
        assert_eq!(start.fingerprint(), moved.fingerprint());
    }
}
