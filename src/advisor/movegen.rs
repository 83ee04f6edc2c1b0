// src/advisor/movegen.rs
//
// Piece-geometry move generation for the local advisor. The applier itself
// never checks geometry; this only keeps the advisor's own suggestions
// looking like chess.

use crate::game::{BoardState, Move};
use shakmaty::{attacks, Bitboard, Color, Rank, Role, Square};

pub fn role_value(role: Role) -> u32 {
    match role {
        Role::Pawn => 1,
        Role::Knight => 3,
        Role::Bishop => 3,
        Role::Rook => 5,
        Role::Queen => 9,
        Role::King => 100,
    }
}

/// Material of one side, king excluded.
pub fn material(board: &BoardState, color: Color) -> u32 {
    board
        .pieces()
        .filter(|(_, piece)| piece.color == color && piece.role != Role::King)
        .map(|(_, piece)| role_value(piece.role))
        .sum()
}

fn pawn_pushes(board: &BoardState, color: Color, sq: Square) -> Bitboard {
    let (step, start) = match color {
        Color::White => (8, Rank::Second),
        Color::Black => (-8, Rank::Seventh),
    };
    let occupied = board.occupied();
    let mut pushes = Bitboard::EMPTY;
    if let Some(one) = sq.offset(step) {
        if !occupied.contains(one) {
            pushes |= Bitboard::from(one);
            if sq.rank() == start {
                if let Some(two) = one.offset(step) {
                    if !occupied.contains(two) {
                        pushes |= Bitboard::from(two);
                    }
                }
            }
        }
    }
    pushes
}

/// Every geometrically plausible move for `color`, ignoring check.
/// Captures of the enemy king are included.
pub fn candidate_moves(board: &BoardState, color: Color) -> Vec<Move> {
    let occupied = board.occupied();
    let own = board.by_color(color);
    let enemy = board.by_color(!color);
    let mut moves = Vec::new();

    for from in own {
        let Some(piece) = board.piece_at(from) else {
            continue;
        };
        let targets = match piece.role {
            Role::Pawn => pawn_pushes(board, color, from) | (attacks::pawn_attacks(color, from) & enemy),
            Role::Knight => attacks::knight_attacks(from) & !own,
            Role::Bishop => attacks::bishop_attacks(from, occupied) & !own,
            Role::Rook => attacks::rook_attacks(from, occupied) & !own,
            Role::Queen => attacks::queen_attacks(from, occupied) & !own,
            Role::King => attacks::king_attacks(from) & !own,
        };
        moves.extend(targets.into_iter().map(|to| Move::new(from, to)));
    }
    moves
}
