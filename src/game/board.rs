// src/game/board.rs

use super::fingerprint::{self, Fingerprint};
use crate::constants::EMPTY_SQUARE;
use shakmaty::{Bitboard, Board, Color, Piece, Role, Square};

/// Every square from a1 to h8, rank by rank.
pub fn all_squares() -> impl Iterator<Item = Square> {
    (0..64u32).map(Square::new)
}

/// Piece placement plus side to move and the game-over latch.
///
/// Mutation is restricted to the crate so that the only way to change a
/// live position is through `MoveApplier` or a reset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardState {
    pieces: Board,
    turn: Color,
    game_over: bool,
}

impl BoardState {
    /// Standard starting position, white to move.
    pub fn new() -> Self {
        Self {
            pieces: Board::default(),
            turn: Color::White,
            game_over: false,
        }
    }

    pub fn empty(turn: Color) -> Self {
        Self {
            pieces: Board::empty(),
            turn,
            game_over: false,
        }
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.pieces.piece_at(sq)
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn piece_count(&self) -> usize {
        self.pieces.occupied().count()
    }

    /// Occupied squares in a1..h8 order.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        all_squares().filter_map(move |sq| self.piece_at(sq).map(|piece| (sq, piece)))
    }

    pub fn occupied(&self) -> Bitboard {
        self.pieces.occupied()
    }

    pub fn by_color(&self, color: Color) -> Bitboard {
        self.pieces.by_color(color)
    }

    pub fn has_king(&self, color: Color) -> bool {
        self.pieces()
            .any(|(_, piece)| piece.role == Role::King && piece.color == color)
    }

    pub fn fingerprint(&self) -> Fingerprint {
        fingerprint::compute(self)
    }

    /// Piece placement field of a FEN string, e.g. `rnbqkbnr/pppppppp/8/...`.
    pub fn placement_fen(&self) -> String {
        let mut ranks = Vec::with_capacity(8);
        for rank in (0..8u32).rev() {
            let mut row = String::new();
            let mut empty = 0;
            for file in 0..8u32 {
                match self.piece_at(Square::new(rank * 8 + file)) {
                    Some(piece) => {
                        if empty > 0 {
                            row.push_str(&empty.to_string());
                            empty = 0;
                        }
                        row.push(piece.char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                row.push_str(&empty.to_string());
            }
            ranks.push(row);
        }
        ranks.join("/")
    }

    /// Square code used at the boundary: piece char or the empty sentinel.
    pub fn code_at(&self, sq: Square) -> char {
        self.piece_at(sq).map_or(EMPTY_SQUARE, |piece| piece.char())
    }

    /// Moves a piece and returns whatever stood on the destination.
    /// Callers validate first; the source is assumed occupied.
    pub(crate) fn relocate(&mut self, from: Square, to: Square) -> Option<Piece> {
        let moving = self.pieces.remove_piece_at(from);
        let captured = self.pieces.remove_piece_at(to);
        if let Some(piece) = moving {
            self.pieces.set_piece_at(to, piece);
        }
        captured
    }

    pub(crate) fn put(&mut self, sq: Square, piece: Piece) {
        self.pieces.set_piece_at(sq, piece);
    }

    pub(crate) fn pass_turn(&mut self) {
        self.turn = !self.turn;
    }

    pub(crate) fn set_turn(&mut self, turn: Color) {
        self.turn = turn;
    }

    pub(crate) fn end_game(&mut self) {
        self.game_over = true;
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_position() {
        let board = BoardState::new();
        assert_eq!(board.piece_count(), 32);
        assert_eq!(board.turn(), Color::White);
        assert!(!board.is_game_over());
        assert_eq!(board.code_at(Square::E1), 'K');
        assert_eq!(board.code_at(Square::D8), 'q');
        assert_eq!(board.code_at(Square::E4), EMPTY_SQUARE);
    }

    #[test]
    fn test_placement_fen() {
        let board = BoardState::new();
        assert_eq!(board.placement_fen(), "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR");
        assert_eq!(BoardState::empty(Color::White).placement_fen(), "8/8/8/8/8/8/8/8");
    }

    #[test]
    fn test_relocate_reports_capture() {
        let mut board = BoardState::new();
        let captured = board.relocate(Square::D1, Square::D7);
        assert_eq!(captured, Some(Piece { color: Color::Black, role: Role::Pawn }));
        assert_eq!(board.piece_count(), 31);
        assert_eq!(board.code_at(Square::D7), 'Q');
        assert_eq!(board.code_at(Square::D1), EMPTY_SQUARE);
    }

    #[test]
    fn test_has_king() {
        let mut board = BoardState::empty(Color::White);
        assert!(!board.has_king(Color::White));
        board.put(Square::E1, Piece { color: Color::White, role: Role::King });
        assert!(board.has_king(Color::White));
        assert!(!board.has_king(Color::Black));
    }
}
