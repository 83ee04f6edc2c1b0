// src/game/apply.rs

use super::ledger::MoveRecord;
use super::notation::algebraic;
use super::GameState;
use crate::error::{GameError, MoveRejection};
use shakmaty::{Piece, Role, Square};
use tracing::{debug, info};

/// Validates and applies a single move.
///
/// Only two rules are enforced: the moving piece must belong to the side to
/// move, and the source must differ from the destination. Geometry, check,
/// castling, en passant and promotion are deliberately not modelled, and a
/// piece may land on any occupied square, including one of its own.
pub struct MoveApplier;

impl MoveApplier {
    /// Returns the moving piece when the move is acceptable.
    pub fn validate(game: &GameState, from: Square, to: Square) -> Result<Piece, GameError> {
        let board = game.board();
        if board.is_game_over() {
            return Err(GameError::ReadOnlyViolation);
        }
        let reject = |reason| GameError::InvalidMove { from, to, reason };
        let piece = board.piece_at(from).ok_or_else(|| reject(MoveRejection::EmptySource))?;
        if piece.color != board.turn() {
            return Err(reject(MoveRejection::WrongColor { to_move: board.turn() }));
        }
        if from == to {
            return Err(reject(MoveRejection::SameSquare));
        }
        Ok(piece)
    }

    /// Applies the move or leaves `game` untouched. All checks run before
    /// the first mutation, so no partial state is observable.
    pub fn apply(game: &mut GameState, from: Square, to: Square) -> Result<MoveRecord, GameError> {
        let piece = Self::validate(game, from, to).map_err(|err| {
            debug!("Rejected move {from}{to}: {err}");
            err
        })?;

        let color = game.board.turn();
        let turn_number = game.ledger.next_turn_number();

        let captured = game.board.relocate(from, to);
        let is_capture = captured.is_some();
        let record = MoveRecord {
            from,
            to,
            piece,
            color,
            captured,
            is_capture,
            notation: algebraic(piece, from, to, is_capture),
            turn_number,
        };
        game.ledger.append(record.clone());
        game.board.pass_turn();

        if let Some(taken) = captured {
            info!("{:?} {:?} captures {:?} {:?} on {to}", color, piece.role, taken.color, taken.role);
            if taken.role == Role::King {
                info!("Game over: the {:?} king was captured", taken.color);
                game.board.end_game();
            }
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::Color;

    #[test]
    fn test_apply_relocates_and_records() {
        let mut game = GameState::new();
        let record = MoveApplier::apply(&mut game, Square::G1, Square::F3).unwrap();
        assert_eq!(record.notation, "Nf3");
        assert_eq!(record.turn_number, 1);
        assert_eq!(game.board().code_at(Square::F3), 'N');
        assert_eq!(game.board().turn(), Color::Black);
        assert_eq!(game.ledger().len(), 1);
    }

    #[test]
    fn test_empty_source_is_rejected() {
        let mut game = GameState::new();
        let before = game.clone();
        let err = MoveApplier::apply(&mut game, Square::E4, Square::E5).unwrap_err();
        assert!(matches!(
            err,
            GameError::InvalidMove { reason: MoveRejection::EmptySource, .. }
        ));
        assert_eq!(game, before);
    }

    #[test]
    fn test_wrong_color_is_rejected() {
        let mut game = GameState::new();
        let before = game.clone();
        let err = MoveApplier::apply(&mut game, Square::E7, Square::E5).unwrap_err();
        assert!(matches!(
            err,
            GameError::InvalidMove { reason: MoveRejection::WrongColor { to_move: Color::White }, .. }
        ));
        assert_eq!(game, before);
    }

    #[test]
    fn test_same_square_is_rejected() {
        let mut game = GameState::new();
        let err = MoveApplier::apply(&mut game, Square::E2, Square::E2).unwrap_err();
        assert!(matches!(
            err,
            GameError::InvalidMove { reason: MoveRejection::SameSquare, .. }
        ));
        assert!(game.ledger().is_empty());
    }

    #[test]
    fn test_geometry_is_not_checked() {
        // A rook may jump straight into the enemy camp.
        let mut game = GameState::new();
        let record = MoveApplier::apply(&mut game, Square::A1, Square::H7).unwrap();
        assert!(record.is_capture);
        assert_eq!(record.notation, "Rxh7");
        assert_eq!(record.captured, Some(Piece { color: Color::Black, role: Role::Pawn }));
    }

    #[test]
    fn test_king_capture_ends_game() {
        let mut game = GameState::new();
        MoveApplier::apply(&mut game, Square::D1, Square::E8).unwrap();
        assert!(game.board().is_game_over());
        assert!(!game.board().has_king(Color::Black));

        let err = MoveApplier::apply(&mut game, Square::D8, Square::D1).unwrap_err();
        assert!(matches!(err, GameError::ReadOnlyViolation));
        assert_eq!(game.ledger().len(), 1);
    }

    #[test]
    fn test_capturing_own_king_also_ends_game() {
        let mut game = GameState::new();
        MoveApplier::apply(&mut game, Square::D1, Square::E1).unwrap();
        assert!(game.board().is_game_over());
    }
}
