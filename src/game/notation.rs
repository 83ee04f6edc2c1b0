// src/game/notation.rs

use super::Move;
use crate::error::GameError;
use shakmaty::{Piece, Role, Square};

/// Short algebraic notation without check marks: `e4`, `exd5`, `Nf3`, `Qxd7`.
pub fn algebraic(piece: Piece, from: Square, to: Square, is_capture: bool) -> String {
    let mut san = String::new();
    if piece.role == Role::Pawn {
        if is_capture {
            san.push(from.file().char());
            san.push('x');
        }
    } else {
        san.push(piece.role.upper_char());
        if is_capture {
            san.push('x');
        }
    }
    san.push_str(&to.to_string());
    san
}

pub fn parse_square(text: &str) -> Result<Square, GameError> {
    text.trim()
        .to_ascii_lowercase()
        .parse::<Square>()
        .map_err(|_| GameError::InvalidSquare(text.to_string()))
}

// "Nb8" -> "b8"; piece letters are uppercase so they never clash with files.
fn strip_piece_letter(token: &str) -> &str {
    match token.chars().next() {
        Some('K' | 'Q' | 'R' | 'B' | 'N') if token.len() >= 3 => &token[1..],
        _ => token,
    }
}

/// Reads a move in any of the accepted shapes: `e7 e5`, `e7-e5`, `e7e5`,
/// `Nb8 c6`, `Ng8-f6`, `Nb8c6`.
pub fn parse_move(text: &str) -> Result<Move, GameError> {
    let trimmed = text.trim();
    let invalid = || GameError::InvalidNotation(text.to_string());

    let (from, to) = if let Some((a, b)) = trimmed.split_once(char::is_whitespace) {
        (strip_piece_letter(a.trim()), strip_piece_letter(b.trim()))
    } else if let Some((a, b)) = trimmed.split_once('-') {
        (strip_piece_letter(a), strip_piece_letter(b))
    } else {
        let body = strip_piece_letter(trimmed);
        if body.len() != 4 || !body.is_ascii() {
            return Err(invalid());
        }
        body.split_at(2)
    };

    // Two-character tokens are meant as squares; report those by name.
    let square = |token: &str| {
        if token.chars().count() == 2 {
            parse_square(token)
        } else {
            Err(invalid())
        }
    };
    Ok(Move {
        from: square(from)?,
        to: square(to)?,
    })
}
