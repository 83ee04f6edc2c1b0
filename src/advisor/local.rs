// src/advisor/local.rs

use super::movegen::{candidate_moves, material, role_value};
use super::{AdvisorClient, Conversation, ConversationMessage, PlannedTurn, Speaker};
use crate::error::{color_name, AdvisorError};
use crate::game::{BoardState, GameState, Move, MoveRecord};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shakmaty::Color;
use std::sync::Mutex;
use tracing::debug;

/// In-process advisor: greedy captures, otherwise a random plausible move.
/// Stands in for a remote service when none is configured.
pub struct LocalAdvisor {
    rng: Mutex<StdRng>,
}

impl LocalAdvisor {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng: Mutex::new(rng) }
    }

    fn choose(&self, board: &BoardState, color: Color) -> Option<Move> {
        let moves = candidate_moves(board, color);
        if moves.is_empty() {
            return None;
        }

        let best_capture = moves
            .iter()
            .filter_map(|mv| board.piece_at(mv.to).map(|victim| (role_value(victim.role), *mv)))
            .max_by_key(|(value, _)| *value);
        if let Some((_, mv)) = best_capture {
            return Some(mv);
        }

        let mut rng = self.rng.lock().ok()?;
        let random_index = rng.gen_range(0..moves.len());
        Some(moves[random_index])
    }
}

impl Default for LocalAdvisor {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl AdvisorClient for LocalAdvisor {
    async fn suggest_move(
        &self,
        board: &BoardState,
        color: Color,
        _history: &[MoveRecord],
    ) -> Result<Move, AdvisorError> {
        let mv = self.choose(board, color).ok_or(AdvisorError::Unavailable)?;
        debug!("Local advisor suggests {mv} for {}", color_name(color));
        Ok(mv)
    }

    async fn plan_moves(
        &self,
        board: &BoardState,
        color: Color,
        depth: u8,
    ) -> Result<Vec<PlannedTurn>, AdvisorError> {
        let mut scratch = GameState::with_board(board.clone());
        let mut turns = Vec::with_capacity(depth as usize);

        while turns.len() < depth as usize && !scratch.board().is_game_over() {
            let Some(mv) = self.choose(scratch.board(), color) else {
                break;
            };
            if scratch.apply_move(mv).is_err() {
                break;
            }
            let expected_reply = if scratch.board().is_game_over() {
                None
            } else {
                self.choose(scratch.board(), !color)
            };
            turns.push(PlannedTurn { mv, expected_reply });
            match expected_reply {
                Some(reply) if scratch.apply_move(reply).is_ok() => {}
                _ => break,
            }
        }

        if turns.is_empty() {
            return Err(AdvisorError::Unavailable);
        }
        debug!("Local advisor planned {} turns for {}", turns.len(), color_name(color));
        Ok(turns)
    }

    async fn analyze(&self, board: &BoardState, turn: Color) -> Result<String, AdvisorError> {
        let white = material(board, Color::White) as i64;
        let black = material(board, Color::Black) as i64;
        let balance = white - black;
        let verdict = match balance {
            0 => "Material is level.".to_string(),
            b if b > 0 => format!("White is ahead by {b}."),
            b => format!("Black is ahead by {}.", -b),
        };
        let mobility = candidate_moves(board, turn).len();
        Ok(format!(
            "{} to move with {mobility} plausible moves. Material: white {white}, black {black}. {verdict}",
            capitalized(color_name(turn)),
        ))
    }

    async fn converse(
        &self,
        message: &str,
        history: &[ConversationMessage],
    ) -> Result<Conversation, AdvisorError> {
        let reply = format!(
            "I only play from the board, not from conversation. You said: \"{}\"",
            message.trim()
        );
        let mut history = history.to_vec();
        history.push(ConversationMessage {
            role: Speaker::User,
            content: message.to_string(),
        });
        history.push(ConversationMessage {
            role: Speaker::Assistant,
            content: reply.clone(),
        });
        Ok(Conversation { reply, history })
    }
}

fn capitalized(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
