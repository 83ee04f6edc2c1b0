// src/plan/mod.rs

pub mod cache;

use crate::advisor::PlannedTurn;
use crate::game::{Fingerprint, GameState, Move};
use shakmaty::Color;
use std::collections::VecDeque;
use tracing::debug;

pub use cache::{PlanCache, PlanOutcome};

/// A predicted move and the position it was predicted for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlanEntry {
    pub expected: Fingerprint,
    pub mv: Move,
}

/// Predicted moves for one side, consumed front to back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Plan {
    entries: VecDeque<PlanEntry>,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pop_front(&mut self) -> Option<PlanEntry> {
        self.entries.pop_front()
    }

    pub fn entries(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries.iter()
    }
}

/// Replays `turns` on a scratch copy of `game` and records the fingerprint
/// each advisory move is expected to be played from.
///
/// Replay stops at the first move or reply the applier refuses, and after
/// the first turn that carries no anticipated reply.
pub fn build_plan(game: &GameState, color: Color, turns: &[PlannedTurn]) -> Plan {
    let mut scratch = game.clone();
    let mut plan = Plan::default();

    for (i, turn) in turns.iter().enumerate() {
        if scratch.board().turn() != color {
            break;
        }
        let expected = scratch.fingerprint();
        if let Err(err) = scratch.apply_move(turn.mv) {
            debug!("Plan replay stopped at turn {}: {err}", i + 1);
            break;
        }
        plan.entries.push_back(PlanEntry { expected, mv: turn.mv });

        let is_last = i + 1 == turns.len();
        if is_last || scratch.board().is_game_over() {
            break;
        }
        let Some(reply) = turn.expected_reply else {
            break;
        };
        if let Err(err) = scratch.apply_move(reply) {
            debug!("Plan replay stopped at reply {}: {err}", i + 1);
            break;
        }
    }
    plan
}
