// src/orchestrator/mod.rs

use crate::error::color_name;
use crate::game::BoardState;
use serde::{Deserialize, Serialize};
use shakmaty::Color;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Who decides the moves of one color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Controller {
    Human,
    Advisory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    AwaitingHumanMove,
    RequestingAdvisory,
    ApplyingAdvisoryMove,
    Terminated,
}

/// Permission to run one advisory request. Carries the session generation
/// it was issued under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket {
    pub color: Color,
    pub generation: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Request(Ticket),
    AwaitHuman,
    /// An advisory move happened too recently.
    RateLimited { remaining: Duration },
    /// A request for the side to move is still outstanding.
    Busy,
    Terminated,
}

/// Decides whose turn it is and when the advisor may be asked.
///
/// Holds no clock: every time-dependent call takes `now`.
#[derive(Debug)]
pub struct TurnOrchestrator {
    state: TurnState,
    min_interval: Duration,
    last_advisory: Option<Instant>,
    outstanding: HashMap<Color, Ticket>,
    active: Option<Ticket>,
}

impl TurnOrchestrator {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            state: TurnState::Idle,
            min_interval,
            last_advisory: None,
            outstanding: HashMap::new(),
            active: None,
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn outstanding(&self, color: Color) -> Option<Ticket> {
        self.outstanding.get(&color).copied()
    }

    pub fn evaluate(
        &mut self,
        board: &BoardState,
        controller: Controller,
        generation: u64,
        now: Instant,
    ) -> Decision {
        if board.is_game_over() {
            self.transition(TurnState::Terminated);
        }
        if self.state == TurnState::Terminated {
            return Decision::Terminated;
        }

        let color = board.turn();
        if controller == Controller::Human {
            self.transition(TurnState::AwaitingHumanMove);
            return Decision::AwaitHuman;
        }
        if self.outstanding.contains_key(&color) {
            return Decision::Busy;
        }
        if let Some(last) = self.last_advisory {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.min_interval {
                return Decision::RateLimited {
                    remaining: self.min_interval - elapsed,
                };
            }
        }

        let ticket = Ticket { color, generation };
        self.outstanding.insert(color, ticket);
        self.active = Some(ticket);
        self.transition(TurnState::RequestingAdvisory);
        Decision::Request(ticket)
    }

    /// The advisor answered with a move for `ticket`.
    pub fn on_advisory_move(&mut self, ticket: Ticket) {
        if self.is_active(ticket) && self.state == TurnState::RequestingAdvisory {
            self.transition(TurnState::ApplyingAdvisoryMove);
        }
    }

    /// The advised move was applied.
    pub fn on_advisory_applied(&mut self, ticket: Ticket, now: Instant, game_over: bool) {
        self.release(ticket);
        self.last_advisory = Some(now);
        if game_over {
            self.transition(TurnState::Terminated);
        } else if self.is_active(ticket) {
            self.transition(TurnState::Idle);
        }
        self.clear_active(ticket);
    }

    /// The request failed, timed out, or produced a move that was refused.
    pub fn on_advisory_failure(&mut self, ticket: Ticket, now: Instant) {
        self.release(ticket);
        self.last_advisory = Some(now);
        if self.is_active(ticket) && self.state != TurnState::Terminated {
            self.transition(TurnState::Idle);
        }
        self.clear_active(ticket);
    }

    /// The response for `ticket` arrived but no longer applies.
    pub fn discard(&mut self, ticket: Ticket) {
        self.release(ticket);
        if self.is_active(ticket) && self.state != TurnState::Terminated {
            self.transition(TurnState::Idle);
        }
        self.clear_active(ticket);
    }

    pub fn on_human_move(&mut self, game_over: bool) {
        if game_over {
            self.transition(TurnState::Terminated);
        } else {
            self.transition(TurnState::Idle);
        }
    }

    /// Leaves `Terminated`. Outstanding tickets stay until their responses
    /// arrive.
    pub fn reset(&mut self) {
        self.active = None;
        self.last_advisory = None;
        self.transition(TurnState::Idle);
    }

    fn is_active(&self, ticket: Ticket) -> bool {
        self.active == Some(ticket)
    }

    fn clear_active(&mut self, ticket: Ticket) {
        if self.is_active(ticket) {
            self.active = None;
        }
    }

    fn release(&mut self, ticket: Ticket) {
        if self.outstanding.get(&ticket.color) == Some(&ticket) {
            self.outstanding.remove(&ticket.color);
            debug!(
                "Released {} ticket (generation {})",
                color_name(ticket.color),
                ticket.generation
            );
        }
    }

    fn transition(&mut self, next: TurnState) {
        if self.state != next {
            if next == TurnState::Terminated {
                info!("Turn state: {:?} -> {:?}", self.state, next);
            } else {
                debug!("Turn state: {:?} -> {:?}", self.state, next);
            }
            self.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameState;

    const INTERVAL: Duration = Duration::from_millis(2000);

    fn black_to_move() -> GameState {
        let mut game = GameState::new();
        game.apply_move("e2e4".parse().unwrap()).unwrap();
        game
    }

    #[test]
    fn test_human_side_waits() {
        let mut orchestrator = TurnOrchestrator::new(INTERVAL);
        let game = GameState::new();
        let decision = orchestrator.evaluate(game.board(), Controller::Human, 0, Instant::now());
        assert_eq!(decision, Decision::AwaitHuman);
        assert_eq!(orchestrator.state(), TurnState::AwaitingHumanMove);

        orchestrator.on_human_move(false);
        assert_eq!(orchestrator.state(), TurnState::Idle);
    }

    #[test]
    fn test_request_cycle() {
        let mut orchestrator = TurnOrchestrator::new(INTERVAL);
        let game = black_to_move();
        let t0 = Instant::now();

        let Decision::Request(ticket) = orchestrator.evaluate(game.board(), Controller::Advisory, 0, t0) else {
            panic!("expected a request");
        };
        assert_eq!(ticket, Ticket { color: Color::Black, generation: 0 });
        assert_eq!(orchestrator.state(), TurnState::RequestingAdvisory);

        orchestrator.on_advisory_move(ticket);
        assert_eq!(orchestrator.state(), TurnState::ApplyingAdvisoryMove);

        orchestrator.on_advisory_applied(ticket, t0, false);
        assert_eq!(orchestrator.state(), TurnState::Idle);
        assert_eq!(orchestrator.outstanding(Color::Black), None);
    }

    #[test]
    fn test_one_outstanding_request_per_color() {
        let mut orchestrator = TurnOrchestrator::new(INTERVAL);
        let game = black_to_move();
        let t0 = Instant::now();

        assert!(matches!(
            orchestrator.evaluate(game.board(), Controller::Advisory, 0, t0),
            Decision::Request(_)
        ));
        assert_eq!(
            orchestrator.evaluate(game.board(), Controller::Advisory, 0, t0 + INTERVAL * 5),
            Decision::Busy
        );
    }

    #[test]
    fn test_rate_limit_after_completion_and_failure() {
        let mut orchestrator = TurnOrchestrator::new(INTERVAL);
        let game = black_to_move();
        let t0 = Instant::now();

        let Decision::Request(ticket) = orchestrator.evaluate(game.board(), Controller::Advisory, 0, t0) else {
            panic!("expected a request");
        };
        orchestrator.on_advisory_failure(ticket, t0);
        assert_eq!(orchestrator.state(), TurnState::Idle);

        let early = orchestrator.evaluate(game.board(), Controller::Advisory, 0, t0 + Duration::from_millis(500));
        assert_eq!(early, Decision::RateLimited { remaining: Duration::from_millis(1500) });

        let on_time = orchestrator.evaluate(game.board(), Controller::Advisory, 0, t0 + INTERVAL);
        assert!(matches!(on_time, Decision::Request(_)));
    }

    #[test]
    fn test_game_over_is_absorbing_until_reset() {
        let mut orchestrator = TurnOrchestrator::new(INTERVAL);
        let mut game = GameState::new();
        game.apply_move("d1e8".parse().unwrap()).unwrap();
        let t0 = Instant::now();

        assert_eq!(
            orchestrator.evaluate(game.board(), Controller::Advisory, 0, t0),
            Decision::Terminated
        );
        game.reset();
        assert_eq!(
            orchestrator.evaluate(game.board(), Controller::Human, 0, t0),
            Decision::Terminated
        );

        orchestrator.reset();
        assert_eq!(
            orchestrator.evaluate(game.board(), Controller::Human, 1, t0),
            Decision::AwaitHuman
        );
    }

    #[test]
    fn test_reset_keeps_outstanding_ticket_until_it_arrives() {
        let mut orchestrator = TurnOrchestrator::new(INTERVAL);
        let game = black_to_move();
        let t0 = Instant::now();

        let Decision::Request(stale) = orchestrator.evaluate(game.board(), Controller::Advisory, 0, t0) else {
            panic!("expected a request");
        };
        orchestrator.reset();
        assert_eq!(orchestrator.state(), TurnState::Idle);
        assert_eq!(
            orchestrator.evaluate(game.board(), Controller::Advisory, 1, t0),
            Decision::Busy
        );

        orchestrator.discard(stale);
        let Decision::Request(fresh) = orchestrator.evaluate(game.board(), Controller::Advisory, 1, t0) else {
            panic!("expected a request");
        };
        assert_eq!(fresh.generation, 1);
    }

    #[test]
    fn test_stale_discard_leaves_current_request_alone() {
        let mut orchestrator = TurnOrchestrator::new(INTERVAL);
        let game = black_to_move();
        let t0 = Instant::now();

        let Decision::Request(stale) = orchestrator.evaluate(game.board(), Controller::Advisory, 0, t0) else {
            panic!("expected a request");
        };
        orchestrator.reset();
        orchestrator.discard(stale);
        let Decision::Request(current) = orchestrator.evaluate(game.board(), Controller::Advisory, 1, t0) else {
            panic!("expected a request");
        };

        orchestrator.discard(stale);
        assert_eq!(orchestrator.outstanding(Color::Black), Some(current));
        assert_eq!(orchestrator.state(), TurnState::RequestingAdvisory);
    }

    #[test]
    fn test_applied_move_that_ends_game_terminates() {
        let mut orchestrator = TurnOrchestrator::new(INTERVAL);
        let game = black_to_move();
        let t0 = Instant::now();

        let Decision::Request(ticket) = orchestrator.evaluate(game.board(), Controller::Advisory, 0, t0) else {
            panic!("expected a request");
        };
        orchestrator.on_advisory_move(ticket);
        orchestrator.on_advisory_applied(ticket, t0, true);
        assert_eq!(orchestrator.state(), TurnState::Terminated);
    }
}
