// src/session/mod.rs

pub mod registry;

use crate::advisor::{dispatch, AdvisorClient, AdvisorReply, AdvisorRequest, ConversationMessage};
use crate::config::{ConfigChange, ConfigurationStore, StrategyConfig, StrategyMode};
use crate::constants::{ADVISOR_TIMEOUT_MS, MIN_INTERVAL_MS};
use crate::error::{color_name, AdvisorError, GameError};
use crate::event::{Event, EventBroker};
use crate::game::{GameSnapshot, GameState, Move, MoveRecord};
use crate::orchestrator::{Controller, Decision, Ticket, TurnOrchestrator, TurnState};
use crate::plan::{PlanCache, PlanOutcome};
use shakmaty::{Color, Square};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use registry::SessionRegistry;

pub type SessionId = Uuid;

/// Starting parameters of a session.
#[derive(Clone, Copy, Debug)]
pub struct SessionSettings {
    pub config: StrategyConfig,
    pub min_interval: Duration,
    pub advisor_timeout: Duration,
    pub white: Controller,
    pub black: Controller,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            config: StrategyConfig::default(),
            min_interval: Duration::from_millis(MIN_INTERVAL_MS),
            advisor_timeout: Duration::from_millis(ADVISOR_TIMEOUT_MS),
            white: Controller::Human,
            black: Controller::Advisory,
        }
    }
}

/// What one call to `GameSession::step` did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Applied(MoveRecord),
    AwaitingHuman,
    RateLimited(Duration),
    Busy,
    Terminated,
    Failed(AdvisorError),
    /// The response arrived after a reset, a controller change, or a move
    /// that changed the position.
    Discarded,
}

struct SessionState {
    game: GameState,
    config: ConfigurationStore,
    orchestrator: TurnOrchestrator,
    white: Controller,
    black: Controller,
    generation: u64,
    conversation: Vec<ConversationMessage>,
}

impl SessionState {
    fn controller(&self, color: Color) -> Controller {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    /// Re-evaluates when that cannot produce an advisor request: the game is
    /// over or a human is to move. Returns whether it did.
    fn settle(&mut self) -> bool {
        let board = self.game.board();
        let controller = self.controller(board.turn());
        if !board.is_game_over() && controller == Controller::Advisory {
            return false;
        }
        self.orchestrator.evaluate(board, controller, self.generation, now());
        true
    }
}

/// One game and everything needed to play it.
///
/// All mutation goes through `state`, which is never held across an
/// advisor call.
pub struct GameSession {
    id: SessionId,
    state: Mutex<SessionState>,
    plans: Arc<PlanCache>,
    advisor: Arc<dyn AdvisorClient>,
    advisor_timeout: Duration,
    events: EventBroker,
}

// Session clock. Follows tokio's clock so paused-time tests drive it.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

impl GameSession {
    pub fn new(
        id: SessionId,
        settings: SessionSettings,
        advisor: Arc<dyn AdvisorClient>,
        events: EventBroker,
    ) -> Result<Self, GameError> {
        let config = ConfigurationStore::new(settings.config)?;
        let plans = Arc::new(PlanCache::new(Arc::clone(&advisor), settings.advisor_timeout));
        info!("Session {id} created ({:?}, depth {})", settings.config.mode, settings.config.cache_depth);
        Ok(Self {
            id,
            state: Mutex::new(SessionState {
                game: GameState::new(),
                config,
                orchestrator: TurnOrchestrator::new(settings.min_interval),
                white: settings.white,
                black: settings.black,
                generation: 0,
                conversation: Vec::new(),
            }),
            plans,
            advisor,
            advisor_timeout: settings.advisor_timeout,
            events,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.state.lock().unwrap().game.snapshot()
    }

    pub fn game(&self) -> GameState {
        self.state.lock().unwrap().game.clone()
    }

    pub fn config(&self) -> StrategyConfig {
        self.state.lock().unwrap().config.get()
    }

    pub fn controller(&self, color: Color) -> Controller {
        self.state.lock().unwrap().controller(color)
    }

    pub fn generation(&self) -> u64 {
        self.state.lock().unwrap().generation
    }

    pub fn turn_state(&self) -> TurnState {
        self.state.lock().unwrap().orchestrator.state()
    }

    pub fn conversation(&self) -> Vec<ConversationMessage> {
        self.state.lock().unwrap().conversation.clone()
    }

    pub fn plans(&self) -> &Arc<PlanCache> {
        &self.plans
    }

    pub fn human_move(&self, from: Square, to: Square) -> Result<MoveRecord, GameError> {
        let (record, game_over) = {
            let mut guard = self.state.lock().unwrap();
            let state = &mut *guard;
            let board = state.game.board();
            if !board.is_game_over() {
                if let Some(piece) = board.piece_at(from) {
                    if state.controller(piece.color) != Controller::Human {
                        return Err(GameError::NotHumanControlled(piece.color));
                    }
                }
            }
            let record = state.game.apply_move(Move::new(from, to))?;
            let game_over = state.game.board().is_game_over();
            state.orchestrator.on_human_move(game_over);
            (record, game_over)
        };

        self.publish_move(&record, Controller::Human, game_over);
        Ok(record)
    }

    /// One orchestrator evaluation, running the advisory turn to completion
    /// when one is due.
    pub async fn step(&self) -> StepOutcome {
        let (ticket, snapshot, config) = {
            let mut guard = self.state.lock().unwrap();
            let state = &mut *guard;
            let controller = state.controller(state.game.board().turn());
            let decision = state
                .orchestrator
                .evaluate(state.game.board(), controller, state.generation, now());
            match decision {
                Decision::Request(ticket) => (ticket, state.game.clone(), state.config.get()),
                Decision::AwaitHuman => return StepOutcome::AwaitingHuman,
                Decision::RateLimited { remaining } => return StepOutcome::RateLimited(remaining),
                Decision::Busy => return StepOutcome::Busy,
                Decision::Terminated => return StepOutcome::Terminated,
            }
        };

        debug!(
            "Advisory turn for {} ({:?}, generation {})",
            color_name(ticket.color),
            config.mode,
            ticket.generation
        );
        let advised = match config.mode {
            StrategyMode::MultiMoveCache => self
                .plans
                .next(&snapshot, ticket.color, config.cache_depth)
                .await
                .map(|outcome| {
                    if let PlanOutcome::Fallback { discarded_plan: true, .. } = outcome {
                        self.events.publish(Event::PlanDiscarded {
                            session: self.id,
                            color: ticket.color,
                        });
                    }
                    outcome.mv()
                }),
            StrategyMode::SingleMoveAnalysis => self.suggest(&snapshot, ticket.color).await,
        };

        self.complete(ticket, &snapshot, advised)
    }

    fn complete(&self, ticket: Ticket, snapshot: &GameState, advised: Result<Move, AdvisorError>) -> StepOutcome {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;

        if ticket.generation != state.generation {
            info!(
                "Discarding {} response from generation {} (now {})",
                color_name(ticket.color),
                ticket.generation,
                state.generation
            );
            state.orchestrator.discard(ticket);
            drop(guard);
            self.discarded(ticket);
            return StepOutcome::Discarded;
        }

        let mv = match advised {
            Ok(mv) => mv,
            Err(err) => {
                state.orchestrator.on_advisory_failure(ticket, now());
                drop(guard);
                self.publish_failure(ticket.color, &err);
                return StepOutcome::Failed(err);
            }
        };

        if state.game.fingerprint() != snapshot.fingerprint() {
            info!("Position changed while waiting for the advisor; dropping {mv}");
            state.orchestrator.discard(ticket);
            drop(guard);
            self.discarded(ticket);
            return StepOutcome::Discarded;
        }

        state.orchestrator.on_advisory_move(ticket);
        match state.game.apply_move(mv) {
            Ok(record) => {
                let game_over = state.game.board().is_game_over();
                state.orchestrator.on_advisory_applied(ticket, now(), game_over);
                state.settle();
                drop(guard);
                info!("Advisor played {} for {}", record.notation, color_name(ticket.color));
                self.publish_move(&record, Controller::Advisory, game_over);
                StepOutcome::Applied(record)
            }
            Err(err) => {
                warn!("Advisor move {mv} was refused: {err}");
                state.orchestrator.on_advisory_failure(ticket, now());
                drop(guard);
                self.plans.invalidate();
                let err = AdvisorError::Malformed(format!("move {mv} refused: {err}"));
                self.publish_failure(ticket.color, &err);
                StepOutcome::Failed(err)
            }
        }
    }

    /// Re-evaluates on the runtime without blocking the caller.
    pub fn notify(self: &Arc<Self>) -> JoinHandle<StepOutcome> {
        let session = Arc::clone(self);
        tokio::spawn(async move { session.step().await })
    }

    /// Periodic re-evaluation. Settles human turns in place and only spawns
    /// when an advisory side is to move.
    pub fn tick(self: &Arc<Self>) -> Option<JoinHandle<StepOutcome>> {
        let settled = self.state.lock().unwrap().settle();
        (!settled).then(|| self.notify())
    }

    pub fn set_config(&self, config: StrategyConfig) -> Result<ConfigChange, GameError> {
        let change = self.state.lock().unwrap().config.set(config)?;
        if change.invalidates_plan() {
            self.plans.invalidate();
        }
        if !change.is_noop() {
            self.events.publish(Event::ConfigChanged {
                session: self.id,
                config: change.current,
            });
        }
        Ok(change)
    }

    /// Changing who plays a side cancels any response still in flight.
    pub fn set_controller(&self, color: Color, controller: Controller) {
        let generation = {
            let mut state = self.state.lock().unwrap();
            match color {
                Color::White => state.white = controller,
                Color::Black => state.black = controller,
            }
            state.generation += 1;
            state.generation
        };
        info!("{} is now {:?} (generation {generation})", color_name(color), controller);
        self.events.publish(Event::ControllerChanged {
            session: self.id,
            color,
            controller,
        });
    }

    pub fn reset(&self) {
        {
            let mut state = self.state.lock().unwrap();
            state.game.reset();
            state.conversation.clear();
            state.orchestrator.reset();
            state.generation += 1;
            self.plans.invalidate();
            info!("Session {} reset (generation {})", self.id, state.generation);
        }
        self.events.publish(Event::GameReset { session: self.id });
    }

    pub async fn analyze(&self) -> Result<String, GameError> {
        let (board, turn) = {
            let state = self.state.lock().unwrap();
            let board = state.game.board().clone();
            let turn = board.turn();
            (board, turn)
        };
        let text = dispatch(
            self.advisor.as_ref(),
            AdvisorRequest::analyze(&board, turn),
            self.advisor_timeout,
        )
        .await
        .and_then(AdvisorReply::into_analysis)?;
        self.events.publish(Event::Analysis {
            session: self.id,
            text: text.clone(),
        });
        Ok(text)
    }

    /// Sends `message` to the assistant and keeps the updated history, unless
    /// the session was reset in the meantime.
    pub async fn converse(&self, message: &str) -> Result<String, GameError> {
        let (history, generation) = {
            let state = self.state.lock().unwrap();
            (state.conversation.clone(), state.generation)
        };
        let conversation = dispatch(
            self.advisor.as_ref(),
            AdvisorRequest::converse(message, &history),
            self.advisor_timeout,
        )
        .await
        .and_then(AdvisorReply::into_conversation)?;

        {
            let mut state = self.state.lock().unwrap();
            if state.generation == generation {
                state.conversation = conversation.history;
            }
        }
        self.events.publish(Event::AssistantReply {
            session: self.id,
            reply: conversation.reply.clone(),
        });
        Ok(conversation.reply)
    }

    async fn suggest(&self, game: &GameState, color: Color) -> Result<Move, AdvisorError> {
        let request = AdvisorRequest::suggest(game.board(), color, game.ledger().records());
        dispatch(self.advisor.as_ref(), request, self.advisor_timeout)
            .await
            .and_then(AdvisorReply::into_move)
    }

    fn publish_move(&self, record: &MoveRecord, by: Controller, game_over: bool) {
        self.events.publish(Event::MoveApplied {
            session: self.id,
            record: record.clone(),
            by,
        });
        if game_over {
            // The side whose king was taken loses, even if it took its own.
            let winner = record.captured.map_or(record.color, |king| !king.color);
            info!("Session {} is over: {} wins", self.id, color_name(winner));
            self.events.publish(Event::GameOver {
                session: self.id,
                winner,
            });
        }
    }

    // The plan was built on a move that will not be played.
    fn discarded(&self, ticket: Ticket) {
        self.plans.invalidate();
        self.events.publish(Event::ResponseDiscarded {
            session: self.id,
            color: ticket.color,
            generation: ticket.generation,
        });
    }

    fn publish_failure(&self, color: Color, err: &AdvisorError) {
        self.events.publish(Event::AdvisoryFailed {
            session: self.id,
            color,
            reason: err.to_string(),
        });
    }
}
