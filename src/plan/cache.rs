// src/plan/cache.rs

use super::{build_plan, Plan};
use crate::advisor::{dispatch, AdvisorClient, AdvisorReply, AdvisorRequest, PlannedTurn};
use crate::error::{color_name, AdvisorError};
use crate::game::{Fingerprint, GameState, Move};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use shakmaty::Color;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

type RefillFuture = Shared<BoxFuture<'static, Result<Vec<PlannedTurn>, AdvisorError>>>;

/// How `PlanCache::next` produced its move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanOutcome {
    /// Served from the stored plan without contacting the advisor.
    Hit(Move),
    /// First move of a plan fetched for this call.
    Fresh(Move),
    /// Direct single-move suggestion. `discarded_plan` is set when a stored
    /// plan no longer matched the position and was thrown away.
    Fallback { mv: Move, discarded_plan: bool },
}

impl PlanOutcome {
    pub fn mv(&self) -> Move {
        match *self {
            PlanOutcome::Hit(mv) | PlanOutcome::Fresh(mv) => mv,
            PlanOutcome::Fallback { mv, .. } => mv,
        }
    }
}

struct PendingRefill {
    id: u64,
    epoch: u64,
    fingerprint: Fingerprint,
    future: RefillFuture,
}

#[derive(Default)]
struct CacheState {
    plans: HashMap<Color, Plan>,
    pending: HashMap<Color, PendingRefill>,
    epoch: u64,
    next_refill_id: u64,
}

enum Lookup {
    Hit(Move),
    Refill,
    Mismatch,
}

/// Per-session store of advisor plans, one per advisory color.
///
/// At most one refill per color is in flight. A second caller joins the
/// pending request instead of issuing another one.
pub struct PlanCache {
    advisor: Arc<dyn AdvisorClient>,
    timeout: Duration,
    state: Mutex<CacheState>,
}

impl PlanCache {
    pub fn new(advisor: Arc<dyn AdvisorClient>, timeout: Duration) -> Self {
        Self {
            advisor,
            timeout,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Next move for `color` in `game`, from the plan when it still matches.
    pub async fn next(&self, game: &GameState, color: Color, depth: u8) -> Result<PlanOutcome, AdvisorError> {
        let fingerprint = game.fingerprint();

        let lookup = {
            let mut state = self.state.lock().unwrap();
            let popped = state.plans.get_mut(&color).and_then(Plan::pop_front);
            let exhausted = state.plans.get(&color).map_or(false, Plan::is_empty);
            match popped {
                Some(entry) if entry.expected == fingerprint => {
                    if exhausted {
                        state.plans.remove(&color);
                    }
                    Lookup::Hit(entry.mv)
                }
                Some(entry) => {
                    state.plans.remove(&color);
                    warn!(
                        "Plan for {} expected position {} but found {}; discarding it",
                        color_name(color),
                        entry.expected,
                        fingerprint
                    );
                    Lookup::Mismatch
                }
                None => {
                    state.plans.remove(&color);
                    Lookup::Refill
                }
            }
        };

        match lookup {
            Lookup::Hit(mv) => {
                debug!("Plan hit for {}: {mv}", color_name(color));
                Ok(PlanOutcome::Hit(mv))
            }
            Lookup::Mismatch => {
                let mv = self.suggest(game, color).await?;
                Ok(PlanOutcome::Fallback { mv, discarded_plan: true })
            }
            Lookup::Refill => match self.refill(game, color, depth).await? {
                Some(mv) => Ok(PlanOutcome::Fresh(mv)),
                None => {
                    info!("Advisor returned no usable plan for {}", color_name(color));
                    let mv = self.suggest(game, color).await?;
                    Ok(PlanOutcome::Fallback { mv, discarded_plan: false })
                }
            },
        }
    }

    /// Fetches a plan of up to `depth` turns, installs all but its first
    /// entry and returns that first move. `None` means the advisor's plan
    /// did not survive replay.
    pub async fn refill(&self, game: &GameState, color: Color, depth: u8) -> Result<Option<Move>, AdvisorError> {
        let fingerprint = game.fingerprint();

        let (id, owner, epoch, requested_for, future) = {
            let mut state = self.state.lock().unwrap();
            if let Some(pending) = state.pending.get(&color) {
                debug!("Joining in-flight refill for {}", color_name(color));
                (pending.id, false, pending.epoch, pending.fingerprint, pending.future.clone())
            } else {
                let id = state.next_refill_id;
                state.next_refill_id += 1;
                let epoch = state.epoch;
                let future = self.request_plan(game, color, depth);
                state.pending.insert(
                    color,
                    PendingRefill {
                        id,
                        epoch,
                        fingerprint,
                        future: future.clone(),
                    },
                );
                info!("Requesting a {depth}-turn plan for {}", color_name(color));
                (id, true, epoch, fingerprint, future)
            }
        };

        let outcome = future.await;

        let mut state = self.state.lock().unwrap();
        if state.pending.get(&color).map_or(false, |pending| pending.id == id) {
            state.pending.remove(&color);
        }
        let turns = outcome?;

        if epoch != state.epoch {
            info!("Dropping plan for {} requested before invalidation", color_name(color));
            return Err(AdvisorError::Stale);
        }
        if requested_for != fingerprint {
            debug!("Joined refill for {} was made for another position", color_name(color));
            return Err(AdvisorError::Stale);
        }

        let mut plan = build_plan(game, color, &turns);
        let first = plan.pop_front();
        // Only the caller that issued the request stores the plan.
        if owner {
            if plan.is_empty() {
                state.plans.remove(&color);
            } else {
                debug!("Stored {} planned moves for {}", plan.len(), color_name(color));
                state.plans.insert(color, plan);
            }
        }
        Ok(first.map(|entry| entry.mv))
    }

    /// Discards every plan. Refills already in flight are dropped on arrival.
    pub fn invalidate(&self) {
        let mut state = self.state.lock().unwrap();
        state.plans.clear();
        state.epoch += 1;
        debug!("Plan cache invalidated (epoch {})", state.epoch);
    }

    pub fn remaining(&self, color: Color) -> usize {
        self.state.lock().unwrap().plans.get(&color).map_or(0, Plan::len)
    }

    pub fn refill_in_flight(&self, color: Color) -> bool {
        self.state.lock().unwrap().pending.contains_key(&color)
    }

    async fn suggest(&self, game: &GameState, color: Color) -> Result<Move, AdvisorError> {
        let request = AdvisorRequest::suggest(game.board(), color, game.ledger().records());
        dispatch(self.advisor.as_ref(), request, self.timeout).await?.into_move()
    }

    fn request_plan(&self, game: &GameState, color: Color, depth: u8) -> RefillFuture {
        let advisor = Arc::clone(&self.advisor);
        let request = AdvisorRequest::plan(game.board(), color, depth);
        let timeout = self.timeout;
        async move {
            dispatch(advisor.as_ref(), request, timeout)
                .await
                .and_then(AdvisorReply::into_plan)
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
mod tests;
