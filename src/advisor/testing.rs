// src/advisor/testing.rs
//
// Scripted advisor for tests: replies come from queues filled up front and
// every call is counted.

use super::{AdvisorClient, Conversation, ConversationMessage, PlannedTurn, Speaker};
use crate::error::AdvisorError;
use crate::game::{BoardState, Move, MoveRecord};
use async_trait::async_trait;
use shakmaty::Color;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub struct ScriptedAdvisor {
    suggestions: Mutex<VecDeque<Move>>,
    plans: Mutex<VecDeque<Vec<PlannedTurn>>>,
    analysis: Option<String>,
    error: Option<AdvisorError>,
    delay: Option<Duration>,
    suggest_calls: AtomicUsize,
    plan_calls: AtomicUsize,
    analyze_calls: AtomicUsize,
}

fn parse(text: &str) -> Move {
    text.parse().unwrap()
}

impl ScriptedAdvisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_suggestion(self, mv: &str) -> Self {
        self.suggestions.lock().unwrap().push_back(parse(mv));
        self
    }

    pub fn with_plan(self, turns: &[(&str, Option<&str>)]) -> Self {
        let plan = turns
            .iter()
            .map(|(mv, reply)| PlannedTurn {
                mv: parse(mv),
                expected_reply: reply.map(parse),
            })
            .collect();
        self.plans.lock().unwrap().push_back(plan);
        self
    }

    pub fn with_analysis(mut self, text: &str) -> Self {
        self.analysis = Some(text.to_string());
        self
    }

    pub fn with_error(mut self, error: AdvisorError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn suggest_calls(&self) -> usize {
        self.suggest_calls.load(Ordering::SeqCst)
    }

    pub fn plan_calls(&self) -> usize {
        self.plan_calls.load(Ordering::SeqCst)
    }

    pub fn analyze_calls(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst)
    }

    async fn respond(&self) -> Result<(), AdvisorError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AdvisorClient for ScriptedAdvisor {
    async fn suggest_move(
        &self,
        _board: &BoardState,
        _color: Color,
        _history: &[MoveRecord],
    ) -> Result<Move, AdvisorError> {
        self.suggest_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await?;
        self.suggestions
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(AdvisorError::Unavailable)
    }

    async fn plan_moves(
        &self,
        _board: &BoardState,
        _color: Color,
        _depth: u8,
    ) -> Result<Vec<PlannedTurn>, AdvisorError> {
        self.plan_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await?;
        self.plans
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(AdvisorError::Unavailable)
    }

    async fn analyze(&self, _board: &BoardState, _turn: Color) -> Result<String, AdvisorError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await?;
        self.analysis.clone().ok_or(AdvisorError::Unavailable)
    }

    async fn converse(
        &self,
        message: &str,
        history: &[ConversationMessage],
    ) -> Result<Conversation, AdvisorError> {
        self.respond().await?;
        let reply = format!("echo: {message}");
        let mut history = history.to_vec();
        history.push(ConversationMessage { role: Speaker::User, content: message.to_string() });
        history.push(ConversationMessage { role: Speaker::Assistant, content: reply.clone() });
        Ok(Conversation { reply, history })
    }
}
