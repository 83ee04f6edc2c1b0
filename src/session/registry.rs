// src/session/registry.rs

use super::{GameSession, SessionId, SessionSettings};
use crate::advisor::AdvisorClient;
use crate::error::GameError;
use crate::event::{Event, EventBroker};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::info;
use uuid::Uuid;

/// Live sessions by id. Sessions are created on first access and live until
/// `terminate`.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionId, Arc<GameSession>>>,
    advisor: Arc<dyn AdvisorClient>,
    settings: SessionSettings,
    events: EventBroker,
}

impl SessionRegistry {
    pub fn new(advisor: Arc<dyn AdvisorClient>, settings: SessionSettings) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            advisor,
            settings,
            events: EventBroker::new(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Starts a session under a fresh id.
    pub fn create(&self) -> Result<Arc<GameSession>, GameError> {
        self.get_or_create(Uuid::new_v4())
    }

    pub fn get(&self, id: SessionId) -> Option<Arc<GameSession>> {
        self.sessions.lock().unwrap().get(&id).cloned()
    }

    pub fn get_or_create(&self, id: SessionId) -> Result<Arc<GameSession>, GameError> {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(session) = sessions.get(&id) {
            return Ok(Arc::clone(session));
        }
        let session = Arc::new(GameSession::new(
            id,
            self.settings,
            Arc::clone(&self.advisor),
            self.events.clone(),
        )?);
        sessions.insert(id, Arc::clone(&session));
        Ok(session)
    }

    /// Drops the session. Work already running on it finishes on its own.
    pub fn terminate(&self, id: SessionId) -> bool {
        let removed = self.sessions.lock().unwrap().remove(&id).is_some();
        if removed {
            info!("Session {id} terminated");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
