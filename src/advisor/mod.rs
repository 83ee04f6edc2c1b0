// src/advisor/mod.rs
//
// Boundary to the move-advisory service. Everything the core asks of the
// service goes through `dispatch`, which bounds each call with a timeout.

pub mod local;
pub mod movegen;

use crate::error::AdvisorError;
use crate::game::codes::color_serde;
use crate::game::{BoardState, Move, MoveRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shakmaty::Color;
use std::time::Duration;
use tracing::{debug, warn};

pub use local::LocalAdvisor;

/// One advisory turn of a plan: the advised side's move and the opponent
/// reply the advisor expects to follow it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedTurn {
    pub mv: Move,
    pub expected_reply: Option<Move>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Speaker,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub reply: String,
    pub history: Vec<ConversationMessage>,
}

#[async_trait]
pub trait AdvisorClient: Send + Sync {
    async fn suggest_move(
        &self,
        board: &BoardState,
        color: Color,
        history: &[MoveRecord],
    ) -> Result<Move, AdvisorError>;

    /// Up to `depth` planned turns for `color`, in playing order.
    async fn plan_moves(
        &self,
        board: &BoardState,
        color: Color,
        depth: u8,
    ) -> Result<Vec<PlannedTurn>, AdvisorError>;

    async fn analyze(&self, board: &BoardState, turn: Color) -> Result<String, AdvisorError>;

    async fn converse(
        &self,
        message: &str,
        history: &[ConversationMessage],
    ) -> Result<Conversation, AdvisorError>;
}

/// Everything that can be asked of the advisory service.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdvisorRequest {
    Suggest {
        board_fen: String,
        #[serde(skip)]
        board: BoardState,
        #[serde(with = "color_serde")]
        color: Color,
        #[serde(skip)]
        history: Vec<MoveRecord>,
    },
    Plan {
        board_fen: String,
        #[serde(skip)]
        board: BoardState,
        #[serde(with = "color_serde")]
        color: Color,
        depth: u8,
    },
    Analyze {
        board_fen: String,
        #[serde(skip)]
        board: BoardState,
        #[serde(with = "color_serde")]
        turn: Color,
    },
    Converse {
        message: String,
        history: Vec<ConversationMessage>,
    },
}

impl AdvisorRequest {
    pub fn suggest(board: &BoardState, color: Color, history: &[MoveRecord]) -> Self {
        AdvisorRequest::Suggest {
            board_fen: board.placement_fen(),
            board: board.clone(),
            color,
            history: history.to_vec(),
        }
    }

    pub fn plan(board: &BoardState, color: Color, depth: u8) -> Self {
        AdvisorRequest::Plan {
            board_fen: board.placement_fen(),
            board: board.clone(),
            color,
            depth,
        }
    }

    pub fn analyze(board: &BoardState, turn: Color) -> Self {
        AdvisorRequest::Analyze {
            board_fen: board.placement_fen(),
            board: board.clone(),
            turn,
        }
    }

    pub fn converse(message: &str, history: &[ConversationMessage]) -> Self {
        AdvisorRequest::Converse {
            message: message.to_string(),
            history: history.to_vec(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AdvisorRequest::Suggest { .. } => "suggest",
            AdvisorRequest::Plan { .. } => "plan",
            AdvisorRequest::Analyze { .. } => "analyze",
            AdvisorRequest::Converse { .. } => "converse",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdvisorReply {
    Move(Move),
    Plan(Vec<PlannedTurn>),
    Analysis(String),
    Conversation(Conversation),
}

impl AdvisorReply {
    fn variant(&self) -> &'static str {
        match self {
            AdvisorReply::Move(_) => "move",
            AdvisorReply::Plan(_) => "plan",
            AdvisorReply::Analysis(_) => "analysis",
            AdvisorReply::Conversation(_) => "conversation",
        }
    }

    fn unexpected(self, wanted: &str) -> AdvisorError {
        AdvisorError::Malformed(format!("expected a {wanted} reply, got {}", self.variant()))
    }

    pub fn into_move(self) -> Result<Move, AdvisorError> {
        match self {
            AdvisorReply::Move(mv) => Ok(mv),
            other => Err(other.unexpected("move")),
        }
    }

    pub fn into_plan(self) -> Result<Vec<PlannedTurn>, AdvisorError> {
        match self {
            AdvisorReply::Plan(turns) => Ok(turns),
            other => Err(other.unexpected("plan")),
        }
    }

    pub fn into_analysis(self) -> Result<String, AdvisorError> {
        match self {
            AdvisorReply::Analysis(text) => Ok(text),
            other => Err(other.unexpected("analysis")),
        }
    }

    pub fn into_conversation(self) -> Result<Conversation, AdvisorError> {
        match self {
            AdvisorReply::Conversation(conversation) => Ok(conversation),
            other => Err(other.unexpected("conversation")),
        }
    }
}

/// Sends one request to the advisor, bounded by `limit`. A timeout is
/// reported like any other failure.
pub async fn dispatch(
    client: &dyn AdvisorClient,
    request: AdvisorRequest,
    limit: Duration,
) -> Result<AdvisorReply, AdvisorError> {
    let kind = request.kind();
    debug!("Advisor request: {kind}");

    let call = async {
        match &request {
            AdvisorRequest::Suggest { board, color, history, .. } => client
                .suggest_move(board, *color, history)
                .await
                .map(AdvisorReply::Move),
            AdvisorRequest::Plan { board, color, depth, .. } => {
                let mut turns = client.plan_moves(board, *color, *depth).await?;
                turns.truncate(*depth as usize);
                Ok(AdvisorReply::Plan(turns))
            }
            AdvisorRequest::Analyze { board, turn, .. } => client
                .analyze(board, *turn)
                .await
                .map(AdvisorReply::Analysis),
            AdvisorRequest::Converse { message, history } => client
                .converse(message, history)
                .await
                .map(AdvisorReply::Conversation),
        }
    };

    match tokio::time::timeout(limit, call).await {
        Ok(Ok(reply)) => Ok(reply),
        Ok(Err(err)) => {
            warn!("Advisor {kind} request failed: {err}");
            Err(err)
        }
        Err(_) => {
            warn!("Advisor {kind} request timed out after {limit:?}");
            Err(AdvisorError::Timeout(limit))
        }
    }
}

#[cfg(test)]
pub mod testing;
