// src/event/mod.rs

use crate::config::StrategyConfig;
use crate::constants::EVENT_CHANNEL_CAPACITY;
use crate::game::codes::color_serde;
use crate::game::MoveRecord;
use crate::orchestrator::Controller;
use crate::session::SessionId;
use serde::Serialize;
use shakmaty::Color;
use tokio::sync::broadcast;

/// Everything a session reports to the outside world.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    MoveApplied {
        session: SessionId,
        record: MoveRecord,
        by: Controller,
    },
    AdvisoryFailed {
        session: SessionId,
        #[serde(with = "color_serde")]
        color: Color,
        reason: String,
    },
    ResponseDiscarded {
        session: SessionId,
        #[serde(with = "color_serde")]
        color: Color,
        generation: u64,
    },
    PlanDiscarded {
        session: SessionId,
        #[serde(with = "color_serde")]
        color: Color,
    },
    GameOver {
        session: SessionId,
        #[serde(with = "color_serde")]
        winner: Color,
    },
    GameReset {
        session: SessionId,
    },
    ConfigChanged {
        session: SessionId,
        config: StrategyConfig,
    },
    ControllerChanged {
        session: SessionId,
        #[serde(with = "color_serde")]
        color: Color,
        controller: Controller,
    },
    Analysis {
        session: SessionId,
        text: String,
    },
    AssistantReply {
        session: SessionId,
        reply: String,
    },
}

#[derive(Clone)]
pub struct EventBroker {
    sender: broadcast::Sender<Event>,
}

impl EventBroker {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, event: Event) {
        // No subscribers is fine.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}

impl Default for EventBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_publish_without_subscribers() {
        let broker = EventBroker::new();
        broker.publish(Event::GameReset { session: Uuid::new_v4() });
    }

    #[test]
    fn test_subscribers_receive_events() {
        let broker = EventBroker::new();
        let mut rx = broker.subscribe();
        let session = Uuid::new_v4();
        broker.publish(Event::PlanDiscarded { session, color: Color::Black });

        match rx.try_recv().unwrap() {
            Event::PlanDiscarded { session: got, color } => {
                assert_eq!(got, session);
                assert_eq!(color, Color::Black);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_events_serialize_with_type_tag() {
        let session = Uuid::nil();
        let json = serde_json::to_value(Event::GameOver { session, winner: Color::White }).unwrap();
        assert_eq!(json["type"], "GameOver");
        assert_eq!(json["payload"]["winner"], "white");
        assert_eq!(json["payload"]["session"], "00000000-0000-0000-0000-000000000000");
    }
}
