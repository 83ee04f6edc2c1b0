// src/app/render.rs

use crate::error::color_name;
use crate::event::Event;
use crate::game::{GameSnapshot, MoveLedger};
use crate::orchestrator::Controller;

/// Text board, rank 8 at the top, with file and rank labels.
pub fn board(snapshot: &GameSnapshot) -> String {
    let mut out = String::new();
    for rank in (1..=8).rev() {
        out.push_str(&format!("{rank} "));
        for file in ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'] {
            let code = snapshot
                .board
                .get(&format!("{file}{rank}"))
                .copied()
                .unwrap_or('?');
            out.push(' ');
            out.push(code);
        }
        out.push('\n');
    }
    out.push_str("   a b c d e f g h\n");
    if snapshot.game_over {
        out.push_str("game over");
    } else {
        out.push_str(&format!("{} to move", color_name(snapshot.turn)));
    }
    out
}

pub fn history(ledger: &MoveLedger) -> String {
    if ledger.is_empty() {
        "no moves yet".to_string()
    } else {
        ledger.movetext()
    }
}

/// One line per event worth showing, `None` for the rest.
pub fn event(event: &Event) -> Option<String> {
    match event {
        Event::MoveApplied { record, by, .. } => {
            let who = match by {
                Controller::Human => "you",
                Controller::Advisory => "advisor",
            };
            Some(format!(
                "{}{} {} ({}, {who})",
                record.turn_number,
                if record.color == shakmaty::Color::White { "." } else { "..." },
                record.notation,
                color_name(record.color)
            ))
        }
        Event::AdvisoryFailed { color, reason, .. } => {
            Some(format!("advisor for {} failed: {reason}; retrying", color_name(*color)))
        }
        Event::GameOver { winner, .. } => Some(format!("game over, {} wins", color_name(*winner))),
        Event::GameReset { .. } => Some("new game".to_string()),
        Event::ConfigChanged { config, .. } => Some(format!(
            "strategy: {:?}, depth {}",
            config.mode, config.cache_depth
        )),
        Event::ControllerChanged { color, controller, .. } => {
            Some(format!("{} is now {:?}", color_name(*color), controller).to_lowercase())
        }
        Event::Analysis { text, .. } => Some(format!("analysis: {text}")),
        Event::AssistantReply { reply, .. } => Some(format!("assistant: {reply}")),
        Event::ResponseDiscarded { .. } | Event::PlanDiscarded { .. } => None,
    }
}
