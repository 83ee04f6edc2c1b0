// src/game/ledger.rs

use super::codes::{color_serde, opt_piece_serde, piece_serde, square_serde};
use serde::{Deserialize, Serialize};
use shakmaty::{Color, Piece, Square};

/// One applied half-move. Never modified after it is appended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    #[serde(with = "square_serde")]
    pub from: Square,
    #[serde(with = "square_serde")]
    pub to: Square,
    #[serde(with = "piece_serde")]
    pub piece: Piece,
    #[serde(with = "color_serde")]
    pub color: Color,
    #[serde(with = "opt_piece_serde", rename = "captured_piece")]
    pub captured: Option<Piece>,
    pub is_capture: bool,
    #[serde(rename = "algebraic_notation")]
    pub notation: String,
    pub turn_number: u32,
}

/// Half-move index `i` belongs to full turn `i / 2 + 1`.
pub fn turn_number_for(index: usize) -> u32 {
    (index / 2 + 1) as u32
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveLedger {
    records: Vec<MoveRecord>,
}

impl MoveLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a ledger from boundary data; turn numbers must be consistent.
    pub fn from_records(records: Vec<MoveRecord>) -> Option<Self> {
        let consistent = records
            .iter()
            .enumerate()
            .all(|(i, record)| record.turn_number == turn_number_for(i));
        consistent.then_some(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[MoveRecord] {
        &self.records
    }

    /// Turn number the next appended record will carry.
    pub fn next_turn_number(&self) -> u32 {
        turn_number_for(self.records.len())
    }

    /// Movetext in the usual `1. e4 e5 2. Nf3` layout.
    pub fn movetext(&self) -> String {
        let mut text = String::new();
        for (i, record) in self.records.iter().enumerate() {
            if i % 2 == 0 {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(&format!("{}. ", record.turn_number));
            } else {
                text.push(' ');
            }
            text.push_str(&record.notation);
        }
        text
    }

    pub(crate) fn append(&mut self, record: MoveRecord) {
        self.records.push(record);
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }
}
