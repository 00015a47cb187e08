//! Sample entities shared by the integration tests.
#![allow(dead_code)]

use structeq_core::EqualityDefinition;

/// A reading with a single designated integer member.
#[derive(Debug, EqualityDefinition)]
pub struct Reading {
    #[equality]
    pub numeric: i32,
}

impl Reading {
    pub fn new(numeric: i32) -> Self {
        Self { numeric }
    }
}

/// Inherits `Reading`'s members and adds a designated label. `note` is not
/// designated and never affects equality.
#[derive(Debug, EqualityDefinition)]
pub struct LabeledReading {
    #[equality(base)]
    pub reading: Reading,
    #[equality]
    pub label: String,
    pub note: String,
}

impl LabeledReading {
    pub fn new(numeric: i32, label: &str) -> Self {
        Self {
            reading: Reading::new(numeric),
            label: label.to_string(),
            note: String::new(),
        }
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = note.to_string();
        self
    }
}

pub fn setup() {
    structeq_observability::init();
}
