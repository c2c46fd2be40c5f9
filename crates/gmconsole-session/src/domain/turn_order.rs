//! Initiative order and the current-turn pointer.

use std::fmt;

/// One slot in the initiative order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnEntry {
    pub name: String,
    pub score: i32,
}

impl fmt::Display for TurnEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.score)
    }
}

/// Initiative order with a 1-based turn pointer.
///
/// Pointer 0 means "no turn yet" (idle, or just before the first turn). While
/// combat is active the pointer cycles through `1..=len` and never returns
/// to 0. In the rendered list, slot 0 is the unused sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnOrder {
    entries: Vec<TurnEntry>,
    current: usize,
}

impl TurnOrder {
    /// Starts combat with `rolls` sorted descending by score (ties keep their
    /// input order), dropping any repeated name, then advances to turn 1.
    /// An empty list leaves combat idle.
    pub fn start(&mut self, mut rolls: Vec<TurnEntry>) {
        rolls.sort_by(|a, b| b.score.cmp(&a.score));
        let mut entries: Vec<TurnEntry> = Vec::with_capacity(rolls.len());
        for roll in rolls {
            if !entries.iter().any(|e| e.name == roll.name) {
                entries.push(roll);
            }
        }
        self.entries = entries;
        self.current = 0;
        self.advance();
    }

    /// Moves to the next turn, wrapping from the last entry back to 1.
    pub fn advance(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        if self.current < self.entries.len() {
            self.current += 1;
        } else {
            self.current = 1;
        }
    }

    /// Moves to the previous turn; stays put at turn 1.
    pub fn retreat(&mut self) {
        if self.current > 1 {
            self.current -= 1;
        }
    }

    /// Ends combat.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current = 0;
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.entries.is_empty()
    }

    /// The current-turn pointer (0 when idle).
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The entry whose turn it is.
    #[must_use]
    pub fn current(&self) -> Option<&TurnEntry> {
        self.current
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
    }

    #[must_use]
    pub fn entries(&self) -> &[TurnEntry] {
        &self.entries
    }

    /// Length of the order including the sentinel slot; 0 when idle.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        if self.entries.is_empty() {
            0
        } else {
            self.entries.len() + 1
        }
    }

    /// Rendered `"<Name> (<score>)"` lines in turn order.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }
}
