//! Source positions shared between the semantic model and the graph.
//!
//! Positions are zero-based line/character pairs, matching the range vertices
//! the graph emits.

use serde::{Deserialize, Serialize};

/// A zero-based line/character position.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Position {
    /// Line number (0-indexed).
    pub line: u32,
    /// Character offset within the line (0-indexed).
    pub character: u32,
}

impl Position {
    /// Create a new position.
    pub fn new(line: u32, character: u32) -> Self {
        Position { line, character }
    }
}

/// A half-open source range `[start, end)`.
///
/// Ordering is by start, then end, which is the source order the engine
/// relies on when sorting occurrences within a document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Create a new range.
    pub fn new(start: Position, end: Position) -> Self {
        Range { start, end }
    }

    /// Create a range on a single line.
    pub fn on_line(line: u32, start_character: u32, end_character: u32) -> Self {
        Range {
            start: Position::new(line, start_character),
            end: Position::new(line, end_character),
        }
    }

    /// Check if this range contains another range entirely.
    pub fn contains(&self, other: &Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}
