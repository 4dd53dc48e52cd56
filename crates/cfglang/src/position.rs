use serde::{Deserialize, Serialize};
use std::fmt;

/// A position expressed as a 1-based line/column pair (matching what users
/// see in editors and error messages).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    #[inline]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Move past `ch`: a newline starts the next line at column 1, anything
    /// else advances the column.
    #[inline]
    pub fn advance(&mut self, ch: char) {
        if ch == '\n' {
            self.next_line();
        } else {
            self.column += 1;
        }
    }

    #[inline]
    pub fn next_line(&mut self) {
        self.line += 1;
        self.column = 1;
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.line, self.column)
    }
}
