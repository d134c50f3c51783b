//! Input positions.

use std::fmt::{self, Display};

/// A position in the input: a byte offset plus the 1-based line and column
/// it corresponds to.
///
/// Cursors are plain values. Every backtracking point keeps the cursor it
/// started from and simply reuses it when a branch fails.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct Cursor {
    /// Byte offset into the input.
    pub offset: usize,

    /// Line number, starting at 1.
    pub line: usize,

    /// Column number in characters, starting at 1.
    pub column: usize,
}

impl Cursor {
    /// The cursor at the beginning of any input.
    pub const fn start() -> Cursor {
        Cursor { offset: 0, line: 1, column: 1 }
    }

    /// Consume `text`, which must be the input immediately following this cursor.
    pub fn advance_over(self, text: &str) -> Cursor {
        let mut next = self;
        for c in text.chars() {
            next.offset += c.len_utf8();
            if c == '\n' {
                next.line += 1;
                next.column = 1;
            } else {
                next.column += 1;
            }
        }
        next
    }

    /// Consume up to `n` characters of `input`, stopping early at the end.
    pub fn advance(self, input: &str, n: usize) -> Cursor {
        let rest = self.rest(input);
        let len = rest
            .char_indices()
            .nth(n)
            .map_or(rest.len(), |(i, _)| i);
        self.advance_over(&rest[..len])
    }

    pub fn at_end(&self, input: &str) -> bool {
        self.offset >= input.len()
    }

    /// The input that has not been consumed yet.
    pub fn rest<'input>(&self, input: &'input str) -> &'input str {
        &input[self.offset..]
    }

    /// The next character, if any.
    pub(crate) fn peek(&self, input: &str) -> Option<char> {
        self.rest(input).chars().next()
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Cursor::start()
    }
}

impl Display for Cursor {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "line {} col {}", self.line, self.column)
    }
}
