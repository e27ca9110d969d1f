use crate::token::Position;

/// Character-at-a-time input with line/column bookkeeping.
///
/// The lexer pulls from this seam; anything that can hand out characters
/// with positions can drive an interpretation run.
pub trait Source {
    /// Advances to and returns the next character, or `None` at end of input.
    fn next_char(&mut self) -> Option<char>;

    /// Position of the most recently returned character.
    fn position(&self) -> Position;
}

/// In-memory source over program text.
pub struct StringSource {
    chars: Vec<char>,
    index: usize,
    line: usize,
    column: usize,
}

impl StringSource {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            index: 0,
            line: 1,
            column: 0,
        }
    }
}

impl Source for StringSource {
    fn next_char(&mut self) -> Option<char> {
        let ch = *self.chars.get(self.index)?;
        self.index += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }
}
