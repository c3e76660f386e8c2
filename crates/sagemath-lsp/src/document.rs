use tower_lsp::lsp_types::{Position, Range};

/// Represents an open document in the LSP server
pub struct Document {
    /// Lines of the document (cached for position calculations)
    lines: Vec<String>,
}

/// An identifier found at a position, with its range on the line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub range: Range,
}

impl Document {
    pub fn new(text: String) -> Self {
        Self {
            lines: split_lines(&text),
        }
    }

    pub fn update_text(&mut self, new_text: String) {
        self.lines = split_lines(&new_text);
    }

    /// Get the word touching a position. A cursor just past the last
    /// character of a word still counts as being on it.
    ///
    /// `position.character` and the returned range are in UTF-16 code units.
    pub fn word_at(&self, position: Position) -> Option<Word> {
        let chars = self.line_chars(position.line)?;
        let char_idx = char_index(&chars, position.character)?;

        // Find start of word
        let mut start = char_idx;
        while start > 0 && is_word_char(chars[start - 1]) {
            start -= 1;
        }

        // Find end of word
        let mut end = char_idx;
        while end < chars.len() && is_word_char(chars[end]) {
            end += 1;
        }

        if start < end {
            Some(Word {
                text: chars[start..end].iter().collect(),
                range: Range::new(
                    Position::new(position.line, utf16_offset(&chars[..start])),
                    Position::new(position.line, utf16_offset(&chars[..end])),
                ),
            })
        } else {
            None
        }
    }

    /// The part of the word left of the cursor, used as the completion prefix
    pub fn prefix_at(&self, position: Position) -> String {
        let Some(chars) = self.line_chars(position.line) else {
            return String::new();
        };
        let end = char_index(&chars, position.character).unwrap_or(chars.len());

        let mut start = end;
        while start > 0 && is_word_char(chars[start - 1]) {
            start -= 1;
        }
        chars[start..end].iter().collect()
    }

    fn line_chars(&self, line: u32) -> Option<Vec<char>> {
        self.lines
            .get(line as usize)
            .map(|l| l.chars().collect())
    }
}

/// Char index for a UTF-16 column, or `None` past the end of the line.
/// A column inside a surrogate pair resolves to that character.
fn char_index(chars: &[char], column: u32) -> Option<usize> {
    let column = column as usize;
    let mut units = 0;
    for (idx, c) in chars.iter().enumerate() {
        if units >= column {
            return Some(idx);
        }
        units += c.len_utf16();
        if units > column {
            return Some(idx);
        }
    }
    (units == column).then_some(chars.len())
}

fn utf16_offset(chars: &[char]) -> u32 {
    chars.iter().map(|c| c.len_utf16() as u32).sum()
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(|s| s.to_string()).collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_in_middle() {
        let doc = Document::new("x = sin(pi)\n".to_string());
        let word = doc.word_at(Position::new(0, 5)).unwrap();
        assert_eq!(word.text, "sin");
        assert_eq!(word.range, Range::new(Position::new(0, 4), Position::new(0, 7)));
    }

    #[test]
    fn test_word_at_end_of_word() {
        let doc = Document::new("x = sin(pi)".to_string());
        assert_eq!(doc.word_at(Position::new(0, 10)).unwrap().text, "pi");
    }

    #[test]
    fn test_no_word_on_whitespace() {
        let doc = Document::new("a  b".to_string());
        assert!(doc.word_at(Position::new(0, 2)).is_none());
    }

    #[test]
    fn test_out_of_range() {
        let doc = Document::new("sin".to_string());
        assert!(doc.word_at(Position::new(3, 0)).is_none());
        assert!(doc.word_at(Position::new(0, 9)).is_none());
        assert_eq!(doc.prefix_at(Position::new(3, 0)), "");
    }

    #[test]
    fn test_prefix_stops_at_cursor() {
        let doc = Document::new("y = sqrt(2)".to_string());
        assert_eq!(doc.prefix_at(Position::new(0, 6)), "sq");
        assert_eq!(doc.prefix_at(Position::new(0, 4)), "");
    }

    #[test]
    fn test_non_ascii_line() {
        let doc = Document::new("é = gamma".to_string());
        assert_eq!(doc.word_at(Position::new(0, 5)).unwrap().text, "gamma");
        assert_eq!(doc.word_at(Position::new(0, 0)).unwrap().text, "é");
    }

    #[test]
    fn test_columns_count_utf16_units() {
        // U+1D53D takes two UTF-16 units
        let doc = Document::new("𝔽 = GF(7)".to_string());
        let word = doc.word_at(Position::new(0, 5)).unwrap();
        assert_eq!(word.text, "GF");
        assert_eq!(word.range, Range::new(Position::new(0, 5), Position::new(0, 7)));

        let field = doc.word_at(Position::new(0, 0)).unwrap();
        assert_eq!(field.text, "𝔽");
        assert_eq!(field.range.end, Position::new(0, 2));

        assert_eq!(doc.prefix_at(Position::new(0, 6)), "G");
        assert!(doc.word_at(Position::new(0, 10)).is_none());
    }

    #[test]
    fn test_update_text() {
        let mut doc = Document::new("sin".to_string());
        doc.update_text("one\ntwo".to_string());
        assert!(doc.word_at(Position::new(0, 0)).unwrap().text == "one");
        assert_eq!(doc.word_at(Position::new(1, 1)).unwrap().text, "two");
    }
}
