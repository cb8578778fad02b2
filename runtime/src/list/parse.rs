//! Splitting list text into element strings

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListParseError {
    #[error("unmatched open brace in list")]
    UnmatchedBrace,

    #[error("unmatched open quote in list")]
    UnmatchedQuote,

    #[error("list element in braces followed by \"{0}\" instead of space")]
    ExtraAfterBrace(char),

    #[error("list element in quotes followed by \"{0}\" instead of space")]
    ExtraAfterQuote(char),
}

/// The whitespace characters that separate list elements
pub fn is_list_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\u{b}' | '\u{c}')
}

/// Split the textual form of a list into its elements.  Elements are
/// separated by whitespace and may be wrapped in braces, which nest and
/// prevent substitution, or quotes, which allow backslash escapes.
pub fn split_list(text: &str) -> Result<Vec<String>, ListParseError> {
    let mut parser = ListParser {
        source: text.chars().collect(),
        current: 0,
    };

    let mut elements = vec![];
    loop {
        parser.skip_space();
        if parser.peek().is_none() {
            break;
        }
        elements.push(parser.element()?);
    }

    Ok(elements)
}

struct ListParser {
    source: Vec<char>,
    current: usize,
}

impl ListParser {
    fn peek(&self) -> Option<char> {
        self.source.get(self.current).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.current += 1;
        Some(ch)
    }

    fn skip_space(&mut self) {
        while self.peek().map(is_list_space).unwrap_or(false) {
            self.current += 1;
        }
    }

    fn element(&mut self) -> Result<String, ListParseError> {
        match self.peek() {
            Some('{') => self.braced(),
            Some('"') => self.quoted(),
            _ => Ok(self.bare()),
        }
    }

    fn braced(&mut self) -> Result<String, ListParseError> {
        self.advance();
        let mut element = String::new();
        let mut depth = 1usize;

        loop {
            let ch = self.advance().ok_or(ListParseError::UnmatchedBrace)?;
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                '\\' => {
                    // escaped braces do not count towards nesting
                    element.push(ch);
                    if let Some(next) = self.advance() {
                        element.push(next);
                    }
                    continue;
                }
                _ => (),
            }
            element.push(ch);
        }

        match self.peek() {
            Some(ch) if !is_list_space(ch) => Err(ListParseError::ExtraAfterBrace(ch)),
            _ => Ok(element),
        }
    }

    fn quoted(&mut self) -> Result<String, ListParseError> {
        self.advance();
        let mut element = String::new();

        loop {
            match self.advance().ok_or(ListParseError::UnmatchedQuote)? {
                '"' => break,
                '\\' => self.escape(&mut element),
                ch => element.push(ch),
            }
        }

        match self.peek() {
            Some(ch) if !is_list_space(ch) => Err(ListParseError::ExtraAfterQuote(ch)),
            _ => Ok(element),
        }
    }

    fn bare(&mut self) -> String {
        let mut element = String::new();

        while let Some(ch) = self.peek() {
            if is_list_space(ch) {
                break;
            }
            self.advance();

            if ch == '\\' {
                self.escape(&mut element);
            } else {
                element.push(ch);
            }
        }

        element
    }

    /// Consume the character after a backslash, pushing its meaning
    fn escape(&mut self, element: &mut String) {
        let ch = match self.advance() {
            Some(ch) => ch,
            None => {
                element.push('\\');
                return;
            }
        };

        let result = match ch {
            'a' => '\u{7}', // alarm
            'b' => '\u{8}', // backspace
            'f' => '\u{c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{b}',
            '\n' => {
                // line continuation, the newline and any following indent
                // become a single space
                while matches!(self.peek(), Some(' ' | '\t')) {
                    self.advance();
                }
                ' '
            }
            ch => ch,
        };

        element.push(result);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn split(text: &str) -> Vec<String> {
        split_list(text).unwrap()
    }

    #[test]
    fn bare_words() {
        assert_eq!(split("  a b\tc\n d  "), vec!["a", "b", "c", "d"]);
        assert!(split("").is_empty());
        assert!(split(" \n ").is_empty());
    }

    #[test]
    fn braces_nest() {
        assert_eq!(split("{a {b c}} d"), vec!["a {b c}", "d"]);
        assert_eq!(split("{}"), vec![""]);
        assert_eq!(split("{a\\}b}"), vec!["a\\}b"]);
    }

    #[test]
    fn quotes_and_escapes() {
        assert_eq!(split("\"a b\" c\\ d"), vec!["a b", "c d"]);
        assert_eq!(split("x\\ty"), vec!["x\ty"]);
        assert_eq!(split("\\#a"), vec!["#a"]);
    }

    #[test]
    fn errors() {
        assert_eq!(split_list("{a"), Err(ListParseError::UnmatchedBrace));
        assert_eq!(split_list("\"a"), Err(ListParseError::UnmatchedQuote));
        assert_eq!(split_list("{a}b"), Err(ListParseError::ExtraAfterBrace('b')));
        assert_eq!(split_list("\"a\"b"), Err(ListParseError::ExtraAfterQuote('b')));
    }
}
