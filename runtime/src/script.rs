//! Parsing of scripts into commands and words.
//!
//! A script is a sequence of commands separated by newlines or semicolons.
//! Words are separated by spaces and tabs and are either braced (taken
//! literally, braces nest), quoted or bare.  Quoted and bare words may contain
//! `$name` and `${name}` variable references, `[script]` command
//! substitutions and backslash escapes.  A `#` where a command would start
//! comments out the rest of the line.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("missing close-brace")]
    MissingCloseBrace,

    #[error("missing \"")]
    MissingQuote,

    #[error("missing close-bracket")]
    MissingCloseBracket,

    #[error("extra characters after close-brace")]
    ExtraAfterBrace,

    #[error("extra characters after close-quote")]
    ExtraAfterQuote,
}

/// A piece of a word, substituted in order and concatenated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordPart {
    Literal(String),
    Variable(String),
    Command(Vec<Command>),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Word {
    pub parts: Vec<WordPart>,
}

impl Word {
    fn literal(text: String) -> Self {
        Self {
            parts: vec![WordPart::Literal(text)],
        }
    }

    /// Add literal text, merging with a preceding literal
    fn push_str(&mut self, text: &str) {
        if let Some(WordPart::Literal(last)) = self.parts.last_mut() {
            last.push_str(text);
        } else {
            self.parts.push(WordPart::Literal(text.to_string()));
        }
    }

    fn push_char(&mut self, ch: char) {
        let mut buf = [0; 4];
        self.push_str(ch.encode_utf8(&mut buf));
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Command {
    pub words: Vec<Word>,
}

pub fn parse_script(source: &str) -> Result<Vec<Command>, ScriptError> {
    let mut parser = ScriptParser {
        source: source.chars().collect(),
        current: 0,
    };
    parser.commands(None)
}

struct ScriptParser {
    source: Vec<char>,
    current: usize,
}

impl ScriptParser {
    fn peek(&self) -> Option<char> {
        self.source.get(self.current).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.source.get(self.current + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.current += 1;
        Some(ch)
    }

    /// Skip spaces, tabs and escaped newlines between words
    fn skip_blank(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r') => self.current += 1,
                Some('\\') if self.peek_next() == Some('\n') => self.current += 2,
                _ => break,
            }
        }
    }

    fn at_word_end(&self, terminator: Option<char>) -> bool {
        match self.peek() {
            None | Some(' ' | '\t' | '\r' | '\n' | ';') => true,
            Some(ch) => Some(ch) == terminator,
        }
    }

    /// Parse commands until the end of input or the terminator, which is
    /// consumed
    fn commands(&mut self, terminator: Option<char>) -> Result<Vec<Command>, ScriptError> {
        let mut commands = vec![];

        loop {
            while matches!(self.peek(), Some(' ' | '\t' | '\r' | '\n' | ';')) {
                self.current += 1;
            }

            match self.peek() {
                None if terminator.is_some() => return Err(ScriptError::MissingCloseBracket),
                None => return Ok(commands),
                Some(ch) if Some(ch) == terminator => {
                    self.advance();
                    return Ok(commands);
                }
                Some('#') => self.skip_comment(),
                Some(_) => commands.push(self.command(terminator)?),
            }
        }
    }

    fn skip_comment(&mut self) {
        while let Some(ch) = self.advance() {
            match ch {
                '\n' => break,
                '\\' => {
                    self.advance();
                }
                _ => (),
            }
        }
    }

    fn command(&mut self, terminator: Option<char>) -> Result<Command, ScriptError> {
        let mut command = Command::default();

        loop {
            self.skip_blank();
            match self.peek() {
                None | Some('\n' | ';') => break,
                Some(ch) if Some(ch) == terminator => break,
                Some(_) => command.words.push(self.word(terminator)?),
            }
        }

        Ok(command)
    }

    fn word(&mut self, terminator: Option<char>) -> Result<Word, ScriptError> {
        match self.peek() {
            Some('{') => {
                let text = self.braced()?;
                if !self.at_word_end(terminator) {
                    return Err(ScriptError::ExtraAfterBrace);
                }
                Ok(Word::literal(text))
            }
            Some('"') => {
                self.advance();
                let word = self.substituted(terminator, true)?;
                if !self.at_word_end(terminator) {
                    return Err(ScriptError::ExtraAfterQuote);
                }
                Ok(word)
            }
            _ => self.substituted(terminator, false),
        }
    }

    /// Braced text with the outer braces removed, nothing inside is changed
    fn braced(&mut self) -> Result<String, ScriptError> {
        self.advance();
        let mut text = String::new();
        let mut depth = 1usize;

        loop {
            let ch = self.advance().ok_or(ScriptError::MissingCloseBrace)?;
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(text);
                    }
                }
                '\\' => {
                    text.push(ch);
                    if let Some(next) = self.advance() {
                        text.push(next);
                    }
                    continue;
                }
                _ => (),
            }
            text.push(ch);
        }
    }

    /// A bare or quoted word with substitutions, a quoted word ends at the
    /// closing quote, which is consumed
    fn substituted(&mut self, terminator: Option<char>, quoted: bool) -> Result<Word, ScriptError> {
        let mut word = Word::default();

        loop {
            if quoted {
                match self.peek() {
                    None => return Err(ScriptError::MissingQuote),
                    Some('"') => {
                        self.advance();
                        break;
                    }
                    _ => (),
                }
            } else if self.at_word_end(terminator) {
                break;
            }

            match self.peek() {
                Some('$') => self.variable(&mut word),
                Some('[') => {
                    self.advance();
                    word.parts.push(WordPart::Command(self.commands(Some(']'))?));
                }
                Some('\\') => {
                    self.advance();
                    self.escape(&mut word);
                }
                Some(ch) => {
                    self.advance();
                    word.push_char(ch);
                }
                None => break,
            }
        }

        if word.parts.is_empty() {
            word.parts.push(WordPart::Literal(String::new()));
        }

        Ok(word)
    }

    fn variable(&mut self, word: &mut Word) {
        self.advance();

        if self.peek() == Some('{') {
            let start = self.current;
            self.advance();
            let mut name = String::new();
            while let Some(ch) = self.advance() {
                if ch == '}' {
                    word.parts.push(WordPart::Variable(name));
                    return;
                }
                name.push(ch);
            }

            // no closing brace, the text is kept as it was
            self.current = start;
            word.push_char('$');
            return;
        }

        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if name.is_empty() {
            word.push_char('$');
        } else {
            word.parts.push(WordPart::Variable(name));
        }
    }

    fn escape(&mut self, word: &mut Word) {
        let ch = match self.advance() {
            Some(ch) => ch,
            None => {
                word.push_char('\\');
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
                while matches!(self.peek(), Some(' ' | '\t')) {
                    self.advance();
                }
                ' '
            }
            ch => ch,
        };

        word.push_char(result);
    }
}
