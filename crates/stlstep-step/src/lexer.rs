//! Part 21 (STEP physical file format) lexer.
//!
//! Tokenizes the argument text of a single data record, e.g. the
//! `'', #1, #2, #3, .T.` inside `EDGE_CURVE(...)`. Handles:
//! - Keywords (typed parameters such as `LENGTH_MEASURE(1.0)`)
//! - Entity references (`#123`)
//! - Strings (`'it''s'`)
//! - Reals (`1.5E-10`, `-3.`, `2.0`) and integers
//! - Enumerations and logicals (`.T.`, `.UNSPECIFIED.`)
//! - Punctuation: parentheses, comma, asterisk, dollar

use crate::error::StepError;

/// A token in a STEP argument list.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Keyword or identifier (e.g., `LENGTH_MEASURE`).
    Keyword(String),
    /// Entity reference (e.g., `#123` becomes `EntityRef(123)`).
    EntityRef(u64),
    /// String literal (contents without quotes, `''` unescaped).
    String(String),
    /// Real number.
    Real(f64),
    /// Integer number.
    Integer(i64),
    /// Enumeration (e.g., `.T.` becomes `Enum("T")`).
    Enum(String),
    /// Left parenthesis `(`.
    LParen,
    /// Right parenthesis `)`.
    RParen,
    /// Comma `,`.
    Comma,
    /// Asterisk `*` (derived value marker).
    Asterisk,
    /// Dollar `$` (null/unset value marker).
    Dollar,
}

/// Position in the tokenized text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub col: usize,
}

/// A token with its position in the source.
#[derive(Debug, Clone)]
pub struct SpannedToken {
    /// The token.
    pub token: Token,
    /// Position where the token starts.
    pub pos: Position,
}

/// Lexer for Part 21 argument text.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Tokenize the entire input.
    pub fn tokenize(&mut self) -> Result<Vec<SpannedToken>, StepError> {
        let mut tokens = Vec::new();
        while let Some(tok) = self.next_token()? {
            tokens.push(tok);
        }
        Ok(tokens)
    }

    /// Get the next token, or `None` if at end of input.
    pub fn next_token(&mut self) -> Result<Option<SpannedToken>, StepError> {
        self.skip_whitespace_and_comments();

        let Some(ch) = self.peek_char() else {
            return Ok(None);
        };

        let start = Position {
            line: self.line,
            col: self.col,
        };

        let token = match ch {
            b'(' => self.single(Token::LParen),
            b')' => self.single(Token::RParen),
            b',' => self.single(Token::Comma),
            b'*' => self.single(Token::Asterisk),
            b'$' => self.single(Token::Dollar),
            b'#' => self.read_entity_ref(start)?,
            b'\'' => self.read_string(start)?,
            b'.' => self.read_enum(start)?,
            b'-' | b'+' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.read_number(start)?
            }
            b'0'..=b'9' => self.read_number(start)?,
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => self.read_keyword(),
            _ => {
                return Err(StepError::lexer(
                    start.line,
                    start.col,
                    format!("unexpected character: '{}'", ch as char),
                ));
            }
        };

        Ok(Some(SpannedToken { token, pos: start }))
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    fn peek_char(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.input.get(self.pos).copied()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    /// Consume bytes while `pred` holds, returning them as a string.
    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> String {
        let start = self.pos;
        while self.peek_char().is_some_and(&pred) {
            self.advance();
        }
        // Only ASCII bytes pass the predicates used by this lexer.
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.peek_char().is_some_and(|c| c.is_ascii_whitespace()) {
                self.advance();
            }

            if self.peek_char() == Some(b'/') && self.peek_at(1) == Some(b'*') {
                self.advance();
                self.advance();
                while self.pos < self.input.len() {
                    if self.peek_char() == Some(b'*') && self.peek_at(1) == Some(b'/') {
                        self.advance();
                        self.advance();
                        break;
                    }
                    self.advance();
                }
                continue;
            }

            break;
        }
    }

    fn read_entity_ref(&mut self, start: Position) -> Result<Token, StepError> {
        self.advance(); // '#'
        let digits = self.take_while(|c| c.is_ascii_digit());
        if digits.is_empty() {
            return Err(StepError::lexer(
                start.line,
                start.col,
                "expected digits after '#'",
            ));
        }
        let id: u64 = digits.parse().map_err(|_| {
            StepError::lexer(start.line, start.col, format!("invalid entity ID: {digits}"))
        })?;
        Ok(Token::EntityRef(id))
    }

    fn read_string(&mut self, start: Position) -> Result<Token, StepError> {
        self.advance(); // opening quote

        let mut content = Vec::new();
        loop {
            match self.advance() {
                None => {
                    return Err(StepError::lexer(
                        start.line,
                        start.col,
                        "unterminated string",
                    ));
                }
                Some(b'\'') => {
                    if self.peek_char() == Some(b'\'') {
                        content.push(b'\'');
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some(ch) => content.push(ch),
            }
        }

        Ok(Token::String(String::from_utf8_lossy(&content).into_owned()))
    }

    fn read_enum(&mut self, start: Position) -> Result<Token, StepError> {
        self.advance(); // opening '.'
        let name = self.take_while(|c| c.is_ascii_alphanumeric() || c == b'_');
        if self.peek_char() != Some(b'.') {
            return Err(StepError::lexer(
                start.line,
                start.col,
                format!("unterminated enumeration: .{name}"),
            ));
        }
        self.advance(); // closing '.'
        if name.is_empty() {
            return Err(StepError::lexer(start.line, start.col, "empty enumeration"));
        }
        Ok(Token::Enum(name.to_ascii_uppercase()))
    }

    fn read_number(&mut self, start: Position) -> Result<Token, StepError> {
        let mut text = String::new();
        let mut is_real = false;

        if let Some(sign @ (b'-' | b'+')) = self.peek_char() {
            text.push(sign as char);
            self.advance();
        }
        text.push_str(&self.take_while(|c| c.is_ascii_digit()));

        // Part 21 allows a bare trailing point (`3.`); an enumeration can never
        // follow a number without a separating comma.
        if self.peek_char() == Some(b'.') {
            is_real = true;
            self.advance();
            text.push('.');
            let frac = self.take_while(|c| c.is_ascii_digit());
            if frac.is_empty() {
                text.push('0');
            } else {
                text.push_str(&frac);
            }
        }

        if let Some(b'E' | b'e') = self.peek_char() {
            is_real = true;
            self.advance();
            text.push('E');
            if let Some(sign @ (b'-' | b'+')) = self.peek_char() {
                text.push(sign as char);
                self.advance();
            }
            text.push_str(&self.take_while(|c| c.is_ascii_digit()));
        }

        if is_real {
            let val: f64 = text.parse().map_err(|_| {
                StepError::lexer(start.line, start.col, format!("invalid real number: {text}"))
            })?;
            Ok(Token::Real(val))
        } else {
            let val: i64 = text.parse().map_err(|_| {
                StepError::lexer(start.line, start.col, format!("invalid integer: {text}"))
            })?;
            Ok(Token::Integer(val))
        }
    }

    fn read_keyword(&mut self) -> Token {
        let name = self.take_while(|c| c.is_ascii_alphanumeric() || c == b'_' || c == b'-');
        Token::Keyword(name.to_ascii_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> Vec<Token> {
        Lexer::new(input.as_bytes())
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|st| st.token)
            .collect()
    }

    #[test]
    fn test_entity_ref() {
        assert_eq!(tokenize("#123"), vec![Token::EntityRef(123)]);
        assert!(Lexer::new(b"#x").tokenize().is_err());
    }

    #[test]
    fn test_string_with_escaped_quote() {
        assert_eq!(tokenize("'hello'"), vec![Token::String("hello".into())]);
        assert_eq!(tokenize("'it''s'"), vec![Token::String("it's".into())]);
        assert_eq!(tokenize("''"), vec![Token::String(String::new())]);
    }

    #[test]
    fn test_logicals() {
        assert_eq!(tokenize(".T."), vec![Token::Enum("T".into())]);
        assert_eq!(tokenize(".f."), vec![Token::Enum("F".into())]);
        assert!(Lexer::new(b".T").tokenize().is_err());
    }

    #[test]
    fn test_numbers() {
        assert_eq!(tokenize("42"), vec![Token::Integer(42)]);
        assert_eq!(tokenize("-7"), vec![Token::Integer(-7)]);
        assert_eq!(tokenize("0.5"), vec![Token::Real(0.5)]);
        assert_eq!(tokenize("-1.5E-10"), vec![Token::Real(-1.5e-10)]);
        assert_eq!(tokenize("3."), vec![Token::Real(3.0)]);
        assert_eq!(tokenize("1.E-7"), vec![Token::Real(1e-7)]);
        assert_eq!(tokenize("2e3"), vec![Token::Real(2000.0)]);
    }

    #[test]
    fn test_punctuation_and_comments() {
        assert_eq!(
            tokenize("( ) , /* skip */ * $"),
            vec![
                Token::LParen,
                Token::RParen,
                Token::Comma,
                Token::Asterisk,
                Token::Dollar,
            ]
        );
    }

    #[test]
    fn test_edge_curve_arguments() {
        assert_eq!(
            tokenize("'', #11, #12, #70, .T."),
            vec![
                Token::String(String::new()),
                Token::Comma,
                Token::EntityRef(11),
                Token::Comma,
                Token::EntityRef(12),
                Token::Comma,
                Token::EntityRef(70),
                Token::Comma,
                Token::Enum("T".into()),
            ]
        );
    }

    #[test]
    fn test_error_position() {
        let err = Lexer::new(b"#1,\n  @").tokenize().unwrap_err();
        match err {
            StepError::Lexer { line, col, .. } => {
                assert_eq!(line, 2);
                assert_eq!(col, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
