//! Part 21 record scanner and argument parser.
//!
//! Reading happens in two stages. [`split_records`] walks the raw file text
//! and cuts it into `;`-terminated records with line breaks, tabs, comments
//! and leading blanks removed. [`DataRecord::parse`] then splits a
//! `#id = KEYWORD(args)` record into its id, keyword and raw argument text,
//! and [`parse_arguments`] turns argument text into a [`StepValue`] tree once
//! every entity in the file has been registered.

use crate::error::StepError;
use crate::lexer::{Lexer, SpannedToken, Token};

/// A single argument value in a STEP record.
#[derive(Debug, Clone, PartialEq)]
pub enum StepValue {
    /// Entity reference (e.g., `#123`).
    EntityRef(u64),
    /// String literal.
    String(String),
    /// Real number.
    Real(f64),
    /// Integer number.
    Integer(i64),
    /// Enumeration (e.g., `.T.`).
    Enum(String),
    /// List of values (nested in parentheses).
    List(Vec<StepValue>),
    /// Derived/computed value (`*`).
    Derived,
    /// Null/unset value (`$`).
    Null,
    /// Typed value: `TYPE_NAME(args)`.
    Typed {
        /// The type name.
        type_name: String,
        /// Arguments.
        args: Vec<StepValue>,
    },
}

impl StepValue {
    /// Try to get as an entity reference.
    pub fn as_entity_ref(&self) -> Option<u64> {
        match self {
            StepValue::EntityRef(id) => Some(*id),
            _ => None,
        }
    }

    /// Try to get as a real number (also accepts integer and a typed measure).
    pub fn as_real(&self) -> Option<f64> {
        match self {
            StepValue::Real(v) => Some(*v),
            StepValue::Integer(v) => Some(*v as f64),
            StepValue::Typed { args, .. } if args.len() == 1 => args[0].as_real(),
            _ => None,
        }
    }

    /// Try to get as a string.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            StepValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as a logical (`.T.` / `.F.`).
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StepValue::Enum(s) if s == "T" || s == "TRUE" => Some(true),
            StepValue::Enum(s) if s == "F" || s == "FALSE" => Some(false),
            _ => None,
        }
    }

    /// Try to get as a list.
    pub fn as_list(&self) -> Option<&[StepValue]> {
        match self {
            StepValue::List(v) => Some(v),
            _ => None,
        }
    }
}

/// A header-section record such as `FILE_SCHEMA(('CONFIG_CONTROL_DESIGN'))`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderRecord {
    /// Upper-case record keyword.
    pub keyword: String,
    /// Parsed arguments.
    pub args: Vec<StepValue>,
}

/// A data-section record split into its parts, arguments still unparsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRecord {
    /// Entity id from `#<id>`.
    pub id: u64,
    /// Upper-case entity keyword.
    pub keyword: String,
    /// Text between the outer parentheses.
    pub args: String,
}

impl DataRecord {
    /// Split `#<id> = <KEYWORD>(<args>)`.
    ///
    /// Returns `None` for records that do not have this shape: no leading
    /// `#`, no `=`, no opening parenthesis, no closing parenthesis, or an id
    /// that is not an unsigned integer.
    pub fn parse(record: &str) -> Option<Self> {
        let rest = record.trim().strip_prefix('#')?;
        let (id_text, rhs) = rest.split_once('=')?;
        let id: u64 = id_text.trim().parse().ok()?;

        let rhs = rhs.trim_start();
        let open = rhs.find('(')?;
        let keyword_end = rhs
            .find(|c: char| c == '(' || c.is_whitespace())
            .unwrap_or(open);
        let keyword = rhs[..keyword_end].to_ascii_uppercase();
        if keyword.is_empty() {
            return None;
        }

        let close = rhs.rfind(')')?;
        if close < open || !rhs[close + 1..].trim().is_empty() {
            return None;
        }
        if !parens_balanced(&rhs[open + 1..close]) {
            return None;
        }

        Some(Self {
            id,
            keyword,
            args: rhs[open + 1..close].to_string(),
        })
    }
}

/// Whether parentheses outside quoted strings nest correctly.
fn parens_balanced(text: &str) -> bool {
    let mut depth = 0usize;
    let mut in_string = false;
    for ch in text.chars() {
        match ch {
            '\'' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0 && !in_string
}

/// Split raw file contents into records terminated by `;`.
///
/// Carriage returns, line feeds and tabs are dropped, leading spaces of each
/// record are skipped and `/* ... */` comments removed. Semicolons inside
/// quoted strings do not terminate a record. A trailing fragment without a
/// terminating `;` is returned as a final record when non-empty.
pub fn split_records(input: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(input);
    let mut records = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\r' | '\n' | '\t' => continue,
            '\'' => {
                in_string = !in_string;
                current.push(ch);
            }
            '/' if !in_string && chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            ';' if !in_string => {
                records.push(std::mem::take(&mut current));
            }
            ' ' if current.is_empty() => continue,
            _ => current.push(ch),
        }
    }

    if !current.trim().is_empty() {
        records.push(current);
    }
    records
}

/// Parse argument text into values, e.g. `'', (#1, #2), .T.`.
///
/// `entity_id` is only used to annotate errors.
pub fn parse_arguments(entity_id: Option<u64>, text: &str) -> Result<Vec<StepValue>, StepError> {
    let tokens = Lexer::new(text.as_bytes()).tokenize()?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        entity_id,
    };
    let args = parser.parse_list_items(None)?;
    if let Some(tok) = parser.peek() {
        return Err(parser.error_at(tok, format!("trailing token {:?}", tok.token)));
    }
    Ok(args)
}

/// Parse a header record (`KEYWORD(args)`, no id).
pub fn parse_header_record(record: &str) -> Option<HeaderRecord> {
    let record = record.trim();
    let open = record.find('(')?;
    let close = record.rfind(')')?;
    if close < open {
        return None;
    }
    let keyword = record[..open].trim().to_ascii_uppercase();
    let args = parse_arguments(None, &record[open + 1..close]).ok()?;
    Some(HeaderRecord { keyword, args })
}

/// Recursive-descent parser over the tokens of one argument list.
struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    entity_id: Option<u64>,
}

impl Parser {
    /// Parse comma-separated values until `close` (or end of input when `None`).
    fn parse_list_items(&mut self, close: Option<&Token>) -> Result<Vec<StepValue>, StepError> {
        let mut items = Vec::new();
        let empty = match close {
            Some(t) => self.check_token(t),
            None => self.is_at_end(),
        };
        if empty {
            return Ok(items);
        }
        items.push(self.parse_value()?);
        while self.check_token(&Token::Comma) {
            self.advance();
            items.push(self.parse_value()?);
        }
        Ok(items)
    }

    fn parse_value(&mut self) -> Result<StepValue, StepError> {
        let Some(tok) = self.advance().cloned() else {
            return Err(StepError::parser(
                self.entity_id,
                "unexpected end of arguments",
            ));
        };
        let col = tok.pos.col;
        match tok.token {
            Token::EntityRef(id) => Ok(StepValue::EntityRef(id)),
            Token::String(s) => Ok(StepValue::String(s)),
            Token::Real(v) => Ok(StepValue::Real(v)),
            Token::Integer(v) => Ok(StepValue::Integer(v)),
            Token::Enum(s) => Ok(StepValue::Enum(s)),
            Token::Asterisk => Ok(StepValue::Derived),
            Token::Dollar => Ok(StepValue::Null),
            Token::LParen => {
                let list = self.parse_list_items(Some(&Token::RParen))?;
                self.expect_token(&Token::RParen)?;
                Ok(StepValue::List(list))
            }
            Token::Keyword(type_name) => {
                self.expect_token(&Token::LParen)?;
                let args = self.parse_list_items(Some(&Token::RParen))?;
                self.expect_token(&Token::RParen)?;
                Ok(StepValue::Typed { type_name, args })
            }
            other => Err(StepError::parser(
                self.entity_id,
                format!("unexpected value: {other:?} (column {col})"),
            )),
        }
    }

    fn peek(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&SpannedToken> {
        let tok = self.tokens.get(self.pos);
        self.pos += 1;
        tok
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn check_token(&self, expected: &Token) -> bool {
        self.peek().is_some_and(|t| &t.token == expected)
    }

    fn expect_token(&mut self, expected: &Token) -> Result<(), StepError> {
        if self.check_token(expected) {
            self.advance();
            return Ok(());
        }
        match self.peek() {
            Some(tok) => Err(self.error_at(tok, format!("expected {expected:?}, got {:?}", tok.token))),
            None => Err(StepError::parser(
                self.entity_id,
                format!("expected {expected:?}, got end of arguments"),
            )),
        }
    }

    fn error_at(&self, tok: &SpannedToken, message: String) -> StepError {
        StepError::parser(
            self.entity_id,
            format!("{message} (column {})", tok.pos.col),
        )
    }
}
