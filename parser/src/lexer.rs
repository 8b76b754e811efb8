//! FILENAME: parser/src/lexer.rs
//! PURPOSE: Scans a raw formula source string and produces a stream of Tokens.
//! CONTEXT: This is the first stage of the parsing pipeline. It handles
//! whitespace skipping (newlines are significant and emitted as tokens),
//! integer/float literals, string literals, keywords, identifiers, and
//! multi-character operators like `**`, `&&`, `||`, `<=`, `>=`, `<<`, `>>`,
//! `==`, `!=`, and `..`.
//!
//! SUPPORTED OPERATORS:
//! - Single char: + - * / % ^ & | ~ < > = ! ( ) [ ] # , ; :
//! - Multi char: ** && || <= >= << >> == != ..

use crate::ast::Span;
use crate::token::{Token, TokenSpan};
use std::iter::Peekable;
use std::str::Chars;

/// Raised when the lexer encounters input it cannot tokenize.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub message: String,
    /// Byte offset of the character that triggered the failure.
    pub offset: i64,
}

impl LexError {
    pub fn new(message: impl Into<String>, offset: i64) -> Self {
        LexError { message: message.into(), offset }
    }
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LexError: {}", self.message)
    }
}

impl std::error::Error for LexError {}

pub type LexResult<T> = Result<T, LexError>;

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
    /// Byte offset of the next character to be consumed. Unicode-aware offsets
    /// are explicitly out of scope; each character advances this by one.
    pos: i64,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input: input.chars().peekable(), pos: 0 }
    }

    /// Scans and returns every token in the input, ending with `Token::Eof`.
    pub fn lex(mut self) -> LexResult<Vec<TokenSpan>> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok.kind == Token::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.input.next();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    /// Advances the lexer and returns the next token.
    pub fn next_token(&mut self) -> LexResult<TokenSpan> {
        self.skip_whitespace();

        let start = self.pos;
        let tok = match self.bump() {
            Some('\n') => Token::Newline,
            Some('+') => Token::Plus,
            Some('-') => Token::Minus,
            Some('*') => {
                if self.input.peek() == Some(&'*') {
                    self.bump();
                    Token::Exponentiate
                } else {
                    Token::Multiply
                }
            }
            Some('/') => Token::Divide,
            Some('%') => Token::Modulo,
            Some('^') => Token::BitXor,
            Some('&') => {
                if self.input.peek() == Some(&'&') {
                    self.bump();
                    Token::And
                } else {
                    Token::BitAnd
                }
            }
            Some('|') => {
                if self.input.peek() == Some(&'|') {
                    self.bump();
                    Token::Or
                } else {
                    Token::BitOr
                }
            }
            Some('~') => Token::BitNot,
            Some('<') => {
                if self.input.peek() == Some(&'=') {
                    self.bump();
                    Token::LessThanEqual
                } else if self.input.peek() == Some(&'<') {
                    self.bump();
                    Token::LeftShift
                } else {
                    Token::LessThan
                }
            }
            Some('>') => {
                if self.input.peek() == Some(&'=') {
                    self.bump();
                    Token::GreaterThanEqual
                } else if self.input.peek() == Some(&'>') {
                    self.bump();
                    Token::RightShift
                } else {
                    Token::GreaterThan
                }
            }
            Some('=') => {
                if self.input.peek() == Some(&'=') {
                    self.bump();
                    Token::Equals
                } else {
                    Token::Assignment
                }
            }
            Some('!') => {
                if self.input.peek() == Some(&'=') {
                    self.bump();
                    Token::NotEquals
                } else {
                    Token::Not
                }
            }
            Some('(') => Token::LeftParenthesis,
            Some(')') => Token::RightParenthesis,
            Some('[') => Token::LeftBracket,
            Some(']') => Token::RightBracket,
            Some('#') => Token::Hashtag,
            Some(',') => Token::Comma,
            Some(';') => Token::Semicolon,
            Some(':') => Token::Colon,
            Some('"') => return self.read_string(start),
            Some('.') => {
                if self.input.peek() == Some(&'.') {
                    self.bump();
                    Token::DotDot
                } else {
                    return Err(LexError::new("Unrecognized character '.', check context", start));
                }
            }
            Some(ch) if ch.is_ascii_digit() => return Ok(self.read_number(ch, start)),
            Some(ch) if is_letter(ch) => return Ok(self.read_identifier(ch, start)),
            None => Token::Eof,
            Some(ch) => {
                return Err(LexError::new(
                    format!("Unrecognized character '{}' at index = {}", ch, start),
                    start,
                ))
            }
        };

        Ok(TokenSpan { kind: tok, span: (start, self.pos - 1) })
    }

    fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.input.peek() {
            if ch == '\n' || !ch.is_whitespace() {
                break;
            }
            self.bump();
        }
    }

    fn read_string(&mut self, start: i64) -> LexResult<TokenSpan> {
        let mut result = String::new();
        loop {
            match self.bump() {
                Some('"') => {
                    return Ok(TokenSpan { kind: Token::String(result), span: (start, self.pos - 1) })
                }
                Some(ch) => result.push(ch),
                None => return Err(LexError::new("Unterminated string", start)),
            }
        }
    }

    fn read_number(&mut self, first: char, start: i64) -> TokenSpan {
        let mut text = String::from(first);
        let mut is_float = false;

        while let Some(&ch) = self.input.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.bump();
            } else if ch == '.' && !is_float {
                // Only consume the '.' as part of the number if it is followed
                // by another digit; `5.` with nothing after is not a float
                // under this grammar and the '.' is left for the next token.
                let mut lookahead = self.input.clone();
                lookahead.next();
                if lookahead.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                    is_float = true;
                    text.push(ch);
                    self.bump();
                } else {
                    break;
                }
            } else {
                break;
            }
        }

        let span = (start, self.pos - 1);
        if is_float {
            TokenSpan { kind: Token::Float(text.parse::<f64>().unwrap_or(0.0)), span }
        } else {
            TokenSpan { kind: Token::Integer(text.parse::<i64>().unwrap_or(0)), span }
        }
    }

    fn read_identifier(&mut self, first: char, start: i64) -> TokenSpan {
        let mut ident = String::from(first);

        while let Some(&ch) = self.input.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.bump();
            } else {
                break;
            }
        }

        let span = (start, self.pos - 1);
        let kind = match ident.as_str() {
            "true" => Token::Boolean(true),
            "false" => Token::Boolean(false),
            "sum" => Token::Sum,
            "mean" => Token::Mean,
            "min" => Token::Min,
            "max" => Token::Max,
            "float" => Token::IntToFloat,
            "int" => Token::FloatToInt,
            "if" => Token::If,
            "else" => Token::Else,
            "for" => Token::For,
            "in" => Token::In,
            "end" => Token::End,
            _ => Token::Variable(ident),
        };
        TokenSpan { kind, span }
    }
}

/// Returns true if `ch` can start an identifier: ASCII letters and underscore.
/// Identifiers are matched case-sensitively against the keyword table; no
/// case normalization is performed.
fn is_letter(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

/// Convenience wrapper returning just the token kinds with no spans, useful
/// for tests that don't care about offsets.
#[cfg(test)]
pub fn lex_kinds(input: &str) -> LexResult<Vec<Token>> {
    Ok(Lexer::new(input).lex()?.into_iter().map(|t| t.kind).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_multi_char_operators_by_maximal_munch() {
        let kinds = lex_kinds("** && || <= >= << >> == != ..").unwrap();
        assert_eq!(
            kinds,
            vec![
                Token::Exponentiate,
                Token::And,
                Token::Or,
                Token::LessThanEqual,
                Token::GreaterThanEqual,
                Token::LeftShift,
                Token::RightShift,
                Token::Equals,
                Token::NotEquals,
                Token::DotDot,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn lexes_single_char_forms() {
        let kinds = lex_kinds("+ - * / % ^ & | ~ < > = ! ( ) [ ] # , ; :").unwrap();
        assert_eq!(
            kinds,
            vec![
                Token::Plus,
                Token::Minus,
                Token::Multiply,
                Token::Divide,
                Token::Modulo,
                Token::BitXor,
                Token::BitAnd,
                Token::BitOr,
                Token::BitNot,
                Token::LessThan,
                Token::GreaterThan,
                Token::Assignment,
                Token::Not,
                Token::LeftParenthesis,
                Token::RightParenthesis,
                Token::LeftBracket,
                Token::RightBracket,
                Token::Hashtag,
                Token::Comma,
                Token::Semicolon,
                Token::Colon,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn newline_is_a_significant_token() {
        let kinds = lex_kinds("1\n2").unwrap();
        assert_eq!(kinds, vec![Token::Integer(1), Token::Newline, Token::Integer(2), Token::Eof]);
    }

    #[test]
    fn numbers_are_greedy_with_single_dot() {
        let kinds = lex_kinds("3.14 42 7.0").unwrap();
        assert_eq!(kinds, vec![Token::Float(3.14), Token::Integer(42), Token::Float(7.0), Token::Eof]);
    }

    #[test]
    fn keywords_are_case_sensitive() {
        let kinds = lex_kinds("if IF If").unwrap();
        assert_eq!(
            kinds,
            vec![
                Token::If,
                Token::Variable("IF".to_string()),
                Token::Variable("If".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn strings_have_no_escape_processing() {
        let kinds = lex_kinds("\"hello world\"").unwrap();
        assert_eq!(kinds, vec![Token::String("hello world".to_string()), Token::Eof]);
    }

    #[test]
    fn unterminated_string_is_a_lex_error() {
        let err = lex_kinds("\"abc").unwrap_err();
        assert_eq!(err.message, "Unterminated string");
    }

    #[test]
    fn stray_dot_not_forming_dotdot_is_a_lex_error() {
        let err = lex_kinds("1 . 2").unwrap_err();
        assert_eq!(err.message, "Unrecognized character '.', check context");
    }

    #[test]
    fn unrecognized_character_reports_offset() {
        let err = lex_kinds("1 + @").unwrap_err();
        assert_eq!(err.message, "Unrecognized character '@' at index = 4");
        assert_eq!(err.offset, 4);
    }

    #[test]
    fn display_is_prefixed_with_the_error_kind() {
        let err = lex_kinds("\"abc").unwrap_err();
        assert_eq!(err.to_string(), "LexError: Unterminated string");
    }
}
