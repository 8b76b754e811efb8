//! FILENAME: parser/src/parser.rs
//! PURPOSE: Recursive-descent, precedence-climbing parser converting a token
//! stream into an AST.
//! CONTEXT: This is the second stage of the pipeline (lex -> parse -> evaluate).
//! It takes tokens from the Lexer and builds an Expression tree.
//!
//! GRAMMAR (loosest to tightest; all levels left-associative except
//! exponentiation and the unary prefix level, which recurse into themselves):
//!   level0  (assignment) --> level1 ( "||" level1 )* ( "=" level0 )?
//!   level1  (and)        --> level2 ( "&&" level2 )*
//!   level2  (bitor)      --> level3 ( "|" level3 )*
//!   level3  (bitxor)     --> level4 ( "^" level4 )*
//!   level4  (bitand)     --> level5 ( "&" level5 )*
//!   level5  (equality)   --> level6 ( ("==" | "!=") level6 )*
//!   level6  (relational) --> level7 ( ("<" | "<=" | ">" | ">=") level7 )*
//!   level7  (shift)      --> level8 ( ("<<" | ">>") level8 )*
//!   level8  (additive)   --> level9 ( ("+" | "-") level9 )*
//!   level9  (mult.)      --> level10 ( ("*" | "/" | "%") level10 )*
//!   level10 (power)      --> level11 ( "**" level10 )?
//!   level11 (unary)      --> ("!" | "-" | "~") level11 | level12
//!   level12 (primary)    --> literal | "(" level0 ")" | lvalue | rvalue
//!                           | variable | cast | aggregate | if | for
//!
//! A block is a sequence of level0 expressions separated by NEWLINE or
//! SEMICOLON, terminated (without consuming) by EOF, ELSE, or END.

use crate::ast::{BinaryOperator, ExprKind, Expression, UnaryOperator, Value};
use crate::lexer::Lexer;
use crate::token::{Token, TokenSpan};

/// Raised when the token stream does not match the grammar.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    /// Byte offset of the offending token.
    pub offset: i64,
}

impl ParseError {
    pub fn new(message: impl Into<String>, offset: i64) -> Self {
        ParseError { message: message.into(), offset }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ParseError: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

/// The Parser struct holds the remaining token stream and current token.
pub struct Parser {
    tokens: Vec<TokenSpan>,
    pos: usize,
}

impl Parser {
    /// Creates a new parser from an already-lexed token stream.
    pub fn new(tokens: Vec<TokenSpan>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn current(&self) -> &TokenSpan {
        // `lex` always terminates with Eof, so this index is always in bounds
        // as long as `advance` never steps past it.
        &self.tokens[self.pos]
    }

    fn current_start(&self) -> i64 {
        self.current().span.0
    }

    fn advance(&mut self) -> TokenSpan {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, expected: &Token) -> bool {
        &self.current().kind == expected
    }

    fn expect(&mut self, expected: Token, message: impl Into<String>) -> ParseResult<TokenSpan> {
        if self.check(&expected) {
            Ok(self.advance())
        } else {
            Err(ParseError::new(message.into(), self.current_start()))
        }
    }

    fn skip_separators(&mut self) {
        while matches!(self.current().kind, Token::Newline | Token::Semicolon) {
            self.advance();
        }
    }

    /// Parses the entire input. Empty input is a special case: it parses to
    /// the empty-string literal rather than an error.
    pub fn parse(&mut self) -> ParseResult<Expression> {
        if self.check(&Token::Eof) {
            return Ok(Expression::empty_string_literal());
        }

        let block = self.parse_block()?;

        if !self.check(&Token::Eof) {
            let tok = self.current();
            return Err(ParseError::new(
                format!("Syntax error around {} at index {}", tok.kind, tok.span.0),
                tok.span.0,
            ));
        }

        Ok(block)
    }

    /// Parses a sequence of statements separated by NEWLINE/SEMICOLON,
    /// stopping (without consuming) at EOF, ELSE, or END.
    fn parse_block(&mut self) -> ParseResult<Expression> {
        let start = self.current_start();
        let mut stmts = Vec::new();
        self.skip_separators();

        while !matches!(self.current().kind, Token::Eof | Token::Else | Token::End) {
            stmts.push(self.parse_level0()?);
            if matches!(self.current().kind, Token::Newline | Token::Semicolon) {
                self.skip_separators();
            } else {
                break;
            }
        }

        let end = self.tokens[self.pos.saturating_sub(1)].span.1;
        Ok(Expression::new(ExprKind::Block(stmts), (start, end)))
    }

    // ---- level 0: assignment / logical or ----
    fn parse_level0(&mut self) -> ParseResult<Expression> {
        let start = self.current_start();
        let mut left = self.parse_level1()?;

        while self.check(&Token::Or) {
            self.advance();
            let right = self.parse_level1()?;
            let end = right.span.1;
            left = Expression::new(
                ExprKind::Binary { op: BinaryOperator::Or, left: Box::new(left), right: Box::new(right) },
                (start, end),
            );
        }

        if self.check(&Token::Assignment) {
            self.advance();
            // Right-associative: recurse into the same level for the RHS so
            // `a = b = c` parses as `a = (b = c)`.
            let right = self.parse_level0()?;
            let end = right.span.1;
            left = Expression::new(
                ExprKind::Binary { op: BinaryOperator::Assignment, left: Box::new(left), right: Box::new(right) },
                (start, end),
            );
        }

        Ok(left)
    }

    // ---- level 1: logical and ----
    fn parse_level1(&mut self) -> ParseResult<Expression> {
        let start = self.current_start();
        let mut left = self.parse_level2()?;
        while self.check(&Token::And) {
            self.advance();
            let right = self.parse_level2()?;
            let end = right.span.1;
            left = Expression::new(
                ExprKind::Binary { op: BinaryOperator::And, left: Box::new(left), right: Box::new(right) },
                (start, end),
            );
        }
        Ok(left)
    }

    // ---- level 2: bitwise or ----
    fn parse_level2(&mut self) -> ParseResult<Expression> {
        let start = self.current_start();
        let mut left = self.parse_level3()?;
        while self.check(&Token::BitOr) {
            self.advance();
            let right = self.parse_level3()?;
            let end = right.span.1;
            left = Expression::new(
                ExprKind::Binary { op: BinaryOperator::BitOr, left: Box::new(left), right: Box::new(right) },
                (start, end),
            );
        }
        Ok(left)
    }

    // ---- level 3: bitwise xor ----
    fn parse_level3(&mut self) -> ParseResult<Expression> {
        let start = self.current_start();
        let mut left = self.parse_level4()?;
        while self.check(&Token::BitXor) {
            self.advance();
            let right = self.parse_level4()?;
            let end = right.span.1;
            left = Expression::new(
                ExprKind::Binary { op: BinaryOperator::BitXor, left: Box::new(left), right: Box::new(right) },
                (start, end),
            );
        }
        Ok(left)
    }

    // ---- level 4: bitwise and ----
    fn parse_level4(&mut self) -> ParseResult<Expression> {
        let start = self.current_start();
        let mut left = self.parse_level5()?;
        while self.check(&Token::BitAnd) {
            self.advance();
            let right = self.parse_level5()?;
            let end = right.span.1;
            left = Expression::new(
                ExprKind::Binary { op: BinaryOperator::BitAnd, left: Box::new(left), right: Box::new(right) },
                (start, end),
            );
        }
        Ok(left)
    }

    // ---- level 5: equality ----
    fn parse_level5(&mut self) -> ParseResult<Expression> {
        let start = self.current_start();
        let mut left = self.parse_level6()?;
        loop {
            let op = match self.current().kind {
                Token::Equals => BinaryOperator::Equals,
                Token::NotEquals => BinaryOperator::NotEquals,
                _ => break,
            };
            self.advance();
            let right = self.parse_level6()?;
            let end = right.span.1;
            left = Expression::new(
                ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) },
                (start, end),
            );
        }
        Ok(left)
    }

    // ---- level 6: relational ----
    fn parse_level6(&mut self) -> ParseResult<Expression> {
        let start = self.current_start();
        let mut left = self.parse_level7()?;
        loop {
            let op = match self.current().kind {
                Token::LessThan => BinaryOperator::LessThan,
                Token::LessThanEqual => BinaryOperator::LessThanEqual,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::GreaterThanEqual => BinaryOperator::GreaterThanEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_level7()?;
            let end = right.span.1;
            left = Expression::new(
                ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) },
                (start, end),
            );
        }
        Ok(left)
    }

    // ---- level 7: shift ----
    fn parse_level7(&mut self) -> ParseResult<Expression> {
        let start = self.current_start();
        let mut left = self.parse_level8()?;
        loop {
            let op = match self.current().kind {
                Token::LeftShift => BinaryOperator::LeftShift,
                Token::RightShift => BinaryOperator::RightShift,
                _ => break,
            };
            self.advance();
            let right = self.parse_level8()?;
            let end = right.span.1;
            left = Expression::new(
                ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) },
                (start, end),
            );
        }
        Ok(left)
    }

    // ---- level 8: additive ----
    fn parse_level8(&mut self) -> ParseResult<Expression> {
        let start = self.current_start();
        let mut left = self.parse_level9()?;
        loop {
            let op = match self.current().kind {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.parse_level9()?;
            let end = right.span.1;
            left = Expression::new(
                ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) },
                (start, end),
            );
        }
        Ok(left)
    }

    // ---- level 9: multiplicative ----
    fn parse_level9(&mut self) -> ParseResult<Expression> {
        let start = self.current_start();
        let mut left = self.parse_level10()?;
        loop {
            let op = match self.current().kind {
                Token::Multiply => BinaryOperator::Multiply,
                Token::Divide => BinaryOperator::Divide,
                Token::Modulo => BinaryOperator::Modulo,
                _ => break,
            };
            self.advance();
            let right = self.parse_level10()?;
            let end = right.span.1;
            left = Expression::new(
                ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) },
                (start, end),
            );
        }
        Ok(left)
    }

    // ---- level 10: exponentiation (right-associative) ----
    fn parse_level10(&mut self) -> ParseResult<Expression> {
        let start = self.current_start();
        let left = self.parse_level11()?;
        if self.check(&Token::Exponentiate) {
            self.advance();
            let right = self.parse_level10()?;
            let end = right.span.1;
            return Ok(Expression::new(
                ExprKind::Binary { op: BinaryOperator::Exponentiation, left: Box::new(left), right: Box::new(right) },
                (start, end),
            ));
        }
        Ok(left)
    }

    // ---- level 11: unary prefix (right-associative) ----
    //
    // The operand of a prefix operator recurses back into level10 (power)
    // rather than into level12 (primary) or itself: `-2 ** 2` must parse as
    // `-(2 ** 2)` (evaluating to -4), not `(-2) ** 2` (which would be 4).
    // Chains of prefix operators (`- - x`) still work because that recursive
    // level10 call bottoms out through level11 again before reaching level12.
    fn parse_level11(&mut self) -> ParseResult<Expression> {
        let start = self.current_start();
        let op = match self.current().kind {
            Token::Not => Some(UnaryOperator::Not),
            Token::Minus => Some(UnaryOperator::Negation),
            Token::BitNot => Some(UnaryOperator::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let inner = self.parse_level10()?;
            let end = inner.span.1;
            return Ok(Expression::new(ExprKind::Unary { op, inner: Box::new(inner) }, (start, end)));
        }
        self.parse_level12()
    }

    // ---- level 12: primary ----
    fn parse_level12(&mut self) -> ParseResult<Expression> {
        let start = self.current_start();
        match self.current().kind.clone() {
            Token::Integer(n) => {
                let span = self.advance().span;
                Ok(Expression::new(ExprKind::Literal(Value::Integer(n)), span))
            }
            Token::Float(n) => {
                let span = self.advance().span;
                Ok(Expression::new(ExprKind::Literal(Value::Float(n)), span))
            }
            Token::Boolean(b) => {
                let span = self.advance().span;
                Ok(Expression::new(ExprKind::Literal(Value::Boolean(b)), span))
            }
            Token::String(s) => {
                let span = self.advance().span;
                Ok(Expression::new(ExprKind::Literal(Value::String(s)), span))
            }
            Token::Variable(name) => {
                let span = self.advance().span;
                Ok(Expression::new(ExprKind::Variable(name), span))
            }
            Token::LeftParenthesis => {
                self.advance();
                let inner = self.parse_level0()?;
                let close = self.expect(
                    Token::RightParenthesis,
                    format!("Expected right parenthesis at index {}", self.current_start()),
                )?;
                Ok(Expression::new(inner.kind, (start, close.span.1)))
            }
            Token::LeftBracket => self.parse_lvalue(start),
            Token::Hashtag => self.parse_rvalue(start),
            Token::FloatToInt => self.parse_cast(start, UnaryOperator::FloatToInt),
            Token::IntToFloat => self.parse_cast(start, UnaryOperator::IntToFloat),
            Token::Sum => self.parse_aggregate(start, BinaryOperator::Sum),
            Token::Mean => self.parse_aggregate(start, BinaryOperator::Mean),
            Token::Min => self.parse_aggregate(start, BinaryOperator::Min),
            Token::Max => self.parse_aggregate(start, BinaryOperator::Max),
            Token::If => self.parse_if(start),
            Token::For => self.parse_for(start),
            other => Err(ParseError::new(
                format!("Syntax error around {} at index {}", other, start),
                start,
            )),
        }
    }

    fn parse_lvalue(&mut self, start: i64) -> ParseResult<Expression> {
        self.advance(); // consume `[`
        let row = self.parse_level0()?;
        self.expect(Token::Comma, format!("Expected comma at index {}", self.current_start()))?;
        let col = self.parse_level0()?;
        let close = self.expect(
            Token::RightBracket,
            format!("Expected right bracket at index {}", self.current_start()),
        )?;
        Ok(Expression::new(
            ExprKind::Binary { op: BinaryOperator::LValueRef, left: Box::new(row), right: Box::new(col) },
            (start, close.span.1),
        ))
    }

    fn parse_rvalue(&mut self, start: i64) -> ParseResult<Expression> {
        self.advance(); // consume `#`
        self.expect(Token::LeftBracket, format!("Expected left bracket at index {}", self.current_start()))?;
        let row = self.parse_level0()?;
        self.expect(Token::Comma, format!("Expected comma at index {}", self.current_start()))?;
        let col = self.parse_level0()?;
        let close = self.expect(
            Token::RightBracket,
            format!("Expected right bracket at index {}", self.current_start()),
        )?;
        Ok(Expression::new(
            ExprKind::Binary { op: BinaryOperator::RValueRef, left: Box::new(row), right: Box::new(col) },
            (start, close.span.1),
        ))
    }

    fn parse_cast(&mut self, start: i64, op: UnaryOperator) -> ParseResult<Expression> {
        self.advance(); // consume `int` / `float`
        self.expect(
            Token::LeftParenthesis,
            format!("Expected left parenthesis at index {}", self.current_start()),
        )?;
        let inner = self.parse_level0()?;
        let close = self.expect(
            Token::RightParenthesis,
            format!("Expected right parenthesis at index {}", self.current_start()),
        )?;
        Ok(Expression::new(ExprKind::Unary { op, inner: Box::new(inner) }, (start, close.span.1)))
    }

    fn parse_aggregate(&mut self, start: i64, op: BinaryOperator) -> ParseResult<Expression> {
        self.advance(); // consume `sum`/`mean`/`min`/`max`
        self.expect(
            Token::LeftParenthesis,
            format!("Expected left parenthesis at index {}", self.current_start()),
        )?;
        let tl = self.parse_level0()?;
        self.expect(Token::Comma, format!("Expected comma at index {}", self.current_start()))?;
        let br = self.parse_level0()?;
        let close = self.expect(
            Token::RightParenthesis,
            format!("Expected right parenthesis at index {}", self.current_start()),
        )?;
        Ok(Expression::new(
            ExprKind::Binary { op, left: Box::new(tl), right: Box::new(br) },
            (start, close.span.1),
        ))
    }

    fn parse_if(&mut self, start: i64) -> ParseResult<Expression> {
        self.advance(); // consume `if`
        let cond = self.parse_level0()?;
        self.expect(Token::Newline, "Expected newline in if statement".to_string())?;
        let then_block = self.parse_block()?;
        self.expect(Token::Else, "Expected ELSE after IF".to_string())?;
        let else_block = self.parse_block()?;
        let end_tok = self.expect(Token::End, "Expected END after IF".to_string())?;
        Ok(Expression::new(
            ExprKind::If {
                cond: Box::new(cond),
                then_block: Box::new(then_block),
                else_block: Box::new(else_block),
            },
            (start, end_tok.span.1),
        ))
    }

    fn parse_for(&mut self, start: i64) -> ParseResult<Expression> {
        self.advance(); // consume `for`
        let var = match self.current().kind.clone() {
            Token::Variable(name) => {
                self.advance();
                name
            }
            other => {
                let offset = self.current_start();
                return Err(ParseError::new(
                    format!("Syntax error around {} at index {}", other, offset),
                    offset,
                ));
            }
        };
        self.expect(Token::In, format!("Syntax error around {} at index {}", self.current().kind, self.current_start()))?;
        let range_start = self.parse_level0()?;
        self.expect(Token::DotDot, format!("Expected .. at index {}", self.current_start()))?;
        let range_end = self.parse_level0()?;
        self.expect(Token::Newline, "Expected newline in for statement".to_string())?;
        let body = self.parse_block()?;
        let end_tok = self.expect(Token::End, "Expected END after FOR".to_string())?;
        Ok(Expression::new(
            ExprKind::For {
                var,
                start: Box::new(range_start),
                end: Box::new(range_end),
                body: Box::new(body),
            },
            (start, end_tok.span.1),
        ))
    }
}

/// Lexes and parses a source string in one call, mapping lex failures into
/// the same `ParseError` type so callers have a single error to handle at
/// the `parse` boundary.
pub fn parse(input: &str) -> ParseResult<Expression> {
    let tokens = Lexer::new(input).lex().map_err(|e| ParseError::new(e.message, e.offset))?;
    Parser::new(tokens).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Expression {
        parse(src).unwrap_or_else(|e| panic!("expected {:?} to parse, got {}", src, e))
    }

    #[test]
    fn empty_input_is_empty_string_literal() {
        let expr = parse_ok("");
        assert_eq!(expr.kind, ExprKind::Literal(Value::String(String::new())));
    }

    #[test]
    fn precedence_climbs_correctly() {
        let expr = parse_ok("1 + 2 * 3");
        assert_eq!(expr.serialize(), "Block: {(1 + (2 * 3))}");
    }

    #[test]
    fn exponentiation_is_right_associative() {
        let expr = parse_ok("2 ** 3 ** 2");
        assert_eq!(expr.serialize(), "Block: {(2 ** (3 ** 2))}");
    }

    #[test]
    fn unary_minus_wraps_the_whole_power_expression() {
        // Despite the level numbering (unary=11 tighter than power=10), the
        // operand of a prefix operator is itself a full power expression, so
        // `-2 ** 2` means `-(2 ** 2)`, not `(-2) ** 2`.
        let expr = parse_ok("-2 ** 2");
        assert_eq!(expr.serialize(), "Block: {(-(2 ** 2))}");
    }

    #[test]
    fn chained_unary_minus_still_parses() {
        let expr = parse_ok("- - 5");
        assert_eq!(expr.serialize(), "Block: {(-((-(5))))}");
    }

    #[test]
    fn assignment_chain_is_right_associative() {
        let expr = parse_ok("a = b = c");
        assert_eq!(expr.serialize(), "Block: {Variable:a = Variable:b = Variable:c}");
    }

    #[test]
    fn lvalue_and_rvalue_parse() {
        let expr = parse_ok("#[1, 2] + [3, 4]");
        assert_eq!(expr.serialize(), "Block: {(#[1, 2] + [3, 4])}");
    }

    #[test]
    fn casts_and_aggregates_parse() {
        let expr = parse_ok("float(7) / int(2.9)");
        assert_eq!(expr.serialize(), "Block: {((float(7)) / (int(2.9)))}");

        let agg = parse_ok("sum([0,0], [1,1])");
        assert_eq!(agg.serialize(), "Block: {sum([0, 0], [1, 1])}");
    }

    #[test]
    fn if_else_end_parses() {
        let expr = parse_ok("if true\n1\nelse\n2\nend");
        assert_eq!(expr.serialize(), "Block: {IF true: Block: {1} ELSE Block: {2}}");
    }

    #[test]
    fn for_in_range_parses() {
        let expr = parse_ok("for x in [0,0]..[1,1]\nx\nend");
        assert_eq!(expr.serialize(), "Block: {FOR x IN [0, 0]..[1, 1]: Block: {Variable:x}}");
    }

    #[test]
    fn missing_right_parenthesis_is_a_verbatim_error() {
        let err = parse("(1 + 2").unwrap_err();
        assert_eq!(err.message, "Expected right parenthesis at index 6");
        assert_eq!(err.offset, 6);
        assert_eq!(err.to_string(), "ParseError: Expected right parenthesis at index 6");
    }

    #[test]
    fn missing_comma_is_a_verbatim_error() {
        let err = parse("sum([0,0] [1,1])").unwrap_err();
        assert_eq!(err.message, "Expected comma at index 10");
    }

    #[test]
    fn if_without_newline_is_a_verbatim_error() {
        let err = parse("if true 1 else 2 end").unwrap_err();
        assert_eq!(err.message, "Expected newline in if statement");
    }

    #[test]
    fn if_without_else_is_a_verbatim_error() {
        let err = parse("if true\n1\nend").unwrap_err();
        assert_eq!(err.message, "Expected ELSE after IF");
    }

    #[test]
    fn for_without_dotdot_is_a_verbatim_error() {
        let err = parse("for x in [0,0].[1,1]\nx\nend").unwrap_err();
        assert!(err.message.starts_with("Expected .. at index"));
    }

    #[test]
    fn for_without_newline_is_a_verbatim_error() {
        let err = parse("for x in [0,0]..[1,1] x end").unwrap_err();
        assert_eq!(err.message, "Expected newline in for statement");
    }

    #[test]
    fn trailing_tokens_are_a_syntax_error() {
        let err = parse("1 2 3").unwrap_err();
        assert!(err.message.starts_with("Syntax error around"));
    }

    #[test]
    fn statements_separated_by_newline_or_semicolon() {
        let expr = parse_ok("1; 2\n3");
        assert_eq!(expr.serialize(), "Block: {1; 2; 3}");
    }
}
