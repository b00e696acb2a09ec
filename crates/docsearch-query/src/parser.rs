//! Recursive-descent parser for the two filter dialects.
//!
//! Grammar (lowest precedence first):
//!
//! ```text
//! filter    := or_expr EOF
//! or_expr   := and_expr ( OR and_expr )*
//! and_expr  := not_expr ( AND not_expr )*
//! not_expr  := NOT not_expr | primary
//! primary   := '(' or_expr ')' | INCLUDE | EXCLUDE | IN '(' str, ... ')' | predicate
//! predicate := name ( cmp literal
//!                   | [NOT] LIKE str | [NOT] ILIKE str
//!                   | [NOT] BETWEEN literal AND literal
//!                   | [NOT] IN '(' literal, ... ')'
//!                   | IS [NOT] NULL
//!                   | BEFORE ts | AFTER ts | DURING ts '/' ts )
//! ```
//!
//! `ILIKE`, `IN` and the bare identifier predicate exist only in
//! [`Dialect::Extended`], which also reserves `id` as a name.
//!
//! Parentheses and `NOT` may nest at most [`MAX_NESTING`] levels deep.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::ast::{ComparisonOp, FilterTree, Literal, TemporalOp, ID_PROPERTY};
use crate::error::ParseError;
use crate::lexer::{tokenize, Token, TokenKind};

const KEYWORDS: &[&str] = &[
    "AND", "OR", "NOT", "LIKE", "ILIKE", "BETWEEN", "IN", "IS", "NULL", "BEFORE", "AFTER",
    "DURING", "INCLUDE", "EXCLUDE",
];

/// Deepest allowed nesting of parentheses and `NOT`.
pub const MAX_NESTING: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Primary dialect: adds `ILIKE`, `IN` lists and the identifier predicate.
    Extended,
    /// Secondary dialect: treats `id` as an ordinary attribute.
    Base,
}

impl Dialect {
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Extended => "extended",
            Dialect::Base => "base",
        }
    }

    fn is_extended(&self) -> bool {
        matches!(self, Dialect::Extended)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse `input` under one dialect.
pub fn parse(dialect: Dialect, input: &str) -> Result<FilterTree, ParseError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        dialect,
        tokens,
        pos: 0,
        end: input.len(),
        depth: 0,
    };

    if parser.tokens.is_empty() {
        return Err(ParseError::new(0, "empty filter"));
    }

    let tree = parser.or_expr()?;
    if let Some(token) = parser.peek() {
        return Err(ParseError::new(
            token.position,
            format!("unexpected {}", describe(&token.kind)),
        ));
    }
    Ok(tree)
}

/// One strategy in a [`ParserChain`].
pub trait FilterParser: Send + Sync {
    fn name(&self) -> &'static str;

    fn parse(&self, input: &str) -> Result<FilterTree, ParseError>;
}

impl FilterParser for Dialect {
    fn name(&self) -> &'static str {
        Dialect::name(self)
    }

    fn parse(&self, input: &str) -> Result<FilterTree, ParseError> {
        parse(*self, input)
    }
}

/// Ordered list of parsers tried in sequence; the first success wins.
///
/// The base dialect must stay in the standard chain: bare `id = '...'` only
/// parses there.
pub struct ParserChain {
    parsers: Vec<Box<dyn FilterParser>>,
}

impl Default for ParserChain {
    fn default() -> Self {
        Self::standard()
    }
}

impl ParserChain {
    pub fn new(parsers: Vec<Box<dyn FilterParser>>) -> Self {
        Self { parsers }
    }

    /// Extended dialect first, then base.
    pub fn standard() -> Self {
        Self::new(vec![Box::new(Dialect::Extended), Box::new(Dialect::Base)])
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.parsers.iter().map(|p| p.name()).collect()
    }

    /// Parse with each strategy in turn. When all fail, the last error is
    /// returned.
    pub fn parse(&self, input: &str) -> Result<FilterTree, ParseError> {
        let mut last_error = ParseError::new(0, "no filter parsers configured");
        for parser in &self.parsers {
            match parser.parse(input) {
                Ok(tree) => return Ok(tree),
                Err(e) => {
                    debug!(dialect = parser.name(), error = %e, "Filter parse failed, trying next dialect");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Ident(name) => format!("'{}'", name),
        TokenKind::Str(s) => format!("string '{}'", s),
        TokenKind::Number(n) => format!("number {}", n),
        TokenKind::Timestamp(ts) => format!("timestamp {}", ts.to_rfc3339()),
        TokenKind::LParen => "'('".to_string(),
        TokenKind::RParen => "')'".to_string(),
        TokenKind::Comma => "','".to_string(),
        TokenKind::Slash => "'/'".to_string(),
        TokenKind::Eq => "'='".to_string(),
        TokenKind::NotEq => "'<>'".to_string(),
        TokenKind::Lt => "'<'".to_string(),
        TokenKind::Gt => "'>'".to_string(),
        TokenKind::Le => "'<='".to_string(),
        TokenKind::Ge => "'>='".to_string(),
    }
}

fn is_keyword(name: &str) -> bool {
    KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(name))
}

struct Parser {
    dialect: Dialect,
    tokens: Vec<Token>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn position(&self) -> usize {
        self.peek().map(|t| t.position).unwrap_or(self.end)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.position(), message)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::new(
                token.position,
                format!("expected {}, found {}", expected, describe(&token.kind)),
            ),
            None => ParseError::new(self.end, format!("expected {}, found end of input", expected)),
        }
    }

    fn keyword_at(&self, offset: usize, keyword: &str) -> bool {
        matches!(
            self.peek_at(offset),
            Some(Token { kind: TokenKind::Ident(name), .. }) if name.eq_ignore_ascii_case(keyword)
        )
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.keyword_at(0, keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected(keyword))
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<(), ParseError> {
        if self.peek().map(|t| &t.kind) == Some(&kind) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error("filter nested too deeply"));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn or_expr(&mut self) -> Result<FilterTree, ParseError> {
        let mut children = vec![self.and_expr()?];
        while self.eat_keyword("OR") {
            children.push(self.and_expr()?);
        }
        Ok(if children.len() == 1 {
            children.remove(0)
        } else {
            FilterTree::Or(children)
        })
    }

    fn and_expr(&mut self) -> Result<FilterTree, ParseError> {
        let mut children = vec![self.not_expr()?];
        while self.eat_keyword("AND") {
            children.push(self.not_expr()?);
        }
        Ok(if children.len() == 1 {
            children.remove(0)
        } else {
            FilterTree::And(children)
        })
    }

    fn not_expr(&mut self) -> Result<FilterTree, ParseError> {
        if self.eat_keyword("NOT") {
            let inner = self.nested(|p| p.not_expr())?;
            return Ok(FilterTree::Not(Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<FilterTree, ParseError> {
        if self.peek().map(|t| &t.kind) == Some(&TokenKind::LParen) {
            return self.nested(|p| {
                p.pos += 1;
                let tree = p.or_expr()?;
                p.expect(TokenKind::RParen, "')'")?;
                Ok(tree)
            });
        }
        if self.eat_keyword("INCLUDE") {
            return Ok(FilterTree::Include);
        }
        if self.eat_keyword("EXCLUDE") {
            return Ok(FilterTree::Exclude);
        }
        if self.dialect.is_extended() && self.keyword_at(0, "IN") {
            self.pos += 1;
            return self.id_predicate();
        }
        self.predicate()
    }

    fn property(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) if !is_keyword(name) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected("attribute name")),
        }
    }

    fn predicate(&mut self) -> Result<FilterTree, ParseError> {
        let start = self.position();
        let property = self.property()?;

        if self.dialect.is_extended() && property.eq_ignore_ascii_case(ID_PROPERTY) {
            // Reserved here; only `id IN (...)` is accepted.
            if self.eat_keyword("IN") {
                return self.id_predicate();
            }
            return Err(ParseError::new(
                start,
                "'id' is reserved in the extended dialect; use IN ('...')",
            ));
        }

        let comparison = match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Eq) => Some(ComparisonOp::Eq),
            Some(TokenKind::NotEq) => Some(ComparisonOp::NotEq),
            Some(TokenKind::Lt) => Some(ComparisonOp::Lt),
            Some(TokenKind::Gt) => Some(ComparisonOp::Gt),
            Some(TokenKind::Le) => Some(ComparisonOp::Le),
            Some(TokenKind::Ge) => Some(ComparisonOp::Ge),
            _ => None,
        };
        if let Some(op) = comparison {
            self.pos += 1;
            let value = self.literal()?;
            return Ok(FilterTree::Compare {
                property,
                op,
                value,
            });
        }

        if self.eat_keyword("IS") {
            let negated = self.eat_keyword("NOT");
            self.expect_keyword("NULL")?;
            return Ok(FilterTree::IsNull { property, negated });
        }

        if self.eat_keyword("BEFORE") {
            let start = self.timestamp()?;
            return Ok(FilterTree::Temporal {
                property,
                op: TemporalOp::Before,
                start,
                end: None,
            });
        }
        if self.eat_keyword("AFTER") {
            let start = self.timestamp()?;
            return Ok(FilterTree::Temporal {
                property,
                op: TemporalOp::After,
                start,
                end: None,
            });
        }
        if self.eat_keyword("DURING") {
            let start = self.timestamp()?;
            self.expect(TokenKind::Slash, "'/'")?;
            let end = self.timestamp()?;
            if end < start {
                return Err(self.error("DURING period ends before it starts"));
            }
            return Ok(FilterTree::Temporal {
                property,
                op: TemporalOp::During,
                start,
                end: Some(end),
            });
        }

        let negated = self.eat_keyword("NOT");

        if self.eat_keyword("LIKE") {
            let pattern = self.string()?;
            return Ok(FilterTree::Like {
                property,
                pattern,
                case_insensitive: false,
                negated,
            });
        }
        if self.dialect.is_extended() && self.eat_keyword("ILIKE") {
            let pattern = self.string()?;
            return Ok(FilterTree::Like {
                property,
                pattern,
                case_insensitive: true,
                negated,
            });
        }
        if self.eat_keyword("BETWEEN") {
            let lower = self.literal()?;
            self.expect_keyword("AND")?;
            let upper = self.literal()?;
            return Ok(FilterTree::Between {
                property,
                lower,
                upper,
                negated,
            });
        }
        if self.dialect.is_extended() && self.eat_keyword("IN") {
            let values = self.literal_list()?;
            return Ok(FilterTree::In {
                property,
                values,
                negated,
            });
        }

        Err(self.unexpected("comparison operator"))
    }

    /// Identifier list after `IN`.
    fn id_predicate(&mut self) -> Result<FilterTree, ParseError> {
        let ids = self
            .literal_list()?
            .into_iter()
            .map(|lit| lit.as_text())
            .collect();
        Ok(FilterTree::IdIn(ids))
    }

    fn literal_list(&mut self) -> Result<Vec<Literal>, ParseError> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut values = vec![self.literal()?];
        while self.peek().map(|t| &t.kind) == Some(&TokenKind::Comma) {
            self.pos += 1;
            values.push(self.literal()?);
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(values)
    }

    fn literal(&mut self) -> Result<Literal, ParseError> {
        let literal = match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Str(s)) => Literal::String(s.clone()),
            Some(TokenKind::Number(n)) => Literal::Number(n.clone()),
            Some(TokenKind::Timestamp(ts)) => Literal::Timestamp(*ts),
            _ => return Err(self.unexpected("literal")),
        };
        self.advance();
        Ok(literal)
    }

    fn string(&mut self) -> Result<String, ParseError> {
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Str(s)) => {
                let s = s.clone();
                self.pos += 1;
                Ok(s)
            }
            _ => Err(self.unexpected("string literal")),
        }
    }

    /// A timestamp, written bare or quoted.
    fn timestamp(&mut self) -> Result<DateTime<Utc>, ParseError> {
        let position = self.position();
        let literal = self.literal()?;
        literal
            .as_timestamp()
            .ok_or_else(|| ParseError::new(position, format!("expected timestamp, found {}", literal)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    const ID: &str = "00067360b70e4acfab561fe593ad3f7a";

    fn string_compare(property: &str, value: &str) -> FilterTree {
        FilterTree::Compare {
            property: property.into(),
            op: ComparisonOp::Eq,
            value: Literal::String(value.into()),
        }
    }

    #[test]
    fn test_equality_in_both_dialects() {
        for dialect in [Dialect::Extended, Dialect::Base] {
            assert_eq!(
                parse(dialect, "title = 'Winterfell'").unwrap(),
                string_compare("title", "Winterfell")
            );
        }
    }

    #[test]
    fn test_bare_id_equality_only_in_base() {
        let query = format!("id = '{}'", ID);
        assert!(parse(Dialect::Extended, &query).is_err());
        assert_eq!(parse(Dialect::Base, &query).unwrap(), string_compare("id", ID));
    }

    #[test]
    fn test_id_predicate_only_in_extended() {
        let query = format!("IN ('{}')", ID);
        assert_eq!(
            parse(Dialect::Extended, &query).unwrap(),
            FilterTree::IdIn(vec![ID.into()])
        );
        assert!(parse(Dialect::Base, &query).is_err());

        let query = format!("id IN ('{}', 'abc')", ID);
        assert_eq!(
            parse(Dialect::Extended, &query).unwrap(),
            FilterTree::IdIn(vec![ID.into(), "abc".into()])
        );
    }

    #[test]
    fn test_like_and_boolean_precedence() {
        let tree = parse(
            Dialect::Extended,
            "contents LIKE 'Winterfell' OR XXX LIKE 'Kings Landing' AND title = 'x'",
        )
        .unwrap();
        let FilterTree::Or(children) = tree else {
            panic!("expected OR at the root");
        };
        assert_eq!(children.len(), 2);
        assert!(matches!(children[1], FilterTree::And(_)));
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let tree = parse(Dialect::Base, "title like 'a' and not keyword = 'b'").unwrap();
        assert!(matches!(tree, FilterTree::And(ref c) if matches!(c[1], FilterTree::Not(_))));
    }

    #[test]
    fn test_parentheses() {
        let tree = parse(Dialect::Base, "(title = 'a' OR title = 'b') AND keyword = 'c'").unwrap();
        let FilterTree::And(children) = tree else {
            panic!("expected AND at the root");
        };
        assert!(matches!(children[0], FilterTree::Or(_)));
    }

    #[test]
    fn test_ilike_only_in_extended() {
        let tree = parse(Dialect::Extended, "title ILIKE 'north%'").unwrap();
        assert!(matches!(
            tree,
            FilterTree::Like {
                case_insensitive: true,
                negated: false,
                ..
            }
        ));
        assert!(parse(Dialect::Base, "title ILIKE 'north%'").is_err());
    }

    #[test]
    fn test_not_like_between_and_null() {
        assert!(matches!(
            parse(Dialect::Base, "title NOT LIKE 'a%'").unwrap(),
            FilterTree::Like { negated: true, .. }
        ));
        assert!(matches!(
            parse(Dialect::Base, "created BETWEEN 2019-01-01T00:00:00Z AND 2020-01-01T00:00:00Z")
                .unwrap(),
            FilterTree::Between { negated: false, .. }
        ));
        assert_eq!(
            parse(Dialect::Base, "title IS NOT NULL").unwrap(),
            FilterTree::IsNull {
                property: "title".into(),
                negated: true
            }
        );
    }

    #[test]
    fn test_temporal_operators() {
        let start = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();

        assert_eq!(
            parse(Dialect::Base, "created DURING 2019-01-01T00:00:00Z/2020-01-01T00:00:00Z")
                .unwrap(),
            FilterTree::Temporal {
                property: "created".into(),
                op: TemporalOp::During,
                start,
                end: Some(end),
            }
        );
        assert!(matches!(
            parse(Dialect::Extended, "modified AFTER '2019-01-01T00:00:00Z'").unwrap(),
            FilterTree::Temporal {
                op: TemporalOp::After,
                ..
            }
        ));
        assert!(parse(Dialect::Base, "created BEFORE 'yesterday'").is_err());
        assert!(
            parse(Dialect::Base, "created DURING 2020-01-01T00:00:00Z/2019-01-01T00:00:00Z")
                .is_err()
        );
    }

    #[test]
    fn test_in_list() {
        let tree = parse(Dialect::Extended, "countryCode NOT IN ('USA', 'CAN')").unwrap();
        assert_eq!(
            tree,
            FilterTree::In {
                property: "countryCode".into(),
                values: vec![Literal::String("USA".into()), Literal::String("CAN".into())],
                negated: true,
            }
        );
    }

    #[test]
    fn test_include_exclude() {
        assert_eq!(parse(Dialect::Base, "INCLUDE").unwrap(), FilterTree::Include);
        assert_eq!(parse(Dialect::Extended, "exclude").unwrap(), FilterTree::Exclude);
    }

    #[test]
    fn test_malformed_queries() {
        for query in [
            "contents LIKE don't",
            "contents SORTALIKE 'metadata'",
            "",
            "title =",
            "title = 'a' AND",
            "(title = 'a'",
            "title = 'a')",
            "AND = 'a'",
        ] {
            assert!(parse(Dialect::Extended, query).is_err(), "{}", query);
            assert!(parse(Dialect::Base, query).is_err(), "{}", query);
        }
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let query = format!("{}INCLUDE{}", "(".repeat(2400), ")".repeat(2400));
        for dialect in [Dialect::Extended, Dialect::Base] {
            let err = parse(dialect, &query).unwrap_err();
            assert_eq!(err.position, MAX_NESTING);
            assert!(err.message.contains("nested too deeply"));
        }

        let nots = format!("{}title = 'a'", "NOT ".repeat(500));
        assert!(parse(Dialect::Base, &nots).is_err());
    }

    #[test]
    fn test_nesting_at_limit_parses() {
        let query = format!(
            "{}INCLUDE{}",
            "(".repeat(MAX_NESTING),
            ")".repeat(MAX_NESTING)
        );
        assert_eq!(parse(Dialect::Base, &query).unwrap(), FilterTree::Include);

        let nots = format!("{}INCLUDE", "NOT ".repeat(MAX_NESTING));
        assert!(parse(Dialect::Extended, &nots).is_ok());
    }

    #[test]
    fn test_error_position_at_end_of_input() {
        let err = parse(Dialect::Base, "title =").unwrap_err();
        assert_eq!(err.position, 7);
    }

    #[test]
    fn test_chain_falls_back_to_base() {
        let chain = ParserChain::standard();
        assert_eq!(chain.names(), vec!["extended", "base"]);

        let tree = chain.parse(&format!("id = '{}'", ID)).unwrap();
        assert_eq!(tree, string_compare("id", ID));
    }

    #[test]
    fn test_chain_returns_last_error() {
        let chain = ParserChain::standard();
        let err = chain.parse("contents SORTALIKE 'metadata'").unwrap_err();
        let base_err = parse(Dialect::Base, "contents SORTALIKE 'metadata'").unwrap_err();
        assert_eq!(err, base_err);
    }

    #[test]
    fn test_empty_chain_fails() {
        let chain = ParserChain::new(Vec::new());
        assert!(chain.parse("title = 'a'").is_err());
    }
}
