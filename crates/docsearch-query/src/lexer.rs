//! Tokenizer shared by both dialects.

use chrono::{DateTime, Utc};

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Bare or double-quoted name. Keywords are identifiers too; the parser
    /// decides by context.
    Ident(String),
    Str(String),
    Number(String),
    Timestamp(DateTime<Utc>),
    LParen,
    RParen,
    Comma,
    Slash,
    Eq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset into the query string.
    pub position: usize,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == ':'
}

fn is_literal_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ':' | '.' | '+' | '-')
}

/// Split a query string into tokens.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (position, c) = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let simple = match c {
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            ',' => Some(TokenKind::Comma),
            '/' => Some(TokenKind::Slash),
            '=' => Some(TokenKind::Eq),
            _ => None,
        };
        if let Some(kind) = simple {
            tokens.push(Token { kind, position });
            i += 1;
            continue;
        }

        let next = chars.get(i + 1).map(|(_, c)| *c);
        match c {
            '<' => {
                let (kind, width) = match next {
                    Some('=') => (TokenKind::Le, 2),
                    Some('>') => (TokenKind::NotEq, 2),
                    _ => (TokenKind::Lt, 1),
                };
                tokens.push(Token { kind, position });
                i += width;
            }
            '>' => {
                let (kind, width) = match next {
                    Some('=') => (TokenKind::Ge, 2),
                    _ => (TokenKind::Gt, 1),
                };
                tokens.push(Token { kind, position });
                i += width;
            }
            '!' if next == Some('=') => {
                tokens.push(Token {
                    kind: TokenKind::NotEq,
                    position,
                });
                i += 2;
            }
            '\'' => {
                let (value, end) = read_quoted(&chars, i, '\'')
                    .ok_or_else(|| ParseError::new(position, "unterminated string literal"))?;
                tokens.push(Token {
                    kind: TokenKind::Str(value),
                    position,
                });
                i = end;
            }
            '"' => {
                let (value, end) = read_quoted(&chars, i, '"')
                    .ok_or_else(|| ParseError::new(position, "unterminated quoted name"))?;
                if value.is_empty() {
                    return Err(ParseError::new(position, "empty quoted name"));
                }
                tokens.push(Token {
                    kind: TokenKind::Ident(value),
                    position,
                });
                i = end;
            }
            c if is_ident_start(c) => {
                let start = i;
                while i < chars.len() && is_ident_char(chars[i].1) {
                    i += 1;
                }
                let name: String = chars[start..i].iter().map(|(_, c)| *c).collect();
                tokens.push(Token {
                    kind: TokenKind::Ident(name),
                    position,
                });
            }
            c if c.is_ascii_digit() || (c == '-' && next.is_some_and(|n| n.is_ascii_digit())) => {
                let start = i;
                i += 1;
                while i < chars.len() && is_literal_char(chars[i].1) {
                    i += 1;
                }
                let text: String = chars[start..i].iter().map(|(_, c)| *c).collect();
                tokens.push(Token {
                    kind: classify_literal(&text, position)?,
                    position,
                });
            }
            other => {
                return Err(ParseError::new(
                    position,
                    format!("unexpected character '{}'", other),
                ));
            }
        }
    }

    Ok(tokens)
}

/// Read a quoted run starting at `start`; a doubled quote is an escaped quote.
/// Returns the unescaped value and the index just past the closing quote.
fn read_quoted(chars: &[(usize, char)], start: usize, quote: char) -> Option<(String, usize)> {
    let mut value = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i].1;
        if c == quote {
            if chars.get(i + 1).map(|(_, c)| *c) == Some(quote) {
                value.push(quote);
                i += 2;
                continue;
            }
            return Some((value, i + 1));
        }
        value.push(c);
        i += 1;
    }
    None
}

fn classify_literal(text: &str, position: usize) -> Result<TokenKind, ParseError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(TokenKind::Timestamp(ts.with_timezone(&Utc)));
    }
    if text.parse::<f64>().is_ok() {
        return Ok(TokenKind::Number(text.to_string()));
    }
    Err(ParseError::new(
        position,
        format!("invalid literal '{}'", text),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_comparison() {
        assert_eq!(
            kinds("title = 'North'"),
            vec![
                TokenKind::Ident("title".into()),
                TokenKind::Eq,
                TokenKind::Str("North".into()),
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("< <= > >= <> !="),
            vec![
                TokenKind::Lt,
                TokenKind::Le,
                TokenKind::Gt,
                TokenKind::Ge,
                TokenKind::NotEq,
                TokenKind::NotEq,
            ]
        );
    }

    #[test]
    fn test_escaped_quote_in_string() {
        assert_eq!(kinds("'don''t'"), vec![TokenKind::Str("don't".into())]);
    }

    #[test]
    fn test_unterminated_string_reports_position() {
        let err = tokenize("contents LIKE don't").unwrap_err();
        assert_eq!(err.position, 17);
    }

    #[test]
    fn test_timestamp_and_number_literals() {
        let tokens = kinds("2019-11-04T12:30:00Z/2019-11-05T00:00:00Z 42 -1.5");
        assert!(matches!(tokens[0], TokenKind::Timestamp(_)));
        assert_eq!(tokens[1], TokenKind::Slash);
        assert!(matches!(tokens[2], TokenKind::Timestamp(_)));
        assert_eq!(tokens[3], TokenKind::Number("42".into()));
        assert_eq!(tokens[4], TokenKind::Number("-1.5".into()));
    }

    #[test]
    fn test_invalid_literal() {
        assert!(tokenize("created = 2019-13-99").is_err());
    }

    #[test]
    fn test_quoted_name() {
        assert_eq!(
            kinds("\"countryCode\" = 'USA'"),
            vec![
                TokenKind::Ident("countryCode".into()),
                TokenKind::Eq,
                TokenKind::Str("USA".into()),
            ]
        );
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("title ~ 'x'").unwrap_err();
        assert_eq!(err.position, 6);
    }
}
