//! Rendering filter trees to Tantivy query syntax.
//!
//! Output only uses constructs the Tantivy query parser documents: field
//! phrases, `[a TO b]` style ranges with `*` for open bounds, `+`/`-`
//! occurrence prefixes and `*` for all documents.

use chrono::{DateTime, SecondsFormat, Utc};

use docsearch_types::{Attribute, AttributeKind};

use crate::ast::{ComparisonOp, FilterTree, Literal, TemporalOp, ID_PROPERTY};
use crate::error::RenderError;

/// Wildcards accepted in LIKE patterns.
const WILDCARDS: [char; 4] = ['*', '%', '?', '_'];

/// Turns a validated filter tree into a backend query string.
pub trait QueryRenderer: Send + Sync {
    fn render(&self, tree: &FilterTree) -> Result<String, RenderError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TantivyQueryRenderer;

impl TantivyQueryRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl QueryRenderer for TantivyQueryRenderer {
    fn render(&self, tree: &FilterTree) -> Result<String, RenderError> {
        render_node(tree)
    }
}

fn render_node(tree: &FilterTree) -> Result<String, RenderError> {
    match tree {
        FilterTree::Include => Ok("*".to_string()),
        FilterTree::Exclude => Ok("(* -*)".to_string()),
        FilterTree::And(children) => {
            let parts = children
                .iter()
                .map(|c| render_node(c).map(|s| format!("+{}", s)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("({})", parts.join(" ")))
        }
        FilterTree::Or(children) => {
            let parts = children
                .iter()
                .map(render_node)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("({})", parts.join(" ")))
        }
        FilterTree::Not(inner) => Ok(negate(&render_node(inner)?)),
        FilterTree::Compare {
            property,
            op,
            value,
        } => render_compare(attribute(property)?, *op, value),
        FilterTree::Like {
            property,
            pattern,
            case_insensitive,
            negated,
        } => {
            let rendered = render_like(attribute(property)?, pattern, *case_insensitive)?;
            Ok(maybe_negate(rendered, *negated))
        }
        FilterTree::Between {
            property,
            lower,
            upper,
            negated,
        } => {
            let attr = attribute(property)?;
            let lower = timestamp_operand(attr, lower)?;
            let upper = timestamp_operand(attr, upper)?;
            let rendered = range(attr, Bound::Inclusive(lower), Bound::Inclusive(upper));
            Ok(maybe_negate(rendered, *negated))
        }
        FilterTree::In {
            property,
            values,
            negated,
        } => {
            let attr = attribute(property)?;
            let parts = values
                .iter()
                .map(|v| render_compare(attr, ComparisonOp::Eq, v))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(maybe_negate(format!("({})", parts.join(" ")), *negated))
        }
        FilterTree::IdIn(ids) => {
            let field = attribute(ID_PROPERTY)?;
            let parts: Vec<String> = ids.iter().map(|id| exact(field, id)).collect();
            Ok(format!("({})", parts.join(" ")))
        }
        FilterTree::IsNull { property, .. } => Err(RenderError::unsupported(
            property,
            "IS NULL has no equivalent in the index query syntax",
        )),
        FilterTree::Temporal {
            property,
            op,
            start,
            end,
        } => {
            let attr = attribute(property)?;
            if attr.kind() != AttributeKind::Timestamp {
                return Err(RenderError::unsupported(
                    property,
                    "temporal operators apply to timestamp attributes only",
                ));
            }
            let rendered = match (op, end) {
                (TemporalOp::Before, _) => range(attr, Bound::Unbounded, Bound::Exclusive(*start)),
                (TemporalOp::After, _) => range(attr, Bound::Exclusive(*start), Bound::Unbounded),
                (TemporalOp::During, Some(end)) => {
                    range(attr, Bound::Exclusive(*start), Bound::Exclusive(*end))
                }
                (TemporalOp::During, None) => {
                    return Err(RenderError::unsupported(property, "DURING without an end"))
                }
            };
            Ok(rendered)
        }
    }
}

fn attribute(name: &str) -> Result<Attribute, RenderError> {
    Attribute::parse(name).ok_or_else(|| RenderError::UnknownAttribute(name.to_string()))
}

fn negate(rendered: &str) -> String {
    format!("(* -{})", rendered)
}

fn maybe_negate(rendered: String, negated: bool) -> String {
    if negated {
        negate(&rendered)
    } else {
        rendered
    }
}

fn render_compare(attr: Attribute, op: ComparisonOp, value: &Literal) -> Result<String, RenderError> {
    if attr.kind() == AttributeKind::Timestamp {
        let ts = timestamp_operand(attr, value)?;
        let rendered = match op {
            ComparisonOp::Eq | ComparisonOp::NotEq => {
                range(attr, Bound::Inclusive(ts), Bound::Inclusive(ts))
            }
            ComparisonOp::Lt => range(attr, Bound::Unbounded, Bound::Exclusive(ts)),
            ComparisonOp::Le => range(attr, Bound::Unbounded, Bound::Inclusive(ts)),
            ComparisonOp::Gt => range(attr, Bound::Exclusive(ts), Bound::Unbounded),
            ComparisonOp::Ge => range(attr, Bound::Inclusive(ts), Bound::Unbounded),
        };
        return Ok(maybe_negate(rendered, op == ComparisonOp::NotEq));
    }

    let rendered = match op {
        ComparisonOp::Eq | ComparisonOp::NotEq => match attr.kind() {
            AttributeKind::Text => phrase(attr, &value.as_text())?,
            _ => exact(attr, &value.as_text()),
        },
        _ => {
            return Err(RenderError::unsupported(
                attr.name(),
                format!("'{}' needs a timestamp attribute", op.symbol()),
            ))
        }
    };
    Ok(maybe_negate(rendered, op == ComparisonOp::NotEq))
}

fn render_like(attr: Attribute, pattern: &str, case_insensitive: bool) -> Result<String, RenderError> {
    match attr.kind() {
        // Text fields are lower-cased at index time, so ILIKE and LIKE agree.
        AttributeKind::Text => phrase(attr, pattern),
        AttributeKind::Keyword | AttributeKind::Locator => {
            if case_insensitive {
                return Err(RenderError::unsupported(
                    attr.name(),
                    "ILIKE needs a text attribute",
                ));
            }
            if pattern.contains(WILDCARDS) {
                return Err(RenderError::unsupported(
                    attr.name(),
                    "wildcards need a text attribute",
                ));
            }
            Ok(exact(attr, pattern))
        }
        AttributeKind::Timestamp => Err(RenderError::unsupported(
            attr.name(),
            "LIKE does not apply to timestamps",
        )),
    }
}

/// Phrase over the tokens of `value`; wildcards separate tokens.
fn phrase(attr: Attribute, value: &str) -> Result<String, RenderError> {
    let cleaned: String = value
        .chars()
        .map(|c| {
            if WILDCARDS.contains(&c) || c == '"' || c == '\\' {
                ' '
            } else {
                c
            }
        })
        .collect();
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();

    if tokens.is_empty() {
        // Every record carries contents, so a bare wildcard there matches all.
        if attr == Attribute::Contents {
            return Ok("*".to_string());
        }
        return Err(RenderError::unsupported(
            attr.name(),
            "pattern has no searchable terms",
        ));
    }
    Ok(format!("{}:\"{}\"", attr.name(), tokens.join(" ")))
}

/// Exact term on an untokenized field.
fn exact(attr: Attribute, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("{}:\"{}\"", attr.name(), escaped)
}

fn timestamp_operand(attr: Attribute, value: &Literal) -> Result<DateTime<Utc>, RenderError> {
    if attr.kind() != AttributeKind::Timestamp {
        return Err(RenderError::unsupported(
            attr.name(),
            "range operators apply to timestamp attributes only",
        ));
    }
    value.as_timestamp().ok_or_else(|| RenderError::InvalidTimestamp {
        attribute: attr.name().to_string(),
        value: value.as_text(),
    })
}

enum Bound {
    Inclusive(DateTime<Utc>),
    Exclusive(DateTime<Utc>),
    Unbounded,
}

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn range(attr: Attribute, lower: Bound, upper: Bound) -> String {
    let (open, low) = match lower {
        Bound::Inclusive(ts) => ('[', format_ts(&ts)),
        Bound::Exclusive(ts) => ('{', format_ts(&ts)),
        Bound::Unbounded => ('[', "*".to_string()),
    };
    let (close, high) = match upper {
        Bound::Inclusive(ts) => (']', format_ts(&ts)),
        Bound::Exclusive(ts) => ('}', format_ts(&ts)),
        Bound::Unbounded => (']', "*".to_string()),
    };
    format!("{}:{}{} TO {}{}", attr.name(), open, low, high, close)
}
