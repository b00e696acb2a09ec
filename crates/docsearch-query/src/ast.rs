//! Filter tree produced by the parser.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};

/// A literal operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    String(String),
    /// Kept as written; no numeric attributes exist, so numbers only ever
    /// compare as text.
    Number(String),
    Timestamp(DateTime<Utc>),
}

impl Literal {
    /// The literal as a timestamp, if it is one or is a string holding one.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Literal::Timestamp(ts) => Some(*ts),
            Literal::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|ts| ts.with_timezone(&Utc)),
            Literal::Number(_) => None,
        }
    }

    /// The literal as plain text.
    pub fn as_text(&self) -> String {
        match self {
            Literal::String(s) | Literal::Number(s) => s.clone(),
            Literal::Timestamp(ts) => ts.to_rfc3339(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Literal::Number(n) => f.write_str(n),
            Literal::Timestamp(ts) => f.write_str(&ts.to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
}

impl ComparisonOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::NotEq => "<>",
            ComparisonOp::Lt => "<",
            ComparisonOp::Gt => ">",
            ComparisonOp::Le => "<=",
            ComparisonOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalOp {
    Before,
    After,
    During,
}

/// A parsed filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterTree {
    /// Matches everything.
    Include,
    /// Matches nothing.
    Exclude,
    And(Vec<FilterTree>),
    Or(Vec<FilterTree>),
    Not(Box<FilterTree>),
    Compare {
        property: String,
        op: ComparisonOp,
        value: Literal,
    },
    Like {
        property: String,
        pattern: String,
        case_insensitive: bool,
        negated: bool,
    },
    Between {
        property: String,
        lower: Literal,
        upper: Literal,
        negated: bool,
    },
    In {
        property: String,
        values: Vec<Literal>,
        negated: bool,
    },
    /// Identifier predicate, extended dialect only.
    IdIn(Vec<String>),
    IsNull {
        property: String,
        negated: bool,
    },
    Temporal {
        property: String,
        op: TemporalOp,
        start: DateTime<Utc>,
        /// Only set for `DURING`.
        end: Option<DateTime<Utc>>,
    },
}

/// Attribute name the identifier predicate refers to.
pub const ID_PROPERTY: &str = "id";

impl FilterTree {
    /// Every attribute name referenced anywhere in the tree.
    pub fn property_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_properties(&mut names);
        names
    }

    fn collect_properties(&self, names: &mut BTreeSet<String>) {
        match self {
            FilterTree::Include | FilterTree::Exclude => {}
            FilterTree::And(children) | FilterTree::Or(children) => {
                for child in children {
                    child.collect_properties(names);
                }
            }
            FilterTree::Not(inner) => inner.collect_properties(names),
            FilterTree::IdIn(_) => {
                names.insert(ID_PROPERTY.to_string());
            }
            FilterTree::Compare { property, .. }
            | FilterTree::Like { property, .. }
            | FilterTree::Between { property, .. }
            | FilterTree::In { property, .. }
            | FilterTree::IsNull { property, .. }
            | FilterTree::Temporal { property, .. } => {
                names.insert(property.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compare(property: &str, value: &str) -> FilterTree {
        FilterTree::Compare {
            property: property.to_string(),
            op: ComparisonOp::Eq,
            value: Literal::String(value.to_string()),
        }
    }

    #[test]
    fn test_property_names_walks_whole_tree() {
        let tree = FilterTree::Or(vec![
            FilterTree::And(vec![compare("title", "a"), compare("keyword", "b")]),
            FilterTree::Not(Box::new(FilterTree::IsNull {
                property: "bogus".to_string(),
                negated: false,
            })),
            compare("title", "c"),
        ]);

        let names: Vec<String> = tree.property_names().into_iter().collect();
        assert_eq!(names, vec!["bogus", "keyword", "title"]);
    }

    #[test]
    fn test_id_predicate_references_id() {
        let tree = FilterTree::IdIn(vec!["a".into()]);
        assert!(tree.property_names().contains("id"));
        assert!(FilterTree::Include.property_names().is_empty());
    }

    #[test]
    fn test_literal_as_timestamp() {
        let lit = Literal::String("2019-11-04T12:00:00Z".into());
        assert!(lit.as_timestamp().is_some());
        assert!(Literal::String("yesterday".into()).as_timestamp().is_none());
        assert!(Literal::Number("5".into()).as_timestamp().is_none());
    }

    #[test]
    fn test_literal_display_escapes_quotes() {
        assert_eq!(Literal::String("don't".into()).to_string(), "'don''t'");
    }
}
