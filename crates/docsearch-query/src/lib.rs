//! # docsearch-query
//!
//! CQL-style filter language for docsearch.
//!
//! - Two dialects sharing one lexer: [`Dialect::Extended`] (tried first) and
//!   [`Dialect::Base`], chained by [`ParserChain`]
//! - [`FilterTree`]: the parsed, transient filter
//! - [`TantivyQueryRenderer`]: renders a validated tree to Tantivy query syntax
//!
//! ## Usage
//!
//! ```rust
//! use docsearch_query::{ParserChain, QueryRenderer, TantivyQueryRenderer};
//!
//! let tree = ParserChain::standard().parse("contents LIKE '*Winterfell*'").unwrap();
//! let rendered = TantivyQueryRenderer::new().render(&tree).unwrap();
//! assert_eq!(rendered, "contents:\"Winterfell\"");
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod render;

pub use ast::{ComparisonOp, FilterTree, Literal, TemporalOp};
pub use error::{ParseError, RenderError};
pub use parser::{parse, Dialect, FilterParser, ParserChain, MAX_NESTING};
pub use render::{QueryRenderer, TantivyQueryRenderer};
