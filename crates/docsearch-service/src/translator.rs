//! Query translation: parse with dialect fallback, check attributes against
//! the registry, render to the index query syntax.

use tracing::debug;

use docsearch_query::{FilterTree, ParserChain, QueryRenderer, TantivyQueryRenderer};
use docsearch_types::unsupported_attributes;

use crate::error::{QueryInputError, SearchError};

/// Default bound on query length, in characters.
pub const DEFAULT_MAX_QUERY_LENGTH: usize = 5000;

pub struct QueryTranslator {
    parsers: ParserChain,
    renderer: Box<dyn QueryRenderer>,
    max_query_length: usize,
}

impl Default for QueryTranslator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_QUERY_LENGTH)
    }
}

impl QueryTranslator {
    pub fn new(max_query_length: usize) -> Self {
        Self::with_parts(
            ParserChain::standard(),
            Box::new(TantivyQueryRenderer::new()),
            max_query_length,
        )
    }

    pub fn with_parts(
        parsers: ParserChain,
        renderer: Box<dyn QueryRenderer>,
        max_query_length: usize,
    ) -> Self {
        Self {
            parsers,
            renderer,
            max_query_length,
        }
    }

    /// Parse and validate without rendering.
    pub fn parse_and_validate(&self, query: &str) -> Result<FilterTree, SearchError> {
        if query.trim().is_empty() {
            return Err(QueryInputError::Blank.into());
        }
        let length = query.chars().count();
        if length > self.max_query_length {
            return Err(QueryInputError::TooLong {
                length,
                max: self.max_query_length,
            }
            .into());
        }

        let tree = self
            .parsers
            .parse(query)
            .map_err(|e| SearchError::MalformedQuery(QueryInputError::Parse(e)))?;

        let names = tree.property_names();
        let unsupported = unsupported_attributes(names.iter().map(String::as_str));
        if !unsupported.is_empty() {
            return Err(SearchError::IllegalQuery { unsupported });
        }
        Ok(tree)
    }

    /// Translate a filter query into a backend query string.
    pub fn translate(&self, query: &str) -> Result<String, SearchError> {
        let tree = self.parse_and_validate(query)?;
        let rendered = self.renderer.render(&tree)?;
        debug!(query, rendered = %rendered, "Translated query");
        Ok(rendered)
    }
}
