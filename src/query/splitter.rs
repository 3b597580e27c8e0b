//! Splits an editor buffer into independently executable query units.

use regex::Regex;
use std::fmt;

/// One trimmed, non-empty query taken from a buffer, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryUnit(String);

impl QueryUnit {
    /// Wraps `text` if it has any non-whitespace content.
    pub fn new(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for QueryUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Splits text on a separator pattern.
///
/// The separator is a regular expression. An empty separator disables
/// splitting, so the whole buffer is a single unit.
#[derive(Debug, Clone)]
pub struct QuerySplitter {
    pattern: Option<Regex>,
}

impl QuerySplitter {
    pub fn new(separator: &str) -> std::result::Result<Self, regex::Error> {
        let pattern = if separator.is_empty() {
            None
        } else {
            Some(Regex::new(separator)?)
        };
        Ok(Self { pattern })
    }

    /// Splits `text` into units, dropping blank segments.
    pub fn split(&self, text: &str) -> Vec<QueryUnit> {
        match &self.pattern {
            None => QueryUnit::new(text).into_iter().collect(),
            Some(pattern) => pattern.split(text).filter_map(QueryUnit::new).collect(),
        }
    }
}

/// Convenience wrapper around [`QuerySplitter`] for one-off splits.
pub fn split_queries(
    text: &str,
    separator: &str,
) -> std::result::Result<Vec<QueryUnit>, regex::Error> {
    Ok(QuerySplitter::new(separator)?.split(text))
}
