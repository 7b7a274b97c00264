//! List query construction and the paginated list envelope.
//!
//! List endpoints take `limit`/`offset` pagination, `field=value` equality
//! filters, a free-text `search` term and a comma-joined `ordering` where a
//! `-` prefix sorts descending.

use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};
use crate::rows::Row;

/// Characters escaped in query keys and values (everything but unreserved).
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// One sort key of a multi-key ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            descending: false,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            descending: true,
        }
    }

    /// Parses `field` or `-field`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match raw.strip_prefix('-') {
            Some("") => None,
            Some(field) => Some(Self::desc(field)),
            None if raw.is_empty() => None,
            None => Some(Self::asc(raw)),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "-{}", self.field)
        } else {
            write!(f, "{}", self.field)
        }
    }
}

/// Parameters of a list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Maximum number of records to return
    pub limit: Option<usize>,
    /// Number of records to skip
    pub offset: Option<usize>,
    /// Field equality filters in insertion order
    pub filters: Vec<(String, String)>,
    /// Free-text search term
    pub search: Option<String>,
    /// Sort keys, most significant first
    pub ordering: Vec<SortKey>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests one page of `limit` rows starting at `offset`.
    pub fn page(mut self, limit: usize, offset: usize) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Adds a `field=value` equality filter.
    pub fn filter(mut self, field: &str, value: impl Into<String>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }

    /// Sets the free-text search term. Blank terms clear the search.
    pub fn search(mut self, term: &str) -> Self {
        let term = term.trim();
        self.search = if term.is_empty() {
            None
        } else {
            Some(term.to_string())
        };
        self
    }

    /// Appends a sort key.
    pub fn order_by(mut self, key: SortKey) -> Self {
        self.ordering.push(key);
        self
    }

    /// Renders the query string (without the leading `?`).
    ///
    /// # Returns
    /// Keys in the order `limit`, `offset`, filters, `search`, `ordering`.
    pub fn to_query_string(&self) -> String {
        let mut pairs: Vec<String> = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(format!("limit={}", limit));
        }
        if let Some(offset) = self.offset {
            pairs.push(format!("offset={}", offset));
        }
        for (field, value) in &self.filters {
            pairs.push(format!("{}={}", encode(field), encode(value)));
        }
        if let Some(search) = &self.search {
            pairs.push(format!("search={}", encode(search)));
        }
        if !self.ordering.is_empty() {
            let keys: Vec<String> = self
                .ordering
                .iter()
                .map(|key| encode(&key.to_string()))
                .collect();
            pairs.push(format!("ordering={}", keys.join(",")));
        }
        pairs.join("&")
    }

    /// Parses a query string produced by [`ListQuery::to_query_string`] or a
    /// browser.
    ///
    /// # Returns
    /// `Err(GridError::InvalidQuery)` for a non-numeric `limit` or `offset`.
    /// Pairs without `=` are skipped.
    pub fn from_query_string(raw: &str) -> Result<Self> {
        let mut query = ListQuery::new();
        for pair in raw.split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let key = decode(key);
            let value = decode(value);
            match key.as_str() {
                "limit" => query.limit = Some(parse_count(&key, &value)?),
                "offset" => query.offset = Some(parse_count(&key, &value)?),
                "search" => query = query.search(&value),
                "ordering" => {
                    query.ordering = value.split(',').filter_map(SortKey::parse).collect();
                }
                _ => query.filters.push((key, value)),
            }
        }
        Ok(query)
    }
}

/// Paginated list envelope: `{count, results}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Total matching records across all pages
    pub count: u64,
    /// Records of this page
    pub results: Vec<Row>,
}

fn encode(raw: &str) -> String {
    utf8_percent_encode(raw, QUERY_COMPONENT).to_string()
}

fn decode(raw: &str) -> String {
    percent_decode_str(&raw.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    value.parse().map_err(|e| GridError::InvalidQuery {
        key: key.to_string(),
        message: format!("'{}': {}", value, e),
    })
}
