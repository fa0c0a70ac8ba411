//! Pagination types
//!
//! Listing calls return a bounded page of items plus an optional cursor
//! pointing at the next page. The cursor is opaque: callers only ever hand
//! it back to the service.

use serde::{Deserialize, Serialize};

/// Opaque continuation token for the next page of a listing
///
/// An empty token carries no information and is never turned into a cursor,
/// so a `Cursor` always points somewhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Builds a cursor from a raw token, treating an empty token as absent
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// Builds a cursor from an optional raw token
    pub fn parse(token: Option<String>) -> Option<Self> {
        token.and_then(Self::new)
    }

    /// The raw token
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items on this page, in server order
    pub items: Vec<T>,

    /// Cursor of the next page, `None` on the last page
    pub next_cursor: Option<Cursor>,
}

impl<T> Page<T> {
    /// Creates a page from items and a raw next-page token
    pub fn new(items: Vec<T>, next_token: Option<String>) -> Self {
        Self {
            items,
            next_cursor: Cursor::parse(next_token),
        }
    }

    /// Creates a final page
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }

    /// Whether this is the last page
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }
}
