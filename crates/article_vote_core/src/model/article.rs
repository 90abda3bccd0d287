//! Article references.
//!
//! Articles are owned by the publishing side. The vote core only needs a
//! stable id and enough metadata to render admin statistics.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::num::NonZeroU64;
use std::str::FromStr;

/// Externally assigned, stable article identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(NonZeroU64);

impl ArticleId {
    /// Largest id that still fits the SQLite `INTEGER` column.
    pub const MAX: u64 = i64::MAX as u64;

    /// Builds an id from a numeric value.
    ///
    /// Returns `None` for zero and for values above [`ArticleId::MAX`].
    pub fn new(value: u64) -> Option<Self> {
        if value > Self::MAX {
            return None;
        }
        NonZeroU64::new(value).map(Self)
    }

    /// Parses an id from transport input.
    ///
    /// Accepts surrounding whitespace and plain decimal digits only; signs,
    /// fractions and exponent forms are rejected.
    pub fn parse(value: &str) -> Result<Self, ArticleIdError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ArticleIdError::Empty);
        }
        if !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(ArticleIdError::Malformed(trimmed.to_string()));
        }

        trimmed
            .parse::<u64>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| ArticleIdError::OutOfRange(trimmed.to_string()))
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }

    /// Value bound into SQL parameters.
    pub(crate) fn as_db(self) -> i64 {
        // `new` caps the value at i64::MAX.
        self.0.get() as i64
    }

    pub(crate) fn from_db(value: i64) -> Option<Self> {
        u64::try_from(value).ok().and_then(Self::new)
    }
}

impl Display for ArticleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ArticleId {
    type Err = ArticleIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

/// Article id parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleIdError {
    Empty,
    Malformed(String),
    OutOfRange(String),
}

impl Display for ArticleIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "article id must not be empty"),
            Self::Malformed(value) => write!(f, "article id is not numeric: {value}"),
            Self::OutOfRange(value) => write!(f, "article id is out of range: {value}"),
        }
    }
}

impl Error for ArticleIdError {}

/// Article metadata as seen by the vote core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    /// Only published articles show up in admin statistics.
    pub is_published: bool,
}

impl Article {
    pub fn published(id: ArticleId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            is_published: true,
        }
    }
}
