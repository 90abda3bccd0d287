//! Vote values and the per-article vote record.
//!
//! # Invariants
//! - A `VoterIdentity` is never empty.
//! - `VoteRecord::voted_identities` holds each identity at most once.
//! - Identity is derived from the network origin and is a weak signal: two
//!   readers behind one address share a single vote per article.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::IpAddr;

/// Manifest-style token for a positive vote.
pub const VOTE_CHOICE_POSITIVE: &str = "positive";
/// Manifest-style token for a negative vote.
pub const VOTE_CHOICE_NEGATIVE: &str = "negative";

/// Legacy form tokens still sent by older voting widgets.
const LEGACY_CHOICE_YES: &str = "yes";
const LEGACY_CHOICE_NO: &str = "no";

/// The two recognized vote directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    Positive,
    Negative,
}

impl VoteChoice {
    /// Parses a choice from transport input.
    ///
    /// Accepts `positive|negative` and the legacy `yes|no`. Matching is
    /// exact after trimming; `Yes` or `POSITIVE` are rejected.
    pub fn parse(value: &str) -> Result<Self, VoteChoiceError> {
        match value.trim() {
            VOTE_CHOICE_POSITIVE | LEGACY_CHOICE_YES => Ok(Self::Positive),
            VOTE_CHOICE_NEGATIVE | LEGACY_CHOICE_NO => Ok(Self::Negative),
            other => Err(VoteChoiceError(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => VOTE_CHOICE_POSITIVE,
            Self::Negative => VOTE_CHOICE_NEGATIVE,
        }
    }
}

/// Unrecognized vote choice token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteChoiceError(pub String);

impl Display for VoteChoiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "vote choice `{}` is unsupported; expected {VOTE_CHOICE_POSITIVE}|{VOTE_CHOICE_NEGATIVE}",
            self.0
        )
    }
}

impl Error for VoteChoiceError {}

/// Key used to enforce one vote per voter per article.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoterIdentity(String);

impl VoterIdentity {
    /// Derives an identity from the requester's remote address.
    ///
    /// IP literals are normalized to their canonical text form so that
    /// `2001:DB8::1` and `2001:db8:0::1` collide. Other non-empty values
    /// (proxy tokens, unix socket peers) are kept verbatim after trimming.
    pub fn from_remote_addr(remote_addr: &str) -> Result<Self, VoterIdentityError> {
        let trimmed = remote_addr.trim();
        if trimmed.is_empty() {
            return Err(VoterIdentityError::Empty);
        }

        match trimmed.parse::<IpAddr>() {
            Ok(addr) => Ok(Self(addr.to_string())),
            Err(_) => Ok(Self(trimmed.to_string())),
        }
    }

    /// Rebuilds an identity loaded from storage.
    pub(crate) fn from_stored(value: String) -> Option<Self> {
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for VoterIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Voter identity derivation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoterIdentityError {
    Empty,
}

impl Display for VoterIdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "voter identity must not be empty"),
        }
    }
}

impl Error for VoterIdentityError {}

/// Persistent vote state for one article.
///
/// A missing record is equivalent to `VoteRecord::default()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub positive_votes: u64,
    pub negative_votes: u64,
    /// Grows without bound until the article is reset.
    pub voted_identities: BTreeSet<VoterIdentity>,
}

impl VoteRecord {
    pub fn total_votes(&self) -> u64 {
        self.positive_votes.saturating_add(self.negative_votes)
    }

    pub fn has_voted(&self, identity: &VoterIdentity) -> bool {
        self.voted_identities.contains(identity)
    }
}
