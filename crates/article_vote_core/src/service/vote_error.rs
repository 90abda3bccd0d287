//! Caller-facing error taxonomy for vote operations.

use crate::access::AdminCapability;
use crate::model::article::{ArticleId, ArticleIdError};
use crate::model::vote::{VoteChoiceError, VoterIdentityError};
use crate::repo::vote_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type VoteResult<T> = Result<T, VoteError>;

/// Stable error kinds; transports map these to response codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteErrorKind {
    InvalidArticle,
    InvalidChoice,
    InvalidIdentity,
    AlreadyVoted,
    Unauthorized,
    StoreTimeout,
    StoreUnavailable,
}

impl VoteErrorKind {
    /// Stable machine-readable code.
    pub fn code(self) -> &'static str {
        match self {
            Self::InvalidArticle => "invalid_article",
            Self::InvalidChoice => "invalid_choice",
            Self::InvalidIdentity => "invalid_identity",
            Self::AlreadyVoted => "already_voted",
            Self::Unauthorized => "unauthorized",
            Self::StoreTimeout => "store_timeout",
            Self::StoreUnavailable => "store_unavailable",
        }
    }

    /// Whether a caller may retry the same request with backoff.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::StoreTimeout | Self::StoreUnavailable)
    }
}

/// Failure of a vote, tally, reset or statistics operation.
#[derive(Debug)]
pub enum VoteError {
    /// Malformed id, or an id the catalog does not know.
    InvalidArticle(String),
    InvalidChoice(VoteChoiceError),
    InvalidIdentity(VoterIdentityError),
    /// Informational: the identity already voted on this article.
    AlreadyVoted(ArticleId),
    Unauthorized(AdminCapability),
    /// Lock contention outlived the store's busy timeout.
    StoreTimeout(RepoError),
    StoreUnavailable(RepoError),
}

impl VoteError {
    pub fn kind(&self) -> VoteErrorKind {
        match self {
            Self::InvalidArticle(_) => VoteErrorKind::InvalidArticle,
            Self::InvalidChoice(_) => VoteErrorKind::InvalidChoice,
            Self::InvalidIdentity(_) => VoteErrorKind::InvalidIdentity,
            Self::AlreadyVoted(_) => VoteErrorKind::AlreadyVoted,
            Self::Unauthorized(_) => VoteErrorKind::Unauthorized,
            Self::StoreTimeout(_) => VoteErrorKind::StoreTimeout,
            Self::StoreUnavailable(_) => VoteErrorKind::StoreUnavailable,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    pub(crate) fn unknown_article(id: ArticleId) -> Self {
        Self::InvalidArticle(format!("article not found: {id}"))
    }
}

impl Display for VoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArticle(message) => write!(f, "invalid article: {message}"),
            Self::InvalidChoice(err) => write!(f, "{err}"),
            Self::InvalidIdentity(err) => write!(f, "{err}"),
            Self::AlreadyVoted(_) => write!(f, "you have already voted for this article"),
            Self::Unauthorized(capability) => {
                write!(f, "requester lacks capability `{}`", capability.as_str())
            }
            Self::StoreTimeout(err) => write!(f, "vote store timed out: {err}"),
            Self::StoreUnavailable(err) => write!(f, "vote store unavailable: {err}"),
        }
    }
}

impl Error for VoteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidChoice(err) => Some(err),
            Self::InvalidIdentity(err) => Some(err),
            Self::StoreTimeout(err) | Self::StoreUnavailable(err) => Some(err),
            Self::InvalidArticle(_) | Self::AlreadyVoted(_) | Self::Unauthorized(_) => None,
        }
    }
}

impl From<RepoError> for VoteError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::AlreadyVoted(id) => Self::AlreadyVoted(id),
            RepoError::ArticleNotFound(id) => Self::unknown_article(id),
            other if other.is_busy() => Self::StoreTimeout(other),
            other => Self::StoreUnavailable(other),
        }
    }
}

impl From<ArticleIdError> for VoteError {
    fn from(value: ArticleIdError) -> Self {
        Self::InvalidArticle(value.to_string())
    }
}

impl From<VoteChoiceError> for VoteError {
    fn from(value: VoteChoiceError) -> Self {
        Self::InvalidChoice(value)
    }
}

impl From<VoterIdentityError> for VoteError {
    fn from(value: VoterIdentityError) -> Self {
        Self::InvalidIdentity(value)
    }
}
