//! Transport-facing request/response contract.
//!
//! # Responsibility
//! - Accept raw transport strings, parse them once, and call the services.
//! - Wrap every outcome in a stable `ApiResponse` envelope.
//!
//! # Invariants
//! - Entry points never panic; every failure becomes an error envelope.
//! - Input is validated in a fixed order: article id, then choice, then
//!   article existence. An invalid choice never reaches the store.
//! - Each call builds its own services over the given connection; nothing is
//!   cached between calls.

use crate::access::GrantedCapabilityAccess;
use crate::context::RequestContext;
use crate::model::article::ArticleId;
use crate::model::tally::{ArticleStats, TallySnapshot};
use crate::model::vote::VoteChoice;
use crate::repo::article_repo::SqliteArticleCatalog;
use crate::repo::vote_repo::SqliteVoteStore;
use crate::service::reset_admin::ResetAdmin;
use crate::service::stats_reader::StatsReader;
use crate::service::tally_reader::TallyReader;
use crate::service::vote_error::{VoteError, VoteErrorKind, VoteResult};
use crate::service::vote_ledger::VoteLedger;
use rusqlite::Connection;
use serde::Serialize;

/// Response envelope shared by every operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Stable error code (`already_voted`, `invalid_article`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    /// Human-readable message for display or diagnostics.
    pub message: String,
    #[serde(skip)]
    error_kind: Option<VoteErrorKind>,
}

impl<T> ApiResponse<T> {
    fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error_code: None,
            message: message.into(),
            error_kind: None,
        }
    }

    /// Failure envelope for an error raised before any service ran, such as
    /// a transport rejecting the caller's remote address.
    pub fn from_error(err: &VoteError) -> Self {
        Self {
            ok: false,
            data: None,
            error_code: Some(err.code()),
            message: err.to_string(),
            error_kind: Some(err.kind()),
        }
    }

    fn from_result(result: VoteResult<T>, message: &str) -> Self {
        match result {
            Ok(data) => Self::success(message, data),
            Err(err) => Self::from_error(&err),
        }
    }

    pub fn error_kind(&self) -> Option<VoteErrorKind> {
        self.error_kind
    }

    /// HTTP-style status code for this outcome.
    pub fn status_code(&self) -> u16 {
        match self.error_kind {
            None => 200,
            Some(VoteErrorKind::InvalidChoice | VoteErrorKind::InvalidIdentity) => 400,
            Some(VoteErrorKind::Unauthorized) => 403,
            Some(VoteErrorKind::InvalidArticle) => 404,
            Some(VoteErrorKind::AlreadyVoted) => 409,
            Some(VoteErrorKind::StoreTimeout | VoteErrorKind::StoreUnavailable) => 503,
        }
    }
}

/// Voting status for one caller and article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteStatus {
    pub has_voted: bool,
    pub tally: TallySnapshot,
}

/// Casts a vote. `ctx.identity` comes from the caller's network origin.
pub fn cast_vote(
    conn: &Connection,
    ctx: &RequestContext,
    article_id: &str,
    choice: &str,
) -> ApiResponse<TallySnapshot> {
    let result = (|| -> VoteResult<TallySnapshot> {
        let article_id = ArticleId::parse(article_id)?;
        let choice = VoteChoice::parse(choice)?;
        let ledger = VoteLedger::new(
            SqliteVoteStore::try_new(conn)?,
            SqliteArticleCatalog::try_new(conn)?,
        );
        ledger.cast_vote(ctx, article_id, choice)
    })();
    ApiResponse::from_result(result, "vote recorded")
}

/// Reads the current tally for an article.
pub fn get_tally(conn: &Connection, article_id: &str) -> ApiResponse<TallySnapshot> {
    let result = (|| -> VoteResult<TallySnapshot> {
        let article_id = ArticleId::parse(article_id)?;
        tally_reader(conn)?.get_tally(article_id)
    })();
    ApiResponse::from_result(result, "tally loaded")
}

/// Reads the tally plus whether the caller already voted.
pub fn vote_status(
    conn: &Connection,
    ctx: &RequestContext,
    article_id: &str,
) -> ApiResponse<VoteStatus> {
    let result = (|| -> VoteResult<VoteStatus> {
        let article_id = ArticleId::parse(article_id)?;
        let reader = tally_reader(conn)?;
        let has_voted = reader.has_voted(ctx, article_id)?;
        let tally = reader.get_tally(article_id)?;
        Ok(VoteStatus { has_voted, tally })
    })();
    ApiResponse::from_result(result, "status loaded")
}

/// Clears all vote state for an article. Requires `manage_options`.
pub fn reset_article(
    conn: &Connection,
    ctx: &RequestContext,
    article_id: &str,
) -> ApiResponse<()> {
    let result = (|| -> VoteResult<()> {
        let article_id = ArticleId::parse(article_id)?;
        let admin = ResetAdmin::new(
            SqliteVoteStore::try_new(conn)?,
            SqliteArticleCatalog::try_new(conn)?,
            GrantedCapabilityAccess,
        );
        admin.reset_article(ctx, article_id)
    })();
    ApiResponse::from_result(result, "vote data reset successfully")
}

/// Lists statistics for all published articles. Requires `manage_options`.
pub fn article_stats(conn: &Connection, ctx: &RequestContext) -> ApiResponse<Vec<ArticleStats>> {
    let result = (|| -> VoteResult<Vec<ArticleStats>> {
        let reader = StatsReader::new(
            SqliteVoteStore::try_new(conn)?,
            SqliteArticleCatalog::try_new(conn)?,
            GrantedCapabilityAccess,
        );
        reader.list_article_stats(ctx)
    })();
    ApiResponse::from_result(result, "statistics loaded")
}

/// Statistics for one article, drafts included. Requires `manage_options`.
pub fn article_stats_for(
    conn: &Connection,
    ctx: &RequestContext,
    article_id: &str,
) -> ApiResponse<ArticleStats> {
    let result = (|| -> VoteResult<ArticleStats> {
        let article_id = ArticleId::parse(article_id)?;
        let reader = StatsReader::new(
            SqliteVoteStore::try_new(conn)?,
            SqliteArticleCatalog::try_new(conn)?,
            GrantedCapabilityAccess,
        );
        reader.article_stats(ctx, article_id)
    })();
    ApiResponse::from_result(result, "statistics loaded")
}

fn tally_reader(
    conn: &Connection,
) -> VoteResult<TallyReader<SqliteVoteStore<'_>, SqliteArticleCatalog<'_>>> {
    Ok(TallyReader::new(
        SqliteVoteStore::try_new(conn)?,
        SqliteArticleCatalog::try_new(conn)?,
    ))
}
