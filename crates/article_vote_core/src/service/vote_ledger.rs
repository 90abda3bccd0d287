//! Vote casting use-case.
//!
//! # Responsibility
//! - Validate the article, then record exactly one vote per identity.
//! - Return the tally derived from the post-write record.
//!
//! # Invariants
//! - The duplicate check and the counter increment are one `VoteStore`
//!   operation; the ledger never reads before writing.
//! - A rejected vote leaves the store untouched.

use crate::context::RequestContext;
use crate::model::article::ArticleId;
use crate::model::tally::TallySnapshot;
use crate::model::vote::VoteChoice;
use crate::repo::article_repo::ArticleCatalog;
use crate::repo::vote_repo::VoteStore;
use crate::service::vote_error::{VoteError, VoteErrorKind, VoteResult};
use log::{info, warn};
use std::time::Instant;

/// Use-case service for casting votes.
pub struct VoteLedger<S: VoteStore, C: ArticleCatalog> {
    store: S,
    catalog: C,
}

impl<S: VoteStore, C: ArticleCatalog> VoteLedger<S, C> {
    pub fn new(store: S, catalog: C) -> Self {
        Self { store, catalog }
    }

    /// Records `choice` for the caller's identity on `article_id`.
    ///
    /// # Errors
    /// - `InvalidArticle` when the catalog does not know `article_id`.
    /// - `AlreadyVoted` when the identity already voted; counters unchanged.
    /// - `StoreTimeout` / `StoreUnavailable` on storage failures.
    pub fn cast_vote(
        &self,
        ctx: &RequestContext,
        article_id: ArticleId,
        choice: VoteChoice,
    ) -> VoteResult<TallySnapshot> {
        let started_at = Instant::now();
        let result = self.cast_vote_inner(ctx, article_id, choice);

        match &result {
            Ok(tally) => info!(
                "event=cast_vote module=service status=ok article_id={} choice={} total_votes={} duration_ms={}",
                article_id,
                choice.as_str(),
                tally.total_votes,
                started_at.elapsed().as_millis()
            ),
            Err(err) if err.kind() == VoteErrorKind::AlreadyVoted => info!(
                "event=cast_vote module=service status=rejected article_id={} choice={} error_code={} duration_ms={}",
                article_id,
                choice.as_str(),
                err.code(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=cast_vote module=service status=error article_id={} choice={} error_code={} duration_ms={} error={}",
                article_id,
                choice.as_str(),
                err.code(),
                started_at.elapsed().as_millis(),
                err
            ),
        }

        result
    }

    fn cast_vote_inner(
        &self,
        ctx: &RequestContext,
        article_id: ArticleId,
        choice: VoteChoice,
    ) -> VoteResult<TallySnapshot> {
        if !self.catalog.article_exists(article_id)? {
            return Err(VoteError::unknown_article(article_id));
        }

        let record = self.store.record_vote(article_id, &ctx.identity, choice)?;
        Ok(TallySnapshot::from_record(&record))
    }
}
