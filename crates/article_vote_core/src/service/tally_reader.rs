//! Read-only tally queries.

use crate::context::RequestContext;
use crate::model::article::ArticleId;
use crate::model::tally::TallySnapshot;
use crate::repo::article_repo::ArticleCatalog;
use crate::repo::vote_repo::VoteStore;
use crate::service::vote_error::{VoteError, VoteResult};
use log::debug;

/// Use-case service for tally and voting-status reads. Never mutates.
pub struct TallyReader<S: VoteStore, C: ArticleCatalog> {
    store: S,
    catalog: C,
}

impl<S: VoteStore, C: ArticleCatalog> TallyReader<S, C> {
    pub fn new(store: S, catalog: C) -> Self {
        Self { store, catalog }
    }

    /// Returns the current tally; all zero if nobody voted yet.
    pub fn get_tally(&self, article_id: ArticleId) -> VoteResult<TallySnapshot> {
        self.ensure_article(article_id)?;
        let record = self.store.get_record(article_id)?;
        let tally = TallySnapshot::from_record(&record);
        debug!(
            "event=get_tally module=service status=ok article_id={} total_votes={}",
            article_id, tally.total_votes
        );
        Ok(tally)
    }

    /// Returns whether the caller's identity already voted on `article_id`.
    ///
    /// Lets clients that lost their local "voted" marker decide whether to
    /// show the vote buttons.
    pub fn has_voted(&self, ctx: &RequestContext, article_id: ArticleId) -> VoteResult<bool> {
        self.ensure_article(article_id)?;
        Ok(self.store.has_voted(article_id, &ctx.identity)?)
    }

    fn ensure_article(&self, article_id: ArticleId) -> VoteResult<()> {
        if self.catalog.article_exists(article_id)? {
            Ok(())
        } else {
            Err(VoteError::unknown_article(article_id))
        }
    }
}
