//! Admin statistics over published articles.

use crate::access::{AccessControl, AdminCapability};
use crate::context::RequestContext;
use crate::model::article::ArticleId;
use crate::model::tally::{ArticleStats, TallySnapshot};
use crate::repo::article_repo::ArticleCatalog;
use crate::repo::vote_repo::VoteStore;
use crate::service::vote_error::{VoteError, VoteResult};

/// Use-case service backing the statistics table and per-article result box.
pub struct StatsReader<S: VoteStore, C: ArticleCatalog, A: AccessControl> {
    store: S,
    catalog: C,
    access: A,
}

impl<S: VoteStore, C: ArticleCatalog, A: AccessControl> StatsReader<S, C, A> {
    pub fn new(store: S, catalog: C, access: A) -> Self {
        Self {
            store,
            catalog,
            access,
        }
    }

    /// Lists one stats row per published article, ordered by id.
    pub fn list_article_stats(&self, ctx: &RequestContext) -> VoteResult<Vec<ArticleStats>> {
        self.authorize(ctx)?;

        let articles = self.catalog.list_published_articles()?;
        let mut stats = Vec::with_capacity(articles.len());
        for article in articles {
            let record = self.store.get_record(article.id)?;
            stats.push(ArticleStats {
                article,
                tally: TallySnapshot::from_record(&record),
            });
        }
        Ok(stats)
    }

    /// Stats for one article regardless of publish state.
    pub fn article_stats(
        &self,
        ctx: &RequestContext,
        article_id: ArticleId,
    ) -> VoteResult<ArticleStats> {
        self.authorize(ctx)?;

        let article = self
            .catalog
            .get_article(article_id)?
            .ok_or_else(|| VoteError::unknown_article(article_id))?;
        let record = self.store.get_record(article_id)?;
        Ok(ArticleStats {
            article,
            tally: TallySnapshot::from_record(&record),
        })
    }

    fn authorize(&self, ctx: &RequestContext) -> VoteResult<()> {
        let capability = AdminCapability::ManageOptions;
        if self.access.authorize(&ctx.credentials, capability) {
            Ok(())
        } else {
            Err(VoteError::Unauthorized(capability))
        }
    }
}
