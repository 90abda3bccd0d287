//! Privileged vote reset.
//!
//! Reset is all-or-nothing per article: counters and every remembered
//! identity go at once. There is no per-identity undo.

use crate::access::{AccessControl, AdminCapability};
use crate::context::RequestContext;
use crate::model::article::ArticleId;
use crate::repo::article_repo::ArticleCatalog;
use crate::repo::vote_repo::VoteStore;
use crate::service::vote_error::{VoteError, VoteResult};
use log::{info, warn};

/// Use-case service for clearing an article's vote state.
pub struct ResetAdmin<S: VoteStore, C: ArticleCatalog, A: AccessControl> {
    store: S,
    catalog: C,
    access: A,
}

impl<S: VoteStore, C: ArticleCatalog, A: AccessControl> ResetAdmin<S, C, A> {
    pub fn new(store: S, catalog: C, access: A) -> Self {
        Self {
            store,
            catalog,
            access,
        }
    }

    /// Clears counters and voted identities for `article_id`.
    ///
    /// # Errors
    /// - `Unauthorized` unless the requester holds `manage_options`. Checked
    ///   before the article so unauthorized callers cannot probe ids.
    /// - `InvalidArticle` when the catalog does not know `article_id`.
    pub fn reset_article(&self, ctx: &RequestContext, article_id: ArticleId) -> VoteResult<()> {
        let capability = AdminCapability::ManageOptions;
        if !self.access.authorize(&ctx.credentials, capability) {
            warn!(
                "event=reset_article module=service status=rejected article_id={} error_code=unauthorized",
                article_id
            );
            return Err(VoteError::Unauthorized(capability));
        }

        if !self.catalog.article_exists(article_id)? {
            return Err(VoteError::unknown_article(article_id));
        }

        self.store.clear(article_id)?;
        info!(
            "event=reset_article module=service status=ok article_id={} principal={}",
            article_id,
            ctx.credentials.principal().unwrap_or("anonymous")
        );
        Ok(())
    }
}
