//! Core vote-recording and tally logic for article feedback.
//! This crate is the single source of truth for vote invariants.

pub mod access;
pub mod api;
pub mod config;
pub mod context;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use access::{AccessControl, AdminCapability, GrantedCapabilityAccess};
pub use api::{ApiResponse, VoteStatus};
pub use config::{busy_timeout_from_millis, ConfigError, CoreConfig};
pub use context::{RequestContext, RequesterCredentials};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::article::{Article, ArticleId, ArticleIdError};
pub use model::tally::{ArticleStats, TallySnapshot};
pub use model::vote::{VoteChoice, VoteChoiceError, VoteRecord, VoterIdentity, VoterIdentityError};
pub use repo::article_repo::{ArticleCatalog, SqliteArticleCatalog};
pub use repo::vote_repo::{RepoError, RepoResult, SqliteVoteStore, VoteStore};
pub use service::reset_admin::ResetAdmin;
pub use service::stats_reader::StatsReader;
pub use service::tally_reader::TallyReader;
pub use service::vote_error::{VoteError, VoteErrorKind, VoteResult};
pub use service::vote_ledger::VoteLedger;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
