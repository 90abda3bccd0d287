//! Command-line transport for the article vote core.
//!
//! # Responsibility
//! - Map command-line arguments onto the core request/response contract.
//! - Print the JSON response envelope and exit non-zero on failure.
//!
//! # Invariants
//! - Every invocation opens its own connection; no vote state is kept
//!   between runs other than the optional advisory client cache.

mod client_cache;

use anyhow::Context;
use article_vote_core::db::open_db_with_timeout;
use article_vote_core::{
    api, busy_timeout_from_millis, core_version, init_logging, ApiResponse, Article,
    ArticleCatalog, ArticleId, CoreConfig, RequestContext, RequesterCredentials,
    SqliteArticleCatalog, VoteErrorKind, VoteResult, VoteStatus, VoterIdentity,
};
use clap::{Parser, Subcommand};
use client_cache::ClientVoteCache;
use log::{info, warn};
use rusqlite::Connection;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "article-vote", version, about = "Article up/down votes")]
struct Cli {
    /// SQLite database file. Overrides ARTICLE_VOTE_DB.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Store lock wait in milliseconds. Overrides ARTICLE_VOTE_BUSY_TIMEOUT_MS.
    #[arg(long, global = true)]
    busy_timeout_ms: Option<u64>,
    /// Absolute directory for rolling log files. Overrides ARTICLE_VOTE_LOG_DIR.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Local file remembering which articles this client voted on.
    #[arg(long, global = true)]
    client_cache: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Registers or updates an article (publishing-side helper).
    AddArticle {
        #[arg(long)]
        id: String,
        #[arg(long)]
        title: String,
        /// Keep the article out of admin statistics.
        #[arg(long)]
        draft: bool,
    },
    /// Casts one vote as the reader at `identity`.
    Vote {
        #[arg(long)]
        article: String,
        /// positive|negative (yes|no accepted).
        #[arg(long)]
        choice: String,
        /// Remote address of the reader.
        #[arg(long)]
        identity: String,
    },
    /// Prints the current tally.
    Tally {
        #[arg(long)]
        article: String,
    },
    /// Prints the tally and whether `identity` already voted.
    Status {
        #[arg(long)]
        article: String,
        #[arg(long)]
        identity: String,
    },
    /// Clears all votes for an article.
    Reset {
        #[arg(long)]
        article: String,
        #[command(flatten)]
        requester: Requester,
    },
    /// Lists statistics for all published articles, or for one article
    /// (drafts included) with `--article`.
    Stats {
        #[arg(long)]
        article: Option<String>,
        #[command(flatten)]
        requester: Requester,
    },
    /// Prints the core version.
    Version,
}

/// Credentials an upstream auth layer would have verified.
#[derive(Debug, clap::Args)]
struct Requester {
    #[arg(long, default_value = "cli")]
    principal: String,
    /// Capability grants, e.g. `--grant manage_options`.
    #[arg(long = "grant")]
    grants: Vec<String>,
    #[arg(long, default_value = "127.0.0.1")]
    identity: String,
}

impl Requester {
    fn context(&self) -> VoteResult<RequestContext> {
        Ok(RequestContext::new(
            VoterIdentity::from_remote_addr(&self.identity)?,
            RequesterCredentials::new(self.principal.clone(), self.grants.clone()),
        ))
    }
}

#[derive(Debug, Serialize)]
struct StatusOutput {
    #[serde(flatten)]
    response: ApiResponse<VoteStatus>,
    /// Advisory client-side marker; `None` without `--client-cache`.
    #[serde(skip_serializing_if = "Option::is_none")]
    locally_voted: Option<bool>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether the operation succeeded.
fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = resolve_config(&cli)?;
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(&config.log_level, log_dir)?;
    }

    let open = || -> anyhow::Result<Connection> {
        open_db_with_timeout(&config.database_path, config.busy_timeout)
            .with_context(|| format!("failed to open `{}`", config.database_path.display()))
    };
    let mut cache = cli.client_cache.as_ref().map(ClientVoteCache::load);

    match cli.command {
        Command::Version => {
            println!("{}", core_version());
            Ok(true)
        }
        Command::AddArticle { id, title, draft } => {
            let conn = open()?;
            let article = Article {
                id: ArticleId::parse(&id)?,
                title,
                is_published: !draft,
            };
            SqliteArticleCatalog::try_new(&conn)?.upsert_article(&article)?;
            info!(
                "event=add_article module=cli status=ok article_id={} published={}",
                article.id, article.is_published
            );
            print_json(&serde_json::json!({
                "ok": true,
                "data": article,
                "message": "article saved",
            }))?;
            Ok(true)
        }
        Command::Vote {
            article,
            choice,
            identity,
        } => {
            let conn = open()?;
            let response = match anonymous_context(&identity) {
                Ok(ctx) => api::cast_vote(&conn, &ctx, &article, &choice),
                Err(err) => ApiResponse::from_error(&err),
            };
            print_json(&response)?;

            let server_says_voted = response.ok
                || response.error_kind() == Some(VoteErrorKind::AlreadyVoted);
            if let (Some(cache), true) = (cache.as_mut(), server_says_voted) {
                remember_vote(cache, &article);
            }
            Ok(response.ok)
        }
        Command::Tally { article } => {
            let conn = open()?;
            let response = api::get_tally(&conn, &article);
            print_json(&response)?;
            Ok(response.ok)
        }
        Command::Status { article, identity } => {
            let conn = open()?;
            let locally_voted = match (cache.as_ref(), ArticleId::parse(&article)) {
                (Some(cache), Ok(id)) => Some(cache.has_voted(id)),
                _ => None,
            };
            let response = match anonymous_context(&identity) {
                Ok(ctx) => api::vote_status(&conn, &ctx, &article),
                Err(err) => ApiResponse::from_error(&err),
            };
            let ok = response.ok;
            print_json(&StatusOutput {
                response,
                locally_voted,
            })?;
            Ok(ok)
        }
        Command::Reset { article, requester } => {
            let conn = open()?;
            let response = match requester.context() {
                Ok(ctx) => api::reset_article(&conn, &ctx, &article),
                Err(err) => ApiResponse::from_error(&err),
            };
            print_json(&response)?;
            Ok(response.ok)
        }
        Command::Stats { article, requester } => {
            let conn = open()?;
            let ctx = requester.context();
            match article {
                Some(article) => {
                    let response = match ctx {
                        Ok(ctx) => api::article_stats_for(&conn, &ctx, &article),
                        Err(err) => ApiResponse::from_error(&err),
                    };
                    print_json(&response)?;
                    Ok(response.ok)
                }
                None => {
                    let response = match ctx {
                        Ok(ctx) => api::article_stats(&conn, &ctx),
                        Err(err) => ApiResponse::from_error(&err),
                    };
                    print_json(&response)?;
                    Ok(response.ok)
                }
            }
        }
    }
}

fn resolve_config(cli: &Cli) -> anyhow::Result<CoreConfig> {
    let mut config = CoreConfig::from_env()?;
    if let Some(db) = &cli.db {
        config.database_path = db.clone();
    }
    if let Some(millis) = cli.busy_timeout_ms {
        config.busy_timeout =
            busy_timeout_from_millis(millis).context("invalid --busy-timeout-ms")?;
    }
    if let Some(log_dir) = &cli.log_dir {
        config.log_dir = Some(log_dir.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}

fn anonymous_context(identity: &str) -> VoteResult<RequestContext> {
    Ok(RequestContext::anonymous(identity)?)
}

/// Records the vote in the advisory cache. The vote is already committed, so
/// a cache failure is logged and never changes the outcome.
fn remember_vote(cache: &mut ClientVoteCache, article: &str) {
    let marked = ArticleId::parse(article)
        .map_err(anyhow::Error::from)
        .and_then(|id| cache.mark_voted(id));
    if let Err(err) = marked {
        warn!(
            "event=client_cache_write module=cli status=error error_code=cache_unwritable error={err:#}"
        );
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_reset_with_grants() {
        let cli = Cli::try_parse_from([
            "article-vote",
            "--db",
            "/tmp/votes.db",
            "reset",
            "--article",
            "4",
            "--grant",
            "manage_options",
        ])
        .expect("reset should parse");
        assert_eq!(
            cli.db.as_deref(),
            Some(std::path::Path::new("/tmp/votes.db"))
        );
        match cli.command {
            super::Command::Reset { article, requester } => {
                assert_eq!(article, "4");
                assert_eq!(requester.grants, vec!["manage_options".to_string()]);
                assert_eq!(requester.identity, "127.0.0.1");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
