//! Vote store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Own every read and write of per-article vote state.
//! - Make "check identity, increment counter, remember identity" one atomic
//!   storage operation.
//!
//! # Invariants
//! - `record_vote` runs in a `BEGIN IMMEDIATE` transaction; the write lock is
//!   taken before anything is read, so there is no read-then-write window.
//! - The `(article_id, voter_identity)` primary key rejects a second vote even
//!   if two transactions were to interleave.
//! - A missing counter row reads as zero votes.
//! - Counter rows are never cached across calls.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::article::ArticleId;
use crate::model::vote::{VoteChoice, VoteRecord, VoterIdentity};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Transaction, TransactionBehavior};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for vote and article persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// The identity is already in the article's voted set.
    AlreadyVoted(ArticleId),
    /// The article is not known to the catalog.
    ArticleNotFound(ArticleId),
    InvalidData(String),
    /// The connection schema does not match this binary.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl RepoError {
    /// Returns whether the failure is lock contention past the busy timeout.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Db(err) if err.is_busy())
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::AlreadyVoted(id) => write!(f, "identity already voted for article {id}"),
            Self::ArticleNotFound(id) => write!(f, "article not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted vote data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::AlreadyVoted(_)
            | Self::ArticleNotFound(_)
            | Self::InvalidData(_)
            | Self::UninitializedConnection { .. } => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage contract for per-article vote state.
pub trait VoteStore {
    /// Returns the current record, or a zero-valued record if none exists.
    fn get_record(&self, article_id: ArticleId) -> RepoResult<VoteRecord>;
    /// Returns whether `identity` already voted on `article_id`.
    fn has_voted(&self, article_id: ArticleId, identity: &VoterIdentity) -> RepoResult<bool>;
    /// Atomically records one vote and returns the post-increment record.
    ///
    /// Fails with `RepoError::AlreadyVoted` without touching any counter when
    /// the identity already voted.
    fn record_vote(
        &self,
        article_id: ArticleId,
        identity: &VoterIdentity,
        choice: VoteChoice,
    ) -> RepoResult<VoteRecord>;
    /// Resets counters and the voted set for one article.
    fn clear(&self, article_id: ArticleId) -> RepoResult<()>;
}

/// SQLite-backed vote store.
pub struct SqliteVoteStore<'conn> {
    conn: &'conn Connection,
    mutation_delay: Option<Duration>,
}

impl<'conn> SqliteVoteStore<'conn> {
    /// Constructs a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self {
            conn,
            mutation_delay: None,
        })
    }

    /// Sleeps between remembering the identity and bumping the counter.
    ///
    /// Only meant for contention tests; widens the critical section so lost
    /// updates would show up if the transaction were not exclusive.
    pub fn with_mutation_delay(mut self, delay: Duration) -> Self {
        self.mutation_delay = Some(delay);
        self
    }
}

impl VoteStore for SqliteVoteStore<'_> {
    fn get_record(&self, article_id: ArticleId) -> RepoResult<VoteRecord> {
        load_record(self.conn, article_id)
    }

    fn has_voted(&self, article_id: ArticleId, identity: &VoterIdentity) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM article_voters
                WHERE article_id = ?1 AND voter_identity = ?2
            );",
            params![article_id.as_db(), identity.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn record_vote(
        &self,
        article_id: ArticleId,
        identity: &VoterIdentity,
        choice: VoteChoice,
    ) -> RepoResult<VoteRecord> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let inserted = tx
            .execute(
                "INSERT INTO article_voters (article_id, voter_identity)
                 VALUES (?1, ?2)
                 ON CONFLICT (article_id, voter_identity) DO NOTHING;",
                params![article_id.as_db(), identity.as_str()],
            )
            .map_err(|err| map_foreign_key_violation(err, article_id))?;

        if inserted == 0 {
            // Dropping `tx` rolls back; nothing was written.
            return Err(RepoError::AlreadyVoted(article_id));
        }

        if let Some(delay) = self.mutation_delay {
            std::thread::sleep(delay);
        }

        let (positive_delta, negative_delta): (i64, i64) = match choice {
            VoteChoice::Positive => (1, 0),
            VoteChoice::Negative => (0, 1),
        };
        tx.execute(
            "INSERT INTO article_votes (article_id, positive_votes, negative_votes)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (article_id) DO UPDATE SET
                positive_votes = positive_votes + excluded.positive_votes,
                negative_votes = negative_votes + excluded.negative_votes,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![article_id.as_db(), positive_delta, negative_delta],
        )?;

        let record = load_record(&tx, article_id)?;
        tx.commit()?;
        Ok(record)
    }

    fn clear(&self, article_id: ArticleId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "DELETE FROM article_voters WHERE article_id = ?1;",
            [article_id.as_db()],
        )?;
        tx.execute(
            "DELETE FROM article_votes WHERE article_id = ?1;",
            [article_id.as_db()],
        )?;
        tx.commit()?;
        Ok(())
    }
}

fn load_record(conn: &Connection, article_id: ArticleId) -> RepoResult<VoteRecord> {
    let counters = conn
        .query_row(
            "SELECT positive_votes, negative_votes
             FROM article_votes
             WHERE article_id = ?1;",
            [article_id.as_db()],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )
        .optional()?;

    let (positive_votes, negative_votes) = match counters {
        Some((positive, negative)) => (
            counter_from_db("positive_votes", positive)?,
            counter_from_db("negative_votes", negative)?,
        ),
        None => (0, 0),
    };

    let mut stmt = conn.prepare(
        "SELECT voter_identity
         FROM article_voters
         WHERE article_id = ?1
         ORDER BY voter_identity ASC;",
    )?;
    let mut rows = stmt.query([article_id.as_db()])?;
    let mut voted_identities = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        let identity = VoterIdentity::from_stored(value).ok_or_else(|| {
            RepoError::InvalidData("empty identity in article_voters.voter_identity".to_string())
        })?;
        voted_identities.insert(identity);
    }

    Ok(VoteRecord {
        positive_votes,
        negative_votes,
        voted_identities,
    })
}

fn counter_from_db(column: &str, value: i64) -> RepoResult<u64> {
    u64::try_from(value).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid counter value `{value}` in article_votes.{column}"
        ))
    })
}

fn map_foreign_key_violation(err: rusqlite::Error, article_id: ArticleId) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            RepoError::ArticleNotFound(article_id)
        }
        _ => err.into(),
    }
}

/// Rejects connections that were not opened through `db::open_db*`.
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}
