use article_vote_core::db::{open_db, open_db_with_timeout};
use article_vote_core::{
    Article, ArticleCatalog, ArticleId, RequestContext, SqliteArticleCatalog, SqliteVoteStore,
    VoteChoice, VoteErrorKind, VoteLedger, VoteResult, VoteStore,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const VOTERS: usize = 16;
const MUTATION_DELAY: Duration = Duration::from_millis(5);
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

fn seeded_database(dir: &Path) -> (PathBuf, ArticleId) {
    let path = dir.join("votes.db");
    let conn = open_db(&path).unwrap();
    let id = ArticleId::new(1).unwrap();
    SqliteArticleCatalog::try_new(&conn)
        .unwrap()
        .upsert_article(&Article::published(id, "Contended"))
        .unwrap();
    (path, id)
}

/// Each thread plays one request: its own connection, its own services.
fn cast_from_new_connection(
    path: &Path,
    addr: &str,
    id: ArticleId,
    choice: VoteChoice,
) -> VoteResult<u64> {
    let conn = open_db_with_timeout(path, BUSY_TIMEOUT).unwrap();
    let ledger = VoteLedger::new(
        SqliteVoteStore::try_new(&conn)
            .unwrap()
            .with_mutation_delay(MUTATION_DELAY),
        SqliteArticleCatalog::try_new(&conn).unwrap(),
    );
    let ctx = RequestContext::anonymous(addr).unwrap();
    ledger
        .cast_vote(&ctx, id, choice)
        .map(|tally| tally.total_votes)
}

#[test]
fn concurrent_distinct_voters_lose_no_updates() {
    let dir = tempfile::tempdir().unwrap();
    let (path, id) = seeded_database(dir.path());
    let barrier = Arc::new(Barrier::new(VOTERS));

    let handles: Vec<_> = (0..VOTERS)
        .map(|index| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let choice = if index % 2 == 0 {
                    VoteChoice::Positive
                } else {
                    VoteChoice::Negative
                };
                barrier.wait();
                cast_from_new_connection(&path, &format!("10.0.1.{index}"), id, choice)
            })
        })
        .collect();

    let mut totals: Vec<u64> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap().unwrap())
        .collect();
    totals.sort_unstable();

    // Every accepted vote saw a distinct post-increment total.
    let expected: Vec<u64> = (1..=VOTERS as u64).collect();
    assert_eq!(totals, expected);

    let conn = open_db(&path).unwrap();
    let record = SqliteVoteStore::try_new(&conn).unwrap().get_record(id).unwrap();
    assert_eq!(record.positive_votes, (VOTERS / 2) as u64);
    assert_eq!(record.negative_votes, (VOTERS / 2) as u64);
    assert_eq!(record.voted_identities.len(), VOTERS);
}

#[test]
fn concurrent_duplicates_from_one_identity_count_once() {
    let dir = tempfile::tempdir().unwrap();
    let (path, id) = seeded_database(dir.path());
    let barrier = Arc::new(Barrier::new(VOTERS));

    let handles: Vec<_> = (0..VOTERS)
        .map(|_| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cast_from_new_connection(&path, "10.9.9.9", id, VoteChoice::Positive)
            })
        })
        .collect();

    let mut accepted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(_) => accepted += 1,
            Err(err) => {
                assert_eq!(err.kind(), VoteErrorKind::AlreadyVoted);
                rejected += 1;
            }
        }
    }
    assert_eq!(accepted, 1);
    assert_eq!(rejected, VOTERS - 1);

    let conn = open_db(&path).unwrap();
    let record = SqliteVoteStore::try_new(&conn).unwrap().get_record(id).unwrap();
    assert_eq!(record.positive_votes, 1);
    assert_eq!(record.voted_identities.len(), 1);
}

#[test]
fn writer_blocked_past_busy_timeout_reports_store_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let (path, id) = seeded_database(dir.path());

    let holder = open_db(&path).unwrap();
    holder.execute_batch("BEGIN IMMEDIATE;").unwrap();

    let conn = open_db_with_timeout(&path, Duration::from_millis(50)).unwrap();
    let ledger = VoteLedger::new(
        SqliteVoteStore::try_new(&conn).unwrap(),
        SqliteArticleCatalog::try_new(&conn).unwrap(),
    );
    let err = ledger
        .cast_vote(
            &RequestContext::anonymous("10.0.0.1").unwrap(),
            id,
            VoteChoice::Positive,
        )
        .unwrap_err();
    assert_eq!(err.kind(), VoteErrorKind::StoreTimeout);
    assert!(err.kind().is_transient());

    holder.execute_batch("ROLLBACK;").unwrap();
    let record = SqliteVoteStore::try_new(&conn).unwrap().get_record(id).unwrap();
    assert_eq!(record.total_votes(), 0);
}
