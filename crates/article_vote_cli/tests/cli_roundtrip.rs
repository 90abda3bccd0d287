use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};

fn article_vote(db: &Path, cache: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_article-vote"))
        .env_remove("ARTICLE_VOTE_DB")
        .env_remove("ARTICLE_VOTE_BUSY_TIMEOUT_MS")
        .env_remove("ARTICLE_VOTE_LOG_DIR")
        .env_remove("ARTICLE_VOTE_LOG_LEVEL")
        .arg("--db")
        .arg(db)
        .arg("--client-cache")
        .arg(cache)
        .args(args)
        .output()
        .unwrap()
}

fn json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn vote_status_reset_flow() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("votes.db");
    let cache = dir.path().join("voted.json");

    let added = article_vote(&db, &cache, &["add-article", "--id", "7", "--title", "Hello"]);
    assert!(added.status.success());

    let voted = article_vote(
        &db,
        &cache,
        &["vote", "--article", "7", "--choice", "yes", "--identity", "10.0.0.1"],
    );
    assert!(voted.status.success());
    assert_eq!(json(&voted)["data"]["positive_votes"], 1);

    let again = article_vote(
        &db,
        &cache,
        &["vote", "--article", "7", "--choice", "no", "--identity", "10.0.0.1"],
    );
    assert_eq!(again.status.code(), Some(1));
    assert_eq!(json(&again)["error_code"], "already_voted");

    let status = article_vote(
        &db,
        &cache,
        &["status", "--article", "7", "--identity", "10.0.0.1"],
    );
    let status = json(&status);
    assert_eq!(status["data"]["has_voted"], true);
    assert_eq!(status["locally_voted"], true);

    let denied = article_vote(&db, &cache, &["reset", "--article", "7"]);
    assert_eq!(json(&denied)["error_code"], "unauthorized");

    let reset = article_vote(
        &db,
        &cache,
        &["reset", "--article", "7", "--grant", "manage_options"],
    );
    assert!(reset.status.success());

    let tally = article_vote(&db, &cache, &["tally", "--article", "7"]);
    assert_eq!(json(&tally)["data"]["total_votes"], 0);
}

#[test]
fn invalid_choice_exits_with_failure_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("votes.db");
    let cache = dir.path().join("voted.json");
    article_vote(&db, &cache, &["add-article", "--id", "1", "--title", "Any"]);

    let output = article_vote(
        &db,
        &cache,
        &["vote", "--article", "1", "--choice", "maybe", "--identity", "10.0.0.1"],
    );
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(json(&output)["error_code"], "invalid_choice");
    assert!(!cache.exists());
}

#[test]
fn oversized_busy_timeout_is_rejected_without_panicking() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("votes.db");
    let cache = dir.path().join("voted.json");

    let output = article_vote(
        &db,
        &cache,
        &["--busy-timeout-ms", "99999999999", "tally", "--article", "1"],
    );
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--busy-timeout-ms"), "stderr: {stderr}");
    assert!(stderr.contains("between 1 and 60000"), "stderr: {stderr}");
    assert!(!db.exists());
}

#[test]
fn unwritable_client_cache_still_reports_the_vote() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("votes.db");
    let cache_dir = dir.path().join("cache-is-a-directory");
    std::fs::create_dir(&cache_dir).unwrap();
    article_vote(&db, &cache_dir, &["add-article", "--id", "3", "--title", "Any"]);

    let voted = article_vote(
        &db,
        &cache_dir,
        &["vote", "--article", "3", "--choice", "positive", "--identity", "10.0.0.9"],
    );
    assert!(voted.status.success());
    let body = json(&voted);
    assert_eq!(body["ok"], true);
    assert_eq!(body["data"]["positive_votes"], 1);
}

#[test]
fn blank_identity_yields_invalid_identity_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("votes.db");
    let cache = dir.path().join("voted.json");
    article_vote(&db, &cache, &["add-article", "--id", "5", "--title", "Any"]);

    let voted = article_vote(
        &db,
        &cache,
        &["vote", "--article", "5", "--choice", "yes", "--identity", "   "],
    );
    assert_eq!(voted.status.code(), Some(1));
    assert_eq!(json(&voted)["error_code"], "invalid_identity");

    let status = article_vote(&db, &cache, &["status", "--article", "5", "--identity", " "]);
    assert_eq!(status.status.code(), Some(1));
    assert_eq!(json(&status)["error_code"], "invalid_identity");

    let tally = article_vote(&db, &cache, &["tally", "--article", "5"]);
    assert_eq!(json(&tally)["data"]["total_votes"], 0);
    assert!(!cache.exists());
}

#[test]
fn stats_for_single_draft_article() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("votes.db");
    let cache = dir.path().join("voted.json");
    article_vote(
        &db,
        &cache,
        &["add-article", "--id", "8", "--title", "Draft", "--draft"],
    );
    article_vote(
        &db,
        &cache,
        &["vote", "--article", "8", "--choice", "no", "--identity", "10.0.0.4"],
    );

    let listed = article_vote(&db, &cache, &["stats", "--grant", "manage_options"]);
    assert_eq!(json(&listed)["data"].as_array().unwrap().len(), 0);

    let single = article_vote(
        &db,
        &cache,
        &["stats", "--article", "8", "--grant", "manage_options"],
    );
    assert!(single.status.success());
    let body = json(&single);
    assert_eq!(body["data"]["article"]["title"], "Draft");
    assert_eq!(body["data"]["tally"]["negative_votes"], 1);

    let denied = article_vote(&db, &cache, &["stats", "--article", "8"]);
    assert_eq!(denied.status.code(), Some(1));
    assert_eq!(json(&denied)["error_code"], "unauthorized");
}
