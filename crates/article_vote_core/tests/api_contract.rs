use article_vote_core::db::open_db_in_memory;
use article_vote_core::{
    api, Article, ArticleCatalog, ArticleId, RequestContext, RequesterCredentials,
    SqliteArticleCatalog, SqliteVoteStore, VoteErrorKind, VoteRecord, VoteStore, VoterIdentity,
};
use rusqlite::Connection;
use serde_json::json;

fn seeded() -> Connection {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteArticleCatalog::try_new(&conn).unwrap();
    for (id, title) in [(1, "Hello world"), (2, "Second post")] {
        catalog
            .upsert_article(&Article::published(ArticleId::new(id).unwrap(), title))
            .unwrap();
    }
    conn
}

fn visitor(addr: &str) -> RequestContext {
    RequestContext::anonymous(addr).unwrap()
}

fn admin() -> RequestContext {
    RequestContext::new(
        VoterIdentity::from_remote_addr("127.0.0.1").unwrap(),
        RequesterCredentials::new("admin", vec!["manage_options".to_string()]),
    )
}

fn stored_record(conn: &Connection, id: u64) -> VoteRecord {
    SqliteVoteStore::try_new(conn)
        .unwrap()
        .get_record(ArticleId::new(id).unwrap())
        .unwrap()
}

#[test]
fn cast_vote_returns_tally_payload() {
    let conn = seeded();

    let response = api::cast_vote(&conn, &visitor("10.0.0.1"), "1", "yes");
    assert!(response.ok);
    assert_eq!(response.status_code(), 200);
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({
            "ok": true,
            "data": {
                "positive_votes": 1,
                "negative_votes": 0,
                "total_votes": 1,
                "positive_percentage": 100,
                "negative_percentage": 0
            },
            "message": "vote recorded"
        })
    );
}

#[test]
fn invalid_choice_never_mutates_the_store() {
    let conn = seeded();

    for choice in ["maybe", "", "YES", "up"] {
        let response = api::cast_vote(&conn, &visitor("10.0.0.1"), "1", choice);
        assert!(!response.ok);
        assert_eq!(response.error_kind(), Some(VoteErrorKind::InvalidChoice));
        assert_eq!(response.error_code, Some("invalid_choice"));
        assert_eq!(response.status_code(), 400);
    }

    assert_eq!(stored_record(&conn, 1), VoteRecord::default());

    let later = api::cast_vote(&conn, &visitor("10.0.0.1"), "1", "positive");
    assert!(later.ok, "rejected choices must not consume the identity");
}

#[test]
fn malformed_or_unknown_article_is_invalid_article() {
    let conn = seeded();

    for raw in ["abc", "0", "-1", "", "3"] {
        let response = api::cast_vote(&conn, &visitor("10.0.0.1"), raw, "positive");
        assert_eq!(response.error_kind(), Some(VoteErrorKind::InvalidArticle));
        assert_eq!(response.status_code(), 404);

        let response = api::get_tally(&conn, raw);
        assert_eq!(response.error_kind(), Some(VoteErrorKind::InvalidArticle));
    }
}

#[test]
fn malformed_article_is_reported_before_invalid_choice() {
    let conn = seeded();

    let response = api::cast_vote(&conn, &visitor("10.0.0.1"), "x", "maybe");
    assert_eq!(response.error_kind(), Some(VoteErrorKind::InvalidArticle));
}

#[test]
fn repeated_vote_is_conflict() {
    let conn = seeded();

    assert!(api::cast_vote(&conn, &visitor("10.0.0.1"), "2", "no").ok);
    let response = api::cast_vote(&conn, &visitor("10.0.0.1"), "2", "no");
    assert_eq!(response.error_code, Some("already_voted"));
    assert_eq!(response.status_code(), 409);
    assert_eq!(stored_record(&conn, 2).negative_votes, 1);
}

#[test]
fn vote_status_reports_caller_and_tally() {
    let conn = seeded();
    api::cast_vote(&conn, &visitor("10.0.0.1"), "1", "positive");
    api::cast_vote(&conn, &visitor("10.0.0.2"), "1", "negative");

    let mine = api::vote_status(&conn, &visitor("10.0.0.1"), "1");
    let data = mine.data.unwrap();
    assert!(data.has_voted);
    assert_eq!(data.tally.total_votes, 2);
    assert_eq!(data.tally.positive_percentage, 50);

    let stranger = api::vote_status(&conn, &visitor("10.0.0.3"), "1");
    assert!(!stranger.data.unwrap().has_voted);
}

#[test]
fn reset_and_stats_require_admin() {
    let conn = seeded();
    api::cast_vote(&conn, &visitor("10.0.0.1"), "1", "positive");

    let denied = api::reset_article(&conn, &visitor("10.0.0.1"), "1");
    assert_eq!(denied.status_code(), 403);
    let denied = api::article_stats(&conn, &visitor("10.0.0.1"));
    assert_eq!(denied.error_code, Some("unauthorized"));

    let stats = api::article_stats(&conn, &admin());
    let rows = stats.data.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].tally.positive_votes, 1);

    let reset = api::reset_article(&conn, &admin(), "1");
    assert!(reset.ok);
    assert_eq!(reset.message, "vote data reset successfully");
    assert_eq!(api::get_tally(&conn, "1").data.unwrap().total_votes, 0);
    assert!(api::cast_vote(&conn, &visitor("10.0.0.1"), "1", "negative").ok);
}

#[test]
fn single_article_stats_cover_drafts_for_admins_only() {
    let conn = seeded();
    SqliteArticleCatalog::try_new(&conn)
        .unwrap()
        .upsert_article(&Article {
            id: ArticleId::new(9).unwrap(),
            title: "Unpublished".to_string(),
            is_published: false,
        })
        .unwrap();
    api::cast_vote(&conn, &visitor("10.0.0.1"), "9", "negative");

    let denied = api::article_stats_for(&conn, &visitor("10.0.0.1"), "9");
    assert_eq!(denied.status_code(), 403);

    let stats = api::article_stats_for(&conn, &admin(), "9").data.unwrap();
    assert_eq!(stats.article.title, "Unpublished");
    assert_eq!(stats.tally.negative_votes, 1);
    assert_eq!(stats.tally.negative_percentage, 100);

    let missing = api::article_stats_for(&conn, &admin(), "404");
    assert_eq!(missing.error_code, Some("invalid_article"));
}
