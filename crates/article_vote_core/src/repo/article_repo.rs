//! Article catalog contract and SQLite implementation.
//!
//! The catalog stands in for the publishing system that owns articles. Vote
//! services only ask whether an id exists and, for admin statistics, which
//! articles are published.

use crate::model::article::{Article, ArticleId};
use crate::repo::vote_repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const ARTICLE_SELECT_SQL: &str = "SELECT id, title, is_published FROM articles";

/// Read access to known articles, plus the seeding hook used by tooling.
pub trait ArticleCatalog {
    fn article_exists(&self, id: ArticleId) -> RepoResult<bool>;
    fn get_article(&self, id: ArticleId) -> RepoResult<Option<Article>>;
    /// Inserts or replaces title and publish state for one article.
    fn upsert_article(&self, article: &Article) -> RepoResult<()>;
    /// Lists published articles ordered by id.
    fn list_published_articles(&self) -> RepoResult<Vec<Article>>;
}

/// SQLite-backed article catalog.
pub struct SqliteArticleCatalog<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteArticleCatalog<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ArticleCatalog for SqliteArticleCatalog<'_> {
    fn article_exists(&self, id: ArticleId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM articles WHERE id = ?1);",
            [id.as_db()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn get_article(&self, id: ArticleId) -> RepoResult<Option<Article>> {
        let row = self
            .conn
            .query_row(
                &format!("{ARTICLE_SELECT_SQL} WHERE id = ?1;"),
                [id.as_db()],
                |row| Ok(read_article_columns(row)),
            )
            .optional()?;

        row.map(parse_article).transpose()
    }

    fn upsert_article(&self, article: &Article) -> RepoResult<()> {
        let title = article.title.trim();
        if title.is_empty() {
            return Err(RepoError::InvalidData(
                "article title must not be empty".to_string(),
            ));
        }

        self.conn.execute(
            "INSERT INTO articles (id, title, is_published)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (id) DO UPDATE SET
                title = excluded.title,
                is_published = excluded.is_published;",
            params![article.id.as_db(), title, i64::from(article.is_published)],
        )?;
        Ok(())
    }

    fn list_published_articles(&self) -> RepoResult<Vec<Article>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ARTICLE_SELECT_SQL} WHERE is_published = 1 ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut articles = Vec::new();
        while let Some(row) = rows.next()? {
            articles.push(parse_article(read_article_columns(row))?);
        }
        Ok(articles)
    }
}

type ArticleColumns = rusqlite::Result<(i64, String, i64)>;

fn read_article_columns(row: &Row<'_>) -> ArticleColumns {
    Ok((row.get("id")?, row.get("title")?, row.get("is_published")?))
}

fn parse_article(columns: ArticleColumns) -> RepoResult<Article> {
    let (raw_id, title, raw_published) = columns?;
    let id = ArticleId::from_db(raw_id).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid article id `{raw_id}` in articles.id"))
    })?;
    let is_published = match raw_published {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_published value `{other}` in articles.is_published"
            )));
        }
    };

    Ok(Article {
        id,
        title,
        is_published,
    })
}
