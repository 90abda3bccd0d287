//! Advisory client-side record of articles this client already voted on.
//!
//! Mirrors the browser widget's `voted_<id>` local-storage marker so a client
//! does not prompt again. The server-side `already_voted` answer stays
//! authoritative; a lost or stale cache only costs one extra round trip.

use anyhow::Context;
use article_vote_core::ArticleId;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    voted_articles: BTreeSet<ArticleId>,
}

/// File-backed set of locally voted article ids.
#[derive(Debug)]
pub struct ClientVoteCache {
    path: PathBuf,
    file: CacheFile,
}

impl ClientVoteCache {
    /// Loads the cache; a missing or unreadable file starts empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file = match read_cache_file(&path) {
            Ok(file) => file,
            Err(err) => {
                warn!(
                    "event=client_cache_load module=cli status=error error_code=cache_unreadable error={err:#}"
                );
                CacheFile::default()
            }
        };
        Self { path, file }
    }

    pub fn has_voted(&self, article_id: ArticleId) -> bool {
        self.file.voted_articles.contains(&article_id)
    }

    /// Marks `article_id` and writes the cache back to disk.
    pub fn mark_voted(&mut self, article_id: ArticleId) -> anyhow::Result<()> {
        if !self.file.voted_articles.insert(article_id) {
            return Ok(());
        }
        let body = serde_json::to_string_pretty(&self.file)?;
        std::fs::write(&self.path, body)
            .with_context(|| format!("failed to write client cache `{}`", self.path.display()))
    }
}

fn read_cache_file(path: &Path) -> anyhow::Result<CacheFile> {
    if !path.exists() {
        return Ok(CacheFile::default());
    }
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read client cache `{}`", path.display()))?;
    serde_json::from_str(&body)
        .with_context(|| format!("client cache `{}` is not valid JSON", path.display()))
}
