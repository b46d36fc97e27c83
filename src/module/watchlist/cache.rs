///! TTL-gated list cache
///!
///! Each remote list is mirrored at `<cache_dir>/<name>.csv`. A fresh mirror
///! (younger than the TTL) is used without touching the network; a stale or
///! missing one triggers a download that atomically replaces the mirror. On
///! download failure the last good copy, if any, keeps the bot running.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

const HTTP_TIMEOUT_SECONDS: u64 = 30;

pub struct ListCache {
    cache_dir: PathBuf,
    ttl: Duration,
    client: reqwest::Client,
}

impl ListCache {
    pub fn new(cache_dir: impl Into<PathBuf>, ttl: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECONDS))
            .user_agent(format!("skywatch-bot/{}", crate::VERSION))
            .build()
            .context("Failed to build HTTP client for list cache")?;

        Ok(Self {
            cache_dir: cache_dir.into(),
            ttl,
            client,
        })
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.csv", name))
    }

    /// Return a local path for the named list, downloading if the mirror is
    /// stale or missing. Falls back to a stale mirror when the download
    /// fails; errors only when there is nothing at all to serve.
    pub async fn fetch(&self, name: &str, url: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .with_context(|| format!("Failed to create cache dir {}", self.cache_dir.display()))?;

        let dst = self.cache_path(name);

        if is_fresh(&dst, self.ttl).await {
            tracing::debug!("List '{}' cache is fresh, skipping download", name);
            return Ok(dst);
        }

        match self.download(url, &dst).await {
            Ok(()) => {
                tracing::info!("List '{}' downloaded to {}", name, dst.display());
                Ok(dst)
            }
            Err(e) if dst.is_file() => {
                tracing::warn!("List '{}' download failed ({}), using cached copy", name, e);
                Ok(dst)
            }
            Err(e) => Err(e).with_context(|| format!("List '{}' unavailable and not cached", name)),
        }
    }

    async fn download(&self, url: &str, dst: &Path) -> Result<()> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to request {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP error {} for {}", response.status(), url);
        }

        let body = response
            .bytes()
            .await
            .context("Failed to read list response body")?;

        // Write-then-rename keeps a reader from ever seeing a partial file
        let tmp = dst.with_extension("csv.tmp");
        tokio::fs::write(&tmp, &body)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, dst)
            .await
            .with_context(|| format!("Failed to replace {}", dst.display()))?;

        Ok(())
    }
}

/// Mirror exists and is younger than the TTL.
async fn is_fresh(path: &Path, ttl: Duration) -> bool {
    let Ok(meta) = tokio::fs::metadata(path).await else {
        return false;
    };
    match meta.modified().map(|mtime| mtime.elapsed()) {
        // A clock-skewed future mtime reads as elapsed Err: treat as fresh
        Ok(Err(_)) => true,
        Ok(Ok(age)) => age < ttl,
        Err(_) => false,
    }
}
