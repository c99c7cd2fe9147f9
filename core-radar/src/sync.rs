//! # Remote Sync Engine
//!
//! Mirrors the remote frame and background directories into the local cache.
//!
//! ## Workflow
//!
//! 1. Ensure the cache directory exists and connect to the configured host
//! 2. Backgrounds: change directory, list, keep enabled `IDR<id>.<type>.png`
//! 3. Frames: change directory, list, keep `IDR<id>.*.png`
//! 4. For each kept entry compare the remote size with the local file and
//!    fetch it when absent or different, at most `fetch_concurrency` at once
//! 5. Close the session, whether or not the steps above succeeded; after a
//!    timeout the close gets the same budget before the session is abandoned
//!
//! A local file whose size matches the listing is never transferred again,
//! so repeating a sync against an unchanged mirror costs one listing per
//! category and nothing else.

use crate::error::{RadarError, Result};
use crate::filename::{classify, site_prefix, Role};
use crate::settings::Settings;
use bridge_traits::{FileSystemAccess, RemoteEntry, TransferClient, TransferSession};
use futures::stream::{self, TryStreamExt};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Outcome of one sync call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Local paths of every wanted frame, fetched or already present
    pub frames: Vec<PathBuf>,
    /// Local paths of every wanted background, fetched or already present
    pub backgrounds: Vec<PathBuf>,
    /// Files transferred by this call
    pub fetched: usize,
    /// Files left alone because the local copy was up to date
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncCategory {
    Backgrounds,
    Frames,
}

impl SyncCategory {
    pub fn label(self) -> &'static str {
        match self {
            SyncCategory::Backgrounds => "backgrounds",
            SyncCategory::Frames => "frames",
        }
    }

    fn remote_path(self, settings: &Settings) -> &str {
        match self {
            SyncCategory::Backgrounds => &settings.remote.backgrounds_path,
            SyncCategory::Frames => &settings.remote.frame_path,
        }
    }

    /// Whether a listed name belongs to this category for the current settings
    pub fn wants(self, name: &str, settings: &Settings) -> bool {
        if !name.starts_with(&site_prefix(&settings.id)) || !name.ends_with(".png") {
            return false;
        }
        match self {
            SyncCategory::Frames => true,
            SyncCategory::Backgrounds => matches!(
                classify(name, &settings.id),
                Role::Background(kind) if settings.backgrounds.is_enabled(kind)
            ),
        }
    }
}

impl fmt::Display for SyncCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct CategoryOutcome {
    paths: Vec<PathBuf>,
    fetched: usize,
    skipped: usize,
}

#[derive(Clone)]
pub struct RemoteSyncEngine {
    fs: Arc<dyn FileSystemAccess>,
    transfer: Arc<dyn TransferClient>,
}

impl RemoteSyncEngine {
    pub fn new(fs: Arc<dyn FileSystemAccess>, transfer: Arc<dyn TransferClient>) -> Self {
        Self { fs, transfer }
    }

    /// Reconcile the cache with the mirror
    ///
    /// # Errors
    ///
    /// - [`RadarError::Transport`] when connecting, changing directory,
    ///   listing or fetching fails; the failing category stops at once
    /// - [`RadarError::LocalIo`] when the cache cannot be inspected or written
    /// - [`RadarError::Timeout`] when `sync_timeout` elapses first
    #[instrument(skip(self, settings), fields(site = %settings.id, host = %settings.remote.host))]
    pub async fn sync(&self, settings: &Settings) -> Result<SyncReport> {
        let cache = settings.cache_path.as_path();
        self.fs
            .create_dir_all(cache)
            .await
            .map_err(|e| RadarError::local_io("create", cache, e))?;

        debug!("Connecting to mirror");
        let session = self
            .transfer
            .connect(&settings.remote.host)
            .await
            .map_err(|e| RadarError::transport("session", "connect", e))?;

        let work = self.sync_categories(session.as_ref(), settings);
        let outcome = match settings.sync_timeout {
            Some(limit) => match tokio::time::timeout(limit, work).await {
                Ok(outcome) => outcome,
                Err(_) => Err(RadarError::Timeout {
                    category: "sync".to_string(),
                    after: limit,
                }),
            },
            None => work.await,
        };

        close_session(session.as_ref(), settings.sync_timeout).await;

        let report = outcome?;
        info!(
            frames = report.frames.len(),
            backgrounds = report.backgrounds.len(),
            fetched = report.fetched,
            skipped = report.skipped,
            "Sync complete"
        );
        Ok(report)
    }

    async fn sync_categories(
        &self,
        session: &dyn TransferSession,
        settings: &Settings,
    ) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        if settings.fetch.backgrounds {
            let outcome = self
                .sync_category(session, settings, SyncCategory::Backgrounds)
                .await?;
            report.backgrounds = outcome.paths;
            report.fetched += outcome.fetched;
            report.skipped += outcome.skipped;
        }

        if settings.fetch.frames {
            let outcome = self
                .sync_category(session, settings, SyncCategory::Frames)
                .await?;
            report.frames = outcome.paths;
            report.fetched += outcome.fetched;
            report.skipped += outcome.skipped;
        }

        Ok(report)
    }

    #[instrument(skip(self, session, settings), fields(category = %category))]
    async fn sync_category(
        &self,
        session: &dyn TransferSession,
        settings: &Settings,
        category: SyncCategory,
    ) -> Result<CategoryOutcome> {
        let remote_path = category.remote_path(settings);
        debug!(path = %remote_path, "Changing directory");
        session
            .change_directory(remote_path)
            .await
            .map_err(|e| RadarError::transport(category.label(), "change directory", e))?;

        let listed = session
            .list()
            .await
            .map_err(|e| RadarError::transport(category.label(), "list", e))?;
        let listed_count = listed.len();

        let wanted: Vec<RemoteEntry> = listed
            .into_iter()
            .filter(|entry| category.wants(&entry.name, settings))
            .collect();
        debug!(listed = listed_count, wanted = wanted.len(), "Filtered listing");

        let fetched = AtomicUsize::new(0);
        let skipped = AtomicUsize::new(0);
        let cache = settings.cache_path.as_path();

        stream::iter(wanted.iter().map(Ok::<_, RadarError>))
            .try_for_each_concurrent(settings.fetch_concurrency, |entry| {
                let fetched = &fetched;
                let skipped = &skipped;
                async move {
                    if self
                        .fetch_if_stale(session, category, cache, entry)
                        .await?
                    {
                        fetched.fetch_add(1, Ordering::Relaxed);
                    } else {
                        skipped.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(())
                }
            })
            .await?;

        Ok(CategoryOutcome {
            paths: wanted.iter().map(|entry| cache.join(&entry.name)).collect(),
            fetched: fetched.into_inner(),
            skipped: skipped.into_inner(),
        })
    }

    /// Returns `true` when the entry was transferred
    async fn fetch_if_stale(
        &self,
        session: &dyn TransferSession,
        category: SyncCategory,
        cache: &Path,
        entry: &RemoteEntry,
    ) -> Result<bool> {
        let local = cache.join(&entry.name);

        match self.fs.metadata(&local).await {
            Ok(meta) if !meta.is_directory && meta.size == entry.size => {
                debug!(name = %entry.name, size = entry.size, "Up to date, skipping");
                return Ok(false);
            }
            Ok(meta) => {
                debug!(name = %entry.name, local = meta.size, remote = entry.size, "Size changed");
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(RadarError::local_io("stat", local, e)),
        }

        debug!(name = %entry.name, "Fetching");
        let stream = session
            .fetch(&entry.name)
            .await
            .map_err(|e| RadarError::transport(category.label(), "fetch", e))?;
        let written = self
            .fs
            .write_stream_atomic(&local, stream)
            .await
            .map_err(|e| RadarError::local_io("write", &local, e))?;

        debug!(name = %entry.name, bytes = written, "Fetched");
        Ok(true)
    }
}

/// Tear the session down, giving up after `budget` when one is set
///
/// A session stuck in a transfer may never answer; the caller still gets its
/// result back and the session is dropped.
async fn close_session(session: &dyn TransferSession, budget: Option<Duration>) {
    let closed = match budget {
        Some(budget) => match tokio::time::timeout(budget, session.close()).await {
            Ok(closed) => closed,
            Err(_) => {
                warn!(after = ?budget, "Remote session did not close in time, abandoning it");
                return;
            }
        },
        None => session.close().await,
    };

    if let Err(e) = closed {
        warn!(error = %e, "Failed to close remote session");
    }
}
