//! # Retention
//!
//! Removes frames older than `retention.older_than`. Frame age comes from the
//! timestamp embedded in the filename, compared against local wall-clock
//! time; a frame without a decodable timestamp is always kept.

use crate::cache_index::LocalCacheIndex;
use crate::error::Result;
use crate::filename::parse_timestamp;
use crate::settings::Settings;
use bridge_traits::{Clock, FileSystemAccess};
use chrono::NaiveDateTime;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionReport {
    /// Frames selected for removal
    pub targeted: Vec<PathBuf>,
    /// Subset of `targeted` that could not be deleted
    pub failed: Vec<PathBuf>,
}

impl RetentionReport {
    /// Targeted frames that are gone
    pub fn removed(&self) -> impl Iterator<Item = &PathBuf> + '_ {
        self.targeted.iter().filter(|p| !self.failed.contains(p))
    }
}

#[derive(Clone)]
pub struct RetentionManager {
    fs: Arc<dyn FileSystemAccess>,
    index: LocalCacheIndex,
    clock: Arc<dyn Clock>,
}

impl RetentionManager {
    pub fn new(fs: Arc<dyn FileSystemAccess>, clock: Arc<dyn Clock>) -> Self {
        Self {
            index: LocalCacheIndex::new(Arc::clone(&fs)),
            fs,
            clock,
        }
    }

    /// Delete stale frames, continuing past individual failures
    #[instrument(skip(self, settings), fields(site = %settings.id))]
    pub async fn clean(&self, settings: &Settings) -> Result<RetentionReport> {
        let cutoff = retention_cutoff(self.clock.local_now(), settings.retention.older_than);
        if cutoff.is_none() {
            debug!(
                older_than = ?settings.retention.older_than,
                "Retention age reaches past the calendar, keeping every frame"
            );
        }

        let view = self.index.list(settings).await?;
        let targeted: Vec<PathBuf> = view
            .frames
            .into_iter()
            .filter(|frame| {
                cutoff.is_some_and(|cutoff| {
                    parse_timestamp(&frame.to_string_lossy()).is_some_and(|taken| taken < cutoff)
                })
            })
            .collect();

        let mut failed = Vec::new();
        for frame in &targeted {
            match self.fs.delete_file(frame).await {
                Ok(()) => debug!(path = ?frame, "Removed expired frame"),
                // Someone else got there first
                Err(e) if e.is_not_found() => debug!(path = ?frame, "Expired frame already gone"),
                Err(e) => {
                    warn!(path = ?frame, error = %e, "Failed to remove expired frame");
                    failed.push(frame.clone());
                }
            }
        }

        info!(
            cutoff = ?cutoff,
            targeted = targeted.len(),
            failed = failed.len(),
            "Cache cleaned"
        );
        Ok(RetentionReport { targeted, failed })
    }
}

/// `now - older_than`, or `None` when that instant is not representable
fn retention_cutoff(now: NaiveDateTime, older_than: Duration) -> Option<NaiveDateTime> {
    chrono::Duration::from_std(older_than)
        .ok()
        .and_then(|age| now.checked_sub_signed(age))
}
