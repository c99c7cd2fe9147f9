//! # Local Cache Index
//!
//! Builds a classified [`LocalView`] of the cache directory on every call.
//! Nothing is kept in memory between calls.

use crate::error::{RadarError, Result};
use crate::filename::{classify, BackgroundKind, Role};
use crate::settings::Settings;
use bridge_traits::FileSystemAccess;
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

const CACHE_EXTENSIONS: &[&str] = &["gif", "png"];

/// Frames and backgrounds currently on disk for one site
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocalView {
    /// Ascending by name, which is chronological for fixed-width timestamps
    pub frames: Vec<PathBuf>,
    /// At most one path per enabled type; absent types have no entry
    pub backgrounds: BTreeMap<BackgroundKind, PathBuf>,
}

impl LocalView {
    /// Classify directory entries for `settings.id`
    ///
    /// When several files claim the same background type the first one in
    /// `entries` wins. Directory enumeration order is platform defined, so
    /// duplicates make the selected layer unpredictable.
    pub fn from_entries(entries: impl IntoIterator<Item = PathBuf>, settings: &Settings) -> Self {
        let mut view = LocalView::default();

        for path in entries {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            match classify(name, &settings.id) {
                Role::Frame { .. } => view.frames.push(path),
                Role::Background(kind) if settings.backgrounds.is_enabled(kind) => {
                    match view.backgrounds.entry(kind) {
                        Entry::Vacant(slot) => {
                            slot.insert(path);
                        }
                        Entry::Occupied(kept) => {
                            warn!(
                                kind = %kind,
                                kept = ?kept.get(),
                                ignored = ?path,
                                "Duplicate background layer"
                            );
                        }
                    }
                }
                Role::Background(_) | Role::Unclassified => {}
            }
        }

        view.frames
            .sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        view
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty() && self.backgrounds.is_empty()
    }

    pub fn background(&self, kind: BackgroundKind) -> Option<&Path> {
        self.backgrounds.get(&kind).map(PathBuf::as_path)
    }
}

/// Reads the cache directory through the host file system bridge
#[derive(Clone)]
pub struct LocalCacheIndex {
    fs: Arc<dyn FileSystemAccess>,
}

impl LocalCacheIndex {
    pub fn new(fs: Arc<dyn FileSystemAccess>) -> Self {
        Self { fs }
    }

    /// Current classified view; a missing cache directory is created empty
    #[instrument(skip(self, settings), fields(site = %settings.id))]
    pub async fn list(&self, settings: &Settings) -> Result<LocalView> {
        let cache = settings.cache_path.as_path();
        self.fs
            .create_dir_all(cache)
            .await
            .map_err(|e| RadarError::local_io("create", cache, e))?;

        let entries = match self.fs.list_matching(cache, CACHE_EXTENSIONS).await {
            Ok(entries) => entries,
            // Removed between create and list
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(RadarError::local_io("list", cache, e)),
        };

        let view = LocalView::from_entries(entries, settings);
        debug!(
            frames = view.frames.len(),
            backgrounds = view.backgrounds.len(),
            "Indexed cache"
        );
        Ok(view)
    }
}
