//! # Radar Service
//!
//! Session facade over the engines. A service owns the session's default
//! [`Settings`] plus the host bridges, and every operation can take
//! per-call [`SettingsOverrides`] that never leak into the defaults.
//!
//! ## Usage
//!
//! ```ignore
//! use core_radar::{RadarService, Settings, SettingsOverrides};
//! use core_runtime::config::RadarConfig;
//!
//! let mut radar = RadarService::new(RadarConfig::builder().build()?, Settings::default())?;
//! radar.set("id", "071")?;
//!
//! let report = radar.refresh().await?;
//! let gif = radar
//!     .composite_with(&SettingsOverrides::new().set("composite.method", "buffer"))
//!     .await?;
//! ```

use crate::cache_index::{LocalCacheIndex, LocalView};
use crate::composite::{CompositeEngine, CompositeOutput};
use crate::error::Result;
use crate::retention::{RetentionManager, RetentionReport};
use crate::settings::{Settings, SettingsOverrides};
use crate::sync::{RemoteSyncEngine, SyncReport};
use core_runtime::config::RadarConfig;
use serde_json::Value;
use std::sync::Arc;

pub struct RadarService {
    settings: Settings,
    index: LocalCacheIndex,
    sync: RemoteSyncEngine,
    retention: RetentionManager,
    composite: CompositeEngine,
}

impl RadarService {
    pub fn new(config: RadarConfig, settings: Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            index: LocalCacheIndex::new(Arc::clone(&config.file_system)),
            sync: RemoteSyncEngine::new(
                Arc::clone(&config.file_system),
                Arc::clone(&config.transfer_client),
            ),
            retention: RetentionManager::new(
                Arc::clone(&config.file_system),
                Arc::clone(&config.clock),
            ),
            composite: CompositeEngine::new(&config),
        })
    }

    /// Session defaults
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Change one session default by dotted key
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.settings.set(key, value)?;
        Ok(self)
    }

    /// Session defaults with `overrides` applied
    pub fn resolve(&self, overrides: &SettingsOverrides) -> Result<Settings> {
        overrides.apply(&self.settings)
    }

    /// Sync the cache with the mirror
    pub async fn refresh(&self) -> Result<SyncReport> {
        self.refresh_with(&SettingsOverrides::default()).await
    }

    pub async fn refresh_with(&self, overrides: &SettingsOverrides) -> Result<SyncReport> {
        let settings = self.resolve(overrides)?;
        self.sync.sync(&settings).await
    }

    /// What is on disk right now, without touching the network
    pub async fn cached(&self) -> Result<LocalView> {
        self.cached_with(&SettingsOverrides::default()).await
    }

    pub async fn cached_with(&self, overrides: &SettingsOverrides) -> Result<LocalView> {
        let settings = self.resolve(overrides)?;
        self.index.list(&settings).await
    }

    /// Remove expired frames
    pub async fn clean(&self) -> Result<RetentionReport> {
        self.clean_with(&SettingsOverrides::default()).await
    }

    pub async fn clean_with(&self, overrides: &SettingsOverrides) -> Result<RetentionReport> {
        let settings = self.resolve(overrides)?;
        self.retention.clean(&settings).await
    }

    /// Render (or reuse) the animation
    pub async fn composite(&self) -> Result<CompositeOutput> {
        self.composite_with(&SettingsOverrides::default()).await
    }

    pub async fn composite_with(&self, overrides: &SettingsOverrides) -> Result<CompositeOutput> {
        let settings = self.resolve(overrides)?;
        self.composite.composite(&settings).await
    }
}
