//! # Settings
//!
//! Immutable per-call configuration for sync, retention and composite runs.
//!
//! ## Overview
//!
//! A session owns one default [`Settings`] value. Each call may layer a
//! [`SettingsOverrides`] on top of it; the overrides are merged into a fresh
//! value (defaults ⊕ overrides) that is validated and then passed explicitly
//! through every engine. The session default is never touched by a call.
//!
//! Overrides are addressed with dotted keys matching the serialized layout:
//!
//! ```ignore
//! use core_radar::SettingsOverrides;
//! use serde_json::json;
//!
//! let overrides = SettingsOverrides::new()
//!     .set("composite.method", "buffer")
//!     .set("backgrounds", json!({ "rail": true, "roads": true }))
//!     .set("retention.older_than", 6 * 60 * 60 * 1000);
//! ```
//!
//! Durations are carried as milliseconds in serialized form.

use crate::arguments::ArgumentTemplate;
use crate::error::{RadarError, Result};
use crate::filename::{composite_file_name, BackgroundKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SITE_ID: &str = "032";
const DEFAULT_HOST: &str = "ftp.bom.gov.au";
const DEFAULT_FRAME_PATH: &str = "/anon/gen/radar";
const DEFAULT_BACKGROUNDS_PATH: &str = "/anon/gen/radar_transparencies";
const DEFAULT_CACHE_DIR: &str = "radar-cache";
const DEFAULT_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);
const DEFAULT_CACHE_EXPIRY: Duration = Duration::from_secs(60 * 60);
const DEFAULT_DELAY: u32 = 50;

/// Resolved configuration for one call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Three digit radar site code (`032` is Wollongong)
    pub id: String,
    pub remote: RemoteSettings,
    /// Directory holding frames, backgrounds and the composite artifact
    pub cache_path: PathBuf,
    pub fetch: FetchToggles,
    pub backgrounds: BackgroundToggles,
    /// Files fetched in parallel within one category
    pub fetch_concurrency: usize,
    /// Upper bound on a whole sync call, including both categories
    #[serde(with = "duration_ms::option")]
    pub sync_timeout: Option<Duration>,
    pub retention: RetentionSettings,
    pub composite: CompositeOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteSettings {
    pub host: String,
    pub frame_path: String,
    pub backgrounds_path: String,
}

/// Whole-category switches; a disabled category is never listed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchToggles {
    pub frames: bool,
    pub backgrounds: bool,
}

/// Per-type background switches
///
/// Keys are the fixed [`BackgroundKind`] set; a missing key means disabled
/// and an unknown key fails deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackgroundToggles(BTreeMap<BackgroundKind, bool>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetentionSettings {
    /// Frames whose timestamp is older than `now - older_than` are removed
    #[serde(with = "duration_ms")]
    pub older_than: Duration,
}

/// Shape in which the composite artifact is handed back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnMethod {
    Path,
    Buffer,
    Stream,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompositeOptions {
    /// Output extension, which also selects the compositor's encoder
    pub format: String,
    pub method: ReturnMethod,
    /// Reuse a fresh artifact instead of re-rendering
    pub cache: bool,
    /// Inter-frame delay in hundredths of a second
    pub delay: u32,
    #[serde(with = "duration_ms")]
    pub cache_expiry: Duration,
    /// Sync with the mirror before rendering
    pub auto_refresh: bool,
    /// Apply retention before rendering
    pub auto_clean: bool,
    #[serde(skip)]
    pub arguments: ArgumentTemplate,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            id: DEFAULT_SITE_ID.to_string(),
            remote: RemoteSettings::default(),
            cache_path: std::env::temp_dir().join(DEFAULT_CACHE_DIR),
            fetch: FetchToggles::default(),
            backgrounds: BackgroundToggles::default(),
            fetch_concurrency: 1,
            sync_timeout: None,
            retention: RetentionSettings::default(),
            composite: CompositeOptions::default(),
        }
    }
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            frame_path: DEFAULT_FRAME_PATH.to_string(),
            backgrounds_path: DEFAULT_BACKGROUNDS_PATH.to_string(),
        }
    }
}

impl Default for FetchToggles {
    fn default() -> Self {
        Self {
            frames: true,
            backgrounds: true,
        }
    }
}

impl Default for BackgroundToggles {
    fn default() -> Self {
        let enabled = [
            BackgroundKind::Background,
            BackgroundKind::Locations,
            BackgroundKind::Topography,
        ];
        Self(
            BackgroundKind::ALL
                .into_iter()
                .map(|kind| (kind, enabled.contains(&kind)))
                .collect(),
        )
    }
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            older_than: DEFAULT_RETENTION,
        }
    }
}

impl Default for CompositeOptions {
    fn default() -> Self {
        Self {
            format: "gif".to_string(),
            method: ReturnMethod::Path,
            cache: true,
            delay: DEFAULT_DELAY,
            cache_expiry: DEFAULT_CACHE_EXPIRY,
            auto_refresh: true,
            auto_clean: true,
            arguments: ArgumentTemplate::standard(),
        }
    }
}

impl BackgroundToggles {
    /// Every type disabled
    pub fn none() -> Self {
        Self(
            BackgroundKind::ALL
                .into_iter()
                .map(|kind| (kind, false))
                .collect(),
        )
    }

    pub fn is_enabled(&self, kind: BackgroundKind) -> bool {
        self.0.get(&kind).copied().unwrap_or(false)
    }

    pub fn set(&mut self, kind: BackgroundKind, enabled: bool) -> &mut Self {
        self.0.insert(kind, enabled);
        self
    }

    /// Enabled types in enumeration order
    pub fn enabled(&self) -> impl Iterator<Item = BackgroundKind> + '_ {
        self.0
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(kind, _)| *kind)
    }
}

impl Settings {
    /// Parse a complete settings document; absent fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)
            .map_err(|e| RadarError::Config(format!("invalid settings document: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Dotted-path mutation of these settings, validated before it lands
    ///
    /// ```ignore
    /// settings.set("id", "071")?.set("composite.delay", 20)?;
    /// ```
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<&mut Self> {
        *self = SettingsOverrides::new().set(key, value).apply(self)?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.len() != 3 || !self.id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RadarError::Config(format!(
                "site id must be three digits, got `{}`",
                self.id
            )));
        }

        if self.remote.host.trim().is_empty() {
            return Err(RadarError::Config("remote host cannot be empty".to_string()));
        }

        if self.cache_path.as_os_str().is_empty() {
            return Err(RadarError::Config("cache path cannot be empty".to_string()));
        }

        if self.fetch_concurrency == 0 {
            return Err(RadarError::Config(
                "fetch concurrency must be at least 1".to_string(),
            ));
        }

        let format = &self.composite.format;
        if format.is_empty() || format.contains(['/', '\\', '.']) {
            return Err(RadarError::Config(format!(
                "composite format must be a bare extension, got `{}`",
                format
            )));
        }

        Ok(())
    }

    /// Where the composite artifact for this site and format lives
    pub fn artifact_path(&self) -> PathBuf {
        self.cache_path
            .join(composite_file_name(&self.id, &self.composite.format))
    }
}

/// Per-call changes applied on top of a session's default settings
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    values: Vec<(String, Value)>,
    arguments: Option<ArgumentTemplate>,
}

impl SettingsOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override one dotted key; objects merge into the existing value
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.push((key.into(), value.into()));
        self
    }

    /// Replace the compositor argument template for this call
    pub fn arguments(mut self, template: ArgumentTemplate) -> Self {
        self.arguments = Some(template);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.arguments.is_none()
    }

    /// Produce `base ⊕ self` as a new, validated value
    pub fn apply(&self, base: &Settings) -> Result<Settings> {
        if self.is_empty() {
            return Ok(base.clone());
        }

        let mut document = serde_json::to_value(base)
            .map_err(|e| RadarError::Config(format!("settings are not serializable: {}", e)))?;

        for (key, value) in &self.values {
            apply_override(&mut document, key, value.clone())?;
        }

        let mut resolved: Settings = serde_json::from_value(document)
            .map_err(|e| RadarError::Config(format!("invalid settings override: {}", e)))?;
        resolved.composite.arguments = self
            .arguments
            .clone()
            .unwrap_or_else(|| base.composite.arguments.clone());

        resolved.validate()?;
        Ok(resolved)
    }
}

fn apply_override(document: &mut Value, key: &str, value: Value) -> Result<()> {
    let mut target = document;
    for segment in key.split('.') {
        let current = target;
        target = match current {
            Value::Object(map) => map
                .get_mut(segment)
                .ok_or_else(|| RadarError::Config(format!("unknown setting `{}`", key)))?,
            _ => {
                return Err(RadarError::Config(format!(
                    "setting `{}` does not name a nested value",
                    key
                )))
            }
        };
    }
    merge(target, value);
    Ok(())
}

fn merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(existing), Value::Object(patch)) => {
            for (key, value) in patch {
                match existing.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (slot, patch) => *slot = patch,
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use std::time::Duration;

        pub fn serialize<S: Serializer>(
            duration: &Option<Duration>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match duration {
                Some(duration) => super::serialize(duration, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Duration>, D::Error> {
            Option::<u64>::deserialize(deserializer).map(|ms| ms.map(Duration::from_millis))
        }
    }
}
