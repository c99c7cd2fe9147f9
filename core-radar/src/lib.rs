//! # Radar Core
//!
//! Keeps a local mirror of timestamped weather-radar frames and background
//! overlays, and renders them into a single layered animation.
//!
//! ## Components
//!
//! - [`filename`] - classifies `IDR<id>.<...>.png` names into frames and
//!   background layers
//! - [`cache_index`] - builds a [`LocalView`] of the cache directory
//! - [`sync`] - size-diffed, bounded-concurrency mirroring of the remote
//!   directories
//! - [`retention`] - age-based removal of old frames
//! - [`composite`] - artifact caching, argument construction and compositor
//!   invocation
//! - [`settings`] / [`arguments`] - per-call configuration and the
//!   compositor argument template
//! - [`service`] - [`RadarService`], the session facade
//!
//! Host I/O goes through the `bridge-traits` collaborators wired by
//! [`core_runtime::config::RadarConfig`].

pub mod arguments;
pub mod cache_index;
pub mod composite;
pub mod error;
pub mod filename;
pub mod retention;
pub mod service;
pub mod settings;
pub mod sync;

pub use arguments::{ArgContext, ArgToken, ArgumentTemplate};
pub use cache_index::{LocalCacheIndex, LocalView};
pub use composite::{build_arguments, CompositeEngine, CompositeOutput};
pub use error::{RadarError, Result};
pub use filename::{classify, parse_timestamp, BackgroundKind, Role};
pub use retention::{RetentionManager, RetentionReport};
pub use service::RadarService;
pub use settings::{
    BackgroundToggles, CompositeOptions, FetchToggles, RemoteSettings, RetentionSettings,
    ReturnMethod, Settings, SettingsOverrides,
};
pub use sync::{RemoteSyncEngine, SyncCategory, SyncReport};
