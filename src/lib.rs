//! # Radar Mirror Workspace
//!
//! Facade crate re-exporting the radar mirror core together with the runtime
//! wiring and bridge contracts it needs.
//!
//! ```ignore
//! use radar_workspace::{RadarConfig, RadarService, Settings};
//!
//! let config = RadarConfig::builder().build()?;
//! let radar = RadarService::new(config, Settings::default())?;
//! let gif = radar.composite().await?;
//! ```

pub use bridge_traits;
pub use core_radar;
pub use core_runtime;

pub use core_radar::{
    CompositeOutput, LocalView, RadarError, RadarService, ReturnMethod, Settings,
    SettingsOverrides,
};
pub use core_runtime::config::RadarConfig;
pub use core_runtime::logging::{init_logging, LoggingConfig};
