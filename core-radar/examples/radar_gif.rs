//! Mirror one radar site and render its animation
//!
//! Needs network access to the mirror and ImageMagick's `convert` on `PATH`.
//!
//! ```bash
//! cargo run -p core-radar --example radar_gif -- 071 /tmp/radar
//! ```

use bridge_desktop::{FtpTransferClient, ImageMagickCompositor, TokioFileSystem};
use bridge_traits::time::LogLevel;
use core_radar::{RadarService, Settings};
use core_runtime::config::RadarConfig;
use core_runtime::logging::{init_logging, LoggingConfig};
use std::env;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    if let Err(e) = init_logging(LoggingConfig::default().with_level(LogLevel::Debug)) {
        eprintln!("{}", e);
        return;
    }

    let mut settings = Settings::default();
    if let Some(id) = args.get(1) {
        settings.id = id.clone();
    }
    if let Some(cache) = args.get(2) {
        settings.cache_path = cache.into();
    }

    let config = match RadarConfig::builder()
        .file_system(Arc::new(TokioFileSystem::new()))
        .transfer_client(Arc::new(FtpTransferClient::anonymous()))
        .compositor(Arc::new(ImageMagickCompositor::new()))
        .build()
    {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Bridge setup failed");
            return;
        }
    };

    let radar = match RadarService::new(config, settings) {
        Ok(radar) => radar,
        Err(e) => {
            error!(error = %e, "Invalid settings");
            return;
        }
    };

    match radar.composite().await {
        Ok(output) => info!(output = ?output, "Composite ready"),
        Err(e) => error!(error = %e, "Composite failed"),
    }
}
