//! # Composite Engine
//!
//! Renders the layered radar animation and hands it back as a path, a buffer
//! or a stream.
//!
//! ## Workflow
//!
//! 1. Derive the artifact path `<cache>/IDR<id>.composite.<format>`
//! 2. With caching on, reuse the artifact when its mtime is within
//!    `cache_expiry` of now; nothing else runs on a hit
//! 3. Otherwise sync (`auto_refresh`), apply retention (`auto_clean`), index
//!    the cache and build the compositor arguments from the template
//! 4. Run the compositor, which replaces the artifact only on success
//! 5. Return the artifact in the requested shape

use crate::arguments::ArgContext;
use crate::cache_index::{LocalCacheIndex, LocalView};
use crate::error::{RadarError, Result};
use crate::retention::RetentionManager;
use crate::settings::{ReturnMethod, Settings};
use crate::sync::RemoteSyncEngine;
use bridge_traits::{ByteStream, Clock, Compositor, FileSystemAccess};
use bytes::Bytes;
use core_runtime::config::RadarConfig;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// The composite artifact in the shape selected by `composite.method`
pub enum CompositeOutput {
    Path(PathBuf),
    Buffer(Bytes),
    Stream(ByteStream),
}

impl CompositeOutput {
    pub fn method(&self) -> ReturnMethod {
        match self {
            CompositeOutput::Path(_) => ReturnMethod::Path,
            CompositeOutput::Buffer(_) => ReturnMethod::Buffer,
            CompositeOutput::Stream(_) => ReturnMethod::Stream,
        }
    }

    pub fn into_path(self) -> Option<PathBuf> {
        match self {
            CompositeOutput::Path(path) => Some(path),
            _ => None,
        }
    }

    pub fn into_buffer(self) -> Option<Bytes> {
        match self {
            CompositeOutput::Buffer(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn into_stream(self) -> Option<ByteStream> {
        match self {
            CompositeOutput::Stream(stream) => Some(stream),
            _ => None,
        }
    }
}

impl fmt::Debug for CompositeOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompositeOutput::Path(path) => f.debug_tuple("Path").field(path).finish(),
            CompositeOutput::Buffer(bytes) => f
                .debug_tuple("Buffer")
                .field(&format_args!("{} bytes", bytes.len()))
                .finish(),
            CompositeOutput::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Resolve the argument template against a view
pub fn build_arguments(settings: &Settings, view: &LocalView, artifact: &Path) -> Vec<String> {
    let ctx = ArgContext {
        settings,
        view,
        artifact_path: artifact,
    };
    settings.composite.arguments.resolve(&ctx)
}

#[derive(Clone)]
pub struct CompositeEngine {
    fs: Arc<dyn FileSystemAccess>,
    compositor: Arc<dyn Compositor>,
    clock: Arc<dyn Clock>,
    index: LocalCacheIndex,
    sync: RemoteSyncEngine,
    retention: RetentionManager,
}

impl CompositeEngine {
    pub fn new(config: &RadarConfig) -> Self {
        Self {
            fs: Arc::clone(&config.file_system),
            compositor: Arc::clone(&config.compositor),
            clock: Arc::clone(&config.clock),
            index: LocalCacheIndex::new(Arc::clone(&config.file_system)),
            sync: RemoteSyncEngine::new(
                Arc::clone(&config.file_system),
                Arc::clone(&config.transfer_client),
            ),
            retention: RetentionManager::new(
                Arc::clone(&config.file_system),
                Arc::clone(&config.clock),
            ),
        }
    }

    #[instrument(skip(self, settings), fields(site = %settings.id, format = %settings.composite.format))]
    pub async fn composite(&self, settings: &Settings) -> Result<CompositeOutput> {
        settings.validate()?;
        let artifact = settings.artifact_path();

        let fresh = settings.composite.cache
            && self
                .is_fresh(&artifact, settings.composite.cache_expiry)
                .await?;

        if fresh {
            info!(path = ?artifact, "Composite cache hit");
        } else {
            self.render(settings, &artifact).await?;
        }

        self.deliver(settings.composite.method, artifact).await
    }

    async fn is_fresh(&self, artifact: &Path, expiry: Duration) -> Result<bool> {
        let meta = match self.fs.metadata(artifact).await {
            Ok(meta) => meta,
            Err(e) if e.is_not_found() => {
                debug!(path = ?artifact, "No composite yet");
                return Ok(false);
            }
            Err(e) => return Err(RadarError::local_io("stat", artifact, e)),
        };

        let Some(modified) = meta.modified_at else {
            return Ok(false);
        };
        // An expiry reaching past the calendar never lapses
        let Some(stale_before) = chrono::Duration::from_std(expiry)
            .ok()
            .and_then(|expiry| self.clock.now().checked_sub_signed(expiry))
        else {
            return Ok(true);
        };

        let fresh = modified > stale_before;
        if !fresh {
            debug!(path = ?artifact, modified = %modified, "Composite expired");
        }
        Ok(fresh)
    }

    async fn render(&self, settings: &Settings, artifact: &Path) -> Result<()> {
        if settings.composite.auto_refresh {
            self.sync.sync(settings).await?;
        }
        if settings.composite.auto_clean {
            self.retention.clean(settings).await?;
        }

        let view = self.index.list(settings).await?;
        let args = build_arguments(settings, &view, artifact);

        info!(
            frames = view.frames.len(),
            backgrounds = view.backgrounds.len(),
            "Rendering composite"
        );
        self.compositor
            .composite(&args)
            .await
            .map_err(RadarError::Compositor)
    }

    async fn deliver(&self, method: ReturnMethod, artifact: PathBuf) -> Result<CompositeOutput> {
        match method {
            ReturnMethod::Path => Ok(CompositeOutput::Path(artifact)),
            ReturnMethod::Buffer => self
                .fs
                .read_file(&artifact)
                .await
                .map(CompositeOutput::Buffer)
                .map_err(|e| RadarError::local_io("read", artifact, e)),
            ReturnMethod::Stream => self
                .fs
                .open_read_stream(&artifact)
                .await
                .map(CompositeOutput::Stream)
                .map_err(|e| RadarError::local_io("open", artifact, e)),
        }
    }
}
