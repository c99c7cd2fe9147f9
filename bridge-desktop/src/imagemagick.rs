//! Compositor Implementation using the ImageMagick command line
//!
//! The system `convert` binary is spawned rather than linking MagickWand, so
//! no native headers are required at build time. Output is rendered to a
//! hidden sibling and renamed into place only when the process succeeds.

use async_trait::async_trait;
use bridge_traits::{
    compositor::{render_command_line, Compositor},
    error::{BridgeError, Result},
};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// ImageMagick `convert` invoker
#[derive(Debug, Clone)]
pub struct ImageMagickCompositor {
    program: PathBuf,
}

impl ImageMagickCompositor {
    pub fn new() -> Self {
        Self::with_program("convert")
    }

    /// Use a different executable (`magick`, an absolute path, a wrapper script)
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Whether the configured program can be launched at all
    pub async fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Hidden sibling keeping the real extension, since ImageMagick picks the
    /// encoder from it
    fn staging_path(output: &Path) -> PathBuf {
        let stem = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        match output.extension() {
            Some(ext) => {
                output.with_file_name(format!(".{}.partial.{}", stem, ext.to_string_lossy()))
            }
            None => output.with_file_name(format!(".{}.partial", stem)),
        }
    }

    async fn discard(staging: &Path) {
        if let Err(e) = tokio::fs::remove_file(staging).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = ?staging, error = %e, "Failed to remove partial composite");
            }
        }
    }
}

impl Default for ImageMagickCompositor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Compositor for ImageMagickCompositor {
    async fn composite(&self, args: &[String]) -> Result<()> {
        let (output, inputs) = args.split_last().ok_or_else(|| {
            BridgeError::OperationFailed("compositor invoked without an output path".to_string())
        })?;
        let output = PathBuf::from(output);
        let staging = Self::staging_path(&output);
        let program = self.program.to_string_lossy().into_owned();

        debug!(command = %render_command_line(&program, args), "Running compositor");

        let result = Command::new(&self.program)
            .args(inputs)
            .arg(&staging)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let run = match result {
            Ok(run) => run,
            Err(e) => {
                Self::discard(&staging).await;
                return Err(BridgeError::Process(format!(
                    "failed to launch {}: {}",
                    program, e
                )));
            }
        };

        if !run.status.success() {
            Self::discard(&staging).await;
            let stderr = String::from_utf8_lossy(&run.stderr);
            return Err(BridgeError::Process(format!(
                "{} exited with {}: {}",
                program,
                run.status,
                stderr.trim()
            )));
        }

        tokio::fs::rename(&staging, &output).await.map_err(|e| {
            BridgeError::Process(format!(
                "{} reported success but produced no output at {}: {}",
                program,
                staging.display(),
                e
            ))
        })?;

        debug!(output = ?output, "Composite written");
        Ok(())
    }
}
