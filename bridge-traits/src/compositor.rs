//! External Compositor Abstraction
//!
//! The compositing engine (ImageMagick `convert` on desktop) is treated as an
//! opaque operation: it receives a flat, ordered token sequence whose final
//! token is the output path, and reports success or failure.

use async_trait::async_trait;

use crate::error::Result;

/// Layered-composite invoker
///
/// Implementations must not leave a partially written file at the output path
/// when they fail.
#[async_trait]
pub trait Compositor: Send + Sync {
    /// Produce the file named by the last token of `args`
    async fn composite(&self, args: &[String]) -> Result<()>;
}

/// Render a token sequence as a shell-like command line for diagnostics.
///
/// Tokens containing spaces are wrapped in double quotes.
pub fn render_command_line(program: &str, args: &[String]) -> String {
    let mut line = String::from(program);
    for arg in args {
        line.push(' ');
        if arg.contains(' ') {
            line.push('"');
            line.push_str(arg);
            line.push('"');
        } else {
            line.push_str(arg);
        }
    }
    line
}
