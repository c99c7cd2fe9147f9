//! # Compositor Argument Templates
//!
//! A template is an ordered list of tokens. Each token is either a literal
//! or a function of the current call's settings and local view that yields
//! zero or more arguments. Resolution evaluates every function exactly once,
//! in order, and flattens the result into the final argument list.
//!
//! The standard template renders an ImageMagick animation:
//!
//! ```text
//! -delay <delay> -loop 0
//! -draw "image DstOver 0,0,0,0 '<background>'" ...   (base layer first)
//! -dispose background
//! <frame> <frame> ...                                 (chronological)
//! <artifact>
//! ```

use crate::cache_index::LocalView;
use crate::settings::Settings;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Everything a derived token may look at
#[derive(Debug, Clone, Copy)]
pub struct ArgContext<'a> {
    pub settings: &'a Settings,
    pub view: &'a LocalView,
    pub artifact_path: &'a Path,
}

type DeriveFn = dyn Fn(&ArgContext<'_>) -> Vec<String> + Send + Sync;

#[derive(Clone)]
pub enum ArgToken {
    Literal(String),
    Derived(Arc<DeriveFn>),
}

impl ArgToken {
    pub fn literal(value: impl Into<String>) -> Self {
        ArgToken::Literal(value.into())
    }

    pub fn derived<F>(f: F) -> Self
    where
        F: Fn(&ArgContext<'_>) -> Vec<String> + Send + Sync + 'static,
    {
        ArgToken::Derived(Arc::new(f))
    }

    fn emit(&self, ctx: &ArgContext<'_>, out: &mut Vec<String>) {
        match self {
            ArgToken::Literal(value) => out.push(value.clone()),
            ArgToken::Derived(f) => out.extend(f(ctx)),
        }
    }
}

impl fmt::Debug for ArgToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgToken::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            ArgToken::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

impl From<&str> for ArgToken {
    fn from(value: &str) -> Self {
        ArgToken::literal(value)
    }
}

impl From<String> for ArgToken {
    fn from(value: String) -> Self {
        ArgToken::Literal(value)
    }
}

/// Ordered compositor invocation recipe
#[derive(Debug, Clone)]
pub struct ArgumentTemplate {
    tokens: Vec<ArgToken>,
}

impl ArgumentTemplate {
    pub fn new(tokens: Vec<ArgToken>) -> Self {
        Self { tokens }
    }

    /// Layered animation: backgrounds under disposable frames
    pub fn standard() -> Self {
        Self::new(vec![
            ArgToken::literal("-delay"),
            ArgToken::derived(|ctx| vec![ctx.settings.composite.delay.to_string()]),
            ArgToken::literal("-loop"),
            ArgToken::literal("0"),
            ArgToken::derived(background_layers),
            ArgToken::literal("-dispose"),
            ArgToken::literal("background"),
            ArgToken::derived(frame_operands),
            ArgToken::derived(|ctx| vec![path_operand(ctx.artifact_path)]),
        ])
    }

    pub fn push(mut self, token: impl Into<ArgToken>) -> Self {
        self.tokens.push(token.into());
        self
    }

    pub fn tokens(&self) -> &[ArgToken] {
        &self.tokens
    }

    /// Flatten into the argument list handed to the compositor
    pub fn resolve(&self, ctx: &ArgContext<'_>) -> Vec<String> {
        let mut args = Vec::with_capacity(self.tokens.len() + ctx.view.frames.len());
        for token in &self.tokens {
            token.emit(ctx, &mut args);
        }
        args
    }
}

impl Default for ArgumentTemplate {
    fn default() -> Self {
        Self::standard()
    }
}

fn path_operand(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// One `-draw` pair per enabled background that is present locally
///
/// The base `background` layer always comes first; the others follow in
/// [`BackgroundKind`](crate::filename::BackgroundKind) order.
pub fn background_layers(ctx: &ArgContext<'_>) -> Vec<String> {
    let mut layers: Vec<_> = ctx
        .view
        .backgrounds
        .iter()
        .filter(|(kind, _)| ctx.settings.backgrounds.is_enabled(**kind))
        .collect();
    layers.sort_by_key(|(kind, _)| !kind.is_base());

    layers
        .into_iter()
        .flat_map(|(_, path)| {
            [
                "-draw".to_string(),
                format!("image DstOver 0,0,0,0 '{}'", path_operand(path)),
            ]
        })
        .collect()
}

/// Frame paths in the view's chronological order
pub fn frame_operands(ctx: &ArgContext<'_>) -> Vec<String> {
    ctx.view.frames.iter().map(|p| path_operand(p)).collect()
}
