//! Fragment registry and template composition for the ray-marched viewer.
//!
//! A shader directory holds a base `template.glsl` plus one subdirectory per
//! fragment kind. Each fragment file becomes a keyed entry in a
//! [`FragmentRegistry`]; a [`ShaderTemplate`] then splices one fractal, one
//! coloring, and one render-mode fragment into the template to produce the
//! final fragment shader handed to the renderer.
//!
//! Types:
//!
//! - `FragmentKind` names the four interchangeable fragment families and the
//!   directory each one is discovered from.
//! - `Selection` is the (fractal, coloring, render mode) tuple that fully
//!   determines a composed shader; it doubles as the cache key upstream.
//! - `ShaderLibrary` bundles a loaded registry with its validated template.
//!
//! Functions:
//!
//! - `format_display_name` turns a fragment key into a UI label.
//! - `strip_order_prefix` removes the numeric ordering prefix from file stems.
mod error;
mod naming;
mod registry;
mod template;

pub use error::ComposeError;
pub use naming::{format_display_name, strip_order_prefix};
pub use registry::{FragmentEntry, FragmentRegistry, ShaderLibrary};
pub use template::{ShaderTemplate, PLACEHOLDERS};

use std::fmt;

/// The interchangeable fragment families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FragmentKind {
    Fractal,
    Coloring,
    Effect,
    RenderMode,
}

impl FragmentKind {
    pub const ALL: [FragmentKind; 4] = [
        FragmentKind::Fractal,
        FragmentKind::Coloring,
        FragmentKind::Effect,
        FragmentKind::RenderMode,
    ];

    /// Subdirectory of the shader root holding this kind's fragments.
    pub fn directory(self) -> &'static str {
        match self {
            FragmentKind::Fractal => "fractals",
            FragmentKind::Coloring => "colorings",
            FragmentKind::Effect => "effects",
            FragmentKind::RenderMode => "render-modes",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FragmentKind::Fractal => "fractal",
            FragmentKind::Coloring => "coloring",
            FragmentKind::Effect => "effect",
            FragmentKind::RenderMode => "render mode",
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fragment keys that together determine one composed shader.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    pub fractal: String,
    pub coloring: String,
    pub render_mode: String,
}

impl Selection {
    pub fn new(
        fractal: impl Into<String>,
        coloring: impl Into<String>,
        render_mode: impl Into<String>,
    ) -> Self {
        Self {
            fractal: fractal.into(),
            coloring: coloring.into(),
            render_mode: render_mode.into(),
        }
    }

    /// Key selected for a template-substituted kind; effects are not part of
    /// the selection.
    pub fn key(&self, kind: FragmentKind) -> Option<&str> {
        match kind {
            FragmentKind::Fractal => Some(&self.fractal),
            FragmentKind::Coloring => Some(&self.coloring),
            FragmentKind::RenderMode => Some(&self.render_mode),
            FragmentKind::Effect => None,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.fractal, self.coloring, self.render_mode)
    }
}
