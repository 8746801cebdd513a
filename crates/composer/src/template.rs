use crate::error::ComposeError;
use crate::registry::FragmentRegistry;
use crate::{FragmentKind, Selection};

/// Required placeholder lines and the fragment kind substituted for each.
///
/// A placeholder must occupy a line of its own (surrounding whitespace is
/// ignored) and appear exactly once in the template.
pub const PLACEHOLDERS: [(FragmentKind, &str); 3] = [
    (FragmentKind::Fractal, "#pragma fractal"),
    (FragmentKind::Coloring, "#pragma coloring"),
    (FragmentKind::RenderMode, "#pragma render_mode"),
];

/// Base fragment shader whose placeholders have been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderTemplate {
    source: String,
}

impl ShaderTemplate {
    pub fn parse(source: impl Into<String>) -> Result<Self, ComposeError> {
        let source = source.into();
        for (_, token) in PLACEHOLDERS {
            let count = source
                .lines()
                .filter(|line| line.trim() == token)
                .count();
            match count {
                0 => return Err(ComposeError::MissingPlaceholder(token)),
                1 => {}
                count => return Err(ComposeError::RepeatedPlaceholder { token, count }),
            }
        }
        Ok(Self { source })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Splices the selected fragments into the template.
    ///
    /// Every fragment is resolved before any output is produced, so an
    /// unknown key yields an error and never a partially substituted shader.
    /// Output is a pure function of the template, registry, and selection.
    pub fn compose(
        &self,
        registry: &FragmentRegistry,
        selection: &Selection,
    ) -> Result<String, ComposeError> {
        let fractal = registry.source(FragmentKind::Fractal, &selection.fractal)?;
        let coloring = registry.source(FragmentKind::Coloring, &selection.coloring)?;
        let render_mode = registry.source(FragmentKind::RenderMode, &selection.render_mode)?;

        let mut composed = String::with_capacity(
            self.source.len() + fractal.len() + coloring.len() + render_mode.len(),
        );
        for line in self.source.split_inclusive('\n') {
            let fragment = match placeholder_kind(line) {
                Some(FragmentKind::Fractal) => fractal,
                Some(FragmentKind::Coloring) => coloring,
                Some(FragmentKind::RenderMode) => render_mode,
                Some(FragmentKind::Effect) | None => {
                    composed.push_str(line);
                    continue;
                }
            };
            composed.push_str(fragment);
            if line.ends_with('\n') && !fragment.ends_with('\n') {
                composed.push('\n');
            }
        }
        Ok(composed)
    }
}

fn placeholder_kind(line: &str) -> Option<FragmentKind> {
    let trimmed = line.trim();
    PLACEHOLDERS
        .iter()
        .find(|(_, token)| *token == trimmed)
        .map(|(kind, _)| *kind)
}
