use std::collections::HashMap;

use composer::{ComposeError, FragmentKind, Selection, ShaderLibrary};
use tracing::{debug, error, info};

/// Composed-shader cache in front of a [`ShaderLibrary`].
///
/// Composition is deterministic, so results are cached per selection. A
/// failed rebuild leaves the previously active source in place.
#[derive(Debug)]
pub struct ShaderPipeline {
    library: ShaderLibrary,
    cache: HashMap<Selection, String>,
    active: Selection,
    revision: u64,
}

impl ShaderPipeline {
    pub fn new(library: ShaderLibrary, initial: Selection) -> Result<Self, ComposeError> {
        let source = library.compose(&initial)?;
        info!(selection = %initial, bytes = source.len(), "composed initial shader");
        let mut cache = HashMap::new();
        cache.insert(initial.clone(), source);
        Ok(Self {
            library,
            cache,
            active: initial,
            revision: 1,
        })
    }

    /// Makes `selection` active, composing it on a cache miss.
    ///
    /// Returns `Ok(true)` when the active source changed.
    pub fn select(&mut self, selection: &Selection) -> Result<bool, ComposeError> {
        if *selection == self.active {
            return Ok(false);
        }

        if self.cache.contains_key(selection) {
            debug!(selection = %selection, "composed shader cache hit");
        } else {
            match self.library.compose(selection) {
                Ok(source) => {
                    debug!(selection = %selection, bytes = source.len(), "composed shader");
                    self.cache.insert(selection.clone(), source);
                }
                Err(err) => {
                    error!(
                        selection = %selection,
                        active = %self.active,
                        error = %err,
                        "shader rebuild failed; keeping active shader"
                    );
                    return Err(err);
                }
            }
        }

        self.active = selection.clone();
        self.revision += 1;
        Ok(true)
    }

    pub fn active_selection(&self) -> &Selection {
        &self.active
    }

    pub fn active_source(&self) -> &str {
        self.cache
            .get(&self.active)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Incremented whenever the active source changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn effect_source(&self, key: &str) -> Result<&str, ComposeError> {
        self.library.registry().source(FragmentKind::Effect, key)
    }

    pub fn library(&self) -> &ShaderLibrary {
        &self.library
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use composer::{FragmentRegistry, ShaderTemplate};

    use super::*;

    fn library() -> ShaderLibrary {
        let template =
            ShaderTemplate::parse("#pragma fractal\n#pragma coloring\n#pragma render_mode\n")
                .unwrap();
        let mut registry = FragmentRegistry::new();
        for (kind, key) in [
            (FragmentKind::Fractal, "example-fractal"),
            (FragmentKind::Fractal, "mandelbulb"),
            (FragmentKind::Coloring, "flat"),
            (FragmentKind::Coloring, "neon"),
            (FragmentKind::RenderMode, "shaded"),
            (FragmentKind::Effect, "none"),
        ] {
            registry.register(kind, key, format!("// {key}")).unwrap();
        }
        ShaderLibrary::new(template, registry)
    }

    #[test]
    fn caches_by_selection_and_bumps_revision() {
        let initial = Selection::new("example-fractal", "flat", "shaded");
        let mut pipeline = ShaderPipeline::new(library(), initial.clone()).unwrap();
        assert_eq!(pipeline.revision(), 1);
        assert!(!pipeline.select(&initial).unwrap());

        let bulb = Selection::new("mandelbulb", "flat", "shaded");
        assert!(pipeline.select(&bulb).unwrap());
        assert!(pipeline.active_source().starts_with("// mandelbulb\n"));
        assert!(pipeline.select(&initial).unwrap());
        assert_eq!(pipeline.cached(), 2);
        assert_eq!(pipeline.revision(), 3);
    }

    #[test]
    fn failed_rebuild_keeps_previous_source() {
        let initial = Selection::new("example-fractal", "neon", "shaded");
        let mut pipeline = ShaderPipeline::new(library(), initial.clone()).unwrap();
        let before = pipeline.active_source().to_string();

        let broken = Selection::new("example-fractal", "neon", "wireframe");
        assert!(matches!(
            pipeline.select(&broken),
            Err(ComposeError::UnknownFragment { kind: FragmentKind::RenderMode, .. })
        ));
        assert_eq!(pipeline.active_selection(), &initial);
        assert_eq!(pipeline.active_source(), before);
        assert_eq!(pipeline.revision(), 1);
    }

    #[test]
    fn effect_lookup_is_checked() {
        let pipeline =
            ShaderPipeline::new(library(), Selection::new("example-fractal", "flat", "shaded"))
                .unwrap();
        assert_eq!(pipeline.effect_source("none").unwrap(), "// none");
        assert!(pipeline.effect_source("bloom").is_err());
    }
}
