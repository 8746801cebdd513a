//! Discovers shader fragments on disk and keeps them keyed per kind.
//!
//! Entries are stored in display order, which is the lexicographic order of
//! the raw file path (so `01-foo.glsl` sorts before `02-bar.glsl`). Keys drop
//! the numeric prefix; two files mapping onto the same key or the same display
//! label are rejected at load time rather than shadowing each other.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ComposeError;
use crate::naming::{format_display_name, strip_order_prefix};
use crate::template::ShaderTemplate;
use crate::{FragmentKind, Selection};

const FRAGMENT_EXTENSION: &str = "glsl";
const TEMPLATE_FILE: &str = "template.glsl";
const VERTEX_FILE: &str = "vertex.glsl";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentEntry {
    key: String,
    label: String,
    origin: String,
    source: String,
}

impl FragmentEntry {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Raw path (or key, for programmatic registrations) used for ordering.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

#[derive(Debug, Clone, Default)]
pub struct FragmentRegistry {
    kinds: BTreeMap<FragmentKind, Vec<FragmentEntry>>,
}

impl FragmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fragment that did not come from disk.
    pub fn register(
        &mut self,
        kind: FragmentKind,
        key: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<(), ComposeError> {
        let key = key.into();
        let entry = FragmentEntry {
            label: format_display_name(&key),
            origin: key.clone(),
            key,
            source: source.into(),
        };
        self.insert(kind, entry)
    }

    /// Scans `<root>/<kind directory>/*.glsl` for every kind.
    ///
    /// Missing kind directories are skipped; callers decide which kinds they
    /// require.
    pub fn load_dir(root: impl AsRef<Path>) -> Result<Self, ComposeError> {
        let root = root.as_ref();
        let mut registry = Self::new();
        for kind in FragmentKind::ALL {
            let dir = root.join(kind.directory());
            if !dir.is_dir() {
                debug!(kind = %kind, dir = %dir.display(), "fragment directory absent");
                continue;
            }

            for path in list_fragment_files(&dir)? {
                let key = fragment_key(&path)?;
                let source = read_source(&path)?;
                let entry = FragmentEntry {
                    label: format_display_name(&key),
                    origin: path.to_string_lossy().into_owned(),
                    key,
                    source,
                };
                debug!(kind = %kind, key = %entry.key, path = %path.display(), "registered fragment");
                registry.insert(kind, entry)?;
            }
        }
        Ok(registry)
    }

    fn insert(&mut self, kind: FragmentKind, entry: FragmentEntry) -> Result<(), ComposeError> {
        let entries = self.kinds.entry(kind).or_default();
        for existing in entries.iter() {
            if existing.key == entry.key {
                return Err(ComposeError::DuplicateKey {
                    kind,
                    key: entry.key,
                    first: existing.origin.clone(),
                    second: entry.origin,
                });
            }
            if existing.label == entry.label {
                return Err(ComposeError::LabelCollision {
                    kind,
                    label: entry.label,
                    first: existing.origin.clone(),
                    second: entry.origin,
                });
            }
        }
        let position = entries.partition_point(|existing| existing.origin <= entry.origin);
        entries.insert(position, entry);
        Ok(())
    }

    pub fn get(&self, kind: FragmentKind, key: &str) -> Option<&FragmentEntry> {
        self.entries(kind).iter().find(|entry| entry.key == key)
    }

    pub fn contains(&self, kind: FragmentKind, key: &str) -> bool {
        self.get(kind, key).is_some()
    }

    /// Checked lookup of a fragment's source text.
    pub fn source(&self, kind: FragmentKind, key: &str) -> Result<&str, ComposeError> {
        self.get(kind, key)
            .map(FragmentEntry::source)
            .ok_or_else(|| ComposeError::UnknownFragment {
                kind,
                key: key.to_string(),
            })
    }

    /// Entries of one kind in display order.
    pub fn entries(&self, kind: FragmentKind) -> &[FragmentEntry] {
        self.kinds.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn keys(&self, kind: FragmentKind) -> impl Iterator<Item = &str> {
        self.entries(kind).iter().map(FragmentEntry::key)
    }

    pub fn first_key(&self, kind: FragmentKind) -> Option<&str> {
        self.keys(kind).next()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.values().all(Vec::is_empty)
    }
}

/// A loaded fragment registry together with its validated base template.
#[derive(Debug, Clone)]
pub struct ShaderLibrary {
    root: PathBuf,
    template: ShaderTemplate,
    vertex: Option<String>,
    registry: FragmentRegistry,
}

impl ShaderLibrary {
    pub fn new(template: ShaderTemplate, registry: FragmentRegistry) -> Self {
        Self {
            root: PathBuf::new(),
            template,
            vertex: None,
            registry,
        }
    }

    /// Loads `template.glsl`, the optional `vertex.glsl`, and every fragment
    /// directory under `root`.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, ComposeError> {
        let root = root.as_ref().to_path_buf();
        let template_path = root.join(TEMPLATE_FILE);
        if !template_path.is_file() {
            return Err(ComposeError::TemplateMissing(template_path));
        }
        let template = ShaderTemplate::parse(read_source(&template_path)?)?;

        let vertex_path = root.join(VERTEX_FILE);
        let vertex = if vertex_path.is_file() {
            Some(read_source(&vertex_path)?)
        } else {
            None
        };

        let registry = FragmentRegistry::load_dir(&root)?;
        debug!(
            root = %root.display(),
            fractals = registry.entries(FragmentKind::Fractal).len(),
            colorings = registry.entries(FragmentKind::Coloring).len(),
            effects = registry.entries(FragmentKind::Effect).len(),
            render_modes = registry.entries(FragmentKind::RenderMode).len(),
            "loaded shader library"
        );

        Ok(Self {
            root,
            template,
            vertex,
            registry,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn template(&self) -> &ShaderTemplate {
        &self.template
    }

    pub fn vertex_source(&self) -> Option<&str> {
        self.vertex.as_deref()
    }

    pub fn registry(&self) -> &FragmentRegistry {
        &self.registry
    }

    pub fn compose(&self, selection: &Selection) -> Result<String, ComposeError> {
        self.template.compose(&self.registry, selection)
    }
}

fn list_fragment_files(dir: &Path) -> Result<Vec<PathBuf>, ComposeError> {
    let read_dir = fs::read_dir(dir).map_err(|source| ComposeError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|source| ComposeError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_fragment = path.is_file()
            && path.extension().and_then(|ext| ext.to_str()) == Some(FRAGMENT_EXTENSION);
        if is_fragment {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn fragment_key(path: &Path) -> Result<String, ComposeError> {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| ComposeError::InvalidKey(path.to_path_buf()))?;
    let key = strip_order_prefix(stem.trim());
    if key.is_empty() {
        return Err(ComposeError::InvalidKey(path.to_path_buf()));
    }
    Ok(key.to_string())
}

fn read_source(path: &Path) -> Result<String, ComposeError> {
    fs::read_to_string(path).map_err(|source| ComposeError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "#version 300 es\n#pragma fractal\n#pragma coloring\nvoid main() {\n#pragma render_mode\n}\n";

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create dirs");
        }
        fs::write(path, contents).expect("write fragment");
    }

    fn demo_library(root: &Path) {
        write(root, "template.glsl", TEMPLATE);
        write(root, "fractals/02-mandelbulb.glsl", "float de_bulb(vec3 p);");
        write(root, "fractals/01-example-fractal.glsl", "float de_example(vec3 p);");
        write(root, "colorings/01-orbit-trap.glsl", "vec3 color_trap();");
        write(root, "effects/01-none.glsl", "void main() {}");
        write(root, "render-modes/01-shaded.glsl", "shade();");
        write(root, "fractals/README.md", "not a fragment");
    }

    #[test]
    fn discovers_fragments_in_path_order() {
        let temp = tempfile::tempdir().unwrap();
        demo_library(temp.path());

        let library = ShaderLibrary::load(temp.path()).expect("load library");
        let registry = library.registry();
        let fractals: Vec<_> = registry.keys(FragmentKind::Fractal).collect();
        assert_eq!(fractals, vec!["example-fractal", "mandelbulb"]);
        assert_eq!(
            registry.get(FragmentKind::Fractal, "mandelbulb").unwrap().label(),
            "Mandelbulb"
        );
        assert_eq!(registry.first_key(FragmentKind::Coloring), Some("orbit-trap"));
        assert!(library.vertex_source().is_none());
    }

    #[test]
    fn rejects_keys_that_collide_after_prefix_stripping() {
        let temp = tempfile::tempdir().unwrap();
        demo_library(temp.path());
        write(temp.path(), "fractals/05-mandelbulb.glsl", "float de_other(vec3 p);");

        let err = ShaderLibrary::load(temp.path()).unwrap_err();
        assert!(matches!(err, ComposeError::DuplicateKey { ref key, .. } if key == "mandelbulb"));
    }

    #[test]
    fn rejects_label_collisions() {
        let mut registry = FragmentRegistry::new();
        registry
            .register(FragmentKind::Coloring, "neon-lava", "a")
            .unwrap();
        let err = registry
            .register(FragmentKind::Coloring, "neon_lava", "b")
            .unwrap_err();
        assert!(matches!(err, ComposeError::LabelCollision { ref label, .. } if label == "Neon Lava"));
    }

    #[test]
    fn missing_template_is_reported() {
        let temp = tempfile::tempdir().unwrap();
        write(temp.path(), "fractals/01-example-fractal.glsl", "x");
        let err = ShaderLibrary::load(temp.path()).unwrap_err();
        assert!(matches!(err, ComposeError::TemplateMissing(_)));
    }

    #[test]
    fn unknown_key_lookup_is_an_error() {
        let registry = FragmentRegistry::new();
        let err = registry.source(FragmentKind::Effect, "bloom").unwrap_err();
        assert!(matches!(err, ComposeError::UnknownFragment { kind: FragmentKind::Effect, .. }));
    }
}
