use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, trace};
use viewer::{Frame, RenderTarget};

/// Render target that rasterizes nothing. It records what a GPU backend
/// would have been asked to do and optionally writes each newly composed
/// shader to disk.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    dump_dir: Option<PathBuf>,
    last_revisions: Option<(u64, u64)>,
    frames: u64,
    shaders_written: usize,
    size: Option<(u32, u32)>,
}

impl HeadlessRenderer {
    pub fn new(dump_dir: Option<PathBuf>) -> Result<Self> {
        if let Some(dir) = &dump_dir {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create shader dump directory {}", dir.display()))?;
        }
        Ok(Self {
            dump_dir,
            ..Self::default()
        })
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn shaders_written(&self) -> usize {
        self.shaders_written
    }

    fn dump(&mut self, dir: &Path, frame: &Frame<'_>) -> Result<()> {
        let stem = format!(
            "{:05}-rev{}-fx{}",
            frame.index, frame.shader_revision, frame.effect_revision
        );
        let fragment = dir.join(format!("{stem}.frag"));
        fs::write(&fragment, frame.fractal_source)
            .with_context(|| format!("failed to write {}", fragment.display()))?;
        let effect = dir.join(format!("{stem}.effect.frag"));
        fs::write(&effect, frame.effect_source)
            .with_context(|| format!("failed to write {}", effect.display()))?;
        if let Some(vertex) = frame.vertex_source {
            let path = dir.join(format!("{stem}.vert"));
            fs::write(&path, vertex)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        self.shaders_written += 1;
        debug!(path = %fragment.display(), "wrote composed shader");
        Ok(())
    }
}

impl RenderTarget for HeadlessRenderer {
    fn render(&mut self, frame: &Frame<'_>) -> Result<()> {
        let revisions = (frame.shader_revision, frame.effect_revision);
        if self.last_revisions != Some(revisions) {
            info!(
                frame = frame.index,
                revision = frame.shader_revision,
                effect_revision = frame.effect_revision,
                bytes = frame.fractal_source.len(),
                "shader program changed"
            );
            if let Some(dir) = self.dump_dir.clone() {
                self.dump(&dir, frame)?;
            }
            self.last_revisions = Some(revisions);
        }

        let uniforms = &frame.uniforms;
        let block = uniforms.block();
        debug!(
            frame = frame.index,
            time = uniforms.time,
            position = ?uniforms.position,
            forward = ?uniforms.forward,
            stereo = uniforms.stereo,
            block_bytes = std::mem::size_of_val(&block),
            "frame"
        );
        for (name, value) in uniforms.entries() {
            trace!(frame = frame.index, uniform = name, value = ?value);
        }

        self.frames += 1;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.size != Some((width, height)) {
            info!(width, height, "surface resized");
            self.size = Some((width, height));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{DVec2, DVec3};
    use tempfile::TempDir;
    use viewer::{CameraPose, FractalUniforms, RenderPose, SessionConfig, UniformBundle, ViewerState};

    fn uniforms() -> UniformBundle {
        let config = viewconfig::ViewerConfig::default();
        let selection = composer::Selection::new("example-fractal", "flat", "shaded");
        let session = SessionConfig::from_config(&config, &selection, "none".into());
        let mut state = ViewerState::new(session, FractalUniforms::default());
        state.resolution = DVec2::new(64.0, 48.0);
        let pose = CameraPose::looking(DVec3::new(-3.0, 0.0, 0.0), DVec3::X, 1.5).unwrap();
        UniformBundle::from_state(&state, &RenderPose::base(pose))
    }

    fn frame<'a>(index: u64, revision: u64, source: &'a str) -> Frame<'a> {
        Frame {
            index,
            fractal_source: source,
            vertex_source: Some("void main() {}"),
            effect_source: "// none",
            shader_revision: revision,
            effect_revision: 1,
            uniforms: uniforms(),
        }
    }

    #[test]
    fn dumps_only_when_revision_changes() {
        let dir = TempDir::new().unwrap();
        let dump = dir.path().join("dump");
        let mut renderer = HeadlessRenderer::new(Some(dump.clone())).unwrap();

        renderer.render(&frame(0, 1, "// first")).unwrap();
        renderer.render(&frame(1, 1, "// first")).unwrap();
        renderer.render(&frame(2, 2, "// second")).unwrap();

        assert_eq!(renderer.frames(), 3);
        assert_eq!(renderer.shaders_written(), 2);
        assert_eq!(
            fs::read_to_string(dump.join("00002-rev2-fx1.frag")).unwrap(),
            "// second"
        );
        assert!(dump.join("00000-rev1-fx1.vert").exists());
        assert!(!dump.join("00001-rev1-fx1.frag").exists());
    }

    #[test]
    fn dumps_when_only_the_effect_changes() {
        let dir = TempDir::new().unwrap();
        let mut renderer = HeadlessRenderer::new(Some(dir.path().to_path_buf())).unwrap();

        renderer.render(&frame(0, 1, "// shader")).unwrap();
        let vignette = Frame {
            effect_source: "// vignette",
            effect_revision: 2,
            ..frame(1, 1, "// shader")
        };
        renderer.render(&vignette).unwrap();
        renderer.render(&Frame { index: 2, ..vignette.clone() }).unwrap();

        assert_eq!(renderer.shaders_written(), 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("00001-rev1-fx2.effect.frag")).unwrap(),
            "// vignette"
        );
    }

    #[test]
    fn renders_without_dump_directory() {
        let mut renderer = HeadlessRenderer::new(None).unwrap();
        renderer.resize(10, 10);
        renderer.render(&frame(0, 1, "// only")).unwrap();
        assert_eq!(renderer.frames(), 1);
        assert_eq!(renderer.shaders_written(), 0);
    }
}
