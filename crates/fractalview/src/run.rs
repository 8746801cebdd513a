use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use composer::{FragmentKind, ShaderLibrary};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use viewconfig::ViewerConfig;
use viewer::stereo::StereoStrategy;
use viewer::{FaceTracker, StereoState, Viewer};

use crate::cli::{Cli, Command, RunArgs, TrackerSource};
use crate::headless::HeadlessRenderer;
use crate::paths::AppPaths;
use crate::script::InputScript;
use crate::tracker::{ReplayTracker, SimulatedTracker};

pub fn run(cli: Cli) -> Result<()> {
    initialise_tracing();

    let paths = AppPaths::discover()?;
    tracing::debug!(
        config = %paths.config_dir().display(),
        data = %paths.data_dir().display(),
        "resolved fractalview paths"
    );

    match cli.command {
        Some(Command::List) => list_fragments(&cli.run, &paths),
        Some(Command::Config) => print_config(&cli.run, &paths),
        Some(Command::Where) => {
            print_paths(&paths);
            Ok(())
        }
        Some(Command::Run) | None => run_frames(&cli.run, &paths),
    }
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout is reserved for listings and summaries
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Reads the config file (explicit path, else the default location when it
/// exists, else built-in defaults) and applies command-line overrides.
fn load_config(args: &RunArgs, paths: &AppPaths) -> Result<ViewerConfig> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => {
            let default = paths.config_file();
            if default.is_file() {
                read_config(&default)?
            } else {
                tracing::debug!(path = %default.display(), "no config file; using defaults");
                ViewerConfig::default()
            }
        }
    };

    if let Some(fractal) = &args.fractal {
        config.default_fractal = Some(fractal.clone());
    }
    if let Some(coloring) = &args.coloring {
        config.session.coloring = Some(coloring.clone());
    }
    if let Some(effect) = &args.effect {
        config.session.effect = Some(effect.clone());
    }
    if let Some(render_mode) = &args.render_mode {
        config.session.render_mode = Some(render_mode.clone());
    }
    config.session.animate |= args.animate;
    config.session.stereo |= args.stereo;
    config.variants.restore_camera |= args.restore_camera;

    config
        .validate()
        .context("invalid configuration after command-line overrides")?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<ViewerConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = ViewerConfig::from_toml_str(&raw)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    tracing::info!(path = %path.display(), "loaded viewer config");
    Ok(config)
}

fn load_library(args: &RunArgs, paths: &AppPaths) -> Result<ShaderLibrary> {
    let root = paths.resolve_shader_dir(args.shaders.as_deref())?;
    let library = ShaderLibrary::load(&root)
        .with_context(|| format!("failed to load shaders from {}", root.display()))?;
    tracing::info!(root = %root.display(), "loaded shader library");
    Ok(library)
}

fn build_tracker(args: &RunArgs, config: &ViewerConfig) -> Result<Option<Box<dyn FaceTracker>>> {
    let landmarks = StereoStrategy::from_config(&config.stereo).landmarks();
    let tracker: Option<Box<dyn FaceTracker>> = match &args.tracker {
        TrackerSource::None => None,
        TrackerSource::Simulated => Some(Box::new(SimulatedTracker::new(args.seed, landmarks))),
        TrackerSource::Replay(path) => Some(Box::new(ReplayTracker::load(path, landmarks)?)),
    };
    Ok(tracker)
}

fn run_frames(args: &RunArgs, paths: &AppPaths) -> Result<()> {
    if !(args.fps.is_finite() && args.fps > 0.0) {
        bail!("--fps must be a positive number, got {}", args.fps);
    }
    let dt = 1.0 / args.fps;

    let config = load_config(args, paths)?;
    let library = load_library(args, paths)?;
    if let Some(fractal) = &args.fractal {
        if !library.registry().contains(FragmentKind::Fractal, fractal) {
            let known: Vec<_> = library.registry().keys(FragmentKind::Fractal).collect();
            bail!(
                "fractal '{fractal}' is not registered; available: {}",
                known.join(", ")
            );
        }
    }

    let script = match &args.script {
        Some(path) => InputScript::load(path)?,
        None => InputScript::default(),
    };
    if !script.is_empty() {
        tracing::info!(events = script.len(), "loaded input script");
    }

    let tracker = build_tracker(args, &config)?;
    let mut renderer = HeadlessRenderer::new(args.dump_shaders.clone())?;
    let mut viewer = Viewer::new(library, &config, tracker).context("failed to start viewer")?;
    let (width, height) = args.size;
    viewer.resize(width, height, &mut renderer);

    let mut failed_edits = 0;
    let mut stereo = viewer.stereo_state();
    for index in 0..args.frames {
        for event in script.events_at(index) {
            event.apply(&mut viewer, &mut renderer);
        }
        let report = viewer.frame(dt, &mut renderer)?;
        failed_edits += report.failed_edits;
        if report.stereo != stereo {
            tracing::info!(frame = report.index, from = %stereo, to = %report.stereo, "stereo state changed");
            stereo = report.stereo;
        }
    }

    tracing::info!(
        frames = renderer.frames(),
        revision = viewer.pipeline().revision(),
        failed_edits,
        "run complete"
    );

    if args.summary {
        let summary = RunSummary::collect(&viewer, &renderer, failed_edits);
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("failed to encode run summary")?
        );
    }
    Ok(())
}

fn list_fragments(args: &RunArgs, paths: &AppPaths) -> Result<()> {
    let library = load_library(args, paths)?;
    let registry = library.registry();
    for kind in FragmentKind::ALL {
        println!("{}:", kind.directory());
        let entries = registry.entries(kind);
        if entries.is_empty() {
            println!("  (none)");
        }
        for entry in entries {
            println!("  {:<24} {}", entry.key(), entry.label());
        }
    }
    Ok(())
}

fn print_config(args: &RunArgs, paths: &AppPaths) -> Result<()> {
    let config = load_config(args, paths)?;
    let rendered = toml::to_string_pretty(&config).context("failed to encode configuration")?;
    print!("{rendered}");
    Ok(())
}

fn print_paths(paths: &AppPaths) {
    println!("config dir:  {}", paths.config_dir().display());
    println!("config file: {}", paths.config_file().display());
    println!("data dir:    {}", paths.data_dir().display());
    for root in paths.shader_roots() {
        let marker = if root.is_dir() { "" } else { " (missing)" };
        println!("shaders:     {}{marker}", root.display());
    }
}

#[derive(Debug, Serialize)]
struct RunSummary {
    frames: u64,
    time: f64,
    fractal: String,
    coloring: String,
    effect: String,
    render_mode: String,
    shader_revision: u64,
    effect_revision: u64,
    compiled_shaders: usize,
    shaders_written: usize,
    failed_edits: usize,
    stereo: String,
    animate: bool,
    camera: CameraSummary,
    power: f64,
    constant: [f64; 4],
    iterations: u32,
    steps: u32,
}

#[derive(Debug, Serialize)]
struct CameraSummary {
    position: [f64; 3],
    forward: [f64; 3],
    up: [f64; 3],
    right: [f64; 3],
    fov: f64,
    yaw: f64,
    pitch: f64,
}

impl RunSummary {
    fn collect(viewer: &Viewer, renderer: &HeadlessRenderer, failed_edits: usize) -> Self {
        let state = viewer.state();
        let camera = &state.uniforms.camera;
        Self {
            frames: renderer.frames(),
            time: state.time,
            fractal: state.config.fractal.clone(),
            coloring: state.config.coloring.clone(),
            effect: state.config.effect.clone(),
            render_mode: state.config.render_mode.clone(),
            shader_revision: viewer.pipeline().revision(),
            effect_revision: viewer.effect_revision(),
            compiled_shaders: viewer.pipeline().cached(),
            shaders_written: renderer.shaders_written(),
            failed_edits,
            stereo: stereo_label(viewer.stereo_state(), state.config.stereo),
            animate: state.config.animate,
            camera: CameraSummary {
                position: camera.position.to_array(),
                forward: camera.forward.to_array(),
                up: camera.up.to_array(),
                right: camera.right.to_array(),
                fov: camera.fov,
                yaw: camera.yaw(),
                pitch: camera.pitch(),
            },
            power: state.uniforms.power,
            constant: state.uniforms.constant.to_array(),
            iterations: state.uniforms.iterations,
            steps: state.uniforms.steps,
        }
    }
}

fn stereo_label(state: StereoState, enabled: bool) -> String {
    if enabled || state != StereoState::Idle {
        state.to_string()
    } else {
        "off".to_string()
    }
}
