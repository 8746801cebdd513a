use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "fractalview",
    author,
    version,
    about = "Headless ray-marched fractal viewer driver",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Shader directory holding `template.glsl` and the fragment folders.
    #[arg(long, value_name = "DIR", env = "FRACTALVIEW_SHADER_DIR")]
    pub shaders: Option<PathBuf>,

    /// Viewer configuration TOML (defaults to `fractalview.toml` in the config directory).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Fractal variant to start on.
    #[arg(long, value_name = "KEY")]
    pub fractal: Option<String>,

    /// Coloring fragment key.
    #[arg(long, value_name = "KEY")]
    pub coloring: Option<String>,

    /// Post-process effect key.
    #[arg(long, value_name = "KEY")]
    pub effect: Option<String>,

    /// Render mode fragment key.
    #[arg(long, value_name = "KEY")]
    pub render_mode: Option<String>,

    /// Number of frames to run.
    #[arg(long, value_name = "COUNT", default_value_t = 120)]
    pub frames: u64,

    /// Fixed timestep rate in frames per second.
    #[arg(long, value_name = "FPS", default_value_t = 60.0)]
    pub fps: f64,

    /// Render resolution (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size, default_value = "1280x720")]
    pub size: (u32, u32),

    /// JSON input timeline replayed against the frame loop.
    #[arg(long, value_name = "FILE")]
    pub script: Option<PathBuf>,

    /// Face tracker: `none`, `simulated`, or `replay:FILE`.
    #[arg(long, value_name = "SOURCE", value_parser = parse_tracker, default_value = "none")]
    pub tracker: TrackerSource,

    /// Seed for the simulated tracker.
    #[arg(long, value_name = "SEED", default_value_t = 0x5eed)]
    pub seed: u64,

    /// Enable stereo rendering from the first frame.
    #[arg(long)]
    pub stereo: bool,

    /// Enable fractal parameter animation.
    #[arg(long)]
    pub animate: bool,

    /// Restore the saved camera pose when switching back to a fractal.
    #[arg(long)]
    pub restore_camera: bool,

    /// Write every newly composed shader into this directory.
    #[arg(long, value_name = "DIR")]
    pub dump_shaders: Option<PathBuf>,

    /// Print a JSON summary of the final state to stdout.
    #[arg(long)]
    pub summary: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the frame loop (the default when no subcommand is given).
    Run,
    /// List registered fragments per kind in display order.
    List,
    /// Print the effective configuration as TOML.
    Config,
    /// Print resolved config and data directories.
    Where,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerSource {
    None,
    Simulated,
    Replay(PathBuf),
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let trimmed = value.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid size '{trimmed}'; expected WIDTHxHEIGHT"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width in '{trimmed}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height in '{trimmed}'"))?;
    if width == 0 || height == 0 {
        return Err("size dimensions must be non-zero".to_string());
    }
    Ok((width, height))
}

pub fn parse_tracker(value: &str) -> Result<TrackerSource, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("tracker source must not be empty".to_string());
    }

    if let Some(path) = trimmed.strip_prefix("replay:") {
        if path.is_empty() {
            return Err("replay tracker requires a file (replay:FILE)".to_string());
        }
        return Ok(TrackerSource::Replay(PathBuf::from(path)));
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "none" | "off" => Ok(TrackerSource::None),
        "simulated" | "sim" => Ok(TrackerSource::Simulated),
        other => Err(format!(
            "unknown tracker '{other}'; expected none, simulated, or replay:FILE"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sizes() {
        assert_eq!(parse_size("1280x720"), Ok((1280, 720)));
        assert_eq!(parse_size(" 64X48 "), Ok((64, 48)));
        assert!(parse_size("0x10").is_err());
        assert!(parse_size("wide").is_err());
    }

    #[test]
    fn parses_tracker_sources() {
        assert_eq!(parse_tracker("none"), Ok(TrackerSource::None));
        assert_eq!(parse_tracker("Simulated"), Ok(TrackerSource::Simulated));
        assert_eq!(
            parse_tracker("replay:faces.json"),
            Ok(TrackerSource::Replay(PathBuf::from("faces.json")))
        );
        assert!(parse_tracker("replay:").is_err());
        assert!(parse_tracker("webcam").is_err());
    }

    #[test]
    fn subcommand_shares_run_flags() {
        let cli = Cli::try_parse_from(["fractalview", "--shaders", "demo", "list"]).unwrap();
        assert!(matches!(cli.command, Some(Command::List)));
        assert_eq!(cli.run.shaders, Some(PathBuf::from("demo")));
        assert_eq!(cli.run.frames, 120);
    }
}
