//! JSON input timelines.
//!
//! A script is a list of events keyed by the frame they fire on:
//!
//! ```json
//! [
//!   { "frame": 0, "type": "capture", "captured": true },
//!   { "frame": 5, "type": "look", "dx": 40, "dy": -10 },
//!   { "frame": 10, "type": "control", "control": "power", "value": 6.0 },
//!   { "frame": 20, "type": "select", "kind": "fractal", "key": "mandelbulb" }
//! ]
//! ```
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use composer::FragmentKind;
use serde::Deserialize;
use tracing::{debug, warn};
use viewer::{ControlId, Edit, RenderTarget, Viewer};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptEvent {
    Capture { captured: bool },
    Look { dx: f64, dy: f64 },
    KeyDown { key: String },
    KeyUp { key: String },
    Control { control: String, value: f64 },
    Select { kind: String, key: String },
    Animate { enabled: bool },
    Stereo { enabled: bool },
    Resize { width: u32, height: u32 },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimedEvent {
    pub frame: u64,
    #[serde(flatten)]
    pub event: ScriptEvent,
}

#[derive(Debug, Clone, Default)]
pub struct InputScript {
    events: Vec<TimedEvent>,
}

impl InputScript {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("invalid script {}", path.display()))
    }

    /// Parses and checks a timeline. Events keep file order within a frame.
    pub fn from_json_str(input: &str) -> Result<Self> {
        let mut events: Vec<TimedEvent> = serde_json::from_str(input)?;
        for (index, timed) in events.iter().enumerate() {
            match &timed.event {
                ScriptEvent::Control { control, .. } => {
                    ControlId::from_str(control)
                        .map_err(|err| anyhow!("event {index}: {err}"))?;
                }
                ScriptEvent::Select { kind, .. } => {
                    parse_kind(kind).map_err(|err| anyhow!("event {index}: {err}"))?;
                }
                _ => {}
            }
        }
        events.sort_by_key(|timed| timed.frame);
        Ok(Self { events })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events_at(&self, frame: u64) -> impl Iterator<Item = &ScriptEvent> {
        let start = self.events.partition_point(|timed| timed.frame < frame);
        self.events[start..]
            .iter()
            .take_while(move |timed| timed.frame == frame)
            .map(|timed| &timed.event)
    }
}

impl ScriptEvent {
    pub fn apply(&self, viewer: &mut Viewer, target: &mut dyn RenderTarget) {
        debug!(event = ?self, "script event");
        match self {
            ScriptEvent::Capture { captured } => viewer.set_pointer_captured(*captured),
            ScriptEvent::Look { dx, dy } => viewer.pointer_moved(*dx, *dy),
            ScriptEvent::KeyDown { key } => viewer.key_down(key),
            ScriptEvent::KeyUp { key } => viewer.key_up(key),
            ScriptEvent::Control { control, value } => match ControlId::from_str(control) {
                Ok(id) => {
                    if !viewer.commit_control(id, *value) {
                        warn!(control = %id, value, "control rejected value");
                    }
                }
                Err(err) => warn!(error = %err, "skipping control event"),
            },
            ScriptEvent::Select { kind, key } => match parse_kind(kind) {
                Ok(kind) => viewer.queue_edit(select_edit(kind, key.clone())),
                Err(err) => warn!(error = %err, "skipping select event"),
            },
            ScriptEvent::Animate { enabled } => viewer.queue_edit(Edit::Animate(*enabled)),
            ScriptEvent::Stereo { enabled } => viewer.queue_edit(Edit::Stereo(*enabled)),
            ScriptEvent::Resize { width, height } => viewer.resize(*width, *height, target),
        }
    }
}

fn parse_kind(value: &str) -> Result<FragmentKind, String> {
    let normalized = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
    FragmentKind::ALL
        .into_iter()
        .find(|kind| kind.as_str().replace(' ', "_") == normalized)
        .ok_or_else(|| {
            format!("unknown fragment kind '{value}'; expected fractal, coloring, effect, or render_mode")
        })
}

fn select_edit(kind: FragmentKind, key: String) -> Edit {
    match kind {
        FragmentKind::Fractal => Edit::SelectFractal(key),
        FragmentKind::Coloring => Edit::SelectColoring(key),
        FragmentKind::Effect => Edit::SelectEffect(key),
        FragmentKind::RenderMode => Edit::SelectRenderMode(key),
    }
}
