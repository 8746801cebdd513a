use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Default fractal variant selected at startup when it is registered.
pub const DEFAULT_FRACTAL: &str = "example-fractal";

/// Points in a full face mesh including the iris landmarks. Configured
/// landmark indices must fall inside it.
pub const FACE_MESH_POINTS: usize = 478;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ViewerConfig {
    pub version: u32,
    #[serde(default = "default_fractal")]
    pub default_fractal: Option<String>,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub camera: CameraSection,
    #[serde(default)]
    pub fractal: FractalSection,
    #[serde(default)]
    pub animation: AnimationSection,
    #[serde(default)]
    pub stereo: StereoSection,
    #[serde(default)]
    pub variants: VariantSection,
    #[serde(default)]
    pub keys: KeySection,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            default_fractal: default_fractal(),
            session: SessionSection::default(),
            camera: CameraSection::default(),
            fractal: FractalSection::default(),
            animation: AnimationSection::default(),
            stereo: StereoSection::default(),
            variants: VariantSection::default(),
            keys: KeySection::default(),
        }
    }
}

fn default_fractal() -> Option<String> {
    Some(DEFAULT_FRACTAL.to_string())
}

/// Live session tunables; fragment keys fall back to the first registered
/// fragment of their kind when omitted.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionSection {
    pub time_speed: f64,
    pub movement_speed: f64,
    pub mouse_sensitivity: f64,
    pub effect_intensity: f64,
    pub coloring: Option<String>,
    pub effect: Option<String>,
    pub render_mode: Option<String>,
    pub animate: bool,
    pub stereo: bool,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            time_speed: 1.0,
            movement_speed: 1.0,
            mouse_sensitivity: 1.0,
            effect_intensity: 0.0,
            coloring: None,
            effect: None,
            render_mode: None,
            animate: false,
            stereo: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CameraSection {
    pub position: [f64; 3],
    pub forward: [f64; 3],
    pub fov: f64,
}

impl Default for CameraSection {
    fn default() -> Self {
        Self {
            position: [-3.0, 0.0, 0.0],
            forward: [1.0, 0.0, 0.0],
            fov: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FractalSection {
    pub power: f64,
    pub constant: [f64; 4],
    pub iterations: u32,
    pub steps: u32,
    pub accuracy: u32,
    pub bailout: f64,
    pub threshold: f64,
}

impl Default for FractalSection {
    fn default() -> Self {
        Self {
            power: 10.0,
            constant: [0.0; 4],
            iterations: 10,
            steps: 150,
            accuracy: 1,
            bailout: 5.0,
            threshold: 0.001,
        }
    }
}

/// `[min, max]` pairs for the animated fractal channels.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnimationSection {
    pub power: [f64; 2],
    pub constant_x: [f64; 2],
    pub constant_y: [f64; 2],
    pub constant_z: [f64; 2],
    pub constant_w: [f64; 2],
}

impl Default for AnimationSection {
    fn default() -> Self {
        Self {
            power: [4.0, 10.0],
            constant_x: [-1.0, 1.0],
            constant_y: [-1.0, 1.0],
            constant_z: [-1.0, 1.0],
            constant_w: [-1.0, 1.0],
        }
    }
}

impl AnimationSection {
    fn named_ranges(&self) -> [(&'static str, [f64; 2]); 5] {
        [
            ("power", self.power),
            ("constant_x", self.constant_x),
            ("constant_y", self.constant_y),
            ("constant_z", self.constant_z),
            ("constant_w", self.constant_w),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StereoStrategyKind {
    #[serde(alias = "parallax", alias = "holographic")]
    HeadParallax,
    Orbit,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StereoSection {
    pub strategy: StereoStrategyKind,
    /// Exponential smoothing blend applied to each tracked sample.
    pub smoothing: f64,
    pub parallax: ParallaxSection,
    pub orbit: OrbitSection,
}

impl Default for StereoSection {
    fn default() -> Self {
        Self {
            strategy: StereoStrategyKind::HeadParallax,
            smoothing: 0.25,
            parallax: ParallaxSection::default(),
            orbit: OrbitSection::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ParallaxSection {
    pub sensitivity: f64,
    pub depth_sensitivity: f64,
    pub focus_distance: f64,
    pub eye_separation: f64,
    pub landmarks: [usize; 2],
}

impl Default for ParallaxSection {
    fn default() -> Self {
        Self {
            sensitivity: 1.5,
            depth_sensitivity: 8.0,
            focus_distance: 3.0,
            eye_separation: 0.064,
            landmarks: [33, 263],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OrbitSection {
    pub yaw_range: f64,
    pub pitch_range: f64,
    pub zoom_sensitivity: f64,
    pub keystone: f64,
    pub min_radius: f64,
    pub landmarks: [usize; 2],
}

impl Default for OrbitSection {
    fn default() -> Self {
        Self {
            yaw_range: 1.2,
            pitch_range: 0.8,
            zoom_sensitivity: 12.0,
            keystone: 0.15,
            min_radius: 0.25,
            landmarks: [468, 473],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct VariantSection {
    /// Restore the saved camera pose when switching back to a fractal.
    pub restore_camera: bool,
}

/// Physical key names bound to each movement action.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct KeySection {
    pub forward: Vec<String>,
    pub back: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub up: Vec<String>,
    pub down: Vec<String>,
}

impl Default for KeySection {
    fn default() -> Self {
        Self {
            forward: vec!["w".into()],
            back: vec!["s".into()],
            left: vec!["a".into()],
            right: vec!["d".into()],
            up: vec!["space".into()],
            down: vec!["shift".into()],
        }
    }
}

impl KeySection {
    /// Bindings grouped by action name, in a fixed order.
    pub fn named(&self) -> [(&'static str, &[String]); 6] {
        [
            ("forward", &self.forward),
            ("back", &self.back),
            ("left", &self.left),
            ("right", &self.right),
            ("up", &self.up),
            ("down", &self.down),
        ]
    }
}

/// Canonical form of a physical key name (`Space` and `" "` both map to
/// `space`).
pub fn normalize_key_name(name: &str) -> String {
    if name == " " {
        return "space".to_string();
    }
    match name.trim().to_ascii_lowercase().as_str() {
        "spacebar" => "space".to_string(),
        "lshift" | "rshift" | "leftshift" | "rightshift" => "shift".to_string(),
        other => other.to_string(),
    }
}

impl ViewerConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: ViewerConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if let Some(fractal) = &self.default_fractal {
            if fractal.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "default_fractal may not be empty".into(),
                ));
            }
        }

        let session = &self.session;
        require_non_negative("session.time_speed", session.time_speed)?;
        require_non_negative("session.movement_speed", session.movement_speed)?;
        require_positive("session.mouse_sensitivity", session.mouse_sensitivity)?;
        if !(0.0..=1.0).contains(&session.effect_intensity) {
            return Err(ConfigError::Invalid(
                "session.effect_intensity must be within [0, 1]".into(),
            ));
        }
        for (field, key) in [
            ("coloring", &session.coloring),
            ("effect", &session.effect),
            ("render_mode", &session.render_mode),
        ] {
            if matches!(key, Some(value) if value.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "session.{field} may not be empty"
                )));
            }
        }

        self.validate_camera()?;

        let fractal = &self.fractal;
        require_finite("fractal.power", fractal.power)?;
        for value in fractal.constant {
            require_finite("fractal.constant", value)?;
        }
        for (field, value) in [
            ("iterations", fractal.iterations),
            ("steps", fractal.steps),
            ("accuracy", fractal.accuracy),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!(
                    "fractal.{field} must be at least 1"
                )));
            }
        }
        require_positive("fractal.bailout", fractal.bailout)?;
        require_positive("fractal.threshold", fractal.threshold)?;

        for (name, [min, max]) in self.animation.named_ranges() {
            require_finite(&format!("animation.{name}"), min)?;
            require_finite(&format!("animation.{name}"), max)?;
            if min > max {
                return Err(ConfigError::Invalid(format!(
                    "animation.{name} minimum {min} exceeds maximum {max}"
                )));
            }
        }

        self.validate_stereo()?;
        self.validate_keys()?;
        Ok(())
    }

    fn validate_camera(&self) -> Result<(), ConfigError> {
        let camera = &self.camera;
        for value in camera.position.iter().chain(camera.forward.iter()) {
            require_finite("camera", *value)?;
        }
        require_positive("camera.fov", camera.fov)?;

        let [x, y, z] = camera.forward;
        let length = (x * x + y * y + z * z).sqrt();
        if length < 1e-9 {
            return Err(ConfigError::Invalid(
                "camera.forward must be a non-zero vector".into(),
            ));
        }
        if (x * x + z * z).sqrt() / length < 1e-6 {
            return Err(ConfigError::Invalid(
                "camera.forward may not point straight up or down".into(),
            ));
        }
        Ok(())
    }

    fn validate_stereo(&self) -> Result<(), ConfigError> {
        let stereo = &self.stereo;
        if !(stereo.smoothing > 0.0 && stereo.smoothing <= 1.0) {
            return Err(ConfigError::Invalid(
                "stereo.smoothing must be within (0, 1]".into(),
            ));
        }

        let parallax = &stereo.parallax;
        require_finite("stereo.parallax.sensitivity", parallax.sensitivity)?;
        require_finite(
            "stereo.parallax.depth_sensitivity",
            parallax.depth_sensitivity,
        )?;
        require_positive("stereo.parallax.focus_distance", parallax.focus_distance)?;
        require_non_negative("stereo.parallax.eye_separation", parallax.eye_separation)?;
        require_distinct_landmarks("stereo.parallax.landmarks", parallax.landmarks)?;

        let orbit = &stereo.orbit;
        require_finite("stereo.orbit.yaw_range", orbit.yaw_range)?;
        require_finite("stereo.orbit.pitch_range", orbit.pitch_range)?;
        require_finite("stereo.orbit.zoom_sensitivity", orbit.zoom_sensitivity)?;
        require_finite("stereo.orbit.keystone", orbit.keystone)?;
        require_positive("stereo.orbit.min_radius", orbit.min_radius)?;
        require_distinct_landmarks("stereo.orbit.landmarks", orbit.landmarks)?;
        Ok(())
    }

    fn validate_keys(&self) -> Result<(), ConfigError> {
        let mut seen: BTreeMap<String, &'static str> = BTreeMap::new();
        for (action, keys) in self.keys.named() {
            for key in keys {
                if key.is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "keys.{action} contains an empty key name"
                    )));
                }
                let normalized = normalize_key_name(key);
                if let Some(previous) = seen.insert(normalized.clone(), action) {
                    if previous != action {
                        return Err(ConfigError::Invalid(format!(
                            "key '{normalized}' is bound to both '{previous}' and '{action}'"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

fn require_finite(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{field} must be finite")))
    }
}

fn require_positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{field} must be > 0")))
    }
}

fn require_non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{field} must be >= 0")))
    }
}

fn require_distinct_landmarks(field: &str, pair: [usize; 2]) -> Result<(), ConfigError> {
    if pair[0] == pair[1] {
        return Err(ConfigError::Invalid(format!(
            "{field} must name two different landmarks"
        )));
    }
    if let Some(index) = pair.into_iter().find(|index| *index >= FACE_MESH_POINTS) {
        return Err(ConfigError::Invalid(format!(
            "{field} index {index} is outside the {FACE_MESH_POINTS}-point face mesh"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1
default_fractal = "mandelbulb"

[session]
mouse_sensitivity = 2.5
coloring = "orbit-trap"
animate = true

[camera]
position = [0.0, 1.0, -4.0]
forward = [0.0, 0.0, 1.0]

[fractal]
power = 8
iterations = 12

[animation]
power = [6.0, 9.0]

[stereo]
strategy = "orbit"
smoothing = 0.5

[stereo.orbit]
zoom_sensitivity = 4.0

[variants]
restore_camera = true

[keys]
up = ["e", "Space"]
down = ["q"]
"#;

    #[test]
    fn parses_sample_config() {
        let config = ViewerConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.default_fractal.as_deref(), Some("mandelbulb"));
        assert_eq!(config.session.mouse_sensitivity, 2.5);
        assert_eq!(config.session.coloring.as_deref(), Some("orbit-trap"));
        assert!(config.session.animate);
        assert_eq!(config.camera.position, [0.0, 1.0, -4.0]);
        assert_eq!(config.fractal.power, 8.0);
        assert_eq!(config.fractal.steps, 150);
        assert_eq!(config.animation.power, [6.0, 9.0]);
        assert_eq!(config.animation.constant_x, [-1.0, 1.0]);
        assert_eq!(config.stereo.strategy, StereoStrategyKind::Orbit);
        assert_eq!(config.stereo.orbit.zoom_sensitivity, 4.0);
        assert_eq!(config.stereo.orbit.landmarks, [468, 473]);
        assert!(config.variants.restore_camera);
        assert_eq!(config.keys.forward, vec!["w".to_string()]);
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = ViewerConfig::from_toml_str("version = 1").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.default_fractal.as_deref(), Some(DEFAULT_FRACTAL));
    }

    #[test]
    fn accepts_parallax_alias() {
        let config = ViewerConfig::from_toml_str(
            r#"
version = 1

[stereo]
strategy = "parallax"
"#,
        )
        .unwrap();
        assert_eq!(config.stereo.strategy, StereoStrategyKind::HeadParallax);
    }

    #[test]
    fn rejects_unknown_version() {
        let err = ViewerConfig::from_toml_str("version = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_inverted_animation_range() {
        let err = ViewerConfig::from_toml_str(
            r#"
version = 1

[animation]
constant_y = [1.0, -1.0]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("constant_y")));
    }

    #[test]
    fn rejects_vertical_camera() {
        let err = ViewerConfig::from_toml_str(
            r#"
version = 1

[camera]
forward = [0.0, -1.0, 0.0]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_landmarks_outside_face_mesh() {
        let err = ViewerConfig::from_toml_str(
            "version = 1\n[stereo.parallax]\nlandmarks = [33, 263000000]\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("263000000"));

        let config =
            ViewerConfig::from_toml_str("version = 1\n[stereo.orbit]\nlandmarks = [0, 477]\n")
                .unwrap();
        assert_eq!(config.stereo.orbit.landmarks, [0, 477]);
    }

    #[test]
    fn rejects_key_bound_to_two_actions() {
        let err = ViewerConfig::from_toml_str(
            r#"
version = 1

[keys]
forward = ["w", "Space"]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("space")));
    }

    #[test]
    fn normalizes_key_names() {
        assert_eq!(normalize_key_name(" "), "space");
        assert_eq!(normalize_key_name("Space"), "space");
        assert_eq!(normalize_key_name("LShift"), "shift");
        assert_eq!(normalize_key_name("W"), "w");
    }

    #[test]
    fn shipped_sample_matches_defaults() {
        let sample = include_str!("../../../fractalview.toml");
        let config = ViewerConfig::from_toml_str(sample).unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn defaults_round_trip_through_toml() {
        let rendered = toml::to_string_pretty(&ViewerConfig::default()).unwrap();
        assert_eq!(
            ViewerConfig::from_toml_str(&rendered).unwrap(),
            ViewerConfig::default()
        );
    }
}
