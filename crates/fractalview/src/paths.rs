use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "FRACTALVIEW_CONFIG_DIR";
pub const ENV_DATA_DIR: &str = "FRACTALVIEW_DATA_DIR";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "Fractalview";
const APPLICATION: &str = "Fractalview";

const CONFIG_FILE: &str = "fractalview.toml";
const SHADER_DIR: &str = "shaders";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;

        let config_dir = resolve_dir(ENV_CONFIG_DIR, project_dirs.config_dir())
            .context("failed to resolve fractalview config directory")?;
        let data_dir = resolve_dir(ENV_DATA_DIR, project_dirs.data_dir())
            .context("failed to resolve fractalview data directory")?;

        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// Candidate shader directories, most specific first.
    pub fn shader_roots(&self) -> Vec<PathBuf> {
        vec![
            self.config_dir.join(SHADER_DIR),
            self.data_dir.join(SHADER_DIR),
        ]
    }

    /// An explicit directory wins; otherwise the first root that exists.
    pub fn resolve_shader_dir(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(dir) = explicit {
            return Ok(dir.to_path_buf());
        }
        let roots = self.shader_roots();
        roots
            .iter()
            .find(|root| root.is_dir())
            .cloned()
            .ok_or_else(|| {
                anyhow!(
                    "no shader directory found; pass --shaders or create one of: {}",
                    roots
                        .iter()
                        .map(|root| root.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

fn resolve_dir(env_var: &str, default: &Path) -> Result<PathBuf> {
    if let Some(value) = env_override(env_var) {
        return Ok(value);
    }
    Ok(default.to_path_buf())
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.as_os_str().is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}
