use super::{RenderConfig, WindowConfig};
use directories::ProjectDirs;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "jade.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub log_level: LevelFilter,
    pub window: WindowConfig,
    pub render: RenderConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: LevelFilter::Info,
            window: WindowConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(path, &text)
    }

    pub fn from_toml(path: impl AsRef<Path>, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source,
        })
    }

    /// `./jade.toml`, then the per-user config directory, else defaults.
    pub fn discover() -> Result<(Self, Option<PathBuf>), ConfigError> {
        let user_config = ProjectDirs::from("", "", "jade")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME));
        Self::discover_in(Some(PathBuf::from(CONFIG_FILE_NAME)).into_iter().chain(user_config))
    }

    fn discover_in(
        candidates: impl IntoIterator<Item = PathBuf>,
    ) -> Result<(Self, Option<PathBuf>), ConfigError> {
        for path in candidates {
            if path.is_file() {
                return Ok((Self::load(&path)?, Some(path)));
            }
        }
        Ok((Self::default(), None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_is_default() {
        let config = EngineConfig::from_toml("jade.toml", "").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = EngineConfig::from_toml(
            "jade.toml",
            r#"
log_level = "debug"

[window]
title = "Level Editor"

[render]
clear_color = [0.0, 0.0, 0.0, 1.0]
"#,
        )
        .unwrap();

        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.window.title, "Level Editor");
        assert_eq!(config.window.width, 1920);
        assert_eq!(config.render.clear_color, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(
            config.render.shader_path,
            PathBuf::from("assets/shaders/default.glsl")
        );
        assert!(config.render.fallback_to_builtin_shader);
    }

    #[test]
    fn test_invalid_config_reports_path() {
        let err = EngineConfig::from_toml("conf/jade.toml", "[window]\nwidth = \"wide\"\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("conf/jade.toml"));
    }

    #[test]
    fn test_shipped_config_parses() {
        let config =
            EngineConfig::from_toml("jade.toml", include_str!("../../jade.toml")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_discover_picks_first_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let present = dir.path().join("jade.toml");
        let mut file = fs::File::create(&present).unwrap();
        writeln!(file, "[window]\nvsync = false").unwrap();

        let (config, source) =
            EngineConfig::discover_in([missing.clone(), present.clone()]).unwrap();
        assert!(!config.window.vsync);
        assert_eq!(source, Some(present));

        let (config, source) = EngineConfig::discover_in([missing]).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(source, None);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load(dir.path().join("jade.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
