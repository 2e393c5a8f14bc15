//! Application configuration for pkgbuild.
//!
//! User config lives at `~/.pkgbuild/pkgbuild.toml`.
//! CLI flags override config file values, which override defaults.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PkgBuildError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "pkgbuild.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".pkgbuild";

// ---------------------------------------------------------------------------
// Config structs (matching pkgbuild.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Build settings.
    #[serde(default)]
    pub build: BuildSection,
}

/// `[build]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildSection {
    /// How often the package is assembled during one run.
    #[serde(default)]
    pub mode: BuildMode,

    /// Override for the build output root. Empty means `<repo>/build`.
    #[serde(default)]
    pub output_dir: String,
}

/// When the package builder runs relative to documentation rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildMode {
    /// Render one template, then build the package; repeat per template.
    #[default]
    PerTemplate,
    /// Render every template first, then build the package once.
    Once,
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerTemplate => f.write_str("per-template"),
            Self::Once => f.write_str("once"),
        }
    }
}

impl FromStr for BuildMode {
    type Err = PkgBuildError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "per-template" => Ok(Self::PerTemplate),
            "once" => Ok(Self::Once),
            other => Err(PkgBuildError::config(format!(
                "unknown build mode '{other}': expected 'per-template' or 'once'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Build options (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime build options — merged from config file + CLI flags.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Build mode.
    pub mode: BuildMode,
    /// Build output root override (`None` means `<repo>/build`).
    pub output_dir: Option<PathBuf>,
}

impl From<&AppConfig> for BuildOptions {
    fn from(config: &AppConfig) -> Self {
        let output_dir = match config.build.output_dir.trim() {
            "" => None,
            dir => Some(PathBuf::from(dir)),
        };
        Self {
            mode: config.build.mode,
            output_dir,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.pkgbuild/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PkgBuildError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.pkgbuild/pkgbuild.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PkgBuildError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        PkgBuildError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PkgBuildError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| PkgBuildError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PkgBuildError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("mode = \"per-template\""));
        assert!(toml_str.contains("output_dir"));
    }

    #[test]
    fn config_with_once_mode_and_output_dir() {
        let toml_str = r#"
[build]
mode = "once"
output_dir = "/tmp/artifacts"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        let options = BuildOptions::from(&config);
        assert_eq!(options.mode, BuildMode::Once);
        assert_eq!(options.output_dir, Some(PathBuf::from("/tmp/artifacts")));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").expect("parse");
        let options = BuildOptions::from(&config);
        assert_eq!(options.mode, BuildMode::PerTemplate);
        assert!(options.output_dir.is_none());
    }

    #[test]
    fn load_config_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[build]\nmode = \"sometimes\"\n").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn build_mode_parses_from_flag_values() {
        assert_eq!("once".parse::<BuildMode>().unwrap(), BuildMode::Once);
        assert_eq!(
            "per-template".parse::<BuildMode>().unwrap(),
            BuildMode::PerTemplate
        );
        let err = "twice".parse::<BuildMode>().unwrap_err();
        assert!(err.to_string().contains("unknown build mode 'twice'"));
        assert_eq!(BuildMode::Once.to_string(), "once");
    }
}
