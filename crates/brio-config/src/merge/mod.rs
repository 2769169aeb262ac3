//! Project discovery and layered session settings

use std::collections::HashMap;
use std::time::Duration;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use brio_core::error::BrioError;
use crate::{ConfigResult, toml::{Manifest, MANIFEST_FILE}};

/// Default registry endpoint
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";
/// Default directory (relative to the project) holding installed packages
pub const DEFAULT_INSTALLED_DIR: &str = ".brio/modules";
/// Default directory (relative to the project) holding vendored packages
pub const DEFAULT_VENDOR_DIR: &str = "vendor";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Main configuration loading interface
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self { cwd }
    }

    /// Load the nearest project manifest. Returns it together with the
    /// directory it was found in, which becomes the session base directory.
    pub async fn load_project(&self) -> ConfigResult<(Manifest, Utf8PathBuf)> {
        let path = self.resolve_config_path(MANIFEST_FILE).ok_or_else(|| {
            BrioError::ConfigValidation {
                field: "manifest".to_string(),
                reason: format!(
                    "No {} found in {} or any parent directory",
                    MANIFEST_FILE, self.cwd
                ),
            }
        })?;

        let manifest = crate::toml::load_from_file(&path).await?;
        let dir = path.parent().map(Utf8Path::to_path_buf).unwrap_or_else(|| self.cwd.clone());
        Ok((manifest, dir))
    }

    /// Find configuration file in project (walks up directory tree)
    pub fn resolve_config_path(&self, filename: &str) -> Option<Utf8PathBuf> {
        self.cwd
            .ancestors()
            .map(|dir| dir.join(filename))
            .find(|candidate| candidate.exists())
    }

    /// Location of the user-wide settings file (`~/.brio/config.toml`)
    pub fn global_settings_path() -> Option<Utf8PathBuf> {
        let home = dirs::home_dir()?;
        let home = Utf8PathBuf::try_from(home).ok()?;
        Some(home.join(".brio").join("config.toml"))
    }
}

/// Session settings after layering
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Registry base URL, without a trailing slash
    pub registry: String,
    /// Client-level network timeout
    pub timeout: Duration,
    /// Installed package directory, relative to the project
    pub installed_dir: Utf8PathBuf,
    /// Vendored package directory, relative to the project
    pub vendor_dir: Utf8PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            registry: DEFAULT_REGISTRY.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            installed_dir: Utf8PathBuf::from(DEFAULT_INSTALLED_DIR),
            vendor_dir: Utf8PathBuf::from(DEFAULT_VENDOR_DIR),
        }
    }
}

/// On-disk shape of `~/.brio/config.toml`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SettingsFile {
    pub registry: Option<String>,
    pub timeout_secs: Option<u64>,
    pub installed_dir: Option<String>,
    pub vendor_dir: Option<String>,
}

/// Configuration source tracking
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Built-in defaults
    Default,
    /// Global config file
    Global(Utf8PathBuf),
    /// Environment variable
    Environment(String),
    /// CLI flag
    CommandLine,
}

/// Settings layering: defaults < global file < `BRIO_*` env < CLI flags
#[derive(Debug, Default)]
pub struct ConfigLayering {
    /// Global configuration
    global: Option<(SettingsFile, Utf8PathBuf)>,
    /// Environment overrides
    env_overrides: HashMap<String, String>,
    /// CLI flag overrides
    cli_overrides: HashMap<String, String>,
}

impl ConfigLayering {
    /// Create a new configuration layering system
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_global(mut self, file: SettingsFile, path: Utf8PathBuf) -> Self {
        self.global = Some((file, path));
        self
    }

    pub fn with_env(mut self, overrides: HashMap<String, String>) -> Self {
        self.env_overrides = overrides;
        self
    }

    pub fn with_cli(mut self, overrides: HashMap<String, String>) -> Self {
        self.cli_overrides = overrides;
        self
    }

    /// Read the global settings file if it exists
    pub async fn load_global(mut self) -> ConfigResult<Self> {
        let Some(path) = ConfigLoader::global_settings_path() else {
            return Ok(self);
        };
        if !path.exists() {
            return Ok(self);
        }

        let content = tokio::fs::read_to_string(&path).await
            .map_err(|e| BrioError::io(format!("Failed to read {}", path), e))?;
        let file: SettingsFile = ::toml::from_str(&content)
            .map_err(|e| BrioError::TomlParse {
                path: path.to_string(),
                message: e.to_string(),
            })?;
        self.global = Some((file, path));
        Ok(self)
    }

    /// Merge all layers. Returns the settings and, per key, the layer that won.
    pub fn merge(&self) -> ConfigResult<(Settings, HashMap<&'static str, ConfigSource>)> {
        let mut settings = Settings::default();
        let mut sources: HashMap<&'static str, ConfigSource> = HashMap::new();

        if let Some((file, path)) = &self.global {
            let source = ConfigSource::Global(path.clone());
            let pairs = [
                ("registry", file.registry.clone()),
                ("timeout", file.timeout_secs.map(|t| t.to_string())),
                ("installed-dir", file.installed_dir.clone()),
                ("vendor-dir", file.vendor_dir.clone()),
            ];
            for (key, value) in pairs {
                if let Some(value) = value {
                    Self::apply(&mut settings, key, &value, &path.to_string())?;
                    sources.insert(key, source.clone());
                }
            }
        }

        for (var, value) in &self.env_overrides {
            let key = match var.as_str() {
                "BRIO_REGISTRY" => "registry",
                "BRIO_TIMEOUT_SECS" => "timeout",
                "BRIO_INSTALLED_DIR" => "installed-dir",
                "BRIO_VENDOR_DIR" => "vendor-dir",
                _ => continue,
            };
            Self::apply(&mut settings, key, value, var)?;
            sources.insert(key, ConfigSource::Environment(var.clone()));
        }

        for (key, value) in &self.cli_overrides {
            let key = match key.as_str() {
                "registry" => "registry",
                "timeout" => "timeout",
                "installed-dir" => "installed-dir",
                "vendor-dir" => "vendor-dir",
                _ => continue,
            };
            Self::apply(&mut settings, key, value, "command line")?;
            sources.insert(key, ConfigSource::CommandLine);
        }

        Ok((settings, sources))
    }

    fn apply(settings: &mut Settings, key: &str, value: &str, origin: &str) -> ConfigResult<()> {
        let invalid = |reason: String| BrioError::ConfigValidation {
            field: key.to_string(),
            reason: format!("{} (from {})", reason, origin),
        };

        match key {
            "registry" => {
                let url = url::Url::parse(value)
                    .map_err(|e| invalid(format!("Invalid registry URL '{}': {}", value, e)))?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(invalid(format!("Registry URL must be http(s): '{}'", value)));
                }
                settings.registry = url.as_str().trim_end_matches('/').to_string();
            },
            "timeout" => {
                let secs: u64 = value.parse()
                    .map_err(|_| invalid(format!("Invalid timeout '{}'", value)))?;
                if secs == 0 {
                    return Err(invalid("Timeout must be at least one second".to_string()));
                }
                settings.timeout = Duration::from_secs(secs);
            },
            "installed-dir" => settings.installed_dir = Utf8PathBuf::from(value),
            "vendor-dir" => settings.vendor_dir = Utf8PathBuf::from(value),
            _ => {},
        }
        Ok(())
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with("BRIO_"))
            .collect()
    }
}
