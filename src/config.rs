use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::form::FormDefinition;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub ui: UiConfig,
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub collage: CollageConfig,
    #[serde(default)]
    pub form: FormConfig,
}

/// Itinerary backend connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL the `/submit`, `/generate_itinerary` and `/finalize_itinerary`
    /// endpoints live under
    pub base_url: String,
    /// Upper bound for any single request (default: 120 = 2 min).
    /// Generation can be slow, but a request must never hang forever.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_request_timeout() -> u64 {
    120 // 2 minutes
}

fn default_user_agent() -> String {
    format!("travel-buddy/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub refresh_rate_ms: u64,
    /// Length of the shake played on an invalid field
    #[serde(default = "default_shake_duration")]
    pub shake_duration_ms: u64,
}

fn default_shake_duration() -> u64 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub state: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to log to file in TUI mode (false = stderr for debugging)
    #[serde(default = "default_log_to_file")]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_to_file() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: default_log_to_file(),
        }
    }
}

/// Destination collage shown above the itinerary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollageConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// URL template; `{destination}` is replaced by the percent-encoded
    /// destination name
    #[serde(default = "default_collage_template")]
    pub url_template: String,
}

fn default_true() -> bool {
    true
}

fn default_collage_template() -> String {
    "https://image.pollinations.ai/prompt/travel%20collage%20of%20{destination}%20attractions%20scenic%20view%20photorealistic?width=800&height=400&nologo=true".to_string()
}

impl Default for CollageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url_template: default_collage_template(),
        }
    }
}

/// Form definition override
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormConfig {
    /// Path to a TOML form definition; the built-in travel form is used
    /// when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
}

impl Config {
    /// Path to the project-local config file
    pub fn local_config_path() -> PathBuf {
        PathBuf::from(".travel-buddy/config.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so travel-buddy works without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        let local_config = Self::local_config_path();
        if local_config.exists() {
            builder = builder.add_source(config::File::from(local_config));
        }

        // User config in ~/.config/travel-buddy/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("travel-buddy").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables, e.g. TRAVEL_BUDDY__SERVER__BASE_URL
        builder = builder.add_source(
            config::Environment::with_prefix("TRAVEL_BUDDY")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Save config as TOML
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_str =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        std::fs::write(path, toml_str).context("Failed to write config file")?;

        Ok(())
    }

    /// Write this config as a starting point for editing. An existing file
    /// is only replaced with `force`.
    pub fn init_file(&self, path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            bail!(
                "{} already exists (use --force to overwrite)",
                path.display()
            );
        }
        self.save_to(path)?;
        tracing::info!(path = %path.display(), "wrote config file");
        Ok(())
    }

    /// Get absolute path to state directory
    pub fn state_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.paths.state);
        if path.is_absolute() {
            path
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    }

    /// Get absolute path to logs directory
    pub fn logs_path(&self) -> PathBuf {
        self.state_path().join("logs")
    }

    /// The form to present: the configured definition file, or the
    /// built-in travel form
    pub fn form_definition(&self) -> Result<FormDefinition> {
        match &self.form.definition {
            Some(path) => FormDefinition::load(Path::new(path)),
            None => Ok(FormDefinition::travel()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                base_url: "http://127.0.0.1:5000".to_string(),
                request_timeout_secs: default_request_timeout(),
                user_agent: default_user_agent(),
            },
            ui: UiConfig {
                refresh_rate_ms: 50,
                shake_duration_ms: default_shake_duration(),
            },
            paths: PathsConfig {
                state: ".travel-buddy".to_string(),
            },
            logging: LoggingConfig::default(),
            collage: CollageConfig::default(),
            form: FormConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_has_bounded_timeout() {
        let config = Config::default();
        assert_eq!(config.server.request_timeout_secs, 120);
        assert!(config.collage.enabled);
        assert!(config.collage.url_template.contains("{destination}"));
    }

    #[test]
    fn test_save_and_load_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.server.base_url = "http://planner.internal:8080".to_string();
        config.ui.shake_duration_ms = 450;
        config.save_to(&path).unwrap();

        let loaded = Config::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(loaded.server.base_url, "http://planner.internal:8080");
        assert_eq!(loaded.ui.shake_duration_ms, 450);
    }

    #[test]
    fn test_init_file_keeps_existing_without_force() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".travel-buddy").join("config.toml");

        let mut config = Config::default();
        config.server.base_url = "http://first.test".to_string();
        config.init_file(&path, false).unwrap();

        config.server.base_url = "http://second.test".to_string();
        let err = config.init_file(&path, false).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        let loaded = Config::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(loaded.server.base_url, "http://first.test");

        config.init_file(&path, true).unwrap();
        let loaded = Config::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(loaded.server.base_url, "http://second.test");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("partial.toml");
        std::fs::write(&path, "[server]\nbase_url = \"http://example.test\"\n").unwrap();

        let loaded = Config::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(loaded.server.base_url, "http://example.test");
        assert_eq!(loaded.server.request_timeout_secs, 120);
        assert_eq!(loaded.logging.level, "info");
    }

    #[test]
    fn test_logs_path_under_state() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.state = temp_dir.path().to_string_lossy().to_string();

        let logs_dir = config.logs_path();
        assert!(logs_dir.ends_with("logs"));
        assert!(logs_dir.starts_with(temp_dir.path()));
    }

    #[test]
    fn test_form_definition_defaults_to_travel_form() {
        let config = Config::default();
        let form = config.form_definition().unwrap();
        assert_eq!(form, FormDefinition::travel());
    }

    #[test]
    fn test_form_definition_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("form.toml");
        std::fs::write(
            &path,
            "[[steps]]\ntitle = \"Only\"\n\n[[steps.fields]]\nname = \"destination\"\nlabel = \"Where\"\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.form.definition = Some(path.to_string_lossy().to_string());
        let form = config.form_definition().unwrap();
        assert_eq!(form.steps.len(), 1);
    }
}
