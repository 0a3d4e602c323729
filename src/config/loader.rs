//! Configuration Loader
//!
//! Environment-aware layered loading built on the `config` crate. Sources,
//! lowest precedence first:
//!
//! 1. compiled defaults ([`EngineConfig::default`])
//! 2. `<dir>/admission.{toml,yaml,json}` (optional)
//! 3. `<dir>/admission.<environment>.{toml,yaml,json}` (optional)
//! 4. `TASKER_ADMISSION__SECTION__FIELD` environment variables

use config::{Config, Environment, File};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::error::ConfigResult;
use super::EngineConfig;

pub const CONFIG_FILE_STEM: &str = "admission";
pub const ENV_PREFIX: &str = "TASKER_ADMISSION";
pub const ENV_SEPARATOR: &str = "__";

/// Current environment from `TASKER_ENV`, defaulting to development
pub fn detect_environment() -> String {
    std::env::var("TASKER_ENV")
        .map(|env| env.trim().to_lowercase())
        .ok()
        .filter(|env| !env.is_empty())
        .unwrap_or_else(|| "development".to_string())
}

#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: EngineConfig,
    environment: String,
    config_directory: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection from `./config`
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(Some(PathBuf::from("config")))
    }

    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load with an explicit environment, reading overrides from the process environment
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with_overrides(config_dir, environment, None)
    }

    /// Load with an explicit environment and an explicit override map standing
    /// in for the process environment (`None` reads the process environment)
    pub fn load_with_overrides(
        config_dir: Option<PathBuf>,
        environment: &str,
        overrides: Option<HashMap<String, String>>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        debug!(
            environment = %environment,
            config_dir = ?config_dir,
            "Loading configuration"
        );

        let defaults = Config::try_from(&EngineConfig::default())?;
        let mut builder = Config::builder().add_source(defaults);

        if let Some(dir) = &config_dir {
            builder = builder
                .add_source(File::with_name(&file_stem(dir, None)).required(false))
                .add_source(File::with_name(&file_stem(dir, Some(environment))).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .try_parsing(true)
                .source(overrides),
        );

        let config: EngineConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        info!(
            environment = %environment,
            max_tasks = config.task_queue.max_tasks,
            allow_any_joiner = config.admission.allow_any_joiner,
            "⚙️ CONFIG: Configuration loaded"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory: config_dir,
        }))
    }

    /// Wrap an already-built configuration
    pub fn from_config(config: EngineConfig, environment: &str) -> ConfigResult<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory: None,
        }))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> Option<&Path> {
        self.config_directory.as_deref()
    }
}

fn file_stem(dir: &Path, environment: Option<&str>) -> String {
    let name = match environment {
        Some(env) => format!("{CONFIG_FILE_STEM}.{env}"),
        None => CONFIG_FILE_STEM.to_string(),
    };
    dir.join(name).to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_directory() {
        let manager =
            ConfigManager::load_with_overrides(None, "test", Some(HashMap::new())).unwrap();
        assert_eq!(manager.config(), &EngineConfig::default());
        assert_eq!(manager.environment(), "test");
        assert!(manager.config_directory().is_none());
    }

    #[test]
    fn test_overrides_map_applies() {
        let overrides = HashMap::from([
            (
                "TASKER_ADMISSION__TASK_QUEUE__MAX_TASKS".to_string(),
                "4".to_string(),
            ),
            (
                "TASKER_ADMISSION__ADMISSION__ALLOW_ANY_JOINER".to_string(),
                "true".to_string(),
            ),
        ]);
        let manager = ConfigManager::load_with_overrides(None, "test", Some(overrides)).unwrap();
        assert_eq!(manager.config().task_queue.max_tasks, 4);
        assert!(manager.config().admission.allow_any_joiner);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let overrides = HashMap::from([(
            "TASKER_ADMISSION__TASK_QUEUE__MAX_TASKS".to_string(),
            "0".to_string(),
        )]);
        assert!(ConfigManager::load_with_overrides(None, "test", Some(overrides)).is_err());
    }

    #[test]
    fn test_file_stem() {
        let stem = file_stem(Path::new("/etc/tasker"), Some("production"));
        assert!(stem.ends_with("admission.production"));
    }
}
