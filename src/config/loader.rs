//! Layered configuration loading.
//!
//! Sources in order of priority: `default.toml`, `{environment}.toml`,
//! `local.toml`, then `SHOPTREND_*` environment variables.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

/// Environment variable for configuration directory
const CONFIG_DIR_ENV: &str = "SHOPTREND_CONFIG_DIR";

/// Environment variable for specific configuration file
const CONFIG_FILE_ENV: &str = "SHOPTREND_CONFIG_FILE";

/// Default configuration directory
const DEFAULT_CONFIG_DIR: &str = "config";

/// Environment variable prefix for configuration overrides
const ENV_PREFIX: &str = "SHOPTREND";

/// Separator for nested configuration keys in environment variables
const ENV_SEPARATOR: &str = "__";

#[derive(Debug)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    /// Specific configuration file path (if set, skips layered loading)
    config_file: Option<PathBuf>,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Creates a loader from `SHOPTREND_CONFIG_DIR` / `SHOPTREND_CONFIG_FILE`
    /// / `SHOPTREND_APP_ENV`.
    ///
    /// The directory and file variables are mutually exclusive.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = std::env::var(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_DIR));

        let config_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);

        if config_file.is_some() && std::env::var(CONFIG_DIR_ENV).is_ok() {
            return Err(ConfigError::mutual_exclusivity(
                "SHOPTREND_CONFIG_DIR and SHOPTREND_CONFIG_FILE cannot both be set. \
                 Use SHOPTREND_CONFIG_DIR for layered configuration or \
                 SHOPTREND_CONFIG_FILE for a single configuration file.",
            ));
        }

        let environment = AppEnvironment::from_env();

        Ok(Self {
            config_dir,
            config_file,
            environment,
        })
    }

    /// Creates a loader that reads only the given file, ignoring layering and
    /// the environment variables above.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            config_file: Some(path.into()),
            environment: AppEnvironment::from_env(),
        }
    }

    /// Loads and validates settings from all sources.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let config = self.build_config()?;
        let settings: Settings = config.try_deserialize().map_err(|e| {
            ConfigError::ParseError(format!("Failed to deserialize configuration: {}", e))
        })?;

        settings.validate()?;

        Ok(settings)
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = Config::builder();

        let builder = if let Some(ref config_file) = self.config_file {
            self.add_file_source(builder, config_file, true)?
        } else {
            self.build_layered_config(builder)?
        };

        // Environment variables are always highest priority:
        // SHOPTREND_DATABASE__URL -> database.url
        let builder = Self::add_env_source(builder);

        builder.build().map_err(ConfigError::from)
    }

    fn build_layered_config(
        &self,
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        // default.toml is required, the other layers are optional
        let default_path = self.config_dir.join("default.toml");
        let builder = self.add_file_source(builder, &default_path, true)?;

        let env_path = self
            .config_dir
            .join(format!("{}.toml", self.environment.as_str()));
        let builder = self.add_file_source(builder, &env_path, false)?;

        let local_path = self.config_dir.join("local.toml");
        let builder = self.add_file_source(builder, &local_path, false)?;

        Ok(builder)
    }

    fn add_file_source(
        &self,
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        path: &Path,
        required: bool,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        if required && !path.exists() {
            return Err(ConfigError::file_not_found(format!(
                "Required configuration file not found: {}",
                path.display()
            )));
        }

        Ok(builder.add_source(
            File::new(path.to_str().unwrap_or_default(), FileFormat::Toml).required(required),
        ))
    }

    fn add_env_source(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> config::ConfigBuilder<config::builder::DefaultState> {
        builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Tests mutate process-wide environment variables, so they run under one
    // lock.
    static TEST_MUTEX: Mutex<()> = Mutex::new(());

    fn setup_config_dir(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        for (name, content) in files {
            let path = temp_dir.path().join(name);
            fs::write(&path, content).expect("Failed to write config file");
        }
        temp_dir
    }

    struct EnvGuard {
        vars_to_restore: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            Self {
                vars_to_restore: Vec::new(),
            }
        }

        fn set(&mut self, key: &str, value: &str) {
            let original = std::env::var(key).ok();
            self.vars_to_restore.push((key.to_string(), original));
            unsafe {
                std::env::set_var(key, value);
            }
        }

        fn remove(&mut self, key: &str) {
            let original = std::env::var(key).ok();
            self.vars_to_restore.push((key.to_string(), original));
            unsafe {
                std::env::remove_var(key);
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, original_value) in &self.vars_to_restore {
                unsafe {
                    match original_value {
                        Some(value) => std::env::set_var(key, value),
                        None => std::env::remove_var(key),
                    }
                }
            }
        }
    }

    const DEFAULT_CONFIG: &str = r#"
[application]
name = "shoptrend-test"
version = "1.0.0"

[database]
url = "postgres://localhost/shoptrend_test"
max_connections = 5

[index]
redis_url = "redis://localhost:6379"
channel_prefix = "search-index"

[logger]
level = "info"

[[jobs]]
name = "trending"
job_type = "trending_aggregation"
cron = "0 0 3 * * *"

[jobs.payload]
window_days = 15
"#;

    #[test]
    fn missing_default_toml_is_an_error() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();

        let temp_dir = setup_config_dir(&[]);
        env.set("SHOPTREND_CONFIG_DIR", temp_dir.path().to_str().unwrap());
        env.remove("SHOPTREND_CONFIG_FILE");
        env.remove("SHOPTREND_APP_ENV");

        let loader = ConfigLoader::new().expect("Should create loader");
        let result = loader.load();

        match result {
            Err(ConfigError::FileNotFound(msg)) => assert!(msg.contains("default.toml")),
            other => panic!("Expected FileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn loads_default_toml() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();

        let temp_dir = setup_config_dir(&[("default.toml", DEFAULT_CONFIG)]);
        env.set("SHOPTREND_CONFIG_DIR", temp_dir.path().to_str().unwrap());
        env.remove("SHOPTREND_CONFIG_FILE");
        env.remove("SHOPTREND_APP_ENV");

        let loader = ConfigLoader::new().expect("Should create loader");
        let settings = loader.load().expect("Should load settings");

        assert_eq!(settings.application.name, "shoptrend-test");
        assert_eq!(settings.database.max_connections, 5);
        assert_eq!(settings.jobs.len(), 1);
        assert_eq!(settings.jobs[0].job_type, "trending_aggregation");
        assert_eq!(
            settings.jobs[0].payload.as_ref().unwrap()["window_days"],
            15
        );
    }

    #[test]
    fn environment_layer_overrides_default() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();

        let production_config = r#"
[database]
url = "postgres://prod-server/shoptrend"
max_connections = 50
"#;
        let temp_dir = setup_config_dir(&[
            ("default.toml", DEFAULT_CONFIG),
            ("production.toml", production_config),
        ]);

        env.set("SHOPTREND_CONFIG_DIR", temp_dir.path().to_str().unwrap());
        env.remove("SHOPTREND_CONFIG_FILE");
        env.set("SHOPTREND_APP_ENV", "production");

        let loader = ConfigLoader::new().expect("Should create loader");
        let settings = loader.load().expect("Should load settings");

        assert_eq!(settings.database.url, "postgres://prod-server/shoptrend");
        assert_eq!(settings.database.max_connections, 50);
        // Values not overridden come from default.toml
        assert_eq!(settings.application.name, "shoptrend-test");
    }

    #[test]
    fn env_vars_have_highest_priority() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();

        let temp_dir = setup_config_dir(&[("default.toml", DEFAULT_CONFIG)]);
        env.set("SHOPTREND_CONFIG_DIR", temp_dir.path().to_str().unwrap());
        env.remove("SHOPTREND_CONFIG_FILE");
        env.remove("SHOPTREND_APP_ENV");
        env.set("SHOPTREND_DATABASE__URL", "postgres://env-override/db");

        let loader = ConfigLoader::new().expect("Should create loader");
        let settings = loader.load().expect("Should load settings");

        assert_eq!(settings.database.url, "postgres://env-override/db");
    }

    #[test]
    fn config_dir_and_file_are_mutually_exclusive() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();

        env.set("SHOPTREND_CONFIG_DIR", "/custom/config");
        env.set("SHOPTREND_CONFIG_FILE", "/path/to/config.toml");

        assert!(matches!(
            ConfigLoader::new(),
            Err(ConfigError::MutualExclusivityError(_))
        ));
    }

    #[test]
    fn single_file_mode_skips_layering() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();

        let temp_dir = setup_config_dir(&[("single.toml", DEFAULT_CONFIG)]);
        env.remove("SHOPTREND_CONFIG_DIR");
        env.remove("SHOPTREND_APP_ENV");

        let loader = ConfigLoader::from_file(temp_dir.path().join("single.toml"));
        let settings = loader.load().expect("Should load settings");

        assert_eq!(settings.application.name, "shoptrend-test");
    }
}
