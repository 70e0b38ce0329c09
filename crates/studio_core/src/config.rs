use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::paths;
use crate::retry::RetryPolicy;

const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/generate";
const DEFAULT_HISTORY_CAPACITY: usize = 5;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const ENV_ENDPOINT: &str = "AI_STUDIO_ENDPOINT";
pub const ENV_DATA_DIR: &str = "AI_STUDIO_DATA_DIR";
pub const ENV_HISTORY_CAPACITY: &str = "AI_STUDIO_HISTORY_CAPACITY";
pub const ENV_MAX_RETRIES: &str = "AI_STUDIO_MAX_RETRIES";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_factor: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
            backoff_factor: 2.0,
        }
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        RetryPolicy {
            max_retries: settings.max_retries,
            base_delay: Duration::from_millis(settings.base_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
            backoff_factor: settings.backoff_factor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub endpoint: String,
    pub data_dir: PathBuf,
    pub history_capacity: usize,
    pub request_timeout_secs: u64,
    pub retry: RetrySettings,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            data_dir: paths::studio_dir(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            retry: RetrySettings::default(),
        }
    }
}

impl StudioConfig {
    /// Resolve the configuration: defaults, then the TOML file, then the
    /// process environment.
    pub fn load(explicit_path: Option<&Path>) -> Self {
        Self::load_with_env(explicit_path, |key| std::env::var(key).ok())
    }

    pub fn load_with_env<F>(explicit_path: Option<&Path>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = env(ENV_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(paths::studio_dir);
        let path = explicit_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| paths::config_toml_path(&data_dir));

        let mut config = Self::from_file(&path).unwrap_or_else(|| Self {
            data_dir: data_dir.clone(),
            ..Self::default()
        });
        config.apply_env_overrides(env);
        config
    }

    fn from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                warn!("Failed to read config {}: {}", path.display(), err);
                return None;
            }
        };
        match toml::from_str::<StudioConfig>(&content) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                Some(config)
            }
            Err(err) => {
                warn!("Failed to parse config {}: {}", path.display(), err);
                None
            }
        }
    }

    fn apply_env_overrides<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = env(ENV_ENDPOINT) {
            self.endpoint = endpoint;
        }
        if let Some(data_dir) = env(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(data_dir);
        }
        if let Some(value) = env(ENV_HISTORY_CAPACITY) {
            match value.trim().parse::<usize>() {
                Ok(capacity) if capacity > 0 => self.history_capacity = capacity,
                _ => warn!("Ignoring invalid {}={:?}", ENV_HISTORY_CAPACITY, value),
            }
        }
        if let Some(value) = env(ENV_MAX_RETRIES) {
            match value.trim().parse::<u32>() {
                Ok(max_retries) => self.retry.max_retries = max_retries,
                Err(_) => warn!("Ignoring invalid {}={:?}", ENV_MAX_RETRIES, value),
            }
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.retry)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn records_dir(&self) -> PathBuf {
        paths::records_dir(&self.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_configured() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_string_lossy().to_string();
        let config = StudioConfig::load_with_env(None, env_from(&[(ENV_DATA_DIR, &data_dir)]));

        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.history_capacity, 5);
        assert_eq!(config.data_dir, dir.path());
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn file_values_then_env_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studio.toml");
        std::fs::write(
            &path,
            r#"
endpoint = "http://example.test/generate"
history_capacity = 10

[retry]
max_retries = 5
base_delay_ms = 250
"#,
        )
        .unwrap();

        let config = StudioConfig::load_with_env(
            Some(&path),
            env_from(&[(ENV_MAX_RETRIES, "2"), (ENV_HISTORY_CAPACITY, "nope")]),
        );

        assert_eq!(config.endpoint, "http://example.test/generate");
        assert_eq!(config.history_capacity, 10);
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.base_delay_ms, 250);
        assert_eq!(config.retry.max_delay_ms, 10_000);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "endpoint = [").unwrap();

        let config = StudioConfig::load_with_env(Some(&path), env_from(&[]));
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }
}
