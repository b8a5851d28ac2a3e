//! Configuration loader.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::Config;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a file if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = Regex::new(r"\$\{([^}]+)\}")?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.config`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }

    /// `~/.mailmate/config.toml`, or a relative fallback without a home.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".mailmate").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("mailmate.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.observer.throttle_ms, 500);
        assert_eq!(config.languages.len(), 10);
    }

    #[test]
    fn test_load_partial_sections() {
        let content = r#"
            [dispatcher]
            timeout_seconds = 10

            [initialization]
            max_retries = 5
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.dispatcher.timeout_seconds, 10);
        assert_eq!(config.dispatcher.min_content_chars, 10);
        assert_eq!(config.initialization.max_retries, 5);
        assert_eq!(config.initialization.retry_delay_ms, 2000);
    }

    #[test]
    fn test_load_languages_override() {
        let content = r#"
            [[languages]]
            code = "nl"
            name = "Dutch"
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.languages.len(), 1);
        assert_eq!(config.language_name("nl"), "Dutch");
    }

    #[test]
    fn test_load_capability_overrides() {
        let content = r#"
            [capabilities.writer]
            max_tokens = 400
            temperature = 0.2

            [capabilities.translator]
            default_target = "fr"
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.capabilities.writer.max_tokens, 400);
        assert_eq!(config.capabilities.translator.default_target, "fr");
        assert_eq!(config.capabilities.translator.default_source, "en");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[observer]").unwrap();
        writeln!(file, "throttle_ms = 250").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.observer.throttle_ms, 250);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/mailmate.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config =
            ConfigLoader::load_or_default(Path::new("/nonexistent/path/mailmate.toml")).unwrap();
        assert_eq!(config.dispatcher.timeout_seconds, 30);
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: This test runs in isolation and sets a unique test-only env var
        unsafe {
            std::env::set_var("MAILMATE_TEST_HOST", "mail.example.org");
        }
        let content = "[host]\nurl_pattern = \"${MAILMATE_TEST_HOST}\"";
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.host.url_pattern, "mail.example.org");
        unsafe {
            std::env::remove_var("MAILMATE_TEST_HOST");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${NONEXISTENT_MAILMATE_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = ConfigLoader::expand_path("~/mailmate");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/mailmate"));
    }

    #[test]
    fn test_default_path_file_name() {
        assert!(ConfigLoader::default_path().ends_with("config.toml")
            || ConfigLoader::default_path().ends_with("mailmate.toml"));
    }
}
