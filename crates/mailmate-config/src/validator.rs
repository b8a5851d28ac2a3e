//! Configuration validation.

use std::collections::HashSet;

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Convert the first error into a [`ConfigError`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_timings(config, &mut result);
        Self::validate_ui(config, &mut result);
        Self::validate_languages(config, &mut result);
        Self::validate_capabilities(config, &mut result);

        if config.host.url_pattern.trim().is_empty() {
            result.add_error(ValidationError::new(
                "host.url_pattern",
                "url_pattern cannot be empty",
            ));
        }

        result
    }

    fn validate_timings(config: &Config, result: &mut ValidationResult) {
        if config.dispatcher.timeout_seconds == 0 {
            result.add_error(ValidationError::new(
                "dispatcher.timeout_seconds",
                "timeout_seconds must be greater than 0",
            ));
        }

        if config.observer.throttle_ms < 50 {
            result.add_warning(ValidationWarning::new(
                "observer.throttle_ms",
                "throttle_ms below 50 rescans on nearly every mutation batch",
            ));
        }

        if config.initialization.max_retries > 20 {
            result.add_warning(ValidationWarning::new(
                "initialization.max_retries",
                "max_retries is very high (>20), an absent provider will be probed for a long time",
            ));
        }
    }

    fn validate_ui(config: &Config, result: &mut ValidationResult) {
        let ui = &config.ui;
        let fields = [
            ("ui.marker_attribute", &ui.marker_attribute),
            ("ui.container_class", &ui.container_class),
            ("ui.button_class", &ui.button_class),
            ("ui.output_class", &ui.output_class),
            ("ui.language_select_class", &ui.language_select_class),
        ];
        for (path, value) in fields {
            if value.trim().is_empty() {
                result.add_error(ValidationError::new(path, "cannot be empty"));
            }
        }
    }

    fn validate_languages(config: &Config, result: &mut ValidationResult) {
        if config.languages.is_empty() {
            result.add_error(ValidationError::new(
                "languages",
                "at least one language is required",
            ));
            return;
        }

        let mut seen = HashSet::new();
        for language in &config.languages {
            if !seen.insert(language.code.as_str()) {
                result.add_warning(ValidationWarning::new(
                    "languages",
                    format!("Language '{}' is listed more than once", language.code),
                ));
            }
        }
    }

    fn validate_capabilities(config: &Config, result: &mut ValidationResult) {
        let translator = &config.capabilities.translator;
        for (path, code) in [
            ("capabilities.translator.default_source", &translator.default_source),
            ("capabilities.translator.default_target", &translator.default_target),
        ] {
            if !config.languages.iter().any(|l| &l.code == code) {
                result.add_error(ValidationError::new(
                    path,
                    format!("Unknown language code '{}'", code),
                ));
            }
        }

        for (path, generation) in [
            ("capabilities.writer", &config.capabilities.writer),
            ("capabilities.language_model", &config.capabilities.language_model),
        ] {
            if generation.max_tokens == 0 {
                result.add_error(ValidationError::new(
                    format!("{}.max_tokens", path),
                    "max_tokens must be greater than 0",
                ));
            }
            if !(0.0..=2.0).contains(&generation.temperature) {
                result.add_warning(ValidationWarning::new(
                    format!("{}.temperature", path),
                    "temperature outside [0, 2]",
                ));
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
