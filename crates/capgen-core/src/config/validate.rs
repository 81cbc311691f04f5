//! Configuration validation with range checks.

use std::str::FromStr;

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        // Sanitized names are truncated to max_filename_len - 4 to leave
        // room for an extension; anything shorter degenerates to empty names.
        if self.output.max_filename_len < 8 {
            return Err(ConfigError::ValidationError(
                "output.max_filename_len must be >= 8".into(),
            ));
        }
        if crate::output::OutputMode::from_str(&self.output.mode).is_err() {
            return Err(ConfigError::ValidationError(format!(
                "output.mode must be \"csv\" or \"rename\", got {:?}",
                self.output.mode
            )));
        }
        if self.output.csv_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "output.csv_name must not be empty".into(),
            ));
        }
        if self.models.caption_model.is_empty() {
            return Err(ConfigError::ValidationError(
                "models.caption_model must not be empty".into(),
            ));
        }
        if self.models.embedding_model.is_empty() {
            return Err(ConfigError::ValidationError(
                "models.embedding_model must not be empty".into(),
            ));
        }
        match self.logging.level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "logging.level must be one of error/warn/info/debug/trace, got {other:?}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_tiny_max_filename_len() {
        let mut config = Config::default();
        config.output.max_filename_len = 4;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_filename_len"));
    }

    #[test]
    fn test_validate_rejects_unknown_output_mode() {
        let mut config = Config::default();
        config.output.mode = "yaml".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("output.mode"));
    }

    #[test]
    fn test_validate_rejects_empty_csv_name() {
        let mut config = Config::default();
        config.output.csv_name = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("csv_name"));
    }

    #[test]
    fn test_validate_rejects_empty_model_name() {
        let mut config = Config::default();
        config.models.caption_model = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("caption_model"));
    }

    #[test]
    fn test_validate_rejects_unknown_log_level() {
        let mut config = Config::default();
        config.logging.level = "loud".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("logging.level"));
    }
}
