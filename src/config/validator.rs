use crate::config::{Config, SCHEMA_VERSION};
use crate::error::{ExpboardError, Result, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_storage(config, &mut errors);
        Self::validate_http(config, &mut errors);
        Self::validate_geocoding(config, &mut errors);
        Self::validate_semantic(config, &mut errors);
        Self::validate_search(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ExpboardError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != SCHEMA_VERSION {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_storage(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.storage.data_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "storage.data_dir",
                "Data directory cannot be empty",
            ));
        }

        if config.storage.database_file.trim().is_empty() {
            errors.push(ValidationError::new(
                "storage.database_file",
                "Database file name cannot be empty",
            ));
        }
    }

    fn validate_http(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.http.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "http.timeout_secs",
                "Timeout must be greater than 0",
            ));
        }
    }

    fn validate_geocoding(config: &Config, errors: &mut Vec<ValidationError>) {
        let geo = &config.geocoding;

        if geo.enabled && !Self::is_valid_endpoint(&geo.endpoint) {
            errors.push(ValidationError::new(
                "geocoding.endpoint",
                format!("Endpoint must be an http(s) URL, got '{}'", geo.endpoint),
            ));
        }

        if geo.result_limit == 0 {
            errors.push(ValidationError::new(
                "geocoding.result_limit",
                "Result limit must be greater than 0",
            ));
        }

        if geo.batch_size == 0 {
            errors.push(ValidationError::new(
                "geocoding.batch_size",
                "Batch size must be greater than 0",
            ));
        }

        if geo.cache_capacity == 0 {
            errors.push(ValidationError::new(
                "geocoding.cache_capacity",
                "Cache capacity must be greater than 0",
            ));
        }
    }

    fn validate_semantic(config: &Config, errors: &mut Vec<ValidationError>) {
        let semantic = &config.semantic;

        if semantic.enabled && !Self::is_valid_endpoint(&semantic.endpoint) {
            errors.push(ValidationError::new(
                "semantic.endpoint",
                format!(
                    "Endpoint must be an http(s) URL, got '{}'",
                    semantic.endpoint
                ),
            ));
        }

        // The token itself is optional: without it semantic search is skipped.
        if semantic.api_token_env.trim().is_empty() {
            errors.push(ValidationError::new(
                "semantic.api_token_env",
                "Token environment variable name cannot be empty",
            ));
        }
    }

    fn validate_search(config: &Config, errors: &mut Vec<ValidationError>) {
        let search = &config.search;

        if search.page_size_options.iter().any(|size| *size == 0) {
            errors.push(ValidationError::new(
                "search.page_size_options",
                "Page sizes must be greater than 0",
            ));
        }

        if search.default_page_size == 0 {
            errors.push(ValidationError::new(
                "search.default_page_size",
                "Default page size must be greater than 0",
            ));
        } else if !search.page_size_options.is_empty()
            && !search.page_size_options.contains(&search.default_page_size)
        {
            errors.push(ValidationError::new(
                "search.default_page_size",
                format!(
                    "Default page size {} must be one of {:?}",
                    search.default_page_size, search.page_size_options
                ),
            ));
        }

        if search.default_radius_km < -1 {
            errors.push(ValidationError::new(
                "search.default_radius_km",
                format!(
                    "Radius must be -1 (any distance) or non-negative, got {}",
                    search.default_radius_km
                ),
            ));
        }
    }

    fn is_valid_endpoint(s: &str) -> bool {
        s.starts_with("http://") || s.starts_with("https://")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_zero_batch_size() {
        let mut config = Config::default();
        config.geocoding.batch_size = 0;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_page_size_not_in_options() {
        let mut config = Config::default();
        config.search.default_page_size = 15;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_disabled_geocoding_skips_endpoint_check() {
        let mut config = Config::default();
        config.geocoding.enabled = false;
        config.geocoding.endpoint = String::new();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = Config::default();
        config.http.timeout_secs = 0;
        config.geocoding.cache_capacity = 0;
        config.search.default_radius_km = -5;

        match ConfigValidator::validate(&config) {
            Err(ExpboardError::ConfigValidation { errors }) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }
}
