//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError, DatabaseBackend};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "lotus.toml",
    "./config/config.toml",
    "/etc/lotus-directory/config.toml",
];

/// Environment variable naming the variable that holds the database password
const DB_PASSWORD_KEY_VAR: &str = "DB_PASSWORD_KEY";
const DEFAULT_DB_PASSWORD_VAR: &str = "DB_PASSWORD";

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides,
    /// then validate the result.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        self.load_with(|key| env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with an explicit variable source.
    pub fn load_with<F>(&self, lookup: F) -> Result<AppConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file(&lookup) {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        self.apply_overrides(&mut config, &lookup)?;
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file<F>(&self, lookup: &F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!(?path, "Configured file does not exist, searching defaults");
        }

        if let Some(path) = lookup("LDE_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Apply environment variable overrides
    fn apply_overrides<F>(&self, config: &mut AppConfig, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // HTTP
        if let Some(val) = lookup("LDE_HTTP_HOST") {
            config.http.host = val;
        }
        if let Some(val) = lookup("LDE_HTTP_PORT").or_else(|| lookup("PORT")) {
            config.http.port = val.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("invalid HTTP port '{}'", val))
            })?;
        }
        if let Some(val) = lookup("CORS_ORIGINS") {
            config.http.cors_origins = val
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Database
        if let Some(val) = lookup("LDE_DATABASE_BACKEND") {
            config.database.backend = val.parse::<DatabaseBackend>()?;
        }
        if let Some(val) = lookup("CONNECTION_STRING") {
            config.database.connection_string = val;
        }
        let password_var = lookup(DB_PASSWORD_KEY_VAR)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_DB_PASSWORD_VAR.to_string());
        if let Some(val) = lookup(&password_var) {
            config.database.password = Some(val);
        }

        // TLS
        if let Some(val) = lookup("TLS_CERT_FILE") {
            config.tls.cert_path = Some(val);
        }
        if let Some(val) = lookup("TLS_KEY_FILE") {
            config.tls.key_path = Some(val);
        }

        // Membership
        if let Some(val) = lookup("LDE_CONFLICT_RETRIES") {
            config.membership.conflict_retries = val.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("invalid LDE_CONFLICT_RETRIES '{}'", val))
            })?;
        }

        // General
        if let Some(val) = lookup("LDE_DEV_MODE") {
            config.dev_mode = parse_flag(&val).ok_or_else(|| {
                ConfigError::ValidationError(format!("invalid LDE_DEV_MODE '{}'", val))
            })?;
        }

        Ok(())
    }
}

/// Accepts `true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off` in any case.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn missing_file_loader() -> ConfigLoader {
        ConfigLoader::with_path("/nonexistent/lotus-directory-test.toml")
    }

    #[test]
    fn test_env_overrides() {
        let config = missing_file_loader()
            .load_with(vars(&[
                ("LDE_HTTP_HOST", "127.0.0.1"),
                ("PORT", "9090"),
                ("CORS_ORIGINS", "https://a.example, https://b.example"),
                ("CONNECTION_STRING", "postgres://directory:@db/dir"),
                ("DB_PASSWORD", "pw"),
                ("LDE_CONFLICT_RETRIES", "5"),
            ]))
            .unwrap();

        assert_eq!(config.http.bind_address(), "127.0.0.1:9090");
        assert_eq!(config.http.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert!(!config.http.allows_any_origin());
        assert_eq!(config.membership.conflict_retries, 5);
        assert_eq!(
            config.database.resolved_connection_string().unwrap(),
            "postgres://directory:pw@db/dir?sslmode=disable"
        );
    }

    #[test]
    fn test_specific_port_wins_over_generic() {
        let config = missing_file_loader()
            .load_with(vars(&[("LDE_HTTP_PORT", "7000"), ("PORT", "9090"), ("LDE_DEV_MODE", "true")]))
            .unwrap();
        assert_eq!(config.http.port, 7000);
    }

    #[test]
    fn test_password_key_indirection() {
        let config = missing_file_loader()
            .load_with(vars(&[
                ("LDE_DEV_MODE", "true"),
                ("DB_PASSWORD_KEY", "DIRECTORY_DB_SECRET"),
                ("DIRECTORY_DB_SECRET", "indirect"),
                ("DB_PASSWORD", "ignored"),
            ]))
            .unwrap();
        assert_eq!(config.database.password.as_deref(), Some("indirect"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = missing_file_loader()
            .load_with(vars(&[("LDE_DATABASE_BACKEND", "mongodb")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        let err = missing_file_loader()
            .load_with(vars(&[("LDE_DEV_MODE", "true"), ("PORT", "http")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_dev_mode_flag_values() {
        for value in ["1", "yes", "ON", "true"] {
            let config = missing_file_loader()
                .load_with(vars(&[("LDE_DEV_MODE", value)]))
                .unwrap();
            assert!(config.dev_mode, "{value} should enable dev mode");
        }

        let err = missing_file_loader()
            .load_with(vars(&[("LDE_DEV_MODE", "enabled")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_invalid_conflict_retries_rejected() {
        let err = missing_file_loader()
            .load_with(vars(&[("LDE_DEV_MODE", "true"), ("LDE_CONFLICT_RETRIES", "many")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_postgres_requires_password_for_empty_marker() {
        let err = missing_file_loader()
            .load_with(vars(&[("CONNECTION_STRING", "postgres://directory:@db/dir")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSecret(_)));
    }

    #[test]
    fn test_file_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[http]\nport = 8181\n\n[database]\nbackend = \"memory\"\n\n[membership]\nconflict_retries = 7\n"
        )
        .unwrap();

        let config = ConfigLoader::with_path(file.path())
            .load_with(vars(&[("LDE_CONFLICT_RETRIES", "2")]))
            .unwrap();

        assert_eq!(config.http.port, 8181);
        assert_eq!(config.effective_backend(), DatabaseBackend::Memory);
        assert_eq!(config.membership.conflict_retries, 2);
    }

    #[test]
    fn test_lde_config_variable_locates_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "dev_mode = true\n[http]\nport = 8282\n").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let config = missing_file_loader()
            .load_with(vars(&[("LDE_CONFIG", path.as_str())]))
            .unwrap();
        assert_eq!(config.http.port, 8282);
        assert!(config.dev_mode);
    }
}
