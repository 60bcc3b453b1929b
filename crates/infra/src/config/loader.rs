//! Configuration loader
//!
//! Loads adapter settings from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Loads a `.env` file into the process environment, if one exists
//! 2. Attempts to load from environment variables
//! 3. If incomplete, falls back to loading from file
//! 4. Probes multiple paths for config files
//! 5. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! Required:
//! - `FAULTLINE_ENVIRONMENT`: Deployment environment (e.g. `production`)
//! - `FAULTLINE_REGION`: Regional name
//! - `FAULTLINE_CLUSTER`: Regional cluster
//!
//! Optional:
//! - `FAULTLINE_DEFAULT_SERVICE`: Default service name (`default`)
//! - `FAULTLINE_RELEASE`: Release version
//! - `FAULTLINE_ZONE`: Availability zone
//! - `FAULTLINE_CLUSTER_MANAGER`: Value of the `kubernetes` tag (`false`)
//! - `FAULTLINE_TIER`: `production`, `staging` or `development`
//! - `FAULTLINE_EXECUTION_MODE`: `normal`, `interactive` or `test`
//! - `FAULTLINE_HOST_CLASS`: `standard` or `pseudo_production`
//! - `FAULTLINE_ERRORS_TO_EXCLUDE`: Comma-separated error kinds
//! - `FAULTLINE_EXTRAS_TO_TAGS`: Comma-separated extra keys
//! - `FAULTLINE_FILTER_PARAMETERS`: Comma-separated filter rules
//! - `FAULTLINE_REPORT_AFTER_JOB_RETRIES`: Defer job reports to the last retry
//! - `FAULTLINE_JOB_MAX_RETRIES`: Retry limit for `retry: true` jobs (25)
//! - `FAULTLINE_DSN_<SERVICE>`: DSN for one service, collected into the
//!   static DSN table
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./faultline.toml` or `./faultline.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names in the parent and grandparent directories
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use faultline_domain::constants::DEFAULT_JOB_MAX_RETRIES;
use faultline_domain::{
    AdapterSettings, DeploymentTier, ExecutionMode, FaultlineError, HostClass, JobSettings,
    Result, ServiceName,
};

use crate::dsn::{service_from_env_key, DSN_ENV_PREFIX};
use crate::errors::IntoFaultlineError;

const CONFIG_FILE_NAMES: [&str; 4] =
    ["faultline.toml", "faultline.json", "config.toml", "config.json"];

/// Load settings with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `FaultlineError::Config` if:
/// - Settings cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing or blank
pub fn load() -> Result<AdapterSettings> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
    }

    match load_from_env() {
        Ok(settings) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(settings)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load settings from environment variables
///
/// # Environment Variables
/// See module documentation for the complete list.
///
/// # Errors
/// Returns `FaultlineError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<AdapterSettings> {
    let deployment_environment = env_var("FAULTLINE_ENVIRONMENT")?;
    let regional_name = env_var("FAULTLINE_REGION")?;
    let regional_cluster = env_var("FAULTLINE_CLUSTER")?;

    let default_service_name = env_parse::<ServiceName>("FAULTLINE_DEFAULT_SERVICE")?;
    let tier = env_parse::<DeploymentTier>("FAULTLINE_TIER")?;
    let execution_mode = env_parse::<ExecutionMode>("FAULTLINE_EXECUTION_MODE")?;
    let host_class = env_parse::<HostClass>("FAULTLINE_HOST_CLASS")?;
    let default_max_retries = env_parse::<u32>("FAULTLINE_JOB_MAX_RETRIES")?;

    let service_dsns = std::env::vars()
        .filter(|(key, value)| key.starts_with(DSN_ENV_PREFIX) && !value.trim().is_empty())
        .filter_map(|(key, value)| service_from_env_key(&key).map(|service| (service, value)))
        .collect();

    let settings = AdapterSettings {
        deployment_environment,
        default_service_name: default_service_name.unwrap_or_default(),
        release_version: std::env::var("FAULTLINE_RELEASE").ok(),
        regional_name,
        regional_cluster,
        zone: std::env::var("FAULTLINE_ZONE").ok().filter(|zone| !zone.trim().is_empty()),
        cluster_manager: std::env::var("FAULTLINE_CLUSTER_MANAGER")
            .unwrap_or_else(|_| "false".to_string()),
        errors_to_exclude: env_list("FAULTLINE_ERRORS_TO_EXCLUDE"),
        extras_to_tags: env_list("FAULTLINE_EXTRAS_TO_TAGS"),
        filter_parameters: env_list("FAULTLINE_FILTER_PARAMETERS"),
        execution_mode: execution_mode.unwrap_or_default(),
        tier: tier.unwrap_or_default(),
        host_class: host_class.unwrap_or_default(),
        service_dsns,
        jobs: JobSettings {
            report_after_job_retries: env_bool("FAULTLINE_REPORT_AFTER_JOB_RETRIES", false),
            default_max_retries: default_max_retries.unwrap_or(DEFAULT_JOB_MAX_RETRIES),
        },
    };

    settings.validate()?;
    Ok(settings)
}

/// Load settings from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `FaultlineError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing or blank
pub fn load_from_file(path: Option<PathBuf>) -> Result<AdapterSettings> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(FaultlineError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            FaultlineError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents =
        std::fs::read_to_string(&config_path).map_err(IntoFaultlineError::into_faultline)?;

    let settings = parse_config(&contents, &config_path)?;
    settings.validate()?;
    Ok(settings)
}

/// Parse settings from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `FaultlineError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<AdapterSettings> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(IntoFaultlineError::into_faultline),
        "json" => serde_json::from_str(contents).map_err(IntoFaultlineError::into_faultline),
        _ => Err(FaultlineError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory, its parent and grandparent, then
/// the same three levels relative to the executable.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.extend([exe_dir.to_path_buf(), exe_dir.join(".."), exe_dir.join("../..")]);
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `FaultlineError::Config` if the variable is not set or blank.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            FaultlineError::Config(format!("Missing required environment variable: {key}"))
        })
}

/// Parse an optional environment variable
///
/// # Errors
/// Returns `FaultlineError::Config` if the variable is set but does not parse.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| FaultlineError::Config(format!("Invalid value for {key}: {e}"))),
        _ => Ok(None),
    }
}

/// Comma-separated list; blank items are dropped
fn env_list(key: &str) -> Vec<String> {
    std::env::var(key)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use once_cell::sync::Lazy;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const REQUIRED: [(&str, &str); 3] = [
        ("FAULTLINE_ENVIRONMENT", "production"),
        ("FAULTLINE_REGION", "us-01"),
        ("FAULTLINE_CLUSTER", "c07"),
    ];

    const OPTIONAL: [&str; 14] = [
        "FAULTLINE_DEFAULT_SERVICE",
        "FAULTLINE_RELEASE",
        "FAULTLINE_ZONE",
        "FAULTLINE_CLUSTER_MANAGER",
        "FAULTLINE_TIER",
        "FAULTLINE_EXECUTION_MODE",
        "FAULTLINE_HOST_CLASS",
        "FAULTLINE_ERRORS_TO_EXCLUDE",
        "FAULTLINE_EXTRAS_TO_TAGS",
        "FAULTLINE_FILTER_PARAMETERS",
        "FAULTLINE_REPORT_AFTER_JOB_RETRIES",
        "FAULTLINE_JOB_MAX_RETRIES",
        "FAULTLINE_DSN_DEFAULT",
        "FAULTLINE_DSN_BILLING_API",
    ];

    fn clear_env() {
        for (key, _) in REQUIRED {
            std::env::remove_var(key);
        }
        for key in OPTIONAL {
            std::env::remove_var(key);
        }
    }

    fn set_required() {
        for (key, value) in REQUIRED {
            std::env::set_var(key, value);
        }
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        for value in ["1", "true", "yes", "on", "TRUE"] {
            std::env::set_var("FAULTLINE_TEST_BOOL", value);
            assert!(env_bool("FAULTLINE_TEST_BOOL", false), "{value} should be true");
        }
        for value in ["0", "false", "no", "off"] {
            std::env::set_var("FAULTLINE_TEST_BOOL", value);
            assert!(!env_bool("FAULTLINE_TEST_BOOL", true), "{value} should be false");
        }

        std::env::remove_var("FAULTLINE_TEST_BOOL");
        assert!(env_bool("FAULTLINE_TEST_BOOL", true));
        assert!(!env_bool("FAULTLINE_TEST_BOOL", false));
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set_required();
        std::env::set_var("FAULTLINE_RELEASE", "2024.10.1");
        std::env::set_var("FAULTLINE_ZONE", "us-east-1b");
        std::env::set_var("FAULTLINE_CLUSTER_MANAGER", "true");
        std::env::set_var("FAULTLINE_TIER", "Production");
        std::env::set_var("FAULTLINE_HOST_CLASS", "pseudo_production");
        std::env::set_var("FAULTLINE_EXTRAS_TO_TAGS", "app_group_id, company_id,");
        std::env::set_var("FAULTLINE_REPORT_AFTER_JOB_RETRIES", "yes");
        std::env::set_var("FAULTLINE_JOB_MAX_RETRIES", "10");
        std::env::set_var("FAULTLINE_DSN_DEFAULT", "https://key@ingest.example.com/1");
        std::env::set_var("FAULTLINE_DSN_BILLING_API", "https://key@ingest.example.com/2");

        let result = load_from_env();
        assert!(result.is_ok(), "Should load settings from env vars, error: {:?}", result.err());

        let settings = result.unwrap();
        assert_eq!(settings.deployment_environment, "production");
        assert_eq!(settings.release_version.as_deref(), Some("2024.10.1"));
        assert_eq!(settings.zone.as_deref(), Some("us-east-1b"));
        assert_eq!(settings.tier, DeploymentTier::Production);
        assert_eq!(settings.host_class, HostClass::PseudoProduction);
        assert_eq!(settings.execution_mode, ExecutionMode::Normal);
        assert_eq!(settings.extras_to_tags, ["app_group_id", "company_id"]);
        assert!(settings.jobs.report_after_job_retries);
        assert_eq!(settings.jobs.default_max_retries, 10);
        assert_eq!(settings.paging_tag(), "production-us-01-c07");
        assert_eq!(
            settings.service_dsns.get("billing_api").map(String::as_str),
            Some("https://key@ingest.example.com/2")
        );
        assert!(settings.service_dsns.contains_key("default"));

        clear_env();
    }

    #[test]
    fn test_load_from_env_defaults() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set_required();

        let settings = load_from_env().unwrap();
        assert_eq!(settings.default_service_name.as_str(), "default");
        assert_eq!(settings.cluster_manager, "false");
        assert_eq!(settings.tier, DeploymentTier::Development);
        assert_eq!(settings.jobs.default_max_retries, 25);
        assert!(settings.zone.is_none());
        assert!(settings.service_dsns.is_empty());

        clear_env();
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("FAULTLINE_ENVIRONMENT", "production");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, FaultlineError::Config(_)), "Should be a Config error");
        assert!(err.to_string().contains("FAULTLINE_REGION"));

        clear_env();
    }

    #[test]
    fn test_load_from_env_invalid_enum() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set_required();
        std::env::set_var("FAULTLINE_TIER", "qa");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, FaultlineError::Config(_)), "Should be a Config error");
        assert!(err.to_string().contains("FAULTLINE_TIER"));

        clear_env();
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set_required();
        std::env::set_var("FAULTLINE_JOB_MAX_RETRIES", "many");

        assert!(matches!(load_from_env(), Err(FaultlineError::Config(_))));

        clear_env();
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_content = r#"
deployment_environment = "staging"
regional_name = "eu-01"
regional_cluster = "c02"
tier = "staging"
"#;

        let settings = parse_config(toml_content, &PathBuf::from("faultline.toml")).unwrap();
        assert_eq!(settings.tier, DeploymentTier::Staging);
    }

    #[test]
    fn test_parse_config_json() {
        let json_content = r#"{
            "deployment_environment": "staging",
            "regional_name": "eu-01",
            "regional_cluster": "c02",
            "execution_mode": "test"
        }"#;

        let settings = parse_config(json_content, &PathBuf::from("faultline.json")).unwrap();
        assert_eq!(settings.execution_mode, ExecutionMode::Test);
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("some content", &PathBuf::from("faultline.yaml"));
        assert!(result.is_err(), "Should fail with unsupported format");
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/faultline.toml")));
        assert!(matches!(result, Err(FaultlineError::Config(_))));
    }
}
