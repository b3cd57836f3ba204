//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and `WT_*`
//! environment variables, and merging configurations with proper
//! precedence rules.

use crate::catalog::{validate_catalog_entry, TldCatalog};
use crate::error::WhoisThereError;
use crate::types::CheckConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loaded from TOML files.
///
/// This represents the structure of configuration files that users can create
/// to set default values, override the TLD catalog and pin WHOIS servers.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Replacement TLD lists per category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<CatalogConfig>,

    /// WHOIS server overrides keyed by TLD or suffix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois_servers: Option<HashMap<String, String>>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Default concurrency level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Per-probe timeout (as string, e.g., "10s", "1m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// WHOIS round-trip timeout (as string, e.g., "5s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois_timeout: Option<String>,

    /// Follow registrar WHOIS referrals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_referral: Option<bool>,

    /// Default JSON output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

/// TLD catalog overrides. Categories left out keep their built-in lists.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popular: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended: Option<Vec<String>>,
}

impl FileConfig {
    /// Layer the file's defaults over `base`.
    ///
    /// Values were validated at load time; anything unparsable here is
    /// reported as a configuration error.
    pub fn apply_to(&self, mut base: CheckConfig) -> Result<CheckConfig, WhoisThereError> {
        if let Some(defaults) = &self.defaults {
            if let Some(concurrency) = defaults.concurrency {
                base = base.with_concurrency(concurrency);
            }
            if let Some(timeout) = &defaults.timeout {
                base = base.with_probe_timeout(require_duration("timeout", timeout)?);
            }
            if let Some(timeout) = &defaults.whois_timeout {
                base = base.with_whois_timeout(require_duration("whois_timeout", timeout)?);
            }
            if let Some(follow) = defaults.follow_referral {
                base = base.with_follow_referral(follow);
            }
        }
        if let Some(servers) = &self.whois_servers {
            let mut merged = base.whois_servers.clone();
            merged.extend(servers.clone());
            base = base.with_whois_servers(merged);
        }
        Ok(base)
    }

    /// Build the TLD catalog, falling back to built-in lists per category.
    pub fn build_catalog(&self) -> Result<TldCatalog, WhoisThereError> {
        let defaults = TldCatalog::default();
        let Some(catalog) = &self.catalog else {
            return Ok(defaults);
        };
        TldCatalog::new(
            catalog
                .popular
                .clone()
                .unwrap_or_else(|| defaults.popular().to_vec()),
            catalog
                .country
                .clone()
                .unwrap_or_else(|| defaults.country().to_vec()),
            catalog
                .extended
                .clone()
                .unwrap_or_else(|| defaults.extended().to_vec()),
        )
    }

    /// JSON output preference, if the file sets one.
    pub fn json(&self) -> Option<bool> {
        self.defaults.as_ref().and_then(|d| d.json)
    }
}

/// Configuration discovery and loading functionality.
#[derive(Debug, Clone, Default)]
pub struct ConfigManager;

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a specific file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The parsed configuration or an error if parsing fails.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, WhoisThereError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(WhoisThereError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            WhoisThereError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;

        // Validate the loaded configuration
        self.validate_config(&config)?;

        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Looks for configuration files in standard locations and merges them
    /// according to precedence rules. Files that fail to load are skipped
    /// with a warning.
    ///
    /// # Returns
    ///
    /// Merged configuration from all discovered files.
    pub fn discover_and_load(&self) -> Result<FileConfig, WhoisThereError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        // XDG, then global, then local (highest precedence)
        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring configuration file");
                }
            }
        }

        if loaded_files.len() > 1 {
            for (i, path) in loaded_files.iter().enumerate() {
                tracing::info!(
                    path = %path.display(),
                    precedence = i,
                    "merged configuration file"
                );
            }
        }

        Ok(merged_config)
    }

    /// Get the local configuration file path.
    ///
    /// Looks for configuration files in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./whoisthere.toml", "./.whoisthere.toml"];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Some(path.to_path_buf());
            }
        }

        None
    }

    /// Get the global configuration file path.
    ///
    /// Looks for configuration files in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        if let Some(home) = env::var_os("HOME") {
            let candidates = [".whoisthere.toml", "whoisthere.toml"];

            for candidate in &candidates {
                let path = Path::new(&home).join(candidate);
                if path.exists() {
                    return Some(path);
                }
            }
        }

        None
    }

    /// Get the XDG configuration file path.
    ///
    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("whoisthere").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations with proper precedence.
    ///
    /// Values from `higher` take precedence over values from `lower`.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(mut lower_defaults), Some(higher_defaults)) => {
                    if higher_defaults.concurrency.is_some() {
                        lower_defaults.concurrency = higher_defaults.concurrency;
                    }
                    if higher_defaults.timeout.is_some() {
                        lower_defaults.timeout = higher_defaults.timeout;
                    }
                    if higher_defaults.whois_timeout.is_some() {
                        lower_defaults.whois_timeout = higher_defaults.whois_timeout;
                    }
                    if higher_defaults.follow_referral.is_some() {
                        lower_defaults.follow_referral = higher_defaults.follow_referral;
                    }
                    if higher_defaults.json.is_some() {
                        lower_defaults.json = higher_defaults.json;
                    }
                    Some(lower_defaults)
                }
                (None, Some(higher_defaults)) => Some(higher_defaults),
                (Some(lower_defaults), None) => Some(lower_defaults),
                (None, None) => None,
            },
            catalog: match (lower.catalog, higher.catalog) {
                (Some(mut lower_catalog), Some(higher_catalog)) => {
                    if higher_catalog.popular.is_some() {
                        lower_catalog.popular = higher_catalog.popular;
                    }
                    if higher_catalog.country.is_some() {
                        lower_catalog.country = higher_catalog.country;
                    }
                    if higher_catalog.extended.is_some() {
                        lower_catalog.extended = higher_catalog.extended;
                    }
                    Some(lower_catalog)
                }
                (None, Some(higher_catalog)) => Some(higher_catalog),
                (Some(lower_catalog), None) => Some(lower_catalog),
                (None, None) => None,
            },
            whois_servers: match (lower.whois_servers, higher.whois_servers) {
                (Some(mut lower_servers), Some(higher_servers)) => {
                    // Higher precedence wins for conflicting suffixes
                    lower_servers.extend(higher_servers);
                    Some(lower_servers)
                }
                (None, Some(higher_servers)) => Some(higher_servers),
                (Some(lower_servers), None) => Some(lower_servers),
                (None, None) => None,
            },
        }
    }

    /// Validate a configuration for common issues.
    pub fn validate_config(&self, config: &FileConfig) -> Result<(), WhoisThereError> {
        if let Some(defaults) = &config.defaults {
            if let Some(concurrency) = defaults.concurrency {
                if concurrency == 0 || concurrency > 100 {
                    return Err(WhoisThereError::config(
                        "Concurrency must be between 1 and 100",
                    ));
                }
            }

            for (name, value) in [
                ("timeout", &defaults.timeout),
                ("whois_timeout", &defaults.whois_timeout),
            ] {
                if let Some(timeout_str) = value {
                    require_duration(name, timeout_str)?;
                }
            }
        }

        if let Some(catalog) = &config.catalog {
            for (name, list) in [
                ("popular", &catalog.popular),
                ("country", &catalog.country),
                ("extended", &catalog.extended),
            ] {
                let Some(tlds) = list else { continue };
                if tlds.is_empty() {
                    return Err(WhoisThereError::config(format!(
                        "Catalog category '{}' cannot have an empty TLD list",
                        name
                    )));
                }
                for tld in tlds {
                    validate_catalog_entry(&tld.trim().trim_start_matches('.').to_lowercase())
                        .map_err(|e| {
                            WhoisThereError::config(format!("In catalog '{}': {}", name, e))
                        })?;
                }
            }
        }

        if let Some(servers) = &config.whois_servers {
            for (suffix, server) in servers {
                validate_catalog_entry(&suffix.trim().trim_start_matches('.').to_lowercase())
                    .map_err(|e| WhoisThereError::config(format!("In whois_servers: {}", e)))?;
                if server.trim().is_empty() || server.contains(char::is_whitespace) {
                    return Err(WhoisThereError::config(format!(
                        "Invalid WHOIS server '{}' for '{}'",
                        server, suffix
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via WT_* environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub concurrency: Option<usize>,
    pub timeout: Option<String>,
    pub whois_timeout: Option<String>,
    pub follow_referral: Option<bool>,
    pub json: Option<bool>,
    pub config: Option<String>,
}

/// Load configuration from environment variables.
///
/// Parses all WT_* environment variables and returns a structured configuration.
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    load_env_config_from(|name| env::var(name).ok())
}

/// Same as [`load_env_config`] with an injectable variable lookup.
pub fn load_env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    // WT_CONCURRENCY - concurrent probes
    if let Some(val) = lookup("WT_CONCURRENCY") {
        match val.trim().parse::<usize>() {
            Ok(concurrency) if concurrency > 0 && concurrency <= 100 => {
                env_config.concurrency = Some(concurrency);
                tracing::info!(value = concurrency, "using WT_CONCURRENCY");
            }
            _ => tracing::warn!(value = %val, "invalid WT_CONCURRENCY, must be 1-100"),
        }
    }

    // WT_TIMEOUT / WT_WHOIS_TIMEOUT - duration strings
    for (name, slot) in [
        ("WT_TIMEOUT", &mut env_config.timeout),
        ("WT_WHOIS_TIMEOUT", &mut env_config.whois_timeout),
    ] {
        if let Some(val) = lookup(name) {
            if parse_timeout_string(&val).is_some() {
                tracing::info!(value = %val, "using {}", name);
                *slot = Some(val);
            } else {
                tracing::warn!(
                    value = %val,
                    "invalid {}, use format like '5s', '30s', '2m'",
                    name
                );
            }
        }
    }

    // Boolean switches
    for (name, slot) in [
        ("WT_FOLLOW_REFERRAL", &mut env_config.follow_referral),
        ("WT_JSON", &mut env_config.json),
    ] {
        if let Some(val) = lookup(name) {
            match parse_bool(&val) {
                Some(flag) => {
                    tracing::info!(value = flag, "using {}", name);
                    *slot = Some(flag);
                }
                None => tracing::warn!(value = %val, "invalid {}, use true/false", name),
            }
        }
    }

    // WT_CONFIG - explicit config file
    if let Some(config_path) = lookup("WT_CONFIG") {
        if !config_path.trim().is_empty() {
            tracing::info!(value = %config_path, "using WT_CONFIG");
            env_config.config = Some(config_path);
        }
    }

    env_config
}

impl EnvConfig {
    /// Layer environment values over `base`.
    pub fn apply_to(&self, mut base: CheckConfig) -> CheckConfig {
        if let Some(concurrency) = self.concurrency {
            base = base.with_concurrency(concurrency);
        }
        if let Some(timeout) = self.timeout.as_deref().and_then(parse_duration) {
            base = base.with_probe_timeout(timeout);
        }
        if let Some(timeout) = self.whois_timeout.as_deref().and_then(parse_duration) {
            base = base.with_whois_timeout(timeout);
        }
        if let Some(follow) = self.follow_referral {
            base = base.with_follow_referral(follow);
        }
        base
    }
}

/// Parse common boolean spellings used in environment variables.
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a timeout string like "5s", "30s", "2m" into seconds.
///
/// # Arguments
///
/// * `timeout_str` - String representation of timeout
///
/// # Returns
///
/// Number of seconds, or None if parsing fails.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    let secs = if timeout_str.ends_with('s') {
        timeout_str
            .strip_suffix('s')
            .and_then(|s| s.parse::<u64>().ok())
    } else if timeout_str.ends_with('m') {
        timeout_str
            .strip_suffix('m')
            .and_then(|s| s.parse::<u64>().ok())
            .map(|m| m * 60)
    } else {
        // Assume seconds if no unit
        timeout_str.parse::<u64>().ok()
    };

    secs.filter(|s| *s > 0)
}

/// [`parse_timeout_string`] as a `Duration`.
pub fn parse_duration(timeout_str: &str) -> Option<Duration> {
    parse_timeout_string(timeout_str).map(Duration::from_secs)
}

fn require_duration(name: &str, value: &str) -> Result<Duration, WhoisThereError> {
    parse_duration(value).ok_or_else(|| {
        WhoisThereError::config(format!(
            "Invalid {} format '{}'. Use format like '5s', '30s', '2m'",
            name, value
        ))
    })
}
