/// `load_config` module: reads the optional YAML config file and merges it with
/// command-line flags and the environment into validated run settings.
///
/// Precedence, highest first: command-line flag, config file, environment.
/// Only the password is read from the environment (`DATA_EXPORTER_PASSWORD`,
/// which `main` may populate from a `.env` file), so it never has to live in
/// the YAML file.
///
/// # Errors
/// File and YAML failures are `anyhow` errors carrying the file path. Missing or
/// invalid values are [`ConfigError`]s and are reported before any request is
/// made.
use anyhow::{Context, Result};
use data_exporter_core::config::ExportRequest;
use data_exporter_core::error::ConfigError;
use data_exporter_core::DepthLimits;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use url::Url;

pub const PASSWORD_ENV: &str = "DATA_EXPORTER_PASSWORD";
pub const DEFAULT_WORKING_DIRECTORY: &str = "./packages";

/// A depth written in YAML as an integer, a float or a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DepthValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl DepthValue {
    fn into_raw(self) -> String {
        match self {
            DepthValue::Integer(n) => n.to_string(),
            DepthValue::Float(n) => n.to_string(),
            DepthValue::Text(s) => s,
        }
    }
}

/// Shape of the YAML config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub package_name: Option<String>,
    pub working_directory: Option<PathBuf>,
    pub path: Option<String>,
    pub max_page_depth: Option<DepthValue>,
    pub max_dam_depth: Option<DepthValue>,
    pub package_count: Option<usize>,
}

/// Loads the YAML config file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let content = fs::read_to_string(path_ref).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
        e
    });
    let content =
        content.with_context(|| format!("Failed to read config file {}", path_ref.display()))?;

    // An empty file is a valid config with nothing set.
    if content.trim().is_empty() {
        return Ok(FileConfig::default());
    }

    let config: FileConfig = serde_yaml::from_str(&content)
        .map_err(|e| {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            e
        })
        .with_context(|| format!("Failed to parse config YAML {}", path_ref.display()))?;
    info!(config_path = ?path_ref, "Parsed config YAML successfully");
    Ok(config)
}

/// Raw, unvalidated values from one configuration source.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigValues {
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub package_name: Option<String>,
    pub working_directory: Option<PathBuf>,
    pub path: Option<String>,
    pub max_page_depth: Option<String>,
    pub max_dam_depth: Option<String>,
    pub package_count: Option<usize>,
}

impl From<FileConfig> for ConfigValues {
    fn from(file: FileConfig) -> Self {
        Self {
            host: file.host,
            username: file.username,
            password: file.password,
            package_name: file.package_name,
            working_directory: file.working_directory,
            path: file.path,
            max_page_depth: file.max_page_depth.map(DepthValue::into_raw),
            max_dam_depth: file.max_dam_depth.map(DepthValue::into_raw),
            package_count: file.package_count,
        }
    }
}

/// Validated connection to the repository and local package location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Scheme, host and port without a trailing slash.
    pub host: String,
    pub username: String,
    pub password: String,
    pub package_name: String,
    pub working_directory: PathBuf,
}

impl ConfigValues {
    /// Values sourced from the process environment.
    pub fn from_env() -> Self {
        Self {
            password: std::env::var(PASSWORD_ENV).ok().filter(|p| !p.is_empty()),
            ..Self::default()
        }
    }

    /// Fills every unset field from `fallback`.
    pub fn or(self, fallback: ConfigValues) -> Self {
        Self {
            host: self.host.or(fallback.host),
            username: self.username.or(fallback.username),
            password: self.password.or(fallback.password),
            package_name: self.package_name.or(fallback.package_name),
            working_directory: self.working_directory.or(fallback.working_directory),
            path: self.path.or(fallback.path),
            max_page_depth: self.max_page_depth.or(fallback.max_page_depth),
            max_dam_depth: self.max_dam_depth.or(fallback.max_dam_depth),
            package_count: self.package_count.or(fallback.package_count),
        }
    }

    pub fn resolve_connection(&self) -> Result<Connection, ConfigError> {
        self.require(&[])?;
        self.connection()
    }

    /// Settings for commands that discover content and create packages.
    pub fn resolve_export(&self) -> Result<(Connection, ExportRequest), ConfigError> {
        self.require(&[("path", is_set(&self.path))])?;
        let limits = DepthLimits::from_arguments(
            self.max_page_depth.as_deref(),
            self.max_dam_depth.as_deref(),
        )?;
        let connection = self.connection()?;
        let request = ExportRequest {
            path: self.path.as_deref().unwrap_or_default().trim().to_owned(),
            limits,
            username: connection.username.clone(),
            package_name: connection.package_name.clone(),
            working_directory: connection.working_directory.clone(),
        };
        Ok((connection, request))
    }

    /// Settings for commands that operate on already created packages.
    pub fn resolve_packages(&self) -> Result<(Connection, usize), ConfigError> {
        self.require(&[("package-count", self.package_count.is_some())])?;
        let connection = self.connection()?;
        Ok((connection, self.package_count.unwrap_or_default()))
    }

    fn require(&self, extra: &[(&'static str, bool)]) -> Result<(), ConfigError> {
        let common = [
            ("host", is_set(&self.host)),
            ("username", is_set(&self.username)),
            ("password", is_set(&self.password)),
            ("package-name", is_set(&self.package_name)),
        ];
        let missing: Vec<&'static str> = common
            .iter()
            .chain(extra)
            .filter(|(_, present)| !present)
            .map(|(name, _)| *name)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            error!(?missing, "Missing required arguments");
            Err(ConfigError::MissingArguments(missing))
        }
    }

    fn connection(&self) -> Result<Connection, ConfigError> {
        let host = validate_host(self.host.as_deref().unwrap_or_default())?;
        let package_name = self.package_name.clone().unwrap_or_default();
        if package_name.contains(['/', '\\']) {
            return Err(ConfigError::InvalidValue {
                argument: "package-name",
                value: package_name,
            });
        }
        Ok(Connection {
            host,
            username: self.username.clone().unwrap_or_default(),
            password: self.password.clone().unwrap_or_default(),
            package_name,
            working_directory: self
                .working_directory
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKING_DIRECTORY)),
        })
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Accepts absolute `http`/`https` URLs and strips the trailing slash.
pub fn validate_host(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidHost {
        host: raw.to_owned(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    if !url.has_host() {
        return Err(invalid("no host".to_owned()));
    }
    Ok(raw.trim().trim_end_matches('/').to_owned())
}
