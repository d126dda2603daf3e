//! Provider configuration
//!
//! Read from the `provider "vcd"` block, with `VCD_*` environment variables
//! filling in attributes the block leaves out.

use std::collections::HashMap;

use thiserror::Error;
use vcd_core::provider::ProviderError;
use vcd_core::resource::Value;

use crate::client::ApiVersion;

/// Separator used in import keys when nothing else is configured
pub const DEFAULT_IMPORT_SEPARATOR: &str = ".";

/// API version requested when the configuration does not pin one
pub const DEFAULT_API_VERSION: ApiVersion = ApiVersion::new(36, 0);

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("provider attribute `{0}` is required (or set {1})")]
    Missing(&'static str, &'static str),

    #[error("invalid provider attribute `{field}`: {message}")]
    Invalid { field: &'static str, message: String },
}

impl From<ConfigError> for ProviderError {
    fn from(e: ConfigError) -> Self {
        ProviderError::configuration(e.to_string())
    }
}

/// Resolved provider configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    /// API endpoint, e.g. https://vcd.example.com/api
    pub url: String,
    pub user: String,
    pub password: String,
    /// Organization used to authenticate ("System" for administrators)
    pub sysorg: String,
    /// Default organization for resources that omit `org`
    pub org: Option<String>,
    /// Default VDC for resources that omit `vdc`
    pub vdc: Option<String>,
    pub allow_unverified_ssl: bool,
    pub import_separator: String,
    pub api_version: ApiVersion,
    /// Upper bound for a single request, in seconds
    pub max_retry_timeout: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            user: String::new(),
            password: String::new(),
            sysorg: "System".to_string(),
            org: None,
            vdc: None,
            allow_unverified_ssl: false,
            import_separator: DEFAULT_IMPORT_SEPARATOR.to_string(),
            api_version: DEFAULT_API_VERSION,
            max_retry_timeout: 60,
        }
    }
}

impl ProviderConfig {
    /// Build from a provider block, falling back to the process environment
    pub fn from_attributes(attributes: &HashMap<String, Value>) -> Result<Self, ConfigError> {
        Self::from_attributes_with_env(attributes, |key| std::env::var(key).ok())
    }

    /// Build from a provider block with an explicit environment lookup
    pub fn from_attributes_with_env(
        attributes: &HashMap<String, Value>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let get = |key: &str, var: &str| -> Option<String> {
            attributes
                .get(key)
                .and_then(Value::as_scalar_string)
                .filter(|s| !s.is_empty())
                .or_else(|| env(var).filter(|s| !s.is_empty()))
        };

        let url = get("url", "VCD_URL").ok_or(ConfigError::Missing("url", "VCD_URL"))?;
        let user = get("user", "VCD_USER").ok_or(ConfigError::Missing("user", "VCD_USER"))?;
        let password = get("password", "VCD_PASSWORD")
            .ok_or(ConfigError::Missing("password", "VCD_PASSWORD"))?;

        let org = get("org", "VCD_ORG");
        let sysorg = get("sysorg", "VCD_SYS_ORG")
            .or_else(|| org.clone())
            .unwrap_or_else(|| "System".to_string());

        let allow_unverified_ssl = match attributes.get("allow_unverified_ssl") {
            Some(Value::Bool(b)) => *b,
            Some(other) => parse_bool(
                "allow_unverified_ssl",
                &other.as_scalar_string().unwrap_or_default(),
            )?,
            None => match env("VCD_ALLOW_UNVERIFIED_SSL") {
                Some(s) => parse_bool("allow_unverified_ssl", &s)?,
                None => false,
            },
        };

        let api_version = match get("api_version", "VCD_API_VERSION") {
            Some(s) => ApiVersion::parse(&s).ok_or_else(|| ConfigError::Invalid {
                field: "api_version",
                message: format!("'{}' is not a version like 36.0", s),
            })?,
            None => DEFAULT_API_VERSION,
        };

        let max_retry_timeout = match get("max_retry_timeout", "VCD_MAX_RETRY_TIMEOUT") {
            Some(s) => s.parse().map_err(|_| ConfigError::Invalid {
                field: "max_retry_timeout",
                message: format!("'{}' is not a number of seconds", s),
            })?,
            None => 60,
        };

        let import_separator = get("import_separator", "VCD_IMPORT_SEPARATOR")
            .unwrap_or_else(|| DEFAULT_IMPORT_SEPARATOR.to_string());

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            user,
            password,
            sysorg,
            org,
            vdc: get("vdc", "VCD_VDC"),
            allow_unverified_ssl,
            import_separator,
            api_version,
            max_retry_timeout,
        })
    }

    /// True when authenticating against the System organization
    pub fn is_system_login(&self) -> bool {
        self.sysorg.eq_ignore_ascii_case("system")
    }
}

fn parse_bool(field: &'static str, s: &str) -> Result<bool, ConfigError> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        other => Err(ConfigError::Invalid {
            field,
            message: format!("'{}' is not a boolean", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn block_attributes_win_over_env() {
        let attributes = attrs(&[
            ("url", Value::String("https://vcd.example.com/api/".to_string())),
            ("user", Value::String("admin".to_string())),
            ("password", Value::String("secret".to_string())),
            ("org", Value::String("org1".to_string())),
        ]);
        let config = ProviderConfig::from_attributes_with_env(&attributes, |key| match key {
            "VCD_ORG" => Some("env-org".to_string()),
            "VCD_SYS_ORG" => Some("System".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.url, "https://vcd.example.com/api");
        assert_eq!(config.org.as_deref(), Some("org1"));
        assert_eq!(config.sysorg, "System");
        assert!(config.is_system_login());
        assert_eq!(config.import_separator, ".");
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
    }

    #[test]
    fn env_fallbacks() {
        let config = ProviderConfig::from_attributes_with_env(&HashMap::new(), |key| match key {
            "VCD_URL" => Some("https://vcd/api".to_string()),
            "VCD_USER" => Some("u".to_string()),
            "VCD_PASSWORD" => Some("p".to_string()),
            "VCD_ORG" => Some("tenant".to_string()),
            "VCD_IMPORT_SEPARATOR" => Some("/".to_string()),
            "VCD_ALLOW_UNVERIFIED_SSL" => Some("true".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.import_separator, "/");
        assert!(config.allow_unverified_ssl);
        // Without sysorg, authentication happens against the default org
        assert_eq!(config.sysorg, "tenant");
        assert!(!config.is_system_login());
    }

    #[test]
    fn missing_url() {
        let err = ProviderConfig::from_attributes_with_env(&HashMap::new(), no_env).unwrap_err();
        assert_eq!(err, ConfigError::Missing("url", "VCD_URL"));
    }

    #[test]
    fn invalid_api_version() {
        let attributes = attrs(&[
            ("url", Value::String("https://vcd/api".to_string())),
            ("user", Value::String("u".to_string())),
            ("password", Value::String("p".to_string())),
            ("api_version", Value::String("latest".to_string())),
        ]);
        let err = ProviderConfig::from_attributes_with_env(&attributes, no_env).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "api_version",
                ..
            }
        ));
    }
}
