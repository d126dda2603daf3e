//! Test configuration
//!
//! JSON file describing the environment acceptance tests run against,
//! loaded from an explicit path or from `VCD_CONFIG`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use vcd_provider::client::ApiVersion;
use vcd_provider::config::{DEFAULT_API_VERSION, DEFAULT_IMPORT_SEPARATOR, ProviderConfig};

use crate::HarnessError;

/// Environment variable naming the test configuration file
pub const CONFIG_ENV: &str = "VCD_CONFIG";

/// Environment variable that turns on short mode
pub const SHORT_TEST_ENV: &str = "VCD_SHORT_TEST";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConfig {
    #[serde(default)]
    pub provider: ProviderSection,
    #[serde(default)]
    pub vcd: VcdSection,
    #[serde(default)]
    pub networking: NetworkingSection,
    #[serde(default)]
    pub nsxt: NsxtSection,
    /// Skip everything that needs a live endpoint
    #[serde(default)]
    pub short_test: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSection {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// Organization used to log in ("System" for administrators)
    #[serde(default)]
    pub sys_org: String,
    #[serde(default)]
    pub allow_insecure: bool,
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub max_retry_timeout: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VcdSection {
    #[serde(default)]
    pub org: String,
    #[serde(default)]
    pub vdc: String,
    #[serde(default)]
    pub catalog: CatalogSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSection {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkingSection {
    #[serde(default)]
    pub edge_gateway: String,
    /// Either `DV_PORTGROUP` or `NETWORK`
    #[serde(default)]
    pub external_network_port_group_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NsxtSection {
    #[serde(default)]
    pub manager: String,
    #[serde(default)]
    pub tier0router: String,
}

impl TestConfig {
    /// Load from a JSON file; `VCD_SHORT_TEST` also turns on short mode
    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Load from a JSON file with an explicit environment lookup
    pub fn load_with_env(
        path: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, HarnessError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HarnessError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let mut config: Self = serde_json::from_str(&content).map_err(|e| {
            HarnessError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        config.short_test |= env(SHORT_TEST_ENV).is_some();
        Ok(config)
    }

    /// Load from the file named by `VCD_CONFIG`
    pub fn from_env() -> Result<Self, HarnessError> {
        let path = std::env::var(CONFIG_ENV)
            .map_err(|_| HarnessError::Config(format!("{} is not set", CONFIG_ENV)))?;
        Self::load(Path::new(&path))
    }

    /// True when everything needing a live endpoint is skipped
    pub fn is_short(&self) -> bool {
        self.short_test
    }

    /// True when both NSX-T manager and tier-0 router are configured
    pub fn has_nsxt(&self) -> bool {
        !self.nsxt.manager.is_empty() && !self.nsxt.tier0router.is_empty()
    }

    /// Provider configuration for the endpoint under test
    pub fn provider_config(&self) -> Result<ProviderConfig, HarnessError> {
        let api_version = match &self.provider.api_version {
            Some(v) => ApiVersion::parse(v).ok_or_else(|| {
                HarnessError::Config(format!("'{}' is not an API version", v))
            })?,
            None => DEFAULT_API_VERSION,
        };
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());

        Ok(ProviderConfig {
            url: self.provider.url.trim_end_matches('/').to_string(),
            user: self.provider.user.clone(),
            password: self.provider.password.clone(),
            sysorg: non_empty(&self.provider.sys_org)
                .or_else(|| non_empty(&self.vcd.org))
                .unwrap_or_else(|| "System".to_string()),
            org: non_empty(&self.vcd.org),
            vdc: non_empty(&self.vcd.vdc),
            allow_unverified_ssl: self.provider.allow_insecure,
            import_separator: DEFAULT_IMPORT_SEPARATOR.to_string(),
            api_version,
            max_retry_timeout: self.provider.max_retry_timeout.unwrap_or(60),
        })
    }
}
