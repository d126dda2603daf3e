//! Remote client contract
//!
//! The provider never talks HTTP directly: every remote call goes through
//! [`VcdClient`], implemented by the CloudAPI adapter and by the in-memory
//! client used in tests.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use vcd_core::provider::{ErrorKind, ProviderError};

use crate::types::VdcComputePolicy;

/// Errors returned by a [`VcdClient`]
#[derive(Debug, Error)]
pub enum ClientError {
    /// The requested entity does not exist
    #[error("[ENF] entity not found: {0}")]
    NotFound(String),

    /// The remote system rejected the request
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Login failed or the session is no longer valid
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Transport failure
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response could not be decoded
    #[error("invalid response: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}

impl From<ClientError> for ProviderError {
    fn from(e: ClientError) -> Self {
        let kind = if e.is_not_found() {
            ErrorKind::NotFound
        } else {
            ErrorKind::Remote
        };
        ProviderError::new(kind, e.to_string()).with_cause(e)
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// API version, compared numerically (`9.0 < 33.0 < 36.1`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
}

impl ApiVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parse "36.0" or "36"
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().splitn(2, '.');
        let major = parts.next()?.parse().ok()?;
        let minor = match parts.next() {
            Some(m) => m.parse().ok()?,
            None => 0,
        };
        Some(Self { major, minor })
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Facts about the authenticated session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Organization the session authenticated against
    pub org: String,
    /// True when connected as system administrator
    pub is_sysadmin: bool,
    /// Highest API version supported by the endpoint
    pub max_api_version: ApiVersion,
}

impl SessionInfo {
    pub fn sysadmin(max_api_version: ApiVersion) -> Self {
        Self {
            org: "System".to_string(),
            is_sysadmin: true,
            max_api_version,
        }
    }

    pub fn tenant(org: impl Into<String>, max_api_version: ApiVersion) -> Self {
        Self {
            org: org.into(),
            is_sysadmin: false,
            max_api_version,
        }
    }
}

/// Organization as seen by an administrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminOrg {
    pub id: String,
    pub name: String,
}

/// Generic record returned by a typed query
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntityRecord {
    pub id: String,
    pub name: String,
    pub href: Option<String>,
    pub attributes: HashMap<String, String>,
}

impl EntityRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Value of a filter field: `id`, `name`, or any attribute
    pub fn field(&self, field: &str) -> Option<&str> {
        match field {
            "id" => Some(&self.id),
            "name" => Some(&self.name),
            other => self.attributes.get(other).map(String::as_str),
        }
    }

    /// True if every `(field, value)` filter matches
    pub fn matches(&self, filters: &[(String, String)]) -> bool {
        filters
            .iter()
            .all(|(field, value)| self.field(field) == Some(value.as_str()))
    }
}

/// Typed query against the remote query service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityQuery {
    pub query_type: String,
    pub filters: Vec<(String, String)>,
}

impl EntityQuery {
    pub fn new(query_type: impl Into<String>) -> Self {
        Self {
            query_type: query_type.into(),
            filters: Vec::new(),
        }
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    /// FIQL rendering: `name==a;catalogName==b`
    pub fn fiql(&self) -> String {
        self.filters
            .iter()
            .map(|(k, v)| format!("{}=={}", k, v))
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl fmt::Display for EntityQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.filters.is_empty() {
            write!(f, "{}", self.query_type)
        } else {
            write!(f, "{} ({})", self.query_type, self.fiql())
        }
    }
}

/// Operations the provider needs from the remote system
#[async_trait]
pub trait VcdClient: Send + Sync {
    /// Session the client is authenticated with
    fn session(&self) -> &SessionInfo;

    /// Look up an organization by name
    async fn get_admin_org(&self, name: &str) -> ClientResult<AdminOrg>;

    /// Create a compute policy; the returned object carries the new ID
    async fn create_compute_policy(
        &self,
        org: &AdminOrg,
        policy: &VdcComputePolicy,
    ) -> ClientResult<VdcComputePolicy>;

    async fn get_compute_policy_by_id(
        &self,
        org: &AdminOrg,
        id: &str,
    ) -> ClientResult<VdcComputePolicy>;

    async fn get_compute_policy_by_name(
        &self,
        org: &AdminOrg,
        name: &str,
    ) -> ClientResult<VdcComputePolicy>;

    async fn update_compute_policy(
        &self,
        org: &AdminOrg,
        policy: &VdcComputePolicy,
    ) -> ClientResult<VdcComputePolicy>;

    async fn delete_compute_policy(&self, org: &AdminOrg, id: &str) -> ClientResult<()>;

    /// Run a typed query; an empty result is not an error
    async fn query_entities(&self, query: &EntityQuery) -> ClientResult<Vec<EntityRecord>>;
}

#[async_trait]
impl<C: VcdClient + ?Sized> VcdClient for Box<C> {
    fn session(&self) -> &SessionInfo {
        (**self).session()
    }

    async fn get_admin_org(&self, name: &str) -> ClientResult<AdminOrg> {
        (**self).get_admin_org(name).await
    }

    async fn create_compute_policy(
        &self,
        org: &AdminOrg,
        policy: &VdcComputePolicy,
    ) -> ClientResult<VdcComputePolicy> {
        (**self).create_compute_policy(org, policy).await
    }

    async fn get_compute_policy_by_id(
        &self,
        org: &AdminOrg,
        id: &str,
    ) -> ClientResult<VdcComputePolicy> {
        (**self).get_compute_policy_by_id(org, id).await
    }

    async fn get_compute_policy_by_name(
        &self,
        org: &AdminOrg,
        name: &str,
    ) -> ClientResult<VdcComputePolicy> {
        (**self).get_compute_policy_by_name(org, name).await
    }

    async fn update_compute_policy(
        &self,
        org: &AdminOrg,
        policy: &VdcComputePolicy,
    ) -> ClientResult<VdcComputePolicy> {
        (**self).update_compute_policy(org, policy).await
    }

    async fn delete_compute_policy(&self, org: &AdminOrg, id: &str) -> ClientResult<()> {
        (**self).delete_compute_policy(org, id).await
    }

    async fn query_entities(&self, query: &EntityQuery) -> ClientResult<Vec<EntityRecord>> {
        (**self).query_entities(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcd_core::provider::ENTITY_NOT_FOUND;

    #[test]
    fn not_found_carries_marker() {
        let err = ClientError::not_found("VM sizing policy 'x'");
        assert!(err.to_string().contains(ENTITY_NOT_FOUND));

        let provider_err: ProviderError = err.into();
        assert!(provider_err.is_not_found());
        assert!(provider_err.to_string().contains(ENTITY_NOT_FOUND));
    }

    #[test]
    fn other_errors_are_remote() {
        let err = ClientError::Api {
            status: 400,
            message: "bad request".to_string(),
        };
        let provider_err: ProviderError = err.into();
        assert_eq!(provider_err.kind, ErrorKind::Remote);
        assert!(!provider_err.to_string().contains(ENTITY_NOT_FOUND));
    }

    #[test]
    fn api_version_ordering() {
        assert_eq!(ApiVersion::parse("33.0"), Some(ApiVersion::new(33, 0)));
        assert_eq!(ApiVersion::parse("36"), Some(ApiVersion::new(36, 0)));
        assert_eq!(ApiVersion::parse("x"), None);
        assert!(ApiVersion::new(32, 0) < ApiVersion::new(33, 0));
        assert!(ApiVersion::new(33, 1) > ApiVersion::new(33, 0));
        assert!(ApiVersion::new(9, 0) < ApiVersion::new(31, 0));
    }

    #[test]
    fn entity_matching() {
        let record = EntityRecord::new("urn:vcloud:vm:1", "web")
            .with_attribute("containerName", "vapp1");

        assert!(record.matches(&[("name".to_string(), "web".to_string())]));
        assert!(record.matches(&[
            ("name".to_string(), "web".to_string()),
            ("containerName".to_string(), "vapp1".to_string()),
        ]));
        assert!(!record.matches(&[("name".to_string(), "db".to_string())]));
        assert!(!record.matches(&[("missing".to_string(), "x".to_string())]));
    }

    #[test]
    fn query_rendering() {
        let query = EntityQuery::new("catalogItem")
            .filter("name", "does-not-exist")
            .filter("catalogName", "cat");
        assert_eq!(query.fiql(), "name==does-not-exist;catalogName==cat");
        assert_eq!(
            query.to_string(),
            "catalogItem (name==does-not-exist;catalogName==cat)"
        );
    }
}
