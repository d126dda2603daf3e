//! CloudAPI client
//!
//! [`VcdClient`] over HTTP: compute policies and organizations through the
//! CloudAPI (`/cloudapi/1.0.0`), typed lookups through the legacy query
//! service (`/api/query`).

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, trace};
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::client::{
    AdminOrg, ApiVersion, ClientError, ClientResult, EntityQuery, EntityRecord, SessionInfo,
    VcdClient,
};
use crate::config::ProviderConfig;
use crate::types::{OrgRecord, Page, VdcComputePolicy};
use crate::utils::{build_urn, extract_uuid};

const ACCESS_TOKEN_HEADER: &str = "X-VMWARE-VCLOUD-ACCESS-TOKEN";
const TENANT_CONTEXT_HEADER: &str = "X-VMWARE-VCLOUD-TENANT-CONTEXT";
const COMPUTE_POLICIES: &str = "cloudapi/1.0.0/vdcComputePolicies";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SupportedVersions {
    #[serde(default)]
    version_info: Vec<VersionInfo>,
}

#[derive(Debug, Deserialize)]
struct VersionInfo {
    version: String,
    #[serde(default)]
    deprecated: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    record: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// Authenticated CloudAPI session
pub struct CloudApiClient {
    http: reqwest::Client,
    /// Endpoint root, without the trailing `/api`
    root: String,
    token: String,
    api_version: ApiVersion,
    session: SessionInfo,
}

impl CloudApiClient {
    /// Log in with the provider configuration
    pub async fn connect(config: &ProviderConfig) -> ClientResult<Self> {
        let http = reqwest::ClientBuilder::new()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(config.max_retry_timeout))
            .danger_accept_invalid_certs(config.allow_unverified_ssl)
            .build()?;
        let root = config
            .url
            .trim_end_matches('/')
            .trim_end_matches("/api")
            .to_string();

        let max_api_version = Self::max_api_version(&http, &root).await?;
        let api_version = config.api_version.min(max_api_version);
        debug!(
            "connecting to {} as {}@{} (API {}, server max {})",
            root, config.user, config.sysorg, api_version, max_api_version
        );

        let login_path = if config.is_system_login() {
            "cloudapi/1.0.0/sessions/provider"
        } else {
            "cloudapi/1.0.0/sessions"
        };
        let response = http
            .post(format!("{}/{}", root, login_path))
            .header(ACCEPT, accept_header("application/json", api_version))
            .basic_auth(
                format!("{}@{}", config.user, config.sysorg),
                Some(&config.password),
            )
            .send()
            .await?;
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(ClientError::Auth(format!(
                "login rejected for {}@{}",
                config.user, config.sysorg
            )));
        }
        let response = check(response, "session").await?;
        let token = response
            .headers()
            .get(ACCESS_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ClientError::Auth(format!("no {} in login response", ACCESS_TOKEN_HEADER)))?;

        let session = if config.is_system_login() {
            SessionInfo::sysadmin(max_api_version)
        } else {
            SessionInfo::tenant(config.sysorg.clone(), max_api_version)
        };

        Ok(Self {
            http,
            root,
            token,
            api_version,
            session,
        })
    }

    /// Highest non-deprecated version listed by `GET /api/versions`
    async fn max_api_version(http: &reqwest::Client, root: &str) -> ClientResult<ApiVersion> {
        let response = http
            .get(format!("{}/api/versions", root))
            .header(ACCEPT, "application/*+json")
            .send()
            .await?;
        let versions: SupportedVersions = check(response, "API versions").await?.json().await?;
        versions
            .version_info
            .iter()
            .filter(|v| !v.deprecated)
            .filter_map(|v| ApiVersion::parse(&v.version))
            .max()
            .ok_or_else(|| ClientError::Decode("no supported API versions listed".to_string()))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.request_as(method, path, "application/json")
    }

    fn request_as(&self, method: Method, path: &str, media_type: &str) -> RequestBuilder {
        trace!("{} {}/{}", method, self.root, path);
        self.http
            .request(method, format!("{}/{}", self.root, path))
            .header(ACCEPT, accept_header(media_type, self.api_version))
            .bearer_auth(&self.token)
    }

    fn tenant_request(&self, method: Method, path: &str, org: &AdminOrg) -> RequestBuilder {
        let request = self.request(method, path);
        match extract_uuid(&org.id) {
            Some(uuid) => request.header(TENANT_CONTEXT_HEADER, uuid),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> ClientResult<T> {
        let response = check(request.send().await?, what).await?;
        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(format!("{}: {}", what, e)))
    }
}

#[async_trait]
impl VcdClient for CloudApiClient {
    fn session(&self) -> &SessionInfo {
        &self.session
    }

    async fn get_admin_org(&self, name: &str) -> ClientResult<AdminOrg> {
        let request = self
            .request(Method::GET, "cloudapi/1.0.0/orgs")
            .query(&[("filter", format!("name=={}", name))]);
        let page: Page<OrgRecord> = self.get_json(request, &format!("org '{}'", name)).await?;
        page.values
            .into_iter()
            .find(|o| o.name == name)
            .map(|o| AdminOrg {
                id: o.id,
                name: o.name,
            })
            .ok_or_else(|| ClientError::not_found(format!("org '{}'", name)))
    }

    async fn create_compute_policy(
        &self,
        org: &AdminOrg,
        policy: &VdcComputePolicy,
    ) -> ClientResult<VdcComputePolicy> {
        let request = self
            .tenant_request(Method::POST, COMPUTE_POLICIES, org)
            .json(policy);
        self.get_json(request, &format!("VM sizing policy '{}'", policy.name))
            .await
    }

    async fn get_compute_policy_by_id(
        &self,
        org: &AdminOrg,
        id: &str,
    ) -> ClientResult<VdcComputePolicy> {
        let path = format!("{}/{}", COMPUTE_POLICIES, id);
        let request = self.tenant_request(Method::GET, &path, org);
        self.get_json(request, &format!("VM sizing policy '{}'", id))
            .await
    }

    async fn get_compute_policy_by_name(
        &self,
        org: &AdminOrg,
        name: &str,
    ) -> ClientResult<VdcComputePolicy> {
        let request = self
            .tenant_request(Method::GET, COMPUTE_POLICIES, org)
            .query(&[("filter", format!("name=={};isSizingOnly==true", name))]);
        let what = format!("VM sizing policy '{}'", name);
        let page: Page<VdcComputePolicy> = self.get_json(request, &what).await?;
        single_sizing_policy(page.values, name)
    }

    async fn update_compute_policy(
        &self,
        org: &AdminOrg,
        policy: &VdcComputePolicy,
    ) -> ClientResult<VdcComputePolicy> {
        let id = policy
            .id
            .as_deref()
            .ok_or_else(|| ClientError::Decode("compute policy has no ID".to_string()))?;
        let path = format!("{}/{}", COMPUTE_POLICIES, id);
        let request = self.tenant_request(Method::PUT, &path, org).json(policy);
        self.get_json(request, &format!("VM sizing policy '{}'", id))
            .await
    }

    async fn delete_compute_policy(&self, org: &AdminOrg, id: &str) -> ClientResult<()> {
        let path = format!("{}/{}", COMPUTE_POLICIES, id);
        let response = self.tenant_request(Method::DELETE, &path, org).send().await?;
        check(response, &format!("VM sizing policy '{}'", id)).await?;
        Ok(())
    }

    async fn query_entities(&self, query: &EntityQuery) -> ClientResult<Vec<EntityRecord>> {
        let mut params = vec![
            ("type", query.query_type.clone()),
            ("format", "records".to_string()),
        ];
        if !query.filters.is_empty() {
            params.push(("filter", query.fiql()));
        }
        let request = self
            .request_as(Method::GET, "api/query", "application/*+json")
            .query(&params);

        let result: QueryResult = match self.get_json(request, &query.to_string()).await {
            Ok(result) => result,
            Err(ClientError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        Ok(result
            .record
            .iter()
            .map(|fields| to_entity_record(&query.query_type, fields))
            .collect())
    }
}

fn accept_header(media_type: &str, version: ApiVersion) -> HeaderValue {
    HeaderValue::from_str(&format!("{};version={}", media_type, version))
        .unwrap_or_else(|_| HeaderValue::from_static("application/json"))
}

/// Map HTTP failures to client errors
async fn check(response: Response, what: &str) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    debug!("{} failed with HTTP {}: {}", what, status, body);
    Err(status_error(status, body, what))
}

/// Error for a non-success status; 404 is "entity not found"
fn status_error(status: StatusCode, body: String, what: &str) -> ClientError {
    if status == StatusCode::NOT_FOUND {
        return ClientError::not_found(what);
    }
    ClientError::Api {
        status: status.as_u16(),
        message: body,
    }
}

/// The one sizing policy called `name` among filtered results
fn single_sizing_policy(
    values: Vec<VdcComputePolicy>,
    name: &str,
) -> ClientResult<VdcComputePolicy> {
    let mut matches: Vec<VdcComputePolicy> =
        values.into_iter().filter(|p| p.name == name).collect();
    match matches.len() {
        0 => Err(ClientError::not_found(format!(
            "VM sizing policy '{}'",
            name
        ))),
        1 => Ok(matches.remove(0)),
        n => Err(ClientError::Api {
            status: 409,
            message: format!("{} VM sizing policies named '{}'", n, name),
        }),
    }
}

/// Build an entity record from a query result row
///
/// Rows carry an `href`; the ID is taken from an explicit `id` field when
/// present, otherwise built from the UUID at the end of the href.
fn to_entity_record(
    query_type: &str,
    fields: &serde_json::Map<String, serde_json::Value>,
) -> EntityRecord {
    let text = |key: &str| fields.get(key).and_then(|v| v.as_str()).map(str::to_string);
    let href = text("href");
    let id = text("id")
        .or_else(|| {
            href.as_deref()
                .and_then(extract_uuid)
                .map(|uuid| build_urn(query_type, uuid))
        })
        .unwrap_or_default();

    let mut record = EntityRecord::new(id, text("name").unwrap_or_default());
    record.href = href;
    for (key, value) in fields {
        if matches!(key.as_str(), "id" | "name" | "href") {
            continue;
        }
        let value = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            _ => continue,
        };
        record.attributes.insert(key.clone(), value);
    }
    record
}
