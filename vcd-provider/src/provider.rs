//! vCloud Director provider implementation
//!
//! Handlers for the VM sizing policy resource and for every registered data
//! source. Handlers resolve the organization, map the configuration through
//! [`SizingPolicyRecord`] and delegate remote work to a [`VcdClient`].

use std::collections::HashMap;

use log::{debug, info, trace};
use vcd_core::differ::{self, Diff};
use vcd_core::provider::{ErrorKind, ProviderError, ProviderResult};
use vcd_core::resource::{Resource, ResourceId, State, Value};
use vcd_core::schema::ResourceSchema;

use crate::client::{AdminOrg, ClientError, EntityQuery, EntityRecord, VcdClient};
use crate::cloudapi::CloudApiClient;
use crate::config::ProviderConfig;
use crate::import::ImportKey;
use crate::policy::{SizingPolicyRecord, apply_update};
use crate::schemas::data_sources::{DataSourceConfig, Lookup, ParentLookup, Requirement};
use crate::schemas::vm_sizing_policy::{self, RESOURCE_TYPE};
use crate::types::VdcComputePolicy;

/// Attributes whose removal from the configuration is an update
const TRACKED_ATTRIBUTES: &[&str] = &["description", "cpu", "memory"];

/// vCloud Director provider
pub struct VcdProvider<C> {
    client: C,
    config: ProviderConfig,
}

impl VcdProvider<CloudApiClient> {
    /// Log in to the configured endpoint
    pub async fn connect(config: ProviderConfig) -> ProviderResult<Self> {
        let client = CloudApiClient::connect(&config).await?;
        info!(
            "connected to {} (system administrator: {})",
            config.url,
            client.session().is_sysadmin
        );
        Ok(Self::new(client, config))
    }
}

impl<C: VcdClient> VcdProvider<C> {
    pub fn new(client: C, config: ProviderConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    // =========================================================================
    // Context
    // =========================================================================

    /// Organization named by the `org` attribute, or the provider default
    fn org_name(
        &self,
        id: &ResourceId,
        attributes: &HashMap<String, Value>,
    ) -> ProviderResult<String> {
        attributes
            .get("org")
            .and_then(Value::as_scalar_string)
            .filter(|s| !s.is_empty())
            .or_else(|| self.config.org.clone())
            .ok_or_else(|| {
                ProviderError::configuration(
                    "error retrieving Org: no org given in the resource or provider configuration",
                )
                .for_resource(id.clone())
            })
    }

    async fn admin_org(&self, id: &ResourceId, name: &str) -> ProviderResult<AdminOrg> {
        self.client.get_admin_org(name).await.map_err(|e| {
            let kind = if e.is_not_found() {
                ErrorKind::NotFound
            } else {
                ErrorKind::Remote
            };
            ProviderError::new(kind, format!("error retrieving Org '{}': {}", name, e))
                .for_resource(id.clone())
                .with_cause(e)
        })
    }

    fn require_sysadmin(&self, id: &ResourceId) -> ProviderResult<()> {
        if self.client.session().is_sysadmin {
            Ok(())
        } else {
            Err(ProviderError::privilege_required().for_resource(id.clone()))
        }
    }

    /// State for a fetched policy
    fn policy_state(&self, id: ResourceId, org: &str, remote: &VdcComputePolicy) -> State {
        let record = SizingPolicyRecord::from_remote(remote).with_org(org);
        let state = State::existing(id, record.to_attributes());
        match &remote.id {
            Some(policy_id) => state.with_identifier(policy_id.clone()),
            None => state,
        }
    }

    // =========================================================================
    // VM Sizing Policy Resource
    // =========================================================================

    /// Create a VM sizing policy
    pub async fn create_sizing_policy(&self, resource: &Resource) -> ProviderResult<State> {
        let id = &resource.id;
        let record = SizingPolicyRecord::from_attributes(&resource.attributes)
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        trace!("VM sizing policy creation initiated: {}", record.name);

        self.require_sysadmin(id)?;
        let org_name = self.org_name(id, &resource.attributes)?;
        let org = self.admin_org(id, &org_name).await?;

        let request = record
            .to_remote()
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        validate(&vm_sizing_policy::resource_schema(), resource)?;

        let created = self
            .client
            .create_compute_policy(&org, &request)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        let policy_id = created.id.clone().ok_or_else(|| {
            ProviderError::remote("created VM sizing policy has no ID").for_resource(id.clone())
        })?;
        debug!("VM sizing policy created: {} ({})", record.name, policy_id);

        self.read_policy(id.clone(), &org, &policy_id).await
    }

    /// Refresh a VM sizing policy; a missing policy yields `exists = false`
    pub async fn read_sizing_policy(&self, state: &State) -> ProviderResult<State> {
        let id = &state.id;
        let Some(policy_id) = state.identifier.as_deref() else {
            return Ok(State::not_found(id.clone()));
        };
        trace!("VM sizing policy read initiated: {}", policy_id);

        let org_name = self.org_name(id, &state.attributes)?;
        let org = self.admin_org(id, &org_name).await?;
        match self.read_policy(id.clone(), &org, policy_id).await {
            Err(e) if e.is_not_found() => {
                debug!("VM sizing policy {} not found, removing from state", policy_id);
                Ok(State::not_found(id.clone()))
            }
            other => other,
        }
    }

    async fn read_policy(
        &self,
        id: ResourceId,
        org: &AdminOrg,
        policy_id: &str,
    ) -> ProviderResult<State> {
        let remote = self
            .client
            .get_compute_policy_by_id(org, policy_id)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        Ok(self.policy_state(id, &org.name, &remote))
    }

    /// Update name and description of a VM sizing policy
    pub async fn update_sizing_policy(&self, from: &State, to: &Resource) -> ProviderResult<State> {
        let id = &to.id;
        let policy_id = from.identifier.as_deref().ok_or_else(|| {
            ProviderError::configuration("cannot update a VM sizing policy without an ID")
                .for_resource(id.clone())
        })?;

        let changed = match differ::diff(to, from, TRACKED_ATTRIBUTES) {
            Diff::Update {
                changed_attributes, ..
            } => changed_attributes,
            Diff::NoChange(_) => return Ok(from.clone()),
            Diff::Create(_) => return self.create_sizing_policy(to).await,
        };
        trace!(
            "VM sizing policy update initiated: {} ({})",
            policy_id,
            changed.join(", ")
        );

        let old = SizingPolicyRecord::from_attributes(&from.attributes)
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        let new = SizingPolicyRecord::from_attributes(&to.attributes)
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

        let org_name = self.org_name(id, &from.attributes)?;
        if let Some(new_org) = &new.org
            && *new_org != org_name
        {
            return Err(ProviderError::configuration(format!(
                "org cannot be changed in place (from '{}' to '{}')",
                org_name, new_org
            ))
            .for_resource(id.clone()));
        }
        let org = self.admin_org(id, &org_name).await?;

        let mut remote = self
            .client
            .get_compute_policy_by_id(&org, policy_id)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        apply_update(&mut remote, &old, &new)
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

        self.client
            .update_compute_policy(&org, &remote)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        debug!("VM sizing policy updated: {}", policy_id);

        self.read_policy(id.clone(), &org, policy_id).await
    }

    /// Delete a VM sizing policy; a policy that is already gone is not an error
    pub async fn delete_sizing_policy(&self, state: &State) -> ProviderResult<()> {
        let id = &state.id;
        let Some(policy_id) = state.identifier.as_deref() else {
            return Ok(());
        };
        trace!("VM sizing policy delete initiated: {}", policy_id);

        self.require_sysadmin(id)?;
        let org_name = self.org_name(id, &state.attributes)?;
        let org = self.admin_org(id, &org_name).await?;

        match self.client.delete_compute_policy(&org, policy_id).await {
            Ok(()) => {
                debug!("VM sizing policy deleted: {}", policy_id);
                Ok(())
            }
            Err(ClientError::NotFound(_)) => {
                debug!("VM sizing policy {} already deleted", policy_id);
                Ok(())
            }
            Err(e) => Err(ProviderError::from(e).for_resource(id.clone())),
        }
    }

    /// Import a VM sizing policy from `<org><separator><policy-id>`
    pub async fn import_sizing_policy(&self, key: &str) -> ProviderResult<State> {
        let key = ImportKey::parse(key, &self.config.import_separator)?;
        trace!("VM sizing policy import initiated: {} in {}", key.id, key.org);

        let id = ResourceId::new(RESOURCE_TYPE, key.id.clone());
        let org = self.admin_org(&id, &key.org).await?;
        let remote = self
            .client
            .get_compute_policy_by_id(&org, &key.id)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        debug!("VM sizing policy imported: {} ({})", remote.name, key.id);

        let id = ResourceId::new(RESOURCE_TYPE, remote.name.clone());
        Ok(self.policy_state(id, &org.name, &remote))
    }

    // =========================================================================
    // Data Sources
    // =========================================================================

    /// Look up a VM sizing policy by name
    pub async fn read_sizing_policy_data_source(&self, query: &Resource) -> ProviderResult<State> {
        let id = &query.id;
        validate(&vm_sizing_policy::data_source_schema(), query)?;
        let name = query.get_string("name").unwrap_or_default();
        trace!("VM sizing policy data source read initiated: {}", name);

        let org_name = self.org_name(id, &query.attributes)?;
        let org = self.admin_org(id, &org_name).await?;
        let remote = self
            .client
            .get_compute_policy_by_name(&org, &name)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

        Ok(self.policy_state(id.clone(), &org.name, &remote))
    }

    /// Read a table-driven data source
    ///
    /// Every referenced parent must exist; then the entity itself is queried
    /// with its identity and filter attributes. Both a missing parent and an
    /// empty result are "entity not found" errors.
    pub async fn read_entity_data_source(
        &self,
        data_source: &DataSourceConfig,
        query: &Resource,
    ) -> ProviderResult<State> {
        let id = &query.id;
        let Lookup::Query {
            query_type,
            identity,
            filters,
            parents,
        } = data_source.lookup
        else {
            return self.read_sizing_policy_data_source(query).await;
        };
        validate(&data_source.schema(), query)?;
        trace!("{} data source read initiated", data_source.name);

        let mut entity_query = EntityQuery::new(query_type);
        for parent in parents {
            let Some(value) = self.parent_value(parent, query) else {
                continue;
            };
            self.require_parent(id, parent, &value).await?;
            entity_query = entity_query.filter(parent.child_field, value);
        }

        let mut identified = identity.is_empty();
        for (attribute, field) in identity.iter().chain(filters.iter()) {
            if let Some(value) = query.get_string(attribute) {
                identified |= identity.iter().any(|(a, _)| a == attribute);
                entity_query = entity_query.filter(*field, value);
            }
        }
        if !identified {
            let names: Vec<&str> = identity.iter().map(|(a, _)| *a).collect();
            return Err(ProviderError::configuration(format!(
                "one of {} is required",
                names.join(", ")
            ))
            .for_resource(id.clone()));
        }

        debug!("querying {}", entity_query);
        let records = self
            .client
            .query_entities(&entity_query)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        let record = records.into_iter().next().ok_or_else(|| {
            ProviderError::from(ClientError::not_found(format!(
                "{} {}",
                data_source.name, entity_query
            )))
            .for_resource(id.clone())
        })?;

        Ok(entity_state(data_source, query, &record))
    }

    /// Parent reference from the query, falling back to provider defaults
    fn parent_value(&self, parent: &ParentLookup, query: &Resource) -> Option<String> {
        query
            .get_string(parent.attribute)
            .filter(|s| !s.is_empty())
            .or_else(|| match parent.attribute {
                "org" => self.config.org.clone(),
                "vdc" => self.config.vdc.clone(),
                _ => None,
            })
    }

    async fn require_parent(
        &self,
        id: &ResourceId,
        parent: &ParentLookup,
        value: &str,
    ) -> ProviderResult<()> {
        let parent_query = EntityQuery::new(parent.query_type).filter(parent.match_field, value);
        let found = self
            .client
            .query_entities(&parent_query)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        if found.is_empty() {
            debug!("{} '{}' not found", parent.attribute, value);
            return Err(ProviderError::from(ClientError::not_found(format!(
                "{} '{}'",
                parent.attribute, value
            )))
            .for_resource(id.clone()));
        }
        Ok(())
    }
}

/// Validate configuration attributes against a schema
fn validate(schema: &ResourceSchema, resource: &Resource) -> ProviderResult<()> {
    schema.validate(&resource.attributes).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        ProviderError::configuration(format!("invalid configuration: {}", messages.join("; ")))
            .for_resource(resource.id.clone())
    })
}

/// State for a data source read: the query attributes plus what the record
/// provides for computed fields
fn entity_state(data_source: &DataSourceConfig, query: &Resource, record: &EntityRecord) -> State {
    let mut attributes = query.attributes.clone();
    attributes.insert("id".to_string(), Value::String(record.id.clone()));
    for field in data_source.fields {
        if field.requirement != Requirement::Computed {
            continue;
        }
        if let Some(value) = record.field(field.name) {
            attributes.insert(field.name.to_string(), Value::String(value.to_string()));
        }
    }
    State::existing(query.id.clone(), attributes).with_identifier(record.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ApiVersion, SessionInfo};
    use crate::memory::InMemoryClient;
    use crate::schemas::data_sources::get_data_source_config;
    use vcd_core::provider::ENTITY_NOT_FOUND;

    fn config() -> ProviderConfig {
        ProviderConfig {
            url: "https://vcd.example.com/api".to_string(),
            user: "admin".to_string(),
            password: "secret".to_string(),
            org: Some("org1".to_string()),
            vdc: Some("vdc1".to_string()),
            ..Default::default()
        }
    }

    fn provider() -> VcdProvider<InMemoryClient> {
        let client = InMemoryClient::new()
            .with_org("org1")
            .with_entity("orgVdc", EntityRecord::new("urn:vcloud:vdc:1", "vdc1"))
            .with_entity(
                "catalog",
                EntityRecord::new("urn:vcloud:catalog:1", "cat1").with_attribute("orgName", "org1"),
            )
            .with_entity(
                "catalogItem",
                EntityRecord::new("urn:vcloud:catalogitem:1", "photon")
                    .with_attribute("orgName", "org1")
                    .with_attribute("catalogName", "cat1")
                    .with_attribute("description", "Photon OS"),
            );
        VcdProvider::new(client, config())
    }

    fn block(pairs: &[(&str, &str)]) -> Value {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect();
        Value::List(vec![Value::Map(map)])
    }

    fn sizing_policy(name: &str) -> Resource {
        Resource::new(RESOURCE_TYPE, "small")
            .with_attribute("name", Value::String(name.to_string()))
            .with_attribute("description", Value::String("small VMs".to_string()))
            .with_attribute(
                "cpu",
                block(&[("count", "2"), ("reservation_guarantee", "0.5")]),
            )
            .with_attribute("memory", block(&[("size_in_mb", "2048")]))
    }

    #[tokio::test]
    async fn create_and_read() {
        let provider = provider();
        let state = provider
            .create_sizing_policy(&sizing_policy("small"))
            .await
            .unwrap();
        assert!(state.exists);
        assert!(state.identifier.is_some());
        assert_eq!(
            state.attributes.get("org"),
            Some(&Value::String("org1".to_string()))
        );
        assert_eq!(
            state.attributes.get("cpu"),
            Some(&block(&[("count", "2"), ("reservation_guarantee", "0.5")]))
        );

        let refreshed = provider.read_sizing_policy(&state).await.unwrap();
        assert_eq!(refreshed, state);
    }

    #[tokio::test]
    async fn create_requires_sysadmin() {
        let session = SessionInfo::tenant("org1", ApiVersion::new(36, 0));
        let client = InMemoryClient::with_session(session).with_org("org1");
        let provider = VcdProvider::new(client, config());
        let err = provider
            .create_sizing_policy(&sizing_policy("small"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::PrivilegeRequired);
        assert_eq!(provider.client().policy_count("org1"), 0);
    }

    #[tokio::test]
    async fn create_rejects_bad_number() {
        let provider = provider();
        let resource = sizing_policy("small").with_attribute("cpu", block(&[("shares", "many")]));
        let err = provider.create_sizing_policy(&resource).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidFieldFormat);
        assert!(err.message.contains("cpu.shares"));
    }

    #[tokio::test]
    async fn create_rejects_out_of_range_fraction() {
        let provider = provider();
        let resource = sizing_policy("small")
            .with_attribute("memory", block(&[("reservation_guarantee", "1.5")]));
        let err = provider.create_sizing_policy(&resource).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
        assert_eq!(provider.client().policy_count("org1"), 0);
    }

    #[tokio::test]
    async fn create_without_org() {
        let client = InMemoryClient::new().with_org("org1");
        let provider = VcdProvider::new(
            client,
            ProviderConfig {
                org: None,
                ..config()
            },
        );
        let err = provider
            .create_sizing_policy(&sizing_policy("small"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
        assert!(err.message.contains("error retrieving Org"));
    }

    #[tokio::test]
    async fn read_missing_policy() {
        let provider = provider();
        let state = provider
            .create_sizing_policy(&sizing_policy("small"))
            .await
            .unwrap();
        provider.delete_sizing_policy(&state).await.unwrap();

        let refreshed = provider.read_sizing_policy(&state).await.unwrap();
        assert!(!refreshed.exists);
    }

    #[tokio::test]
    async fn delete_missing_policy_succeeds() {
        let provider = provider();
        let state = provider
            .create_sizing_policy(&sizing_policy("small"))
            .await
            .unwrap();
        provider.delete_sizing_policy(&state).await.unwrap();
        provider.delete_sizing_policy(&state).await.unwrap();
        assert_eq!(provider.client().policy_count("org1"), 0);
    }

    #[tokio::test]
    async fn update_name_and_description() {
        let provider = provider();
        let state = provider
            .create_sizing_policy(&sizing_policy("small"))
            .await
            .unwrap();

        let desired = sizing_policy("smaller")
            .with_attribute("description", Value::String("renamed".to_string()));
        let updated = provider.update_sizing_policy(&state, &desired).await.unwrap();
        assert_eq!(updated.identifier, state.identifier);
        assert_eq!(
            updated.attributes.get("name"),
            Some(&Value::String("smaller".to_string()))
        );
        assert_eq!(
            updated.attributes.get("description"),
            Some(&Value::String("renamed".to_string()))
        );
    }

    #[tokio::test]
    async fn update_rejects_cpu_change() {
        let provider = provider();
        let state = provider
            .create_sizing_policy(&sizing_policy("small"))
            .await
            .unwrap();

        let desired = sizing_policy("small").with_attribute("cpu", block(&[("count", "4")]));
        let err = provider
            .update_sizing_policy(&state, &desired)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ImmutableFieldChanged);
        assert!(err.message.contains("cpu"));
    }

    #[tokio::test]
    async fn update_without_changes_is_noop() {
        let provider = provider();
        let state = provider
            .create_sizing_policy(&sizing_policy("small"))
            .await
            .unwrap();
        let desired = Resource {
            id: state.id.clone(),
            attributes: state.attributes.clone(),
            read_only: false,
        };
        assert_eq!(
            provider.update_sizing_policy(&state, &desired).await.unwrap(),
            state
        );
    }

    #[tokio::test]
    async fn import_by_key() {
        let provider = provider();
        let state = provider
            .create_sizing_policy(&sizing_policy("small"))
            .await
            .unwrap();
        let policy_id = state.identifier.clone().unwrap();

        let imported = provider
            .import_sizing_policy(&format!("org1.{}", policy_id))
            .await
            .unwrap();
        assert_eq!(imported.identifier, Some(policy_id));
        assert_eq!(imported.id.name, "small");
        assert_eq!(imported.attributes, state.attributes);
    }

    #[tokio::test]
    async fn import_malformed_key() {
        let provider = provider();
        let err = provider.import_sizing_policy("org1").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedImportKey);
    }

    #[tokio::test]
    async fn sizing_policy_data_source() {
        let provider = provider();
        provider
            .create_sizing_policy(&sizing_policy("small"))
            .await
            .unwrap();

        let query = Resource::new(RESOURCE_TYPE, "lookup")
            .with_read_only(true)
            .with_attribute("name", Value::String("small".to_string()));
        let state = provider.read_sizing_policy_data_source(&query).await.unwrap();
        assert_eq!(
            state.attributes.get("description"),
            Some(&Value::String("small VMs".to_string()))
        );

        let missing = Resource::new(RESOURCE_TYPE, "lookup")
            .with_read_only(true)
            .with_attribute("name", Value::String("does-not-exist".to_string()));
        let err = provider
            .read_sizing_policy_data_source(&missing)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains(ENTITY_NOT_FOUND));
    }

    #[tokio::test]
    async fn entity_data_source_found() {
        let provider = provider();
        let data_source = get_data_source_config("vcd_catalog_item").unwrap();
        let query = Resource::new("vcd_catalog_item", "photon")
            .with_read_only(true)
            .with_attribute("catalog", Value::String("cat1".to_string()))
            .with_attribute("name", Value::String("photon".to_string()));

        let state = provider
            .read_entity_data_source(data_source, &query)
            .await
            .unwrap();
        assert_eq!(state.identifier.as_deref(), Some("urn:vcloud:catalogitem:1"));
        assert_eq!(
            state.attributes.get("description"),
            Some(&Value::String("Photon OS".to_string()))
        );
    }

    #[tokio::test]
    async fn entity_data_source_missing_parent() {
        let provider = provider();
        let data_source = get_data_source_config("vcd_catalog_item").unwrap();
        let query = Resource::new("vcd_catalog_item", "photon")
            .with_read_only(true)
            .with_attribute("catalog", Value::String("nope".to_string()))
            .with_attribute("name", Value::String("photon".to_string()));

        let err = provider
            .read_entity_data_source(data_source, &query)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("catalog 'nope'"));
    }

    #[tokio::test]
    async fn entity_data_source_missing_entity() {
        let provider = provider();
        let data_source = get_data_source_config("vcd_catalog").unwrap();
        let query = Resource::new("vcd_catalog", "not-existing")
            .with_read_only(true)
            .with_attribute("name", Value::String("does-not-exist".to_string()));

        let err = provider
            .read_entity_data_source(data_source, &query)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains(ENTITY_NOT_FOUND));
    }

    #[tokio::test]
    async fn entity_data_source_requires_identity() {
        let provider = provider();
        let data_source = get_data_source_config("vcd_independent_disk").unwrap();
        let query = Resource::new("vcd_independent_disk", "disk").with_read_only(true);

        let err = provider
            .read_entity_data_source(data_source, &query)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn entity_data_source_rejects_missing_required() {
        let provider = provider();
        let data_source = get_data_source_config("vcd_catalog_item").unwrap();
        let query = Resource::new("vcd_catalog_item", "photon")
            .with_read_only(true)
            .with_attribute("name", Value::String("photon".to_string()));

        let err = provider
            .read_entity_data_source(data_source, &query)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
        assert!(err.message.contains("catalog"));
    }
}
