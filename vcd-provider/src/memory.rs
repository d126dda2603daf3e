//! In-memory client
//!
//! Holds organizations, compute policies and queryable entities in process.
//! Used for offline runs of the provider and by the test suites.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::client::{
    AdminOrg, ApiVersion, ClientError, ClientResult, EntityQuery, EntityRecord, SessionInfo,
    VcdClient,
};
use crate::types::VdcComputePolicy;
use crate::utils::build_urn;

#[derive(Default)]
struct Inventory {
    orgs: Vec<AdminOrg>,
    /// Compute policies keyed by org ID
    policies: HashMap<String, Vec<VdcComputePolicy>>,
    /// Queryable entities keyed by query type
    entities: HashMap<String, Vec<EntityRecord>>,
}

/// [`VcdClient`] backed by process memory
pub struct InMemoryClient {
    session: SessionInfo,
    inventory: Mutex<Inventory>,
}

impl InMemoryClient {
    /// Client with a system administrator session
    pub fn new() -> Self {
        Self::with_session(SessionInfo::sysadmin(ApiVersion::new(36, 0)))
    }

    pub fn with_session(session: SessionInfo) -> Self {
        Self {
            session,
            inventory: Mutex::new(Inventory::default()),
        }
    }

    /// Register an organization (also queryable as `organization`)
    pub fn with_org(self, name: &str) -> Self {
        let id = build_urn("org", &uuid::Uuid::new_v4().to_string());
        {
            let mut inventory = self.lock();
            inventory.orgs.push(AdminOrg {
                id: id.clone(),
                name: name.to_string(),
            });
            inventory
                .entities
                .entry("organization".to_string())
                .or_default()
                .push(EntityRecord::new(id, name));
        }
        self
    }

    /// Register a queryable entity
    pub fn with_entity(self, query_type: &str, record: EntityRecord) -> Self {
        self.lock()
            .entities
            .entry(query_type.to_string())
            .or_default()
            .push(record);
        self
    }

    /// Number of compute policies stored for an org
    pub fn policy_count(&self, org: &str) -> usize {
        let inventory = self.lock();
        inventory
            .orgs
            .iter()
            .find(|o| o.name == org)
            .and_then(|o| inventory.policies.get(&o.id))
            .map_or(0, Vec::len)
    }

    fn lock(&self) -> MutexGuard<'_, Inventory> {
        // A panic while holding the lock leaves the data consistent: every
        // mutation below is a single push, replace or remove.
        self.inventory
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for InMemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VcdClient for InMemoryClient {
    fn session(&self) -> &SessionInfo {
        &self.session
    }

    async fn get_admin_org(&self, name: &str) -> ClientResult<AdminOrg> {
        self.lock()
            .orgs
            .iter()
            .find(|o| o.name == name)
            .cloned()
            .ok_or_else(|| ClientError::not_found(format!("org '{}'", name)))
    }

    async fn create_compute_policy(
        &self,
        org: &AdminOrg,
        policy: &VdcComputePolicy,
    ) -> ClientResult<VdcComputePolicy> {
        let mut inventory = self.lock();
        let policies = inventory.policies.entry(org.id.clone()).or_default();
        if policies.iter().any(|p| p.name == policy.name) {
            return Err(ClientError::Api {
                status: 400,
                message: format!("VM sizing policy '{}' already exists", policy.name),
            });
        }

        let mut created = policy.clone();
        created.id = Some(build_urn(
            "vdcComputePolicy",
            &uuid::Uuid::new_v4().to_string(),
        ));
        policies.push(created.clone());
        Ok(created)
    }

    async fn get_compute_policy_by_id(
        &self,
        org: &AdminOrg,
        id: &str,
    ) -> ClientResult<VdcComputePolicy> {
        self.lock()
            .policies
            .get(&org.id)
            .and_then(|ps| ps.iter().find(|p| p.id.as_deref() == Some(id)))
            .cloned()
            .ok_or_else(|| ClientError::not_found(format!("VM sizing policy '{}'", id)))
    }

    async fn get_compute_policy_by_name(
        &self,
        org: &AdminOrg,
        name: &str,
    ) -> ClientResult<VdcComputePolicy> {
        self.lock()
            .policies
            .get(&org.id)
            .and_then(|ps| ps.iter().find(|p| p.name == name))
            .cloned()
            .ok_or_else(|| ClientError::not_found(format!("VM sizing policy '{}'", name)))
    }

    async fn update_compute_policy(
        &self,
        org: &AdminOrg,
        policy: &VdcComputePolicy,
    ) -> ClientResult<VdcComputePolicy> {
        let mut inventory = self.lock();
        let existing = inventory
            .policies
            .get_mut(&org.id)
            .and_then(|ps| ps.iter_mut().find(|p| p.id.is_some() && p.id == policy.id))
            .ok_or_else(|| {
                ClientError::not_found(format!(
                    "VM sizing policy '{}'",
                    policy.id.as_deref().unwrap_or_default()
                ))
            })?;
        *existing = policy.clone();
        Ok(policy.clone())
    }

    async fn delete_compute_policy(&self, org: &AdminOrg, id: &str) -> ClientResult<()> {
        let mut inventory = self.lock();
        let policies = inventory
            .policies
            .get_mut(&org.id)
            .ok_or_else(|| ClientError::not_found(format!("VM sizing policy '{}'", id)))?;
        let before = policies.len();
        policies.retain(|p| p.id.as_deref() != Some(id));
        if policies.len() == before {
            return Err(ClientError::not_found(format!("VM sizing policy '{}'", id)));
        }
        Ok(())
    }

    async fn query_entities(&self, query: &EntityQuery) -> ClientResult<Vec<EntityRecord>> {
        Ok(self
            .lock()
            .entities
            .get(&query.query_type)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.matches(&query.filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
