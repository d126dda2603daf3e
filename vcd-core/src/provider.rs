//! Provider - Trait abstracting resource operations
//!
//! A Provider defines the lifecycle callbacks the host runtime invokes for
//! each resource type (create, read, update, delete, import) and the read
//! callback for each data source.

use std::future::Future;
use std::pin::Pin;

use crate::resource::{Resource, ResourceId, State};
use crate::schema::ResourceSchema;

/// Canonical text the remote system uses for a missing entity.
///
/// Every "not found" error produced by a provider carries this marker so that
/// callers can recognise it without inspecting the error type.
pub const ENTITY_NOT_FOUND: &str = "[ENF] entity not found";

/// Classification of provider failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A numeric field could not be parsed
    InvalidFieldFormat,
    /// A field that is fixed after creation was changed
    ImmutableFieldChanged,
    /// The session lacks system administrator privileges
    PrivilegeRequired,
    /// The remote object does not exist
    NotFound,
    /// An import key did not have the expected shape
    MalformedImportKey,
    /// Provider or resource configuration is incomplete or invalid
    Configuration,
    /// Any other failure reported by the remote system
    Remote,
}

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub message: String,
    pub resource_id: Option<ResourceId>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}.{}] {}", id.resource_type, id.name, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            resource_id: None,
            cause: None,
        }
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Remote, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn privilege_required() -> Self {
        Self::new(
            ErrorKind::PrivilegeRequired,
            "functionality requires system administrator privileges",
        )
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Definition of resource and data source types that a Provider can handle
pub trait ResourceType: Send + Sync {
    /// Type name as written in configuration (e.g., "vcd_vm_sizing_policy")
    fn name(&self) -> &'static str;

    /// Attribute schema for this type
    fn schema(&self) -> ResourceSchema;
}

/// Main Provider trait
///
/// All operations are async and involve side effects on the remote system.
pub trait Provider: Send + Sync {
    /// Name of this Provider (e.g., "vcd")
    fn name(&self) -> &'static str;

    /// Managed resource types
    fn resource_types(&self) -> Vec<Box<dyn ResourceType>>;

    /// Read-only data source types
    fn data_source_types(&self) -> Vec<Box<dyn ResourceType>>;

    /// Refresh a resource from its last known state
    ///
    /// Returns `State::not_found()` if the remote object no longer exists.
    fn read(&self, state: &State) -> BoxFuture<'_, ProviderResult<State>>;

    /// Create a resource
    ///
    /// Returns State with identifier set to the remote ID
    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    /// Update a resource in place
    fn update(&self, from: &State, to: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    /// Delete a resource
    ///
    /// Deleting an object that is already gone succeeds.
    fn delete(&self, state: &State) -> BoxFuture<'_, ProviderResult<()>>;

    /// Import an existing remote object from a composite key
    fn import(&self, resource_type: &str, key: &str) -> BoxFuture<'_, ProviderResult<State>>;

    /// Read a data source
    ///
    /// Unlike `read`, a missing object is an error carrying `ENTITY_NOT_FOUND`.
    fn read_data_source(&self, query: &Resource) -> BoxFuture<'_, ProviderResult<State>>;
}

/// Provider implementation for Box<dyn Provider>
/// This enables dynamic dispatch for Providers
impl Provider for Box<dyn Provider> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        (**self).resource_types()
    }

    fn data_source_types(&self) -> Vec<Box<dyn ResourceType>> {
        (**self).data_source_types()
    }

    fn read(&self, state: &State) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).read(state)
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).create(resource)
    }

    fn update(&self, from: &State, to: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).update(from, to)
    }

    fn delete(&self, state: &State) -> BoxFuture<'_, ProviderResult<()>> {
        (**self).delete(state)
    }

    fn import(&self, resource_type: &str, key: &str) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).import(resource_type, key)
    }

    fn read_data_source(&self, query: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).read_data_source(query)
    }
}
