//! vCloud Director Provider
//!
//! Manages VM sizing policies and exposes lookup data sources.
//!
//! ## Module Structure
//!
//! - `client` - Remote client contract and its error type
//! - `cloudapi` - HTTP implementation of the client
//! - `memory` - In-process implementation of the client
//! - `config` - Provider configuration
//! - `policy` - Mapping between sizing policy configuration and the remote object
//! - `import` - Import key parsing
//! - `provider` - VcdProvider handlers
//! - `resources` - Resource and data source type registry
//! - `schemas` - Resource schemas and the data source table

pub mod client;
pub mod cloudapi;
pub mod config;
pub mod import;
pub mod memory;
pub mod policy;
pub mod provider;
pub mod resources;
pub mod schemas;
pub mod types;
pub mod utils;

// Re-export main types
pub use client::{ClientError, VcdClient};
pub use cloudapi::CloudApiClient;
pub use config::ProviderConfig;
pub use memory::InMemoryClient;
pub use provider::VcdProvider;

use vcd_core::provider::{BoxFuture, Provider, ProviderError, ProviderResult, ResourceType};
use vcd_core::resource::{Resource, ResourceId, State};

use schemas::data_sources::get_data_source_config;
use schemas::vm_sizing_policy::RESOURCE_TYPE;

fn unknown_type(kind: &str, id: ResourceId) -> ProviderError {
    ProviderError::configuration(format!("unknown {} type: {}", kind, id.resource_type))
        .for_resource(id)
}

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl<C: VcdClient> Provider for VcdProvider<C> {
    fn name(&self) -> &'static str {
        "vcd"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        resources::resource_types()
    }

    fn data_source_types(&self) -> Vec<Box<dyn ResourceType>> {
        resources::data_source_types()
    }

    fn read(&self, state: &State) -> BoxFuture<'_, ProviderResult<State>> {
        let state = state.clone();
        Box::pin(async move {
            if state.id.resource_type != RESOURCE_TYPE {
                return Err(unknown_type("resource", state.id));
            }
            self.read_sizing_policy(&state).await
        })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            if resource.id.resource_type != RESOURCE_TYPE {
                return Err(unknown_type("resource", resource.id));
            }
            self.create_sizing_policy(&resource).await
        })
    }

    fn update(&self, from: &State, to: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move {
            if to.id.resource_type != RESOURCE_TYPE {
                return Err(unknown_type("resource", to.id));
            }
            self.update_sizing_policy(&from, &to).await
        })
    }

    fn delete(&self, state: &State) -> BoxFuture<'_, ProviderResult<()>> {
        let state = state.clone();
        Box::pin(async move {
            if state.id.resource_type != RESOURCE_TYPE {
                return Err(unknown_type("resource", state.id));
            }
            self.delete_sizing_policy(&state).await
        })
    }

    fn import(&self, resource_type: &str, key: &str) -> BoxFuture<'_, ProviderResult<State>> {
        let resource_type = resource_type.to_string();
        let key = key.to_string();
        Box::pin(async move {
            if resource_type != RESOURCE_TYPE {
                return Err(unknown_type("resource", ResourceId::new(resource_type, key)));
            }
            self.import_sizing_policy(&key).await
        })
    }

    fn read_data_source(&self, query: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let query = query.clone();
        Box::pin(async move {
            let Some(data_source) = get_data_source_config(&query.id.resource_type) else {
                return Err(unknown_type("data source", query.id));
            };
            self.read_entity_data_source(data_source, &query).await
        })
    }
}
