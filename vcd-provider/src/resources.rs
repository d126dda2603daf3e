//! Resource and data source type registry
//!
//! This module defines:
//! - Resource type definitions (implementing ResourceType trait)
//! - Data source types backed by the static data source table

use vcd_core::provider::ResourceType;
use vcd_core::schema::ResourceSchema;

use crate::schemas::data_sources::{DATA_SOURCES, DataSourceConfig};
use crate::schemas::vm_sizing_policy;

// =============================================================================
// Resource Type Definitions
// =============================================================================

macro_rules! define_resource_type {
    ($name:ident, $type_name:expr, $schema:path) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn schema(&self) -> ResourceSchema {
                $schema()
            }
        }
    };
}

define_resource_type!(
    VmSizingPolicyType,
    vm_sizing_policy::RESOURCE_TYPE,
    vm_sizing_policy::resource_schema
);

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![Box::new(VmSizingPolicyType)]
}

// =============================================================================
// Data Source Types
// =============================================================================

/// Data source type described by a table entry
pub struct DataSourceType(pub &'static DataSourceConfig);

impl ResourceType for DataSourceType {
    fn name(&self) -> &'static str {
        self.0.name
    }

    fn schema(&self) -> ResourceSchema {
        self.0.schema()
    }
}

/// Returns all data source types supported by this provider
pub fn data_source_types() -> Vec<Box<dyn ResourceType>> {
    DATA_SOURCES
        .iter()
        .map(|config| Box::new(DataSourceType(config)) as Box<dyn ResourceType>)
        .collect()
}
