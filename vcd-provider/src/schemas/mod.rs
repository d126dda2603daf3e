//! vCloud Director schema definitions

pub mod data_sources;
pub mod vm_sizing_policy;

use vcd_core::schema::ResourceSchema;

/// Returns the schemas of all managed resources
pub fn all_resource_schemas() -> Vec<ResourceSchema> {
    vec![vm_sizing_policy::resource_schema()]
}

/// Returns the schemas of all data sources
pub fn all_data_source_schemas() -> Vec<ResourceSchema> {
    data_sources::DATA_SOURCES
        .iter()
        .map(data_sources::DataSourceConfig::schema)
        .collect()
}
