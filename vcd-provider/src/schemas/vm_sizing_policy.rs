//! VM sizing policy schema definition
//!
//! All sizing values are strings in configuration; integer fields must hold
//! a value >= 0 and reservation guarantees a fraction in [0, 1].

use vcd_core::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema, types};

pub const RESOURCE_TYPE: &str = "vcd_vm_sizing_policy";

fn cpu_block(computed: bool) -> AttributeType {
    let field = |name: &str, attr_type: AttributeType, description: &str| {
        let schema = AttributeSchema::new(name, attr_type).with_description(description);
        if computed { schema.computed() } else { schema.force_new() }
    };
    AttributeType::Block(Box::new(
        BlockSchema::new(1)
            .attribute(field(
                "speed_in_mhz",
                types::non_negative_int(),
                "Defines the vCPU speed of a core in MHz.",
            ))
            .attribute(field(
                "count",
                types::non_negative_int(),
                "Defines the number of vCPUs configured for a VM.",
            ))
            .attribute(field(
                "cores_per_socket",
                types::non_negative_int(),
                "The number of cores per socket for a VM.",
            ))
            .attribute(field(
                "reservation_guarantee",
                types::fraction(),
                "Defines how much of the CPU resources of a VM are reserved.",
            ))
            .attribute(field(
                "limit_in_mhz",
                types::non_negative_int(),
                "Defines the CPU limit in MHz for a VM.",
            ))
            .attribute(field(
                "shares",
                types::non_negative_int(),
                "Defines the number of CPU shares for a VM.",
            )),
    ))
}

fn memory_block(computed: bool) -> AttributeType {
    let field = |name: &str, attr_type: AttributeType, description: &str| {
        let schema = AttributeSchema::new(name, attr_type).with_description(description);
        if computed { schema.computed() } else { schema.force_new() }
    };
    AttributeType::Block(Box::new(
        BlockSchema::new(1)
            .attribute(field(
                "size_in_mb",
                types::non_negative_int(),
                "Defines the memory configured for a VM in MB.",
            ))
            .attribute(field(
                "reservation_guarantee",
                types::fraction(),
                "Defines the reserved amount of memory that is configured for a VM.",
            ))
            .attribute(field(
                "limit_in_mb",
                types::non_negative_int(),
                "Defines the memory limit in MB for a VM.",
            ))
            .attribute(field(
                "shares",
                types::non_negative_int(),
                "Defines the number of memory shares for a VM.",
            )),
    ))
}

/// Schema of the `vcd_vm_sizing_policy` resource
pub fn resource_schema() -> ResourceSchema {
    ResourceSchema::new(RESOURCE_TYPE)
        .with_description("Provides a VMware Cloud Director VM sizing policy.")
        .attribute(
            AttributeSchema::new("org", AttributeType::String)
                .force_new()
                .with_description(
                    "The name of organization to use, optional if defined at provider level.",
                ),
        )
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("description", AttributeType::String))
        .attribute(AttributeSchema::new("cpu", cpu_block(false)).force_new())
        .attribute(AttributeSchema::new("memory", memory_block(false)).force_new())
}

/// Schema of the `vcd_vm_sizing_policy` data source
pub fn data_source_schema() -> ResourceSchema {
    ResourceSchema::new(RESOURCE_TYPE)
        .with_description("Looks up a VM sizing policy by name.")
        .attribute(
            AttributeSchema::new("org", AttributeType::String).with_description(
                "The name of organization to use, optional if defined at provider level.",
            ),
        )
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("description", AttributeType::String).computed())
        .attribute(AttributeSchema::new("cpu", cpu_block(true)).computed())
        .attribute(AttributeSchema::new("memory", memory_block(true)).computed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use vcd_core::resource::Value;

    fn block(pairs: &[(&str, &str)]) -> Value {
        let map: HashMap<String, Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect();
        Value::List(vec![Value::Map(map)])
    }

    #[test]
    fn valid_policy() {
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("small".to_string()));
        attrs.insert(
            "cpu".to_string(),
            block(&[("count", "2"), ("reservation_guarantee", "0.45")]),
        );
        attrs.insert("memory".to_string(), block(&[("size_in_mb", "2048")]));
        assert!(resource_schema().validate(&attrs).is_ok());
    }

    #[test]
    fn reservation_out_of_range() {
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("small".to_string()));
        attrs.insert(
            "memory".to_string(),
            block(&[("reservation_guarantee", "1.2")]),
        );
        assert!(resource_schema().validate(&attrs).is_err());
    }

    #[test]
    fn negative_count() {
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("small".to_string()));
        attrs.insert("cpu".to_string(), block(&[("count", "-1")]));
        assert!(resource_schema().validate(&attrs).is_err());
    }

    #[test]
    fn immutable_blocks_force_new() {
        let schema = resource_schema();
        assert!(schema.attributes["cpu"].force_new);
        assert!(schema.attributes["memory"].force_new);
        assert!(schema.attributes["org"].force_new);
        assert!(!schema.attributes["description"].force_new);
    }

    #[test]
    fn data_source_requires_only_name() {
        let schema = data_source_schema();
        let required: Vec<&str> = schema
            .attribute_names()
            .into_iter()
            .filter(|n| schema.attributes[*n].required)
            .collect();
        assert_eq!(required, vec!["name"]);
        assert!(schema.attributes["cpu"].computed);
    }
}
