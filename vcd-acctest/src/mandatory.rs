//! Mandatory field discovery
//!
//! A probe sets only the fields a data source cannot be read without:
//! schema-required fields, the first field of each exactly-one-of group,
//! and a few fields the schema leaves optional but the read rejects when
//! missing.

use std::collections::BTreeSet;

use vcd_core::schema::ResourceSchema;

/// Fields required at read time but optional in the schema
pub const RUNTIME_MANDATORY: &[(&str, &[&str])] = &[("vcd_independent_disk", &["name"])];

/// Sorted, de-duplicated list of fields a probe must set
pub fn mandatory_fields(schema: &ResourceSchema) -> Vec<String> {
    let mut fields: BTreeSet<String> = schema
        .attributes
        .values()
        .filter(|attr| attr.required || attr.leads_exactly_one_of())
        .map(|attr| attr.name.clone())
        .collect();

    for (data_source, extra) in RUNTIME_MANDATORY {
        if *data_source == schema.resource_type {
            fields.extend(extra.iter().map(|f| f.to_string()));
        }
    }

    fields.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcd_core::schema::{AttributeSchema, AttributeType};

    #[test]
    fn required_and_group_leaders() {
        let group = ["name", "user_id"];
        let schema = ResourceSchema::new("vcd_org_user")
            .attribute(AttributeSchema::new("org", AttributeType::String))
            .attribute(AttributeSchema::new("name", AttributeType::String).exactly_one_of(&group))
            .attribute(
                AttributeSchema::new("user_id", AttributeType::String).exactly_one_of(&group),
            )
            .attribute(AttributeSchema::new("id", AttributeType::String).computed());

        assert_eq!(mandatory_fields(&schema), vec!["name"]);
    }

    #[test]
    fn sorted_output() {
        let schema = ResourceSchema::new("vcd_vapp_vm")
            .attribute(AttributeSchema::new("vapp_name", AttributeType::String).required())
            .attribute(AttributeSchema::new("name", AttributeType::String).required());

        assert_eq!(mandatory_fields(&schema), vec!["name", "vapp_name"]);
    }

    #[test]
    fn runtime_fields_added() {
        let schema = ResourceSchema::new("vcd_independent_disk")
            .attribute(AttributeSchema::new("id", AttributeType::String))
            .attribute(AttributeSchema::new("name", AttributeType::String));

        assert_eq!(mandatory_fields(&schema), vec!["name"]);
    }

    #[test]
    fn runtime_fields_do_not_duplicate() {
        let schema = ResourceSchema::new("vcd_independent_disk")
            .attribute(AttributeSchema::new("name", AttributeType::String).required());

        assert_eq!(mandatory_fields(&schema), vec!["name"]);
    }

    #[test]
    fn nothing_mandatory() {
        let schema = ResourceSchema::new("vcd_anything")
            .attribute(AttributeSchema::new("org", AttributeType::String));
        assert!(mandatory_fields(&schema).is_empty());
    }
}
