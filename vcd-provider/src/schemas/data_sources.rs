//! Data source definitions
//!
//! Each data source is described by a static table entry: its fields, which
//! of them are required, and how a read is turned into remote lookups.

use vcd_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::vm_sizing_policy;

/// Value kind of a data source field
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    String,
    Enum(&'static [&'static str]),
}

/// How a field must be supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Optional,
    Required,
    /// Exactly one member of the group must be set (the group includes the field)
    OneOf(&'static [&'static str]),
    /// Filled in by the read
    Computed,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub requirement: Requirement,
}

/// A parent entity that must exist before the data source itself is queried
#[derive(Debug, Clone, Copy)]
pub struct ParentLookup {
    /// Attribute holding the parent reference (e.g., "catalog")
    pub attribute: &'static str,
    /// Query type of the parent (e.g., "catalog")
    pub query_type: &'static str,
    /// Parent field the reference is matched against ("name" or "id")
    pub match_field: &'static str,
    /// Child field that carries the parent reference (e.g., "catalogName")
    pub child_field: &'static str,
}

/// How a data source read is resolved remotely
#[derive(Debug, Clone, Copy)]
pub enum Lookup {
    /// Compute policy by name within the organization
    ComputePolicy,
    /// Typed query, after verifying every referenced parent exists
    Query {
        query_type: &'static str,
        /// (attribute, query field) pairs identifying the entity; when
        /// non-empty, at least one must be set
        identity: &'static [(&'static str, &'static str)],
        /// Extra (attribute, query field) filters applied when set
        filters: &'static [(&'static str, &'static str)],
        parents: &'static [ParentLookup],
    },
}

/// Static description of a data source
#[derive(Debug, Clone, Copy)]
pub struct DataSourceConfig {
    pub name: &'static str,
    pub description: &'static str,
    pub fields: &'static [FieldDef],
    pub lookup: Lookup,
}

impl DataSourceConfig {
    /// Attribute schema derived from the field table
    pub fn schema(&self) -> ResourceSchema {
        if matches!(self.lookup, Lookup::ComputePolicy) {
            return vm_sizing_policy::data_source_schema();
        }

        let mut schema = ResourceSchema::new(self.name)
            .with_description(self.description)
            .attribute(AttributeSchema::new("id", AttributeType::String).computed());
        for field in self.fields {
            let attr_type = match field.kind {
                FieldKind::String => AttributeType::String,
                FieldKind::Enum(values) => {
                    AttributeType::Enum(values.iter().map(|v| v.to_string()).collect())
                }
            };
            let attr = AttributeSchema::new(field.name, attr_type);
            let attr = match field.requirement {
                Requirement::Optional => attr,
                Requirement::Required => attr.required(),
                Requirement::OneOf(group) => attr.exactly_one_of(group),
                Requirement::Computed => attr.computed(),
            };
            schema = schema.attribute(attr);
        }
        schema
    }
}

const fn optional(name: &'static str) -> FieldDef {
    FieldDef {
        name,
        kind: FieldKind::String,
        requirement: Requirement::Optional,
    }
}

const fn required(name: &'static str) -> FieldDef {
    FieldDef {
        name,
        kind: FieldKind::String,
        requirement: Requirement::Required,
    }
}

const fn computed(name: &'static str) -> FieldDef {
    FieldDef {
        name,
        kind: FieldKind::String,
        requirement: Requirement::Computed,
    }
}

// =============================================================================
// Parent references
// =============================================================================

const ORG: ParentLookup = ParentLookup {
    attribute: "org",
    query_type: "organization",
    match_field: "name",
    child_field: "orgName",
};

const VDC: ParentLookup = ParentLookup {
    attribute: "vdc",
    query_type: "orgVdc",
    match_field: "name",
    child_field: "vdcName",
};

const CATALOG: ParentLookup = ParentLookup {
    attribute: "catalog",
    query_type: "catalog",
    match_field: "name",
    child_field: "catalogName",
};

const EDGE_GATEWAY: ParentLookup = ParentLookup {
    attribute: "edge_gateway",
    query_type: "edgeGateway",
    match_field: "name",
    child_field: "edgeGatewayName",
};

const VAPP: ParentLookup = ParentLookup {
    attribute: "vapp_name",
    query_type: "vApp",
    match_field: "name",
    child_field: "containerName",
};

const NSXT_MANAGER: ParentLookup = ParentLookup {
    attribute: "nsxt_manager_id",
    query_type: "nsxtManager",
    match_field: "id",
    child_field: "nsxtManager",
};

const BY_NAME: &[(&str, &str)] = &[("name", "name")];
const BY_RULE_ID: &[(&str, &str)] = &[("rule_id", "id")];

const ORG_VDC_NAME: &[FieldDef] = &[
    optional("org"),
    optional("vdc"),
    required("name"),
    computed("description"),
];

const EDGE_RULE: &[FieldDef] = &[
    optional("org"),
    optional("vdc"),
    required("edge_gateway"),
    required("rule_id"),
    computed("description"),
];

const EDGE_NAMED: &[FieldDef] = &[
    optional("org"),
    optional("vdc"),
    required("edge_gateway"),
    required("name"),
];

// =============================================================================
// Data Sources
// =============================================================================

pub const DATA_SOURCES: &[DataSourceConfig] = &[
    DataSourceConfig {
        name: "vcd_vm_sizing_policy",
        description: "Looks up a VM sizing policy by name.",
        fields: &[optional("org"), required("name"), computed("description")],
        lookup: Lookup::ComputePolicy,
    },
    DataSourceConfig {
        name: "vcd_org",
        description: "Provides an organization.",
        fields: &[required("name"), computed("full_name"), computed("description")],
        lookup: Lookup::Query {
            query_type: "organization",
            identity: BY_NAME,
            filters: &[],
            parents: &[],
        },
    },
    DataSourceConfig {
        name: "vcd_org_vdc",
        description: "Provides an organization VDC.",
        fields: &[optional("org"), required("name"), computed("description")],
        lookup: Lookup::Query {
            query_type: "orgVdc",
            identity: BY_NAME,
            filters: &[],
            parents: &[ORG],
        },
    },
    DataSourceConfig {
        name: "vcd_org_user",
        description: "Provides an organization user.",
        fields: &[
            optional("org"),
            FieldDef {
                name: "name",
                kind: FieldKind::String,
                requirement: Requirement::OneOf(&["name", "user_id"]),
            },
            FieldDef {
                name: "user_id",
                kind: FieldKind::String,
                requirement: Requirement::OneOf(&["name", "user_id"]),
            },
            computed("role"),
        ],
        lookup: Lookup::Query {
            query_type: "user",
            identity: &[("name", "name"), ("user_id", "id")],
            filters: &[],
            parents: &[ORG],
        },
    },
    DataSourceConfig {
        name: "vcd_catalog",
        description: "Provides a catalog.",
        fields: &[optional("org"), required("name"), computed("description")],
        lookup: Lookup::Query {
            query_type: "catalog",
            identity: BY_NAME,
            filters: &[],
            parents: &[ORG],
        },
    },
    DataSourceConfig {
        name: "vcd_catalog_item",
        description: "Provides a catalog item.",
        fields: &[
            optional("org"),
            required("catalog"),
            required("name"),
            computed("description"),
        ],
        lookup: Lookup::Query {
            query_type: "catalogItem",
            identity: BY_NAME,
            filters: &[],
            parents: &[ORG, CATALOG],
        },
    },
    DataSourceConfig {
        name: "vcd_catalog_media",
        description: "Provides a media item of a catalog.",
        fields: &[
            optional("org"),
            required("catalog"),
            required("name"),
            computed("description"),
        ],
        lookup: Lookup::Query {
            query_type: "media",
            identity: BY_NAME,
            filters: &[],
            parents: &[ORG, CATALOG],
        },
    },
    DataSourceConfig {
        name: "vcd_storage_profile",
        description: "Provides a storage profile available to a VDC.",
        fields: &[optional("org"), optional("vdc"), required("name")],
        lookup: Lookup::Query {
            query_type: "orgVdcStorageProfile",
            identity: BY_NAME,
            filters: &[],
            parents: &[ORG, VDC],
        },
    },
    DataSourceConfig {
        name: "vcd_independent_disk",
        description: "Provides an independent disk, looked up by `id` or `name`.",
        fields: &[
            optional("org"),
            optional("vdc"),
            optional("id"),
            optional("name"),
            computed("size_in_mb"),
        ],
        lookup: Lookup::Query {
            query_type: "disk",
            identity: &[("id", "id"), ("name", "name")],
            filters: &[],
            parents: &[ORG, VDC],
        },
    },
    DataSourceConfig {
        name: "vcd_edgegateway",
        description: "Provides an NSX-V edge gateway.",
        fields: ORG_VDC_NAME,
        lookup: Lookup::Query {
            query_type: "edgeGateway",
            identity: BY_NAME,
            filters: &[],
            parents: &[ORG, VDC],
        },
    },
    DataSourceConfig {
        name: "vcd_nsxt_edgegateway",
        description: "Provides an NSX-T edge gateway.",
        fields: ORG_VDC_NAME,
        lookup: Lookup::Query {
            query_type: "nsxtEdgeGateway",
            identity: BY_NAME,
            filters: &[],
            parents: &[ORG, VDC],
        },
    },
    DataSourceConfig {
        name: "vcd_external_network",
        description: "Provides an external network. Requires system administrator privileges.",
        fields: &[required("name"), computed("description")],
        lookup: Lookup::Query {
            query_type: "externalNetwork",
            identity: BY_NAME,
            filters: &[],
            parents: &[],
        },
    },
    DataSourceConfig {
        name: "vcd_external_network_v2",
        description: "Provides an external network backed by NSX-V or NSX-T.",
        fields: &[required("name"), computed("description")],
        lookup: Lookup::Query {
            query_type: "externalNetworkV2",
            identity: BY_NAME,
            filters: &[],
            parents: &[],
        },
    },
    DataSourceConfig {
        name: "vcd_network_routed",
        description: "Provides a routed org VDC network.",
        fields: &[
            optional("org"),
            optional("vdc"),
            required("name"),
            computed("edge_gateway"),
            computed("gateway"),
        ],
        lookup: Lookup::Query {
            query_type: "orgVdcNetwork",
            identity: BY_NAME,
            filters: &[],
            parents: &[ORG, VDC],
        },
    },
    DataSourceConfig {
        name: "vcd_network_isolated",
        description: "Provides an isolated org VDC network.",
        fields: &[
            optional("org"),
            optional("vdc"),
            required("name"),
            computed("gateway"),
        ],
        lookup: Lookup::Query {
            query_type: "orgVdcNetwork",
            identity: BY_NAME,
            filters: &[],
            parents: &[ORG, VDC],
        },
    },
    DataSourceConfig {
        name: "vcd_network_direct",
        description: "Provides a direct org VDC network.",
        fields: &[
            optional("org"),
            optional("vdc"),
            required("name"),
            computed("external_network"),
        ],
        lookup: Lookup::Query {
            query_type: "orgVdcNetwork",
            identity: BY_NAME,
            filters: &[],
            parents: &[ORG, VDC],
        },
    },
    DataSourceConfig {
        name: "vcd_vapp",
        description: "Provides a vApp.",
        fields: &[
            optional("org"),
            optional("vdc"),
            required("name"),
            computed("status_text"),
        ],
        lookup: Lookup::Query {
            query_type: "vApp",
            identity: BY_NAME,
            filters: &[],
            parents: &[ORG, VDC],
        },
    },
    DataSourceConfig {
        name: "vcd_vapp_vm",
        description: "Provides a VM within a vApp.",
        fields: &[
            optional("org"),
            optional("vdc"),
            required("vapp_name"),
            required("name"),
            computed("computer_name"),
        ],
        lookup: Lookup::Query {
            query_type: "vm",
            identity: BY_NAME,
            filters: &[],
            parents: &[ORG, VDC, VAPP],
        },
    },
    DataSourceConfig {
        name: "vcd_vapp_network",
        description: "Provides a vApp network.",
        fields: &[
            optional("org"),
            optional("vdc"),
            required("vapp_name"),
            required("name"),
        ],
        lookup: Lookup::Query {
            query_type: "vAppNetwork",
            identity: BY_NAME,
            filters: &[],
            parents: &[ORG, VDC, VAPP],
        },
    },
    DataSourceConfig {
        name: "vcd_vapp_org_network",
        description: "Provides an org network attached to a vApp.",
        fields: &[
            optional("org"),
            optional("vdc"),
            required("vapp_name"),
            required("org_network_name"),
            computed("is_fenced"),
        ],
        lookup: Lookup::Query {
            query_type: "vAppOrgNetwork",
            identity: &[("org_network_name", "name")],
            filters: &[],
            parents: &[ORG, VDC, VAPP],
        },
    },
    DataSourceConfig {
        name: "vcd_nsxv_dhcp_relay",
        description: "Provides the DHCP relay settings of an NSX-V edge gateway.",
        fields: &[
            optional("org"),
            optional("vdc"),
            required("edge_gateway"),
            computed("ip_addresses"),
        ],
        lookup: Lookup::Query {
            query_type: "edgeDhcpRelay",
            identity: &[],
            filters: &[],
            parents: &[ORG, VDC, EDGE_GATEWAY],
        },
    },
    DataSourceConfig {
        name: "vcd_nsxv_firewall_rule",
        description: "Provides an NSX-V edge gateway firewall rule.",
        fields: EDGE_RULE,
        lookup: Lookup::Query {
            query_type: "edgeFirewallRule",
            identity: BY_RULE_ID,
            filters: &[],
            parents: &[ORG, VDC, EDGE_GATEWAY],
        },
    },
    DataSourceConfig {
        name: "vcd_nsxv_dnat",
        description: "Provides an NSX-V edge gateway DNAT rule.",
        fields: EDGE_RULE,
        lookup: Lookup::Query {
            query_type: "edgeNatRule",
            identity: BY_RULE_ID,
            filters: &[],
            parents: &[ORG, VDC, EDGE_GATEWAY],
        },
    },
    DataSourceConfig {
        name: "vcd_nsxv_snat",
        description: "Provides an NSX-V edge gateway SNAT rule.",
        fields: EDGE_RULE,
        lookup: Lookup::Query {
            query_type: "edgeNatRule",
            identity: BY_RULE_ID,
            filters: &[],
            parents: &[ORG, VDC, EDGE_GATEWAY],
        },
    },
    DataSourceConfig {
        name: "vcd_lb_server_pool",
        description: "Provides an NSX-V load balancer server pool.",
        fields: EDGE_NAMED,
        lookup: Lookup::Query {
            query_type: "lbServerPool",
            identity: BY_NAME,
            filters: &[],
            parents: &[ORG, VDC, EDGE_GATEWAY],
        },
    },
    DataSourceConfig {
        name: "vcd_lb_service_monitor",
        description: "Provides an NSX-V load balancer service monitor.",
        fields: EDGE_NAMED,
        lookup: Lookup::Query {
            query_type: "lbServiceMonitor",
            identity: BY_NAME,
            filters: &[],
            parents: &[ORG, VDC, EDGE_GATEWAY],
        },
    },
    DataSourceConfig {
        name: "vcd_lb_virtual_server",
        description: "Provides an NSX-V load balancer virtual server.",
        fields: EDGE_NAMED,
        lookup: Lookup::Query {
            query_type: "lbVirtualServer",
            identity: BY_NAME,
            filters: &[],
            parents: &[ORG, VDC, EDGE_GATEWAY],
        },
    },
    DataSourceConfig {
        name: "vcd_portgroup",
        description: "Provides a vSphere port group. Requires system administrator privileges.",
        fields: &[
            required("name"),
            FieldDef {
                name: "type",
                kind: FieldKind::Enum(&["DV_PORTGROUP", "NETWORK"]),
                requirement: Requirement::Required,
            },
        ],
        lookup: Lookup::Query {
            query_type: "portgroup",
            identity: BY_NAME,
            filters: &[("type", "portgroupType")],
            parents: &[],
        },
    },
    DataSourceConfig {
        name: "vcd_nsxt_manager",
        description: "Provides a registered NSX-T manager.",
        fields: &[required("name")],
        lookup: Lookup::Query {
            query_type: "nsxtManager",
            identity: BY_NAME,
            filters: &[],
            parents: &[],
        },
    },
    DataSourceConfig {
        name: "vcd_nsxt_tier0_router",
        description: "Provides a tier-0 router of an NSX-T manager.",
        fields: &[required("name"), required("nsxt_manager_id")],
        lookup: Lookup::Query {
            query_type: "nsxtTier0Router",
            identity: BY_NAME,
            filters: &[],
            parents: &[NSXT_MANAGER],
        },
    },
];

/// Get a data source definition by type name
pub fn get_data_source_config(name: &str) -> Option<&'static DataSourceConfig> {
    DATA_SOURCES.iter().find(|ds| ds.name == name)
}
