//! Field value resolution
//!
//! Values come from, in order: the data-source specific override list
//! (first match wins), then the generic per-field table. Fields neither
//! source knows about are left out of the probe.

use async_trait::async_trait;
use log::debug;
use vcd_provider::client::{EntityQuery, SessionInfo, VcdClient};
use vcd_provider::utils::{build_urn, extract_uuid};

use crate::HarnessError;
use crate::config::TestConfig;

/// Name given to every entity the probes look for
pub const MISSING_NAME: &str = "does-not-exist";

/// Rule ID no edge gateway will ever have
pub const MISSING_RULE_ID: &str = "347928347234";

/// Live facts about the environment under test
#[async_trait]
pub trait ProbeEnvironment: Send + Sync {
    /// Session the probes run with
    fn session(&self) -> &SessionInfo;

    /// Name of any vApp in the configured VDC; errors skip the probe
    async fn available_vapp(&self) -> Result<Option<String>, HarnessError>;

    /// URN of the named NSX-T manager; `Ok(None)` when it cannot be found
    async fn nsxt_manager_urn(&self, manager: &str) -> Result<Option<String>, HarnessError>;
}

/// [`ProbeEnvironment`] backed by a live [`VcdClient`]
pub struct ClientEnvironment<'a, C> {
    client: &'a C,
    vdc: String,
}

impl<'a, C: VcdClient> ClientEnvironment<'a, C> {
    pub fn new(client: &'a C, config: &TestConfig) -> Self {
        Self {
            client,
            vdc: config.vcd.vdc.clone(),
        }
    }
}

#[async_trait]
impl<'a, C: VcdClient> ProbeEnvironment for ClientEnvironment<'a, C> {
    fn session(&self) -> &SessionInfo {
        self.client.session()
    }

    async fn available_vapp(&self) -> Result<Option<String>, HarnessError> {
        let mut query = EntityQuery::new("vApp");
        if !self.vdc.is_empty() {
            query = query.filter("vdcName", self.vdc.as_str());
        }
        match self.client.query_entities(&query).await {
            Ok(records) => Ok(records.into_iter().map(|r| r.name).next()),
            Err(e) => {
                debug!("vApp lookup failed: {}", e);
                Ok(None)
            }
        }
    }

    async fn nsxt_manager_urn(&self, manager: &str) -> Result<Option<String>, HarnessError> {
        let query = EntityQuery::new("nsxtManager").filter("name", manager);
        let records = match self.client.query_entities(&query).await {
            Ok(records) => records,
            Err(e) => {
                debug!("NSX-T manager '{}' lookup failed: {}", manager, e);
                return Ok(None);
            }
        };
        let Some(record) = records.into_iter().next() else {
            return Ok(None);
        };

        let reference = record.href.as_deref().unwrap_or(&record.id);
        let uuid = extract_uuid(reference).ok_or_else(|| {
            HarnessError::Resolution(format!(
                "cannot build URN for NSX-T manager '{}' from '{}'",
                manager, reference
            ))
        })?;
        Ok(Some(build_urn("nsxtmanager", uuid)))
    }
}

/// Value an override rule assigns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideValue {
    Literal(&'static str),
    PortGroupType,
}

/// Data-source specific value for one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverrideRule {
    pub data_source: &'static str,
    pub field: &'static str,
    pub value: OverrideValue,
    /// Stop resolving further fields after this one
    pub terminal: bool,
}

/// Checked in order; the first rule matching data source and field wins
pub const OVERRIDES: &[OverrideRule] = &[
    OverrideRule {
        data_source: "vcd_nsxv_dhcp_relay",
        field: "edge_gateway",
        value: OverrideValue::Literal("non-existing"),
        terminal: true,
    },
    OverrideRule {
        data_source: "vcd_portgroup",
        field: "type",
        value: OverrideValue::PortGroupType,
        terminal: true,
    },
];

/// Where a generic field gets its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    Org,
    EdgeGateway,
    Catalog,
    AvailableVapp,
    NsxtManagerUrn,
    Literal(&'static str),
}

/// Values used for a field regardless of data source
pub const GENERIC_FIELDS: &[(&str, FieldSource)] = &[
    ("org", FieldSource::Org),
    ("edge_gateway", FieldSource::EdgeGateway),
    ("catalog", FieldSource::Catalog),
    ("vapp_name", FieldSource::AvailableVapp),
    ("nsxt_manager_id", FieldSource::NsxtManagerUrn),
    ("rule_id", FieldSource::Literal(MISSING_RULE_ID)),
    ("name", FieldSource::Literal(MISSING_NAME)),
    ("org_network_name", FieldSource::Literal(MISSING_NAME)),
];

fn find_override(data_source: &str, field: &str) -> Option<&'static OverrideRule> {
    OVERRIDES
        .iter()
        .find(|rule| rule.data_source == data_source && rule.field == field)
}

fn generic_source(field: &str) -> Option<FieldSource> {
    GENERIC_FIELDS
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, source)| *source)
}

/// Result of resolving a data source's mandatory fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Field/value pairs in resolution order
    Fields(Vec<(String, String)>),
    /// The environment cannot support this probe
    Skip(String),
}

/// Resolve values for `fields` of `data_source`
pub async fn resolve_fields<E: ProbeEnvironment + ?Sized>(
    data_source: &str,
    fields: &[String],
    config: &TestConfig,
    environment: &E,
) -> Result<Resolution, HarnessError> {
    let mut resolved = Vec::new();

    for field in fields {
        if let Some(rule) = find_override(data_source, field) {
            let value = match rule.value {
                OverrideValue::Literal(v) => v.to_string(),
                OverrideValue::PortGroupType => {
                    config.networking.external_network_port_group_type.clone()
                }
            };
            resolved.push((field.clone(), value));
            if rule.terminal {
                break;
            }
            continue;
        }

        let Some(source) = generic_source(field) else {
            debug!("{}: no value for field '{}', leaving it out", data_source, field);
            continue;
        };
        let value = match source {
            FieldSource::Org => config.vcd.org.clone(),
            FieldSource::EdgeGateway => config.networking.edge_gateway.clone(),
            FieldSource::Catalog => config.vcd.catalog.name.clone(),
            FieldSource::Literal(v) => v.to_string(),
            FieldSource::AvailableVapp => match environment.available_vapp().await {
                Ok(Some(vapp)) => vapp,
                other => {
                    if let Err(e) = other {
                        debug!("{}: vApp lookup failed: {}", data_source, e);
                    }
                    return Ok(Resolution::Skip(
                        "no suitable vApp found for this test".to_string(),
                    ));
                }
            },
            FieldSource::NsxtManagerUrn => {
                match environment.nsxt_manager_urn(&config.nsxt.manager).await? {
                    Some(urn) => urn,
                    None => {
                        return Ok(Resolution::Skip(format!(
                            "NSX-T manager '{}' not found",
                            config.nsxt.manager
                        )));
                    }
                }
            }
        };
        resolved.push((field.clone(), value));
    }

    Ok(Resolution::Fields(resolved))
}
