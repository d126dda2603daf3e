//! VM sizing policy mapping
//!
//! Converts between the user-facing record (all sizing values held as
//! strings, nested `cpu`/`memory` blocks) and the remote compute policy
//! object (optional numbers). Forward and reverse mappings are pure.

use std::collections::HashMap;

use thiserror::Error;
use vcd_core::provider::{ErrorKind, ProviderError};
use vcd_core::resource::Value;

use crate::types::VdcComputePolicy;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PolicyError {
    #[error("value `{value}` {field} is not number: {reason}")]
    InvalidFieldFormat {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("only name and description are updatable for VM sizing policy, `{field}` changed")]
    ImmutableFieldChanged { field: &'static str },

    #[error("attribute `{0}` is required")]
    MissingAttribute(&'static str),

    #[error("`{0}` must be a single block")]
    InvalidBlock(&'static str),
}

impl From<PolicyError> for ProviderError {
    fn from(e: PolicyError) -> Self {
        let kind = match e {
            PolicyError::InvalidFieldFormat { .. } => ErrorKind::InvalidFieldFormat,
            PolicyError::ImmutableFieldChanged { .. } => ErrorKind::ImmutableFieldChanged,
            PolicyError::MissingAttribute(_) | PolicyError::InvalidBlock(_) => {
                ErrorKind::Configuration
            }
        };
        ProviderError::new(kind, e.to_string())
    }
}

/// `cpu` block of a sizing policy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuBlock {
    pub speed_in_mhz: Option<String>,
    pub count: Option<String>,
    pub cores_per_socket: Option<String>,
    pub reservation_guarantee: Option<String>,
    pub limit_in_mhz: Option<String>,
    pub shares: Option<String>,
}

/// `memory` block of a sizing policy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryBlock {
    pub size_in_mb: Option<String>,
    pub reservation_guarantee: Option<String>,
    pub limit_in_mb: Option<String>,
    pub shares: Option<String>,
}

/// User-facing VM sizing policy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizingPolicyRecord {
    /// Owning organization; not sent to the remote object
    pub org: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub cpu: Option<CpuBlock>,
    pub memory: Option<MemoryBlock>,
}

impl SizingPolicyRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Forward mapping: build the remote request object
    pub fn to_remote(&self) -> Result<VdcComputePolicy, PolicyError> {
        let mut policy = VdcComputePolicy {
            name: self.name.clone(),
            description: non_empty(&self.description),
            is_sizing_only: true,
            ..Default::default()
        };

        if let Some(cpu) = &self.cpu {
            policy.cpu_speed = parse_int("cpu.speed_in_mhz", &cpu.speed_in_mhz)?;
            policy.cpu_limit = parse_int("cpu.limit_in_mhz", &cpu.limit_in_mhz)?;
            policy.cpu_shares = parse_int("cpu.shares", &cpu.shares)?;
            policy.cpu_count = parse_int("cpu.count", &cpu.count)?;
            policy.cores_per_socket = parse_int("cpu.cores_per_socket", &cpu.cores_per_socket)?;
            policy.cpu_reservation_guarantee =
                parse_float("cpu.reservation_guarantee", &cpu.reservation_guarantee)?;
        }

        if let Some(memory) = &self.memory {
            policy.memory = parse_int("memory.size_in_mb", &memory.size_in_mb)?;
            policy.memory_limit = parse_int("memory.limit_in_mb", &memory.limit_in_mb)?;
            policy.memory_shares = parse_int("memory.shares", &memory.shares)?;
            policy.memory_reservation_guarantee =
                parse_float("memory.reservation_guarantee", &memory.reservation_guarantee)?;
        }

        Ok(policy)
    }

    /// Reverse mapping: build the record from a remote object
    pub fn from_remote(policy: &VdcComputePolicy) -> Self {
        let cpu = CpuBlock {
            speed_in_mhz: policy.cpu_speed.map(|v| v.to_string()),
            count: policy.cpu_count.map(|v| v.to_string()),
            cores_per_socket: policy.cores_per_socket.map(|v| v.to_string()),
            reservation_guarantee: policy.cpu_reservation_guarantee.map(format_float),
            limit_in_mhz: policy.cpu_limit.map(|v| v.to_string()),
            shares: policy.cpu_shares.map(|v| v.to_string()),
        };
        let memory = MemoryBlock {
            size_in_mb: policy.memory.map(|v| v.to_string()),
            reservation_guarantee: policy.memory_reservation_guarantee.map(format_float),
            limit_in_mb: policy.memory_limit.map(|v| v.to_string()),
            shares: policy.memory_shares.map(|v| v.to_string()),
        };

        Self {
            org: None,
            name: policy.name.clone(),
            description: non_empty(&policy.description),
            cpu: (cpu != CpuBlock::default()).then_some(cpu),
            memory: (memory != MemoryBlock::default()).then_some(memory),
        }
    }

    pub fn with_org(mut self, org: impl Into<String>) -> Self {
        self.org = Some(org.into());
        self
    }

    /// Read a record from resource attributes
    ///
    /// Blocks are lists holding one map; numeric literals are taken in their
    /// string form.
    pub fn from_attributes(attributes: &HashMap<String, Value>) -> Result<Self, PolicyError> {
        let name = attributes
            .get("name")
            .and_then(Value::as_scalar_string)
            .ok_or(PolicyError::MissingAttribute("name"))?;

        let cpu = single_block(attributes, "cpu")?.map(|block| CpuBlock {
            speed_in_mhz: block_field(block, "speed_in_mhz"),
            count: block_field(block, "count"),
            cores_per_socket: block_field(block, "cores_per_socket"),
            reservation_guarantee: block_field(block, "reservation_guarantee"),
            limit_in_mhz: block_field(block, "limit_in_mhz"),
            shares: block_field(block, "shares"),
        });

        let memory = single_block(attributes, "memory")?.map(|block| MemoryBlock {
            size_in_mb: block_field(block, "size_in_mb"),
            reservation_guarantee: block_field(block, "reservation_guarantee"),
            limit_in_mb: block_field(block, "limit_in_mb"),
            shares: block_field(block, "shares"),
        });

        Ok(Self {
            org: attributes
                .get("org")
                .and_then(Value::as_scalar_string)
                .filter(|s| !s.is_empty()),
            name,
            description: attributes
                .get("description")
                .and_then(Value::as_scalar_string),
            cpu,
            memory,
        })
    }

    /// Write a record out as resource attributes
    pub fn to_attributes(&self) -> HashMap<String, Value> {
        let mut attributes = HashMap::new();
        attributes.insert("name".to_string(), Value::String(self.name.clone()));
        if let Some(org) = &self.org {
            attributes.insert("org".to_string(), Value::String(org.clone()));
        }
        if let Some(description) = &self.description {
            attributes.insert(
                "description".to_string(),
                Value::String(description.clone()),
            );
        }

        if let Some(cpu) = &self.cpu {
            let mut block = HashMap::new();
            insert_field(&mut block, "speed_in_mhz", &cpu.speed_in_mhz);
            insert_field(&mut block, "count", &cpu.count);
            insert_field(&mut block, "cores_per_socket", &cpu.cores_per_socket);
            insert_field(
                &mut block,
                "reservation_guarantee",
                &cpu.reservation_guarantee,
            );
            insert_field(&mut block, "limit_in_mhz", &cpu.limit_in_mhz);
            insert_field(&mut block, "shares", &cpu.shares);
            attributes.insert("cpu".to_string(), Value::List(vec![Value::Map(block)]));
        }

        if let Some(memory) = &self.memory {
            let mut block = HashMap::new();
            insert_field(&mut block, "size_in_mb", &memory.size_in_mb);
            insert_field(
                &mut block,
                "reservation_guarantee",
                &memory.reservation_guarantee,
            );
            insert_field(&mut block, "limit_in_mb", &memory.limit_in_mb);
            insert_field(&mut block, "shares", &memory.shares);
            attributes.insert("memory".to_string(), Value::List(vec![Value::Map(block)]));
        }

        attributes
    }
}

/// Reject changes to `cpu` or `memory` between two records
///
/// Blocks are compared by their parsed values, so `"0.50"` and `"0.5"` are
/// the same setting.
pub fn check_update(old: &SizingPolicyRecord, new: &SizingPolicyRecord) -> Result<(), PolicyError> {
    let old_remote = old.to_remote()?;
    let new_remote = new.to_remote()?;

    if cpu_settings(&old_remote) != cpu_settings(&new_remote) {
        return Err(PolicyError::ImmutableFieldChanged { field: "cpu" });
    }
    if memory_settings(&old_remote) != memory_settings(&new_remote) {
        return Err(PolicyError::ImmutableFieldChanged { field: "memory" });
    }
    Ok(())
}

/// Apply an update to a fetched remote object
///
/// Only `name` and `description` are carried over; everything else on the
/// remote object is left as the server returned it.
pub fn apply_update(
    remote: &mut VdcComputePolicy,
    old: &SizingPolicyRecord,
    new: &SizingPolicyRecord,
) -> Result<(), PolicyError> {
    check_update(old, new)?;

    if old.name != new.name {
        remote.name = new.name.clone();
    }
    if non_empty(&old.description) != non_empty(&new.description) {
        remote.description = Some(new.description.clone().unwrap_or_default());
    }
    Ok(())
}

type CpuSettings = (
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<f64>,
);

fn cpu_settings(p: &VdcComputePolicy) -> CpuSettings {
    (
        p.cpu_speed,
        p.cpu_count,
        p.cores_per_socket,
        p.cpu_limit,
        p.cpu_shares,
        p.cpu_reservation_guarantee,
    )
}

fn memory_settings(p: &VdcComputePolicy) -> (Option<i64>, Option<i64>, Option<i64>, Option<f64>) {
    (
        p.memory,
        p.memory_limit,
        p.memory_shares,
        p.memory_reservation_guarantee,
    )
}

fn non_empty(s: &Option<String>) -> Option<String> {
    s.as_ref().filter(|s| !s.is_empty()).cloned()
}

fn parse_int(field: &'static str, raw: &Option<String>) -> Result<Option<i64>, PolicyError> {
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|e| PolicyError::InvalidFieldFormat {
                field,
                value: s.to_string(),
                reason: e.to_string(),
            }),
    }
}

fn parse_float(field: &'static str, raw: &Option<String>) -> Result<Option<f64>, PolicyError> {
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| PolicyError::InvalidFieldFormat {
                field,
                value: s.to_string(),
                reason: e.to_string(),
            }),
    }
}

/// Shortest representation that parses back to the same value
fn format_float(f: f64) -> String {
    f.to_string()
}

fn single_block<'a>(
    attributes: &'a HashMap<String, Value>,
    name: &'static str,
) -> Result<Option<&'a HashMap<String, Value>>, PolicyError> {
    match attributes.get(name) {
        None => Ok(None),
        Some(Value::List(items)) => match items.as_slice() {
            [] => Ok(None),
            [Value::Map(block)] => Ok(Some(block)),
            _ => Err(PolicyError::InvalidBlock(name)),
        },
        Some(Value::Map(block)) => Ok(Some(block)),
        Some(_) => Err(PolicyError::InvalidBlock(name)),
    }
}

fn block_field(block: &HashMap<String, Value>, key: &str) -> Option<String> {
    block.get(key).and_then(Value::as_scalar_string)
}

fn insert_field(block: &mut HashMap<String, Value>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        block.insert(key.to_string(), Value::String(v.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_record() -> SizingPolicyRecord {
        SizingPolicyRecord {
            org: None,
            name: "full".to_string(),
            description: Some("every field".to_string()),
            cpu: Some(CpuBlock {
                speed_in_mhz: Some("1000".to_string()),
                count: Some("9".to_string()),
                cores_per_socket: Some("3".to_string()),
                reservation_guarantee: Some("0.45".to_string()),
                limit_in_mhz: Some("2400".to_string()),
                shares: Some("886".to_string()),
            }),
            memory: Some(MemoryBlock {
                size_in_mb: Some("3200".to_string()),
                reservation_guarantee: Some("0.3".to_string()),
                limit_in_mb: Some("2800".to_string()),
                shares: Some("1580".to_string()),
            }),
        }
    }

    #[test]
    fn round_trip_fully_populated() {
        let record = full_record();
        let remote = record.to_remote().unwrap();
        assert_eq!(SizingPolicyRecord::from_remote(&remote), record);
    }

    #[test]
    fn round_trip_whole_number_fraction() {
        let mut record = full_record();
        if let Some(cpu) = record.cpu.as_mut() {
            cpu.reservation_guarantee = Some("1".to_string());
        }
        if let Some(memory) = record.memory.as_mut() {
            memory.reservation_guarantee = Some("0".to_string());
        }
        let remote = record.to_remote().unwrap();
        assert_eq!(remote.cpu_reservation_guarantee, Some(1.0));
        assert_eq!(SizingPolicyRecord::from_remote(&remote), record);
    }

    #[test]
    fn forward_maps_every_field() {
        let remote = full_record().to_remote().unwrap();
        assert_eq!(remote.name, "full");
        assert_eq!(remote.description.as_deref(), Some("every field"));
        assert_eq!(remote.cpu_speed, Some(1000));
        assert_eq!(remote.cpu_count, Some(9));
        assert_eq!(remote.cores_per_socket, Some(3));
        assert_eq!(remote.cpu_reservation_guarantee, Some(0.45));
        assert_eq!(remote.cpu_limit, Some(2400));
        assert_eq!(remote.cpu_shares, Some(886));
        assert_eq!(remote.memory, Some(3200));
        assert_eq!(remote.memory_reservation_guarantee, Some(0.3));
        assert_eq!(remote.memory_limit, Some(2800));
        assert_eq!(remote.memory_shares, Some(1580));
        assert!(remote.is_sizing_only);
    }

    #[test]
    fn empty_shares_stays_unset() {
        let record = SizingPolicyRecord {
            cpu: Some(CpuBlock {
                speed_in_mhz: Some("2400".to_string()),
                shares: Some(String::new()),
                ..Default::default()
            }),
            ..SizingPolicyRecord::new("speed-only")
        };

        let remote = record.to_remote().unwrap();
        assert_eq!(remote.cpu_speed, Some(2400));
        assert_eq!(remote.cpu_shares, None);
    }

    #[test]
    fn count_is_guarded_independently_of_shares() {
        let record = SizingPolicyRecord {
            cpu: Some(CpuBlock {
                count: Some("4".to_string()),
                cores_per_socket: Some("2".to_string()),
                ..Default::default()
            }),
            ..SizingPolicyRecord::new("count-only")
        };

        let remote = record.to_remote().unwrap();
        assert_eq!(remote.cpu_count, Some(4));
        assert_eq!(remote.cores_per_socket, Some(2));
        assert_eq!(remote.cpu_shares, None);
    }

    #[test]
    fn omitted_fields_stay_absent() {
        let record = SizingPolicyRecord::new("bare");
        let remote = record.to_remote().unwrap();
        assert_eq!(
            remote,
            VdcComputePolicy {
                name: "bare".to_string(),
                is_sizing_only: true,
                ..Default::default()
            }
        );
        assert_eq!(SizingPolicyRecord::from_remote(&remote), record);
    }

    #[test]
    fn invalid_number_names_the_field() {
        let record = SizingPolicyRecord {
            memory: Some(MemoryBlock {
                limit_in_mb: Some("lots".to_string()),
                ..Default::default()
            }),
            ..SizingPolicyRecord::new("bad")
        };

        match record.to_remote() {
            Err(PolicyError::InvalidFieldFormat { field, value, .. }) => {
                assert_eq!(field, "memory.limit_in_mb");
                assert_eq!(value, "lots");
            }
            other => panic!("expected InvalidFieldFormat, got {:?}", other),
        }

        let err: ProviderError = record.to_remote().unwrap_err().into();
        assert_eq!(err.kind, ErrorKind::InvalidFieldFormat);
    }

    #[test]
    fn update_rejects_cpu_change() {
        let old = full_record();
        let mut new = full_record();
        if let Some(cpu) = new.cpu.as_mut() {
            cpu.count = Some("10".to_string());
        }
        assert_eq!(
            check_update(&old, &new),
            Err(PolicyError::ImmutableFieldChanged { field: "cpu" })
        );
    }

    #[test]
    fn update_rejects_memory_removal() {
        let old = full_record();
        let new = SizingPolicyRecord {
            memory: None,
            ..full_record()
        };
        assert_eq!(
            check_update(&old, &new),
            Err(PolicyError::ImmutableFieldChanged { field: "memory" })
        );
    }

    #[test]
    fn update_ignores_equivalent_spelling() {
        let old = full_record();
        let mut new = full_record();
        if let Some(cpu) = new.cpu.as_mut() {
            cpu.reservation_guarantee = Some("0.450".to_string());
        }
        assert!(check_update(&old, &new).is_ok());
    }

    #[test]
    fn update_applies_name_and_description() {
        let old = full_record();
        let new = SizingPolicyRecord {
            name: "renamed".to_string(),
            description: None,
            ..full_record()
        };
        let mut remote = old.to_remote().unwrap();
        remote.id = Some("urn:vcloud:vdcComputePolicy:1".to_string());

        apply_update(&mut remote, &old, &new).unwrap();
        assert_eq!(remote.name, "renamed");
        assert_eq!(remote.description.as_deref(), Some(""));
        assert_eq!(remote.cpu_count, Some(9));
        assert_eq!(remote.id.as_deref(), Some("urn:vcloud:vdcComputePolicy:1"));
    }

    #[test]
    fn attributes_round_trip() {
        let record = full_record().with_org("org1");
        let attributes = record.to_attributes();
        assert_eq!(
            SizingPolicyRecord::from_attributes(&attributes).unwrap(),
            record
        );
    }

    #[test]
    fn attributes_accept_numeric_literals() {
        let mut cpu = HashMap::new();
        cpu.insert("count".to_string(), Value::Int(2));
        cpu.insert("reservation_guarantee".to_string(), Value::Float(0.5));
        let mut attributes = HashMap::new();
        attributes.insert("name".to_string(), Value::String("n".to_string()));
        attributes.insert("cpu".to_string(), Value::List(vec![Value::Map(cpu)]));

        let record = SizingPolicyRecord::from_attributes(&attributes).unwrap();
        let remote = record.to_remote().unwrap();
        assert_eq!(remote.cpu_count, Some(2));
        assert_eq!(remote.cpu_reservation_guarantee, Some(0.5));
    }

    #[test]
    fn attributes_require_name() {
        assert_eq!(
            SizingPolicyRecord::from_attributes(&HashMap::new()),
            Err(PolicyError::MissingAttribute("name"))
        );
    }

    #[test]
    fn two_cpu_blocks_are_rejected() {
        let mut attributes = HashMap::new();
        attributes.insert("name".to_string(), Value::String("n".to_string()));
        attributes.insert(
            "cpu".to_string(),
            Value::List(vec![Value::Map(HashMap::new()), Value::Map(HashMap::new())]),
        );
        assert_eq!(
            SizingPolicyRecord::from_attributes(&attributes),
            Err(PolicyError::InvalidBlock("cpu"))
        );
    }
}
