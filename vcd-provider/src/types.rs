//! Wire types for the vCloud Director CloudAPI

use serde::{Deserialize, Serialize};

/// VDC compute policy as exchanged with `/cloudapi/1.0.0/vdcComputePolicies`
///
/// Every sizing setting is optional: an absent field means "not specified",
/// which the remote system treats differently from an explicit zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VdcComputePolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_speed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cores_per_socket: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_reservation_guarantee: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_shares: Option<i64>,
    /// Memory size in MB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_reservation_guarantee: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_shares: Option<i64>,
    #[serde(default)]
    pub is_sizing_only: bool,
}

/// Paged CloudAPI response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
}

/// Organization reference as returned by `/cloudapi/1.0.0/orgs`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgRecord {
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_are_omitted() {
        let policy = VdcComputePolicy {
            name: "small".to_string(),
            cpu_speed: Some(2400),
            is_sizing_only: true,
            ..Default::default()
        };
        let json = serde_json::to_value(&policy).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "small", "cpuSpeed": 2400, "isSizingOnly": true})
        );
    }

    #[test]
    fn explicit_zero_is_kept() {
        let policy = VdcComputePolicy {
            name: "zero".to_string(),
            cpu_shares: Some(0),
            ..Default::default()
        };
        let json = serde_json::to_value(&policy).unwrap();
        assert_eq!(json["cpuShares"], 0);
        assert!(json.get("memoryShares").is_none());
    }

    #[test]
    fn decode_page() {
        let body = r#"{
            "resultTotal": 1,
            "pageCount": 1,
            "values": [{
                "id": "urn:vcloud:vdcComputePolicy:1f4a",
                "name": "small",
                "cpuCount": 2,
                "memoryReservationGuarantee": 0.5,
                "isSizingOnly": true
            }]
        }"#;
        let page: Page<VdcComputePolicy> = serde_json::from_str(body).unwrap();
        assert_eq!(page.values.len(), 1);
        assert_eq!(page.values[0].cpu_count, Some(2));
        assert_eq!(page.values[0].memory_reservation_guarantee, Some(0.5));
        assert_eq!(page.values[0].cpu_speed, None);
    }
}
