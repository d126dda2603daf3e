//! Skip rules
//!
//! Some data sources cannot be probed from every session: provider-level
//! objects need a system administrator, and a few need a minimum API
//! version or NSX-T configuration.

use vcd_provider::client::{ApiVersion, SessionInfo};

use crate::config::TestConfig;

/// Lowest API version serving `vcd_external_network_v2`
pub const EXTERNAL_NETWORK_V2_MIN_API: ApiVersion = ApiVersion::new(33, 0);

/// Data sources backed by NSX-T objects
const NSXT_SOURCES: &[&str] = &[
    "vcd_nsxt_tier0_router",
    "vcd_external_network_v2",
    "vcd_nsxt_manager",
];

/// Reason a data source cannot be probed in this session, if any
pub fn skip_reason(
    data_source: &str,
    session: &SessionInfo,
    config: &TestConfig,
) -> Option<String> {
    if data_source == "vcd_external_network" && !session.is_sysadmin {
        return Some("works only with system administrator privileges".to_string());
    }

    if data_source == "vcd_external_network_v2"
        && session.max_api_version < EXTERNAL_NETWORK_V2_MIN_API
        && !session.is_sysadmin
    {
        return Some(format!(
            "external network v2 requires at least API version {} (endpoint supports {})",
            EXTERNAL_NETWORK_V2_MIN_API, session.max_api_version
        ));
    }

    if NSXT_SOURCES.contains(&data_source) && (!config.has_nsxt() || !session.is_sysadmin) {
        return Some(
            "works only with system administrator privileges and configured NSX-T manager and tier-0 router"
                .to_string(),
        );
    }

    None
}
