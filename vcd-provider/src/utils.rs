//! Utility functions for identifier handling

/// Build a CloudAPI URN (e.g., ("vdcComputePolicy", "1234") -> "urn:vcloud:vdcComputePolicy:1234")
pub fn build_urn(entity: &str, uuid: &str) -> String {
    format!("urn:vcloud:{}:{}", entity, uuid)
}

/// Extract the trailing UUID from an href or URN
/// e.g., "https://vcd/api/vApp/vapp-6f2a..." -> "6f2a..."
pub fn extract_uuid(reference: &str) -> Option<&str> {
    let last = reference
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()?;
    let uuid = match last.split_once('-') {
        // Legacy hrefs prefix the UUID with the entity type ("vapp-", "vm-")
        Some((prefix, rest))
            if prefix.chars().all(|c| c.is_ascii_alphabetic()) && rest.len() == 36 =>
        {
            rest
        }
        _ => last,
    };
    (uuid.len() == 36 && uuid.chars().all(|c| c.is_ascii_hexdigit() || c == '-')).then_some(uuid)
}
