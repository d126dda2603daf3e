//! Import key parsing

use vcd_core::provider::{ErrorKind, ProviderError};

/// Parsed `<org><separator><policy-id>` import key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportKey {
    pub org: String,
    pub id: String,
}

impl ImportKey {
    /// Split `key` on `separator` into exactly two non-empty segments
    pub fn parse(key: &str, separator: &str) -> Result<Self, ProviderError> {
        let segments: Vec<&str> = if separator.is_empty() {
            vec![key]
        } else {
            key.split(separator).collect()
        };

        match segments.as_slice() {
            [org, id] if !org.is_empty() && !id.is_empty() => Ok(Self {
                org: org.to_string(),
                id: id.to_string(),
            }),
            _ => Err(ProviderError::new(
                ErrorKind::MalformedImportKey,
                format!(
                    "resource name must be specified as org{}my_existing_vm_sizing_policy_id, got '{}'",
                    separator, key
                ),
            )),
        }
    }
}
