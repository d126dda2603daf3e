//! Probe configuration rendering

use vcd_core::render::{RenderConfig, render_block};
use vcd_core::resource::{Resource, Value};

/// Local name of every probe block
pub const PROBE_NAME: &str = "not-existing";

/// Comment marking probe files as unusable outside acceptance tests
pub const PROBE_HEADER: &str =
    "skip-binary-test: data source not found test only works in acceptance tests";

/// Render `data "<data_source>" "not-existing" { ... }` with the probe header
pub fn render_probe(data_source: &str, fields: &[(String, String)]) -> String {
    let resource = fields.iter().fold(
        Resource::new(data_source, PROBE_NAME).with_read_only(true),
        |resource, (field, value)| resource.with_attribute(field, Value::String(value.clone())),
    );
    render_block(&resource, &RenderConfig::default().with_header_comment(PROBE_HEADER))
}
