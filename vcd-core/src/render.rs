//! Render - Write resources back out as configuration text
//!
//! Output is deterministic: attributes are sorted by name and nested blocks
//! come after plain attributes, so rendered text can be compared in tests.

use crate::resource::{Resource, Value};

/// Rendering options
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Number of spaces for indentation (default: 2)
    pub indent_size: usize,
    /// Comment lines written above the block, without the leading `#`
    pub header_comments: Vec<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            indent_size: 2,
            header_comments: Vec::new(),
        }
    }
}

impl RenderConfig {
    pub fn with_header_comment(mut self, comment: impl Into<String>) -> Self {
        self.header_comments.push(comment.into());
        self
    }
}

/// Render a resource as a `resource` or `data` block
pub fn render_block(resource: &Resource, config: &RenderConfig) -> String {
    let mut out = String::new();
    for comment in &config.header_comments {
        out.push_str("# ");
        out.push_str(comment);
        out.push('\n');
    }

    let keyword = if resource.is_data_source() {
        "data"
    } else {
        "resource"
    };
    out.push_str(&format!(
        "{} {} {} {{\n",
        keyword,
        quote(&resource.id.resource_type),
        quote(&resource.id.name)
    ));

    let indent = " ".repeat(config.indent_size);
    write_attributes(&mut out, &resource.attributes, &indent, 1);
    out.push_str("}\n");
    out
}

fn write_attributes(
    out: &mut String,
    attributes: &std::collections::HashMap<String, Value>,
    indent: &str,
    depth: usize,
) {
    let prefix = indent.repeat(depth);
    let mut keys: Vec<&String> = attributes.keys().filter(|k| !k.starts_with('_')).collect();
    keys.sort();

    let (blocks, plain): (Vec<&String>, Vec<&String>) =
        keys.into_iter().partition(|k| is_block_list(&attributes[*k]));

    for key in plain {
        out.push_str(&format!(
            "{}{} = {}\n",
            prefix,
            key,
            render_value(&attributes[key])
        ));
    }

    for key in blocks {
        if let Value::List(items) = &attributes[key] {
            for item in items {
                if let Value::Map(map) = item {
                    out.push_str(&format!("{}{} {{\n", prefix, key));
                    write_attributes(out, map, indent, depth + 1);
                    out.push_str(&format!("{}}}\n", prefix));
                }
            }
        }
    }
}

fn is_block_list(value: &Value) -> bool {
    match value {
        Value::List(items) => !items.is_empty() && items.iter().all(|i| matches!(i, Value::Map(_))),
        _ => false,
    }
}

/// Render a single value as an expression
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => quote(s),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::List(items) => {
            let rendered: Vec<String> = items.iter().map(render_value).collect();
            format!("[{}]", rendered.join(", "))
        }
        Value::Map(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let rendered: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{} = {}", k, render_value(&map[k])))
                .collect();
            format!("{{ {} }}", rendered.join(", "))
        }
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::parser;

    #[test]
    fn render_data_block() {
        let resource = Resource::new("vcd_org", "not-existing")
            .with_read_only(true)
            .with_attribute("name", Value::String("does-not-exist".to_string()));
        let config = RenderConfig::default().with_header_comment("probe");

        assert_eq!(
            render_block(&resource, &config),
            "# probe\ndata \"vcd_org\" \"not-existing\" {\n  name = \"does-not-exist\"\n}\n"
        );
    }

    #[test]
    fn render_sorted_with_nested_blocks_last() {
        let mut cpu = HashMap::new();
        cpu.insert("count".to_string(), Value::String("2".to_string()));
        let resource = Resource::new("vcd_vm_sizing_policy", "small")
            .with_attribute("name", Value::String("small".to_string()))
            .with_attribute("cpu", Value::List(vec![Value::Map(cpu)]))
            .with_attribute("description", Value::String("d".to_string()));

        let text = render_block(&resource, &RenderConfig::default());
        assert_eq!(
            text,
            "resource \"vcd_vm_sizing_policy\" \"small\" {\n  description = \"d\"\n  name = \"small\"\n  cpu {\n    count = \"2\"\n  }\n}\n"
        );
    }

    #[test]
    fn rendered_text_parses_back() {
        let resource = Resource::new("vcd_catalog", "c")
            .with_read_only(true)
            .with_attribute("org", Value::String("my \"org\"".to_string()))
            .with_attribute("name", Value::String("cat".to_string()));

        let text = render_block(&resource, &RenderConfig::default());
        let parsed = parser::parse(&text).unwrap();
        assert_eq!(parsed.resources, vec![resource]);
    }
}
