//! Parser - Parse Terraform-style configuration files
//!
//! Convert configuration to resources using pest

use pest::Parser;
use pest::iterators::{Pair, Pairs};
use pest_derive::Parser;
use std::collections::HashMap;

use crate::resource::{Resource, Value};

#[derive(Parser)]
#[grammar = "parser/hcl.pest"]
struct HclParser;

/// Parse error
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Syntax error: {0}")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),

    #[error("Invalid expression at line {line}: {message}")]
    InvalidExpression { line: usize, message: String },

    #[error("Duplicate {kind} block: {resource_type}.{name}")]
    DuplicateBlock {
        kind: &'static str,
        resource_type: String,
        name: String,
    },
}

/// Provider configuration block
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderBlock {
    pub name: String,
    pub attributes: HashMap<String, Value>,
}

/// Parse result
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    pub providers: Vec<ProviderBlock>,
    /// Resources and data sources, in declaration order
    pub resources: Vec<Resource>,
}

impl ParsedFile {
    /// Data source blocks only
    pub fn data_sources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter(|r| r.is_data_source())
    }

    /// Managed resource blocks only
    pub fn managed_resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter(|r| !r.is_data_source())
    }

    pub fn provider(&self, name: &str) -> Option<&ProviderBlock> {
        self.providers.iter().find(|p| p.name == name)
    }
}

/// Parse a configuration file
pub fn parse(input: &str) -> Result<ParsedFile, ParseError> {
    let pairs = HclParser::parse(Rule::file, input).map_err(Box::new)?;

    let mut parsed = ParsedFile::default();

    for pair in pairs {
        if pair.as_rule() != Rule::file {
            continue;
        }
        for statement in pair.into_inner() {
            if statement.as_rule() != Rule::statement {
                continue;
            }
            for block in statement.into_inner() {
                match block.as_rule() {
                    Rule::provider_block => {
                        let mut inner = block.into_inner();
                        let name = parse_string(next_pair(&mut inner, "provider name")?);
                        let attributes = parse_block_contents(inner)?;
                        parsed.providers.push(ProviderBlock { name, attributes });
                    }
                    Rule::resource_block => {
                        let resource = parse_labelled_block(block, false)?;
                        push_unique(&mut parsed.resources, resource, "resource")?;
                    }
                    Rule::data_block => {
                        let resource = parse_labelled_block(block, true)?;
                        push_unique(&mut parsed.resources, resource, "data")?;
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(parsed)
}

fn push_unique(
    resources: &mut Vec<Resource>,
    resource: Resource,
    kind: &'static str,
) -> Result<(), ParseError> {
    if resources
        .iter()
        .any(|r| r.id == resource.id && r.read_only == resource.read_only)
    {
        return Err(ParseError::DuplicateBlock {
            kind,
            resource_type: resource.id.resource_type,
            name: resource.id.name,
        });
    }
    resources.push(resource);
    Ok(())
}

fn next_pair<'a>(pairs: &mut Pairs<'a, Rule>, what: &str) -> Result<Pair<'a, Rule>, ParseError> {
    pairs.next().ok_or_else(|| ParseError::InvalidExpression {
        line: 0,
        message: format!("expected {}", what),
    })
}

/// Parse `resource "type" "name" { ... }` or `data "type" "name" { ... }`
fn parse_labelled_block(pair: Pair<Rule>, read_only: bool) -> Result<Resource, ParseError> {
    let mut inner = pair.into_inner();
    let resource_type = parse_string(next_pair(&mut inner, "block type")?);
    let name = parse_string(next_pair(&mut inner, "block name")?);
    let attributes = parse_block_contents(inner)?;

    Ok(Resource {
        id: crate::resource::ResourceId::new(resource_type, name),
        attributes,
        read_only,
    })
}

/// Parse block contents (attributes and nested blocks)
/// Nested blocks with the same name are collected into a list
fn parse_block_contents(pairs: Pairs<Rule>) -> Result<HashMap<String, Value>, ParseError> {
    let mut attributes: HashMap<String, Value> = HashMap::new();
    let mut nested_blocks: HashMap<String, Vec<Value>> = HashMap::new();

    for content_pair in pairs {
        if content_pair.as_rule() != Rule::block_content {
            continue;
        }
        let mut content = content_pair.into_inner();
        let inner = next_pair(&mut content, "attribute or block")?;
        match inner.as_rule() {
            Rule::attribute => {
                let (key, value) = parse_attribute(inner)?;
                attributes.insert(key, value);
            }
            Rule::nested_block => {
                let mut block_inner = inner.into_inner();
                let block_name = next_pair(&mut block_inner, "block name")?
                    .as_str()
                    .to_string();

                // Parse nested block attributes into a map
                let mut block_attrs = HashMap::new();
                for attr_pair in block_inner {
                    if attr_pair.as_rule() == Rule::attribute {
                        let (key, value) = parse_attribute(attr_pair)?;
                        block_attrs.insert(key, value);
                    }
                }

                // Add to the list of blocks with this name
                nested_blocks
                    .entry(block_name)
                    .or_default()
                    .push(Value::Map(block_attrs));
            }
            _ => {}
        }
    }

    // Convert nested blocks to list attributes
    for (name, blocks) in nested_blocks {
        attributes.insert(name, Value::List(blocks));
    }

    Ok(attributes)
}

fn parse_attribute(pair: Pair<Rule>) -> Result<(String, Value), ParseError> {
    let mut attr_inner = pair.into_inner();
    let key = next_pair(&mut attr_inner, "attribute name")?
        .as_str()
        .to_string();
    let value = parse_expression(next_pair(&mut attr_inner, "attribute value")?)?;
    Ok((key, value))
}

fn parse_expression(pair: Pair<Rule>) -> Result<Value, ParseError> {
    let line = pair.as_span().start_pos().line_col().0;
    let mut expr_inner = pair.into_inner();
    let inner = next_pair(&mut expr_inner, "expression")?;

    match inner.as_rule() {
        Rule::string => Ok(Value::String(parse_string(inner))),
        Rule::boolean => Ok(Value::Bool(inner.as_str() == "true")),
        Rule::int => inner
            .as_str()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| ParseError::InvalidExpression {
                line,
                message: format!("invalid integer '{}': {}", inner.as_str(), e),
            }),
        Rule::float => inner
            .as_str()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| ParseError::InvalidExpression {
                line,
                message: format!("invalid number '{}': {}", inner.as_str(), e),
            }),
        Rule::list => {
            let items = inner
                .into_inner()
                .map(parse_expression)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List(items))
        }
        _ => Err(ParseError::InvalidExpression {
            line,
            message: format!("unexpected expression '{}'", inner.as_str()),
        }),
    }
}

/// Extract and unescape the contents of a quoted string
fn parse_string(pair: Pair<Rule>) -> String {
    let raw = pair
        .into_inner()
        .next()
        .map(|inner| inner.as_str())
        .unwrap_or("");

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
