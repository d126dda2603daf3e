//! Schema - Define type schemas for resources and data sources
//!
//! Providers define schemas for each resource type, enabling validation of
//! configuration before any remote call, and letting test tooling discover
//! which fields a data source needs.

use std::collections::HashMap;
use std::fmt;

use crate::resource::Value;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String (numeric literals are accepted in their literal form)
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    /// List
    List(Box<AttributeType>),
    /// Map
    Map(Box<AttributeType>),
    /// Nested block, written as `name { ... }` and held as a list of maps
    Block(Box<BlockSchema>),
}

impl AttributeType {
    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (AttributeType::String, Value::String(_) | Value::Int(_) | Value::Float(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Custom { validate, .. }, v) => {
                validate(v).map_err(|msg| TypeError::ValidationFailed { message: msg })
            }

            (AttributeType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    inner.validate(v).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Block(block), Value::List(items)) => {
                if items.len() > block.max_items {
                    return Err(TypeError::TooManyBlocks {
                        max: block.max_items,
                        got: items.len(),
                    });
                }
                for (i, item) in items.iter().enumerate() {
                    let Value::Map(attrs) = item else {
                        return Err(TypeError::ListItemError {
                            index: i,
                            inner: Box::new(TypeError::TypeMismatch {
                                expected: "Block".to_string(),
                                got: item.type_name(),
                            }),
                        });
                    };
                    if let Err(mut errors) = validate_attributes(&block.attributes, attrs) {
                        return Err(errors.remove(0));
                    }
                }
                Ok(())
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Block(_) => "Block".to_string(),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Exactly one of {} must be set", fields.join(", "))]
    ExactlyOneOf { fields: Vec<String> },

    #[error("At most {max} block(s) allowed, got {got}")]
    TooManyBlocks { max: usize, got: usize },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },
}

impl Value {
    fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Float(_) => "Float".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
        }
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    /// Set by the remote system, never by the user
    pub computed: bool,
    /// Changing this attribute replaces the resource
    pub force_new: bool,
    /// Group of attributes of which exactly one must be set (includes self)
    pub exactly_one_of: Vec<String>,
    pub default: Option<Value>,
    pub description: Option<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            computed: false,
            force_new: false,
            exactly_one_of: Vec::new(),
            default: None,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn exactly_one_of(mut self, group: &[&str]) -> Self {
        self.exactly_one_of = group.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// True if this attribute leads its "exactly one of" group
    pub fn leads_exactly_one_of(&self) -> bool {
        self.exactly_one_of.first() == Some(&self.name)
    }
}

/// Nested block schema
#[derive(Debug, Clone)]
pub struct BlockSchema {
    pub attributes: HashMap<String, AttributeSchema>,
    pub max_items: usize,
}

impl BlockSchema {
    pub fn new(max_items: usize) -> Self {
        Self {
            attributes: HashMap::new(),
            max_items,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Validate resource attributes
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        validate_attributes(&self.attributes, attributes)
    }

    /// Attribute names, sorted
    pub fn attribute_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.attributes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn validate_attributes(
    schemas: &HashMap<String, AttributeSchema>,
    attributes: &HashMap<String, Value>,
) -> Result<(), Vec<TypeError>> {
    let mut errors = Vec::new();

    // Check required attributes
    for (name, schema) in schemas {
        if schema.required && !attributes.contains_key(name) && schema.default.is_none() {
            errors.push(TypeError::MissingRequired { name: name.clone() });
        }

        // Each group is checked once, from its leading member
        if schema.leads_exactly_one_of() {
            let present = schema
                .exactly_one_of
                .iter()
                .filter(|f| attributes.contains_key(f.as_str()))
                .count();
            if present != 1 {
                errors.push(TypeError::ExactlyOneOf {
                    fields: schema.exactly_one_of.clone(),
                });
            }
        }
    }

    // Type check each attribute
    for (name, value) in attributes {
        if let Some(schema) = schemas.get(name)
            && let Err(e) = schema.attr_type.validate(value)
        {
            errors.push(e);
        }
        // Unknown attributes are allowed (for flexibility)
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    /// String holding an integer >= 0 (e.g., "2400")
    pub fn non_negative_int() -> AttributeType {
        AttributeType::Custom {
            name: "NonNegativeInt".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value.as_scalar_string() {
                Some(s) => validate_int_at_least(&s, 0),
                None => Err("Expected string".to_string()),
            },
        }
    }

    /// String holding a float in [0, 1] (e.g., "0.75")
    pub fn fraction() -> AttributeType {
        AttributeType::Custom {
            name: "Fraction".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value.as_scalar_string() {
                Some(s) => validate_float_between(&s, 0.0, 1.0),
                None => Err("Expected string".to_string()),
            },
        }
    }
}

/// Validate that a string is an integer no smaller than `min`
///
/// The empty string is accepted and means "not set".
pub fn validate_int_at_least(s: &str, min: i64) -> Result<(), String> {
    if s.is_empty() {
        return Ok(());
    }
    match s.parse::<i64>() {
        Ok(n) if n >= min => Ok(()),
        Ok(n) => Err(format!("expected value to be at least {}, got {}", min, n)),
        Err(_) => Err(format!("expected '{}' to be an integer", s)),
    }
}

/// Validate that a string is a float within `[min, max]`
///
/// The empty string is accepted and means "not set".
pub fn validate_float_between(s: &str, min: f64, max: f64) -> Result<(), String> {
    if s.is_empty() {
        return Ok(());
    }
    match s.parse::<f64>() {
        Ok(f) if (min..=max).contains(&f) => Ok(()),
        Ok(f) => Err(format!(
            "expected value to be in the range ({} - {}), got {}",
            min, max, f
        )),
        Err(_) => Err(format!("expected '{}' to be a float", s)),
    }
}
