//! vcd Core
//!
//! Resource model, provider trait, schemas and configuration parsing shared
//! by the vCloud Director provider and its test tooling

pub mod differ;
pub mod parser;
pub mod provider;
pub mod render;
pub mod resource;
pub mod schema;
