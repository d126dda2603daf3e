//! Configuration execution engines
//!
//! The harness only needs to know whether applying a configuration failed
//! and with what message; how it is applied is up to the engine.

use async_trait::async_trait;
use log::debug;
use vcd_core::parser;
use vcd_core::provider::Provider;

/// Applies a rendered configuration
#[async_trait]
pub trait ConfigExecutor: Send + Sync {
    /// Apply `config`; on failure, return the error text the engine reported
    async fn execute(&self, config: &str) -> Result<(), String>;
}

/// Runs `data` blocks directly through a [`Provider`]
pub struct InProcessExecutor<'a, P> {
    provider: &'a P,
}

impl<'a, P: Provider> InProcessExecutor<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<'a, P: Provider> ConfigExecutor for InProcessExecutor<'a, P> {
    async fn execute(&self, config: &str) -> Result<(), String> {
        let parsed = parser::parse(config).map_err(|e| e.to_string())?;
        if let Some(resource) = parsed.managed_resources().next() {
            return Err(format!(
                "{}: only data sources can be applied in process",
                resource.id
            ));
        }

        for data_source in parsed.data_sources() {
            debug!("reading {}", data_source.id);
            self.provider
                .read_data_source(data_source)
                .await
                .map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}
