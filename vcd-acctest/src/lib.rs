//! Acceptance test support for the vCloud Director provider
//!
//! The main piece is [`NotFoundHarness`], which checks that every registered
//! data source reports a missing object with the "entity not found" marker.

pub mod config;
pub mod executor;
pub mod harness;
pub mod mandatory;
pub mod probe;
pub mod resolve;
pub mod skip;

use thiserror::Error;

pub use config::TestConfig;
pub use executor::{ConfigExecutor, InProcessExecutor};
pub use harness::{HarnessReport, NotFoundHarness, ProbeOutcome, ProbeResult, SHORT_MODE_REASON};
pub use resolve::{ClientEnvironment, ProbeEnvironment};

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("test configuration: {0}")]
    Config(String),

    #[error("resolving probe fields: {0}")]
    Resolution(String),

    #[error("invalid expected-error pattern: {0}")]
    Pattern(#[from] regex::Error),
}
