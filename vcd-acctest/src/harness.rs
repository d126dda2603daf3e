//! Not-found probe harness
//!
//! For every registered data source, render a configuration that asks for
//! an object which cannot exist and check that reading it fails with the
//! "entity not found" marker instead of succeeding or failing some other way.

use std::fmt;

use log::{debug, info, warn};
use regex::Regex;
use vcd_core::provider::{ENTITY_NOT_FOUND, ResourceType};
use vcd_core::schema::ResourceSchema;

use crate::HarnessError;
use crate::config::TestConfig;
use crate::executor::ConfigExecutor;
use crate::mandatory::mandatory_fields;
use crate::probe::render_probe;
use crate::resolve::{ProbeEnvironment, Resolution, resolve_fields};
use crate::skip::skip_reason;

/// Outcome of probing one data source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Passed,
    Failed(String),
    Skipped(String),
}

/// Result for one data source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub data_source: String,
    pub outcome: ProbeOutcome,
    /// Rendered probe, when one was produced
    pub config: Option<String>,
}

impl ProbeResult {
    fn new(data_source: &str, outcome: ProbeOutcome) -> Self {
        Self {
            data_source: data_source.to_string(),
            outcome,
            config: None,
        }
    }

    fn with_config(mut self, config: String) -> Self {
        self.config = Some(config);
        self
    }
}

/// Per-source results of a harness run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarnessReport {
    pub results: Vec<ProbeResult>,
}

/// Reason reported for every source in short mode
pub const SHORT_MODE_REASON: &str = "acceptance tests skipped";

impl HarnessReport {
    /// Report marking every data source as skipped
    pub fn all_skipped(data_sources: &[Box<dyn ResourceType>], reason: &str) -> Self {
        let results = data_sources
            .iter()
            .map(|ds| {
                ProbeResult::new(
                    &ds.schema().resource_type,
                    ProbeOutcome::Skipped(reason.to_string()),
                )
            })
            .collect();
        Self { results }
    }

    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, ProbeOutcome::Passed))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ProbeOutcome::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ProbeOutcome::Skipped(_)))
    }

    /// True when no probe failed
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Result for a data source, if it was probed
    pub fn get(&self, data_source: &str) -> Option<&ProbeResult> {
        self.results.iter().find(|r| r.data_source == data_source)
    }

    fn count(&self, predicate: impl Fn(&ProbeOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| predicate(&r.outcome)).count()
    }
}

impl fmt::Display for HarnessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.results {
            match &result.outcome {
                ProbeOutcome::Passed => writeln!(f, "PASS {}", result.data_source)?,
                ProbeOutcome::Failed(reason) => {
                    writeln!(f, "FAIL {}: {}", result.data_source, reason)?
                }
                ProbeOutcome::Skipped(reason) => {
                    writeln!(f, "SKIP {}: {}", result.data_source, reason)?
                }
            }
        }
        write!(
            f,
            "{} passed, {} failed, {} skipped",
            self.passed(),
            self.failed(),
            self.skipped()
        )
    }
}

/// Probes data sources for correct not-found handling
pub struct NotFoundHarness<'a, X, E> {
    config: &'a TestConfig,
    executor: X,
    environment: E,
    expected: Regex,
}

impl<'a, X: ConfigExecutor, E: ProbeEnvironment> NotFoundHarness<'a, X, E> {
    pub fn new(config: &'a TestConfig, executor: X, environment: E) -> Result<Self, HarnessError> {
        let expected = Regex::new(&format!(".*{}.*", regex::escape(ENTITY_NOT_FOUND)))?;
        Ok(Self {
            config,
            executor,
            environment,
            expected,
        })
    }

    /// Probe every data source in order
    pub async fn run(&self, data_sources: &[Box<dyn ResourceType>]) -> HarnessReport {
        if self.config.is_short() {
            return HarnessReport::all_skipped(data_sources, SHORT_MODE_REASON);
        }

        let mut report = HarnessReport::default();
        for data_source in data_sources {
            report.results.push(self.probe(&data_source.schema()).await);
        }
        info!(
            "not-found probes finished: {} passed, {} failed, {} skipped",
            report.passed(),
            report.failed(),
            report.skipped()
        );
        report
    }

    /// Probe a single data source
    pub async fn probe(&self, schema: &ResourceSchema) -> ProbeResult {
        let name = schema.resource_type.as_str();

        if let Some(reason) = skip_reason(name, self.environment.session(), self.config) {
            debug!("{}: skipped, {}", name, reason);
            return ProbeResult::new(name, ProbeOutcome::Skipped(reason));
        }

        let fields = mandatory_fields(schema);
        let resolved =
            match resolve_fields(name, &fields, self.config, &self.environment).await {
                Ok(Resolution::Fields(resolved)) => resolved,
                Ok(Resolution::Skip(reason)) => {
                    debug!("{}: skipped, {}", name, reason);
                    return ProbeResult::new(name, ProbeOutcome::Skipped(reason));
                }
                Err(e) => {
                    warn!("{}: {}", name, e);
                    return ProbeResult::new(name, ProbeOutcome::Failed(e.to_string()));
                }
            };

        let config = render_probe(name, &resolved);
        debug!("probe configuration for {}:\n{}", name, config);

        let outcome = match self.executor.execute(&config).await {
            Ok(()) => ProbeOutcome::Failed(format!(
                "expected an error matching '{}', but the read succeeded",
                self.expected
            )),
            Err(message) if self.expected.is_match(&message) => ProbeOutcome::Passed,
            Err(message) => ProbeOutcome::Failed(format!(
                "expected an error matching '{}', got: {}",
                self.expected, message
            )),
        };
        if let ProbeOutcome::Failed(reason) = &outcome {
            warn!("{}: {}", name, reason);
        }
        ProbeResult::new(name, outcome).with_config(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use vcd_core::schema::{AttributeSchema, AttributeType};
    use vcd_provider::client::{ApiVersion, SessionInfo};

    struct ScriptedExecutor {
        response: Result<(), String>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedExecutor {
        fn failing(message: &str) -> Self {
            Self {
                response: Err(message.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn succeeding() -> Self {
            Self {
                response: Ok(()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ConfigExecutor for ScriptedExecutor {
        async fn execute(&self, config: &str) -> Result<(), String> {
            self.seen.lock().unwrap().push(config.to_string());
            self.response.clone()
        }
    }

    struct StaticEnvironment(SessionInfo);

    #[async_trait]
    impl ProbeEnvironment for StaticEnvironment {
        fn session(&self) -> &SessionInfo {
            &self.0
        }

        async fn available_vapp(&self) -> Result<Option<String>, HarnessError> {
            Ok(None)
        }

        async fn nsxt_manager_urn(&self, _: &str) -> Result<Option<String>, HarnessError> {
            Err(HarnessError::Resolution("lookup broken".to_string()))
        }
    }

    struct Schema(ResourceSchema);

    impl ResourceType for Schema {
        fn name(&self) -> &'static str {
            "test"
        }

        fn schema(&self) -> ResourceSchema {
            self.0.clone()
        }
    }

    fn named(data_source: &str) -> ResourceSchema {
        ResourceSchema::new(data_source)
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
    }

    fn sysadmin() -> StaticEnvironment {
        StaticEnvironment(SessionInfo::sysadmin(ApiVersion::new(36, 0)))
    }

    #[tokio::test]
    async fn not_found_error_passes() {
        let config = TestConfig::default();
        let harness = NotFoundHarness::new(
            &config,
            ScriptedExecutor::failing("vcd_org: [ENF] entity not found: organization"),
            sysadmin(),
        )
        .unwrap();

        let result = harness.probe(&named("vcd_org")).await;
        assert_eq!(result.outcome, ProbeOutcome::Passed);
        let rendered = result.config.unwrap();
        assert!(rendered.contains("name = \"does-not-exist\""));
        assert!(rendered.starts_with("# skip-binary-test"));
    }

    #[tokio::test]
    async fn other_error_fails() {
        let config = TestConfig::default();
        let harness = NotFoundHarness::new(
            &config,
            ScriptedExecutor::failing("API error (HTTP 500): boom"),
            sysadmin(),
        )
        .unwrap();

        let result = harness.probe(&named("vcd_org")).await;
        assert!(matches!(result.outcome, ProbeOutcome::Failed(ref m) if m.contains("HTTP 500")));
    }

    #[tokio::test]
    async fn success_fails() {
        let config = TestConfig::default();
        let harness =
            NotFoundHarness::new(&config, ScriptedExecutor::succeeding(), sysadmin()).unwrap();

        let result = harness.probe(&named("vcd_org")).await;
        assert!(matches!(result.outcome, ProbeOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn marker_must_be_literal() {
        // Brackets in the marker are not a character class
        let config = TestConfig::default();
        let harness = NotFoundHarness::new(
            &config,
            ScriptedExecutor::failing("E entity not found"),
            sysadmin(),
        )
        .unwrap();

        let result = harness.probe(&named("vcd_org")).await;
        assert!(matches!(result.outcome, ProbeOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn failures_are_isolated() {
        let mut config = TestConfig::default();
        config.nsxt.manager = "nsxManager1".to_string();
        config.nsxt.tier0router = "tier0".to_string();
        let harness = NotFoundHarness::new(
            &config,
            ScriptedExecutor::failing("[ENF] entity not found"),
            sysadmin(),
        )
        .unwrap();

        let tier0 = ResourceSchema::new("vcd_nsxt_tier0_router")
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(AttributeSchema::new("nsxt_manager_id", AttributeType::String).required());
        let vm = ResourceSchema::new("vcd_vapp_vm")
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(AttributeSchema::new("vapp_name", AttributeType::String).required());
        let sources: Vec<Box<dyn ResourceType>> = vec![
            Box::new(Schema(tier0)),
            Box::new(Schema(vm)),
            Box::new(Schema(named("vcd_org"))),
        ];

        let report = harness.run(&sources).await;
        assert_eq!(report.results.len(), 3);
        assert!(matches!(
            report.get("vcd_nsxt_tier0_router").unwrap().outcome,
            ProbeOutcome::Failed(_)
        ));
        assert!(matches!(
            report.get("vcd_vapp_vm").unwrap().outcome,
            ProbeOutcome::Skipped(_)
        ));
        assert_eq!(report.get("vcd_org").unwrap().outcome, ProbeOutcome::Passed);
        assert_eq!((report.passed(), report.failed(), report.skipped()), (1, 1, 1));
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn skip_rules_prevent_execution() {
        let config = TestConfig::default();
        let executor = ScriptedExecutor::failing("[ENF] entity not found");
        let harness = NotFoundHarness::new(
            &config,
            executor,
            StaticEnvironment(SessionInfo::tenant("org1", ApiVersion::new(36, 0))),
        )
        .unwrap();

        let result = harness.probe(&named("vcd_external_network")).await;
        assert!(matches!(result.outcome, ProbeOutcome::Skipped(_)));
        assert!(result.config.is_none());
        assert!(harness.executor.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn short_mode_skips_everything() {
        let config = TestConfig {
            short_test: true,
            ..Default::default()
        };
        let harness = NotFoundHarness::new(
            &config,
            ScriptedExecutor::failing("[ENF] entity not found"),
            sysadmin(),
        )
        .unwrap();

        let sources: Vec<Box<dyn ResourceType>> = vec![Box::new(Schema(named("vcd_org")))];
        let report = harness.run(&sources).await;
        assert_eq!(
            report.get("vcd_org").unwrap().outcome,
            ProbeOutcome::Skipped(SHORT_MODE_REASON.to_string())
        );
        assert!(report.is_success());
    }

    #[test]
    fn all_skipped_covers_every_source() {
        let sources: Vec<Box<dyn ResourceType>> = vec![
            Box::new(Schema(named("vcd_org"))),
            Box::new(Schema(named("vcd_catalog"))),
        ];
        let report = HarnessReport::all_skipped(&sources, SHORT_MODE_REASON);
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.skipped(), 2);
        assert!(report.results.iter().all(|r| r.config.is_none()));
        assert!(report.is_success());
    }

    #[test]
    fn report_display() {
        let report = HarnessReport {
            results: vec![
                ProbeResult::new("vcd_org", ProbeOutcome::Passed),
                ProbeResult::new("vcd_vapp_vm", ProbeOutcome::Skipped("no vApp".to_string())),
            ],
        };
        assert_eq!(
            report.to_string(),
            "PASS vcd_org\nSKIP vcd_vapp_vm: no vApp\n1 passed, 0 failed, 1 skipped"
        );
    }
}
