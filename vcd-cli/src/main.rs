use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use log::LevelFilter;

use vcd_acctest::{
    ClientEnvironment, HarnessReport, InProcessExecutor, NotFoundHarness, ProbeOutcome,
    SHORT_MODE_REASON, TestConfig,
};
use vcd_core::parser::{self, ParsedFile};
use vcd_core::provider::Provider;
use vcd_core::resource::{Resource, Value};
use vcd_core::schema::ResourceSchema;
use vcd_provider::{resources, schemas};
use vcd_provider::{ProviderConfig, VcdProvider};

#[derive(Parser)]
#[command(name = "vcd")]
#[command(about = "vCloud Director provider tooling", long_about = None)]
struct Cli {
    /// Log debug output
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file against the provider schemas
    Validate {
        /// Path to the configuration file
        #[arg(default_value = "main.tf")]
        file: PathBuf,
    },
    /// Show resource or data source schemas
    Schema {
        /// Only this type
        name: Option<String>,

        /// List data sources instead of resources
        #[arg(long)]
        data_sources: bool,
    },
    /// Import an existing object and print its state
    Import {
        /// Resource type, e.g. vcd_vm_sizing_policy
        resource_type: String,

        /// Import key, e.g. my-org.urn:vcloud:vdcComputePolicy:...
        key: String,

        /// Configuration file holding the `provider "vcd"` block
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Check that every data source reports missing objects as not found
    Probe {
        /// Test configuration (defaults to $VCD_CONFIG)
        #[arg(long)]
        test_config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let result = match cli.command {
        Commands::Validate { file } => run_validate(&file),
        Commands::Schema { name, data_sources } => run_schema(name.as_deref(), data_sources),
        Commands::Import {
            resource_type,
            key,
            file,
        } => run_import(&resource_type, &key, file.as_deref()).await,
        Commands::Probe { test_config } => run_probe(test_config.as_deref()).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn setup_logging(verbose: bool) {
    let mut builder = env_logger::Builder::default();
    builder.filter_level(if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    });
    // RUST_LOG overrides the flag
    builder.parse_default_env();
    builder.init();
}

fn load_file(file: &Path) -> Result<ParsedFile, String> {
    let content = fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {}", file.display(), e))?;
    parser::parse(&content).map_err(|e| format!("Parse error: {}", e))
}

fn schemas_by_type(data_sources: bool) -> HashMap<String, ResourceSchema> {
    let schemas = if data_sources {
        schemas::all_data_source_schemas()
    } else {
        schemas::all_resource_schemas()
    };
    schemas
        .into_iter()
        .map(|schema| (schema.resource_type.clone(), schema))
        .collect()
}

fn validate_blocks(resources: &[Resource]) -> Result<(), String> {
    let resource_schemas = schemas_by_type(false);
    let data_source_schemas = schemas_by_type(true);
    let mut all_errors = Vec::new();

    for resource in resources {
        let schemas = if resource.is_data_source() {
            &data_source_schemas
        } else {
            &resource_schemas
        };
        let Some(schema) = schemas.get(&resource.id.resource_type) else {
            all_errors.push(format!("{}: unknown type", resource.id));
            continue;
        };
        if let Err(errors) = schema.validate(&resource.attributes) {
            for error in errors {
                all_errors.push(format!("{}: {}", resource.id, error));
            }
        }
    }

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(all_errors.join("\n"))
    }
}

fn run_validate(file: &Path) -> Result<(), String> {
    let parsed = load_file(file)?;

    println!("{}", "Validating...".cyan());
    validate_blocks(&parsed.resources)?;

    if let Some(provider) = parsed.provider("vcd") {
        ProviderConfig::from_attributes(&provider.attributes)
            .map_err(|e| format!("provider \"vcd\": {}", e))?;
    }

    println!(
        "{}",
        format!("✓ {} blocks validated successfully.", parsed.resources.len())
            .green()
            .bold()
    );
    for resource in &parsed.resources {
        let keyword = if resource.is_data_source() { "data" } else { "resource" };
        println!("  • {} {}", keyword, resource.id);
    }

    Ok(())
}

fn run_schema(name: Option<&str>, data_sources: bool) -> Result<(), String> {
    let schemas = schemas_by_type(data_sources);
    let mut names: Vec<&String> = match name {
        Some(name) => {
            let key = schemas
                .get_key_value(name)
                .map(|(k, _)| k)
                .ok_or_else(|| format!("unknown type: {}", name))?;
            vec![key]
        }
        None => schemas.keys().collect(),
    };
    names.sort();

    for type_name in names {
        let schema = &schemas[type_name];
        println!("{}", type_name.bold());
        if let Some(description) = &schema.description {
            println!("  {}", description.dimmed());
        }

        let mut attributes: Vec<_> = schema.attributes.values().collect();
        attributes.sort_by(|a, b| a.name.cmp(&b.name));
        for attr in attributes {
            let flag = if attr.required {
                "required".yellow()
            } else if attr.computed {
                "computed".blue()
            } else if !attr.exactly_one_of.is_empty() {
                format!("one of {}", attr.exactly_one_of.join(", ")).yellow()
            } else {
                "optional".normal()
            };
            let force_new = if attr.force_new { " (forces new)" } else { "" };
            println!("  {} [{}]{}", attr.name, flag, force_new);
        }
    }

    Ok(())
}

async fn run_import(resource_type: &str, key: &str, file: Option<&Path>) -> Result<(), String> {
    let attributes: HashMap<String, Value> = match file {
        Some(file) => load_file(file)?
            .provider("vcd")
            .map(|p| p.attributes.clone())
            .unwrap_or_default(),
        None => HashMap::new(),
    };
    let config = ProviderConfig::from_attributes(&attributes).map_err(|e| e.to_string())?;
    let provider = VcdProvider::connect(config)
        .await
        .map_err(|e| e.to_string())?;

    let state = provider
        .import(resource_type, key)
        .await
        .map_err(|e| e.to_string())?;
    let json = serde_json::to_string_pretty(&state.to_json()).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

async fn run_probe(test_config: Option<&Path>) -> Result<(), String> {
    let config = match test_config {
        Some(path) => TestConfig::load(path),
        None => TestConfig::from_env(),
    }
    .map_err(|e| e.to_string())?;

    if config.is_short() {
        let report =
            HarnessReport::all_skipped(&resources::data_source_types(), SHORT_MODE_REASON);
        return print_report(&report);
    }

    let provider_config = config.provider_config().map_err(|e| e.to_string())?;
    let provider = VcdProvider::connect(provider_config)
        .await
        .map_err(|e| e.to_string())?;
    let data_sources = provider.data_source_types();

    let harness = NotFoundHarness::new(
        &config,
        InProcessExecutor::new(&provider),
        ClientEnvironment::new(provider.client(), &config),
    )
    .map_err(|e| e.to_string())?;

    println!(
        "{}",
        format!("Probing {} data sources...", data_sources.len()).cyan()
    );
    let report = harness.run(&data_sources).await;
    print_report(&report)
}

fn print_report(report: &HarnessReport) -> Result<(), String> {
    for result in &report.results {
        match &result.outcome {
            ProbeOutcome::Passed => {
                println!("  {} {}", "✓".green(), result.data_source);
            }
            ProbeOutcome::Skipped(reason) => {
                println!("  {} {} {}", "-".yellow(), result.data_source, reason.dimmed());
            }
            ProbeOutcome::Failed(reason) => {
                println!("  {} {}", "✗".red(), result.data_source.red());
                println!("      {}", reason);
            }
        }
    }

    let summary = format!(
        "{} passed, {} failed, {} skipped",
        report.passed(),
        report.failed(),
        report.skipped()
    );
    if report.is_success() {
        println!("{}", summary.green().bold());
        Ok(())
    } else {
        Err(summary)
    }
}
