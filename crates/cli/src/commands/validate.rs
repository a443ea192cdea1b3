//! `validate` command implementation.

use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;
use crate::error::CliError;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    domain: String,
    broker_mode: String,
    catalog: String,
    seeded_products: usize,
    partitions: u32,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<(), CliError> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::pipeline_execution(e.to_string()))?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        Err(CliError::pipeline_execution("Configuration validation failed"))
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    domain: blueprint.routing.domain.clone(),
                    broker_mode: format!("{:?}", blueprint.broker.mode),
                    catalog: blueprint.catalog.name.clone(),
                    seeded_products: blueprint.catalog.seed.len(),
                    partitions: blueprint.processor.partitions,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &contracts::RelayBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    // An empty catalog seed is fine for tcp deployments but means a mock run
    // routes events for placeholder tables only
    if blueprint.catalog.seed.is_empty() {
        warnings.push("No seeded data products - registry starts empty".to_string());
    }

    for seed in &blueprint.catalog.seed {
        if !seed.setting.is_object() {
            warnings.push(format!(
                "Seed '{}' setting is not a JSON object and will be discarded on sync",
                seed.name
            ));
        }
    }

    if blueprint.routing.ack_timeout_secs > 300 {
        warnings.push(format!(
            "ack_timeout_secs is {} - stalled publishes hold records that long",
            blueprint.routing.ack_timeout_secs
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Domain: {}", summary.domain);
            println!("  Broker mode: {}", summary.broker_mode);
            println!("  Catalog: {}", summary.catalog);
            println!("  Seeded products: {}", summary.seeded_products);
            println!("  Partitions: {}", summary.partitions);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_validate_valid_config() {
        let file = write_config(
            r#"
[routing]
domain = "ACME"
"#,
        );
        let args = ValidateArgs {
            config: file.path().to_path_buf(),
            json: false,
        };
        let result = validate_config(&args);
        assert!(result.valid);
        assert_eq!(result.summary.unwrap().domain, "ACME");
    }

    #[test]
    fn test_validate_invalid_config() {
        let file = write_config(
            r#"
[routing]
domain = "A.B"
"#,
        );
        let args = ValidateArgs {
            config: file.path().to_path_buf(),
            json: false,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("domain"));
    }

    #[test]
    fn test_validate_missing_file() {
        let args = ValidateArgs {
            config: "/nonexistent/relay.toml".into(),
            json: false,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
    }
}
