//! Template validation command

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use tabled::Tabled;
use validator_lib::{Finding, SchemaStore, TemplateValidator};

use crate::output::{color_verdict, print_error, print_json, print_success, print_table, OutputFormat};

/// Row for findings table
#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Problem")]
    problem: String,
}

/// Machine-readable validation report
#[derive(Debug, Serialize)]
struct ValidationReport<'a> {
    file: String,
    schema: &'a str,
    valid: bool,
    diagnostics: Vec<String>,
    findings: Vec<Finding>,
}

/// Read a template from a JSON or YAML file, or JSON from stdin for `-`
pub fn load_document(path: &Path) -> Result<Value> {
    if path == Path::new("-") {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read template from stdin")?;
        return serde_json::from_str(&content).context("Failed to parse template from stdin");
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read template {}", path.display()))?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML template {}", path.display())),
        _ => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON template {}", path.display())),
    }
}

/// Validate a template file, returning whether it is valid
pub fn validate_file<S: SchemaStore>(
    validator: &TemplateValidator<S>,
    file: &Path,
    schema: &str,
    format: OutputFormat,
) -> Result<bool> {
    let document = load_document(file)?;
    let outcome = validator
        .validate_template(&document, schema)
        .with_context(|| format!("Failed to validate {} against schema {}", file.display(), schema))?;

    let findings = outcome
        .rejection()
        .map(|rejection| rejection.findings())
        .unwrap_or_default();

    match format {
        OutputFormat::Json => {
            print_json(&ValidationReport {
                file: file.display().to_string(),
                schema,
                valid: outcome.is_valid(),
                diagnostics: outcome.diagnostics(),
                findings,
            })?;
        }
        OutputFormat::Table => {
            if outcome.is_valid() {
                print_success(&format!(
                    "{} is {} for schema {}",
                    file.display(),
                    color_verdict(true),
                    schema
                ));
            } else {
                print_error(&format!(
                    "{} is {} for schema {}",
                    file.display(),
                    color_verdict(false),
                    schema
                ));
                let rows: Vec<FindingRow> = findings
                    .into_iter()
                    .map(|finding| FindingRow {
                        field: finding.field,
                        problem: finding.problem,
                    })
                    .collect();
                print_table(&rows);
            }
        }
    }

    Ok(outcome.is_valid())
}
