//! Quantity inspection command

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use tabled::Tabled;
use validator_lib::{parse_quantity, FormatRegistry, ResourceFamily};

use crate::output::{format_bytes, format_cpu, print_error, print_json, print_table, print_warning, OutputFormat};

/// Resource family argument
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FamilyArg {
    Cpu,
    Memory,
}

impl From<FamilyArg> for ResourceFamily {
    fn from(arg: FamilyArg) -> Self {
        match arg {
            FamilyArg::Cpu => ResourceFamily::Cpu,
            FamilyArg::Memory => ResourceFamily::Memory,
        }
    }
}

/// Parsed quantity, as a table row and as JSON
#[derive(Debug, Serialize, Tabled)]
struct QuantityRow {
    #[tabled(rename = "Input")]
    input: String,
    #[tabled(rename = "Family")]
    family: ResourceFamily,
    #[tabled(rename = "Value")]
    value: f64,
    #[tabled(rename = "Readable")]
    readable: String,
    #[tabled(rename = "Schema Format")]
    schema_format: bool,
}

/// Parse a single quantity, returning whether it parsed
pub fn inspect_quantity(raw: &str, family: FamilyArg, format: OutputFormat) -> Result<bool> {
    let family = ResourceFamily::from(family);
    let quantity = match parse_quantity(raw, family) {
        Ok(quantity) => quantity,
        Err(err) => {
            print_error(&err.to_string());
            return Ok(false);
        }
    };

    let readable = match family {
        ResourceFamily::Cpu => format_cpu(quantity.value()),
        ResourceFamily::Memory => format_bytes(quantity.value()),
    };
    let schema_format = FormatRegistry::resource_formats()
        .check(family.format_name(), &serde_json::Value::from(raw))
        .unwrap_or(true);

    let row = QuantityRow {
        input: raw.to_string(),
        family,
        value: quantity.value(),
        readable,
        schema_format,
    };

    match format {
        OutputFormat::Json => print_json(&row)?,
        OutputFormat::Table => {
            print_table(&[row]);
            if !schema_format {
                print_warning(&format!(
                    "\"{}\" parses, but templates using the {} format will reject it",
                    raw, family
                ));
            }
        }
    }

    Ok(true)
}
