//! Error types for quantity parsing and template validation
//!
//! Two families of failure are kept apart:
//! - [`Rejection`]: the template is wrong and the caller can fix it. These
//!   are carried inside a validation outcome, never returned as `Err`.
//! - [`ValidatorError`]: the validation itself could not run (schema
//!   unreadable, schema malformed, document undecodable).

use crate::format::{CPU_FORMAT_HINT, MEMORY_FORMAT_HINT};
use crate::models::{ResourceFamily, ResourceField, ResourceScope};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A string that does not follow its family's quantity grammar
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuantityError {
    #[error("expected a {family} quantity like {}, found \"{input}\"", family_hint(.family))]
    Malformed {
        family: ResourceFamily,
        input: String,
    },
}

fn family_hint(family: &ResourceFamily) -> &'static str {
    match family {
        ResourceFamily::Cpu => CPU_FORMAT_HINT,
        ResourceFamily::Memory => MEMORY_FORMAT_HINT,
    }
}

/// A resource pair whose request exceeds its limit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimitViolation {
    pub scope: ResourceScope,
    pub family: ResourceFamily,
    pub limit: String,
    pub request: String,
}

impl fmt::Display for LimitViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} request {} exceeds limit {}",
            self.scope, self.family, self.request, self.limit
        )
    }
}

/// One schema violation reported by the schema engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaDiagnostic {
    /// Dotted path of the offending field, `(root)` for the document itself
    pub field: String,
    /// Format being checked, when the violation is a format check
    pub format: Option<String>,
    /// The engine's own message
    pub message: String,
}

impl SchemaDiagnostic {
    /// What is wrong with the field, without the field name
    ///
    /// CPU and memory format failures get a hint with example values in
    /// place of the engine's message.
    pub fn problem(&self) -> String {
        match self
            .format
            .as_deref()
            .and_then(ResourceFamily::from_format_name)
        {
            Some(family) => format!("Format should be like {}", family_hint(&family)),
            None => self.message.clone(),
        }
    }
}

impl fmt::Display for SchemaDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.problem())
    }
}

/// Field-oriented summary line for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub field: String,
    pub problem: String,
}

/// Why a template was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("{}: {source}", .field.path())]
    MalformedQuantity {
        field: ResourceField,
        #[source]
        source: QuantityError,
    },

    #[error("{0} is required")]
    MissingField(ResourceField),

    #[error("requests is greater than limits: {}", join_lines(.0, "; "))]
    LimitBelowRequest(Vec<LimitViolation>),

    #[error("{}", join_lines(.0, "\n"))]
    SchemaViolation(Vec<SchemaDiagnostic>),
}

fn join_lines<'a, T: fmt::Display + 'a>(
    items: impl IntoIterator<Item = &'a T>,
    separator: &str,
) -> String {
    items
        .into_iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

impl Rejection {
    /// Stable label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::MalformedQuantity { .. } => "malformed_quantity",
            Rejection::MissingField(_) => "missing_field",
            Rejection::LimitBelowRequest(_) => "limit_below_request",
            Rejection::SchemaViolation(_) => "schema_violation",
        }
    }

    /// Diagnostic messages, one per line of the rendered rejection
    pub fn diagnostics(&self) -> Vec<String> {
        match self {
            Rejection::SchemaViolation(diagnostics) => {
                diagnostics.iter().map(ToString::to_string).collect()
            }
            other => vec![other.to_string()],
        }
    }

    /// Per-field breakdown of the rejection
    pub fn findings(&self) -> Vec<Finding> {
        match self {
            Rejection::MalformedQuantity { field, source } => vec![Finding {
                field: field.path(),
                problem: source.to_string(),
            }],
            Rejection::MissingField(field) => vec![Finding {
                field: field.path(),
                problem: format!("{field} is required"),
            }],
            Rejection::LimitBelowRequest(violations) => violations
                .iter()
                .map(|violation| Finding {
                    field: format!("{}.requests.{}", violation.scope, violation.family),
                    problem: format!(
                        "request {} is greater than limit {}",
                        violation.request, violation.limit
                    ),
                })
                .collect(),
            Rejection::SchemaViolation(diagnostics) => diagnostics
                .iter()
                .map(|diagnostic| Finding {
                    field: diagnostic.field.clone(),
                    problem: diagnostic.problem(),
                })
                .collect(),
        }
    }
}

/// Failure to run a validation at all
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("invalid schema name \"{0}\"")]
    InvalidSchemaName(String),

    #[error("failed to read schema {name} from {}", .path.display())]
    SchemaRead {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("schema {name} is not valid JSON")]
    SchemaParse {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("schema {name} could not be compiled: {message}")]
    SchemaCompile { name: String, message: String },

    #[error("template document is malformed: {0}")]
    Document(#[from] serde_json::Error),
}
