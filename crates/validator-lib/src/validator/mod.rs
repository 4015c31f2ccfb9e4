//! Template validation against named schemas
//!
//! A validation runs in two stages:
//! - schema validation, with the `cpu` and `memory` format predicates
//!   registered on the schema engine
//! - the limit/request invariant check, for templates that enable
//!   autoscaling
//!
//! Problems with the template end up in the returned [`ValidationOutcome`].
//! Problems with the validation itself (unreadable or malformed schema,
//! undecodable document) are returned as [`ValidatorError`].


use crate::error::{Rejection, SchemaDiagnostic, ValidatorError};
use crate::format::FormatRegistry;
use crate::invariants::check_resource_invariants;
use crate::models::DeploymentTemplate;
use crate::observability::{ValidationLogger, ValidatorMetrics};
use crate::schema::SchemaStore;
use jsonschema::error::ValidationErrorKind;
use serde_json::Value;
use std::time::Instant;
use tracing::debug;

/// Field name used for violations reported against the document root
const ROOT_FIELD: &str = "(root)";

/// Verdict of one validation call
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    rejection: Option<Rejection>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self { rejection: None }
    }

    pub fn rejected(rejection: Rejection) -> Self {
        Self {
            rejection: Some(rejection),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.rejection.is_none()
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        self.rejection.as_ref()
    }

    /// Diagnostic messages in report order, empty when valid
    pub fn diagnostics(&self) -> Vec<String> {
        self.rejection
            .as_ref()
            .map(Rejection::diagnostics)
            .unwrap_or_default()
    }

    /// Newline-joined diagnostics, `None` when valid
    pub fn message(&self) -> Option<String> {
        self.rejection
            .as_ref()
            .map(|rejection| rejection.diagnostics().join("\n"))
    }

    pub fn into_result(self) -> Result<(), Rejection> {
        match self.rejection {
            Some(rejection) => Err(rejection),
            None => Ok(()),
        }
    }
}

impl From<Result<(), Rejection>> for ValidationOutcome {
    fn from(result: Result<(), Rejection>) -> Self {
        match result {
            Ok(()) => Self::valid(),
            Err(rejection) => Self::rejected(rejection),
        }
    }
}

/// Validates deployment templates against schemas from a [`SchemaStore`]
///
/// Holds no per-call state; a single validator can be shared across
/// threads.
pub struct TemplateValidator<S> {
    store: S,
    formats: FormatRegistry,
    metrics: ValidatorMetrics,
    logger: ValidationLogger,
}

impl<S: SchemaStore> TemplateValidator<S> {
    /// Create a validator with an explicit set of format predicates
    pub fn new(store: S, formats: FormatRegistry) -> Self {
        Self {
            store,
            formats,
            metrics: ValidatorMetrics::new(),
            logger: ValidationLogger::default(),
        }
    }

    /// Create a validator with the `cpu` and `memory` formats registered
    pub fn with_resource_formats(store: S) -> Self {
        Self::new(store, FormatRegistry::resource_formats())
    }

    /// Replace the structured logger
    pub fn with_logger(mut self, logger: ValidationLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    /// Validate a template against the named schema
    ///
    /// An unknown schema name accepts the template unconditionally.
    pub fn validate_template(
        &self,
        document: &Value,
        schema_name: &str,
    ) -> Result<ValidationOutcome, ValidatorError> {
        let started = Instant::now();
        let result = self.run(document, schema_name);
        self.metrics
            .observe_validation_latency(started.elapsed().as_secs_f64());

        match &result {
            Ok(outcome) => {
                self.metrics.record_outcome(outcome);
                self.logger.log_outcome(schema_name, outcome);
            }
            Err(error) => {
                self.metrics.inc_errors();
                self.logger.log_error(schema_name, error);
            }
        }

        result
    }

    fn run(&self, document: &Value, schema_name: &str) -> Result<ValidationOutcome, ValidatorError> {
        let Some(schema) = self.store.load(schema_name)? else {
            debug!(schema = %schema_name, "No schema declared, accepting template");
            return Ok(ValidationOutcome::valid());
        };

        let diagnostics = self.schema_diagnostics(schema_name, &schema, document)?;
        if !diagnostics.is_empty() {
            return Ok(ValidationOutcome::rejected(Rejection::SchemaViolation(
                diagnostics,
            )));
        }

        let autoscaling_enabled = DeploymentTemplate::autoscaling_enabled(document)?;
        let template = if autoscaling_enabled {
            DeploymentTemplate::from_value(document)?
        } else {
            DeploymentTemplate::default()
        };

        Ok(check_resource_invariants(&template, autoscaling_enabled).into())
    }

    fn schema_diagnostics(
        &self,
        schema_name: &str,
        schema: &Value,
        document: &Value,
    ) -> Result<Vec<SchemaDiagnostic>, ValidatorError> {
        let mut options = jsonschema::options();
        options.should_validate_formats(true);
        for (name, predicate) in self.formats.iter() {
            options.with_format(name.to_string(), predicate);
        }

        let validator = options
            .build(schema)
            .map_err(|error| ValidatorError::SchemaCompile {
                name: schema_name.to_string(),
                message: error.to_string(),
            })?;

        Ok(validator
            .iter_errors(document)
            .map(|error| {
                let format = match &error.kind {
                    ValidationErrorKind::Format { format } => Some(format.clone()),
                    _ => None,
                };
                SchemaDiagnostic {
                    field: field_path(&error.instance_path.to_string()),
                    format,
                    message: error.to_string(),
                }
            })
            .collect())
    }
}

/// Convert a JSON pointer into a dotted field path
///
/// `/resources/limits/cpu` becomes `resources.limits.cpu` and the empty
/// pointer becomes `(root)`.
pub fn field_path(pointer: &str) -> String {
    let trimmed = pointer.trim_start_matches('/');
    if trimmed.is_empty() {
        return ROOT_FIELD.to_string();
    }

    trimmed
        .split('/')
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect::<Vec<_>>()
        .join(".")
}
