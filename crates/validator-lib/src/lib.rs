//! Validation library for deployment templates
//!
//! This crate provides the core functionality for:
//! - Parsing CPU and memory quantities into canonical scalars
//! - Schema format predicates for resource quantities
//! - Limit/request invariant checks for the primary and sidecar containers
//! - Schema lookup and template validation with field-level diagnostics
//! - Structured logging and Prometheus metrics for validations

pub mod error;
pub mod format;
pub mod invariants;
pub mod models;
pub mod observability;
pub mod quantity;
pub mod schema;
pub mod validator;

pub use error::{
    Finding, LimitViolation, QuantityError, Rejection, SchemaDiagnostic, ValidatorError,
};
pub use format::{is_valid_cpu_format, is_valid_memory_format, FormatPredicate, FormatRegistry};
pub use invariants::check_resource_invariants;
pub use models::*;
pub use observability::{ValidationLogger, ValidatorMetrics};
pub use quantity::{parse_quantity, Quantity};
pub use schema::{DirSchemaStore, InMemorySchemaStore, SchemaStore};
pub use validator::{TemplateValidator, ValidationOutcome};
