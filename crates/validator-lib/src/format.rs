//! Schema format predicates for resource quantities
//!
//! The schema engine calls a predicate for every string field whose schema
//! declares `"format": "cpu"` or `"format": "memory"`. These checks are the
//! schema-time gate and are deliberately narrower than the quantity parser:
//! memory must be an integer with a binary suffix.

use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// Example values shown when a `cpu` format check fails
pub const CPU_FORMAT_HINT: &str = r#""50m" or "0.05""#;

/// Example values shown when a `memory` format check fails
pub const MEMORY_FORMAT_HINT: &str = r#""100Mi" or "1Gi" or "1Ti""#;

/// A format check over a string value
pub type FormatPredicate = fn(&str) -> bool;

struct FormatPatterns {
    cpu_milli: Regex,
    cpu_cores: Regex,
    memory: Regex,
}

static PATTERNS: OnceLock<FormatPatterns> = OnceLock::new();

fn patterns() -> &'static FormatPatterns {
    PATTERNS.get_or_init(|| FormatPatterns {
        cpu_milli: Regex::new(r"^[0-9.]+m$").expect("cpu milli pattern must compile"),
        cpu_cores: Regex::new(r"^[0-9.]+$").expect("cpu cores pattern must compile"),
        memory: Regex::new(r"^[0-9]+(?:Ki|Mi|Gi|Ti|Pi)$").expect("memory pattern must compile"),
    })
}

/// `50m`, `0.05` or `2`
pub fn cpu_format(value: &str) -> bool {
    let patterns = patterns();
    patterns.cpu_milli.is_match(value) || patterns.cpu_cores.is_match(value)
}

/// `100Mi`, `1Gi`, `1Ti`, `1Pi` or `512Ki`
pub fn memory_format(value: &str) -> bool {
    patterns().memory.is_match(value)
}

/// CPU format check over any JSON value; non-strings pass
pub fn is_valid_cpu_format(value: &Value) -> bool {
    value.as_str().map_or(true, cpu_format)
}

/// Memory format check over any JSON value; non-strings pass
pub fn is_valid_memory_format(value: &Value) -> bool {
    value.as_str().map_or(true, memory_format)
}

/// Named format predicates handed to the schema engine
///
/// Built once and passed to the validator at construction. Registering a
/// name again replaces the previous predicate.
#[derive(Clone, Default)]
pub struct FormatRegistry {
    predicates: BTreeMap<String, FormatPredicate>,
}

impl FormatRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the `cpu` and `memory` formats
    pub fn resource_formats() -> Self {
        let mut registry = Self::new();
        registry
            .register("cpu", cpu_format)
            .register("memory", memory_format);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, predicate: FormatPredicate) -> &mut Self {
        self.predicates.insert(name.into(), predicate);
        self
    }

    pub fn get(&self, name: &str) -> Option<FormatPredicate> {
        self.predicates.get(name).copied()
    }

    /// Run a named predicate against a JSON value
    ///
    /// Returns `None` for an unknown format. Non-string values pass.
    pub fn check(&self, name: &str, value: &Value) -> Option<bool> {
        let predicate = self.get(name)?;
        Some(value.as_str().map_or(true, predicate))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FormatPredicate)> + '_ {
        self.predicates
            .iter()
            .map(|(name, predicate)| (name.as_str(), *predicate))
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.predicates.keys()).finish()
    }
}
