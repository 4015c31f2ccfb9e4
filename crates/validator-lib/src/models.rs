//! Core data models for deployment templates

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;

/// Unit family a quantity is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceFamily {
    /// CPU cores, optionally in millicpu
    Cpu,
    /// Bytes, optionally with a decimal or binary suffix
    Memory,
}

impl ResourceFamily {
    pub const ALL: [ResourceFamily; 2] = [ResourceFamily::Cpu, ResourceFamily::Memory];

    /// Name of the schema format that constrains this family
    pub fn format_name(self) -> &'static str {
        match self {
            ResourceFamily::Cpu => "cpu",
            ResourceFamily::Memory => "memory",
        }
    }

    /// Resolve a schema format name back to its family
    pub fn from_format_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|family| family.format_name() == name)
    }

    fn label(self) -> &'static str {
        match self {
            ResourceFamily::Cpu => "CPU",
            ResourceFamily::Memory => "Memory",
        }
    }
}

impl fmt::Display for ResourceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.format_name())
    }
}

/// Container scope a resource block belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceScope {
    /// The application container (`resources`)
    Primary,
    /// The Envoy sidecar proxy (`envoyproxy.resources`)
    Sidecar,
}

impl ResourceScope {
    pub const ALL: [ResourceScope; 2] = [ResourceScope::Primary, ResourceScope::Sidecar];

    /// Dotted path of the scope's resource block inside the template
    pub fn block_path(self) -> &'static str {
        match self {
            ResourceScope::Primary => "resources",
            ResourceScope::Sidecar => "envoyproxy.resources",
        }
    }
}

impl fmt::Display for ResourceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.block_path())
    }
}

/// Side of a resource pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bound {
    Limit,
    Request,
}

impl Bound {
    fn key(self) -> &'static str {
        match self {
            Bound::Limit => "limits",
            Bound::Request => "requests",
        }
    }
}

/// One of the eight resource values the invariant checker reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ResourceField {
    pub scope: ResourceScope,
    pub family: ResourceFamily,
    pub bound: Bound,
}

impl ResourceField {
    /// Fields in the order their presence is checked
    pub const ORDER: [ResourceField; 8] = [
        ResourceField::new(ResourceScope::Primary, ResourceFamily::Cpu, Bound::Limit),
        ResourceField::new(ResourceScope::Primary, ResourceFamily::Memory, Bound::Limit),
        ResourceField::new(ResourceScope::Primary, ResourceFamily::Cpu, Bound::Request),
        ResourceField::new(ResourceScope::Primary, ResourceFamily::Memory, Bound::Request),
        ResourceField::new(ResourceScope::Sidecar, ResourceFamily::Cpu, Bound::Limit),
        ResourceField::new(ResourceScope::Sidecar, ResourceFamily::Memory, Bound::Limit),
        ResourceField::new(ResourceScope::Sidecar, ResourceFamily::Cpu, Bound::Request),
        ResourceField::new(ResourceScope::Sidecar, ResourceFamily::Memory, Bound::Request),
    ];

    pub const fn new(scope: ResourceScope, family: ResourceFamily, bound: Bound) -> Self {
        Self {
            scope,
            family,
            bound,
        }
    }

    /// Dotted path of the field, e.g. `envoyproxy.resources.limits.cpu`
    pub fn path(&self) -> String {
        format!(
            "{}.{}.{}",
            self.scope.block_path(),
            self.bound.key(),
            self.family.format_name()
        )
    }
}

/// Human-readable name, e.g. "CPU limit" or "Envoyproxy Memory requests"
impl fmt::Display for ResourceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scope == ResourceScope::Sidecar {
            f.write_str("Envoyproxy ")?;
        }
        let bound = match self.bound {
            Bound::Limit => "limit",
            Bound::Request => "requests",
        };
        write!(f, "{} {}", self.family.label(), bound)
    }
}

/// Raw quantity as written in the template
///
/// Templates written in YAML frequently carry bare numbers (`cpu: 1`),
/// so numbers are accepted alongside strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum QuantityValue {
    Text(String),
    Number(serde_json::Number),
}

impl QuantityValue {
    /// The value as the quantity parser sees it
    pub fn as_raw(&self) -> Cow<'_, str> {
        match self {
            QuantityValue::Text(text) => Cow::Borrowed(text),
            QuantityValue::Number(number) => Cow::Owned(number.to_string()),
        }
    }
}

/// `cpu` / `memory` entries of a `limits` or `requests` map
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceList {
    pub cpu: Option<QuantityValue>,
    pub memory: Option<QuantityValue>,
}

impl ResourceList {
    pub fn get(&self, family: ResourceFamily) -> Option<&QuantityValue> {
        match family {
            ResourceFamily::Cpu => self.cpu.as_ref(),
            ResourceFamily::Memory => self.memory.as_ref(),
        }
    }
}

/// A resource block: limits and requests of one container
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceRequirements {
    #[serde(default, deserialize_with = "map_section")]
    pub limits: Option<ResourceList>,
    #[serde(default, deserialize_with = "map_section")]
    pub requests: Option<ResourceList>,
}

impl ResourceRequirements {
    pub fn get(&self, bound: Bound) -> Option<&ResourceList> {
        match bound {
            Bound::Limit => self.limits.as_ref(),
            Bound::Request => self.requests.as_ref(),
        }
    }
}

/// Sidecar proxy section of the template
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvoyProxy {
    #[serde(default, deserialize_with = "map_section")]
    pub resources: Option<ResourceRequirements>,
}

/// Autoscaling section of the template
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Autoscaling {
    pub enabled: Option<bool>,
}

/// Typed view of the template fields read by the invariant checker
///
/// Every nesting level is optional so that a missing section surfaces as a
/// named missing field rather than a decode failure. Unknown keys are
/// ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeploymentTemplate {
    #[serde(default, deserialize_with = "map_section")]
    pub resources: Option<ResourceRequirements>,
    #[serde(default, deserialize_with = "map_section")]
    pub envoyproxy: Option<EnvoyProxy>,
    #[serde(default, deserialize_with = "map_section")]
    pub autoscaling: Option<Autoscaling>,
}

// Derived struct decoding also fills fields positionally from a sequence;
// sections must be maps.
fn map_section<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Map<String, Value>>::deserialize(deserializer)? {
        Some(map) => T::deserialize(Value::Object(map))
            .map(Some)
            .map_err(de::Error::custom),
        None => Ok(None),
    }
}

impl DeploymentTemplate {
    /// Decode the typed view from an untyped document
    pub fn from_value(document: &Value) -> Result<Self, serde_json::Error> {
        if !document.is_object() {
            return Err(de::Error::custom("template must be a map"));
        }
        Self::deserialize(document)
    }

    /// Read `autoscaling.enabled` without decoding the rest of the document
    ///
    /// Absent or `null` at any level means disabled.
    pub fn autoscaling_enabled(document: &Value) -> Result<bool, serde_json::Error> {
        match document.get("autoscaling") {
            None | Some(Value::Null) => Ok(false),
            Some(section @ Value::Object(_)) => {
                let autoscaling = Autoscaling::deserialize(section)?;
                Ok(autoscaling.enabled.unwrap_or(false))
            }
            Some(_) => Err(de::Error::custom("autoscaling must be a map")),
        }
    }

    /// Resource block of a container scope
    pub fn block(&self, scope: ResourceScope) -> Option<&ResourceRequirements> {
        match scope {
            ResourceScope::Primary => self.resources.as_ref(),
            ResourceScope::Sidecar => self
                .envoyproxy
                .as_ref()
                .and_then(|proxy| proxy.resources.as_ref()),
        }
    }

    /// Raw value of one resource field, if present
    pub fn quantity(&self, field: ResourceField) -> Option<&QuantityValue> {
        self.block(field.scope)?
            .get(field.bound)?
            .get(field.family)
    }
}
