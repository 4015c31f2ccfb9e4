//! Limit/request invariants for autoscaled templates
//!
//! When autoscaling is enabled both the application container and the
//! Envoy sidecar must declare CPU and memory limits and requests, and no
//! request may exceed its limit.

use crate::error::{LimitViolation, Rejection};
use crate::models::{Bound, DeploymentTemplate, ResourceFamily, ResourceField, ResourceScope};
use crate::quantity::{parse_quantity, Quantity};
use tracing::debug;

struct ParsedField {
    field: ResourceField,
    raw: String,
    quantity: Quantity,
}

/// Check that every request is covered by its limit
///
/// With autoscaling disabled nothing is required and the check passes.
/// Otherwise the first missing field in [`ResourceField::ORDER`] is
/// reported, then any value that does not parse, and finally every pair
/// whose request is strictly greater than its limit.
pub fn check_resource_invariants(
    template: &DeploymentTemplate,
    autoscaling_enabled: bool,
) -> Result<(), Rejection> {
    if !autoscaling_enabled {
        return Ok(());
    }

    let mut present = Vec::with_capacity(ResourceField::ORDER.len());
    for field in ResourceField::ORDER {
        match template.quantity(field) {
            Some(value) => present.push((field, value)),
            None => return Err(Rejection::MissingField(field)),
        }
    }

    let mut parsed = Vec::with_capacity(present.len());
    for (field, value) in present {
        let raw = value.as_raw();
        let quantity = parse_quantity(&raw, field.family)
            .map_err(|source| Rejection::MalformedQuantity { field, source })?;
        parsed.push(ParsedField {
            field,
            raw: raw.into_owned(),
            quantity,
        });
    }

    let violations: Vec<LimitViolation> = ResourceScope::ALL
        .into_iter()
        .flat_map(|scope| {
            ResourceFamily::ALL
                .into_iter()
                .map(move |family| (scope, family))
        })
        .filter_map(|(scope, family)| compare(&parsed, scope, family))
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        debug!(violations = violations.len(), "Requests exceed limits");
        Err(Rejection::LimitBelowRequest(violations))
    }
}

fn compare(
    parsed: &[ParsedField],
    scope: ResourceScope,
    family: ResourceFamily,
) -> Option<LimitViolation> {
    let find = |bound| {
        let field = ResourceField::new(scope, family, bound);
        parsed.iter().find(|entry| entry.field == field)
    };
    let limit = find(Bound::Limit)?;
    let request = find(Bound::Request)?;

    (limit.quantity.value() < request.quantity.value()).then(|| LimitViolation {
        scope,
        family,
        limit: limit.raw.clone(),
        request: request.raw.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuantityError;
    use serde_json::{json, Value};

    fn block(cpu_limit: &str, memory_limit: &str, cpu_request: &str, memory_request: &str) -> Value {
        json!({
            "limits": { "cpu": cpu_limit, "memory": memory_limit },
            "requests": { "cpu": cpu_request, "memory": memory_request }
        })
    }

    fn template(primary: Value, sidecar: Value) -> DeploymentTemplate {
        let document = json!({
            "resources": primary,
            "envoyproxy": { "resources": sidecar },
            "autoscaling": { "enabled": true }
        });
        DeploymentTemplate::from_value(&document).unwrap()
    }

    fn healthy() -> DeploymentTemplate {
        template(
            block("1", "1Gi", "500m", "512Mi"),
            block("100m", "128Mi", "50m", "64Mi"),
        )
    }

    #[test]
    fn test_disabled_autoscaling_skips_everything() {
        let empty = DeploymentTemplate::default();
        assert!(check_resource_invariants(&empty, false).is_ok());

        let inverted = template(
            block("50m", "1Gi", "2", "2Gi"),
            json!({ "limits": { "cpu": "garbage" } }),
        );
        assert!(check_resource_invariants(&inverted, false).is_ok());
    }

    #[test]
    fn test_consistent_template_passes() {
        assert!(check_resource_invariants(&healthy(), true).is_ok());
    }

    #[test]
    fn test_equal_limit_and_request_passes() {
        let equal = template(
            block("500m", "1Gi", "0.5", "1024Mi"),
            block("100m", "128Mi", "100m", "128Mi"),
        );
        assert!(check_resource_invariants(&equal, true).is_ok());
    }

    #[test]
    fn test_memory_request_above_limit_fails() {
        let inverted = template(
            block("1", "1Gi", "500m", "2Gi"),
            block("100m", "128Mi", "50m", "64Mi"),
        );
        let err = check_resource_invariants(&inverted, true).unwrap_err();
        assert_eq!(
            err,
            Rejection::LimitBelowRequest(vec![LimitViolation {
                scope: ResourceScope::Primary,
                family: ResourceFamily::Memory,
                limit: "1Gi".to_string(),
                request: "2Gi".to_string(),
            }])
        );
        assert!(err.to_string().starts_with("requests is greater than limits"));
    }

    #[test]
    fn test_every_failing_pair_is_reported() {
        let inverted = template(
            block("100m", "1Gi", "200m", "512Mi"),
            block("50m", "64Mi", "100m", "128Mi"),
        );
        let Err(Rejection::LimitBelowRequest(violations)) = check_resource_invariants(&inverted, true)
        else {
            panic!("expected a limit violation");
        };
        let pairs: Vec<_> = violations.iter().map(|v| (v.scope, v.family)).collect();
        assert_eq!(
            pairs,
            vec![
                (ResourceScope::Primary, ResourceFamily::Cpu),
                (ResourceScope::Sidecar, ResourceFamily::Cpu),
                (ResourceScope::Sidecar, ResourceFamily::Memory),
            ]
        );
    }

    #[test]
    fn test_missing_fields_are_reported_in_order() {
        let document = json!({
            "resources": { "limits": { "memory": "1Gi" }, "requests": {} },
            "autoscaling": { "enabled": true }
        });
        let template = DeploymentTemplate::from_value(&document).unwrap();
        let err = check_resource_invariants(&template, true).unwrap_err();
        assert_eq!(err.to_string(), "CPU limit is required");

        let document = json!({
            "resources": { "limits": { "cpu": "1", "memory": "1Gi" }, "requests": { "cpu": "1", "memory": "1Gi" } },
            "envoyproxy": { "resources": { "limits": { "cpu": "1", "memory": "1Gi" }, "requests": { "cpu": "1" } } }
        });
        let template = DeploymentTemplate::from_value(&document).unwrap();
        let err = check_resource_invariants(&template, true).unwrap_err();
        assert_eq!(err.to_string(), "Envoyproxy Memory requests is required");
    }

    #[test]
    fn test_presence_checks_follow_fixed_order() {
        let expected = [
            ("/resources/limits/cpu", "CPU limit is required"),
            ("/resources/limits/memory", "Memory limit is required"),
            ("/resources/requests/cpu", "CPU requests is required"),
            ("/resources/requests/memory", "Memory requests is required"),
            ("/envoyproxy/resources/limits/cpu", "Envoyproxy CPU limit is required"),
            ("/envoyproxy/resources/limits/memory", "Envoyproxy Memory limit is required"),
            ("/envoyproxy/resources/requests/cpu", "Envoyproxy CPU requests is required"),
            ("/envoyproxy/resources/requests/memory", "Envoyproxy Memory requests is required"),
        ];
        let mut document = json!({
            "resources": { "limits": {}, "requests": {} },
            "envoyproxy": { "resources": { "limits": {}, "requests": {} } }
        });

        // Fill fields back in one at a time; the next one is always reported.
        for (pointer, message) in expected {
            let template = DeploymentTemplate::from_value(&document).unwrap();
            let err = check_resource_invariants(&template, true).unwrap_err();
            assert_eq!(err.to_string(), message);

            let (parent, key) = pointer.rsplit_once('/').unwrap();
            document.pointer_mut(parent).unwrap()[key] = json!("1");
        }

        let template = DeploymentTemplate::from_value(&document).unwrap();
        assert!(check_resource_invariants(&template, true).is_ok());
    }

    #[test]
    fn test_missing_sidecar_section_is_a_missing_field() {
        let document = json!({ "resources": block("1", "1Gi", "1", "1Gi") });
        let template = DeploymentTemplate::from_value(&document).unwrap();
        let err = check_resource_invariants(&template, true).unwrap_err();
        assert_eq!(
            err,
            Rejection::MissingField(ResourceField::new(
                ResourceScope::Sidecar,
                ResourceFamily::Cpu,
                Bound::Limit
            ))
        );
    }

    #[test]
    fn test_unparseable_quantity_is_reported() {
        let broken = template(
            block("1", "1Gi", "500m", "lots"),
            block("100m", "128Mi", "50m", "64Mi"),
        );
        let err = check_resource_invariants(&broken, true).unwrap_err();
        let Rejection::MalformedQuantity { field, source } = err else {
            panic!("expected a malformed quantity");
        };
        assert_eq!(field.path(), "resources.requests.memory");
        assert_eq!(
            source,
            QuantityError::Malformed {
                family: ResourceFamily::Memory,
                input: "lots".to_string(),
            }
        );
    }

    #[test]
    fn test_numeric_values_are_accepted() {
        let document = json!({
            "resources": {
                "limits": { "cpu": 2, "memory": "1Gi" },
                "requests": { "cpu": 1.5, "memory": 1073741824 }
            },
            "envoyproxy": { "resources": block("100m", "128Mi", "50m", "64Mi") }
        });
        let template = DeploymentTemplate::from_value(&document).unwrap();
        assert!(check_resource_invariants(&template, true).is_ok());
    }
}
