//! Resource quantity parsing
//!
//! Converts quantity strings into canonical scalars: cores for CPU and
//! bytes for memory. Each family is described by one anchored pattern that
//! splits the input into a numeric literal and an optional unit suffix, and
//! a unit table that gives each suffix its scale.

use crate::error::QuantityError;
use crate::models::ResourceFamily;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Numeric literal: digits, decimal point and comma grouping, with an
/// optional signed exponent
const NUMBER_PATTERN: &str = r"[0-9.,]+(?:[eE][+-]?[0-9]+)?";

/// A unit suffix scaling the literal by `base^exponent`
struct Unit {
    suffix: &'static str,
    base: f64,
    exponent: i32,
}

impl Unit {
    const fn new(suffix: &'static str, base: f64, exponent: i32) -> Self {
        Self {
            suffix,
            base,
            exponent,
        }
    }

    fn apply(&self, value: f64) -> f64 {
        scale(value, self.base, self.exponent)
    }
}

const CPU_UNITS: &[Unit] = &[Unit::new("m", 10.0, -3)];

const MEMORY_UNITS: &[Unit] = &[
    Unit::new("Ei", 1024.0, 6),
    Unit::new("Pi", 1024.0, 5),
    Unit::new("Ti", 1024.0, 4),
    Unit::new("Gi", 1024.0, 3),
    Unit::new("Mi", 1024.0, 2),
    Unit::new("Ki", 1024.0, 1),
    Unit::new("E", 1000.0, 6),
    Unit::new("P", 1000.0, 5),
    Unit::new("T", 1000.0, 4),
    Unit::new("G", 1000.0, 3),
    Unit::new("M", 1000.0, 2),
    Unit::new("K", 1000.0, 1),
];

struct Grammar {
    pattern: Regex,
    units: &'static [Unit],
}

impl Grammar {
    fn compile(units: &'static [Unit]) -> Self {
        let suffixes = units
            .iter()
            .map(|unit| regex::escape(unit.suffix))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!("^({NUMBER_PATTERN})({suffixes})?$");

        Self {
            pattern: Regex::new(&pattern).expect("quantity grammar must compile"),
            units,
        }
    }

    fn unit(&self, suffix: &str) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.suffix == suffix)
    }
}

static CPU_GRAMMAR: OnceLock<Grammar> = OnceLock::new();
static MEMORY_GRAMMAR: OnceLock<Grammar> = OnceLock::new();

fn grammar(family: ResourceFamily) -> &'static Grammar {
    match family {
        ResourceFamily::Cpu => CPU_GRAMMAR.get_or_init(|| Grammar::compile(CPU_UNITS)),
        ResourceFamily::Memory => MEMORY_GRAMMAR.get_or_init(|| Grammar::compile(MEMORY_UNITS)),
    }
}

/// A parsed resource amount
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantity {
    value: f64,
    family: ResourceFamily,
}

impl Quantity {
    /// Parse a raw quantity string under the given family's grammar
    pub fn parse(raw: &str, family: ResourceFamily) -> Result<Self, QuantityError> {
        parse_quantity(raw, family)
    }

    /// Canonical value: cores for CPU, bytes for memory
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn family(&self) -> ResourceFamily {
        self.family
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.family {
            ResourceFamily::Cpu => write!(f, "{} cores", self.value),
            ResourceFamily::Memory => write!(f, "{} bytes", self.value),
        }
    }
}

/// Parse a quantity string such as `"50m"`, `"0.05"`, `"1Gi"` or `"1e3"`
///
/// Surrounding whitespace is ignored. Anything the family's grammar does
/// not fully cover, including trailing characters after a recognised
/// suffix, is a [`QuantityError::Malformed`].
pub fn parse_quantity(raw: &str, family: ResourceFamily) -> Result<Quantity, QuantityError> {
    let malformed = || QuantityError::Malformed {
        family,
        input: raw.to_string(),
    };

    let grammar = grammar(family);
    let captures = grammar.pattern.captures(raw.trim()).ok_or_else(malformed)?;
    let literal = captures.get(1).ok_or_else(malformed)?.as_str();
    let number = parse_number(literal).ok_or_else(malformed)?;

    let value = match captures.get(2) {
        Some(suffix) => grammar.unit(suffix.as_str()).ok_or_else(malformed)?.apply(number),
        None => number,
    };

    Ok(Quantity { value, family })
}

/// Parse a numeric literal
///
/// Commas are group separators and are dropped. A literal containing `e` or
/// `E` is read as `mantissa x 10^exponent` with an integer exponent.
/// Non-finite results, and non-zero literals that underflow to zero, are
/// rejected.
pub fn parse_number(literal: &str) -> Option<f64> {
    let cleaned = literal.replace(',', "");

    let value = match cleaned.find(|c: char| c == 'e' || c == 'E') {
        Some(pos) => {
            let mantissa: f64 = cleaned[..pos].parse().ok()?;
            let exponent: i32 = cleaned[pos + 1..].parse().ok()?;
            let value = scale(mantissa, 10.0, exponent);
            // A non-zero mantissa must not underflow to zero.
            if value == 0.0 && mantissa != 0.0 {
                return None;
            }
            value
        }
        None => cleaned.parse().ok()?,
    };

    value.is_finite().then_some(value)
}

// Negative exponents divide so that e.g. 50m lands exactly on 0.05.
fn scale(value: f64, base: f64, exponent: i32) -> f64 {
    if exponent >= 0 {
        value * base.powi(exponent)
    } else {
        value / base.powi(-exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu(raw: &str) -> f64 {
        parse_quantity(raw, ResourceFamily::Cpu).unwrap().value()
    }

    fn memory(raw: &str) -> f64 {
        parse_quantity(raw, ResourceFamily::Memory).unwrap().value()
    }

    #[test]
    fn test_cpu_quantities() {
        assert_eq!(cpu("50m"), 0.05);
        assert_eq!(cpu("0.05"), 0.05);
        assert_eq!(cpu("100"), 100.0);
        assert_eq!(cpu("1500m"), 1.5);
        assert_eq!(cpu("0.5m"), 0.0005);
    }

    #[test]
    fn test_cpu_scientific_notation() {
        assert_eq!(cpu("1e3"), 1000.0);
        assert_eq!(cpu("2E2"), 200.0);
        assert_eq!(cpu("5e-1"), 0.5);
        assert_eq!(cpu("1e3m"), 1.0);
    }

    #[test]
    fn test_memory_binary_suffixes() {
        assert_eq!(memory("1Gi"), 1_073_741_824.0);
        assert_eq!(memory("100Mi"), 104_857_600.0);
        assert_eq!(memory("1Ki"), 1024.0);
        assert_eq!(memory("1Ti"), 1_099_511_627_776.0);
        assert_eq!(memory("1Pi"), 1_125_899_906_842_624.0);
        assert_eq!(memory("1Ei"), 1_152_921_504_606_846_976.0);
    }

    #[test]
    fn test_memory_decimal_suffixes_and_bytes() {
        assert_eq!(memory("1K"), 1000.0);
        assert_eq!(memory("128M"), 128_000_000.0);
        assert_eq!(memory("2G"), 2_000_000_000.0);
        assert_eq!(memory("1E"), 1e18);
        assert_eq!(memory("4096"), 4096.0);
        assert_eq!(memory("1E3"), 1000.0);
    }

    #[test]
    fn test_comma_grouping_is_ignored() {
        assert_eq!(memory("1,000"), memory("1000"));
        assert_eq!(cpu("1,000m"), 1.0);
        assert_eq!(memory("23,120,123"), 23_120_123.0);
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        assert_eq!(memory(" 1Gi "), 1_073_741_824.0);
    }

    #[test]
    fn test_malformed_quantities() {
        for raw in ["", "abc", "50x", "1Gib", "1gi", "-1", "1.2.3", ".", ",", "1e", "m", "Gi"] {
            assert!(
                parse_quantity(raw, ResourceFamily::Memory).is_err(),
                "{raw:?} should not parse as memory"
            );
        }
        for raw in ["", "50x", "50mm", "1Gi", "1.2.3m", "e3"] {
            assert!(
                parse_quantity(raw, ResourceFamily::Cpu).is_err(),
                "{raw:?} should not parse as cpu"
            );
        }
    }

    #[test]
    fn test_malformed_error_carries_input_and_family() {
        let err = parse_quantity("50x", ResourceFamily::Cpu).unwrap_err();
        assert_eq!(
            err,
            QuantityError::Malformed {
                family: ResourceFamily::Cpu,
                input: "50x".to_string(),
            }
        );
        assert!(err.to_string().contains("\"50x\""));
    }

    #[test]
    fn test_overflowing_exponent_is_rejected() {
        assert!(parse_number("1e400").is_none());
    }

    #[test]
    fn test_underflowing_exponent_is_rejected() {
        assert!(parse_number("1e-400").is_none());
        assert!(parse_quantity("5e-400", ResourceFamily::Cpu).is_err());
        assert_eq!(parse_number("0e-400"), Some(0.0));
        assert!(parse_number("1e-300").is_some_and(|value| value > 0.0));
    }

    #[test]
    fn test_quantity_display() {
        let quantity = Quantity::parse("2Ki", ResourceFamily::Memory).unwrap();
        assert_eq!(quantity.family(), ResourceFamily::Memory);
        assert_eq!(quantity.to_string(), "2048 bytes");
    }
}
