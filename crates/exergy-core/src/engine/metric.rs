use serde::{Serialize, Serializer};
use std::fmt;

/// A derived quantity that may legitimately have no value, such as a growth share
/// during demand contraction. `Undefined` is a named non-result, never zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Metric {
    Defined(f64),
    #[default]
    Undefined,
}

impl Metric {
    /// `numerator / denominator`, undefined when the denominator is zero or the
    /// quotient is not finite.
    pub fn ratio(numerator: f64, denominator: f64) -> Self {
        if denominator == 0.0 {
            return Metric::Undefined;
        }
        Self::from_value(numerator / denominator)
    }

    pub fn from_value(value: f64) -> Self {
        if value.is_finite() {
            Metric::Defined(value)
        } else {
            Metric::Undefined
        }
    }

    #[inline]
    pub fn value(self) -> Option<f64> {
        match self {
            Metric::Defined(v) => Some(v),
            Metric::Undefined => None,
        }
    }

    #[inline]
    pub fn is_defined(self) -> bool {
        matches!(self, Metric::Defined(_))
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Metric::Defined(v) => Self::from_value(f(v)),
            Metric::Undefined => Metric::Undefined,
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Metric::Defined(v) => serializer.serialize_some(v),
            Metric::Undefined => serializer.serialize_none(),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match (self, f.precision()) {
            (Metric::Defined(v), Some(p)) => format!("{:.*}", p, v),
            (Metric::Defined(v), None) => v.to_string(),
            (Metric::Undefined, _) => "n/a".to_string(),
        };
        // Right-aligned so table columns line up for both variants.
        match f.width() {
            Some(width) => write!(f, "{:>width$}", text),
            None => f.write_str(&text),
        }
    }
}
