//! Scalar values returned by the source and the key classes derived from them.
//!
//! [`Value`] is the planner's view of a single cell: it is what `MIN`/`MAX`
//! aggregates and sampling queries return, and what split boundaries are made of.
//! Values order totally: `Null` first, then numbers (integers and floats compare
//! numerically), then text (by code point).

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter, Result as FormatResult};

/// A raw scalar as reported by the source.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(OrderedFloat<f64>),
    Text(String),
}

/// Split-column class; decides which planning strategy is legal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    Integer,
    Float,
    Text,
}

impl Value {
    #[must_use]
    pub fn float(v: f64) -> Self {
        Self::Float(OrderedFloat(v))
    }

    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Integer view of the value. Floats qualify only when they carry no fraction;
    /// text qualifies when it parses as an integer.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
            Self::Float(OrderedFloat(v)) => {
                let t = *v as i64;
                (v.is_finite() && v.fract() == 0.0 && t as f64 == *v).then_some(t)
            }
            Self::Text(s) => s.trim().parse().ok(),
            Self::Null => None,
        }
    }

    /// Floating view of the value; `None` for nulls, unparsable text and non-finite floats.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Int(v) => *v as f64,
            Self::Float(OrderedFloat(v)) => *v,
            Self::Text(s) => s.trim().parse().ok()?,
            Self::Null => return None,
        };
        v.is_finite().then_some(v)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Coerce the value into the representation used for `kind`, or `None`
    /// when it cannot be represented.
    #[must_use]
    pub fn coerce(&self, kind: KeyKind) -> Option<Self> {
        match kind {
            KeyKind::Integer => self.as_i64().map(Self::Int),
            KeyKind::Float => self.as_f64().map(Self::float),
            KeyKind::Text => self.as_text().map(Self::text),
        }
    }

    /// Render the value as a SQL literal. Text is single-quoted with embedded
    /// quotes doubled; numbers are emitted bare.
    #[must_use]
    pub fn to_sql_literal(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Int(v) => v.to_string(),
            Self::Float(OrderedFloat(v)) => v.to_string(),
            Self::Text(s) => quote_text(s),
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Int(_) | Self::Float(_) => 1,
            Self::Text(_) => 2,
        }
    }
}

/// Quote `s` as a SQL string literal.
#[must_use]
pub fn quote_text(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.cmp(b),
            #[allow(clippy::cast_precision_loss)]
            (Self::Int(a), Self::Float(b)) => OrderedFloat(*a as f64).cmp(b),
            #[allow(clippy::cast_precision_loss)]
            (Self::Float(a), Self::Int(b)) => a.cmp(&OrderedFloat(*b as f64)),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::float(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::text(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_quote_text_only() {
        assert_eq!(Value::Int(42).to_sql_literal(), "42");
        assert_eq!(Value::float(2.5).to_sql_literal(), "2.5");
        assert_eq!(Value::text("O'Brien").to_sql_literal(), "'O''Brien'");
        assert_eq!(Value::Null.to_sql_literal(), "NULL");
    }

    #[test]
    fn mixed_numeric_ordering() {
        assert!(Value::Int(1) < Value::float(1.5));
        assert!(Value::float(2.0) == Value::Int(2));
        assert!(Value::Null < Value::Int(i64::MIN));
        assert!(Value::Int(i64::MAX) < Value::text(""));
    }

    #[test]
    fn coercion_by_kind() {
        assert_eq!(Value::text("17").coerce(KeyKind::Integer), Some(Value::Int(17)));
        assert_eq!(Value::float(3.0).coerce(KeyKind::Integer), Some(Value::Int(3)));
        assert_eq!(Value::float(3.5).coerce(KeyKind::Integer), None);
        assert_eq!(Value::text("1.25").coerce(KeyKind::Float), Some(Value::float(1.25)));
        assert_eq!(Value::Int(3).coerce(KeyKind::Text), None);
        assert_eq!(Value::float(f64::NAN).coerce(KeyKind::Float), None);
    }

    #[test]
    fn untagged_json_shape() -> anyhow::Result<()> {
        let vals: Vec<Value> = serde_json::from_str(r#"[null, 3, 1.5, "x"]"#)?;
        assert_eq!(
            vals,
            vec![Value::Null, Value::Int(3), Value::float(1.5), Value::text("x")]
        );
        assert!(vals[0].is_null());
        Ok(())
    }
}
