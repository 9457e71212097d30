//! Sort-key range filters.
//!
//! A [`RangeFilter`] is parsed from the single-operator object AppSync sends
//! for `ModelStringKeyConditionInput` (`{"eq": "2021-01-01"}`) and compiled
//! into a key-condition fragment over the sort-key attribute.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Placeholder for the sort-key attribute name.
pub const SORT_KEY_NAME: &str = "#SK";
/// Placeholder for single-operand comparisons.
pub const SORT_KEY_VALUE: &str = ":SK";
/// Placeholder for the lower `between` bound.
pub const SORT_KEY_LOW: &str = ":SK0";
/// Placeholder for the upper `between` bound.
pub const SORT_KEY_HIGH: &str = ":SK1";

/// Errors produced while parsing a range filter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("range filter has no operator")]
    Empty,

    #[error("range filter must have exactly one operator, got: {}", .0.join(", "))]
    MultipleOperators(Vec<String>),

    #[error("unknown range filter operator: {0}")]
    UnknownOperator(String),

    #[error("invalid operand for '{operator}': {reason}")]
    InvalidOperand {
        operator: &'static str,
        reason: &'static str,
    },
}

/// A single sort-key condition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub enum RangeFilter {
    GreaterThan(String),
    Equals(String),
    LessThanOrEqual(String),
    LessThan(String),
    GreaterThanOrEqual(String),
    /// Inclusive on both bounds.
    Between(String, String),
    BeginsWith(String),
}

impl RangeFilter {
    /// Wire name of the operator.
    pub fn operator(&self) -> &'static str {
        match self {
            Self::GreaterThan(_) => "gt",
            Self::Equals(_) => "eq",
            Self::LessThanOrEqual(_) => "le",
            Self::LessThan(_) => "lt",
            Self::GreaterThanOrEqual(_) => "ge",
            Self::Between(_, _) => "between",
            Self::BeginsWith(_) => "beginsWith",
        }
    }

    /// Evaluate the filter against a sort-key value.
    ///
    /// Comparison is lexicographic on the raw string.
    pub fn matches(&self, sort_key: &str) -> bool {
        match self {
            Self::GreaterThan(v) => sort_key > v.as_str(),
            Self::Equals(v) => sort_key == v,
            Self::LessThanOrEqual(v) => sort_key <= v.as_str(),
            Self::LessThan(v) => sort_key < v.as_str(),
            Self::GreaterThanOrEqual(v) => sort_key >= v.as_str(),
            Self::Between(low, high) => sort_key >= low.as_str() && sort_key <= high.as_str(),
            Self::BeginsWith(prefix) => sort_key.starts_with(prefix.as_str()),
        }
    }

    fn from_operator(operator: &str, operand: Value) -> Result<Self, FilterError> {
        let filter = match operator {
            "gt" | "greaterThan" => Self::GreaterThan(string_operand("gt", operand)?),
            "eq" | "equals" => Self::Equals(string_operand("eq", operand)?),
            "le" | "lessThanOrEqual" => Self::LessThanOrEqual(string_operand("le", operand)?),
            "lt" | "lessThan" => Self::LessThan(string_operand("lt", operand)?),
            "ge" | "greaterThanOrEqual" => {
                Self::GreaterThanOrEqual(string_operand("ge", operand)?)
            }
            "beginsWith" => Self::BeginsWith(string_operand("beginsWith", operand)?),
            "between" => {
                let (low, high) = between_operand(operand)?;
                Self::Between(low, high)
            }
            other => return Err(FilterError::UnknownOperator(other.to_string())),
        };
        Ok(filter)
    }
}

impl TryFrom<Map<String, Value>> for RangeFilter {
    type Error = FilterError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        // GraphQL clients may send unused input fields as explicit nulls.
        let mut present: Vec<(String, Value)> =
            map.into_iter().filter(|(_, v)| !v.is_null()).collect();

        match present.len() {
            0 => Err(FilterError::Empty),
            1 => {
                let (operator, operand) = present.remove(0);
                Self::from_operator(&operator, operand)
            }
            _ => Err(FilterError::MultipleOperators(
                present.into_iter().map(|(k, _)| k).collect(),
            )),
        }
    }
}

fn string_operand(operator: &'static str, operand: Value) -> Result<String, FilterError> {
    match operand {
        Value::String(s) => Ok(s),
        _ => Err(FilterError::InvalidOperand {
            operator,
            reason: "expected a string",
        }),
    }
}

fn between_operand(operand: Value) -> Result<(String, String), FilterError> {
    let invalid = FilterError::InvalidOperand {
        operator: "between",
        reason: "expected an array of two strings",
    };
    let Value::Array(bounds) = operand else {
        return Err(invalid);
    };
    match <[Value; 2]>::try_from(bounds) {
        Ok([Value::String(low), Value::String(high)]) => Ok((low, high)),
        _ => Err(invalid),
    }
}

/// Key-condition fragment over the sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionFragment {
    /// Attribute name placeholders (`#SK` to the sort-key attribute).
    pub names: BTreeMap<String, String>,
    /// Condition expression referencing the placeholders.
    pub expression: String,
    /// Value placeholders (`:SK`, or `:SK0`/`:SK1` for `between`).
    pub values: BTreeMap<String, String>,
}

/// Compile a sort-key filter into a key-condition fragment.
///
/// Returns `None` when no filter is given; the query is then restricted to
/// the partition alone.
pub fn compile(filter: Option<&RangeFilter>, sort_key_attr: &str) -> Option<ConditionFragment> {
    let filter = filter?;

    let names = BTreeMap::from([(SORT_KEY_NAME.to_string(), sort_key_attr.to_string())]);

    let single = |op: &str, value: &str| {
        (
            format!("{SORT_KEY_NAME} {op} {SORT_KEY_VALUE}"),
            BTreeMap::from([(SORT_KEY_VALUE.to_string(), value.to_string())]),
        )
    };

    let (expression, values) = match filter {
        RangeFilter::GreaterThan(v) => single(">", v),
        RangeFilter::Equals(v) => single("=", v),
        RangeFilter::LessThanOrEqual(v) => single("<=", v),
        RangeFilter::LessThan(v) => single("<", v),
        RangeFilter::GreaterThanOrEqual(v) => single(">=", v),
        RangeFilter::Between(low, high) => (
            format!("{SORT_KEY_NAME} BETWEEN {SORT_KEY_LOW} AND {SORT_KEY_HIGH}"),
            BTreeMap::from([
                (SORT_KEY_LOW.to_string(), low.clone()),
                (SORT_KEY_HIGH.to_string(), high.clone()),
            ]),
        ),
        RangeFilter::BeginsWith(prefix) => (
            format!("begins_with({SORT_KEY_NAME}, {SORT_KEY_VALUE})"),
            BTreeMap::from([(SORT_KEY_VALUE.to_string(), prefix.clone())]),
        ),
    };

    Some(ConditionFragment {
        names,
        expression,
        values,
    })
}
