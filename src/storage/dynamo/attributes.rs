//! Conversions between DynamoDB attribute maps and crate types.

use std::collections::{BTreeMap, HashMap};

use aws_sdk_dynamodb::types::AttributeValue;

use crate::query::{partition_value, Cursor, DataPoint, KeyAttribute, KeySchema};
use crate::storage::{Result, StorageError};

pub const NAME_ATTR: &str = "name";
pub const CREATED_AT_ATTR: &str = "createdAt";
pub const VALUE_ATTR: &str = "value";
pub const OWNER_ATTR: &str = "owner";

type Item = HashMap<String, AttributeValue>;

fn kind(value: &AttributeValue) -> &'static str {
    match value {
        AttributeValue::S(_) => "S",
        AttributeValue::N(_) => "N",
        AttributeValue::B(_) => "B",
        AttributeValue::Bool(_) => "BOOL",
        AttributeValue::Null(_) => "NULL",
        AttributeValue::M(_) => "M",
        AttributeValue::L(_) => "L",
        AttributeValue::Ss(_) => "SS",
        AttributeValue::Ns(_) => "NS",
        AttributeValue::Bs(_) => "BS",
        _ => "unknown",
    }
}

fn unsupported(name: &str, value: &AttributeValue) -> StorageError {
    StorageError::UnsupportedAttribute {
        name: name.to_string(),
        kind: kind(value).to_string(),
    }
}

fn required_string(item: &Item, name: &str) -> Result<String> {
    match item.get(name) {
        Some(AttributeValue::S(s)) => Ok(s.clone()),
        Some(other) => Err(unsupported(name, other)),
        None => Err(StorageError::MissingAttribute(name.to_string())),
    }
}

fn optional_string(item: &Item, name: &str) -> Result<Option<String>> {
    match item.get(name) {
        Some(AttributeValue::S(s)) => Ok(Some(s.clone())),
        Some(AttributeValue::Null(_)) | None => Ok(None),
        Some(other) => Err(unsupported(name, other)),
    }
}

fn required_number(item: &Item, name: &str) -> Result<f64> {
    match item.get(name) {
        Some(AttributeValue::N(n)) => n.parse().map_err(|_| StorageError::InvalidNumber {
            name: name.to_string(),
            value: n.clone(),
        }),
        Some(other) => Err(unsupported(name, other)),
        None => Err(StorageError::MissingAttribute(name.to_string())),
    }
}

/// Read a data point from a table item.
pub fn item_to_data_point(item: &Item) -> Result<DataPoint> {
    Ok(DataPoint {
        name: required_string(item, NAME_ATTR)?,
        created_at: required_string(item, CREATED_AT_ATTR)?,
        value: required_number(item, VALUE_ATTR)?,
        owner: optional_string(item, OWNER_ATTR)?,
    })
}

/// Build the table item for a data point, including its key attributes.
pub fn data_point_to_item(key_schema: &KeySchema, point: &DataPoint) -> Result<Item> {
    let owner = point
        .owner
        .as_deref()
        .ok_or_else(|| StorageError::MissingAttribute(OWNER_ATTR.to_string()))?;

    if !point.value.is_finite() {
        return Err(StorageError::InvalidNumber {
            name: VALUE_ATTR.to_string(),
            value: point.value.to_string(),
        });
    }

    Ok(HashMap::from([
        (
            key_schema.partition_key.clone(),
            AttributeValue::S(partition_value(owner, &point.name)),
        ),
        (
            key_schema.sort_key.clone(),
            AttributeValue::S(point.created_at.clone()),
        ),
        (NAME_ATTR.to_string(), AttributeValue::S(point.name.clone())),
        (
            CREATED_AT_ATTR.to_string(),
            AttributeValue::S(point.created_at.clone()),
        ),
        (
            VALUE_ATTR.to_string(),
            AttributeValue::N(point.value.to_string()),
        ),
        (OWNER_ATTR.to_string(), AttributeValue::S(owner.to_string())),
    ]))
}

/// Convert a `LastEvaluatedKey` into a cursor.
///
/// `N` attributes are kept exactly only within `i64`/`u64`/`f64` range; see
/// [`KeyAttribute`].
pub fn key_to_cursor(key: &Item) -> Result<Cursor> {
    let mut cursor = Cursor::new();
    for (name, value) in key {
        let attribute = match value {
            AttributeValue::S(s) => KeyAttribute::String(s.clone()),
            AttributeValue::N(n) => KeyAttribute::Number(serde_json::from_str(n).map_err(
                |_| StorageError::InvalidNumber {
                    name: name.clone(),
                    value: n.clone(),
                },
            )?),
            other => return Err(unsupported(name, other)),
        };
        cursor.insert(name.clone(), attribute);
    }
    Ok(cursor)
}

/// Convert a cursor into an `ExclusiveStartKey`.
pub fn cursor_to_key(cursor: &Cursor) -> Item {
    cursor
        .iter()
        .map(|(name, value)| {
            let value = match value {
                KeyAttribute::String(s) => AttributeValue::S(s.clone()),
                KeyAttribute::Number(n) => AttributeValue::N(n.to_string()),
            };
            (name.clone(), value)
        })
        .collect()
}

/// Render placeholder values as string attributes.
pub fn string_values(values: &BTreeMap<String, String>) -> Item {
    values
        .iter()
        .map(|(k, v)| (k.clone(), AttributeValue::S(v.clone())))
        .collect()
}
