//! Continuation tokens.
//!
//! A token is the store's last-evaluated key, serialized to JSON and then
//! Base64-encoded. Callers treat it as opaque. Decoding never fails a
//! request: a token that cannot be read means "start from the beginning".

use std::collections::BTreeMap;

use base64::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Upper bound on accepted token length.
pub const MAX_TOKEN_LEN: usize = 8 * 1024;

/// Errors produced while decoding a continuation token.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("continuation token is empty")]
    Empty,

    #[error("continuation token exceeds max length: {len} chars (max {max})")]
    TooLong { len: usize, max: usize },

    #[error("continuation token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("continuation token is not a JSON key: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single key attribute of a cursor.
///
/// Numbers go through `serde_json::Number`, which holds an `i64`, `u64` or
/// `f64`. DynamoDB numbers outside that range (integers above `u64::MAX`,
/// decimals beyond `f64` precision) do not survive a token round trip
/// exactly. The data point table keys on strings only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyAttribute {
    String(String),
    Number(serde_json::Number),
}

impl From<&str> for KeyAttribute {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for KeyAttribute {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// The store's native pagination marker: the key of the last item returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(BTreeMap<String, KeyAttribute>);

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key attribute, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<KeyAttribute>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<KeyAttribute>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&KeyAttribute> {
        self.0.get(name)
    }

    /// String value of a key attribute, if it is string-typed.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(KeyAttribute::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &KeyAttribute)> {
        self.0.iter()
    }
}

/// Encode a cursor as a continuation token.
pub fn encode(cursor: &Cursor) -> Result<String, TokenError> {
    let json = serde_json::to_vec(cursor)?;
    Ok(BASE64_STANDARD.encode(json))
}

/// Decode a continuation token back into a cursor.
pub fn decode(token: &str) -> Result<Cursor, TokenError> {
    let token = token.trim();

    if token.is_empty() {
        return Err(TokenError::Empty);
    }

    if token.len() > MAX_TOKEN_LEN {
        return Err(TokenError::TooLong {
            len: token.len(),
            max: MAX_TOKEN_LEN,
        });
    }

    let bytes = BASE64_STANDARD.decode(token)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Decode an optional token, falling back to no cursor on any error.
pub fn decode_or_none(token: Option<&str>) -> Option<Cursor> {
    let token = token.filter(|t| !t.trim().is_empty())?;
    match decode(token) {
        Ok(cursor) => Some(cursor),
        Err(e) => {
            warn!(error = %e, "Could not parse nextToken, starting from the beginning");
            None
        }
    }
}
