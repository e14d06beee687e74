//! Validating parser from the raw JSON body to a typed [`BfhlRequest`].

use serde_json::{Map, Value};
use service_core::error::AppError;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The field name selecting which computation runs, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionalKey {
    Ai,
    Fibonacci,
    Prime,
    Lcm,
    Hcf,
}

impl FunctionalKey {
    pub const ALL: [FunctionalKey; 5] = [
        FunctionalKey::Ai,
        FunctionalKey::Fibonacci,
        FunctionalKey::Prime,
        FunctionalKey::Lcm,
        FunctionalKey::Hcf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionalKey::Ai => "AI",
            FunctionalKey::Fibonacci => "fibonacci",
            FunctionalKey::Prime => "prime",
            FunctionalKey::Lcm => "lcm",
            FunctionalKey::Hcf => "hcf",
        }
    }
}

impl fmt::Display for FunctionalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FunctionalKey {
    type Err = RequestError;

    /// Keys are matched exactly; `ai` or `Fibonacci` are not recognized.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| RequestError::UnknownKey(s.to_string()))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Empty request body")]
    EmptyBody,

    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("No valid functional key found (AI, fibonacci, prime, lcm, or hcf)")]
    UnknownKey(String),

    #[error("Request must contain exactly one functional key, found {0} keys")]
    TooManyKeys(usize),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: FunctionalKey, reason: String },
}

/// Largest magnitude accepted in a `prime`, `lcm` or `hcf` list (2^53).
pub const MAX_LIST_MAGNITUDE: u64 = 1 << 53;

impl From<RequestError> for AppError {
    fn from(err: RequestError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

/// A validated request. Handlers never re-check the body shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BfhlRequest {
    Ai(String),
    Fibonacci(i64),
    Prime(Vec<i64>),
    Lcm(Vec<i64>),
    Hcf(Vec<i64>),
}

impl BfhlRequest {
    pub fn key(&self) -> FunctionalKey {
        match self {
            BfhlRequest::Ai(_) => FunctionalKey::Ai,
            BfhlRequest::Fibonacci(_) => FunctionalKey::Fibonacci,
            BfhlRequest::Prime(_) => FunctionalKey::Prime,
            BfhlRequest::Lcm(_) => FunctionalKey::Lcm,
            BfhlRequest::Hcf(_) => FunctionalKey::Hcf,
        }
    }

    fn from_entry(key: FunctionalKey, value: &Value) -> Result<Self, RequestError> {
        let invalid = |reason: &str| RequestError::InvalidValue {
            key,
            reason: reason.to_string(),
        };

        match key {
            FunctionalKey::Ai => match value {
                Value::String(question) if !question.trim().is_empty() => {
                    Ok(BfhlRequest::Ai(question.trim().to_string()))
                }
                Value::String(_) => Err(invalid("question must not be empty")),
                _ => Err(invalid("expected a string")),
            },
            FunctionalKey::Fibonacci => parse_integer(value)
                .map(BfhlRequest::Fibonacci)
                .ok_or_else(|| invalid("expected an integer")),
            FunctionalKey::Prime => parse_integer_list(key, value).map(BfhlRequest::Prime),
            FunctionalKey::Lcm => parse_integer_list(key, value).map(BfhlRequest::Lcm),
            FunctionalKey::Hcf => parse_integer_list(key, value).map(BfhlRequest::Hcf),
        }
    }
}

impl TryFrom<Value> for BfhlRequest {
    type Error = RequestError;

    fn try_from(body: Value) -> Result<Self, Self::Error> {
        match body {
            Value::Null => Err(RequestError::EmptyBody),
            Value::Object(map) => BfhlRequest::try_from(map),
            _ => Err(RequestError::NotAnObject),
        }
    }
}

impl TryFrom<Map<String, Value>> for BfhlRequest {
    type Error = RequestError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut entries = map.iter();
        let (name, value) = entries.next().ok_or(RequestError::EmptyBody)?;
        if entries.next().is_some() {
            return Err(RequestError::TooManyKeys(map.len()));
        }

        let key: FunctionalKey = name.parse()?;
        BfhlRequest::from_entry(key, value)
    }
}

/// Integer from a JSON integer, an integral float, or an integer string.
fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_integer_list(key: FunctionalKey, value: &Value) -> Result<Vec<i64>, RequestError> {
    let items = value.as_array().ok_or_else(|| RequestError::InvalidValue {
        key,
        reason: "expected an array of integers".to_string(),
    })?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let n = parse_integer(item).ok_or_else(|| RequestError::InvalidValue {
                key,
                reason: format!("element {} ({}) is not an integer", index, item),
            })?;
            if n.unsigned_abs() > MAX_LIST_MAGNITUDE {
                return Err(RequestError::InvalidValue {
                    key,
                    reason: format!(
                        "element {} ({}) exceeds the maximum magnitude {}",
                        index, item, MAX_LIST_MAGNITUDE
                    ),
                });
            }
            Ok(n)
        })
        .collect()
}
