//! The uniform JSON wrapper returned by every endpoint.

use serde::{Deserialize, Serialize};
use service_core::error::AppError;

/// Payload of a successful `/bfhl` call; its shape depends on the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultData {
    /// `fibonacci` and `prime`.
    Sequence(Vec<u64>),
    /// `lcm` and `hcf`.
    Number(u64),
    /// `AI`.
    Word(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub is_success: bool,
    pub official_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResultData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    /// `{ is_success: true, official_email }`, as served by `/health`.
    pub fn ok(official_email: impl Into<String>) -> Self {
        Self {
            is_success: true,
            official_email: official_email.into(),
            data: None,
            message: None,
            error: None,
        }
    }

    pub fn success(official_email: impl Into<String>, data: ResultData) -> Self {
        Self {
            data: Some(data),
            ..Self::ok(official_email)
        }
    }

    pub fn failure(official_email: impl Into<String>, err: &AppError) -> Self {
        let body = err.to_body();
        Self {
            is_success: false,
            official_email: official_email.into(),
            data: None,
            message: Some(body.message),
            error: body.error,
        }
    }
}
