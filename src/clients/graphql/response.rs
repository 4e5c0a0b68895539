//! Decoded GraphQL response documents.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clients::graphql::GraphqlError;

/// Marker the Admin API uses when a selected field is absent from a type.
const UNDEFINED_FIELD_PATTERN: &str = "doesn't exist on type";
/// Error code the Admin API attaches to the same condition.
const UNDEFINED_FIELD_CODE: &str = "undefinedField";

/// One entry of a response's `errors` array.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphqlErrorEntry {
    /// Human-readable error message.
    pub message: String,
    /// Path of the field that failed, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,
    /// Server-specific extra information, e.g. `{"code": "THROTTLED"}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphqlErrorEntry {
    /// Creates an entry with only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Returns `true` when the error says a selected field does not exist on
    /// its parent type, which indicates the query drifted from the API version.
    #[must_use]
    pub fn is_schema_incompatible(&self) -> bool {
        self.message.contains(UNDEFINED_FIELD_PATTERN)
            || self
                .extensions
                .as_ref()
                .and_then(|ext| ext.get("code"))
                .and_then(Value::as_str)
                == Some(UNDEFINED_FIELD_CODE)
    }
}

/// A GraphQL response: `data` plus any `errors`.
///
/// A response can carry both: partial data with errors for the fields that
/// failed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphqlResponse {
    /// The `data` member; `None` when absent or `null`.
    #[serde(default)]
    pub data: Option<Value>,
    /// The `errors` member; empty when absent.
    #[serde(default)]
    pub errors: Vec<GraphqlErrorEntry>,
    /// The `extensions` member (query cost and similar).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphqlResponse {
    /// Creates a successful response carrying `data`.
    #[must_use]
    pub const fn with_data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
            extensions: None,
        }
    }

    /// Creates a response carrying only errors.
    #[must_use]
    pub const fn with_errors(errors: Vec<GraphqlErrorEntry>) -> Self {
        Self {
            data: None,
            errors,
            extensions: None,
        }
    }

    /// Decodes a response body.
    ///
    /// # Errors
    ///
    /// Returns [`GraphqlError::InvalidResponse`] when the body is not an
    /// object or carries neither `data` nor `errors`.
    pub fn from_body(body: Value) -> Result<Self, GraphqlError> {
        if !body.is_object() {
            return Err(GraphqlError::InvalidResponse {
                reason: format!("expected a JSON object, got {body}"),
            });
        }
        if body.get("data").is_none() && body.get("errors").is_none() {
            return Err(GraphqlError::InvalidResponse {
                reason: "response has neither 'data' nor 'errors'".to_string(),
            });
        }

        let mut response: Self =
            serde_json::from_value(body).map_err(|e| GraphqlError::InvalidResponse {
                reason: e.to_string(),
            })?;
        if response.data.as_ref().is_some_and(Value::is_null) {
            response.data = None;
        }
        Ok(response)
    }

    /// Extracts GraphQL errors from a serialized HTTP error body, if it holds
    /// a well-formed `errors` array.
    #[must_use]
    pub fn from_error_message(message: &str) -> Option<Self> {
        let body: Value = serde_json::from_str(message).ok()?;
        let errors: Vec<GraphqlErrorEntry> =
            serde_json::from_value(body.get("errors")?.clone()).ok()?;
        if errors.is_empty() {
            return None;
        }
        Some(Self::with_errors(errors))
    }

    /// Returns `true` when the server reported at least one error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` when any error is a missing-field schema error.
    #[must_use]
    pub fn is_schema_incompatible(&self) -> bool {
        self.errors.iter().any(GraphqlErrorEntry::is_schema_incompatible)
    }

    /// Returns all error messages joined with `"; "`.
    #[must_use]
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Returns `data[key]` when present and non-null.
    #[must_use]
    pub fn data_field(&self, key: &str) -> Option<&Value> {
        self.data
            .as_ref()
            .and_then(|data| data.get(key))
            .filter(|value| !value.is_null())
    }
}
