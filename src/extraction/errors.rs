//! Extraction errors.

use thiserror::Error;
use uuid::Uuid;

use crate::clients::{GraphqlError, GraphqlErrorEntry, GraphqlResponse};
use crate::query::QueryBuildError;
use crate::schema::SchemaError;
use crate::store::StoreError;

/// Errors that end an extraction, or reject one before it starts.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The request failed at the transport level.
    #[error(transparent)]
    Transport(#[from] GraphqlError),

    /// The API answered with GraphQL errors.
    #[error("GraphQL error: {message}")]
    Graphql {
        /// Joined error messages.
        message: String,
        /// The individual errors.
        errors: Vec<GraphqlErrorEntry>,
    },

    /// The API rejected fields that do not exist in this API version.
    #[error(
        "Query is incompatible with the current API version: {message}. \
         Clear the schema cache or pick other fields."
    )]
    SchemaIncompatible {
        /// Joined error messages.
        message: String,
        /// The individual errors.
        errors: Vec<GraphqlErrorEntry>,
    },

    /// The response had no connection under the expected key.
    #[error("Response has no '{resource_key}' connection")]
    MissingConnection {
        /// The resource key looked up in `data`.
        resource_key: String,
    },

    /// The run was cancelled.
    #[error("Extraction was cancelled")]
    Cancelled,

    /// The schema could not be loaded.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// No query could be generated.
    #[error(transparent)]
    QueryBuild(#[from] QueryBuildError),

    /// Output could not be written.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A required request parameter is missing.
    #[error("Missing required parameter: {name}")]
    MissingParameter {
        /// Parameter name.
        name: &'static str,
    },

    /// No template has this id.
    #[error("Unknown query template '{id}'")]
    UnknownTemplate {
        /// The requested id.
        id: String,
    },

    /// Another run is still active.
    #[error("Extraction {active} is still running; wait for it or cancel it first")]
    Busy {
        /// The active session.
        active: Uuid,
    },

    /// No session has this id.
    #[error("No extraction session with id {id}")]
    UnknownSession {
        /// The requested id.
        id: Uuid,
    },
}

impl ExtractionError {
    /// Classifies the errors of a GraphQL response.
    #[must_use]
    pub fn from_response(response: &GraphqlResponse) -> Self {
        let message = response.error_summary();
        let errors = response.errors.clone();
        if response.is_schema_incompatible() {
            Self::SchemaIncompatible { message, errors }
        } else {
            Self::Graphql { message, errors }
        }
    }

    /// Returns `true` for GraphQL-level failures, which allow one query
    /// regeneration.
    #[must_use]
    pub const fn is_graphql(&self) -> bool {
        matches!(self, Self::Graphql { .. } | Self::SchemaIncompatible { .. })
    }
}
