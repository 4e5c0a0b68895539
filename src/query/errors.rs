//! Query generation errors.

use thiserror::Error;

/// Errors from [`QueryBuilder`](crate::query::QueryBuilder).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryBuildError {
    /// Neither the singular type name nor the root connection resolved to an
    /// object type.
    #[error("No schema type found for resource '{resource}' (looked for '{type_name}')")]
    UnknownType {
        /// The requested resource.
        resource: String,
        /// The type name derived from it.
        type_name: String,
    },

    /// Every candidate field was unknown or unselectable.
    #[error("No selectable fields on type '{type_name}'")]
    NoSelectableFields {
        /// The node type.
        type_name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_type() {
        let error = QueryBuildError::UnknownType {
            resource: "widgets".to_string(),
            type_name: "Widget".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "No schema type found for resource 'widgets' (looked for 'Widget')"
        );

        let error = QueryBuildError::NoSelectableFields {
            type_name: "Shop".to_string(),
        };
        assert!(error.to_string().contains("'Shop'"));
    }
}
