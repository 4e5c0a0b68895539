//! Query generation, validation and the predefined template catalogue.
//!
//! - [`QueryBuilder`]: builds a paginated query for a resource from the schema
//! - [`validate`] / [`validate_and_update`]: checks a query's field paths
//!   against the schema, regenerating it when they no longer match
//! - [`TEMPLATES`]: predefined plain and dependent extractions

mod builder;
mod errors;
mod templates;
mod validator;

pub use builder::{singular_type_name, GeneratedQuery, QueryBuilder, QueryBuilderOptions};
pub use errors::QueryBuildError;
pub use templates::{
    extract_ids, find_template, join_by_id, values_at_path, DependentTemplate, QueryTemplate,
    TEMPLATES,
};
pub use validator::{
    validate, validate_and_update, validate_query, QueryOrigin, ResolvedQuery, ValidationIssue,
};
