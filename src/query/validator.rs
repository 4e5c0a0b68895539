//! Field-path validation of query documents against an introspected schema.
//!
//! The document is parsed with `apollo-parser` and every selection set is
//! walked from the root query type. Each field is resolved against its parent
//! type; inline fragments and named fragment spreads switch the parent to
//! their type condition. Arguments, variables and directives are not checked.

use std::collections::HashMap;
use std::fmt;

use apollo_parser::cst::{self, CstNode};
use apollo_parser::Parser;
use serde::Serialize;

use crate::query::{QueryBuildError, QueryBuilder, QueryBuilderOptions};
use crate::schema::{Schema, SchemaType, TypeKind};

/// One problem found while validating a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Dotted response path to the offending selection; empty for document
    /// level problems.
    pub path: String,
    /// Human-readable description.
    pub message: String,
}

impl ValidationIssue {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Where a resolved query came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryOrigin {
    /// The predefined query passed validation and is used as written.
    Predefined,
    /// The predefined query was rejected and a generated one replaced it.
    Generated,
}

/// A query ready to run, with the field labels shown to consumers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedQuery {
    /// Query text.
    pub query: String,
    /// Field labels; for templates these are the template's labels even when
    /// the query was regenerated.
    pub fields: Vec<String>,
    /// Whether the query is the predefined one or a regenerated one.
    pub origin: QueryOrigin,
}

/// Returns `true` if every field in `query` exists on its parent type.
#[must_use]
pub fn validate(schema: &Schema, query: &str) -> bool {
    validate_query(schema, query).is_ok()
}

/// Validates `query` and returns every problem found.
///
/// # Errors
///
/// Returns the list of [`ValidationIssue`]s when the document has syntax
/// errors, is not a query, or selects fields its parent types lack.
pub fn validate_query(schema: &Schema, query: &str) -> Result<(), Vec<ValidationIssue>> {
    let tree = Parser::new(query).parse();
    let syntax_errors: Vec<ValidationIssue> = tree
        .errors()
        .map(|e| ValidationIssue::new("", format!("Syntax error: {}", e.message())))
        .collect();
    if !syntax_errors.is_empty() {
        return Err(syntax_errors);
    }

    let document = tree.document();
    let mut fragments = HashMap::new();
    let mut operations = Vec::new();
    for definition in document.definitions() {
        match definition {
            cst::Definition::OperationDefinition(op) => operations.push(op),
            cst::Definition::FragmentDefinition(fragment) => {
                if let Some(name) = fragment
                    .fragment_name()
                    .and_then(|n| n.name())
                    .map(|n| n.text().to_string())
                {
                    fragments.insert(name, fragment);
                }
            }
            _ => {}
        }
    }

    let mut walker = Walker {
        schema,
        fragments: &fragments,
        visiting: Vec::new(),
        issues: Vec::new(),
    };

    if operations.is_empty() {
        walker
            .issues
            .push(ValidationIssue::new("", "Document contains no operation"));
    }

    for op in &operations {
        walker.check_operation(op);
    }

    if walker.issues.is_empty() {
        Ok(())
    } else {
        Err(walker.issues)
    }
}

/// Keeps a predefined query when it validates, otherwise replaces it with a
/// query generated for `resource`.
///
/// `labels` are returned as the field list either way.
///
/// # Errors
///
/// Returns [`QueryBuildError`] if the predefined query is invalid and no
/// replacement can be generated.
pub fn validate_and_update(
    schema: &Schema,
    resource: &str,
    predefined: &str,
    labels: &[&str],
    options: QueryBuilderOptions,
) -> Result<ResolvedQuery, QueryBuildError> {
    let fields = labels.iter().map(ToString::to_string).collect();

    match validate_query(schema, predefined) {
        Ok(()) => Ok(ResolvedQuery {
            query: predefined.to_string(),
            fields,
            origin: QueryOrigin::Predefined,
        }),
        Err(issues) => {
            let summary = issues
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            tracing::warn!(
                "Predefined query for {} does not match the schema ({}); generating a replacement",
                resource,
                summary
            );
            let generated = QueryBuilder::new(schema, options).build(resource, None)?;
            Ok(ResolvedQuery {
                query: generated.query,
                fields,
                origin: QueryOrigin::Generated,
            })
        }
    }
}

struct Walker<'s, 'd> {
    schema: &'s Schema,
    fragments: &'d HashMap<String, cst::FragmentDefinition>,
    visiting: Vec<String>,
    issues: Vec<ValidationIssue>,
}

impl<'s> Walker<'s, '_> {
    fn check_operation(&mut self, op: &cst::OperationDefinition) {
        let operation_type = op
            .operation_type()
            .map_or_else(
                || "query".to_string(),
                |t| t.syntax().text().to_string().trim().to_string(),
            );
        if operation_type != "query" {
            self.issues.push(ValidationIssue::new(
                "",
                format!("Only query operations are supported, found '{operation_type}'"),
            ));
            return;
        }

        let schema = self.schema;
        let Some(root) = schema.root_query_type() else {
            self.issues
                .push(ValidationIssue::new("", "Schema has no query root type"));
            return;
        };
        if let Some(selection_set) = op.selection_set() {
            self.check_selection_set(&selection_set, root, "");
        }
    }

    fn check_selection_set(&mut self, set: &cst::SelectionSet, parent: &SchemaType, path: &str) {
        for selection in set.selections() {
            match selection {
                cst::Selection::Field(field) => self.check_field(&field, parent, path),
                cst::Selection::InlineFragment(fragment) => {
                    let target = match fragment
                        .type_condition()
                        .and_then(|c| c.named_type())
                        .and_then(|t| t.name())
                    {
                        Some(name) => {
                            let name = name.text().to_string();
                            match self.composite_type(&name) {
                                Some(ty) => ty,
                                None => {
                                    self.issues.push(ValidationIssue::new(
                                        path,
                                        format!("Unknown type '{name}' in inline fragment"),
                                    ));
                                    continue;
                                }
                            }
                        }
                        None => parent,
                    };
                    if let Some(sub) = fragment.selection_set() {
                        self.check_selection_set(&sub, target, path);
                    }
                }
                cst::Selection::FragmentSpread(spread) => {
                    let Some(name) = spread
                        .fragment_name()
                        .and_then(|n| n.name())
                        .map(|n| n.text().to_string())
                    else {
                        continue;
                    };
                    self.check_spread(&name, path);
                }
            }
        }
    }

    fn check_field(&mut self, field: &cst::Field, parent: &SchemaType, path: &str) {
        let Some(name) = field.name().map(|n| n.text().to_string()) else {
            return;
        };
        if name.starts_with("__") {
            return;
        }

        let field_path = if path.is_empty() {
            name.clone()
        } else {
            format!("{path}.{name}")
        };

        let Some(definition) = parent.field(&name) else {
            self.issues.push(ValidationIssue::new(
                field_path,
                format!("Field '{name}' doesn't exist on type '{}'", parent.name),
            ));
            return;
        };
        let Some((type_name, kind)) = definition.ty.named_type() else {
            return;
        };

        let schema = self.schema;
        let composite = kind.has_fields() || kind == TypeKind::Union;
        match (composite, field.selection_set()) {
            (true, Some(sub)) => match schema.get_type(type_name) {
                Some(ty) => self.check_selection_set(&sub, ty, &field_path),
                None => self.issues.push(ValidationIssue::new(
                    field_path,
                    format!("Type '{type_name}' is missing from the schema"),
                )),
            },
            (true, None) => self.issues.push(ValidationIssue::new(
                field_path,
                format!("Field '{name}' of type '{type_name}' must have a selection of subfields"),
            )),
            (false, Some(_)) => self.issues.push(ValidationIssue::new(
                field_path,
                format!("Field '{name}' of type '{type_name}' cannot have a selection"),
            )),
            (false, None) => {}
        }
    }

    fn check_spread(&mut self, name: &str, path: &str) {
        let fragments = self.fragments;
        let Some(fragment) = fragments.get(name) else {
            self.issues.push(ValidationIssue::new(
                path,
                format!("Unknown fragment '{name}'"),
            ));
            return;
        };
        if self.visiting.iter().any(|n| n == name) {
            self.issues.push(ValidationIssue::new(
                path,
                format!("Fragment '{name}' spreads itself"),
            ));
            return;
        }

        let Some(type_name) = fragment
            .type_condition()
            .and_then(|c| c.named_type())
            .and_then(|t| t.name())
            .map(|n| n.text().to_string())
        else {
            return;
        };
        let Some(target) = self.composite_type(&type_name) else {
            self.issues.push(ValidationIssue::new(
                path,
                format!("Unknown type '{type_name}' on fragment '{name}'"),
            ));
            return;
        };

        if let Some(sub) = fragment.selection_set() {
            self.visiting.push(name.to_string());
            self.check_selection_set(&sub, target, path);
            self.visiting.pop();
        }
    }

    fn composite_type(&self, name: &str) -> Option<&'s SchemaType> {
        self.schema
            .get_type(name)
            .filter(|t| t.kind.has_fields() || t.kind == TypeKind::Union)
    }
}
