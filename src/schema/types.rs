//! Flat schema model built from an introspection result.

use serde::{Deserialize, Deserializer, Serialize};

/// Kind of a GraphQL type or type reference layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    /// Leaf value such as `String` or `DateTime`.
    Scalar,
    /// Object type with fields.
    Object,
    /// Interface type with fields.
    Interface,
    /// Union of object types.
    Union,
    /// Enumeration leaf.
    Enum,
    /// Input object (arguments only).
    InputObject,
    /// List wrapper.
    List,
    /// Non-null wrapper.
    NonNull,
}

impl TypeKind {
    /// Returns `true` for `LIST` and `NON_NULL`.
    #[must_use]
    pub const fn is_wrapper(self) -> bool {
        matches!(self, Self::List | Self::NonNull)
    }

    /// Returns `true` for kinds selected without a sub-selection.
    #[must_use]
    pub const fn is_leaf(self) -> bool {
        matches!(self, Self::Scalar | Self::Enum)
    }

    /// Returns `true` for kinds that carry a field list.
    #[must_use]
    pub const fn has_fields(self) -> bool {
        matches!(self, Self::Object | Self::Interface)
    }
}

/// A possibly wrapped reference to a type, e.g. `[Product!]!`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    /// Kind of this layer.
    pub kind: TypeKind,
    /// Name of the type; `None` for wrapper layers.
    #[serde(default)]
    pub name: Option<String>,
    /// The wrapped reference for `LIST` and `NON_NULL` layers.
    #[serde(default, rename = "ofType", skip_serializing_if = "Option::is_none")]
    pub of_type: Option<Box<TypeRef>>,
}

impl TypeRef {
    /// Creates a reference to a named type.
    #[must_use]
    pub fn named(kind: TypeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: Some(name.into()),
            of_type: None,
        }
    }

    /// Wraps a reference in a `NON_NULL` layer.
    #[must_use]
    pub fn non_null(inner: Self) -> Self {
        Self {
            kind: TypeKind::NonNull,
            name: None,
            of_type: Some(Box::new(inner)),
        }
    }

    /// Wraps a reference in a `LIST` layer.
    #[must_use]
    pub fn list(inner: Self) -> Self {
        Self {
            kind: TypeKind::List,
            name: None,
            of_type: Some(Box::new(inner)),
        }
    }

    /// Unwraps `LIST`/`NON_NULL` layers down to the terminal named type.
    ///
    /// Returns `None` only for malformed references whose wrappers run out
    /// before a name is found.
    #[must_use]
    pub fn named_type(&self) -> Option<(&str, TypeKind)> {
        let mut current = self;
        while current.kind.is_wrapper() {
            current = current.of_type.as_deref()?;
        }
        current.name.as_deref().map(|name| (name, current.kind))
    }

    /// Returns `true` if any layer is a `LIST`.
    #[must_use]
    pub fn is_list(&self) -> bool {
        let mut current = Some(self);
        while let Some(layer) = current {
            if layer.kind == TypeKind::List {
                return true;
            }
            current = layer.of_type.as_deref();
        }
        false
    }
}

/// An argument accepted by a field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaArgument {
    /// Argument name.
    pub name: String,
    /// The argument's type reference.
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Default value in GraphQL literal syntax, if declared.
    #[serde(default, rename = "defaultValue")]
    pub default_value: Option<String>,
}

impl SchemaArgument {
    /// Returns `true` when the argument must be supplied: non-null with no default.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.ty.kind == TypeKind::NonNull && self.default_value.is_none()
    }
}

/// A field of an object or interface type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    /// Field name.
    pub name: String,
    /// The field's type reference.
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Declared arguments.
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<SchemaArgument>,
}

impl SchemaField {
    /// Creates a field without arguments.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            args: Vec::new(),
        }
    }

    /// Adds declared arguments.
    #[must_use]
    pub fn with_args(mut self, args: Vec<SchemaArgument>) -> Self {
        self.args = args;
        self
    }

    /// Returns `true` for `__`-prefixed meta fields.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.name.starts_with("__")
    }

    /// Returns `true` if selecting the field needs an argument value.
    #[must_use]
    pub fn has_required_args(&self) -> bool {
        self.args.iter().any(SchemaArgument::is_required)
    }

    /// Returns `true` if the field accepts an argument named `name`.
    #[must_use]
    pub fn accepts_arg(&self, name: &str) -> bool {
        self.args.iter().any(|a| a.name == name)
    }
}

/// A named type with its fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaType {
    /// Type name.
    pub name: String,
    /// Type kind.
    pub kind: TypeKind,
    /// Fields; empty for scalars, enums, unions and inputs.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fields: Vec<SchemaField>,
}

impl SchemaType {
    /// Creates a type.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: TypeKind, fields: Vec<SchemaField>) -> Self {
        Self {
            name: name.into(),
            kind,
            fields,
        }
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// The introspected schema: root query type name plus a flat type list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Name of the root query type, when reported.
    #[serde(default, rename = "queryType")]
    pub query_type: Option<String>,
    /// All non-internal types.
    pub types: Vec<SchemaType>,
}

impl Schema {
    /// Creates a schema from parts.
    #[must_use]
    pub const fn new(query_type: Option<String>, types: Vec<SchemaType>) -> Self {
        Self { query_type, types }
    }

    /// Looks up a type by name.
    #[must_use]
    pub fn get_type(&self, name: &str) -> Option<&SchemaType> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Returns the root query type, trying the reported name, then the Admin
    /// API's `QueryRoot`, then the conventional `Query`.
    #[must_use]
    pub fn root_query_type(&self) -> Option<&SchemaType> {
        self.query_type
            .as_deref()
            .and_then(|name| self.get_type(name))
            .or_else(|| self.get_type("QueryRoot"))
            .or_else(|| self.get_type("Query"))
    }

    /// Returns the number of types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` when no types are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_named_type_unwraps_nested_wrappers() {
        // [[String!]!]
        let reference = TypeRef::list(TypeRef::non_null(TypeRef::list(TypeRef::non_null(
            TypeRef::named(TypeKind::Scalar, "String"),
        ))));

        assert_eq!(reference.named_type(), Some(("String", TypeKind::Scalar)));
        assert!(reference.is_list());
    }

    #[test]
    fn test_named_type_of_malformed_wrapper_is_none() {
        let reference = TypeRef {
            kind: TypeKind::NonNull,
            name: None,
            of_type: None,
        };
        assert!(reference.named_type().is_none());
    }

    #[test]
    fn test_deserializes_introspection_shape_with_null_fields() {
        let ty: SchemaType = serde_json::from_value(json!({
            "name": "CurrencyCode",
            "kind": "ENUM",
            "fields": null
        }))
        .unwrap();
        assert!(ty.fields.is_empty());

        let ty: SchemaType = serde_json::from_value(json!({
            "name": "Product",
            "kind": "OBJECT",
            "fields": [{
                "name": "variants",
                "type": {"kind": "NON_NULL", "name": null, "ofType": {
                    "kind": "OBJECT", "name": "ProductVariantConnection", "ofType": null
                }}
            }]
        }))
        .unwrap();
        assert_eq!(
            ty.field("variants").unwrap().ty.named_type(),
            Some(("ProductVariantConnection", TypeKind::Object))
        );
    }

    #[test]
    fn test_root_query_type_fallbacks() {
        let schema = Schema::new(
            None,
            vec![SchemaType::new("QueryRoot", TypeKind::Object, vec![])],
        );
        assert_eq!(schema.root_query_type().unwrap().name, "QueryRoot");

        let schema = Schema::new(
            Some("Root".to_string()),
            vec![
                SchemaType::new("Root", TypeKind::Object, vec![]),
                SchemaType::new("Query", TypeKind::Object, vec![]),
            ],
        );
        assert_eq!(schema.root_query_type().unwrap().name, "Root");
    }

    #[test]
    fn test_required_args_need_non_null_without_default() {
        let field: SchemaField = serde_json::from_value(json!({
            "name": "metafield",
            "type": {"kind": "OBJECT", "name": "Metafield"},
            "args": [
                {"name": "key", "type": {"kind": "NON_NULL", "name": null, "ofType": {"kind": "SCALAR", "name": "String"}}, "defaultValue": null},
                {"name": "namespace", "type": {"kind": "SCALAR", "name": "String"}, "defaultValue": null}
            ]
        }))
        .unwrap();
        assert!(field.has_required_args());
        assert!(field.accepts_arg("namespace"));

        let field: SchemaField = serde_json::from_value(json!({
            "name": "images",
            "type": {"kind": "OBJECT", "name": "ImageConnection"},
            "args": [
                {"name": "first", "type": {"kind": "SCALAR", "name": "Int"}, "defaultValue": null},
                {"name": "reverse", "type": {"kind": "NON_NULL", "name": null, "ofType": {"kind": "SCALAR", "name": "Boolean"}}, "defaultValue": "false"}
            ]
        }))
        .unwrap();
        assert!(!field.has_required_args());
    }

    #[test]
    fn test_input_object_kind_round_trips() {
        let kind: TypeKind = serde_json::from_value(json!("INPUT_OBJECT")).unwrap();
        assert_eq!(kind, TypeKind::InputObject);
        assert_eq!(serde_json::to_value(TypeKind::NonNull).unwrap(), json!("NON_NULL"));
    }
}
