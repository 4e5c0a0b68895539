//! Predefined query templates.
//!
//! Templates are plain data. A plain template is one paginated query; a
//! dependent template also names a per-identifier secondary query, where the
//! identifiers sit inside each primary node, and the key its results are
//! merged under.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

/// A predefined extraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct QueryTemplate {
    /// Identifier used to select the template.
    pub id: &'static str,
    /// Display name.
    pub label: &'static str,
    /// Root connection the primary query pages through.
    pub resource: &'static str,
    /// Primary query taking `$first: Int!` and `$after: String`.
    pub query: &'static str,
    /// Column labels for consumers.
    pub fields: &'static [&'static str],
    /// Secondary query description for dependent templates.
    pub dependent: Option<DependentTemplate>,
}

impl QueryTemplate {
    /// Returns `true` for templates with a secondary query.
    #[must_use]
    pub const fn is_dependent(&self) -> bool {
        self.dependent.is_some()
    }
}

/// The secondary half of a dependent template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DependentTemplate {
    /// Query fetching one record by identifier.
    pub secondary_query: &'static str,
    /// Name of the identifier variable in `secondary_query`.
    pub id_variable: &'static str,
    /// Path from a primary node to its child identifiers. Arrays met along
    /// the way are flattened.
    pub id_path: &'static [&'static str],
    /// Member of the secondary response `data` holding the record.
    pub secondary_key: &'static str,
    /// Member added to each primary node with its matched records.
    pub merge_key: &'static str,
}

impl DependentTemplate {
    /// Variables for the secondary query of `id`.
    #[must_use]
    pub fn variables(&self, id: &str) -> Value {
        let mut variables = serde_json::Map::new();
        variables.insert(self.id_variable.to_string(), Value::String(id.to_string()));
        Value::Object(variables)
    }
}

const PRODUCTS: &str = r"query Products($first: Int!, $after: String) {
  products(first: $first, after: $after) {
    pageInfo { hasNextPage endCursor }
    edges {
      node {
        id
        title
        handle
        status
        vendor
        productType
        tags
        totalInventory
        createdAt
        updatedAt
      }
    }
  }
}
";

const ORDERS: &str = r"query Orders($first: Int!, $after: String) {
  orders(first: $first, after: $after) {
    pageInfo { hasNextPage endCursor }
    edges {
      node {
        id
        name
        email
        createdAt
        displayFinancialStatus
        displayFulfillmentStatus
        currencyCode
        totalPriceSet { shopMoney { amount currencyCode } }
        customer { id displayName }
      }
    }
  }
}
";

const CUSTOMERS: &str = r"query Customers($first: Int!, $after: String) {
  customers(first: $first, after: $after) {
    pageInfo { hasNextPage endCursor }
    edges {
      node {
        id
        firstName
        lastName
        email
        phone
        state
        numberOfOrders
        amountSpent { amount currencyCode }
        tags
        createdAt
        updatedAt
      }
    }
  }
}
";

const COLLECTIONS: &str = r"query Collections($first: Int!, $after: String) {
  collections(first: $first, after: $after) {
    pageInfo { hasNextPage endCursor }
    edges {
      node {
        id
        title
        handle
        sortOrder
        updatedAt
        productsCount { count }
      }
    }
  }
}
";

const INVENTORY_ITEMS: &str = r"query InventoryItems($first: Int!, $after: String) {
  inventoryItems(first: $first, after: $after) {
    pageInfo { hasNextPage endCursor }
    edges {
      node {
        id
        sku
        tracked
        requiresShipping
        unitCost { amount currencyCode }
        createdAt
        updatedAt
      }
    }
  }
}
";

const LOCATIONS: &str = r"query Locations($first: Int!, $after: String) {
  locations(first: $first, after: $after) {
    pageInfo { hasNextPage endCursor }
    edges {
      node {
        id
        name
        isActive
        fulfillsOnlineOrders
        address { address1 address2 city province country zip }
      }
    }
  }
}
";

const DRAFT_ORDERS: &str = r"query DraftOrders($first: Int!, $after: String) {
  draftOrders(first: $first, after: $after) {
    pageInfo { hasNextPage endCursor }
    edges {
      node {
        id
        name
        status
        email
        createdAt
        updatedAt
        totalPriceSet { shopMoney { amount currencyCode } }
        customer { id displayName }
      }
    }
  }
}
";

const PRODUCTS_WITH_VARIANT_IDS: &str = r"query ProductsWithVariants($first: Int!, $after: String) {
  products(first: $first, after: $after) {
    pageInfo { hasNextPage endCursor }
    edges {
      node {
        id
        title
        handle
        status
        variants(first: 50) { edges { node { id } } }
      }
    }
  }
}
";

const VARIANT_DETAIL: &str = r"query ProductVariantDetail($id: ID!) {
  productVariant(id: $id) {
    id
    title
    sku
    barcode
    price
    compareAtPrice
    inventoryQuantity
    availableForSale
    selectedOptions { name value }
    inventoryItem { id tracked }
  }
}
";

const ORDERS_WITH_TRANSACTION_IDS: &str = r"query OrdersWithTransactions($first: Int!, $after: String) {
  orders(first: $first, after: $after) {
    pageInfo { hasNextPage endCursor }
    edges {
      node {
        id
        name
        createdAt
        displayFinancialStatus
        transactions(first: 20) { id }
      }
    }
  }
}
";

const TRANSACTION_DETAIL: &str = r"query OrderTransactionDetail($id: ID!) {
  node(id: $id) {
    ... on OrderTransaction {
      id
      kind
      status
      gateway
      errorCode
      processedAt
      amountSet { shopMoney { amount currencyCode } }
    }
  }
}
";

const CUSTOMERS_WITH_ORDER_IDS: &str = r"query CustomersWithOrders($first: Int!, $after: String) {
  customers(first: $first, after: $after) {
    pageInfo { hasNextPage endCursor }
    edges {
      node {
        id
        firstName
        lastName
        email
        orders(first: 20) { edges { node { id } } }
      }
    }
  }
}
";

const ORDER_DETAIL: &str = r"query OrderDetail($id: ID!) {
  order(id: $id) {
    id
    name
    createdAt
    displayFinancialStatus
    displayFulfillmentStatus
    totalPriceSet { shopMoney { amount currencyCode } }
    lineItems(first: 20) { edges { node { id title quantity sku } } }
  }
}
";

/// Every predefined template.
pub static TEMPLATES: &[QueryTemplate] = &[
    QueryTemplate {
        id: "products",
        label: "Products",
        resource: "products",
        query: PRODUCTS,
        fields: &[
            "ID",
            "Title",
            "Handle",
            "Status",
            "Vendor",
            "Product Type",
            "Tags",
            "Total Inventory",
            "Created At",
            "Updated At",
        ],
        dependent: None,
    },
    QueryTemplate {
        id: "orders",
        label: "Orders",
        resource: "orders",
        query: ORDERS,
        fields: &[
            "ID",
            "Name",
            "Email",
            "Created At",
            "Financial Status",
            "Fulfillment Status",
            "Currency",
            "Total Price",
            "Customer",
        ],
        dependent: None,
    },
    QueryTemplate {
        id: "customers",
        label: "Customers",
        resource: "customers",
        query: CUSTOMERS,
        fields: &[
            "ID",
            "First Name",
            "Last Name",
            "Email",
            "Phone",
            "State",
            "Orders",
            "Amount Spent",
            "Tags",
            "Created At",
            "Updated At",
        ],
        dependent: None,
    },
    QueryTemplate {
        id: "collections",
        label: "Collections",
        resource: "collections",
        query: COLLECTIONS,
        fields: &["ID", "Title", "Handle", "Sort Order", "Updated At", "Products"],
        dependent: None,
    },
    QueryTemplate {
        id: "inventory_items",
        label: "Inventory Items",
        resource: "inventoryItems",
        query: INVENTORY_ITEMS,
        fields: &[
            "ID",
            "SKU",
            "Tracked",
            "Requires Shipping",
            "Unit Cost",
            "Created At",
            "Updated At",
        ],
        dependent: None,
    },
    QueryTemplate {
        id: "locations",
        label: "Locations",
        resource: "locations",
        query: LOCATIONS,
        fields: &["ID", "Name", "Active", "Fulfills Online Orders", "Address"],
        dependent: None,
    },
    QueryTemplate {
        id: "draft_orders",
        label: "Draft Orders",
        resource: "draftOrders",
        query: DRAFT_ORDERS,
        fields: &[
            "ID",
            "Name",
            "Status",
            "Email",
            "Created At",
            "Updated At",
            "Total Price",
            "Customer",
        ],
        dependent: None,
    },
    QueryTemplate {
        id: "products_with_variants",
        label: "Products with Variant Details",
        resource: "products",
        query: PRODUCTS_WITH_VARIANT_IDS,
        fields: &["ID", "Title", "Handle", "Status", "Variants", "Variant Details"],
        dependent: Some(DependentTemplate {
            secondary_query: VARIANT_DETAIL,
            id_variable: "id",
            id_path: &["variants", "edges", "node", "id"],
            secondary_key: "productVariant",
            merge_key: "detailedVariants",
        }),
    },
    QueryTemplate {
        id: "orders_with_transactions",
        label: "Orders with Transaction Details",
        resource: "orders",
        query: ORDERS_WITH_TRANSACTION_IDS,
        fields: &[
            "ID",
            "Name",
            "Created At",
            "Financial Status",
            "Transactions",
            "Transaction Details",
        ],
        dependent: Some(DependentTemplate {
            secondary_query: TRANSACTION_DETAIL,
            id_variable: "id",
            id_path: &["transactions", "id"],
            secondary_key: "node",
            merge_key: "detailedTransactions",
        }),
    },
    QueryTemplate {
        id: "customers_with_orders",
        label: "Customers with Order Details",
        resource: "customers",
        query: CUSTOMERS_WITH_ORDER_IDS,
        fields: &[
            "ID",
            "First Name",
            "Last Name",
            "Email",
            "Orders",
            "Order Details",
        ],
        dependent: Some(DependentTemplate {
            secondary_query: ORDER_DETAIL,
            id_variable: "id",
            id_path: &["orders", "edges", "node", "id"],
            secondary_key: "order",
            merge_key: "detailedOrders",
        }),
    },
];

/// Looks up a template by id.
#[must_use]
pub fn find_template(id: &str) -> Option<&'static QueryTemplate> {
    TEMPLATES.iter().find(|t| t.id == id)
}

/// Collects the strings found at `path` below `value`, flattening arrays.
#[must_use]
pub fn values_at_path(value: &Value, path: &[&str]) -> Vec<String> {
    let mut found = Vec::new();
    collect_at_path(value, path, &mut found);
    found
}

fn collect_at_path(value: &Value, path: &[&str], found: &mut Vec<String>) {
    if let Value::Array(items) = value {
        for item in items {
            collect_at_path(item, path, found);
        }
        return;
    }
    match path.split_first() {
        None => {
            if let Some(s) = value.as_str() {
                found.push(s.to_string());
            }
        }
        Some((key, rest)) => {
            if let Some(child) = value.get(*key) {
                collect_at_path(child, rest, found);
            }
        }
    }
}

/// Identifiers found at `path` in each record, in record order.
#[must_use]
pub fn extract_ids(records: &[Value], path: &[&str]) -> Vec<String> {
    records
        .iter()
        .flat_map(|record| values_at_path(record, path))
        .collect()
}

/// Adds `merge_key` to every object record: the details whose identifier is
/// found at `path` in that record, in the record's own identifier order.
///
/// Records without matches get an empty array.
#[must_use]
pub fn join_by_id(
    records: Vec<Value>,
    details: impl IntoIterator<Item = (String, Value)>,
    path: &[&str],
    merge_key: &str,
) -> Vec<Value> {
    let by_id: HashMap<String, Value> = details.into_iter().collect();

    records
        .into_iter()
        .map(|mut record| {
            let matched: Vec<Value> = values_at_path(&record, path)
                .iter()
                .filter_map(|id| by_id.get(id).cloned())
                .collect();
            if let Value::Object(map) = &mut record {
                map.insert(merge_key.to_string(), Value::Array(matched));
            }
            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use apollo_parser::Parser;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_template_ids_are_unique() {
        let ids: HashSet<_> = TEMPLATES.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), TEMPLATES.len());
    }

    #[test]
    fn test_every_template_query_parses_and_paginates() {
        for template in TEMPLATES {
            let tree = Parser::new(template.query).parse();
            assert_eq!(tree.errors().count(), 0, "{} does not parse", template.id);
            assert!(template.query.contains("$first: Int!"), "{}", template.id);
            assert!(template.query.contains("$after: String"), "{}", template.id);
            assert!(
                template
                    .query
                    .contains(&format!("{}(first: $first, after: $after)", template.resource)),
                "{}",
                template.id
            );

            if let Some(dependent) = template.dependent {
                let tree = Parser::new(dependent.secondary_query).parse();
                assert_eq!(tree.errors().count(), 0, "{} secondary", template.id);
                assert!(dependent
                    .secondary_query
                    .contains(&format!("${}: ID!", dependent.id_variable)));
                assert!(template.query.contains(dependent.id_path[0]));
            }
        }
    }

    #[test]
    fn test_find_template() {
        let template = find_template("products_with_variants").unwrap();
        assert!(template.is_dependent());
        assert_eq!(template.dependent.unwrap().merge_key, "detailedVariants");
        assert!(!find_template("products").unwrap().is_dependent());
        assert!(find_template("widgets").is_none());
    }

    #[test]
    fn test_extract_ids_flattens_connections_and_lists() {
        let products = vec![
            json!({"id": "p1", "variants": {"edges": [
                {"node": {"id": "v1"}}, {"node": {"id": "v2"}}
            ]}}),
            json!({"id": "p2", "variants": {"edges": []}}),
            json!({"id": "p3"}),
        ];
        assert_eq!(
            extract_ids(&products, &["variants", "edges", "node", "id"]),
            vec!["v1", "v2"]
        );

        let orders = vec![json!({"transactions": [{"id": "t1"}, {"id": "t2"}]})];
        assert_eq!(extract_ids(&orders, &["transactions", "id"]), vec!["t1", "t2"]);
    }

    #[test]
    fn test_join_by_id_enriches_and_defaults_to_empty() {
        let products = vec![
            json!({"id": "p1", "variants": {"edges": [{"node": {"id": "v1"}}, {"node": {"id": "v2"}}]}}),
            json!({"id": "p2", "variants": {"edges": [{"node": {"id": "v3"}}]}}),
        ];
        let details = vec![
            ("v2".to_string(), json!({"id": "v2", "sku": "B"})),
            ("v1".to_string(), json!({"id": "v1", "sku": "A"})),
        ];

        let merged = join_by_id(
            products,
            details,
            &["variants", "edges", "node", "id"],
            "detailedVariants",
        );

        assert_eq!(merged[0]["detailedVariants"], json!([{"id": "v1", "sku": "A"}, {"id": "v2", "sku": "B"}]));
        assert_eq!(merged[1]["detailedVariants"], json!([]));
        assert_eq!(merged[0]["id"], "p1");
    }

    #[test]
    fn test_dependent_variables_use_declared_name() {
        let dependent = find_template("orders_with_transactions")
            .unwrap()
            .dependent
            .unwrap();
        assert_eq!(
            dependent.variables("gid://shopify/OrderTransaction/1"),
            json!({"id": "gid://shopify/OrderTransaction/1"})
        );
    }
}
