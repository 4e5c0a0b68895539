//! Flat CSV export of nested JSON records.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

/// Renders records as CSV text.
///
/// Nested objects become dotted columns (`totalPriceSet.shopMoney.amount`),
/// arrays are written as JSON text, and `null` as an empty cell. Columns
/// appear in the order first seen across records; a record missing a column
/// gets an empty cell. Cells containing a comma, quote or line break are
/// quoted with inner quotes doubled.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use shopify_extract::store::flatten_records_to_csv;
///
/// let csv = flatten_records_to_csv(&[json!({"id": "1", "seo": {"title": "Hat, red"}})]);
/// assert_eq!(csv, "id,seo.title\n1,\"Hat, red\"\n");
/// ```
#[must_use]
pub fn flatten_records_to_csv(records: &[Value]) -> String {
    let rows: Vec<Vec<(String, String)>> = records
        .iter()
        .map(|record| {
            let mut cells = Vec::new();
            flatten_value(String::new(), record, &mut cells);
            cells
        })
        .collect();

    let mut columns: Vec<&str> = Vec::new();
    let mut seen = HashSet::new();
    for row in &rows {
        for (column, _) in row {
            if seen.insert(column.as_str()) {
                columns.push(column);
            }
        }
    }

    let mut out = columns
        .iter()
        .map(|c| escape(c))
        .collect::<Vec<_>>()
        .join(",");
    out.push('\n');

    for row in &rows {
        let cells: HashMap<&str, &str> = row
            .iter()
            .map(|(column, cell)| (column.as_str(), cell.as_str()))
            .collect();
        let line = columns
            .iter()
            .map(|column| escape(cells.get(column).copied().unwrap_or_default()))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn flatten_value(prefix: String, value: &Value, cells: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                let column = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_value(column, child, cells);
            }
        }
        _ => {
            let column = if prefix.is_empty() {
                "value".to_string()
            } else {
                prefix
            };
            cells.push((column, cell_text(value)));
        }
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
