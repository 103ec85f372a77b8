//! CSV-to-order parsing.
//!
//! The payload's own header row is discarded and replaced positionally by a
//! [`HeaderMap`] of dotted field paths. Each data row is expanded into a
//! nested JSON value along those paths (numeric segments become array
//! indices) and deserialized into a raw [`OrderRecord`] with one line item.

use csv::{ReaderBuilder, Trim};
use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::orders::model::OrderRecord;

/// Column paths of the purchase-order export, in column order.
pub const PURCHASE_ORDER_HEADERS: [&str; 15] = [
    "poNumber",
    "items.0.quantity",
    "items.0.model",
    "items.0.description",
    "shipTo.name",
    "shipTo.company",
    "shipTo.address1",
    "shipTo.address2",
    "shipTo.city",
    "shipTo.stateCode",
    "shipTo.zipCode",
    "shipTo.shippingMethodCode",
    "items.0.cost",
    "orderDate",
    "shipTo.phone",
];

/// Ordered column-index → field-path mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMap {
    paths: Vec<String>,
}

impl HeaderMap {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// The fixed purchase-order column layout.
    pub fn purchase_order() -> Self {
        Self::new(PURCHASE_ORDER_HEADERS)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}

impl Default for HeaderMap {
    fn default() -> Self {
        Self::purchase_order()
    }
}

/// Parse a CSV payload into raw orders, one per data row, in file order.
///
/// Fails as a whole on the first bad row; a partial order list is never
/// returned.
pub fn parse(raw: &[u8], headers: &HeaderMap) -> Result<Vec<OrderRecord>, ParseError> {
    let text = std::str::from_utf8(raw)?;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut orders = Vec::new();
    // Row numbers are 1-based over data rows; row 0 is the discarded header.
    for (row, record) in reader.records().enumerate().skip(1) {
        let record = record?;
        if record.len() != headers.len() {
            return Err(ParseError::RowShapeMismatch {
                row,
                expected: headers.len(),
                found: record.len(),
            });
        }

        let mut root = Value::Object(Map::new());
        for (path, field) in headers.paths().zip(record.iter()) {
            insert_path(&mut root, path, field)?;
        }

        let order = serde_json::from_value::<OrderRecord>(root).map_err(|e| {
            ParseError::InvalidRecord {
                row,
                reason: e.to_string(),
            }
        })?;
        orders.push(order);
    }

    Ok(orders)
}

/// Set `value` at a dotted `path` inside `root`, creating objects and
/// arrays along the way.
fn insert_path(root: &mut Value, path: &str, value: &str) -> Result<(), ParseError> {
    let conflict = || ParseError::InvalidHeaderPath {
        path: path.to_string(),
    };

    let segments: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return Err(conflict());
    };

    let mut node = root;
    for (i, segment) in parents.iter().enumerate() {
        // The container kind is decided by the segment that indexes into it.
        let child_is_array = segments[i + 1].parse::<usize>().is_ok();
        let empty = || {
            if child_is_array {
                Value::Array(Vec::new())
            } else {
                Value::Object(Map::new())
            }
        };
        node = child_mut(node, segment, empty).ok_or_else(conflict)?;
    }

    let slot = child_mut(node, last, || Value::Null).ok_or_else(conflict)?;
    if !slot.is_null() {
        return Err(conflict());
    }
    *slot = Value::String(value.to_string());
    Ok(())
}

/// Descend one segment, creating the child with `empty` if absent.
///
/// Returns `None` when the segment does not fit the existing container:
/// an index into an object, a key into an array, or any step into a string.
fn child_mut<'a>(
    node: &'a mut Value,
    segment: &str,
    empty: impl FnOnce() -> Value,
) -> Option<&'a mut Value> {
    match node {
        Value::Object(map) => {
            if segment.parse::<usize>().is_ok() {
                return None;
            }
            Some(map.entry(segment.to_string()).or_insert_with(empty))
        }
        Value::Array(items) => {
            let index = segment.parse::<usize>().ok()?;
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            let child = &mut items[index];
            if child.is_null() {
                *child = empty();
            }
            Some(child)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "PO,Qty,Model,Desc,Name,Company,Addr1,Addr2,City,State,Zip,Ship,Cost,Date,Phone";

    fn row(po: &str, model: &str, zip: &str) -> String {
        format!(
            "{po},2,{model},Widget {model},Jane Doe,Acme,1 Main St,,Newark,NJ,{zip},UPS,9.99,2024-03-01,555-0100"
        )
    }

    fn payload(rows: &[String]) -> Vec<u8> {
        let mut text = String::from(HEADER);
        for r in rows {
            text.push('\n');
            text.push_str(r);
        }
        text.push('\n');
        text.into_bytes()
    }

    #[test]
    fn parses_rows_into_nested_orders() {
        let raw = payload(&[row("PO1", "A", "1234")]);
        let orders = parse(&raw, &HeaderMap::purchase_order()).unwrap();

        assert_eq!(orders.len(), 1);
        let order = &orders[0];
        assert_eq!(order.po_number, "PO1");
        assert_eq!(order.order_date, "2024-03-01");
        assert_eq!(order.ship_to.name, "Jane Doe");
        assert_eq!(order.ship_to.company, "Acme");
        assert_eq!(order.ship_to.address2, "");
        assert_eq!(order.ship_to.state_code, "NJ");
        assert_eq!(order.ship_to.zip_code, "1234");
        assert_eq!(order.ship_to.shipping_method_code, "UPS");
        assert_eq!(order.ship_to.phone, "555-0100");
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, "2");
        assert_eq!(order.items[0].model, "A");
        assert_eq!(order.items[0].description, "Widget A");
        assert_eq!(order.items[0].cost, "9.99");
    }

    #[test]
    fn parser_does_not_pad_zip_codes() {
        let raw = payload(&[row("PO1", "A", "123")]);
        let orders = parse(&raw, &HeaderMap::purchase_order()).unwrap();
        assert_eq!(orders[0].ship_to.zip_code, "123");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let raw = payload(&[row(" PO1 ", " A", " 1234 ")]);
        let orders = parse(&raw, &HeaderMap::purchase_order()).unwrap();
        assert_eq!(orders[0].po_number, "PO1");
        assert_eq!(orders[0].items[0].model, "A");
        assert_eq!(orders[0].items[0].description, "Widget  A");
        assert_eq!(orders[0].ship_to.zip_code, "1234");
    }

    #[test]
    fn own_header_text_is_ignored() {
        let mut raw = b"completely,different,header\n".to_vec();
        raw.extend_from_slice(row("PO9", "Z", "07001").as_bytes());
        let orders = parse(&raw, &HeaderMap::purchase_order()).unwrap();
        assert_eq!(orders[0].po_number, "PO9");
    }

    #[test]
    fn rows_keep_file_order() {
        let raw = payload(&[row("PO2", "B", "1"), row("PO1", "A", "2"), row("PO2", "C", "3")]);
        let orders = parse(&raw, &HeaderMap::purchase_order()).unwrap();
        let models: Vec<&str> = orders.iter().map(|o| o.items[0].model.as_str()).collect();
        assert_eq!(models, ["B", "A", "C"]);
    }

    #[test]
    fn quoted_fields_with_commas() {
        let line = "PO1,1,A,\"Widget, large\",Jane,Acme,1 Main,,Newark,NJ,07001,UPS,1.00,2024-03-01,555";
        let raw = payload(&[line.to_string()]);
        let orders = parse(&raw, &HeaderMap::purchase_order()).unwrap();
        assert_eq!(orders[0].items[0].description, "Widget, large");
    }

    #[test]
    fn header_only_yields_empty() {
        let raw = format!("{HEADER}\n").into_bytes();
        assert!(parse(&raw, &HeaderMap::purchase_order()).unwrap().is_empty());
    }

    #[test]
    fn empty_payload_yields_empty() {
        assert!(parse(b"", &HeaderMap::purchase_order()).unwrap().is_empty());
    }

    #[test]
    fn short_row_fails_whole_parse() {
        let raw = payload(&[row("PO1", "A", "1"), "PO2,1,B".to_string()]);
        let err = parse(&raw, &HeaderMap::purchase_order()).unwrap_err();
        match err {
            ParseError::RowShapeMismatch {
                row,
                expected,
                found,
            } => {
                assert_eq!(row, 2);
                assert_eq!(expected, 15);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn long_row_fails() {
        let raw = payload(&[format!("{},extra", row("PO1", "A", "1"))]);
        let err = parse(&raw, &HeaderMap::purchase_order()).unwrap_err();
        assert!(matches!(err, ParseError::RowShapeMismatch { found: 16, .. }));
    }

    #[test]
    fn invalid_utf8_fails_with_encoding_error() {
        let mut raw = payload(&[row("PO1", "A", "1")]);
        raw.push(0xff);
        let err = parse(&raw, &HeaderMap::purchase_order()).unwrap_err();
        assert!(matches!(err, ParseError::Encoding(_)));
    }

    #[test]
    fn custom_header_map() {
        let headers = HeaderMap::new(["shipTo.zipCode", "poNumber", "items.0.model"]);
        let raw = b"z,p,m\n501,PO7,X\n";
        let orders = parse(raw, &headers).unwrap();
        assert_eq!(orders[0].po_number, "PO7");
        assert_eq!(orders[0].ship_to.zip_code, "501");
        assert_eq!(orders[0].items[0].model, "X");
        assert_eq!(orders[0].order_date, "");
    }

    #[test]
    fn header_map_without_po_number_is_invalid_record() {
        let headers = HeaderMap::new(["orderDate"]);
        let err = parse(b"d\n2024-01-01\n", &headers).unwrap_err();
        assert!(matches!(err, ParseError::InvalidRecord { row: 1, .. }));
    }

    #[test]
    fn conflicting_header_paths_are_rejected() {
        let headers = HeaderMap::new(["poNumber", "poNumber.suffix"]);
        let err = parse(b"a,b\nPO1,x\n", &headers).unwrap_err();
        assert!(matches!(err, ParseError::InvalidHeaderPath { .. }));

        let headers = HeaderMap::new(["poNumber", "poNumber"]);
        let err = parse(b"a,b\nPO1,PO2\n", &headers).unwrap_err();
        assert!(matches!(err, ParseError::InvalidHeaderPath { .. }));
    }

    #[test]
    fn insert_path_builds_arrays_for_numeric_segments() {
        let mut root = Value::Object(Map::new());
        insert_path(&mut root, "items.0.model", "A").unwrap();
        insert_path(&mut root, "items.0.cost", "1").unwrap();
        insert_path(&mut root, "shipTo.name", "Jane").unwrap();
        assert_eq!(
            root,
            serde_json::json!({
                "items": [{ "model": "A", "cost": "1" }],
                "shipTo": { "name": "Jane" },
            })
        );
    }

    #[test]
    fn default_header_map_has_fifteen_columns() {
        let headers = HeaderMap::default();
        assert_eq!(headers.len(), 15);
        assert_eq!(headers.paths().next(), Some("poNumber"));
        assert_eq!(headers.paths().last(), Some("shipTo.phone"));
    }
}
