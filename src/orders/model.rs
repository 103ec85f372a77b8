//! Purchase-order data model — orders, ship-to addresses, line items.

use serde::{Deserialize, Serialize};

/// Width every output zip code is padded to.
pub const ZIP_CODE_WIDTH: usize = 5;

/// A purchase order, either raw (one CSV row) or consolidated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    /// Identity key. Records with equal PO numbers are the same order.
    pub po_number: String,
    #[serde(default)]
    pub order_date: String,
    /// Shipping destination. First record seen for a PO number wins.
    #[serde(default)]
    pub ship_to: ShipTo,
    /// Line items in the order their source rows were read.
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl OrderRecord {
    /// Total number of line items across a set of orders.
    pub fn item_count(orders: &[OrderRecord]) -> usize {
        orders.iter().map(|o| o.items.len()).sum()
    }
}

/// Shipping destination for a purchase order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShipTo {
    pub name: String,
    pub company: String,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub state_code: String,
    pub zip_code: String,
    pub shipping_method_code: String,
    pub phone: String,
}

/// One purchased entry within a purchase order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItem {
    pub quantity: String,
    pub model: String,
    pub description: String,
    pub cost: String,
}

/// Left-pad a zip code with `'0'` to [`ZIP_CODE_WIDTH`] characters.
///
/// Spreadsheet exports drop leading zeros from numeric-looking postal
/// codes; values already at full width are returned unchanged.
pub fn pad_zip_code(zip: &str) -> String {
    format!("{zip:0>width$}", width = ZIP_CODE_WIDTH)
}
