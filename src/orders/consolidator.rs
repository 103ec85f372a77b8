//! Order consolidation — folds raw orders sharing a PO number into one.

use std::collections::HashMap;

use crate::orders::model::{OrderRecord, pad_zip_code};

/// Merge raw orders by PO number, in a single pass over `raw`.
///
/// - The first record seen for a PO number keeps its ship-to and order date.
/// - Later records with that PO number contribute only their line items,
///   appended in the order they were read.
/// - The zip code of each first-seen record is padded to five digits.
///
/// The accumulator is a plain `Vec` addressed by index; the map only
/// remembers where each PO number landed.
pub fn consolidate(raw: Vec<OrderRecord>) -> Vec<OrderRecord> {
    let mut orders: Vec<OrderRecord> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for mut next in raw {
        match index.get(&next.po_number).copied() {
            Some(slot) => orders[slot].items.append(&mut next.items),
            None => {
                next.ship_to.zip_code = pad_zip_code(&next.ship_to.zip_code);
                index.insert(next.po_number.clone(), orders.len());
                orders.push(next);
            }
        }
    }

    orders
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::orders::model::{LineItem, ShipTo};

    fn order(po: &str, name: &str, zip: &str, model: &str) -> OrderRecord {
        OrderRecord {
            po_number: po.into(),
            order_date: "2024-03-01".into(),
            ship_to: ShipTo {
                name: name.into(),
                zip_code: zip.into(),
                ..Default::default()
            },
            items: vec![LineItem {
                quantity: "1".into(),
                model: model.into(),
                description: format!("Widget {model}"),
                cost: "1.00".into(),
            }],
        }
    }

    fn models(order: &OrderRecord) -> Vec<&str> {
        order.items.iter().map(|i| i.model.as_str()).collect()
    }

    #[test]
    fn merges_duplicate_po_numbers() {
        let merged = consolidate(vec![
            order("PO1", "Jane", "1234", "A"),
            order("PO1", "Jane", "1234", "B"),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].po_number, "PO1");
        assert_eq!(models(&merged[0]), ["A", "B"]);
        assert_eq!(merged[0].ship_to.zip_code, "01234");
    }

    #[test]
    fn first_seen_ship_to_wins() {
        let mut second = order("PO1", "John", "99999", "B");
        second.order_date = "2030-01-01".into();
        let merged = consolidate(vec![order("PO1", "Jane", "07001", "A"), second]);
        assert_eq!(merged[0].ship_to.name, "Jane");
        assert_eq!(merged[0].ship_to.zip_code, "07001");
        assert_eq!(merged[0].order_date, "2024-03-01");
    }

    #[test]
    fn interleaved_orders_keep_first_appearance_order() {
        let merged = consolidate(vec![
            order("PO2", "B", "1", "x1"),
            order("PO1", "A", "2", "y1"),
            order("PO2", "B", "1", "x2"),
            order("PO3", "C", "3", "z1"),
            order("PO1", "A", "2", "y2"),
            order("PO2", "B", "1", "x3"),
        ]);
        let pos: Vec<&str> = merged.iter().map(|o| o.po_number.as_str()).collect();
        assert_eq!(pos, ["PO2", "PO1", "PO3"]);
        assert_eq!(models(&merged[0]), ["x1", "x2", "x3"]);
        assert_eq!(models(&merged[1]), ["y1", "y2"]);
        assert_eq!(models(&merged[2]), ["z1"]);
    }

    #[test]
    fn identical_items_are_preserved() {
        let merged = consolidate(vec![
            order("PO1", "Jane", "1", "A"),
            order("PO1", "Jane", "1", "A"),
        ]);
        assert_eq!(merged[0].items.len(), 2);
        assert_eq!(merged[0].items[0], merged[0].items[1]);
    }

    #[test]
    fn items_are_conserved_and_po_numbers_unique() {
        let raw: Vec<OrderRecord> = (0..40)
            .map(|i| order(&format!("PO{}", i % 7), "n", &format!("{i}"), &format!("m{i}")))
            .collect();
        let input_items = OrderRecord::item_count(&raw);

        let merged = consolidate(raw);
        let unique: HashSet<&str> = merged.iter().map(|o| o.po_number.as_str()).collect();
        assert_eq!(unique.len(), merged.len());
        assert_eq!(merged.len(), 7);
        assert_eq!(OrderRecord::item_count(&merged), input_items);
        assert!(merged.iter().all(|o| o.ship_to.zip_code.len() >= 5));
    }

    #[test]
    fn parsed_rows_with_padded_fields_merge() {
        use crate::orders::parser::{HeaderMap, parse};

        let raw = "h\n\
PO1, 1, A,Widget A,Jane,Acme,1 Main,,Newark,NJ, 1234,UPS,1.00,2024-03-01,555\n\
\x20PO1 ,2,B,Widget B,John,Other,2 Side,,Trenton,NJ,99999,FedEx,2.00,2024-03-02,556\n";
        let orders = consolidate(parse(raw.as_bytes(), &HeaderMap::purchase_order()).unwrap());

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].ship_to.zip_code, "01234");
        assert_eq!(models(&orders[0]), ["A", "B"]);
    }

    #[test]
    fn five_digit_zip_unchanged() {
        let merged = consolidate(vec![order("PO1", "Jane", "90210", "A")]);
        assert_eq!(merged[0].ship_to.zip_code, "90210");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(consolidate(Vec::new()).is_empty());
    }
}
