//! Category → item roll-up behind every summary table
//!
//! Groups and items keep the order in which they were first seen. Nothing
//! here sorts; callers that want alphabetical categories use
//! [`Aggregation::sorted_by_group`] on the result.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::LineItem;

/// Group key used for lines without a category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Running sums for one item
///
/// `price` is the sum of the captured prices, not an average. Printed
/// summaries have always shown it that way.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemTotals {
    pub quantity: f64,
    pub grams: f64,
    pub price: f64,
    pub amount: f64,
}

impl ItemTotals {
    fn add(&mut self, line: &LineItem) {
        self.quantity += line.quantity.value();
        self.grams += line.grams.value();
        self.price += line.price.value();
        self.amount += line.amount.value();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedItem {
    pub item_key: String,
    #[serde(flatten)]
    pub totals: ItemTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedGroup {
    pub group_key: String,
    pub items: Vec<AggregatedItem>,
    pub subtotal: f64,
}

impl AggregatedGroup {
    pub fn item(&self, item_key: &str) -> Option<&ItemTotals> {
        self.items
            .iter()
            .find(|i| i.item_key == item_key)
            .map(|i| &i.totals)
    }
}

/// Result of aggregating a list of line items
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregation {
    pub groups: Vec<AggregatedGroup>,
    pub grand_total: f64,
}

impl Aggregation {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group(&self, group_key: &str) -> Option<&AggregatedGroup> {
        self.groups.iter().find(|g| g.group_key == group_key)
    }

    pub fn item(&self, group_key: &str, item_key: &str) -> Option<&ItemTotals> {
        self.group(group_key).and_then(|g| g.item(item_key))
    }

    /// Same result with groups in alphabetical order; item order is kept
    pub fn sorted_by_group(mut self) -> Self {
        self.groups.sort_by(|a, b| a.group_key.cmp(&b.group_key));
        self
    }
}

struct GroupAccumulator {
    key: String,
    items: Vec<(String, ItemTotals)>,
    positions: HashMap<String, usize>,
}

impl GroupAccumulator {
    fn new(key: String) -> Self {
        Self {
            key,
            items: Vec::new(),
            positions: HashMap::new(),
        }
    }

    fn add(&mut self, line: &LineItem) {
        let position = match self.positions.get(&line.item) {
            Some(&position) => position,
            None => {
                self.items.push((line.item.clone(), ItemTotals::default()));
                self.positions.insert(line.item.clone(), self.items.len() - 1);
                self.items.len() - 1
            }
        };
        self.items[position].1.add(line);
    }

    fn finish(self) -> AggregatedGroup {
        let subtotal = self
            .items
            .iter()
            .fold(0.0, |acc, (_, totals)| acc + totals.amount);
        AggregatedGroup {
            group_key: self.key,
            items: self
                .items
                .into_iter()
                .map(|(item_key, totals)| AggregatedItem { item_key, totals })
                .collect(),
            subtotal,
        }
    }
}

/// Incremental aggregator, for callers that collect lines from several sources
#[derive(Default)]
pub struct Aggregator {
    groups: Vec<GroupAccumulator>,
    positions: HashMap<String, usize>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: &LineItem) {
        let key = group_key(line);
        let position = match self.positions.get(key) {
            Some(&position) => position,
            None => {
                self.groups.push(GroupAccumulator::new(key.to_string()));
                self.positions.insert(key.to_string(), self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        self.groups[position].add(line);
    }

    pub fn extend<I, L>(&mut self, lines: I)
    where
        I: IntoIterator<Item = L>,
        L: AsRef<LineItem>,
    {
        for line in lines {
            self.push(line.as_ref());
        }
    }

    pub fn finish(self) -> Aggregation {
        let groups: Vec<AggregatedGroup> = self
            .groups
            .into_iter()
            .map(GroupAccumulator::finish)
            .collect();
        let grand_total = groups.iter().fold(0.0, |acc, g| acc + g.subtotal);

        Aggregation {
            groups,
            grand_total,
        }
    }
}

fn group_key(line: &LineItem) -> &str {
    if line.category.trim().is_empty() {
        UNCATEGORIZED
    } else {
        &line.category
    }
}

/// Aggregate line items (or entries) in one pass
pub fn aggregate<I, L>(lines: I) -> Aggregation
where
    I: IntoIterator<Item = L>,
    L: AsRef<LineItem>,
{
    let mut aggregator = Aggregator::new();
    aggregator.extend(lines);
    aggregator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawNumber;

    fn line(category: &str, item: &str, amount: f64) -> LineItem {
        LineItem::new(category, item).with_amount(amount)
    }

    #[test]
    fn test_repeated_item_amounts_are_summed() {
        let result = aggregate(&[line("Produce", "Onion", 100.0), line("Produce", "Onion", 50.0)]);

        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.item("Produce", "Onion").unwrap().amount, 150.0);
        assert_eq!(result.group("Produce").unwrap().subtotal, 150.0);
        assert_eq!(result.grand_total, 150.0);
    }

    #[test]
    fn test_price_is_summed_not_averaged() {
        let result = aggregate(&[
            line("Dry", "Flour", 0.0).with_price(45.0),
            line("Dry", "Flour", 0.0).with_price(55.0),
        ]);
        assert_eq!(result.item("Dry", "Flour").unwrap().price, 100.0);
    }

    #[test]
    fn test_first_seen_order_is_kept() {
        let result = aggregate(&[
            line("Produce", "Tomato", 1.0),
            line("Dairy", "Milk", 1.0),
            line("Produce", "Garlic", 1.0),
            line("Produce", "Tomato", 1.0),
        ]);

        let groups: Vec<_> = result.groups.iter().map(|g| g.group_key.as_str()).collect();
        assert_eq!(groups, ["Produce", "Dairy"]);

        let items: Vec<_> = result.groups[0].items.iter().map(|i| i.item_key.as_str()).collect();
        assert_eq!(items, ["Tomato", "Garlic"]);
    }

    #[test]
    fn test_sorted_by_group_is_caller_side() {
        let result = aggregate(&[line("Produce", "Tomato", 1.0), line("Dairy", "Milk", 1.0)]);
        let sorted = result.clone().sorted_by_group();

        assert_eq!(result.groups[0].group_key, "Produce");
        assert_eq!(sorted.groups[0].group_key, "Dairy");
        assert_eq!(sorted.grand_total, result.grand_total);
    }

    #[test]
    fn test_blank_category_is_uncategorized_and_empty_item_is_kept() {
        let result = aggregate(&[line("", "", 10.0), line("  ", "Ice", 5.0)]);

        let group = result.group(UNCATEGORIZED).unwrap();
        assert_eq!(group.items.len(), 2);
        assert_eq!(group.item("").unwrap().amount, 10.0);
        assert_eq!(group.subtotal, 15.0);
    }

    #[test]
    fn test_negative_values_are_not_clamped() {
        let result = aggregate(&[
            line("Bread", "Pandesal", 200.0).with_quantity(20.0, "pcs"),
            line("Bread", "Pandesal", -30.0).with_quantity(-3.0, "pcs"),
        ]);

        let totals = result.item("Bread", "Pandesal").unwrap();
        assert_eq!(totals.quantity, 17.0);
        assert_eq!(totals.amount, 170.0);
    }

    #[test]
    fn test_unparsable_numbers_count_as_zero() {
        let mut broken = LineItem::new("Produce", "Onion");
        broken.quantity = RawNumber::Text("two".to_string());
        broken.amount = RawNumber::Text("1,000".to_string());
        broken.grams = RawNumber::Missing;

        let result = aggregate(&[broken]);
        let totals = result.item("Produce", "Onion").unwrap();
        assert_eq!(totals.quantity, 0.0);
        assert_eq!(totals.grams, 0.0);
        assert_eq!(totals.amount, 1000.0);
    }

    #[test]
    fn test_empty_input() {
        let result = aggregate(Vec::<LineItem>::new());
        assert!(result.is_empty());
        assert_eq!(result.grand_total, 0.0);
        assert!(!result.grand_total.is_sign_negative());
        assert_eq!(
            serde_json::to_value(&result).unwrap()["grandTotal"].to_string(),
            "0.0"
        );
    }

    #[test]
    fn test_incremental_matches_one_pass() {
        let first = vec![line("A", "x", 1.0), line("B", "y", 2.0)];
        let second = vec![line("A", "x", 3.0)];

        let mut aggregator = Aggregator::new();
        aggregator.extend(&first);
        aggregator.extend(&second);

        let all: Vec<_> = first.iter().chain(&second).collect();
        assert_eq!(aggregator.finish(), aggregate(all));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(aggregate(&[line("Produce", "Onion", 150.0)])).unwrap();
        assert_eq!(json["grandTotal"], 150.0);
        assert_eq!(json["groups"][0]["groupKey"], "Produce");
        assert_eq!(json["groups"][0]["items"][0]["itemKey"], "Onion");
        assert_eq!(json["groups"][0]["items"][0]["amount"], 150.0);
    }
}
