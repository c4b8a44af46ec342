//! In-memory aggregation of one window's purchases.
//!
//! A single pass over the product-id sequence yields two mutually consistent
//! structures: per-product occurrence counts and per-shop sets of distinct
//! purchased products. Both are rebuilt from scratch every run; nothing is
//! cached across runs.

use std::collections::HashMap;

use crate::models::{Product, Shop};

/// One shop's slice of the aggregation: the shop row as read at resolution
/// time plus its distinct purchased products in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct ShopAggregate {
    pub shop: Shop,
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Aggregation {
    window_counts: HashMap<i32, i64>,
    shops: HashMap<i32, ShopAggregate>,
}

impl Aggregation {
    /// Builds the aggregation from the window's product-id sequence
    /// (duplicates preserved) and the resolved `(Product, Shop)` pairs.
    ///
    /// Pure function of its inputs: identical inputs produce identical
    /// structures. Ids absent from `resolved` are ignored entirely, so every
    /// counted product is guaranteed to sit in exactly one shop's set.
    pub fn build(product_ids: &[i32], resolved: &HashMap<i32, (Product, Shop)>) -> Self {
        let mut aggregation = Aggregation::default();

        for &product_id in product_ids {
            let Some((product, shop)) = resolved.get(&product_id) else {
                continue;
            };

            let count = aggregation.window_counts.entry(product_id).or_insert(0);
            *count += 1;

            // First occurrence: add the product to its shop's distinct set.
            if *count == 1 {
                aggregation
                    .shops
                    .entry(shop.id)
                    .or_insert_with(|| ShopAggregate {
                        shop: shop.clone(),
                        products: Vec::new(),
                    })
                    .products
                    .push(product.clone());
            }
        }

        aggregation
    }

    pub fn is_empty(&self) -> bool {
        self.shops.is_empty()
    }

    pub fn window_count(&self, product_id: i32) -> i64 {
        self.window_counts.get(&product_id).copied().unwrap_or(0)
    }

    pub fn shop_count(&self) -> usize {
        self.shops.len()
    }

    pub fn product_count(&self) -> usize {
        self.window_counts.len()
    }

    /// Splits the aggregation into the shared count map and the per-shop
    /// work items for the score updater.
    pub fn into_parts(self) -> (HashMap<i32, i64>, Vec<ShopAggregate>) {
        (
            self.window_counts,
            self.shops.into_values().collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trending::store::memory::{product, shop};
    use proptest::prelude::*;

    fn resolved_for(assignments: &[(i32, i32)]) -> HashMap<i32, (Product, Shop)> {
        assignments
            .iter()
            .map(|&(product_id, shop_id)| {
                (product_id, (product(product_id, shop_id, 0), shop(shop_id, 0)))
            })
            .collect()
    }

    #[test]
    fn counts_every_occurrence() {
        let resolved = resolved_for(&[(1, 100), (2, 100)]);
        let aggregation = Aggregation::build(&[1, 2, 1, 1], &resolved);

        assert_eq!(aggregation.window_count(1), 3);
        assert_eq!(aggregation.window_count(2), 1);
        assert_eq!(aggregation.window_count(3), 0);
    }

    #[test]
    fn product_joins_its_shop_set_once() {
        let resolved = resolved_for(&[(1, 100)]);
        let aggregation = Aggregation::build(&[1, 1, 1, 1], &resolved);

        let (_, shops) = aggregation.into_parts();
        assert_eq!(shops.len(), 1);
        assert_eq!(shops[0].products.len(), 1);
        assert_eq!(shops[0].products[0].id, 1);
    }

    #[test]
    fn shops_partition_their_products() {
        let resolved = resolved_for(&[(1, 100), (2, 100), (3, 200)]);
        let aggregation = Aggregation::build(&[1, 3, 2, 1], &resolved);

        assert_eq!(aggregation.shop_count(), 2);
        let (_, mut shops) = aggregation.into_parts();
        shops.sort_by_key(|s| s.shop.id);
        assert_eq!(
            shops[0].products.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert_eq!(
            shops[1].products.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![3]
        );
    }

    #[test]
    fn empty_sequence_builds_empty_aggregation() {
        let aggregation = Aggregation::build(&[], &HashMap::new());
        assert!(aggregation.is_empty());
        assert_eq!(aggregation.product_count(), 0);
    }

    #[test]
    fn unresolved_ids_are_ignored() {
        let resolved = resolved_for(&[(1, 100)]);
        let aggregation = Aggregation::build(&[1, 2, 2], &resolved);

        assert_eq!(aggregation.window_count(2), 0);
        assert_eq!(aggregation.product_count(), 1);
    }

    #[test]
    fn building_twice_yields_identical_structures() {
        let resolved = resolved_for(&[(1, 100), (2, 100), (3, 200)]);
        let sequence = [1, 3, 2, 1, 3, 3];

        let first = Aggregation::build(&sequence, &resolved);
        let second = Aggregation::build(&sequence, &resolved);
        assert_eq!(first, second);
    }

    proptest! {
        #[test]
        fn total_counts_equal_sequence_length(sequence in prop::collection::vec(1..20i32, 0..100)) {
            // Every id resolves; shops are assigned by residue class.
            let assignments: Vec<(i32, i32)> = (1..20).map(|id| (id, 100 + id % 5)).collect();
            let resolved = resolved_for(&assignments);

            let aggregation = Aggregation::build(&sequence, &resolved);
            let (counts, shops) = aggregation.into_parts();

            let total: i64 = counts.values().sum();
            prop_assert_eq!(total, sequence.len() as i64);

            // Each counted product sits in exactly one shop's set.
            let placed: usize = shops.iter().map(|s| s.products.len()).sum();
            prop_assert_eq!(placed, counts.len());
        }

        #[test]
        fn shop_totals_are_the_sum_of_member_counts(sequence in prop::collection::vec(1..20i32, 1..100)) {
            let assignments: Vec<(i32, i32)> = (1..20).map(|id| (id, 100 + id % 5)).collect();
            let resolved = resolved_for(&assignments);

            let aggregation = Aggregation::build(&sequence, &resolved);
            let (counts, shops) = aggregation.into_parts();

            let from_shops: i64 = shops
                .iter()
                .flat_map(|s| s.products.iter())
                .map(|p| counts[&p.id])
                .sum();
            prop_assert_eq!(from_shops, sequence.len() as i64);
        }
    }
}
