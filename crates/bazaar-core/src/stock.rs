//! Per-code aggregation of stock rows.
//!
//! A code groups the size/color variants that the catalog pages show as a
//! single product family. Each variant is its own [`Product`] with one
//! [`Stock`] row, so every family figure is computed across the rows that
//! share a `code_id`.

use std::collections::{BTreeSet, HashMap, HashSet};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::catalog::{Product, Stock};

/// Lowest and highest effective price within a code family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl PriceRange {
    pub const ZERO: PriceRange = PriceRange {
        min: Decimal::ZERO,
        max: Decimal::ZERO,
    };
}

/// One listing row: the first stock row seen for a code plus the family totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFamily<'a> {
    pub representative: &'a Stock,
    /// Product behind `representative`, if it was supplied.
    pub product: Option<&'a Product>,
    pub total_quantity: i64,
    pub price_range: PriceRange,
    pub all_active: bool,
}

/// First stock row per distinct code, in order of first appearance.
#[must_use]
pub fn group_by_code(stocks: &[Stock]) -> Vec<&Stock> {
    let mut seen = HashSet::new();
    stocks
        .iter()
        .filter(|stock| seen.insert(stock.code_id))
        .collect()
}

/// Read-only aggregation over a batch of stock rows and their products.
#[derive(Debug)]
pub struct StockAggregator<'a> {
    stocks: &'a [Stock],
    products: HashMap<i64, &'a Product>,
}

impl<'a> StockAggregator<'a> {
    #[must_use]
    pub fn new(stocks: &'a [Stock], products: &'a [Product]) -> Self {
        Self {
            stocks,
            products: products.iter().map(|p| (p.id, p)).collect(),
        }
    }

    fn rows(&self, code_id: i64) -> impl Iterator<Item = &'a Stock> + '_ {
        self.stocks.iter().filter(move |s| s.code_id == code_id)
    }

    #[must_use]
    pub fn product(&self, product_id: i64) -> Option<&'a Product> {
        self.products.get(&product_id).copied()
    }

    /// Sum of `quantity` over every row carrying `code_id`; `0` when there are none.
    #[must_use]
    pub fn total_quantity(&self, code_id: i64) -> i64 {
        self.rows(code_id).map(|s| i64::from(s.quantity)).sum()
    }

    /// Effective price bounds over the distinct products of `code_id`.
    ///
    /// Several rows for the same product count once. Rows whose product was
    /// not supplied are skipped. [`PriceRange::ZERO`] when no product remains.
    #[must_use]
    pub fn price_range(&self, code_id: i64) -> PriceRange {
        let product_ids: BTreeSet<i64> = self.rows(code_id).map(|s| s.product_id).collect();

        product_ids
            .into_iter()
            .filter_map(|id| self.product(id))
            .map(Product::effective_price)
            .fold(None, |range: Option<PriceRange>, price| {
                Some(match range {
                    None => PriceRange {
                        min: price,
                        max: price,
                    },
                    Some(r) => PriceRange {
                        min: r.min.min(price),
                        max: r.max.max(price),
                    },
                })
            })
            .unwrap_or(PriceRange::ZERO)
    }

    /// Whether every row's product is active.
    ///
    /// A code with no rows is vacuously active. A row whose product was not
    /// supplied counts as inactive.
    #[must_use]
    pub fn all_active(&self, code_id: i64) -> bool {
        self.rows(code_id)
            .all(|s| self.product(s.product_id).is_some_and(|p| p.active))
    }

    /// One [`CodeFamily`] per distinct code in `visible`, in first-seen order.
    ///
    /// `visible` picks the representatives (for example only one seller's
    /// rows); the totals always cover every row this aggregator holds.
    #[must_use]
    pub fn summarize_families<'v>(&self, visible: &'v [Stock]) -> Vec<CodeFamily<'v>>
    where
        'a: 'v,
    {
        group_by_code(visible)
            .into_iter()
            .map(|representative| CodeFamily {
                representative,
                product: self.product(representative.product_id),
                total_quantity: self.total_quantity(representative.code_id),
                price_range: self.price_range(representative.code_id),
                all_active: self.all_active(representative.code_id),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::catalog::AppliedDiscount;

    const RED_SHIRT: i64 = 10;
    const BLUE_JEANS: i64 = 20;

    fn product(id: i64, price: i64, discount_percent: Option<i32>, active: bool) -> Product {
        Product {
            id,
            sku: None,
            name: format!("Product {id}"),
            cart_desc: None,
            short_desc: None,
            long_desc: None,
            thumb: None,
            seller_id: Some(1),
            category_id: None,
            discount: discount_percent.map(|percent| AppliedDiscount {
                id: 1,
                percent,
                active: true,
            }),
            price: Decimal::from(price),
            active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn stock(id: i64, product_id: i64, code_id: i64, quantity: i32) -> Stock {
        Stock {
            id,
            product_id,
            size_id: id,
            color_id: 1,
            code_id,
            quantity,
        }
    }

    /// P1 (100, 10% off) has two size rows, P2 (80) one, all under RED-SHIRT.
    fn red_shirt() -> (Vec<Stock>, Vec<Product>) {
        let products = vec![product(1, 100, Some(10), true), product(2, 80, None, true)];
        let stocks = vec![
            stock(1, 1, RED_SHIRT, 4),
            stock(2, 1, RED_SHIRT, 6),
            stock(3, 2, RED_SHIRT, 5),
        ];
        (stocks, products)
    }

    #[test]
    fn total_quantity_sums_rows_of_code() {
        let (stocks, products) = red_shirt();
        let agg = StockAggregator::new(&stocks, &products);
        assert_eq!(agg.total_quantity(RED_SHIRT), 15);
    }

    #[test]
    fn total_quantity_of_unknown_code_is_zero() {
        let (stocks, products) = red_shirt();
        let agg = StockAggregator::new(&stocks, &products);
        assert_eq!(agg.total_quantity(BLUE_JEANS), 0);
    }

    #[test]
    fn adding_a_row_only_moves_its_own_code() {
        let (mut stocks, mut products) = red_shirt();
        products.push(product(3, 40, None, true));
        stocks.push(stock(4, 3, BLUE_JEANS, 2));

        let before_red;
        let before_blue;
        {
            let agg = StockAggregator::new(&stocks, &products);
            before_red = agg.total_quantity(RED_SHIRT);
            before_blue = agg.total_quantity(BLUE_JEANS);
        }

        stocks.push(stock(5, 3, BLUE_JEANS, 9));
        let agg = StockAggregator::new(&stocks, &products);
        assert_eq!(agg.total_quantity(BLUE_JEANS), before_blue + 9);
        assert_eq!(agg.total_quantity(RED_SHIRT), before_red);
    }

    #[test]
    fn price_range_uses_effective_prices() {
        let (stocks, products) = red_shirt();
        let agg = StockAggregator::new(&stocks, &products);
        assert_eq!(
            agg.price_range(RED_SHIRT),
            PriceRange {
                min: Decimal::from(80),
                max: Decimal::from(90),
            }
        );
    }

    #[test]
    fn price_range_counts_each_product_once() {
        let products = vec![product(1, 50, None, true)];
        let stocks = vec![stock(1, 1, RED_SHIRT, 1), stock(2, 1, RED_SHIRT, 1)];
        let agg = StockAggregator::new(&stocks, &products);
        assert_eq!(
            agg.price_range(RED_SHIRT),
            PriceRange {
                min: Decimal::from(50),
                max: Decimal::from(50),
            }
        );
    }

    #[test]
    fn price_range_of_empty_code_is_zero() {
        let agg = StockAggregator::new(&[], &[]);
        assert_eq!(agg.price_range(RED_SHIRT), PriceRange::ZERO);
    }

    #[test]
    fn all_active_true_when_every_product_active() {
        let (stocks, products) = red_shirt();
        let agg = StockAggregator::new(&stocks, &products);
        assert!(agg.all_active(RED_SHIRT));
    }

    #[test]
    fn all_active_false_when_one_product_inactive() {
        let products = vec![product(1, 100, None, true), product(2, 80, None, false)];
        let stocks = vec![stock(1, 1, RED_SHIRT, 1), stock(2, 2, RED_SHIRT, 1)];
        let agg = StockAggregator::new(&stocks, &products);
        assert!(!agg.all_active(RED_SHIRT));
    }

    #[test]
    fn all_active_is_vacuously_true_for_empty_code() {
        let (stocks, products) = red_shirt();
        let agg = StockAggregator::new(&stocks, &products);
        assert!(agg.all_active(BLUE_JEANS));
    }

    #[test]
    fn all_active_false_when_product_missing() {
        let stocks = vec![stock(1, 1, RED_SHIRT, 1)];
        let agg = StockAggregator::new(&stocks, &[]);
        assert!(!agg.all_active(RED_SHIRT));
    }

    #[test]
    fn group_by_code_keeps_first_seen_representative() {
        let stocks = vec![
            stock(1, 1, RED_SHIRT, 1),
            stock(2, 2, BLUE_JEANS, 1),
            stock(3, 3, RED_SHIRT, 1),
        ];
        let grouped: Vec<i64> = group_by_code(&stocks).iter().map(|s| s.id).collect();
        assert_eq!(grouped, vec![1, 2]);
    }

    #[test]
    fn group_by_code_of_empty_slice_is_empty() {
        assert!(group_by_code(&[]).is_empty());
    }

    #[test]
    fn summarize_families_totals_cover_all_rows() {
        let (mut stocks, mut products) = red_shirt();
        products.push(product(3, 40, None, false));
        stocks.push(stock(4, 3, BLUE_JEANS, 2));

        // Only the second P1 row and the jeans row are visible to this caller.
        let visible = vec![stocks[1].clone(), stocks[3].clone()];
        let agg = StockAggregator::new(&stocks, &products);
        let families = agg.summarize_families(&visible);

        assert_eq!(families.len(), 2);
        assert_eq!(families[0].representative.id, 2);
        assert_eq!(families[0].product.map(|p| p.id), Some(1));
        assert_eq!(families[0].total_quantity, 15);
        assert!(families[0].all_active);
        assert_eq!(families[1].representative.code_id, BLUE_JEANS);
        assert_eq!(families[1].total_quantity, 2);
        assert_eq!(families[1].price_range.min, Decimal::from(40));
        assert!(!families[1].all_active);
    }
}
