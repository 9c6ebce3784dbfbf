//! Paginated code-family listings for the seller and superuser catalog pages.

use std::collections::{BTreeSet, HashMap};

use bazaar_core::{group_by_code, Product, Stock, StockAggregator};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{map_db_error, views::ProductView, ApiError, AppState, Page, Paginated};

/// One row per code: the representative variant plus family-wide figures.
#[derive(Debug, Serialize)]
pub(super) struct FamilyItem {
    pub code_id: i64,
    pub code: Option<String>,
    pub product: ProductView,
    pub size_id: i64,
    pub color_id: i64,
    pub total_quantity: i64,
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub all_active: bool,
}

/// Page through the code families visible to `seller_id` (all families
/// when `None`).
///
/// Representatives come from the visible rows only; totals, price range and
/// activation state cover every row of each code.
pub(super) async fn list_families(
    state: &AppState,
    request_id: &str,
    seller_id: Option<i64>,
    requested_page: Option<&str>,
) -> Result<Paginated<FamilyItem>, ApiError> {
    let db_err = |e: bazaar_db::DbError| map_db_error(request_id.to_owned(), &e);

    let visible: Vec<Stock> = bazaar_db::list_stocks(&state.pool, seller_id)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(Stock::from)
        .collect();

    let representatives = group_by_code(&visible);
    let page = Page::new(
        i64::try_from(representatives.len()).unwrap_or(i64::MAX),
        state.config.family_page_size,
        requested_page,
    );
    let on_page: Vec<Stock> = representatives[page.range()]
        .iter()
        .map(|stock| (*stock).clone())
        .collect();
    if on_page.is_empty() {
        return Ok(page.wrap(Vec::new()));
    }

    let code_ids: Vec<i64> = on_page.iter().map(|s| s.code_id).collect();
    let family_rows: Vec<Stock> = bazaar_db::list_stocks_for_codes(&state.pool, &code_ids)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(Stock::from)
        .collect();

    let product_ids: Vec<i64> = family_rows
        .iter()
        .map(|s| s.product_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let products: Vec<Product> = bazaar_db::list_products_by_ids(&state.pool, &product_ids)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(Product::from)
        .collect();

    let code_names: HashMap<i64, String> = bazaar_db::list_codes_by_ids(&state.pool, &code_ids)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(|code| (code.id, code.name))
        .collect();

    let aggregator = StockAggregator::new(&family_rows, &products);
    let items = aggregator
        .summarize_families(&on_page)
        .into_iter()
        .filter_map(|family| {
            let product = family.product?;
            Some(FamilyItem {
                code_id: family.representative.code_id,
                code: code_names.get(&family.representative.code_id).cloned(),
                product: ProductView::from(product),
                size_id: family.representative.size_id,
                color_id: family.representative.color_id,
                total_quantity: family.total_quantity,
                min_price: family.price_range.min,
                max_price: family.price_range.max,
                all_active: family.all_active,
            })
        })
        .collect();

    Ok(page.wrap(items))
}
