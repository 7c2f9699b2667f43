//! Aggregate numbers for the admin dashboard, computed over the full order and product lists.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{Order, Product};

const TOP_PRODUCTS: usize = 5;
pub const LOW_STOCK_BELOW: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub order_count: usize,
    pub revenue: Decimal,
    pub average_order_value: Decimal,
    pub product_count: usize,
    pub units_sold: u32,
    pub top_products: Vec<ProductSales>,
    pub low_stock: Vec<LowStock>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales { pub product_id: String, pub name: String, pub quantity: u32, pub revenue: Decimal }

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStock { pub product_id: String, pub name: String, pub size: String, pub stock: u32 }

pub fn summarize(orders: &[Order], products: &[Product]) -> StoreStats {
    let revenue: Decimal = orders.iter().map(|o| o.total).sum();
    let average_order_value = if orders.is_empty() { Decimal::ZERO } else { (revenue / Decimal::from(orders.len())).round_dp(2) };

    let mut sales: HashMap<&str, ProductSales> = HashMap::new();
    for item in orders.iter().flat_map(|o| &o.items) {
        let entry = sales.entry(item.product_id.as_str()).or_insert_with(|| ProductSales {
            product_id: item.product_id.clone(), name: item.name.clone(), quantity: 0, revenue: Decimal::ZERO,
        });
        entry.quantity += item.quantity;
        entry.revenue += item.line_total();
    }
    let mut top_products: Vec<ProductSales> = sales.into_values().collect();
    top_products.sort_by(|a, b| b.quantity.cmp(&a.quantity).then(b.revenue.cmp(&a.revenue)).then(a.name.cmp(&b.name)));
    top_products.truncate(TOP_PRODUCTS);

    let mut low_stock: Vec<LowStock> = products.iter().flat_map(|p| {
        p.sizes.iter().filter(|s| s.stock < LOW_STOCK_BELOW).map(move |s| LowStock {
            product_id: p.id.to_string(), name: p.name.clone(), size: s.size.to_string(), stock: s.stock,
        })
    }).collect();
    low_stock.sort_by(|a, b| a.stock.cmp(&b.stock).then(a.name.cmp(&b.name)));

    StoreStats {
        order_count: orders.len(),
        revenue,
        average_order_value,
        product_count: products.len(),
        units_sold: orders.iter().map(Order::unit_count).sum(),
        top_products,
        low_stock,
    }
}
