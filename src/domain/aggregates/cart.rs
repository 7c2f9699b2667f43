//! Saved collections: cart, wishlist and favorites.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::value_objects::CollectionKind;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedItem {
    pub product_id: String,
    pub name: String,
    pub price: Decimal,
    /// Only meaningful in the cart.
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub selected_sizes: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl SavedItem {
    /// Items are the same entry when product and size selection agree.
    pub fn same_entry(&self, other: &SavedItem) -> bool {
        self.product_id == other.product_id && self.selected_sizes == other.selected_sizes
    }
}

/// Applies per-kind rules: carts hold at least one of each line, the other lists carry no quantity.
/// Repeated entries collapse into the first occurrence.
pub fn normalize(kind: CollectionKind, items: Vec<SavedItem>) -> Vec<SavedItem> {
    let mut out: Vec<SavedItem> = Vec::with_capacity(items.len());
    for mut item in items {
        item.quantity = if kind.tracks_quantity() { Some(item.quantity.unwrap_or(1).max(1)) } else { None };
        if !out.iter().any(|i| i.same_entry(&item)) { out.push(item); }
    }
    out
}

/// Sign-in reconciliation: remote entries win on conflict, local-only entries are appended.
pub fn reconcile(kind: CollectionKind, remote: Vec<SavedItem>, local: Vec<SavedItem>) -> Vec<SavedItem> {
    let mut merged = normalize(kind, remote);
    for item in normalize(kind, local) {
        if !merged.iter().any(|i| i.same_entry(&item)) { merged.push(item); }
    }
    merged
}
