//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::value_objects::Size;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Fallback price when no size is selected.
    pub price: Decimal,
    /// First image is the hero.
    pub images: Vec<String>,
    pub category: String,
    pub country: String,
    /// Denormalized total; the per-size stock is authoritative.
    pub stock: u32,
    pub sizes: Vec<SizeEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SizeEntry { pub size: Size, pub price: Decimal, pub stock: u32 }

/// Admin-supplied fields for creating or replacing a product.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub country: String,
    pub sizes: Vec<SizeEntry>,
}

impl ProductDraft {
    fn check(&self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() { return Err(ProductError::MissingName); }
        if self.sizes.is_empty() { return Err(ProductError::NoSizes); }
        if self.price.is_sign_negative() || self.sizes.iter().any(|s| s.price.is_sign_negative()) {
            return Err(ProductError::NegativePrice);
        }
        let mut seen = Vec::with_capacity(self.sizes.len());
        for entry in &self.sizes {
            if seen.contains(&entry.size) { return Err(ProductError::DuplicateSize(entry.size)); }
            seen.push(entry.size);
        }
        Ok(())
    }
}

impl Product {
    pub fn create(draft: ProductDraft) -> Result<Self, ProductError> {
        draft.check()?;
        let now = Utc::now();
        let mut product = Self {
            id: Uuid::now_v7(), name: draft.name.trim().to_string(), description: draft.description,
            price: draft.price, images: draft.images, category: draft.category, country: draft.country,
            stock: 0, sizes: draft.sizes, created_at: now, updated_at: now,
        };
        product.recount();
        Ok(product)
    }

    /// Replaces every editable field, keeping id and creation time.
    pub fn apply(&mut self, draft: ProductDraft) -> Result<(), ProductError> {
        draft.check()?;
        self.name = draft.name.trim().to_string();
        self.description = draft.description;
        self.price = draft.price;
        self.images = draft.images;
        self.category = draft.category;
        self.country = draft.country;
        self.sizes = draft.sizes;
        self.recount();
        self.touch();
        Ok(())
    }

    pub fn hero_image(&self) -> Option<&str> { self.images.first().map(String::as_str) }
    pub fn size(&self, size: Size) -> Option<&SizeEntry> { self.sizes.iter().find(|e| e.size == size) }

    /// Removes `qty` units from one size, flooring at zero. Returns the remaining stock.
    pub fn decrement_size_stock(&mut self, size: Size, qty: u32) -> Result<u32, ProductError> {
        let entry = self.sizes.iter_mut().find(|e| e.size == size).ok_or(ProductError::SizeNotFound(size))?;
        let removed = qty.min(entry.stock);
        entry.stock -= removed;
        let remaining = entry.stock;
        self.stock = self.stock.saturating_sub(removed);
        self.touch();
        Ok(remaining)
    }

    fn recount(&mut self) { self.stock = self.sizes.iter().map(|e| e.stock).sum(); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductError { MissingName, NoSizes, NegativePrice, DuplicateSize(Size), SizeNotFound(Size) }
impl std::error::Error for ProductError {}
impl std::fmt::Display for ProductError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "Missing name"),
            Self::NoSizes => write!(f, "At least one size is required"),
            Self::NegativePrice => write!(f, "Prices must not be negative"),
            Self::DuplicateSize(s) => write!(f, "Size {s} listed twice"),
            Self::SizeNotFound(s) => write!(f, "Size {s} not offered"),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_draft(name: &str, stock_250: u32) -> ProductDraft {
    ProductDraft {
        name: name.into(), description: "Bright and fruity".into(), price: Decimal::new(2899, 2),
        images: vec!["hero.jpg".into(), "side.jpg".into()], category: "single-origin".into(), country: "Kenya".into(),
        sizes: vec![
            SizeEntry { size: Size::Grams250, price: Decimal::new(2899, 2), stock: stock_250 },
            SizeEntry { size: Size::Kilo1, price: Decimal::new(9500, 2), stock: 3 },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_create() {
        let p = Product::create(sample_draft("Kenya AA", 10)).unwrap();
        assert_eq!(p.name, "Kenya AA");
        assert_eq!(p.stock, 13);
        assert_eq!(p.hero_image(), Some("hero.jpg"));
    }

    #[test]
    fn test_requires_sizes() {
        let mut draft = sample_draft("Kenya AA", 10);
        draft.sizes.clear();
        assert_eq!(Product::create(draft).unwrap_err(), ProductError::NoSizes);
    }

    #[test]
    fn test_rejects_duplicate_size() {
        let mut draft = sample_draft("Kenya AA", 10);
        draft.sizes.push(SizeEntry { size: Size::Kilo1, price: Decimal::ONE, stock: 1 });
        assert_eq!(Product::create(draft).unwrap_err(), ProductError::DuplicateSize(Size::Kilo1));
    }

    #[test]
    fn test_decrement_floors_at_zero() {
        let mut p = Product::create(sample_draft("Kenya AA", 2)).unwrap();
        assert_eq!(p.decrement_size_stock(Size::Grams250, 1).unwrap(), 1);
        assert_eq!(p.decrement_size_stock(Size::Grams250, 50).unwrap(), 0);
        assert_eq!(p.size(Size::Kilo1).unwrap().stock, 3);
        assert_eq!(p.decrement_size_stock(Size::Grams500, 1), Err(ProductError::SizeNotFound(Size::Grams500)));
    }

    #[test]
    fn test_apply_keeps_identity() {
        let mut p = Product::create(sample_draft("Kenya AA", 2)).unwrap();
        let (id, created) = (p.id, p.created_at);
        p.apply(sample_draft("Kenya AB", 7)).unwrap();
        assert_eq!((p.id, p.created_at), (id, created));
        assert_eq!(p.name, "Kenya AB");
        assert_eq!(p.stock, 10);
    }
}
