//! Storefront domain: catalog, orders and saved collections.
pub mod aggregates;
pub mod value_objects;

pub use aggregates::*;
pub use value_objects::{CollectionKind, SessionId, Size};
