//! Value Objects for the storefront

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Packaging size a product is sold in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Size {
    #[serde(rename = "250g")]
    Grams250,
    #[serde(rename = "500g")]
    Grams500,
    #[serde(rename = "1kg")]
    Kilo1,
}

impl Size {
    pub const ALL: [Size; 3] = [Size::Grams250, Size::Grams500, Size::Kilo1];

    pub fn as_str(&self) -> &'static str {
        match self { Self::Grams250 => "250g", Self::Grams500 => "500g", Self::Kilo1 => "1kg" }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Size {
    type Err = SizeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Size::ALL.into_iter().find(|size| size.as_str() == s.trim()).ok_or_else(|| SizeError(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub struct SizeError(pub String);
impl std::error::Error for SizeError {}
impl fmt::Display for SizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "unknown size '{}'", self.0) }
}

/// Size label an order line carries when the product has no size selection.
pub const DEFAULT_SIZE: &str = "default";

/// Payment-gateway checkout session id, doubling as the order idempotency key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn parse(value: Option<&str>) -> Result<Self, SessionIdError> {
        let value = value.map(str::trim).unwrap_or_default();
        if value.is_empty() { return Err(SessionIdError::Missing); }
        Ok(Self(value.to_string()))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum SessionIdError { Missing }
impl std::error::Error for SessionIdError {}
impl fmt::Display for SessionIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "sessionId is required") }
}

/// Which saved collection a customer is reading or writing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind { Cart, Wishlist, Favorites }

impl CollectionKind {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Cart => "cart", Self::Wishlist => "wishlist", Self::Favorites => "favorites" }
    }
    pub fn tracks_quantity(&self) -> bool { matches!(self, Self::Cart) }
}

impl FromStr for CollectionKind {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s { "cart" => Ok(Self::Cart), "wishlist" => Ok(Self::Wishlist), "favorites" => Ok(Self::Favorites), _ => Err(()) }
    }
}

/// Converts a decimal amount into the gateway's minor units (cents).
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (amount * Decimal::ONE_HUNDRED).round().to_i64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_parse() {
        assert_eq!("250g".parse::<Size>().unwrap(), Size::Grams250);
        assert_eq!(" 1kg ".parse::<Size>().unwrap(), Size::Kilo1);
        assert!("default".parse::<Size>().is_err());
        assert_eq!(serde_json::to_string(&Size::Grams500).unwrap(), "\"500g\"");
    }

    #[test]
    fn test_session_id() {
        assert_eq!(SessionId::parse(Some("  sess_1 ")).unwrap().as_str(), "sess_1");
        assert_eq!(SessionId::parse(Some("   ")), Err(SessionIdError::Missing));
        assert_eq!(SessionId::parse(None), Err(SessionIdError::Missing));
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(to_minor_units(Decimal::new(2899, 2)), Some(2899));
        assert_eq!(to_minor_units(Decimal::new(45, 1)), Some(450));
    }

    #[test]
    fn test_collection_kind() {
        assert_eq!("wishlist".parse::<CollectionKind>(), Ok(CollectionKind::Wishlist));
        assert!("orders".parse::<CollectionKind>().is_err());
        assert!(CollectionKind::Cart.tracks_quantity());
        assert!(!CollectionKind::Favorites.tracks_quantity());
    }
}
