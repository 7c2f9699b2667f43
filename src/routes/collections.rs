//! Per-customer saved collections (cart, wishlist, favorites).

use axum::{
    extract::{Path, State},
    Json,
};

use super::AppJson;
use crate::domain::{normalize, reconcile, CollectionKind, SavedItem};
use crate::error::{AppError, Result};
use crate::middleware::CurrentCustomer;
use crate::state::AppState;

fn kind(raw: &str) -> Result<CollectionKind> {
    raw.parse().map_err(|()| AppError::NotFound(format!("Collection '{raw}'")))
}

pub async fn get_collection(State(s): State<AppState>, CurrentCustomer(c): CurrentCustomer, Path(raw): Path<String>) -> Result<Json<Vec<SavedItem>>> {
    Ok(Json(s.stores.collections.load(&c.sub, kind(&raw)?).await?))
}

/// Replaces the stored collection with what the client now holds.
pub async fn put_collection(State(s): State<AppState>, CurrentCustomer(c): CurrentCustomer, Path(raw): Path<String>, AppJson(items): AppJson<Vec<SavedItem>>) -> Result<Json<Vec<SavedItem>>> {
    let kind = kind(&raw)?;
    let items = normalize(kind, items);
    s.stores.collections.save(&c.sub, kind, &items).await?;
    Ok(Json(items))
}

/// One-shot merge of guest items into the account on sign-in.
pub async fn sync_collection(State(s): State<AppState>, CurrentCustomer(c): CurrentCustomer, Path(raw): Path<String>, AppJson(local): AppJson<Vec<SavedItem>>) -> Result<Json<Vec<SavedItem>>> {
    let kind = kind(&raw)?;
    let remote = s.stores.collections.load(&c.sub, kind).await?;
    let (remote_count, local_count) = (remote.len(), local.len());
    let merged = reconcile(kind, remote, local);
    s.stores.collections.save(&c.sub, kind, &merged).await?;
    tracing::info!(user_id = %c.sub, kind = kind.as_str(), remote_count, local_count, merged = merged.len(), "Collection reconciled");
    Ok(Json(merged))
}
