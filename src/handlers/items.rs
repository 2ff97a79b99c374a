use axum::{
    body::to_bytes,
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::middleware::RouteParams;

use super::{AppError, CatalogError};

/// Largest JSON body accepted by `POST /api/items`.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Upper bound on the simulated storage latency (ms).
const MAX_SIMULATED_LATENCY_MS: u64 = 8;

// ─── Domain types ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    /// Price in cents (e.g. 12999 = $129.99)
    pub price: u64,
    pub stock: u32,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub price: u64,
    #[serde(default)]
    pub stock: u32,
}

#[derive(Debug, Serialize)]
pub struct ItemReport {
    pub id: String,
    pub name: String,
    pub stock: u32,
    /// Stock value in cents
    pub inventory_value: u64,
}

/// In-memory item store.
#[derive(Default)]
pub struct Catalog {
    items: RwLock<HashMap<String, Item>>,
}

impl Catalog {
    /// A catalog pre-filled with a few items so the demo has data to serve.
    pub fn seeded() -> Self {
        let catalog = Self::default();
        for (name, price, stock) in [
            ("Mechanical Keyboard", 12_999, 14),
            ("USB-C Hub", 3_499, 52),
            ("Desk Lamp", 4_250, 0),
        ] {
            catalog.insert(name.into(), price, stock);
        }
        catalog
    }

    pub fn insert(&self, name: String, price: u64, stock: u32) -> Item {
        let item = Item {
            id: format!("itm_{}", &uuid::Uuid::new_v4().simple().to_string()[..8]),
            name,
            price,
            stock,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        self.items.write().insert(item.id.clone(), item.clone());
        item
    }

    pub fn get(&self, id: &str) -> Option<Item> {
        self.items.read().get(id).cloned()
    }

    pub fn list(&self) -> Vec<Item> {
        let mut items: Vec<Item> = self.items.read().values().cloned().collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        items
    }
}

// ─── GET /api/items ──────────────────────────────────────────────

pub async fn list_items(
    catalog: Arc<Catalog>,
    _req: Request,
    _params: RouteParams,
) -> Result<Response, CatalogError> {
    simulate_storage_latency().await;
    Ok(Json(catalog.list()).into_response())
}

// ─── POST /api/items ─────────────────────────────────────────────

pub async fn create_item(
    catalog: Arc<Catalog>,
    req: Request,
    _params: RouteParams,
) -> Result<Response, CatalogError> {
    let bytes = to_bytes(req.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(CatalogError::Body)?;

    let body: CreateItemRequest = match serde_json::from_slice(&bytes) {
        Ok(body) => body,
        Err(e) => return Ok(AppError::BadRequest(format!("invalid item: {e}")).into_response()),
    };
    if body.name.trim().is_empty() {
        return Ok(AppError::BadRequest("name must not be empty".into()).into_response());
    }

    simulate_storage_latency().await;
    let item = catalog.insert(body.name, body.price, body.stock);
    Ok((StatusCode::CREATED, Json(item)).into_response())
}

// ─── GET /api/items/:id ──────────────────────────────────────────

pub async fn get_item(
    catalog: Arc<Catalog>,
    _req: Request,
    params: RouteParams,
) -> Result<Response, CatalogError> {
    simulate_storage_latency().await;
    let id = params.get("id").map(String::as_str).unwrap_or_default();

    Ok(match catalog.get(id) {
        Some(item) => Json(item).into_response(),
        None => AppError::NotFound(format!("item '{id}' not found")).into_response(),
    })
}

// ─── GET /api/items/:id/report ───────────────────────────────────

/// Fails with `CatalogError::EmptyHistory` for out-of-stock items, which
/// gives the demo a reliable route for exercising the failure path.
pub async fn item_report(
    catalog: Arc<Catalog>,
    _req: Request,
    params: RouteParams,
) -> Result<Response, CatalogError> {
    simulate_storage_latency().await;
    let id = params.get("id").cloned().unwrap_or_default();

    let Some(item) = catalog.get(&id) else {
        return Ok(AppError::NotFound(format!("item '{id}' not found")).into_response());
    };
    if item.stock == 0 {
        return Err(CatalogError::EmptyHistory { id });
    }

    Ok(Json(ItemReport {
        inventory_value: item.price * u64::from(item.stock),
        id: item.id,
        name: item.name,
        stock: item.stock,
    })
    .into_response())
}

// ─── Helpers ─────────────────────────────────────────────────────

async fn simulate_storage_latency() {
    let ms = rand::thread_rng().gen_range(0..=MAX_SIMULATED_LATENCY_MS);
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
