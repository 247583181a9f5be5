//! Menu browsing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::{CatalogItemId, CategoryId};
use domain::{CatalogItem, Category};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    /// Case-insensitive match on name or description.
    pub q: Option<String>,
    pub category: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct CatalogResponse {
    pub restaurant: String,
    pub categories: Vec<CategoryResponse>,
    pub items: Vec<ItemResponse>,
}

#[derive(Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub allows_dual_composite: bool,
}

#[derive(Serialize)]
pub struct ItemResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub price: String,
    pub category_id: Option<String>,
    pub allows_dual_composite: bool,
    pub extras: Vec<ExtraResponse>,
    pub complements: Vec<ComplementResponse>,
}

#[derive(Serialize)]
pub struct ExtraResponse {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
}

#[derive(Serialize)]
pub struct ComplementResponse {
    pub id: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub required: bool,
    pub max_items: Option<u32>,
}

impl From<&Category> for CategoryResponse {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.to_string(),
            name: category.name.clone(),
            allows_dual_composite: category.allows_dual_composite,
        }
    }
}

impl From<&CatalogItem> for ItemResponse {
    fn from(item: &CatalogItem) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.clone(),
            description: item.description.clone(),
            price_cents: item.price.cents(),
            price: item.price.to_string(),
            category_id: item.category_id.as_ref().map(|id| id.to_string()),
            allows_dual_composite: item.allows_dual_composite,
            extras: item
                .extras
                .iter()
                .map(|extra| ExtraResponse {
                    id: extra.id.to_string(),
                    name: extra.name.clone(),
                    price_cents: extra.price.cents(),
                })
                .collect(),
            complements: item
                .complements
                .iter()
                .map(|complement| ComplementResponse {
                    id: complement.id.to_string(),
                    name: complement.name.clone(),
                    unit_price_cents: complement.unit_price.cents(),
                    required: complement.required,
                    max_items: complement.max_items,
                })
                .collect(),
        }
    }
}

// -- Handlers --

/// GET /catalog: categories and the items matching the optional filters.
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<CatalogResponse>, ApiError> {
    let catalog = state.load_catalog().await?;

    let category = query
        .category
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .map(|c| {
            CategoryId::parse(c.trim())
                .map_err(|e| ApiError::BadRequest(format!("Invalid category: {e}")))
        })
        .transpose()?;

    let items = catalog
        .search(query.q.as_deref().unwrap_or_default(), category.as_ref())
        .into_iter()
        .map(ItemResponse::from)
        .collect();

    Ok(Json(CatalogResponse {
        restaurant: state.restaurant_name.clone(),
        categories: catalog.categories().iter().map(CategoryResponse::from).collect(),
        items,
    }))
}

/// GET /catalog/items/{id}/flavors: items that can be the second flavor.
#[tracing::instrument(skip(state))]
pub async fn flavors(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let item_id = CatalogItemId::parse(id.as_str())
        .map_err(|e| ApiError::BadRequest(format!("Invalid item id: {e}")))?;
    let catalog = state.load_catalog().await?;

    let first = catalog
        .item(&item_id)
        .ok_or_else(|| ApiError::NotFound(format!("Item {id} not found")))?;
    if !first.allows_dual_composite {
        return Ok(Json(Vec::new()));
    }

    Ok(Json(
        catalog
            .second_flavor_candidates(&item_id)
            .into_iter()
            .map(ItemResponse::from)
            .collect(),
    ))
}
