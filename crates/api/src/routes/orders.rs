//! Storefront checkout and order administration endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use checkout::{StoredLine, StoredOrder};
use chrono::{DateTime, Utc};
use common::{CatalogItemId, ComplementId, CustomerId, ExtraId, OrderId};
use domain::{
    Cart, Catalog, CheckoutDetails, DeliveryAddress, LineItemConfiguration, MAX_LINE_QUANTITY,
    OrderStatus, PaymentType, SelectedComplement,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub customer_id: Option<String>,
    pub payment_type: Option<String>,
    pub delivery_address: Option<String>,
    pub note: Option<String>,
    /// Single-use link token; fixes the customer when present.
    pub access_token: Option<String>,
    #[serde(default)]
    pub lines: Vec<LineRequest>,
}

/// One cart line: either `item_id` or exactly two `flavors`.
/// `quantity` is limited to `1..=MAX_LINE_QUANTITY`.
#[derive(Debug, Deserialize)]
pub struct LineRequest {
    pub item_id: Option<String>,
    #[serde(default)]
    pub flavors: Vec<String>,
    #[serde(default)]
    pub extras: Vec<String>,
    #[serde(default)]
    pub complements: Vec<ComplementRequest>,
    pub note: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct ComplementRequest {
    pub id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderPlacedResponse {
    pub order_id: String,
    pub total_cents: i64,
    pub total: String,
    pub line_item_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    /// Plain-text summary to hand over to the restaurant.
    pub message: String,
    pub restaurant: String,
    pub handoff_to: Option<String>,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub status: String,
    pub customer_id: String,
    pub payment_type: String,
    pub delivery_address: String,
    pub total_cents: i64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub orphaned: bool,
    pub lines: Vec<OrderLineResponse>,
}

#[derive(Serialize)]
pub struct OrderLineResponse {
    pub id: String,
    pub product_id: String,
    pub quantity: u32,
    pub unit_value_cents: i64,
    pub note: Option<String>,
    pub flavors: Vec<FlavorResponse>,
    pub complements: Vec<LineComplementResponse>,
}

#[derive(Serialize)]
pub struct FlavorResponse {
    pub product_id: String,
    pub position: u8,
}

#[derive(Serialize)]
pub struct LineComplementResponse {
    pub complement_id: String,
    pub quantity: u32,
    pub value_cents: i64,
}

impl From<&StoredLine> for OrderLineResponse {
    fn from(line: &StoredLine) -> Self {
        Self {
            id: line.id.to_string(),
            product_id: line.item.product_id.to_string(),
            quantity: line.item.quantity,
            unit_value_cents: line.item.unit_value.cents(),
            note: line.item.note.clone(),
            flavors: line
                .flavors
                .iter()
                .map(|flavor| FlavorResponse {
                    product_id: flavor.product_id.to_string(),
                    position: flavor.position.as_u8(),
                })
                .collect(),
            complements: line
                .complements
                .iter()
                .map(|complement| LineComplementResponse {
                    complement_id: complement.complement_id.to_string(),
                    quantity: complement.quantity,
                    value_cents: complement.value.cents(),
                })
                .collect(),
        }
    }
}

impl From<StoredOrder> for OrderResponse {
    fn from(order: StoredOrder) -> Self {
        Self {
            id: order.id.to_string(),
            status: order.header.status.to_string(),
            customer_id: order.header.customer_id.to_string(),
            payment_type: order.header.payment_type.to_string(),
            delivery_address: order.header.delivery_address.to_string(),
            total_cents: order.header.total.cents(),
            note: order.header.note.clone(),
            created_at: order.header.created_at,
            orphaned: order.is_orphaned(),
            lines: order.lines.iter().map(OrderLineResponse::from).collect(),
        }
    }
}

// -- Request mapping --

fn bad_request(field: &str, err: impl std::fmt::Display) -> ApiError {
    ApiError::BadRequest(format!("Invalid {field}: {err}"))
}

fn parse_customer_id(id: &str) -> Result<CustomerId, ApiError> {
    uuid::Uuid::parse_str(id.trim())
        .map(CustomerId::from_uuid)
        .map_err(|e| bad_request("customer_id", e))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    uuid::Uuid::parse_str(id.trim())
        .map(OrderId::from_uuid)
        .map_err(|e| bad_request("order id", e))
}

/// Turns a request line into a configuration checked against the catalog.
fn configuration(line: &LineRequest, catalog: &Catalog) -> Result<LineItemConfiguration, ApiError> {
    let base = match (line.item_id.as_deref(), line.flavors.as_slice()) {
        (Some(item_id), []) => LineItemConfiguration::single(
            CatalogItemId::parse(item_id).map_err(|e| bad_request("item_id", e))?,
        ),
        (None, [first, second]) => catalog.compose_dual(
            &CatalogItemId::parse(first.as_str()).map_err(|e| bad_request("flavor", e))?,
            &CatalogItemId::parse(second.as_str()).map_err(|e| bad_request("flavor", e))?,
        )?,
        _ => {
            return Err(ApiError::BadRequest(
                "each line needs either item_id or exactly two flavors".to_string(),
            ));
        }
    };

    let mut config = base;
    for extra in &line.extras {
        config = config.with_extra(ExtraId::parse(extra.as_str()).map_err(|e| bad_request("extra", e))?);
    }
    for complement in &line.complements {
        let id = ComplementId::parse(complement.id.as_str())
            .map_err(|e| bad_request("complement", e))?;
        config = config.with_complement(SelectedComplement::new(id, complement.quantity)?)?;
    }
    if let Some(note) = &line.note {
        config = config.with_note(note);
    }
    Ok(config)
}

// -- Handlers --

/// POST /orders: builds a cart from the request and checks it out.
#[tracing::instrument(skip(state, req), fields(lines = req.lines.len()))]
pub async fn place(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderPlacedResponse>), ApiError> {
    let catalog = state.load_catalog().await?;

    let mut details = match req.access_token.as_deref() {
        Some(token) => {
            let (_, details) = state.coordinator.open_with_token(token, state.scope).await?;
            details
        }
        None => CheckoutDetails::new(),
    };
    if let Some(customer_id) = req.customer_id.as_deref() {
        details.set_customer(parse_customer_id(customer_id)?)?;
    }
    if let Some(code) = req.payment_type.as_deref() {
        details = details.with_payment_type(code.parse::<PaymentType>()?);
    }
    if let Some(address) = req.delivery_address.as_deref().and_then(DeliveryAddress::parse) {
        details = details.with_delivery_address(address);
    }
    if let Some(note) = &req.note {
        details = details.with_note(note);
    }

    let mut cart = Cart::new();
    for line in &req.lines {
        if !(1..=MAX_LINE_QUANTITY).contains(&line.quantity) {
            return Err(ApiError::BadRequest(format!(
                "quantity must be between 1 and {MAX_LINE_QUANTITY}"
            )));
        }
        let config = configuration(line, &catalog)?;
        state
            .coordinator
            .add_many_to_cart(&mut cart, &catalog, config, line.quantity)?;
    }

    let receipt = state
        .coordinator
        .checkout(&mut cart, &catalog, &details, req.access_token.as_deref())
        .await?;

    let confirmation = receipt.confirmation;
    Ok((
        StatusCode::CREATED,
        Json(OrderPlacedResponse {
            order_id: confirmation.order_id.to_string(),
            total_cents: confirmation.total.cents(),
            total: confirmation.total.to_string(),
            line_item_ids: confirmation
                .line_item_ids
                .iter()
                .map(|id| id.to_string())
                .collect(),
            created_at: confirmation.created_at,
            message: receipt.summary.render_message(),
            restaurant: state.restaurant_name.clone(),
            handoff_to: state.restaurant_whatsapp.clone(),
        }),
    ))
}

/// GET /orders: newest first, optionally filtered by `?status=`.
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()?;

    let orders = state.order_book.list_orders(state.scope, status).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// GET /orders/orphaned: headers left without lines by failed submissions.
#[tracing::instrument(skip(state))]
pub async fn orphaned(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.order_book.list_orphaned(state.scope).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .order_book
        .get_order(state.scope, order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;
    Ok(Json(order.into()))
}

/// PATCH /orders/{id}/status
#[tracing::instrument(skip(state, req))]
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let status = req.status.parse::<OrderStatus>()?;
    let order = state
        .order_book
        .update_status(state.scope, order_id, status)
        .await?;
    Ok(Json(order.into()))
}
