//! Read and administer persisted orders.

use std::sync::Arc;

use async_trait::async_trait;
use common::{LineItemId, Money, OrderId, OrganizationId};
use domain::{OrderHeader, OrderLineComplement, OrderLineFlavor, OrderLineItem, OrderStatus};
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, OrderBookError};

/// A persisted line item with its child rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredLine {
    pub id: LineItemId,
    pub item: OrderLineItem,
    pub flavors: Vec<OrderLineFlavor>,
    pub complements: Vec<OrderLineComplement>,
}

/// A persisted order with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredOrder {
    pub id: OrderId,
    pub header: OrderHeader,
    pub lines: Vec<StoredLine>,
}

impl StoredOrder {
    /// Sum of `unit_value * quantity` over the persisted lines.
    pub fn lines_total(&self) -> Money {
        self.lines.iter().map(|line| line.item.total()).sum()
    }

    /// An order left incomplete by a failed submission: no lines, lines
    /// that do not add up to the header total, or a half-written dual line.
    pub fn is_orphaned(&self) -> bool {
        self.lines.is_empty()
            || self.lines_total() != self.header.total
            || self
                .lines
                .iter()
                .any(|line| !matches!(line.flavors.len(), 0 | 2))
    }
}

/// Trait for reading and administering persisted orders of one organization.
#[async_trait]
pub trait OrderBook: Send + Sync {
    /// Lists orders, newest first, optionally filtered by status.
    async fn list_orders(
        &self,
        scope: OrganizationId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<StoredOrder>, GatewayError>;

    async fn get_order(
        &self,
        scope: OrganizationId,
        order_id: OrderId,
    ) -> Result<Option<StoredOrder>, GatewayError>;

    /// Moves an order to `status` if the status machine allows it.
    async fn update_status(
        &self,
        scope: OrganizationId,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<StoredOrder, OrderBookError>;

    /// Lists orders left incomplete by failed submissions.
    async fn list_orphaned(&self, scope: OrganizationId) -> Result<Vec<StoredOrder>, GatewayError>;
}

#[async_trait]
impl<T: OrderBook + ?Sized> OrderBook for Arc<T> {
    async fn list_orders(
        &self,
        scope: OrganizationId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<StoredOrder>, GatewayError> {
        (**self).list_orders(scope, status).await
    }

    async fn get_order(
        &self,
        scope: OrganizationId,
        order_id: OrderId,
    ) -> Result<Option<StoredOrder>, GatewayError> {
        (**self).get_order(scope, order_id).await
    }

    async fn update_status(
        &self,
        scope: OrganizationId,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<StoredOrder, OrderBookError> {
        (**self).update_status(scope, order_id, status).await
    }

    async fn list_orphaned(&self, scope: OrganizationId) -> Result<Vec<StoredOrder>, GatewayError> {
        (**self).list_orphaned(scope).await
    }
}
