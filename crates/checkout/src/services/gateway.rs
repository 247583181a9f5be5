//! Persistence gateway trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{LineItemId, OrderId, OrganizationId};
use domain::{OrderHeader, OrderLineComplement, OrderLineFlavor, OrderLineItem, OrderStatus};
use tokio::sync::RwLock;

use super::order_book::{OrderBook, StoredLine, StoredOrder};
use crate::error::{GatewayError, OrderBookError, SubmissionStage};

/// Trait for writing order rows.
///
/// Each call is an independent write. Callers are responsible for
/// ordering: a header before its lines, a line before its flavors and
/// complements.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn insert_order_header(&self, header: &OrderHeader) -> Result<OrderId, GatewayError>;

    async fn insert_order_line_item(
        &self,
        order_id: OrderId,
        line: &OrderLineItem,
    ) -> Result<LineItemId, GatewayError>;

    async fn insert_order_line_flavor(
        &self,
        line_item_id: LineItemId,
        flavor: &OrderLineFlavor,
    ) -> Result<(), GatewayError>;

    async fn insert_order_line_complement(
        &self,
        line_item_id: LineItemId,
        complement: &OrderLineComplement,
    ) -> Result<(), GatewayError>;
}

#[async_trait]
impl<T: PersistenceGateway + ?Sized> PersistenceGateway for Arc<T> {
    async fn insert_order_header(&self, header: &OrderHeader) -> Result<OrderId, GatewayError> {
        (**self).insert_order_header(header).await
    }

    async fn insert_order_line_item(
        &self,
        order_id: OrderId,
        line: &OrderLineItem,
    ) -> Result<LineItemId, GatewayError> {
        (**self).insert_order_line_item(order_id, line).await
    }

    async fn insert_order_line_flavor(
        &self,
        line_item_id: LineItemId,
        flavor: &OrderLineFlavor,
    ) -> Result<(), GatewayError> {
        (**self).insert_order_line_flavor(line_item_id, flavor).await
    }

    async fn insert_order_line_complement(
        &self,
        line_item_id: LineItemId,
        complement: &OrderLineComplement,
    ) -> Result<(), GatewayError> {
        (**self)
            .insert_order_line_complement(line_item_id, complement)
            .await
    }
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    orders: Vec<StoredOrder>,
    write_log: Vec<SubmissionStage>,
    calls: HashMap<SubmissionStage, usize>,
    fail_on: Option<(SubmissionStage, usize)>,
}

impl InMemoryGatewayState {
    /// Counts the call and reports whether it should fail.
    fn record_call(&mut self, stage: SubmissionStage) -> Result<(), GatewayError> {
        let count = self.calls.entry(stage).or_insert(0);
        *count += 1;
        if self.fail_on == Some((stage, *count)) {
            return Err(GatewayError::Unavailable(format!(
                "injected failure on {stage} #{count}"
            )));
        }
        Ok(())
    }

    fn line_mut(&mut self, line_item_id: LineItemId) -> Option<&mut StoredLine> {
        self.orders
            .iter_mut()
            .flat_map(|order| order.lines.iter_mut())
            .find(|line| line.id == line_item_id)
    }
}

/// In-memory persistence gateway for testing and demo mode.
///
/// Also serves as the order book over what it stored.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPersistenceGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPersistenceGateway {
    /// Creates a new empty gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the `occurrence`-th call (1-based, counted since creation) of
    /// the given write fail.
    pub async fn fail_on(&self, stage: SubmissionStage, occurrence: usize) {
        self.state.write().await.fail_on = Some((stage, occurrence));
    }

    /// Removes any configured failure.
    pub async fn clear_failure(&self) {
        self.state.write().await.fail_on = None;
    }

    /// Returns the successful writes in the order they happened.
    pub async fn write_log(&self) -> Vec<SubmissionStage> {
        self.state.read().await.write_log.clone()
    }

    /// Returns the number of stored order headers.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns a stored order regardless of organization.
    pub async fn order(&self, order_id: OrderId) -> Option<StoredOrder> {
        self.state
            .read()
            .await
            .orders
            .iter()
            .find(|order| order.id == order_id)
            .cloned()
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryPersistenceGateway {
    async fn insert_order_header(&self, header: &OrderHeader) -> Result<OrderId, GatewayError> {
        let mut state = self.state.write().await;
        state.record_call(SubmissionStage::Header)?;

        let order_id = OrderId::new();
        state.orders.push(StoredOrder {
            id: order_id,
            header: header.clone(),
            lines: Vec::new(),
        });
        state.write_log.push(SubmissionStage::Header);
        Ok(order_id)
    }

    async fn insert_order_line_item(
        &self,
        order_id: OrderId,
        line: &OrderLineItem,
    ) -> Result<LineItemId, GatewayError> {
        let mut state = self.state.write().await;
        state.record_call(SubmissionStage::LineItem)?;

        let order = state
            .orders
            .iter_mut()
            .find(|order| order.id == order_id)
            .ok_or_else(|| GatewayError::MissingReference(format!("order {order_id}")))?;

        let line_item_id = LineItemId::new();
        order.lines.push(StoredLine {
            id: line_item_id,
            item: line.clone(),
            flavors: Vec::new(),
            complements: Vec::new(),
        });
        state.write_log.push(SubmissionStage::LineItem);
        Ok(line_item_id)
    }

    async fn insert_order_line_flavor(
        &self,
        line_item_id: LineItemId,
        flavor: &OrderLineFlavor,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.write().await;
        state.record_call(SubmissionStage::Flavor)?;

        let line = state
            .line_mut(line_item_id)
            .ok_or_else(|| GatewayError::MissingReference(format!("line item {line_item_id}")))?;
        if line.flavors.iter().any(|f| f.position == flavor.position) {
            return Err(GatewayError::Rejected(format!(
                "line item {line_item_id} already has a flavor at position {}",
                flavor.position
            )));
        }
        line.flavors.push(flavor.clone());
        state.write_log.push(SubmissionStage::Flavor);
        Ok(())
    }

    async fn insert_order_line_complement(
        &self,
        line_item_id: LineItemId,
        complement: &OrderLineComplement,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.write().await;
        state.record_call(SubmissionStage::Complement)?;

        let line = state
            .line_mut(line_item_id)
            .ok_or_else(|| GatewayError::MissingReference(format!("line item {line_item_id}")))?;
        line.complements.push(complement.clone());
        state.write_log.push(SubmissionStage::Complement);
        Ok(())
    }
}

#[async_trait]
impl OrderBook for InMemoryPersistenceGateway {
    async fn list_orders(
        &self,
        scope: OrganizationId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<StoredOrder>, GatewayError> {
        let state = self.state.read().await;
        let mut orders: Vec<StoredOrder> = state
            .orders
            .iter()
            .filter(|order| order.header.organization_id == scope)
            .filter(|order| status.is_none_or(|s| order.header.status == s))
            .cloned()
            .collect();
        orders.reverse();
        orders.sort_by(|a, b| b.header.created_at.cmp(&a.header.created_at));
        Ok(orders)
    }

    async fn get_order(
        &self,
        scope: OrganizationId,
        order_id: OrderId,
    ) -> Result<Option<StoredOrder>, GatewayError> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .find(|order| order.id == order_id && order.header.organization_id == scope)
            .cloned())
    }

    async fn update_status(
        &self,
        scope: OrganizationId,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<StoredOrder, OrderBookError> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .iter_mut()
            .find(|order| order.id == order_id && order.header.organization_id == scope)
            .ok_or(OrderBookError::NotFound(order_id))?;

        order.header.status = order.header.status.transition(status)?;
        Ok(order.clone())
    }

    async fn list_orphaned(&self, scope: OrganizationId) -> Result<Vec<StoredOrder>, GatewayError> {
        let orders = self.list_orders(scope, None).await?;
        Ok(orders.into_iter().filter(StoredOrder::is_orphaned).collect())
    }
}
