use std::collections::HashMap;

use async_trait::async_trait;
use checkout::{GatewayError, OrderBook, OrderBookError, StoredLine, StoredOrder};
use common::{CatalogItemId, ComplementId, CustomerId, LineItemId, Money, OrderId, OrganizationId};
use domain::{
    DeliveryAddress, FlavorPosition, OrderHeader, OrderLineComplement, OrderLineFlavor,
    OrderLineItem, OrderStatus, PaymentType,
};
use sqlx::{Row, postgres::PgRow};
use uuid::Uuid;

use crate::{PostgresStore, Result, StoreError};

const ORDER_COLUMNS: &str = "id, organization_id, customer_id, payment_type, delivery_address, status, total_cents, note, created_at";

fn row_to_header(row: &PgRow) -> Result<(OrderId, OrderHeader)> {
    let payment_type: String = row.try_get("payment_type")?;
    let delivery_address: String = row.try_get("delivery_address")?;
    let status: String = row.try_get("status")?;

    let header = OrderHeader {
        organization_id: OrganizationId::from_uuid(row.try_get::<Uuid, _>("organization_id")?),
        customer_id: CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
        payment_type: payment_type
            .parse::<PaymentType>()
            .map_err(|e| StoreError::corrupt("orders", e))?,
        delivery_address: DeliveryAddress::parse(&delivery_address)
            .ok_or_else(|| StoreError::corrupt("orders", "blank delivery address"))?,
        status: status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::corrupt("orders", e))?,
        total: Money::from_cents(row.try_get("total_cents")?),
        note: row.try_get("note")?,
        created_at: row.try_get("created_at")?,
    };
    Ok((OrderId::from_uuid(row.try_get::<Uuid, _>("id")?), header))
}

fn quantity(table: &'static str, row: &PgRow) -> Result<u32> {
    let quantity: i32 = row.try_get("quantity")?;
    u32::try_from(quantity).map_err(|_| StoreError::corrupt(table, "negative quantity"))
}

fn row_to_line(row: &PgRow) -> Result<(OrderId, StoredLine)> {
    let product_id: String = row.try_get("product_id")?;
    let line = StoredLine {
        id: LineItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
        item: OrderLineItem {
            product_id: CatalogItemId::parse(product_id)
                .map_err(|e| StoreError::corrupt("order_line_items", e))?,
            quantity: quantity("order_line_items", row)?,
            unit_value: Money::from_cents(row.try_get("unit_value_cents")?),
            note: row.try_get("note")?,
        },
        flavors: Vec::new(),
        complements: Vec::new(),
    };
    Ok((OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?), line))
}

fn row_to_flavor(row: &PgRow) -> Result<(LineItemId, OrderLineFlavor)> {
    let product_id: String = row.try_get("product_id")?;
    let position: i16 = row.try_get("position")?;
    let position = u8::try_from(position)
        .map_err(|_| StoreError::corrupt("order_line_flavors", "position out of range"))
        .and_then(|p| {
            FlavorPosition::try_from(p).map_err(|e| StoreError::corrupt("order_line_flavors", e))
        })?;

    Ok((
        LineItemId::from_uuid(row.try_get::<Uuid, _>("line_item_id")?),
        OrderLineFlavor {
            product_id: CatalogItemId::parse(product_id)
                .map_err(|e| StoreError::corrupt("order_line_flavors", e))?,
            position,
        },
    ))
}

fn row_to_complement(row: &PgRow) -> Result<(LineItemId, OrderLineComplement)> {
    let complement_id: String = row.try_get("complement_id")?;
    Ok((
        LineItemId::from_uuid(row.try_get::<Uuid, _>("line_item_id")?),
        OrderLineComplement {
            complement_id: ComplementId::parse(complement_id)
                .map_err(|e| StoreError::corrupt("order_line_complements", e))?,
            quantity: quantity("order_line_complements", row)?,
            value: Money::from_cents(row.try_get("value_cents")?),
        },
    ))
}

impl PostgresStore {
    /// Attaches lines, flavors and complements to fetched order headers.
    ///
    /// Header order is preserved; lines keep insertion order, flavors
    /// position order and complements insertion order.
    async fn assemble_orders(&self, rows: Vec<PgRow>) -> Result<Vec<StoredOrder>> {
        let mut orders = rows
            .iter()
            .map(|row| {
                row_to_header(row).map(|(id, header)| StoredOrder {
                    id,
                    header,
                    lines: Vec::new(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        if orders.is_empty() {
            return Ok(orders);
        }

        let order_ids: Vec<Uuid> = orders.iter().map(|order| order.id.as_uuid()).collect();
        let line_rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, quantity, unit_value_cents, note
            FROM order_line_items
            WHERE order_id = ANY($1)
            ORDER BY seq ASC
            "#,
        )
        .bind(&order_ids)
        .fetch_all(self.pool())
        .await?;

        let mut lines: Vec<(OrderId, StoredLine)> = line_rows
            .iter()
            .map(row_to_line)
            .collect::<Result<Vec<_>>>()?;

        if !lines.is_empty() {
            let line_ids: Vec<Uuid> = lines.iter().map(|(_, line)| line.id.as_uuid()).collect();

            let flavor_rows = sqlx::query(
                r#"
                SELECT line_item_id, product_id, position
                FROM order_line_flavors
                WHERE line_item_id = ANY($1)
                ORDER BY position ASC
                "#,
            )
            .bind(&line_ids)
            .fetch_all(self.pool())
            .await?;

            let complement_rows = sqlx::query(
                r#"
                SELECT line_item_id, complement_id, quantity, value_cents
                FROM order_line_complements
                WHERE line_item_id = ANY($1)
                ORDER BY seq ASC
                "#,
            )
            .bind(&line_ids)
            .fetch_all(self.pool())
            .await?;

            let mut flavors: HashMap<LineItemId, Vec<OrderLineFlavor>> = HashMap::new();
            for row in &flavor_rows {
                let (line_id, flavor) = row_to_flavor(row)?;
                flavors.entry(line_id).or_default().push(flavor);
            }
            let mut complements: HashMap<LineItemId, Vec<OrderLineComplement>> = HashMap::new();
            for row in &complement_rows {
                let (line_id, complement) = row_to_complement(row)?;
                complements.entry(line_id).or_default().push(complement);
            }

            for (_, line) in &mut lines {
                line.flavors = flavors.remove(&line.id).unwrap_or_default();
                line.complements = complements.remove(&line.id).unwrap_or_default();
            }
        }

        let mut by_order: HashMap<OrderId, Vec<StoredLine>> = HashMap::new();
        for (order_id, line) in lines {
            by_order.entry(order_id).or_default().push(line);
        }
        for order in &mut orders {
            order.lines = by_order.remove(&order.id).unwrap_or_default();
        }
        Ok(orders)
    }

    // Query methods

    async fn fetch_orders(
        &self,
        scope: OrganizationId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<StoredOrder>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE organization_id = $1 AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY created_at DESC, id ASC
            "#
        ))
        .bind(scope.as_uuid())
        .bind(status.map(|s| s.as_str()))
        .fetch_all(self.pool())
        .await?;

        self.assemble_orders(rows).await
    }

    async fn fetch_order(&self, scope: OrganizationId, order_id: OrderId) -> Result<Option<StoredOrder>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE organization_id = $1 AND id = $2"
        ))
        .bind(scope.as_uuid())
        .bind(order_id.as_uuid())
        .fetch_all(self.pool())
        .await?;

        Ok(self.assemble_orders(rows).await?.into_iter().next())
    }

    async fn fetch_orphaned(&self, scope: OrganizationId) -> Result<Vec<StoredOrder>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders o
            WHERE o.organization_id = $1
              AND (
                o.total_cents <> (
                    SELECT COALESCE(SUM(l.unit_value_cents * l.quantity), 0)
                    FROM order_line_items l
                    WHERE l.order_id = o.id
                )
                OR EXISTS (
                    SELECT 1
                    FROM order_line_items l
                    WHERE l.order_id = o.id
                      AND (SELECT COUNT(*) FROM order_line_flavors f WHERE f.line_item_id = l.id)
                          NOT IN (0, 2)
                )
              )
            ORDER BY o.created_at DESC, o.id ASC
            "#
        ))
        .bind(scope.as_uuid())
        .fetch_all(self.pool())
        .await?;

        let orders = self.assemble_orders(rows).await?;
        Ok(orders.into_iter().filter(StoredOrder::is_orphaned).collect())
    }

    // Command methods

    /// Locks the order row, checks the transition and writes the new status.
    async fn write_status(
        &self,
        scope: OrganizationId,
        order_id: OrderId,
        target: OrderStatus,
    ) -> Result<(), OrderBookError> {
        let mut tx = self.pool().begin().await.map_err(StoreError::from)?;

        let current: String = sqlx::query_scalar(
            "SELECT status FROM orders WHERE organization_id = $1 AND id = $2 FOR UPDATE",
        )
        .bind(scope.as_uuid())
        .bind(order_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(StoreError::from)?
        .ok_or(OrderBookError::NotFound(order_id))?;

        let current = current
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::corrupt("orders", e))?;
        current.transition(target)?;

        sqlx::query("UPDATE orders SET status = $1 WHERE id = $2")
            .bind(target.as_str())
            .bind(order_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;

        tx.commit().await.map_err(StoreError::from)?;
        tracing::info!(%order_id, from = %current, to = %target, "order status updated");
        Ok(())
    }
}

#[async_trait]
impl OrderBook for PostgresStore {
    #[tracing::instrument(skip(self))]
    async fn list_orders(
        &self,
        scope: OrganizationId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<StoredOrder>, GatewayError> {
        Ok(self.fetch_orders(scope, status).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn get_order(
        &self,
        scope: OrganizationId,
        order_id: OrderId,
    ) -> Result<Option<StoredOrder>, GatewayError> {
        Ok(self.fetch_order(scope, order_id).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn update_status(
        &self,
        scope: OrganizationId,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<StoredOrder, OrderBookError> {
        self.write_status(scope, order_id, status).await?;
        self.fetch_order(scope, order_id)
            .await?
            .ok_or(OrderBookError::NotFound(order_id))
    }

    #[tracing::instrument(skip(self))]
    async fn list_orphaned(&self, scope: OrganizationId) -> Result<Vec<StoredOrder>, GatewayError> {
        Ok(self.fetch_orphaned(scope).await?)
    }
}
