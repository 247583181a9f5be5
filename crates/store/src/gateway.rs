use async_trait::async_trait;
use checkout::{GatewayError, PersistenceGateway};
use common::{LineItemId, OrderId};
use domain::{OrderHeader, OrderLineComplement, OrderLineFlavor, OrderLineItem};

use crate::{PostgresStore, Result, StoreError};

fn to_i32(table: &'static str, quantity: u32) -> Result<i32> {
    i32::try_from(quantity).map_err(|_| StoreError::corrupt(table, "quantity out of range"))
}

impl PostgresStore {
    async fn write_header(&self, header: &OrderHeader) -> Result<OrderId> {
        let order_id = OrderId::new();
        sqlx::query(
            r#"
            INSERT INTO orders
                (id, organization_id, customer_id, payment_type, delivery_address, status, total_cents, note, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(header.organization_id.as_uuid())
        .bind(header.customer_id.as_uuid())
        .bind(header.payment_type.code())
        .bind(header.delivery_address.as_str())
        .bind(header.status.as_str())
        .bind(header.total.cents())
        .bind(&header.note)
        .bind(header.created_at)
        .execute(self.pool())
        .await?;
        Ok(order_id)
    }

    async fn write_line_item(&self, order_id: OrderId, line: &OrderLineItem) -> Result<LineItemId> {
        let line_item_id = LineItemId::new();
        sqlx::query(
            r#"
            INSERT INTO order_line_items (id, order_id, product_id, quantity, unit_value_cents, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(line_item_id.as_uuid())
        .bind(order_id.as_uuid())
        .bind(line.product_id.as_str())
        .bind(to_i32("order_line_items", line.quantity)?)
        .bind(line.unit_value.cents())
        .bind(&line.note)
        .execute(self.pool())
        .await?;
        Ok(line_item_id)
    }

    async fn write_flavor(&self, line_item_id: LineItemId, flavor: &OrderLineFlavor) -> Result<()> {
        sqlx::query(
            "INSERT INTO order_line_flavors (line_item_id, product_id, position) VALUES ($1, $2, $3)",
        )
        .bind(line_item_id.as_uuid())
        .bind(flavor.product_id.as_str())
        .bind(i16::from(flavor.position.as_u8()))
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn write_complement(
        &self,
        line_item_id: LineItemId,
        complement: &OrderLineComplement,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO order_line_complements (line_item_id, complement_id, quantity, value_cents)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(line_item_id.as_uuid())
        .bind(complement.complement_id.as_str())
        .bind(to_i32("order_line_complements", complement.quantity)?)
        .bind(complement.value.cents())
        .execute(self.pool())
        .await?;
        Ok(())
    }
}

/// Each write is its own statement; nothing spans a transaction.
#[async_trait]
impl PersistenceGateway for PostgresStore {
    #[tracing::instrument(skip(self, header), fields(scope = %header.organization_id))]
    async fn insert_order_header(&self, header: &OrderHeader) -> Result<OrderId, GatewayError> {
        Ok(self.write_header(header).await?)
    }

    #[tracing::instrument(skip(self, line))]
    async fn insert_order_line_item(
        &self,
        order_id: OrderId,
        line: &OrderLineItem,
    ) -> Result<LineItemId, GatewayError> {
        Ok(self.write_line_item(order_id, line).await?)
    }

    #[tracing::instrument(skip(self, flavor))]
    async fn insert_order_line_flavor(
        &self,
        line_item_id: LineItemId,
        flavor: &OrderLineFlavor,
    ) -> Result<(), GatewayError> {
        Ok(self.write_flavor(line_item_id, flavor).await?)
    }

    #[tracing::instrument(skip(self, complement))]
    async fn insert_order_line_complement(
        &self,
        line_item_id: LineItemId,
        complement: &OrderLineComplement,
    ) -> Result<(), GatewayError> {
        Ok(self.write_complement(line_item_id, complement).await?)
    }
}
