use std::collections::HashMap;

use async_trait::async_trait;
use checkout::{CatalogProvider, GatewayError};
use common::OrganizationId;
use domain::catalog::{CategoryRecord, ComplementRecord, ExtraRecord, ProductRecord};
use sqlx::Row;

use crate::{PostgresStore, Result};

impl PostgresStore {
    async fn fetch_categories(&self, scope: OrganizationId) -> Result<Vec<CategoryRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, allows_dual_composite, active
            FROM categories
            WHERE organization_id = $1
            ORDER BY sort_order ASC, id ASC
            "#,
        )
        .bind(scope.as_uuid())
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| -> Result<CategoryRecord> {
                Ok(CategoryRecord {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    allows_dual_composite: row.try_get("allows_dual_composite")?,
                    active: row.try_get("active")?,
                })
            })
            .collect()
    }

    async fn fetch_products(&self, scope: OrganizationId) -> Result<Vec<ProductRecord>> {
        let product_rows = sqlx::query(
            r#"
            SELECT id, name, description, category_id, price, active
            FROM products
            WHERE organization_id = $1
            ORDER BY sort_order ASC, id ASC
            "#,
        )
        .bind(scope.as_uuid())
        .fetch_all(self.pool())
        .await?;

        let extra_rows = sqlx::query(
            r#"
            SELECT product_id, id, name, price
            FROM product_extras
            WHERE organization_id = $1
            ORDER BY sort_order ASC, id ASC
            "#,
        )
        .bind(scope.as_uuid())
        .fetch_all(self.pool())
        .await?;

        let complement_rows = sqlx::query(
            r#"
            SELECT product_id, id, name, price, required, max_items
            FROM product_complements
            WHERE organization_id = $1
            ORDER BY sort_order ASC, id ASC
            "#,
        )
        .bind(scope.as_uuid())
        .fetch_all(self.pool())
        .await?;

        let mut extras: HashMap<String, Vec<ExtraRecord>> = HashMap::new();
        for row in &extra_rows {
            extras
                .entry(row.try_get("product_id")?)
                .or_default()
                .push(ExtraRecord {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    price: row.try_get("price")?,
                });
        }

        let mut complements: HashMap<String, Vec<ComplementRecord>> = HashMap::new();
        for row in &complement_rows {
            complements
                .entry(row.try_get("product_id")?)
                .or_default()
                .push(ComplementRecord {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    price: row.try_get("price")?,
                    required: row.try_get("required")?,
                    max_items: row.try_get("max_items")?,
                });
        }

        product_rows
            .iter()
            .map(|row| -> Result<ProductRecord> {
                let id: String = row.try_get("id")?;
                Ok(ProductRecord {
                    name: row.try_get("name")?,
                    description: row.try_get("description")?,
                    category_id: row.try_get("category_id")?,
                    price: row.try_get("price")?,
                    active: row.try_get("active")?,
                    extras: extras.remove(&id).unwrap_or_default(),
                    complements: complements.remove(&id).unwrap_or_default(),
                    id,
                })
            })
            .collect()
    }
}

/// Raw rows only; validation happens in the catalog mapper.
#[async_trait]
impl CatalogProvider for PostgresStore {
    #[tracing::instrument(skip(self))]
    async fn list_categories(
        &self,
        scope: OrganizationId,
    ) -> Result<Vec<CategoryRecord>, GatewayError> {
        Ok(self.fetch_categories(scope).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn list_items(&self, scope: OrganizationId) -> Result<Vec<ProductRecord>, GatewayError> {
        Ok(self.fetch_products(scope).await?)
    }
}
