use chrono::{DateTime, Utc};
use common::{CustomerId, OrganizationId};
use domain::catalog::{CategoryRecord, ProductRecord};
use sqlx::PgPool;

use crate::Result;

/// PostgreSQL-backed storefront store.
///
/// One pool serves every port; clones share it.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    // Command methods
    //
    // Administrative writes used for seeding; ordering goes through the
    // service ports.

    /// Creates or renames an organization.
    pub async fn upsert_organization(&self, id: OrganizationId, name: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO organizations (id, name) VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
            "#,
        )
        .bind(id.as_uuid())
        .bind(name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Registers a customer of an organization.
    pub async fn insert_customer(
        &self,
        scope: OrganizationId,
        id: CustomerId,
        name: &str,
        phone: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO customers (id, organization_id, name, phone) VALUES ($1, $2, $3, $4)",
        )
        .bind(id.as_uuid())
        .bind(scope.as_uuid())
        .bind(name)
        .bind(phone)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Issues a single-use access token for a customer.
    pub async fn issue_access_token(
        &self,
        token: &str,
        scope: OrganizationId,
        customer_id: CustomerId,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO access_tokens (token, organization_id, customer_id, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(token)
        .bind(scope.as_uuid())
        .bind(customer_id.as_uuid())
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Replaces the whole menu of an organization in one transaction.
    ///
    /// Records are stored as given; list order becomes display order.
    #[tracing::instrument(skip(self, categories, products), fields(categories = categories.len(), products = products.len()))]
    pub async fn replace_menu(
        &self,
        scope: OrganizationId,
        categories: &[CategoryRecord],
        products: &[ProductRecord],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for table in ["product_extras", "product_complements", "products", "categories"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE organization_id = $1"))
                .bind(scope.as_uuid())
                .execute(&mut *tx)
                .await?;
        }

        for (sort_order, category) in (0i32..).zip(categories) {
            sqlx::query(
                r#"
                INSERT INTO categories (organization_id, id, name, allows_dual_composite, active, sort_order)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(scope.as_uuid())
            .bind(&category.id)
            .bind(&category.name)
            .bind(category.allows_dual_composite)
            .bind(category.active)
            .bind(sort_order)
            .execute(&mut *tx)
            .await?;
        }

        for (sort_order, product) in (0i32..).zip(products) {
            sqlx::query(
                r#"
                INSERT INTO products (organization_id, id, name, description, category_id, price, active, sort_order)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(scope.as_uuid())
            .bind(&product.id)
            .bind(&product.name)
            .bind(&product.description)
            .bind(&product.category_id)
            .bind(product.price)
            .bind(product.active)
            .bind(sort_order)
            .execute(&mut *tx)
            .await?;

            for (extra_order, extra) in (0i32..).zip(&product.extras) {
                sqlx::query(
                    r#"
                    INSERT INTO product_extras (organization_id, product_id, id, name, price, sort_order)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(scope.as_uuid())
                .bind(&product.id)
                .bind(&extra.id)
                .bind(&extra.name)
                .bind(extra.price)
                .bind(extra_order)
                .execute(&mut *tx)
                .await?;
            }

            for (complement_order, complement) in (0i32..).zip(&product.complements) {
                sqlx::query(
                    r#"
                    INSERT INTO product_complements
                        (organization_id, product_id, id, name, price, required, max_items, sort_order)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    "#,
                )
                .bind(scope.as_uuid())
                .bind(&product.id)
                .bind(&complement.id)
                .bind(&complement.name)
                .bind(complement.price)
                .bind(complement.required)
                .bind(complement.max_items)
                .bind(complement_order)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        tracing::info!("menu replaced");
        Ok(())
    }
}
