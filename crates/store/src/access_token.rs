use async_trait::async_trait;
use checkout::{AccessTokenValidator, GatewayError};
use common::{CustomerId, OrganizationId};
use domain::{AccessGrant, GrantedCustomer};
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::{PostgresStore, Result};

impl PostgresStore {
    async fn fetch_grant(&self, token: &str) -> Result<Option<AccessGrant>> {
        let row = sqlx::query(
            r#"
            SELECT t.organization_id, o.name AS organization_name,
                   c.id AS customer_id, c.name AS customer_name, c.phone AS customer_phone
            FROM access_tokens t
            JOIN organizations o ON o.id = t.organization_id
            JOIN customers c ON c.id = t.customer_id
            WHERE t.token = $1 AND t.used_at IS NULL AND t.expires_at > NOW()
            "#,
        )
        .bind(token)
        .fetch_optional(self.pool())
        .await?;

        row.map(|row| grant_from_row(&row)).transpose()
    }

    /// Marks the token used in the same statement that checks it, so two
    /// concurrent claims cannot both see it unused.
    async fn claim_grant(&self, token: &str) -> Result<Option<AccessGrant>> {
        let row = sqlx::query(
            r#"
            WITH claimed AS (
                UPDATE access_tokens SET used_at = NOW()
                WHERE token = $1 AND used_at IS NULL AND expires_at > NOW()
                RETURNING organization_id, customer_id
            )
            SELECT t.organization_id, o.name AS organization_name,
                   c.id AS customer_id, c.name AS customer_name, c.phone AS customer_phone
            FROM claimed t
            JOIN organizations o ON o.id = t.organization_id
            JOIN customers c ON c.id = t.customer_id
            "#,
        )
        .bind(token)
        .fetch_optional(self.pool())
        .await?;

        row.map(|row| grant_from_row(&row)).transpose()
    }

    /// Returns false if the token does not exist.
    async fn release_token(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE access_tokens SET used_at = NULL WHERE token = $1")
            .bind(token)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn grant_from_row(row: &PgRow) -> Result<AccessGrant> {
    Ok(AccessGrant {
        organization_id: OrganizationId::from_uuid(row.try_get::<Uuid, _>("organization_id")?),
        organization_name: row.try_get("organization_name")?,
        customer: GrantedCustomer {
            id: CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
            name: row.try_get("customer_name")?,
            phone: row.try_get("customer_phone")?,
        },
    })
}

#[async_trait]
impl AccessTokenValidator for PostgresStore {
    #[tracing::instrument(skip_all)]
    async fn validate(&self, token: &str) -> Result<Option<AccessGrant>, GatewayError> {
        Ok(self.fetch_grant(token).await?)
    }

    #[tracing::instrument(skip_all)]
    async fn claim(&self, token: &str) -> Result<Option<AccessGrant>, GatewayError> {
        Ok(self.claim_grant(token).await?)
    }

    #[tracing::instrument(skip_all)]
    async fn release(&self, token: &str) -> Result<(), GatewayError> {
        if self.release_token(token).await? {
            Ok(())
        } else {
            Err(GatewayError::MissingReference("access token".to_string()))
        }
    }
}
