//! Catalog provider trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::OrganizationId;
use domain::catalog::{CategoryRecord, MappedCatalog, ProductRecord, map_catalog};
use tokio::sync::RwLock;

use crate::error::GatewayError;

/// Trait for fetching one organization's menu.
///
/// Providers return raw records; mapping into typed catalog entries
/// happens in [`load_catalog`](CatalogProvider::load_catalog).
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn list_categories(
        &self,
        scope: OrganizationId,
    ) -> Result<Vec<CategoryRecord>, GatewayError>;

    /// Products with their extras and complements.
    async fn list_items(&self, scope: OrganizationId) -> Result<Vec<ProductRecord>, GatewayError>;

    /// Fetches and maps the whole menu.
    #[tracing::instrument(skip(self))]
    async fn load_catalog(&self, scope: OrganizationId) -> Result<MappedCatalog, GatewayError> {
        let categories = self.list_categories(scope).await?;
        let items = self.list_items(scope).await?;
        let mapped = map_catalog(scope, categories, items);
        tracing::info!(
            items = mapped.catalog.len(),
            rejected = mapped.rejected.len(),
            "catalog loaded"
        );
        Ok(mapped)
    }
}

#[async_trait]
impl<T: CatalogProvider + ?Sized> CatalogProvider for Arc<T> {
    async fn list_categories(
        &self,
        scope: OrganizationId,
    ) -> Result<Vec<CategoryRecord>, GatewayError> {
        (**self).list_categories(scope).await
    }

    async fn list_items(&self, scope: OrganizationId) -> Result<Vec<ProductRecord>, GatewayError> {
        (**self).list_items(scope).await
    }
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    menus: HashMap<OrganizationId, (Vec<CategoryRecord>, Vec<ProductRecord>)>,
    unavailable: bool,
}

/// In-memory catalog provider for testing and demo mode.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogProvider {
    state: Arc<RwLock<InMemoryCatalogState>>,
}

impl InMemoryCatalogProvider {
    /// Creates a new provider with no menus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the menu of an organization.
    pub async fn set_menu(
        &self,
        scope: OrganizationId,
        categories: Vec<CategoryRecord>,
        products: Vec<ProductRecord>,
    ) {
        self.state
            .write()
            .await
            .menus
            .insert(scope, (categories, products));
    }

    /// Makes every fetch fail.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }
}

#[async_trait]
impl CatalogProvider for InMemoryCatalogProvider {
    async fn list_categories(
        &self,
        scope: OrganizationId,
    ) -> Result<Vec<CategoryRecord>, GatewayError> {
        let state = self.state.read().await;
        if state.unavailable {
            return Err(GatewayError::Unavailable("catalog offline".to_string()));
        }
        Ok(state
            .menus
            .get(&scope)
            .map(|(categories, _)| categories.clone())
            .unwrap_or_default())
    }

    async fn list_items(&self, scope: OrganizationId) -> Result<Vec<ProductRecord>, GatewayError> {
        let state = self.state.read().await;
        if state.unavailable {
            return Err(GatewayError::Unavailable("catalog offline".to_string()));
        }
        Ok(state
            .menus
            .get(&scope)
            .map(|(_, products)| products.clone())
            .unwrap_or_default())
    }
}
