//! Shared application state.

use std::sync::Arc;

use checkout::{
    AccessTokenValidator, CatalogProvider, CheckoutCoordinator, InMemoryAccessTokenValidator,
    InMemoryCatalogProvider, InMemoryPersistenceGateway, OrderBook, PersistenceGateway,
};
use chrono::{Duration, Utc};
use common::OrganizationId;
use domain::{AccessGrant, Catalog, GrantedCustomer};
use store::PostgresStore;

use crate::config::Config;
use crate::demo;
use crate::error::ApiError;

pub type Coordinator =
    CheckoutCoordinator<Arc<dyn PersistenceGateway>, Arc<dyn AccessTokenValidator>>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    /// Organization whose menu and orders this server handles.
    pub scope: OrganizationId,
    pub restaurant_name: String,
    pub restaurant_whatsapp: Option<String>,
    pub catalog: Arc<dyn CatalogProvider>,
    pub order_book: Arc<dyn OrderBook>,
    pub coordinator: Coordinator,
}

impl AppState {
    /// Fetches and maps the current menu.
    pub async fn load_catalog(&self) -> Result<Catalog, ApiError> {
        Ok(self.catalog.load_catalog(self.scope).await?.catalog)
    }
}

/// Builds state backed by PostgreSQL.
pub fn create_postgres_state(
    config: &Config,
    store: PostgresStore,
    scope: OrganizationId,
) -> Arc<AppState> {
    let store = Arc::new(store);
    let gateway: Arc<dyn PersistenceGateway> = store.clone();
    let tokens: Arc<dyn AccessTokenValidator> = store.clone();
    Arc::new(AppState {
        scope,
        restaurant_name: config.restaurant_name.clone(),
        restaurant_whatsapp: config.restaurant_whatsapp.clone(),
        catalog: store.clone(),
        order_book: store,
        coordinator: CheckoutCoordinator::new(gateway, tokens),
    })
}

/// Builds in-memory state seeded with the demo menu, customer and token.
pub async fn create_demo_state(config: &Config) -> Arc<AppState> {
    let scope = config.organization_id.unwrap_or_else(demo::organization);

    let catalog = InMemoryCatalogProvider::new();
    catalog
        .set_menu(scope, demo::categories(), demo::products())
        .await;

    let tokens = InMemoryAccessTokenValidator::new();
    tokens
        .issue(
            demo::DEMO_ACCESS_TOKEN,
            AccessGrant {
                organization_id: scope,
                organization_name: config.restaurant_name.clone(),
                customer: GrantedCustomer {
                    id: demo::customer(),
                    name: "Cliente Demo".to_string(),
                    phone: None,
                },
            },
            Utc::now() + Duration::days(30),
        )
        .await;

    let gateway = Arc::new(InMemoryPersistenceGateway::new());
    let writer: Arc<dyn PersistenceGateway> = gateway.clone();
    let tokens: Arc<dyn AccessTokenValidator> = Arc::new(tokens);
    Arc::new(AppState {
        scope,
        restaurant_name: config.restaurant_name.clone(),
        restaurant_whatsapp: config.restaurant_whatsapp.clone(),
        catalog: Arc::new(catalog),
        order_book: gateway,
        coordinator: CheckoutCoordinator::new(writer, tokens),
    })
}
