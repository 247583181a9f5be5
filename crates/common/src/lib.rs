//! Shared types for the storefront ordering engine.
//!
//! - UUID-backed identifiers for persisted rows (orders, line items, customers, organizations)
//! - Identifier-safe string identifiers for catalog entries
//! - [`Money`] amounts held as integer cents

pub mod ids;
pub mod money;

pub use ids::{
    CatalogItemId, CategoryId, ComplementId, CustomerId, ExtraId, IdError, LineItemId, OrderId,
    OrganizationId,
};
pub use money::{Money, MoneyError};
