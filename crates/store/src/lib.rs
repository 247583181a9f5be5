//! PostgreSQL storage for the storefront ordering engine.
//!
//! [`PostgresStore`] implements every service port the checkout crate
//! defines: the persistence gateway, the catalog provider, the order book
//! and the access-token validator. All queries are scoped by organization.

pub mod access_token;
pub mod catalog;
pub mod error;
pub mod gateway;
pub mod order_book;
pub mod store;

pub use error::{Result, StoreError};
pub use store::PostgresStore;
