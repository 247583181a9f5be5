//! Checkout for the storefront ordering engine.
//!
//! This crate provides:
//! - The service ports the engine talks to (persistence gateway, catalog
//!   provider, access tokens, order book) with in-memory implementations
//! - [`submit`], the strictly sequential write of a persistence plan
//! - [`CheckoutCoordinator`], which runs validate → plan → submit and
//!   clears the cart only after a confirmed write
//!
//! A failed submission is never rolled back. The error names the stage
//! that failed and, when the header was already written, the id of the
//! orphaned order.

pub mod coordinator;
pub mod error;
pub mod services;
pub mod submission;

pub use coordinator::{CheckoutCoordinator, CheckoutReceipt};
pub use error::{CheckoutError, GatewayError, OrderBookError, SubmissionError, SubmissionStage};
pub use services::{
    AccessTokenValidator, CatalogProvider, InMemoryAccessTokenValidator, InMemoryCatalogProvider,
    InMemoryPersistenceGateway, OrderBook, PersistenceGateway, StoredLine, StoredOrder,
};
pub use submission::{OrderConfirmation, submit};
