//! Service ports and in-memory implementations.

pub mod access_token;
pub mod catalog;
pub mod gateway;
pub mod order_book;

pub use access_token::{AccessTokenValidator, InMemoryAccessTokenValidator};
pub use catalog::{CatalogProvider, InMemoryCatalogProvider};
pub use gateway::{InMemoryPersistenceGateway, PersistenceGateway};
pub use order_book::{OrderBook, StoredLine, StoredOrder};
