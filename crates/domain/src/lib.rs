//! Domain layer for the storefront ordering engine.
//!
//! This crate provides:
//! - The typed menu catalog and the mapping from raw fetched records
//! - Line-item configuration, identity keys and pricing rules
//! - The cart aggregate
//! - Order composition: validation and persistence planning
//! - Order status machine and the plain-text handoff summary

pub mod cart;
pub mod catalog;
pub mod order;

pub use cart::{
    BaseSelection, Cart, CartEvent, CartLine, CartState, ConfigurationError, FlavorComponent,
    FlavorPosition, IdentityKey, LineItemConfiguration, MAX_LINE_QUANTITY, SelectedComplement,
    cart_total, identity_key, line_total, unit_price,
};
pub use catalog::{
    Catalog, CatalogItem, Category, ComplementOption, ExtraOption, MappedCatalog, RecordError,
};
pub use common::{
    CatalogItemId, CategoryId, ComplementId, CustomerId, ExtraId, LineItemId, Money, OrderId,
    OrganizationId,
};
pub use order::{
    AccessGrant, CheckoutDetails, CompositionState, DeliveryAddress, GrantedCustomer,
    OrderError, OrderHeader, OrderLineComplement, OrderLineFlavor, OrderLineItem, OrderStatus,
    OrderSummary, PaymentType, PersistencePlan, PlannedLine, RequiredField, SummaryLine,
    ValidatedOrder, ValidationError, build_persistence_plan, build_persistence_plan_at, validate,
};
