//! Order composition and related types.

mod access;
mod composer;
mod composition;
mod state;
mod summary;
mod value_objects;

pub use access::{AccessGrant, GrantedCustomer};
pub use composer::{
    PersistencePlan, PlannedLine, RequiredField, ValidatedOrder, ValidationError,
    build_persistence_plan, build_persistence_plan_at, validate,
};
pub use composition::CompositionState;
pub use state::OrderStatus;
pub use summary::{OrderSummary, SummaryLine};
pub use value_objects::{
    CheckoutDetails, DeliveryAddress, OrderHeader, OrderLineComplement, OrderLineFlavor,
    OrderLineItem, PaymentType,
};

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Order status cannot move to the requested status.
    #[error("Invalid status transition: cannot go from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// Composition cannot move to the requested state.
    #[error("Invalid composition transition: cannot go from {from} to {to}")]
    InvalidCompositionTransition {
        from: CompositionState,
        to: CompositionState,
    },

    /// Unrecognized order status code.
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),

    /// Unrecognized payment type code.
    #[error("Unknown payment type: {0}")]
    UnknownPaymentType(String),

    /// The customer was fixed by an access grant and cannot be changed.
    #[error("Customer is locked by the access grant")]
    CustomerLocked,
}
