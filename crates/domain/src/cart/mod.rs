//! Cart composition.
//!
//! A cart is an ordered list of lines. Each line pairs a
//! [`LineItemConfiguration`] with a quantity, and two configurations that
//! produce the same [`IdentityKey`] always share a line.

mod aggregate;
mod configuration;
mod identity;
mod pricing;

pub use aggregate::{Cart, CartEvent, CartLine, CartState, MAX_LINE_QUANTITY};
pub use configuration::{
    BaseSelection, ConfigurationError, FlavorComponent, FlavorPosition, LineItemConfiguration,
    SelectedComplement,
};
pub use identity::{IdentityKey, identity_key};
pub use pricing::{
    base_price, cart_total, complement_unit_price, complements_price, extras_price, line_total,
    resolve_complement, resolve_extra, unit_price,
};
