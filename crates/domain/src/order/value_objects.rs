//! Value objects for the order domain.

use chrono::{DateTime, Utc};
use common::{CatalogItemId, ComplementId, CustomerId, Money, OrganizationId};
use serde::{Deserialize, Serialize};

use super::access::AccessGrant;
use super::{OrderError, OrderStatus};
use crate::cart::FlavorPosition;

/// How the customer will pay on delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentType {
    #[serde(rename = "dinheiro")]
    Cash,
    #[serde(rename = "cartao")]
    Card,
    #[serde(rename = "pix")]
    Pix,
}

impl PaymentType {
    pub const ALL: [PaymentType; 3] = [PaymentType::Cash, PaymentType::Card, PaymentType::Pix];

    /// Returns the stored payment-type code.
    pub fn code(&self) -> &'static str {
        match self {
            PaymentType::Cash => "dinheiro",
            PaymentType::Card => "cartao",
            PaymentType::Pix => "pix",
        }
    }

    /// Human-readable label for the handoff message.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentType::Cash => "Dinheiro",
            PaymentType::Card => "Cartão",
            PaymentType::Pix => "PIX",
        }
    }
}

impl std::fmt::Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for PaymentType {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_lowercase();
        PaymentType::ALL
            .into_iter()
            .find(|payment| payment.code() == code)
            .ok_or_else(|| OrderError::UnknownPaymentType(s.to_string()))
    }
}

/// Free-text delivery address. Never blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryAddress(String);

impl DeliveryAddress {
    /// Returns `None` for blank input.
    pub fn parse(text: impl AsRef<str>) -> Option<Self> {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeliveryAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Header row of a persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderHeader {
    pub organization_id: OrganizationId,
    pub customer_id: CustomerId,
    pub payment_type: PaymentType,
    pub delivery_address: DeliveryAddress,
    pub status: OrderStatus,
    pub total: Money,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Persisted projection of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    /// The single item, or the flavor in position 1.
    pub product_id: CatalogItemId,
    pub quantity: u32,
    /// Unit price charged, add-ons included.
    pub unit_value: Money,
    pub note: Option<String>,
}

impl OrderLineItem {
    pub fn total(&self) -> Money {
        self.unit_value.multiply(self.quantity)
    }
}

/// One flavor of a dual line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineFlavor {
    pub product_id: CatalogItemId,
    pub position: FlavorPosition,
}

/// One complement of a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineComplement {
    pub complement_id: ComplementId,
    pub quantity: u32,
    /// Unit price times quantity, per unit of the line.
    pub value: Money,
}

/// Customer, payment and delivery fields collected at checkout.
///
/// Every field is optional while the customer fills the form in;
/// [`validate`](super::validate) reports the first missing one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutDetails {
    customer_id: Option<CustomerId>,
    customer_locked: bool,
    payment_type: Option<PaymentType>,
    delivery_address: Option<DeliveryAddress>,
    note: Option<String>,
}

impl CheckoutDetails {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-fills the customer from an access grant and locks it.
    pub fn from_grant(grant: &AccessGrant) -> Self {
        Self {
            customer_id: Some(grant.customer.id),
            customer_locked: true,
            ..Self::default()
        }
    }

    pub fn with_customer(mut self, customer_id: CustomerId) -> Result<Self, OrderError> {
        self.set_customer(customer_id)?;
        Ok(self)
    }

    pub fn with_payment_type(mut self, payment_type: PaymentType) -> Self {
        self.payment_type = Some(payment_type);
        self
    }

    pub fn with_delivery_address(mut self, address: DeliveryAddress) -> Self {
        self.delivery_address = Some(address);
        self
    }

    /// Sets the order-level note. Blank clears it.
    pub fn with_note(mut self, note: impl AsRef<str>) -> Self {
        let trimmed = note.as_ref().trim();
        self.note = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// Changes the customer unless an access grant locked it. Setting the
    /// same customer again is always allowed.
    pub fn set_customer(&mut self, customer_id: CustomerId) -> Result<(), OrderError> {
        if self.customer_locked && self.customer_id != Some(customer_id) {
            return Err(OrderError::CustomerLocked);
        }
        self.customer_id = Some(customer_id);
        Ok(())
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn is_customer_locked(&self) -> bool {
        self.customer_locked
    }

    pub fn payment_type(&self) -> Option<PaymentType> {
        self.payment_type
    }

    pub fn delivery_address(&self) -> Option<&DeliveryAddress> {
        self.delivery_address.as_ref()
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }
}
