//! Cart aggregate implementation.

use common::{CatalogItemId, Money};
use serde::{Deserialize, Serialize};

use super::configuration::{ConfigurationError, LineItemConfiguration};
use super::identity::IdentityKey;
use super::pricing;
use crate::catalog::Catalog;

/// Largest quantity a single cart line accepts through [`Cart::add_many`].
pub const MAX_LINE_QUANTITY: u32 = 999;

/// Whether the cart holds anything.
///
/// ```text
/// Empty ──add──► NonEmpty ──remove last line / clear──► Empty
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartState {
    Empty,
    NonEmpty,
}

/// Something that happened to the cart.
///
/// Commands return the event they produced so callers can react to it,
/// for example to show "added to cart" feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CartEvent {
    /// A configuration not yet in the cart was added.
    LineAdded {
        key: IdentityKey,
        configuration: LineItemConfiguration,
        quantity: u32,
    },
    QuantityChanged {
        key: IdentityKey,
        from: u32,
        to: u32,
    },
    LineRemoved {
        key: IdentityKey,
    },
    Cleared,
}

impl CartEvent {
    /// Returns the key of the affected line, if the event concerns one line.
    pub fn key(&self) -> Option<&IdentityKey> {
        match self {
            CartEvent::LineAdded { key, .. }
            | CartEvent::QuantityChanged { key, .. }
            | CartEvent::LineRemoved { key } => Some(key),
            CartEvent::Cleared => None,
        }
    }
}

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    key: IdentityKey,
    configuration: LineItemConfiguration,
    quantity: u32,
}

impl CartLine {
    pub fn key(&self) -> &IdentityKey {
        &self.key
    }

    pub fn configuration(&self) -> &LineItemConfiguration {
        &self.configuration
    }

    /// Always at least 1.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// Cart aggregate.
///
/// Lines keep insertion order and are unique by identity key. A line
/// whose quantity would drop to zero is removed instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredCart")]
pub struct Cart {
    lines: Vec<CartLine>,
}

/// Serialized cart as read back. Keys are recomputed, so a stored key
/// never has to be trusted.
#[derive(Deserialize)]
struct StoredCart {
    lines: Vec<StoredCartLine>,
}

#[derive(Deserialize)]
struct StoredCartLine {
    configuration: LineItemConfiguration,
    quantity: u32,
}

impl TryFrom<StoredCart> for Cart {
    type Error = ConfigurationError;

    fn try_from(stored: StoredCart) -> Result<Self, Self::Error> {
        let mut cart = Cart::new();
        for line in stored.lines {
            cart.add_many(line.configuration, line.quantity)?;
        }
        Ok(cart)
    }
}

// Query methods
impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CartState {
        if self.lines.is_empty() {
            CartState::Empty
        } else {
            CartState::NonEmpty
        }
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, key: &IdentityKey) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.key == key)
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |count, line| count.saturating_add(line.quantity))
    }

    /// Quantity of the plain (uncustomized, single) line for `item_id`,
    /// or 0 when there is none.
    pub fn quantity_of(&self, item_id: &CatalogItemId) -> u32 {
        let key = LineItemConfiguration::single(item_id.clone()).identity_key();
        self.line(&key).map(|line| line.quantity).unwrap_or(0)
    }

    pub fn total(&self, catalog: &Catalog) -> Money {
        pricing::cart_total(self, catalog)
    }
}

// Command methods (return the applied event)
impl Cart {
    /// Adds one unit of a configuration, merging with an equivalent line.
    pub fn add(&mut self, configuration: LineItemConfiguration) -> CartEvent {
        let key = configuration.identity_key();
        let event = match self.line(&key) {
            Some(existing) => CartEvent::QuantityChanged {
                from: existing.quantity,
                to: existing.quantity.saturating_add(1),
                key,
            },
            None => CartEvent::LineAdded {
                key,
                configuration,
                quantity: 1,
            },
        };
        self.apply(event.clone());
        event
    }

    /// Adds `quantity` units of a configuration in one step.
    ///
    /// The resulting line quantity must stay within 1..=[`MAX_LINE_QUANTITY`];
    /// otherwise the cart is left untouched.
    pub fn add_many(
        &mut self,
        configuration: LineItemConfiguration,
        quantity: u32,
    ) -> Result<CartEvent, ConfigurationError> {
        let key = configuration.identity_key();
        let current = self.line(&key).map_or(0, |line| line.quantity);
        let requested = current.saturating_add(quantity);
        if quantity == 0 || requested > MAX_LINE_QUANTITY {
            return Err(ConfigurationError::LineQuantityOutOfRange {
                requested,
                max: MAX_LINE_QUANTITY,
            });
        }

        let event = if current == 0 {
            CartEvent::LineAdded {
                key,
                configuration,
                quantity,
            }
        } else {
            CartEvent::QuantityChanged {
                key,
                from: current,
                to: requested,
            }
        };
        self.apply(event.clone());
        Ok(event)
    }

    /// Removes one unit from a line, dropping the line at zero.
    /// Unknown keys leave the cart untouched.
    pub fn decrement(&mut self, key: &IdentityKey) -> Option<CartEvent> {
        let line = self.line(key)?;
        let event = if line.quantity > 1 {
            CartEvent::QuantityChanged {
                key: key.clone(),
                from: line.quantity,
                to: line.quantity - 1,
            }
        } else {
            CartEvent::LineRemoved { key: key.clone() }
        };
        self.apply(event.clone());
        Some(event)
    }

    /// Removes a line regardless of its quantity.
    pub fn remove_all(&mut self, key: &IdentityKey) -> Option<CartEvent> {
        self.line(key)?;
        let event = CartEvent::LineRemoved { key: key.clone() };
        self.apply(event.clone());
        Some(event)
    }

    /// Empties the cart. Returns `None` if it was already empty.
    pub fn clear(&mut self) -> Option<CartEvent> {
        if self.lines.is_empty() {
            return None;
        }
        self.apply(CartEvent::Cleared);
        Some(CartEvent::Cleared)
    }

    /// Applies an event to the cart.
    pub fn apply(&mut self, event: CartEvent) {
        match event {
            CartEvent::LineAdded {
                key,
                configuration,
                quantity,
            } => {
                if quantity > 0 && self.line(&key).is_none() {
                    self.lines.push(CartLine {
                        key,
                        configuration,
                        quantity,
                    });
                }
            }
            CartEvent::QuantityChanged { key, to, .. } => {
                if to == 0 {
                    self.lines.retain(|line| line.key != key);
                } else if let Some(line) = self.lines.iter_mut().find(|line| line.key == key) {
                    line.quantity = to;
                }
            }
            CartEvent::LineRemoved { key } => {
                self.lines.retain(|line| line.key != key);
            }
            CartEvent::Cleared => self.lines.clear(),
        }
    }
}
