//! Line-item configuration value objects.

use std::collections::BTreeSet;

use common::{CatalogItemId, CategoryId, ComplementId, ExtraId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a configuration is malformed or does not fit the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("catalog item {0} does not exist")]
    UnknownItem(CatalogItemId),

    #[error("a dual composite needs two different flavors, got {0} twice")]
    IdenticalFlavors(CatalogItemId),

    #[error("catalog item {0} does not allow a second flavor")]
    NotDualEligible(CatalogItemId),

    #[error("flavors {first} and {second} belong to different categories")]
    CategoryMismatch {
        first: CatalogItemId,
        second: CatalogItemId,
    },

    #[error("flavor {0} has no category")]
    Uncategorized(CatalogItemId),

    #[error("extra {extra} is not offered for {item}")]
    UnknownExtra { item: CatalogItemId, extra: ExtraId },

    #[error("complement {complement} is not offered for {item}")]
    UnknownComplement {
        item: CatalogItemId,
        complement: ComplementId,
    },

    #[error("complement {0} quantity must be positive")]
    ZeroComplementQuantity(ComplementId),

    #[error("complement {0} quantity is too large")]
    ComplementQuantityOverflow(ComplementId),

    #[error("line quantity must be between 1 and {max}, got {requested}")]
    LineQuantityOutOfRange { requested: u32, max: u32 },

    #[error("complement {complement} allows at most {max} units, got {requested}")]
    ComplementLimitExceeded {
        complement: ComplementId,
        max: u32,
        requested: u32,
    },

    #[error("required complement {complement} missing for {item}")]
    MissingRequiredComplement {
        item: CatalogItemId,
        complement: ComplementId,
    },

    #[error("category {0} does not exist")]
    UnknownCategory(CategoryId),
}

/// Slot a flavor occupies in a dual composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FlavorPosition {
    First,
    Second,
}

impl FlavorPosition {
    /// Returns the 1-based position number stored with the order.
    pub fn as_u8(&self) -> u8 {
        match self {
            FlavorPosition::First => 1,
            FlavorPosition::Second => 2,
        }
    }
}

impl TryFrom<u8> for FlavorPosition {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(FlavorPosition::First),
            2 => Ok(FlavorPosition::Second),
            other => Err(format!("flavor position must be 1 or 2, got {other}")),
        }
    }
}

impl From<FlavorPosition> for u8 {
    fn from(position: FlavorPosition) -> Self {
        position.as_u8()
    }
}

impl std::fmt::Display for FlavorPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// One flavor of a dual composite.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlavorComponent {
    pub item_id: CatalogItemId,
    pub position: FlavorPosition,
}

/// What a line is made of: one catalog item, or two flavors split half and half.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BaseSelection {
    Single {
        item_id: CatalogItemId,
    },
    Dual {
        first: CatalogItemId,
        second: CatalogItemId,
    },
}

impl BaseSelection {
    /// Creates a dual selection. The two flavors must differ.
    pub fn dual(first: CatalogItemId, second: CatalogItemId) -> Result<Self, ConfigurationError> {
        if first == second {
            return Err(ConfigurationError::IdenticalFlavors(first));
        }
        Ok(BaseSelection::Dual { first, second })
    }

    /// Returns the item persisted as the line's product: the single item,
    /// or the flavor in position 1.
    pub fn primary_item_id(&self) -> &CatalogItemId {
        match self {
            BaseSelection::Single { item_id } => item_id,
            BaseSelection::Dual { first, .. } => first,
        }
    }

    /// Returns every referenced item in position order.
    pub fn item_ids(&self) -> Vec<&CatalogItemId> {
        match self {
            BaseSelection::Single { item_id } => vec![item_id],
            BaseSelection::Dual { first, second } => vec![first, second],
        }
    }

    /// Returns the flavor components of a dual selection, ordered by position.
    pub fn flavors(&self) -> Vec<FlavorComponent> {
        match self {
            BaseSelection::Single { .. } => Vec::new(),
            BaseSelection::Dual { first, second } => vec![
                FlavorComponent {
                    item_id: first.clone(),
                    position: FlavorPosition::First,
                },
                FlavorComponent {
                    item_id: second.clone(),
                    position: FlavorPosition::Second,
                },
            ],
        }
    }

    pub fn is_dual(&self) -> bool {
        matches!(self, BaseSelection::Dual { .. })
    }

    /// Returns true if the selection references the given item in any position.
    pub fn references(&self, item_id: &CatalogItemId) -> bool {
        match self {
            BaseSelection::Single { item_id: id } => id == item_id,
            BaseSelection::Dual { first, second } => first == item_id || second == item_id,
        }
    }
}

/// A quantified add-on chosen for a line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectedComplement {
    pub complement_id: ComplementId,
    pub quantity: u32,
}

impl SelectedComplement {
    /// Creates a selection. Quantity must be positive.
    pub fn new(complement_id: ComplementId, quantity: u32) -> Result<Self, ConfigurationError> {
        if quantity == 0 {
            return Err(ConfigurationError::ZeroComplementQuantity(complement_id));
        }
        Ok(Self {
            complement_id,
            quantity,
        })
    }

    /// Creates a selection of a single unit.
    pub fn one(complement_id: ComplementId) -> Self {
        Self {
            complement_id,
            quantity: 1,
        }
    }
}

/// Full description of what a customer chose for one cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemConfiguration {
    base: BaseSelection,
    #[serde(default)]
    extras: BTreeSet<ExtraId>,
    #[serde(default)]
    complements: Vec<SelectedComplement>,
    #[serde(default)]
    note: Option<String>,
}

impl LineItemConfiguration {
    /// Creates a configuration for a single catalog item with no add-ons.
    pub fn single(item_id: CatalogItemId) -> Self {
        Self::from_base(BaseSelection::Single { item_id })
    }

    /// Creates a configuration for a dual composite.
    pub fn dual(first: CatalogItemId, second: CatalogItemId) -> Result<Self, ConfigurationError> {
        Ok(Self::from_base(BaseSelection::dual(first, second)?))
    }

    pub fn from_base(base: BaseSelection) -> Self {
        Self {
            base,
            extras: BTreeSet::new(),
            complements: Vec::new(),
            note: None,
        }
    }

    /// Adds an extra. Extras form a set; adding one twice is a no-op.
    pub fn with_extra(mut self, extra: ExtraId) -> Self {
        self.extras.insert(extra);
        self
    }

    pub fn with_extras(mut self, extras: impl IntoIterator<Item = ExtraId>) -> Self {
        self.extras.extend(extras);
        self
    }

    /// Adds a complement. Selecting the same complement again adds to the
    /// existing quantity and keeps its original selection order.
    pub fn with_complement(
        mut self,
        complement: SelectedComplement,
    ) -> Result<Self, ConfigurationError> {
        match self
            .complements
            .iter_mut()
            .find(|c| c.complement_id == complement.complement_id)
        {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(complement.quantity)
                    .ok_or(ConfigurationError::ComplementQuantityOverflow(
                        complement.complement_id,
                    ))?;
            }
            None => self.complements.push(complement),
        }
        Ok(self)
    }

    /// Sets the free-text note. Whitespace-only notes clear it.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let note = note.into();
        let trimmed = note.trim();
        self.note = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    pub fn base(&self) -> &BaseSelection {
        &self.base
    }

    /// Extras in identifier order.
    pub fn extras(&self) -> impl Iterator<Item = &ExtraId> {
        self.extras.iter()
    }

    pub fn has_extra(&self, extra: &ExtraId) -> bool {
        self.extras.contains(extra)
    }

    /// Complements in selection order.
    pub fn complements(&self) -> &[SelectedComplement] {
        &self.complements
    }

    /// Returns the trimmed note, or `None` when absent or blank.
    pub fn note(&self) -> Option<&str> {
        self.note
            .as_deref()
            .map(str::trim)
            .filter(|note| !note.is_empty())
    }

    pub fn primary_item_id(&self) -> &CatalogItemId {
        self.base.primary_item_id()
    }

    pub fn item_ids(&self) -> Vec<&CatalogItemId> {
        self.base.item_ids()
    }

    pub fn flavors(&self) -> Vec<FlavorComponent> {
        self.base.flavors()
    }

    /// Returns true if anything beyond the base was chosen.
    pub fn is_customized(&self) -> bool {
        !self.extras.is_empty() || !self.complements.is_empty() || self.note().is_some()
    }
}
