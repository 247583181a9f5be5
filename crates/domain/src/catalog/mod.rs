//! Menu catalog.
//!
//! The catalog is a read-only snapshot of one organization's menu. It is
//! loaded once per session through a catalog provider and consulted by
//! pricing, configuration checks and order planning.

mod records;

use std::collections::HashMap;

use common::{CatalogItemId, CategoryId, ComplementId, ExtraId, Money, OrganizationId};
use serde::{Deserialize, Serialize};

use crate::cart::{BaseSelection, ConfigurationError, LineItemConfiguration};

pub use records::{
    CategoryRecord, ComplementRecord, ExtraRecord, MappedCatalog, ProductRecord, RecordError,
    map_catalog,
};

/// A menu category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// Items in this category may be ordered half and half.
    pub allows_dual_composite: bool,
}

/// A binary add-on with a fixed price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraOption {
    pub id: ExtraId,
    pub name: String,
    pub price: Money,
}

/// A quantified add-on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplementOption {
    pub id: ComplementId,
    pub name: String,
    pub unit_price: Money,
    pub required: bool,
    pub max_items: Option<u32>,
}

/// A purchasable menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: CatalogItemId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub category_id: Option<CategoryId>,
    pub allows_dual_composite: bool,
    pub extras: Vec<ExtraOption>,
    pub complements: Vec<ComplementOption>,
}

impl CatalogItem {
    pub fn new(id: CatalogItemId, name: impl Into<String>, price: Money) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            price,
            category_id: None,
            allows_dual_composite: false,
            extras: Vec::new(),
            complements: Vec::new(),
        }
    }

    /// Places the item in a category and inherits its dual-composite flag.
    pub fn in_category(mut self, category: &Category) -> Self {
        self.category_id = Some(category.id.clone());
        self.allows_dual_composite = category.allows_dual_composite;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_extra(mut self, extra: ExtraOption) -> Self {
        self.extras.push(extra);
        self
    }

    pub fn with_complement(mut self, complement: ComplementOption) -> Self {
        self.complements.push(complement);
        self
    }

    pub fn extra(&self, id: &ExtraId) -> Option<&ExtraOption> {
        self.extras.iter().find(|extra| &extra.id == id)
    }

    pub fn complement(&self, id: &ComplementId) -> Option<&ComplementOption> {
        self.complements.iter().find(|complement| &complement.id == id)
    }

    /// Case-insensitive match against name and description.
    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self
                .description
                .as_deref()
                .is_some_and(|description| description.to_lowercase().contains(needle))
    }
}

/// Read-only menu snapshot for one organization.
#[derive(Debug, Clone)]
pub struct Catalog {
    scope: OrganizationId,
    categories: Vec<Category>,
    items: Vec<CatalogItem>,
    index: HashMap<CatalogItemId, usize>,
}

impl Catalog {
    /// Builds a catalog. Items keep their given order; when an id repeats,
    /// the first occurrence wins.
    pub fn new(scope: OrganizationId, categories: Vec<Category>, items: Vec<CatalogItem>) -> Self {
        let mut kept = Vec::with_capacity(items.len());
        let mut index = HashMap::with_capacity(items.len());
        for item in items {
            if index.contains_key(&item.id) {
                tracing::warn!(item_id = %item.id, "duplicate catalog item ignored");
                continue;
            }
            index.insert(item.id.clone(), kept.len());
            kept.push(item);
        }
        Self {
            scope,
            categories,
            items: kept,
            index,
        }
    }

    /// An empty catalog for the given organization.
    pub fn empty(scope: OrganizationId) -> Self {
        Self::new(scope, Vec::new(), Vec::new())
    }

    pub fn scope(&self) -> OrganizationId {
        self.scope
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, id: &CatalogItemId) -> Option<&CatalogItem> {
        self.index.get(id).map(|&position| &self.items[position])
    }

    pub fn category(&self, id: &CategoryId) -> Option<&Category> {
        self.categories.iter().find(|category| &category.id == id)
    }

    /// Filters items by a case-insensitive term over name and description,
    /// and optionally by category. A blank term matches everything.
    pub fn search(&self, term: &str, category: Option<&CategoryId>) -> Vec<&CatalogItem> {
        let needle = term.trim().to_lowercase();
        self.items
            .iter()
            .filter(|item| category.is_none_or(|c| item.category_id.as_ref() == Some(c)))
            .filter(|item| needle.is_empty() || item.matches(&needle))
            .collect()
    }

    /// Items that may be combined with `first` as the second flavor: same
    /// category, category allows dual composites, and a different id.
    pub fn second_flavor_candidates(&self, first: &CatalogItemId) -> Vec<&CatalogItem> {
        let Some(first) = self.item(first) else {
            return Vec::new();
        };
        let Some(category_id) = first.category_id.as_ref() else {
            return Vec::new();
        };
        if !first.allows_dual_composite {
            return Vec::new();
        }
        self.items
            .iter()
            .filter(|item| item.id != first.id)
            .filter(|item| item.allows_dual_composite)
            .filter(|item| item.category_id.as_ref() == Some(category_id))
            .collect()
    }

    /// Builds a dual configuration after checking both flavors may be combined.
    pub fn compose_dual(
        &self,
        first: &CatalogItemId,
        second: &CatalogItemId,
    ) -> Result<LineItemConfiguration, ConfigurationError> {
        if first == second {
            return Err(ConfigurationError::IdenticalFlavors(first.clone()));
        }
        let first_item = self
            .item(first)
            .ok_or_else(|| ConfigurationError::UnknownItem(first.clone()))?;
        let second_item = self
            .item(second)
            .ok_or_else(|| ConfigurationError::UnknownItem(second.clone()))?;

        for flavor in [first_item, second_item] {
            if !flavor.allows_dual_composite {
                return Err(ConfigurationError::NotDualEligible(flavor.id.clone()));
            }
        }
        let first_category = first_item
            .category_id
            .as_ref()
            .ok_or_else(|| ConfigurationError::Uncategorized(first.clone()))?;
        if second_item.category_id.as_ref() != Some(first_category) {
            return Err(ConfigurationError::CategoryMismatch {
                first: first.clone(),
                second: second.clone(),
            });
        }

        LineItemConfiguration::dual(first.clone(), second.clone())
    }

    /// Checks that a configuration only references things this catalog offers.
    ///
    /// Pricing tolerates unknown references; this is the strict check used
    /// where configurations enter from outside.
    pub fn verify(&self, config: &LineItemConfiguration) -> Result<(), ConfigurationError> {
        if let BaseSelection::Dual { first, second } = config.base() {
            self.compose_dual(first, second)?;
        }
        let items = config
            .item_ids()
            .into_iter()
            .map(|id| {
                self.item(id)
                    .ok_or_else(|| ConfigurationError::UnknownItem(id.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for extra in config.extras() {
            if !items.iter().any(|item| item.extra(extra).is_some()) {
                return Err(ConfigurationError::UnknownExtra {
                    item: config.primary_item_id().clone(),
                    extra: extra.clone(),
                });
            }
        }

        for selected in config.complements() {
            let option = items
                .iter()
                .find_map(|item| item.complement(&selected.complement_id))
                .ok_or_else(|| ConfigurationError::UnknownComplement {
                    item: config.primary_item_id().clone(),
                    complement: selected.complement_id.clone(),
                })?;
            if selected.quantity == 0 {
                return Err(ConfigurationError::ZeroComplementQuantity(
                    selected.complement_id.clone(),
                ));
            }
            match option.max_items {
                Some(max) if selected.quantity > max => {
                    return Err(ConfigurationError::ComplementLimitExceeded {
                        complement: selected.complement_id.clone(),
                        max,
                        requested: selected.quantity,
                    });
                }
                _ => {}
            }
        }

        for item in &items {
            for required in item.complements.iter().filter(|c| c.required) {
                let chosen = config
                    .complements()
                    .iter()
                    .any(|c| c.complement_id == required.id);
                if !chosen {
                    return Err(ConfigurationError::MissingRequiredComplement {
                        item: item.id.clone(),
                        complement: required.id.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Human-readable name for a configuration: the item name, or
    /// `"A + B"` for a dual composite. Unknown items fall back to their id.
    pub fn display_name(&self, config: &LineItemConfiguration) -> String {
        config
            .item_ids()
            .into_iter()
            .map(|id| {
                self.item(id)
                    .map(|item| item.name.clone())
                    .unwrap_or_else(|| id.to_string())
            })
            .collect::<Vec<_>>()
            .join(" + ")
    }
}
