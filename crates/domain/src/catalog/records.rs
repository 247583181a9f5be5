//! Raw catalog records and their mapping into typed catalog entries.
//!
//! Records arrive loosely typed (nullable columns, float prices, free-form
//! identifiers). Every record passes through [`map_catalog`] before the rest
//! of the engine sees it; records that cannot be mapped are skipped and
//! reported rather than failing the whole load.

use std::collections::HashMap;

use common::{
    CatalogItemId, CategoryId, ComplementId, ExtraId, IdError, Money, MoneyError, OrganizationId,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Catalog, CatalogItem, Category, ComplementOption, ExtraOption};

/// A category row as fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub allows_dual_composite: Option<bool>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// An extra row as fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraRecord {
    pub id: String,
    pub name: Option<String>,
    pub price: Option<f64>,
}

/// A complement row as fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplementRecord {
    pub id: String,
    pub name: Option<String>,
    pub price: Option<f64>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub max_items: Option<i64>,
}

/// A product row as fetched, with its add-ons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    pub price: Option<f64>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub extras: Vec<ExtraRecord>,
    #[serde(default)]
    pub complements: Vec<ComplementRecord>,
}

/// Reasons a raw record is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("record {id:?} has an invalid identifier: {source}")]
    InvalidId {
        id: String,
        #[source]
        source: IdError,
    },

    #[error("record {id} has no name")]
    MissingName { id: String },

    #[error("record {id} has no price")]
    MissingPrice { id: String },

    #[error("record {id} has an invalid price: {source}")]
    InvalidPrice {
        id: String,
        #[source]
        source: MoneyError,
    },

    #[error("record {id} has negative price {price}")]
    NegativePrice { id: String, price: Money },

    #[error("record {id} is inactive")]
    Inactive { id: String },

    #[error("product {id} references unknown or inactive category {category}")]
    UnknownCategory { id: String, category: String },
}

impl RecordError {
    /// Short label used for the rejection metric.
    pub fn reason(&self) -> &'static str {
        match self {
            RecordError::InvalidId { .. } => "invalid_id",
            RecordError::MissingName { .. } => "missing_name",
            RecordError::MissingPrice { .. } => "missing_price",
            RecordError::InvalidPrice { .. } => "invalid_price",
            RecordError::NegativePrice { .. } => "negative_price",
            RecordError::Inactive { .. } => "inactive",
            RecordError::UnknownCategory { .. } => "unknown_category",
        }
    }
}

/// Result of mapping a batch of records.
#[derive(Debug, Clone)]
pub struct MappedCatalog {
    pub catalog: Catalog,
    pub rejected: Vec<RecordError>,
}

/// Maps raw records into a catalog for `scope`.
///
/// Inactive or malformed categories and products are skipped. Malformed
/// extras and complements are dropped from their product, which is kept.
/// Every skipped record is logged and counted.
pub fn map_catalog(
    scope: OrganizationId,
    categories: Vec<CategoryRecord>,
    products: Vec<ProductRecord>,
) -> MappedCatalog {
    let mut rejected = Vec::new();

    let mut mapped_categories = Vec::with_capacity(categories.len());
    for record in categories {
        match map_category(record) {
            Ok(category) => mapped_categories.push(category),
            Err(error) => rejected.push(error),
        }
    }
    let by_id: HashMap<&str, &Category> = mapped_categories
        .iter()
        .map(|category| (category.id.as_str(), category))
        .collect();

    let mut items = Vec::with_capacity(products.len());
    for record in products {
        match map_product(record, &by_id, &mut rejected) {
            Ok(item) => items.push(item),
            Err(error) => rejected.push(error),
        }
    }

    for error in &rejected {
        tracing::warn!(reason = error.reason(), error = %error, "catalog record rejected");
        metrics::counter!("catalog_records_rejected_total", "reason" => error.reason())
            .increment(1);
    }

    MappedCatalog {
        catalog: Catalog::new(scope, mapped_categories, items),
        rejected,
    }
}

fn parse_id<T>(id: &str, parse: impl FnOnce(&str) -> Result<T, IdError>) -> Result<T, RecordError> {
    parse(id.trim()).map_err(|source| RecordError::InvalidId {
        id: id.to_string(),
        source,
    })
}

fn require_name(id: &str, name: Option<String>) -> Result<String, RecordError> {
    name.map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| RecordError::MissingName { id: id.to_string() })
}

fn require_price(id: &str, price: Option<f64>) -> Result<Money, RecordError> {
    let raw = price.ok_or_else(|| RecordError::MissingPrice { id: id.to_string() })?;
    let price = Money::from_decimal(raw).map_err(|source| RecordError::InvalidPrice {
        id: id.to_string(),
        source,
    })?;
    if price.is_negative() {
        return Err(RecordError::NegativePrice {
            id: id.to_string(),
            price,
        });
    }
    Ok(price)
}

fn map_category(record: CategoryRecord) -> Result<Category, RecordError> {
    if record.active == Some(false) {
        return Err(RecordError::Inactive { id: record.id });
    }
    let id = parse_id(&record.id, |id| CategoryId::parse(id))?;
    let name = require_name(&record.id, record.name)?;
    Ok(Category {
        id,
        name,
        allows_dual_composite: record.allows_dual_composite.unwrap_or(false),
    })
}

fn map_product(
    record: ProductRecord,
    categories: &HashMap<&str, &Category>,
    rejected: &mut Vec<RecordError>,
) -> Result<CatalogItem, RecordError> {
    if record.active == Some(false) {
        return Err(RecordError::Inactive { id: record.id });
    }
    let id = parse_id(&record.id, |id| CatalogItemId::parse(id))?;
    let name = require_name(&record.id, record.name)?;
    let price = require_price(&record.id, record.price)?;

    let mut item = CatalogItem::new(id, name, price);
    item.description = record
        .description
        .map(|description| description.trim().to_string())
        .filter(|description| !description.is_empty());

    if let Some(category_id) = record.category_id.as_deref().map(str::trim) {
        let category = categories
            .get(category_id)
            .ok_or_else(|| RecordError::UnknownCategory {
                id: record.id.clone(),
                category: category_id.to_string(),
            })?;
        item = item.in_category(category);
    }

    for extra in record.extras {
        match map_extra(extra) {
            Ok(extra) => item.extras.push(extra),
            Err(error) => rejected.push(error),
        }
    }
    for complement in record.complements {
        match map_complement(complement) {
            Ok(complement) => item.complements.push(complement),
            Err(error) => rejected.push(error),
        }
    }

    Ok(item)
}

fn map_extra(record: ExtraRecord) -> Result<ExtraOption, RecordError> {
    Ok(ExtraOption {
        id: parse_id(&record.id, |id| ExtraId::parse(id))?,
        name: require_name(&record.id, record.name)?,
        price: require_price(&record.id, record.price)?,
    })
}

fn map_complement(record: ComplementRecord) -> Result<ComplementOption, RecordError> {
    Ok(ComplementOption {
        id: parse_id(&record.id, |id| ComplementId::parse(id))?,
        name: require_name(&record.id, record.name)?,
        // Complements without a price are free.
        unit_price: match record.price {
            Some(_) => require_price(&record.id, record.price)?,
            None => Money::zero(),
        },
        required: record.required.unwrap_or(false),
        max_items: record
            .max_items
            .and_then(|max| u32::try_from(max).ok())
            .filter(|max| *max > 0),
    })
}
