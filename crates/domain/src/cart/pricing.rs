//! Pricing rules.
//!
//! - A single line's base price is its item's price.
//! - A dual composite costs the higher of its two flavors.
//! - Extras add their price once per unit; complements add
//!   `unit price * complement quantity` per unit.
//! - Extras and complements resolve against the primary flavor first,
//!   then the second.
//! - Anything the catalog no longer knows prices at zero.

use common::{CatalogItemId, ComplementId, ExtraId, Money};

use super::aggregate::{Cart, CartLine};
use super::configuration::{BaseSelection, LineItemConfiguration};
use crate::catalog::{Catalog, ComplementOption, ExtraOption};

fn non_negative(amount: Money) -> Money {
    amount.max(Money::zero())
}

/// Finds the extra option a configuration refers to.
pub fn resolve_extra<'a>(
    config: &LineItemConfiguration,
    catalog: &'a Catalog,
    extra: &ExtraId,
) -> Option<&'a ExtraOption> {
    config
        .item_ids()
        .into_iter()
        .filter_map(|id| catalog.item(id))
        .find_map(|item| item.extra(extra))
}

/// Finds the complement option a configuration refers to.
pub fn resolve_complement<'a>(
    config: &LineItemConfiguration,
    catalog: &'a Catalog,
    complement: &ComplementId,
) -> Option<&'a ComplementOption> {
    config
        .item_ids()
        .into_iter()
        .filter_map(|id| catalog.item(id))
        .find_map(|item| item.complement(complement))
}

/// Unit price of a complement, zero when unknown.
pub fn complement_unit_price(
    config: &LineItemConfiguration,
    catalog: &Catalog,
    complement: &ComplementId,
) -> Money {
    resolve_complement(config, catalog, complement)
        .map(|option| non_negative(option.unit_price))
        .unwrap_or_default()
}

pub fn base_price(config: &LineItemConfiguration, catalog: &Catalog) -> Money {
    let price_of = |id: &CatalogItemId| {
        catalog
            .item(id)
            .map(|item| non_negative(item.price))
            .unwrap_or_default()
    };
    match config.base() {
        BaseSelection::Single { item_id } => price_of(item_id),
        BaseSelection::Dual { first, second } => price_of(first).max(price_of(second)),
    }
}

pub fn extras_price(config: &LineItemConfiguration, catalog: &Catalog) -> Money {
    config
        .extras()
        .filter_map(|extra| resolve_extra(config, catalog, extra))
        .map(|option| non_negative(option.price))
        .sum()
}

pub fn complements_price(config: &LineItemConfiguration, catalog: &Catalog) -> Money {
    config
        .complements()
        .iter()
        .map(|selected| {
            complement_unit_price(config, catalog, &selected.complement_id)
                .multiply(selected.quantity)
        })
        .sum()
}

/// Price of one unit of a configured line.
pub fn unit_price(config: &LineItemConfiguration, catalog: &Catalog) -> Money {
    base_price(config, catalog) + extras_price(config, catalog) + complements_price(config, catalog)
}

/// Unit price times line quantity.
pub fn line_total(line: &CartLine, catalog: &Catalog) -> Money {
    unit_price(line.configuration(), catalog).multiply(line.quantity())
}

/// Sum of all line totals.
pub fn cart_total(cart: &Cart, catalog: &Catalog) -> Money {
    cart.lines()
        .iter()
        .map(|line| line_total(line, catalog))
        .sum()
}
