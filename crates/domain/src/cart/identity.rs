//! Canonical line identity.
//!
//! Layout: `base|extras|complements|note`
//!
//! - base: the single item id, or both flavor ids sorted and joined with `+`
//! - extras: extra ids sorted and joined with `,`
//! - complements: `id*qty` entries sorted by id and joined with `,`
//! - note: the trimmed note, empty when absent
//!
//! Catalog identifiers cannot contain any separator, so the first three
//! fields are unambiguous and the note runs to the end of the key.

use serde::{Deserialize, Serialize};

use super::configuration::{BaseSelection, LineItemConfiguration};

const FIELD_SEPARATOR: char = '|';
const LIST_SEPARATOR: char = ',';
const FLAVOR_SEPARATOR: char = '+';
const QUANTITY_SEPARATOR: char = '*';

/// Deterministic key under which equivalent configurations merge in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for IdentityKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Computes the identity key of a configuration.
///
/// Flavor order, extra insertion order and complement selection order do
/// not affect the result.
pub fn identity_key(config: &LineItemConfiguration) -> IdentityKey {
    let mut key = String::new();

    match config.base() {
        BaseSelection::Single { item_id } => key.push_str(item_id.as_str()),
        BaseSelection::Dual { first, second } => {
            let (low, high) = if first <= second {
                (first, second)
            } else {
                (second, first)
            };
            key.push_str(low.as_str());
            key.push(FLAVOR_SEPARATOR);
            key.push_str(high.as_str());
        }
    }

    key.push(FIELD_SEPARATOR);
    // BTreeSet iteration is already sorted.
    push_joined(&mut key, config.extras().map(|extra| extra.as_str().to_string()));

    key.push(FIELD_SEPARATOR);
    let mut complements: Vec<_> = config.complements().iter().collect();
    complements.sort_by(|a, b| a.complement_id.cmp(&b.complement_id));
    push_joined(
        &mut key,
        complements
            .into_iter()
            .map(|c| format!("{}{}{}", c.complement_id, QUANTITY_SEPARATOR, c.quantity)),
    );

    key.push(FIELD_SEPARATOR);
    if let Some(note) = config.note() {
        key.push_str(note);
    }

    IdentityKey(key)
}

fn push_joined(key: &mut String, parts: impl Iterator<Item = String>) {
    for (index, part) in parts.enumerate() {
        if index > 0 {
            key.push(LIST_SEPARATOR);
        }
        key.push_str(&part);
    }
}

impl LineItemConfiguration {
    /// Shorthand for [`identity_key`].
    pub fn identity_key(&self) -> IdentityKey {
        identity_key(self)
    }
}
