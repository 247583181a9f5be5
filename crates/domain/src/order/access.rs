//! Access grants issued for tokenized order links.

use common::{CustomerId, OrganizationId};
use serde::{Deserialize, Serialize};

/// Customer identified by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantedCustomer {
    pub id: CustomerId,
    pub name: String,
    pub phone: Option<String>,
}

/// Result of validating an unused, unexpired access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub organization_id: OrganizationId,
    pub organization_name: String,
    pub customer: GrantedCustomer,
}
