//! # Marketplace Methods
//!
//! The remote methods exposed by the worker context, with their payloads.
//!
//! | Method | Payload | Output | Parts |
//! |--------|---------|--------|-------|
//! | `profile.get` | [`AddressQuery`] | [`Profile`] | 1 |
//! | `account.summary` | [`AddressQuery`] | [`AccountOverview`] | 1 |
//! | `orders.list` | [`OrderQuery`] | [`Page<Order>`] | 1 per page |
//! | `deals.list` | [`DealQuery`] | [`Page<Deal>`] | 1 per page |

use crate::entities::*;
use crate::method::Method;
use crate::result::Validation;
use serde::{Deserialize, Serialize};

// =============================================================================
// PAYLOADS
// =============================================================================

/// Lookup by owner address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressQuery {
    pub address: Address,
}

impl AddressQuery {
    pub fn new(address: impl Into<Address>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

/// Orders owned by an address, optionally restricted to one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderQuery {
    pub address: Address,
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

/// Deals requested by an address, filtered by category and price range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealQuery {
    pub address: Address,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub min_price: Option<u64>,
    #[serde(default)]
    pub max_price: Option<u64>,
}

impl DealQuery {
    /// Semantic checks on the filter. Returns `None` when the query is usable.
    pub fn validate(&self) -> Option<Validation> {
        let mut validation = Validation::new();

        if !is_address(&self.address) {
            validation.insert("address".into(), "must be a 0x-prefixed address".into());
        }
        if let Some(category) = &self.category {
            if category.trim().is_empty() {
                validation.insert("category".into(), "must not be blank".into());
            }
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                validation.insert("minPrice".into(), "must not exceed maxPrice".into());
            }
        }

        if validation.is_empty() {
            None
        } else {
            Some(validation)
        }
    }
}

/// Loose address shape check: `0x` followed by 40 hex digits.
#[must_use]
pub fn is_address(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

// =============================================================================
// METHODS
// =============================================================================

/// `profile.get`: public profile of an address.
pub struct GetProfile;

impl Method for GetProfile {
    const NAME: &'static str = "profile.get";
    type Payload = AddressQuery;
    type Output = Profile;
}

/// `account.summary`: balances and counters of an address.
pub struct AccountSummary;

impl Method for AccountSummary {
    const NAME: &'static str = "account.summary";
    type Payload = AddressQuery;
    type Output = AccountOverview;
}

/// `orders.list`: paginated orders of an address.
pub struct ListOrders;

impl Method for ListOrders {
    const NAME: &'static str = "orders.list";
    type Payload = OrderQuery;
    type Output = Page<Order>;
}

/// `deals.list`: paginated, filtered deals of an address.
pub struct ListDeals;

impl Method for ListDeals {
    const NAME: &'static str = "deals.list";
    type Payload = DealQuery;
    type Output = Page<Deal>;
}
