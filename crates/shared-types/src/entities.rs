//! # Marketplace Entities
//!
//! Domain records rendered by the client and produced by the worker's
//! processors.
//!
//! ## Clusters
//!
//! - **Identity**: `Profile`
//! - **Funds**: `AccountOverview`
//! - **Market**: `Order`, `Deal`, `Page`

use serde::{Deserialize, Serialize};

/// A wallet address in `0x`-prefixed hex.
pub type Address = String;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Public profile attached to an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Owner address.
    pub address: Address,
    /// Name shown in the client.
    pub display_name: String,
    /// Contact email, if the owner published one.
    pub email: Option<String>,
}

// =============================================================================
// CLUSTER B: FUNDS
// =============================================================================

/// Balances and activity counters for one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountOverview {
    pub address: Address,
    /// Spendable balance, in the smallest token unit.
    pub balance: u64,
    /// Balance locked in running deals.
    pub locked: u64,
    pub open_orders: usize,
    pub active_deals: usize,
}

// =============================================================================
// CLUSTER C: MARKET
// =============================================================================

/// Lifecycle of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Filled,
    Cancelled,
}

/// A compute order placed on the market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub owner: Address,
    /// Workload category, e.g. `"gpu"`.
    pub category: String,
    /// Price per unit of work.
    pub price: u64,
    /// Units still available.
    pub volume: u32,
    pub status: OrderStatus,
}

/// Lifecycle of a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DealStatus {
    Active,
    Completed,
    Failed,
}

/// A matched pair of orders being executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: String,
    pub order_id: String,
    /// Requester address.
    pub requester: Address,
    pub category: String,
    pub price: u64,
    pub status: DealStatus,
    /// Unix timestamp (seconds) when execution started.
    pub start_time: u64,
}

/// One page of a listing.
///
/// Listings are delivered one page per response part; `last` is `true` on
/// the final page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Zero-based page index.
    pub page: u32,
    /// Total number of matching items across all pages.
    pub total: usize,
    pub last: bool,
}
