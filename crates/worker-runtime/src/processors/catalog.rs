//! In-memory marketplace catalog backing the processors.

use parking_lot::RwLock;
use shared_types::{
    AccountOverview, Address, Deal, DealQuery, DealStatus, Order, OrderQuery, OrderStatus,
    Profile,
};
use std::collections::HashMap;

/// Seeded address with profile, balance, orders and deals.
pub const SEED_PROVIDER: &str = "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1";

/// Seeded address with a profile and a balance only.
pub const SEED_NEWCOMER: &str = "0xb0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0";

#[derive(Default)]
struct CatalogData {
    profiles: HashMap<Address, Profile>,
    /// address → (balance, locked)
    balances: HashMap<Address, (u64, u64)>,
    orders: Vec<Order>,
    deals: Vec<Deal>,
}

/// Thread-safe store of profiles, balances, orders and deals.
#[derive(Default)]
pub struct Catalog {
    data: RwLock<CatalogData>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-filled with a small fixed market.
    ///
    /// `SEED_PROVIDER` owns 45 orders (every fifth filled, every ninth
    /// cancelled, categories alternating `gpu` / `cpu`) and requested 12
    /// deals priced 100, 110, ... 210.
    pub fn seeded() -> Self {
        let catalog = Self::new();

        catalog.insert_profile(Profile {
            address: SEED_PROVIDER.into(),
            display_name: "Provider One".into(),
            email: Some("ops@provider.one".into()),
        });
        catalog.insert_profile(Profile {
            address: SEED_NEWCOMER.into(),
            display_name: "Newcomer".into(),
            email: None,
        });
        catalog.set_balance(SEED_PROVIDER, 1_000_000, 25_000);
        catalog.set_balance(SEED_NEWCOMER, 500, 0);

        for i in 0..45u32 {
            let status = if i % 5 == 4 {
                OrderStatus::Filled
            } else if i % 9 == 8 {
                OrderStatus::Cancelled
            } else {
                OrderStatus::Open
            };
            catalog.insert_order(Order {
                id: format!("order-{:03}", i),
                owner: SEED_PROVIDER.into(),
                category: category_for(i).into(),
                price: 50 + u64::from(i) * 5,
                volume: 1 + i % 4,
                status,
            });
        }

        for i in 0..12u32 {
            let status = match i % 4 {
                0 | 1 => DealStatus::Active,
                2 => DealStatus::Completed,
                _ => DealStatus::Failed,
            };
            catalog.insert_deal(Deal {
                id: format!("deal-{:03}", i),
                order_id: format!("order-{:03}", i),
                requester: SEED_PROVIDER.into(),
                category: category_for(i).into(),
                price: 100 + u64::from(i) * 10,
                status,
                start_time: 1_700_000_000 + u64::from(i) * 3_600,
            });
        }

        catalog
    }

    pub fn insert_profile(&self, profile: Profile) {
        self.data
            .write()
            .profiles
            .insert(profile.address.clone(), profile);
    }

    pub fn set_balance(&self, address: &str, balance: u64, locked: u64) {
        self.data
            .write()
            .balances
            .insert(address.to_string(), (balance, locked));
    }

    pub fn insert_order(&self, order: Order) {
        self.data.write().orders.push(order);
    }

    pub fn insert_deal(&self, deal: Deal) {
        self.data.write().deals.push(deal);
    }

    pub fn profile(&self, address: &str) -> Option<Profile> {
        self.data.read().profiles.get(address).cloned()
    }

    /// Balances and activity counters; `None` for an address with no balance.
    pub fn overview(&self, address: &str) -> Option<AccountOverview> {
        let data = self.data.read();
        let (balance, locked) = *data.balances.get(address)?;
        let open_orders = data
            .orders
            .iter()
            .filter(|o| o.owner == address && o.status == OrderStatus::Open)
            .count();
        let active_deals = data
            .deals
            .iter()
            .filter(|d| d.requester == address && d.status == DealStatus::Active)
            .count();

        Some(AccountOverview {
            address: address.to_string(),
            balance,
            locked,
            open_orders,
            active_deals,
        })
    }

    /// Orders matching `query`, in insertion order.
    pub fn orders(&self, query: &OrderQuery) -> Vec<Order> {
        self.data
            .read()
            .orders
            .iter()
            .filter(|o| o.owner == query.address)
            .filter(|o| query.status.map_or(true, |status| o.status == status))
            .cloned()
            .collect()
    }

    /// Deals matching `query`, in insertion order.
    pub fn deals(&self, query: &DealQuery) -> Vec<Deal> {
        self.data
            .read()
            .deals
            .iter()
            .filter(|d| d.requester == query.address)
            .filter(|d| query.category.as_ref().map_or(true, |c| &d.category == c))
            .filter(|d| query.min_price.map_or(true, |min| d.price >= min))
            .filter(|d| query.max_price.map_or(true, |max| d.price <= max))
            .cloned()
            .collect()
    }
}

fn category_for(i: u32) -> &'static str {
    if i % 2 == 0 {
        "gpu"
    } else {
        "cpu"
    }
}
