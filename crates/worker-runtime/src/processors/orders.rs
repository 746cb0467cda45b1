//! `orders.list`: an address's orders, one page per response part.

use super::{paginate, Catalog};
use async_trait::async_trait;
use mc_02_router::{Handler, Produced};
use shared_types::{is_address, CallResult, ListOrders, Order, OrderQuery, Page, ProcessorError};
use std::sync::Arc;
use tracing::debug;

pub struct OrdersProcessor {
    catalog: Arc<Catalog>,
    page_size: usize,
}

impl OrdersProcessor {
    pub fn new(catalog: Arc<Catalog>, page_size: usize) -> Self {
        Self { catalog, page_size }
    }
}

#[async_trait]
impl Handler<ListOrders> for OrdersProcessor {
    async fn handle(&self, query: OrderQuery) -> Result<Produced<Page<Order>>, ProcessorError> {
        if !is_address(&query.address) {
            return Ok(Produced::last(CallResult::field_error(
                "address",
                "must be a 0x-prefixed address",
            )));
        }

        let orders = self.catalog.orders(&query);
        debug!(address = %query.address, status = ?query.status, total = orders.len(), "Listing orders");
        Ok(paginate(orders, self.page_size))
    }
}
