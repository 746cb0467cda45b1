//! `deals.list`: filtered deals, one page per response part.
//!
//! An unusable filter resolves the call with per-field validation instead of
//! failing it.

use super::{paginate, Catalog};
use async_trait::async_trait;
use mc_02_router::{Handler, Produced};
use shared_types::{CallResult, Deal, DealQuery, ListDeals, Page, ProcessorError};
use std::sync::Arc;
use tracing::debug;

pub struct DealsProcessor {
    catalog: Arc<Catalog>,
    page_size: usize,
}

impl DealsProcessor {
    pub fn new(catalog: Arc<Catalog>, page_size: usize) -> Self {
        Self { catalog, page_size }
    }
}

#[async_trait]
impl Handler<ListDeals> for DealsProcessor {
    async fn handle(&self, query: DealQuery) -> Result<Produced<Page<Deal>>, ProcessorError> {
        if let Some(validation) = query.validate() {
            debug!(fields = ?validation.keys().collect::<Vec<_>>(), "Rejecting deal filter");
            return Ok(Produced::last(CallResult::invalid(validation)));
        }

        let deals = self.catalog.deals(&query);
        debug!(address = %query.address, total = deals.len(), "Listing deals");
        Ok(paginate(deals, self.page_size))
    }
}
