//! `profile.get` and `account.summary`.

use super::Catalog;
use async_trait::async_trait;
use mc_02_router::{Handler, Produced};
use shared_types::{
    is_address, AccountOverview, AccountSummary, AddressQuery, CallResult, GetProfile,
    ProcessorError, Profile,
};
use std::sync::Arc;
use tracing::debug;

const ADDRESS_HINT: &str = "must be a 0x-prefixed address";

pub struct ProfileProcessor {
    catalog: Arc<Catalog>,
}

impl ProfileProcessor {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Handler<GetProfile> for ProfileProcessor {
    async fn handle(&self, query: AddressQuery) -> Result<Produced<Profile>, ProcessorError> {
        if !is_address(&query.address) {
            return Ok(Produced::last(CallResult::field_error("address", ADDRESS_HINT)));
        }
        debug!(address = %query.address, "Looking up profile");

        self.catalog
            .profile(&query.address)
            .map(Produced::last_data)
            .ok_or_else(|| ProcessorError::failed(format!("no profile for {}", query.address)))
    }
}

pub struct AccountProcessor {
    catalog: Arc<Catalog>,
}

impl AccountProcessor {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Handler<AccountSummary> for AccountProcessor {
    async fn handle(
        &self,
        query: AddressQuery,
    ) -> Result<Produced<AccountOverview>, ProcessorError> {
        if !is_address(&query.address) {
            return Ok(Produced::last(CallResult::field_error("address", ADDRESS_HINT)));
        }
        debug!(address = %query.address, "Building account summary");

        self.catalog
            .overview(&query.address)
            .map(Produced::last_data)
            .ok_or_else(|| ProcessorError::failed(format!("unknown account {}", query.address)))
    }
}
