//! # Marketplace Methods
//!
//! The worker runtime's processors, called through a dispatcher.

#[cfg(test)]
mod tests {
    use mc_01_dispatcher::{CallError, Dispatcher, DispatcherConfig};
    use shared_bus::InMemoryChannel;
    use shared_types::{
        AccountSummary, AddressQuery, DealQuery, GetProfile, ListDeals, ListOrders, OrderQuery,
        OrderStatus,
    };
    use std::sync::Arc;
    use worker_runtime::processors::catalog::{SEED_NEWCOMER, SEED_PROVIDER};
    use worker_runtime::{Catalog, WorkerConfig, WorkerRuntime};

    const PAGE_SIZE: usize = 10;

    fn start() -> (Dispatcher, WorkerRuntime) {
        let mut config = WorkerConfig::default();
        config.security.hmac_secret = [3; 32];
        config.catalog.page_size = PAGE_SIZE;

        let (caller, worker) = InMemoryChannel::pair();
        let runtime =
            WorkerRuntime::start(&config, Arc::new(Catalog::seeded()), Arc::new(worker)).unwrap();
        let dispatcher = Dispatcher::start(
            Arc::new(caller),
            Arc::new(config.security.signer().unwrap()),
            DispatcherConfig::default(),
        )
        .unwrap();
        (dispatcher, runtime)
    }

    #[tokio::test]
    async fn test_profile_get() {
        let (dispatcher, _runtime) = start();

        let profile = dispatcher
            .dispatch::<GetProfile>(AddressQuery::new(SEED_PROVIDER))
            .await
            .unwrap()
            .result
            .data
            .unwrap();

        assert_eq!(profile.display_name, "Provider One");
        assert_eq!(profile.email.as_deref(), Some("ops@provider.one"));
    }

    #[tokio::test]
    async fn test_profile_missing_is_remote_error() {
        let (dispatcher, _runtime) = start();

        let err = dispatcher
            .dispatch::<GetProfile>(AddressQuery::new(
                "0x0000000000000000000000000000000000000001",
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, CallError::Remote { ref message } if message.starts_with("no profile")));
    }

    #[tokio::test]
    async fn test_account_summary() {
        let (dispatcher, _runtime) = start();

        let overview = dispatcher
            .dispatch::<AccountSummary>(AddressQuery::new(SEED_NEWCOMER))
            .await
            .unwrap()
            .result
            .data
            .unwrap();

        assert_eq!(overview.balance, 500);
        assert_eq!(overview.open_orders, 0);
        assert_eq!(overview.active_deals, 0);
    }

    #[tokio::test]
    async fn test_orders_arrive_page_by_page() {
        let (dispatcher, runtime) = start();

        let pages = dispatcher
            .dispatch::<ListOrders>(OrderQuery {
                address: SEED_PROVIDER.into(),
                status: None,
            })
            .await
            .unwrap()
            .drain()
            .await
            .unwrap();

        // 45 orders at 10 per page
        assert_eq!(pages.len(), 5);
        let pages: Vec<_> = pages.into_iter().map(|r| r.data.unwrap()).collect();
        assert_eq!(
            pages.iter().map(|p| p.page).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
        assert_eq!(pages.iter().map(|p| p.items.len()).sum::<usize>(), 45);
        assert!(pages[4].last);
        assert!(pages[..4].iter().all(|p| !p.last));
        assert_eq!(runtime.catalog().orders(&OrderQuery {
            address: SEED_PROVIDER.into(),
            status: Some(OrderStatus::Cancelled),
        }).len(), 4);
    }

    #[tokio::test]
    async fn test_orders_bad_address_is_validation() {
        let (dispatcher, _runtime) = start();

        let part = dispatcher
            .dispatch::<ListOrders>(OrderQuery {
                address: "not-an-address".into(),
                status: None,
            })
            .await
            .unwrap();

        assert!(part.is_final());
        assert!(part.result.validation.unwrap().contains_key("address"));
    }

    #[tokio::test]
    async fn test_deal_filter_validation() {
        let (dispatcher, _runtime) = start();

        let part = dispatcher
            .dispatch::<ListDeals>(DealQuery {
                address: SEED_PROVIDER.into(),
                category: Some("  ".into()),
                min_price: Some(10),
                max_price: Some(1),
            })
            .await
            .unwrap();

        let validation = part.result.validation.unwrap();
        assert_eq!(validation["category"], "must not be blank");
        assert_eq!(validation["minPrice"], "must not exceed maxPrice");
        assert!(part.result.data.is_none());
    }

    #[tokio::test]
    async fn test_deals_filtered() {
        let (dispatcher, _runtime) = start();

        let pages = dispatcher
            .dispatch::<ListDeals>(DealQuery {
                address: SEED_PROVIDER.into(),
                category: Some("cpu".into()),
                ..Default::default()
            })
            .await
            .unwrap()
            .drain()
            .await
            .unwrap();

        assert_eq!(pages.len(), 1);
        let page = pages.into_iter().next().unwrap().data.unwrap();
        assert_eq!(page.total, 6);
        assert!(page.items.iter().all(|d| d.category == "cpu"));
    }
}
