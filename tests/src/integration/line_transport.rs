//! # Newline-Framed Transport
//!
//! Dispatcher and worker runtime joined by an in-process byte stream, the
//! same framing the worker binary uses on stdio.

#[cfg(test)]
mod tests {
    use mc_01_dispatcher::{CallError, Dispatcher, DispatcherConfig};
    use shared_bus::LineChannel;
    use shared_types::{ListOrders, OrderQuery};
    use std::sync::Arc;
    use worker_runtime::processors::catalog::SEED_PROVIDER;
    use worker_runtime::{Catalog, WorkerConfig, WorkerRuntime};

    fn config() -> WorkerConfig {
        let mut config = WorkerConfig::default();
        config.security.hmac_secret = [5; 32];
        config.catalog.page_size = 7;
        config
    }

    #[tokio::test]
    async fn test_paged_listing_over_byte_stream() {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (client_read, client_write) = tokio::io::split(client);
        let (server_read, server_write) = tokio::io::split(server);

        let config = config();
        let runtime = WorkerRuntime::start(
            &config,
            Arc::new(Catalog::seeded()),
            Arc::new(LineChannel::new(server_read, server_write, "worker")),
        )
        .unwrap();
        let dispatcher = Dispatcher::start(
            Arc::new(LineChannel::new(client_read, client_write, "caller")),
            Arc::new(config.security.signer().unwrap()),
            DispatcherConfig::default(),
        )
        .unwrap();

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

        // 45 orders at 7 per page
        assert_eq!(pages.len(), 7);
        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_worker_exit_fails_pending() {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (client_read, client_write) = tokio::io::split(client);

        let dispatcher = Dispatcher::start(
            Arc::new(LineChannel::new(client_read, client_write, "caller")),
            Arc::new(config().security.signer().unwrap()),
            DispatcherConfig::default(),
        )
        .unwrap();

        let pending = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                dispatcher
                    .dispatch::<ListOrders>(OrderQuery {
                        address: SEED_PROVIDER.into(),
                        status: None,
                    })
                    .await
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        // Worker side of the stream goes away
        drop(server);

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, CallError::Transport(_)), "got {:?}", err);
    }
}
