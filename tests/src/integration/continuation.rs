//! # Continuation Chains
//!
//! Multi-part calls: ordered delivery, explicit cancel, dropped handles.

#[cfg(test)]
mod tests {
    use crate::integration::harness::{eventually, registry, Count, Harness};
    use futures::StreamExt;
    use mc_01_dispatcher::DispatcherConfig;
    use mc_02_router::ProcessorRegistry;
    use serde_json::json;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_chain_walked_by_hand() {
        let harness = Harness::start();

        let mut part = harness
            .dispatcher
            .dispatch_raw("count", json!(3))
            .await
            .unwrap();
        let mut seen = Vec::new();
        loop {
            seen.push(part.result.data.clone().unwrap());
            match part.continuation {
                Some(next) => part = next.next().await.unwrap(),
                None => break,
            }
        }

        assert_eq!(seen, vec![json!(1), json!(2), json!(3)]);
        assert_eq!(harness.dispatcher.pending_count(), 0);
        assert!(eventually(|| harness.router.in_flight() == 0).await);
    }

    #[tokio::test]
    async fn test_chain_stage_advances() {
        let harness = Harness::start();

        let part = harness
            .dispatcher
            .dispatch_raw("count", json!(2))
            .await
            .unwrap();
        let continuation = part.continuation.unwrap();
        let id = continuation.request_id().clone();

        assert!(harness.dispatcher.is_pending(&id));
        let last = continuation.next().await.unwrap();
        assert!(last.is_final());
        assert!(!harness.dispatcher.is_pending(&id));
    }

    #[tokio::test]
    async fn test_drain_collects_every_part() {
        let harness = Harness::start();

        let results = harness
            .dispatcher
            .dispatch_raw("count", json!(5))
            .await
            .unwrap()
            .drain()
            .await
            .unwrap();

        let values: Vec<_> = results.into_iter().filter_map(|r| r.data).collect();
        assert_eq!(values, (1..=5).map(|n| json!(n)).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_stream_adapter() {
        let harness = Harness::start();

        let stream = harness
            .dispatcher
            .dispatch_raw("count", json!(4))
            .await
            .unwrap()
            .into_stream();
        let collected: Vec<_> = stream.collect().await;

        assert_eq!(collected.len(), 4);
        assert!(collected.iter().all(Result::is_ok));
    }

    #[tokio::test]
    async fn test_cancel_stops_worker_chain() {
        let steps = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut registry = ProcessorRegistry::new();
        registry
            .register(
                "count",
                Arc::new(Count {
                    steps: Arc::clone(&steps),
                }),
            )
            .unwrap();
        let harness = Harness::with(registry, DispatcherConfig::default());

        let part = harness
            .dispatcher
            .dispatch_raw("count", json!(1_000))
            .await
            .unwrap();
        part.continuation.unwrap().cancel().await;

        assert_eq!(harness.dispatcher.pending_count(), 0);
        assert!(eventually(|| harness.router.in_flight() == 0).await);
        assert_eq!(
            harness
                .router
                .stats()
                .chains_cancelled
                .load(Ordering::Relaxed),
            1
        );

        // The chain stops well short of the requested count
        let stopped_at = steps.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(steps.load(Ordering::SeqCst), stopped_at);
        assert!(stopped_at < 1_000);
    }

    #[tokio::test]
    async fn test_dropped_continuation_released() {
        let harness = Harness::start();

        let part = harness
            .dispatcher
            .dispatch_raw("count", json!(1_000))
            .await
            .unwrap();
        drop(part);

        // Released on the next response for the call, which also cancels it
        assert!(eventually(|| harness.dispatcher.pending_count() == 0).await);
        assert!(eventually(|| harness.router.in_flight() == 0).await);
    }

    #[tokio::test]
    async fn test_dropped_quiet_continuation_swept() {
        let config = DispatcherConfig::default().with_sweep_interval(Duration::from_millis(20));
        let harness = Harness::with(registry(), config);

        let part = harness
            .dispatcher
            .dispatch_raw("stall", json!({}))
            .await
            .unwrap();
        assert!(!part.is_final());
        drop(part);

        // The worker never sends again; the sweeper finds the closed handle
        assert!(eventually(|| harness.dispatcher.pending_count() == 0).await);
        assert!(eventually(|| harness.router.in_flight() == 0).await);
        assert_eq!(
            harness
                .dispatcher
                .stats()
                .total_cancelled
                .load(Ordering::Relaxed),
            1
        );
    }
}
