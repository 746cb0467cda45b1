//! # Concurrent Calls
//!
//! Many calls in flight on one channel never see each other's responses.

#[cfg(test)]
mod tests {
    use crate::integration::harness::Harness;
    use futures::future::join_all;
    use serde_json::json;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_single_calls() {
        let harness = Harness::start();

        let calls = (0..50).map(|i| {
            let dispatcher = harness.dispatcher.clone();
            async move {
                let part = dispatcher.dispatch_raw("echo", json!({ "i": i })).await?;
                Ok::<_, mc_01_dispatcher::CallError>((i, part.result.data))
            }
        });

        for outcome in join_all(calls).await {
            let (i, data) = outcome.unwrap();
            assert_eq!(data, Some(json!({ "i": i })));
        }
        assert_eq!(harness.dispatcher.pending_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_interleaved_chains() {
        let harness = Harness::start();

        let chains = (2..8u64).map(|n| {
            let dispatcher = harness.dispatcher.clone();
            async move {
                let results = dispatcher
                    .dispatch_raw("count", json!(n))
                    .await?
                    .drain()
                    .await?;
                Ok::<_, mc_01_dispatcher::CallError>((n, results))
            }
        });

        for outcome in join_all(chains).await {
            let (n, results) = outcome.unwrap();
            let values: Vec<_> = results.into_iter().filter_map(|r| r.data).collect();
            assert_eq!(values, (1..=n).map(|k| json!(k)).collect::<Vec<_>>());
        }
    }

    #[tokio::test]
    async fn test_failure_does_not_leak_into_neighbours() {
        let harness = Harness::start();

        let (failed, ok, invalid) = tokio::join!(
            harness.dispatcher.dispatch_raw("fail", json!({})),
            harness.dispatcher.dispatch_raw("echo", json!("fine")),
            harness.dispatcher.dispatch_raw("validate", json!({})),
        );

        assert!(failed.unwrap_err().is_remote());
        assert_eq!(ok.unwrap().result.data, Some(json!("fine")));
        assert!(invalid.unwrap().result.is_invalid());
    }

    #[tokio::test]
    async fn test_request_ids_unique() {
        let harness = Harness::start();

        let first = harness
            .dispatcher
            .dispatch_raw("stall", json!({}))
            .await
            .unwrap();
        let second = harness
            .dispatcher
            .dispatch_raw("stall", json!({}))
            .await
            .unwrap();

        let a = first.continuation.unwrap();
        let b = second.continuation.unwrap();
        assert_ne!(a.request_id(), b.request_id());
        assert_eq!(harness.router.in_flight(), 2);

        a.cancel().await;
        b.cancel().await;
    }
}
