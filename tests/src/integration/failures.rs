//! # Failure Paths
//!
//! Every call ends in a final part or an error, and the entry is released
//! either way.

#[cfg(test)]
mod tests {
    use crate::integration::harness::{eventually, Harness};
    use mc_01_dispatcher::CallError;
    use serde_json::json;
    use shared_types::Method;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn remote(message: &str) -> CallError {
        CallError::Remote {
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let harness = Harness::start();

        let err = harness
            .dispatcher
            .dispatch_raw("nope", json!({}))
            .await
            .unwrap_err();

        assert_eq!(err, remote("unknown method"));
        assert!(err.is_remote());
        assert_eq!(harness.dispatcher.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_processor_error() {
        let harness = Harness::start();

        let err = harness
            .dispatcher
            .dispatch_raw("fail", json!({}))
            .await
            .unwrap_err();

        assert_eq!(err, remote("backend unavailable"));
        assert_eq!(
            harness
                .router
                .stats()
                .processor_failures
                .load(Ordering::Relaxed),
            1
        );
        assert_eq!(
            harness.dispatcher.stats().total_failed.load(Ordering::Relaxed),
            1
        );
    }

    #[tokio::test]
    async fn test_processor_panic_is_contained() {
        let harness = Harness::start();

        let err = harness
            .dispatcher
            .dispatch_raw("panic", json!({}))
            .await
            .unwrap_err();
        assert_eq!(err, remote("processor panicked"));

        // Worker still serves
        let part = harness
            .dispatcher
            .dispatch_raw("echo", json!("alive"))
            .await
            .unwrap();
        assert_eq!(part.result.data, Some(json!("alive")));
    }

    #[tokio::test]
    async fn test_bad_payload_shape() {
        let harness = Harness::start();

        let err = harness
            .dispatcher
            .dispatch_raw("count", json!("three"))
            .await
            .unwrap_err();

        match err {
            CallError::Remote { message } => assert!(message.starts_with("invalid payload")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_releases_and_cancels() {
        let harness = Harness::start();

        let err = harness
            .dispatcher
            .dispatch_raw_with_timeout("hang", json!({}), Duration::from_millis(50))
            .await
            .unwrap_err();

        assert_eq!(err, CallError::Timeout);
        assert_eq!(harness.dispatcher.pending_count(), 0);
        assert_eq!(
            harness
                .dispatcher
                .stats()
                .total_timeouts
                .load(Ordering::Relaxed),
            1
        );
        assert!(eventually(|| harness.router.in_flight() == 0).await);
    }

    #[tokio::test]
    async fn test_timeout_between_parts() {
        let harness = Harness::start();

        let part = harness
            .dispatcher
            .dispatch_raw_with_timeout("stall", json!({}), Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(part.result.data, Some(json!("first")));

        let err = part.continuation.unwrap().next().await.unwrap_err();
        assert_eq!(err, CallError::Timeout);
        assert!(eventually(|| harness.router.in_flight() == 0).await);
    }

    /// Caller expects a shape the worker does not produce.
    struct WrongShape;

    impl Method for WrongShape {
        const NAME: &'static str = "echo";
        type Payload = serde_json::Value;
        type Output = Vec<u32>;
    }

    #[tokio::test]
    async fn test_decode_mismatch() {
        let harness = Harness::start();

        let err = harness
            .dispatcher
            .dispatch::<WrongShape>(json!({"not": "a list"}))
            .await
            .unwrap_err();

        assert!(matches!(err, CallError::Decode(_)));
        assert_eq!(harness.dispatcher.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_fails_pending_calls() {
        let harness = Harness::start();
        let dispatcher = harness.dispatcher.clone();

        let call = tokio::spawn(async move { dispatcher.dispatch_raw("hang", json!({})).await });
        assert!(eventually(|| harness.dispatcher.pending_count() == 1).await);

        harness.dispatcher.shutdown().await;

        assert_eq!(call.await.unwrap().unwrap_err(), CallError::Shutdown);
        assert_eq!(
            harness
                .dispatcher
                .dispatch_raw("echo", json!({}))
                .await
                .unwrap_err(),
            CallError::Shutdown
        );
        assert!(eventually(|| harness.router.in_flight() == 0).await);
    }

    #[tokio::test]
    async fn test_router_gone_fails_pending_calls() {
        let harness = Harness::start();
        let dispatcher = harness.dispatcher.clone();

        let call = tokio::spawn(async move { dispatcher.dispatch_raw("hang", json!({})).await });
        assert!(eventually(|| harness.dispatcher.pending_count() == 1).await);

        harness.router.shutdown().await;
        drop(harness.router);

        let err = call.await.unwrap().unwrap_err();
        assert!(matches!(err, CallError::Transport(_)), "got {:?}", err);
    }
}
