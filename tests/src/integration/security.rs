//! # Signature Enforcement
//!
//! Both ends verify every envelope; a key mismatch never reaches a processor
//! and never resolves a call.

#[cfg(test)]
mod tests {
    use crate::integration::harness::{registry, signer, Harness};
    use mc_01_dispatcher::{CallError, DispatcherConfig};
    use serde_json::json;
    use shared_types::HmacSigner;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_mismatched_keys_never_resolve() {
        let harness = Harness::with_signers(
            registry(),
            DispatcherConfig::default(),
            HmacSigner::new(b"caller-key").unwrap(),
            signer(),
        );

        let err = harness
            .dispatcher
            .dispatch_raw("panic", json!({}))
            .await
            .unwrap_err();

        // The worker rejected the request without running the processor,
        // and its rejection does not verify under the caller's key either.
        assert_eq!(err, CallError::InvalidSignature);
        assert_eq!(
            harness
                .router
                .stats()
                .requests_rejected
                .load(Ordering::Relaxed),
            1
        );
        assert_eq!(
            harness
                .router
                .stats()
                .processor_failures
                .load(Ordering::Relaxed),
            0
        );
        assert_eq!(harness.dispatcher.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_derived_keys_per_channel() {
        let master = [9u8; 32];
        let harness = Harness::with_signers(
            registry(),
            DispatcherConfig::default(),
            HmacSigner::derived(&master, "channel-a").unwrap(),
            HmacSigner::derived(&master, "channel-a").unwrap(),
        );
        assert!(harness
            .dispatcher
            .dispatch_raw("echo", json!(1))
            .await
            .is_ok());

        let crossed = Harness::with_signers(
            registry(),
            DispatcherConfig::default(),
            HmacSigner::derived(&master, "channel-a").unwrap(),
            HmacSigner::derived(&master, "channel-b").unwrap(),
        );
        assert_eq!(
            crossed
                .dispatcher
                .dispatch_raw("echo", json!(1))
                .await
                .unwrap_err(),
            CallError::InvalidSignature
        );
    }
}
