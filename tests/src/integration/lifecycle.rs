//! # Lifecycle Invocation
//!
//! ## Properties Tested:
//!
//! 1. **Ordering law**: ordered calls run by ascending order, never overlapping
//! 2. **Concurrency**: parallel calls overlap in time
//! 3. **Short-circuit**: the first ordered failure stops later services
//! 4. **Parallel failure**: the first error is reported, other calls keep going

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use stitch_runtime::{InvocationErrorKind, ServiceId};

    use crate::fixtures::staged_container;

    // =========================================================================
    // ORDERED
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_ordered_runs_by_ascending_order() {
        let (container, ledger) = staged_container();

        container
            .ordered_invoke("stage", vec![json!(20)])
            .await
            .unwrap();

        assert_eq!(ledger.started(), vec![-5, 0, 10]);
        assert_eq!(ledger.finished(), vec![-5, 0, 10]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ordered_windows_never_overlap() {
        let (container, ledger) = staged_container();

        container
            .ordered_invoke("stage", vec![json!(20)])
            .await
            .unwrap();

        let windows = ledger.windows();
        for pair in windows.windows(2) {
            let finished = pair[0].finished.unwrap();
            assert!(finished <= pair[1].started, "{pair:?} overlap");
            assert!(finished - pair[0].started >= Duration::from_millis(20));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ordered_short_circuits_on_failure() {
        let (container, ledger) = staged_container();

        // Order 0 sits between -5 and 10
        let err = container
            .ordered_invoke("stage", vec![json!(5), json!(0)])
            .await
            .unwrap_err();

        assert_eq!(ledger.started(), vec![-5, 0]);
        assert_eq!(ledger.finished(), vec![-5]);
        assert_eq!(err.service, ServiceId(3));
        assert_eq!(err.method, "stage");
        assert!(err.type_name.ends_with("Stage<0>"));
        match &err.kind {
            InvocationErrorKind::Failed(cause) => assert_eq!(cause.to_string(), "stage 0 rejected"),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ordered_undefined_method_is_noop() {
        let (container, ledger) = staged_container();

        container.ordered_invoke("missing", Vec::new()).await.unwrap();

        assert!(ledger.windows().is_empty());
    }

    // =========================================================================
    // PARALLEL
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_parallel_calls_overlap() {
        let (container, ledger) = staged_container();

        container.invoke("stage", vec![json!(50)]).await.unwrap();

        let windows = ledger.windows();
        assert_eq!(windows.len(), 3);
        let first_finish = windows.iter().filter_map(|w| w.finished).min().unwrap();
        assert!(windows.iter().all(|w| w.started < first_finish));
    }

    #[tokio::test(start_paused = true)]
    async fn test_parallel_failure_leaves_others_running() {
        let (container, ledger) = staged_container();

        let err = container
            .invoke("stage", vec![json!(10), json!(-5)])
            .await
            .unwrap_err();
        assert!(err.type_name.ends_with("Stage<-5>"));

        // The remaining calls were detached, not cancelled
        tokio::time::sleep(Duration::from_millis(50)).await;

        let mut finished = ledger.finished();
        finished.sort_unstable();
        assert_eq!(finished, vec![0, 10]);
        assert_eq!(ledger.started().len(), 3);
    }

    #[tokio::test]
    async fn test_parallel_on_empty_method_succeeds() {
        let (container, ledger) = staged_container();

        container.invoke("missing", Vec::new()).await.unwrap();

        assert!(ledger.started().is_empty());
    }
}
