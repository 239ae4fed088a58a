//! End-to-end lookup orchestration tests.
//!
//! Tests verify:
//! - Cache-or-compute flow against a real in-memory store
//! - Join ordering with either detector finishing first
//! - Single-flight behavior for concurrent callers
//! - Degradation when the store is unavailable

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use scancache::{
    Detection, ItemStore, MemoryStore, MessageId, RecognitionCache, RecognitionService,
};

use super::test_utils::{labels, test_image, FailingStore, MockEngine};

/// Build a service around a shared engine so tests can read its counters.
fn service_with<S: ItemStore>(
    store: S,
    engine: MockEngine,
) -> (RecognitionService<S, MockEngine>, Arc<MockEngine>) {
    let engine = Arc::new(engine);
    let service = RecognitionService::from_parts(RecognitionCache::new(store), engine.clone());
    (service, engine)
}

#[tokio::test]
async fn test_lookup_is_idempotent_after_population() {
    let engine = MockEngine::new().code("qr-payload").text("scanned words", 0.9);
    let (service, engine) = service_with(MemoryStore::new(), engine);
    let id = MessageId::new(10, 1);

    let supplier_calls = Arc::new(AtomicUsize::new(0));

    let make_supplier = |calls: Arc<AtomicUsize>| {
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Some(test_image()) }
        }
    };

    let first = service
        .lookup(id, make_supplier(supplier_calls.clone()))
        .await;
    let second = service
        .lookup(id, make_supplier(supplier_calls.clone()))
        .await;

    assert_eq!(first, second);
    assert_eq!(
        labels(&first),
        vec!["code:qr-payload", "text:scanned words"]
    );
    // The second call touched neither the supplier nor the engine.
    assert_eq!(supplier_calls.load(Ordering::SeqCst), 1);
    assert_eq!(engine.engine_invocations(), 1);
}

#[tokio::test]
async fn test_join_order_codes_first_text_delayed() {
    let mut engine = MockEngine::new().code("a").code("b").text("later", 0.8);
    engine.text_delay = Some(Duration::from_millis(25));
    let (service, _) = service_with(MemoryStore::new(), engine);

    let results = service
        .lookup(MessageId::new(10, 2), || async { Some(test_image()) })
        .await;

    assert_eq!(labels(&results), vec!["code:a", "code:b", "text:later"]);
}

#[tokio::test]
async fn test_join_order_codes_first_codes_delayed() {
    // Same combined order even when the code pass finishes last.
    let mut engine = MockEngine::new().code("a").code("b").text("early", 0.8);
    engine.code_delay = Some(Duration::from_millis(25));
    let (service, _) = service_with(MemoryStore::new(), engine);

    let results = service
        .lookup(MessageId::new(10, 3), || async { Some(test_image()) })
        .await;

    assert_eq!(labels(&results), vec!["code:a", "code:b", "text:early"]);
}

#[tokio::test]
async fn test_missing_image_leaves_cache_empty() {
    let engine = MockEngine::new().code("never-seen");
    let (service, engine) = service_with(MemoryStore::new(), engine);
    let id = MessageId::new(10, 4);

    let results = service.lookup(id, || async { None }).await;
    assert!(results.is_empty());
    assert_eq!(engine.engine_invocations(), 0);

    // Nothing was cached: a later lookup reaches the engine.
    let results = service.lookup(id, || async { Some(test_image()) }).await;
    assert_eq!(labels(&results), vec!["code:never-seen"]);
    assert_eq!(engine.engine_invocations(), 1);
}

#[tokio::test]
async fn test_partial_detector_failure_still_caches_the_rest() {
    let mut engine = MockEngine::new().code("lost").text("kept", 0.9);
    engine.fail_codes = true;
    let (service, engine) = service_with(MemoryStore::new(), engine);
    let id = MessageId::new(10, 5);

    let first = service.lookup(id, || async { Some(test_image()) }).await;
    assert_eq!(labels(&first), vec!["text:kept"]);

    // The degraded result is terminal; the failed pass is not retried.
    let second = service.lookup(id, || async { Some(test_image()) }).await;
    assert_eq!(second, first);
    assert_eq!(engine.engine_invocations(), 1);
}

#[tokio::test]
async fn test_concurrent_misses_compute_once() {
    let mut mock = MockEngine::new().code("shared");
    mock.code_delay = Some(Duration::from_millis(20));
    let (service, engine) = service_with(MemoryStore::new(), mock);
    let service = Arc::new(service);
    let id = MessageId::new(10, 6);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.lookup(id, || async { Some(test_image()) }).await
        }));
    }

    let mut results: Vec<Vec<Detection>> = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    for result in &results {
        assert_eq!(labels(result), vec!["code:shared"]);
    }
    assert_eq!(engine.engine_invocations(), 1);
}

#[tokio::test]
async fn test_distinct_keys_compute_independently() {
    let (service, engine) = service_with(MemoryStore::new(), MockEngine::new().code("each"));

    service
        .lookup(MessageId::new(11, 1), || async { Some(test_image()) })
        .await;
    service
        .lookup(MessageId::new(11, 2), || async { Some(test_image()) })
        .await;

    assert_eq!(engine.engine_invocations(), 2);
}

#[tokio::test]
async fn test_store_failure_degrades_to_uncached_results() {
    let (service, engine) = service_with(FailingStore, MockEngine::new().code("resilient"));
    let id = MessageId::new(10, 7);

    // Both the read and the write fail; the caller still gets detections.
    let first = service.lookup(id, || async { Some(test_image()) }).await;
    assert_eq!(labels(&first), vec!["code:resilient"]);

    // Without a working store every call recomputes.
    let second = service.lookup(id, || async { Some(test_image()) }).await;
    assert_eq!(second, first);
    assert_eq!(engine.engine_invocations(), 2);
}

#[tokio::test]
async fn test_clear_then_lookup_recomputes() {
    let (service, engine) = service_with(MemoryStore::new(), MockEngine::new().code("fresh"));
    let id = MessageId::new(10, 8);

    service.lookup(id, || async { Some(test_image()) }).await;
    service.clear(id).await.unwrap();
    let results = service.lookup(id, || async { Some(test_image()) }).await;

    assert_eq!(labels(&results), vec!["code:fresh"]);
    assert_eq!(engine.engine_invocations(), 2);
}
