//! Cart engine semantics and concurrency guarantees.
//!
//! Scenarios run through the real `CartService` over the in-memory store,
//! which carries the same per-session locking contract as the `PostgreSQL`
//! store.

use std::sync::Arc;
use std::time::Duration;

use greenbasket_cart::services::{CartError, MAX_QUANTITY};
use greenbasket_core::{ProductId, SessionId};
use greenbasket_integration_tests::memory_service;

fn session(id: &str) -> SessionId {
    SessionId::parse(id).expect("valid session id")
}

fn product(id: &str) -> ProductId {
    ProductId::parse(id).expect("valid product id")
}

// =============================================================================
// Fetch Semantics
// =============================================================================

#[tokio::test]
async fn test_fetch_is_stable_without_intervening_merges() {
    let (service, _) = memory_service([("p1", 500)]);
    let sid = session("s1");

    service.merge(&sid, &product("p1"), 2).await.expect("merge");

    let first = service.fetch(&sid).await.expect("fetch");
    let second = service.fetch(&sid).await.expect("fetch");
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_fetch_without_cart_is_not_found() {
    let (service, _) = memory_service([("p1", 500)]);
    let err = service.fetch(&session("nobody")).await.unwrap_err();
    assert!(matches!(err, CartError::NotFound));
}

// =============================================================================
// Merge Semantics
// =============================================================================

#[tokio::test]
async fn test_first_merge_creates_cart_with_snapshot_price() {
    let (service, _) = memory_service([("p1", 500)]);
    let sid = session("s1");

    let cart = service.merge(&sid, &product("p1"), 2).await.expect("merge");

    assert_eq!(cart.session_id, sid);
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].product_id, product("p1"));
    assert_eq!(cart.items[0].quantity, 2);
    assert_eq!(cart.items[0].price_cents, 500);
}

#[tokio::test]
async fn test_repeat_merge_increments_and_ignores_new_price() {
    let (service, resolver) = memory_service([("p1", 500)]);
    let sid = session("s1");

    service.merge(&sid, &product("p1"), 2).await.expect("merge");

    // Catalog repricing between merges must not touch the snapshot.
    resolver.set_price(product("p1"), 600).await;

    let cart = service.merge(&sid, &product("p1"), 3).await.expect("merge");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 5);
    assert_eq!(cart.items[0].price_cents, 500);
}

#[tokio::test]
async fn test_items_keep_insertion_order() {
    let (service, _) = memory_service([("p1", 500), ("p2", 1000)]);
    let sid = session("s1");

    service.merge(&sid, &product("p1"), 2).await.expect("merge");
    service.merge(&sid, &product("p1"), 3).await.expect("merge");
    let cart = service.merge(&sid, &product("p2"), 1).await.expect("merge");

    let order: Vec<&str> = cart.items.iter().map(|i| i.product_id.as_str()).collect();
    assert_eq!(order, vec!["p1", "p2"]);
    assert_eq!(cart.items[1].price_cents, 1000);
}

#[tokio::test]
async fn test_unknown_product_leaves_cart_untouched() {
    let (service, resolver) = memory_service([("p1", 500)]);
    let sid = session("s1");

    service.merge(&sid, &product("p1"), 1).await.expect("merge");
    let before = service.fetch(&sid).await.expect("fetch");

    resolver.remove(&product("p1")).await;
    let err = service.merge(&sid, &product("p1"), 1).await.unwrap_err();
    assert!(matches!(err, CartError::ProductNotFound(_)));

    let after = service.fetch(&sid).await.expect("fetch");
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_unknown_product_on_fresh_session_creates_nothing() {
    let (service, _) = memory_service([("p1", 500)]);
    let sid = session("fresh");

    let err = service.merge(&sid, &product("ghost"), 1).await.unwrap_err();
    assert!(matches!(err, CartError::ProductNotFound(_)));

    let err = service.fetch(&sid).await.unwrap_err();
    assert!(matches!(err, CartError::NotFound));
}

#[tokio::test]
async fn test_non_positive_quantity_creates_nothing() {
    let (service, _) = memory_service([("p1", 500)]);
    let sid = session("s1");

    for quantity in [0, -3] {
        let err = service
            .merge(&sid, &product("p1"), quantity)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity(q) if q == quantity));
    }

    let err = service.fetch(&sid).await.unwrap_err();
    assert!(matches!(err, CartError::NotFound));
}

#[tokio::test]
async fn test_oversized_quantity_creates_nothing() {
    let (service, _) = memory_service([("p1", 500)]);
    let sid = session("s1");

    for quantity in [MAX_QUANTITY + 1, i64::MAX] {
        let err = service
            .merge(&sid, &product("p1"), quantity)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity(q) if q == quantity));
    }

    let err = service.fetch(&sid).await.unwrap_err();
    assert!(matches!(err, CartError::NotFound));
}

// =============================================================================
// Concurrency Guarantees
// =============================================================================

/// N concurrent merges on one new session must all land: exactly one line
/// with quantity N, regardless of interleaving.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_merges_on_one_session_lose_no_updates() {
    const N: usize = 64;

    let (service, _) = memory_service([("p1", 500)]);
    let service = Arc::new(service);
    let sid = session("s1");

    let mut tasks = Vec::with_capacity(N);
    for _ in 0..N {
        let service = Arc::clone(&service);
        let sid = sid.clone();
        tasks.push(tokio::spawn(async move {
            service.merge(&sid, &product("p1"), 1).await
        }));
    }
    for task in tasks {
        task.await.expect("task").expect("merge");
    }

    let cart = service.fetch(&sid).await.expect("fetch");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, N as i64);
    assert_eq!(cart.items[0].price_cents, 500);
}

/// Merges on distinct sessions must not contend: a single merge on session
/// B completes promptly even while session A is under heavy merge load.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_distinct_sessions_do_not_block_each_other() {
    let (service, _) = memory_service([("p1", 500), ("p2", 900)]);
    let service = Arc::new(service);

    let busy = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            let sid = session("busy");
            for _ in 0..500 {
                service.merge(&sid, &product("p1"), 1).await.expect("merge");
            }
        })
    };

    let quiet = session("quiet");
    let cart = tokio::time::timeout(
        Duration::from_secs(2),
        service.merge(&quiet, &product("p2"), 1),
    )
    .await
    .expect("merge on an uncontended session must not wait on another session's lock")
    .expect("merge");

    assert_eq!(cart.quantity_of(&product("p2")), Some(1));

    busy.await.expect("task");
    let busy_cart = service.fetch(&session("busy")).await.expect("fetch");
    assert_eq!(busy_cart.quantity_of(&product("p1")), Some(500));
    // And the quiet session never picked up the busy session's line.
    assert!(cart.quantity_of(&product("p1")).is_none());
}

/// Concurrent merges of different products on the same session keep the
/// one-line-per-product invariant.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_mixed_products_preserve_line_invariant() {
    let (service, _) = memory_service([("p1", 500), ("p2", 900)]);
    let service = Arc::new(service);
    let sid = session("s1");

    let mut tasks = Vec::new();
    for i in 0..40 {
        let service = Arc::clone(&service);
        let sid = sid.clone();
        let pid = if i % 2 == 0 { "p1" } else { "p2" };
        tasks.push(tokio::spawn(async move {
            service.merge(&sid, &product(pid), 1).await
        }));
    }
    for task in tasks {
        task.await.expect("task").expect("merge");
    }

    let cart = service.fetch(&sid).await.expect("fetch");
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.quantity_of(&product("p1")), Some(20));
    assert_eq!(cart.quantity_of(&product("p2")), Some(20));
}

// =============================================================================
// Cancellation Safety
// =============================================================================

/// A merge cancelled before it runs must leave the cart untouched and must
/// not orphan the session lock.
#[tokio::test]
async fn test_cancelled_merge_leaves_cart_unchanged_and_lock_free() {
    let (service, _) = memory_service([("p1", 500)]);
    let service = Arc::new(service);
    let sid = session("s1");

    service.merge(&sid, &product("p1"), 2).await.expect("merge");
    let before = service.fetch(&sid).await.expect("fetch");

    // Current-thread runtime: the spawned task has not been polled before
    // the abort, so the merge is cancelled before any store work.
    let victim = tokio::spawn({
        let service = Arc::clone(&service);
        let sid = sid.clone();
        async move { service.merge(&sid, &product("p1"), 1).await }
    });
    victim.abort();
    assert!(victim.await.expect_err("task must be cancelled").is_cancelled());

    assert_eq!(service.fetch(&sid).await.expect("fetch"), before);

    // The session lock was released, not orphaned: the next merge on the
    // same session proceeds promptly.
    let cart = tokio::time::timeout(
        Duration::from_secs(2),
        service.merge(&sid, &product("p1"), 3),
    )
    .await
    .expect("merge must not wait on a lock held by a cancelled task")
    .expect("merge");
    assert_eq!(cart.quantity_of(&product("p1")), Some(5));
}

/// Aborting a merge mid-contention must be all-or-nothing: the final
/// quantity reflects either zero or all of the aborted merge, never part of
/// it, and later merges keep working.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_aborted_merge_never_partially_commits() {
    const N: usize = 50;

    let (service, _) = memory_service([("p1", 500)]);
    let service = Arc::new(service);
    let sid = session("s1");

    let mut tasks = Vec::with_capacity(N);
    for _ in 0..N {
        let service = Arc::clone(&service);
        let sid = sid.clone();
        tasks.push(tokio::spawn(async move {
            service.merge(&sid, &product("p1"), 1).await
        }));
    }

    // The victim adds a large distinguishable amount, then gets aborted at
    // some point during the contention above.
    let victim = tokio::spawn({
        let service = Arc::clone(&service);
        let sid = sid.clone();
        async move { service.merge(&sid, &product("p1"), 100).await }
    });
    tokio::task::yield_now().await;
    victim.abort();

    // After the store's single publish write there are no await points, so
    // a cancelled join error means the merge did not commit at all.
    let committed = match victim.await {
        Ok(result) => {
            result.expect("merge");
            true
        }
        Err(err) => {
            assert!(err.is_cancelled());
            false
        }
    };
    for task in tasks {
        task.await.expect("task").expect("merge");
    }

    let cart = service.fetch(&sid).await.expect("fetch");
    assert_eq!(cart.items.len(), 1);
    let expected = N as i64 + if committed { 100 } else { 0 };
    assert_eq!(cart.quantity_of(&product("p1")), Some(expected));

    // The lock still cycles after the abort.
    let cart = tokio::time::timeout(
        Duration::from_secs(2),
        service.merge(&sid, &product("p1"), 1),
    )
    .await
    .expect("merge after an aborted merge must not block")
    .expect("merge");
    assert_eq!(cart.quantity_of(&product("p1")), Some(expected + 1));
}
