//! Integration Tests on a real tokio timer
//!
//! Timing-sensitive checks of expiry and graceful drain with `TokioLoop`.

use std::time::Duration;

use serde_json::json;
use tick_cache::config::MIN_TICK_INTERVAL;
use tick_cache::{Cache, CacheConfig, CacheEvent, LifecycleState, StartMode, TokioLoop};
use tokio::time::Instant;

const TICK: Duration = Duration::from_millis(20);

#[tokio::test]
async fn test_key_expires_on_real_ticks() {
    let event_loop = TokioLoop::current();
    let cache = Cache::new(event_loop, CacheConfig::default().with_tick_interval(TICK));
    cache.start().await.unwrap();

    cache
        .set("short", json!("v"), Some(Duration::from_millis(60)))
        .await
        .unwrap();
    assert!(cache.exists("short").await.unwrap());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!cache.exists("short").await.unwrap());
    assert_eq!(cache.stats().await.unwrap().expirations, 1);
}

#[tokio::test]
async fn test_drain_stops_after_ttl() {
    let event_loop = TokioLoop::current();
    let cache = Cache::new(
        event_loop.clone(),
        CacheConfig::default().with_tick_interval(TICK),
    );
    let mut events = cache.subscribe();
    cache.start().await.unwrap();
    assert_eq!(events.recv().await.unwrap(), CacheEvent::Started(cache.downgrade()));

    let ttl = Duration::from_millis(100);
    cache.set("k", json!(1), Some(ttl)).await.unwrap();

    let began = Instant::now();
    let closed = cache.end().await.unwrap();
    let elapsed = began.elapsed();

    assert_eq!(events.recv().await.unwrap(), CacheEvent::Stopped(cache.downgrade()));
    assert_eq!(closed.state(), LifecycleState::Closed);
    // TTLs round to whole ticks and the timer's phase is not aligned with
    // `set`, so the last expiry can land up to one tick before the TTL.
    assert!(elapsed >= ttl - TICK, "drained too early: {:?}", elapsed);
    // One tick of resolution plus scheduler slack
    assert!(elapsed <= ttl + TICK * 5, "drained too late: {:?}", elapsed);
    assert_eq!(event_loop.active_timers(), 0);
}

#[tokio::test]
async fn test_zero_interval_assigned_after_build_still_ticks() {
    let event_loop = TokioLoop::current();
    let mut config = CacheConfig::default();
    config.tick_interval = Duration::ZERO;
    let cache = Cache::new(event_loop.clone(), config);

    assert_eq!(cache.config().tick_interval, MIN_TICK_INTERVAL);
    cache.start().await.unwrap();
    assert_eq!(event_loop.active_timers(), 1);

    cache
        .set("k", json!(1), Some(Duration::from_millis(50)))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!cache.exists("k").await.unwrap());
    assert!(!cache.exists_ttl("k").await.unwrap());

    cache
        .set("k", json!(1), Some(Duration::from_millis(50)))
        .await
        .unwrap();
    let closed = tokio::time::timeout(Duration::from_millis(300), cache.end())
        .await
        .expect("drain should finish on a clamped interval")
        .unwrap();
    assert_eq!(closed.state(), LifecycleState::Closed);
}

#[tokio::test]
async fn test_deferred_start_with_tokio_loop() {
    let event_loop = TokioLoop::current();
    let cache = Cache::new(
        event_loop.clone(),
        CacheConfig::default()
            .with_tick_interval(TICK)
            .with_start(StartMode::WhenLoopRunning),
    );

    let starting = cache.start();
    assert!(!cache.is_started());
    assert_eq!(event_loop.active_timers(), 0);

    event_loop.mark_running();
    let started = starting.await.unwrap();
    assert!(started.is_started());
    assert_eq!(event_loop.active_timers(), 1);
}

#[tokio::test]
async fn test_dropping_cache_aborts_timer() {
    let event_loop = TokioLoop::current();
    let cache = Cache::new(
        event_loop.clone(),
        CacheConfig::default().with_tick_interval(TICK),
    );
    cache.start().await.unwrap();
    assert_eq!(event_loop.active_timers(), 1);

    drop(cache);
    assert_eq!(event_loop.active_timers(), 0);
}
