//! End-to-end behaviour of the ambassador against in-memory operations.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use ambassador::load_balancer::Strategy;
use ambassador::{Ambassador, AmbassadorError, CircuitState, ManualClock, OperationError};

mod common;
use common::CallLog;

#[tokio::test(start_paused = true)]
async fn test_single_endpoint_success() {
    let ambassador = Ambassador::new(&common::config(&[("a", "10.0.0.1:1")])).unwrap();
    let log = CallLog::new();

    let value = ambassador
        .execute("get", |addr| {
            log.record(&addr);
            async { Ok::<_, OperationError>(42) }
        })
        .await
        .unwrap();

    assert_eq!(value, 42);
    assert_eq!(log.count(), 1);
    let snap = ambassador.metrics();
    assert_eq!(snap.successes, 1);
    assert_eq!(snap.total_requests, 1);
    assert_eq!(snap.success_rate, 1.0);
}

#[tokio::test]
async fn test_breaker_opens_and_rejects() {
    let mut config = common::config(&[("a", "10.0.0.1:1")]);
    config.circuit_breaker.failure_threshold = 3;
    config.circuit_breaker.open_timeout_secs = 30;
    config.retry.max_retries = 0;

    let clock = ManualClock::new();
    let ambassador = Ambassador::with_clock(&config, Arc::new(clock.clone())).unwrap();
    let invoked = AtomicU32::new(0);
    let failing = |_addr: String| {
        invoked.fetch_add(1, Ordering::SeqCst);
        async { Err::<(), _>(OperationError::transient("connection refused")) }
    };

    for call in 1..=5 {
        let err = ambassador.execute("call", failing).await.unwrap_err();
        assert_eq!(err.attempts(), Some(1));
        if call > 3 {
            assert!(matches!(err.root_cause(), AmbassadorError::NoHealthyEndpoints));
        } else {
            assert!(matches!(err.root_cause(), AmbassadorError::Operation(_)));
        }
    }

    assert_eq!(invoked.load(Ordering::SeqCst), 3);
    let status = &ambassador.endpoint_status()[0];
    assert_eq!(status.circuit_state, CircuitState::Open);
    assert!(!status.healthy);
    assert_eq!(ambassador.metrics().circuit_rejections, 2);

    // Still rejected just before the timeout.
    clock.advance(Duration::from_secs(29));
    let _ = ambassador.execute("call", failing).await;
    assert_eq!(invoked.load(Ordering::SeqCst), 3);

    // Half-open trial fails and reopens.
    clock.advance(Duration::from_secs(1));
    let _ = ambassador.execute("call", failing).await;
    assert_eq!(invoked.load(Ordering::SeqCst), 4);
    assert_eq!(ambassador.endpoint_status()[0].circuit_state, CircuitState::Open);
}

#[tokio::test]
async fn test_half_open_successes_close_breaker() {
    let mut config = common::config(&[("a", "10.0.0.1:1")]);
    config.circuit_breaker.failure_threshold = 1;
    config.circuit_breaker.success_threshold = 2;
    config.retry.max_retries = 0;

    let clock = ManualClock::new();
    let ambassador = Ambassador::with_clock(&config, Arc::new(clock.clone())).unwrap();

    let _ = ambassador
        .execute("call", |_| async { Err::<(), _>(OperationError::transient("down")) })
        .await;
    assert_eq!(ambassador.endpoint_status()[0].circuit_state, CircuitState::Open);
    assert!(ambassador.endpoint_status()[0].retry_after_ms.is_some());

    clock.advance(Duration::from_secs(30));
    ambassador.execute("call", |_| async { Ok::<_, OperationError>(()) }).await.unwrap();
    let status = &ambassador.endpoint_status()[0];
    assert_eq!(status.circuit_state, CircuitState::HalfOpen);
    assert_eq!(status.half_open_successes, 1);

    ambassador.execute("call", |_| async { Ok::<_, OperationError>(()) }).await.unwrap();
    let status = &ambassador.endpoint_status()[0];
    assert_eq!(status.circuit_state, CircuitState::Closed);
    assert!(status.healthy);
    assert_eq!(status.consecutive_failures, 0);
    assert_eq!(status.half_open_successes, 0);
}

#[tokio::test(start_paused = true)]
async fn test_round_robin_spreads_calls() {
    let ambassador = Ambassador::new(&common::config(&[("a", "a:1"), ("b", "b:1"), ("c", "c:1")])).unwrap();
    let log = CallLog::new();

    for _ in 0..10 {
        ambassador
            .execute("get", |addr| {
                log.record(&addr);
                async { Ok::<_, OperationError>(()) }
            })
            .await
            .unwrap();
    }

    let addresses = log.addresses();
    for addr in ["a:1", "b:1", "c:1"] {
        let hits = addresses.iter().filter(|a| *a == addr).count();
        assert!((3..=4).contains(&hits), "{} selected {} times", addr, hits);
    }
    assert!(addresses.windows(2).all(|w| w[0] != w[1]));
}

#[tokio::test(start_paused = true)]
async fn test_retries_exhausted_with_growing_delays() {
    let mut config = common::config(&[("a", "a:1")]);
    config.retry.max_retries = 3;
    config.retry.base_delay_ms = 100;
    config.retry.max_delay_ms = 1000;
    let ambassador = Ambassador::new(&config).unwrap();
    let log = CallLog::new();

    let err = ambassador
        .execute("get", |addr| {
            log.record(&addr);
            async { Err::<(), _>(OperationError::transient("unavailable")) }
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AmbassadorError::RetriesExhausted { attempts: 4, .. }));
    assert_eq!(log.count(), 4);

    let times = log.times();
    let gaps: Vec<Duration> = times.windows(2).map(|w| w[1] - w[0]).collect();
    for (gap, base_ms) in gaps.iter().zip([100u64, 200, 400]) {
        assert!(*gap >= Duration::from_millis(base_ms), "gap {:?}", gap);
        assert!(*gap <= Duration::from_millis(base_ms + base_ms / 10), "gap {:?}", gap);
    }
    assert!(gaps.windows(2).all(|w| w[0] < w[1]));

    let snap = ambassador.metrics();
    assert_eq!((snap.failures, snap.retries, snap.successes), (4, 3, 0));
}

#[tokio::test(start_paused = true)]
async fn test_pool_exhaustion_retried() {
    let mut config = common::config(&[("a", "a:1")]);
    config.pool.max_connections = 2;
    config.retry.max_retries = 3;
    config.retry.base_delay_ms = 60;
    config.retry.use_exponential_backoff = false;
    let ambassador = Ambassador::new(&config).unwrap();

    let slow = |_addr: String| async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok::<_, OperationError>(())
    };

    let (a, b, c) = tokio::join!(
        ambassador.execute("slow", slow),
        ambassador.execute("slow", slow),
        ambassador.execute("slow", slow),
    );
    assert!(a.is_ok() && b.is_ok() && c.is_ok());

    let snap = ambassador.metrics();
    assert_eq!(snap.successes, 3);
    // Third call is refused at 0ms and 60ms, admitted at 120ms.
    assert_eq!(snap.failures, 2);
    assert_eq!(snap.retries, 2);

    let pool = ambassador.pool_stats();
    assert_eq!((pool.total, pool.in_use), (2, 0));
    // Pool refusals are not held against the endpoint.
    assert_eq!(ambassador.endpoint_status()[0].consecutive_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn test_attempt_timeout_counts_as_failure() {
    let mut config = common::config(&[("a", "a:1")]);
    config.timeouts.attempt_ms = 100;
    config.retry.max_retries = 1;
    let ambassador = Ambassador::new(&config).unwrap();

    let err = ambassador
        .execute("hang", |_| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, OperationError>(())
        })
        .await
        .unwrap_err();

    assert_eq!(err.attempts(), Some(2));
    assert!(matches!(err.root_cause(), AmbassadorError::Timeout(d) if *d == Duration::from_millis(100)));
    assert_eq!(ambassador.endpoint_status()[0].consecutive_failures, 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_in_flight_attempt() {
    let ambassador = Ambassador::new(&common::config(&[("a", "a:1")])).unwrap();
    let token = CancellationToken::new();

    let (result, _) = tokio::join!(
        ambassador.execute_with_cancel(
            "hang",
            |_| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Ok::<_, OperationError>(())
            },
            &token,
        ),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        },
    );

    assert!(matches!(result, Err(AmbassadorError::Cancelled)));
    let status = &ambassador.endpoint_status()[0];
    assert_eq!(status.consecutive_failures, 0);
    assert_eq!(status.active_connections, 0);
    assert_eq!(ambassador.pool_stats().in_use, 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_backoff() {
    let mut config = common::config(&[("a", "a:1")]);
    config.retry.base_delay_ms = 1000;
    config.retry.max_delay_ms = 5000;
    let ambassador = Ambassador::new(&config).unwrap();
    let token = CancellationToken::new();
    let log = CallLog::new();

    let (result, _) = tokio::join!(
        ambassador.execute_with_cancel(
            "flaky",
            |addr| {
                log.record(&addr);
                async { Err::<(), _>(OperationError::transient("reset")) }
            },
            &token,
        ),
        async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            token.cancel();
        },
    );

    assert!(matches!(result, Err(AmbassadorError::Cancelled)));
    assert_eq!(log.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_while_waiting_for_pool() {
    let mut config = common::config(&[("a", "a:1")]);
    config.pool.max_connections = 1;
    config.pool.acquire_timeout_ms = 10_000;
    config.timeouts.attempt_ms = 60_000;
    let ambassador = Ambassador::new(&config).unwrap();
    let token = CancellationToken::new();

    let (held, (waited, elapsed), _) = tokio::join!(
        ambassador.execute("hold", |_| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, OperationError>(())
        }),
        async {
            let started = tokio::time::Instant::now();
            let result = ambassador
                .execute_with_cancel("wait", |_| async { Ok::<_, OperationError>(()) }, &token)
                .await;
            (result, started.elapsed())
        },
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            // The parked caller already counts against the endpoint.
            assert_eq!(ambassador.endpoint_status()[0].active_connections, 2);
            token.cancel();
        },
    );

    assert!(held.is_ok());
    assert!(matches!(waited, Err(AmbassadorError::Cancelled)));
    assert!(elapsed < Duration::from_secs(1), "cancel took {:?}", elapsed);
    assert_eq!(ambassador.metrics().failures, 0);
    assert_eq!(ambassador.endpoint_status()[0].active_connections, 0);
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_open_timeout_keeps_breaker_open() {
    let mut config = common::config(&[("a", "a:1")]);
    config.circuit_breaker.failure_threshold = 1;
    config.circuit_breaker.open_timeout_secs = u64::MAX;
    config.retry.max_retries = 0;
    let ambassador = Ambassador::new(&config).unwrap();

    let err = ambassador
        .execute("down", |_| async { Err::<(), _>(OperationError::transient("refused")) })
        .await
        .unwrap_err();
    assert_eq!(err.attempts(), Some(1));
    assert_eq!(ambassador.endpoint_status()[0].circuit_state, CircuitState::Open);

    let err = ambassador
        .execute("down", |_| async { Ok::<_, OperationError>(()) })
        .await
        .unwrap_err();
    assert!(matches!(err.root_cause(), AmbassadorError::NoHealthyEndpoints));
}

#[tokio::test(start_paused = true)]
async fn test_permanent_error_not_retried() {
    let mut config = common::config(&[("a", "a:1"), ("b", "b:1")]);
    config.retry.max_retries = 5;
    let ambassador = Ambassador::new(&config).unwrap();
    let log = CallLog::new();

    let err = ambassador
        .execute("put", |addr| {
            log.record(&addr);
            async { Err::<(), _>(OperationError::permanent("invalid request")) }
        })
        .await
        .unwrap_err();

    assert_eq!(err.attempts(), Some(1));
    assert_eq!(log.count(), 1);
    assert_eq!(ambassador.endpoint_status()[0].consecutive_failures, 1);
}

#[tokio::test(start_paused = true)]
async fn test_fallback_after_exhaustion() {
    let mut config = common::config(&[("a", "a:1")]);
    config.retry.max_retries = 1;
    let ambassador = Ambassador::new(&config).unwrap();

    let value = ambassador
        .execute_with_fallback(
            "quote",
            |_| async { Err::<String, _>(OperationError::transient("down")) },
            |err| format!("stale after {} attempts", err.attempts().unwrap_or(0)),
        )
        .await
        .unwrap();
    assert_eq!(value, "stale after 2 attempts");

    let live = ambassador
        .execute_with_fallback("quote", |_| async { Ok::<_, OperationError>("live".to_string()) }, |_| {
            "stale".to_string()
        })
        .await
        .unwrap();
    assert_eq!(live, "live");
}

#[tokio::test(start_paused = true)]
async fn test_least_connections_spreads_concurrent_calls() {
    let mut config = common::config(&[("a", "a:1"), ("b", "b:1")]);
    config.load_balancer.strategy = Strategy::LeastConnections;
    let ambassador = Ambassador::new(&config).unwrap();
    let log = CallLog::new();

    let call = |addr: String| {
        log.record(&addr);
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, OperationError>(())
        }
    };
    let (x, y) = tokio::join!(ambassador.execute("slow", call), ambassador.execute("slow", call));
    assert!(x.is_ok() && y.is_ok());

    let mut addresses = log.addresses();
    addresses.sort();
    assert_eq!(addresses, vec!["a:1", "b:1"]);
}

#[tokio::test(start_paused = true)]
async fn test_failures_steer_least_response_time() {
    let mut config = common::config(&[("slow", "slow:1"), ("fast", "fast:1")]);
    config.load_balancer.strategy = Strategy::LeastResponseTime;
    let ambassador = Ambassador::new(&config).unwrap();
    let log = CallLog::new();

    let op = |addr: String| {
        log.record(&addr);
        async move {
            let ms = if addr == "slow:1" { 200 } else { 20 };
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok::<_, OperationError>(())
        }
    };

    for _ in 0..5 {
        ambassador.execute("get", op).await.unwrap();
    }

    // Both untried endpoints are tried once, then the faster one wins.
    let addresses = log.addresses();
    assert_eq!(&addresses[..2], &["slow:1", "fast:1"]);
    assert!(addresses[2..].iter().all(|a| a == "fast:1"));
}
