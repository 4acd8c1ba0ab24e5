use roi_estimator::rate_limit::InMemoryTimestampStore;
use roi_estimator::{GateError, ManualClock, RateLimitConfig, RateLimitLayer, SlidingWindow};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::{service_fn, Service, ServiceBuilder, ServiceExt};
use tower_layer::Layer;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("submission rejected: {0}")]
struct SubmitError(String);

#[derive(Debug, Clone)]
struct Submission {
    visitor: String,
    email: String,
}

fn submission(visitor: &str) -> Submission {
    Submission { visitor: visitor.into(), email: format!("{visitor}@example.com") }
}

fn visitor_key(req: &Submission) -> String {
    req.visitor.clone()
}

#[tokio::test]
async fn denies_after_budget_without_calling_inner() {
    let clock = ManualClock::new();
    let limiter = SlidingWindow::new(InMemoryTimestampStore::new()).with_clock(clock.clone());
    let cfg = RateLimitConfig::new(60_000, 2).expect("valid config");
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();

    let mut svc = ServiceBuilder::new()
        .layer(RateLimitLayer::new(limiter, cfg, visitor_key))
        .service(service_fn(move |req: Submission| {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, SubmitError>(req.email)
            }
        }));

    for _ in 0..2 {
        let email = svc.ready().await.unwrap().call(submission("ada")).await.unwrap();
        assert_eq!(email, "ada@example.com");
    }

    clock.advance(1_000);
    let err = svc.ready().await.unwrap().call(submission("ada")).await.unwrap_err();
    assert!(err.is_rate_limited());
    let denied = err.rate_limited().expect("denial details");
    assert_eq!(denied.key, "ada");
    assert_eq!(denied.wait, Duration::from_millis(59_000));
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // Another visitor has its own budget.
    let email = svc.ready().await.unwrap().call(submission("grace")).await.unwrap();
    assert_eq!(email, "grace@example.com");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn inner_errors_are_wrapped() {
    let cfg = RateLimitConfig::new(1_000, 10).expect("valid config");
    let limiter = SlidingWindow::new(InMemoryTimestampStore::new());
    let svc = RateLimitLayer::new(limiter, cfg, visitor_key).layer(service_fn(
        |req: Submission| async move { Err::<String, _>(SubmitError(req.visitor)) },
    ));

    let err = svc.oneshot(submission("linus")).await.unwrap_err();
    match err {
        GateError::Inner(inner) => assert_eq!(inner, SubmitError("linus".into())),
        other => panic!("expected inner error, got {:?}", other),
    }
}

#[tokio::test]
async fn shared_limiter_counts_across_layers() {
    let clock = ManualClock::new();
    let limiter = Arc::new(SlidingWindow::new(InMemoryTimestampStore::new()).with_clock(clock));
    let cfg = RateLimitConfig::new(60_000, 1).expect("valid config");
    let echo = service_fn(|req: Submission| async move { Ok::<_, SubmitError>(req.visitor) });

    let first = RateLimitLayer::shared(limiter.clone(), cfg, visitor_key).layer(echo.clone());
    let second = RateLimitLayer::shared(limiter, cfg, visitor_key).layer(echo);

    assert!(first.oneshot(submission("ada")).await.is_ok());
    let err = second.oneshot(submission("ada")).await.unwrap_err();
    assert!(err.is_rate_limited());
}
