use super::*;

fn limiter(per_client: usize, global: usize) -> RateLimiter {
    RateLimiter::new(RateLimitConfig {
        per_client_limit: per_client,
        per_client_window: Duration::from_secs(60),
        global_limit: global,
        global_window: Duration::from_secs(60),
    })
}

#[test]
fn per_client_allows_up_to_limit() {
    let rl = limiter(3, 100);
    let now = Instant::now();

    for i in 0..3 {
        assert!(rl.check_and_record_at("ws:a", now).is_ok(), "run {i} should succeed");
    }
    assert!(matches!(
        rl.check_and_record_at("ws:a", now),
        Err(RateLimitError::PerClientExceeded { limit: 3, window_secs: 60 })
    ));
    // Another client is unaffected.
    assert!(rl.check_and_record_at("ws:b", now).is_ok());
}

#[test]
fn global_allows_up_to_limit() {
    let rl = limiter(100, 4);
    let now = Instant::now();

    for i in 0..4 {
        assert!(rl.check_and_record_at(&format!("client-{i}"), now).is_ok());
    }
    assert!(matches!(
        rl.check_and_record_at("client-new", now),
        Err(RateLimitError::GlobalExceeded { limit: 4, .. })
    ));
}

#[test]
fn window_expiry_frees_capacity() {
    let rl = limiter(1, 100);
    let start = Instant::now();

    assert!(rl.check_and_record_at("ip:127.0.0.1", start).is_ok());
    assert!(rl.check_and_record_at("ip:127.0.0.1", start).is_err());

    let later = start + Duration::from_secs(61);
    assert!(rl.check_and_record_at("ip:127.0.0.1", later).is_ok());
}

#[test]
fn rejected_run_is_not_recorded_globally() {
    let rl = limiter(1, 2);
    let now = Instant::now();

    assert!(rl.check_and_record_at("a", now).is_ok());
    assert!(rl.check_and_record_at("a", now).is_err());
    // Global still has room for exactly one more.
    assert!(rl.check_and_record_at("b", now).is_ok());
    assert!(rl.check_and_record_at("c", now).is_err());
}

#[test]
fn idle_clients_are_pruned() {
    let rl = limiter(5, 100);
    let start = Instant::now();

    rl.check_and_record_at("old", start).unwrap();
    assert_eq!(rl.tracked_clients(), 1);

    rl.check_and_record_at("new", start + Duration::from_secs(120))
        .unwrap();
    assert_eq!(rl.tracked_clients(), 1);
}

#[test]
fn zero_limit_rejects_everything() {
    let rl = limiter(0, 10);
    assert!(rl.check_and_record("anyone").is_err());
}
