use super::*;

const KEYS: [&str; 7] = [
    "HOST",
    "PORT",
    "OPEN_BROWSER",
    "RESEARCH_SEARCH_COUNT",
    "RESEARCH_SEARCH_CONCURRENCY",
    "RESEARCH_MAX_TOKENS",
    "RESEARCH_REPORT_MAX_TOKENS",
];

/// # Safety
/// Callers hold the `test_env` lock.
unsafe fn clear_app_env() {
    for key in KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

#[test]
fn defaults_bind_localhost() {
    let _guard = test_env::lock();
    unsafe { clear_app_env() };

    let cfg = AppConfig::from_env().unwrap();
    assert_eq!(cfg.host, DEFAULT_HOST);
    assert_eq!(cfg.port, DEFAULT_PORT);
    assert!(cfg.open_browser);
    assert_eq!(cfg.research, ResearchConfig::default());
    assert_eq!(cfg.addr().to_string(), "127.0.0.1:7860");
}

#[test]
fn overrides_are_parsed() {
    let _guard = test_env::lock();
    unsafe {
        clear_app_env();
        std::env::set_var("HOST", "0.0.0.0");
        std::env::set_var("PORT", "8080");
        std::env::set_var("OPEN_BROWSER", "false");
        std::env::set_var("RESEARCH_SEARCH_COUNT", "3");
        std::env::set_var("RESEARCH_SEARCH_CONCURRENCY", "2");
        std::env::set_var("RESEARCH_MAX_TOKENS", "1000");
        std::env::set_var("RESEARCH_REPORT_MAX_TOKENS", "2000");
    }

    let cfg = AppConfig::from_env().unwrap();
    assert_eq!(cfg.port, 8080);
    assert!(!cfg.open_browser);
    assert_eq!(
        cfg.research,
        ResearchConfig { search_count: 3, search_concurrency: 2, max_tokens: 1000, report_max_tokens: 2000 }
    );
    assert_eq!(cfg.browser_url(), "http://127.0.0.1:8080/");

    unsafe { clear_app_env() };
}

#[test]
fn zero_search_count_is_clamped() {
    let _guard = test_env::lock();
    unsafe {
        clear_app_env();
        std::env::set_var("RESEARCH_SEARCH_COUNT", "0");
        std::env::set_var("RESEARCH_SEARCH_CONCURRENCY", "0");
    }

    let cfg = AppConfig::from_env().unwrap();
    assert_eq!(cfg.research.search_count, 1);
    assert_eq!(cfg.research.search_concurrency, 1);

    unsafe { clear_app_env() };
}

#[test]
fn malformed_port_is_rejected() {
    let _guard = test_env::lock();
    unsafe {
        clear_app_env();
        std::env::set_var("PORT", "http");
    }

    let err = AppConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));

    unsafe { clear_app_env() };
}

#[test]
fn malformed_open_browser_is_rejected() {
    let _guard = test_env::lock();
    unsafe {
        clear_app_env();
        std::env::set_var("OPEN_BROWSER", "maybe");
    }

    assert!(AppConfig::from_env().is_err());

    unsafe { clear_app_env() };
}
