//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // OAuth metrics
    pub static ref OAUTH_LOGINS_TOTAL: IntCounter = IntCounter::new(
        "gatehouse_oauth_logins_total",
        "Total number of login redirects issued"
    ).expect("metric can be created");
    pub static ref OAUTH_CALLBACKS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("gatehouse_oauth_callbacks_total", "Total number of OAuth callbacks handled"),
        &["outcome"]
    ).expect("metric can be created");

    // Session metrics
    pub static ref SESSIONS_MINTED_TOTAL: IntCounter = IntCounter::new(
        "gatehouse_sessions_minted_total",
        "Total number of sessions created"
    ).expect("metric can be created");
    pub static ref SESSIONS_REVOKED_TOTAL: IntCounter = IntCounter::new(
        "gatehouse_sessions_revoked_total",
        "Total number of sessions revoked"
    ).expect("metric can be created");

    // Error metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("gatehouse_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(OAUTH_LOGINS_TOTAL.clone()))
        .expect("OAUTH_LOGINS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(OAUTH_CALLBACKS_TOTAL.clone()))
        .expect("OAUTH_CALLBACKS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(SESSIONS_MINTED_TOTAL.clone()))
        .expect("SESSIONS_MINTED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(SESSIONS_REVOKED_TOTAL.clone()))
        .expect("SESSIONS_REVOKED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}
