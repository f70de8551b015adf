//! Prometheus metrics for the token service.
//!
//! Provides counters and histograms for observability.

use std::time::Duration;

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder};

use crate::error::AuthError;
use crate::jwt::{Token, TokenKind, Validated};

/// Tokens issued counter.
pub static TOKENS_ISSUED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "token_service_tokens_issued_total",
        "Total number of tokens issued",
        &["kind"]
    )
    .expect("Failed to register tokens_issued metric")
});

/// Token verifications counter.
pub static TOKEN_VERIFICATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "token_service_token_verifications_total",
        "Total number of token verifications",
        &["kind", "outcome"]
    )
    .expect("Failed to register token_verifications metric")
});

/// Tokens refreshed counter.
pub static TOKENS_REFRESHED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "token_service_tokens_refreshed_total",
        "Total number of token pairs rotated from a refresh token",
        &["status"]
    )
    .expect("Failed to register tokens_refreshed metric")
});

/// Authorization decisions counter.
pub static AUTHORIZATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "token_service_authorizations_total",
        "Total number of authorization decisions",
        &["outcome"]
    )
    .expect("Failed to register authorizations metric")
});

/// Account operations counter.
pub static ACCOUNT_OPERATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "token_service_account_operations_total",
        "Total number of registration and authentication attempts",
        &["operation", "status"]
    )
    .expect("Failed to register account_operations metric")
});

/// Token verification latency histogram.
pub static TOKEN_VERIFY_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "token_service_token_verify_latency_seconds",
        "Token verification latency in seconds",
        &["kind"],
        vec![0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1]
    )
    .expect("Failed to register token_verify_latency metric")
});

/// Record an issued token.
pub fn record_token_issued(kind: TokenKind) {
    TOKENS_ISSUED.with_label_values(&[kind.as_str()]).inc();
}

/// Record the outcome and latency of a verification.
pub fn observe_verification(kind: TokenKind, elapsed: Duration, result: &Result<Token<Validated>, AuthError>) {
    let outcome = match result {
        Ok(_) => "valid",
        Err(AuthError::Expired { .. }) => "expired",
        Err(AuthError::MalformedToken { .. }) => "malformed",
        Err(_) => "error",
    };
    TOKEN_VERIFICATIONS.with_label_values(&[kind.as_str(), outcome]).inc();
    TOKEN_VERIFY_LATENCY
        .with_label_values(&[kind.as_str()])
        .observe(elapsed.as_secs_f64());
}

/// Record a refresh rotation attempt.
pub fn record_refresh(success: bool) {
    let status = if success { "success" } else { "failure" };
    TOKENS_REFRESHED.with_label_values(&[status]).inc();
}

/// Record an authorization decision.
pub fn record_authorization(outcome: &str) {
    AUTHORIZATIONS.with_label_values(&[outcome]).inc();
}

/// Record an account operation.
pub fn record_account_operation(operation: &str, status: &str) {
    ACCOUNT_OPERATIONS.with_label_values(&[operation, status]).inc();
}

/// Render every registered metric in the Prometheus text format.
pub fn render() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registered() {
        record_token_issued(TokenKind::Access);
        record_refresh(true);
        record_authorization("granted");
        record_account_operation("register", "success");

        assert!(TOKENS_ISSUED.with_label_values(&["access"]).get() >= 1.0);
        assert!(TOKENS_REFRESHED.with_label_values(&["success"]).get() >= 1.0);
    }

    #[test]
    fn test_render_contains_metrics() {
        record_token_issued(TokenKind::Refresh);

        let text = render();
        assert!(text.contains("token_service_tokens_issued_total"));
    }
}
