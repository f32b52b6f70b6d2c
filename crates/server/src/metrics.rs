use axum::http::StatusCode;
use once_cell::sync::Lazy;
use prometheus::{register_int_counter, Encoder, IntCounter, TextEncoder};

// Prometheus metrics (default registry)
pub static LOGINS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("shelfup_logins_total", "Successful logins")
        .expect("register logins_total")
});

pub static ORDERS_PLACED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("shelfup_orders_placed_total", "Orders placed through QR storefronts")
        .expect("register orders_placed_total")
});

pub static QR_CODES_ISSUED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("shelfup_qr_codes_issued_total", "QR codes generated for locations")
        .expect("register qr_codes_issued_total")
});

pub static CONTRACTS_CANCELLED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("shelfup_contracts_cancelled_total", "Contracts whose cancellation was completed")
        .expect("register contracts_cancelled_total")
});

/// Touch every counter so they show up in the exposition before first use.
pub fn init() {
    Lazy::force(&LOGINS_TOTAL);
    Lazy::force(&ORDERS_PLACED_TOTAL);
    Lazy::force(&QR_CODES_ISSUED_TOTAL);
    Lazy::force(&CONTRACTS_CANCELLED_TOTAL);
}

pub fn encode_metrics() -> (StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, format!("encode error: {e}"));
    }
    match String::from_utf8(buffer) {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("utf8 error: {e}")),
    }
}
