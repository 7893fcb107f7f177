use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: HTTP requests served. Labels: route, method, status.
pub const HTTP_REQUESTS_TOTAL: &str = "lectern_http_requests_total";

/// Histogram: HTTP request latency in seconds. Labels: route, method.
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "lectern_http_request_duration_seconds";

// ── Domain counters ─────────────────────────────────────────────

/// Counter: lectures accepted.
pub const LECTURES_SCHEDULED_TOTAL: &str = "lectern_lectures_scheduled_total";

/// Counter: lecture requests rejected because the venue was already booked.
pub const BOOKING_CONFLICTS_TOTAL: &str = "lectern_booking_conflicts_total";

/// Counter: venues created.
pub const VENUES_CREATED_TOTAL: &str = "lectern_venues_created_total";

/// Counter: refused lecturer authorizations. Labels: reason.
pub const AUTH_FAILURES_TOTAL: &str = "lectern_auth_failures_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: venues currently in the store.
pub const VENUES_ACTIVE: &str = "lectern_venues_active";

/// Histogram: WAL group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "lectern_wal_flush_duration_seconds";

/// Histogram: WAL group-commit batch size (events per flush).
pub const WAL_FLUSH_BATCH_SIZE: &str = "lectern_wal_flush_batch_size";

/// Counter: WAL compactions. Labels: status.
pub const WAL_COMPACTIONS_TOTAL: &str = "lectern_wal_compactions_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Status label bucket for a response code.
pub fn status_label(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_without_port_is_noop() {
        assert!(init(None).is_ok());
    }

    #[test]
    fn status_buckets() {
        assert_eq!(status_label(200), "2xx");
        assert_eq!(status_label(201), "2xx");
        assert_eq!(status_label(409), "4xx");
        assert_eq!(status_label(500), "5xx");
    }
}
