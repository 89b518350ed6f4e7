use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, Gauge, GaugeVec, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all lmn metrics
const PREFIX: &str = "lmn";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Authentication Metrics
    pub static ref AUTH_LOGIN_ATTEMPTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_auth_login_attempts_total"), "Total login attempts"),
        &["status"]
    ).expect("Failed to create auth_login_attempts_total metric");

    pub static ref AUTH_LOGIN_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            format!("{PREFIX}_auth_login_duration_seconds"),
            "Login request duration in seconds"
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0])
    ).expect("Failed to create auth_login_duration_seconds metric");

    // Note Metrics
    pub static ref NOTE_MUTATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_note_mutations_total"), "Note create/edit/delete attempts"),
        &["operation", "outcome"]
    ).expect("Failed to create note_mutations_total metric");

    pub static ref PHOTO_CLEANUPS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_photo_cleanups_total"), "Stale photo cleanups by outcome"),
        &["outcome"]
    ).expect("Failed to create photo_cleanups_total metric");

    // Concert Metrics
    pub static ref CONCERT_ITEMS_TOTAL: GaugeVec = GaugeVec::new(
        Opts::new(format!("{PREFIX}_concert_items_total"), "Total rows in the concerts db"),
        &["type"]
    ).expect("Failed to create concert_items_total metric");

    // Error Metrics
    pub static ref ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_errors_total"), "Total errors by type and endpoint"),
        &["error_type", "endpoint"]
    ).expect("Failed to create errors_total metric");

    pub static ref PROCESS_MEMORY_BYTES: Gauge = Gauge::new(
        format!("{PREFIX}_process_memory_bytes"),
        "Process memory usage in bytes"
    ).expect("Failed to create process_memory_bytes metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Ignore errors if already registered (tests call this repeatedly)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(AUTH_LOGIN_ATTEMPTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(AUTH_LOGIN_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(NOTE_MUTATIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(PHOTO_CLEANUPS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CONCERT_ITEMS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(ERRORS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(PROCESS_MEMORY_BYTES.clone()));

    tracing::info!("Metrics system initialized successfully");
}

pub fn init_concert_metrics(artists: usize, venues: usize, shows: usize, notes: usize) {
    for (kind, count) in [
        ("artist", artists),
        ("venue", venues),
        ("show", shows),
        ("note", notes),
    ] {
        CONCERT_ITEMS_TOTAL
            .with_label_values(&[kind])
            .set(count as f64);
    }

    tracing::info!(
        "Concert metrics initialized: {} artists, {} venues, {} shows, {} notes",
        artists,
        venues,
        shows,
        notes
    );
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record a login attempt
pub fn record_login_attempt(status: &str, duration: Duration) {
    AUTH_LOGIN_ATTEMPTS_TOTAL
        .with_label_values(&[status])
        .inc();

    AUTH_LOGIN_DURATION_SECONDS.observe(duration.as_secs_f64());
}

pub fn record_note_mutation(operation: &str, outcome: &str) {
    NOTE_MUTATIONS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
}

pub fn record_photo_cleanup(outcome: &str) {
    PHOTO_CLEANUPS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Record an error
pub fn record_error(error_type: &str, endpoint: &str) {
    ERRORS_TOTAL
        .with_label_values(&[error_type, endpoint])
        .inc();
}

/// Update process memory usage
pub fn update_memory_usage() {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            for line in status.lines() {
                if line.starts_with("VmRSS:") {
                    // VmRSS is reported in kB
                    if let Some(kb_str) = line.split_whitespace().nth(1) {
                        if let Ok(kb) = kb_str.parse::<f64>() {
                            PROCESS_MEMORY_BYTES.set(kb * 1024.0);
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    update_memory_usage();

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find_family(name: &str) -> Option<prometheus::proto::MetricFamily> {
        REGISTRY
            .gather()
            .into_iter()
            .find(|m| m.get_name() == format!("{PREFIX}_{name}"))
    }

    #[test]
    fn test_metrics_initialization() {
        init_metrics();
        init_metrics();

        assert!(!REGISTRY.gather().is_empty(), "Metrics should be registered");
    }

    #[test]
    fn test_record_http_request() {
        init_metrics();

        record_http_request("GET", "/v1/notes", 200, Duration::from_millis(50));

        assert!(find_family("http_requests_total").is_some());
        assert!(find_family("http_request_duration_seconds").is_some());
    }

    #[test]
    fn test_record_note_mutation_and_cleanup() {
        init_metrics();

        record_note_mutation("edit", "forbidden");
        record_photo_cleanup("deleted");

        let before = PHOTO_CLEANUPS_TOTAL.with_label_values(&["deleted"]).get();
        record_photo_cleanup("deleted");
        let after = PHOTO_CLEANUPS_TOTAL.with_label_values(&["deleted"]).get();
        assert!(after >= before + 1.0);

        assert!(find_family("note_mutations_total").is_some());
        assert!(find_family("photo_cleanups_total").is_some());
    }

    #[test]
    fn test_concert_metrics() {
        init_metrics();

        init_concert_metrics(3, 2, 5, 8);

        assert_eq!(CONCERT_ITEMS_TOTAL.with_label_values(&["show"]).get(), 5.0);
        assert!(find_family("concert_items_total").is_some());
    }
}
