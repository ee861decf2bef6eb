//! Metrics module
//!
//! Prometheus counters and histograms for uploads and test generation.

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram, Counter,
    CounterVec, Encoder, Gauge, Histogram, TextEncoder,
};

lazy_static! {
    // Upload metrics
    pub static ref UPLOADS_TOTAL: CounterVec = register_counter_vec!(
        "imgbb_uploads_total",
        "Total number of uploads",
        &["status"]
    ).unwrap();

    pub static ref UPLOAD_BYTES_TOTAL: Counter = register_counter!(
        "imgbb_upload_bytes_total",
        "Total image bytes reported by the remote after upload"
    ).unwrap();

    pub static ref UPLOAD_DURATION: Histogram = register_histogram!(
        "imgbb_upload_duration_seconds",
        "Upload round-trip duration in seconds",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ).unwrap();

    // Codegen metrics
    pub static ref CODEGEN_FILES_TOTAL: CounterVec = register_counter_vec!(
        "imgbb_codegen_files_total",
        "Test files processed by the generator",
        &["status"]
    ).unwrap();

    pub static ref CODEGEN_LONGEST_LOC: Gauge = register_gauge!(
        "imgbb_codegen_longest_loc",
        "Line count of the longest generated file in the last run"
    ).unwrap();

    // Error metrics
    pub static ref ERRORS_TOTAL: CounterVec = register_counter_vec!(
        "imgbb_errors_total",
        "Total errors",
        &["type"]
    ).unwrap();
}

/// Record a successful upload
pub fn record_upload_success(bytes: u64) {
    UPLOADS_TOTAL.with_label_values(&["success"]).inc();
    UPLOAD_BYTES_TOTAL.inc_by(bytes as f64);
}

/// Record a failed upload, labelled by error kind
pub fn record_upload_failure(kind: &str) {
    UPLOADS_TOTAL.with_label_values(&["failure"]).inc();
    record_error(kind);
}

/// Record upload duration
pub fn record_upload_duration(duration_secs: f64) {
    UPLOAD_DURATION.observe(duration_secs);
}

/// Record a generated test file
pub fn record_codegen_file(success: bool) {
    let status = if success { "success" } else { "failure" };
    CODEGEN_FILES_TOTAL.with_label_values(&[status]).inc();
}

/// Record the longest generated file of a run
pub fn record_codegen_longest_loc(lines: usize) {
    CODEGEN_LONGEST_LOC.set(lines as f64);
}

/// Record an error
pub fn record_error(error_type: &str) {
    ERRORS_TOTAL.with_label_values(&[error_type]).inc();
}

/// Render every registered metric in the Prometheus text format
pub fn gather_text() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
