//! Prometheus metrics for the announcement scheduler
//!
//! This module provides metrics tracking for:
//! - Cycles: fired cycles, cycle duration, catalog size
//! - Selection: misses by method, tracked rotation cursors
//! - Delivery: deliveries by display mode, rich-text fallbacks
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram, Counter,
    CounterVec, Encoder, Gauge, Histogram, TextEncoder,
};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for all scheduler metrics
struct SchedulerMetrics {
    cycles_fired: Counter,
    cycle_duration: Histogram,
    catalog_size: Gauge,
    tracked_destinations: Gauge,
    selection_misses: CounterVec,
    deliveries: CounterVec,
    dispatch_failures: CounterVec,
    rich_text_fallbacks: Counter,
}

/// Global storage for scheduler metrics
static SCHEDULER_METRICS: OnceLock<SchedulerMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// This function should be called once at application startup.
/// If metric registration fails, subsequent metric operations become no-ops.
///
/// # Example
///
/// ```ignore
/// if let Err(e) = announcer::metrics::init_metrics() {
///     eprintln!("Warning: Metrics initialization failed: {}", e);
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    // Prevent double initialization
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let metrics = SchedulerMetrics {
        cycles_fired: register_counter!(
            "announcer_cycles_fired_total",
            "Total announcement cycles fired"
        )?,
        cycle_duration: register_histogram!(
            "announcer_cycle_duration_seconds",
            "Time spent selecting, formatting and dispatching one cycle",
            vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]
        )?,
        catalog_size: register_gauge!(
            "announcer_catalog_size",
            "Announcements in the current configuration snapshot"
        )?,
        tracked_destinations: register_gauge!(
            "announcer_tracked_destinations",
            "Destinations with a rotation cursor after pruning"
        )?,
        selection_misses: register_counter_vec!(
            "announcer_selection_misses_total",
            "Selections that found no announcement for a destination",
            &["method"]
        )?,
        deliveries: register_counter_vec!(
            "announcer_deliveries_total",
            "Announcements handed to the transport",
            &["mode"]
        )?,
        dispatch_failures: register_counter_vec!(
            "announcer_dispatch_failures_total",
            "Transport sends that returned an error",
            &["mode"]
        )?,
        rich_text_fallbacks: register_counter!(
            "announcer_rich_text_fallbacks_total",
            "Rich text bodies sent as plain text after a parse failure"
        )?,
    };

    SCHEDULER_METRICS
        .set(metrics)
        .map_err(|_| "Scheduler metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    SCHEDULER_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn gather_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record a fired cycle
pub fn record_cycle_fired(catalog_size: usize) {
    if let Some(m) = SCHEDULER_METRICS.get() {
        m.cycles_fired.inc();
        m.catalog_size.set(catalog_size as f64);
    }
}

/// Record a destination for which nothing was selected
pub fn record_selection_miss(method: &str) {
    if let Some(m) = SCHEDULER_METRICS.get() {
        m.selection_misses.with_label_values(&[method]).inc();
    }
}

/// Record dispatch results for one cycle
pub fn record_dispatch(mode: &str, delivered: usize, failed: usize) {
    let Some(m) = SCHEDULER_METRICS.get() else {
        return;
    };

    if delivered > 0 {
        m.deliveries
            .with_label_values(&[mode])
            .inc_by(delivered as f64);
    }
    if failed > 0 {
        m.dispatch_failures
            .with_label_values(&[mode])
            .inc_by(failed as f64);
    }
}

/// Record rich text bodies that fell back to plain text
pub fn record_rich_text_fallbacks(count: usize) {
    if count == 0 {
        return;
    }
    if let Some(m) = SCHEDULER_METRICS.get() {
        m.rich_text_fallbacks.inc_by(count as f64);
    }
}

/// Update the number of tracked rotation cursors
pub fn set_tracked_destinations(count: usize) {
    if let Some(m) = SCHEDULER_METRICS.get() {
        m.tracked_destinations.set(count as f64);
    }
}

/// Histogram timer guard that records duration on drop
pub struct MetricsTimer {
    timer: Option<prometheus::HistogramTimer>,
}

impl MetricsTimer {
    fn new(timer: prometheus::HistogramTimer) -> Self {
        Self { timer: Some(timer) }
    }

    /// Create a no-op timer when metrics are not initialized
    fn noop() -> Self {
        Self { timer: None }
    }
}

impl Drop for MetricsTimer {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop_and_record();
        }
    }
}

/// Start a cycle timer (returns a timer handle)
pub fn start_cycle_timer() -> MetricsTimer {
    match SCHEDULER_METRICS.get() {
        Some(m) => MetricsTimer::new(m.cycle_duration.start_timer()),
        None => MetricsTimer::noop(),
    }
}

// ============================================================================
// Tests
// ============================================================================
