//! Prometheus metrics for the HTTP surface and refresh passes

use prometheus::{Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub http_requests_total: IntCounter,
    pub http_request_duration_seconds: Histogram,
    pub http_requests_in_flight: IntGauge,
    pub refresh_passes_total: IntCounter,
    pub refresh_passes_skipped_total: IntCounter,
    pub refresh_symbol_failures_total: IntCounter,
    pub refresh_pass_duration_seconds: Histogram,
    pub alerts_sent_total: IntCounter,
    pub notification_failures_total: IntCounter,
    pub database_connected: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total =
            IntCounter::new("http_requests_total", "Total number of HTTP requests")?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ))?;
        let http_requests_in_flight =
            IntGauge::new("http_requests_in_flight", "HTTP requests currently being served")?;
        let refresh_passes_total =
            IntCounter::new("refresh_passes_total", "Completed refresh passes")?;
        let refresh_passes_skipped_total = IntCounter::new(
            "refresh_passes_skipped_total",
            "Scheduled passes skipped because the market was closed or a pass was running",
        )?;
        let refresh_symbol_failures_total = IntCounter::new(
            "refresh_symbol_failures_total",
            "Symbols whose refresh failed",
        )?;
        let refresh_pass_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("refresh_pass_duration_seconds", "Refresh pass duration in seconds")
                .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        )?;
        let alerts_sent_total =
            IntCounter::new("alerts_sent_total", "Alert messages delivered")?;
        let notification_failures_total = IntCounter::new(
            "notification_failures_total",
            "Notification deliveries that failed",
        )?;
        let database_connected =
            Gauge::new("database_connected", "1 when a persistent database is connected")?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(refresh_passes_total.clone()))?;
        registry.register(Box::new(refresh_passes_skipped_total.clone()))?;
        registry.register(Box::new(refresh_symbol_failures_total.clone()))?;
        registry.register(Box::new(refresh_pass_duration_seconds.clone()))?;
        registry.register(Box::new(alerts_sent_total.clone()))?;
        registry.register(Box::new(notification_failures_total.clone()))?;
        registry.register(Box::new(database_connected.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            refresh_passes_total,
            refresh_passes_skipped_total,
            refresh_symbol_failures_total,
            refresh_pass_duration_seconds,
            alerts_sent_total,
            notification_failures_total,
            database_connected,
        })
    }

    /// Render all metrics in the Prometheus text format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
