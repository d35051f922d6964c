use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    tours_requested_total: AtomicU64,
    tours_succeeded_total: AtomicU64,
    upstream_failures_total: AtomicU64,
    parse_failures_total: AtomicU64,
    map_images_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub tours_requested_total: u64,
    pub tours_succeeded_total: u64,
    pub upstream_failures_total: u64,
    pub parse_failures_total: u64,
    pub map_images_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_tour_requested(&self) {
        self.tours_requested_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_tour_succeeded(&self) {
        self.tours_succeeded_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_upstream_failure(&self) {
        self.upstream_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_parse_failure(&self) {
        self.parse_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_map_images(&self, count: usize) {
        self.map_images_total
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.tours_requested_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            tours_requested_total: requests,
            tours_succeeded_total: self.tours_succeeded_total.load(Ordering::Relaxed),
            upstream_failures_total: self.upstream_failures_total.load(Ordering::Relaxed),
            parse_failures_total: self.parse_failures_total.load(Ordering::Relaxed),
            map_images_total: self.map_images_total.load(Ordering::Relaxed),
            avg_latency_millis: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
        }
    }
}

/// JSON logs unless `STROLL_LOG_FORMAT=pretty`. Safe to call more than once.
pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,stroll_api=info,stroll_agents=info",
                service_name
            ))
        });

        let pretty = env::var("STROLL_LOG_FORMAT")
            .map(|value| value.eq_ignore_ascii_case("pretty"))
            .unwrap_or(false);

        if pretty {
            tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        } else {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(std::io::stderr)
                .init();
        }
    });
}
