// Metrics collection and tracking

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Streaming counters shared across handlers.
#[derive(Debug, Default)]
pub struct StreamMetrics {
    pub request_count: AtomicU64,
    pub sessions_started: AtomicU64,
    pub containers_delivered: AtomicU64,
    pub audio_bytes_delivered: AtomicU64,
}

impl StreamMetrics {
    pub fn record_request(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_container(&self, bytes: usize) {
        self.containers_delivered.fetch_add(1, Ordering::Relaxed);
        self.audio_bytes_delivered
            .fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StreamingMetricsResponse {
        StreamingMetricsResponse {
            request_count: self.request_count.load(Ordering::Relaxed),
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            containers_delivered: self.containers_delivered.load(Ordering::Relaxed),
            audio_bytes_delivered: self.audio_bytes_delivered.load(Ordering::Relaxed),
        }
    }
}

#[derive(Serialize)]
pub struct MetricsResponse {
    pub timestamp: DateTime<Utc>,
    pub system: SystemMetrics,
    pub streaming: StreamingMetricsResponse,
}

#[derive(Serialize)]
pub struct SystemMetrics {
    pub cpu_usage_percent: f32,
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
    pub memory_usage_percent: f32,
    pub uptime_seconds: u64,
    pub system_load: Option<f64>,
}

#[derive(Serialize)]
pub struct StreamingMetricsResponse {
    pub request_count: u64,
    pub sessions_started: u64,
    pub containers_delivered: u64,
    pub audio_bytes_delivered: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = StreamMetrics::default();
        metrics.record_request();
        metrics.record_request();
        metrics.record_session_started();
        metrics.record_container(44 + 4000);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.request_count, 2);
        assert_eq!(snapshot.sessions_started, 1);
        assert_eq!(snapshot.containers_delivered, 1);
        assert_eq!(snapshot.audio_bytes_delivered, 4044);
    }
}
