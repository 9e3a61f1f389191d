use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    messages_total: AtomicU64,
    schedule_replies_total: AtomicU64,
    outbreak_replies_total: AtomicU64,
    delivery_failures_total: AtomicU64,
    broadcasts_total: AtomicU64,
    broadcast_recipients_total: AtomicU64,
    total_latency_micros: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub messages_total: u64,
    pub schedule_replies_total: u64,
    pub outbreak_replies_total: u64,
    pub delivery_failures_total: u64,
    pub broadcasts_total: u64,
    pub broadcast_recipients_total: u64,
    pub avg_latency_micros: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_message(&self) {
        self.messages_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_schedule_reply(&self) {
        self.schedule_replies_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_outbreak_reply(&self) {
        self.outbreak_replies_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_delivery_failure(&self) {
        self.delivery_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_broadcast(&self, recipients: usize) {
        self.broadcasts_total.fetch_add(1, Ordering::Relaxed);
        self.broadcast_recipients_total
            .fetch_add(recipients as u64, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_micros
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let messages = self.messages_total.load(Ordering::Relaxed);
        let latency = self.total_latency_micros.load(Ordering::Relaxed);

        MetricsSnapshot {
            messages_total: messages,
            schedule_replies_total: self.schedule_replies_total.load(Ordering::Relaxed),
            outbreak_replies_total: self.outbreak_replies_total.load(Ordering::Relaxed),
            delivery_failures_total: self.delivery_failures_total.load(Ordering::Relaxed),
            broadcasts_total: self.broadcasts_total.load(Ordering::Relaxed),
            broadcast_recipients_total: self.broadcast_recipients_total.load(Ordering::Relaxed),
            avg_latency_micros: if messages == 0 {
                0.0
            } else {
                latency as f64 / messages as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,arogya_api=info,arogya_agents=info,tower_http=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}

/// Keeps the last four digits of a phone number for log lines.
pub fn mask_phone(phone: &str) -> String {
    let digits = phone.chars().count();
    if digits <= 4 {
        return "*".repeat(digits);
    }

    phone
        .chars()
        .enumerate()
        .map(|(idx, ch)| if idx + 4 < digits { '*' } else { ch })
        .collect()
}
