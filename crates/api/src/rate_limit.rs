use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

struct WindowState {
    hits: HashMap<String, VecDeque<Instant>>,
    last_sweep: Instant,
}

impl WindowState {
    /// Drops every client whose newest hit has left the window.
    fn sweep(&mut self, now: Instant, window: Duration) {
        self.hits.retain(|_, hits| {
            hits.back()
                .is_some_and(|newest| now.saturating_duration_since(*newest) <= window)
        });
        self.last_sweep = now;
    }
}

/// Sliding-window budget per webhook client.
///
/// Client keys come from `x-forwarded-for`, which the caller controls, so
/// idle keys are swept at most once per window instead of living forever.
#[derive(Clone)]
pub struct IpRateLimiter {
    state: Arc<Mutex<WindowState>>,
    window: Duration,
    max_requests: usize,
}

impl IpRateLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(WindowState {
                hits: HashMap::new(),
                last_sweep: Instant::now(),
            })),
            window,
            max_requests,
        }
    }

    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut state = self.state.lock();
        if now.saturating_duration_since(state.last_sweep) > self.window {
            state.sweep(now, self.window);
        }

        let hits = state.hits.entry(key.to_string()).or_default();
        while hits
            .front()
            .is_some_and(|oldest| now.saturating_duration_since(*oldest) > self.window)
        {
            hits.pop_front();
        }

        if hits.len() >= self.max_requests {
            return false;
        }

        hits.push_back(now);
        true
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.state.lock().hits.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_budget_and_recovers() {
        let limiter = IpRateLimiter::new(Duration::from_secs(60), 2);
        let start = Instant::now();

        assert!(limiter.allow_at("a", start));
        assert!(limiter.allow_at("a", start));
        assert!(!limiter.allow_at("a", start));
        assert!(limiter.allow_at("b", start));
        assert!(limiter.allow_at("a", start + Duration::from_secs(61)));
    }

    #[test]
    fn idle_clients_are_forgotten() {
        let limiter = IpRateLimiter::new(Duration::from_millis(1), 5);
        let start = Instant::now();

        for client in 0..10_000 {
            assert!(limiter.allow_at(&format!("/webhook:10.0.{client}"), start));
        }
        assert_eq!(limiter.tracked_clients(), 10_000);

        assert!(limiter.allow_at("/webhook:10.9.9.9", start + Duration::from_secs(3600)));
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn active_clients_survive_a_sweep() {
        let limiter = IpRateLimiter::new(Duration::from_secs(10), 1);
        let start = Instant::now();

        assert!(limiter.allow_at("busy", start + Duration::from_secs(5)));
        assert!(limiter.allow_at("idle", start));
        // Sweep runs here; "busy" was seen 7 seconds ago and keeps its hit.
        assert!(!limiter.allow_at("busy", start + Duration::from_secs(12)));
        assert_eq!(limiter.tracked_clients(), 1);
    }
}
