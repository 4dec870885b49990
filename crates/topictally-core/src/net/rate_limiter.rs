//! Token-bucket rate limiter for the fetcher (spec.md §4.1, §9).
//!
//! Modeled as a sliding window of departure timestamps plus a minimum
//! inter-request delay. `wait_for_slot` loops rather than recursing — the
//! spec's "after sleeping, re-check" behavior is bounded iteration, not
//! unbounded stack growth, per spec.md §9's design note.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Tunables for the rate limiter (spec.md §6 `maxRequests`/`windowMs`/
/// `minDelayMs`).
#[derive(Debug, Clone, Copy)]
pub struct RateLimiterConfig {
    /// Maximum completed requests allowed within `window`.
    pub max_requests: usize,
    /// The trailing window over which `max_requests` is enforced.
    pub window: Duration,
    /// Minimum spacing between successive request departures.
    pub min_delay: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(300),
            min_delay: Duration::from_millis(200),
        }
    }
}

/// A process-wide, cooperatively-shared rate limiter.
///
/// Safe to use from multiple concurrent callers: the wait path re-checks
/// after every sleep because a concurrent caller may have claimed the slot
/// that just freed up (spec.md §4.1).
pub struct RateLimiter {
    config: RateLimiterConfig,
    state: Mutex<State>,
}

struct State {
    /// Departure timestamps within the trailing window, oldest first.
    departures: VecDeque<Instant>,
    /// The most recent departure, used to enforce `min_delay`.
    last_departure: Option<Instant>,
}

impl RateLimiter {
    /// Construct a rate limiter with the given tunables.
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            state: Mutex::new(State {
                departures: VecDeque::new(),
                last_departure: None,
            }),
        }
    }

    /// Block until a slot is free, then mark this moment as a departure.
    ///
    /// Re-entrant: if woken into a state that's saturated again (a
    /// concurrent caller grabbed the slot first), loops and waits again.
    pub async fn wait_for_slot(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                evict_expired(&mut state.departures, now, self.config.window);

                if state.departures.len() >= self.config.max_requests {
                    let oldest = *state.departures.front().expect("len >= max_requests > 0");
                    let exits_window_at = oldest + self.config.window;
                    Some(exits_window_at.saturating_duration_since(now))
                } else if let Some(last) = state.last_departure {
                    let since_last = now.saturating_duration_since(last);
                    if since_last < self.config.min_delay {
                        Some(self.config.min_delay - since_last)
                    } else {
                        None
                    }
                } else {
                    None
                }
            };

            match wait {
                Some(duration) if duration > Duration::ZERO => {
                    tokio::time::sleep(duration).await;
                    continue;
                }
                _ => {
                    let mut state = self.state.lock().await;
                    let now = Instant::now();
                    evict_expired(&mut state.departures, now, self.config.window);
                    // Re-check under lock: another waiter may have filled
                    // the slot while we were unlocked between the read
                    // above and re-acquiring the lock here.
                    if state.departures.len() >= self.config.max_requests {
                        continue;
                    }
                    state.departures.push_back(now);
                    state.last_departure = Some(now);
                    return;
                }
            }
        }
    }

    /// Number of requests currently counted within the trailing window.
    pub async fn in_flight_count(&self) -> usize {
        let mut state = self.state.lock().await;
        evict_expired(&mut state.departures, Instant::now(), self.config.window);
        state.departures.len()
    }
}

fn evict_expired(departures: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&front) = departures.front() {
        if now.saturating_duration_since(front) >= window {
            departures.pop_front();
        } else {
            break;
        }
    }
}
