//! Per-user registration throttle.
//!
//! Each user gets a sliding window of recent registration attempts. Users
//! idle for longer than one window are evicted, and the table never tracks
//! more than `capacity` users at once.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::ThrottleSettings;

/// Outcome of a throttle check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// Attempt recorded; `remaining` more are allowed in this window
    Allowed { remaining: usize },
    /// Limit reached; retry once the oldest attempt leaves the window
    Limited { retry_after: Duration },
}

impl ThrottleDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Sliding-window registration throttle keyed by user
#[derive(Debug)]
pub struct RegistrationThrottle {
    attempts: Mutex<HashMap<Uuid, VecDeque<Instant>>>,
    max_attempts: usize,
    window: Duration,
    capacity: usize,
}

impl RegistrationThrottle {
    /// Create a throttle
    ///
    /// # Arguments
    ///
    /// * `max_attempts` - Attempts allowed per user within the window
    /// * `window` - Sliding window length
    /// * `capacity` - Most users tracked at once
    pub fn new(max_attempts: usize, window: Duration, capacity: usize) -> Self {
        Self {
            attempts: Mutex::new(HashMap::new()),
            max_attempts,
            window,
            capacity: capacity.max(1),
        }
    }

    pub fn from_settings(settings: &ThrottleSettings) -> Self {
        Self::new(settings.max_attempts, settings.window, settings.capacity)
    }

    /// Check and record an attempt for `user` at the current instant
    pub async fn check(&self, user: Uuid) -> ThrottleDecision {
        self.check_at(user, Instant::now()).await
    }

    /// Check and record an attempt for `user` at `now`
    pub async fn check_at(&self, user: Uuid, now: Instant) -> ThrottleDecision {
        let mut attempts = self.attempts.lock().await;

        if !attempts.contains_key(&user) && attempts.len() >= self.capacity {
            Self::evict_idle(&mut attempts, now, self.window);
            if attempts.len() >= self.capacity {
                Self::evict_oldest(&mut attempts);
            }
        }

        let timestamps = attempts.entry(user).or_default();

        // Remove timestamps outside the window
        while let Some(ts) = timestamps.front() {
            if now.saturating_duration_since(*ts) >= self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() >= self.max_attempts {
            let retry_after = timestamps
                .front()
                .map(|oldest| self.window.saturating_sub(now.saturating_duration_since(*oldest)))
                .unwrap_or_default();
            log::debug!("Registration throttled for user {user}, retry in {retry_after:?}");
            return ThrottleDecision::Limited { retry_after };
        }

        timestamps.push_back(now);
        ThrottleDecision::Allowed {
            remaining: self.max_attempts - timestamps.len(),
        }
    }

    /// Drop users whose attempts have all left the window
    ///
    /// Returns the number of users evicted.
    pub async fn sweep(&self) -> usize {
        self.sweep_at(Instant::now()).await
    }

    /// Drop users idle for a full window as of `now`
    pub async fn sweep_at(&self, now: Instant) -> usize {
        let mut attempts = self.attempts.lock().await;
        Self::evict_idle(&mut attempts, now, self.window)
    }

    /// Number of users currently tracked
    pub async fn tracked_users(&self) -> usize {
        self.attempts.lock().await.len()
    }

    fn evict_idle(
        attempts: &mut HashMap<Uuid, VecDeque<Instant>>,
        now: Instant,
        window: Duration,
    ) -> usize {
        let before = attempts.len();
        attempts.retain(|_, timestamps| {
            timestamps
                .back()
                .is_some_and(|latest| now.saturating_duration_since(*latest) < window)
        });
        before - attempts.len()
    }

    fn evict_oldest(attempts: &mut HashMap<Uuid, VecDeque<Instant>>) {
        let oldest = attempts
            .iter()
            .min_by_key(|(_, timestamps)| timestamps.back().copied())
            .map(|(user, _)| *user);
        if let Some(user) = oldest {
            attempts.remove(&user);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_throttle_allows_within_limit() {
        let throttle = RegistrationThrottle::new(3, Duration::from_secs(60), 10);
        let user = Uuid::new_v4();
        let now = Instant::now();

        assert_eq!(
            throttle.check_at(user, now).await,
            ThrottleDecision::Allowed { remaining: 2 }
        );
        assert!(throttle.check_at(user, now).await.is_allowed());
        assert_eq!(
            throttle.check_at(user, now).await,
            ThrottleDecision::Allowed { remaining: 0 }
        );
    }

    #[tokio::test]
    async fn test_throttle_blocks_over_limit() {
        let throttle = RegistrationThrottle::new(2, Duration::from_secs(10), 10);
        let user = Uuid::new_v4();
        let now = Instant::now();

        throttle.check_at(user, now).await;
        throttle.check_at(user, now + Duration::from_secs(4)).await;

        match throttle.check_at(user, now + Duration::from_secs(5)).await {
            ThrottleDecision::Limited { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(5));
            }
            other => panic!("expected limit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_window_slides() {
        let throttle = RegistrationThrottle::new(1, Duration::from_secs(10), 10);
        let user = Uuid::new_v4();
        let now = Instant::now();

        assert!(throttle.check_at(user, now).await.is_allowed());
        assert!(!throttle.check_at(user, now + Duration::from_secs(9)).await.is_allowed());
        assert!(throttle.check_at(user, now + Duration::from_secs(10)).await.is_allowed());
    }

    #[tokio::test]
    async fn test_users_are_independent() {
        let throttle = RegistrationThrottle::new(1, Duration::from_secs(60), 10);
        let now = Instant::now();

        assert!(throttle.check_at(Uuid::new_v4(), now).await.is_allowed());
        assert!(throttle.check_at(Uuid::new_v4(), now).await.is_allowed());
    }

    #[tokio::test]
    async fn test_capacity_bound_evicts() {
        let throttle = RegistrationThrottle::new(1, Duration::from_secs(60), 2);
        let first = Uuid::new_v4();
        let now = Instant::now();

        throttle.check_at(first, now).await;
        throttle.check_at(Uuid::new_v4(), now + Duration::from_secs(1)).await;
        throttle.check_at(Uuid::new_v4(), now + Duration::from_secs(2)).await;
        assert_eq!(throttle.tracked_users().await, 2);

        // The least recently seen user was dropped and starts fresh
        assert!(throttle.check_at(first, now + Duration::from_secs(3)).await.is_allowed());
    }

    #[tokio::test]
    async fn test_idle_users_evicted_before_oldest() {
        let throttle = RegistrationThrottle::new(5, Duration::from_secs(10), 2);
        let idle = Uuid::new_v4();
        let active = Uuid::new_v4();
        let now = Instant::now();

        throttle.check_at(idle, now).await;
        throttle.check_at(active, now + Duration::from_secs(8)).await;
        throttle.check_at(Uuid::new_v4(), now + Duration::from_secs(12)).await;

        // `active` is still inside its window and keeps its count
        assert_eq!(
            throttle.check_at(active, now + Duration::from_secs(13)).await,
            ThrottleDecision::Allowed { remaining: 3 }
        );
    }

    #[tokio::test]
    async fn test_sweep_evicts_idle_users_only() {
        let throttle = RegistrationThrottle::new(2, Duration::from_secs(10), 10);
        let idle = Uuid::new_v4();
        let active = Uuid::new_v4();
        let now = Instant::now();

        throttle.check_at(idle, now).await;
        throttle.check_at(active, now + Duration::from_secs(6)).await;

        assert_eq!(throttle.sweep_at(now + Duration::from_secs(5)).await, 0);
        assert_eq!(throttle.sweep_at(now + Duration::from_secs(10)).await, 1);
        assert_eq!(throttle.tracked_users().await, 1);

        // The evicted user starts with a fresh window
        assert_eq!(
            throttle.check_at(idle, now + Duration::from_secs(11)).await,
            ThrottleDecision::Allowed { remaining: 1 }
        );
    }
}
