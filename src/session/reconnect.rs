//! Reconnect policy: close-code normalization, transient-code matching,
//! disconnect debouncing and retry throttling.
//!
//! Pure decision logic; the session loop applies the results.

use std::time::Duration;

use tokio::time::Instant;

use crate::core::constants::{NORMAL_CLOSE, TRANSIENT_CLOSE_CODES};

/// Decides whether and when the transport should be re-established.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    /// Whether transient closes trigger automatic reconnection.
    pub auto_reconnect: bool,
    /// Minimum interval between two connect attempts.
    pub reconnect_window: Duration,
    /// Minimum interval between two disconnect notifications.
    pub debounce: Duration,
}

impl ReconnectPolicy {
    /// Normalize a caller-requested close code: codes below 1000 are moved
    /// into the application range by adding 1000.
    pub fn normalize_code(code: u16) -> u16 {
        if code < 1000 { code + 1000 } else { code }
    }

    /// Effective close code for a disconnect: an explicitly requested code
    /// wins over whatever the transport reported; absent both, normal
    /// closure is assumed.
    pub fn effective_code(reported: Option<u16>, requested: Option<u16>) -> u16 {
        requested.or(reported).unwrap_or(NORMAL_CLOSE)
    }

    /// Whether a close code signifies a transient failure.
    pub fn is_transient(code: u16) -> bool {
        TRANSIENT_CLOSE_CODES.contains(&code)
    }

    /// Whether this close should trigger automatic reconnection.
    pub fn should_reconnect(&self, code: u16) -> bool {
        self.auto_reconnect && Self::is_transient(code)
    }

    /// Whether a disconnect notification may fire, given when the previous
    /// one did.
    pub fn should_notify(&self, last_notify: Option<Instant>, now: Instant) -> bool {
        match last_notify {
            Some(at) => now.duration_since(at) >= self.debounce,
            None => true,
        }
    }

    /// How long a reconnect attempt must wait, measured from the last
    /// connect attempt. Zero when the window has already elapsed.
    pub fn retry_delay(&self, last_attempt: Option<Instant>, now: Instant) -> Duration {
        match last_attempt {
            Some(at) => {
                let elapsed = now.duration_since(at);
                self.reconnect_window.saturating_sub(elapsed)
            }
            None => Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ReconnectPolicy {
        ReconnectPolicy {
            auto_reconnect: true,
            reconnect_window: Duration::from_secs(10),
            debounce: Duration::from_millis(100),
        }
    }

    #[test]
    fn test_normalize_sub_1000_codes() {
        assert_eq!(ReconnectPolicy::normalize_code(500), 1500);
        assert_eq!(ReconnectPolicy::normalize_code(0), 1000);
        assert_eq!(ReconnectPolicy::normalize_code(1001), 1001);
        assert_eq!(ReconnectPolicy::normalize_code(4000), 4000);
    }

    #[test]
    fn test_requested_code_wins() {
        assert_eq!(ReconnectPolicy::effective_code(Some(1006), Some(1500)), 1500);
        assert_eq!(ReconnectPolicy::effective_code(Some(1006), None), 1006);
        assert_eq!(ReconnectPolicy::effective_code(None, None), 1000);
    }

    #[test]
    fn test_transient_code_set() {
        for code in [1006, 1009, 1011, 1012, 1013, 1014, 1015] {
            assert!(ReconnectPolicy::is_transient(code), "{code} should be transient");
        }
        for code in [1000, 1001, 1005, 1008, 1500, 4000] {
            assert!(!ReconnectPolicy::is_transient(code), "{code} should not be transient");
        }
    }

    #[test]
    fn test_clean_close_never_reconnects() {
        assert!(!policy().should_reconnect(1000));
        assert!(policy().should_reconnect(1006));

        let disabled = ReconnectPolicy {
            auto_reconnect: false,
            ..policy()
        };
        assert!(!disabled.should_reconnect(1006));
    }

    #[test]
    fn test_notify_debounce() {
        let p = policy();
        let start = Instant::now();
        assert!(p.should_notify(None, start));
        assert!(!p.should_notify(Some(start), start + Duration::from_millis(50)));
        assert!(p.should_notify(Some(start), start + Duration::from_millis(100)));
    }

    #[test]
    fn test_retry_delay_defers_within_window() {
        let p = policy();
        let start = Instant::now();
        assert_eq!(p.retry_delay(None, start), Duration::ZERO);

        let delay = p.retry_delay(Some(start), start + Duration::from_secs(3));
        assert_eq!(delay, Duration::from_secs(7));

        let late = p.retry_delay(Some(start), start + Duration::from_secs(12));
        assert_eq!(late, Duration::ZERO);
    }
}
