//! crates/study_notes_core/src/usage.rs
//!
//! The usage guard: a per-session daily quota and a minimum gap between
//! accepted requests.
//!
//! The guard owns no state of its own. Callers hand it the session's
//! `SessionUsage` together with the current time, which keeps it usable from
//! tests without a clock or a web runtime.

use crate::domain::SessionUsage;
use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_DAILY_LIMIT: u32 = 20;
pub const DEFAULT_COOLDOWN_SECONDS: i64 = 5;

/// Why the guard turned a request away. The session state is untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageRejection {
    #[error("Daily usage limit reached ({limit} requests)")]
    QuotaExceeded { limit: u32 },
    #[error("Please wait {} more second(s) before the next request", self.retry_after_secs().unwrap_or(1))]
    CooldownActive { retry_after: Duration },
}

impl UsageRejection {
    /// Seconds a client should wait before resubmitting, rounded up so the
    /// next attempt never lands inside the cooldown. `None` for quota rejections.
    pub fn retry_after_secs(&self) -> Option<i64> {
        match self {
            UsageRejection::CooldownActive { retry_after } => Some(whole_seconds_up(*retry_after)),
            UsageRejection::QuotaExceeded { .. } => None,
        }
    }
}

/// Rounds a wait up to whole seconds, never below one.
fn whole_seconds_up(wait: Duration) -> i64 {
    ((wait.num_milliseconds() + 999) / 1000).max(1)
}

/// Limits applied by the guard. Built once from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageGuard {
    daily_limit: u32,
    cooldown: Duration,
    daily_rollover: bool,
}

impl Default for UsageGuard {
    fn default() -> Self {
        Self::new(
            DEFAULT_DAILY_LIMIT,
            Duration::seconds(DEFAULT_COOLDOWN_SECONDS),
        )
    }
}

impl UsageGuard {
    pub fn new(daily_limit: u32, cooldown: Duration) -> Self {
        Self {
            daily_limit,
            cooldown,
            daily_rollover: false,
        }
    }

    /// Resets the request count the first time the guard runs on a new UTC day.
    /// Off by default: counters otherwise only reset with a new session.
    pub fn with_daily_rollover(mut self, enabled: bool) -> Self {
        self.daily_rollover = enabled;
        self
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Runs the quota gate, then the cooldown gate. When both pass, the request
    /// time is stamped right away so a slow downstream call cannot let a
    /// second request through the cooldown.
    pub fn admit(&self, usage: &mut SessionUsage, now: DateTime<Utc>) -> Result<(), UsageRejection> {
        let today = now.date_naive();
        let rolled_over = self.daily_rollover && today > usage.quota_day;
        let request_count = if rolled_over { 0 } else { usage.request_count };

        if request_count >= self.daily_limit {
            return Err(UsageRejection::QuotaExceeded {
                limit: self.daily_limit,
            });
        }

        if let Some(last) = usage.last_request_time {
            let elapsed = now - last;
            if elapsed < self.cooldown {
                return Err(UsageRejection::CooldownActive {
                    retry_after: self.cooldown - elapsed,
                });
            }
        }

        if rolled_over {
            usage.request_count = 0;
            usage.quota_day = today;
        }
        usage.last_request_time = Some(now);
        Ok(())
    }

    /// Books a successful generation against the session.
    pub fn record_success(&self, usage: &mut SessionUsage, input_tokens: u64, output_tokens: u64) {
        usage.request_count = usage.request_count.saturating_add(1);
        usage.tokens_used = usage
            .tokens_used
            .saturating_add(input_tokens.saturating_add(output_tokens));
    }
}
