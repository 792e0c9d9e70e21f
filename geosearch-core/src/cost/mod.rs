//! Cost control: per-identity rate limiting plus a daily budget for
//! server-owned credentials.
//!
//! Both mechanisms are in-memory and process-wide. A single
//! [`CostControl`] is created at startup and shared through an [`Arc`]
//! by every request; each mechanism serialises its read-check-write cycle
//! behind its own mutex.

pub mod budget;
pub mod clock;
pub mod rate_limit;

use std::sync::Arc;

use crate::config::CostConfig;

pub use budget::{BudgetSnapshot, DailyBudget};
pub use clock::{Clock, ManualClock, SystemClock};
pub use rate_limit::{RateLimitError, RateLimiter, UNKNOWN_IDENTITY};

/// Shared cost-control state.
#[derive(Debug)]
pub struct CostControl {
    rate: RateLimiter,
    budget: DailyBudget,
}

impl CostControl {
    /// Build cost control from config, reading time from `clock`.
    pub fn new(config: &CostConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            rate: RateLimiter::new(
                config.rate_limit_max_requests,
                config.rate_limit_window_seconds,
                Arc::clone(&clock),
            ),
            budget: DailyBudget::new(config.daily_miss_budget, clock),
        }
    }

    /// Build cost control backed by the system clock.
    pub fn with_system_clock(config: &CostConfig) -> Self {
        Self::new(config, Arc::new(SystemClock))
    }

    /// Gate a request from `identity`.
    pub fn check_rate(&self, identity: &str) -> Result<(), RateLimitError> {
        self.rate.check(identity)
    }

    /// Consume one unit of the daily budget for a server-credential attempt.
    pub fn try_consume_budget(&self) -> bool {
        self.budget.try_consume()
    }

    /// Remaining admissions for `identity`.
    pub fn rate_remaining(&self, identity: &str) -> u32 {
        self.rate.remaining(identity)
    }

    /// Current budget usage.
    pub fn budget_snapshot(&self) -> BudgetSnapshot {
        self.budget.snapshot()
    }

    /// Clear all rate-limit buckets and today's budget usage.
    pub fn reset(&self) {
        self.rate.reset();
        self.budget.reset();
    }
}
