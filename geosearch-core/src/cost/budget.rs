//! Daily upstream-miss budget for server-owned credentials.
//!
//! One counter per UTC calendar day. A unit is consumed *before* each
//! server-credentialed upstream call; once the ceiling is reached further
//! calls are refused without consuming anything. The counter resets the
//! first time a new UTC day is observed.

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::{Arc, Mutex};

use super::clock::Clock;

#[derive(Debug, Clone, Copy)]
struct BudgetState {
    day: NaiveDate,
    used: u32,
}

/// Point-in-time view of the budget, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BudgetSnapshot {
    /// UTC day the counter applies to.
    pub day: NaiveDate,
    /// Units consumed today.
    pub used: u32,
    /// Configured daily ceiling.
    pub ceiling: u32,
    /// Units left today.
    pub remaining: u32,
}

/// Process-wide daily budget counter.
pub struct DailyBudget {
    ceiling: u32,
    state: Mutex<BudgetState>,
    clock: Arc<dyn Clock>,
}

impl DailyBudget {
    /// Create a budget allowing `ceiling` server-credential calls per UTC day.
    pub fn new(ceiling: u32, clock: Arc<dyn Clock>) -> Self {
        let day = clock.now().date_naive();
        Self {
            ceiling,
            state: Mutex::new(BudgetState { day, used: 0 }),
            clock,
        }
    }

    /// Consume one unit if any remain today.
    ///
    /// Returns `false`, without consuming, when the ceiling is reached.
    pub fn try_consume(&self) -> bool {
        let today = self.clock.now().date_naive();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        roll_over(&mut state, today);

        if state.used >= self.ceiling {
            tracing::warn!(
                used = state.used,
                ceiling = self.ceiling,
                "daily upstream budget exhausted"
            );
            return false;
        }
        state.used += 1;
        true
    }

    /// Current usage, rolled over to today if the day changed.
    pub fn snapshot(&self) -> BudgetSnapshot {
        let today = self.clock.now().date_naive();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        roll_over(&mut state, today);
        BudgetSnapshot {
            day: state.day,
            used: state.used,
            ceiling: self.ceiling,
            remaining: self.ceiling.saturating_sub(state.used),
        }
    }

    /// Reset today's usage to zero.
    pub fn reset(&self) {
        let today = self.clock.now().date_naive();
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = BudgetState {
            day: today,
            used: 0,
        };
    }
}

impl std::fmt::Debug for DailyBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyBudget")
            .field("ceiling", &self.ceiling)
            .finish_non_exhaustive()
    }
}

fn roll_over(state: &mut BudgetState, today: NaiveDate) {
    if state.day != today {
        tracing::info!(
            previous_day = %state.day,
            used = state.used,
            "daily upstream budget reset"
        );
        state.day = today;
        state.used = 0;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::cost::clock::ManualClock;
    use chrono::{Duration, TimeZone, Utc};

    fn budget(ceiling: u32) -> (DailyBudget, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 23, 59, 0).unwrap(),
        ));
        (DailyBudget::new(ceiling, clock.clone()), clock)
    }

    #[test]
    fn consumes_until_ceiling() {
        let (budget, _) = budget(3);
        assert!(budget.try_consume());
        assert!(budget.try_consume());
        assert!(budget.try_consume());
        assert!(!budget.try_consume());
        assert_eq!(budget.snapshot().used, 3);
    }

    #[test]
    fn refusal_does_not_consume() {
        let (budget, _) = budget(1);
        assert!(budget.try_consume());
        for _ in 0..10 {
            assert!(!budget.try_consume());
        }
        let snap = budget.snapshot();
        assert_eq!(snap.used, 1);
        assert_eq!(snap.remaining, 0);
    }

    #[test]
    fn resets_when_utc_day_changes() {
        let (budget, clock) = budget(2);
        assert!(budget.try_consume());
        assert!(budget.try_consume());
        assert!(!budget.try_consume());

        clock.advance(Duration::minutes(2));
        let snap = budget.snapshot();
        assert_eq!(snap.day, NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
        assert_eq!(snap.used, 0);
        assert!(budget.try_consume());
    }

    #[test]
    fn same_day_does_not_reset() {
        let (budget, clock) = budget(1);
        clock.set(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        assert!(budget.try_consume());
        clock.set(Utc.with_ymd_and_hms(2024, 6, 1, 23, 59, 59).unwrap());
        assert!(!budget.try_consume());
    }

    #[test]
    fn zero_ceiling_refuses_everything() {
        let (budget, _) = budget(0);
        assert!(!budget.try_consume());
        assert_eq!(budget.snapshot().remaining, 0);
    }

    #[test]
    fn reset_hook_clears_usage() {
        let (budget, _) = budget(1);
        assert!(budget.try_consume());
        budget.reset();
        assert!(budget.try_consume());
    }

    #[test]
    fn concurrent_consumers_never_exceed_ceiling() {
        let (budget, _) = budget(100);
        let budget = Arc::new(budget);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let budget = Arc::clone(&budget);
                std::thread::spawn(move || (0..50).filter(|_| budget.try_consume()).count())
            })
            .collect();
        let consumed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(consumed, 100);
        assert_eq!(budget.snapshot().used, 100);
    }
}
