//! Generation credit ledger.
//!
//! The balance is the only mutable shared resource of the access core.
//! Every mutation goes through [`CreditLedger::spend`] (or `debit`),
//! `grant`, `refund` or one of the reset methods, each a single
//! check-and-update under one lock.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use dreamforge_core::models::entitlement::{GenerationLimit, entitlements_for};
use dreamforge_core::models::tier::SubscriptionTier;
use serde::Serialize;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::ResetPeriod;

/// Remaining credits. `Unlimited` is absorbing until the next reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CreditBalance {
    Finite(u32),
    Unlimited,
}

impl CreditBalance {
    pub fn for_limit(limit: GenerationLimit) -> Self {
        match limit {
            GenerationLimit::Daily(n) => CreditBalance::Finite(n),
            GenerationLimit::Unlimited => CreditBalance::Unlimited,
        }
    }

    pub fn for_tier(tier: SubscriptionTier) -> Self {
        Self::for_limit(entitlements_for(tier).generation_limit)
    }

    /// The finite amount, or `None` when unlimited.
    pub fn available(&self) -> Option<u32> {
        match self {
            CreditBalance::Finite(n) => Some(*n),
            CreditBalance::Unlimited => None,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self, CreditBalance::Unlimited)
    }
}

impl fmt::Display for CreditBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreditBalance::Finite(n) => write!(f, "{n} credits remaining"),
            CreditBalance::Unlimited => f.write_str("Unlimited"),
        }
    }
}

/// Receipt of a successful debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debit {
    pub amount: u32,
    period: u64,
}

#[derive(Debug)]
struct LedgerState {
    tier: SubscriptionTier,
    balance: CreditBalance,
    /// Bumped on every refill.
    period: u64,
    period_start: DateTime<Utc>,
}

impl LedgerState {
    fn refill(&mut self, tier: SubscriptionTier, now: DateTime<Utc>) {
        self.tier = tier;
        self.balance = CreditBalance::for_tier(tier);
        self.period += 1;
        self.period_start = now;
    }
}

pub struct CreditLedger {
    state: Mutex<LedgerState>,
    reset_period: ResetPeriod,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for CreditLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreditLedger")
            .field("state", &*self.state.lock().unwrap_or_else(PoisonError::into_inner))
            .field("reset_period", &self.reset_period)
            .finish()
    }
}

impl CreditLedger {
    /// A ledger holding `tier`'s full allowance.
    pub fn new(tier: SubscriptionTier, period: ResetPeriod, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            state: Mutex::new(LedgerState {
                tier,
                balance: CreditBalance::for_tier(tier),
                period: 0,
                period_start: now,
            }),
            reset_period: period,
            clock,
        }
    }

    pub fn with_system_clock(tier: SubscriptionTier, period: ResetPeriod) -> Self {
        Self::new(tier, period, Arc::new(SystemClock))
    }

    /// Debit `amount` credits if the balance covers it.
    ///
    /// Unlimited balances always succeed without change. A failed spend
    /// leaves the balance untouched. Spending zero is a no-op success.
    pub fn spend(&self, amount: u32) -> bool {
        self.debit(amount).is_some()
    }

    /// Like [`spend`](Self::spend), returning a receipt that can later be
    /// passed to [`refund`](Self::refund).
    pub fn debit(&self, amount: u32) -> Option<Debit> {
        let mut state = self.lock();
        let receipt = Debit {
            amount,
            period: state.period,
        };
        match state.balance {
            CreditBalance::Unlimited => Some(receipt),
            CreditBalance::Finite(balance) if balance >= amount => {
                state.balance = CreditBalance::Finite(balance - amount);
                debug!(amount, remaining = balance - amount, "Credits spent");
                Some(receipt)
            }
            CreditBalance::Finite(balance) => {
                debug!(amount, balance, "Spend rejected");
                None
            }
        }
    }

    /// Add promotional or bonus credits. Saturates at `u32::MAX`;
    /// no effect on an unlimited balance.
    ///
    /// Granted credits last until the next reset, which replaces the
    /// balance with the tier's allowance.
    pub fn grant(&self, amount: u32) {
        let mut state = self.lock();
        if let CreditBalance::Finite(balance) = state.balance {
            let updated = balance.saturating_add(amount);
            state.balance = CreditBalance::Finite(updated);
            info!(amount, balance = updated, tier = %state.tier, "Credits granted");
        }
    }

    /// Return the credits of a debit that produced nothing.
    ///
    /// Skipped when the ledger was reset or a new period began after the
    /// debit, since the refill already restored the allowance.
    pub fn refund(&self, debit: Debit) {
        let mut state = self.lock();
        if state.period != debit.period {
            debug!(amount = debit.amount, "Refund skipped: period changed since debit");
            return;
        }
        if let CreditBalance::Finite(balance) = state.balance {
            let updated = balance.saturating_add(debit.amount);
            state.balance = CreditBalance::Finite(updated);
            info!(amount = debit.amount, balance = updated, "Credits refunded");
        }
    }

    /// Replace the balance with `tier`'s allowance and start a new period.
    pub fn reset_for_tier(&self, tier: SubscriptionTier) {
        let now = self.clock.now();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = state.tier;
        state.refill(tier, now);
        info!(from = %previous, to = %tier, balance = %state.balance, "Credit ledger reset");
    }

    /// Refill the current tier's allowance.
    pub fn reset(&self) {
        let now = self.clock.now();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let tier = state.tier;
        state.refill(tier, now);
        info!(tier = %tier, balance = %state.balance, "Credit ledger reset");
    }

    pub fn balance(&self) -> CreditBalance {
        self.lock().balance
    }

    /// The tier the ledger was last reset for.
    pub fn tier(&self) -> SubscriptionTier {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tier
    }

    /// Start of the current credit period.
    pub fn period_start(&self) -> DateTime<Utc> {
        self.lock().period_start
    }

    /// Acquire the state, rolling into a new period first if one began.
    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if self.reset_period == ResetPeriod::Daily {
            let now = self.clock.now();
            if now.date_naive() > state.period_start.date_naive() {
                let tier = state.tier;
                state.refill(tier, now);
                info!(tier = %tier, balance = %state.balance, "Daily credit period started");
            }
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::clock::ManualClock;

    fn ledger(tier: SubscriptionTier) -> (CreditLedger, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        ));
        (
            CreditLedger::new(tier, ResetPeriod::Daily, clock.clone()),
            clock,
        )
    }

    #[test]
    fn community_spend_decrements() {
        let (ledger, _) = ledger(SubscriptionTier::Community);
        assert_eq!(ledger.balance(), CreditBalance::Finite(5));
        assert!(ledger.spend(1));
        assert_eq!(ledger.balance(), CreditBalance::Finite(4));
    }

    #[test]
    fn empty_balance_rejects_spend() {
        let (ledger, _) = ledger(SubscriptionTier::Community);
        assert!(ledger.spend(5));
        assert!(!ledger.spend(1));
        assert_eq!(ledger.balance(), CreditBalance::Finite(0));
    }

    #[test]
    fn overspend_is_not_partially_debited() {
        let (ledger, _) = ledger(SubscriptionTier::Community);
        assert!(ledger.spend(2));
        assert!(!ledger.spend(4));
        assert_eq!(ledger.balance(), CreditBalance::Finite(3));
        assert!(ledger.spend(3));
        assert_eq!(ledger.balance(), CreditBalance::Finite(0));
    }

    #[test]
    fn reset_for_tier_replaces_balance() {
        let (ledger, _) = ledger(SubscriptionTier::Community);
        ledger.spend(3);
        ledger.reset_for_tier(SubscriptionTier::Pro);
        assert_eq!(ledger.balance(), CreditBalance::Finite(50));
        assert_eq!(ledger.tier(), SubscriptionTier::Pro);
    }

    #[test]
    fn fresh_allowance_cannot_be_overspent() {
        for tier in [SubscriptionTier::Community, SubscriptionTier::Pro] {
            let (ledger, _) = ledger(SubscriptionTier::Studio);
            ledger.reset_for_tier(tier);
            let limit = ledger.balance().available().unwrap();
            assert!(!ledger.spend(limit + 1));
            assert_eq!(ledger.balance(), CreditBalance::Finite(limit));
        }
    }

    #[test]
    fn unlimited_spend_never_changes_balance() {
        let (ledger, _) = ledger(SubscriptionTier::Studio);
        assert!(ledger.spend(1000));
        assert!(ledger.spend(u32::MAX));
        assert_eq!(ledger.balance(), CreditBalance::Unlimited);
    }

    #[test]
    fn unlimited_is_left_by_reset_to_finite_tier() {
        let (ledger, _) = ledger(SubscriptionTier::Studio);
        ledger.reset_for_tier(SubscriptionTier::Community);
        assert!(!ledger.spend(6));
        assert!(ledger.spend(5));
    }

    #[test]
    fn grant_adds_and_saturates() {
        let (ledger, _) = ledger(SubscriptionTier::Community);
        ledger.grant(10);
        assert_eq!(ledger.balance(), CreditBalance::Finite(15));
        ledger.grant(u32::MAX);
        assert_eq!(ledger.balance(), CreditBalance::Finite(u32::MAX));
    }

    #[test]
    fn grant_on_unlimited_is_ignored() {
        let (ledger, _) = ledger(SubscriptionTier::Studio);
        ledger.grant(10);
        assert_eq!(ledger.balance(), CreditBalance::Unlimited);
    }

    #[test]
    fn refund_restores_debit() {
        let (ledger, _) = ledger(SubscriptionTier::Community);
        let debit = ledger.debit(2).unwrap();
        assert_eq!(ledger.balance(), CreditBalance::Finite(3));
        ledger.refund(debit);
        assert_eq!(ledger.balance(), CreditBalance::Finite(5));
    }

    #[test]
    fn refund_keeps_granted_surplus() {
        let (ledger, _) = ledger(SubscriptionTier::Community);
        ledger.grant(5);
        let debit = ledger.debit(1).unwrap();
        ledger.refund(debit);
        assert_eq!(ledger.balance(), CreditBalance::Finite(10));
    }

    #[test]
    fn refund_after_reset_is_skipped() {
        let (ledger, _) = ledger(SubscriptionTier::Pro);
        let debit = ledger.debit(4).unwrap();
        ledger.reset_for_tier(SubscriptionTier::Community);
        ledger.refund(debit);
        assert_eq!(ledger.balance(), CreditBalance::Finite(5));
    }

    #[test]
    fn refund_after_new_day_is_skipped() {
        let (ledger, clock) = ledger(SubscriptionTier::Community);
        let debit = ledger.debit(3).unwrap();
        clock.advance(Duration::days(1));
        ledger.refund(debit);
        assert_eq!(ledger.balance(), CreditBalance::Finite(5));
    }

    #[test]
    fn failed_debit_has_no_receipt() {
        let (ledger, _) = ledger(SubscriptionTier::Community);
        assert!(ledger.debit(6).is_none());
        assert_eq!(ledger.balance(), CreditBalance::Finite(5));
    }

    #[test]
    fn daily_period_refills_after_midnight() {
        let (ledger, clock) = ledger(SubscriptionTier::Community);
        ledger.spend(5);
        clock.advance(Duration::hours(10));
        assert_eq!(ledger.balance(), CreditBalance::Finite(0));
        clock.advance(Duration::hours(5));
        assert_eq!(ledger.balance(), CreditBalance::Finite(5));
    }

    #[test]
    fn daily_refill_drops_grants() {
        let (ledger, clock) = ledger(SubscriptionTier::Pro);
        ledger.grant(20);
        clock.advance(Duration::days(1));
        assert_eq!(ledger.balance(), CreditBalance::Finite(50));
    }

    #[test]
    fn manual_period_never_refills_on_its_own() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let ledger =
            CreditLedger::new(SubscriptionTier::Community, ResetPeriod::Manual, clock.clone());
        ledger.spend(5);
        clock.advance(Duration::days(3));
        assert_eq!(ledger.balance(), CreditBalance::Finite(0));
        ledger.reset();
        assert_eq!(ledger.balance(), CreditBalance::Finite(5));
    }

    #[test]
    fn daily_period_follows_the_calendar_day() {
        let (ledger, clock) = ledger(SubscriptionTier::Community);
        ledger.spend(5);
        clock.set(Utc.with_ymd_and_hms(2026, 3, 1, 23, 59, 59).unwrap());
        assert_eq!(ledger.balance(), CreditBalance::Finite(0));
        clock.set(Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap());
        assert_eq!(ledger.balance(), CreditBalance::Finite(5));
    }

    #[test]
    fn reset_never_reverts_a_concurrent_tier_change() {
        let ledger = Arc::new(CreditLedger::with_system_clock(
            SubscriptionTier::Community,
            ResetPeriod::Manual,
        ));
        let resetter = {
            let ledger = Arc::clone(&ledger);
            std::thread::spawn(move || {
                for _ in 0..2_000 {
                    ledger.reset();
                }
            })
        };
        ledger.reset_for_tier(SubscriptionTier::Pro);
        resetter.join().unwrap();

        assert_eq!(ledger.tier(), SubscriptionTier::Pro);
        assert_eq!(ledger.balance(), CreditBalance::Finite(50));
    }

    #[test]
    fn balance_display() {
        assert_eq!(CreditBalance::Finite(4).to_string(), "4 credits remaining");
        assert_eq!(CreditBalance::Unlimited.to_string(), "Unlimited");
    }
}
