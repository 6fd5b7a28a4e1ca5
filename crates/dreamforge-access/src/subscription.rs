//! Subscription state: The single owner of the user's current plan.
//!
//! Holds the `{tier, renewal}` snapshot, refreshes it from the
//! [`SubscriptionAuthority`], and keeps the [`CreditLedger`] in step:
//! a tier change and its ledger reset happen under the same lock.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use dreamforge_core::error::{DreamforgeError, DreamforgeResult, ErrorKind};
use dreamforge_core::gateway::SubscriptionAuthority;
use dreamforge_core::models::session::AuthEvent;
use dreamforge_core::models::subscription::{Subscription, SubscriptionStatus};
use dreamforge_core::models::tier::SubscriptionTier;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::gate::FeatureGate;
use crate::ledger::CreditLedger;

pub struct SubscriptionState<A: SubscriptionAuthority> {
    authority: A,
    ledger: Arc<CreditLedger>,
    current: watch::Sender<Subscription>,
    /// Serializes snapshot replacement together with the ledger reset.
    apply_lock: Mutex<()>,
}

impl<A: SubscriptionAuthority> SubscriptionState<A> {
    /// Start in the Community state. The ledger is reset if it was
    /// created for another tier.
    pub fn new(authority: A, ledger: Arc<CreditLedger>) -> Self {
        if ledger.tier() != SubscriptionTier::Community {
            ledger.reset_for_tier(SubscriptionTier::Community);
        }
        let (current, _) = watch::channel(Subscription::community());
        Self {
            authority,
            ledger,
            current,
            apply_lock: Mutex::new(()),
        }
    }

    pub fn current(&self) -> Subscription {
        self.current.borrow().clone()
    }

    pub fn tier(&self) -> SubscriptionTier {
        self.current.borrow().tier
    }

    /// Observe whole snapshots as they are replaced.
    pub fn subscribe(&self) -> watch::Receiver<Subscription> {
        self.current.subscribe()
    }

    pub fn gate(&self) -> FeatureGate {
        FeatureGate::new(self.subscribe())
    }

    pub fn ledger(&self) -> &Arc<CreditLedger> {
        &self.ledger
    }

    pub fn authority(&self) -> &A {
        &self.authority
    }

    /// Fetch the authoritative plan and replace the snapshot.
    ///
    /// Never fails: a missing session or any error from the authority
    /// yields the Community state. When refreshes overlap, the one that
    /// completes last wins.
    pub async fn refresh(&self) -> Subscription {
        let next = match self.fetch().await {
            Ok(subscription) => subscription,
            Err(e) => {
                if e.kind() == ErrorKind::External {
                    warn!(error = %e, "Subscription check failed, falling back to Community");
                } else {
                    error!(
                        error = %e,
                        "Subscription authority sent an unusable status, falling back to Community"
                    );
                }
                Subscription::community()
            }
        };
        self.apply(next)
    }

    async fn fetch(&self) -> DreamforgeResult<Subscription> {
        let Some(session) = self.authority.get_session().await? else {
            debug!("No session, using Community plan");
            return Ok(Subscription::community());
        };
        let status = self
            .authority
            .get_subscription_status(&session.access_token)
            .await?;
        subscription_from_status(status)
    }

    fn apply(&self, next: Subscription) -> Subscription {
        let _guard = self.apply_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let previous = self.current.borrow().tier;
        if previous != next.tier {
            self.ledger.reset_for_tier(next.tier);
            info!(from = %previous, to = %next.tier, "Subscription tier changed");
        }
        self.current.send_replace(next.clone());

        debug_assert_eq!(self.ledger.tier(), next.tier, "ledger not reset for tier");
        next
    }

    /// Check that the ledger was reset for the published tier.
    pub fn verify_ledger(&self) -> DreamforgeResult<()> {
        let _guard = self.apply_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let tier = self.current.borrow().tier;
        let ledger_tier = self.ledger.tier();
        if tier == ledger_tier {
            Ok(())
        } else {
            Err(DreamforgeError::InconsistentState(format!(
                "subscription tier is {tier} but credit ledger was reset for {ledger_tier}"
            )))
        }
    }
}

impl<A: SubscriptionAuthority + 'static> SubscriptionState<A> {
    /// Refresh on every auth event that can change the plan.
    ///
    /// The returned listener stops the task when unsubscribed or
    /// dropped; the task also ends when the event channel closes.
    pub fn listen(
        self: &Arc<Self>,
        mut events: broadcast::Receiver<AuthEvent>,
    ) -> SubscriptionListener {
        let state = Arc::clone(self);
        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) if event.affects_subscription() => {
                        debug!(?event, "Auth state changed, refreshing subscription");
                        state.refresh().await;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Missed auth events, refreshing subscription");
                        state.refresh().await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Auth event channel closed");
        });
        SubscriptionListener { handle }
    }
}

/// Handle of a running auth-event listener.
#[derive(Debug)]
pub struct SubscriptionListener {
    handle: JoinHandle<()>,
}

impl SubscriptionListener {
    pub fn unsubscribe(self) {
        drop(self);
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for SubscriptionListener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Interpret the authority's status as one snapshot.
///
/// Fails when the status names an unknown tier or an unparseable
/// renewal date; the whole status is rejected rather than applied in part.
pub fn subscription_from_status(status: SubscriptionStatus) -> DreamforgeResult<Subscription> {
    if !status.subscribed {
        return Ok(Subscription::community());
    }

    let tier = status
        .tier
        .as_deref()
        .ok_or_else(|| DreamforgeError::validation("subscribed status without a tier"))?
        .parse::<SubscriptionTier>()?;

    let renews_at = status
        .renewal_date
        .as_deref()
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|e| {
                    DreamforgeError::validation(format!("invalid renewal date '{raw}': {e}"))
                })
        })
        .transpose()?;

    Ok(Subscription::new(tier, renews_at))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(subscribed: bool, tier: Option<&str>, renewal: Option<&str>) -> SubscriptionStatus {
        SubscriptionStatus {
            subscribed,
            tier: tier.map(Into::into),
            renewal_date: renewal.map(Into::into),
        }
    }

    #[test]
    fn unsubscribed_is_community() {
        let sub = subscription_from_status(status(false, Some("Studio"), None)).unwrap();
        assert_eq!(sub, Subscription::community());
    }

    #[test]
    fn subscribed_status_parses_tier_and_renewal() {
        let sub = subscription_from_status(status(
            true,
            Some("Pro"),
            Some("2026-11-01T00:00:00Z"),
        ))
        .unwrap();
        assert_eq!(sub.tier, SubscriptionTier::Pro);
        assert_eq!(
            sub.renews_at.unwrap().to_rfc3339(),
            "2026-11-01T00:00:00+00:00"
        );
    }

    #[test]
    fn unknown_tier_is_rejected() {
        assert!(subscription_from_status(status(true, Some("Platinum"), None)).is_err());
        assert!(subscription_from_status(status(true, None, None)).is_err());
    }

    #[test]
    fn bad_renewal_date_rejects_whole_status() {
        assert!(subscription_from_status(status(true, Some("Pro"), Some("next tuesday"))).is_err());
    }
}
