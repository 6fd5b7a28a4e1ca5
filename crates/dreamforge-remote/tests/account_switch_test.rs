//! Auth events from the backend client drive the subscription listener.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dreamforge_access::{CreditBalance, CreditLedger, ResetPeriod, SubscriptionState};
use dreamforge_core::error::DreamforgeResult;
use dreamforge_core::gateway::SubscriptionAuthority;
use dreamforge_core::models::session::Session;
use dreamforge_core::models::subscription::SubscriptionStatus;
use dreamforge_core::models::tier::SubscriptionTier;
use dreamforge_remote::{SupabaseClient, SupabaseConfig};
use uuid::Uuid;

/// Resolves whichever token is currently adopted to a fixed account.
#[derive(Clone, Default)]
struct Accounts {
    active: Arc<Mutex<Option<String>>>,
    plans: Arc<Mutex<HashMap<String, (Uuid, Option<&'static str>)>>>,
}

impl Accounts {
    fn register(&self, token: &str, plan: Option<&'static str>) {
        self.plans
            .lock()
            .unwrap()
            .insert(token.into(), (Uuid::new_v4(), plan));
    }

    fn activate(&self, token: &str) {
        *self.active.lock().unwrap() = Some(token.into());
    }
}

impl SubscriptionAuthority for Accounts {
    async fn get_session(&self) -> DreamforgeResult<Option<Session>> {
        let active = self.active.lock().unwrap().clone();
        Ok(active.and_then(|token| {
            let (user_id, _) = *self.plans.lock().unwrap().get(&token)?;
            Some(Session {
                user_id,
                email: None,
                access_token: token,
                expires_at: None,
            })
        }))
    }

    async fn get_subscription_status(
        &self,
        access_token: &str,
    ) -> DreamforgeResult<SubscriptionStatus> {
        let plan = self
            .plans
            .lock()
            .unwrap()
            .get(access_token)
            .and_then(|(_, plan)| *plan);
        Ok(SubscriptionStatus {
            subscribed: plan.is_some(),
            tier: plan.map(Into::into),
            renewal_date: None,
        })
    }
}

async fn eventually(check: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

#[tokio::test]
async fn signing_in_as_another_user_drops_the_previous_plan() {
    let client = SupabaseClient::new(SupabaseConfig {
        url: "https://project.supabase.co".into(),
        anon_key: "anon".into(),
        ..Default::default()
    })
    .unwrap();
    let accounts = Accounts::default();
    accounts.register("studio-token", Some("Studio"));
    accounts.register("community-token", None);

    let ledger = Arc::new(CreditLedger::with_system_clock(
        SubscriptionTier::Community,
        ResetPeriod::Manual,
    ));
    let state = Arc::new(SubscriptionState::new(accounts.clone(), ledger));
    let _listener = state.listen(client.auth_events());

    accounts.activate("studio-token");
    client.sign_in_with_token("studio-token");
    assert!(eventually(|| state.tier() == SubscriptionTier::Studio).await);
    assert_eq!(state.ledger().balance(), CreditBalance::Unlimited);

    accounts.activate("community-token");
    client.sign_in_with_token("community-token");
    assert!(eventually(|| state.tier() == SubscriptionTier::Community).await);
    assert_eq!(state.ledger().balance(), CreditBalance::Finite(5));
}
