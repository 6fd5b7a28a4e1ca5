//! DreamForge Access: Subscription state, credit metering, feature
//! gating, and the generation flow built on them.
//!
//! One [`SubscriptionState`] owns the current plan and its
//! [`CreditLedger`]; services receive a [`FeatureGate`] and the ledger
//! explicitly instead of reaching for globals.

pub mod billing;
pub mod clock;
pub mod config;
pub mod error;
pub mod gallery;
pub mod gate;
pub mod generation;
pub mod ledger;
pub mod subscription;

pub use billing::{BillingService, PlanOffer, plan_catalogue};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AccessConfig, CreditCost, ResetPeriod};
pub use error::AccessError;
pub use gallery::GalleryService;
pub use gate::{Denial, FeatureGate, denial};
pub use generation::{GenerationOutcome, GenerationService, validate_request};
pub use ledger::{CreditBalance, CreditLedger, Debit};
pub use subscription::{SubscriptionListener, SubscriptionState, subscription_from_status};
