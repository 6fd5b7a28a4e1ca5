//! Session domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated session with the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: Option<String>,
    /// Bearer token presented to backend functions.
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Authentication state change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

impl AuthEvent {
    /// Whether the event can change the user's plan.
    pub fn affects_subscription(&self) -> bool {
        matches!(self, AuthEvent::SignedIn | AuthEvent::SignedOut)
    }
}
