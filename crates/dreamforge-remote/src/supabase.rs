//! Supabase backend client: session lookup and edge functions.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use dreamforge_core::error::{DreamforgeResult, ExternalService};
use dreamforge_core::gateway::{CheckoutProvider, SubscriptionAuthority};
use dreamforge_core::models::session::{AuthEvent, Session};
use dreamforge_core::models::subscription::SubscriptionStatus;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SupabaseConfig;
use crate::error::RemoteError;

const AUTH_EVENT_CAPACITY: usize = 16;

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CheckSubscriptionResponse {
    #[serde(default)]
    subscribed: bool,
    subscription_tier: Option<String>,
    subscription_end: Option<String>,
}

impl From<CheckSubscriptionResponse> for SubscriptionStatus {
    fn from(resp: CheckSubscriptionResponse) -> Self {
        SubscriptionStatus {
            subscribed: resp.subscribed,
            tier: resp.subscription_tier,
            renewal_date: resp.subscription_end,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutBody<'a> {
    price_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct UrlResponse {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FunctionError {
    error: Option<String>,
    message: Option<String>,
}

fn function_error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<FunctionError>(body)
        .ok()
        .and_then(|e| e.error.or(e.message))
        .unwrap_or_else(|| format!("HTTP error! status: {status}"))
}

fn sign_in_event(previous: Option<&str>, next: &str) -> AuthEvent {
    match previous {
        Some(previous) if previous == next => AuthEvent::TokenRefreshed,
        _ => AuthEvent::SignedIn,
    }
}

fn session_from_user(user: UserResponse, access_token: String) -> Result<Session, RemoteError> {
    let user_id = Uuid::parse_str(&user.id)
        .map_err(|e| RemoteError::decode(ExternalService::Auth, format!("invalid user id: {e}")))?;
    Ok(Session {
        user_id,
        email: user.email,
        access_token,
        expires_at: None,
    })
}

fn redirect_url(resp: UrlResponse, service: ExternalService) -> Result<String, RemoteError> {
    resp.url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| RemoteError::decode(service, "response has no redirect url"))
}

/// Client for the backend project.
///
/// Clones share the signed-in token and the auth-event channel.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    config: SupabaseConfig,
    access_token: Arc<RwLock<Option<String>>>,
    events: broadcast::Sender<AuthEvent>,
}

impl SupabaseClient {
    pub fn new(config: SupabaseConfig) -> Result<Self, RemoteError> {
        if config.url.is_empty() {
            return Err(RemoteError::Config("Supabase project URL is not set".into()));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RemoteError::Config(e.to_string()))?;
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        let access_token = Arc::new(RwLock::new(config.access_token.clone()));
        Ok(Self {
            http,
            config,
            access_token,
            events,
        })
    }

    /// Auth state changes, starting from now.
    pub fn auth_events(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Adopt `access_token` as the signed-in session.
    ///
    /// A token that differs from the held one may belong to another
    /// account, so it is announced as a new sign-in. Re-adopting the same
    /// token is a refresh.
    pub fn sign_in_with_token(&self, access_token: impl Into<String>) {
        let access_token = access_token.into();
        let previous = self
            .access_token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(access_token.clone());
        let event = sign_in_event(previous.as_deref(), &access_token);
        info!(?event, "Auth state changed");
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    pub fn sign_out(&self) {
        let previous = self
            .access_token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            info!("Signed out");
            let _ = self.events.send(AuthEvent::SignedOut);
        }
    }

    fn token(&self) -> Option<String> {
        self.access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn function_url(&self, name: &str) -> String {
        format!("{}/functions/v1/{name}", self.config.url.trim_end_matches('/'))
    }

    async fn fetch_user(&self, access_token: &str) -> Result<Option<UserResponse>, RemoteError> {
        let service = ExternalService::Auth;
        let url = format!("{}/auth/v1/user", self.config.url.trim_end_matches('/'));

        let resp = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .header("apikey", &self.config.anon_key)
            .send()
            .await
            .map_err(RemoteError::request(service))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            debug!(status = status.as_u16(), "Access token rejected, treating as signed out");
            return Ok(None);
        }
        let text = resp.text().await.map_err(RemoteError::request(service))?;
        if !status.is_success() {
            return Err(RemoteError::Status {
                service,
                status: status.as_u16(),
                message: function_error_message(status.as_u16(), &text),
            });
        }

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| RemoteError::decode(service, format!("invalid user payload: {e}")))
    }

    /// POST to an edge function with the user's bearer token.
    async fn invoke<B, T>(
        &self,
        service: ExternalService,
        name: &str,
        access_token: &str,
        body: &B,
    ) -> Result<T, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(function = name, "Invoking edge function");
        let resp = self
            .http
            .post(self.function_url(name))
            .bearer_auth(access_token)
            .header("apikey", &self.config.anon_key)
            .json(body)
            .send()
            .await
            .map_err(RemoteError::request(service))?;

        let status = resp.status();
        let text = resp.text().await.map_err(RemoteError::request(service))?;
        if !status.is_success() {
            let message = function_error_message(status.as_u16(), &text);
            warn!(function = name, status = status.as_u16(), %message, "Edge function failed");
            return Err(RemoteError::Status {
                service,
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| RemoteError::decode(service, format!("invalid {name} payload: {e}")))
    }
}

impl SubscriptionAuthority for SupabaseClient {
    async fn get_session(&self) -> DreamforgeResult<Option<Session>> {
        let Some(access_token) = self.token() else {
            return Ok(None);
        };
        let Some(user) = self.fetch_user(&access_token).await? else {
            return Ok(None);
        };
        Ok(Some(session_from_user(user, access_token)?))
    }

    async fn get_subscription_status(
        &self,
        access_token: &str,
    ) -> DreamforgeResult<SubscriptionStatus> {
        let resp: CheckSubscriptionResponse = self
            .invoke(
                ExternalService::Auth,
                "check-subscription",
                access_token,
                &serde_json::json!({}),
            )
            .await?;
        Ok(resp.into())
    }
}

impl CheckoutProvider for SupabaseClient {
    async fn checkout_url(&self, access_token: &str, price_id: &str) -> DreamforgeResult<String> {
        let service = ExternalService::Payment;
        let resp: UrlResponse = self
            .invoke(service, "create-checkout", access_token, &CheckoutBody { price_id })
            .await?;
        Ok(redirect_url(resp, service)?)
    }

    async fn customer_portal_url(&self, access_token: &str) -> DreamforgeResult<String> {
        let service = ExternalService::Payment;
        let resp: UrlResponse = self
            .invoke(service, "customer-portal", access_token, &serde_json::json!({}))
            .await?;
        Ok(redirect_url(resp, service)?)
    }
}
