//! Counting stub collaborators shared by the access integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dreamforge_core::error::{DreamforgeError, DreamforgeResult, ExternalService};
use dreamforge_core::gateway::{CheckoutProvider, ImageGenerator, SubscriptionAuthority};
use dreamforge_core::models::creation::{CreateCreation, Creation, CreationQuery, UpdateCreation};
use dreamforge_core::models::generation::{GeneratedImage, ProviderRequest};
use dreamforge_core::models::session::Session;
use dreamforge_core::models::subscription::SubscriptionStatus;
use dreamforge_core::repository::CreationRepository;
use dreamforge_db::repository::SurrealCreationRepository;
use surrealdb::engine::local::Db;
use uuid::Uuid;

/// Helper: spin up in-memory DB and run migrations.
pub async fn creation_store() -> SurrealCreationRepository<Db> {
    dreamforge_db::open_in_memory("test").await.unwrap()
}

pub fn session_for(user_id: Uuid) -> Session {
    Session {
        user_id,
        email: Some("artist@example.com".into()),
        access_token: format!("token-{user_id}"),
        expires_at: None,
    }
}

pub fn subscribed(tier: &str, renewal: Option<&str>) -> SubscriptionStatus {
    SubscriptionStatus {
        subscribed: true,
        tier: Some(tier.into()),
        renewal_date: renewal.map(Into::into),
    }
}

// -----------------------------------------------------------------------
// Subscription authority
// -----------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum StatusReply {
    Status(SubscriptionStatus),
    Unavailable,
}

#[derive(Default)]
struct AuthorityInner {
    session: Mutex<Option<Session>>,
    /// Scripted replies, consumed in order; `fallback` once empty.
    script: Mutex<VecDeque<(Duration, StatusReply)>>,
    fallback: Mutex<Option<StatusReply>>,
    session_calls: AtomicUsize,
    status_calls: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct StubAuthority {
    inner: Arc<AuthorityInner>,
}

impl StubAuthority {
    pub fn signed_in(user_id: Uuid) -> Self {
        let stub = Self::default();
        stub.set_session(Some(session_for(user_id)));
        stub
    }

    pub fn set_session(&self, session: Option<Session>) {
        *self.inner.session.lock().unwrap() = session;
    }

    /// Reply used whenever the script is empty.
    pub fn always(&self, reply: StatusReply) {
        *self.inner.fallback.lock().unwrap() = Some(reply);
    }

    /// Queue one reply, delivered after `delay`.
    pub fn then(&self, delay: Duration, reply: StatusReply) {
        self.inner.script.lock().unwrap().push_back((delay, reply));
    }

    pub fn session_calls(&self) -> usize {
        self.inner.session_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.inner.status_calls.load(Ordering::SeqCst)
    }
}

impl SubscriptionAuthority for StubAuthority {
    async fn get_session(&self) -> DreamforgeResult<Option<Session>> {
        self.inner.session_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.inner.session.lock().unwrap().clone())
    }

    async fn get_subscription_status(
        &self,
        _access_token: &str,
    ) -> DreamforgeResult<SubscriptionStatus> {
        self.inner.status_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.inner.script.lock().unwrap().pop_front();
        let (delay, reply) = match scripted {
            Some(step) => step,
            None => (
                Duration::ZERO,
                self.inner
                    .fallback
                    .lock()
                    .unwrap()
                    .clone()
                    .unwrap_or(StatusReply::Unavailable),
            ),
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match reply {
            StatusReply::Status(status) => Ok(status),
            StatusReply::Unavailable => Err(DreamforgeError::external(
                ExternalService::Auth,
                Some(503),
                "subscription check unavailable",
            )),
        }
    }
}

// -----------------------------------------------------------------------
// Image generator
// -----------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub enum GeneratorReply {
    /// One image per requested sample.
    Images,
    Empty,
    Fail,
}

struct GeneratorInner {
    reply: Mutex<GeneratorReply>,
    calls: AtomicUsize,
    last_request: Mutex<Option<ProviderRequest>>,
}

#[derive(Clone)]
pub struct StubGenerator {
    inner: Arc<GeneratorInner>,
}

impl StubGenerator {
    pub fn new(reply: GeneratorReply) -> Self {
        Self {
            inner: Arc::new(GeneratorInner {
                reply: Mutex::new(reply),
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }),
        }
    }

    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.inner.last_request.lock().unwrap().clone()
    }
}

impl ImageGenerator for StubGenerator {
    async fn generate(&self, request: ProviderRequest) -> DreamforgeResult<Vec<GeneratedImage>> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        let samples = request.sample_count;
        *self.inner.last_request.lock().unwrap() = Some(request);
        match *self.inner.reply.lock().unwrap() {
            GeneratorReply::Images => Ok((0..samples)
                .map(|index| GeneratedImage {
                    index,
                    image_data: format!("aW1hZ2Ut{index}"),
                })
                .collect()),
            GeneratorReply::Empty => Ok(Vec::new()),
            GeneratorReply::Fail => Err(DreamforgeError::external(
                ExternalService::Generation,
                Some(500),
                "HTTP error! status: 500",
            )),
        }
    }
}

// -----------------------------------------------------------------------
// Creation store that fails after a number of successful saves
// -----------------------------------------------------------------------

#[derive(Clone)]
pub struct FlakyStore {
    inner: SurrealCreationRepository<Db>,
    saves_before_failure: usize,
    saves: Arc<AtomicUsize>,
    deletes: Arc<AtomicUsize>,
}

impl FlakyStore {
    pub fn new(inner: SurrealCreationRepository<Db>, saves_before_failure: usize) -> Self {
        Self {
            inner,
            saves_before_failure,
            saves: Arc::new(AtomicUsize::new(0)),
            deletes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

impl CreationRepository for FlakyStore {
    async fn create(&self, input: CreateCreation) -> DreamforgeResult<Creation> {
        let attempt = self.saves.fetch_add(1, Ordering::SeqCst);
        if attempt >= self.saves_before_failure {
            return Err(DreamforgeError::external(
                ExternalService::Storage,
                None,
                "write timed out",
            ));
        }
        self.inner.create(input).await
    }

    async fn get_by_id(&self, id: Uuid) -> DreamforgeResult<Creation> {
        self.inner.get_by_id(id).await
    }

    async fn update(&self, id: Uuid, input: UpdateCreation) -> DreamforgeResult<Creation> {
        self.inner.update(id, input).await
    }

    async fn delete(&self, id: Uuid) -> DreamforgeResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(id).await
    }

    async fn query(&self, query: CreationQuery) -> DreamforgeResult<Vec<Creation>> {
        self.inner.query(query).await
    }

    async fn record_like(&self, creation_id: Uuid, user_id: Uuid) -> DreamforgeResult<Creation> {
        self.inner.record_like(creation_id, user_id).await
    }
}

// -----------------------------------------------------------------------
// Checkout provider
// -----------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct StubCheckout {
    price_ids: Arc<Mutex<Vec<String>>>,
    portal_calls: Arc<AtomicUsize>,
}

impl StubCheckout {
    pub fn requested_prices(&self) -> Vec<String> {
        self.price_ids.lock().unwrap().clone()
    }

    pub fn portal_calls(&self) -> usize {
        self.portal_calls.load(Ordering::SeqCst)
    }
}

impl CheckoutProvider for StubCheckout {
    async fn checkout_url(&self, _access_token: &str, price_id: &str) -> DreamforgeResult<String> {
        self.price_ids.lock().unwrap().push(price_id.to_string());
        Ok(format!("https://checkout.example.com/{price_id}"))
    }

    async fn customer_portal_url(&self, _access_token: &str) -> DreamforgeResult<String> {
        self.portal_calls.fetch_add(1, Ordering::SeqCst);
        Ok("https://billing.example.com/portal".into())
    }
}
