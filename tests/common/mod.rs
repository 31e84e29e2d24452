#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use charity_invites::{
    db::{InvitationStore, MemoryStore, UserStore},
    models::{Invitation, User},
    money::Money,
    service::{
        auth::jwt::TokenKeys,
        crypto,
        notify::{Mailer, Notifier, NotifyError, OutgoingEmail},
        payment::{PaymentError, PaymentGateway},
    },
    AppState,
};

pub const SECRET: &str = "integration-test-secret";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Approve,
    Decline,
    Hang,
}

/// Payment gateway whose answer is chosen by the test.
pub struct ScriptedGateway {
    behavior: Mutex<Behavior>,
    pub calls: AtomicUsize,
    pub charged: Mutex<Vec<(Money, String, String)>>,
}

impl ScriptedGateway {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            calls: AtomicUsize::new(0),
            charged: Mutex::new(Vec::new()),
        }
    }

    pub fn set(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn charge(&self, amount: Money, currency: &str, payment_method: &str) -> Result<String, PaymentError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = *self.behavior.lock().unwrap();
        match behavior {
            Behavior::Approve => {
                self.charged
                    .lock()
                    .unwrap()
                    .push((amount, currency.to_string(), payment_method.to_string()));
                Ok(format!("pi_test_{n}"))
            }
            Behavior::Decline => Err(PaymentError::Declined("Your card was declined.".to_string())),
            Behavior::Hang => {
                futures::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

/// Keeps every message instead of sending it; can be told to fail.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self { sent: Mutex::new(Vec::new()), fail: true }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, NotifyError> {
        if self.fail {
            return Err(NotifyError::Unreachable("connection refused".to_string()));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(email.clone());
        Ok(format!("email_{}", sent.len()))
    }
}

pub struct Harness {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<ScriptedGateway>,
    pub mailer: Arc<RecordingMailer>,
}

impl Harness {
    /// Stores a user directly and returns it with a valid bearer token.
    pub async fn user(&self, name: &str, email: &str) -> (User, String) {
        let user = self
            .store
            .create_user(User {
                id: uuid::Uuid::new_v4(),
                name: name.to_string(),
                email: email.to_string(),
                pwd_hash: crypto::hash_password("password1"),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        let token = self.state.tokens.issue(user.id, &user.name).unwrap();
        (user, token)
    }

    pub async fn invitation(&self, owner: uuid::Uuid, target_cents: i64) -> Invitation {
        let start = Utc::now() + ChronoDuration::days(10);
        self.store
            .create_invitation(Invitation {
                id: uuid::Uuid::new_v4(),
                child_name: "Mia".to_string(),
                event_date: start,
                event_end_time: start + ChronoDuration::hours(2),
                event_location: "Riverside Park".to_string(),
                charity_name: "Save the Bees".to_string(),
                gift_fund_target: Money::from_cents(target_cents),
                current_gift_fund: Money::ZERO,
                created_by: owner,
                created_at: Utc::now(),
                rsvps: Vec::new(),
            })
            .await
            .unwrap()
    }

    pub async fn total(&self, invitation: uuid::Uuid) -> Money {
        self.store.get_invitation(invitation).await.unwrap().unwrap().current_gift_fund
    }
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

pub fn harness_with(behavior: Behavior, mailer: RecordingMailer) -> Harness {
    let store = Arc::new(MemoryStore::default());
    let gateway = Arc::new(ScriptedGateway::new(behavior));
    let mailer = Arc::new(mailer);
    let state = AppState {
        store: store.clone(),
        payments: gateway.clone(),
        notifier: Notifier::new(mailer.clone(), "party@example.com", "https://party.example"),
        tokens: Arc::new(TokenKeys::new(SECRET)),
        currency: "usd".to_string(),
        payment_timeout: Duration::from_millis(200),
    };
    Harness { state, store, gateway, mailer }
}

pub fn harness() -> Harness {
    harness_with(Behavior::Approve, RecordingMailer::default())
}

/// Builds the service under test from a [`Harness`] state.
#[macro_export]
macro_rules! test_app {
    ($state:expr) => {{
        let state: charity_invites::AppState = $state.clone();
        let tokens = state.tokens.clone();
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(state))
                .configure(|cfg| charity_invites::routes(cfg, tokens)),
        )
        .await
    }};
}
