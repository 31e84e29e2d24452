pub mod donation;
pub mod invitation;
pub mod memory;
pub mod user;

use std::sync::Arc;

use async_trait::async_trait;
use derive_more::Display;
use log::{info, warn};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::{
    models::{Donation, Invitation, RsvpEntry, User},
    PGPool,
};

pub use memory::MemoryStore;

/// Storage URL that selects the in-process backend instead of Postgres.
pub const MEMORY_URL: &str = "memory://";

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[display(fmt = "{} not found", _0)]
    NotFound(&'static str),

    #[display(fmt = "{}", _0)]
    Conflict(String),

    #[display(fmt = "storage backend error: {}", _0)]
    Backend(String),
}

impl std::error::Error for StoreError {}

/// Unique constraint on `users.email`, as named by Postgres for the schema in `migrations/`.
pub const USERS_EMAIL_CONSTRAINT: &str = "users_email_key";

/// Only a duplicate email is a caller error; any other unique violation is a backend fault.
fn unique_violation(constraint: Option<&str>, message: &str) -> StoreError {
    match constraint {
        Some(USERS_EMAIL_CONSTRAINT) => StoreError::Conflict("User already exists".to_string()),
        _ => StoreError::Backend(message.to_string()),
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("record"),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                unique_violation(db_err.constraint(), db_err.message())
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`StoreError::Conflict`] when the email is taken.
    async fn create_user(&self, user: User) -> Result<User, StoreError>;
    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait InvitationStore: Send + Sync {
    async fn create_invitation(&self, invitation: Invitation) -> Result<Invitation, StoreError>;
    async fn get_invitation(&self, id: Uuid) -> Result<Option<Invitation>, StoreError>;
    async fn list_invitations_by_owner(&self, owner: Uuid) -> Result<Vec<Invitation>, StoreError>;
    /// Appends to the RSVP list and returns the updated invitation.
    async fn append_rsvp(&self, id: Uuid, entry: RsvpEntry) -> Result<Invitation, StoreError>;
}

#[async_trait]
pub trait DonationStore: Send + Sync {
    /// Persists `donation` and adds its gift-fund share to the invitation's
    /// running total as one atomic unit. Nothing is written when the
    /// invitation does not exist.
    async fn insert_and_credit(&self, donation: Donation) -> Result<Donation, StoreError>;
    /// Insertion order.
    async fn list_donations(&self, invitation_id: Uuid) -> Result<Vec<Donation>, StoreError>;
}

#[async_trait]
pub trait Store: UserStore + InvitationStore + DonationStore {
    /// Releases connections on shutdown.
    async fn close(&self);
}

/// Postgres-backed store. Queries live next to each table's module.
#[derive(Clone)]
pub struct PgStore {
    pub pool: PGPool,
}

#[async_trait]
impl Store for PgStore {
    async fn close(&self) {
        info!("closing postgresql pool");
        self.pool.close().await;
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn close(&self) {}
}

pub async fn init_db_pool(db_url: &str, max_connections: u32) -> Result<PGPool, sqlx::Error> {
    let pool: PGPool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(db_url)
        .await?;
    info!("{}", "Connect with postgresql".to_string());
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("database migrations applied");
    Ok(pool)
}

/// Opens the backend named by `db_url`.
pub async fn connect(db_url: &str, max_connections: u32) -> Result<Arc<dyn Store>, StoreError> {
    if db_url == MEMORY_URL {
        warn!("using in-memory storage, data is lost on restart");
        return Ok(Arc::new(MemoryStore::default()));
    }
    let pool = init_db_pool(db_url, max_connections)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;
    Ok(Arc::new(PgStore { pool }))
}
