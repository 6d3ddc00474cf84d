//! Member storage: point lookups, row locks and transactional writes.
//!
//! `MemberStore` is the process-wide handle (shared behind an `Arc`), and
//! `MemberTx` is one open transaction. Every tree mutation goes through a
//! `MemberTx`; dropping it without `commit` discards all of its writes.

use async_trait::async_trait;

use crate::common::{MemberCode, Side};
use crate::domains::member::models::{Member, NewMember};

pub mod memory;
pub mod postgres;

pub use memory::{FaultPoint, InMemoryMemberStore};
pub use postgres::PgMemberStore;

/// Unique index guarding `lower(members.email)`
pub const EMAIL_UNIQUE_CONSTRAINT: &str = "members_email_key";

/// Unique index allowing a single sponsor-less member
pub const SINGLE_ROOT_CONSTRAINT: &str = "members_single_root";

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("{side} slot of member {parent} is already occupied")]
    SlotOccupied { parent: MemberCode, side: Side },

    #[error("Member {0} is referenced but missing")]
    MissingMember(MemberCode),

    #[error("Timed out waiting for lock on member {0}")]
    LockTimeout(MemberCode),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return StoreError::UniqueViolation {
                    constraint: db.constraint().unwrap_or_default().to_string(),
                };
            }
        }
        StoreError::Database(err)
    }
}

/// Connection pool figures reported by the health check
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct PoolStats {
    pub size: u32,
    pub idle_connections: usize,
    pub max_connections: u32,
}

/// Shared storage handle (one per process)
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// Open a transaction
    async fn begin(&self) -> Result<Box<dyn MemberTx>, StoreError>;

    /// Committed row by code, no locking
    async fn find_by_code(&self, code: MemberCode) -> Result<Option<Member>, StoreError>;

    /// Committed row by email, no locking
    async fn find_by_email(&self, email: &str) -> Result<Option<Member>, StoreError>;

    /// Every committed member ordered by code
    async fn all_members(&self) -> Result<Vec<Member>, StoreError>;

    /// Cheap round trip used by the health check
    async fn ping(&self) -> Result<(), StoreError>;

    fn pool_stats(&self) -> Option<PoolStats> {
        None
    }
}

/// One open transaction against the member store
#[async_trait]
pub trait MemberTx: Send {
    /// Load a member and hold an exclusive row lock on it until the
    /// transaction ends. Returns `None` (and locks nothing) for unknown codes.
    async fn lock_member(&mut self, code: MemberCode) -> Result<Option<Member>, StoreError>;

    /// Load a member as seen by this transaction (own writes included)
    async fn find_by_code(&mut self, code: MemberCode) -> Result<Option<Member>, StoreError>;

    async fn find_by_email(&mut self, email: &str) -> Result<Option<Member>, StoreError>;

    /// The sponsor-less member, if one exists
    async fn find_root(&mut self) -> Result<Option<Member>, StoreError>;

    /// Insert a member with empty child slots and zero counts; returns the
    /// generated code
    async fn insert_member(&mut self, member: &NewMember) -> Result<MemberCode, StoreError>;

    /// Fill the parent's child slot on `side`. Fails with `SlotOccupied` if
    /// the slot already holds a member.
    async fn set_child(
        &mut self,
        parent: MemberCode,
        side: Side,
        child: MemberCode,
    ) -> Result<(), StoreError>;

    /// Add one to the member's side-count
    async fn increment_count(&mut self, code: MemberCode, side: Side) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
