//! Server dependencies (using traits for testability)
//!
//! This module provides the central dependency container passed to every
//! member action. The store handle is created once at startup and shared.

use sqlx::PgPool;
use std::sync::Arc;

use crate::domains::member::store::{MemberStore, PgMemberStore};
use crate::kernel::{BaseCredentialHasher, BcryptCredentialHasher};

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to actions (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub store: Arc<dyn MemberStore>,
    pub hasher: Arc<dyn BaseCredentialHasher>,
}

impl ServerDeps {
    /// Create new ServerDeps with the given dependencies
    pub fn new(store: Arc<dyn MemberStore>, hasher: Arc<dyn BaseCredentialHasher>) -> Self {
        Self { store, hasher }
    }

    /// Production wiring: Postgres store and bcrypt hasher
    pub fn postgres(pool: PgPool, hash_cost: u32) -> Self {
        Self::new(
            Arc::new(PgMemberStore::new(pool)),
            Arc::new(BcryptCredentialHasher::new(hash_cost)),
        )
    }
}
