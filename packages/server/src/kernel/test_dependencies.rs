// TestDependencies - in-memory implementations for testing
//
// Provides a ServerDeps backed by the in-memory member store and a
// minimum-cost hasher, so actions and routes can be exercised without Postgres.

use std::sync::Arc;

use super::{BcryptCredentialHasher, ServerDeps};
use crate::domains::member::store::InMemoryMemberStore;

/// Lowest bcrypt cost, keeps tests fast
const TEST_HASH_COST: u32 = 4;

/// Test dependencies that can be configured per test
pub struct TestDependencies {
    pub store: InMemoryMemberStore,
    pub hasher: BcryptCredentialHasher,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            store: InMemoryMemberStore::new(),
            hasher: BcryptCredentialHasher::new(TEST_HASH_COST),
        }
    }

    /// Use a preconfigured store (e.g. with a short lock timeout)
    pub fn with_store(mut self, store: InMemoryMemberStore) -> Self {
        self.store = store;
        self
    }

    /// Convert to ServerDeps. Clones of `store` taken beforehand see the same rows.
    pub fn into_server_deps(self) -> ServerDeps {
        ServerDeps::new(Arc::new(self.store), Arc::new(self.hasher))
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
