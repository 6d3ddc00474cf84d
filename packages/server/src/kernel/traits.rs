// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Storage lives with the member domain (domains::member::store).
//
// Naming convention: Base* for trait names (e.g., BaseCredentialHasher)

use anyhow::Result;

// =============================================================================
// Credential Hasher Trait (Infrastructure - one-way password hashing)
// =============================================================================

pub trait BaseCredentialHasher: Send + Sync {
    /// Hash a plaintext credential for storage
    fn hash(&self, password: &str) -> Result<String>;

    /// Check a plaintext credential against a stored hash. Unreadable hashes
    /// never verify.
    fn verify(&self, password: &str, hash: &str) -> bool;
}
