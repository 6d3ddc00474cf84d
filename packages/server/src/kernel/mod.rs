//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod hasher;
pub mod test_dependencies;
pub mod traits;

pub use deps::ServerDeps;
pub use hasher::{BcryptCredentialHasher, DEFAULT_HASH_COST};
pub use test_dependencies::TestDependencies;
pub use traits::*;
