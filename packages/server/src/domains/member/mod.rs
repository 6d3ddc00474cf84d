//! Member domain - the binary sponsor tree
//!
//! Architecture:
//!   HTTP / CLI → actions (join, downline, ...) → store (MemberStore / MemberTx)

pub mod actions;
pub mod errors;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use errors::TreeError;
pub use models::{Member, MemberProfile, NewMember};
