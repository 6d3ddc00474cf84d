//! Member domain actions - business logic functions
//!
//! Actions are async functions called directly from HTTP handlers and the
//! CLI. They take `&ServerDeps` and return typed `TreeError`s.

mod audit;
mod authenticate;
mod counts;
mod downline;
mod join;
mod placement;
mod profile;
mod seed_root;

pub use audit::{audit_counts, CountDrift};
pub use authenticate::authenticate;
pub use counts::propagate_counts;
pub use downline::downline;
pub use join::{join, JoinRequest};
pub use placement::{find_slot, Slot};
pub use profile::get_profile;
pub use seed_root::{seed_root, NewRoot};
