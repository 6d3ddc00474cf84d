// Binary Sponsor Tree - API Core
//
// This crate maintains a binary tree of members: each join is placed beneath
// a sponsor on a chosen side, spilling down that side when it is occupied,
// and every ancestor tracks how many members sit on each side below it.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
