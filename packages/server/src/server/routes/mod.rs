// HTTP routes
pub mod health;
pub mod members;

pub use health::*;
pub use members::*;
