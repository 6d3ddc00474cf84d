pub mod member;

pub use member::{Member, MemberProfile, NewMember};
