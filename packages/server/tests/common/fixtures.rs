//! Test fixtures for creating test data.
//!
//! These fixtures call the member actions directly.

use downline_core::common::{MemberCode, Side};
use downline_core::domains::member::actions::{join, JoinRequest, NewRoot};
use downline_core::domains::member::TreeError;
use downline_core::kernel::ServerDeps;

pub const TEST_PASSWORD: &str = "correct horse battery staple";

/// Root member used by every harness
pub fn root_member() -> NewRoot {
    NewRoot {
        name: "Root".to_string(),
        email: "root@example.com".to_string(),
        mobile: Some("555-0000".to_string()),
        password: TEST_PASSWORD.to_string(),
    }
}

/// Join request with the email derived from `label`
pub fn join_request(label: &str, sponsor: MemberCode, side: Side) -> JoinRequest {
    JoinRequest::builder()
        .name(format!("Member {}", label))
        .email(format!("{}@example.com", label))
        .sponsor_code(sponsor)
        .side(side)
        .password(TEST_PASSWORD)
        .build()
}

/// Join and panic on failure
pub async fn join_ok(
    deps: &ServerDeps,
    label: &str,
    sponsor: MemberCode,
    side: Side,
) -> MemberCode {
    join(join_request(label, sponsor, side), deps)
        .await
        .unwrap_or_else(|e| panic!("join of {} failed: {}", label, e))
}

/// Join and return the error (panics if the join succeeded)
pub async fn join_err(
    deps: &ServerDeps,
    label: &str,
    sponsor: MemberCode,
    side: Side,
) -> TreeError {
    match join(join_request(label, sponsor, side), deps).await {
        Ok(code) => panic!("join of {} unexpectedly succeeded as {}", label, code),
        Err(e) => e,
    }
}
