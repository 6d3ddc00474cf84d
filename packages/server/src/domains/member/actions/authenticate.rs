//! Credential check for login

use tracing::{debug, info};

use crate::domains::member::errors::TreeError;
use crate::domains::member::models::MemberProfile;
use crate::kernel::ServerDeps;

/// Verify `password` for the member registered under `email`.
///
/// Unknown email and wrong password fail identically so callers cannot tell
/// which one was wrong.
pub async fn authenticate(
    email: &str,
    password: &str,
    deps: &ServerDeps,
) -> Result<MemberProfile, TreeError> {
    let Some(member) = deps.store.find_by_email(email).await? else {
        debug!("Login for unregistered email");
        return Err(TreeError::AuthenticationFailed);
    };

    if !deps.hasher.verify(password, &member.password_hash) {
        debug!(member_code = %member.code, "Login with wrong credential");
        return Err(TreeError::AuthenticationFailed);
    }

    info!(member_code = %member.code, "Member authenticated");
    Ok(MemberProfile::from(member))
}
