use crate::common::MemberCode;
use crate::domains::member::errors::TreeError;
use crate::domains::member::models::MemberProfile;
use crate::kernel::ServerDeps;

/// Fetch one member's public profile
pub async fn get_profile(code: MemberCode, deps: &ServerDeps) -> Result<MemberProfile, TreeError> {
    deps.store
        .find_by_code(code)
        .await?
        .map(MemberProfile::from)
        .ok_or(TreeError::NotFound)
}
