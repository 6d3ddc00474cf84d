//! Join action - attach a new member beneath a sponsor in one transaction

use std::fmt;

use tracing::{error, info, warn};
use typed_builder::TypedBuilder;

use super::counts::propagate_counts;
use super::placement::find_slot;
use crate::common::{MemberCode, Side};
use crate::domains::member::errors::TreeError;
use crate::domains::member::models::NewMember;
use crate::domains::member::store::MemberTx;
use crate::kernel::ServerDeps;

/// Input for [`join`]
#[derive(Clone, TypedBuilder)]
pub struct JoinRequest {
    #[builder(setter(into))]
    pub name: String,
    #[builder(setter(into))]
    pub email: String,
    #[builder(default, setter(strip_option, into))]
    pub mobile: Option<String>,
    pub sponsor_code: MemberCode,
    pub side: Side,
    #[builder(setter(into))]
    pub password: String,
}

impl fmt::Debug for JoinRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("mobile", &self.mobile)
            .field("sponsor_code", &self.sponsor_code)
            .field("side", &self.side)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Join a new member to the tree.
///
/// Runs as a single transaction:
/// 1. Lock the sponsor row (`InvalidSponsor` if it does not exist)
/// 2. Resolve the attachment slot, spilling down the requested side
/// 3. Reject a registered email (`DuplicateEmail`)
/// 4. Insert the member under the resolved parent
/// 5. Fill the parent's child slot
/// 6. Increment side-counts on every ancestor
///
/// Any failure rolls the whole transaction back.
///
/// Only the sponsor row is locked up front. Joins naming different sponsors
/// can race for the same slot when their spillover walks converge; the loser
/// fails with a storage error (`SlotOccupied`) and leaves no partial state.
pub async fn join(request: JoinRequest, deps: &ServerDeps) -> Result<MemberCode, TreeError> {
    info!(
        sponsor = %request.sponsor_code,
        side = %request.side,
        email = %request.email,
        "Joining member"
    );

    let result = run_join(&request, deps).await;

    match &result {
        Ok(code) => info!(member_code = %code, sponsor = %request.sponsor_code, "Member joined"),
        Err(err @ (TreeError::Storage(_) | TreeError::Hashing(_))) => {
            error!(error = %err, sponsor = %request.sponsor_code, "Join failed")
        }
        Err(other) => warn!(reason = %other, sponsor = %request.sponsor_code, "Join rejected"),
    }
    result
}

/// Begin, place, then commit; rolls back if placement fails. Commit-time
/// conflicts (e.g. an email committed concurrently) come back as errors too.
async fn run_join(request: &JoinRequest, deps: &ServerDeps) -> Result<MemberCode, TreeError> {
    let mut tx = deps.store.begin().await?;

    match place_member(tx.as_mut(), request, deps).await {
        Ok(code) => {
            tx.commit().await?;
            Ok(code)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                error!(error = %rollback_err, "Rollback failed after join error");
            }
            Err(err)
        }
    }
}

async fn place_member(
    tx: &mut dyn MemberTx,
    request: &JoinRequest,
    deps: &ServerDeps,
) -> Result<MemberCode, TreeError> {
    let sponsor = tx
        .lock_member(request.sponsor_code)
        .await?
        .ok_or(TreeError::InvalidSponsor)?;

    let slot = find_slot(&mut *tx, sponsor.code, request.side).await?;

    let email = request.email.trim();
    if tx.find_by_email(email).await?.is_some() {
        return Err(TreeError::DuplicateEmail);
    }

    let password_hash = deps
        .hasher
        .hash(&request.password)
        .map_err(|e| TreeError::Hashing(e.to_string()))?;
    let code = tx
        .insert_member(&NewMember {
            name: request.name.clone(),
            email: email.to_string(),
            mobile: request.mobile.clone(),
            password_hash,
            sponsor_code: Some(slot.parent),
        })
        .await?;

    tx.set_child(slot.parent, slot.side, code).await?;

    propagate_counts(&mut *tx, code, slot.parent).await?;

    Ok(code)
}
