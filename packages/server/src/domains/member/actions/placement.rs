//! Spillover placement - find the next open slot along one side's spine

use tracing::debug;

use crate::common::{MemberCode, Side};
use crate::domains::member::errors::TreeError;
use crate::domains::member::store::{MemberTx, StoreError};

/// Where a new member will be attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// Member whose child pointer will be filled
    pub parent: MemberCode,
    pub side: Side,
    /// Hops walked below the sponsor (0 when the sponsor's own slot is free)
    pub depth: u32,
}

/// Find the first empty `side` slot at or below `sponsor`.
///
/// Follows the `side` child pointer from the sponsor until it is empty. The
/// walk never switches sides, so repeated joins with the same sponsor and
/// side extend a single chain downward.
///
/// Returns `InvalidSponsor` if the sponsor does not exist. A child pointer
/// that names a missing member is a storage inconsistency.
pub async fn find_slot(
    tx: &mut dyn MemberTx,
    sponsor: MemberCode,
    side: Side,
) -> Result<Slot, TreeError> {
    let mut current = tx
        .find_by_code(sponsor)
        .await?
        .ok_or(TreeError::InvalidSponsor)?;
    let mut depth = 0u32;

    while let Some(next) = current.child(side) {
        current = tx
            .find_by_code(next)
            .await?
            .ok_or(StoreError::MissingMember(next))?;
        depth += 1;
    }

    debug!(
        sponsor = %sponsor,
        parent = %current.code,
        side = %side,
        depth,
        "resolved placement slot"
    );

    Ok(Slot {
        parent: current.code,
        side,
        depth,
    })
}
