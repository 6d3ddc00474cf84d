//! Ancestor side-count maintenance

use tracing::{debug, warn};

use crate::common::MemberCode;
use crate::domains::member::errors::TreeError;
use crate::domains::member::store::MemberTx;

/// Walk from `parent` to the root, adding one to the side-count of every
/// ancestor on the side that leads down to `new_code`.
///
/// The new member must already be linked into `parent`. Returns how many
/// ancestors were updated.
///
/// A missing ancestor ends the walk early without failing the join; a
/// warning is logged so the truncation is visible.
pub async fn propagate_counts(
    tx: &mut dyn MemberTx,
    new_code: MemberCode,
    parent: MemberCode,
) -> Result<u32, TreeError> {
    let mut child = new_code;
    let mut ancestor = Some(parent);
    let mut updated = 0u32;

    while let Some(code) = ancestor {
        let Some(member) = tx.find_by_code(code).await? else {
            warn!(
                new_member = %new_code,
                missing_ancestor = %code,
                updated,
                "ancestor missing during count propagation; stopping walk"
            );
            break;
        };

        if let Some(side) = member.side_of(child) {
            tx.increment_count(member.code, side).await?;
            updated += 1;
        }

        child = member.code;
        ancestor = member.sponsor_code;
    }

    debug!(new_member = %new_code, updated, "propagated side counts");
    Ok(updated)
}
