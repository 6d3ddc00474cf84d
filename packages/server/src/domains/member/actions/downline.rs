//! Downline traversal - breadth-first listing of one side's subtree

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::common::{MemberCode, Side};
use crate::domains::member::errors::TreeError;
use crate::domains::member::models::MemberProfile;
use crate::kernel::ServerDeps;

/// List every member below `code` on `side`, breadth-first with left before
/// right within a level.
///
/// An unknown member or an empty side yields an empty list. Reads committed
/// rows one at a time and takes no locks, so a concurrent join may or may not
/// be reflected.
pub async fn downline(
    code: MemberCode,
    side: Side,
    deps: &ServerDeps,
) -> Result<Vec<MemberProfile>, TreeError> {
    let Some(member) = deps.store.find_by_code(code).await? else {
        debug!(member_code = %code, "Downline requested for unknown member");
        return Ok(Vec::new());
    };
    let Some(start) = member.child(side) else {
        return Ok(Vec::new());
    };

    let mut queue = VecDeque::from([start]);
    let mut result = Vec::new();

    while let Some(next) = queue.pop_front() {
        let Some(node) = deps.store.find_by_code(next).await? else {
            warn!(member_code = %next, "Child pointer names a missing member; skipping");
            continue;
        };

        queue.extend(node.left_child);
        queue.extend(node.right_child);
        result.push(MemberProfile::from(node));
    }

    debug!(member_code = %code, side = %side, size = result.len(), "Loaded downline");
    Ok(result)
}
