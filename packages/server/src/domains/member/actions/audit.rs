//! Side-count audit - recompute every count from child pointers

use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::common::{MemberCode, Side};
use crate::domains::member::errors::TreeError;
use crate::kernel::ServerDeps;

/// A stored side-count that disagrees with the tree shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountDrift {
    pub member_code: MemberCode,
    pub side: Side,
    pub stored: i64,
    pub expected: i64,
}

/// Compare each member's stored counts against the size of its subtrees.
///
/// Relies on codes increasing from parent to child: walking codes in
/// descending order sees every child before its parent.
pub async fn audit_counts(deps: &ServerDeps) -> Result<Vec<CountDrift>, TreeError> {
    let members = deps.store.all_members().await?;

    // code -> members in the subtree rooted there (itself included)
    let mut subtree: HashMap<MemberCode, i64> = HashMap::with_capacity(members.len());
    let mut drift = Vec::new();

    let mut ordered: Vec<_> = members.iter().collect();
    ordered.sort_by_key(|m| std::cmp::Reverse(m.code));

    for member in ordered {
        let size_of = |child: Option<MemberCode>| {
            child
                .and_then(|c| subtree.get(&c).copied())
                .unwrap_or(0)
        };
        let expected_left = size_of(member.child(Side::Left));
        let expected_right = size_of(member.child(Side::Right));

        for (side, expected) in [(Side::Left, expected_left), (Side::Right, expected_right)] {
            let stored = member.count(side);
            if stored != expected {
                warn!(member_code = %member.code, side = %side, stored, expected, "Side count drift");
                drift.push(CountDrift {
                    member_code: member.code,
                    side,
                    stored,
                    expected,
                });
            }
        }

        subtree.insert(member.code, 1 + expected_left + expected_right);
    }

    drift.sort_by_key(|d| (d.member_code, d.side == Side::Right));
    info!(members = members.len(), drift = drift.len(), "Audited side counts");
    Ok(drift)
}
