use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::common::{MemberCode, Side};

/// Member model - one node of the binary sponsor tree
///
/// `sponsor_code` is both the referrer and the structural parent: after
/// spillover the new member is recorded under the member it was actually
/// attached to.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct Member {
    #[sqlx(rename = "member_code")]
    pub code: MemberCode,
    pub name: String,
    pub email: String,
    pub mobile: Option<String>,
    pub password_hash: String,

    // Tree links
    pub sponsor_code: Option<MemberCode>,
    pub left_child: Option<MemberCode>,
    pub right_child: Option<MemberCode>,

    // Descendant totals per side
    pub left_count: i64,
    pub right_count: i64,

    pub created_at: DateTime<Utc>,
}

impl Member {
    /// Child pointer on the given side
    pub fn child(&self, side: Side) -> Option<MemberCode> {
        match side {
            Side::Left => self.left_child,
            Side::Right => self.right_child,
        }
    }

    /// Descendant count on the given side
    pub fn count(&self, side: Side) -> i64 {
        match side {
            Side::Left => self.left_count,
            Side::Right => self.right_count,
        }
    }

    /// Which side of this member `child` hangs from, if any
    pub fn side_of(&self, child: MemberCode) -> Option<Side> {
        if self.left_child == Some(child) {
            Some(Side::Left)
        } else if self.right_child == Some(child) {
            Some(Side::Right)
        } else {
            None
        }
    }

    /// Emails identify members case-insensitively
    pub fn has_email(&self, email: &str) -> bool {
        self.email.trim().to_lowercase() == email.trim().to_lowercase()
    }

    pub fn is_root(&self) -> bool {
        self.sponsor_code.is_none()
    }

    /// Public projection with the credential stripped
    pub fn profile(&self) -> MemberProfile {
        MemberProfile::from(self.clone())
    }
}

/// Member as returned to callers (no credential)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberProfile {
    pub member_code: MemberCode,
    pub name: String,
    pub email: String,
    pub mobile: Option<String>,
    pub sponsor_code: Option<MemberCode>,
    pub left_child: Option<MemberCode>,
    pub right_child: Option<MemberCode>,
    pub left_count: i64,
    pub right_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Member> for MemberProfile {
    fn from(member: Member) -> Self {
        Self {
            member_code: member.code,
            name: member.name,
            email: member.email,
            mobile: member.mobile,
            sponsor_code: member.sponsor_code,
            left_child: member.left_child,
            right_child: member.right_child,
            left_count: member.left_count,
            right_count: member.right_count,
            created_at: member.created_at,
        }
    }
}

/// Row to insert; the store assigns the code and zeroes links and counts
#[derive(Debug, Clone)]
pub struct NewMember {
    pub name: String,
    pub email: String,
    pub mobile: Option<String>,
    pub password_hash: String,
    pub sponsor_code: Option<MemberCode>,
}

impl NewMember {
    /// Materialize the row as the store will hold it right after insert
    pub fn into_member(self, code: MemberCode, created_at: DateTime<Utc>) -> Member {
        Member {
            code,
            name: self.name,
            email: self.email,
            mobile: self.mobile,
            password_hash: self.password_hash,
            sponsor_code: self.sponsor_code,
            left_child: None,
            right_child: None,
            left_count: 0,
            right_count: 0,
            created_at,
        }
    }
}
