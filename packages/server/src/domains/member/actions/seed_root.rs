//! Root seeding - create the single sponsor-less member

use tracing::{error, info};

use crate::common::MemberCode;
use crate::domains::member::errors::TreeError;
use crate::domains::member::models::NewMember;
use crate::domains::member::store::MemberTx;
use crate::kernel::ServerDeps;

/// Input for [`seed_root`]
#[derive(Clone)]
pub struct NewRoot {
    pub name: String,
    pub email: String,
    pub mobile: Option<String>,
    pub password: String,
}

/// Create the root member of an empty tree.
///
/// Fails with `RootExists` once any root is present and with
/// `DuplicateEmail` for a registered email.
pub async fn seed_root(root: NewRoot, deps: &ServerDeps) -> Result<MemberCode, TreeError> {
    let mut tx = deps.store.begin().await?;

    match insert_root(tx.as_mut(), &root, deps).await {
        Ok(code) => {
            tx.commit().await?;
            info!(member_code = %code, email = %root.email, "Root member created");
            Ok(code)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                error!(error = %rollback_err, "Rollback failed after root seeding error");
            }
            Err(err)
        }
    }
}

async fn insert_root(
    tx: &mut dyn MemberTx,
    root: &NewRoot,
    deps: &ServerDeps,
) -> Result<MemberCode, TreeError> {
    if let Some(existing) = tx.find_root().await? {
        info!(member_code = %existing.code, "Root member already present");
        return Err(TreeError::RootExists);
    }
    if tx.find_by_email(root.email.trim()).await?.is_some() {
        return Err(TreeError::DuplicateEmail);
    }

    let password_hash = deps
        .hasher
        .hash(&root.password)
        .map_err(|e| TreeError::Hashing(e.to_string()))?;

    let code = tx
        .insert_member(&NewMember {
            name: root.name.clone(),
            email: root.email.trim().to_string(),
            mobile: root.mobile.clone(),
            password_hash,
            sponsor_code: None,
        })
        .await?;

    Ok(code)
}
