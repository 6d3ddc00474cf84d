use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::{MemberStore, MemberTx, PoolStats, StoreError};
use crate::common::{MemberCode, Side};
use crate::domains::member::models::{Member, NewMember};

/// Postgres-backed member store
#[derive(Clone)]
pub struct PgMemberStore {
    pool: PgPool,
}

impl PgMemberStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberStore for PgMemberStore {
    async fn begin(&self) -> Result<Box<dyn MemberTx>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgMemberTx { tx }))
    }

    async fn find_by_code(&self, code: MemberCode) -> Result<Option<Member>, StoreError> {
        sqlx::query_as::<_, Member>("SELECT * FROM members WHERE member_code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Member>, StoreError> {
        sqlx::query_as::<_, Member>("SELECT * FROM members WHERE lower(email) = lower($1)")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn all_members(&self) -> Result<Vec<Member>, StoreError> {
        sqlx::query_as::<_, Member>("SELECT * FROM members ORDER BY member_code")
            .fetch_all(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn pool_stats(&self) -> Option<PoolStats> {
        Some(PoolStats {
            size: self.pool.size(),
            idle_connections: self.pool.num_idle(),
            max_connections: self.pool.options().get_max_connections(),
        })
    }
}

/// Open Postgres transaction. Dropping it rolls back.
pub struct PgMemberTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl MemberTx for PgMemberTx {
    async fn lock_member(&mut self, code: MemberCode) -> Result<Option<Member>, StoreError> {
        sqlx::query_as::<_, Member>("SELECT * FROM members WHERE member_code = $1 FOR UPDATE")
            .bind(code)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(Into::into)
    }

    async fn find_by_code(&mut self, code: MemberCode) -> Result<Option<Member>, StoreError> {
        sqlx::query_as::<_, Member>("SELECT * FROM members WHERE member_code = $1")
            .bind(code)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(Into::into)
    }

    async fn find_by_email(&mut self, email: &str) -> Result<Option<Member>, StoreError> {
        sqlx::query_as::<_, Member>("SELECT * FROM members WHERE lower(email) = lower($1)")
            .bind(email.trim())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(Into::into)
    }

    async fn find_root(&mut self) -> Result<Option<Member>, StoreError> {
        sqlx::query_as::<_, Member>("SELECT * FROM members WHERE sponsor_code IS NULL LIMIT 1")
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(Into::into)
    }

    async fn insert_member(&mut self, member: &NewMember) -> Result<MemberCode, StoreError> {
        let code = sqlx::query_scalar::<_, MemberCode>(
            "INSERT INTO members (
                name,
                email,
                mobile,
                password_hash,
                sponsor_code,
                left_child,
                right_child,
                left_count,
                right_count
             )
             VALUES ($1, $2, $3, $4, $5, NULL, NULL, 0, 0)
             RETURNING member_code",
        )
        .bind(&member.name)
        .bind(member.email.trim())
        .bind(&member.mobile)
        .bind(&member.password_hash)
        .bind(member.sponsor_code)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(code)
    }

    async fn set_child(
        &mut self,
        parent: MemberCode,
        side: Side,
        child: MemberCode,
    ) -> Result<(), StoreError> {
        // Only an empty slot may be filled
        let sql = match side {
            Side::Left => {
                "UPDATE members SET left_child = $2 WHERE member_code = $1 AND left_child IS NULL"
            }
            Side::Right => {
                "UPDATE members SET right_child = $2 WHERE member_code = $1 AND right_child IS NULL"
            }
        };

        let result = sqlx::query(sql)
            .bind(parent)
            .bind(child)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::SlotOccupied { parent, side });
        }
        Ok(())
    }

    async fn increment_count(&mut self, code: MemberCode, side: Side) -> Result<(), StoreError> {
        let sql = match side {
            Side::Left => "UPDATE members SET left_count = left_count + 1 WHERE member_code = $1",
            Side::Right => {
                "UPDATE members SET right_count = right_count + 1 WHERE member_code = $1"
            }
        };

        let result = sqlx::query(sql).bind(code).execute(&mut *self.tx).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::MissingMember(code));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
