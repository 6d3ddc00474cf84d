//! In-process member store with the same locking contract as Postgres.
//!
//! Committed rows live behind one mutex. A transaction stages full copies of
//! every row it writes and publishes them together on commit. Row locks are
//! per-member `tokio` mutexes whose owned guards live in the transaction, so
//! they are released on commit, rollback or drop. Any row a transaction
//! writes is locked first, matching the implicit row locks of `UPDATE`.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};
use tracing::debug;

use super::{
    MemberStore, MemberTx, StoreError, EMAIL_UNIQUE_CONSTRAINT, SINGLE_ROOT_CONSTRAINT,
};
use crate::common::{MemberCode, Side};
use crate::domains::member::models::{Member, NewMember};

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Store operations a test can make fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPoint {
    Begin,
    Insert,
    SetChild,
    IncrementCount,
    Commit,
}

#[derive(Default)]
struct State {
    members: BTreeMap<MemberCode, Member>,
    last_code: i64,
}

struct Inner {
    state: Mutex<State>,
    row_locks: Mutex<HashMap<MemberCode, Arc<RowLock<()>>>>,
    // (point, calls to let through before failing)
    faults: Mutex<Vec<(FaultPoint, usize)>>,
    lock_timeout: Duration,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn row_lock(&self, code: MemberCode) -> Arc<RowLock<()>> {
        let mut locks = self.row_locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(code).or_default().clone()
    }

    fn check_fault(&self, point: FaultPoint) -> Result<(), StoreError> {
        let mut faults = self.faults.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(index) = faults.iter().position(|(p, _)| *p == point) else {
            return Ok(());
        };

        if faults[index].1 == 0 {
            faults.remove(index);
            return Err(StoreError::Unavailable(format!("injected fault at {:?}", point)));
        }
        faults[index].1 -= 1;
        Ok(())
    }
}

/// Member store kept entirely in memory
#[derive(Clone)]
pub struct InMemoryMemberStore {
    inner: Arc<Inner>,
}

impl InMemoryMemberStore {
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Lock waits longer than `timeout` fail with `LockTimeout`, which is how
    /// lock-order deadlocks between transactions surface.
    pub fn with_lock_timeout(timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                row_locks: Mutex::new(HashMap::new()),
                faults: Mutex::new(Vec::new()),
                lock_timeout: timeout,
            }),
        }
    }

    /// Make the call to `point` after `skip` successful ones fail with
    /// `StoreError::Unavailable`. Used by tests to exercise rollback.
    pub fn fail_on(&self, point: FaultPoint, skip: usize) {
        self.inner
            .faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((point, skip));
    }

    /// Number of committed members
    pub fn len(&self) -> usize {
        self.inner.state().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryMemberStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemberStore for InMemoryMemberStore {
    async fn begin(&self) -> Result<Box<dyn MemberTx>, StoreError> {
        self.inner.check_fault(FaultPoint::Begin)?;
        Ok(Box::new(InMemoryMemberTx {
            inner: self.inner.clone(),
            writes: BTreeMap::new(),
            inserted: Vec::new(),
            locks: HashMap::new(),
        }))
    }

    async fn find_by_code(&self, code: MemberCode) -> Result<Option<Member>, StoreError> {
        Ok(self.inner.state().members.get(&code).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Member>, StoreError> {
        Ok(self
            .inner
            .state()
            .members
            .values()
            .find(|m| m.has_email(email))
            .cloned())
    }

    async fn all_members(&self) -> Result<Vec<Member>, StoreError> {
        Ok(self.inner.state().members.values().cloned().collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Open in-memory transaction
pub struct InMemoryMemberTx {
    inner: Arc<Inner>,
    writes: BTreeMap<MemberCode, Member>,
    inserted: Vec<MemberCode>,
    locks: HashMap<MemberCode, OwnedMutexGuard<()>>,
}

impl InMemoryMemberTx {
    fn read(&self, code: MemberCode) -> Option<Member> {
        if let Some(member) = self.writes.get(&code) {
            return Some(member.clone());
        }
        self.inner.state().members.get(&code).cloned()
    }

    fn visible(&self) -> Vec<Member> {
        let mut rows = self.inner.state().members.clone();
        rows.extend(self.writes.iter().map(|(code, m)| (*code, m.clone())));
        rows.into_values().collect()
    }

    async fn acquire(&mut self, code: MemberCode) -> Result<(), StoreError> {
        if self.locks.contains_key(&code) {
            return Ok(());
        }

        let lock = self.inner.row_lock(code);
        let guard = tokio::time::timeout(self.inner.lock_timeout, lock.lock_owned())
            .await
            .map_err(|_| StoreError::LockTimeout(code))?;
        self.locks.insert(code, guard);
        Ok(())
    }

    /// Lock the row and return this transaction's private copy of it
    async fn write(&mut self, code: MemberCode) -> Result<&mut Member, StoreError> {
        self.acquire(code).await?;

        let committed = self.inner.state().members.get(&code).cloned();
        match self.writes.entry(code) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => committed
                .map(|member| entry.insert(member))
                .ok_or(StoreError::MissingMember(code)),
        }
    }
}

fn unique_violation(constraint: &str) -> StoreError {
    StoreError::UniqueViolation {
        constraint: constraint.to_string(),
    }
}

#[async_trait]
impl MemberTx for InMemoryMemberTx {
    async fn lock_member(&mut self, code: MemberCode) -> Result<Option<Member>, StoreError> {
        if self.read(code).is_none() {
            return Ok(None);
        }
        self.acquire(code).await?;
        // Re-read: the previous holder may have committed changes to this row
        Ok(self.read(code))
    }

    async fn find_by_code(&mut self, code: MemberCode) -> Result<Option<Member>, StoreError> {
        Ok(self.read(code))
    }

    async fn find_by_email(&mut self, email: &str) -> Result<Option<Member>, StoreError> {
        Ok(self.visible().into_iter().find(|m| m.has_email(email)))
    }

    async fn find_root(&mut self) -> Result<Option<Member>, StoreError> {
        Ok(self.visible().into_iter().find(Member::is_root))
    }

    async fn insert_member(&mut self, member: &NewMember) -> Result<MemberCode, StoreError> {
        self.inner.check_fault(FaultPoint::Insert)?;

        let visible = self.visible();
        if visible.iter().any(|m| m.has_email(&member.email)) {
            return Err(unique_violation(EMAIL_UNIQUE_CONSTRAINT));
        }
        if member.sponsor_code.is_none() && visible.iter().any(Member::is_root) {
            return Err(unique_violation(SINGLE_ROOT_CONSTRAINT));
        }

        let code = {
            let mut state = self.inner.state();
            state.last_code += 1;
            MemberCode(state.last_code)
        };

        self.writes
            .insert(code, member.clone().into_member(code, Utc::now()));
        self.inserted.push(code);
        Ok(code)
    }

    async fn set_child(
        &mut self,
        parent: MemberCode,
        side: Side,
        child: MemberCode,
    ) -> Result<(), StoreError> {
        self.inner.check_fault(FaultPoint::SetChild)?;

        if self.read(child).is_none() {
            return Err(StoreError::MissingMember(child));
        }

        let row = self.write(parent).await?;
        let slot = match side {
            Side::Left => &mut row.left_child,
            Side::Right => &mut row.right_child,
        };
        if slot.is_some() {
            return Err(StoreError::SlotOccupied { parent, side });
        }
        *slot = Some(child);
        Ok(())
    }

    async fn increment_count(&mut self, code: MemberCode, side: Side) -> Result<(), StoreError> {
        self.inner.check_fault(FaultPoint::IncrementCount)?;

        let row = self.write(code).await?;
        match side {
            Side::Left => row.left_count += 1,
            Side::Right => row.right_count += 1,
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.inner.check_fault(FaultPoint::Commit)?;

        let InMemoryMemberTx {
            inner,
            writes,
            inserted,
            locks,
        } = *self;

        {
            let mut state = inner.state();

            // Uniqueness against rows committed while this transaction was open
            for code in &inserted {
                let Some(new_row) = writes.get(code) else {
                    continue;
                };
                for existing in state.members.values() {
                    if existing.has_email(&new_row.email) {
                        return Err(unique_violation(EMAIL_UNIQUE_CONSTRAINT));
                    }
                    if new_row.is_root() && existing.is_root() {
                        return Err(unique_violation(SINGLE_ROOT_CONSTRAINT));
                    }
                }
            }

            debug!(rows = writes.len(), inserted = inserted.len(), "committing in-memory transaction");
            state.members.extend(writes);
        }

        drop(locks);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        // Staged rows and lock guards are dropped with the transaction
        Ok(())
    }
}
