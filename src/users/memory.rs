use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Mutex, MutexGuard,
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo::{StoreError, UserStore};
use crate::users::repo_types::{NewUser, User, UserChanges};
use crate::users::rules::UniqueField;

/// In-process store used by tests. Enforces the same unique columns as the
/// Postgres schema.
#[derive(Default)]
pub struct MemoryUserStore {
    rows: Mutex<Vec<User>>,
    lookups: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    skip_precheck: AtomicBool,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `find` calls served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Make every list/find fail with a backend error.
    pub fn fail_reads(&self, on: bool) {
        self.fail_reads.store(on, Ordering::SeqCst);
    }

    /// Make every insert/update/delete fail with a backend error.
    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    /// Report every value as free, so only the write-time constraint catches
    /// duplicates (simulates two requests racing past the pre-check).
    pub fn skip_precheck(&self, on: bool) {
        self.skip_precheck.store(on, Ordering::SeqCst);
    }

    fn rows(&self) -> MutexGuard<'_, Vec<User>> {
        self.rows.lock().expect("memory store poisoned")
    }

    fn check_readable(&self) -> Result<(), StoreError> {
        check(&self.fail_reads)
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        check(&self.fail_writes)
    }
}

fn check(switch: &AtomicBool) -> Result<(), StoreError> {
    if switch.load(Ordering::SeqCst) {
        return Err(StoreError::Backend(anyhow::anyhow!("connection reset by peer")));
    }
    Ok(())
}

fn holds(user: &User, field: UniqueField, value: &str) -> bool {
    match field {
        UniqueField::Email => user.email == value,
        UniqueField::Phone => user.phone == value,
    }
}

fn conflict(rows: &[User], id: Uuid, email: Option<&str>, phone: Option<&str>) -> Option<UniqueField> {
    let candidates = [(UniqueField::Email, email), (UniqueField::Phone, phone)];
    candidates.into_iter().find_map(|(field, value)| {
        let value = value?;
        rows.iter()
            .any(|u| u.id != id && holds(u, field, value))
            .then_some(field)
    })
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        self.check_readable()?;
        Ok(self.rows().clone())
    }

    async fn find(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check_readable()?;
        Ok(self.rows().iter().find(|u| u.id == id).cloned())
    }

    async fn exists_with(
        &self,
        field: UniqueField,
        value: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, StoreError> {
        if self.skip_precheck.load(Ordering::SeqCst) {
            return Ok(false);
        }
        Ok(self
            .rows()
            .iter()
            .any(|u| Some(u.id) != exclude && holds(u, field, value)))
    }

    async fn insert(&self, user: &NewUser) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut rows = self.rows();
        if let Some(field) = conflict(&rows, user.id, Some(&user.email), Some(&user.phone)) {
            return Err(StoreError::Duplicate(field));
        }
        let now = OffsetDateTime::now_utc();
        rows.push(User {
            id: user.id,
            fullname: user.fullname.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            gender: user.gender.clone(),
            password_hash: user.password_hash.clone(),
            image: user.image.clone(),
            has_membership: user.has_membership,
            qr_code: user.qr_code.clone(),
            created_at: now,
            updated_at: now,
        });
        Ok(())
    }

    async fn update(&self, id: Uuid, changes: &UserChanges) -> Result<bool, StoreError> {
        self.check_writable()?;
        let mut rows = self.rows();
        if let Some(field) = conflict(&rows, id, changes.email.as_deref(), changes.phone.as_deref()) {
            return Err(StoreError::Duplicate(field));
        }
        let Some(user) = rows.iter_mut().find(|u| u.id == id) else {
            return Ok(false);
        };
        if let Some(v) = &changes.fullname {
            user.fullname = v.clone();
        }
        if let Some(v) = &changes.email {
            user.email = v.clone();
        }
        if let Some(v) = &changes.phone {
            user.phone = v.clone();
        }
        if let Some(v) = &changes.gender {
            user.gender = v.clone();
        }
        if let Some(v) = &changes.password_hash {
            user.password_hash = v.clone();
        }
        if let Some(v) = &changes.image {
            user.image = v.clone();
        }
        if let Some(v) = changes.has_membership {
            user.has_membership = v;
        }
        if let Some(v) = &changes.qr_code {
            user.qr_code = v.clone();
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.check_writable()?;
        let mut rows = self.rows();
        let before = rows.len();
        rows.retain(|u| u.id != id);
        Ok(rows.len() < before)
    }
}
