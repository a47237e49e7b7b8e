use super::{ExistingKeys, UserStore};
use crate::{
    models::{MobileNumber, UserRecord},
    utils::error::AppError,
};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory store for tests
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<UserRecord>>,
    lookups: AtomicUsize,
    inserts: AtomicUsize,
    fail_writes: AtomicBool,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<UserRecord>) -> Self {
        let store = Self::new();
        store.users.lock().unwrap().extend(users);
        store
    }

    pub fn snapshot(&self) -> Vec<UserRecord> {
        self.users.lock().unwrap().clone()
    }

    /// Number of read queries issued against the store.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Number of `insert_many` calls that reached the store.
    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email_or_mobile(
        &self,
        email: Option<&str>,
        mobile: Option<&MobileNumber>,
    ) -> Result<Option<UserRecord>, AppError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        let users = self.users.lock().unwrap();
        let found = users.iter().find(|u| {
            let email_match = email.is_some() && u.email.as_deref() == email;
            let mobile_match = mobile.is_some() && u.mobile_number.as_ref() == mobile;
            email_match || mobile_match
        });
        Ok(found.cloned())
    }

    async fn find_existing_keys(
        &self,
        emails: &[String],
        mobile_numbers: &[MobileNumber],
    ) -> Result<ExistingKeys, AppError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        let users = self.users.lock().unwrap();
        let mut keys = ExistingKeys::default();
        for user in users.iter() {
            let email_match = user.email.as_ref().map_or(false, |e| emails.contains(e));
            let mobile_match = user
                .mobile_number
                .as_ref()
                .map_or(false, |m| mobile_numbers.contains(m));
            if email_match || mobile_match {
                keys.absorb(user);
            }
        }
        Ok(keys)
    }

    async fn insert_many(&self, users: Vec<UserRecord>) -> Result<usize, AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError("write refused".to_string()));
        }
        self.inserts.fetch_add(1, Ordering::SeqCst);

        let count = users.len();
        let mut stored = self.users.lock().unwrap();
        stored.extend(users.into_iter().map(|mut u| {
            if u.id.is_none() {
                u.id = Some(ObjectId::new());
            }
            u
        }));
        Ok(count)
    }

    async fn find_all(&self) -> Result<Vec<UserRecord>, AppError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
