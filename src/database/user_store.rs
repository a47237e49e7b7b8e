use super::{MongoDB, USERS_COLLECTION};
use crate::{
    models::{MobileNumber, UserRecord},
    utils::error::AppError,
};
use async_trait::async_trait;
use futures::stream::StreamExt;
use mongodb::bson::{doc, Bson, Document};
use std::collections::HashSet;

/// Dedup keys already present in the store
#[derive(Debug, Default, Clone)]
pub struct ExistingKeys {
    pub emails: HashSet<String>,
    pub mobile_numbers: HashSet<MobileNumber>,
}

impl ExistingKeys {
    pub fn absorb(&mut self, user: &UserRecord) {
        if let Some(email) = &user.email {
            self.emails.insert(email.clone());
        }
        if let Some(mobile) = &user.mobile_number {
            self.mobile_numbers.insert(mobile.clone());
        }
    }
}

/// Store-access capability used by the import pipeline and the list/export
/// endpoints.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// First stored user whose email equals `email` OR whose mobile number
    /// equals `mobile`. A `None` argument never matches.
    async fn find_by_email_or_mobile(
        &self,
        email: Option<&str>,
        mobile: Option<&MobileNumber>,
    ) -> Result<Option<UserRecord>, AppError>;

    /// One lookup for a whole set of candidate keys.
    async fn find_existing_keys(
        &self,
        emails: &[String],
        mobile_numbers: &[MobileNumber],
    ) -> Result<ExistingKeys, AppError>;

    /// Bulk insert; returns the number of inserted documents.
    async fn insert_many(&self, users: Vec<UserRecord>) -> Result<usize, AppError>;

    async fn find_all(&self) -> Result<Vec<UserRecord>, AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}

fn mobile_to_bson(mobile: &MobileNumber) -> Bson {
    match mobile {
        MobileNumber::Number(n) => Bson::Int64(*n),
        MobileNumber::Text(s) => Bson::String(s.clone()),
    }
}

/// `$or` over the non-empty key clauses, or `None` when nothing can match.
fn key_filter(emails: Vec<Bson>, mobile_numbers: Vec<Bson>) -> Option<Document> {
    let mut clauses = Vec::new();
    if !emails.is_empty() {
        clauses.push(doc! { "email": { "$in": emails } });
    }
    if !mobile_numbers.is_empty() {
        clauses.push(doc! { "mobileNumber": { "$in": mobile_numbers } });
    }

    if clauses.is_empty() {
        None
    } else {
        Some(doc! { "$or": clauses })
    }
}

#[async_trait]
impl UserStore for MongoDB {
    async fn find_by_email_or_mobile(
        &self,
        email: Option<&str>,
        mobile: Option<&MobileNumber>,
    ) -> Result<Option<UserRecord>, AppError> {
        let filter = match key_filter(
            email.map(|e| Bson::String(e.to_string())).into_iter().collect(),
            mobile.map(mobile_to_bson).into_iter().collect(),
        ) {
            Some(filter) => filter,
            None => return Ok(None),
        };

        let collection = self.collection::<UserRecord>(USERS_COLLECTION);
        Ok(collection.find_one(filter).await?)
    }

    async fn find_existing_keys(
        &self,
        emails: &[String],
        mobile_numbers: &[MobileNumber],
    ) -> Result<ExistingKeys, AppError> {
        let filter = match key_filter(
            emails.iter().map(|e| Bson::String(e.clone())).collect(),
            mobile_numbers.iter().map(mobile_to_bson).collect(),
        ) {
            Some(filter) => filter,
            None => return Ok(ExistingKeys::default()),
        };

        let collection = self.collection::<UserRecord>(USERS_COLLECTION);
        let mut cursor = collection
            .find(filter)
            .projection(doc! { "email": 1, "mobileNumber": 1 })
            .await?;

        let mut keys = ExistingKeys::default();
        while let Some(result) = cursor.next().await {
            keys.absorb(&result?);
        }

        log::debug!(
            "🔎 Existing keys: {} emails, {} mobile numbers",
            keys.emails.len(),
            keys.mobile_numbers.len()
        );

        Ok(keys)
    }

    async fn insert_many(&self, users: Vec<UserRecord>) -> Result<usize, AppError> {
        if users.is_empty() {
            return Ok(0);
        }

        let collection = self.collection::<UserRecord>(USERS_COLLECTION);
        let result = collection.insert_many(users).await?;
        Ok(result.inserted_ids.len())
    }

    async fn find_all(&self) -> Result<Vec<UserRecord>, AppError> {
        let collection = self.collection::<UserRecord>(USERS_COLLECTION);
        let mut cursor = collection.find(doc! {}).await?;

        let mut users = Vec::new();
        while let Some(result) = cursor.next().await {
            users.push(result?);
        }

        Ok(users)
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.database().run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
