// ==================== DEDUP FILTER ====================
// Um registro é duplicado se o email OU o mobileNumber já existir.
// Campos nulos nunca casam.

use crate::{
    database::{ExistingKeys, UserStore},
    models::UserDraft,
    utils::error::AppError,
};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupMode {
    /// One lookup per file, and keys staged earlier in the same request
    /// count as existing.
    #[default]
    Strict,
    /// One live store query per row. Two rows of the same request sharing
    /// a key both pass, since neither is persisted when the other is checked.
    StoreOnly,
}

impl FromStr for DedupMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(DedupMode::Strict),
            "store-only" | "store_only" => Ok(DedupMode::StoreOnly),
            other => Err(format!("Unknown dedup mode '{}'", other)),
        }
    }
}

impl fmt::Display for DedupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DedupMode::Strict => f.write_str("strict"),
            DedupMode::StoreOnly => f.write_str("store-only"),
        }
    }
}

/// Single-row check against the live store.
pub async fn is_duplicate(store: &dyn UserStore, draft: &UserDraft) -> Result<bool, AppError> {
    if draft.email.is_none() && draft.mobile_number.is_none() {
        return Ok(false);
    }

    let existing = store
        .find_by_email_or_mobile(draft.email.as_deref(), draft.mobile_number.as_ref())
        .await?;
    Ok(existing.is_some())
}

/// Outcome of screening one file's drafts
#[derive(Debug, Default)]
pub struct Screened {
    pub accepted: Vec<UserDraft>,
    pub skipped: usize,
}

/// Request-scoped filter; lives for the duration of one import.
pub struct DedupFilter {
    mode: DedupMode,
    known: ExistingKeys,
}

impl DedupFilter {
    pub fn new(mode: DedupMode) -> Self {
        Self {
            mode,
            known: ExistingKeys::default(),
        }
    }

    /// Splits drafts into accepted and skipped, preserving order.
    pub async fn screen(
        &mut self,
        store: &dyn UserStore,
        drafts: Vec<UserDraft>,
    ) -> Result<Screened, AppError> {
        let mut screened = Screened::default();

        match self.mode {
            DedupMode::StoreOnly => {
                for draft in drafts {
                    if is_duplicate(store, &draft).await? {
                        log::debug!("⏭️  Duplicate skipped: {:?} / {:?}", draft.email, draft.mobile_number);
                        screened.skipped += 1;
                    } else {
                        screened.accepted.push(draft);
                    }
                }
            }
            DedupMode::Strict => {
                self.prefetch(store, &drafts).await?;
                for draft in drafts {
                    if self.admit(&draft) {
                        screened.accepted.push(draft);
                    } else {
                        log::debug!("⏭️  Duplicate skipped: {:?} / {:?}", draft.email, draft.mobile_number);
                        screened.skipped += 1;
                    }
                }
            }
        }

        Ok(screened)
    }

    /// Loads the store's matches for every key in `drafts` not yet known.
    async fn prefetch(&mut self, store: &dyn UserStore, drafts: &[UserDraft]) -> Result<(), AppError> {
        let mut emails: Vec<String> = Vec::new();
        let mut mobile_numbers = Vec::new();

        for draft in drafts {
            if let Some(email) = &draft.email {
                if !self.known.emails.contains(email) && !emails.contains(email) {
                    emails.push(email.clone());
                }
            }
            if let Some(mobile) = &draft.mobile_number {
                if !self.known.mobile_numbers.contains(mobile) && !mobile_numbers.contains(mobile) {
                    mobile_numbers.push(mobile.clone());
                }
            }
        }

        if emails.is_empty() && mobile_numbers.is_empty() {
            return Ok(());
        }

        let found = store.find_existing_keys(&emails, &mobile_numbers).await?;
        self.known.emails.extend(found.emails);
        self.known.mobile_numbers.extend(found.mobile_numbers);
        Ok(())
    }

    /// Accepts the draft unless one of its keys is known; accepted keys are
    /// staged so later siblings collide with them.
    fn admit(&mut self, draft: &UserDraft) -> bool {
        let email_taken = draft
            .email
            .as_ref()
            .map_or(false, |e| self.known.emails.contains(e));
        let mobile_taken = draft
            .mobile_number
            .as_ref()
            .map_or(false, |m| self.known.mobile_numbers.contains(m));

        if email_taken || mobile_taken {
            return false;
        }

        if let Some(email) = &draft.email {
            self.known.emails.insert(email.clone());
        }
        if let Some(mobile) = &draft.mobile_number {
            self.known.mobile_numbers.insert(mobile.clone());
        }
        true
    }
}
