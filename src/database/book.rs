use std::path::PathBuf;

use thiserror::Error;

use crate::consts::consts::ContactId;
use crate::model::contact::{Contact, ContactDraft};
use crate::model::validate::{self, ValidationError};
use crate::persistence::adapter::{
    new_adapter, PersistenceAdapter, PersistenceError, RecordOutcome, StorageEngine,
};

use super::search::{ContactVisibility, SearchMatcher, SearchState};
use super::store::{ContactRef, ContactStore, DuplicatePolicy, StoreError};

#[derive(Error, Debug)]
pub enum BookError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

// Implements: https://rust-unofficial.github.io/patterns/patterns/creational/builder.html
#[derive(Clone, Debug)]
pub struct AddressBookOptions {
    pub storage_engine: StorageEngine,
    pub duplicate_policy: Option<DuplicatePolicy>,
}

impl AddressBookOptions {
    pub fn set_storage_engine(mut self, storage_engine: StorageEngine) -> Self {
        self.storage_engine = storage_engine;
        self
    }

    /// Overrides the per-engine default duplicate handling
    pub fn set_duplicate_policy(mut self, duplicate_policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = Some(duplicate_policy);
        self
    }

    /// File era keeps the documented silent overwrite; once the table makes
    /// the surrogate id canonical, a colliding name is reported instead.
    fn effective_duplicate_policy(&self) -> DuplicatePolicy {
        if let Some(policy) = self.duplicate_policy {
            return policy;
        }

        match self.storage_engine {
            StorageEngine::File(_) => DuplicatePolicy::Overwrite,
            StorageEngine::Table(_) => DuplicatePolicy::Reject,
        }
    }
}

impl Default for AddressBookOptions {
    fn default() -> Self {
        Self {
            storage_engine: StorageEngine::File(PathBuf::from("contacts.txt")),
            duplicate_policy: None,
        }
    }
}

/// The synchronous facade the presentation layer drives: field values come
/// in as drafts, pass validation, mutate the store, and are durably recorded
/// before control returns.
pub struct AddressBook {
    store: ContactStore,
    adapter: Box<dyn PersistenceAdapter>,
    matcher: SearchMatcher,
}

impl AddressBook {
    /// Builds the adapter, prepares storage and loads the full contact set.
    /// A failed load surfaces the error and leaves no partially-filled book
    /// behind.
    pub fn open(options: AddressBookOptions) -> Result<Self, BookError> {
        let mut adapter = new_adapter(&options.storage_engine)?;
        adapter.init()?;

        let mut store = ContactStore::new(options.effective_duplicate_policy());
        store.restore(adapter.load()?);

        log::info!("Address book ready with {} contacts", store.len());

        Ok(Self {
            store,
            adapter,
            matcher: SearchMatcher::new(),
        })
    }

    pub fn load_all(&self) -> Vec<Contact> {
        self.store.list().into_iter().cloned().collect()
    }

    pub fn find(&self, contact_ref: &ContactRef) -> Option<&Contact> {
        self.store.find(contact_ref)
    }

    pub fn create(&mut self, draft: &ContactDraft) -> Result<Contact, BookError> {
        let data = validate::validate_draft(draft)?;

        let len_before = self.store.len();
        let contact = self.store.add(data)?;

        // An add that did not grow the store overwrote an existing contact,
        // durably that is an update of its row
        let outcome = if self.store.len() == len_before {
            self.adapter.record_update(&contact)?
        } else {
            self.adapter.record_create(&contact)?
        };
        self.finish_mutation(outcome)?;

        log::info!("✅ Created contact {}: {}", contact.id, contact.identity_key());

        Ok(contact)
    }

    pub fn update(
        &mut self,
        contact_ref: &ContactRef,
        draft: &ContactDraft,
    ) -> Result<Contact, BookError> {
        let data = validate::validate_draft(draft)?;

        let len_before = self.store.len();
        let contact = self.store.edit(contact_ref, data)?;

        // A renaming edit that displaced another contact shrank the store;
        // only a full rewrite keeps the durable set in step
        let outcome = if self.store.len() < len_before {
            RecordOutcome::NeedsFullSave
        } else {
            self.adapter.record_update(&contact)?
        };
        self.finish_mutation(outcome)?;

        log::info!("✅ Updated contact {}: {}", contact.id, contact.identity_key());

        Ok(contact)
    }

    pub fn remove(&mut self, contact_ref: &ContactRef) -> Result<(), BookError> {
        let removed = self.store.delete(contact_ref)?;

        let outcome = self.adapter.record_delete(removed.id)?;
        self.finish_mutation(outcome)?;

        log::info!("✅ Removed contact {}: {}", removed.id, removed.identity_key());

        Ok(())
    }

    /// The phone is validated before the store is touched, so `InvalidPhone`
    /// never leaves a half-applied append behind.
    pub fn add_phone(
        &mut self,
        contact_ref: &ContactRef,
        phone: &str,
    ) -> Result<Contact, BookError> {
        let phone = validate::validate_phone(phone)?;

        let contact = self.store.add_phone(contact_ref, phone)?;

        let outcome = self.adapter.record_update(&contact)?;
        self.finish_mutation(outcome)?;

        Ok(contact)
    }

    /// Ids of the contacts the query matches, in identity-key order
    pub fn search(&self, query: &str) -> Vec<ContactId> {
        self.store
            .list()
            .into_iter()
            .filter(|contact| SearchMatcher::matches(query, contact))
            .map(|contact| contact.id)
            .collect()
    }

    /// The two-state filter toggle; see [`SearchMatcher::toggle`]
    pub fn toggle_search(&mut self, query: &str) -> Vec<ContactVisibility> {
        self.matcher.toggle(query, self.store.list())
    }

    pub fn search_state(&self) -> SearchState {
        self.matcher.state()
    }

    /// Explicit bulk rewrite of the durable set
    pub fn save(&mut self) -> Result<(), BookError> {
        let contacts = self.load_all();
        self.adapter.save(&contacts)?;

        Ok(())
    }

    fn finish_mutation(&mut self, outcome: RecordOutcome) -> Result<(), BookError> {
        if outcome == RecordOutcome::NeedsFullSave {
            self.save()?;
        }

        Ok(())
    }
}
