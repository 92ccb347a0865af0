use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::consts::consts::{ContactId, IdentityKey, MAX_PHONES_PER_CONTACT};
use crate::model::contact::{Contact, ContactData};

/// Keyed operations accept either the surrogate id or the name-derived key
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContactRef {
    Id(ContactId),
    Key(IdentityKey),
}

impl fmt::Display for ContactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactRef::Id(id) => write!(f, "id {}", id),
            ContactRef::Key(key) => write!(f, "'{}'", key),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("Not found, contact does not exist: {0}")]
    NotFound(ContactRef),

    #[error("Cannot use this name, a contact already exists with it: {0}")]
    DuplicateKey(IdentityKey),

    #[error(
        "Cannot add phone, contact {0} already has the maximum of {MAX_PHONES_PER_CONTACT} numbers"
    )]
    LimitExceeded(ContactId),
}

/// What `add` (and a renaming `edit`) does when the new identity key is
/// already taken by another contact.
///
/// `Overwrite` reproduces the file-era behaviour where the second submission
/// silently replaces the first. `Reject` reports `DuplicateKey` instead and
/// is the default once the table backend makes the surrogate id canonical.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DuplicatePolicy {
    Overwrite,
    Reject,
}

/// Authoritative in-memory collection of contacts.
///
/// Rows are keyed by surrogate id; the identity index is an ordered map so
/// `list` always iterates ascending by identity key.
pub struct ContactStore {
    contact_rows: BTreeMap<ContactId, Contact>,
    identity_index: BTreeMap<IdentityKey, ContactId>,
    next_id: ContactId,
    duplicate_policy: DuplicatePolicy,
}

impl ContactStore {
    pub fn new(duplicate_policy: DuplicatePolicy) -> Self {
        Self {
            contact_rows: BTreeMap::new(),
            identity_index: BTreeMap::new(),
            next_id: ContactId::new_first_id(),
            duplicate_policy,
        }
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    fn resolve(&self, contact_ref: &ContactRef) -> Option<ContactId> {
        match contact_ref {
            ContactRef::Id(id) => self.contact_rows.contains_key(id).then_some(*id),
            ContactRef::Key(key) => self.identity_index.get(key).copied(),
        }
    }

    pub fn add(&mut self, data: ContactData) -> Result<Contact, StoreError> {
        let key = data.identity_key();

        if let Some(existing_id) = self.identity_index.get(&key).copied() {
            return match self.duplicate_policy {
                DuplicatePolicy::Reject => Err(StoreError::DuplicateKey(key)),
                DuplicatePolicy::Overwrite => {
                    // Same name fields mean the same index slot, the previous
                    // contact's data is lost. Kept id, replaced fields.
                    let contact = Contact::from_data(existing_id, data);
                    self.contact_rows.insert(existing_id, contact.clone());

                    Ok(contact)
                }
            };
        }

        let id = self.next_id;
        self.next_id = self.next_id.increment();

        let contact = Contact::from_data(id, data);
        self.identity_index.insert(key, id);
        self.contact_rows.insert(id, contact.clone());

        Ok(contact)
    }

    /// Replaces all six fields wholesale (phones are not merged) and rebinds
    /// the identity index when the name fields change.
    pub fn edit(
        &mut self,
        contact_ref: &ContactRef,
        data: ContactData,
    ) -> Result<Contact, StoreError> {
        let id = self
            .resolve(contact_ref)
            .ok_or_else(|| StoreError::NotFound(contact_ref.clone()))?;

        let old_key = match self.contact_rows.get(&id) {
            Some(existing) => existing.identity_key(),
            None => return Err(StoreError::NotFound(contact_ref.clone())),
        };

        let new_key = data.identity_key();

        // All checks happen before the first mutation, a failed edit leaves
        // the store untouched
        let displaced = match self.identity_index.get(&new_key).copied() {
            Some(holder_id) if holder_id != id => match self.duplicate_policy {
                DuplicatePolicy::Reject => return Err(StoreError::DuplicateKey(new_key)),
                DuplicatePolicy::Overwrite => Some(holder_id),
            },
            _ => None,
        };

        if let Some(holder_id) = displaced {
            self.contact_rows.remove(&holder_id);
        }

        self.identity_index.remove(&old_key);
        self.identity_index.insert(new_key, id);

        let contact = Contact::from_data(id, data);
        self.contact_rows.insert(id, contact.clone());

        Ok(contact)
    }

    /// Removes the contact and returns it. No cascading effects.
    pub fn delete(&mut self, contact_ref: &ContactRef) -> Result<Contact, StoreError> {
        let id = self
            .resolve(contact_ref)
            .ok_or_else(|| StoreError::NotFound(contact_ref.clone()))?;

        let contact = self
            .contact_rows
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound(contact_ref.clone()))?;

        self.identity_index.remove(&contact.identity_key());

        Ok(contact)
    }

    /// Appends a phone. No dedup, no reordering, capped at
    /// [`MAX_PHONES_PER_CONTACT`].
    pub fn add_phone(
        &mut self,
        contact_ref: &ContactRef,
        phone: String,
    ) -> Result<Contact, StoreError> {
        let id = self
            .resolve(contact_ref)
            .ok_or_else(|| StoreError::NotFound(contact_ref.clone()))?;

        let contact = self
            .contact_rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(contact_ref.clone()))?;

        if contact.phones.len() >= MAX_PHONES_PER_CONTACT {
            return Err(StoreError::LimitExceeded(id));
        }

        contact.phones.push(phone);

        Ok(contact.clone())
    }

    pub fn find(&self, contact_ref: &ContactRef) -> Option<&Contact> {
        self.resolve(contact_ref)
            .and_then(|id| self.contact_rows.get(&id))
    }

    /// All contacts, ascending by identity key
    pub fn list(&self) -> Vec<&Contact> {
        self.identity_index
            .values()
            .filter_map(|id| self.contact_rows.get(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.contact_rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contact_rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.contact_rows.clear();
        self.identity_index.clear();
        self.next_id = ContactId::new_first_id();
    }

    /// Wholesale replacement used by `load`. Rebuilds both maps and moves the
    /// id counter past the largest restored id. A later contact with an
    /// identity key already seen displaces the earlier one (last record
    /// wins, as when re-reading the contacts file).
    pub fn restore(&mut self, contacts: Vec<Contact>) {
        self.clear();

        for contact in contacts {
            let key = contact.identity_key();

            if let Some(displaced_id) = self.identity_index.insert(key, contact.id) {
                self.contact_rows.remove(&displaced_id);
            }

            if contact.id >= self.next_id {
                self.next_id = contact.id.increment();
            }

            self.contact_rows.insert(contact.id, contact);
        }
    }
}

impl Default for ContactStore {
    fn default() -> Self {
        Self::new(DuplicatePolicy::Reject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn test_data(last: &str, first: &str, patronymic: &str) -> ContactData {
        ContactData {
            last_name: last.to_string(),
            first_name: first.to_string(),
            patronymic_name: patronymic.to_string(),
            phones: vec!["+71234567890".to_string()],
            email: "ivan@example.com".to_string(),
            birthday: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        }
    }

    fn by_key(last: &str, first: &str, patronymic: &str) -> ContactRef {
        ContactRef::Key(IdentityKey::from_names(last, first, patronymic))
    }

    mod add_and_find {
        use super::*;

        #[test]
        fn added_contact_is_found_by_key_and_by_id() {
            // Given an empty store
            let mut store = ContactStore::default();

            // When we add a contact
            let added = store.add(test_data("Ivanov", "Ivan", "Ivanovich")).unwrap();

            // Then the same contact comes back by key and by id
            let by_key = store
                .find(&by_key("Ivanov", "Ivan", "Ivanovich"))
                .expect("should find by key");
            let by_id = store
                .find(&ContactRef::Id(added.id))
                .expect("should find by id");

            assert_eq!(by_key, &added);
            assert_eq!(by_id, &added);
        }

        #[test]
        fn ids_are_assigned_monotonically() {
            let mut store = ContactStore::default();

            let first = store.add(test_data("Ivanov", "Ivan", "Ivanovich")).unwrap();
            let second = store.add(test_data("Petrov", "Petr", "Petrovich")).unwrap();

            assert_eq!(second.id, first.id.increment());
        }

        #[test]
        fn duplicate_name_is_rejected_under_reject_policy() {
            // Given a store holding Ivanov
            let mut store = ContactStore::new(DuplicatePolicy::Reject);
            store.add(test_data("Ivanov", "Ivan", "Ivanovich")).unwrap();

            // When a second contact with the same three names arrives
            let result = store.add(test_data("Ivanov", "Ivan", "Ivanovich"));

            // Then the add fails and the store is unchanged
            assert_eq!(
                result,
                Err(StoreError::DuplicateKey(IdentityKey::from_names(
                    "Ivanov",
                    "Ivan",
                    "Ivanovich"
                )))
            );
            assert_eq!(store.len(), 1);
        }

        /// Documented file-era behaviour: the second submission silently
        /// replaces the first. A correctness risk, preserved deliberately.
        #[test]
        fn duplicate_name_overwrites_under_overwrite_policy() {
            let mut store = ContactStore::new(DuplicatePolicy::Overwrite);

            let first = store.add(test_data("Ivanov", "Ivan", "Ivanovich")).unwrap();

            let mut second_data = test_data("Ivanov", "Ivan", "Ivanovich");
            second_data.phones = vec!["+79876543210".to_string()];
            let second = store.add(second_data).unwrap();

            // One contact remains, with the second phones and the original id
            assert_eq!(store.len(), 1);
            assert_eq!(second.id, first.id);

            let survivor = store.find(&ContactRef::Id(first.id)).unwrap();
            assert_eq!(survivor.phones, vec!["+79876543210"]);
        }
    }

    mod edit {
        use super::*;

        #[test]
        fn edit_replaces_all_fields_wholesale() {
            let mut store = ContactStore::default();
            let added = store.add(test_data("Ivanov", "Ivan", "Ivanovich")).unwrap();

            let mut new_data = test_data("Ivanov", "Ivan", "Ivanovich");
            new_data.phones = vec!["+70000000000".to_string()];
            new_data.email = "new@example.com".to_string();

            let edited = store.edit(&ContactRef::Id(added.id), new_data).unwrap();

            // Phones were replaced, not merged
            assert_eq!(edited.phones, vec!["+70000000000"]);
            assert_eq!(edited.email, "new@example.com");
            assert_eq!(edited.id, added.id);
        }

        #[test]
        fn renaming_edit_rebinds_the_identity_key() {
            // Given a store holding Ivanov
            let mut store = ContactStore::default();
            let added = store.add(test_data("Ivanov", "Ivan", "Ivanovich")).unwrap();

            // When the edit changes the last name
            store
                .edit(
                    &ContactRef::Id(added.id),
                    test_data("Petrov", "Ivan", "Ivanovich"),
                )
                .unwrap();

            // Then lookups must use the new key, the old one is gone
            assert!(store.find(&by_key("Ivanov", "Ivan", "Ivanovich")).is_none());
            assert!(store.find(&by_key("Petrov", "Ivan", "Ivanovich")).is_some());
        }

        #[test]
        fn renaming_edit_onto_a_taken_key_is_rejected() {
            let mut store = ContactStore::new(DuplicatePolicy::Reject);
            store.add(test_data("Ivanov", "Ivan", "Ivanovich")).unwrap();
            let petrov = store.add(test_data("Petrov", "Petr", "Petrovich")).unwrap();

            let result = store.edit(
                &ContactRef::Id(petrov.id),
                test_data("Ivanov", "Ivan", "Ivanovich"),
            );

            assert!(matches!(result, Err(StoreError::DuplicateKey(_))));
            // The failed edit did not touch either contact
            assert_eq!(store.len(), 2);
            assert!(store.find(&by_key("Petrov", "Petr", "Petrovich")).is_some());
        }

        #[test]
        fn renaming_edit_displaces_the_holder_under_overwrite_policy() {
            let mut store = ContactStore::new(DuplicatePolicy::Overwrite);
            store.add(test_data("Ivanov", "Ivan", "Ivanovich")).unwrap();
            let petrov = store.add(test_data("Petrov", "Petr", "Petrovich")).unwrap();

            store
                .edit(
                    &ContactRef::Id(petrov.id),
                    test_data("Ivanov", "Ivan", "Ivanovich"),
                )
                .unwrap();

            assert_eq!(store.len(), 1);
            let survivor = store.find(&by_key("Ivanov", "Ivan", "Ivanovich")).unwrap();
            assert_eq!(survivor.id, petrov.id);
        }

        #[test]
        fn editing_a_missing_contact_fails_with_not_found() {
            let mut store = ContactStore::default();

            let result = store.edit(
                &ContactRef::Id(ContactId(42)),
                test_data("Ivanov", "Ivan", "Ivanovich"),
            );

            assert!(matches!(result, Err(StoreError::NotFound(_))));
        }
    }

    mod delete {
        use super::*;

        #[test]
        fn deleted_contact_is_no_longer_found() {
            let mut store = ContactStore::default();
            let added = store.add(test_data("Ivanov", "Ivan", "Ivanovich")).unwrap();

            let removed = store.delete(&ContactRef::Id(added.id)).unwrap();

            assert_eq!(removed, added);
            assert!(store.find(&ContactRef::Id(added.id)).is_none());
            assert!(store.find(&by_key("Ivanov", "Ivan", "Ivanovich")).is_none());
        }

        #[test]
        fn deleting_twice_fails_with_not_found() {
            let mut store = ContactStore::default();
            let added = store.add(test_data("Ivanov", "Ivan", "Ivanovich")).unwrap();

            store.delete(&ContactRef::Id(added.id)).unwrap();
            let result = store.delete(&ContactRef::Id(added.id));

            assert_eq!(result, Err(StoreError::NotFound(ContactRef::Id(added.id))));
        }
    }

    mod add_phone {
        use super::*;

        #[test]
        fn phones_append_in_order_and_allow_duplicates() {
            let mut store = ContactStore::default();
            let added = store.add(test_data("Ivanov", "Ivan", "Ivanovich")).unwrap();
            let id_ref = ContactRef::Id(added.id);

            store
                .add_phone(&id_ref, "+79876543210".to_string())
                .unwrap();
            let contact = store
                .add_phone(&id_ref, "+79876543210".to_string())
                .unwrap();

            assert_eq!(
                contact.phones,
                vec!["+71234567890", "+79876543210", "+79876543210"]
            );
        }

        #[test]
        fn the_hundredth_phone_is_accepted_and_the_hundred_first_rejected() {
            let mut store = ContactStore::default();
            let added = store.add(test_data("Ivanov", "Ivan", "Ivanovich")).unwrap();
            let id_ref = ContactRef::Id(added.id);

            // Fill up to 99 (the contact starts with one phone)
            for _ in 1..MAX_PHONES_PER_CONTACT - 1 {
                store
                    .add_phone(&id_ref, "+71112223344".to_string())
                    .unwrap();
            }

            let hundredth = store.add_phone(&id_ref, "+75556667788".to_string());
            assert!(hundredth.is_ok());

            let hundred_first = store.add_phone(&id_ref, "+75556667788".to_string());
            assert_eq!(hundred_first, Err(StoreError::LimitExceeded(added.id)));

            // The rejected phone was not appended
            let contact = store.find(&id_ref).unwrap();
            assert_eq!(contact.phones.len(), MAX_PHONES_PER_CONTACT);
        }

        #[test]
        fn adding_a_phone_to_a_missing_contact_fails_with_not_found() {
            let mut store = ContactStore::default();

            let result = store.add_phone(
                &by_key("Ivanov", "Ivan", "Ivanovich"),
                "+71234567890".to_string(),
            );

            assert!(matches!(result, Err(StoreError::NotFound(_))));
        }
    }

    mod listing_and_restore {
        use super::*;

        #[test]
        fn list_iterates_ascending_by_identity_key() {
            let mut store = ContactStore::default();
            store.add(test_data("Petrov", "Petr", "Petrovich")).unwrap();
            store.add(test_data("Ivanov", "Ivan", "Ivanovich")).unwrap();
            store
                .add(test_data("Sidorov", "Sidor", "Sidorovich"))
                .unwrap();

            let keys: Vec<String> = store
                .list()
                .iter()
                .map(|contact| contact.identity_key().to_string())
                .collect();

            assert_eq!(
                keys,
                vec![
                    "Ivanov Ivan Ivanovich",
                    "Petrov Petr Petrovich",
                    "Sidorov Sidor Sidorovich"
                ]
            );
        }

        #[test]
        fn restore_replaces_contents_and_advances_the_id_counter() {
            let mut store = ContactStore::default();
            store.add(test_data("Old", "Old", "Old")).unwrap();

            let restored = vec![
                Contact::from_data(ContactId(5), test_data("Ivanov", "Ivan", "Ivanovich")),
                Contact::from_data(ContactId(9), test_data("Petrov", "Petr", "Petrovich")),
            ];
            store.restore(restored);

            assert_eq!(store.len(), 2);
            assert!(store.find(&by_key("Old", "Old", "Old")).is_none());

            // The next assigned id continues past the largest restored one
            let added = store
                .add(test_data("Sidorov", "Sidor", "Sidorovich"))
                .unwrap();
            assert_eq!(added.id, ContactId(10));
        }

        #[test]
        fn restore_keeps_the_last_of_two_records_with_the_same_key() {
            let mut store = ContactStore::default();

            let mut earlier = Contact::from_data(ContactId(1), test_data("Ivanov", "Ivan", "Ivanovich"));
            earlier.email = "old@example.com".to_string();
            let later = Contact::from_data(ContactId(2), test_data("Ivanov", "Ivan", "Ivanovich"));

            store.restore(vec![earlier, later]);

            assert_eq!(store.len(), 1);
            let survivor = store.find(&by_key("Ivanov", "Ivan", "Ivanovich")).unwrap();
            assert_eq!(survivor.id, ContactId(2));
            assert_eq!(survivor.email, "ivan@example.com");
        }
    }
}
