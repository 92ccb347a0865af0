use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::consts::consts::{ContactId, IdentityKey};

/// Wire format for birthdays, both in the contacts file and the SQLite table.
pub const BIRTHDAY_FORMAT: &str = "%d-%m-%Y";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Contact {
    pub id: ContactId,
    pub last_name: String,
    pub first_name: String,
    pub patronymic_name: String,
    pub phones: Vec<String>,
    pub email: String,
    pub birthday: NaiveDate,
}

impl Contact {
    pub fn from_data(id: ContactId, data: ContactData) -> Self {
        Contact {
            id,
            last_name: data.last_name,
            first_name: data.first_name,
            patronymic_name: data.patronymic_name,
            phones: data.phones,
            email: data.email,
            birthday: data.birthday,
        }
    }

    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::from_names(&self.last_name, &self.first_name, &self.patronymic_name)
    }

    pub fn birthday_display(&self) -> String {
        self.birthday.format(BIRTHDAY_FORMAT).to_string()
    }

    /// Phones joined for table-cell style display
    pub fn phones_display(&self) -> String {
        self.phones.join(", ")
    }

    pub fn new_test() -> Self {
        Contact {
            id: ContactId(1),
            last_name: "Ivanov".to_string(),
            first_name: "Ivan".to_string(),
            patronymic_name: "Ivanovich".to_string(),
            phones: vec!["+71234567890".to_string()],
            email: "ivan@example.com".to_string(),
            birthday: NaiveDate::from_ymd_opt(1990, 1, 1).expect("valid test date"),
        }
    }
}

/// The six validated fields of a submission, before the store has assigned an id.
/// Produced by [`crate::model::validate::validate_draft`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ContactData {
    pub last_name: String,
    pub first_name: String,
    pub patronymic_name: String,
    pub phones: Vec<String>,
    pub email: String,
    pub birthday: NaiveDate,
}

impl ContactData {
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::from_names(&self.last_name, &self.first_name, &self.patronymic_name)
    }
}

/// Raw field values as collected by the presentation layer, one string per
/// input box. Phones arrive as a single comma-separated string.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContactDraft {
    pub last_name: String,
    pub first_name: String,
    pub patronymic_name: String,
    pub phones: String,
    pub email: String,
    pub birthday: String,
}

impl ContactDraft {
    /// Pre-fills a draft from an existing contact, the edit-dialog flow.
    pub fn from_contact(contact: &Contact) -> Self {
        ContactDraft {
            last_name: contact.last_name.clone(),
            first_name: contact.first_name.clone(),
            patronymic_name: contact.patronymic_name.clone(),
            phones: contact.phones.join(","),
            email: contact.email.clone(),
            birthday: contact.birthday_display(),
        }
    }
}
