use std::fmt;

use serde::{Deserialize, Serialize};

/// A contact may hold at most this many phone numbers
pub const MAX_PHONES_PER_CONTACT: usize = 100;

// New Type Pattern -- https://doc.rust-lang.org/rust-by-example/generics/new_types.html
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContactId(pub i64);

impl ContactId {
    pub fn new_first_id() -> ContactId {
        ContactId(1)
    }

    pub fn to_number(self) -> i64 {
        self.0
    }

    pub fn increment(&self) -> ContactId {
        ContactId(self.0 + 1)
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// "last first patronymic" joined by single spaces. Secondary index and
/// display convenience only, the surrogate [`ContactId`] is the true identity.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdentityKey(pub String);

impl IdentityKey {
    pub fn from_names(last_name: &str, first_name: &str, patronymic_name: &str) -> IdentityKey {
        IdentityKey(format!("{} {} {}", last_name, first_name, patronymic_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
