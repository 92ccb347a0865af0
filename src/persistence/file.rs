use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::consts::consts::ContactId;
use crate::model::contact::{Contact, BIRTHDAY_FORMAT};

use super::adapter::{
    PersistenceAdapter, PersistenceError, PersistenceResult, RecordOutcome,
};

/// Line-oriented text backend. One contact per line:
///
/// `last|first|patronymic|phone,phone|email|DD-MM-YYYY`
///
/// No header, no escaping: a `|` or `,` inside a field value misaligns the
/// record on reload. That is a documented format limitation, not something
/// this backend tries to repair.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn encode(contacts: &[Contact]) -> String {
        let mut out = String::new();

        for contact in contacts {
            // Infallible, writing into a String
            let _ = writeln!(
                out,
                "{}|{}|{}|{}|{}|{}",
                contact.last_name,
                contact.first_name,
                contact.patronymic_name,
                contact.phones.join(","),
                contact.email,
                contact.birthday_display(),
            );
        }

        out
    }

    /// Lenient reader: lines with fewer than six fields or an unparseable
    /// birthday are discarded. Ids are assigned in file order since the
    /// format carries none.
    fn decode(text: &str) -> Vec<Contact> {
        let mut contacts = Vec::new();
        let mut next_id = ContactId::new_first_id();

        for line in text.lines() {
            let fields: Vec<&str> = line.split('|').collect();

            if fields.len() < 6 {
                log::debug!("Discarding malformed record: {:?}", line);
                continue;
            }

            let birthday = match NaiveDate::parse_from_str(fields[5].trim(), BIRTHDAY_FORMAT) {
                Ok(birthday) => birthday,
                Err(_) => {
                    log::debug!("Discarding record with unparseable birthday: {:?}", line);
                    continue;
                }
            };

            let phones: Vec<String> = fields[3]
                .split(',')
                .map(str::trim)
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect();

            contacts.push(Contact {
                id: next_id,
                last_name: fields[0].trim().to_string(),
                first_name: fields[1].trim().to_string(),
                patronymic_name: fields[2].trim().to_string(),
                phones,
                email: fields[4].trim().to_string(),
                birthday,
            });

            next_id = next_id.increment();
        }

        contacts
    }
}

impl PersistenceAdapter for FileBackend {
    fn init(&mut self) -> PersistenceResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(PersistenceError::io("create data directory"))?;
            }
        }

        Ok(())
    }

    // A missing file is an empty book, not an error
    fn load(&mut self) -> PersistenceResult<Vec<Contact>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(PersistenceError::io("read contacts file")(err)),
        };

        let contacts = Self::decode(&text);
        log::info!("Loaded {} contacts from {}", contacts.len(), self.path.display());

        Ok(contacts)
    }

    fn save(&mut self, contacts: &[Contact]) -> PersistenceResult<()> {
        fs::write(&self.path, Self::encode(contacts))
            .map_err(PersistenceError::io("write contacts file"))?;

        log::debug!("Saved {} contacts to {}", contacts.len(), self.path.display());

        Ok(())
    }

    // The format has no row granularity, every change rewrites the file
    fn record_create(&mut self, _contact: &Contact) -> PersistenceResult<RecordOutcome> {
        Ok(RecordOutcome::NeedsFullSave)
    }

    fn record_update(&mut self, _contact: &Contact) -> PersistenceResult<RecordOutcome> {
        Ok(RecordOutcome::NeedsFullSave)
    }

    fn record_delete(&mut self, _id: ContactId) -> PersistenceResult<RecordOutcome> {
        Ok(RecordOutcome::NeedsFullSave)
    }
}
