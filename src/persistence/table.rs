use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{params, Connection};

use crate::consts::consts::ContactId;
use crate::model::contact::{Contact, BIRTHDAY_FORMAT};

use super::adapter::{
    PersistenceAdapter, PersistenceError, PersistenceResult, RecordOutcome,
};

const CREATE_ADDRESS_BOOK_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS address_book (
        user_id     INTEGER PRIMARY KEY,
        lastname    VARCHAR(80),
        firstname   VARCHAR(80),
        patronymic  VARCHAR(80),
        phone_list  VARCHAR(120),
        email       VARCHAR(80),
        birthday    VARCHAR(30)
    )";

const INSERT_CONTACT: &str = "
    INSERT INTO address_book
        (user_id, lastname, firstname, patronymic, phone_list, email, birthday)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

/// SQLite backend over the `address_book` table. The store remains the id
/// authority: rows are written with an explicit `user_id`, so a load/save
/// cycle reproduces the table row-for-row.
pub struct TableBackend {
    connection: Connection,
}

impl TableBackend {
    pub fn open(path: &Path) -> PersistenceResult<Self> {
        let connection = Connection::open(path).map_err(PersistenceError::sql("open database"))?;

        Ok(Self { connection })
    }

    pub fn open_in_memory() -> PersistenceResult<Self> {
        let connection =
            Connection::open_in_memory().map_err(PersistenceError::sql("open database"))?;

        Ok(Self { connection })
    }

    fn row_to_contact(
        user_id: i64,
        lastname: String,
        firstname: String,
        patronymic: String,
        phone_list: String,
        email: String,
        birthday: String,
    ) -> PersistenceResult<Contact> {
        let birthday = NaiveDate::parse_from_str(&birthday, BIRTHDAY_FORMAT).map_err(|_| {
            PersistenceError::MalformedRow {
                user_id,
                detail: format!("unparseable birthday '{}'", birthday),
            }
        })?;

        let phones: Vec<String> = phone_list
            .split(',')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Contact {
            id: ContactId(user_id),
            last_name: lastname,
            first_name: firstname,
            patronymic_name: patronymic,
            phones,
            email,
            birthday,
        })
    }
}

impl PersistenceAdapter for TableBackend {
    /// CREATE TABLE IF NOT EXISTS makes re-initialisation a structural no-op,
    /// no sniffing of the engine's "already exists" error text required.
    fn init(&mut self) -> PersistenceResult<()> {
        self.connection
            .execute(CREATE_ADDRESS_BOOK_TABLE, [])
            .map_err(PersistenceError::Schema)?;

        Ok(())
    }

    fn load(&mut self) -> PersistenceResult<Vec<Contact>> {
        let mut statement = self
            .connection
            .prepare(
                "SELECT user_id, lastname, firstname, patronymic, phone_list, email, birthday
                 FROM address_book ORDER BY user_id",
            )
            .map_err(PersistenceError::sql("read address_book table"))?;

        let rows = statement
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })
            .map_err(PersistenceError::sql("read address_book table"))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(PersistenceError::sql("read address_book table"))?;

        let mut contacts = Vec::with_capacity(rows.len());
        for (user_id, lastname, firstname, patronymic, phone_list, email, birthday) in rows {
            contacts.push(Self::row_to_contact(
                user_id, lastname, firstname, patronymic, phone_list, email, birthday,
            )?);
        }

        log::info!("Loaded {} contacts from the address_book table", contacts.len());

        Ok(contacts)
    }

    /// Full delete-then-reinsert, wrapped in a transaction so a failed
    /// reinsert leaves the previous rows intact.
    fn save(&mut self, contacts: &[Contact]) -> PersistenceResult<()> {
        let tx = self
            .connection
            .transaction()
            .map_err(PersistenceError::sql("begin save transaction"))?;

        tx.execute("DELETE FROM address_book", [])
            .map_err(PersistenceError::sql("clear address_book table"))?;

        for contact in contacts {
            tx.execute(
                INSERT_CONTACT,
                params![
                    contact.id.to_number(),
                    contact.last_name,
                    contact.first_name,
                    contact.patronymic_name,
                    contact.phones.join(","),
                    contact.email,
                    contact.birthday_display(),
                ],
            )
            .map_err(PersistenceError::sql("insert contact row"))?;
        }

        tx.commit()
            .map_err(PersistenceError::sql("commit save transaction"))?;

        log::debug!("Rewrote the address_book table with {} contacts", contacts.len());

        Ok(())
    }

    fn record_create(&mut self, contact: &Contact) -> PersistenceResult<RecordOutcome> {
        self.connection
            .execute(
                INSERT_CONTACT,
                params![
                    contact.id.to_number(),
                    contact.last_name,
                    contact.first_name,
                    contact.patronymic_name,
                    contact.phones.join(","),
                    contact.email,
                    contact.birthday_display(),
                ],
            )
            .map_err(PersistenceError::sql("insert contact row"))?;

        Ok(RecordOutcome::Recorded)
    }

    fn record_update(&mut self, contact: &Contact) -> PersistenceResult<RecordOutcome> {
        let changed = self
            .connection
            .execute(
                "UPDATE address_book
                 SET lastname = ?2, firstname = ?3, patronymic = ?4,
                     phone_list = ?5, email = ?6, birthday = ?7
                 WHERE user_id = ?1",
                params![
                    contact.id.to_number(),
                    contact.last_name,
                    contact.first_name,
                    contact.patronymic_name,
                    contact.phones.join(","),
                    contact.email,
                    contact.birthday_display(),
                ],
            )
            .map_err(PersistenceError::sql("update contact row"))?;

        // Row has gone missing, let the caller rewrite the whole table
        if changed == 0 {
            log::warn!("No row with user_id {} to update, requesting full save", contact.id);
            return Ok(RecordOutcome::NeedsFullSave);
        }

        Ok(RecordOutcome::Recorded)
    }

    fn record_delete(&mut self, id: ContactId) -> PersistenceResult<RecordOutcome> {
        self.connection
            .execute(
                "DELETE FROM address_book WHERE user_id = ?1",
                params![id.to_number()],
            )
            .map_err(PersistenceError::sql("delete contact row"))?;

        Ok(RecordOutcome::Recorded)
    }
}
