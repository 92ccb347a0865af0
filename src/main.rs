use std::path::PathBuf;

use anyhow::bail;
use clap::{Args, Parser, Subcommand};

use contactdb::consts::consts::{ContactId, IdentityKey};
use contactdb::database::book::{AddressBook, AddressBookOptions};
use contactdb::database::store::ContactRef;
use contactdb::model::contact::{Contact, ContactDraft};
use contactdb::persistence::adapter::StorageEngine;

/// 📇 contactdb, a single-user address book over a text file or a SQLite
/// database
///
/// Contacts are identified either by their numeric id or by the full
/// "Last First Patronymic" name key.
#[derive(Parser, Debug)]
struct Cli {
    /// Path of the contacts text file (the default storage)
    #[clap(long, default_value = "contacts.txt")]
    file: PathBuf,

    /// Use the SQLite database at this path instead of the text file
    #[clap(long)]
    database: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every contact, sorted by name
    List,

    /// Validate and add a new contact
    Add(DraftArgs),

    /// Replace all fields of an existing contact
    Edit {
        #[clap(flatten)]
        target: TargetArgs,

        #[clap(flatten)]
        draft: DraftArgs,
    },

    /// Delete a contact
    Remove {
        #[clap(flatten)]
        target: TargetArgs,
    },

    /// Append one phone number to a contact
    AddPhone {
        #[clap(flatten)]
        target: TargetArgs,

        /// Phone in the +7XXXXXXXXXX form
        phone: String,
    },

    /// Print the contacts matching a query
    Search {
        /// Terms separated by commas, or a "Last First" name phrase
        query: String,
    },
}

#[derive(Args, Debug)]
struct DraftArgs {
    #[clap(long)]
    last_name: String,

    #[clap(long)]
    first_name: String,

    #[clap(long)]
    patronymic: String,

    /// One or more phones in the +7XXXXXXXXXX form, separated by commas
    #[clap(long)]
    phones: String,

    #[clap(long)]
    email: String,

    /// DD-MM-YYYY, strictly before today
    #[clap(long)]
    birthday: String,
}

impl DraftArgs {
    fn into_draft(self) -> ContactDraft {
        ContactDraft {
            last_name: self.last_name,
            first_name: self.first_name,
            patronymic_name: self.patronymic,
            phones: self.phones,
            email: self.email,
            birthday: self.birthday,
        }
    }
}

#[derive(Args, Debug)]
struct TargetArgs {
    /// Numeric contact id
    #[clap(long)]
    id: Option<i64>,

    /// Full "Last First Patronymic" name key
    #[clap(long)]
    key: Option<String>,
}

impl TargetArgs {
    fn into_ref(self) -> anyhow::Result<ContactRef> {
        match (self.id, self.key) {
            (Some(id), _) => Ok(ContactRef::Id(ContactId(id))),
            (None, Some(key)) => Ok(ContactRef::Key(IdentityKey(key))),
            (None, None) => bail!("pass either --id or --key to pick a contact"),
        }
    }
}

fn print_contact(contact: &Contact) {
    println!(
        "{:>4}  {:<40}  {:<30}  {:<25}  {}",
        contact.id,
        contact.identity_key(),
        contact.phones_display(),
        contact.email,
        contact.birthday_display(),
    );
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("warn"));

    let args = Cli::parse();

    let storage_engine = match args.database {
        Some(path) => StorageEngine::Table(path),
        None => StorageEngine::File(args.file),
    };

    let options = AddressBookOptions::default().set_storage_engine(storage_engine);
    let mut book = AddressBook::open(options)?;

    match args.command {
        Command::List => {
            for contact in book.load_all() {
                print_contact(&contact);
            }
        }
        Command::Add(draft) => {
            let created = book.create(&draft.into_draft())?;
            print_contact(&created);
        }
        Command::Edit { target, draft } => {
            let updated = book.update(&target.into_ref()?, &draft.into_draft())?;
            print_contact(&updated);
        }
        Command::Remove { target } => {
            book.remove(&target.into_ref()?)?;
            println!("Removed");
        }
        Command::AddPhone { target, phone } => {
            let contact = book.add_phone(&target.into_ref()?, &phone)?;
            print_contact(&contact);
        }
        Command::Search { query } => {
            let matching = book.search(&query);

            for contact in book.load_all() {
                if matching.contains(&contact.id) {
                    print_contact(&contact);
                }
            }
        }
    }

    Ok(())
}
