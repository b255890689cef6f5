// https://www.rfc-editor.org/rfc/rfc3501 - IMAP4rev1
// https://www.rfc-editor.org/rfc/rfc4315 - [...] UIDPLUS extension
// https://www.rfc-editor.org/rfc/rfc4551 - IMAP Extension for Conditional STORE (CONDSTORE)
// https://www.rfc-editor.org/rfc/rfc5161 - IMAP ENABLE Extension
// https://www.rfc-editor.org/rfc/rfc7888 - IMAP4 Non-synchronizing Literals

#![allow(clippy::upper_case_acronyms)]

pub mod auth;
pub mod command;
pub mod connection;
pub mod datetime;
pub mod error;
pub mod events;
pub mod folder;
pub mod message;
pub mod parser;
pub mod set;
pub mod socket;
pub mod store;
pub mod structure;
mod tag;
pub mod timeout;
pub mod utf7;

#[cfg(test)]
mod testing;

pub use auth::{Authenticator, Mechanism, StaticCredentials};
pub use connection::Connection;
pub use error::Error;
pub use events::{FolderEvent, Listener, MessageChangeKind, MessageChangedEvent, MessageCount};
pub use folder::{Folder, OpenMode};
pub use message::{Flag, Message};
pub use set::MessageSet;
pub use store::{Context, FolderListing, Security, Store};
