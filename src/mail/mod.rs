//! Virtual mail account management
//!
//! Accounts live in two places that are updated independently: a record in
//! the Dovecot passwd-file and a Maildir tree under the vmail base
//! directory. There is no rollback between the two.

mod email;
mod error;
mod handlers;
mod hasher;
mod maildir;
mod prompt;
mod store;

pub use handlers::AccountManager;
pub use hasher::PasswordHasher;
pub use maildir::MAILDIR_MODE;
pub use prompt::TerminalPrompter;
