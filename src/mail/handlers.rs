use anyhow::{Context, Result};

use crate::common::config::MailConfig;
use crate::common::runner::CommandRunner;
use crate::common::systemd::SystemdManager;
use crate::ui::prelude::*;

use super::email::Address;
use super::error::AccountError;
use super::hasher::PasswordHasher;
use super::maildir::MaildirProvisioner;
use super::prompt::{Prompter, is_affirmative, password_with_confirmation};
use super::store::CredentialStore;

/// How a delete request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

/// Runs the account commands against one configuration
pub struct AccountManager<'a> {
    config: &'a MailConfig,
    runner: &'a dyn CommandRunner,
    prompter: &'a dyn Prompter,
    store: CredentialStore,
}

impl<'a> AccountManager<'a> {
    pub fn new(
        config: &'a MailConfig,
        runner: &'a dyn CommandRunner,
        prompter: &'a dyn Prompter,
    ) -> Self {
        Self {
            config,
            runner,
            prompter,
            store: CredentialStore::new(&config.passwd_file),
        }
    }

    fn hasher(&self) -> PasswordHasher<'_> {
        PasswordHasher::new(&self.config.doveadm_cmd, &self.config.hash_scheme, self.runner)
    }

    fn maildirs(&self) -> MaildirProvisioner<'_> {
        MaildirProvisioner::new(
            &self.config.vmail_base_dir,
            self.config.vmail_owner(),
            self.runner,
        )
    }

    pub fn create(&self, user: &str, password: Option<String>) -> Result<()> {
        info("mail.create.start", &format!("Creating mail user: {user}"));

        let address = Address::parse(user)?;
        if self.store.exists(user)? {
            return Err(AccountError::AlreadyExists(user.to_string()).into());
        }

        let password = match non_empty(password) {
            Some(password) => password,
            None => password_with_confirmation(
                self.prompter,
                &format!("Enter password for {user}"),
                "Confirm password",
            )?,
        };
        if password.is_empty() {
            return Err(AccountError::EmptyPassword.into());
        }

        step("mail.create.hash", "Generating password hash...");
        let hash = self
            .hasher()
            .hash(&password)
            .context("Failed to generate password hash")?;

        step(
            "mail.create.store",
            &format!("Adding user to {}...", self.store.path().display()),
        );
        self.store
            .append(user, &hash)
            .context("Failed to add user to passwd file")?;

        step("mail.create.maildir", "Creating Maildir structure...");
        let maildir = self
            .maildirs()
            .create(&address)
            .context("Failed to create Maildir")?;
        emit(
            Level::Debug,
            "mail.create.maildir.path",
            &format!("Maildir at {}", maildir.display()),
            None,
        );

        self.reload_service();

        emit(
            Level::Success,
            "mail.create.done",
            &format!("User created successfully: {user}"),
            Some(serde_json::json!({ "user": user, "maildir": maildir })),
        );
        Ok(())
    }

    pub fn delete(&self, user: &str, skip_confirm: bool) -> Result<DeleteOutcome> {
        info("mail.delete.start", &format!("Deleting mail user: {user}"));

        let address = Address::parse(user)?;
        if !self.store.exists(user)? {
            return Err(AccountError::NotFound(user.to_string()).into());
        }

        if !skip_confirm {
            emit(
                Level::Warn,
                "mail.delete.confirm",
                &format!("This will permanently delete user {user} and all their emails"),
                None,
            );
            let answer = self.prompter.answer("Are you sure? (yes/no)")?;
            if !is_affirmative(&answer) {
                info("mail.delete.cancelled", "Deletion cancelled");
                return Ok(DeleteOutcome::Cancelled);
            }
        }

        step(
            "mail.delete.store",
            &format!("Removing user from {}...", self.store.path().display()),
        );
        self.store
            .remove(user)
            .context("Failed to remove user from passwd file")?;

        step("mail.delete.maildir", "Deleting Maildir...");
        if let Err(err) = self.maildirs().delete(&address) {
            let err = anyhow::Error::from(err);
            emit(
                Level::Warn,
                "mail.delete.maildir_failed",
                &format!("Failed to delete Maildir: {err:#}"),
                None,
            );
        }

        self.reload_service();

        emit(
            Level::Success,
            "mail.delete.done",
            &format!("User deleted successfully: {user}"),
            Some(serde_json::json!({ "user": user })),
        );
        Ok(DeleteOutcome::Deleted)
    }

    pub fn change_password(
        &self,
        user: &str,
        old_password: Option<String>,
        new_password: Option<String>,
    ) -> Result<()> {
        info("mail.passwd.start", &format!("Changing password for: {user}"));

        Address::parse(user)?;
        if !self.store.exists(user)? {
            return Err(AccountError::NotFound(user.to_string()).into());
        }

        let old_password = match non_empty(old_password) {
            Some(password) => password,
            None => self.prompter.password("Enter current password")?,
        };

        step("mail.passwd.verify", "Verifying current password...");
        let stored_hash = self
            .store
            .lookup(user)?
            .ok_or_else(|| AccountError::NotFound(user.to_string()))
            .context("Failed to get user hash")?;
        if !self.hasher().verify(&stored_hash, &old_password) {
            return Err(AccountError::IncorrectPassword.into());
        }

        let new_password = match non_empty(new_password) {
            Some(password) => password,
            None => password_with_confirmation(
                self.prompter,
                "Enter new password",
                "Confirm new password",
            )?,
        };
        if new_password.is_empty() {
            return Err(AccountError::EmptyPassword.into());
        }

        step("mail.passwd.hash", "Generating new password hash...");
        let new_hash = self
            .hasher()
            .hash(&new_password)
            .context("Failed to generate password hash")?;

        step("mail.passwd.store", "Updating password...");
        self.store
            .replace(user, &new_hash)
            .context("Failed to update password")?;

        self.reload_service();

        emit(
            Level::Success,
            "mail.passwd.done",
            &format!("Password updated successfully for: {user}"),
            Some(serde_json::json!({ "user": user })),
        );
        Ok(())
    }

    /// Reload Dovecot; a failure is only a warning
    fn reload_service(&self) {
        let service = &self.config.dovecot_service;
        step("mail.reload", &format!("Reloading {service}..."));
        if let Err(err) = SystemdManager::new(self.runner).reload(service) {
            emit(
                Level::Warn,
                "mail.reload.failed",
                &format!("Failed to reload {service}: {err:#}"),
                None,
            );
        }
    }
}

/// An empty flag value means "ask interactively"
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn info(code: &str, message: &str) {
    emit(Level::Info, code, message, None);
}

fn step(code: &str, message: &str) {
    emit(Level::Step, code, message, None);
}
