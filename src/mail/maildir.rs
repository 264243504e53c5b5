use std::fs::{self, DirBuilder};
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

use crate::common::runner::CommandRunner;
use crate::common::shell::display_command;

use super::email::Address;
use super::error::MaildirError;

/// Mode applied to every directory of a mailbox
pub const MAILDIR_MODE: u32 = 0o700;

const MAILDIR_SUBDIRS: [&str; 3] = ["cur", "new", "tmp"];

/// Creates and removes `<base>/<domain>/<local>/Maildir` trees
pub struct MaildirProvisioner<'a> {
    base_dir: &'a Path,
    owner: String,
    runner: &'a dyn CommandRunner,
}

impl<'a> MaildirProvisioner<'a> {
    /// `owner` is the `user:group` pair handed to chown
    pub fn new(base_dir: &'a Path, owner: String, runner: &'a dyn CommandRunner) -> Self {
        Self {
            base_dir,
            owner,
            runner,
        }
    }

    /// The per-user directory that holds `Maildir`
    pub fn user_dir(&self, address: &Address) -> Result<PathBuf, MaildirError> {
        check_component(&address.domain)?;
        check_component(&address.local)?;
        Ok(self.base_dir.join(&address.domain).join(&address.local))
    }

    /// Build the mailbox, then hand it to the mail user.
    ///
    /// If chown or chmod fails the directories are left in place.
    pub fn create(&self, address: &Address) -> Result<PathBuf, MaildirError> {
        let user_dir = self.user_dir(address)?;
        let maildir = user_dir.join("Maildir");

        let mut builder = DirBuilder::new();
        builder.recursive(true).mode(MAILDIR_MODE);
        for sub in MAILDIR_SUBDIRS {
            let path = maildir.join(sub);
            builder
                .create(&path)
                .map_err(|source| MaildirError::Create { path, source })?;
        }

        let user_dir_arg = user_dir.to_string_lossy().into_owned();
        self.run("chown", &["-R", self.owner.as_str(), user_dir_arg.as_str()])?;
        self.run("chmod", &["-R", "700", user_dir_arg.as_str()])?;

        Ok(maildir)
    }

    /// Remove the user's directory tree. Already gone counts as success.
    pub fn delete(&self, address: &Address) -> Result<(), MaildirError> {
        let user_dir = self.user_dir(address)?;
        if !user_dir.exists() {
            return Ok(());
        }
        fs::remove_dir_all(&user_dir).map_err(|source| MaildirError::Remove {
            path: user_dir,
            source,
        })
    }

    fn run(&self, program: &str, args: &[&str]) -> Result<(), MaildirError> {
        let command = display_command(program, args, None);
        let output = self
            .runner
            .run(program, args)
            .map_err(|err| MaildirError::Command {
                command: command.clone(),
                summary: format!("{err:#}"),
            })?;
        if !output.success() {
            return Err(MaildirError::Command {
                command,
                summary: output.failure_summary(),
            });
        }
        Ok(())
    }
}

/// Reject path components that would escape the base directory
fn check_component(component: &str) -> Result<(), MaildirError> {
    if component.is_empty() || component == "." || component == ".." || component.contains('/') {
        return Err(MaildirError::UnsafePath(component.to_string()));
    }
    Ok(())
}
