use anyhow::{Context, Result};

use crate::common::runner::CommandRunner;
use crate::ui::prelude::*;

use super::error::HashError;

/// Position of the plaintext in `pw -s <scheme> -p <plaintext>`
const PLAINTEXT_ARG: usize = 4;

/// Password hashing and verification through `doveadm pw`
pub struct PasswordHasher<'a> {
    doveadm: &'a str,
    scheme: &'a str,
    runner: &'a dyn CommandRunner,
}

impl<'a> PasswordHasher<'a> {
    pub fn new(doveadm: &'a str, scheme: &'a str, runner: &'a dyn CommandRunner) -> Self {
        Self {
            doveadm,
            scheme,
            runner,
        }
    }

    /// Fail early with a readable message when doveadm is not installed
    pub fn ensure_available(&self) -> Result<(), HashError> {
        which::which(self.doveadm)
            .map(|_| ())
            .map_err(|_| HashError::MissingTool(self.doveadm.to_string()))
    }

    pub fn hash(&self, plaintext: &str) -> Result<String> {
        let output = self
            .runner
            .run_redacted(
                self.doveadm,
                &["pw", "-s", self.scheme, "-p", plaintext],
                PLAINTEXT_ARG,
            )
            .with_context(|| format!("running {} pw", self.doveadm))?;

        if !output.success() {
            return Err(HashError::Failed(output.failure_summary()).into());
        }

        let hash = output.stdout.trim();
        if hash.is_empty() {
            return Err(HashError::EmptyOutput.into());
        }
        Ok(hash.to_string())
    }

    /// True only when doveadm confirms `plaintext` matches `hash`.
    /// A doveadm error is indistinguishable from a mismatch.
    pub fn verify(&self, hash: &str, plaintext: &str) -> bool {
        match self.runner.run_redacted(
            self.doveadm,
            &["pw", "-t", hash, "-p", plaintext],
            PLAINTEXT_ARG,
        ) {
            Ok(output) => output.success(),
            Err(err) => {
                emit(
                    Level::Debug,
                    "mail.hash.verify_error",
                    &format!("password verification could not run: {err:#}"),
                    None,
                );
                false
            }
        }
    }
}
