use std::path::PathBuf;

use thiserror::Error;

/// Input problems detected before anything is changed on disk
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Invalid email format: {0}")]
    InvalidFormat(String),

    #[error("User already exists: {0}")]
    AlreadyExists(String),

    #[error("User does not exist: {0}")]
    NotFound(String),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must not be empty")]
    EmptyPassword,

    #[error("Current password is incorrect")]
    IncorrectPassword,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no entry for {0} in the passwd file")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum MaildirError {
    #[error("refusing to use unsafe path component {0:?}")]
    UnsafePath(String),

    #[error("failed to create {path}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove {path}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} failed with {summary}")]
    Command { command: String, summary: String },
}

#[derive(Debug, Error)]
pub enum HashError {
    #[error("{0} not found in PATH (is Dovecot installed?)")]
    MissingTool(String),

    #[error("doveadm pw failed with {0}")]
    Failed(String),

    #[error("doveadm pw produced no output")]
    EmptyOutput,
}
