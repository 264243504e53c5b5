use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::os::unix::fs::{MetadataExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::error::StoreError;

/// Mode for a passwd file created from scratch
const PASSWD_FILE_MODE: u32 = 0o600;

/// Dovecot passwd-file with one `user:hash` record per line
///
/// Every call goes to disk; nothing is cached between operations.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self, user: &str) -> Result<bool, StoreError> {
        Ok(self.lookup(user)?.is_some())
    }

    /// Stored hash for `user`. A missing file counts as an empty store.
    pub fn lookup(&self, user: &str) -> Result<Option<String>, StoreError> {
        let Some(contents) = self.read()? else {
            return Ok(None);
        };
        Ok(contents
            .lines()
            .find_map(|line| record_hash(line, user))
            .map(str::to_string))
    }

    /// Add a record at the end of the file
    pub fn append(&self, user: &str, hash: &str) -> Result<(), StoreError> {
        let needs_separator = match self.read()? {
            Some(contents) => !contents.is_empty() && !contents.ends_with('\n'),
            None => false,
        };

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .mode(PASSWD_FILE_MODE)
            .open(&self.path)
            .map_err(|source| self.write_error(source))?;

        let mut record = String::new();
        if needs_separator {
            record.push('\n');
        }
        record.push_str(&format!("{user}:{hash}\n"));

        file.write_all(record.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|source| self.write_error(source))
    }

    /// Drop every record for `user`, returning how many were removed
    pub fn remove(&self, user: &str) -> Result<usize, StoreError> {
        let contents = self.read_existing()?;
        let before = contents.lines().count();
        let kept: Vec<&str> = contents
            .lines()
            .filter(|line| record_hash(line, user).is_none())
            .collect();
        let removed = before - kept.len();

        self.rewrite(&kept)?;
        Ok(removed)
    }

    /// Swap the hash on `user`'s record, keeping its position.
    ///
    /// Later duplicate records for the same user are dropped.
    pub fn replace(&self, user: &str, new_hash: &str) -> Result<(), StoreError> {
        let contents = self.read_existing()?;
        let replacement = format!("{user}:{new_hash}");
        let mut replaced = false;
        let mut lines: Vec<&str> = Vec::new();

        for line in contents.lines() {
            if record_hash(line, user).is_none() {
                lines.push(line);
            } else if !replaced {
                lines.push(&replacement);
                replaced = true;
            }
        }

        if !replaced {
            return Err(StoreError::NotFound(user.to_string()));
        }
        self.rewrite(&lines)
    }

    fn read(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn read_existing(&self) -> Result<String, StoreError> {
        fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })
    }

    /// Atomically replace the file with `lines`.
    ///
    /// Output is the lines joined by `\n` with trailing blank lines removed
    /// and exactly one final newline; an empty store is an empty file. The
    /// original file's mode and owner carry over to the new one. A symlinked
    /// passwd file is rewritten at its target and the link stays in place.
    fn rewrite(&self, lines: &[&str]) -> Result<(), StoreError> {
        let contents = render(lines);
        let target = fs::canonicalize(&self.path).unwrap_or_else(|_| self.path.clone());
        let dir = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = NamedTempFile::new_in(dir).map_err(|source| self.write_error(source))?;
        tmp.write_all(contents.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|source| self.write_error(source))?;

        if let Ok(meta) = fs::metadata(&target) {
            let perms = fs::Permissions::from_mode(meta.mode() & 0o7777);
            fs::set_permissions(tmp.path(), perms).map_err(|source| self.write_error(source))?;
            // Only root may chown; a non-root run keeps the temp file's owner.
            if let Err(source) =
                std::os::unix::fs::chown(tmp.path(), Some(meta.uid()), Some(meta.gid()))
            {
                if source.kind() != ErrorKind::PermissionDenied {
                    return Err(self.write_error(source));
                }
            }
        }

        tmp.persist(&target)
            .map_err(|err| self.write_error(err.error))?;
        Ok(())
    }

    fn write_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

/// Hash part of `line` if it is a record for `user`
fn record_hash<'a>(line: &'a str, user: &str) -> Option<&'a str> {
    line.strip_prefix(user)?.strip_prefix(':')
}

fn render(lines: &[&str]) -> String {
    let end = lines
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map_or(0, |index| index + 1);
    if end == 0 {
        return String::new();
    }
    let mut out = lines[..end].join("\n");
    out.push('\n');
    out
}
