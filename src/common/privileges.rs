use sudo::RunningAs;
use thiserror::Error;

/// Fail unless the process runs with an effective uid of 0
pub fn require_root() -> Result<(), PrivilegeError> {
    check_running_as(sudo::check())
}

/// Plain user runs are refused. A setuid-root binary has effective root and
/// is accepted.
fn check_running_as(running_as: RunningAs) -> Result<(), PrivilegeError> {
    match running_as {
        RunningAs::User => Err(PrivilegeError::NeedRoot),
        _ => Ok(()),
    }
}

#[derive(Debug, Error)]
pub enum PrivilegeError {
    #[error("This program must be run as root (use sudo)")]
    NeedRoot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_root_is_enough() {
        assert!(check_running_as(RunningAs::Root).is_ok());
        assert!(check_running_as(RunningAs::Suid).is_ok());
        assert!(matches!(
            check_running_as(RunningAs::User),
            Err(PrivilegeError::NeedRoot)
        ));
    }
}
