use anyhow::{Result, bail};

use super::runner::CommandRunner;

/// Thin wrapper over `systemctl` for system-scope units
pub struct SystemdManager<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> SystemdManager<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Reload a unit's configuration without restarting it
    pub fn reload(&self, service_name: &str) -> Result<()> {
        let output = self.runner.run("systemctl", &["reload", service_name])?;
        if !output.success() {
            bail!(
                "systemctl reload {} failed with {}",
                service_name,
                output.failure_summary()
            );
        }
        Ok(())
    }
}
