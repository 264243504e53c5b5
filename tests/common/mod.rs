use anyhow::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Scratch directory with a config file pointing every path into it
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let env = Self { temp_dir };
        std::fs::write(
            env.config_path(),
            format!(
                "passwd_file = \"{}\"\nvmail_base_dir = \"{}\"\nhash_scheme = \"PLAIN\"\ndoveadm_cmd = \"mail-mgmt-test-no-doveadm\"\n",
                env.passwd_path().display(),
                env.path().join("vmail").display()
            ),
        )?;
        Ok(env)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("config.toml")
    }

    pub fn passwd_path(&self) -> PathBuf {
        self.path().join("users")
    }

    pub fn maildir_path(&self, domain: &str, local: &str) -> PathBuf {
        self.path().join("vmail").join(domain).join(local).join("Maildir")
    }

    /// Run the binary with this environment's config
    pub fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        self.run_with_stdin(args, "")
    }

    /// Like [`TestEnvironment::run`], with `input` piped to stdin
    pub fn run_with_stdin(&self, args: &[&str], input: &str) -> Result<CommandOutput> {
        let config = self.config_path();
        let mut full_args = vec!["--config", config.to_str().unwrap_or_default(), "--no-color"];
        full_args.extend_from_slice(args);
        run_mail_mgmt_with_stdin(&full_args, input)
    }
}

/// Account commands refuse to run without root
pub fn running_as_root() -> bool {
    !matches!(sudo::check(), sudo::RunningAs::User)
}

pub fn run_mail_mgmt(args: &[&str]) -> Result<CommandOutput> {
    run_mail_mgmt_with_stdin(args, "")
}

pub fn run_mail_mgmt_with_stdin(args: &[&str], input: &str) -> Result<CommandOutput> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_mail-mgmt"))
        .args(args)
        .env_remove("MAIL_MGMT_CONFIG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        // The child may exit before reading, which closes the pipe
        let _ = stdin.write_all(input.as_bytes());
    }
    let output = child.wait_with_output()?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}
