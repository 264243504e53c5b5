//! External command execution
//!
//! Every program this tool shells out to (`doveadm`, `chown`, `chmod`,
//! `systemctl`) goes through [`CommandRunner`]. Tests swap in
//! [`testing::FakeRunner`].

use anyhow::{Context, Result};
use duct::cmd;

use crate::common::shell::display_command;
use crate::ui::prelude::*;

/// Captured result of a finished external command
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Short human description of a failure, preferring stderr
    pub fn failure_summary(&self) -> String {
        let stderr = self.stderr.trim();
        let status = match self.code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        };
        if stderr.is_empty() {
            status
        } else {
            format!("{status}: {stderr}")
        }
    }
}

/// Runs an external program to completion.
///
/// A nonzero exit is reported through [`CommandOutput`], not as an `Err`;
/// `Err` means the program could not be started at all.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;

    /// Like [`CommandRunner::run`], but with the argument at `secret_index`
    /// masked in debug output.
    fn run_redacted(
        &self,
        program: &str,
        args: &[&str],
        secret_index: usize,
    ) -> Result<CommandOutput> {
        let _ = secret_index;
        self.run(program, args)
    }
}

/// Runs commands on the host through `duct`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    fn exec(&self, program: &str, args: &[&str], shown: &str) -> Result<CommandOutput> {
        emit(
            Level::Debug,
            "runner.exec",
            &format!("Running: {shown}"),
            None,
        );

        let output = cmd(program, args)
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()
            .with_context(|| format!("failed to execute {program}"))?;

        let result = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.success() {
            emit(
                Level::Debug,
                "runner.failed",
                &format!("{program} failed with {}", result.failure_summary()),
                None,
            );
        }

        Ok(result)
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        self.exec(program, args, &display_command(program, args, None))
    }

    fn run_redacted(
        &self,
        program: &str,
        args: &[&str],
        secret_index: usize,
    ) -> Result<CommandOutput> {
        self.exec(
            program,
            args,
            &display_command(program, args, Some(secret_index)),
        )
    }
}

#[cfg(test)]
pub mod testing {
    //! Scripted stand-in for the host's binaries.

    use super::*;
    use std::cell::RefCell;

    type Handler = Box<dyn Fn(&str, &[&str]) -> Option<CommandOutput>>;

    /// Records every invocation and answers from registered handlers.
    ///
    /// Unhandled commands succeed with empty output.
    #[derive(Default)]
    pub struct FakeRunner {
        calls: RefCell<Vec<Vec<String>>>,
        handlers: Vec<Handler>,
    }

    impl FakeRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Emulates `doveadm pw` with a reversible `{PLAIN}` scheme.
        pub fn with_doveadm(self) -> Self {
            self.on(|program, args| {
                if program != "doveadm" || args.first() != Some(&"pw") {
                    return None;
                }
                match args {
                    ["pw", "-s", scheme, "-p", plain] => Some(ok(&format!("{{{scheme}}}{plain}\n"))),
                    ["pw", "-t", hash, "-p", plain] => {
                        let matches = hash.split_once('}').map(|(_, p)| p) == Some(*plain);
                        Some(if matches { ok("(verified)\n") } else { fail(1, "Password mismatch") })
                    }
                    _ => Some(fail(64, "usage")),
                }
            })
        }

        /// Makes every invocation of `program` exit with `code`.
        pub fn failing(self, program: &'static str, code: i32) -> Self {
            self.on(move |p, _| (p == program).then(|| fail(code, "simulated failure")))
        }

        pub fn on(
            mut self,
            handler: impl Fn(&str, &[&str]) -> Option<CommandOutput> + 'static,
        ) -> Self {
            self.handlers.push(Box::new(handler));
            self
        }

        pub fn calls(&self) -> Vec<Vec<String>> {
            self.calls.borrow().clone()
        }

        pub fn calls_to(&self, program: &str) -> Vec<Vec<String>> {
            self.calls()
                .into_iter()
                .filter(|call| call.first().map(String::as_str) == Some(program))
                .collect()
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
            let mut call = vec![program.to_string()];
            call.extend(args.iter().map(|a| a.to_string()));
            self.calls.borrow_mut().push(call);

            Ok(self
                .handlers
                .iter()
                .find_map(|handler| handler(program, args))
                .unwrap_or_else(|| ok("")))
        }
    }

    pub fn ok(stdout: &str) -> CommandOutput {
        CommandOutput {
            code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    pub fn fail(code: i32, stderr: &str) -> CommandOutput {
        CommandOutput {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}
