//! External process invocation
//!
//! Producers (dump, copy) and compression are opaque external programs.
//! They run through the `ProcessRunner` trait with an explicit argv and
//! environment, never through a shell, so tests can swap in `FakeRunner`.

mod fake;

pub use fake::FakeRunner;

use std::collections::BTreeMap;
use std::fmt;
use std::process::Command;

use tracing::debug;

/// A fully resolved external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
}

impl CommandSpec {
    /// Build a command from a template, replacing each `{name}` placeholder
    ///
    /// Returns `None` for an empty template.
    pub fn from_template(
        template: &[String],
        env: &BTreeMap<String, String>,
        substitutions: &[(&str, String)],
    ) -> Option<Self> {
        let mut argv = template.iter().map(|arg| {
            substitutions
                .iter()
                .fold(arg.clone(), |acc, (placeholder, value)| acc.replace(placeholder, value))
        });

        let program = argv.next()?;
        Some(Self {
            program,
            args: argv.collect(),
            env: env.clone(),
        })
    }
}

impl fmt::Display for CommandSpec {
    // Environment values may hold credentials, so only names are shown
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for name in self.env.keys() {
            write!(f, "{}=*** ", name)?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// A successful, silent process
    pub fn ok() -> Self {
        Self {
            exit_code: Some(0),
            ..Self::default()
        }
    }

    /// A process that exited with `code` and wrote `stderr`
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs external commands to completion
pub trait ProcessRunner {
    /// Run `command`, blocking until it exits. `Err` means it could not be started.
    fn run(&self, command: &CommandSpec) -> std::io::Result<ProcessOutput>;
}

/// Runs commands with `std::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, command: &CommandSpec) -> std::io::Result<ProcessOutput> {
        debug!(command = %command, "Running external command");

        let output = Command::new(&command.program)
            .args(&command.args)
            .envs(&command.env)
            .output()?;

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
