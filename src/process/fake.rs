//! Scriptable process runner for tests
//!
//! Records every command it is asked to run and answers with a per-program
//! response. Programs without a response succeed silently.

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::Mutex;

use super::{CommandSpec, ProcessOutput, ProcessRunner};

type Responder = Box<dyn Fn(&CommandSpec) -> ProcessOutput>;

/// Fake runner capturing argv and returning configured outcomes
#[derive(Default)]
pub struct FakeRunner {
    calls: Mutex<Vec<CommandSpec>>,
    responders: HashMap<String, Responder>,
    unspawnable: HashSet<String>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands for `program` with a closure; the closure may touch
    /// the filesystem to simulate the program's side effects
    pub fn respond<F>(mut self, program: &str, responder: F) -> Self
    where
        F: Fn(&CommandSpec) -> ProcessOutput + 'static,
    {
        self.responders.insert(program.to_string(), Box::new(responder));
        self
    }

    /// Make `program` exit with `code`
    pub fn exit_with(self, program: &str, code: i32) -> Self {
        self.respond(program, move |_| ProcessOutput::failed(code, format!("exit {}", code)))
    }

    /// Make `program` fail to start, as if it were not installed
    pub fn unspawnable(mut self, program: &str) -> Self {
        self.unspawnable.insert(program.to_string());
        self
    }

    /// Every command run so far, in order
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Programs run so far, in order
    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.program).collect()
    }
}

impl ProcessRunner for FakeRunner {
    fn run(&self, command: &CommandSpec) -> io::Result<ProcessOutput> {
        match self.calls.lock() {
            Ok(mut calls) => calls.push(command.clone()),
            Err(poisoned) => poisoned.into_inner().push(command.clone()),
        }

        if self.unspawnable.contains(&command.program) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: command not found", command.program),
            ));
        }

        Ok(self
            .responders
            .get(&command.program)
            .map(|respond| respond(command))
            .unwrap_or_else(ProcessOutput::ok))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn spec(program: &str) -> CommandSpec {
        CommandSpec {
            program: program.into(),
            args: vec!["arg".into()],
            env: BTreeMap::new(),
        }
    }

    #[test]
    fn test_records_and_responds() {
        let runner = FakeRunner::new().exit_with("mysqldump", 2).unspawnable("tar");

        assert!(runner.run(&spec("cp")).unwrap().success());
        assert_eq!(runner.run(&spec("mysqldump")).unwrap().exit_code, Some(2));
        assert!(runner.run(&spec("tar")).is_err());

        assert_eq!(runner.programs(), vec!["cp", "mysqldump", "tar"]);
        assert_eq!(runner.calls()[0].args, vec!["arg".to_string()]);
    }
}
