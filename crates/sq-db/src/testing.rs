//! Scripted [`CommandRunner`] for tests

use crate::error::{DbError, DbResult};
use crate::traits::{CommandOutput, CommandRunner};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// One recorded invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

/// Returns canned output per program and records every call.
///
/// Programs without a scripted response fail to launch.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    responses: HashMap<String, CommandOutput>,
    calls: Mutex<Vec<Invocation>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the output `program` returns
    pub fn respond(mut self, program: &str, output: CommandOutput) -> Self {
        self.responses.insert(program.to_string(), output);
        self
    }

    /// Every invocation so far, in order
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Programs invoked so far, in order
    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.program).collect()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, program: &str, args: &[String]) -> DbResult<CommandOutput> {
        self.calls.lock().unwrap().push(Invocation {
            program: program.to_string(),
            args: args.to_vec(),
        });
        self.responses
            .get(program)
            .cloned()
            .ok_or_else(|| DbError::LaunchError {
                program: program.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not scripted"),
            })
    }
}
