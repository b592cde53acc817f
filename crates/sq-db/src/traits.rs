//! Command runner trait definition

use crate::error::DbResult;
use async_trait::async_trait;

/// Captured result of one program invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the program exited with status 0
    pub success: bool,

    /// Exit code, -1 when terminated by a signal
    pub exit_code: i32,

    pub stdout: String,

    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Launches external programs and waits for them to finish.
///
/// A non-zero exit is reported through [`CommandOutput`], not as an error;
/// `Err` means the program could not be run at all.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, capturing stdout and stderr
    async fn run(&self, program: &str, args: &[String]) -> DbResult<CommandOutput>;
}
