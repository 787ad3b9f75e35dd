//! Type-Safe Command Execution
//!
//! `CommandRunner` is the only component allowed to change host state. Every
//! workflow step goes through `CommandRunner::run`, which:
//!
//! - records the quoted command line in the transcript and echoes it
//! - in simulate mode, returns success without executing anything
//! - otherwise executes the tool and applies the step's failure policy
//!
//! The actual process spawning sits behind the `Executor` trait so workflows
//! can be driven against a scripted executor in tests.

use crate::engine::step::WorkflowStep;
use crate::error::{RaidError, Result};
use crate::process_guard::{ChildRegistry, CommandProcessGroup};
use crate::tool_traits::ToolArgs;
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// Outcome of one executed tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code (None if terminated by signal).
    pub exit_code: Option<i32>,
    /// Captured standard error, when the executor captures it.
    pub stderr: String,
}

impl ToolOutput {
    /// A zero exit status
    pub fn ok() -> Self {
        Self {
            exit_code: Some(0),
            stderr: String::new(),
        }
    }

    /// A failed exit status
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stderr: stderr.into(),
        }
    }

    /// Whether the tool exited with status 0
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    fn failure_reason(&self) -> String {
        let code = match self.exit_code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        };
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            code
        } else {
            format!("{}: {}", code, stderr)
        }
    }
}

/// Runs one external tool to completion.
pub trait Executor {
    fn execute(&mut self, tool: &dyn ToolArgs) -> Result<ToolOutput>;
}

/// Executor that spawns real processes.
///
/// Standard streams are inherited and the child stays in the foreground
/// process group, so the operator sees tool output and can answer prompts
/// such as mdadm's "Continue creating array?".
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn execute(&mut self, tool: &dyn ToolArgs) -> Result<ToolOutput> {
        let mut cmd = Command::new(tool.program());
        cmd.args(tool.to_cli_args())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let registry = ChildRegistry::global();
        let mut child = {
            let mut guard = registry
                .lock()
                .map_err(|_| RaidError::step(tool.command_line(), "child registry poisoned"))?;
            if guard.is_shutdown_requested() {
                return Err(RaidError::Interrupted {
                    command: tool.command_line(),
                });
            }
            let child = cmd.spawn()?;
            guard.register(child.id());
            child
        };

        let pid = child.id();
        let status = child.wait();

        if let Ok(mut guard) = registry.lock() {
            guard.unregister(pid);
        }

        let status = status?;
        Ok(ToolOutput {
            exit_code: status.code(),
            stderr: String::new(),
        })
    }
}

/// Run a read-only tool and capture its standard output.
///
/// Used for discovery queries (`mdadm --detail`), which run in simulate mode
/// too and never appear in the step transcript.
pub fn capture<T: ToolArgs>(tool: &T) -> Result<String> {
    let line = tool.command_line();
    debug!("capture: {}", line);

    let output = Command::new(tool.program())
        .args(tool.to_cli_args())
        .stdin(Stdio::null())
        .in_new_process_group()
        .output()?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        let result = ToolOutput {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        Err(RaidError::step(line, result.failure_reason()))
    }
}

/// Executes workflow steps, honoring simulate mode and per-step failure policy.
#[derive(Debug)]
pub struct CommandRunner<E: Executor = SystemExecutor> {
    executor: E,
    simulate: bool,
    echo: bool,
    transcript: Vec<String>,
}

impl CommandRunner<SystemExecutor> {
    /// Runner that spawns real processes
    pub fn system(simulate: bool) -> Self {
        Self::new(SystemExecutor, simulate)
    }
}

impl<E: Executor> CommandRunner<E> {
    pub fn new(executor: E, simulate: bool) -> Self {
        Self {
            executor,
            simulate,
            echo: false,
            transcript: Vec::new(),
        }
    }

    /// Print each command as ` + <command>` on stdout before acting on it.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn is_simulated(&self) -> bool {
        self.simulate
    }

    /// Every command line issued so far, in order.
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Print a progress message alongside the command echo.
    pub fn announce(&self, message: &str) {
        if self.echo {
            println!("{}", message);
        }
        info!("{}", message);
    }

    /// Run one step.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` - the tool succeeded, or simulate mode is on
    /// - `Ok(false)` - the tool failed and the step tolerates failure
    /// - `Err(StepExecution)` - the tool failed and the step is fatal
    pub fn run(&mut self, step: &WorkflowStep) -> Result<bool> {
        let tool = step.op.tool();
        let line = tool.command_line();

        self.transcript.push(line.clone());
        if self.echo {
            println!(" + {}", line);
        }
        info!(
            op = %step.op,
            simulate = self.simulate,
            tolerate = step.tolerate_failure,
            "+ {}",
            line
        );

        if self.simulate {
            return Ok(true);
        }

        let output = match self.executor.execute(tool) {
            Ok(output) => output,
            Err(err @ RaidError::Interrupted { .. }) => return Err(err),
            Err(err) if step.tolerate_failure => {
                warn!("{} could not be run ({}); continuing", step.op, err);
                return Ok(false);
            }
            Err(err) => return Err(RaidError::step(line, err.to_string())),
        };

        if output.success() {
            return Ok(true);
        }

        if step.tolerate_failure {
            debug!("{} failed ({}); tolerated", step.op, output.failure_reason());
            Ok(false)
        } else {
            Err(RaidError::step(line, output.failure_reason()))
        }
    }
}
