//! Builder for executing external tool commands with timeout support.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

/// Default command timeout: long enough for a full 90-minute tape.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(4 * 60 * 60);

/// Output captured from a successful tool execution.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for constructing and executing external tool invocations.
///
/// # Example
///
/// ```no_run
/// use dvp_av::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> dvp_core::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("mediainfo"))
///     .arg("--Output=JSON")
///     .arg("/path/to/tape_00-00-00.000.mkv")
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append a path argument.
    pub fn path_arg(&mut self, p: &Path) -> &mut Self {
        self.arg(p.to_string_lossy())
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Short tool name used in error messages (`ffmpeg`, not `/usr/bin/ffmpeg`).
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// Returns [`dvp_core::Error::Tool`] if spawning fails, if the process
    /// exits with a non-zero status (message includes stderr), or if it runs
    /// past the timeout.
    pub async fn execute(&self) -> dvp_core::Result<ToolOutput> {
        let program_name = self.tool_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            dvp_core::Error::tool(program_name.clone(), format!("failed to spawn: {e}"))
        })?;

        // Dropping the future on timeout drops the child, which kills it.
        let result = tokio::time::timeout(self.timeout, child.wait_with_output()).await;

        match result {
            Ok(Ok(output)) => {
                let tool_output = ToolOutput {
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                };

                if !output.status.success() {
                    return Err(dvp_core::Error::tool(
                        program_name,
                        format!(
                            "exited with status {}: {}",
                            output.status,
                            last_lines(&tool_output.stderr, 5)
                        ),
                    ));
                }

                Ok(tool_output)
            }
            Ok(Err(e)) => Err(dvp_core::Error::tool(
                program_name,
                format!("I/O error waiting for process: {e}"),
            )),
            Err(_elapsed) => Err(dvp_core::Error::tool(
                program_name,
                format!("timed out after {:?}", self.timeout),
            )),
        }
    }
}

impl fmt::Display for ToolCommand {
    /// Shell-like rendering for logs; arguments with spaces are quoted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {arg:?}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// ffmpeg and dvrescue write progress noise to stderr; keep only the tail.
fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.trim().lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}

/// Executes [`ToolCommand`]s on behalf of the packaging engine.
///
/// The engine only ever talks to external tools through this trait.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, cmd: &ToolCommand) -> dvp_core::Result<ToolOutput>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, cmd: &ToolCommand) -> dvp_core::Result<ToolOutput> {
        tracing::debug!("exec: {cmd}");
        cmd.execute().await
    }
}
