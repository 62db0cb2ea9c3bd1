use tracing::debug;

/// Captured output of one management-tool invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Executes device-management tool commands. The registry and
/// [`ShellDevice`][crate::ShellDevice] only ever talk to the tool through
/// this trait, so tests can substitute canned outputs.
#[allow(async_fn_in_trait)]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, args: &[&str]) -> std::io::Result<CommandOutput>;
}

/// Runs the real management tool as a subprocess.
#[derive(Debug, Clone)]
pub struct ToolRunner {
    program: String,
}

impl ToolRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for ToolRunner {
    fn default() -> Self {
        Self::new("ffx")
    }
}

impl CommandRunner for ToolRunner {
    async fn run(&self, args: &[&str]) -> std::io::Result<CommandOutput> {
        debug!(program = %self.program, ?args, "running device-management tool");
        let output = tokio::process::Command::new(&self.program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
