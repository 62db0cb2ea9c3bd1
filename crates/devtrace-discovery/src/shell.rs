//! Device operations issued as management-tool subcommands.

use std::io::Write as _;
use std::path::Path;

use devtrace_core::device::{CaptureDevice, DeviceRecord, RemoteDevice};
use devtrace_core::error::DeviceError;
use devtrace_core::options::TraceOptions;
use devtrace_core::signal::Signal;
use tracing::debug;

use crate::runner::{CommandOutput, CommandRunner};

/// A remote device driven through `<tool> -t <name> …` subcommands.
#[derive(Debug, Clone)]
pub struct ShellDevice<R> {
    runner: R,
    record: DeviceRecord,
}

impl<R: CommandRunner> ShellDevice<R> {
    pub fn new(runner: R, record: DeviceRecord) -> Self {
        Self { runner, record }
    }

    pub fn record(&self) -> &DeviceRecord {
        &self.record
    }

    /// Run a subcommand targeted at this device, mapping non-success exits
    /// to [`DeviceError::CommandFailed`] with the tool's stderr.
    async fn run_checked(&self, args: &[&str]) -> Result<CommandOutput, DeviceError> {
        let mut full = vec!["-t", self.record.name.as_str()];
        full.extend_from_slice(args);
        let output = self.runner.run(&full).await?;
        if !output.success {
            return Err(DeviceError::CommandFailed(output.stderr.trim().to_string()));
        }
        Ok(output)
    }
}

impl<R: CommandRunner> RemoteDevice for ShellDevice<R> {
    fn name(&self) -> &str {
        &self.record.name
    }

    async fn get_property(&self, name: &str) -> Result<String, DeviceError> {
        let output = self.run_checked(&["property", "get", name]).await?;
        let value = output.stdout.trim();
        if value.is_empty() {
            return Err(DeviceError::PropertyUnavailable(name.to_string()));
        }
        Ok(value.to_string())
    }

    async fn set_property(&self, name: &str, value: &str) -> Result<(), DeviceError> {
        self.run_checked(&["property", "set", name, value]).await?;
        Ok(())
    }

    async fn push_file(&self, local: &Path, remote: &str) -> Result<(), DeviceError> {
        let local = local.to_string_lossy();
        self.run_checked(&["file", "push", &local, remote]).await?;
        Ok(())
    }

    async fn pull_file(&self, remote: &str, local: &Path) -> Result<(), DeviceError> {
        let local = local.to_string_lossy();
        self.run_checked(&["file", "pull", remote, &local]).await?;
        Ok(())
    }
}

impl<R: CommandRunner> CaptureDevice for ShellDevice<R> {
    async fn start_capture(
        &self,
        options: &TraceOptions,
        dest: &Path,
        _stop: Signal,
        ready: Signal,
    ) -> Result<(), DeviceError> {
        let dest = dest.to_string_lossy();
        let mut args = vec!["trace", "start", "--background", "--output", &*dest];

        // The opaque platform config goes to the tool as a file; it must
        // outlive the command, so it is dropped only after run_checked.
        let config_file = if options.platform_config.is_empty() {
            None
        } else {
            let mut file = tempfile::NamedTempFile::new()?;
            file.write_all(&options.platform_config)?;
            file.flush()?;
            Some(file)
        };
        let config_path = config_file
            .as_ref()
            .map(|f| f.path().to_string_lossy().into_owned());
        if let Some(path) = &config_path {
            args.push("--config");
            args.push(path.as_str());
        }

        self.run_checked(&args).await?;
        debug!(device = %self.record.name, "trace recorder running");
        ready.fire();
        Ok(())
    }

    async fn stop_capture(&self, dest: &Path) -> Result<(), DeviceError> {
        let dest = dest.to_string_lossy();
        self.run_checked(&["trace", "stop", "--output", &*dest])
            .await?;
        debug!(device = %self.record.name, "trace recorder stopped");
        Ok(())
    }
}
