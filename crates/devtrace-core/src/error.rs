use thiserror::Error;

/// Failures while enumerating devices through the management tool.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Output looked like a device list but contained malformed entries.
    #[error("invalid device list: {0:?}")]
    InvalidDeviceList(String),
    /// The tool ran but reported a non-success outcome.
    #[error("Process returned error: {0}")]
    InvalidStatus(String),
    /// Output does not resemble a device list at all.
    #[error("output is not a device list: {0:?}")]
    NoDeviceList(String),
    /// The tool could not be started or communicated with.
    #[error("failed to run device-management tool: {0}")]
    ProcessFailure(#[from] std::io::Error),
    /// Querying a discovered device's identity failed.
    #[error("failed to query device identity: {0}")]
    Enrichment(#[source] DeviceError),
}

/// Failures of individual device operations.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device command failed: {0}")]
    CommandFailed(String),
    #[error("device i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("property {0:?} unavailable")]
    PropertyUnavailable(String),
}

/// Failures of a trace-capture session or the tracer facade, named by the
/// phase that failed.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The session was aborted before or during capture.
    #[error("trace cancelled")]
    Cancelled,
    #[error("failed to create trace temp file: {0}")]
    TempFile(#[source] std::io::Error),
    #[error("failed to start capture: {0}")]
    StartFailed(#[source] DeviceError),
    #[error("failed to stop capture: {0}")]
    StopFailed(#[source] DeviceError),
    /// The drain to the caller's destination failed; `written` is the number
    /// of bytes that made it out before the failure.
    #[error("failed to copy trace after {written} bytes: {source}")]
    CopyFailed {
        written: u64,
        #[source]
        source: std::io::Error,
    },
    /// The device's validation probe itself failed.
    #[error("device validation failed: {0}")]
    Validation(#[source] DeviceError),
    /// The operation has no implementation on this platform. Distinct from
    /// an empty success.
    #[error("not supported on this platform")]
    Unsupported,
}
