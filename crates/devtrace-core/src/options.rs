use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Caller-supplied configuration for one capture session. Immutable once a
/// session has been created from it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceOptions {
    /// Wait for an external start signal before invoking the device's
    /// start-capture primitive.
    pub defer_start: bool,
    /// How long to capture once started. `Duration::ZERO` means run until
    /// externally stopped.
    pub duration: Duration,
    /// Opaque platform trace configuration (buffer sizes, counter selection)
    /// forwarded verbatim to the device.
    pub platform_config: Vec<u8>,
}

impl TraceOptions {
    /// Options for a capture that runs until the stop latch fires.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Options for a capture that stops after `duration` unless stopped
    /// earlier.
    pub fn timed(duration: Duration) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }
}

/// What the tracer supports on this platform, reported to the host
/// application before it builds a trace request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceCapabilities {
    pub server_local_path: bool,
    pub can_specify_cwd: bool,
    pub can_upload_application: bool,
    pub can_specify_env: bool,
    pub preferred_root: String,
    pub has_cache: bool,
}

impl Default for TraceCapabilities {
    fn default() -> Self {
        Self {
            server_local_path: false,
            can_specify_cwd: true,
            can_upload_application: false,
            can_specify_env: true,
            preferred_root: "/".to_string(),
            has_cache: false,
        }
    }
}
