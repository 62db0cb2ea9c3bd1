//! The tracer facade: binds one capture-capable device to the generic
//! tracer contract consumed by the host application.

use std::sync::Arc;
use std::time::Duration;

use devtrace_core::device::CaptureDevice;
use devtrace_core::error::TraceError;
use devtrace_core::options::{TraceCapabilities, TraceOptions};
use serde::Serialize;
use tracing::debug;

use crate::session::TraceSession;

/// Property a device must expose, with a truthy value, to confirm its GPU
/// tracing stack is usable.
const GPU_TRACING_PROP: &str = "gpu.tracing.supported";

/// Buffer size for validation captures, in KiB.
const VALIDATION_BUFFER_SIZE_KB: u32 = 256;

/// Bound on a validation capture; validation never runs open-ended.
const VALIDATION_DURATION: Duration = Duration::from_secs(1);

/// A traceable process or application discovered on a device. Target
/// discovery is unsupported on this platform, so these are only ever
/// produced by other tracer implementations behind the same contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceTarget {
    pub id: String,
    pub name: String,
}

/// Post-processed profiling data. This platform reports
/// [`TraceError::Unsupported`] instead of producing one.
#[derive(Debug, Clone, Default)]
pub struct ProfilingSummary {
    pub slices: u64,
    pub counters: u64,
}

/// The tracer contract the host application consumes.
#[allow(async_fn_in_trait)]
pub trait Tracer {
    type Device: CaptureDevice;

    /// Describe what tracing this platform supports.
    fn capabilities(&self) -> Result<TraceCapabilities, TraceError>;

    /// Create a single-use capture session for `options`.
    fn create_session(
        &self,
        options: TraceOptions,
    ) -> Result<TraceSession<Self::Device>, TraceError>;

    /// Check that the device's GPU tracing stack actually works.
    async fn validate_device(&self) -> Result<(), TraceError>;

    /// Enumerate traceable targets matching `pattern`.
    fn find_trace_targets(&self, pattern: &str) -> Result<Vec<TraceTarget>, TraceError>;

    /// Turn a captured trace into profiling data.
    async fn process_profiling_data(&self, trace: &[u8]) -> Result<ProfilingSummary, TraceError>;

    /// The bound device, if this tracer drives one.
    fn device(&self) -> Option<&Self::Device>;
}

#[derive(Serialize)]
struct ValidationConfig {
    buffer_size_kb: u32,
    duration_ms: u64,
}

/// Deferred-start options used to smoke-test a device's tracing stack: a
/// small buffer and a hard duration bound.
pub fn validation_options() -> TraceOptions {
    let config = ValidationConfig {
        buffer_size_kb: VALIDATION_BUFFER_SIZE_KB,
        duration_ms: VALIDATION_DURATION.as_millis() as u64,
    };
    TraceOptions {
        defer_start: true,
        duration: VALIDATION_DURATION,
        platform_config: serde_json::to_vec(&config).unwrap_or_default(),
    }
}

/// Tracer bound to one device, or the explicit unsupported-platform variant.
///
/// The unsupported variant is selected at construction and makes every
/// operation fail with [`TraceError::Unsupported`] from a single check,
/// rather than scattering stub bodies through the contract.
pub struct DeviceTracer<D> {
    inner: Inner<D>,
}

enum Inner<D> {
    Device(Arc<D>),
    Unsupported,
}

impl<D: CaptureDevice> DeviceTracer<D> {
    pub fn new(device: D) -> Self {
        Self {
            inner: Inner::Device(Arc::new(device)),
        }
    }

    /// The variant for builds or platforms without GPU tracing.
    pub fn unsupported() -> Self {
        Self {
            inner: Inner::Unsupported,
        }
    }

    fn active(&self) -> Result<&Arc<D>, TraceError> {
        match &self.inner {
            Inner::Device(device) => Ok(device),
            Inner::Unsupported => Err(TraceError::Unsupported),
        }
    }
}

impl<D: CaptureDevice> Tracer for DeviceTracer<D> {
    type Device = D;

    fn capabilities(&self) -> Result<TraceCapabilities, TraceError> {
        self.active()?;
        Ok(TraceCapabilities::default())
    }

    fn create_session(&self, options: TraceOptions) -> Result<TraceSession<D>, TraceError> {
        let device = Arc::clone(self.active()?);
        debug!(
            defer_start = options.defer_start,
            duration_secs = options.duration.as_secs(),
            "creating trace session"
        );
        Ok(TraceSession::new(device, options))
    }

    async fn validate_device(&self) -> Result<(), TraceError> {
        let device = self.active()?;
        let value = device
            .get_property(GPU_TRACING_PROP)
            .await
            .map_err(TraceError::Validation)?;
        match value.as_str() {
            "1" | "true" => Ok(()),
            _ => Err(TraceError::Unsupported),
        }
    }

    fn find_trace_targets(&self, _pattern: &str) -> Result<Vec<TraceTarget>, TraceError> {
        // No target discovery on this platform. For an active tracer the
        // honest answer is the empty list, never a guess.
        self.active()?;
        Ok(Vec::new())
    }

    async fn process_profiling_data(&self, _trace: &[u8]) -> Result<ProfilingSummary, TraceError> {
        self.active()?;
        Err(TraceError::Unsupported)
    }

    fn device(&self) -> Option<&D> {
        match &self.inner {
            Inner::Device(device) => Some(device),
            Inner::Unsupported => None,
        }
    }
}
