use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DeviceError;
use crate::options::TraceOptions;
use crate::signal::Signal;

/// One entry parsed from the device-management tool's enumeration output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Device name; the unique registry key.
    pub name: String,
    /// Connection address as reported by the tool. Not validated for
    /// uniqueness; several records may share one address.
    pub address: String,
}

/// OS/hardware identity queried from a device during enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsIdentity {
    pub product: String,
    pub build: String,
    pub version: String,
    pub abi: String,
}

/// A fully materialized registry entry: the raw enumeration record plus the
/// identity queried from the device itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub record: DeviceRecord,
    pub identity: OsIdentity,
}

/// The devices discovered by one enumeration call, keyed by name.
/// Built fresh on every call; an empty registry is a valid success.
pub type DeviceRegistry = HashMap<String, DeviceDescriptor>;

/// Shell-level operations every remote device supports.
#[allow(async_fn_in_trait)]
pub trait RemoteDevice: Send + Sync {
    /// The device name used to target management-tool commands.
    fn name(&self) -> &str;

    /// Read a system property from the device.
    async fn get_property(&self, name: &str) -> Result<String, DeviceError>;

    /// Write a system property on the device.
    async fn set_property(&self, name: &str, value: &str) -> Result<(), DeviceError>;

    /// Push a local file to the device.
    async fn push_file(&self, local: &Path, remote: &str) -> Result<(), DeviceError>;

    /// Pull a remote file from the device.
    async fn pull_file(&self, remote: &str, local: &Path) -> Result<(), DeviceError>;
}

/// A remote device whose trace recorder can be driven by a session.
#[allow(async_fn_in_trait)]
pub trait CaptureDevice: RemoteDevice {
    /// Put the device's background recorder to work writing into `dest`.
    ///
    /// `ready` is fired once recording is live. `stop` is handed to the
    /// device so it can observe early termination of the session.
    async fn start_capture(
        &self,
        options: &TraceOptions,
        dest: &Path,
        stop: Signal,
        ready: Signal,
    ) -> Result<(), DeviceError>;

    /// Finalize the recorder's output into `dest`.
    async fn stop_capture(&self, dest: &Path) -> Result<(), DeviceError>;
}
