//! Scriptable device for session and tracer tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use devtrace_core::device::{CaptureDevice, RemoteDevice};
use devtrace_core::error::DeviceError;
use devtrace_core::options::TraceOptions;
use devtrace_core::signal::Signal;

/// Stands in for a real device: writes a fixed payload where the recorder
/// would, records every successful call, and can be told to reject start or
/// stop. The capture destination is remembered even when start fails, so
/// tests can assert the temp file was removed.
pub(crate) struct MockDevice {
    payload: Vec<u8>,
    fail_start: bool,
    fail_stop: bool,
    calls: Mutex<Vec<&'static str>>,
    capture_path: Mutex<Option<PathBuf>>,
    properties: Mutex<HashMap<String, String>>,
}

impl MockDevice {
    pub fn with_payload(payload: &[u8]) -> Self {
        Self {
            payload: payload.to_vec(),
            fail_start: false,
            fail_stop: false,
            calls: Mutex::new(Vec::new()),
            capture_path: Mutex::new(None),
            properties: Mutex::new(HashMap::new()),
        }
    }

    pub fn failing_start() -> Self {
        Self {
            fail_start: true,
            ..Self::with_payload(b"")
        }
    }

    pub fn failing_stop(payload: &[u8]) -> Self {
        Self {
            fail_stop: true,
            ..Self::with_payload(payload)
        }
    }

    pub fn property(self, name: &str, value: &str) -> Self {
        self.properties
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn capture_path(&self) -> Option<PathBuf> {
        self.capture_path.lock().unwrap().clone()
    }
}

impl RemoteDevice for MockDevice {
    fn name(&self) -> &str {
        "mock-device"
    }

    async fn get_property(&self, name: &str) -> Result<String, DeviceError> {
        self.properties
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| DeviceError::PropertyUnavailable(name.to_string()))
    }

    async fn set_property(&self, name: &str, value: &str) -> Result<(), DeviceError> {
        self.properties
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn push_file(&self, _local: &Path, _remote: &str) -> Result<(), DeviceError> {
        self.calls.lock().unwrap().push("push");
        Ok(())
    }

    async fn pull_file(&self, _remote: &str, _local: &Path) -> Result<(), DeviceError> {
        self.calls.lock().unwrap().push("pull");
        Ok(())
    }
}

impl CaptureDevice for MockDevice {
    async fn start_capture(
        &self,
        _options: &TraceOptions,
        dest: &Path,
        _stop: Signal,
        ready: Signal,
    ) -> Result<(), DeviceError> {
        *self.capture_path.lock().unwrap() = Some(dest.to_path_buf());
        if self.fail_start {
            return Err(DeviceError::CommandFailed("start rejected".to_string()));
        }
        std::fs::write(dest, &self.payload)?;
        self.calls.lock().unwrap().push("start");
        ready.fire();
        Ok(())
    }

    async fn stop_capture(&self, _dest: &Path) -> Result<(), DeviceError> {
        if self.fail_stop {
            return Err(DeviceError::CommandFailed("stop rejected".to_string()));
        }
        self.calls.lock().unwrap().push("stop");
        Ok(())
    }
}
