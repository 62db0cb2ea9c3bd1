//! Pure parser for the management tool's device-enumeration output.
//!
//! One device per line, `<address> <name>`. No I/O happens here, so every
//! error condition is unit-testable with plain strings.

use std::collections::HashMap;

use devtrace_core::device::DeviceRecord;
use devtrace_core::error::DiscoveryError;

/// Literal line the tool prints when no devices are attached. A valid
/// zero-device response, not an error.
const NO_DEVICES_SENTINEL: &str = "No devices found.";

/// Parse the full enumeration output into records keyed by device name.
///
/// Classification:
/// - empty output or the no-devices sentinel → `Ok` with an empty map;
/// - every non-empty line is `<address> <name>` → `Ok` with one record per
///   line;
/// - some lines well-formed, some not → [`DiscoveryError::InvalidDeviceList`];
/// - no line well-formed → [`DiscoveryError::NoDeviceList`].
pub fn parse_device_list(raw: &str) -> Result<HashMap<String, DeviceRecord>, DiscoveryError> {
    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() || lines == [NO_DEVICES_SENTINEL] {
        return Ok(HashMap::new());
    }

    let mut records = HashMap::new();
    let mut malformed = 0usize;
    for line in &lines {
        let mut tokens = line.split_whitespace();
        match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(address), Some(name), None) => {
                records.insert(
                    name.to_string(),
                    DeviceRecord {
                        name: name.to_string(),
                        address: address.to_string(),
                    },
                );
            }
            _ => malformed += 1,
        }
    }

    if malformed == 0 {
        Ok(records)
    } else if records.is_empty() {
        Err(DiscoveryError::NoDeviceList(raw.trim().to_string()))
    } else {
        Err(DiscoveryError::InvalidDeviceList(raw.trim().to_string()))
    }
}
