//! Device enumeration: run the management tool, classify failures, parse,
//! and materialize descriptors.

use std::collections::HashMap;

use devtrace_core::device::{
    DeviceDescriptor, DeviceRecord, DeviceRegistry, OsIdentity, RemoteDevice,
};
use devtrace_core::error::{DeviceError, DiscoveryError};
use tracing::{debug, info};

use crate::parse::parse_device_list;
use crate::runner::CommandRunner;
use crate::shell::ShellDevice;

/// Subcommand that asks the tool for its device list.
const LIST_ARGS: [&str; 2] = ["target", "list"];

/// Identity properties queried during enrichment.
const PROP_PRODUCT: &str = "product.name";
const PROP_BUILD: &str = "build.id";
const PROP_VERSION: &str = "os.version";
const PROP_ABI: &str = "cpu.abi";

/// Enumerate devices without identity enrichment: name and address only.
///
/// Failure classes are kept distinct: the tool not running at all
/// ([`DiscoveryError::ProcessFailure`]), the tool reporting a non-success
/// outcome ([`DiscoveryError::InvalidStatus`]), and unusable output (the
/// parser's classification). An attached-device count of zero is a success.
pub async fn list_devices_bare<R: CommandRunner>(
    runner: &R,
) -> Result<HashMap<String, DeviceRecord>, DiscoveryError> {
    let output = runner.run(&LIST_ARGS).await?;
    if !output.success {
        let stderr = output.stderr.trim();
        let message = if stderr.is_empty() {
            output.stdout.trim()
        } else {
            stderr
        };
        return Err(DiscoveryError::InvalidStatus(message.to_string()));
    }
    parse_device_list(&output.stdout)
}

/// Enumerate devices and enrich each record with the OS/hardware identity
/// queried from the device itself. An enrichment failure propagates rather
/// than silently downgrading the entry.
pub async fn list_devices<R>(runner: &R) -> Result<DeviceRegistry, DiscoveryError>
where
    R: CommandRunner + Clone,
{
    let records = list_devices_bare(runner).await?;

    let mut registry = DeviceRegistry::new();
    for (name, record) in records {
        let device = ShellDevice::new(runner.clone(), record.clone());
        let identity = query_identity(&device)
            .await
            .map_err(DiscoveryError::Enrichment)?;
        debug!(device = %name, product = %identity.product, "device enriched");
        registry.insert(name, DeviceDescriptor { record, identity });
    }

    info!(devices = registry.len(), "device enumeration complete");
    Ok(registry)
}

async fn query_identity<D: RemoteDevice>(device: &D) -> Result<OsIdentity, DeviceError> {
    Ok(OsIdentity {
        product: device.get_property(PROP_PRODUCT).await?,
        build: device.get_property(PROP_BUILD).await?,
        version: device.get_property(PROP_VERSION).await?,
        abi: device.get_property(PROP_ABI).await?,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use crate::runner::CommandOutput;

    use super::*;

    /// Serves one canned response for `target list` and per-property values
    /// for every enrichment query.
    #[derive(Clone)]
    struct FakeTool {
        list: Result<CommandOutput, std::io::ErrorKind>,
        properties: std::sync::Arc<Mutex<HashMap<String, String>>>,
    }

    impl FakeTool {
        fn listing(stdout: &str) -> Self {
            Self {
                list: Ok(CommandOutput {
                    success: true,
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                }),
                properties: std::sync::Arc::new(Mutex::new(default_properties())),
            }
        }

        fn failing_status(stderr: &str) -> Self {
            Self {
                list: Ok(CommandOutput {
                    success: false,
                    stdout: String::new(),
                    stderr: stderr.to_string(),
                }),
                properties: std::sync::Arc::new(Mutex::new(default_properties())),
            }
        }

        fn unspawnable() -> Self {
            Self {
                list: Err(std::io::ErrorKind::NotFound),
                properties: std::sync::Arc::new(Mutex::new(HashMap::new())),
            }
        }
    }

    fn default_properties() -> HashMap<String, String> {
        HashMap::from([
            (PROP_PRODUCT.to_string(), "widget-board".to_string()),
            (PROP_BUILD.to_string(), "build-2044".to_string()),
            (PROP_VERSION.to_string(), "12.1".to_string()),
            (PROP_ABI.to_string(), "arm64".to_string()),
        ])
    }

    impl CommandRunner for FakeTool {
        async fn run(&self, args: &[&str]) -> std::io::Result<CommandOutput> {
            if args == LIST_ARGS {
                return match &self.list {
                    Ok(output) => Ok(output.clone()),
                    Err(kind) => Err(std::io::Error::from(*kind)),
                };
            }
            // Everything else is `-t <name> property get <key>`.
            assert_eq!(&args[2..4], &["property", "get"]);
            let properties = self.properties.lock().unwrap();
            Ok(match properties.get(args[4]) {
                Some(value) => CommandOutput {
                    success: true,
                    stdout: format!("{value}\n"),
                    stderr: String::new(),
                },
                None => CommandOutput {
                    success: false,
                    stdout: String::new(),
                    stderr: "no such property".to_string(),
                },
            })
        }
    }

    #[tokio::test]
    async fn test_list_devices_bare_parses_records() {
        let tool = FakeTool::listing("10.0.0.1 alpha\n10.0.0.2 beta\n");
        let records = list_devices_bare(&tool).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records["alpha"].address, "10.0.0.1");
        assert_eq!(records["beta"].address, "10.0.0.2");
    }

    #[tokio::test]
    async fn test_empty_list_is_a_success() {
        let tool = FakeTool::listing("\nNo devices found.\n\n");
        assert!(list_devices(&tool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_nonzero_status_is_invalid_status() {
        let tool = FakeTool::failing_status("daemon not running\n");
        let err = list_devices(&tool).await.unwrap_err();
        match err {
            DiscoveryError::InvalidStatus(ref message) => {
                assert_eq!(message, "daemon not running");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().starts_with("Process returned error"));
    }

    #[tokio::test]
    async fn test_unspawnable_tool_is_process_failure() {
        let tool = FakeTool::unspawnable();
        let err = list_devices(&tool).await.unwrap_err();
        assert!(matches!(err, DiscoveryError::ProcessFailure(_)));
    }

    #[tokio::test]
    async fn test_enrichment_fills_identity() {
        let tool = FakeTool::listing("10.0.0.1 alpha\n");
        let registry = list_devices(&tool).await.unwrap();
        let descriptor = &registry["alpha"];
        assert_eq!(descriptor.record.address, "10.0.0.1");
        assert_eq!(descriptor.identity.product, "widget-board");
        assert_eq!(descriptor.identity.build, "build-2044");
        assert_eq!(descriptor.identity.version, "12.1");
        assert_eq!(descriptor.identity.abi, "arm64");
    }

    #[tokio::test]
    async fn test_enrichment_failure_propagates() {
        let tool = FakeTool::listing("10.0.0.1 alpha\n");
        tool.properties.lock().unwrap().remove(PROP_BUILD);
        let err = list_devices(&tool).await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Enrichment(_)));
    }

    #[tokio::test]
    async fn test_garbage_output_propagates_parse_error() {
        let tool = FakeTool::listing("\nFile not found.\n\n");
        let err = list_devices(&tool).await.unwrap_err();
        assert!(matches!(
            err,
            DiscoveryError::NoDeviceList(_) | DiscoveryError::InvalidDeviceList(_)
        ));
    }
}
