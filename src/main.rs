use std::path::PathBuf;
use std::sync::atomic::AtomicI64;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use devtrace_capture::{DeviceTracer, Tracer};
use devtrace_core::options::TraceOptions;
use devtrace_core::signal::Signal;
use devtrace_discovery::{ShellDevice, ToolRunner, list_devices, list_devices_bare};
use tokio::io::AsyncWriteExt;

// ─────────────────────────────────────────────────────────────────────────────
// CLI
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "devtrace",
    about = "Remote-device GPU trace capture",
    version
)]
struct Cli {
    /// Device-management tool binary to drive.
    #[arg(long, default_value = "ffx", global = true)]
    tool: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List attached devices.
    List {
        #[arg(short, long, value_enum, default_value = "table")]
        output: Output,

        /// Skip identity enrichment; print name and address only.
        #[arg(long)]
        bare: bool,
    },
    /// Capture a trace from one device into a local file.
    Capture(CaptureArgs),
    /// Check that a device's GPU tracing stack works.
    Validate {
        /// Device name as shown by `devtrace list`.
        device: String,
    },
}

#[derive(Debug, Clone, Default, ValueEnum)]
enum Output {
    /// Aligned text table.
    #[default]
    Table,
    /// Pretty-printed JSON.
    Json,
}

#[derive(Args)]
struct CaptureArgs {
    /// Device name as shown by `devtrace list`.
    #[arg(short, long)]
    device: String,

    /// Local file the captured trace is written to.
    #[arg(short, long, default_value = "trace.bin")]
    out: PathBuf,

    /// Capture duration in seconds; 0 means run until Ctrl-C.
    #[arg(long, default_value = "0")]
    duration: u64,

    /// Wait for Enter before starting the capture.
    #[arg(long)]
    defer_start: bool,

    /// Platform trace configuration file forwarded to the device.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("devtrace=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let runner = ToolRunner::new(cli.tool.as_str());

    match cli.command {
        Command::List { output, bare } => run_list(runner, output, bare).await,
        Command::Capture(args) => run_capture(runner, args).await,
        Command::Validate { device } => run_validate(runner, device).await,
    }
}

async fn find_device(
    runner: &ToolRunner,
    name: &str,
) -> anyhow::Result<ShellDevice<ToolRunner>> {
    let mut records = list_devices_bare(runner).await?;
    let record = records
        .remove(name)
        .with_context(|| format!("device {name:?} not found"))?;
    Ok(ShellDevice::new(runner.clone(), record))
}

// ─────────────────────────────────────────────────────────────────────────────
// List
// ─────────────────────────────────────────────────────────────────────────────

async fn run_list(runner: ToolRunner, output: Output, bare: bool) -> anyhow::Result<()> {
    if bare {
        let records = list_devices_bare(&runner).await?;
        match output {
            Output::Table => {
                for record in records.values() {
                    println!("{:<28} {}", record.name, record.address);
                }
            }
            Output::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        }
        if records.is_empty() {
            eprintln!("devtrace: no devices attached");
        }
        return Ok(());
    }

    let registry = list_devices(&runner).await?;
    match output {
        Output::Table => {
            for descriptor in registry.values() {
                println!(
                    "{:<28} {:<28} {:<16} {:<10} {}",
                    descriptor.record.name,
                    descriptor.record.address,
                    descriptor.identity.product,
                    descriptor.identity.version,
                    descriptor.identity.abi,
                );
            }
        }
        Output::Json => println!("{}", serde_json::to_string_pretty(&registry)?),
    }
    if registry.is_empty() {
        eprintln!("devtrace: no devices attached");
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Capture
// ─────────────────────────────────────────────────────────────────────────────

async fn run_capture(runner: ToolRunner, args: CaptureArgs) -> anyhow::Result<()> {
    let device = find_device(&runner, &args.device).await?;
    let tracer = DeviceTracer::new(device);

    let platform_config = match &args.config {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("reading {}", path.display()))?
        }
        None => Vec::new(),
    };
    let options = TraceOptions {
        defer_start: args.defer_start,
        duration: Duration::from_secs(args.duration),
        platform_config,
    };
    let session = tracer.create_session(options)?;

    let start = Signal::new();
    let stop = Signal::new();
    let ready = Signal::new();
    let cancel = Signal::new();

    // First Ctrl-C stops the capture cleanly; a second aborts it.
    {
        let stop = stop.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("devtrace: stopping capture (Ctrl-C again to abort)");
                stop.fire();
            }
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.fire();
            }
        });
    }

    if args.defer_start {
        let ready = ready.clone();
        let start = start.clone();
        tokio::spawn(async move {
            ready.wait().await;
            eprintln!("devtrace: press Enter to start the capture");
            let _ = tokio::task::spawn_blocking(|| {
                let mut line = String::new();
                std::io::stdin().read_line(&mut line)
            })
            .await;
            start.fire();
        });
    }

    if args.duration > 0 {
        eprintln!(
            "devtrace: capturing from {} for {}s (Ctrl-C to stop early)",
            args.device, args.duration
        );
    } else {
        eprintln!("devtrace: capturing from {} until Ctrl-C", args.device);
    }

    let mut out = tokio::fs::File::create(&args.out)
        .await
        .with_context(|| format!("creating {}", args.out.display()))?;
    let written = AtomicI64::new(0);
    let bytes = session
        .capture(start, stop, ready, cancel, &mut out, &written)
        .await?;
    out.flush().await?;

    eprintln!("devtrace: wrote {bytes} bytes to {}", args.out.display());
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Validate
// ─────────────────────────────────────────────────────────────────────────────

async fn run_validate(runner: ToolRunner, device: String) -> anyhow::Result<()> {
    let shell = find_device(&runner, &device).await?;
    let tracer = DeviceTracer::new(shell);
    tracer.validate_device().await?;
    eprintln!("devtrace: {device} supports GPU tracing");
    Ok(())
}
