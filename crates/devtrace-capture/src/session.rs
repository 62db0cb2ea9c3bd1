//! The trace-capture session state machine.
//!
//! One session drives one capture on one device: temp-file allocation,
//! optional deferred start, the stop-or-timeout wait, recorder shutdown,
//! and the drain of captured bytes to the caller's destination. The temp
//! file is deleted on every exit path, including cancellation and device
//! failures, because the session owns it as a [`NamedTempFile`] and never
//! leaks the handle.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use devtrace_core::device::CaptureDevice;
use devtrace_core::error::TraceError;
use devtrace_core::options::TraceOptions;
use devtrace_core::signal::Signal;
use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

const DRAIN_BUF_SIZE: usize = 64 * 1024;

/// A single-use capture session. [`capture`][TraceSession::capture] consumes
/// the session, so a second run on the same session cannot compile.
pub struct TraceSession<D> {
    device: Arc<D>,
    options: TraceOptions,
}

impl<D: CaptureDevice> TraceSession<D> {
    pub(crate) fn new(device: Arc<D>, options: TraceOptions) -> Self {
        Self { device, options }
    }

    pub fn options(&self) -> &TraceOptions {
        &self.options
    }

    /// Run the capture to completion, streaming the trace into `dest`.
    ///
    /// `ready` is fired once the session is prepared to observe `start` and
    /// `stop`. With `defer_start` set, the device is not touched until
    /// `start` fires. The capture ends on the first of: `stop` firing, the
    /// configured duration elapsing (if non-zero), or `cancel` firing.
    ///
    /// `written` is a coarse liveness counter: `1` once the session is
    /// prepared, then the trace file's size right before the drain begins.
    /// The return value is the number of bytes delivered to `dest`.
    pub async fn capture<W>(
        self,
        start: Signal,
        stop: Signal,
        ready: Signal,
        cancel: Signal,
        dest: &mut W,
        written: &AtomicI64,
    ) -> Result<u64, TraceError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        // Owning the handle for the whole call is what guarantees cleanup:
        // every early return below drops it, which removes the file.
        let trace_file = NamedTempFile::new().map_err(TraceError::TempFile)?;

        written.store(1, Ordering::SeqCst);
        ready.fire();

        if self.options.defer_start {
            debug!("session prepared, awaiting start signal");
            tokio::select! {
                _ = start.wait() => {}
                _ = cancel.wait() => {
                    warn!("cancelled before capture start");
                    return Err(TraceError::Cancelled);
                }
            }
        }

        self.device
            .start_capture(
                &self.options,
                trace_file.path(),
                stop.clone(),
                ready.clone(),
            )
            .await
            .map_err(TraceError::StartFailed)?;
        info!(device = self.device.name(), "capture running");

        let duration = self.options.duration;
        let stopped = async {
            if duration > Duration::ZERO {
                // Whichever comes first; a timeout is a normal stop.
                stop.wait_timeout(duration).await;
            } else {
                stop.wait().await;
            }
        };
        tokio::select! {
            _ = stopped => {}
            _ = cancel.wait() => {
                warn!("cancelled during capture");
                return Err(TraceError::Cancelled);
            }
        }

        self.device
            .stop_capture(trace_file.path())
            .await
            .map_err(TraceError::StopFailed)?;

        let size = tokio::fs::metadata(trace_file.path())
            .await
            .map_err(|source| TraceError::CopyFailed { written: 0, source })?
            .len();
        written.store(size as i64, Ordering::SeqCst);
        info!(bytes = size, "draining trace file");

        tokio::select! {
            result = drain(trace_file.path(), dest) => result,
            _ = cancel.wait() => {
                warn!("cancelled during drain");
                Err(TraceError::Cancelled)
            }
        }
        // trace_file drops here: the temp file is removed exactly once,
        // whether we succeeded, failed, or were cancelled.
    }
}

/// Stream the trace file into `dest`, preserving the partial byte count on
/// failure.
async fn drain<W>(path: &Path, dest: &mut W) -> Result<u64, TraceError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|source| TraceError::CopyFailed { written: 0, source })?;

    let mut buf = vec![0u8; DRAIN_BUF_SIZE];
    let mut written = 0u64;
    loop {
        let n = file
            .read(&mut buf)
            .await
            .map_err(|source| TraceError::CopyFailed { written, source })?;
        if n == 0 {
            return Ok(written);
        }
        dest.write_all(&buf[..n])
            .await
            .map_err(|source| TraceError::CopyFailed { written, source })?;
        written += n as u64;
    }
}
