mod session;
mod tracer;

#[cfg(test)]
mod testutil;

pub use session::TraceSession;
pub use tracer::{DeviceTracer, ProfilingSummary, TraceTarget, Tracer, validation_options};
