pub mod device;
pub mod error;
pub mod options;
pub mod signal;
