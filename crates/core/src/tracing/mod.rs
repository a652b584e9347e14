//! Tracing setup shared by every medadmin crate
//!
//! Library code only emits events through the `tracing` macros; hosts call
//! [`init::init_tracing`] once at startup to install a subscriber.

pub mod config;
pub mod init;

pub use config::{InstrumentationConfig, LogFormat};
pub use init::init_tracing;
