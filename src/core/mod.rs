//! The core module holds the crate error type and the cross-thread status report.

pub mod error;
pub mod status;
