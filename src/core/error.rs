//! Exposes the framelock error type

use thiserror::Error;

/// Error type that framelock can return.
///
/// Errors never cross the control surface consumed by the host: every public
/// operation reports failure through [`InitializationStatus`](crate::core::status::InitializationStatus)
/// or a boolean return instead. This type is what internal fallible calls and
/// [`SwapGroupDriver`](crate::driver::SwapGroupDriver) implementations propagate.
#[derive(Error, Debug)]
pub enum Error {
    /// The sync hardware reports that no swap group is available on this device.
    #[error("No swap group available on this device.")]
    NoSwapGroupAvailable,
    /// A call into the driver binding failed.
    #[error("Driver call `{0}` failed.")]
    DriverCall(&'static str),
    /// Uncategorized error.
    #[error("Uncategorized error: `{0}`")]
    Uncategorized(&'static str),
}
