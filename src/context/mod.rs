//! The context module abstracts the host's rendering backend.
//!
//! All device and swap chain handles are borrowed from the host environment
//! and never closed by this crate. The host exposes them through the
//! [`ContextProvider`] capability; the [`device`] module wraps them in a
//! per-backend [`GraphicsDevice`](device::GraphicsDevice) so nothing
//! downstream ever branches on the backend again.

use std::ffi::c_void;

pub mod device;

/// Opaque, borrowed, non-null handle to a host-owned graphics object.
///
/// Framelock never dereferences these; they are passed through to the driver
/// binding untouched.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RawHandle(*mut c_void);

impl RawHandle {
    /// Wrap a host-supplied pointer. Returns `None` for null, so an absent
    /// handle is always represented as `Option::None` rather than a null
    /// smuggled inside a `RawHandle`.
    pub fn new(ptr: *mut c_void) -> Option<Self> {
        if ptr.is_null() {
            None
        } else {
            Some(RawHandle(ptr))
        }
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0
    }
}

/// The rendering backends with a synchronized present path.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BackendKind {
    Direct3D11,
    Direct3D12,
}

/// Capability implemented by the host: borrowed access to the live device and
/// swap chain of the active rendering backend.
///
/// Values are re-queried lazily on demand and must not be cached beyond a
/// single validation pass, except inside a
/// [`GraphicsDevice`](device::GraphicsDevice) which is rebuilt on device
/// shutdown events.
pub trait ContextProvider {
    /// The active backend, or `None` when the host reports an unsupported or
    /// not-yet-decided renderer.
    fn backend_kind(&self) -> Option<BackendKind>;
    fn device(&self) -> Option<RawHandle>;
    fn swap_chain(&self) -> Option<RawHandle>;
    /// Command queue used for presentation. Only meaningful on backends that
    /// present through a queue (Direct3D 12).
    fn command_queue(&self) -> Option<RawHandle> {
        None
    }
    fn sync_interval(&self) -> u32;
    fn present_flags(&self) -> u32;
}
