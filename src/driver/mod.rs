//! The driver module defines the boundary to the lower-level driver binding.
//!
//! Framelock treats "join swap group", "bind swap barrier", "query/reset the
//! frame counter" and "present with barrier wait" as atomic capability
//! operations supplied by a vendor driver binding. [`SwapGroupDriver`] is
//! that seam. Calls are bounded-latency and offer no retries; when one fails
//! the client degrades its status and stays usable for a later attempt.

use anyhow::Result;

use crate::context::device::PresentRequest;
use crate::context::RawHandle;
use crate::core::error::Error;

/// Swap group capabilities of a device, as reported by the hardware.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SwapGroupCaps {
    /// Number of swap groups available on the device. 0 means the device has
    /// no frame-lock hardware attached.
    pub max_groups: u32,
    /// Number of swap barriers available across the cluster.
    pub max_barriers: u32,
}

/// Current swap group membership of a device, as reported by the hardware.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SwapGroupState {
    /// Joined group id, 0 when not in a group.
    pub group: u32,
    /// Bound barrier id, 0 when not bound.
    pub barrier: u32,
}

/// Capability operations a driver binding must supply.
///
/// Group and barrier ids follow the hardware convention that 0 means "none":
/// joining group 0 leaves the current group, binding barrier 0 releases the
/// barrier.
pub trait SwapGroupDriver {
    /// Enable or disable the workstation swap-group subsystem on a device.
    /// Must be enabled once before any group can be joined.
    fn set_workstation_enabled(&mut self, device: RawHandle, enabled: bool) -> Result<()>;

    /// Query how many groups and barriers the device supports.
    fn query_caps(&mut self, device: RawHandle) -> Result<SwapGroupCaps>;

    /// Query the group and barrier the device is currently part of.
    fn query_state(&mut self, device: RawHandle) -> Result<SwapGroupState>;

    /// Join a swap group (or leave, with group 0).
    fn join_group(&mut self, device: RawHandle, swap_chain: RawHandle, group: u32) -> Result<()>;

    /// Bind a swap barrier to a group (or release, with barrier 0).
    fn bind_barrier(&mut self, device: RawHandle, group: u32, barrier: u32) -> Result<()>;

    /// Read the master sync counter.
    fn query_frame_count(&mut self, device: RawHandle) -> Result<u64>;

    /// Reset the master sync counter to zero.
    fn reset_frame_count(&mut self, device: RawHandle) -> Result<()>;

    /// Plain present, bypassing the swap barrier.
    fn present(&mut self, request: &PresentRequest) -> Result<()>;

    /// Present with barrier wait: blocks until every node bound to the
    /// barrier is ready to swap.
    fn present_synchronized(&mut self, request: &PresentRequest) -> Result<()>;
}

/// Driver for hosts without frame-lock hardware.
///
/// Reports zero groups and barriers, so initialization lands on
/// `NoGroupDetected` and the synchronized present always defers to the host.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoopDriver;

impl SwapGroupDriver for NoopDriver {
    fn set_workstation_enabled(&mut self, _device: RawHandle, _enabled: bool) -> Result<()> {
        Ok(())
    }

    fn query_caps(&mut self, _device: RawHandle) -> Result<SwapGroupCaps> {
        Ok(SwapGroupCaps::default())
    }

    fn query_state(&mut self, _device: RawHandle) -> Result<SwapGroupState> {
        Ok(SwapGroupState::default())
    }

    fn join_group(&mut self, _device: RawHandle, _swap_chain: RawHandle, _group: u32) -> Result<()> {
        Err(Error::NoSwapGroupAvailable.into())
    }

    fn bind_barrier(&mut self, _device: RawHandle, _group: u32, _barrier: u32) -> Result<()> {
        Err(Error::NoSwapGroupAvailable.into())
    }

    fn query_frame_count(&mut self, _device: RawHandle) -> Result<u64> {
        Ok(0)
    }

    fn reset_frame_count(&mut self, _device: RawHandle) -> Result<()> {
        Ok(())
    }

    fn present(&mut self, _request: &PresentRequest) -> Result<()> {
        Ok(())
    }

    fn present_synchronized(&mut self, _request: &PresentRequest) -> Result<()> {
        Err(Error::NoSwapGroupAvailable.into())
    }
}
