//! The swap group client state machine.
//!
//! [`SwapGroupClient`] owns the join/bind lifecycle on top of a
//! [`SwapGroupDriver`]: workstation setup, joining the swap group, binding
//! the swap barrier, the master sync counter toggle, the one-shot
//! unsynchronized-present escape hatch, and the per-frame present override.
//!
//! Failures never tear the client down. Every join/bind failure degrades the
//! reported status and leaves the client in a state where a later
//! [`SwapGroupClient::initialize`] can retry. No operation here panics or
//! returns an error across the module boundary; callers learn about failure
//! through [`InitializeStatus`], a boolean, or the shared
//! [`StatusBoard`](crate::core::status::StatusBoard).

use std::sync::Arc;

use crate::client::throttle::{Clock, FrameCountThrottle, MonotonicClock};
use crate::context::device::GraphicsDevice;
use crate::context::RawHandle;
use crate::core::status::{InitializationStatus, StatusBoard};
use crate::driver::SwapGroupDriver;

pub mod throttle;

/// Swap group id this client joins. The cluster topology the plugin targets
/// has a single group per node.
pub const SWAP_GROUP_ID: u32 = 1;
/// Swap barrier id bound across the cluster.
pub const SWAP_BARRIER_ID: u32 = 1;

/// Outcome of [`SwapGroupClient::initialize`], mapped 1:1 onto the public
/// [`InitializationStatus`] taxonomy by the dispatch layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InitializeStatus {
    Success,
    /// Workstation setup or another unspecific step failed.
    Failed,
    /// The hardware reports zero available swap groups.
    NoGroupDetected,
    /// The capability or state query itself failed.
    QueryFailed,
    FailedToJoinGroup,
    /// Joined, but the hardware reports a different group id than expected.
    GroupMismatch,
    FailedToBindBarrier,
    /// Bound, but the hardware reports a different barrier id than expected.
    BarrierIdMismatch,
}

impl From<InitializeStatus> for InitializationStatus {
    fn from(status: InitializeStatus) -> Self {
        match status {
            InitializeStatus::Success => InitializationStatus::Initialized,
            InitializeStatus::Failed => InitializationStatus::GenericSyncFailure,
            InitializeStatus::NoGroupDetected => InitializationStatus::NoGroupDetected,
            InitializeStatus::QueryFailed => InitializationStatus::GroupQueryFailed,
            InitializeStatus::FailedToJoinGroup => InitializationStatus::FailedToJoinGroup,
            InitializeStatus::GroupMismatch => InitializationStatus::GroupMismatch,
            InitializeStatus::FailedToBindBarrier => InitializationStatus::FailedToBindBarrier,
            InitializeStatus::BarrierIdMismatch => InitializationStatus::BarrierIdMismatch,
        }
    }
}

/// Client-side state machine for one node's swap group membership.
///
/// All mutation happens on the render thread; the only cross-thread surface
/// is the shared [`StatusBoard`]. Invariant: `barrier_id != 0` implies
/// `group_id != 0` at every observable point.
#[derive(Derivative)]
#[derivative(Debug(bound = "C: std::fmt::Debug"))]
pub struct SwapGroupClient<D: SwapGroupDriver, C: Clock = MonotonicClock> {
    #[derivative(Debug = "ignore")]
    driver: D,
    status: Arc<StatusBoard>,
    throttle: FrameCountThrottle<C>,
    workstation_ready: bool,
    group_id: u32,
    barrier_id: u32,
    sync_counter_enabled: bool,
    /// One-shot: consumed by exactly the next `render` call.
    skip_next_present: bool,
    /// Software fallback counter, authoritative while the master sync counter
    /// is disabled. Counts successful synchronized presents.
    frame_count: u64,
    /// Last value read from the hardware counter, returned while throttled.
    hw_frame_count: u64,
}

impl<D: SwapGroupDriver> SwapGroupClient<D> {
    pub fn new(driver: D, status: Arc<StatusBoard>) -> Self {
        Self::with_clock(driver, status, MonotonicClock::new())
    }
}

impl<D: SwapGroupDriver, C: Clock> SwapGroupClient<D, C> {
    pub fn with_clock(driver: D, status: Arc<StatusBoard>, clock: C) -> Self {
        SwapGroupClient {
            driver,
            status,
            throttle: FrameCountThrottle::new(clock),
            workstation_ready: false,
            group_id: 0,
            barrier_id: 0,
            sync_counter_enabled: false,
            skip_next_present: false,
            frame_count: 0,
            hw_frame_count: 0,
        }
    }

    pub fn group_id(&self) -> u32 {
        self.group_id
    }

    pub fn barrier_id(&self) -> u32 {
        self.barrier_id
    }

    pub fn workstation_ready(&self) -> bool {
        self.workstation_ready
    }

    pub fn sync_counter_enabled(&self) -> bool {
        self.sync_counter_enabled
    }

    /// Enable the workstation swap-group subsystem. Idempotent; required
    /// before any join or bind attempt.
    pub fn setup_workstation(&mut self, device: RawHandle) -> bool {
        if self.workstation_ready {
            return true;
        }
        match self.driver.set_workstation_enabled(device, true) {
            Ok(()) => {
                info!("Workstation swap group subsystem enabled");
                self.workstation_ready = true;
                true
            }
            Err(err) => {
                error!("Failed to enable workstation swap group subsystem: {err:#}");
                false
            }
        }
    }

    /// Join the swap group and, when the hardware has barriers, bind the swap
    /// barrier. Idempotent once both are acquired. After a partial failure
    /// (joined but not bound) a later call re-attempts only the missing bind.
    pub fn initialize(&mut self, device: RawHandle, swap_chain: RawHandle) -> InitializeStatus {
        if self.group_id != 0 && self.barrier_id != 0 {
            return InitializeStatus::Success;
        }
        if !self.setup_workstation(device) {
            return InitializeStatus::Failed;
        }

        let caps = match self.driver.query_caps(device) {
            Ok(caps) => caps,
            Err(err) => {
                error!("Swap group capability query failed: {err:#}");
                return InitializeStatus::QueryFailed;
            }
        };
        if caps.max_groups == 0 {
            warn!("No swap group detected on this device");
            return InitializeStatus::NoGroupDetected;
        }

        if self.group_id == 0 {
            if let Err(err) = self.driver.join_group(device, swap_chain, SWAP_GROUP_ID) {
                error!("Failed to join swap group {SWAP_GROUP_ID}: {err:#}");
                return InitializeStatus::FailedToJoinGroup;
            }
            match self.driver.query_state(device) {
                Ok(state) if state.group == SWAP_GROUP_ID => {}
                Ok(state) => {
                    error!(
                        "Joined swap group {SWAP_GROUP_ID} but hardware reports group {}",
                        state.group
                    );
                    return InitializeStatus::GroupMismatch;
                }
                Err(err) => {
                    error!("Swap group state query failed after join: {err:#}");
                    return InitializeStatus::QueryFailed;
                }
            }
            self.group_id = SWAP_GROUP_ID;
            self.status.set_group_id(self.group_id);
            info!("Joined swap group {SWAP_GROUP_ID}");
        }

        if caps.max_barriers > 0 && self.barrier_id == 0 {
            if let Err(err) = self.driver.bind_barrier(device, self.group_id, SWAP_BARRIER_ID) {
                error!("Failed to bind swap barrier {SWAP_BARRIER_ID}: {err:#}");
                return InitializeStatus::FailedToBindBarrier;
            }
            match self.driver.query_state(device) {
                Ok(state) if state.barrier == SWAP_BARRIER_ID => {}
                Ok(state) => {
                    error!(
                        "Bound swap barrier {SWAP_BARRIER_ID} but hardware reports barrier {}",
                        state.barrier
                    );
                    return InitializeStatus::BarrierIdMismatch;
                }
                Err(err) => {
                    error!("Swap group state query failed after barrier bind: {err:#}");
                    return InitializeStatus::QueryFailed;
                }
            }
            self.barrier_id = SWAP_BARRIER_ID;
            self.status.set_barrier_id(self.barrier_id);
            info!("Bound swap barrier {SWAP_BARRIER_ID}");
        }

        InitializeStatus::Success
    }

    /// Toggle group and barrier together. Disabling releases the barrier
    /// before leaving the group, never the other way around.
    pub fn enable_system(&mut self, device: RawHandle, swap_chain: RawHandle, enabled: bool) {
        if enabled {
            self.enable_swap_group(device, swap_chain, true);
            self.enable_swap_barrier(device, true);
        } else {
            self.enable_swap_barrier(device, false);
            self.enable_swap_group(device, swap_chain, false);
        }
    }

    /// Join or leave the swap group. Enabling while joined is idempotent.
    pub fn enable_swap_group(&mut self, device: RawHandle, swap_chain: RawHandle, enabled: bool) {
        if enabled {
            if self.group_id != 0 {
                return;
            }
            match self.driver.join_group(device, swap_chain, SWAP_GROUP_ID) {
                Ok(()) => {
                    self.group_id = SWAP_GROUP_ID;
                    self.status.set_group_id(self.group_id);
                    info!("Joined swap group {SWAP_GROUP_ID}");
                }
                Err(err) => {
                    error!("Failed to join swap group {SWAP_GROUP_ID}: {err:#}");
                    self.status
                        .set_initialization(InitializationStatus::FailedToJoinGroup);
                }
            }
        } else {
            if self.group_id == 0 {
                return;
            }
            // A bound barrier must be released before the group is left.
            if self.barrier_id != 0 {
                self.enable_swap_barrier(device, false);
            }
            if let Err(err) = self.driver.join_group(device, swap_chain, 0) {
                error!("Failed to leave swap group {}: {err:#}", self.group_id);
            } else {
                info!("Left swap group {}", self.group_id);
            }
            self.group_id = 0;
            self.status.set_group_id(0);
        }
    }

    /// Bind or release the swap barrier. Binding requires a joined group;
    /// attempting it without one reports `FailedToBindBarrier` rather than
    /// joining a group on the caller's behalf.
    pub fn enable_swap_barrier(&mut self, device: RawHandle, enabled: bool) {
        if enabled {
            if self.group_id == 0 {
                warn!("Cannot bind a swap barrier without an active swap group");
                self.status
                    .set_initialization(InitializationStatus::FailedToBindBarrier);
                return;
            }
            if self.barrier_id != 0 {
                return;
            }
            match self.driver.bind_barrier(device, self.group_id, SWAP_BARRIER_ID) {
                Ok(()) => {
                    self.barrier_id = SWAP_BARRIER_ID;
                    self.status.set_barrier_id(self.barrier_id);
                    info!("Bound swap barrier {SWAP_BARRIER_ID}");
                }
                Err(err) => {
                    error!("Failed to bind swap barrier {SWAP_BARRIER_ID}: {err:#}");
                    self.status
                        .set_initialization(InitializationStatus::FailedToBindBarrier);
                }
            }
        } else {
            if self.barrier_id == 0 {
                return;
            }
            if let Err(err) = self.driver.bind_barrier(device, self.group_id, 0) {
                error!("Failed to release swap barrier {}: {err:#}", self.barrier_id);
            } else {
                info!("Released swap barrier {}", self.barrier_id);
            }
            self.barrier_id = 0;
            self.status.set_barrier_id(0);
        }
    }

    /// Toggle the master sync counter. No group or barrier precondition.
    pub fn enable_sync_counter(&mut self, enabled: bool) {
        self.sync_counter_enabled = enabled;
    }

    /// Current frame count: the hardware master counter while the sync
    /// counter is enabled (throttled; returns the last read value while
    /// throttled), otherwise the software fallback counter.
    pub fn query_frame_count(&mut self, device: RawHandle) -> u64 {
        if !self.sync_counter_enabled {
            return self.frame_count;
        }
        if self.throttle.allow() {
            match self.driver.query_frame_count(device) {
                Ok(count) => self.hw_frame_count = count,
                Err(err) => warn!("Master sync counter query failed: {err:#}"),
            }
        }
        self.hw_frame_count
    }

    /// Reset whichever counter is currently authoritative and re-arm the
    /// throttle's burst window.
    pub fn reset_frame_count(&mut self, device: RawHandle) {
        if self.sync_counter_enabled {
            if let Err(err) = self.driver.reset_frame_count(device) {
                warn!("Master sync counter reset failed: {err:#}");
            }
            self.hw_frame_count = 0;
        } else {
            self.frame_count = 0;
        }
        self.throttle.rearm();
    }

    /// Arm the one-shot escape hatch: the next `render` call presents without
    /// waiting on the barrier, then the flag clears itself.
    pub fn skip_synchronized_present_of_next_frame(&mut self) {
        self.skip_next_present = true;
    }

    /// Present-override entry point, called once per frame.
    ///
    /// Returns whether this client presented the frame; on `false` the host
    /// should fall back to its own present. A skip-flagged present bypasses
    /// both the barrier wait and the success/failure counters.
    pub fn render(&mut self, device: &dyn GraphicsDevice) -> bool {
        let Some(request) = device.present_request() else {
            return false;
        };
        if self.skip_next_present {
            self.skip_next_present = false;
            info!("Presenting next frame without synchronization");
            return self.driver.present(&request).is_ok();
        }
        match self.driver.present_synchronized(&request) {
            Ok(()) => {
                self.status.record_present_success();
                if !self.sync_counter_enabled {
                    self.frame_count += 1;
                }
                true
            }
            Err(err) => {
                warn!("Synchronized present failed: {err:#}");
                self.status.record_present_failure();
                false
            }
        }
    }

    /// Unwind barrier then group, in strict reverse order of acquisition.
    /// Idempotent: calling this while nothing is joined does nothing.
    pub fn dispose(&mut self, device: RawHandle, swap_chain: RawHandle) {
        self.enable_swap_barrier(device, false);
        self.enable_swap_group(device, swap_chain, false);
        self.skip_next_present = false;
    }

    /// Disable the workstation swap-group subsystem. Idempotent; a no-op
    /// before `setup_workstation`.
    pub fn dispose_workstation(&mut self, device: RawHandle) {
        if !self.workstation_ready {
            return;
        }
        if let Err(err) = self.driver.set_workstation_enabled(device, false) {
            error!("Failed to disable workstation swap group subsystem: {err:#}");
        }
        self.workstation_ready = false;
    }
}
