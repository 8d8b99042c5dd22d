//! Initialization status taxonomy and the cross-thread status report.
//!
//! The state machine in [`client`](crate::client) runs on the render thread,
//! but a controller typically polls status from another thread to build its
//! own UI or telemetry. [`StatusBoard`] decouples the two: the render thread
//! is the single writer, polling threads read relaxed-atomic snapshots. The
//! values are advisory and never gate a control decision inside the
//! synchronization logic itself, so staleness by a frame is acceptable.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use static_assertions::const_assert_eq;

/// Initialization status of the synchronization system.
///
/// The numeric values are a compatibility contract with the non-native caller
/// consuming [`SyncStatus`] and must not be renumbered.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u32)]
pub enum InitializationStatus {
    NotInitialized = 0,
    Initialized = 1,
    /// The host never supplied a context provider.
    ContextProviderUnavailable = 2,
    /// The detected rendering backend is neither of the supported kinds.
    UnsupportedBackend = 3,
    /// No device handle available, even after a re-fetch from the provider.
    MissingDevice = 4,
    /// No swap chain handle available, even after a re-fetch from the provider.
    MissingSwapChain = 5,
    /// A swap group or barrier operation failed for an unspecific reason.
    GenericSyncFailure = 6,
    /// The hardware reports that no swap group exists on this device.
    NoGroupDetected = 7,
    /// Querying the swap group capabilities or state failed.
    GroupQueryFailed = 8,
    FailedToJoinGroup = 9,
    /// The hardware reports a different group id than the one this client
    /// expected to join. This indicates a configuration problem (for example
    /// a stale group from a crashed session), not a transient fault.
    GroupMismatch = 10,
    FailedToBindBarrier = 11,
    /// The hardware reports a different barrier id than the one bound.
    BarrierIdMismatch = 12,
}

impl InitializationStatus {
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn from_u32(value: u32) -> Option<Self> {
        use InitializationStatus::*;
        Some(match value {
            0 => NotInitialized,
            1 => Initialized,
            2 => ContextProviderUnavailable,
            3 => UnsupportedBackend,
            4 => MissingDevice,
            5 => MissingSwapChain,
            6 => GenericSyncFailure,
            7 => NoGroupDetected,
            8 => GroupQueryFailed,
            9 => FailedToJoinGroup,
            10 => GroupMismatch,
            11 => FailedToBindBarrier,
            12 => BarrierIdMismatch,
            _ => return None,
        })
    }
}

/// Fixed-layout snapshot of the synchronization status, safe to hand to a
/// non-native caller. Field order and widths are a cross-boundary contract
/// and must not be reordered or resized on one side only.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SyncStatus {
    /// Numeric value of [`InitializationStatus`].
    pub initialization_state: u32,
    /// Swap group id, 0 while not joined.
    pub swap_group_id: u32,
    /// Swap barrier id, 0 while not bound.
    pub swap_barrier_id: u32,
    /// Number of frames successfully presented through the synchronized present.
    pub presented_frames_success: u64,
    /// Number of frames whose synchronized present failed.
    pub presented_frames_failed: u64,
}

const_assert_eq!(std::mem::size_of::<SyncStatus>(), 32);

/// Cross-thread-readable status report.
///
/// Single writer (the render thread driving the state machine), any number of
/// relaxed readers. Counters are monotonic for the lifetime of the board.
#[derive(Debug, Default)]
pub struct StatusBoard {
    initialization: AtomicU32,
    group_id: AtomicU32,
    barrier_id: AtomicU32,
    presented_success: AtomicU64,
    presented_failed: AtomicU64,
}

impl StatusBoard {
    pub fn set_initialization(&self, status: InitializationStatus) {
        self.initialization.store(status.as_u32(), Ordering::Relaxed);
    }

    pub fn initialization(&self) -> InitializationStatus {
        // The field is only ever written from `set_initialization`, so the
        // stored value always maps back onto the enum.
        InitializationStatus::from_u32(self.initialization.load(Ordering::Relaxed))
            .unwrap_or(InitializationStatus::NotInitialized)
    }

    pub fn set_group_id(&self, id: u32) {
        self.group_id.store(id, Ordering::Relaxed);
    }

    pub fn set_barrier_id(&self, id: u32) {
        self.barrier_id.store(id, Ordering::Relaxed);
    }

    pub fn record_present_success(&self) {
        self.presented_success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_present_failure(&self) {
        self.presented_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot. Individual fields are read relaxed, so
    /// a snapshot taken concurrently with state transitions may mix values
    /// from adjacent frames. That is acceptable for telemetry.
    pub fn snapshot(&self) -> SyncStatus {
        SyncStatus {
            initialization_state: self.initialization.load(Ordering::Relaxed),
            swap_group_id: self.group_id.load(Ordering::Relaxed),
            swap_barrier_id: self.barrier_id.load(Ordering::Relaxed),
            presented_frames_success: self.presented_success.load(Ordering::Relaxed),
            presented_frames_failed: self.presented_failed.load(Ordering::Relaxed),
        }
    }
}
