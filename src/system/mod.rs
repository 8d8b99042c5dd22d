//! The system module is the surface the host drives.
//!
//! [`SyncSystem`] sits between the host's plugin machinery and the
//! [`SwapGroupClient`]: it owns the context provider and the per-backend
//! graphics device, validates both before any state-machine operation runs,
//! translates [`SyncCommand`]s into typed client calls, and exports the
//! fixed-layout status snapshot. The weakly-typed event-code-plus-pointer
//! contract with the host is confined to [`SyncCommand::from_raw`] and
//! [`SyncSystem::dispatch_raw`]; the client itself never sees an untyped
//! payload.

use std::ffi::c_void;
use std::sync::Arc;

use crate::client::throttle::{Clock, MonotonicClock};
use crate::client::{InitializeStatus, SwapGroupClient};
use crate::context::device::{D3D11GraphicsDevice, D3D12GraphicsDevice, GraphicsDevice};
use crate::context::{BackendKind, ContextProvider, RawHandle};
use crate::core::status::{InitializationStatus, StatusBoard, SyncStatus};
use crate::driver::SwapGroupDriver;

/// Device lifecycle events reported by the host.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The graphics device is (or already was) initialized.
    Initialize,
    /// The graphics device is going away. All borrowed handles become stale.
    Shutdown,
}

/// Closed command type for the host's render-event channel.
///
/// The numeric codes decoded by [`SyncCommand::from_raw`] are a binary
/// compatibility contract with the caller and must not be renumbered.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SyncCommand {
    Initialize,
    QueryFrameCount,
    ResetFrameCount,
    Dispose,
    EnableSystem(bool),
    EnableSwapGroup(bool),
    EnableSwapBarrier(bool),
    EnableSyncCounter(bool),
    SkipSyncForNextFrame,
}

impl SyncCommand {
    /// Decode an event code and opaque payload pointer.
    ///
    /// Boolean payloads arrive as a pointer-sized value reinterpreted as a
    /// boolean, non-zero meaning true. Unknown codes decode to `None`.
    pub fn from_raw(event_id: i32, payload: *mut c_void) -> Option<SyncCommand> {
        let flag = !payload.is_null();
        Some(match event_id {
            0 => SyncCommand::Initialize,
            1 => SyncCommand::QueryFrameCount,
            2 => SyncCommand::ResetFrameCount,
            3 => SyncCommand::Dispose,
            4 => SyncCommand::EnableSystem(flag),
            5 => SyncCommand::EnableSwapGroup(flag),
            6 => SyncCommand::EnableSwapBarrier(flag),
            7 => SyncCommand::EnableSyncCounter(flag),
            8 => SyncCommand::SkipSyncForNextFrame,
            _ => return None,
        })
    }
}

/// Dispatch and validation layer over the swap group client.
///
/// Constructed once per process lifetime of the plugin. The graphics device
/// is built lazily on the first `Initialize` dispatch, because hosts are
/// known to report an undecided renderer at load time, and is dropped again
/// on a device shutdown event.
#[derive(Derivative)]
#[derivative(Debug(bound = "C: std::fmt::Debug"))]
pub struct SyncSystem<D: SwapGroupDriver, C: Clock = MonotonicClock> {
    #[derivative(Debug = "ignore")]
    provider: Option<Box<dyn ContextProvider>>,
    #[derivative(Debug = "ignore")]
    device: Option<Box<dyn GraphicsDevice>>,
    client: SwapGroupClient<D, C>,
    status: Arc<StatusBoard>,
    device_ready: bool,
}

impl<D: SwapGroupDriver> SyncSystem<D> {
    pub fn new(driver: D) -> Self {
        Self::with_clock(driver, MonotonicClock::new())
    }
}

impl<D: SwapGroupDriver, C: Clock> SyncSystem<D, C> {
    pub fn with_clock(driver: D, clock: C) -> Self {
        let status = Arc::new(StatusBoard::default());
        SyncSystem {
            provider: None,
            device: None,
            client: SwapGroupClient::with_clock(driver, status.clone(), clock),
            status,
            device_ready: false,
        }
    }

    /// Attach the host's context provider. Passing `None` records
    /// `ContextProviderUnavailable`, mirroring a host that loaded the plugin
    /// without its graphics interfaces.
    pub fn attach_provider(&mut self, provider: Option<Box<dyn ContextProvider>>) {
        match provider {
            Some(provider) => {
                info!("Context provider attached");
                self.provider = Some(provider);
            }
            None => {
                error!("Host supplied no context provider");
                self.status
                    .set_initialization(InitializationStatus::ContextProviderUnavailable);
            }
        }
    }

    /// Handle a device lifecycle event from the host.
    pub fn on_device_event(&mut self, event: DeviceEvent) {
        match event {
            DeviceEvent::Initialize => {
                if !self.device_ready {
                    info!("Graphics device initialize event received");
                    self.device_ready = true;
                }
            }
            DeviceEvent::Shutdown => {
                info!("Graphics device shutdown, dropping borrowed context");
                self.device_ready = false;
                self.device = None;
                self.provider = None;
                self.status
                    .set_initialization(InitializationStatus::NotInitialized);
            }
        }
    }

    /// Shared handle to the status report, readable from any thread.
    pub fn status_board(&self) -> Arc<StatusBoard> {
        self.status.clone()
    }

    /// Fixed-layout status snapshot for the non-native caller.
    pub fn snapshot(&self) -> SyncStatus {
        self.status.snapshot()
    }

    /// Direct access to the client, for hosts that bypass the command channel.
    pub fn client(&self) -> &SwapGroupClient<D, C> {
        &self.client
    }

    /// Build the backend-specific graphics device, once, from whatever the
    /// provider reports now. Selection happens here and never again
    /// downstream.
    fn ensure_graphics_device(&mut self) -> bool {
        if self.device.is_some() {
            return true;
        }
        let Some(provider) = self.provider.as_deref() else {
            error!("Cannot build a graphics device without a context provider");
            self.status
                .set_initialization(InitializationStatus::ContextProviderUnavailable);
            return false;
        };
        match provider.backend_kind() {
            Some(BackendKind::Direct3D11) => {
                info!("Detected Direct3D 11 renderer");
                self.device = Some(Box::new(D3D11GraphicsDevice::from_provider(provider)));
                true
            }
            Some(BackendKind::Direct3D12) => {
                info!("Detected Direct3D 12 renderer");
                self.device = Some(Box::new(D3D12GraphicsDevice::from_provider(provider)));
                true
            }
            None => {
                error!("Reported rendering backend is not supported");
                self.status
                    .set_initialization(InitializationStatus::UnsupportedBackend);
                false
            }
        }
    }

    /// Validate the borrowed context before any state-machine operation.
    ///
    /// On a null device or swap chain this attempts exactly one re-fetch from
    /// the provider before failing: the swap chain is transiently unavailable
    /// during the host's first frame after backend initialization. The device
    /// is checked before the swap chain when both are absent.
    fn is_context_valid(&mut self) -> bool {
        let Some(provider) = self.provider.as_deref() else {
            error!("Context invalid: no context provider attached");
            self.status
                .set_initialization(InitializationStatus::ContextProviderUnavailable);
            return false;
        };
        let Some(device) = self.device.as_deref_mut() else {
            error!("Context invalid: no graphics device has been initialized");
            return false;
        };
        if provider.backend_kind() != Some(device.kind()) {
            error!("Context invalid: reported backend does not match the active device");
            self.status
                .set_initialization(InitializationStatus::UnsupportedBackend);
            return false;
        }
        if device.device().is_none() {
            warn!("Device handle is null, re-fetching from provider");
            device.refresh_device(provider);
        }
        if device.swap_chain().is_none() {
            warn!("Swap chain handle is null, re-fetching from provider");
            device.refresh_swap_chain(provider);
        }
        if device.device().is_none() {
            self.status
                .set_initialization(InitializationStatus::MissingDevice);
            return false;
        }
        if device.swap_chain().is_none() {
            self.status
                .set_initialization(InitializationStatus::MissingSwapChain);
            return false;
        }
        true
    }

    /// Run one typed command. Returns the frame count for
    /// [`SyncCommand::QueryFrameCount`], `None` for everything else.
    pub fn dispatch(&mut self, command: SyncCommand) -> Option<u64> {
        match command {
            SyncCommand::Initialize => {
                self.initialize();
                None
            }
            SyncCommand::QueryFrameCount => self.query_frame_count(),
            SyncCommand::ResetFrameCount => {
                self.reset_frame_count();
                None
            }
            SyncCommand::Dispose => {
                self.dispose();
                None
            }
            SyncCommand::EnableSystem(enabled) => {
                self.enable_system(enabled);
                None
            }
            SyncCommand::EnableSwapGroup(enabled) => {
                self.enable_swap_group(enabled);
                None
            }
            SyncCommand::EnableSwapBarrier(enabled) => {
                self.enable_swap_barrier(enabled);
                None
            }
            SyncCommand::EnableSyncCounter(enabled) => {
                self.enable_sync_counter(enabled);
                None
            }
            SyncCommand::SkipSyncForNextFrame => {
                self.skip_sync_for_next_frame();
                None
            }
        }
    }

    /// Decode and run a raw host event.
    ///
    /// # Safety
    /// For event code 1 (query frame count) a non-null `payload` must point
    /// to a writable `i32`; the result is stored through it. All other codes
    /// only inspect `payload` for null-ness.
    pub unsafe fn dispatch_raw(&mut self, event_id: i32, payload: *mut c_void) {
        let Some(command) = SyncCommand::from_raw(event_id, payload) else {
            return;
        };
        if command == SyncCommand::QueryFrameCount {
            if payload.is_null() {
                return;
            }
            if let Some(count) = self.dispatch(command) {
                *(payload as *mut i32) = count as i32;
            }
            return;
        }
        self.dispatch(command);
    }

    /// Enable the workstation subsystem and join group and barrier. Safe to
    /// call again after a failure; the state machine retries from where it
    /// degraded.
    pub fn initialize(&mut self) {
        if !self.ensure_graphics_device() {
            error!("Swap group initialization aborted: no usable graphics device");
            return;
        }
        if !self.is_context_valid() {
            return;
        }
        let (Some(device), Some(swap_chain)) = self.context_handles() else {
            return;
        };
        self.client.setup_workstation(device);
        let result = self.client.initialize(device, swap_chain);
        self.status.set_initialization(result.into());
        match result {
            InitializeStatus::Success => info!("Swap group synchronization initialized"),
            other => error!("Swap group synchronization failed to initialize: {other:?}"),
        }
    }

    /// Current frame count, or `None` while the context is invalid.
    pub fn query_frame_count(&mut self) -> Option<u64> {
        if !self.is_context_valid() {
            return None;
        }
        let (Some(device), _) = self.context_handles() else {
            return None;
        };
        Some(self.client.query_frame_count(device))
    }

    pub fn reset_frame_count(&mut self) {
        if !self.is_context_valid() {
            return;
        }
        if let (Some(device), _) = self.context_handles() {
            self.client.reset_frame_count(device);
        }
    }

    /// Leave barrier, group and workstation in strict reverse order of
    /// acquisition and return the status to `NotInitialized`. Idempotent.
    pub fn dispose(&mut self) {
        if !self.is_context_valid() {
            return;
        }
        let (Some(device), Some(swap_chain)) = self.context_handles() else {
            return;
        };
        self.client.dispose(device, swap_chain);
        self.client.dispose_workstation(device);
        self.status
            .set_initialization(InitializationStatus::NotInitialized);
    }

    pub fn enable_system(&mut self, enabled: bool) {
        if !self.is_context_valid() {
            return;
        }
        if let (Some(device), Some(swap_chain)) = self.context_handles() {
            self.client.enable_system(device, swap_chain, enabled);
        }
    }

    pub fn enable_swap_group(&mut self, enabled: bool) {
        if !self.is_context_valid() {
            return;
        }
        if let (Some(device), Some(swap_chain)) = self.context_handles() {
            self.client.enable_swap_group(device, swap_chain, enabled);
        }
    }

    pub fn enable_swap_barrier(&mut self, enabled: bool) {
        if !self.is_context_valid() {
            return;
        }
        if let (Some(device), _) = self.context_handles() {
            self.client.enable_swap_barrier(device, enabled);
        }
    }

    pub fn enable_sync_counter(&mut self, enabled: bool) {
        if !self.is_context_valid() {
            return;
        }
        self.client.enable_sync_counter(enabled);
    }

    pub fn skip_sync_for_next_frame(&mut self) {
        if !self.is_context_valid() {
            return;
        }
        self.client.skip_synchronized_present_of_next_frame();
    }

    /// Present-override hook, invoked by the host once per frame. Returns
    /// whether this system claims responsibility for presenting the frame;
    /// on `false` the host runs its normal present.
    pub fn on_present_frame(&mut self) -> bool {
        if !self.is_context_valid() {
            return false;
        }
        let Some(device) = self.device.as_deref() else {
            return false;
        };
        self.client.render(device)
    }

    fn context_handles(&self) -> (Option<RawHandle>, Option<RawHandle>) {
        match self.device.as_deref() {
            Some(device) => (device.device(), device.swap_chain()),
            None => (None, None),
        }
    }
}
