//! Shared test doubles: a recording driver, a configurable context provider
//! and a manually advanced clock.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::ffi::c_void;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{bail, Result};

use framelock::{
    BackendKind, Clock, ContextProvider, PresentRequest, RawHandle, StatusBoard, SwapGroupCaps,
    SwapGroupClient, SwapGroupDriver, SwapGroupState, SyncSystem,
};

/// Fabricate a borrowed handle from an arbitrary non-zero value.
pub fn handle(value: usize) -> RawHandle {
    RawHandle::new(value as *mut c_void).expect("test handles must be non-zero")
}

pub const DEVICE: usize = 0x11;
pub const SWAP_CHAIN: usize = 0x22;
pub const QUEUE: usize = 0x33;

/// Observable state of the fake driver binding, shared with the test body.
#[derive(Debug, Default)]
pub struct DriverState {
    pub caps: SwapGroupCaps,
    pub hw_group: u32,
    pub hw_barrier: u32,
    pub workstation_enabled: bool,
    /// Hardware master counter value handed back by queries.
    pub frame_count: u64,

    // Failure injection.
    pub fail_caps: bool,
    pub fail_join: bool,
    pub fail_bind: bool,
    pub fail_present: bool,
    /// Group id the hardware claims after a join, when it should differ from
    /// the requested one.
    pub report_group: Option<u32>,
    pub report_barrier: Option<u32>,

    // Call recording.
    pub ops: Vec<String>,
    pub join_calls: u32,
    pub bind_calls: u32,
    pub frame_queries: u32,
    pub frame_resets: u32,
    pub plain_presents: u32,
    pub sync_presents: u32,
    pub last_request: Option<PresentRequest>,
}

/// Driver double with state shared through an `Rc` so tests can inspect it
/// after the driver moved into the system.
#[derive(Debug, Clone)]
pub struct TestDriver(pub Rc<RefCell<DriverState>>);

impl SwapGroupDriver for TestDriver {
    fn set_workstation_enabled(&mut self, _device: RawHandle, enabled: bool) -> Result<()> {
        let mut state = self.0.borrow_mut();
        state.workstation_enabled = enabled;
        state.ops.push(format!("workstation:{enabled}"));
        Ok(())
    }

    fn query_caps(&mut self, _device: RawHandle) -> Result<SwapGroupCaps> {
        let state = self.0.borrow();
        if state.fail_caps {
            bail!("injected caps failure");
        }
        Ok(state.caps)
    }

    fn query_state(&mut self, _device: RawHandle) -> Result<SwapGroupState> {
        let state = self.0.borrow();
        Ok(SwapGroupState {
            group: state.hw_group,
            barrier: state.hw_barrier,
        })
    }

    fn join_group(&mut self, _device: RawHandle, _swap_chain: RawHandle, group: u32) -> Result<()> {
        let mut state = self.0.borrow_mut();
        state.join_calls += 1;
        state.ops.push(format!("join:{group}"));
        if state.fail_join {
            bail!("injected join failure");
        }
        state.hw_group = if group == 0 {
            0
        } else {
            state.report_group.unwrap_or(group)
        };
        Ok(())
    }

    fn bind_barrier(&mut self, _device: RawHandle, _group: u32, barrier: u32) -> Result<()> {
        let mut state = self.0.borrow_mut();
        state.bind_calls += 1;
        state.ops.push(format!("bind:{barrier}"));
        if state.fail_bind {
            bail!("injected bind failure");
        }
        state.hw_barrier = if barrier == 0 {
            0
        } else {
            state.report_barrier.unwrap_or(barrier)
        };
        Ok(())
    }

    fn query_frame_count(&mut self, _device: RawHandle) -> Result<u64> {
        let mut state = self.0.borrow_mut();
        state.frame_queries += 1;
        Ok(state.frame_count)
    }

    fn reset_frame_count(&mut self, _device: RawHandle) -> Result<()> {
        let mut state = self.0.borrow_mut();
        state.frame_resets += 1;
        state.frame_count = 0;
        Ok(())
    }

    fn present(&mut self, request: &PresentRequest) -> Result<()> {
        let mut state = self.0.borrow_mut();
        state.plain_presents += 1;
        state.last_request = Some(*request);
        Ok(())
    }

    fn present_synchronized(&mut self, request: &PresentRequest) -> Result<()> {
        let mut state = self.0.borrow_mut();
        state.sync_presents += 1;
        state.last_request = Some(*request);
        if state.fail_present {
            bail!("injected present failure");
        }
        Ok(())
    }
}

/// Host-side context the provider double hands out.
#[derive(Debug)]
pub struct ProviderState {
    pub backend: Option<BackendKind>,
    pub device: Option<RawHandle>,
    pub swap_chain: Option<RawHandle>,
    pub queue: Option<RawHandle>,
    pub sync_interval: u32,
    pub present_flags: u32,
}

impl Default for ProviderState {
    fn default() -> Self {
        ProviderState {
            backend: Some(BackendKind::Direct3D11),
            device: Some(handle(DEVICE)),
            swap_chain: Some(handle(SWAP_CHAIN)),
            queue: None,
            sync_interval: 1,
            present_flags: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TestProvider(pub Rc<RefCell<ProviderState>>);

impl ContextProvider for TestProvider {
    fn backend_kind(&self) -> Option<BackendKind> {
        self.0.borrow().backend
    }

    fn device(&self) -> Option<RawHandle> {
        self.0.borrow().device
    }

    fn swap_chain(&self) -> Option<RawHandle> {
        self.0.borrow().swap_chain
    }

    fn command_queue(&self) -> Option<RawHandle> {
        self.0.borrow().queue
    }

    fn sync_interval(&self) -> u32 {
        self.0.borrow().sync_interval
    }

    fn present_flags(&self) -> u32 {
        self.0.borrow().present_flags
    }
}

/// Tick source the test advances by hand. 1000 ticks per second by default.
#[derive(Debug, Clone)]
pub struct ManualClock {
    pub ticks: Rc<Cell<u64>>,
    pub frequency: u64,
}

impl ManualClock {
    pub fn new(frequency: u64) -> Self {
        ManualClock {
            ticks: Rc::new(Cell::new(0)),
            frequency,
        }
    }

    pub fn advance(&self, ticks: u64) {
        self.ticks.set(self.ticks.get() + ticks);
    }
}

impl Clock for ManualClock {
    fn ticks(&self) -> u64 {
        self.ticks.get()
    }

    fn frequency(&self) -> u64 {
        self.frequency
    }
}

pub const CLOCK_HZ: u64 = 1000;

/// A ready-to-present graphics device over default provider state.
pub fn graphics_device() -> framelock::D3D11GraphicsDevice {
    let provider = TestProvider(Rc::new(RefCell::new(ProviderState::default())));
    framelock::D3D11GraphicsDevice::from_provider(&provider)
}

/// A fully wired system over the driver and provider doubles.
pub struct Harness {
    pub system: SyncSystem<TestDriver, ManualClock>,
    pub driver: Rc<RefCell<DriverState>>,
    pub provider: Rc<RefCell<ProviderState>>,
    pub clock: ManualClock,
}

pub fn harness() -> Harness {
    harness_with(|_, _| {})
}

/// Install the test logger once; repeated calls from other tests are fine.
fn init_logging() {
    let _ = pretty_env_logger::try_init();
}

pub fn harness_with(configure: impl FnOnce(&mut DriverState, &mut ProviderState)) -> Harness {
    init_logging();
    let driver = Rc::new(RefCell::new(DriverState {
        caps: SwapGroupCaps {
            max_groups: 1,
            max_barriers: 1,
        },
        ..DriverState::default()
    }));
    let provider = Rc::new(RefCell::new(ProviderState::default()));
    configure(&mut driver.borrow_mut(), &mut provider.borrow_mut());

    let clock = ManualClock::new(CLOCK_HZ);
    let mut system = SyncSystem::with_clock(TestDriver(driver.clone()), clock.clone());
    system.attach_provider(Some(Box::new(TestProvider(provider.clone()))));
    system.on_device_event(framelock::DeviceEvent::Initialize);
    Harness {
        system,
        driver,
        provider,
        clock,
    }
}

/// A bare client over the driver double, for state-machine tests that bypass
/// the dispatch layer.
pub struct ClientHarness {
    pub client: SwapGroupClient<TestDriver, ManualClock>,
    pub driver: Rc<RefCell<DriverState>>,
    pub status: Arc<StatusBoard>,
    pub clock: ManualClock,
}

pub fn client_harness() -> ClientHarness {
    client_harness_with(|_| {})
}

pub fn client_harness_with(configure: impl FnOnce(&mut DriverState)) -> ClientHarness {
    init_logging();
    let driver = Rc::new(RefCell::new(DriverState {
        caps: SwapGroupCaps {
            max_groups: 1,
            max_barriers: 1,
        },
        ..DriverState::default()
    }));
    configure(&mut driver.borrow_mut());
    let status = Arc::new(StatusBoard::default());
    let clock = ManualClock::new(CLOCK_HZ);
    let client = SwapGroupClient::with_clock(TestDriver(driver.clone()), status.clone(), clock.clone());
    ClientHarness {
        client,
        driver,
        status,
        clock,
    }
}
