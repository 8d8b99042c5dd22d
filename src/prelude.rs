pub use crate::core::error::Error;
pub use crate::core::status::{InitializationStatus, StatusBoard, SyncStatus};

pub use crate::context::device::{
    D3D11GraphicsDevice, D3D12GraphicsDevice, GraphicsDevice, PresentRequest,
};
pub use crate::context::{BackendKind, ContextProvider, RawHandle};

pub use crate::driver::{NoopDriver, SwapGroupCaps, SwapGroupDriver, SwapGroupState};

pub use crate::client::throttle::{Clock, FrameCountThrottle, MonotonicClock, FRAME_COUNT_BURST};
pub use crate::client::{InitializeStatus, SwapGroupClient, SWAP_BARRIER_ID, SWAP_GROUP_ID};

pub use crate::system::{DeviceEvent, SyncCommand, SyncSystem};
