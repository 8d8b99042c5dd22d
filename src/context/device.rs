//! Per-backend graphics device wrappers.
//!
//! A [`GraphicsDevice`] holds the borrowed handles and present parameters for
//! one backend. The backend is selected once, when the device is built from
//! the provider on a device-initialize event; everything downstream works
//! through the trait and never re-branches on the backend kind.

use crate::context::{BackendKind, ContextProvider, RawHandle};

/// Everything the driver binding needs to present a frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PresentRequest {
    pub backend: BackendKind,
    pub device: RawHandle,
    pub swap_chain: RawHandle,
    /// Present queue, only populated on backends that present through one.
    pub command_queue: Option<RawHandle>,
    pub sync_interval: u32,
    pub present_flags: u32,
}

/// Capability interface over one rendering backend: borrowed device and swap
/// chain handles plus the parameters of a present call.
///
/// Handles may be transiently absent. The swap chain in particular is known
/// to be unavailable during the host's first frame after backend
/// initialization, which is why [`GraphicsDevice::refresh_device`] and
/// [`GraphicsDevice::refresh_swap_chain`] exist: the validation layer uses
/// them for a single lazy re-fetch before declaring the context invalid.
pub trait GraphicsDevice {
    fn kind(&self) -> BackendKind;
    fn device(&self) -> Option<RawHandle>;
    fn swap_chain(&self) -> Option<RawHandle>;
    /// Re-fetch the device handle from the provider.
    fn refresh_device(&mut self, provider: &dyn ContextProvider);
    /// Re-fetch the swap chain handle from the provider.
    fn refresh_swap_chain(&mut self, provider: &dyn ContextProvider);
    /// Assemble a present request, or `None` while a required handle is missing.
    fn present_request(&self) -> Option<PresentRequest>;
}

/// Direct3D 11 backend: presents straight from the device and swap chain.
#[derive(Debug)]
pub struct D3D11GraphicsDevice {
    device: Option<RawHandle>,
    swap_chain: Option<RawHandle>,
    sync_interval: u32,
    present_flags: u32,
}

impl D3D11GraphicsDevice {
    pub fn from_provider(provider: &dyn ContextProvider) -> Self {
        D3D11GraphicsDevice {
            device: provider.device(),
            swap_chain: provider.swap_chain(),
            sync_interval: provider.sync_interval(),
            present_flags: provider.present_flags(),
        }
    }
}

impl GraphicsDevice for D3D11GraphicsDevice {
    fn kind(&self) -> BackendKind {
        BackendKind::Direct3D11
    }

    fn device(&self) -> Option<RawHandle> {
        self.device
    }

    fn swap_chain(&self) -> Option<RawHandle> {
        self.swap_chain
    }

    fn refresh_device(&mut self, provider: &dyn ContextProvider) {
        self.device = provider.device();
    }

    fn refresh_swap_chain(&mut self, provider: &dyn ContextProvider) {
        self.swap_chain = provider.swap_chain();
    }

    fn present_request(&self) -> Option<PresentRequest> {
        Some(PresentRequest {
            backend: BackendKind::Direct3D11,
            device: self.device?,
            swap_chain: self.swap_chain?,
            command_queue: None,
            sync_interval: self.sync_interval,
            present_flags: self.present_flags,
        })
    }
}

/// Direct3D 12 backend: additionally carries the command queue presentation
/// goes through.
#[derive(Debug)]
pub struct D3D12GraphicsDevice {
    device: Option<RawHandle>,
    swap_chain: Option<RawHandle>,
    command_queue: Option<RawHandle>,
    sync_interval: u32,
    present_flags: u32,
}

impl D3D12GraphicsDevice {
    pub fn from_provider(provider: &dyn ContextProvider) -> Self {
        D3D12GraphicsDevice {
            device: provider.device(),
            swap_chain: provider.swap_chain(),
            command_queue: provider.command_queue(),
            sync_interval: provider.sync_interval(),
            present_flags: provider.present_flags(),
        }
    }
}

impl GraphicsDevice for D3D12GraphicsDevice {
    fn kind(&self) -> BackendKind {
        BackendKind::Direct3D12
    }

    fn device(&self) -> Option<RawHandle> {
        self.device
    }

    fn swap_chain(&self) -> Option<RawHandle> {
        self.swap_chain
    }

    fn refresh_device(&mut self, provider: &dyn ContextProvider) {
        self.device = provider.device();
        // The queue lives and dies with the device on this backend.
        self.command_queue = provider.command_queue();
    }

    fn refresh_swap_chain(&mut self, provider: &dyn ContextProvider) {
        self.swap_chain = provider.swap_chain();
    }

    fn present_request(&self) -> Option<PresentRequest> {
        Some(PresentRequest {
            backend: BackendKind::Direct3D12,
            device: self.device?,
            swap_chain: self.swap_chain?,
            command_queue: self.command_queue,
            sync_interval: self.sync_interval,
            present_flags: self.present_flags,
        })
    }
}
