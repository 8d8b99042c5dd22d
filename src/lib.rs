//! Swap group and swap barrier synchronization client for clustered rendering
//!
//! Framelock coordinates presentation timing across the GPUs and displays of a
//! rendering cluster by driving a hardware frame-lock facility: joining a
//! swap group, binding a swap barrier across nodes, controlling the master
//! sync counter and overriding the host engine's normal present call with a
//! synchronized one.
//!
//! The crate does not talk to any driver directly. All hardware operations
//! are routed through the [`SwapGroupDriver`](crate::driver::SwapGroupDriver)
//! trait, and all handles are borrowed from the host through a
//! [`ContextProvider`](crate::context::ContextProvider). What framelock owns
//! is the policy in between: the join/bind state machine, the failure
//! taxonomy reported back to a controller, and the throttling of the
//! expensive hardware frame-counter query.
//!
//! # Example
//!
//! ```no_run
//! use framelock::prelude::*;
//!
//! # fn demo(provider: Box<dyn ContextProvider>) {
//! // The driver binding and the context provider come from the host side.
//! let mut system = SyncSystem::new(NoopDriver::default());
//! system.attach_provider(Some(provider));
//! system.on_device_event(DeviceEvent::Initialize);
//!
//! // Join the swap group and bind the barrier.
//! system.dispatch(SyncCommand::Initialize);
//!
//! // Once per frame, from the render thread:
//! let presented = system.on_present_frame();
//! if !presented {
//!     // fall back to the host's own present
//! }
//!
//! // From any thread, advisory only:
//! let status = system.snapshot();
//! println!("group {} barrier {}", status.swap_group_id, status.swap_barrier_id);
//! # }
//! ```
//!
//! For further detail, check out the following modules
//! - [`system`] for the dispatch and context-validation layer driven by the host.
//! - [`client`] for the swap group client state machine.
//! - [`driver`] for the boundary trait a driver binding must implement.
//! - [`context`] for the graphics backend abstraction and provider capability.
//! - [`core`] for the error type and the cross-thread status snapshot.

#[macro_use]
extern crate derivative;
#[macro_use]
extern crate log;

pub mod prelude;
pub use crate::prelude::*;

pub mod core;
pub mod context;
pub mod driver;
pub mod client;
pub mod system;
