//! Dynamic endpoint bridge.
//!
//! The registry maps bridged devices onto a fixed number of dynamic endpoint
//! slots. The dispatch gateways answer the device model's attribute and
//! command callbacks for those endpoints, and the runtime serializes every
//! mutation onto one model thread.

pub mod allocator;
pub mod attributes;
pub mod commands;
pub mod core;
pub mod delegate;
pub mod notify;
pub mod registry;
pub mod request;
pub mod rooms;
pub mod runtime;
pub mod slots;

pub use commands::CommandContext;
pub use core::{BridgeCore, BridgeSettings};
pub use delegate::{ExternalDelegate, MemoryDelegate};
pub use registry::{BridgeRegistry, DYNAMIC_ENDPOINT_COUNT};
pub use request::AddDeviceRequest;
pub use rooms::{Action, EndpointListType, Room};
pub use runtime::{AttributeValue, BridgeCommand, BridgeHandle, BridgeRuntime};
pub use slots::Ownership;
