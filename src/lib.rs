//! Dynamic Matter bridge library.
//!
//! Registers bridged devices as dynamic endpoints of a Matter device model
//! and dispatches attribute and command traffic for them, either to
//! built-in handlers or to an external delegate.

pub mod bridge;
pub mod config;
pub mod device;
pub mod error;
pub mod matter;
