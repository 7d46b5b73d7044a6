//! Interaction model status codes returned by the dispatch gateways.

use strum::{Display, FromRepr};

/// Status of a single read, write or command handled by the bridge.
///
/// Values are the interaction model wire codes so the model layer can
/// forward them unchanged.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, FromRepr, Display)]
#[repr(u8)]
pub enum Status {
    Success = 0x00,
    Failure = 0x01,
    UnsupportedEndpoint = 0x7F,
    UnsupportedCommand = 0x81,
    UnsupportedAttribute = 0x86,
    ConstraintError = 0x87,
    UnsupportedWrite = 0x88,
}

impl Status {
    pub fn is_success(self) -> bool {
        self == Status::Success
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}
