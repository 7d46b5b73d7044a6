use crate::matter::ids::{AttributeId, ClusterId, EndpointId};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum BridgeError {
    #[error("No endpoint slots available (capacity {0})")]
    CapacityExhausted(usize),

    #[error("Endpoint {0} is already in use")]
    IdentifierCollision(EndpointId),

    #[error("Dynamic endpoint identifier space exhausted")]
    IdentifierSpaceExhausted,

    #[error("Endpoint allocator not initialized (post-server-init has not run)")]
    NotInitialized,

    #[error("No bridged device at endpoint {0}")]
    NotFound(EndpointId),

    #[error("Endpoint {endpoint} does not store cluster 0x{cluster:04x} attribute 0x{attribute:04x}")]
    AttributeNotStored {
        endpoint: EndpointId,
        cluster: ClusterId,
        attribute: AttributeId,
    },

    #[error("Device model rejected endpoint {endpoint}: {reason}")]
    ModelRejected { endpoint: EndpointId, reason: String },

    #[error("Bridge runtime is not running")]
    RuntimeStopped,

    #[error("Invalid device definition: {0}")]
    InvalidDefinition(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
