//! Identifier types and concrete paths used across the bridge.
//!
//! Widths follow the Matter data model: endpoints are 16-bit, clusters,
//! attributes, commands and device types are 32-bit.

use std::fmt;

pub type EndpointId = u16;
pub type ClusterId = u32;
pub type AttributeId = u32;
pub type CommandId = u32;
pub type DeviceTypeId = u32;
pub type DataVersion = u32;

/// Reserved "no endpoint" value.
pub const INVALID_ENDPOINT_ID: EndpointId = 0xFFFF;

/// Highest endpoint id that may be handed out to a dynamic endpoint.
pub const MAX_ENDPOINT_ID: EndpointId = 0xFFFE;

/// Global attributes present on every cluster.
pub mod global {
    use super::AttributeId;

    pub const FEATURE_MAP: AttributeId = 0xFFFC;
    pub const CLUSTER_REVISION: AttributeId = 0xFFFD;
}

/// A concrete (endpoint, cluster, attribute) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributePath {
    pub endpoint: EndpointId,
    pub cluster: ClusterId,
    pub attribute: AttributeId,
}

impl AttributePath {
    pub const fn new(endpoint: EndpointId, cluster: ClusterId, attribute: AttributeId) -> Self {
        Self {
            endpoint,
            cluster,
            attribute,
        }
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ep={}, cluster=0x{:04x}, attr=0x{:04x}",
            self.endpoint, self.cluster, self.attribute
        )
    }
}

/// A concrete (endpoint, cluster, command) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandPath {
    pub endpoint: EndpointId,
    pub cluster: ClusterId,
    pub command: CommandId,
}

impl CommandPath {
    pub const fn new(endpoint: EndpointId, cluster: ClusterId, command: CommandId) -> Self {
        Self {
            endpoint,
            cluster,
            command,
        }
    }
}

impl fmt::Display for CommandPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ep={}, cluster=0x{:04x}, cmd=0x{:02x}",
            self.endpoint, self.cluster, self.command
        )
    }
}
