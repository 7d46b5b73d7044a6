//! Inbound registration requests.

use crate::device::{DEFAULT_LOCATION, Device, DeviceKind, DeviceKindTag};
use crate::error::{BridgeError, Result};
use crate::matter::attribute::AttributeSpec;
use crate::matter::clusters;
use crate::matter::endpoint_descriptor::{DescriptorBuilder, EndpointDescriptor};
use crate::matter::ids::{ClusterId, DeviceTypeId, EndpointId, INVALID_ENDPOINT_ID};
use serde::{Deserialize, Serialize};

/// Endpoint of the aggregator that parents bridged devices by default.
pub const DEFAULT_PARENT_ENDPOINT: EndpointId = 1;

/// Everything needed to register one bridged device.
///
/// Also the element type of device definition files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddDeviceRequest {
    /// Explicit endpoint id; auto-assigned when absent
    #[serde(default)]
    pub endpoint: Option<EndpointId>,
    #[serde(default = "default_parent")]
    pub parent_endpoint: EndpointId,
    pub name: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default)]
    pub zone: String,
    pub clusters: Vec<ClusterId>,
    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,
    #[serde(default)]
    pub device_types: Vec<DeviceTypeId>,
    #[serde(default)]
    pub kind: DeviceKindTag,
}

fn default_parent() -> EndpointId {
    DEFAULT_PARENT_ENDPOINT
}

fn default_location() -> String {
    DEFAULT_LOCATION.to_string()
}

impl AddDeviceRequest {
    pub fn new(name: impl Into<String>, clusters: Vec<ClusterId>) -> Self {
        Self {
            endpoint: None,
            parent_endpoint: DEFAULT_PARENT_ENDPOINT,
            name: name.into(),
            location: default_location(),
            zone: String::new(),
            clusters,
            attributes: Vec::new(),
            device_types: Vec::new(),
            kind: DeviceKindTag::Generic,
        }
    }

    pub fn with_endpoint(mut self, endpoint: EndpointId) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn with_parent(mut self, parent: EndpointId) -> Self {
        self.parent_endpoint = parent;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = zone.into();
        self
    }

    pub fn with_attributes(mut self, attributes: Vec<AttributeSpec>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Uses the default attribute table of every requested cluster.
    pub fn with_default_attributes(mut self) -> Self {
        self.attributes = self
            .clusters
            .iter()
            .flat_map(|&cluster_id| {
                clusters::default_attributes(cluster_id)
                    .into_iter()
                    .map(move |meta| AttributeSpec {
                        cluster_id,
                        attribute_id: meta.attribute_id,
                        type_tag: meta.type_tag,
                        size: meta.size,
                        mask: meta.mask,
                    })
            })
            .collect();
        self
    }

    pub fn with_device_types(mut self, device_types: Vec<DeviceTypeId>) -> Self {
        self.device_types = device_types;
        self
    }

    pub fn with_kind(mut self, kind: DeviceKindTag) -> Self {
        self.kind = kind;
        self
    }

    /// Requested endpoint, treating the invalid id as "auto".
    pub fn requested_endpoint(&self) -> Option<EndpointId> {
        self.endpoint.filter(|&ep| ep != INVALID_ENDPOINT_ID)
    }

    /// Rejects requests that cannot name a device.
    ///
    /// Attribute tuples are deliberately not checked.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(BridgeError::InvalidDefinition(
                "device name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// A fresh device for this request.
    pub fn build_device(&self) -> Device {
        let mut device = Device::new(&self.name, self.location.as_str(), DeviceKind::from_tag(self.kind));
        device.set_zone(&self.zone);
        device
    }

    pub fn build_descriptor(&self, builder: &DescriptorBuilder) -> EndpointDescriptor {
        builder.build(&self.name, &self.clusters, &self.attributes, &self.device_types)
    }
}
