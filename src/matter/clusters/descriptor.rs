//! Descriptor cluster (0x001D).
//!
//! Injected into every dynamic endpoint that does not declare it. All
//! attributes are arrays the model encodes itself.

use crate::matter::attribute::{AttributeMetadata, AttributeType, mask};
use crate::matter::ids::ClusterId;
use strum::FromRepr;

/// Matter Cluster ID for Descriptor
pub const CLUSTER_ID: ClusterId = 0x001D;

/// Cluster revision
pub const CLUSTER_REVISION: u16 = 1;

/// Max encoded size of the list attributes (one ZCL struct array)
pub const ARRAY_ATTRIBUTE_SIZE: u16 = 254;

/// Max encoded size of the endpoint unique id
pub const ENDPOINT_UNIQUE_ID_SIZE: u16 = 32;

/// Attribute IDs for the Descriptor cluster
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromRepr)]
#[repr(u32)]
pub enum DescriptorAttribute {
    DeviceTypeList = 0x0000,
    ServerList = 0x0001,
    ClientList = 0x0002,
    PartsList = 0x0003,
    EndpointUniqueId = 0x0005,
}

/// Built-in attribute list for an injected Descriptor cluster.
///
/// `endpoint_unique_id` adds the EndpointUniqueID attribute.
pub fn builtin_attributes(endpoint_unique_id: bool) -> Vec<AttributeMetadata> {
    let mut attrs: Vec<AttributeMetadata> = [
        DescriptorAttribute::DeviceTypeList,
        DescriptorAttribute::ServerList,
        DescriptorAttribute::ClientList,
        DescriptorAttribute::PartsList,
    ]
    .into_iter()
    .map(|attr| {
        AttributeMetadata::new(
            attr as u32,
            AttributeType::Array,
            ARRAY_ATTRIBUTE_SIZE,
            mask::NONE,
        )
    })
    .collect();

    if endpoint_unique_id {
        attrs.push(AttributeMetadata::new(
            DescriptorAttribute::EndpointUniqueId as u32,
            AttributeType::CharString,
            ENDPOINT_UNIQUE_ID_SIZE,
            mask::NONE,
        ));
    }
    attrs
}
