//! Dynamic endpoint descriptors.
//!
//! A descriptor is the per-device bundle handed to the device model at
//! registration: the cluster list with per-cluster attribute metadata, the
//! device type list and one data version per cluster. It is owned by the
//! registry slot and dropped with it.

use super::attribute::{AttributeMetadata, AttributeSpec};
use super::clusters::{bridged_device_basic_info, descriptor, on_off};
use super::device_types::{DeviceType, is_bridged_node};
use super::ids::{ClusterId, CommandId, DataVersion, DeviceTypeId};
use log::debug;

/// One server cluster on a dynamic endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterDescriptor {
    pub cluster_id: ClusterId,
    pub attributes: Vec<AttributeMetadata>,
    /// Statically accepted commands (only populated for OnOff)
    pub accepted_commands: Vec<CommandId>,
}

impl ClusterDescriptor {
    pub fn attribute(&self, attribute_id: u32) -> Option<&AttributeMetadata> {
        self.attributes.iter().find(|a| a.attribute_id == attribute_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub name: String,
    pub clusters: Vec<ClusterDescriptor>,
    pub device_types: Vec<DeviceType>,
    /// Change-tracking counters, one per cluster
    pub data_versions: Vec<DataVersion>,
}

impl EndpointDescriptor {
    pub fn cluster(&self, cluster_id: ClusterId) -> Option<&ClusterDescriptor> {
        self.clusters.iter().find(|c| c.cluster_id == cluster_id)
    }

    pub fn has_cluster(&self, cluster_id: ClusterId) -> bool {
        self.cluster(cluster_id).is_some()
    }

    pub fn cluster_ids(&self) -> Vec<ClusterId> {
        self.clusters.iter().map(|c| c.cluster_id).collect()
    }

    /// Bumps the data version of a cluster. Returns the new version.
    pub fn bump_data_version(&mut self, cluster_id: ClusterId) -> Option<DataVersion> {
        let index = self.clusters.iter().position(|c| c.cluster_id == cluster_id)?;
        let version = self.data_versions.get_mut(index)?;
        *version = version.wrapping_add(1);
        Some(*version)
    }
}

/// Builds [`EndpointDescriptor`]s from caller-supplied schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorBuilder {
    /// Adds EndpointUniqueID to injected Descriptor clusters
    pub endpoint_unique_id: bool,
}

impl DescriptorBuilder {
    pub fn new(endpoint_unique_id: bool) -> Self {
        Self { endpoint_unique_id }
    }

    /// Assembles a descriptor.
    ///
    /// Attribute tuples are grouped by cluster in caller order. Descriptor is
    /// injected when missing, and BridgedDeviceBasicInformation when missing
    /// on a bridged node. Tuples are not validated, and tuples for clusters
    /// that were not requested are dropped.
    pub fn build(
        &self,
        name: &str,
        clusters: &[ClusterId],
        attributes: &[AttributeSpec],
        device_types: &[DeviceTypeId],
    ) -> EndpointDescriptor {
        let device_types: Vec<DeviceType> =
            device_types.iter().map(|&id| DeviceType::new(id)).collect();

        let mut cluster_ids: Vec<ClusterId> = Vec::with_capacity(clusters.len() + 2);
        for &id in clusters {
            if !cluster_ids.contains(&id) {
                cluster_ids.push(id);
            }
        }

        let mut descriptors: Vec<ClusterDescriptor> = cluster_ids
            .iter()
            .map(|&cluster_id| ClusterDescriptor {
                cluster_id,
                attributes: attributes
                    .iter()
                    .filter(|spec| spec.cluster_id == cluster_id)
                    .map(AttributeSpec::metadata)
                    .collect(),
                accepted_commands: accepted_commands(cluster_id),
            })
            .collect();

        if !cluster_ids.contains(&descriptor::CLUSTER_ID) {
            descriptors.push(ClusterDescriptor {
                cluster_id: descriptor::CLUSTER_ID,
                attributes: descriptor::builtin_attributes(self.endpoint_unique_id),
                accepted_commands: Vec::new(),
            });
        }

        if is_bridged_node(&device_types)
            && !cluster_ids.contains(&bridged_device_basic_info::CLUSTER_ID)
        {
            descriptors.push(ClusterDescriptor {
                cluster_id: bridged_device_basic_info::CLUSTER_ID,
                attributes: bridged_device_basic_info::builtin_attributes(),
                accepted_commands: Vec::new(),
            });
        }

        debug!(
            "[Bridge] Built descriptor for '{}': clusters={:04x?}, device_types={}",
            name,
            descriptors.iter().map(|c| c.cluster_id).collect::<Vec<_>>(),
            device_types.len()
        );

        EndpointDescriptor {
            name: name.to_string(),
            data_versions: vec![0; descriptors.len()],
            clusters: descriptors,
            device_types,
        }
    }
}

fn accepted_commands(cluster_id: ClusterId) -> Vec<CommandId> {
    if cluster_id == on_off::CLUSTER_ID {
        on_off::ACCEPTED_COMMANDS.to_vec()
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matter::attribute::{AttributeType, mask};
    use crate::matter::device_types::{DEV_TYPE_BRIDGED_NODE, DEV_TYPE_ON_OFF_LIGHT};

    fn on_off_attrs() -> Vec<AttributeSpec> {
        vec![AttributeSpec::new(
            on_off::CLUSTER_ID,
            0,
            AttributeType::Boolean,
            1,
            mask::WRITABLE | mask::EXTERNAL_STORAGE,
        )]
    }

    #[test]
    fn test_bridged_node_injects_descriptor_and_basic_info() {
        let desc = DescriptorBuilder::default().build(
            "Light",
            &[on_off::CLUSTER_ID],
            &on_off_attrs(),
            &[DEV_TYPE_ON_OFF_LIGHT.dtype, DEV_TYPE_BRIDGED_NODE.dtype],
        );
        assert_eq!(
            desc.cluster_ids(),
            vec![
                on_off::CLUSTER_ID,
                descriptor::CLUSTER_ID,
                bridged_device_basic_info::CLUSTER_ID
            ]
        );
        assert_eq!(desc.data_versions, vec![0, 0, 0]);
        assert_eq!(desc.cluster(on_off::CLUSTER_ID).map(|c| c.accepted_commands.len()), Some(3));
        assert!(desc.cluster(descriptor::CLUSTER_ID).unwrap().accepted_commands.is_empty());
        assert_eq!(desc.device_types[1].drev, 1);
    }

    #[test]
    fn test_basic_info_only_for_bridged_nodes() {
        let desc = DescriptorBuilder::default().build(
            "Sensor",
            &[on_off::CLUSTER_ID],
            &on_off_attrs(),
            &[DEV_TYPE_ON_OFF_LIGHT.dtype],
        );
        assert_eq!(desc.cluster_ids(), vec![on_off::CLUSTER_ID, descriptor::CLUSTER_ID]);
    }

    #[test]
    fn test_declared_clusters_are_not_replaced() {
        let custom = AttributeSpec::new(
            descriptor::CLUSTER_ID,
            0,
            AttributeType::Array,
            10,
            mask::NONE,
        );
        let desc = DescriptorBuilder::default().build(
            "Custom",
            &[descriptor::CLUSTER_ID, descriptor::CLUSTER_ID],
            &[custom],
            &[],
        );
        assert_eq!(desc.clusters.len(), 1);
        assert_eq!(desc.clusters[0].attributes, vec![custom.metadata()]);
    }

    #[test]
    fn test_attributes_grouped_in_caller_order() {
        let attrs = [
            AttributeSpec::new(0x0402, 2, AttributeType::Int16s, 2, mask::NONE),
            AttributeSpec::new(on_off::CLUSTER_ID, 0, AttributeType::Boolean, 1, mask::NONE),
            AttributeSpec::new(0x0402, 0, AttributeType::Int16s, 2, mask::NONE),
            // Unknown type and zero size pass through
            AttributeSpec { cluster_id: 0x0402, attribute_id: 1, type_tag: 0xEE, size: 0, mask: 0 },
        ];
        let desc = DescriptorBuilder::new(true).build(
            "Mixed",
            &[0x0402, on_off::CLUSTER_ID],
            &attrs,
            &[],
        );
        let temp = desc.cluster(0x0402).unwrap();
        let ids: Vec<u32> = temp.attributes.iter().map(|a| a.attribute_id).collect();
        assert_eq!(ids, vec![2, 0, 1]);
        assert_eq!(temp.attribute(1).map(|a| a.size), Some(0));
        assert_eq!(desc.cluster(descriptor::CLUSTER_ID).unwrap().attributes.len(), 5);
    }

    #[test]
    fn test_bump_data_version() {
        let mut desc = DescriptorBuilder::default().build("X", &[on_off::CLUSTER_ID], &[], &[]);
        assert_eq!(desc.bump_data_version(on_off::CLUSTER_ID), Some(1));
        assert_eq!(desc.bump_data_version(0x9999), None);
        assert_eq!(desc.data_versions, vec![1, 0]);
    }
}
