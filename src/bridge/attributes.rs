//! Attribute dispatch gateway.
//!
//! Entry points the device model calls for externally stored attributes of
//! dynamic endpoints. PowerSource reads go to the reserved power source
//! first, basic information is answered from the slot's device, everything
//! else is a pass-through to the external delegate.

use super::core::BridgeCore;
use crate::matter::clusters::bridged_device_basic_info as basic_info;
use crate::matter::clusters::descriptor::{self, DescriptorAttribute};
use crate::matter::clusters::power_source::{self, PowerSourceValue};
use crate::device::DeviceKind;
use crate::matter::attribute::AttributeMetadata;
use crate::matter::ids::{AttributeId, AttributePath, ClusterId, EndpointId};
use crate::matter::status::Status;
use log::{debug, info, warn};
use std::hash::{DefaultHasher, Hash, Hasher};

impl<const N: usize> BridgeCore<N> {
    /// Reads an attribute into `buffer`; `buffer.len()` is the max length.
    pub fn read_attribute(
        &self,
        endpoint: EndpointId,
        cluster: ClusterId,
        metadata: &AttributeMetadata,
        buffer: &mut [u8],
    ) -> Status {
        let attribute = metadata.attribute_id;

        if cluster == power_source::CLUSTER_ID {
            match self.read_power_source(AttributePath::new(endpoint, cluster, attribute)) {
                Ok(Some(value)) => {
                    return match value.encode(buffer) {
                        Some(_) => Status::Success,
                        None => Status::Failure,
                    };
                }
                Err(status) => return status,
                Ok(None) => {}
            }
        }

        let Some(slot) = self.registry.slot_for(endpoint) else {
            if endpoint == self.settings.aggregator_endpoint
                && cluster == descriptor::CLUSTER_ID
                && attribute == DescriptorAttribute::PartsList as AttributeId
            {
                info!("[Bridge] PartsList read on aggregator endpoint {} is not encoded here", endpoint);
                return Status::UnsupportedAttribute;
            }
            debug!("[Bridge] Read for unmapped endpoint {}", endpoint);
            return Status::Failure;
        };

        if cluster == basic_info::CLUSTER_ID {
            return basic_info::read_attribute(&slot.device, attribute, buffer);
        }

        let max_len = u16::try_from(buffer.len()).unwrap_or(u16::MAX);
        debug!(
            "[Bridge] Forwarding read: {}, max_len={}",
            AttributePath::new(endpoint, cluster, attribute),
            max_len
        );
        match self.delegate.read_attribute(endpoint, cluster, attribute, max_len) {
            Some(value) if !value.is_empty() && value.len() <= buffer.len() => {
                buffer[..value.len()].copy_from_slice(&value);
                Status::Success
            }
            _ => Status::UnsupportedAttribute,
        }
    }

    /// Applies a write from the model.
    pub fn write_attribute(
        &mut self,
        endpoint: EndpointId,
        cluster: ClusterId,
        metadata: &AttributeMetadata,
        buffer: &[u8],
    ) -> Status {
        let attribute = metadata.attribute_id;

        let Some(slot) = self.registry.slot_for_mut(endpoint) else {
            return Status::Failure;
        };
        if !slot.device.is_reachable() {
            warn!("[Bridge] Write to unreachable endpoint {} rejected", endpoint);
            return Status::Failure;
        }

        if cluster == basic_info::CLUSTER_ID {
            let status = basic_info::write_attribute(&mut slot.device, attribute, buffer);
            if status.is_success() {
                let hash = name_hash(slot.device.name());
                self.schedule_change(AttributePath::new(endpoint, cluster, attribute));
                self.delegate
                    .state_changed(endpoint, cluster, attribute, &hash.to_le_bytes());
            }
            return status;
        }

        let len = buffer.len().min(self.settings.external_write_size);
        debug!(
            "[Bridge] Forwarding write: {}, len={}",
            AttributePath::new(endpoint, cluster, attribute),
            len
        );
        if !self
            .delegate
            .write_attribute(endpoint, cluster, attribute, &buffer[..len])
        {
            debug!("[Bridge] Delegate did not handle write on endpoint {}", endpoint);
            return Status::UnsupportedAttribute;
        }

        self.report_change(AttributePath::new(endpoint, cluster, attribute));
        self.delegate
            .state_changed(endpoint, cluster, attribute, &buffer[..len]);
        Status::Success
    }

    /// Reads a PowerSource attribute for any endpoint from the reserved
    /// power source device.
    ///
    /// `Ok(None)` when no power source is installed, letting the model fall
    /// back to its own handling.
    pub fn read_power_source(&self, path: AttributePath) -> Result<Option<PowerSourceValue>, Status> {
        if path.cluster != power_source::CLUSTER_ID {
            return Err(Status::UnsupportedAttribute);
        }
        let Some(device) = self.registry.reserved() else {
            return Ok(None);
        };
        if path.endpoint != device.endpoint_id() {
            return Err(Status::UnsupportedEndpoint);
        }
        let DeviceKind::PowerSource(state) = device.kind() else {
            return Err(Status::UnsupportedAttribute);
        };
        power_source::read_attribute(state, path.attribute).map(Some)
    }
}

/// Lightweight observer value for a name change. Not the name itself.
fn name_hash(name: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::core::tests::{Fixture, light};
    use crate::device::{Device, DeviceKindTag};
    use crate::matter::attribute::{AttributeType, decode_char_string, encode_char_string, mask};
    use crate::matter::clusters::bridged_device_basic_info::{
        BridgedDeviceBasicAttribute, NODE_LABEL_SIZE,
    };
    use crate::matter::clusters::on_off;
    use crate::matter::clusters::power_source::PowerSourceAttribute;
    use crate::matter::ids::global;

    fn meta(attribute: AttributeId) -> AttributeMetadata {
        AttributeMetadata::new(attribute, AttributeType::Int8u, 1, mask::EXTERNAL_STORAGE)
    }

    fn basic(attr: BridgedDeviceBasicAttribute) -> AttributeMetadata {
        meta(attr as AttributeId)
    }

    #[test]
    fn test_basic_info_reads_after_add() {
        let mut fx = Fixture::<4>::new();
        let ep = fx.core.add_device(&light("Kitchen Light")).unwrap();
        let mut buf = [0u8; 64];

        let status = fx.core.read_attribute(
            ep,
            basic_info::CLUSTER_ID,
            &basic(BridgedDeviceBasicAttribute::Reachable),
            &mut buf[..1],
        );
        assert_eq!(status, Status::Success);
        assert_eq!(buf[0], 1);

        let status = fx.core.read_attribute(
            ep,
            basic_info::CLUSTER_ID,
            &basic(BridgedDeviceBasicAttribute::NodeLabel),
            &mut buf,
        );
        assert_eq!(status, Status::Success);
        assert_eq!(decode_char_string(&buf), Some(&b"Kitchen Light"[..]));

        let status = fx.core.read_attribute(
            ep,
            basic_info::CLUSTER_ID,
            &basic(BridgedDeviceBasicAttribute::UniqueId),
            &mut buf,
        );
        assert_eq!(status, Status::Success);
        assert_eq!(decode_char_string(&buf).map(<[u8]>::len), Some(32));

        let status = fx
            .core
            .read_attribute(ep, basic_info::CLUSTER_ID, &meta(global::FEATURE_MAP), &mut buf[..4]);
        assert_eq!(status, Status::Success);
        assert_eq!(&buf[..4], &[0, 0, 0, 0]);

        let status = fx.core.read_attribute(
            ep,
            basic_info::CLUSTER_ID,
            &basic(BridgedDeviceBasicAttribute::ConfigurationVersion),
            &mut buf[..3],
        );
        assert_eq!(status, Status::Failure);
    }

    #[test]
    fn test_unmapped_endpoint_reads() {
        let fx = Fixture::<4>::new();
        let mut buf = [0u8; 16];
        let parts = meta(DescriptorAttribute::PartsList as AttributeId);
        assert_eq!(
            fx.core.read_attribute(1, descriptor::CLUSTER_ID, &parts, &mut buf),
            Status::UnsupportedAttribute
        );
        assert_eq!(
            fx.core.read_attribute(9, descriptor::CLUSTER_ID, &parts, &mut buf),
            Status::Failure
        );
        assert_eq!(
            fx.core.read_attribute(1, on_off::CLUSTER_ID, &meta(0), &mut buf),
            Status::Failure
        );
    }

    #[test]
    fn test_delegate_reads_respect_max_len() {
        let mut fx = Fixture::<4>::new();
        let ep = fx.core.add_device(&light("Lamp")).unwrap();
        let mut buf = [0u8; 2];

        // Nothing stored yet
        assert_eq!(
            fx.core.read_attribute(ep, 0x0008, &meta(0), &mut buf),
            Status::UnsupportedAttribute
        );

        fx.delegate.set_value(AttributePath::new(ep, 0x0008, 0), vec![0xFE]);
        assert_eq!(fx.core.read_attribute(ep, 0x0008, &meta(0), &mut buf), Status::Success);
        assert_eq!(buf[0], 0xFE);

        fx.delegate.set_value(AttributePath::new(ep, 0x0008, 0), vec![1, 2, 3]);
        assert_eq!(
            fx.core.read_attribute(ep, 0x0008, &meta(0), &mut buf),
            Status::UnsupportedAttribute
        );

        fx.delegate.set_value(AttributePath::new(ep, 0x0008, 0), vec![]);
        assert_eq!(
            fx.core.read_attribute(ep, 0x0008, &meta(0), &mut buf),
            Status::UnsupportedAttribute
        );
    }

    #[test]
    fn test_name_write_and_hash_notification() {
        let mut fx = Fixture::<4>::new();
        let ep = fx.core.add_device(&light("Lamp")).unwrap();
        fx.scheduled();

        let mut buf = [0u8; 34];
        encode_char_string(&mut buf, "Desk Lamp");
        let label = basic(BridgedDeviceBasicAttribute::NodeLabel);
        assert_eq!(
            fx.core.write_attribute(ep, basic_info::CLUSTER_ID, &label, &buf),
            Status::Success
        );
        assert_eq!(fx.core.registry().device_at(ep).map(Device::name), Some("Desk Lamp"));
        assert_eq!(
            fx.scheduled(),
            vec![AttributePath::new(ep, basic_info::CLUSTER_ID, label.attribute_id)]
        );

        let changes = fx.delegate.state_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].value, name_hash("Desk Lamp").to_le_bytes().to_vec());
    }

    #[test]
    fn test_oversized_name_is_constraint_error() {
        let mut fx = Fixture::<4>::new();
        let ep = fx.core.add_device(&light("Lamp")).unwrap();

        let mut buf = vec![(NODE_LABEL_SIZE + 1) as u8];
        buf.extend(std::iter::repeat_n(b'x', NODE_LABEL_SIZE + 1));
        let label = basic(BridgedDeviceBasicAttribute::NodeLabel);
        assert_eq!(
            fx.core.write_attribute(ep, basic_info::CLUSTER_ID, &label, &buf),
            Status::ConstraintError
        );
        assert_eq!(fx.core.registry().device_at(ep).map(Device::name), Some("Lamp"));
        assert!(fx.delegate.state_changes().is_empty());
    }

    #[test]
    fn test_basic_info_other_attributes_not_writable() {
        let mut fx = Fixture::<4>::new();
        let ep = fx.core.add_device(&light("Lamp")).unwrap();
        assert_eq!(
            fx.core.write_attribute(
                ep,
                basic_info::CLUSTER_ID,
                &basic(BridgedDeviceBasicAttribute::Reachable),
                &[0]
            ),
            Status::UnsupportedWrite
        );
    }

    #[test]
    fn test_unreachable_device_rejects_all_writes() {
        let mut fx = Fixture::<4>::new();
        let ep = fx.core.add_device(&light("Lamp")).unwrap();
        fx.core.set_reachable(ep, false).unwrap();

        let mut buf = [0u8; 8];
        encode_char_string(&mut buf, "New");
        let label = basic(BridgedDeviceBasicAttribute::NodeLabel);
        assert_eq!(
            fx.core.write_attribute(ep, basic_info::CLUSTER_ID, &label, &buf),
            Status::Failure
        );
        assert_eq!(
            fx.core.write_attribute(ep, on_off::CLUSTER_ID, &meta(0), &[1]),
            Status::Failure
        );
        assert_eq!(
            fx.core.write_attribute(ep, 0x0008, &meta(0), &[1]),
            Status::Failure
        );
        assert_eq!(fx.core.write_attribute(77, 0x0008, &meta(0), &[1]), Status::Failure);
        assert!(fx.delegate.state_changes().is_empty());
    }

    #[test]
    fn test_forwarded_write_reports_immediately() {
        let mut fx = Fixture::<4>::new();
        let ep = fx.core.add_device(&light("Lamp")).unwrap();
        let path = AttributePath::new(ep, 0x0008, 0);
        let long = [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10];

        assert_eq!(fx.core.write_attribute(ep, 0x0008, &meta(0), &long), Status::Success);
        assert_eq!(fx.delegate.value(path), Some(long[..8].to_vec()));
        assert_eq!(fx.reports.count(path), 1);
        assert_eq!(fx.delegate.state_changes()[0].value, long[..8].to_vec());

        fx.delegate.set_accept_writes(false);
        assert_eq!(
            fx.core.write_attribute(ep, 0x0008, &meta(0), &[1]),
            Status::UnsupportedAttribute
        );
        assert_eq!(fx.reports.count(path), 1);
    }

    #[test]
    fn test_power_source_accessor() {
        let mut fx = Fixture::<4>::new();
        let status = AttributePath::new(5, power_source::CLUSTER_ID, PowerSourceAttribute::Status as u32);
        assert_eq!(fx.core.read_power_source(status), Ok(None));

        let battery = Device::new("Battery", "Generic", DeviceKind::from_tag(DeviceKindTag::PowerSource));
        fx.core.install_power_source(battery, 5).unwrap();
        fx.core.set_power_source_endpoints(vec![5, 6]).unwrap();

        assert_eq!(fx.core.read_power_source(status), Ok(Some(PowerSourceValue::U8(1))));
        assert_eq!(
            fx.core.read_power_source(AttributePath::new(6, power_source::CLUSTER_ID, 0)),
            Err(Status::UnsupportedEndpoint)
        );
        assert_eq!(
            fx.core.read_power_source(AttributePath::new(
                5,
                power_source::CLUSTER_ID,
                PowerSourceAttribute::EndpointList as u32
            )),
            Ok(Some(PowerSourceValue::EndpointList(vec![5, 6])))
        );
        assert_eq!(
            fx.core.read_power_source(AttributePath::new(5, power_source::CLUSTER_ID, 0x0042)),
            Err(Status::UnsupportedAttribute)
        );
    }

    #[test]
    fn test_power_source_reads_prefer_reserved_device() {
        let mut fx = Fixture::<4>::new();
        let parent = fx.core.add_device(&crate::device::presets::composed_device("Pack")).unwrap();
        let other = fx.core.add_device(&light("Lamp")).unwrap();
        let description = meta(PowerSourceAttribute::Description as AttributeId);
        let mut buf = [0u8; 64];

        // Without a reserved device the delegate answers
        fx.delegate.set_value(
            AttributePath::new(parent, power_source::CLUSTER_ID, description.attribute_id),
            vec![1, b'D'],
        );
        assert_eq!(
            fx.core.read_attribute(parent, power_source::CLUSTER_ID, &description, &mut buf),
            Status::Success
        );
        assert_eq!(&buf[..2], &[1, b'D']);

        let battery = Device::new("Battery", "Generic", DeviceKind::from_tag(DeviceKindTag::PowerSource));
        fx.core.install_power_source(battery, parent).unwrap();
        fx.core.set_power_source_endpoints(vec![parent]).unwrap();

        assert_eq!(
            fx.core.read_attribute(parent, power_source::CLUSTER_ID, &description, &mut buf),
            Status::Success
        );
        assert_eq!(decode_char_string(&buf), Some(&b"Primary Battery"[..]));

        let list = meta(PowerSourceAttribute::EndpointList as AttributeId);
        assert_eq!(
            fx.core.read_attribute(parent, power_source::CLUSTER_ID, &list, &mut buf),
            Status::Success
        );
        assert_eq!(&buf[..4], &[1, 0, parent as u8, 0]);

        assert_eq!(
            fx.core.read_attribute(parent, power_source::CLUSTER_ID, &description, &mut buf[..4]),
            Status::Failure
        );
        assert_eq!(
            fx.core.read_attribute(other, power_source::CLUSTER_ID, &description, &mut buf),
            Status::UnsupportedEndpoint
        );
    }
}
