//! Registration requests for common bridged devices.
//!
//! Each preset parents the device on the aggregator unless the caller
//! overrides it with [`AddDeviceRequest::with_parent`]. "Composed" variants
//! leave out the Bridged Node device type because they hang below a
//! composed parent that already carries it.

use super::DeviceKindTag;
use crate::bridge::request::AddDeviceRequest;
use crate::matter::attribute::{AttributeSpec, AttributeType, mask};
use crate::matter::clusters::power_source::{self, PowerSourceAttribute};
use crate::matter::clusters::{on_off, relative_humidity, temperature_measurement};
use crate::matter::device_types::{
    DEV_TYPE_BRIDGED_NODE, DEV_TYPE_HUMIDITY_SENSOR, DEV_TYPE_ON_OFF_LIGHT, DEV_TYPE_POWER_SOURCE,
    DEV_TYPE_TEMPERATURE_SENSOR,
};
use crate::matter::ids::{AttributeId, ClusterId, global};

/// Door Lock cluster. Only its LockState is exposed, through the delegate.
pub const DOOR_LOCK_CLUSTER_ID: ClusterId = 0x0101;
pub const DOOR_LOCK_LOCK_STATE: AttributeId = 0x0000;

const READ_EXTERNAL: u8 = mask::READABLE | mask::EXTERNAL_STORAGE;

fn cluster_revision(cluster_id: ClusterId) -> AttributeSpec {
    AttributeSpec::new(cluster_id, global::CLUSTER_REVISION, AttributeType::Int16u, 2, READ_EXTERNAL)
}

pub fn light(name: &str) -> AddDeviceRequest {
    AddDeviceRequest::new(name, vec![on_off::CLUSTER_ID])
        .with_default_attributes()
        .with_device_types(vec![DEV_TYPE_ON_OFF_LIGHT.dtype, DEV_TYPE_BRIDGED_NODE.dtype])
        .with_kind(DeviceKindTag::OnOff)
}

/// On/off endpoint whose state lives entirely in the delegate.
pub fn generic_on_off(name: &str) -> AddDeviceRequest {
    light(name).with_kind(DeviceKindTag::Generic)
}

pub fn temperature_sensor(name: &str) -> AddDeviceRequest {
    composed_temperature_sensor(name).with_device_types(vec![
        DEV_TYPE_TEMPERATURE_SENSOR.dtype,
        DEV_TYPE_BRIDGED_NODE.dtype,
    ])
}

pub fn composed_temperature_sensor(name: &str) -> AddDeviceRequest {
    AddDeviceRequest::new(name, vec![temperature_measurement::CLUSTER_ID])
        .with_default_attributes()
        .with_device_types(vec![DEV_TYPE_TEMPERATURE_SENSOR.dtype])
        .with_kind(DeviceKindTag::TempSensor)
}

pub fn humidity_sensor(name: &str) -> AddDeviceRequest {
    composed_humidity_sensor(name).with_device_types(vec![
        DEV_TYPE_HUMIDITY_SENSOR.dtype,
        DEV_TYPE_BRIDGED_NODE.dtype,
    ])
}

pub fn composed_humidity_sensor(name: &str) -> AddDeviceRequest {
    AddDeviceRequest::new(name, vec![relative_humidity::CLUSTER_ID])
        .with_default_attributes()
        .with_device_types(vec![DEV_TYPE_HUMIDITY_SENSOR.dtype])
}

pub fn door_lock(name: &str) -> AddDeviceRequest {
    AddDeviceRequest::new(name, vec![DOOR_LOCK_CLUSTER_ID])
        .with_attributes(vec![
            AttributeSpec::new(
                DOOR_LOCK_CLUSTER_ID,
                DOOR_LOCK_LOCK_STATE,
                AttributeType::Int16u,
                2,
                READ_EXTERNAL,
            ),
            cluster_revision(DOOR_LOCK_CLUSTER_ID),
        ])
        .with_device_types(vec![DEV_TYPE_BRIDGED_NODE.dtype])
}

/// Parent of a composed device. Children are registered separately with
/// their parent set to this device's endpoint.
pub fn composed_device(name: &str) -> AddDeviceRequest {
    let attr = |id: PowerSourceAttribute, ty: AttributeType, size: u16| {
        AttributeSpec::new(power_source::CLUSTER_ID, id as AttributeId, ty, size, READ_EXTERNAL)
    };
    AddDeviceRequest::new(name, vec![power_source::CLUSTER_ID])
        .with_attributes(vec![
            attr(PowerSourceAttribute::BatChargeLevel, AttributeType::Enum8, 1),
            attr(PowerSourceAttribute::Order, AttributeType::Int8u, 1),
            attr(PowerSourceAttribute::Status, AttributeType::Enum8, 1),
            attr(PowerSourceAttribute::Description, AttributeType::CharString, 32),
            cluster_revision(power_source::CLUSTER_ID),
        ])
        .with_device_types(vec![DEV_TYPE_BRIDGED_NODE.dtype, DEV_TYPE_POWER_SOURCE.dtype])
        .with_kind(DeviceKindTag::PowerSource)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::request::DEFAULT_PARENT_ENDPOINT;
    use crate::matter::clusters::{bridged_device_basic_info, descriptor};
    use crate::matter::endpoint_descriptor::DescriptorBuilder;

    #[test]
    fn test_bridged_presets_get_basic_info() {
        let builder = DescriptorBuilder::default();
        for request in [light("L"), temperature_sensor("T"), humidity_sensor("H"), door_lock("D")] {
            assert_eq!(request.parent_endpoint, DEFAULT_PARENT_ENDPOINT);
            let desc = request.build_descriptor(&builder);
            assert!(desc.has_cluster(descriptor::CLUSTER_ID), "{}", request.name);
            assert!(desc.has_cluster(bridged_device_basic_info::CLUSTER_ID), "{}", request.name);
        }
    }

    #[test]
    fn test_composed_children_skip_basic_info() {
        let builder = DescriptorBuilder::default();
        let temp = composed_temperature_sensor("T").with_parent(5).build_descriptor(&builder);
        assert_eq!(
            temp.cluster_ids(),
            vec![temperature_measurement::CLUSTER_ID, descriptor::CLUSTER_ID]
        );
        assert_eq!(
            temp.cluster(temperature_measurement::CLUSTER_ID).map(|c| c.attributes.len()),
            Some(4)
        );
        let humidity = composed_humidity_sensor("H").build_descriptor(&builder);
        assert!(!humidity.has_cluster(bridged_device_basic_info::CLUSTER_ID));
    }

    #[test]
    fn test_composed_device_attributes() {
        let request = composed_device("Sensor Pack");
        assert_eq!(request.kind, DeviceKindTag::PowerSource);
        let ids: Vec<AttributeId> = request.attributes.iter().map(|a| a.attribute_id).collect();
        assert_eq!(ids, vec![0x000E, 0x0001, 0x0000, 0x0002, global::CLUSTER_REVISION]);

        let desc = request.build_descriptor(&DescriptorBuilder::default());
        assert_eq!(desc.clusters.len(), 3);
    }

    #[test]
    fn test_generic_on_off_keeps_schema() {
        let generic = generic_on_off("G");
        assert_eq!(generic.kind, DeviceKindTag::Generic);
        assert_eq!(generic.attributes, light("G").attributes);
    }
}
