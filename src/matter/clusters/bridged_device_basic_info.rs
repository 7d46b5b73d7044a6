//! BridgedDeviceBasicInformation Cluster (0x0039) handler.
//!
//! Provides endpoint names via the NodeLabel attribute for Matter bridges.
//! Controllers like Home Assistant read NodeLabel to display bridged device names.
//!
//! This cluster is infrastructure the bridge owns, so reads and writes are
//! answered here from the [`Device`] instead of going to the delegate.

use crate::device::Device;
use crate::matter::attribute::{
    AttributeMetadata, AttributeType, decode_char_string, encode_char_string, mask,
};
use crate::matter::ids::{AttributeId, ClusterId, global};
use crate::matter::status::Status;
use log::debug;
use strum::FromRepr;

/// Matter Cluster ID for BridgedDeviceBasicInformation
pub const CLUSTER_ID: ClusterId = 0x0039;

/// Cluster revision
pub const CLUSTER_REVISION: u16 = 2;

/// Feature map (no optional features)
pub const FEATURE_MAP: u32 = 0;

/// Max length of NodeLabel
pub const NODE_LABEL_SIZE: usize = 32;

/// Max length of UniqueID
pub const UNIQUE_ID_SIZE: usize = 32;

/// Buffer space for an encoded label: the length byte plus the label.
const fn encoded_size(max_len: usize) -> usize {
    max_len + 1
}

/// Attribute IDs handled by the bridge
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromRepr)]
#[repr(u32)]
pub enum BridgedDeviceBasicAttribute {
    NodeLabel = 0x0005,
    Reachable = 0x0011,
    UniqueId = 0x0012,
    ConfigurationVersion = 0x0018,
    FeatureMap = global::FEATURE_MAP,
    ClusterRevision = global::CLUSTER_REVISION,
}

/// Built-in attribute list injected for bridged nodes.
pub fn builtin_attributes() -> Vec<AttributeMetadata> {
    vec![
        AttributeMetadata::new(
            BridgedDeviceBasicAttribute::NodeLabel as u32,
            AttributeType::CharString,
            NODE_LABEL_SIZE as u16,
            mask::WRITABLE | mask::EXTERNAL_STORAGE,
        ),
        AttributeMetadata::new(
            BridgedDeviceBasicAttribute::Reachable as u32,
            AttributeType::Boolean,
            1,
            mask::NONE,
        ),
        AttributeMetadata::new(
            BridgedDeviceBasicAttribute::UniqueId as u32,
            AttributeType::CharString,
            UNIQUE_ID_SIZE as u16,
            mask::NONE,
        ),
        AttributeMetadata::new(
            BridgedDeviceBasicAttribute::ConfigurationVersion as u32,
            AttributeType::Int32u,
            4,
            mask::NONE,
        ),
        AttributeMetadata::new(
            BridgedDeviceBasicAttribute::FeatureMap as u32,
            AttributeType::Bitmap32,
            4,
            mask::NONE,
        ),
    ]
}

/// Encodes one attribute of `device` into `buffer`.
///
/// Every branch needs the buffer to hold the whole field; a short buffer or
/// an unknown attribute is a `Failure`. Strings need room for their length
/// byte, so a full 32-byte label needs 33 bytes.
pub fn read_attribute(device: &Device, attribute_id: AttributeId, buffer: &mut [u8]) -> Status {
    debug!(
        "[Bridge] Basic info read: ep={}, attr=0x{:04x}, max_len={}",
        device.endpoint_id(),
        attribute_id,
        buffer.len()
    );

    let Some(attr) = BridgedDeviceBasicAttribute::from_repr(attribute_id) else {
        return Status::Failure;
    };

    match attr {
        BridgedDeviceBasicAttribute::Reachable if !buffer.is_empty() => {
            buffer[0] = u8::from(device.is_reachable());
        }
        BridgedDeviceBasicAttribute::NodeLabel if buffer.len() >= encoded_size(NODE_LABEL_SIZE) => {
            encode_char_string(buffer, device.name());
        }
        BridgedDeviceBasicAttribute::UniqueId if buffer.len() >= encoded_size(UNIQUE_ID_SIZE) => {
            encode_char_string(buffer, device.unique_id());
        }
        BridgedDeviceBasicAttribute::ConfigurationVersion if buffer.len() >= 4 => {
            buffer[..4].copy_from_slice(&device.configuration_version().to_le_bytes());
        }
        BridgedDeviceBasicAttribute::ClusterRevision if buffer.len() >= 2 => {
            buffer[..2].copy_from_slice(&CLUSTER_REVISION.to_le_bytes());
        }
        BridgedDeviceBasicAttribute::FeatureMap if buffer.len() >= 4 => {
            buffer[..4].copy_from_slice(&FEATURE_MAP.to_le_bytes());
        }
        _ => return Status::Failure,
    }
    Status::Success
}

/// Applies a write to `device`. Only NodeLabel is writable.
///
/// `buffer` holds a ZCL character string. Labels longer than 32 bytes or not
/// valid UTF-8 are a `ConstraintError`. On success the device name has been
/// replaced; raising notifications is left to the caller.
pub fn write_attribute(device: &mut Device, attribute_id: AttributeId, buffer: &[u8]) -> Status {
    if attribute_id != BridgedDeviceBasicAttribute::NodeLabel as u32 {
        return Status::UnsupportedWrite;
    }

    let Some(label) = decode_char_string(buffer) else {
        return Status::ConstraintError;
    };
    if label.len() > NODE_LABEL_SIZE {
        return Status::ConstraintError;
    }
    let Ok(label) = std::str::from_utf8(label) else {
        debug!("[Bridge] NodeLabel write on ep={} is not UTF-8", device.endpoint_id());
        return Status::ConstraintError;
    };

    device.set_name(label);
    Status::Success
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceKind;

    fn device() -> Device {
        let mut dev = Device::new("Lamp", "Office", DeviceKind::on_off());
        dev.generate_unique_id();
        dev
    }

    #[test]
    fn test_reads_need_full_field() {
        let dev = device();
        let mut small = [0u8; 16];
        assert_eq!(
            read_attribute(&dev, BridgedDeviceBasicAttribute::NodeLabel as u32, &mut small),
            Status::Failure
        );
        assert_eq!(
            read_attribute(&dev, BridgedDeviceBasicAttribute::Reachable as u32, &mut small[..1]),
            Status::Success
        );
        assert_eq!(small[0], 1);
        assert_eq!(read_attribute(&dev, 0x0001, &mut small), Status::Failure);
    }

    #[test]
    fn test_read_node_label_and_revision() {
        let dev = device();
        let mut buf = [0u8; 64];
        assert_eq!(
            read_attribute(&dev, BridgedDeviceBasicAttribute::NodeLabel as u32, &mut buf),
            Status::Success
        );
        assert_eq!(decode_char_string(&buf), Some(&b"Lamp"[..]));

        assert_eq!(read_attribute(&dev, global::CLUSTER_REVISION, &mut buf), Status::Success);
        assert_eq!(u16::from_le_bytes([buf[0], buf[1]]), 2);
    }

    #[test]
    fn test_write_rules() {
        let mut dev = device();
        assert_eq!(
            write_attribute(&mut dev, BridgedDeviceBasicAttribute::Reachable as u32, &[1]),
            Status::UnsupportedWrite
        );

        let mut buf = [0u8; 34];
        encode_char_string(&mut buf, "Desk Lamp");
        assert_eq!(
            write_attribute(&mut dev, BridgedDeviceBasicAttribute::NodeLabel as u32, &buf),
            Status::Success
        );
        assert_eq!(dev.name(), "Desk Lamp");

        // Length byte past the end of the buffer
        assert_eq!(
            write_attribute(&mut dev, BridgedDeviceBasicAttribute::NodeLabel as u32, &[9, b'a']),
            Status::ConstraintError
        );
        assert_eq!(dev.name(), "Desk Lamp");

        // Invalid UTF-8 is rejected rather than replaced
        assert_eq!(
            write_attribute(&mut dev, BridgedDeviceBasicAttribute::NodeLabel as u32, &[2, b'a', 0xFF]),
            Status::ConstraintError
        );
        assert_eq!(dev.name(), "Desk Lamp");
    }

    #[test]
    fn test_full_length_label_round_trips() {
        let label = "x".repeat(NODE_LABEL_SIZE);
        let mut dev = Device::new(&label, "Office", DeviceKind::on_off());
        dev.generate_unique_id();

        let mut exact = [0u8; NODE_LABEL_SIZE];
        assert_eq!(
            read_attribute(&dev, BridgedDeviceBasicAttribute::NodeLabel as u32, &mut exact),
            Status::Failure
        );

        let mut buf = [0u8; NODE_LABEL_SIZE + 1];
        assert_eq!(
            read_attribute(&dev, BridgedDeviceBasicAttribute::NodeLabel as u32, &mut buf),
            Status::Success
        );
        assert_eq!(decode_char_string(&buf), Some(label.as_bytes()));

        let mut buf = [0u8; UNIQUE_ID_SIZE + 1];
        assert_eq!(
            read_attribute(&dev, BridgedDeviceBasicAttribute::UniqueId as u32, &mut buf),
            Status::Success
        );
        assert_eq!(decode_char_string(&buf).map(<[u8]>::len), Some(UNIQUE_ID_SIZE));
    }
}
