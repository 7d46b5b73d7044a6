//! Device type definitions for the dynamic bridge.
//!
//! A device type tag tells controllers what an endpoint is. Bridged endpoints
//! carry their functional type plus the Bridged Node type.

use super::ids::DeviceTypeId;

/// Device type revision used for every dynamically registered endpoint.
pub const DEVICE_VERSION_DEFAULT: u8 = 1;

/// A device type entry as listed on an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceType {
    pub dtype: DeviceTypeId,
    pub drev: u8,
}

impl DeviceType {
    /// Device type with the default revision.
    pub const fn new(dtype: DeviceTypeId) -> Self {
        Self {
            dtype,
            drev: DEVICE_VERSION_DEFAULT,
        }
    }
}

/// Matter Power Source device type
///
/// Device Type ID: 0x0011 (17 decimal)
///
/// Required clusters:
/// - PowerSource (0x002F)
/// - Descriptor (standard)
pub const DEV_TYPE_POWER_SOURCE: DeviceType = DeviceType::new(0x0011);

/// Matter Bridged Node device type
///
/// Device Type ID: 0x0013 (19 decimal)
///
/// Required clusters:
/// - BridgedDeviceBasicInformation (0x0039)
/// - Descriptor (standard)
///
/// The only device type that changes which clusters the registry injects.
pub const DEV_TYPE_BRIDGED_NODE: DeviceType = DeviceType::new(0x0013);

/// Matter On/Off Light device type
///
/// Device Type ID: 0x0100 (256 decimal)
pub const DEV_TYPE_ON_OFF_LIGHT: DeviceType = DeviceType::new(0x0100);

/// Matter Temperature Sensor device type
///
/// Device Type ID: 0x0302 (770 decimal)
pub const DEV_TYPE_TEMPERATURE_SENSOR: DeviceType = DeviceType::new(0x0302);

/// Matter Humidity Sensor device type
///
/// Device Type ID: 0x0307 (775 decimal)
pub const DEV_TYPE_HUMIDITY_SENSOR: DeviceType = DeviceType::new(0x0307);

/// Returns true if the list marks the endpoint as a bridged node.
pub fn is_bridged_node(device_types: &[DeviceType]) -> bool {
    device_types
        .iter()
        .any(|dt| dt.dtype == DEV_TYPE_BRIDGED_NODE.dtype)
}
