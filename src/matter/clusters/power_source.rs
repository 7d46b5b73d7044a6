//! PowerSource cluster (0x002F).
//!
//! One power source device lives in the reserved slot and backs the
//! PowerSource cluster of a composed device. Reads are answered from its
//! state without any per-endpoint storage.

use crate::matter::attribute::encode_char_string;
use crate::matter::ids::{AttributeId, ClusterId, EndpointId, global};
use crate::matter::status::Status;
use strum::FromRepr;

/// Matter Cluster ID for PowerSource
pub const CLUSTER_ID: ClusterId = 0x002F;

/// Cluster revision
pub const CLUSTER_REVISION: u16 = 2;

/// Battery feature bit
pub const FEATURE_BATTERY: u32 = 0x0002;

/// Max length of Description
pub const DESCRIPTION_MAX_LEN: usize = 60;

/// Attribute IDs for the PowerSource cluster
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromRepr)]
#[repr(u32)]
pub enum PowerSourceAttribute {
    Status = 0x0000,
    Order = 0x0001,
    Description = 0x0002,
    BatChargeLevel = 0x000E,
    BatReplacementNeeded = 0x000F,
    BatReplaceability = 0x0010,
    EndpointList = 0x001F,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, FromRepr)]
#[repr(u8)]
pub enum PowerSourceStatus {
    #[default]
    Unspecified = 0,
    Active = 1,
    Standby = 2,
    Unavailable = 3,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, FromRepr)]
#[repr(u8)]
pub enum BatChargeLevel {
    #[default]
    Ok = 0,
    Warning = 1,
    Critical = 2,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, FromRepr)]
#[repr(u8)]
pub enum BatReplaceability {
    Unspecified = 0,
    NotReplaceable = 1,
    UserReplaceable = 2,
    FactoryReplaceable = 3,
}

/// State held by a power source device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerSourceState {
    pub status: PowerSourceStatus,
    pub order: u8,
    pub description: String,
    pub bat_charge_level: BatChargeLevel,
    /// Endpoints powered by this source
    pub endpoint_list: Vec<EndpointId>,
    pub feature_map: u32,
}

impl Default for PowerSourceState {
    fn default() -> Self {
        Self {
            status: PowerSourceStatus::Active,
            order: 0,
            description: "Primary Battery".to_string(),
            bat_charge_level: BatChargeLevel::Ok,
            endpoint_list: Vec::new(),
            feature_map: FEATURE_BATTERY,
        }
    }
}

impl PowerSourceState {
    /// Replaces the description. `None` when it exceeds
    /// [`DESCRIPTION_MAX_LEN`], otherwise whether it changed.
    pub fn set_description(&mut self, description: &str) -> Option<bool> {
        if description.len() > DESCRIPTION_MAX_LEN {
            return None;
        }
        if self.description == description {
            return Some(false);
        }
        self.description = description.to_string();
        Some(true)
    }
}

/// A decoded PowerSource attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PowerSourceValue {
    U8(u8),
    U16(u16),
    U32(u32),
    Bool(bool),
    Text(String),
    EndpointList(Vec<EndpointId>),
}

impl PowerSourceValue {
    /// Encodes the value little-endian into `buffer`, returning the bytes
    /// written or `None` if it does not fit. Text is a ZCL character string;
    /// an endpoint list is a u16 count followed by the ids.
    pub fn encode(&self, buffer: &mut [u8]) -> Option<usize> {
        match self {
            PowerSourceValue::U8(v) => put(buffer, &[*v]),
            PowerSourceValue::U16(v) => put(buffer, &v.to_le_bytes()),
            PowerSourceValue::U32(v) => put(buffer, &v.to_le_bytes()),
            PowerSourceValue::Bool(v) => put(buffer, &[u8::from(*v)]),
            PowerSourceValue::Text(text) => {
                if buffer.len() <= text.len() {
                    return None;
                }
                Some(encode_char_string(buffer, text))
            }
            PowerSourceValue::EndpointList(endpoints) => {
                let count = u16::try_from(endpoints.len()).ok()?;
                let mut bytes = count.to_le_bytes().to_vec();
                for endpoint in endpoints {
                    bytes.extend_from_slice(&endpoint.to_le_bytes());
                }
                put(buffer, &bytes)
            }
        }
    }
}

fn put(buffer: &mut [u8], bytes: &[u8]) -> Option<usize> {
    buffer.get_mut(..bytes.len())?.copy_from_slice(bytes);
    Some(bytes.len())
}

/// Reads one attribute from `state`.
pub fn read_attribute(
    state: &PowerSourceState,
    attribute_id: AttributeId,
) -> Result<PowerSourceValue, Status> {
    match attribute_id {
        global::CLUSTER_REVISION => return Ok(PowerSourceValue::U16(CLUSTER_REVISION)),
        global::FEATURE_MAP => return Ok(PowerSourceValue::U32(state.feature_map)),
        _ => {}
    }

    let attr = PowerSourceAttribute::from_repr(attribute_id).ok_or(Status::UnsupportedAttribute)?;
    let value = match attr {
        PowerSourceAttribute::Status => PowerSourceValue::U8(state.status as u8),
        PowerSourceAttribute::Order => PowerSourceValue::U8(state.order),
        PowerSourceAttribute::Description => PowerSourceValue::Text(state.description.clone()),
        PowerSourceAttribute::BatChargeLevel => PowerSourceValue::U8(state.bat_charge_level as u8),
        PowerSourceAttribute::BatReplacementNeeded => PowerSourceValue::Bool(false),
        PowerSourceAttribute::BatReplaceability => {
            PowerSourceValue::U8(BatReplaceability::NotReplaceable as u8)
        }
        PowerSourceAttribute::EndpointList => {
            PowerSourceValue::EndpointList(state.endpoint_list.clone())
        }
    };
    Ok(value)
}
