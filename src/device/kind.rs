//! Device kinds and their capability table.
//!
//! Each kind knows which (cluster, attribute) pairs it stores locally, how to
//! read and update them, and whether changes are reported through the
//! deferred or the immediate notification path.

use crate::matter::clusters::power_source::{
    BatChargeLevel, PowerSourceAttribute, PowerSourceState, PowerSourceStatus,
};
use crate::matter::clusters::{on_off, power_source, temperature_measurement};
use crate::matter::clusters::temperature_measurement::TemperatureMeasurementAttribute;
use crate::matter::ids::{AttributeId, ClusterId, global};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::Display;

/// Kind tag stored next to each occupied slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKindTag {
    OnOff,
    TempSensor,
    #[default]
    Generic,
    PowerSource,
}

/// Temperature readings in centidegrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemperatureState {
    pub measured: i16,
    pub min: i16,
    pub max: i16,
}

impl Default for TemperatureState {
    fn default() -> Self {
        Self {
            measured: 0,
            min: temperature_measurement::DEFAULT_MIN_MEASURED,
            max: temperature_measurement::DEFAULT_MAX_MEASURED,
        }
    }
}

/// Per-kind device state.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceKind {
    OnOff { on: bool },
    TempSensor(TemperatureState),
    /// Opaque 64-bit values keyed by (cluster, attribute)
    Generic(HashMap<(ClusterId, AttributeId), u64>),
    PowerSource(PowerSourceState),
}

impl DeviceKind {
    pub fn on_off() -> Self {
        DeviceKind::OnOff { on: false }
    }

    pub fn generic() -> Self {
        DeviceKind::Generic(HashMap::new())
    }

    /// Default state for a tag.
    pub fn from_tag(tag: DeviceKindTag) -> Self {
        match tag {
            DeviceKindTag::OnOff => Self::on_off(),
            DeviceKindTag::TempSensor => DeviceKind::TempSensor(TemperatureState::default()),
            DeviceKindTag::Generic => Self::generic(),
            DeviceKindTag::PowerSource => DeviceKind::PowerSource(PowerSourceState::default()),
        }
    }

    pub fn tag(&self) -> DeviceKindTag {
        match self {
            DeviceKind::OnOff { .. } => DeviceKindTag::OnOff,
            DeviceKind::TempSensor(_) => DeviceKindTag::TempSensor,
            DeviceKind::Generic(_) => DeviceKindTag::Generic,
            DeviceKind::PowerSource(_) => DeviceKindTag::PowerSource,
        }
    }

    /// Power source changes are reported synchronously; every other kind
    /// goes through the model queue.
    pub fn reports_immediately(&self) -> bool {
        matches!(self, DeviceKind::PowerSource(_))
    }

    /// Locally stored value of an attribute, `None` if this kind does not
    /// hold it. Signed values are returned as their two's complement bits.
    pub fn get_attribute(&self, cluster: ClusterId, attribute: AttributeId) -> Option<u64> {
        match self {
            DeviceKind::OnOff { on } => {
                (cluster == on_off::CLUSTER_ID && attribute == on_off::PRIMARY_ATTRIBUTE)
                    .then_some(u64::from(*on))
            }
            DeviceKind::TempSensor(state) => {
                if cluster != temperature_measurement::CLUSTER_ID {
                    return None;
                }
                let value = match TemperatureMeasurementAttribute::from_repr(attribute)? {
                    TemperatureMeasurementAttribute::MeasuredValue => state.measured,
                    TemperatureMeasurementAttribute::MinMeasuredValue => state.min,
                    TemperatureMeasurementAttribute::MaxMeasuredValue => state.max,
                };
                Some(u64::from(value as u16))
            }
            DeviceKind::Generic(values) => values.get(&(cluster, attribute)).copied(),
            DeviceKind::PowerSource(state) => {
                if cluster != power_source::CLUSTER_ID {
                    return None;
                }
                if attribute == global::FEATURE_MAP {
                    return Some(u64::from(state.feature_map));
                }
                match PowerSourceAttribute::from_repr(attribute)? {
                    PowerSourceAttribute::Status => Some(state.status as u64),
                    PowerSourceAttribute::Order => Some(u64::from(state.order)),
                    PowerSourceAttribute::BatChargeLevel => Some(state.bat_charge_level as u64),
                    _ => None,
                }
            }
        }
    }

    /// Stores a value. Returns `None` when the kind does not hold the
    /// attribute (or the value is out of range), otherwise whether the
    /// stored value changed.
    pub fn set_attribute(
        &mut self,
        cluster: ClusterId,
        attribute: AttributeId,
        value: u64,
    ) -> Option<bool> {
        match self {
            DeviceKind::OnOff { on } => {
                if cluster != on_off::CLUSTER_ID || attribute != on_off::PRIMARY_ATTRIBUTE {
                    return None;
                }
                Some(replace(on, value != 0))
            }
            DeviceKind::TempSensor(state) => {
                if cluster != temperature_measurement::CLUSTER_ID {
                    return None;
                }
                let slot = match TemperatureMeasurementAttribute::from_repr(attribute)? {
                    TemperatureMeasurementAttribute::MeasuredValue => &mut state.measured,
                    TemperatureMeasurementAttribute::MinMeasuredValue => &mut state.min,
                    TemperatureMeasurementAttribute::MaxMeasuredValue => &mut state.max,
                };
                Some(replace(slot, value as u16 as i16))
            }
            DeviceKind::Generic(values) => {
                Some(values.insert((cluster, attribute), value) != Some(value))
            }
            DeviceKind::PowerSource(state) => {
                if cluster != power_source::CLUSTER_ID {
                    return None;
                }
                if attribute == global::FEATURE_MAP {
                    return Some(replace(&mut state.feature_map, u32::try_from(value).ok()?));
                }
                match PowerSourceAttribute::from_repr(attribute)? {
                    PowerSourceAttribute::Status => Some(replace(
                        &mut state.status,
                        PowerSourceStatus::from_repr(u8::try_from(value).ok()?)?,
                    )),
                    PowerSourceAttribute::Order => {
                        Some(replace(&mut state.order, u8::try_from(value).ok()?))
                    }
                    PowerSourceAttribute::BatChargeLevel => Some(replace(
                        &mut state.bat_charge_level,
                        BatChargeLevel::from_repr(u8::try_from(value).ok()?)?,
                    )),
                    _ => None,
                }
            }
        }
    }
}

/// Writes `value` into `slot`, returning whether it differed.
fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}
