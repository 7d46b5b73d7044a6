//! TemperatureMeasurement cluster (0x0402).
//!
//! Temperature is reported in centidegrees Celsius (value * 100).
//!
//! For example: 21.5°C is reported as 2150.

use crate::matter::attribute::{AttributeMetadata, AttributeType, mask};
use crate::matter::ids::ClusterId;
use strum::FromRepr;

/// Matter Cluster ID for TemperatureMeasurement
pub const CLUSTER_ID: ClusterId = 0x0402;

/// Cluster revision
pub const CLUSTER_REVISION: u16 = 4;

/// Default lower bound of a bridged sensor (-40.00°C)
pub const DEFAULT_MIN_MEASURED: i16 = -4000;

/// Default upper bound of a bridged sensor (125.00°C)
pub const DEFAULT_MAX_MEASURED: i16 = 12500;

/// Attribute IDs for the TemperatureMeasurement cluster
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromRepr)]
#[repr(u32)]
pub enum TemperatureMeasurementAttribute {
    /// Measured temperature in centidegrees Celsius
    MeasuredValue = 0x0000,
    /// Minimum measurable temperature
    MinMeasuredValue = 0x0001,
    /// Maximum measurable temperature
    MaxMeasuredValue = 0x0002,
}

pub fn default_attributes() -> Vec<AttributeMetadata> {
    [
        TemperatureMeasurementAttribute::MeasuredValue,
        TemperatureMeasurementAttribute::MinMeasuredValue,
        TemperatureMeasurementAttribute::MaxMeasuredValue,
    ]
    .into_iter()
    .map(|attr| {
        AttributeMetadata::new(
            attr as u32,
            AttributeType::Int16s,
            2,
            mask::EXTERNAL_STORAGE,
        )
    })
    .collect()
}
