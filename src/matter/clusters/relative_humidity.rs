//! RelativeHumidityMeasurement cluster (0x0405).
//!
//! Humidity is reported in centi-percent (value * 100).
//!
//! For example: 55.5% is reported as 5550.

use crate::matter::attribute::{AttributeMetadata, AttributeType, mask};
use crate::matter::ids::ClusterId;
use strum::FromRepr;

/// Matter Cluster ID for RelativeHumidityMeasurement
pub const CLUSTER_ID: ClusterId = 0x0405;

/// Cluster revision
pub const CLUSTER_REVISION: u16 = 3;

/// Attribute IDs for the RelativeHumidityMeasurement cluster
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromRepr)]
#[repr(u32)]
pub enum RelativeHumidityAttribute {
    /// Measured humidity in centi-percent
    MeasuredValue = 0x0000,
    /// Minimum measurable humidity
    MinMeasuredValue = 0x0001,
    /// Maximum measurable humidity
    MaxMeasuredValue = 0x0002,
}

pub fn default_attributes() -> Vec<AttributeMetadata> {
    [
        RelativeHumidityAttribute::MeasuredValue,
        RelativeHumidityAttribute::MinMeasuredValue,
        RelativeHumidityAttribute::MaxMeasuredValue,
    ]
    .into_iter()
    .map(|attr| {
        AttributeMetadata::new(
            attr as u32,
            AttributeType::Int16u,
            2,
            mask::EXTERNAL_STORAGE,
        )
    })
    .collect()
}
