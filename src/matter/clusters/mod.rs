//! Cluster schema and built-in handlers used by the bridge.
//!
//! Only infrastructure clusters (basic information, power source) are
//! answered locally. The rest describe ids and default attribute tables so
//! callers can register devices without spelling out every tuple.

pub mod bridged_device_basic_info;
pub mod descriptor;
pub mod on_off;
pub mod power_source;
pub mod relative_humidity;
pub mod temperature_measurement;

use super::attribute::{AttributeMetadata, AttributeType, mask};
use super::ids::{ClusterId, global};

/// Default attribute metadata for a cluster.
///
/// Known clusters get their standard attributes; every cluster gets
/// ClusterRevision appended.
pub fn default_attributes(cluster_id: ClusterId) -> Vec<AttributeMetadata> {
    let mut attrs = match cluster_id {
        on_off::CLUSTER_ID => on_off::default_attributes(),
        temperature_measurement::CLUSTER_ID => temperature_measurement::default_attributes(),
        relative_humidity::CLUSTER_ID => relative_humidity::default_attributes(),
        _ => Vec::new(),
    };
    attrs.push(AttributeMetadata::new(
        global::CLUSTER_REVISION,
        AttributeType::Int16u,
        2,
        mask::EXTERNAL_STORAGE,
    ));
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_attributes() {
        let attrs = default_attributes(on_off::CLUSTER_ID);
        assert_eq!(attrs.len(), 2);
        assert!(attrs[0].is_writable());
        assert_eq!(attrs[1].attribute_id, global::CLUSTER_REVISION);

        assert_eq!(default_attributes(temperature_measurement::CLUSTER_ID).len(), 4);
        assert_eq!(default_attributes(0x1234).len(), 1);
    }
}
