//! Bridged devices.
//!
//! A [`Device`] is the bridge-side record of one external entity: its
//! endpoint placement, the infrastructure attributes the bridge answers
//! itself, and a [`DeviceKind`] with any locally stored cluster state.

pub mod kind;
pub mod presets;

pub use kind::{DeviceKind, DeviceKindTag, TemperatureState};

use crate::matter::clusters::bridged_device_basic_info::{
    self as basic_info, BridgedDeviceBasicAttribute, NODE_LABEL_SIZE,
};
use crate::matter::ids::{AttributeId, ClusterId, EndpointId, INVALID_ENDPOINT_ID};
use std::ops::BitOr;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Location assigned when the caller does not name one.
pub const DEFAULT_LOCATION: &str = "Generic";

static NEXT_DEVICE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique device identity, used to remove by device rather than by
/// slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(u64);

impl DeviceId {
    fn next() -> Self {
        Self(NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Bit set of device fields changed by a setter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeMask(u16);

impl ChangeMask {
    pub const NONE: Self = Self(0);
    pub const REACHABLE: Self = Self(0x01);
    pub const NAME: Self = Self(0x02);
    pub const LOCATION: Self = Self(0x04);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ChangeMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug)]
pub struct Device {
    id: DeviceId,
    endpoint_id: EndpointId,
    parent_endpoint_id: EndpointId,
    name: String,
    location: String,
    zone: String,
    unique_id: String,
    reachable: bool,
    configuration_version: u32,
    kind: DeviceKind,
}

impl Device {
    pub fn new(name: &str, location: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            id: DeviceId::next(),
            endpoint_id: INVALID_ENDPOINT_ID,
            parent_endpoint_id: INVALID_ENDPOINT_ID,
            name: truncate_label(name),
            location: location.into(),
            zone: String::new(),
            unique_id: String::new(),
            reachable: true,
            configuration_version: 1,
            kind,
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn endpoint_id(&self) -> EndpointId {
        self.endpoint_id
    }

    pub(crate) fn set_endpoint_id(&mut self, endpoint: EndpointId) {
        self.endpoint_id = endpoint;
    }

    pub fn parent_endpoint_id(&self) -> EndpointId {
        self.parent_endpoint_id
    }

    pub(crate) fn set_parent_endpoint_id(&mut self, parent: EndpointId) {
        self.parent_endpoint_id = parent;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the display name, truncated to the NodeLabel limit.
    pub fn set_name(&mut self, name: &str) -> ChangeMask {
        let name = truncate_label(name);
        if self.name == name {
            return ChangeMask::NONE;
        }
        self.name = name;
        ChangeMask::NAME
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn set_location(&mut self, location: &str) -> ChangeMask {
        if self.location == location {
            return ChangeMask::NONE;
        }
        self.location = location.to_string();
        ChangeMask::LOCATION
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    pub fn set_zone(&mut self, zone: &str) {
        self.zone = zone.to_string();
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Assigns a random unique id once. Later calls keep the existing id.
    pub fn generate_unique_id(&mut self) {
        if self.unique_id.is_empty() {
            self.unique_id = Uuid::new_v4().simple().to_string();
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable
    }

    pub fn set_reachable(&mut self, reachable: bool) -> ChangeMask {
        if self.reachable == reachable {
            return ChangeMask::NONE;
        }
        self.reachable = reachable;
        ChangeMask::REACHABLE
    }

    pub fn configuration_version(&self) -> u32 {
        self.configuration_version
    }

    pub fn set_configuration_version(&mut self, version: u32) {
        self.configuration_version = version;
    }

    pub fn kind(&self) -> &DeviceKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut DeviceKind {
        &mut self.kind
    }

    /// Attributes to report for a change mask.
    ///
    /// Location has no attribute of its own on a bridged node.
    pub fn reported_paths(&self, mask: ChangeMask) -> Vec<(ClusterId, AttributeId)> {
        let mut paths = Vec::new();
        if mask.contains(ChangeMask::REACHABLE) {
            paths.push((
                basic_info::CLUSTER_ID,
                BridgedDeviceBasicAttribute::Reachable as AttributeId,
            ));
        }
        if mask.contains(ChangeMask::NAME) {
            paths.push((
                basic_info::CLUSTER_ID,
                BridgedDeviceBasicAttribute::NodeLabel as AttributeId,
            ));
        }
        paths
    }
}

fn truncate_label(name: &str) -> String {
    if name.len() <= NODE_LABEL_SIZE {
        return name.to_string();
    }
    let mut end = NODE_LABEL_SIZE;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}
