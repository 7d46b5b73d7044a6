//! Rooms, zones and actions.
//!
//! These are plain data holders. The only logic is composing per-room
//! endpoint lists from the devices under one parent endpoint.

use super::registry::BridgeRegistry;
use crate::matter::ids::EndpointId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndpointListType {
    #[default]
    Other,
    Room,
    Zone,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub endpoint_list_id: u16,
    pub name: String,
    #[serde(default)]
    pub kind: EndpointListType,
    #[serde(default = "visible")]
    pub visible: bool,
}

fn visible() -> bool {
    true
}

impl Room {
    pub fn new(endpoint_list_id: u16, name: impl Into<String>, kind: EndpointListType) -> Self {
        Self {
            endpoint_list_id,
            name: name.into(),
            kind,
            visible: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    #[default]
    Other,
    Scene,
    Sequence,
    Automation,
    Exception,
    Notification,
    Alarm,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionState {
    #[default]
    Inactive,
    Active,
    Paused,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub action_id: u16,
    pub name: String,
    #[serde(default)]
    pub action_type: ActionType,
    pub endpoint_list_id: u16,
    #[serde(default)]
    pub supported_commands: u16,
    #[serde(default)]
    pub state: ActionState,
    #[serde(default = "visible")]
    pub visible: bool,
}

/// One composed endpoint list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointListInfo {
    pub endpoint_list_id: u16,
    pub name: String,
    pub kind: EndpointListType,
    pub endpoints: Vec<EndpointId>,
}

/// Endpoint lists for the children of `parent`.
///
/// A device belongs to a room when its location matches the room name, or
/// its zone for zone-type lists. Invisible rooms and empty lists are left out.
pub fn endpoint_list_info<const N: usize>(
    registry: &BridgeRegistry<N>,
    parent: EndpointId,
    rooms: &[Room],
) -> Vec<EndpointListInfo> {
    let children = registry.devices_with_parent(parent);
    rooms
        .iter()
        .filter(|room| room.visible)
        .filter_map(|room| {
            let endpoints: Vec<EndpointId> = children
                .iter()
                .filter(|dev| {
                    let place = match room.kind {
                        EndpointListType::Zone => dev.zone(),
                        _ => dev.location(),
                    };
                    place == room.name
                })
                .map(|dev| dev.endpoint_id())
                .collect();
            (!endpoints.is_empty()).then(|| EndpointListInfo {
                endpoint_list_id: room.endpoint_list_id,
                name: room.name.clone(),
                kind: room.kind,
                endpoints,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::slots::Ownership;
    use crate::device::{Device, DeviceKind};
    use crate::matter::endpoint_descriptor::DescriptorBuilder;
    use crate::matter::model::InMemoryModel;

    #[test]
    fn test_rooms_and_zones() {
        let mut model = InMemoryModel::default();
        let mut reg = BridgeRegistry::<4>::new();
        reg.post_server_init(&model);

        for (name, location, zone) in [
            ("Lamp", "Office", "Upstairs"),
            ("Fan", "Office", "Downstairs"),
            ("Heater", "Kitchen", "Downstairs"),
        ] {
            let mut dev = Device::new(name, location, DeviceKind::on_off());
            dev.set_zone(zone);
            let desc = DescriptorBuilder::default().build(name, &[6], &[], &[]);
            reg.add(&mut model, dev, desc, None, 1, Ownership::Registry).unwrap();
        }

        let mut hidden = Room::new(3, "Kitchen", EndpointListType::Room);
        hidden.visible = false;
        let rooms = vec![
            Room::new(1, "Office", EndpointListType::Room),
            Room::new(2, "Downstairs", EndpointListType::Zone),
            hidden,
            Room::new(4, "Garage", EndpointListType::Room),
        ];

        let lists = endpoint_list_info(&reg, 1, &rooms);
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0].endpoints, vec![2, 3]);
        assert_eq!(lists[1].endpoints, vec![3, 4]);
        assert!(endpoint_list_info(&reg, 7, &rooms).is_empty());
    }
}
