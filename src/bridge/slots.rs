//! Fixed-capacity endpoint slot table.

use crate::device::{Device, DeviceId, DeviceKindTag};
use crate::matter::endpoint_descriptor::EndpointDescriptor;
use crate::matter::ids::EndpointId;

/// Who allocated the device held in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Created by the registry from an add request; dropped on removal.
    Registry,
    /// Handed in fully built; given back to the caller on removal.
    External,
}

/// One occupied slot.
#[derive(Debug)]
pub struct Slot {
    pub device: Device,
    pub kind: DeviceKindTag,
    pub ownership: Ownership,
    pub descriptor: EndpointDescriptor,
}

/// `N` addressable slots plus one reserved slot (index `N`) for the shared
/// power source device.
#[derive(Debug)]
pub struct SlotTable<const N: usize> {
    slots: [Option<Slot>; N],
    reserved: Option<Device>,
}

impl<const N: usize> SlotTable<N> {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            reserved: None,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Index of the reserved slot.
    pub const fn reserved_index(&self) -> usize {
        N
    }

    pub fn first_free(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)?.as_ref()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Slot> {
        self.slots.get_mut(index)?.as_mut()
    }

    /// Fills an empty slot. Hands the slot back if `index` is taken or out
    /// of range.
    pub fn occupy(&mut self, index: usize, slot: Slot) -> Result<(), Slot> {
        match self.slots.get_mut(index) {
            Some(entry @ None) => {
                *entry = Some(slot);
                Ok(())
            }
            _ => Err(slot),
        }
    }

    pub fn take(&mut self, index: usize) -> Option<Slot> {
        self.slots.get_mut(index)?.take()
    }

    pub fn index_of_endpoint(&self, endpoint: EndpointId) -> Option<usize> {
        self.iter().find(|(_, s)| s.device.endpoint_id() == endpoint).map(|(i, _)| i)
    }

    pub fn index_of_device(&self, id: DeviceId) -> Option<usize> {
        self.iter().find(|(_, s)| s.device.id() == id).map(|(i, _)| i)
    }

    /// Occupied slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Slot)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (i, s)))
    }

    pub fn occupied(&self) -> usize {
        self.iter().count()
    }

    pub fn reserved(&self) -> Option<&Device> {
        self.reserved.as_ref()
    }

    pub fn reserved_mut(&mut self) -> Option<&mut Device> {
        self.reserved.as_mut()
    }

    /// Puts `device` in the reserved slot, returning the previous occupant.
    pub fn set_reserved(&mut self, device: Device) -> Option<Device> {
        self.reserved.replace(device)
    }

    pub fn take_reserved(&mut self) -> Option<Device> {
        self.reserved.take()
    }
}

impl<const N: usize> Default for SlotTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DEFAULT_LOCATION, DeviceKind};
    use crate::matter::endpoint_descriptor::DescriptorBuilder;

    fn slot(name: &str, endpoint: EndpointId) -> Slot {
        let mut device = Device::new(name, DEFAULT_LOCATION, DeviceKind::generic());
        device.set_endpoint_id(endpoint);
        Slot {
            kind: device.kind().tag(),
            device,
            ownership: Ownership::Registry,
            descriptor: DescriptorBuilder::default().build(name, &[], &[], &[]),
        }
    }

    #[test]
    fn test_occupy_and_take() {
        let mut table = SlotTable::<2>::new();
        assert_eq!(table.first_free(), Some(0));
        assert!(table.occupy(0, slot("a", 2)).is_ok());
        assert!(table.occupy(0, slot("b", 3)).is_err());
        assert!(table.occupy(5, slot("b", 3)).is_err());
        assert!(table.occupy(1, slot("b", 3)).is_ok());
        assert_eq!(table.first_free(), None);
        assert_eq!(table.index_of_endpoint(3), Some(1));

        let taken = table.take(0).map(|s| s.device.name().to_string());
        assert_eq!(taken.as_deref(), Some("a"));
        assert_eq!(table.first_free(), Some(0));
        assert_eq!(table.occupied(), 1);
    }

    #[test]
    fn test_reserved_slot_is_outside_range() {
        let mut table = SlotTable::<1>::new();
        assert_eq!(table.reserved_index(), 1);
        let device = Device::new("Battery", DEFAULT_LOCATION, DeviceKind::generic());
        assert!(table.set_reserved(device).is_none());
        assert!(table.reserved().is_some());
        assert_eq!(table.first_free(), Some(0));
        assert!(table.get(1).is_none());
    }
}
