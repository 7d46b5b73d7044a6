//! Dynamic endpoint registry.
//!
//! Binds devices to slots and endpoint ids, keeping the slot table and the
//! device model in step. Only the model thread mutates a registry.

use super::allocator::EndpointIdAllocator;
use super::slots::{Ownership, Slot, SlotTable};
use crate::device::{Device, DeviceId};
use crate::error::{BridgeError, Result};
use crate::matter::endpoint_descriptor::EndpointDescriptor;
use crate::matter::ids::{EndpointId, INVALID_ENDPOINT_ID};
use crate::matter::model::{DeviceModel, RegisterError};
use log::{debug, error, info, warn};

/// Default number of addressable dynamic endpoints.
pub const DYNAMIC_ENDPOINT_COUNT: usize = 16;

/// Result of a successful removal.
#[derive(Debug)]
pub struct Removed {
    pub index: usize,
    pub endpoint_id: EndpointId,
    /// Externally owned devices are handed back; registry-owned ones are
    /// dropped together with their descriptor.
    pub external: Option<Device>,
}

#[derive(Debug)]
pub struct BridgeRegistry<const N: usize = DYNAMIC_ENDPOINT_COUNT> {
    slots: SlotTable<N>,
    allocator: EndpointIdAllocator,
}

impl<const N: usize> BridgeRegistry<N> {
    pub fn new() -> Self {
        Self {
            slots: SlotTable::new(),
            allocator: EndpointIdAllocator::new(),
        }
    }

    /// Sets up endpoint allocation once the model has its fixed endpoints.
    pub fn post_server_init(&mut self, model: &dyn DeviceModel) {
        self.allocator.initialize(model.last_fixed_endpoint());
        if let Ok(first) = self.allocator.first_dynamic() {
            info!("[Bridge] First dynamic endpoint id: {}", first);
        }
    }

    pub fn slots(&self) -> &SlotTable<N> {
        &self.slots
    }

    pub fn allocator(&self) -> &EndpointIdAllocator {
        &self.allocator
    }

    /// Places `device` in the first free slot and registers it with the model.
    ///
    /// With `requested` set, that exact id is used and a collision fails
    /// immediately. Otherwise ids come from the allocator, skipping ids the
    /// model reports as taken. Nothing in the table changes on failure.
    pub fn add(
        &mut self,
        model: &mut dyn DeviceModel,
        mut device: Device,
        descriptor: EndpointDescriptor,
        requested: Option<EndpointId>,
        parent_endpoint_id: EndpointId,
        ownership: Ownership,
    ) -> Result<usize> {
        let requested = requested.filter(|&ep| ep != INVALID_ENDPOINT_ID);

        let Some(index) = self.slots.first_free() else {
            warn!(
                "[Bridge] Failed to add device '{}': no free slot (capacity {})",
                device.name(),
                N
            );
            return Err(BridgeError::CapacityExhausted(N));
        };

        let endpoint_id = match requested {
            Some(endpoint_id) => {
                self.register(model, index, endpoint_id, &descriptor, parent_endpoint_id)
                    .map_err(|e| match e {
                        RegisterError::EndpointExists => {
                            warn!("[Bridge] Requested endpoint {} is already in use", endpoint_id);
                            BridgeError::IdentifierCollision(endpoint_id)
                        }
                        other => rejected(endpoint_id, other),
                    })?;
                endpoint_id
            }
            None => self.register_auto(model, index, &descriptor, parent_endpoint_id)?,
        };

        device.set_endpoint_id(endpoint_id);
        device.set_parent_endpoint_id(parent_endpoint_id);
        device.generate_unique_id();
        if requested.is_none() {
            self.allocator.advance()?;
        }

        info!(
            "[Bridge] Added device '{}' to dynamic endpoint {} (index={})",
            device.name(),
            endpoint_id,
            index
        );

        let slot = Slot {
            kind: device.kind().tag(),
            device,
            ownership,
            descriptor,
        };
        if self.slots.occupy(index, slot).is_err() {
            // first_free() just returned this index
            model.clear_endpoint(index);
            error!("[Bridge] Slot {} was taken during registration", index);
            return Err(BridgeError::CapacityExhausted(N));
        }
        Ok(index)
    }

    fn register_auto(
        &mut self,
        model: &mut dyn DeviceModel,
        index: usize,
        descriptor: &EndpointDescriptor,
        parent_endpoint_id: EndpointId,
    ) -> Result<EndpointId> {
        let span = self.allocator.span()?;
        let mut attempts = 0;
        loop {
            let candidate = self.allocator.current()?;
            match self.register(model, index, candidate, descriptor, parent_endpoint_id) {
                Ok(()) => return Ok(candidate),
                Err(RegisterError::EndpointExists) => {
                    attempts += 1;
                    if attempts >= span {
                        error!("[Bridge] No free dynamic endpoint id left");
                        return Err(BridgeError::IdentifierSpaceExhausted);
                    }
                    let next = self.allocator.advance()?;
                    debug!("[Bridge] Endpoint {} in use, retrying with {}", candidate, next);
                }
                Err(other) => return Err(rejected(candidate, other)),
            }
        }
    }

    /// Registers with the model, treating ids already present in the table
    /// as taken even if the model has not caught up.
    fn register(
        &self,
        model: &mut dyn DeviceModel,
        index: usize,
        endpoint_id: EndpointId,
        descriptor: &EndpointDescriptor,
        parent_endpoint_id: EndpointId,
    ) -> std::result::Result<(), RegisterError> {
        if self.slots.index_of_endpoint(endpoint_id).is_some() {
            return Err(RegisterError::EndpointExists);
        }
        model.register_endpoint(index, endpoint_id, descriptor, parent_endpoint_id)
    }

    /// Removes a device by identity. `None` if it is not in the table.
    pub fn remove(&mut self, model: &mut dyn DeviceModel, device: DeviceId) -> Option<Removed> {
        let Some(index) = self.slots.index_of_device(device) else {
            warn!("[Bridge] Remove: device {:?} not found", device);
            return None;
        };
        let slot = self.slots.take(index)?;
        let endpoint_id = slot.device.endpoint_id();

        match model.clear_endpoint(index) {
            Some(cleared) if cleared != endpoint_id => warn!(
                "[Bridge] Model cleared endpoint {} at index {}, expected {}",
                cleared, index, endpoint_id
            ),
            None => warn!("[Bridge] Model had no endpoint at index {}", index),
            _ => {}
        }

        info!(
            "[Bridge] Removed device '{}' from dynamic endpoint {} (index={})",
            slot.device.name(),
            endpoint_id,
            index
        );

        let external = match slot.ownership {
            Ownership::External => Some(slot.device),
            Ownership::Registry => None,
        };
        Some(Removed {
            index,
            endpoint_id,
            external,
        })
    }

    pub fn slot_for(&self, endpoint: EndpointId) -> Option<&Slot> {
        let index = self.slots.index_of_endpoint(endpoint)?;
        self.slots.get(index)
    }

    pub fn slot_for_mut(&mut self, endpoint: EndpointId) -> Option<&mut Slot> {
        let index = self.slots.index_of_endpoint(endpoint)?;
        self.slots.get_mut(index)
    }

    pub fn device_at(&self, endpoint: EndpointId) -> Option<&Device> {
        self.slot_for(endpoint).map(|s| &s.device)
    }

    pub fn device_at_mut(&mut self, endpoint: EndpointId) -> Option<&mut Device> {
        self.slot_for_mut(endpoint).map(|s| &mut s.device)
    }

    /// Devices whose parent is `parent`, in slot order.
    pub fn devices_with_parent(&self, parent: EndpointId) -> Vec<&Device> {
        self.slots
            .iter()
            .map(|(_, s)| &s.device)
            .filter(|d| d.parent_endpoint_id() == parent)
            .collect()
    }

    /// All occupied endpoint ids, in slot order.
    pub fn endpoint_ids(&self) -> Vec<EndpointId> {
        self.slots.iter().map(|(_, s)| s.device.endpoint_id()).collect()
    }

    /// Places the shared power source device in the reserved slot at
    /// `endpoint`. It is not registered with the model.
    pub fn install_reserved(&mut self, mut device: Device, endpoint: EndpointId) -> Option<Device> {
        device.set_endpoint_id(endpoint);
        device.generate_unique_id();
        info!(
            "[Bridge] Reserved slot {} now holds '{}' at endpoint {}",
            self.slots.reserved_index(),
            device.name(),
            endpoint
        );
        self.slots.set_reserved(device)
    }

    pub fn reserved(&self) -> Option<&Device> {
        self.slots.reserved()
    }

    pub fn reserved_mut(&mut self) -> Option<&mut Device> {
        self.slots.reserved_mut()
    }
}

impl<const N: usize> Default for BridgeRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

fn rejected(endpoint: EndpointId, err: RegisterError) -> BridgeError {
    error!("[Bridge] Model rejected endpoint {}: {}", endpoint, err);
    BridgeError::ModelRejected {
        endpoint,
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DEFAULT_LOCATION, DeviceKind};
    use crate::matter::endpoint_descriptor::DescriptorBuilder;
    use crate::matter::model::InMemoryModel;
    use std::collections::HashSet;

    fn device(name: &str) -> (Device, EndpointDescriptor) {
        (
            Device::new(name, DEFAULT_LOCATION, DeviceKind::generic()),
            DescriptorBuilder::default().build(name, &[0x0006], &[], &[0x0013]),
        )
    }

    fn add<const N: usize>(
        reg: &mut BridgeRegistry<N>,
        model: &mut InMemoryModel,
        name: &str,
        requested: Option<EndpointId>,
    ) -> Result<usize> {
        let (dev, desc) = device(name);
        reg.add(model, dev, desc, requested, 1, Ownership::Registry)
    }

    fn setup<const N: usize>() -> (BridgeRegistry<N>, InMemoryModel) {
        let model = InMemoryModel::default();
        let mut reg = BridgeRegistry::<N>::new();
        reg.post_server_init(&model);
        (reg, model)
    }

    #[test]
    fn test_auto_ids_are_unique_and_increasing() {
        let (mut reg, mut model) = setup::<4>();
        for name in ["a", "b", "c"] {
            add(&mut reg, &mut model, name, None).unwrap();
        }
        assert_eq!(reg.endpoint_ids(), vec![2, 3, 4]);
        assert!(reg.device_at(3).is_some_and(|d| !d.unique_id().is_empty()));
    }

    #[test]
    fn test_ids_unique_across_add_remove() {
        let (mut reg, mut model) = setup::<3>();
        for round in 0..20 {
            let name = format!("dev{round}");
            if add(&mut reg, &mut model, &name, None).is_err() {
                let first = reg.slots().iter().next().map(|(_, s)| s.device.id()).unwrap();
                assert!(reg.remove(&mut model, first).is_some());
            }
            let ids = reg.endpoint_ids();
            let unique: HashSet<_> = ids.iter().collect();
            assert_eq!(ids.len(), unique.len());
            assert!(ids.iter().all(|&id| id >= 2));
        }
    }

    #[test]
    fn test_auto_assign_skips_taken_ids() {
        let (mut reg, mut model) = setup::<4>();
        add(&mut reg, &mut model, "explicit", Some(2)).unwrap();
        add(&mut reg, &mut model, "auto", None).unwrap();
        assert_eq!(reg.endpoint_ids(), vec![2, 3]);
        // Explicit ids do not move the allocator
        assert_eq!(reg.allocator().current().unwrap(), 4);
    }

    #[test]
    fn test_explicit_collision_leaves_table_unchanged() {
        let (mut reg, mut model) = setup::<4>();
        add(&mut reg, &mut model, "first", Some(10)).unwrap();
        let err = add(&mut reg, &mut model, "second", Some(10)).unwrap_err();
        assert!(matches!(err, BridgeError::IdentifierCollision(10)));
        assert_eq!(reg.slots().occupied(), 1);
        assert_eq!(reg.device_at(10).map(|d| d.name()), Some("first"));
        assert_eq!(reg.allocator().current().unwrap(), 2);

        // Fixed endpoints collide too
        assert!(matches!(
            add(&mut reg, &mut model, "root", Some(0)),
            Err(BridgeError::IdentifierCollision(0))
        ));
    }

    /// Accepts every registration without tracking which ids it holds.
    #[derive(Default)]
    struct AcceptAllModel {
        registered: Vec<(usize, EndpointId)>,
    }

    impl DeviceModel for AcceptAllModel {
        fn register_endpoint(
            &mut self,
            index: usize,
            endpoint_id: EndpointId,
            _descriptor: &EndpointDescriptor,
            _parent_endpoint_id: EndpointId,
        ) -> std::result::Result<(), RegisterError> {
            self.registered.push((index, endpoint_id));
            Ok(())
        }

        fn clear_endpoint(&mut self, index: usize) -> Option<EndpointId> {
            let pos = self.registered.iter().position(|(i, _)| *i == index)?;
            Some(self.registered.remove(pos).1)
        }

        fn report_attribute_changed(&mut self, _path: crate::matter::ids::AttributePath) {}

        fn last_fixed_endpoint(&self) -> EndpointId {
            1
        }
    }

    #[test]
    fn test_table_ids_collide_even_if_model_accepts() {
        let mut model = AcceptAllModel::default();
        let mut reg = BridgeRegistry::<4>::new();
        reg.post_server_init(&model);

        let (dev, desc) = device("first");
        reg.add(&mut model, dev, desc, Some(2), 1, Ownership::Registry).unwrap();
        let (dev, desc) = device("second");
        assert!(matches!(
            reg.add(&mut model, dev, desc, Some(2), 1, Ownership::Registry),
            Err(BridgeError::IdentifierCollision(2))
        ));
        assert_eq!(reg.device_at(2).map(|d| d.name()), Some("first"));
        assert_eq!(model.registered, vec![(0, 2)]);

        // Auto-assignment steps over the id held in the table
        let (dev, desc) = device("third");
        reg.add(&mut model, dev, desc, None, 1, Ownership::Registry).unwrap();
        assert_eq!(reg.endpoint_ids(), vec![2, 3]);
        assert_eq!(model.registered, vec![(0, 2), (1, 3)]);
    }

    #[test]
    fn test_capacity_exhausted() {
        let (mut reg, mut model) = setup::<1>();
        add(&mut reg, &mut model, "only", None).unwrap();
        assert!(matches!(
            add(&mut reg, &mut model, "extra", None),
            Err(BridgeError::CapacityExhausted(1))
        ));
        assert_eq!(model.dynamic_endpoint_ids(), vec![2]);
    }

    #[test]
    fn test_auto_add_before_init_fails() {
        let mut model = InMemoryModel::default();
        let mut reg = BridgeRegistry::<2>::new();
        assert!(matches!(
            add(&mut reg, &mut model, "early", None),
            Err(BridgeError::NotInitialized)
        ));
        // Explicit ids do not need the allocator
        assert!(add(&mut reg, &mut model, "early", Some(7)).is_ok());
    }

    #[test]
    fn test_identifier_space_exhausted() {
        let mut model = InMemoryModel::new(vec![0, 0xFFFC]);
        let mut reg = BridgeRegistry::<4>::new();
        reg.post_server_init(&model);
        add(&mut reg, &mut model, "a", None).unwrap();
        add(&mut reg, &mut model, "b", None).unwrap();
        assert!(matches!(
            add(&mut reg, &mut model, "c", None),
            Err(BridgeError::IdentifierSpaceExhausted)
        ));
        assert_eq!(reg.slots().occupied(), 2);
    }

    #[test]
    fn test_remove_unknown_device() {
        let (mut reg, mut model) = setup::<2>();
        add(&mut reg, &mut model, "a", None).unwrap();
        let (stranger, _) = device("stranger");
        assert!(reg.remove(&mut model, stranger.id()).is_none());
        assert_eq!(reg.endpoint_ids(), vec![2]);
    }

    #[test]
    fn test_remove_returns_external_devices() {
        let (mut reg, mut model) = setup::<2>();
        let (dev, desc) = device("mine");
        let id = dev.id();
        reg.add(&mut model, dev, desc, None, 1, Ownership::External).unwrap();
        add(&mut reg, &mut model, "theirs", None).unwrap();

        let removed = reg.remove(&mut model, id).unwrap();
        assert_eq!(removed.index, 0);
        assert_eq!(removed.endpoint_id, 2);
        assert_eq!(removed.external.map(|d| d.id()), Some(id));
        assert_eq!(model.dynamic_endpoint_ids(), vec![3]);

        let other = reg.device_at(3).map(|d| d.id()).unwrap();
        assert!(reg.remove(&mut model, other).unwrap().external.is_none());
    }

    #[test]
    fn test_devices_with_parent() {
        let (mut reg, mut model) = setup::<4>();
        add(&mut reg, &mut model, "parent", Some(5)).unwrap();
        let (child, desc) = device("child");
        reg.add(&mut model, child, desc, None, 5, Ownership::Registry).unwrap();
        add(&mut reg, &mut model, "other", None).unwrap();

        let children = reg.devices_with_parent(5);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name(), "child");
        assert_eq!(reg.devices_with_parent(1).len(), 2);
    }
}
