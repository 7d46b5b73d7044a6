//! The bridge core: registry, model, delegate and notification paths behind
//! one stack lock.

use super::delegate::ExternalDelegate;
use super::notify::{ChangeScheduler, report_immediately};
use super::registry::{BridgeRegistry, DYNAMIC_ENDPOINT_COUNT};
use super::request::AddDeviceRequest;
use super::rooms::{Action, EndpointListInfo, Room, endpoint_list_info};
use super::slots::Ownership;
use crate::config::Config;
use crate::device::{ChangeMask, Device, DeviceKind};
use crate::error::{BridgeError, Result};
use crate::matter::clusters::descriptor::{self, DescriptorAttribute};
use crate::matter::clusters::power_source::{self, PowerSourceAttribute};
use crate::matter::endpoint_descriptor::DescriptorBuilder;
use crate::matter::ids::{AttributeId, AttributePath, ClusterId, EndpointId};
use crate::matter::model::DeviceModel;
use log::{info, warn};
use std::sync::Arc;

/// Default number of bytes handed to the delegate for a write.
pub const DEFAULT_EXTERNAL_WRITE_SIZE: usize = 8;

/// Tunables the core reads at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeSettings {
    /// Static aggregator endpoint whose PartsList is intercepted
    pub aggregator_endpoint: EndpointId,
    /// Max bytes forwarded to the delegate per write
    pub external_write_size: usize,
    /// Adds EndpointUniqueID to injected Descriptor clusters
    pub endpoint_unique_id: bool,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            aggregator_endpoint: 1,
            external_write_size: DEFAULT_EXTERNAL_WRITE_SIZE,
            endpoint_unique_id: false,
        }
    }
}

impl From<&Config> for BridgeSettings {
    fn from(config: &Config) -> Self {
        Self {
            aggregator_endpoint: config.aggregator_endpoint,
            external_write_size: config.external_write_size,
            endpoint_unique_id: config.endpoint_unique_id,
        }
    }
}

/// Everything the stack lock protects.
///
/// Mutating methods are meant to run on the model thread (see
/// [`BridgeRuntime`](super::BridgeRuntime)); tests drive them directly.
pub struct BridgeCore<const N: usize = DYNAMIC_ENDPOINT_COUNT> {
    pub(crate) registry: BridgeRegistry<N>,
    pub(crate) model: Box<dyn DeviceModel>,
    pub(crate) delegate: Arc<dyn ExternalDelegate>,
    pub(crate) scheduler: ChangeScheduler,
    pub(crate) settings: BridgeSettings,
    builder: DescriptorBuilder,
    rooms: Vec<Room>,
    actions: Vec<Action>,
}

impl<const N: usize> BridgeCore<N> {
    pub fn new(
        model: Box<dyn DeviceModel>,
        delegate: Arc<dyn ExternalDelegate>,
        scheduler: ChangeScheduler,
        settings: BridgeSettings,
    ) -> Self {
        Self {
            registry: BridgeRegistry::new(),
            model,
            delegate,
            scheduler,
            builder: DescriptorBuilder::new(settings.endpoint_unique_id),
            settings,
            rooms: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn registry(&self) -> &BridgeRegistry<N> {
        &self.registry
    }

    pub fn model(&self) -> &dyn DeviceModel {
        self.model.as_ref()
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    pub fn post_server_init(&mut self) {
        self.registry.post_server_init(self.model.as_ref());
    }

    /// Registers a registry-owned device built from `request`.
    pub fn add_device(&mut self, request: &AddDeviceRequest) -> Result<EndpointId> {
        request.validate()?;
        self.insert(request.build_device(), request, Ownership::Registry)
    }

    /// Registers a caller-built device. It is handed back on removal.
    pub fn adopt_device(&mut self, device: Device, request: &AddDeviceRequest) -> Result<EndpointId> {
        request.validate()?;
        self.insert(device, request, Ownership::External)
    }

    fn insert(
        &mut self,
        device: Device,
        request: &AddDeviceRequest,
        ownership: Ownership,
    ) -> Result<EndpointId> {
        let descriptor = request.build_descriptor(&self.builder);
        let index = self.registry.add(
            self.model.as_mut(),
            device,
            descriptor,
            request.requested_endpoint(),
            request.parent_endpoint,
            ownership,
        )?;
        let endpoint = self
            .registry
            .slots()
            .get(index)
            .map(|slot| slot.device.endpoint_id())
            .ok_or(BridgeError::CapacityExhausted(N))?;
        self.schedule_parts_list(request.parent_endpoint);
        Ok(endpoint)
    }

    /// Removes the device at `endpoint`. Externally owned devices are
    /// returned.
    pub fn remove_device(&mut self, endpoint: EndpointId) -> Result<Option<Device>> {
        let device_id = self
            .registry
            .device_at(endpoint)
            .map(Device::id)
            .ok_or(BridgeError::NotFound(endpoint))?;
        let parent = self
            .registry
            .device_at(endpoint)
            .map(Device::parent_endpoint_id)
            .unwrap_or(self.settings.aggregator_endpoint);

        let removed = self
            .registry
            .remove(self.model.as_mut(), device_id)
            .ok_or(BridgeError::NotFound(endpoint))?;
        self.schedule_parts_list(parent);
        Ok(removed.external)
    }

    /// Stores a locally held attribute value and reports it if it changed.
    ///
    /// Power source attributes are looked up on the reserved device and
    /// reported immediately.
    pub fn store_attribute(
        &mut self,
        endpoint: EndpointId,
        cluster: ClusterId,
        attribute: AttributeId,
        value: u64,
    ) -> Result<bool> {
        let device = if cluster == power_source::CLUSTER_ID
            && self.reserved_endpoint() == Some(endpoint)
        {
            self.registry.reserved_mut()
        } else {
            self.registry.device_at_mut(endpoint)
        }
        .ok_or(BridgeError::NotFound(endpoint))?;

        let changed = device
            .kind_mut()
            .set_attribute(cluster, attribute, value)
            .ok_or(BridgeError::AttributeNotStored {
                endpoint,
                cluster,
                attribute,
            })?;
        if changed {
            let immediate = device.kind().reports_immediately();
            self.report(AttributePath::new(endpoint, cluster, attribute), immediate);
        }
        Ok(changed)
    }

    pub fn set_reachable(&mut self, endpoint: EndpointId, reachable: bool) -> Result<()> {
        let device = self
            .registry
            .device_at_mut(endpoint)
            .ok_or(BridgeError::NotFound(endpoint))?;
        let mask = device.set_reachable(reachable);
        info!("[Bridge] Endpoint {} reachable={}", endpoint, reachable);
        self.report_device_changes(endpoint, mask);
        Ok(())
    }

    pub fn set_location(&mut self, endpoint: EndpointId, location: &str, zone: &str) -> Result<()> {
        let device = self
            .registry
            .device_at_mut(endpoint)
            .ok_or(BridgeError::NotFound(endpoint))?;
        let mask = device.set_location(location);
        device.set_zone(zone);
        self.report_device_changes(endpoint, mask);
        Ok(())
    }

    /// Deferred reports for infrastructure fields named in `mask`.
    fn report_device_changes(&mut self, endpoint: EndpointId, mask: ChangeMask) {
        let Some(device) = self.registry.device_at(endpoint) else {
            return;
        };
        for (cluster, attribute) in device.reported_paths(mask) {
            self.scheduler
                .schedule(AttributePath::new(endpoint, cluster, attribute));
        }
    }

    /// Installs the shared power source in the reserved slot.
    pub fn install_power_source(&mut self, device: Device, endpoint: EndpointId) -> Result<()> {
        if !matches!(device.kind(), DeviceKind::PowerSource(_)) {
            return Err(BridgeError::InvalidDefinition(format!(
                "'{}' is not a power source",
                device.name()
            )));
        }
        if let Some(previous) = self.registry.install_reserved(device, endpoint) {
            warn!("[Bridge] Replaced power source '{}'", previous.name());
        }
        Ok(())
    }

    /// Sets the endpoints powered by the reserved power source.
    pub fn set_power_source_endpoints(&mut self, endpoints: Vec<EndpointId>) -> Result<()> {
        let device = self
            .registry
            .reserved_mut()
            .ok_or_else(|| BridgeError::InvalidDefinition("no power source installed".to_string()))?;
        let endpoint = device.endpoint_id();
        if let DeviceKind::PowerSource(state) = device.kind_mut() {
            if state.endpoint_list == endpoints {
                return Ok(());
            }
            state.endpoint_list = endpoints;
        }
        self.report(
            AttributePath::new(
                endpoint,
                power_source::CLUSTER_ID,
                PowerSourceAttribute::EndpointList as AttributeId,
            ),
            true,
        );
        Ok(())
    }

    /// Replaces the reserved power source's Description. Returns whether it
    /// changed; a change is reported immediately.
    pub fn set_power_source_description(&mut self, description: &str) -> Result<bool> {
        let device = self
            .registry
            .reserved_mut()
            .ok_or_else(|| BridgeError::InvalidDefinition("no power source installed".to_string()))?;
        let endpoint = device.endpoint_id();
        let DeviceKind::PowerSource(state) = device.kind_mut() else {
            return Err(BridgeError::InvalidDefinition(
                "reserved device is not a power source".to_string(),
            ));
        };
        let changed = state.set_description(description).ok_or_else(|| {
            BridgeError::InvalidDefinition(format!(
                "power source description longer than {} bytes",
                power_source::DESCRIPTION_MAX_LEN
            ))
        })?;
        if changed {
            self.report(
                AttributePath::new(
                    endpoint,
                    power_source::CLUSTER_ID,
                    PowerSourceAttribute::Description as AttributeId,
                ),
                true,
            );
        }
        Ok(changed)
    }

    pub(crate) fn reserved_endpoint(&self) -> Option<EndpointId> {
        self.registry.reserved().map(Device::endpoint_id)
    }

    /// Immediate-path report. The caller holds the stack lock by virtue of
    /// holding `&mut self`.
    pub fn report_change(&mut self, path: AttributePath) {
        report_immediately(self.model.as_mut(), path);
    }

    /// Deferred-path report.
    pub fn schedule_change(&self, path: AttributePath) -> bool {
        self.scheduler.schedule(path)
    }

    fn report(&mut self, path: AttributePath, immediate: bool) {
        if immediate {
            self.report_change(path);
        } else {
            self.schedule_change(path);
        }
    }

    fn schedule_parts_list(&self, parent: EndpointId) {
        self.scheduler.schedule(AttributePath::new(
            parent,
            descriptor::CLUSTER_ID,
            DescriptorAttribute::PartsList as AttributeId,
        ));
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn add_room(&mut self, room: Room) {
        self.rooms.push(room);
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn add_action(&mut self, action: Action) {
        self.actions.push(action);
    }

    /// Room and zone endpoint lists for the children of `parent`.
    pub fn endpoint_lists(&self, parent: EndpointId) -> Vec<EndpointListInfo> {
        endpoint_list_info(&self.registry, parent, &self.rooms)
    }
}
