//! External delegate trait for business-logic clusters.
//!
//! Everything the bridge does not own itself (any cluster other than basic
//! information and power source) is answered by an [`ExternalDelegate`].
//! These four calls are the whole surface between the bridge and the
//! layer that knows what a device actually does.

use crate::matter::clusters::on_off::{self, OnOffCommand};
use crate::matter::ids::{AttributeId, AttributePath, ClusterId, CommandId, EndpointId};
use log::debug;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Trait for the layer that owns bridged device state.
///
/// Calls are made synchronously on the model thread while the stack lock is
/// held. Queueing [`BridgeHandle`] calls (`add_device`, `remove_device`,
/// `update_attribute`, `store_attribute` and the other fire-and-forget
/// setters) are fine from a callback. Calls that take the stack lock or wait
/// for the model thread (`report_attribute_change`, `stack_lock`, the power
/// source and room setup calls, any awaited request) deadlock.
///
/// [`BridgeHandle`]: crate::bridge::BridgeHandle
pub trait ExternalDelegate: Send + Sync + 'static {
    /// Current encoded value, `None` (or empty) if the attribute is unknown.
    fn read_attribute(
        &self,
        endpoint: EndpointId,
        cluster: ClusterId,
        attribute: AttributeId,
        max_len: u16,
    ) -> Option<Vec<u8>>;

    /// Applies a write. Returns true if handled.
    fn write_attribute(
        &self,
        endpoint: EndpointId,
        cluster: ClusterId,
        attribute: AttributeId,
        value: &[u8],
    ) -> bool;

    /// Executes a command. Returns true if handled.
    fn invoke_command(&self, endpoint: EndpointId, cluster: ClusterId, command: CommandId) -> bool;

    /// Observer notification after a local state change. Fire and forget.
    fn state_changed(
        &self,
        endpoint: EndpointId,
        cluster: ClusterId,
        attribute: AttributeId,
        value: &[u8],
    );
}

/// A state change seen by [`MemoryDelegate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub path: AttributePath,
    pub value: Vec<u8>,
}

/// In-process delegate that keeps attribute bytes in a map.
///
/// Writes are stored as given and read back verbatim. OnOff commands toggle
/// the stored OnOff byte.
#[derive(Debug)]
pub struct MemoryDelegate {
    values: RwLock<HashMap<AttributePath, Vec<u8>>>,
    state_changes: Mutex<Vec<StateChange>>,
    accept_writes: AtomicBool,
}

impl MemoryDelegate {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            state_changes: Mutex::new(Vec::new()),
            accept_writes: AtomicBool::new(true),
        }
    }

    /// Seeds or replaces a stored value.
    pub fn set_value(&self, path: AttributePath, value: Vec<u8>) {
        self.values.write().insert(path, value);
    }

    pub fn value(&self, path: AttributePath) -> Option<Vec<u8>> {
        self.values.read().get(&path).cloned()
    }

    /// When false, every write is reported as not handled.
    pub fn set_accept_writes(&self, accept: bool) {
        self.accept_writes.store(accept, Ordering::SeqCst);
    }

    pub fn state_changes(&self) -> Vec<StateChange> {
        self.state_changes.lock().clone()
    }
}

impl Default for MemoryDelegate {
    fn default() -> Self {
        Self::new()
    }
}

impl ExternalDelegate for MemoryDelegate {
    fn read_attribute(
        &self,
        endpoint: EndpointId,
        cluster: ClusterId,
        attribute: AttributeId,
        _max_len: u16,
    ) -> Option<Vec<u8>> {
        self.value(AttributePath::new(endpoint, cluster, attribute))
    }

    fn write_attribute(
        &self,
        endpoint: EndpointId,
        cluster: ClusterId,
        attribute: AttributeId,
        value: &[u8],
    ) -> bool {
        if !self.accept_writes.load(Ordering::SeqCst) {
            return false;
        }
        self.set_value(AttributePath::new(endpoint, cluster, attribute), value.to_vec());
        true
    }

    fn invoke_command(&self, endpoint: EndpointId, cluster: ClusterId, command: CommandId) -> bool {
        if cluster != on_off::CLUSTER_ID {
            return false;
        }
        let Some(command) = OnOffCommand::from_repr(command) else {
            return false;
        };

        let path = AttributePath::new(endpoint, cluster, on_off::PRIMARY_ATTRIBUTE);
        let mut values = self.values.write();
        let current = values.get(&path).and_then(|v| v.first().copied()).unwrap_or(0) != 0;
        let next = match command {
            OnOffCommand::Off => false,
            OnOffCommand::On => true,
            OnOffCommand::Toggle => !current,
        };
        values.insert(path, vec![u8::from(next)]);
        debug!("[Bridge] MemoryDelegate ep={} OnOff {:?} -> {}", endpoint, command, next);
        true
    }

    fn state_changed(
        &self,
        endpoint: EndpointId,
        cluster: ClusterId,
        attribute: AttributeId,
        value: &[u8],
    ) {
        self.state_changes.lock().push(StateChange {
            path: AttributePath::new(endpoint, cluster, attribute),
            value: value.to_vec(),
        });
    }
}
