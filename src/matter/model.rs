//! Device-object model boundary.
//!
//! The bridge never stores attributes for the protocol stack itself. It
//! registers dynamic endpoints with a [`DeviceModel`], clears them again on
//! removal and tells the model when an attribute changed so subscribers get
//! a report.

use super::device_types::DeviceType;
use super::endpoint_descriptor::EndpointDescriptor;
use super::ids::{AttributePath, ClusterId, EndpointId, INVALID_ENDPOINT_ID};
use log::{debug, info};
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error as ThisError;

/// Why the model refused a dynamic endpoint.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    #[error("endpoint id already in use")]
    EndpointExists,

    #[error("dynamic index {0} already in use")]
    IndexInUse(usize),

    #[error("{0}")]
    Rejected(String),
}

/// Operations the bridge needs from the underlying device-object model.
///
/// All methods are called from the model thread while the stack lock is held.
pub trait DeviceModel: Send {
    /// Binds `descriptor` to `endpoint_id` at dynamic index `index`.
    fn register_endpoint(
        &mut self,
        index: usize,
        endpoint_id: EndpointId,
        descriptor: &EndpointDescriptor,
        parent_endpoint_id: EndpointId,
    ) -> Result<(), RegisterError>;

    /// Unbinds dynamic index `index`, returning the endpoint it held.
    fn clear_endpoint(&mut self, index: usize) -> Option<EndpointId>;

    /// Marks an attribute dirty so it gets reported to subscribers.
    fn report_attribute_changed(&mut self, path: AttributePath);

    /// Highest statically configured endpoint.
    fn last_fixed_endpoint(&self) -> EndpointId;
}

/// Shared, cloneable record of reported attribute changes.
#[derive(Debug, Clone, Default)]
pub struct ReportLog(Arc<Mutex<Vec<AttributePath>>>);

impl ReportLog {
    pub fn push(&self, path: AttributePath) {
        self.0.lock().push(path);
    }

    pub fn snapshot(&self) -> Vec<AttributePath> {
        self.0.lock().clone()
    }

    /// Number of reports for one path.
    pub fn count(&self, path: AttributePath) -> usize {
        self.0.lock().iter().filter(|p| **p == path).count()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

/// A dynamic endpoint as seen by [`InMemoryModel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredEndpoint {
    pub endpoint_id: EndpointId,
    pub parent_endpoint_id: EndpointId,
    pub cluster_ids: Vec<ClusterId>,
    pub device_types: Vec<DeviceType>,
}

/// Device model that keeps endpoint bindings in memory.
///
/// Used by the binary and by tests. Reported changes go to a [`ReportLog`]
/// that can be inspected from other threads.
#[derive(Debug)]
pub struct InMemoryModel {
    fixed_endpoints: Vec<EndpointId>,
    dynamic: Vec<Option<RegisteredEndpoint>>,
    reports: ReportLog,
}

impl InMemoryModel {
    /// Model with the given static endpoints (typically root and aggregator).
    pub fn new(fixed_endpoints: Vec<EndpointId>) -> Self {
        Self {
            fixed_endpoints,
            dynamic: Vec::new(),
            reports: ReportLog::default(),
        }
    }

    pub fn report_log(&self) -> ReportLog {
        self.reports.clone()
    }

    pub fn endpoint(&self, endpoint_id: EndpointId) -> Option<&RegisteredEndpoint> {
        self.dynamic
            .iter()
            .flatten()
            .find(|ep| ep.endpoint_id == endpoint_id)
    }

    pub fn dynamic_endpoint_ids(&self) -> Vec<EndpointId> {
        self.dynamic.iter().flatten().map(|ep| ep.endpoint_id).collect()
    }

    fn endpoint_in_use(&self, endpoint_id: EndpointId) -> bool {
        self.fixed_endpoints.contains(&endpoint_id) || self.endpoint(endpoint_id).is_some()
    }
}

impl Default for InMemoryModel {
    fn default() -> Self {
        Self::new(vec![0, 1])
    }
}

impl DeviceModel for InMemoryModel {
    fn register_endpoint(
        &mut self,
        index: usize,
        endpoint_id: EndpointId,
        descriptor: &EndpointDescriptor,
        parent_endpoint_id: EndpointId,
    ) -> Result<(), RegisterError> {
        if endpoint_id == INVALID_ENDPOINT_ID {
            return Err(RegisterError::Rejected("invalid endpoint id".to_string()));
        }
        if self.endpoint_in_use(endpoint_id) {
            return Err(RegisterError::EndpointExists);
        }
        if self.dynamic.get(index).is_some_and(Option::is_some) {
            return Err(RegisterError::IndexInUse(index));
        }

        if self.dynamic.len() <= index {
            self.dynamic.resize(index + 1, None);
        }
        self.dynamic[index] = Some(RegisteredEndpoint {
            endpoint_id,
            parent_endpoint_id,
            cluster_ids: descriptor.cluster_ids(),
            device_types: descriptor.device_types.clone(),
        });
        info!(
            "[Matter] Endpoint {} registered at index {} (parent {})",
            endpoint_id, index, parent_endpoint_id
        );
        Ok(())
    }

    fn clear_endpoint(&mut self, index: usize) -> Option<EndpointId> {
        let cleared = self.dynamic.get_mut(index)?.take()?;
        info!("[Matter] Endpoint {} cleared from index {}", cleared.endpoint_id, index);
        Some(cleared.endpoint_id)
    }

    fn report_attribute_changed(&mut self, path: AttributePath) {
        debug!("[Matter] Attribute changed: {}", path);
        self.reports.push(path);
    }

    fn last_fixed_endpoint(&self) -> EndpointId {
        self.fixed_endpoints.iter().copied().max().unwrap_or(0)
    }
}
