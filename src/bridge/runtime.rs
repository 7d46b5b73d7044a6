//! Model-thread actor and the inbound registration API.
//!
//! All mutations of the slot table and allocator happen on one dedicated
//! thread ("bridge-model") that drains an unbounded command channel and takes
//! the stack lock for each message. Callers on any other thread get a
//! [`BridgeHandle`] whose fire-and-forget methods return as soon as the
//! command is queued.

use super::commands::CommandContext;
use super::core::{BridgeCore, BridgeSettings};
use super::delegate::ExternalDelegate;
use super::notify::ChangeScheduler;
use super::registry::DYNAMIC_ENDPOINT_COUNT;
use super::request::AddDeviceRequest;
use super::rooms::{Action, EndpointListInfo, Room};
use crate::device::Device;
use crate::error::{BridgeError, Result};
use crate::matter::attribute::AttributeMetadata;
use crate::matter::ids::{AttributeId, AttributePath, ClusterId, CommandPath, EndpointId};
use crate::matter::model::DeviceModel;
use crate::matter::status::Status;
use log::{debug, error, info, warn};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::sync::oneshot;

/// Messages processed in FIFO order on the model thread.
#[derive(Debug)]
pub enum BridgeCommand {
    /// Seeds the endpoint allocator. Always the first message.
    PostServerInit,
    Add {
        request: Box<AddDeviceRequest>,
        reply: Option<oneshot::Sender<Result<EndpointId>>>,
    },
    Adopt {
        device: Box<Device>,
        request: Box<AddDeviceRequest>,
        reply: Option<oneshot::Sender<Result<EndpointId>>>,
    },
    Remove {
        endpoint: EndpointId,
        reply: Option<oneshot::Sender<Result<Option<Device>>>>,
    },
    ReportChanged(AttributePath),
    /// External update of a generic attribute. Only reported while a device
    /// occupies the endpoint.
    Update(AttributePath),
    StoreAttribute {
        path: AttributePath,
        value: u64,
    },
    SetReachable {
        endpoint: EndpointId,
        reachable: bool,
    },
    SetLocation {
        endpoint: EndpointId,
        location: String,
        zone: String,
    },
    SetPowerSourceDescription(String),
    Read {
        endpoint: EndpointId,
        cluster: ClusterId,
        metadata: AttributeMetadata,
        max_len: usize,
        reply: oneshot::Sender<(Status, Vec<u8>)>,
    },
    Write {
        endpoint: EndpointId,
        cluster: ClusterId,
        metadata: AttributeMetadata,
        value: Vec<u8>,
        reply: oneshot::Sender<Status>,
    },
    Invoke {
        path: CommandPath,
        reply: oneshot::Sender<CommandContext>,
    },
    /// Completes once every earlier message has been processed.
    Barrier(oneshot::Sender<()>),
    Shutdown,
}

/// New value pushed by the external layer for a generic attribute.
///
/// The bridge does not store it; the value only triggers a change report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Scalar(u64),
    Bytes(Vec<u8>),
}

impl<const N: usize> BridgeCore<N> {
    fn handle_command(&mut self, command: BridgeCommand) {
        match command {
            BridgeCommand::PostServerInit => self.post_server_init(),
            BridgeCommand::Add { request, reply } => {
                let result = self.add_device(&request);
                if let Err(e) = &result {
                    warn!("[Bridge] Failed to add '{}': {}", request.name, e);
                }
                reply_with(reply, result);
            }
            BridgeCommand::Adopt {
                device,
                request,
                reply,
            } => {
                let result = self.adopt_device(*device, &request);
                if let Err(e) = &result {
                    warn!("[Bridge] Failed to adopt '{}': {}", request.name, e);
                }
                reply_with(reply, result);
            }
            BridgeCommand::Remove { endpoint, reply } => {
                let result = self.remove_device(endpoint);
                if let Err(e) = &result {
                    warn!("[Bridge] Failed to remove endpoint {}: {}", endpoint, e);
                }
                reply_with(reply, result);
            }
            BridgeCommand::ReportChanged(path) => self.report_change(path),
            BridgeCommand::Update(path) => {
                if self.registry().device_at(path.endpoint).is_some() {
                    self.report_change(path);
                } else {
                    warn!(
                        "[Bridge] Dropping update of {}: {}",
                        path,
                        BridgeError::NotFound(path.endpoint)
                    );
                }
            }
            BridgeCommand::StoreAttribute { path, value } => {
                if let Err(e) =
                    self.store_attribute(path.endpoint, path.cluster, path.attribute, value)
                {
                    warn!("[Bridge] Failed to store {}: {}", path, e);
                }
            }
            BridgeCommand::SetReachable {
                endpoint,
                reachable,
            } => {
                if let Err(e) = self.set_reachable(endpoint, reachable) {
                    warn!("[Bridge] Failed to set reachable on {}: {}", endpoint, e);
                }
            }
            BridgeCommand::SetLocation {
                endpoint,
                location,
                zone,
            } => {
                if let Err(e) = self.set_location(endpoint, &location, &zone) {
                    warn!("[Bridge] Failed to set location on {}: {}", endpoint, e);
                }
            }
            BridgeCommand::SetPowerSourceDescription(description) => {
                if let Err(e) = self.set_power_source_description(&description) {
                    warn!("[Bridge] Failed to set power source description: {}", e);
                }
            }
            BridgeCommand::Read {
                endpoint,
                cluster,
                metadata,
                max_len,
                reply,
            } => {
                let mut buffer = vec![0u8; max_len];
                let status = self.read_attribute(endpoint, cluster, &metadata, &mut buffer);
                let _ = reply.send((status, buffer));
            }
            BridgeCommand::Write {
                endpoint,
                cluster,
                metadata,
                value,
                reply,
            } => {
                let status = self.write_attribute(endpoint, cluster, &metadata, &value);
                let _ = reply.send(status);
            }
            BridgeCommand::Invoke { path, reply } => {
                let mut ctx = CommandContext::new(path);
                self.invoke_command(&mut ctx);
                let _ = reply.send(ctx);
            }
            BridgeCommand::Barrier(reply) => {
                let _ = reply.send(());
            }
            // Consumed by the thread loop
            BridgeCommand::Shutdown => {}
        }
    }
}

fn reply_with<T>(reply: Option<oneshot::Sender<T>>, value: T) {
    if let Some(reply) = reply
        && reply.send(value).is_err()
    {
        debug!("[Bridge] Reply receiver dropped");
    }
}

/// Owns the model thread. Dropping it stops the thread after the queue
/// drains.
pub struct BridgeRuntime<const N: usize = DYNAMIC_ENDPOINT_COUNT> {
    handle: BridgeHandle<N>,
    thread: Option<JoinHandle<()>>,
}

impl<const N: usize> BridgeRuntime<N> {
    /// Wraps `model` in a bridge core and starts the model thread.
    pub fn start(
        model: Box<dyn DeviceModel>,
        delegate: Arc<dyn ExternalDelegate>,
        settings: BridgeSettings,
    ) -> Result<Self> {
        let (tx, rx) = unbounded_channel();
        let core = Arc::new(Mutex::new(BridgeCore::<N>::new(
            model,
            delegate,
            ChangeScheduler::new(tx.clone()),
            settings,
        )));

        tx.send(BridgeCommand::PostServerInit)
            .map_err(|_| BridgeError::RuntimeStopped)?;

        let thread_core = core.clone();
        let thread = thread::Builder::new()
            .name("bridge-model".into())
            .spawn(move || run_model_thread(thread_core, rx))?;

        info!("[Bridge] Runtime started with {} dynamic endpoint slots", N);
        Ok(Self {
            handle: BridgeHandle { tx, core },
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> BridgeHandle<N> {
        self.handle.clone()
    }

    /// Stops the model thread after all queued messages ran.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        let _ = self.handle.tx.send(BridgeCommand::Shutdown);
        if thread.join().is_err() {
            error!("[Bridge] Model thread panicked");
        }
        info!("[Bridge] Runtime stopped");
    }
}

impl<const N: usize> Drop for BridgeRuntime<N> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_model_thread<const N: usize>(
    core: Arc<Mutex<BridgeCore<N>>>,
    mut rx: UnboundedReceiver<BridgeCommand>,
) {
    debug!("[Bridge] Model thread running");
    while let Some(command) = rx.blocking_recv() {
        if matches!(command, BridgeCommand::Shutdown) {
            break;
        }
        core.lock().handle_command(command);
    }
    debug!("[Bridge] Model thread exiting");
}

/// Cloneable entry point for the external management layer.
///
/// Registration, removal and update calls only enqueue and are safe from an
/// [`ExternalDelegate`] callback. Methods that take the stack lock directly
/// (`report_attribute_change`, `stack_lock`, the power source and room
/// setup calls) block until the model thread is between messages and must
/// not be called from a callback.
pub struct BridgeHandle<const N: usize = DYNAMIC_ENDPOINT_COUNT> {
    tx: UnboundedSender<BridgeCommand>,
    core: Arc<Mutex<BridgeCore<N>>>,
}

impl<const N: usize> Clone for BridgeHandle<N> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            core: self.core.clone(),
        }
    }
}

impl<const N: usize> BridgeHandle<N> {
    fn send(&self, command: BridgeCommand) -> Result<()> {
        self.tx.send(command).map_err(|_| BridgeError::RuntimeStopped)
    }

    async fn request<T>(&self, command: BridgeCommand, rx: oneshot::Receiver<T>) -> Result<T> {
        self.send(command)?;
        rx.await.map_err(|_| BridgeError::RuntimeStopped)
    }

    /// Queues a registration. The device is not visible until the model
    /// thread has processed it.
    pub fn add_device(&self, request: AddDeviceRequest) -> Result<()> {
        request.validate()?;
        debug!("[Bridge] Queueing add of '{}'", request.name);
        self.send(BridgeCommand::Add {
            request: Box::new(request),
            reply: None,
        })
    }

    /// Queues a registration and waits for its outcome.
    pub async fn add_device_confirmed(&self, request: AddDeviceRequest) -> Result<EndpointId> {
        let (reply, rx) = oneshot::channel();
        let command = BridgeCommand::Add {
            request: Box::new(request),
            reply: Some(reply),
        };
        self.request(command, rx).await?
    }

    /// Registers a caller-built device that is handed back on removal.
    pub async fn adopt_device(&self, device: Device, request: AddDeviceRequest) -> Result<EndpointId> {
        let (reply, rx) = oneshot::channel();
        let command = BridgeCommand::Adopt {
            device: Box::new(device),
            request: Box::new(request),
            reply: Some(reply),
        };
        self.request(command, rx).await?
    }

    /// Queues removal of the device at `endpoint`. An unknown endpoint is
    /// logged on the model thread; [`Self::remove_device_confirmed`] reports
    /// it as `NotFound`.
    pub fn remove_device(&self, endpoint: EndpointId) -> Result<()> {
        debug!("[Bridge] Queueing removal of endpoint {}", endpoint);
        self.send(BridgeCommand::Remove {
            endpoint,
            reply: None,
        })
    }

    /// Removes the device at `endpoint` and waits. Adopted devices come back.
    pub async fn remove_device_confirmed(&self, endpoint: EndpointId) -> Result<Option<Device>> {
        let (reply, rx) = oneshot::channel();
        let command = BridgeCommand::Remove {
            endpoint,
            reply: Some(reply),
        };
        self.request(command, rx).await?
    }

    /// Signals that the external layer changed a generic attribute. The
    /// change is reported once the model thread sees a device at `endpoint`.
    pub fn update_attribute(
        &self,
        endpoint: EndpointId,
        cluster: ClusterId,
        attribute: AttributeId,
        value: AttributeValue,
    ) -> Result<()> {
        let path = AttributePath::new(endpoint, cluster, attribute);
        match &value {
            AttributeValue::Scalar(v) => debug!("[Bridge] Update {} = {}", path, v),
            AttributeValue::Bytes(b) => debug!("[Bridge] Update {} ({} bytes)", path, b.len()),
        }
        self.send(BridgeCommand::Update(path))
    }

    /// Reports a change synchronously under the stack lock.
    pub fn report_attribute_change(&self, path: AttributePath) {
        self.core.lock().report_change(path);
    }

    /// Stores a value held by the device's kind (on/off, temperature,
    /// power source, generic map).
    pub fn store_attribute(
        &self,
        endpoint: EndpointId,
        cluster: ClusterId,
        attribute: AttributeId,
        value: u64,
    ) -> Result<()> {
        self.send(BridgeCommand::StoreAttribute {
            path: AttributePath::new(endpoint, cluster, attribute),
            value,
        })
    }

    pub fn set_reachable(&self, endpoint: EndpointId, reachable: bool) -> Result<()> {
        self.send(BridgeCommand::SetReachable {
            endpoint,
            reachable,
        })
    }

    pub fn set_location(
        &self,
        endpoint: EndpointId,
        location: impl Into<String>,
        zone: impl Into<String>,
    ) -> Result<()> {
        self.send(BridgeCommand::SetLocation {
            endpoint,
            location: location.into(),
            zone: zone.into(),
        })
    }

    /// Bootstrap: installs the shared power source under the stack lock.
    pub fn install_power_source(&self, device: Device, endpoint: EndpointId) -> Result<()> {
        self.core.lock().install_power_source(device, endpoint)
    }

    pub fn set_power_source_endpoints(&self, endpoints: Vec<EndpointId>) -> Result<()> {
        self.core.lock().set_power_source_endpoints(endpoints)
    }

    /// Queues a new Description for the installed power source.
    pub fn set_power_source_description(&self, description: impl Into<String>) -> Result<()> {
        self.send(BridgeCommand::SetPowerSourceDescription(description.into()))
    }

    pub fn add_room(&self, room: Room) {
        self.core.lock().add_room(room);
    }

    pub fn add_action(&self, action: Action) {
        self.core.lock().add_action(action);
    }

    pub fn endpoint_lists(&self, parent: EndpointId) -> Vec<EndpointListInfo> {
        self.core.lock().endpoint_lists(parent)
    }

    /// Read through the attribute gateway on the model thread.
    pub async fn read_attribute(
        &self,
        endpoint: EndpointId,
        cluster: ClusterId,
        metadata: AttributeMetadata,
        max_len: usize,
    ) -> Result<(Status, Vec<u8>)> {
        let (reply, rx) = oneshot::channel();
        let command = BridgeCommand::Read {
            endpoint,
            cluster,
            metadata,
            max_len,
            reply,
        };
        self.request(command, rx).await
    }

    /// Write through the attribute gateway on the model thread.
    pub async fn write_attribute(
        &self,
        endpoint: EndpointId,
        cluster: ClusterId,
        metadata: AttributeMetadata,
        value: Vec<u8>,
    ) -> Result<Status> {
        let (reply, rx) = oneshot::channel();
        let command = BridgeCommand::Write {
            endpoint,
            cluster,
            metadata,
            value,
            reply,
        };
        self.request(command, rx).await
    }

    /// Command through the command gateway on the model thread.
    pub async fn invoke_command(&self, path: CommandPath) -> Result<CommandContext> {
        let (reply, rx) = oneshot::channel();
        self.request(BridgeCommand::Invoke { path, reply }, rx).await
    }

    /// Waits until every message queued before this call has run.
    pub async fn sync(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.request(BridgeCommand::Barrier(reply), rx).await
    }

    /// Exclusive access to the core. Blocks while the model thread is
    /// processing a message.
    pub fn stack_lock(&self) -> MutexGuard<'_, BridgeCore<N>> {
        self.core.lock()
    }

    /// Asks the model thread to stop once the queue drains.
    pub fn shutdown(&self) -> Result<()> {
        self.send(BridgeCommand::Shutdown)
    }
}
