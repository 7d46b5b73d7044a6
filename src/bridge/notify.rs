//! Change notification scheduling.
//!
//! Two paths reach the model's reporting entry point. The deferred path
//! queues a [`BridgeCommand::ReportChanged`] for the model thread and is used
//! by every mutation that starts outside it. The immediate path reports
//! synchronously and is only valid while the stack lock is held.

use super::runtime::BridgeCommand;
use crate::matter::ids::AttributePath;
use crate::matter::model::DeviceModel;
use log::{debug, warn};
use tokio::sync::mpsc::UnboundedSender;

/// Producer side of the deferred notification path.
#[derive(Debug, Clone)]
pub struct ChangeScheduler {
    tx: UnboundedSender<BridgeCommand>,
}

impl ChangeScheduler {
    pub fn new(tx: UnboundedSender<BridgeCommand>) -> Self {
        Self { tx }
    }

    /// Queues a report for the model thread. Returns false if the model
    /// thread is gone.
    pub fn schedule(&self, path: AttributePath) -> bool {
        debug!("[Bridge] Scheduling change report: {}", path);
        if self.tx.send(BridgeCommand::ReportChanged(path)).is_err() {
            warn!("[Bridge] Dropping change report for {}: model thread stopped", path);
            return false;
        }
        true
    }
}

/// Reports a change synchronously. Caller must hold the stack lock.
pub fn report_immediately(model: &mut dyn DeviceModel, path: AttributePath) {
    debug!("[Bridge] Reporting change: {}", path);
    model.report_attribute_changed(path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn test_schedule_enqueues_report() {
        let (tx, mut rx) = unbounded_channel();
        let scheduler = ChangeScheduler::new(tx);
        let path = AttributePath::new(4, 0x0006, 0);
        assert!(scheduler.schedule(path));
        assert!(matches!(rx.try_recv(), Ok(BridgeCommand::ReportChanged(p)) if p == path));

        drop(rx);
        assert!(!scheduler.schedule(path));
    }
}
