//! Command dispatch gateway.
//!
//! Only OnOff commands on dynamic endpoints are intercepted. The delegate
//! executes them and the bridge reports the OnOff attribute on success.

use super::core::BridgeCore;
use crate::matter::clusters::on_off;
use crate::matter::ids::{AttributePath, CommandPath};
use crate::matter::status::Status;
use log::debug;

/// Per-invocation context passed in by the model.
///
/// `handled` tells the model whether the bridge took the command; when it
/// did, the status for the command is appended to `statuses`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    pub path: CommandPath,
    pub handled: bool,
    pub statuses: Vec<(CommandPath, Status)>,
}

impl CommandContext {
    pub fn new(path: CommandPath) -> Self {
        Self {
            path,
            handled: false,
            statuses: Vec::new(),
        }
    }

    /// Status recorded for this context's command, if any.
    pub fn status(&self) -> Option<Status> {
        self.statuses
            .iter()
            .rev()
            .find(|(path, _)| *path == self.path)
            .map(|(_, status)| *status)
    }
}

impl<const N: usize> BridgeCore<N> {
    /// Dispatches a command. Clusters other than OnOff are left untouched
    /// for the model's own handling.
    pub fn invoke_command(&mut self, ctx: &mut CommandContext) {
        let path = ctx.path;
        if path.cluster != on_off::CLUSTER_ID {
            return;
        }
        ctx.handled = true;

        let handled = self
            .delegate
            .invoke_command(path.endpoint, path.cluster, path.command);
        debug!("[Bridge] Command {} handled={}", path, handled);

        if handled {
            ctx.statuses.push((path, Status::Success));
            self.report_change(AttributePath::new(
                path.endpoint,
                on_off::CLUSTER_ID,
                on_off::PRIMARY_ATTRIBUTE,
            ));
        } else {
            ctx.statuses.push((path, Status::UnsupportedCommand));
        }
    }
}
