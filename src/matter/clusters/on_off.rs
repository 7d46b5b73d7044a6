//! OnOff cluster (0x0006).
//!
//! The only cluster the bridge attaches a static accepted-command list to.
//! Commands on it are routed through the command gateway to the delegate.

use crate::matter::attribute::{AttributeMetadata, AttributeType, mask};
use crate::matter::ids::{AttributeId, ClusterId, CommandId};
use strum::FromRepr;

/// Matter Cluster ID for OnOff
pub const CLUSTER_ID: ClusterId = 0x0006;

/// Cluster revision
pub const CLUSTER_REVISION: u16 = 4;

/// Attribute IDs for the OnOff cluster
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromRepr)]
#[repr(u32)]
pub enum OnOffAttribute {
    OnOff = 0x0000,
}

/// Command IDs for the OnOff cluster
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromRepr)]
#[repr(u32)]
pub enum OnOffCommand {
    Off = 0x00,
    On = 0x01,
    Toggle = 0x02,
}

/// Primary attribute reported after a successful command.
pub const PRIMARY_ATTRIBUTE: AttributeId = OnOffAttribute::OnOff as AttributeId;

/// Commands accepted on every bridged endpoint carrying this cluster.
pub const ACCEPTED_COMMANDS: [CommandId; 3] = [
    OnOffCommand::Off as CommandId,
    OnOffCommand::On as CommandId,
    OnOffCommand::Toggle as CommandId,
];

pub fn default_attributes() -> Vec<AttributeMetadata> {
    vec![AttributeMetadata::new(
        PRIMARY_ATTRIBUTE,
        AttributeType::Boolean,
        1,
        mask::WRITABLE | mask::EXTERNAL_STORAGE,
    )]
}
