//! Attribute metadata supplied by callers when a bridged device is registered.
//!
//! Metadata is carried through to the device model as-is. Unknown type tags and
//! zero sizes are not rejected here; they surface later as read/write failures.

use super::ids::{AttributeId, ClusterId};
use serde::{Deserialize, Serialize};
use strum::FromRepr;

/// Wire type tags understood by the built-in handlers.
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromRepr)]
#[repr(u8)]
pub enum AttributeType {
    Boolean = 0x10,
    Bitmap32 = 0x1B,
    Int8u = 0x20,
    Int16u = 0x21,
    Int32u = 0x23,
    Int16s = 0x29,
    Enum8 = 0x30,
    CharString = 0x42,
    Array = 0x48,
}

/// Attribute mask bits.
pub mod mask {
    pub const NONE: u8 = 0x00;
    pub const WRITABLE: u8 = 0x01;
    pub const EXTERNAL_STORAGE: u8 = 0x10;
    pub const READABLE: u8 = 0x20;
}

/// Static description of one attribute inside a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeMetadata {
    pub attribute_id: AttributeId,
    /// Raw wire type tag (see [`AttributeType`])
    pub type_tag: u8,
    /// Maximum encoded size in bytes
    pub size: u16,
    pub mask: u8,
}

impl AttributeMetadata {
    pub const fn new(attribute_id: AttributeId, ty: AttributeType, size: u16, mask: u8) -> Self {
        Self {
            attribute_id,
            type_tag: ty as u8,
            size,
            mask,
        }
    }

    /// Decoded wire type, `None` for tags the bridge does not know.
    pub fn attribute_type(&self) -> Option<AttributeType> {
        AttributeType::from_repr(self.type_tag)
    }

    pub fn is_writable(&self) -> bool {
        self.mask & mask::WRITABLE != 0
    }

    pub fn is_external(&self) -> bool {
        self.mask & mask::EXTERNAL_STORAGE != 0
    }
}

/// Flattened (cluster, attribute, type, size, mask) tuple as sent by the
/// management layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSpec {
    pub cluster_id: ClusterId,
    pub attribute_id: AttributeId,
    #[serde(rename = "type")]
    pub type_tag: u8,
    pub size: u16,
    #[serde(default)]
    pub mask: u8,
}

impl AttributeSpec {
    pub const fn new(
        cluster_id: ClusterId,
        attribute_id: AttributeId,
        ty: AttributeType,
        size: u16,
        mask: u8,
    ) -> Self {
        Self {
            cluster_id,
            attribute_id,
            type_tag: ty as u8,
            size,
            mask,
        }
    }

    pub fn metadata(&self) -> AttributeMetadata {
        AttributeMetadata {
            attribute_id: self.attribute_id,
            type_tag: self.type_tag,
            size: self.size,
            mask: self.mask,
        }
    }
}

/// Length byte marking a null ZCL character string.
const ZCL_NULL_STRING: u8 = 0xFF;

/// Encodes `value` as a ZCL character string (one length byte, then the
/// bytes) into `buffer`, truncating to what fits. Returns the bytes written.
pub fn encode_char_string(buffer: &mut [u8], value: &str) -> usize {
    if buffer.is_empty() {
        return 0;
    }
    let max = (buffer.len() - 1).min(ZCL_NULL_STRING as usize - 1);
    let bytes = value.as_bytes();
    let len = bytes.len().min(max);
    buffer[0] = len as u8;
    buffer[1..=len].copy_from_slice(&bytes[..len]);
    len + 1
}

/// Decodes a ZCL character string. A null string decodes as empty.
///
/// Returns `None` when the length byte runs past the end of `buffer`.
pub fn decode_char_string(buffer: &[u8]) -> Option<&[u8]> {
    let (&len, rest) = buffer.split_first()?;
    if len == ZCL_NULL_STRING {
        return Some(&[]);
    }
    rest.get(..len as usize)
}
