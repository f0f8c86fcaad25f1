use crate::{AttachmentId, BoneId, JointId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown joint: {id}")]
    UnknownJoint { id: JointId },

    #[error("unknown bone: {id}")]
    UnknownBone { id: BoneId },

    #[error("unknown attachment: {id}")]
    UnknownAttachment { id: AttachmentId },

    #[error("bone '{name}' would connect joint {joint} to itself")]
    DegenerateBone { name: String, joint: JointId },

    #[error("IK chain needs at least two joints, got {len}")]
    ChainTooShort { len: usize },

    #[error("path does not start at joint {from} or is not connected")]
    DisconnectedPath { from: JointId },

    #[error("invalid value: {message}")]
    InvalidValue { message: String },

    #[cfg(feature = "json")]
    #[error("failed to parse rig JSON: {message}")]
    JsonParse { message: String },

    #[cfg(feature = "json")]
    #[error("failed to write rig JSON: {message}")]
    JsonWrite { message: String },

    #[cfg(feature = "json")]
    #[error("unsupported rig format version {found} (newest supported is {supported})")]
    UnsupportedFormatVersion { found: u32, supported: u32 },
}
