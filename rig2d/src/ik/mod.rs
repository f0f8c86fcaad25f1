//! Inverse kinematics.
//!
//! Two independent strategies over the same [`Rig`](crate::Rig): FABRIK,
//! scoped to one joint chain, and global relaxation over every bone.
//! [`drag_joint`] picks between them for interactive dragging.

mod drag;
mod fabrik;
mod relax;

pub use drag::*;
pub use fabrik::*;
pub use relax::*;

#[cfg(test)]
mod fabrik_tests;
