//! Joint/bone rig core for 2D cut-out animation.
//!
//! A [`Rig`] is a graph of joints connected by rigid bones, with bitmaps
//! skinned onto bones. Joints are posed by direct placement or by IK dragging,
//! either FABRIK on a discovered chain ([`solve`]) or relaxation over the whole
//! rig ([`solve_global`]).
//!
//! This crate has no rendering or windowing code. A host UI calls into it with
//! plain synchronous calls per drag update.

#![forbid(unsafe_code)]

mod error;
mod geometry;
mod ids;
mod ik;
mod model;
mod rig;
mod skin;
mod version;

#[cfg(feature = "json")]
pub mod json;

pub use error::*;
pub use geometry::Bounds;
pub use ids::{AttachmentId, BoneId, JointId};
pub use ik::*;
pub use model::*;
pub use rig::*;
pub use skin::*;
pub use version::*;




#[cfg(all(test, feature = "json"))]
mod json_tests;
