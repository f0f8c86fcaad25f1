use crate::{AttachmentId, BoneId, JointId};
use glam::Vec2;
use std::collections::BTreeSet;

/// Angular limits for the segment ending at a joint, in radians.
///
/// The limited angle is the world angle of the vector from the joint's
/// predecessor in an IK chain to the joint itself.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AngleLimits {
    pub min: f32,
    pub max: f32,
    pub enabled: bool,
}

impl AngleLimits {
    pub fn new(min: f32, max: f32) -> Self {
        Self {
            min,
            max,
            enabled: true,
        }
    }
}

impl Default for AngleLimits {
    fn default() -> Self {
        Self {
            min: -std::f32::consts::PI,
            max: std::f32::consts::PI,
            enabled: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Joint {
    pub(crate) id: JointId,
    pub name: String,
    pub position: Vec2,
    /// Local rotation in radians. Solvers do not touch it.
    pub rotation: f32,
    /// Fixed joints are pins: no solver moves them.
    pub fixed: bool,
    pub limits: AngleLimits,
    pub(crate) bones: BTreeSet<BoneId>,
}

impl Joint {
    pub fn id(&self) -> JointId {
        self.id
    }

    /// Bones touching this joint, in ascending id order.
    pub fn bones(&self) -> &BTreeSet<BoneId> {
        &self.bones
    }

    pub fn has_active_limits(&self) -> bool {
        self.limits.enabled
    }
}

/// Normalized RGBA color.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// How an attachment sits on its bone.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SkinTransform {
    /// World units per attachment pixel.
    pub scale: f32,
    /// Extra rotation in radians, added to the bone angle.
    pub rotation: f32,
    pub draw_order: i32,
}

impl Default for SkinTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotation: 0.0,
            draw_order: 0,
        }
    }
}

pub const DEFAULT_BONE_THICKNESS: f32 = 4.0;

#[derive(Clone, Debug)]
pub struct Bone {
    pub(crate) id: BoneId,
    pub name: String,
    pub(crate) start: JointId,
    pub(crate) end: JointId,
    pub(crate) rest_length: f32,
    pub thickness: f32,
    pub color: Color,
    pub(crate) attachment: Option<AttachmentId>,
    pub skin: SkinTransform,
}

impl Bone {
    pub fn id(&self) -> BoneId {
        self.id
    }

    pub fn start(&self) -> JointId {
        self.start
    }

    pub fn end(&self) -> JointId {
        self.end
    }

    /// Length every solver converges toward. Independent of the live distance
    /// between the endpoints.
    pub fn rest_length(&self) -> f32 {
        self.rest_length
    }

    pub fn attachment(&self) -> Option<AttachmentId> {
        self.attachment
    }

    pub fn touches(&self, joint: JointId) -> bool {
        self.start == joint || self.end == joint
    }

    /// The endpoint across from `joint`, if `joint` is one of the endpoints.
    pub fn opposite(&self, joint: JointId) -> Option<JointId> {
        if self.start == joint {
            Some(self.end)
        } else if self.end == joint {
            Some(self.start)
        } else {
            None
        }
    }

    pub fn connects(&self, a: JointId, b: JointId) -> bool {
        (self.start == a && self.end == b) || (self.start == b && self.end == a)
    }
}

/// RGBA pixel; `None` is fully transparent.
pub type Pixel = Option<[u8; 4]>;

/// A bitmap bound to a bone.
#[derive(Clone, Debug, PartialEq)]
pub struct SkinAttachment {
    pub(crate) id: AttachmentId,
    pub name: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
    /// Row-major, `width * height` entries.
    pub(crate) pixels: Vec<Pixel>,
    pub(crate) anchor: Vec2,
}

impl SkinAttachment {
    pub(crate) fn new(id: AttachmentId, name: String, width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            id,
            name,
            width,
            height,
            pixels: vec![None; len],
            anchor: Vec2::splat(0.5),
        }
    }

    pub fn id(&self) -> AttachmentId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Normalized point of the bitmap that sits on the bone midpoint.
    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    pub fn set_anchor(&mut self, anchor: Vec2) {
        let anchor = if anchor.is_finite() {
            anchor
        } else {
            Vec2::splat(0.5)
        };
        self.anchor = anchor.clamp(Vec2::ZERO, Vec2::ONE);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Pixel {
        self.index(x, y).and_then(|i| self.pixels[i])
    }

    /// Returns `false` when `(x, y)` lies outside the bitmap.
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: Pixel) -> bool {
        let Some(i) = self.index(x, y) else {
            return false;
        };
        // Alpha 0 is stored as transparent so it survives a round trip.
        self.pixels[i] = pixel.filter(|p| p[3] != 0);
        true
    }

    pub fn opaque_pixel_count(&self) -> usize {
        self.pixels.iter().filter(|p| p.is_some()).count()
    }

    pub fn clear(&mut self) {
        self.pixels.fill(None);
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }
}
