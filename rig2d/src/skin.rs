use crate::geometry::{rotate, segment_angle};
use crate::{AttachmentId, BoneId, Bounds, Error, Rig, SkinAttachment, SkinTransform};
use glam::Vec2;

/// Where an attachment lands in world space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SkinPlacement {
    /// World position of the bitmap centre.
    pub position: Vec2,
    /// Bone angle plus the attachment's rotation offset, in radians.
    pub rotation: f32,
    /// World size of one bitmap pixel.
    pub pixel_size: f32,
    /// World footprint of the whole bitmap, before rotation.
    pub size: Vec2,
}

impl SkinPlacement {
    /// The four world-space corners, counter-clockwise from the bitmap's
    /// `(0, 0)` corner.
    pub fn corners(&self) -> [Vec2; 4] {
        let half = self.size * 0.5;
        [
            Vec2::new(-half.x, -half.y),
            Vec2::new(half.x, -half.y),
            Vec2::new(half.x, half.y),
            Vec2::new(-half.x, half.y),
        ]
        .map(|corner| self.position + rotate(corner, self.rotation))
    }

    pub fn bounds(&self) -> Bounds {
        let [a, b, c, d] = self.corners();
        let mut out = Bounds::from_point(a);
        out.include(b);
        out.include(c);
        out.include(d);
        out
    }
}

/// Places `attachment` on the bone running from `start` to `end`.
///
/// The anchor point of the bitmap sits on the bone midpoint: the anchor's
/// offset from the bitmap centre is rotated with the bone and subtracted from
/// the midpoint.
pub fn placement(
    start: Vec2,
    end: Vec2,
    attachment: &SkinAttachment,
    transform: &SkinTransform,
) -> SkinPlacement {
    let midpoint = (start + end) * 0.5;
    let rotation = segment_angle(start, end) + transform.rotation;
    let size = Vec2::new(attachment.width() as f32, attachment.height() as f32) * transform.scale;
    let anchor_offset = (attachment.anchor() - Vec2::splat(0.5)) * size;

    SkinPlacement {
        position: midpoint - rotate(anchor_offset, rotation),
        rotation,
        pixel_size: transform.scale,
        size,
    }
}

/// One attachment ready to draw.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SkinDraw {
    pub bone: BoneId,
    pub attachment: AttachmentId,
    pub draw_order: i32,
    pub placement: SkinPlacement,
}

impl Rig {
    /// Placement of the bone's attachment, or `None` when it has none.
    pub fn skin_placement(&self, bone: BoneId) -> Result<Option<SkinPlacement>, Error> {
        let bone = self.bone(bone)?;
        let Some(attachment) = bone.attachment else {
            return Ok(None);
        };
        let attachment = self.attachment(attachment)?;
        Ok(Some(placement(
            self.position(bone.start)?,
            self.position(bone.end)?,
            attachment,
            &bone.skin,
        )))
    }

    /// Every skinned bone sorted back to front by draw order; equal orders keep
    /// bone order.
    pub fn skin_draw_list(&self) -> Vec<SkinDraw> {
        let mut out = Vec::new();
        for bone in &self.bones {
            let Some(attachment) = bone.attachment else {
                continue;
            };
            match self.skin_placement(bone.id) {
                Ok(Some(placement)) => out.push(SkinDraw {
                    bone: bone.id,
                    attachment,
                    draw_order: bone.skin.draw_order,
                    placement,
                }),
                Ok(None) => {}
                Err(err) => log::warn!("skipping skin on bone '{}': {err}", bone.name),
            }
        }
        out.sort_by_key(|draw| draw.draw_order);
        out
    }

    /// World bounding box of all attachments, or `None` when nothing is
    /// skinned.
    pub fn skin_bounds(&self) -> Option<Bounds> {
        self.skin_draw_list()
            .iter()
            .map(|draw| draw.placement.bounds())
            .reduce(|a, b| a.union(&b))
    }
}
