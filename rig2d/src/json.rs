//! Flat, id-referenced transfer records for a [`Rig`] and their JSON form.

use crate::{
    AngleLimits, AttachmentId, Bone, BoneId, Color, Error, Joint, JointId, RIG_FORMAT_VERSION,
    Rig, SkinAttachment, SkinTransform, DEFAULT_BONE_THICKNESS,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub x: f32,
    pub y: f32,
}

impl From<Vec2> for PointRecord {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<PointRecord> for Vec2 {
    fn from(p: PointRecord) -> Self {
        Vec2::new(p.x, p.y)
    }
}

/// Missing channels fall back to white.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorRecord {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for ColorRecord {
    fn default() -> Self {
        Color::WHITE.into()
    }
}

impl From<Color> for ColorRecord {
    fn from(c: Color) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

impl From<ColorRecord> for Color {
    fn from(c: ColorRecord) -> Self {
        Color::new(c.r, c.g, c.b, c.a)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RigRecord {
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_joint_id: Option<String>,
    #[serde(default)]
    pub joints: Vec<JointRecord>,
    #[serde(default)]
    pub bones: Vec<BoneRecord>,
    #[serde(default)]
    pub attachments: Vec<AttachmentRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JointRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: PointRecord,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub is_fixed: bool,
    #[serde(default = "default_min_angle")]
    pub min_angle: f32,
    #[serde(default = "default_max_angle")]
    pub max_angle: f32,
    #[serde(default)]
    pub has_angle_constraints: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoneRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub start_joint_id: String,
    pub end_joint_id: String,
    #[serde(default = "default_thickness")]
    pub thickness: f32,
    #[serde(default)]
    pub color: ColorRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_length: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_id: Option<String>,
    #[serde(default = "default_one")]
    pub attachment_scale: f32,
    #[serde(default)]
    pub attachment_rotation: f32,
    #[serde(default)]
    pub draw_order: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_anchor")]
    pub anchor: PointRecord,
    /// Base64 of `width * height * 4` RGBA bytes.
    #[serde(default)]
    pub pixels: String,
}

fn current_version() -> u32 {
    RIG_FORMAT_VERSION
}

fn default_one() -> f32 {
    1.0
}

fn default_thickness() -> f32 {
    DEFAULT_BONE_THICKNESS
}

fn default_min_angle() -> f32 {
    AngleLimits::default().min
}

fn default_max_angle() -> f32 {
    AngleLimits::default().max
}

fn default_anchor() -> PointRecord {
    PointRecord { x: 0.5, y: 0.5 }
}

impl Rig {
    pub fn to_record(&self) -> RigRecord {
        RigRecord {
            version: RIG_FORMAT_VERSION,
            id: self.id.clone(),
            name: self.name.clone(),
            root_joint_id: self.root.map(|id| id.to_string()),
            joints: self.joints.iter().map(joint_record).collect(),
            bones: self.bones.iter().map(bone_record).collect(),
            attachments: self.attachments.iter().map(attachment_record).collect(),
        }
    }

    /// Rebuilds a rig from its record.
    ///
    /// Broken items are dropped with a warning instead of failing the whole
    /// load: bones naming a missing joint, self-loop bones, and attachments
    /// whose pixel data does not decode. A bone naming a missing attachment
    /// keeps its geometry and loses the attachment. Only a record from a newer
    /// format version is rejected outright.
    pub fn from_record(record: RigRecord) -> Result<Rig, Error> {
        if record.version > RIG_FORMAT_VERSION {
            return Err(Error::UnsupportedFormatVersion {
                found: record.version,
                supported: RIG_FORMAT_VERSION,
            });
        }

        let mut ids = IdMapper::new(&record);
        let mut rig = Rig::with_id(record.id, record.name);

        let mut joint_ids = HashMap::<String, JointId>::new();
        for joint in record.joints {
            let id = JointId(ids.resolve(&joint.id));
            if joint_ids.insert(joint.id.clone(), id).is_some() {
                log::warn!("duplicate joint id '{}'; later joint wins lookups", joint.id);
            }
            rig.push_joint(Joint {
                id,
                name: joint.name,
                position: sanitize_point(joint.position.into()),
                rotation: finite_or(joint.rotation, 0.0),
                fixed: joint.is_fixed,
                limits: AngleLimits {
                    min: finite_or(joint.min_angle, default_min_angle()),
                    max: finite_or(joint.max_angle, default_max_angle()),
                    enabled: joint.has_angle_constraints,
                },
                bones: BTreeSet::new(),
            });
        }

        let mut attachment_ids = HashMap::<String, AttachmentId>::new();
        for attachment in record.attachments {
            let record_id = attachment.id.clone();
            let name = attachment.name.clone();
            let id = AttachmentId(ids.resolve(&attachment.id));
            match attachment_from_record(id, attachment) {
                Ok(attachment) => {
                    attachment_ids.insert(record_id, id);
                    rig.push_attachment(attachment);
                }
                Err(err) => log::warn!("dropping attachment '{name}' ({record_id}): {err}"),
            }
        }

        for bone in record.bones {
            let (Some(&start), Some(&end)) = (
                joint_ids.get(&bone.start_joint_id),
                joint_ids.get(&bone.end_joint_id),
            ) else {
                log::warn!(
                    "dropping bone '{}' ({}): unknown joint reference {} -> {}",
                    bone.name,
                    bone.id,
                    bone.start_joint_id,
                    bone.end_joint_id
                );
                continue;
            };

            let attachment = match bone.attachment_id.as_deref() {
                None => None,
                Some(raw) => {
                    let found = attachment_ids.get(raw).copied();
                    if found.is_none() {
                        log::warn!(
                            "bone '{}' ({}) references unknown attachment {raw}; clearing it",
                            bone.name,
                            bone.id
                        );
                    }
                    found
                }
            };

            let rest_length = match bone.rest_length {
                Some(len) if len.is_finite() && len >= 0.0 => len,
                _ => rig.position(start)?.distance(rig.position(end)?),
            };

            let id = BoneId(ids.resolve(&bone.id));
            let name = bone.name.clone();
            let result = rig.push_bone(Bone {
                id,
                name: bone.name,
                start,
                end,
                rest_length,
                thickness: finite_or(bone.thickness, DEFAULT_BONE_THICKNESS),
                color: bone.color.into(),
                attachment,
                skin: SkinTransform {
                    scale: finite_or(bone.attachment_scale, 1.0),
                    rotation: finite_or(bone.attachment_rotation, 0.0),
                    draw_order: bone.draw_order,
                },
            });
            if let Err(err) = result {
                log::warn!("dropping bone '{name}' ({}): {err}", bone.id);
            }
        }

        rig.root = match record.root_joint_id.as_deref() {
            None => None,
            Some(raw) => {
                let root = joint_ids.get(raw).copied();
                if root.is_none() {
                    log::warn!("unknown root joint id '{raw}'; leaving root unset");
                }
                root
            }
        };

        Ok(rig)
    }

    pub fn to_json_string(&self) -> Result<String, Error> {
        serde_json::to_string(&self.to_record()).map_err(|e| Error::JsonWrite {
            message: e.to_string(),
        })
    }

    pub fn to_json_string_pretty(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(&self.to_record()).map_err(|e| Error::JsonWrite {
            message: e.to_string(),
        })
    }

    pub fn from_json_str(input: &str) -> Result<Rig, Error> {
        let record: RigRecord = serde_json::from_str(input).map_err(|e| Error::JsonParse {
            message: e.to_string(),
        })?;
        Self::from_record(record)
    }
}

fn joint_record(joint: &Joint) -> JointRecord {
    JointRecord {
        id: joint.id.to_string(),
        name: joint.name.clone(),
        position: joint.position.into(),
        rotation: joint.rotation,
        is_fixed: joint.fixed,
        min_angle: joint.limits.min,
        max_angle: joint.limits.max,
        has_angle_constraints: joint.limits.enabled,
    }
}

fn bone_record(bone: &Bone) -> BoneRecord {
    BoneRecord {
        id: bone.id.to_string(),
        name: bone.name.clone(),
        start_joint_id: bone.start.to_string(),
        end_joint_id: bone.end.to_string(),
        thickness: bone.thickness,
        color: bone.color.into(),
        rest_length: Some(bone.rest_length),
        attachment_id: bone.attachment.map(|id| id.to_string()),
        attachment_scale: bone.skin.scale,
        attachment_rotation: bone.skin.rotation,
        draw_order: bone.skin.draw_order,
    }
}

fn attachment_record(attachment: &SkinAttachment) -> AttachmentRecord {
    let mut bytes = Vec::with_capacity(attachment.pixels.len() * 4);
    for pixel in &attachment.pixels {
        bytes.extend_from_slice(&pixel.unwrap_or([0, 0, 0, 0]));
    }
    AttachmentRecord {
        id: attachment.id.to_string(),
        name: attachment.name.clone(),
        width: attachment.width,
        height: attachment.height,
        anchor: attachment.anchor.into(),
        pixels: BASE64.encode(bytes),
    }
}

fn attachment_from_record(
    id: AttachmentId,
    record: AttachmentRecord,
) -> Result<SkinAttachment, Error> {
    let bytes = BASE64
        .decode(record.pixels.trim())
        .map_err(|e| Error::InvalidValue {
            message: format!("pixel data is not base64: {e}"),
        })?;
    let expected = (record.width as usize)
        .checked_mul(record.height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| Error::InvalidValue {
            message: format!("bitmap {}x{} is too large", record.width, record.height),
        })?;
    if bytes.len() != expected {
        return Err(Error::InvalidValue {
            message: format!(
                "expected {expected} pixel bytes for {}x{}, got {}",
                record.width,
                record.height,
                bytes.len()
            ),
        });
    }

    let mut attachment = SkinAttachment::new(id, record.name, record.width, record.height);
    for (pixel, rgba) in attachment.pixels.iter_mut().zip(bytes.chunks_exact(4)) {
        if rgba[3] != 0 {
            *pixel = Some([rgba[0], rgba[1], rgba[2], rgba[3]]);
        }
    }
    attachment.set_anchor(record.anchor.into());
    Ok(attachment)
}

/// Maps record id strings to rig ids. Decimal ids are kept as-is when unique,
/// so a saved rig reloads with the same ids; anything else gets a fresh id.
/// `u32::MAX` is never kept so the rig's own counter has room above it.
struct IdMapper {
    claimed: BTreeSet<u32>,
    next: u32,
}

impl IdMapper {
    fn new(record: &RigRecord) -> Self {
        let max = record
            .joints
            .iter()
            .map(|j| j.id.as_str())
            .chain(record.bones.iter().map(|b| b.id.as_str()))
            .chain(record.attachments.iter().map(|a| a.id.as_str()))
            .filter_map(keepable)
            .max();
        Self {
            claimed: BTreeSet::new(),
            next: max.map_or(0, |m| m.saturating_add(1)),
        }
    }

    fn resolve(&mut self, raw: &str) -> u32 {
        if let Some(id) = keepable(raw) {
            if self.claimed.insert(id) {
                return id;
            }
        }
        while self.claimed.contains(&self.next) {
            self.next = self.next.wrapping_add(1);
        }
        let id = self.next;
        self.claimed.insert(id);
        self.next = self.next.wrapping_add(1);
        log::debug!("remapped record id '{raw}' to {id}");
        id
    }
}

fn keepable(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|&id| id != u32::MAX)
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

fn sanitize_point(p: Vec2) -> Vec2 {
    Vec2::new(finite_or(p.x, 0.0), finite_or(p.y, 0.0))
}
