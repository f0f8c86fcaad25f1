use crate::ids::IdAllocator;
use crate::{
    AngleLimits, AttachmentId, Bone, BoneId, Color, DEFAULT_BONE_THICKNESS, Error, Joint,
    JointId, SkinAttachment, SkinTransform,
};
use glam::Vec2;
use std::collections::{BTreeSet, HashMap};

/// A graph of joints connected by rigid bones, plus the bitmaps skinned onto
/// those bones.
///
/// The rig owns everything. Bones refer to joints and attachments by id, and
/// every joint keeps the set of bones touching it so adjacency queries do not
/// scan the bone list.
#[derive(Clone, Debug)]
pub struct Rig {
    pub id: String,
    pub name: String,
    pub(crate) root: Option<JointId>,
    pub(crate) joints: Vec<Joint>,
    pub(crate) bones: Vec<Bone>,
    pub(crate) attachments: Vec<SkinAttachment>,
    joint_index: HashMap<JointId, usize>,
    bone_index: HashMap<BoneId, usize>,
    attachment_index: HashMap<AttachmentId, usize>,
    ids: IdAllocator,
}

impl Default for Rig {
    fn default() -> Self {
        Self::new("rig")
    }
}

impl Rig {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(String::new(), name)
    }

    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            root: None,
            joints: Vec::new(),
            bones: Vec::new(),
            attachments: Vec::new(),
            joint_index: HashMap::new(),
            bone_index: HashMap::new(),
            attachment_index: HashMap::new(),
            ids: IdAllocator::default(),
        }
    }

    pub fn root(&self) -> Option<JointId> {
        self.root
    }

    pub fn set_root(&mut self, root: Option<JointId>) -> Result<(), Error> {
        if let Some(id) = root {
            self.joint(id)?;
        }
        self.root = root;
        Ok(())
    }

    /// Joints in insertion order.
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Bones in insertion order.
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn attachments(&self) -> &[SkinAttachment] {
        &self.attachments
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn joint(&self, id: JointId) -> Result<&Joint, Error> {
        self.joint_index
            .get(&id)
            .map(|&i| &self.joints[i])
            .ok_or(Error::UnknownJoint { id })
    }

    pub fn joint_mut(&mut self, id: JointId) -> Result<&mut Joint, Error> {
        match self.joint_index.get(&id) {
            Some(&i) => Ok(&mut self.joints[i]),
            None => Err(Error::UnknownJoint { id }),
        }
    }

    pub fn bone(&self, id: BoneId) -> Result<&Bone, Error> {
        self.bone_index
            .get(&id)
            .map(|&i| &self.bones[i])
            .ok_or(Error::UnknownBone { id })
    }

    pub fn bone_mut(&mut self, id: BoneId) -> Result<&mut Bone, Error> {
        match self.bone_index.get(&id) {
            Some(&i) => Ok(&mut self.bones[i]),
            None => Err(Error::UnknownBone { id }),
        }
    }

    pub fn attachment(&self, id: AttachmentId) -> Result<&SkinAttachment, Error> {
        self.attachment_index
            .get(&id)
            .map(|&i| &self.attachments[i])
            .ok_or(Error::UnknownAttachment { id })
    }

    pub fn attachment_mut(&mut self, id: AttachmentId) -> Result<&mut SkinAttachment, Error> {
        match self.attachment_index.get(&id) {
            Some(&i) => Ok(&mut self.attachments[i]),
            None => Err(Error::UnknownAttachment { id }),
        }
    }

    pub fn joint_by_name(&self, name: &str) -> Option<&Joint> {
        self.joints.iter().find(|j| j.name == name)
    }

    pub fn bone_by_name(&self, name: &str) -> Option<&Bone> {
        self.bones.iter().find(|b| b.name == name)
    }

    pub(crate) fn position(&self, id: JointId) -> Result<Vec2, Error> {
        self.joint(id).map(|j| j.position)
    }

    pub(crate) fn is_fixed(&self, id: JointId) -> Result<bool, Error> {
        self.joint(id).map(|j| j.fixed)
    }

    // --- joints ---

    /// Adds a free joint. The first joint of an empty rig becomes the root.
    pub fn add_joint(&mut self, name: impl Into<String>, position: Vec2) -> JointId {
        let id = JointId(self.ids.next_raw());
        self.push_joint(Joint {
            id,
            name: name.into(),
            position,
            rotation: 0.0,
            fixed: false,
            limits: AngleLimits::default(),
            bones: BTreeSet::new(),
        });
        id
    }

    /// Inserts a joint carrying its own id; the codec uses this to keep
    /// persisted ids stable. The caller guarantees the id is unused.
    pub(crate) fn push_joint(&mut self, mut joint: Joint) {
        joint.bones.clear();
        self.ids.reserve(joint.id.0);
        if self.root.is_none() && self.joints.is_empty() {
            self.root = Some(joint.id);
        }
        self.joint_index.insert(joint.id, self.joints.len());
        self.joints.push(joint);
    }

    /// Removes a joint and every bone touching it.
    pub fn remove_joint(&mut self, id: JointId) -> Result<Joint, Error> {
        let incident: Vec<BoneId> = self.joint(id)?.bones.iter().copied().collect();
        for bone in incident {
            self.remove_bone(bone)?;
        }

        let index = self
            .joint_index
            .remove(&id)
            .ok_or(Error::UnknownJoint { id })?;
        let joint = self.joints.remove(index);
        reindex(&mut self.joint_index, &self.joints, |j| j.id);

        if self.root == Some(id) {
            self.root = self.joints.first().map(|j| j.id);
        }
        log::debug!("removed joint {} ('{}')", id, joint.name);
        Ok(joint)
    }

    /// Direct placement. Fixed joints can be placed too: pins stop solvers,
    /// not the editor.
    pub fn set_joint_position(&mut self, id: JointId, position: Vec2) -> Result<(), Error> {
        if !position.is_finite() {
            return Err(Error::InvalidValue {
                message: format!("non-finite position for joint {id}"),
            });
        }
        self.joint_mut(id)?.position = position;
        Ok(())
    }

    pub fn set_fixed(&mut self, id: JointId, fixed: bool) -> Result<(), Error> {
        self.joint_mut(id)?.fixed = fixed;
        Ok(())
    }

    pub fn set_angle_limits(&mut self, id: JointId, limits: AngleLimits) -> Result<(), Error> {
        if !(limits.min.is_finite() && limits.max.is_finite()) {
            return Err(Error::InvalidValue {
                message: format!("non-finite angle limits for joint {id}"),
            });
        }
        self.joint_mut(id)?.limits = limits;
        Ok(())
    }

    // --- bones ---

    /// Connects two joints. The rest length is the current distance between
    /// them.
    pub fn add_bone(
        &mut self,
        name: impl Into<String>,
        start: JointId,
        end: JointId,
    ) -> Result<BoneId, Error> {
        let name = name.into();
        let a = self.position(start)?;
        let b = self.position(end)?;
        if start == end {
            return Err(Error::DegenerateBone { name, joint: start });
        }
        let id = BoneId(self.ids.next_raw());
        self.push_bone(Bone {
            id,
            name,
            start,
            end,
            rest_length: a.distance(b),
            thickness: DEFAULT_BONE_THICKNESS,
            color: Color::WHITE,
            attachment: None,
            skin: SkinTransform::default(),
        })?;
        Ok(id)
    }

    /// Inserts a fully formed bone, validating its references. Used by the
    /// codec; the caller guarantees the id is unused.
    pub(crate) fn push_bone(&mut self, bone: Bone) -> Result<(), Error> {
        self.joint(bone.start)?;
        self.joint(bone.end)?;
        if bone.start == bone.end {
            return Err(Error::DegenerateBone {
                name: bone.name,
                joint: bone.start,
            });
        }
        if let Some(attachment) = bone.attachment {
            self.attachment(attachment)?;
        }
        self.ids.reserve(bone.id.0);
        let (id, start, end) = (bone.id, bone.start, bone.end);
        self.bone_index.insert(id, self.bones.len());
        self.bones.push(bone);
        self.joint_mut(start)?.bones.insert(id);
        self.joint_mut(end)?.bones.insert(id);
        Ok(())
    }

    pub fn remove_bone(&mut self, id: BoneId) -> Result<Bone, Error> {
        let index = self
            .bone_index
            .remove(&id)
            .ok_or(Error::UnknownBone { id })?;
        let bone = self.bones.remove(index);
        reindex(&mut self.bone_index, &self.bones, |b| b.id);

        for joint in [bone.start, bone.end] {
            if let Ok(joint) = self.joint_mut(joint) {
                joint.bones.remove(&id);
            }
        }
        Ok(bone)
    }

    /// Sets the rest length explicitly. Negative or non-finite lengths are
    /// rejected.
    pub fn set_rest_length(&mut self, id: BoneId, length: f32) -> Result<(), Error> {
        if !length.is_finite() || length < 0.0 {
            return Err(Error::InvalidValue {
                message: format!("invalid rest length {length} for bone {id}"),
            });
        }
        self.bone_mut(id)?.rest_length = length;
        Ok(())
    }

    /// Bakes the current pose: every bone's rest length becomes its live
    /// distance. Called when leaving free placement for IK editing.
    pub fn bake_rest_lengths(&mut self) {
        for i in 0..self.bones.len() {
            let (start, end) = (self.bones[i].start, self.bones[i].end);
            if let (Ok(a), Ok(b)) = (self.position(start), self.position(end)) {
                self.bones[i].rest_length = a.distance(b);
            }
        }
    }

    /// Current Euclidean distance between a bone's endpoints.
    pub fn live_length(&self, id: BoneId) -> Result<f32, Error> {
        let bone = self.bone(id)?;
        Ok(self.position(bone.start)?.distance(self.position(bone.end)?))
    }

    /// Signed difference between live distance and rest length.
    pub fn length_error(&self, id: BoneId) -> Result<f32, Error> {
        Ok(self.live_length(id)? - self.bone(id)?.rest_length)
    }

    // --- adjacency ---

    pub fn incident_bones(&self, joint: JointId) -> Result<&BTreeSet<BoneId>, Error> {
        self.joint(joint).map(|j| &j.bones)
    }

    /// The joint across `bone` from `joint`.
    pub fn opposite(&self, bone: BoneId, joint: JointId) -> Result<JointId, Error> {
        self.bone(bone)?
            .opposite(joint)
            .ok_or(Error::UnknownJoint { id: joint })
    }

    /// Joints sharing a bone with `joint`, in bone id order.
    pub fn neighbors(&self, joint: JointId) -> Result<Vec<JointId>, Error> {
        let mut out = Vec::new();
        for &bone in &self.joint(joint)?.bones {
            if let Some(other) = self.bone(bone)?.opposite(joint) {
                out.push(other);
            }
        }
        Ok(out)
    }

    /// First bone (lowest id) connecting `a` and `b`, in either direction.
    pub fn bone_between(&self, a: JointId, b: JointId) -> Option<BoneId> {
        let joint = self.joint(a).ok()?;
        joint.bones.iter().copied().find(|&id| {
            self.bone(id)
                .map(|bone| bone.connects(a, b))
                .unwrap_or(false)
        })
    }

    // --- attachments ---

    pub fn add_attachment(
        &mut self,
        name: impl Into<String>,
        width: u32,
        height: u32,
    ) -> AttachmentId {
        let id = AttachmentId(self.ids.next_raw());
        self.push_attachment(SkinAttachment::new(id, name.into(), width, height));
        id
    }

    /// Adds a prebuilt attachment, for example one cloned from another rig.
    /// It keeps its id unless this rig already used that id.
    pub fn insert_attachment(&mut self, mut attachment: SkinAttachment) -> AttachmentId {
        if self.ids.is_used(attachment.id.0) {
            let id = AttachmentId(self.ids.next_raw());
            log::debug!("attachment id {} taken; inserting as {id}", attachment.id);
            attachment.id = id;
        }
        let id = attachment.id;
        self.push_attachment(attachment);
        id
    }

    pub(crate) fn push_attachment(&mut self, attachment: SkinAttachment) {
        self.ids.reserve(attachment.id.0);
        self.attachment_index
            .insert(attachment.id, self.attachments.len());
        self.attachments.push(attachment);
    }

    /// Removes an attachment and clears every bone reference to it.
    pub fn remove_attachment(&mut self, id: AttachmentId) -> Result<SkinAttachment, Error> {
        let index = self
            .attachment_index
            .remove(&id)
            .ok_or(Error::UnknownAttachment { id })?;
        let attachment = self.attachments.remove(index);
        reindex(&mut self.attachment_index, &self.attachments, |a| a.id);

        for bone in &mut self.bones {
            if bone.attachment == Some(id) {
                bone.attachment = None;
            }
        }
        Ok(attachment)
    }

    pub fn attach(&mut self, bone: BoneId, attachment: AttachmentId) -> Result<(), Error> {
        self.attachment(attachment)?;
        self.bone_mut(bone)?.attachment = Some(attachment);
        Ok(())
    }

    pub fn detach(&mut self, bone: BoneId) -> Result<Option<AttachmentId>, Error> {
        Ok(self.bone_mut(bone)?.attachment.take())
    }
}

fn reindex<K, T>(index: &mut HashMap<K, usize>, items: &[T], key: impl Fn(&T) -> K)
where
    K: std::hash::Hash + Eq,
{
    index.clear();
    for (i, item) in items.iter().enumerate() {
        index.insert(key(item), i);
    }
}
