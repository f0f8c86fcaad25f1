use crate::{BoneId, Error, JointId, Rig};
use std::collections::BTreeSet;

/// Ordered bones walked outward from a joint.
pub type BonePath = Vec<BoneId>;

/// Walks the bone graph outward from `from` and returns every branch.
///
/// The walk is depth-first over bones. A branch closes when it reaches a fixed
/// joint or a joint with no unused bones left; each closed branch is one path.
/// Used bones are tracked per branch, so sibling branches may share joints but
/// no path contains the same bone twice. Incident bones are visited in
/// ascending id order, which makes the result deterministic.
pub fn discover_chains(rig: &Rig, from: JointId) -> Result<Vec<BonePath>, Error> {
    rig.joint(from)?;
    let mut out = Vec::new();
    let mut path = Vec::new();
    walk(rig, from, &mut path, &mut out)?;
    log::debug!("discovered {} chain(s) from joint {from}", out.len());
    Ok(out)
}

fn walk(
    rig: &Rig,
    joint: JointId,
    path: &mut BonePath,
    out: &mut Vec<BonePath>,
) -> Result<(), Error> {
    for &bone in rig.incident_bones(joint)? {
        if path.contains(&bone) {
            continue;
        }
        let next = rig.opposite(bone, joint)?;
        path.push(bone);

        let next_joint = rig.joint(next)?;
        let dead_end = next_joint.bones.iter().all(|b| path.contains(b));
        if next_joint.fixed || dead_end {
            out.push(path.clone());
        } else {
            walk(rig, next, path, out)?;
        }

        path.pop();
    }
    Ok(())
}

/// Joints visited by `path` when walked from `from`, starting with `from`.
pub fn path_joints(rig: &Rig, from: JointId, path: &[BoneId]) -> Result<Vec<JointId>, Error> {
    rig.joint(from)?;
    let mut joints = Vec::with_capacity(path.len() + 1);
    joints.push(from);
    let mut current = from;
    for &bone in path {
        current = rig
            .bone(bone)?
            .opposite(current)
            .ok_or(Error::DisconnectedPath { from })?;
        joints.push(current);
    }
    Ok(joints)
}

/// The chain for dragging `from` along `path`: anchor first, dragged joint
/// last. This is the joint order the FABRIK solver expects.
///
/// A path that loops back onto one of its own joints is cut before the bone
/// closing the loop, so every joint appears once.
pub fn anchored_chain(rig: &Rig, from: JointId, path: &[BoneId]) -> Result<Vec<JointId>, Error> {
    let mut joints = path_joints(rig, from, path)?;
    if let Some(repeat) = (1..joints.len()).find(|&i| joints[..i].contains(&joints[i])) {
        log::debug!(
            "path from joint {from} revisits joint {}; chain cut to {repeat} joint(s)",
            joints[repeat]
        );
        joints.truncate(repeat);
    }
    joints.reverse();
    Ok(joints)
}

/// Every bone appearing in any of `paths`, for highlighting.
pub fn affected_bones(paths: &[BonePath]) -> BTreeSet<BoneId> {
    paths.iter().flatten().copied().collect()
}
