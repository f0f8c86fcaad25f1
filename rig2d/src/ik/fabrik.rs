use crate::geometry::{EPSILON, clamp_angle, direction, segment_angle};
use crate::{AngleLimits, Error, JointId, Rig};
use glam::Vec2;
use std::collections::HashSet;

/// Segments further than this from their length are snapped in the final pass.
const LENGTH_EPSILON: f32 = 1.0e-4;

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(default, rename_all = "camelCase"))]
pub struct FabrikConfig {
    pub iterations: u32,
    /// Distance from the tip to the target that counts as reached.
    pub tolerance: f32,
}

impl Default for FabrikConfig {
    fn default() -> Self {
        Self {
            iterations: 20,
            tolerance: 0.01,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FabrikStatus {
    /// The tip ended within tolerance of the target.
    Converged,
    /// The iteration cap was hit first; lengths are still enforced.
    IterationLimit,
    /// The target is beyond the chain's reach; nothing moved.
    Unreachable,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FabrikReport {
    pub status: FabrikStatus,
    pub iterations: u32,
    /// Distance from the chain tip to the target after solving.
    pub tip_distance: f32,
}

struct ChainJoint {
    id: JointId,
    fixed: bool,
    limits: AngleLimits,
}

/// Solves `chain` toward `target` with forward and backward reaching IK.
///
/// `chain[0]` is the anchor side and the last joint is the end effector.
/// Segment lengths come from the bone joining each consecutive pair; a pair
/// with no bone falls back to its live distance. Fixed joints never move, and
/// a joint may appear in `chain` only once.
///
/// If the target is out of reach the chain is left exactly as it was rather
/// than stretched toward the target. Otherwise every segment ends at its
/// length, whatever the angular limits did to it.
pub fn solve(
    rig: &mut Rig,
    chain: &[JointId],
    target: Vec2,
    config: &FabrikConfig,
) -> Result<FabrikReport, Error> {
    if chain.len() < 2 {
        return Err(Error::ChainTooShort { len: chain.len() });
    }
    let mut seen = HashSet::with_capacity(chain.len());
    if let Some(&twice) = chain.iter().find(|&&id| !seen.insert(id)) {
        return Err(Error::InvalidValue {
            message: format!("joint {twice} appears twice in IK chain"),
        });
    }
    if !target.is_finite() {
        return Err(Error::InvalidValue {
            message: format!("non-finite IK target {target}"),
        });
    }

    let mut joints = Vec::with_capacity(chain.len());
    let mut snapshot = Vec::with_capacity(chain.len());
    for &id in chain {
        let joint = rig.joint(id)?;
        joints.push(ChainJoint {
            id,
            fixed: joint.fixed,
            limits: joint.limits,
        });
        snapshot.push(joint.position);
    }
    let lengths = segment_lengths(rig, chain, &snapshot);

    let reach: f32 = lengths.iter().sum();
    if snapshot[0].distance(target) > reach {
        log::debug!(
            "IK target {target} out of reach ({:.3} > {reach:.3}), chain left in place",
            snapshot[0].distance(target)
        );
        write_back(rig, &joints, &snapshot)?;
        return Ok(FabrikReport {
            status: FabrikStatus::Unreachable,
            iterations: 0,
            tip_distance: snapshot[snapshot.len() - 1].distance(target),
        });
    }

    let mut positions = snapshot.clone();
    let last = positions.len() - 1;
    let mut iterations = 0;
    let mut converged = false;
    while iterations < config.iterations {
        iterations += 1;
        if !joints[last].fixed {
            positions[last] = target;
        }
        reach_from_tip(&mut positions, &joints, &snapshot, &lengths);
        reach_from_root(&mut positions, &joints, &snapshot, &lengths);
        if positions[last].distance(target) <= config.tolerance {
            converged = true;
            break;
        }
    }

    // One more pass without moving the tip, for drift left by the cap.
    reach_from_tip(&mut positions, &joints, &snapshot, &lengths);
    reach_from_root(&mut positions, &joints, &snapshot, &lengths);

    apply_angle_limits(&mut positions, &joints);
    enforce_lengths(&mut positions, &joints, &lengths);

    write_back(rig, &joints, &positions)?;
    Ok(FabrikReport {
        status: if converged {
            FabrikStatus::Converged
        } else {
            FabrikStatus::IterationLimit
        },
        iterations,
        tip_distance: positions[last].distance(target),
    })
}

fn segment_lengths(rig: &Rig, chain: &[JointId], positions: &[Vec2]) -> Vec<f32> {
    chain
        .windows(2)
        .zip(positions.windows(2))
        .map(|(ids, pos)| {
            let bone = rig
                .bone_between(ids[0], ids[1])
                .and_then(|bone| rig.bone(bone).ok());
            match bone {
                Some(bone) => bone.rest_length(),
                None => {
                    let live = pos[0].distance(pos[1]);
                    log::warn!(
                        "no bone between joints {} and {}; using live distance {live:.3}",
                        ids[0],
                        ids[1]
                    );
                    live
                }
            }
        })
        .collect()
}

/// Tip to root: each joint is placed at segment length from its successor.
fn reach_from_tip(
    positions: &mut [Vec2],
    joints: &[ChainJoint],
    snapshot: &[Vec2],
    lengths: &[f32],
) {
    for i in (0..positions.len() - 1).rev() {
        if joints[i].fixed {
            positions[i] = snapshot[i];
            continue;
        }
        let dir = direction(positions[i + 1], positions[i]);
        positions[i] = positions[i + 1] + dir * lengths[i];
    }
}

/// Root to tip: each joint is placed at segment length from its predecessor.
fn reach_from_root(
    positions: &mut [Vec2],
    joints: &[ChainJoint],
    snapshot: &[Vec2],
    lengths: &[f32],
) {
    if joints[0].fixed {
        positions[0] = snapshot[0];
    }
    for i in 1..positions.len() {
        if joints[i].fixed {
            positions[i] = snapshot[i];
            continue;
        }
        let dir = direction(positions[i - 1], positions[i]);
        positions[i] = positions[i - 1] + dir * lengths[i - 1];
    }
}

fn apply_angle_limits(positions: &mut [Vec2], joints: &[ChainJoint]) {
    for i in 1..positions.len() {
        let joint = &joints[i];
        if joint.fixed || !joint.limits.enabled {
            continue;
        }
        let prev = positions[i - 1];
        let angle = segment_angle(prev, positions[i]);
        let clamped = clamp_angle(angle, joint.limits.min, joint.limits.max);
        if (clamped - angle).abs() > EPSILON {
            let dist = prev.distance(positions[i]);
            positions[i] = prev + Vec2::from_angle(clamped) * dist;
        }
    }
}

fn enforce_lengths(positions: &mut [Vec2], joints: &[ChainJoint], lengths: &[f32]) {
    for i in 1..positions.len() {
        if joints[i].fixed {
            continue;
        }
        let prev = positions[i - 1];
        if (prev.distance(positions[i]) - lengths[i - 1]).abs() > LENGTH_EPSILON {
            positions[i] = prev + direction(prev, positions[i]) * lengths[i - 1];
        }
    }
}

fn write_back(rig: &mut Rig, joints: &[ChainJoint], positions: &[Vec2]) -> Result<(), Error> {
    for (joint, &position) in joints.iter().zip(positions) {
        if joint.fixed {
            continue;
        }
        rig.joint_mut(joint.id)?.position = position;
    }
    Ok(())
}
