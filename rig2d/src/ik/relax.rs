use crate::geometry::EPSILON;
use crate::{Error, JointId, Rig};
use glam::Vec2;

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(default, rename_all = "camelCase"))]
pub struct RelaxConfig {
    pub max_iterations: u32,
    /// Length errors at or below this are left alone.
    pub tolerance: f32,
}

impl Default for RelaxConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            tolerance: 0.1,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct RelaxReport {
    /// Passes over the bone list that were run.
    pub iterations: u32,
    /// A pass finished without moving any joint.
    pub converged: bool,
    /// Bones with both endpoints fixed that were out of tolerance in the last
    /// pass.
    pub over_constrained: usize,
}

/// Moves `moved` to `target`, then relaxes every bone in the rig toward its
/// rest length.
///
/// Each pass walks all bones. An out-of-tolerance bone with two free ends has
/// its error split between them; with one free end that end takes the whole
/// correction; with none it is skipped. The result is approximate: dense or
/// cyclic rigs may keep some error after `max_iterations` passes.
///
/// Dragging a fixed joint is a no-op.
pub fn solve_global(
    rig: &mut Rig,
    moved: JointId,
    target: Vec2,
    config: &RelaxConfig,
) -> Result<RelaxReport, Error> {
    if !target.is_finite() {
        return Err(Error::InvalidValue {
            message: format!("non-finite drag target {target}"),
        });
    }
    let joint = rig.joint_mut(moved)?;
    if joint.fixed {
        log::warn!("joint {moved} is fixed; ignoring drag");
        return Ok(RelaxReport {
            converged: true,
            ..RelaxReport::default()
        });
    }
    joint.position = target;

    let mut report = RelaxReport::default();
    while report.iterations < config.max_iterations {
        report.iterations += 1;
        let (moved_any, over_constrained) = relax_pass(rig, config.tolerance)?;
        report.over_constrained = over_constrained;
        if !moved_any {
            report.converged = true;
            break;
        }
    }
    if report.over_constrained > 0 {
        log::debug!(
            "{} bone(s) between fixed joints left unresolved",
            report.over_constrained
        );
    }
    Ok(report)
}

fn relax_pass(rig: &mut Rig, tolerance: f32) -> Result<(bool, usize), Error> {
    let mut moved_any = false;
    let mut over_constrained = 0;

    for i in 0..rig.bones.len() {
        let (start, end, rest) = {
            let bone = &rig.bones[i];
            (bone.start, bone.end, bone.rest_length)
        };
        let (a, a_fixed) = {
            let j = rig.joint(start)?;
            (j.position, j.fixed)
        };
        let (b, b_fixed) = {
            let j = rig.joint(end)?;
            (j.position, j.fixed)
        };

        let delta = b - a;
        let dist = delta.length();
        let error = dist - rest;
        if error.abs() <= tolerance {
            continue;
        }
        if dist <= EPSILON {
            // No axis to correct along.
            continue;
        }
        let axis = delta / dist;

        match (a_fixed, b_fixed) {
            (false, false) => {
                let half = axis * (error * 0.5);
                rig.joint_mut(start)?.position = a + half;
                rig.joint_mut(end)?.position = b - half;
            }
            (false, true) => rig.joint_mut(start)?.position = a + axis * error,
            (true, false) => rig.joint_mut(end)?.position = b - axis * error,
            (true, true) => {
                over_constrained += 1;
                continue;
            }
        }
        moved_any = true;
    }

    Ok((moved_any, over_constrained))
}
