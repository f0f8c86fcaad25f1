use crate::{
    BonePath, Error, FabrikConfig, FabrikReport, JointId, RelaxConfig, RelaxReport, Rig,
    anchored_chain, discover_chains, solve, solve_global,
};
use glam::Vec2;

/// Which solver a drag goes through.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "camelCase"))]
pub enum IkMode {
    /// FABRIK on the chain between the dragged joint and the nearest pin.
    #[default]
    Chain,
    /// Relax every bone in the rig around the dragged joint.
    Global,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(default, rename_all = "camelCase"))]
pub struct DragConfig {
    pub mode: IkMode,
    pub fabrik: FabrikConfig,
    pub relax: RelaxConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SolveReport {
    /// Nothing was solved: the joint is fixed or has no bones.
    Skipped,
    Chain(FabrikReport),
    Global(RelaxReport),
}

#[derive(Clone, Debug, PartialEq)]
pub struct DragOutcome {
    /// Chains reachable from the dragged joint, for highlighting.
    pub paths: Vec<BonePath>,
    /// Index into `paths` of the chain handed to FABRIK.
    pub solved_path: Option<usize>,
    pub report: SolveReport,
}

/// One pointer-move step of an IK drag.
///
/// Call this for every drag update with the latest target; each call runs to
/// completion and supersedes the previous one.
pub fn drag_joint(
    rig: &mut Rig,
    joint: JointId,
    target: Vec2,
    config: &DragConfig,
) -> Result<DragOutcome, Error> {
    let paths = discover_chains(rig, joint)?;
    if rig.joint(joint)?.fixed {
        return Ok(DragOutcome {
            paths,
            solved_path: None,
            report: SolveReport::Skipped,
        });
    }

    match config.mode {
        IkMode::Global => {
            let report = solve_global(rig, joint, target, &config.relax)?;
            Ok(DragOutcome {
                paths,
                solved_path: None,
                report: SolveReport::Global(report),
            })
        }
        IkMode::Chain => {
            let Some(index) = pick_chain(rig, &paths) else {
                return Ok(DragOutcome {
                    paths,
                    solved_path: None,
                    report: SolveReport::Skipped,
                });
            };
            let chain = anchored_chain(rig, joint, &paths[index])?;
            let report = solve(rig, &chain, target, &config.fabrik)?;
            Ok(DragOutcome {
                paths,
                solved_path: Some(index),
                report: SolveReport::Chain(report),
            })
        }
    }
}

/// The first path ending at a pinned joint, else the longest (first on ties).
fn pick_chain(rig: &Rig, paths: &[BonePath]) -> Option<usize> {
    let pinned = paths.iter().position(|path| {
        path.last()
            .and_then(|&bone| rig.bone(bone).ok())
            .map(|bone| {
                [bone.start, bone.end]
                    .iter()
                    .any(|&j| rig.is_fixed(j).unwrap_or(false))
            })
            .unwrap_or(false)
    });
    pinned.or_else(|| {
        paths
            .iter()
            .enumerate()
            .rev()
            .max_by_key(|(_, path)| path.len())
            .map(|(i, _)| i)
    })
}
