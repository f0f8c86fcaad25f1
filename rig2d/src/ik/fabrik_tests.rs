use crate::{AngleLimits, Error, FabrikConfig, FabrikStatus, JointId, Rig, solve};
use glam::Vec2;

fn assert_approx(actual: f32, expected: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-3,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

/// `A` fixed at the origin, `B` at (10, 0), `C` at (20, 0), bones of length 10.
fn arm() -> (Rig, [JointId; 3]) {
    let mut rig = Rig::new("arm");
    let a = rig.add_joint("A", Vec2::ZERO);
    let b = rig.add_joint("B", Vec2::new(10.0, 0.0));
    let c = rig.add_joint("C", Vec2::new(20.0, 0.0));
    rig.set_fixed(a, true).unwrap();
    rig.add_bone("A-B", a, b).unwrap();
    rig.add_bone("B-C", b, c).unwrap();
    (rig, [a, b, c])
}

fn position(rig: &Rig, id: JointId) -> Vec2 {
    rig.joint(id).unwrap().position
}

fn assert_segment_lengths(rig: &Rig, chain: &[JointId]) {
    for pair in chain.windows(2) {
        let bone = rig.bone_between(pair[0], pair[1]).unwrap();
        let rest = rig.bone(bone).unwrap().rest_length();
        assert_approx(position(rig, pair[0]).distance(position(rig, pair[1])), rest);
    }
}

#[test]
fn reachable_target_keeps_anchor_and_lengths() {
    let (mut rig, chain) = arm();
    let target = Vec2::new(5.0, 5.0);
    let report = solve(&mut rig, &chain, target, &FabrikConfig::default()).unwrap();

    assert_ne!(report.status, FabrikStatus::Unreachable);
    assert_eq!(position(&rig, chain[0]), Vec2::ZERO);
    assert_segment_lengths(&rig, &chain);
    assert!(position(&rig, chain[2]).distance(target) < 0.05);
}

#[test]
fn unreachable_target_leaves_chain_untouched() {
    let (mut rig, chain) = arm();
    let before: Vec<_> = chain.iter().map(|&j| position(&rig, j)).collect();
    let report = solve(
        &mut rig,
        &chain,
        Vec2::new(100.0, 100.0),
        &FabrikConfig::default(),
    )
    .unwrap();

    assert_eq!(report.status, FabrikStatus::Unreachable);
    assert_eq!(report.iterations, 0);
    let after: Vec<_> = chain.iter().map(|&j| position(&rig, j)).collect();
    assert_eq!(before, after);
}

#[test]
fn unreachable_after_stretching_still_restores() {
    let (mut rig, chain) = arm();
    // Live pose longer than the rest pose; rest lengths still define reach.
    rig.set_joint_position(chain[2], Vec2::new(25.0, 0.0)).unwrap();
    let before: Vec<_> = chain.iter().map(|&j| position(&rig, j)).collect();
    solve(
        &mut rig,
        &chain,
        Vec2::new(24.0, 0.0),
        &FabrikConfig::default(),
    )
    .unwrap();
    let after: Vec<_> = chain.iter().map(|&j| position(&rig, j)).collect();
    assert_eq!(before, after);
}

#[test]
fn chain_swings_onto_the_other_axis() {
    let (mut rig, chain) = arm();
    let target = Vec2::new(0.0, 15.0);
    solve(&mut rig, &chain, target, &FabrikConfig::default()).unwrap();
    assert_segment_lengths(&rig, &chain);
    let tip = position(&rig, chain[2]);
    assert!(tip.distance(target) < 0.05, "tip at {tip}");
}

#[test]
fn repeated_solves_do_not_drift() {
    let (mut rig, chain) = arm();
    let target = Vec2::new(-4.0, 9.0);
    let config = FabrikConfig::default();
    solve(&mut rig, &chain, target, &config).unwrap();
    let first: Vec<_> = chain.iter().map(|&j| position(&rig, j)).collect();
    for _ in 0..25 {
        solve(&mut rig, &chain, target, &config).unwrap();
    }
    let last: Vec<_> = chain.iter().map(|&j| position(&rig, j)).collect();
    for (a, b) in first.iter().zip(&last) {
        assert!(a.distance(*b) < 0.05, "{a} drifted to {b}");
    }
    assert_segment_lengths(&rig, &chain);
}

#[test]
fn fixed_joint_in_the_middle_never_moves() {
    let mut rig = Rig::new("r");
    let j: Vec<_> = (0..4)
        .map(|i| rig.add_joint(format!("j{i}"), Vec2::new(i as f32 * 5.0, 0.0)))
        .collect();
    for w in j.windows(2) {
        rig.add_bone("b", w[0], w[1]).unwrap();
    }
    rig.set_fixed(j[0], true).unwrap();
    rig.set_fixed(j[2], true).unwrap();

    solve(&mut rig, &j, Vec2::new(12.0, 4.0), &FabrikConfig::default()).unwrap();
    assert_eq!(position(&rig, j[0]), Vec2::ZERO);
    assert_eq!(position(&rig, j[2]), Vec2::new(10.0, 0.0));
    assert_approx(position(&rig, j[3]).distance(position(&rig, j[2])), 5.0);
}

#[test]
fn missing_bone_falls_back_to_live_distance() {
    let mut rig = Rig::new("r");
    let a = rig.add_joint("a", Vec2::ZERO);
    let b = rig.add_joint("b", Vec2::new(3.0, 0.0));
    let c = rig.add_joint("c", Vec2::new(3.0, 4.0));
    rig.set_fixed(a, true).unwrap();
    rig.add_bone("ab", a, b).unwrap();
    // No bone between b and c: the segment keeps its live length of 4.

    solve(&mut rig, &[a, b, c], Vec2::new(0.0, 6.0), &FabrikConfig::default()).unwrap();
    assert_approx(position(&rig, a).distance(position(&rig, b)), 3.0);
    assert_approx(position(&rig, b).distance(position(&rig, c)), 4.0);
}

#[test]
fn angle_limits_clamp_segment_direction() {
    let (mut rig, chain) = arm();
    // B may only sit within 10 degrees of the +X axis as seen from A.
    let limit = 10.0f32.to_radians();
    rig.set_angle_limits(chain[1], AngleLimits::new(-limit, limit))
        .unwrap();

    solve(&mut rig, &chain, Vec2::new(2.0, 12.0), &FabrikConfig::default()).unwrap();

    let b = position(&rig, chain[1]);
    let angle = b.y.atan2(b.x);
    assert!(angle <= limit + 1.0e-4, "angle {angle} exceeds limit");
    assert_segment_lengths(&rig, &chain);
}

#[test]
fn disabled_limits_are_ignored() {
    let (mut rig, chain) = arm();
    let mut limits = AngleLimits::new(-0.1, 0.1);
    limits.enabled = false;
    rig.set_angle_limits(chain[1], limits).unwrap();

    solve(&mut rig, &chain, Vec2::new(0.0, 15.0), &FabrikConfig::default()).unwrap();
    let b = position(&rig, chain[1]);
    assert!(b.y.atan2(b.x) > 0.1);
}

#[test]
fn free_chain_translates_toward_target() {
    let mut rig = Rig::new("r");
    let a = rig.add_joint("a", Vec2::ZERO);
    let b = rig.add_joint("b", Vec2::new(10.0, 0.0));
    rig.add_bone("ab", a, b).unwrap();

    let report = solve(&mut rig, &[a, b], Vec2::new(5.0, 0.0), &FabrikConfig::default()).unwrap();
    assert_eq!(report.status, FabrikStatus::Converged);
    assert_approx(position(&rig, a).distance(position(&rig, b)), 10.0);
}

#[test]
fn short_chain_is_rejected() {
    let (mut rig, chain) = arm();
    assert!(matches!(
        solve(&mut rig, &chain[..1], Vec2::ZERO, &FabrikConfig::default()),
        Err(Error::ChainTooShort { len: 1 })
    ));
}

#[test]
fn non_finite_target_is_rejected() {
    let (mut rig, chain) = arm();
    assert!(solve(&mut rig, &chain, Vec2::new(f32::NAN, 0.0), &FabrikConfig::default()).is_err());
    assert_eq!(position(&rig, chain[2]), Vec2::new(20.0, 0.0));
}

#[test]
fn repeated_joint_is_rejected() {
    let (mut rig, [a, b, c]) = arm();
    assert!(matches!(
        solve(&mut rig, &[a, b, c, a], Vec2::new(5.0, 5.0), &FabrikConfig::default()),
        Err(Error::InvalidValue { .. })
    ));
    assert_eq!(position(&rig, c), Vec2::new(20.0, 0.0));
}
