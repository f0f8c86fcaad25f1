use crate::json::RigRecord;
use crate::{AngleLimits, Color, Error, RIG_FORMAT_VERSION, Rig};
use glam::Vec2;

const RIG_WITH_DANGLING_BONE: &str = r#"
{
  "id": "rig-1",
  "name": "broken",
  "rootJointId": "missing",
  "joints": [
    { "id": "a", "name": "A", "position": { "x": 0, "y": 0 }, "isFixed": true },
    { "id": "b", "name": "B", "position": { "x": 3, "y": 4 } }
  ],
  "bones": [
    { "id": "ab", "name": "good", "startJointId": "a", "endJointId": "b",
      "attachmentId": "nope" },
    { "id": "ax", "name": "dangling", "startJointId": "a", "endJointId": "x" },
    { "id": "aa", "name": "loop", "startJointId": "a", "endJointId": "a" }
  ],
  "attachments": [
    { "id": "bad", "name": "short", "width": 2, "height": 2, "pixels": "AAAA" },
    { "id": "worse", "name": "garbage", "width": 1, "height": 1, "pixels": "!!" }
  ]
}
"#;

fn assert_approx(actual: f32, expected: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-6,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

fn sample_rig() -> Rig {
    let mut rig = Rig::with_id("rig-7", "sample");
    let a = rig.add_joint("shoulder", Vec2::new(1.0, 2.0));
    let b = rig.add_joint("elbow", Vec2::new(11.0, 2.0));
    let c = rig.add_joint("wrist", Vec2::new(11.0, 12.5));
    rig.set_fixed(a, true).unwrap();
    rig.set_angle_limits(b, AngleLimits::new(-0.5, 1.25)).unwrap();
    rig.joint_mut(c).unwrap().rotation = 0.3;

    let upper = rig.add_bone("upper", a, b).unwrap();
    let lower = rig.add_bone("lower", b, c).unwrap();
    rig.set_rest_length(lower, 9.0).unwrap();
    {
        let bone = rig.bone_mut(upper).unwrap();
        bone.color = Color::new(0.25, 0.5, 0.75, 1.0);
        bone.thickness = 6.0;
    }

    let skin = rig.add_attachment("sleeve", 4, 4);
    {
        let att = rig.attachment_mut(skin).unwrap();
        att.set_pixel(0, 0, Some([255, 0, 0, 255]));
        att.set_pixel(1, 1, Some([255, 0, 0, 255]));
        att.set_anchor(Vec2::new(0.25, 0.75));
    }
    rig.attach(upper, skin).unwrap();
    {
        let bone = rig.bone_mut(upper).unwrap();
        bone.skin.scale = 1.5;
        bone.skin.rotation = -0.2;
        bone.skin.draw_order = 3;
    }
    rig
}

#[test]
fn round_trip_preserves_joints_bones_and_attachments() {
    let rig = sample_rig();
    let json = rig.to_json_string().unwrap();
    let back = Rig::from_json_str(&json).unwrap();

    assert_eq!(back.id, "rig-7");
    assert_eq!(back.name, "sample");
    assert_eq!(back.root(), rig.root());

    assert_eq!(back.joints().len(), rig.joints().len());
    for (x, y) in rig.joints().iter().zip(back.joints()) {
        assert_eq!(x.id(), y.id());
        assert_eq!(x.name, y.name);
        assert_eq!(x.position, y.position);
        assert_eq!(x.fixed, y.fixed);
        assert_eq!(x.limits, y.limits);
        assert_approx(x.rotation, y.rotation);
        assert_eq!(x.bones(), y.bones());
    }

    assert_eq!(back.bones().len(), rig.bones().len());
    for (x, y) in rig.bones().iter().zip(back.bones()) {
        assert_eq!(x.id(), y.id());
        assert_eq!(x.name, y.name);
        assert_eq!(x.start(), y.start());
        assert_eq!(x.end(), y.end());
        assert_approx(x.rest_length(), y.rest_length());
        assert_eq!(x.color, y.color);
        assert_approx(x.thickness, y.thickness);
        assert_eq!(x.attachment(), y.attachment());
        assert_eq!(x.skin, y.skin);
    }

    assert_eq!(back.attachments(), rig.attachments());
}

#[test]
fn red_pixels_survive_round_trip() {
    let rig = sample_rig();
    let back = Rig::from_record(rig.to_record()).unwrap();
    let att = &back.attachments()[0];

    assert_eq!((att.width(), att.height()), (4, 4));
    for y in 0..4 {
        for x in 0..4 {
            let pixel = att.pixel(x, y);
            if (x, y) == (0, 0) || (x, y) == (1, 1) {
                assert_eq!(pixel, Some([255, 0, 0, 255]), "pixel ({x}, {y})");
            } else {
                assert_eq!(pixel, None, "pixel ({x}, {y})");
            }
        }
    }
    assert_eq!(att.opaque_pixel_count(), 2);
}

#[test]
fn record_uses_documented_field_names() {
    let rig = sample_rig();
    let value: serde_json::Value = serde_json::from_str(&rig.to_json_string().unwrap()).unwrap();

    assert_eq!(value["version"], RIG_FORMAT_VERSION);
    let joint = &value["joints"][0];
    assert_eq!(joint["isFixed"], true);
    assert_eq!(joint["position"]["x"], 1.0);
    assert!(joint.get("hasAngleConstraints").is_some());
    assert!(joint.get("minAngle").is_some());

    let bone = &value["bones"][0];
    assert!(bone.get("startJointId").is_some());
    assert!(bone.get("restLength").is_some());
    assert_eq!(bone["drawOrder"], 3);
    assert_eq!(bone["color"]["g"], 0.5);

    // 4x4 RGBA = 64 bytes = 88 base64 characters.
    let pixels = value["attachments"][0]["pixels"].as_str().unwrap();
    assert_eq!(pixels.len(), 88);
}

#[test]
fn dangling_references_drop_only_the_broken_items() {
    let rig = Rig::from_json_str(RIG_WITH_DANGLING_BONE).unwrap();

    assert_eq!(rig.joints().len(), 2);
    assert_eq!(rig.bones().len(), 1);
    let bone = &rig.bones()[0];
    assert_eq!(bone.name, "good");
    assert_eq!(bone.attachment(), None);
    assert!(rig.attachments().is_empty());
    assert_eq!(rig.root(), None);
}

#[test]
fn missing_rest_length_is_rebuilt_from_endpoints() {
    let rig = Rig::from_json_str(RIG_WITH_DANGLING_BONE).unwrap();
    assert_approx(rig.bones()[0].rest_length(), 5.0);
}

#[test]
fn bone_defaults_apply_when_fields_are_absent() {
    let rig = Rig::from_json_str(RIG_WITH_DANGLING_BONE).unwrap();
    let bone = &rig.bones()[0];
    assert_eq!(bone.skin.scale, 1.0);
    assert_eq!(bone.skin.rotation, 0.0);
    assert_eq!(bone.skin.draw_order, 0);
    assert_eq!(bone.color, Color::WHITE);
}

#[test]
fn non_numeric_ids_are_remapped_and_stay_usable() {
    let mut rig = Rig::from_json_str(RIG_WITH_DANGLING_BONE).unwrap();
    let a = rig.joint_by_name("A").unwrap().id();
    let b = rig.joint_by_name("B").unwrap().id();
    assert_ne!(a, b);
    assert!(rig.bone_between(a, b).is_some());

    // New items never collide with loaded ones.
    let c = rig.add_joint("C", Vec2::ZERO);
    assert_ne!(c, a);
    assert_ne!(c, b);
    assert_ne!(c.get(), rig.bones()[0].id().get());
}

#[test]
fn empty_document_loads_as_empty_rig() {
    let rig = Rig::from_json_str("{}").unwrap();
    assert!(rig.is_empty());
    assert_eq!(rig.root(), None);
}

#[test]
fn newer_format_version_is_rejected() {
    let json = format!(r#"{{ "version": {} }}"#, RIG_FORMAT_VERSION + 1);
    assert!(matches!(
        Rig::from_json_str(&json),
        Err(Error::UnsupportedFormatVersion { .. })
    ));
}

#[test]
fn invalid_json_is_an_error() {
    assert!(matches!(
        Rig::from_json_str("{ joints: "),
        Err(Error::JsonParse { .. })
    ));
}

#[test]
fn record_round_trips_through_serde() {
    let record = sample_rig().to_record();
    let json = serde_json::to_string(&record).unwrap();
    let back: RigRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(record, back);
}

#[test]
fn partial_color_falls_back_to_white_channels() {
    let json = r#"{
      "joints": [
        { "id": "1", "position": { "x": 0, "y": 0 } },
        { "id": "2", "position": { "x": 1, "y": 0 } }
      ],
      "bones": [
        { "id": "3", "startJointId": "1", "endJointId": "2", "color": { "g": 0.5 } }
      ]
    }"#;
    let rig = Rig::from_json_str(json).unwrap();
    assert_eq!(rig.bones().len(), 1);
    assert_eq!(rig.bones()[0].color, Color::new(1.0, 0.5, 1.0, 1.0));
}

#[test]
fn largest_id_does_not_collide_with_new_joints() {
    let json = r#"{ "joints": [ { "id": "4294967295", "name": "a" } ] }"#;
    let mut rig = Rig::from_json_str(json).unwrap();
    let a = rig.joint_by_name("a").unwrap().id();

    let b = rig.add_joint("b", Vec2::X);
    assert_ne!(a, b);
    assert_eq!(rig.joints().len(), 2);
    assert_eq!(rig.joint(a).unwrap().name, "a");
    assert_eq!(rig.joint(b).unwrap().name, "b");
}
