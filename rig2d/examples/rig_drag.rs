use glam::Vec2;
use rig2d::{DragConfig, IkMode, Rig, SolveReport, drag_joint};
use serde_json::json;
use std::path::PathBuf;

fn demo_arm() -> Rig {
    let mut rig = Rig::with_id("demo", "arm");
    let shoulder = rig.add_joint("shoulder", Vec2::ZERO);
    let elbow = rig.add_joint("elbow", Vec2::new(10.0, 0.0));
    let hand = rig.add_joint("hand", Vec2::new(20.0, 0.0));
    rig.set_fixed(shoulder, true).expect("pin shoulder");
    rig.add_bone("upper", shoulder, elbow).expect("upper bone");
    rig.add_bone("lower", elbow, hand).expect("lower bone");
    rig
}

fn load_rig(path: &PathBuf) -> Rig {
    let json = std::fs::read_to_string(path).expect("read rig json");
    Rig::from_json_str(&json).expect("parse rig json")
}

fn main() {
    env_logger::init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut positional = Vec::<String>::new();
    let mut mode = IkMode::Chain;
    let mut rig_path: Option<PathBuf> = None;
    let mut save_path: Option<PathBuf> = None;

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--global" => {
                mode = IkMode::Global;
                i += 1;
            }
            "--rig" => {
                rig_path = args.get(i + 1).map(PathBuf::from);
                i += 2;
            }
            "--save" => {
                save_path = args.get(i + 1).map(PathBuf::from);
                i += 2;
            }
            other => {
                positional.push(other.to_string());
                i += 1;
            }
        }
    }

    let mut rig = match &rig_path {
        Some(path) => load_rig(path),
        None => demo_arm(),
    };

    let joint_name = positional
        .first()
        .cloned()
        .unwrap_or_else(|| "hand".to_string());
    let x: f32 = positional
        .get(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(5.0);
    let y: f32 = positional
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(5.0);

    let joint = rig
        .joint_by_name(&joint_name)
        .unwrap_or_else(|| panic!("no joint named '{joint_name}'"))
        .id();

    let config = DragConfig {
        mode,
        ..DragConfig::default()
    };
    let outcome = drag_joint(&mut rig, joint, Vec2::new(x, y), &config).expect("drag");

    let report = match &outcome.report {
        SolveReport::Skipped => json!({"solver": "skipped"}),
        SolveReport::Chain(r) => json!({
            "solver": "fabrik",
            "status": format!("{:?}", r.status),
            "iterations": r.iterations,
            "tipDistance": r.tip_distance,
        }),
        SolveReport::Global(r) => json!({
            "solver": "relax",
            "iterations": r.iterations,
            "converged": r.converged,
            "overConstrained": r.over_constrained,
        }),
    };

    let joints: Vec<_> = rig
        .joints()
        .iter()
        .map(|j| {
            json!({
                "id": j.id().to_string(),
                "name": j.name,
                "fixed": j.fixed,
                "x": j.position.x,
                "y": j.position.y,
            })
        })
        .collect();

    let bones: Vec<_> = rig
        .bones()
        .iter()
        .map(|b| {
            json!({
                "id": b.id().to_string(),
                "name": b.name,
                "rest": b.rest_length(),
                "error": rig.length_error(b.id()).unwrap_or(f32::NAN),
            })
        })
        .collect();

    let paths: Vec<Vec<String>> = outcome
        .paths
        .iter()
        .map(|p| p.iter().map(|b| b.to_string()).collect())
        .collect();

    let out = json!({
        "joint": joint_name,
        "target": [x, y],
        "paths": paths,
        "solvedPath": outcome.solved_path,
        "report": report,
        "joints": joints,
        "bones": bones,
    });
    println!("{}", serde_json::to_string_pretty(&out).expect("serialize"));

    if let Some(path) = save_path {
        let json = rig.to_json_string_pretty().expect("serialize rig");
        std::fs::write(&path, json).expect("write rig json");
    }
}
