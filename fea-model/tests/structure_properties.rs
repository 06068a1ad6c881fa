use std::collections::BTreeMap;

use fea_model::prelude::*;

fn sample_points() -> Vec<[f64; 3]> {
    // deterministic pseudo-random walk, with every fifth point repeated
    let mut points = Vec::new();
    let mut x = 0.123_f64;
    for i in 0..200 {
        x = (x * 7919.0 + 0.37).fract();
        let p = [x * 10.0, (x * 3.0).sin(), -(i as f64) * 0.01];
        points.push(p);
        if i % 5 == 0 {
            points.push(p);
        }
    }
    points
}

#[test]
fn geometric_key_idempotence() {
    for tol in [0, 1, 3, 6] {
        let mut s = Structure::new("idem", "/tmp").with_tol(tol).unwrap();
        for p in sample_points() {
            let first = s.add_node(p).unwrap();
            let count = s.node_count();
            assert_eq!(s.add_node(p).unwrap(), first);
            assert_eq!(s.node_count(), count);
        }
    }
}

#[test]
fn node_keys_are_a_contiguous_prefix() {
    let mut s = Structure::default();
    let mut seen = Vec::new();
    for p in sample_points() {
        let key = s.add_node(p).unwrap();
        if !seen.contains(&key) {
            assert_eq!(key, seen.len());
            seen.push(key);
        }
    }
    let keys: Vec<usize> = s.nodes().iter().map(|n| n.key).collect();
    assert_eq!(keys, (0..s.node_count()).collect::<Vec<_>>());
}

#[test]
fn duplicate_coordinates_collapse() {
    let mut s = Structure::new("dup", "/tmp").with_tol(3).unwrap();
    let a = s.add_node([1.0, 2.0, 3.0]).unwrap();
    let b = s.add_node([1.0, 2.0, 3.0]).unwrap();
    assert_eq!(a, b);
    assert_eq!(s.node_count(), 1);
}

fn full_structure(dir: &std::path::Path) -> Structure {
    let mut s = Structure::new("full", dir).with_ndof(3);
    let keys = s
        .add_nodes(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.5, 0.5, 1.0],
        ])
        .unwrap();
    s.add_node_with([2.0, 2.0, 2.0], Some(LocalFrame::global()), Some(12.5))
        .unwrap();
    s.add_element(ElementType::Shell, keys[..4].to_vec()).unwrap();
    s.add_element_with(
        Element::new(0, ElementType::Beam, vec![keys[0], keys[4]]).with_axes(LocalAxes {
            ex: [0.0, 0.0, 1.0],
            ey: [0.0, 1.0, 0.0],
            ez: [-1.0, 0.0, 0.0],
        }),
    )
    .unwrap();

    let mut per_node = BTreeMap::new();
    per_node.insert(4, Dofs::xyz(0.0, 0.0, -5.0));

    s.add(vec![
        Material::concrete("c30", 30.0).into(),
        Material::steel("s355", 355.0, 510.0, 20.0).into(),
        Section::shell("slab", 0.2).into(),
        Section::i_section("ipe", 0.1, 0.2, 0.006, 0.009).into(),
        Set::elements("slab_el", vec![0]).into(),
        Set::nodes("corners", vec![0, 1, 2, 3]).into(),
        Set::element_surface("slab_top", vec![Face::new(0, "SPOS")]).into(),
        ElementProperties::new("ep_slab", "c30", "slab", "slab_el").into(),
        ElementProperties::on_elements("ep_col", "s355", "ipe", vec![1]).into(),
        Displacement::roller("rollers", "corners", RollerAxis::XY).into(),
        Load::point_list("tip", per_node).into(),
        Load::gravity("self", ELSET_ALL).into(),
        Misc::amplitude("ramp", vec![[0.0, 0.0], [1.0, 1.0]]).into(),
        Misc::temperatures("temps", vec![TemperatureRow::new(0.0, &[(0, 20.0)])]).into(),
        Interaction::heat_transfer("film", "ramp", "slab_top", 20.0, 10.0, 20.0, 0.9).into(),
        Step::general("bc", &["rollers"], &[]).into(),
        Step::general("load", &["rollers"], &["tip", "self"])
            .with_nlgeom(true)
            .with_load_factor("self", 1.35)
            .into(),
        Step::modal("modal", 5, &["rollers"]).into(),
    ])
    .unwrap();

    let mut step = StepResults::default();
    step.insert_nodal("ux", 4, 1.0e-3);
    step.insert_element("smises", 0, 2.5e6);
    step.frequencies = vec![1.5, 3.25];
    s.results.insert("load", step);
    s
}

#[test]
fn snapshot_round_trip_is_lossless() {
    let dir = tempfile::tempdir().unwrap();
    let s = full_structure(dir.path());
    let path = dir.path().join("full.json");
    s.save_snapshot(&path).unwrap();

    let back = Structure::load_snapshot(&path).unwrap();
    assert_eq!(back, s);
    assert_eq!(back.tol, 3);
    assert_eq!(back.ndof, 3);
    assert_eq!(back.steps_order, vec!["bc", "load", "modal"]);
    assert_eq!(back.node(5).and_then(|n| n.mass), Some(12.5));
    assert_eq!(
        back.get_element_results("load", "smises", "slab_el").unwrap(),
        vec![(0, 2.5e6)]
    );
    assert!(resolve(&back).is_ok());
}

#[test]
fn snapshot_preserves_float_bits() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = Structure::new("bits", dir.path());
    let awkward = [0.1 + 0.2, 1.0 / 3.0, -2.0e-300];
    s.add_node(awkward).unwrap();
    let path = dir.path().join("bits.json");
    s.save_snapshot(&path).unwrap();
    let back = Structure::load_snapshot(&path).unwrap();
    let xyz = back.nodes_xyz()[0];
    for (a, b) in xyz.iter().zip(awkward) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
