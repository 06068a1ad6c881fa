#![allow(dead_code)]

use std::path::Path;

use fea_model::prelude::*;

/// Three pinned base nodes and a loaded apex joined by trusses
pub fn truss_tower(path: &Path) -> Structure {
    let mut s = Structure::new("tower", path);
    let base = s
        .add_nodes(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]])
        .unwrap();
    let top = s.add_node([0.0, 0.0, 1.0]).unwrap();
    for b in base {
        s.add_element(ElementType::Truss, vec![b, top]).unwrap();
    }
    s.add(vec![
        Material::elastic_isotropic("steel", 200e9, 0.3, 7850.0).into(),
        Section::truss("bar", 1e-4).into(),
        ElementProperties::new("ep", "steel", "bar", "elset_all").into(),
        Set::nodes("base", vec![0, 1, 2]).into(),
        Displacement::pinned("pinned", "base").into(),
        Load::point("tip", vec![top], Dofs::xyz(2000.0, 1000.0, -100000.0)).into(),
        Step::general("bc", &["pinned"], &[]).into(),
        Step::general("load", &["pinned"], &["tip"]).into(),
    ])
    .unwrap();
    s
}

/// 3×3 nodes and four quad shells on the unit square, corners pinned
pub fn shell_plate(path: &Path) -> Structure {
    let mut s = Structure::new("plate", path);
    for j in 0..3 {
        for i in 0..3 {
            s.add_node([i as f64 * 0.5, j as f64 * 0.5, 0.0]).unwrap();
        }
    }
    for j in 0..2 {
        for i in 0..2 {
            let n = j * 3 + i;
            s.add_element(ElementType::Shell, vec![n, n + 1, n + 4, n + 3])
                .unwrap();
        }
    }
    s.add(vec![
        Material::elastic_isotropic("steel", 210e9, 0.3, 7850.0).into(),
        Section::shell("plate", 0.01).into(),
        ElementProperties::new("ep", "steel", "plate", "elset_all").into(),
        Set::nodes("corners", vec![0, 2, 6, 8]).into(),
        Displacement::pinned("pinned", "corners").into(),
    ])
    .unwrap();
    s
}

/// `nx × ny` grid in the xy plane extruded `nz` layers up into hexahedra
pub fn deep_beam(path: &Path, nx: usize, ny: usize, nz: usize) -> Structure {
    let mut s = Structure::new("deep_beam", path);
    let node = |i: usize, j: usize, k: usize| k * (nx + 1) * (ny + 1) + j * (nx + 1) + i;
    for k in 0..=nz {
        for j in 0..=ny {
            for i in 0..=nx {
                s.add_node([i as f64 * 0.1, j as f64 * 0.1, k as f64 * 0.1])
                    .unwrap();
            }
        }
    }
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let nodes = vec![
                    node(i, j, k),
                    node(i + 1, j, k),
                    node(i + 1, j + 1, k),
                    node(i, j + 1, k),
                    node(i, j, k + 1),
                    node(i + 1, j, k + 1),
                    node(i + 1, j + 1, k + 1),
                    node(i, j + 1, k + 1),
                ];
                s.add_element(ElementType::Hexahedron, nodes).unwrap();
            }
        }
    }
    let mut corners = Vec::new();
    for k in 0..=nz {
        for (i, j) in [(0, 0), (nx, 0), (nx, ny), (0, ny)] {
            corners.push(node(i, j, k));
        }
    }
    let top_center = node(nx / 2, ny / 2, nz);
    s.add(vec![
        Material::elastic_isotropic("concrete", 30e9, 0.2, 2400.0).into(),
        Section::solid("solid").into(),
        ElementProperties::new("ep", "concrete", "solid", "elset_all").into(),
        Set::nodes("columns", corners).into(),
        Displacement::pinned("pinned", "columns").into(),
        Load::point("push", vec![top_center], Dofs::xyz(0.0, 0.0, -1.0e5)).into(),
        Step::general("load", &["pinned"], &["push"]).into(),
    ])
    .unwrap();
    s
}

/// Lines of `deck` that start with `prefix`
/// Two horizontal beams and a vertical post sharing one property on `elset_all`
pub fn portal_frame(path: &Path) -> Structure {
    let mut s = Structure::new("portal", path);
    let n = s
        .add_nodes(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 2.0], [2.0, 0.0, 0.0]])
        .unwrap();
    s.add_element(ElementType::Beam, vec![n[0], n[1]]).unwrap();
    s.add_element(ElementType::Beam, vec![n[1], n[2]]).unwrap();
    s.add_element(ElementType::Beam, vec![n[1], n[3]]).unwrap();
    s.add(vec![
        Material::elastic_isotropic("steel", 210e9, 0.3, 7850.0).into(),
        Section::rectangular("rect", 0.1, 0.2).into(),
        ElementProperties::new("ep", "steel", "rect", "elset_all").into(),
        Displacement::fixed("fixed", vec![0, 3]).into(),
        Load::point("sway", vec![2], Dofs::xyz(1000.0, 0.0, 0.0)).into(),
        Step::general("load", &["fixed"], &["sway"]).into(),
    ])
    .unwrap();
    s
}

pub fn lines_with<'d>(deck: &'d str, prefix: &str) -> Vec<&'d str> {
    deck.lines().filter(|l| l.starts_with(prefix)).collect()
}
