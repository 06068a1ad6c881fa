mod common;

use std::collections::HashMap;

use common::{lines_with, portal_frame, shell_plate, truss_tower};
use deck_service::dialects::{
    permute, render_deck, Ansys, DeckOptions, DeckSection, Dialect, DialectKind, Sofistik,
    PENT_AS_BRICK, TET_AS_BRICK,
};
use fea_model::prelude::*;

fn render(s: &Structure, kind: DialectKind) -> String {
    render_deck(s, kind, &DeckOptions::default()).unwrap()
}

/// Internal keys of the node records of `deck`, back in 0-based form
fn node_ids(deck: &str, kind: DialectKind) -> Vec<usize> {
    let lines: Vec<&str> = deck.lines().collect();
    let after = |header: &str| -> Vec<&str> {
        let start = lines.iter().position(|l| *l == header).unwrap() + 1;
        lines[start..]
            .iter()
            .take_while(|l| !l.starts_with(kind.comment()))
            .copied()
            .collect()
    };
    let first = |l: &str, sep: &str| l.split(sep).next().unwrap().trim().parse::<usize>().unwrap();
    match kind {
        DialectKind::Abaqus => after("*NODE").into_iter().map(|l| first(l, ",")).collect(),
        DialectKind::Ansys => lines_with(deck, "N,")
            .into_iter()
            .map(|l| l.split(',').nth(1).unwrap().parse().unwrap())
            .collect(),
        DialectKind::OpenSees => lines_with(deck, "node ")
            .into_iter()
            .map(|l| l.split(' ').nth(1).unwrap().parse().unwrap())
            .collect(),
        DialectKind::Sofistik => after("NODE NO X Y Z").into_iter().map(|l| first(l, " ")).collect(),
    }
}

#[test]
fn sections_appear_in_canonical_order_with_banners() {
    let dir = tempfile::tempdir().unwrap();
    let s = truss_tower(dir.path());
    for kind in DialectKind::ALL {
        let deck = render(&s, kind);
        let lines: Vec<&str> = deck.lines().collect();
        let mut last = 0;
        for section in DeckSection::ALL {
            let banner = format!("{} ----- {}", kind.comment(), section.title());
            let at = lines
                .iter()
                .position(|l| *l == banner)
                .unwrap_or_else(|| panic!("{kind}: no banner for {}", section.title()));
            assert!(at > last || last == 0, "{kind}: {} out of order", section.title());
            let divider = lines[at - 1].strip_prefix(kind.comment()).unwrap();
            assert!(!divider.is_empty() && divider.chars().all(|c| c == '-'));
            assert!(lines[at + 1].starts_with(kind.comment()));
            last = at;
        }
    }
}

#[test]
fn identifiers_are_keys_plus_one() {
    let dir = tempfile::tempdir().unwrap();
    let s = truss_tower(dir.path());
    for kind in DialectKind::ALL {
        let deck = render(&s, kind);
        assert_eq!(node_ids(&deck, kind), vec![1, 2, 3, 4], "{kind}");
    }

    let plate = shell_plate(dir.path());
    let deck = render(&plate, DialectKind::Ansys);
    let elements: Vec<Vec<usize>> = lines_with(&deck, "EN,")
        .into_iter()
        .map(|l| l.split(',').skip(1).map(|f| f.parse().unwrap()).collect())
        .collect();
    for (element, ids) in plate.elements().iter().zip(&elements) {
        assert_eq!(ids[0], element.key + 1);
        let nodes: Vec<usize> = element.nodes.iter().map(|n| n + 1).collect();
        assert_eq!(&ids[1..], nodes.as_slice());
    }
}

/// One solid of `element_type` on the first `count` corners of a unit brick
fn single_solid(dir: &std::path::Path, element_type: ElementType, count: usize) -> Structure {
    let corners = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [0.0, 1.0, 1.0],
    ];
    let mut s = Structure::new("solid", dir);
    let nodes = s.add_nodes(&corners[..count]).unwrap();
    s.add_element(element_type, nodes).unwrap();
    s.add(vec![
        Material::elastic_isotropic("steel", 210e9, 0.3, 7850.0).into(),
        Section::solid("solid").into(),
        ElementProperties::new("ep", "steel", "solid", "elset_all").into(),
        Set::nodes("base", vec![0, 1, 2]).into(),
        Displacement::fixed("fixed", "base").into(),
        Load::point("push", vec![3], Dofs::xyz(0.0, 0.0, -10.0)).into(),
        Step::general("load", &["fixed"], &["push"]).into(),
    ])
    .unwrap();
    s
}

#[test]
fn collapsed_solids_follow_the_permutation_tables() {
    let dir = tempfile::tempdir().unwrap();
    for (element_type, count, table) in [
        (ElementType::Tetrahedron, 4, &TET_AS_BRICK),
        (ElementType::Pentahedron, 6, &PENT_AS_BRICK),
    ] {
        let s = single_solid(dir.path(), element_type, count);
        let stored = &s.element(0).unwrap().nodes;
        assert_eq!(Ansys.permutation(element_type, count), Some(&table[..]));
        let expected: Vec<String> = permute(Some(&table[..]), stored)
            .iter()
            .map(|n| (n + 1).to_string())
            .collect();

        let ansys = render(&s, DialectKind::Ansys);
        assert_eq!(lines_with(&ansys, "EN,"), vec![format!("EN,1,{}", expected.join(","))]);

        assert_eq!(Sofistik.permutation(element_type, count), Some(&table[..]));
        let sofistik = render(&s, DialectKind::Sofistik);
        assert!(sofistik.contains(&format!("\n1 {} 1\n", expected.join(" "))));
    }
}

#[test]
fn keyword_decks_keep_stored_topology() {
    let dir = tempfile::tempdir().unwrap();
    let s = single_solid(dir.path(), ElementType::Tetrahedron, 4);
    let deck = render(&s, DialectKind::Abaqus);
    assert!(deck.contains("*ELEMENT, TYPE=C3D4, ELSET=block_tetrahedron_4\n1, 1, 2, 3, 4\n"));
}

/// Names of every set definition in `deck`
fn defined_sets(deck: &str, kind: DialectKind) -> Vec<String> {
    deck.lines()
        .map(str::trim)
        .filter_map(|l| match kind {
            DialectKind::Abaqus => l
                .strip_prefix("*NSET, NSET=")
                .or_else(|| l.strip_prefix("*ELSET, ELSET=")),
            DialectKind::Ansys => l.strip_prefix("CM,").and_then(|rest| rest.split(',').next()),
            DialectKind::OpenSees => l
                .strip_prefix("group -name ")
                .and_then(|rest| rest.split(' ').next()),
            DialectKind::Sofistik => l
                .strip_prefix("GRP NO ")
                .and_then(|rest| rest.split('\'').nth(1)),
        })
        .map(str::to_string)
        .collect()
}

#[test]
fn names_shared_across_kinds_define_distinct_sets() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = truss_tower(dir.path());
    assert!(s.remove(EntityKind::ElementProperties, "ep"));
    s.add(vec![
        ElementProperties::on_elements("support", "steel", "bar", vec![0, 1, 2]).into(),
        Displacement::pinned("support", vec![0, 1, 2]).into(),
        Load::point("support", vec![3], Dofs::xyz(0.0, 0.0, -1000.0)).into(),
        Step::general("shared", &["support"], &["support"]).into(),
    ])
    .unwrap();

    for kind in DialectKind::ALL {
        let deck = render(&s, kind);
        let names = defined_sets(&deck, kind);
        for expected in ["nset_bc_support", "nset_support", "elset_ep_support"] {
            assert!(names.iter().any(|n| n == expected), "{kind}: no set {expected}");
        }
        let mut unique = names.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), names.len(), "{kind}: {names:?}");
    }

    let abaqus = render(&s, DialectKind::Abaqus);
    assert!(abaqus.contains("*NSET, NSET=nset_bc_support\n1, 2, 3\n"));
    assert!(abaqus.contains("*NSET, NSET=nset_support\n4\n"));
    assert_eq!(lines_with(&abaqus, "nset_bc_support, ").len(), 3);
    assert!(lines_with(&abaqus, "nset_support, ").contains(&"nset_support, 3, -1000"));
}

fn vector(fields: &[&str]) -> [f64; 3] {
    let v: Vec<f64> = fields.iter().map(|f| f.trim().parse().unwrap()).collect();
    [v[0], v[1], v[2]]
}

/// Element id -> orientation vector as written to an Abaqus deck
fn abaqus_orientations(deck: &str) -> HashMap<usize, [f64; 3]> {
    let lines: Vec<&str> = deck.lines().collect();
    let mut out = HashMap::new();
    for (i, line) in lines.iter().enumerate() {
        let Some(elset) = line.strip_prefix("*BEAM SECTION, ELSET=") else {
            continue;
        };
        let elset = elset.split(',').next().unwrap();
        let orientation = vector(&lines[i + 2].split(',').collect::<Vec<_>>());
        let header = format!("*ELSET, ELSET={elset}");
        let start = lines.iter().position(|l| *l == header).unwrap() + 1;
        for ids in lines[start..].iter().take_while(|l| !l.starts_with('*')) {
            for id in ids.split(',') {
                out.insert(id.trim().parse().unwrap(), orientation);
            }
        }
    }
    out
}

#[test]
fn beams_carry_their_own_orientation() {
    let dir = tempfile::tempdir().unwrap();
    let s = portal_frame(dir.path());
    let expected: HashMap<usize, [f64; 3]> = s
        .elements()
        .iter()
        .map(|e| (e.key + 1, s.beam_orientation(e.key).unwrap()))
        .collect();
    assert_eq!(expected[&1], [0.0, 0.0, 1.0]);
    assert_eq!(expected[&2], [1.0, 0.0, 0.0]);

    let abaqus = render(&s, DialectKind::Abaqus);
    assert_eq!(lines_with(&abaqus, "*BEAM SECTION").len(), 2);
    assert_eq!(abaqus_orientations(&abaqus), expected);

    let opensees = render(&s, DialectKind::OpenSees);
    let transforms: HashMap<usize, [f64; 3]> = opensees
        .lines()
        .map(str::trim)
        .filter_map(|l| l.strip_prefix("geomTransf Linear "))
        .map(|rest| {
            let fields: Vec<&str> = rest.split(' ').collect();
            (fields[0].parse().unwrap(), vector(&fields[1..]))
        })
        .collect();
    assert_eq!(transforms, expected);
}
