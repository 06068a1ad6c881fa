//! Pre-write resolution pass
//!
//! Every name-based reference in a [`Structure`] is resolved once into a
//! [`Resolved`] view. Missing names are collected and reported together;
//! references to the wrong kind of entity are invariant violations.

use std::collections::HashMap;

use log::{debug, warn};

use crate::elements::{ElementProperties, ElementType, Material, Section, SectionType};
use crate::error::{FEAError, FEAResult, MissingRef};
use crate::loads::{Displacement, Load, Step, StepKind, Target};
use crate::misc::{Constraint, Interaction, Misc};
use crate::model::Structure;
use crate::sets::{Face, Selection, SetKind, ELSET_ALL, NSET_ALL};

/// Where a resolved set comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOrigin {
    /// `nset_all` / `elset_all`
    Implicit,
    /// Added by the user
    User,
    /// Generated for an entity that targets explicit keys
    Generated,
}

/// A set ready for emission
#[derive(Debug, Clone)]
pub struct ResolvedSet<'a> {
    pub name: String,
    pub kind: SetKind,
    pub keys: Vec<usize>,
    /// Faces of an element surface
    pub faces: Option<&'a [Face]>,
    pub origin: SetOrigin,
}

/// Element properties with their material, section and elements
#[derive(Debug, Clone)]
pub struct ResolvedProperty<'a> {
    pub properties: &'a ElementProperties,
    pub material: Option<&'a Material>,
    /// 1-based material tag
    pub material_tag: Option<usize>,
    pub section: &'a Section,
    /// 1-based section tag
    pub section_tag: usize,
    /// Element set carrying the elements
    pub elset: String,
    pub elements: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct ResolvedDisplacement<'a> {
    pub displacement: &'a Displacement,
    /// Node set carrying the nodes
    pub nset: String,
    pub nodes: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct ResolvedLoad<'a> {
    pub load: &'a Load,
    /// Set carrying the target keys
    pub set: String,
    /// Node or element keys, see [`Load::targets_nodes`]
    pub keys: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct ResolvedStep<'a> {
    pub step: &'a Step,
    /// Indices into [`Resolved::displacements`]
    pub displacements: Vec<usize>,
    /// Displacements not activated by an earlier step
    pub new_displacements: Vec<usize>,
    /// Indices into [`Resolved::loads`]
    pub loads: Vec<usize>,
    pub temperatures: Option<&'a Misc>,
    pub interaction: Option<&'a Interaction>,
}

/// Elements sharing a variant and node count, in first-appearance order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementBlock {
    pub element_type: ElementType,
    pub node_count: usize,
    pub elements: Vec<usize>,
}

/// The validated, name-indexed view consumed by deck writers
#[derive(Debug)]
pub struct Resolved<'a> {
    pub structure: &'a Structure,
    pub sets: Vec<ResolvedSet<'a>>,
    pub materials: Vec<&'a Material>,
    pub sections: Vec<&'a Section>,
    pub properties: Vec<ResolvedProperty<'a>>,
    /// Property index per element key
    pub element_property: Vec<Option<usize>>,
    pub displacements: Vec<ResolvedDisplacement<'a>>,
    pub loads: Vec<ResolvedLoad<'a>>,
    pub steps: Vec<ResolvedStep<'a>>,
    pub constraints: Vec<&'a Constraint>,
    pub interactions: Vec<&'a Interaction>,
    pub misc: Vec<&'a Misc>,
    pub blocks: Vec<ElementBlock>,
}

impl<'a> Resolved<'a> {
    /// 1-based material tag
    pub fn material_tag(&self, name: &str) -> Option<usize> {
        self.materials.iter().position(|m| m.name == name).map(|i| i + 1)
    }

    /// 1-based section tag
    pub fn section_tag(&self, name: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.name == name).map(|i| i + 1)
    }

    pub fn set(&self, name: &str) -> Option<&ResolvedSet<'a>> {
        self.sets.iter().find(|s| s.name == name)
    }

    /// Property of an element
    pub fn property_of(&self, element: usize) -> Option<&ResolvedProperty<'a>> {
        self.element_property
            .get(element)
            .copied()
            .flatten()
            .map(|i| &self.properties[i])
    }

    /// Displacements activated by any step, in first-activation order
    pub fn activated_displacements(&self) -> Vec<usize> {
        self.steps
            .iter()
            .flat_map(|s| s.new_displacements.iter().copied())
            .collect()
    }

    /// Whether any element carries one of `types`
    pub fn has_elements(&self, types: &[ElementType]) -> bool {
        self.blocks.iter().any(|b| types.contains(&b.element_type))
    }
}

struct Collector {
    missing: Vec<MissingRef>,
    violations: Vec<String>,
}

impl Collector {
    fn missing(&mut self, kind: &str, name: &str, referrer: String) {
        self.missing.push(MissingRef::new(kind, name, referrer));
    }

    fn violation(&mut self, msg: String) {
        self.violations.push(msg);
    }

    fn finish(self) -> FEAResult<()> {
        if !self.missing.is_empty() {
            return Err(FEAError::MissingReference(self.missing));
        }
        if !self.violations.is_empty() {
            return Err(FEAError::InvariantViolation(self.violations.join("; ")));
        }
        Ok(())
    }
}

/// Resolve every cross-reference of `structure`
pub fn resolve(structure: &Structure) -> FEAResult<Resolved<'_>> {
    let mut c = Collector {
        missing: Vec::new(),
        violations: Vec::new(),
    };

    let mut sets = implicit_sets(structure);
    for set in structure.sets() {
        sets.push(ResolvedSet {
            name: set.name.clone(),
            kind: set.kind,
            keys: set.keys(),
            faces: match &set.selection {
                Selection::Faces(faces) => Some(faces.as_slice()),
                Selection::Keys(_) => None,
            },
            origin: SetOrigin::User,
        });
    }
    let mut generated: Vec<ResolvedSet<'_>> = Vec::new();

    let materials: Vec<&Material> = structure.materials().iter().collect();
    let sections: Vec<&Section> = structure.sections().iter().collect();

    // element properties
    let mut properties = Vec::new();
    let mut element_property: Vec<Option<usize>> = vec![None; structure.element_count()];
    for ep in structure.element_properties() {
        let referrer = format!("element properties '{}'", ep.name);
        let section = structure.sections().get(&ep.section);
        if section.is_none() {
            c.missing("section", &ep.section, referrer.clone());
        }
        let material = match &ep.material {
            Some(name) => {
                let m = structure.materials().get(name);
                if m.is_none() {
                    c.missing("material", name, referrer.clone());
                }
                m
            }
            None => {
                if section.is_some_and(|s| {
                    !matches!(s.section_type, SectionType::Spring | SectionType::Mass)
                }) {
                    c.violation(format!("{referrer} need a material"));
                }
                None
            }
        };

        let (elset, elements) = match (&ep.elset, &ep.elements) {
            (Some(name), None) => match find_set(&sets, name) {
                Some(set) if set.kind == SetKind::Element => (name.clone(), set.keys.clone()),
                Some(set) => {
                    c.violation(format!("{referrer} target {} '{name}'", set.kind.label()));
                    continue;
                }
                None => {
                    c.missing("set", name, referrer);
                    continue;
                }
            },
            (None, Some(keys)) => {
                let name = format!("elset_ep_{}", ep.name);
                generated.push(generated_set(&name, SetKind::Element, keys.clone()));
                (name, keys.clone())
            }
            _ => {
                c.violation(format!("{referrer} need exactly one of elset and elements"));
                continue;
            }
        };

        let Some(section) = section else { continue };
        let index = properties.len();
        for &e in &elements {
            let Some(element) = structure.element(e) else {
                c.violation(format!("{referrer} reference missing element {e}"));
                continue;
            };
            if !section.section_type.accepts(element.element_type) {
                c.violation(format!(
                    "{:?} section '{}' cannot be bound to {} element {e}",
                    section.section_type, section.name, element.element_type
                ));
            }
            match element_property[e] {
                Some(other) => c.violation(format!(
                    "element {e} is bound by both '{}' and '{}'",
                    properties_name(&properties, other),
                    ep.name
                )),
                None => element_property[e] = Some(index),
            }
        }
        properties.push(ResolvedProperty {
            properties: ep,
            material,
            material_tag: material.and_then(|m| structure.materials().position(&m.name)).map(|i| i + 1),
            section,
            section_tag: structure.sections().position(&section.name).map_or(0, |i| i + 1),
            elset,
            elements,
        });
    }

    // displacements
    let mut displacements = Vec::new();
    for d in structure.displacements() {
        let referrer = format!("displacement '{}'", d.name);
        if !d.dofs.is_finite() {
            c.violation(format!("{referrer} has a non-finite value"));
        }
        let generated_name = format!("nset_bc_{}", d.name);
        if let Some((nset, nodes)) =
            resolve_target(&sets, &mut generated, &d.target, generated_name, true, &referrer, &mut c)
        {
            displacements.push(ResolvedDisplacement {
                displacement: d,
                nset,
                nodes,
            });
        }
    }

    // loads
    let mut loads = Vec::new();
    for l in structure.loads() {
        let referrer = format!("load '{}'", l.name);
        if let Err(e) = l.validate() {
            c.violation(e.to_string());
        }
        let prefix = if l.targets_nodes() { "nset" } else { "elset" };
        if let Some((set, keys)) = resolve_target(
            &sets,
            &mut generated,
            &l.target,
            format!("{prefix}_{}", l.name),
            l.targets_nodes(),
            &referrer,
            &mut c,
        ) {
            loads.push(ResolvedLoad { load: l, set, keys });
        }
    }

    // constraints, interactions
    for constraint in structure.constraints() {
        for name in constraint.set_names() {
            if find_set(&sets, name).is_none() {
                c.missing("set", name, format!("constraint '{}'", constraint.name()));
            }
        }
    }
    for interaction in structure.interactions() {
        let Interaction::HeatTransfer {
            name,
            amplitude,
            interface,
            ..
        } = interaction;
        let referrer = format!("interaction '{name}'");
        match structure.misc().get(amplitude) {
            Some(Misc::Amplitude { .. }) => {}
            Some(_) => c.violation(format!("{referrer} uses '{amplitude}' as an amplitude")),
            None => c.missing("amplitude", amplitude, referrer.clone()),
        }
        match find_set(&sets, interface) {
            Some(set) if set.kind == SetKind::ElementSurface => {}
            Some(set) => c.violation(format!(
                "{referrer} needs an element surface, '{interface}' is a {}",
                set.kind.label()
            )),
            None => c.missing("set", interface, referrer),
        }
    }

    // steps
    if structure.steps_order.is_empty() {
        warn!("structure '{}' has no steps in steps_order", structure.name);
    }
    let mut steps = Vec::new();
    let mut pinned: Vec<usize> = Vec::new();
    for step_name in &structure.steps_order {
        let Some(step) = structure.steps().get(step_name) else {
            c.missing("step", step_name, "steps_order".to_string());
            continue;
        };
        let referrer = format!("step '{}'", step.name);

        let mut step_displacements = Vec::new();
        for name in &step.displacements {
            match displacements
                .iter()
                .position(|d| d.displacement.name == *name)
            {
                Some(i) => step_displacements.push(i),
                None if structure.displacements().contains(name) => {}
                None if structure.loads().contains(name) => {
                    c.violation(format!("{referrer} activates load '{name}' as a displacement"))
                }
                None => c.missing("displacement", name, referrer.clone()),
            }
        }
        let mut step_loads = Vec::new();
        for name in &step.loads {
            match loads.iter().position(|l| l.load.name == *name) {
                Some(i) => step_loads.push(i),
                None if structure.loads().contains(name) => {}
                None if structure.displacements().contains(name) => {
                    c.violation(format!("{referrer} activates displacement '{name}' as a load"))
                }
                None => c.missing("load", name, referrer.clone()),
            }
        }

        let temperatures = match &step.temperatures {
            Some(name) => match structure.misc().get(name) {
                Some(m @ Misc::Temperatures { .. }) => Some(m),
                Some(_) => {
                    c.violation(format!("{referrer} uses '{name}' as temperatures"));
                    None
                }
                None => {
                    c.missing("temperatures", name, referrer.clone());
                    None
                }
            },
            None => None,
        };
        let interaction = match &step.kind {
            StepKind::Heat { interaction, .. } => {
                let found = structure.interactions().get(interaction);
                if found.is_none() {
                    c.missing("interaction", interaction, referrer.clone());
                }
                found
            }
            _ => None,
        };
        if matches!(step.kind, StepKind::Modal { .. }) && !step.loads.is_empty() {
            warn!("{referrer} is modal; its loads are ignored");
        }

        let new_displacements: Vec<usize> = step_displacements
            .iter()
            .copied()
            .filter(|i| !pinned.contains(i))
            .collect();
        pinned.extend(&new_displacements);

        steps.push(ResolvedStep {
            step,
            displacements: step_displacements,
            new_displacements,
            loads: step_loads,
            temperatures,
            interaction,
        });
    }

    for (i, set) in generated.iter().enumerate() {
        if find_set(&sets, &set.name).is_some() {
            c.violation(format!("generated set '{}' clashes with a user set", set.name));
        } else if find_set(&generated[..i], &set.name).is_some() {
            c.violation(format!("generated set '{}' is defined twice", set.name));
        }
    }

    c.finish()?;

    // node sets and element sets first, surfaces last
    sets.extend(generated);
    sets.sort_by_key(|s| matches!(s.kind, SetKind::NodeSurface | SetKind::ElementSurface));

    let blocks = element_blocks(structure);
    for element in structure.elements() {
        if element_property[element.key].is_none() {
            debug!("element {} has no element properties", element.key);
        }
    }

    Ok(Resolved {
        structure,
        sets,
        materials,
        sections,
        properties,
        element_property,
        displacements,
        loads,
        steps,
        constraints: structure.constraints().iter().collect(),
        interactions: structure.interactions().iter().collect(),
        misc: structure.misc().iter().collect(),
        blocks,
    })
}

fn implicit_sets<'a>(structure: &Structure) -> Vec<ResolvedSet<'a>> {
    vec![
        generated_set(NSET_ALL, SetKind::Node, (0..structure.node_count()).collect()),
        generated_set(ELSET_ALL, SetKind::Element, (0..structure.element_count()).collect()),
    ]
    .into_iter()
    .map(|mut s| {
        s.origin = SetOrigin::Implicit;
        s
    })
    .collect()
}

fn generated_set<'a>(name: &str, kind: SetKind, keys: Vec<usize>) -> ResolvedSet<'a> {
    ResolvedSet {
        name: name.to_string(),
        kind,
        keys,
        faces: None,
        origin: SetOrigin::Generated,
    }
}

fn find_set<'s, 'a>(sets: &'s [ResolvedSet<'a>], name: &str) -> Option<&'s ResolvedSet<'a>> {
    sets.iter().find(|s| s.name == name)
}

fn properties_name<'a>(properties: &[ResolvedProperty<'a>], index: usize) -> &'a str {
    properties[index].properties.name.as_str()
}

/// Resolve a displacement or load target to a set name and its keys;
/// explicit keys become a set called `generated_name`
fn resolve_target<'a>(
    sets: &[ResolvedSet<'a>],
    generated: &mut Vec<ResolvedSet<'a>>,
    target: &Target,
    generated_name: String,
    nodes: bool,
    referrer: &str,
    c: &mut Collector,
) -> Option<(String, Vec<usize>)> {
    match target {
        Target::Set(name) => match find_set(sets, name) {
            Some(set) if set.kind.selects_nodes() == nodes => Some((name.clone(), set.keys.clone())),
            Some(set) => {
                c.violation(format!(
                    "{referrer} needs {} but '{name}' is a {}",
                    if nodes { "nodes" } else { "elements" },
                    set.kind.label()
                ));
                None
            }
            None => {
                c.missing("set", name, referrer.to_string());
                None
            }
        },
        Target::Keys(keys) => {
            let kind = if nodes { SetKind::Node } else { SetKind::Element };
            generated.push(generated_set(&generated_name, kind, keys.clone()));
            Some((generated_name, keys.clone()))
        }
    }
}

/// Group elements by (variant, node count) in order of first appearance
pub fn element_blocks(structure: &Structure) -> Vec<ElementBlock> {
    let mut blocks: Vec<ElementBlock> = Vec::new();
    let mut index: HashMap<(ElementType, usize), usize> = HashMap::new();
    for element in structure.elements() {
        let key = (element.element_type, element.nodes.len());
        let i = *index.entry(key).or_insert_with(|| {
            blocks.push(ElementBlock {
                element_type: key.0,
                node_count: key.1,
                elements: Vec::new(),
            });
            blocks.len() - 1
        });
        blocks[i].elements.push(element.key);
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::ElementProperties;
    use crate::loads::{Dofs, Load};
    use crate::model::EntityKind;
    use crate::sets::Set;

    fn truss() -> Structure {
        let mut s = Structure::new("truss", "/tmp");
        s.add_nodes(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
            .unwrap();
        for (a, b) in [(0, 3), (1, 3), (2, 3)] {
            s.add_element(ElementType::Truss, vec![a, b]).unwrap();
        }
        s.add(vec![
            Material::elastic_isotropic("steel", 200e9, 0.3, 7850.0).into(),
            Section::truss("bar", 1e-4).into(),
            ElementProperties::new("ep", "steel", "bar", ELSET_ALL).into(),
            Set::nodes("pins", vec![0, 1, 2]).into(),
            Displacement::pinned("pinned", "pins").into(),
            Load::point("point", vec![3], Dofs::xyz(2000.0, 1000.0, -100000.0)).into(),
            Step::general("bc", &["pinned"], &[]).into(),
            Step::general("load", &["pinned"], &["point"]).into(),
        ])
        .unwrap();
        s
    }

    #[test]
    fn test_resolve_truss() {
        let s = truss();
        let r = resolve(&s).unwrap();
        assert_eq!(r.properties.len(), 1);
        assert_eq!(r.properties[0].elements, vec![0, 1, 2]);
        assert_eq!(r.properties[0].material_tag, Some(1));
        assert_eq!(r.loads[0].set, "nset_point");
        assert_eq!(r.set("nset_point").map(|s| s.keys.clone()), Some(vec![3]));
        assert_eq!(r.steps.len(), 2);
        assert_eq!(r.steps[0].new_displacements, vec![0]);
        assert!(r.steps[1].new_displacements.is_empty());
        assert_eq!(r.steps[1].displacements, vec![0]);
        assert_eq!(r.activated_displacements(), vec![0]);
        assert_eq!(r.sets[0].name, NSET_ALL);
        assert_eq!(r.sets[1].name, ELSET_ALL);
    }

    #[test]
    fn test_missing_references_are_aggregated() {
        let mut s = truss();
        s.add_step(Step::general("extra", &["ghost_bc"], &["ghost_load", "point"]))
            .unwrap();
        s.add_element_properties(ElementProperties::new("ep2", "unobtainium", "bar", "nowhere"))
            .unwrap();
        let err = resolve(&s).unwrap_err();
        let mut names = err.missing_names();
        names.sort_unstable();
        assert_eq!(names, vec!["ghost_bc", "ghost_load", "nowhere", "unobtainium"]);
    }

    #[test]
    fn test_wrong_kind_is_invariant_violation() {
        let mut s = truss();
        s.add_step(Step::general("mixed", &["point"], &[])).unwrap();
        assert!(matches!(resolve(&s), Err(FEAError::InvariantViolation(_))));
    }

    #[test]
    fn test_section_must_match_elements() {
        let mut s = truss();
        s.add_section(Section::shell("plate", 0.01)).unwrap();
        s.add_element_properties(ElementProperties::on_elements("bad", "steel", "plate", vec![0]))
            .unwrap();
        let err = resolve(&s).unwrap_err();
        assert!(matches!(err, FEAError::InvariantViolation(msg) if msg.contains("cannot be bound")));
    }

    #[test]
    fn test_generated_sets_are_named_per_owner_kind() {
        let mut s = truss();
        assert!(s.remove(EntityKind::ElementProperties, "ep"));
        s.add(vec![
            Displacement::pinned("support", vec![0, 1, 2]).into(),
            Load::point("support", vec![3], Dofs::xyz(0.0, 0.0, -1000.0)).into(),
            ElementProperties::on_elements("support", "steel", "bar", vec![0, 1, 2]).into(),
            Step::general("both", &["support"], &["support"]).into(),
        ])
        .unwrap();
        let r = resolve(&s).unwrap();

        let bc = r.displacements.iter().find(|d| d.displacement.name == "support").unwrap();
        assert_eq!(bc.nset, "nset_bc_support");
        assert_eq!(r.set("nset_bc_support").unwrap().keys, vec![0, 1, 2]);
        let load = r.loads.iter().find(|l| l.load.name == "support").unwrap();
        assert_eq!(load.set, "nset_support");
        assert_eq!(r.set("nset_support").unwrap().keys, vec![3]);
        assert_eq!(r.properties[0].elset, "elset_ep_support");

        let mut names: Vec<&str> = r.sets.iter().map(|s| s.name.as_str()).collect();
        let count = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), count);
    }

    #[test]
    fn test_generated_set_defined_twice() {
        let mut s = truss();
        s.add(vec![
            Displacement::fixed("a", vec![0]).into(),
            Load::point("bc_a", vec![3], Dofs::xyz(1.0, 0.0, 0.0)).into(),
        ])
        .unwrap();
        let err = resolve(&s).unwrap_err();
        assert!(matches!(err, FEAError::InvariantViolation(msg) if msg.contains("'nset_bc_a' is defined twice")));
    }

    #[test]
    fn test_non_finite_values_are_rejected_on_insertion() {
        let mut s = truss();
        let err = s
            .add_displacement(Displacement::general("drift", vec![3], Dofs::xyz(f64::NAN, 0.0, 0.0)))
            .unwrap_err();
        assert!(matches!(err, FEAError::Validation(_)));
        let err = s
            .add_load(Load::point("blast", vec![3], Dofs::xyz(0.0, 0.0, f64::INFINITY)))
            .unwrap_err();
        assert!(matches!(err, FEAError::Validation(_)));
        assert!(resolve(&s).is_ok());
    }

    #[test]
    fn test_blocks_group_by_type_and_arity() {
        let mut s = Structure::default();
        s.add_nodes(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ])
        .unwrap();
        s.add_element(ElementType::Shell, vec![0, 1, 2, 3]).unwrap();
        s.add_element(ElementType::Beam, vec![0, 1]).unwrap();
        s.add_element(ElementType::Shell, vec![0, 1, 2]).unwrap();
        s.add_element(ElementType::Beam, vec![1, 2]).unwrap();
        let blocks = element_blocks(&s);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].elements, vec![0]);
        assert_eq!(blocks[1].elements, vec![1, 3]);
        assert_eq!((blocks[2].element_type, blocks[2].node_count), (ElementType::Shell, 3));
    }
}
